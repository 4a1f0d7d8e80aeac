//! Testing utilities.
//!
//! [`ScriptedStore`] is an in-memory [`DurableStore`] whose reads and writes
//! can be held back or made to fail, so the optimistic and rollback paths of the
//! coordinator can be driven deterministically.

use crate::persist::{DurableStore, MemoryStore};
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// A memory store with scripted read and write behaviour.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    /// Writes take a read lock; holding the write lock parks them.
    write_gate: Arc<RwLock<()>>,
    write_hold: Mutex<Option<OwnedRwLockWriteGuard<()>>>,
    read_gate: Arc<RwLock<()>>,
    read_hold: Mutex<Option<OwnedRwLockWriteGuard<()>>>,
    fail_writes: AtomicBool,
    /// One-shot failures, consumed in arrival order ahead of the gate.
    fail_next: AtomicUsize,
    fail_reads: AtomicBool,
    writes: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    /// Park every write that starts from now on until [`release_writes`](Self::release_writes).
    ///
    /// Returns `false` when a write is already inside the store; nothing is
    /// held in that case.
    pub fn hold_writes(&self) -> bool {
        close(&self.write_gate, &self.write_hold)
    }

    /// Let parked writes proceed.
    pub fn release_writes(&self) {
        open(&self.write_hold);
    }

    /// Park every read that starts from now on until [`release_reads`](Self::release_reads).
    ///
    /// Returns `false` when a read is already inside the store.
    pub fn hold_reads(&self) -> bool {
        close(&self.read_gate, &self.read_hold)
    }

    pub fn release_reads(&self) {
        open(&self.read_hold);
    }

    /// Make writes fail with an I/O error (checked when a write is released).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `count` writes as soon as they arrive, even while
    /// writes are held. Later writes behave as configured otherwise.
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

/// Take the gate's write side. True once the gate is held, whether by this
/// call or an earlier one.
fn close(gate: &Arc<RwLock<()>>, hold: &Mutex<Option<OwnedRwLockWriteGuard<()>>>) -> bool {
    let mut hold = hold.lock().unwrap_or_else(PoisonError::into_inner);
    if hold.is_none() {
        *hold = Arc::clone(gate).try_write_owned().ok();
    }
    hold.is_some()
}

fn open(hold: &Mutex<Option<OwnedRwLockWriteGuard<()>>>) {
    hold.lock().unwrap_or_else(PoisonError::into_inner).take();
}

#[async_trait]
impl DurableStore for ScriptedStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        let _open = self.read_gate.read().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "read rejected by scripted store",
            ));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> io::Result<()> {
        let scripted_failure = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            self.writes.fetch_add(1, Ordering::SeqCst);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "write rejected by scripted store",
            ));
        }

        let _open = self.write_gate.read().await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "write rejected by scripted store",
            ));
        }
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        self.inner.remove(key).await
    }
}
