//! Optimistic mutation coordinator.
//!
//! Owns the cached character snapshot and the protocol for changing it:
//!
//! 1. **Optimistic**: the replacement character is computed and published
//!    synchronously, and the previous cache entry is kept as a rollback point.
//! 2. **Committing**: the replacement is written through the
//!    [`CharacterStore`] on a spawned task.
//! 3. **Settled** or **RolledBack**: on failure the rollback point is
//!    restored and the storage error is returned to the caller. Either way
//!    the entry is then invalidated so the next
//!    [`read`](MutationCoordinator::read) refetches from the store. While
//!    other mutations are pending, a restored entry stays `Optimistic`.
//!
//! The cache lock is never held across an await, so every snapshot a reader
//! sees is complete. A mutation issued while another is in flight builds on
//! the earlier optimistic snapshot; both writes are attempted and the last
//! one to settle wins. Invalidation waits until the last in-flight mutation
//! has settled.

use crate::character::{Character, InvalidMutation};
use crate::config::SheetConfig;
use crate::persist::{CharacterStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

/// Errors surfaced by the coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    InvalidMutation(#[from] InvalidMutation),

    #[error("no character snapshot is loaded")]
    NotLoaded,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("mutation task failed")]
    TaskFailed(#[source] JoinError),
}

impl CoordinatorError {
    /// True when the durable store rejected a read or write.
    pub fn is_storage(&self) -> bool {
        matches!(self, CoordinatorError::Store(e) if e.is_storage())
    }
}

/// Unique identifier for a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationId(pub Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the cached value relates to the durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    /// Loaded from the store and unchanged since.
    Fresh,
    /// Contains edits whose writes have not settled.
    Optimistic,
    /// Invalidated; the next read refetches.
    Stale,
}

/// The cached character as seen by readers.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Nothing cached yet (or the first load is still in flight).
    Pending,
    Ready {
        character: Arc<Character>,
        status: CacheStatus,
    },
}

impl Snapshot {
    pub fn is_pending(&self) -> bool {
        matches!(self, Snapshot::Pending)
    }

    pub fn character(&self) -> Option<&Arc<Character>> {
        match self {
            Snapshot::Pending => None,
            Snapshot::Ready { character, .. } => Some(character),
        }
    }

    pub fn status(&self) -> Option<CacheStatus> {
        match self {
            Snapshot::Pending => None,
            Snapshot::Ready { status, .. } => Some(*status),
        }
    }
}

/// Lifecycle phase of a single mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationPhase {
    Optimistic,
    Committing,
    Settled,
    RolledBack,
}

/// Broadcast whenever a mutation changes phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub id: MutationId,
    pub item: String,
    pub phase: MutationPhase,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    character: Arc<Character>,
    status: CacheStatus,
}

#[derive(Debug, Default)]
struct CacheSlot {
    entry: Option<CacheEntry>,
    /// Bumped on every publish or invalidation; loads started under an older
    /// epoch do not overwrite the entry.
    epoch: u64,
    in_flight: usize,
}

impl CacheSlot {
    fn publish(&mut self, entry: CacheEntry) {
        self.entry = Some(entry);
        self.epoch += 1;
    }

    fn invalidate(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.status = CacheStatus::Stale;
            self.epoch += 1;
        }
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.invalidate();
        }
    }

    /// Restore `entry` for a failed mutation and settle it. With other
    /// mutations still pending the restored value is unconfirmed, so it stays
    /// `Optimistic` until the last of them settles and invalidates it.
    fn roll_back(&mut self, mut entry: CacheEntry) {
        if self.in_flight > 1 {
            entry.status = CacheStatus::Optimistic;
        }
        self.publish(entry);
        self.settle();
    }
}

/// Owner of the cached character and its in-flight mutations.
///
/// Share it behind an [`Arc`]; [`toggle_worn`](Self::toggle_worn) spawns its
/// commit on the current tokio runtime.
pub struct MutationCoordinator {
    store: CharacterStore,
    slot: Mutex<CacheSlot>,
    events: broadcast::Sender<MutationEvent>,
}

impl MutationCoordinator {
    pub fn new(store: CharacterStore, config: &SheetConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            store,
            slot: Mutex::new(CacheSlot::default()),
            events,
        }
    }

    pub fn store(&self) -> &CharacterStore {
        &self.store
    }

    /// Receive every subsequent [`MutationEvent`].
    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    /// Number of mutations whose writes have not settled.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// The current cached value, without touching the store.
    pub fn snapshot(&self) -> Snapshot {
        match &self.lock().entry {
            None => Snapshot::Pending,
            Some(entry) => Snapshot::Ready {
                character: Arc::clone(&entry.character),
                status: entry.status,
            },
        }
    }

    /// The cached character, loading it from the store when the slot is
    /// empty or stale.
    pub async fn read(&self) -> Result<Arc<Character>, CoordinatorError> {
        let epoch = {
            let slot = self.lock();
            if let Some(entry) = &slot.entry {
                if entry.status != CacheStatus::Stale {
                    return Ok(Arc::clone(&entry.character));
                }
            }
            slot.epoch
        };

        tracing::debug!(key = %self.store.key(), "fetching character");
        let loaded = Arc::new(self.store.load().await?);

        let mut slot = self.lock();
        if slot.epoch != epoch {
            if let Some(entry) = &slot.entry {
                tracing::debug!(key = %self.store.key(), "discarding load superseded by newer snapshot");
                return Ok(Arc::clone(&entry.character));
            }
        }
        slot.publish(CacheEntry {
            character: Arc::clone(&loaded),
            status: CacheStatus::Fresh,
        });
        Ok(loaded)
    }

    /// Mark the cached value stale so the next read refetches.
    ///
    /// Has no effect while mutations are in flight; the last one to settle
    /// invalidates the entry.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        if slot.in_flight == 0 {
            slot.invalidate();
        }
    }

    /// Invalidate and refetch.
    pub async fn refresh(&self) -> Result<Arc<Character>, CoordinatorError> {
        self.invalidate();
        self.read().await
    }

    /// Flip the worn flag of `item_name`.
    ///
    /// The toggled character is visible through [`snapshot`](Self::snapshot)
    /// as soon as this returns. The returned handle resolves once the write
    /// has settled; dropping it does not cancel the write.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the commit is
    /// spawned onto the current one.
    pub fn toggle_worn(
        self: &Arc<Self>,
        item_name: &str,
    ) -> Result<MutationHandle, CoordinatorError> {
        let id = MutationId::new();

        let (rollback, optimistic) = {
            let mut slot = self.lock();
            let current = slot.entry.clone().ok_or(CoordinatorError::NotLoaded)?;
            let updated = Arc::new(current.character.toggle_worn(item_name)?);

            slot.publish(CacheEntry {
                character: Arc::clone(&updated),
                status: CacheStatus::Optimistic,
            });
            slot.in_flight += 1;
            (current, updated)
        };

        tracing::debug!(%id, item = item_name, "applied optimistic toggle");
        self.emit(id, item_name, MutationPhase::Optimistic);

        let coordinator = Arc::clone(self);
        let item = item_name.to_string();
        let task =
            tokio::spawn(async move { coordinator.commit(id, item, rollback, optimistic).await });

        Ok(MutationHandle { id, task })
    }

    async fn commit(
        &self,
        id: MutationId,
        item: String,
        rollback: CacheEntry,
        optimistic: Arc<Character>,
    ) -> Result<Arc<Character>, CoordinatorError> {
        self.emit(id, &item, MutationPhase::Committing);
        let result = self.store.save(&optimistic).await;

        match result {
            Ok(()) => {
                self.lock().settle();
                tracing::info!(%id, item = %item, "mutation settled");
                self.emit(id, &item, MutationPhase::Settled);
                Ok(optimistic)
            }
            Err(e) => {
                self.lock().roll_back(rollback);
                tracing::warn!(%id, item = %item, error = %e, "mutation rolled back");
                self.emit(id, &item, MutationPhase::RolledBack);
                Err(e.into())
            }
        }
    }

    fn emit(&self, id: MutationId, item: &str, phase: MutationPhase) {
        // Err only means nobody is subscribed
        let _ = self.events.send(MutationEvent {
            id,
            item: item.to_string(),
            phase,
        });
    }

    fn lock(&self) -> MutexGuard<'_, CacheSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("store", &self.store)
            .field("slot", &*self.lock())
            .finish()
    }
}

/// Pending result of a mutation's commit.
///
/// Await it to learn whether the write succeeded.
#[derive(Debug)]
pub struct MutationHandle {
    id: MutationId,
    task: JoinHandle<Result<Arc<Character>, CoordinatorError>>,
}

impl MutationHandle {
    pub fn id(&self) -> MutationId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for MutationHandle {
    type Output = Result<Arc<Character>, CoordinatorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task)
            .poll(cx)
            .map(|joined| joined.unwrap_or_else(|e| Err(CoordinatorError::TaskFailed(e))))
    }
}
