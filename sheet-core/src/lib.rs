//! D&D 5e character sheet engine.
//!
//! This crate provides:
//! - The character data model and its stored JSON shape
//! - Derived statistics (modifiers, saving throws, skills, armor class)
//! - Persistence of the single character record over a key-value store
//! - An optimistic mutation coordinator with rollback on failed writes
//!
//! # Quick Start
//!
//! ```ignore
//! use sheet_core::{CharacterStore, MutationCoordinator, SheetConfig, SheetSummary};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SheetConfig::from_env();
//!     let store = CharacterStore::file(&config);
//!     let coordinator = Arc::new(MutationCoordinator::new(store, &config));
//!
//!     let character = coordinator.read().await?;
//!     println!("AC {}", SheetSummary::from_character(&character)?.armor_class);
//!
//!     // Visible immediately, rolled back if the write fails
//!     coordinator.toggle_worn("Scale mail")?.await?;
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod config;
pub mod coordinator;
pub mod persist;
pub mod rules;
pub mod sheet;
pub mod testing;

// Primary public API
pub use character::{default_character, Character, InvalidMutation, SchemaError};
pub use config::SheetConfig;
pub use coordinator::{
    CacheStatus, CoordinatorError, MutationCoordinator, MutationEvent, MutationHandle,
    MutationPhase, Snapshot,
};
pub use persist::{CharacterStore, DurableStore, FileStore, MemoryStore, StoreError};
pub use rules::RulesError;
pub use sheet::SheetSummary;
pub use testing::ScriptedStore;
