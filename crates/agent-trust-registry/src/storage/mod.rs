//! Storage layer for registry state and principal keys.
//!
//! # Directory layout
//!
//! The CLI defaults to `~/.agentic/`:
//!
//! ```text
//! ~/.agentic/
//! ├── keys/
//! │   └── {name}.akey
//! └── registry/
//!     ├── .lock
//!     ├── registry.json
//!     ├── verifiers.json
//!     ├── agents/ reputations/ owners/ claims/
//!     ├── interactions/{agent_id}.jsonl
//!     └── verifications/{agent_id}/{claim}.json
//! ```
//!
//! # Modules
//!
//! - [`key_file`]: `.akey` save/load with passphrase encryption.
//! - [`registry_store`]: versioned JSON records for the registry, written
//!   through rollback-on-drop transactions under an exclusive directory lock.

pub mod key_file;
pub mod registry_store;

pub use key_file::{load_principal_key, read_principal, save_principal_key, KeyFile};
pub use registry_store::{RegistryStore, StoreTransaction, StoredState};
