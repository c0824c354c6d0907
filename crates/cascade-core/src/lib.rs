//! # cascade-core
//!
//! Core abstractions for the Cascade staged-rollout service.
//!
//! This crate provides the foundational types shared by all Cascade
//! components:
//!
//! - **Rollout Policy**: Track ordering, promotion grace periods, and the
//!   supported platform versions, carried as explicit configuration
//! - **Domain Types**: Tracks, track sets, and product records
//! - **Storage Abstraction**: Conditional-write object storage used for
//!   catalog snapshots, with an in-memory backend for tests
//! - **Typed Keys**: Storage keys that encode the snapshot layout
//! - **Error Types**: Shared error definitions and result aliases
//!
//! ## Storage Layout
//!
//! ```text
//! catalogs/
//! ├── {platform}_untouched                     # vendor master catalog
//! ├── {platform}_{track}                       # current served catalog
//! └── backup_{platform}_{track}_{timestamp}    # append-only backups
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod observability;
pub mod product;
pub mod storage;
pub mod storage_keys;
pub mod track;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::RolloutConfig;
    pub use crate::error::{Error, Result};
    pub use crate::product::{Product, ProductId};
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
    };
    pub use crate::storage_keys::CatalogKey;
    pub use crate::track::{Track, TrackSet};
}

pub use config::{RolloutConfig, WeekdayRule};
pub use error::{Error, Result};
pub use observability::{init_logging, LogFormat};
pub use product::{Product, ProductId};
pub use storage::{MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult};
pub use storage_keys::CatalogKey;
pub use track::{Track, TrackSet};
