//! # cascade-catalog
//!
//! Catalog domain for the Cascade staged-rollout service.
//!
//! This crate implements the pieces that turn an upstream vendor update
//! catalog into per-track, per-platform catalogs:
//!
//! - **Document Model**: The vendor catalog as an opaque structured
//!   document whose product list can be trimmed without disturbing the rest
//! - **Filter**: Pure restriction of a master catalog to approved products
//! - **Generator**: Snapshot generation with append-only backups and an
//!   overwritten "current" record, single-pair and bulk/deferred
//! - **Promotion Scheduler**: Day-of-week-aware auto-promotion dates
//! - **Dist File Parser**: Installer metadata extraction from vendor
//!   distribution documents
//! - **Dispatch**: Task-queue abstraction with name-based deduplication
//!
//! ## Example
//!
//! ```rust,ignore
//! use cascade_catalog::prelude::*;
//! use cascade_core::{MemoryBackend, RolloutConfig, Track};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(MemoryBackend::new());
//! let generator = CatalogGenerator::new(config, products, storage, dispatcher);
//! let (snapshot, filtered) = generator.generate_one("10.6", Track::Testing).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod dispatch;
pub mod distfile;
pub mod document;
pub mod error;
pub mod filter;
pub mod generator;
pub mod promotion;
pub mod stores;

// Re-export main types at crate root
pub use distfile::{summarize, DistFileDocument, DistSummary};
pub use document::UpdateCatalog;
pub use error::{CatalogError, Result};
pub use generator::{CatalogGenerator, CatalogSnapshot};
pub use promotion::PromotionScheduler;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::dispatch::{GenerationTask, InMemoryDispatcher, ScheduleOutcome, TaskDispatcher};
    pub use crate::distfile::{summarize, DistFileDocument, DistSummary};
    pub use crate::document::UpdateCatalog;
    pub use crate::error::{CatalogError, Result};
    pub use crate::filter::filter;
    pub use crate::generator::{CatalogGenerator, CatalogSnapshot};
    pub use crate::promotion::PromotionScheduler;
    pub use crate::stores::{CatalogStore, InMemoryProductStore, ProductStore};
}
