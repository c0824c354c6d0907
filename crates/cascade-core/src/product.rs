//! Product records curated by the rollout workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::track::{Track, TrackSet};

/// Stable identifier of a vendor update product.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a product id from a vendor identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A vendor update product and its rollout state.
///
/// Products are owned and mutated by external curation workflows; this
/// crate only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable vendor product identifier.
    pub id: ProductId,
    /// Tracks the product is currently approved for.
    pub tracks: TrackSet,
    /// Disables all automatic promotion when set.
    pub manual_override: bool,
    /// When the track set last changed.
    pub mtime: DateTime<Utc>,
}

impl Product {
    /// Creates a product approved for no tracks.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, mtime: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            tracks: TrackSet::new(),
            manual_override: false,
            mtime,
        }
    }

    /// Returns a copy approved for the given track.
    #[must_use]
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.insert(track);
        self
    }

    /// Returns a copy with the manual-override flag set.
    #[must_use]
    pub fn with_manual_override(mut self) -> Self {
        self.manual_override = true;
        self
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
