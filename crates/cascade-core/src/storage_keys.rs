//! Typed storage keys for the catalog snapshot layout.
//!
//! Keys are constructed through [`CatalogKey`] rather than formatted inline
//! so the layout lives in one place and malformed paths cannot be built.
//!
//! # Key Layout
//!
//! | Key | Format | Write discipline |
//! |-----|--------|------------------|
//! | master | `catalogs/{platform}_untouched` | written upstream, read here |
//! | current | `catalogs/{platform}_{track}` | overwritten each generation |
//! | backup | `catalogs/backup_{platform}_{track}_{timestamp}` | append-only |
//!
//! Backup key names are sanitized to word characters and hyphens; the
//! timestamp has UTC second resolution, so one backup key exists per
//! (platform, track, second).

use chrono::{DateTime, Utc};

use crate::track::Track;

/// Timestamp layout used in backup keys and deferred task names.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

const CATALOG_PREFIX: &str = "catalogs/";

/// Strips every character that is not a word character or hyphen.
///
/// Keeps derived key and task names within the character set every
/// storage and queue backend accepts.
#[must_use]
pub fn sanitize_key_segment(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// A typed key into the catalog snapshot layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogKey(String);

impl CatalogKey {
    /// Key of the untouched vendor master catalog for a platform version.
    #[must_use]
    pub fn master(platform_version: &str) -> Self {
        Self(format!("{CATALOG_PREFIX}{platform_version}_untouched"))
    }

    /// Key of the current served catalog for a (platform, track) pair.
    #[must_use]
    pub fn current(platform_version: &str, track: Track) -> Self {
        Self(format!("{CATALOG_PREFIX}{platform_version}_{track}"))
    }

    /// Append-only backup key for one generation run.
    #[must_use]
    pub fn backup(platform_version: &str, track: Track, timestamp: DateTime<Utc>) -> Self {
        let name = sanitize_key_segment(&format!(
            "backup_{platform_version}_{track}_{}",
            timestamp.format(KEY_TIMESTAMP_FORMAT)
        ));
        Self(format!("{CATALOG_PREFIX}{name}"))
    }

    /// Prefix matching every backup for a (platform, track) pair.
    #[must_use]
    pub fn backup_prefix(platform_version: &str, track: Track) -> Self {
        let name = sanitize_key_segment(&format!("backup_{platform_version}_{track}_"));
        Self(format!("{CATALOG_PREFIX}{name}"))
    }
}

impl AsRef<str> for CatalogKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
