//! Collaborator store interfaces.
//!
//! Catalog generation reads product approvals from a [`ProductStore`] and
//! catalog documents from a [`CatalogStore`]. Both are seams: production
//! deployments back them with real databases and object storage, tests use
//! the in-memory implementations.
//!
//! [`CatalogStore`] is implemented for every
//! [`StorageBackend`](cascade_core::StorageBackend) via typed
//! [`CatalogKey`]s, which is where the write discipline lives:
//!
//! - backups are written with the `DoesNotExist` precondition (append-only)
//! - the current record is overwritten unconditionally

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use cascade_core::{
    CatalogKey, Product, ProductId, StorageBackend, Track, WritePrecondition, WriteResult,
};

use crate::error::Result;

/// Read access to curated product records.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns the ids of every product approved for `track`.
    async fn list_approved(&self, track: Track) -> Result<BTreeSet<ProductId>>;

    /// Fetches a single product record.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>>;
}

/// Access to stored catalog documents.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetches the untouched vendor master catalog for a platform version.
    async fn master_catalog(&self, platform_version: &str) -> Result<Bytes>;

    /// Records an append-only backup of a generated catalog.
    ///
    /// A backup key already holding content is left untouched: backup keys
    /// have second resolution, so a duplicate key within one generation
    /// window carries identical content.
    async fn put_backup(
        &self,
        platform_version: &str,
        track: Track,
        timestamp: DateTime<Utc>,
        content: Bytes,
    ) -> Result<()>;

    /// Overwrites the current served catalog for a (platform, track) pair.
    async fn put_current(&self, platform_version: &str, track: Track, content: Bytes)
        -> Result<()>;

    /// Fetches the current served catalog for a (platform, track) pair.
    async fn current(&self, platform_version: &str, track: Track) -> Result<Bytes>;
}

#[async_trait]
impl<S: StorageBackend> CatalogStore for S {
    async fn master_catalog(&self, platform_version: &str) -> Result<Bytes> {
        let key = CatalogKey::master(platform_version);
        Ok(self.get(key.as_ref()).await?)
    }

    async fn put_backup(
        &self,
        platform_version: &str,
        track: Track,
        timestamp: DateTime<Utc>,
        content: Bytes,
    ) -> Result<()> {
        let key = CatalogKey::backup(platform_version, track, timestamp);
        match self
            .put(key.as_ref(), content, WritePrecondition::DoesNotExist)
            .await?
        {
            WriteResult::Success { .. } | WriteResult::PreconditionFailed { .. } => Ok(()),
        }
    }

    async fn put_current(
        &self,
        platform_version: &str,
        track: Track,
        content: Bytes,
    ) -> Result<()> {
        let key = CatalogKey::current(platform_version, track);
        self.put(key.as_ref(), content, WritePrecondition::None)
            .await?;
        Ok(())
    }

    async fn current(&self, platform_version: &str, track: Track) -> Result<Bytes> {
        let key = CatalogKey::current(platform_version, track);
        Ok(self.get(key.as_ref()).await?)
    }
}

/// In-memory product store for tests.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product record.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (test-only store).
    pub fn upsert(&self, product: Product) {
        self.products
            .write()
            .expect("product store lock poisoned")
            .insert(product.id.clone(), product);
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list_approved(&self, track: Track) -> Result<BTreeSet<ProductId>> {
        let products = self
            .products
            .read()
            .map_err(|_| cascade_core::Error::Internal {
                message: "product store lock poisoned".into(),
            })?;
        Ok(products
            .values()
            .filter(|p| p.tracks.contains(track))
            .map(|p| p.id.clone())
            .collect())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| cascade_core::Error::Internal {
                message: "product store lock poisoned".into(),
            })?;
        Ok(products.get(id).cloned())
    }
}
