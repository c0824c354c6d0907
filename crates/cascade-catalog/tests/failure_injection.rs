//! Generation behavior around injected storage write failures.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use cascade_catalog::prelude::*;
use cascade_catalog::CatalogGenerator;
use cascade_core::{
    CatalogKey, Error as CoreError, MemoryBackend, ObjectMeta, Product, Result as CoreResult,
    RolloutConfig, StorageBackend, Track, WritePrecondition, WriteResult,
};
use chrono::{TimeZone, Utc};

const MASTER: &str = r#"{
    "CatalogVersion": 2,
    "Products": {
        "041-0001": {"title": "Security Update 2023-001"}
    }
}"#;

/// Backend that fails the next `put` to each marked path, once.
#[derive(Debug, Default)]
struct FailOncePutBackend {
    inner: MemoryBackend,
    fail_once_paths: Mutex<HashSet<String>>,
}

impl FailOncePutBackend {
    fn new() -> Self {
        Self::default()
    }

    fn fail_next_put(&self, path: &str) {
        self.fail_once_paths
            .lock()
            .expect("lock")
            .insert(path.to_string());
    }
}

#[async_trait]
impl StorageBackend for FailOncePutBackend {
    async fn get(&self, path: &str) -> CoreResult<Bytes> {
        self.inner.get(path).await
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> CoreResult<WriteResult> {
        if self.fail_once_paths.lock().expect("lock").remove(path) {
            return Err(CoreError::storage(format!("injected put failure: {path}")));
        }
        self.inner.put(path, data, precondition).await
    }

    async fn delete(&self, path: &str) -> CoreResult<()> {
        self.inner.delete(path).await
    }

    async fn list(&self, prefix: &str) -> CoreResult<Vec<ObjectMeta>> {
        self.inner.list(prefix).await
    }

    async fn head(&self, path: &str) -> CoreResult<Option<ObjectMeta>> {
        self.inner.head(path).await
    }
}

struct Harness {
    storage: Arc<FailOncePutBackend>,
    generator: CatalogGenerator<InMemoryProductStore, FailOncePutBackend, InMemoryDispatcher>,
}

async fn harness() -> Harness {
    let products = Arc::new(InMemoryProductStore::new());
    let storage = Arc::new(FailOncePutBackend::new());
    let dispatcher = Arc::new(InMemoryDispatcher::new());

    products.upsert(
        Product::new("041-0001", Utc::now())
            .with_track(Track::Unstable)
            .with_track(Track::Testing),
    );
    storage
        .put(
            CatalogKey::master("10.6").as_ref(),
            Bytes::from(MASTER),
            WritePrecondition::None,
        )
        .await
        .expect("seed master");

    let mut config = RolloutConfig::default();
    config.platform_versions = vec!["10.6".into()];
    let generator = CatalogGenerator::new(config, products, Arc::clone(&storage), dispatcher);

    Harness { storage, generator }
}

#[tokio::test]
async fn failed_backup_write_leaves_the_current_record_untouched() {
    let h = harness().await;
    let ts = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let backup_key = CatalogKey::backup("10.6", Track::Testing, ts);
    let current_key = CatalogKey::current("10.6", Track::Testing);

    h.storage.fail_next_put(backup_key.as_ref());
    h.generator
        .generate_one_at("10.6", Track::Testing, ts)
        .await
        .expect_err("backup write fails");

    // The run fails as a unit: nothing was served.
    assert!(h.storage.head(current_key.as_ref()).await.unwrap().is_none());
    assert!(h.storage.head(backup_key.as_ref()).await.unwrap().is_none());

    // A plain re-invocation completes the run.
    let (snapshot, _) = h
        .generator
        .generate_one_at("10.6", Track::Testing, ts)
        .await
        .expect("retry succeeds");
    assert_eq!(snapshot.product_count, 1);
    assert!(h.storage.head(current_key.as_ref()).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_current_write_keeps_the_backup_trail() {
    let h = harness().await;
    let t1 = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 5).unwrap();
    let current_key = CatalogKey::current("10.6", Track::Testing);

    h.storage.fail_next_put(current_key.as_ref());
    h.generator
        .generate_one_at("10.6", Track::Testing, t1)
        .await
        .expect_err("current write fails");

    // The backup landed before the failure and stays on record.
    let first_backup = CatalogKey::backup("10.6", Track::Testing, t1);
    assert!(h
        .storage
        .head(first_backup.as_ref())
        .await
        .unwrap()
        .is_some());
    assert!(h.storage.head(current_key.as_ref()).await.unwrap().is_none());

    let (snapshot, _) = h
        .generator
        .generate_one_at("10.6", Track::Testing, t2)
        .await
        .expect("retry succeeds");

    let backups = h
        .storage
        .list(CatalogKey::backup_prefix("10.6", Track::Testing).as_ref())
        .await
        .expect("list backups");
    assert_eq!(backups.len(), 2);

    let current = h.storage.get(current_key.as_ref()).await.expect("current");
    let second_backup = h
        .storage
        .get(&snapshot.backup_key)
        .await
        .expect("second backup");
    assert_eq!(current, second_backup);
}
