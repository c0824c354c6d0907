//! Catalog snapshot generation.
//!
//! One generation run covers a single (platform version, track) pair:
//! fetch the approved product set and the untouched master catalog, filter,
//! then persist the result twice — an append-only timestamped backup for
//! rollback, followed by the "current" record that client devices read.
//! Both writes belong to one logical unit; a failure between them leaves
//! the run failed as a whole and the caller re-invokes it. Re-running with
//! unchanged inputs produces identical content under a fresh backup
//! timestamp.
//!
//! Bulk generation fans the pairs out either synchronously or through the
//! [`TaskDispatcher`](crate::dispatch::TaskDispatcher) under deterministic
//! task names, collapsing equivalent work scheduled within one second.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::Instrument;

use cascade_core::observability::generation_span;
use cascade_core::{CatalogKey, RolloutConfig, Track};

use crate::dispatch::{generation_task_name, GenerationTask, ScheduleOutcome, TaskDispatcher};
use crate::document::UpdateCatalog;
use crate::error::{CatalogError, Result};
use crate::filter::filter;
use crate::stores::{CatalogStore, ProductStore};

/// Record of one persisted generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Platform version the catalog was generated for.
    pub platform_version: String,
    /// Track the catalog was generated for.
    pub track: Track,
    /// Generation timestamp (UTC, second resolution in keys).
    pub generated_at: DateTime<Utc>,
    /// Append-only backup key holding this generation's content.
    pub backup_key: String,
    /// Current-record key overwritten by this generation.
    pub current_key: String,
    /// SHA-256 of the serialized catalog.
    pub checksum_sha256: String,
    /// Serialized catalog size in bytes.
    pub byte_size: u64,
    /// Number of product entries that survived filtering.
    pub product_count: usize,
}

/// Generates filtered catalogs from the master source.
#[derive(Debug)]
pub struct CatalogGenerator<P, C, D> {
    config: RolloutConfig,
    products: Arc<P>,
    catalogs: Arc<C>,
    dispatcher: Arc<D>,
}

impl<P, C, D> CatalogGenerator<P, C, D>
where
    P: ProductStore,
    C: CatalogStore,
    D: TaskDispatcher,
{
    /// Creates a generator over the given policy and collaborators.
    #[must_use]
    pub fn new(
        config: RolloutConfig,
        products: Arc<P>,
        catalogs: Arc<C>,
        dispatcher: Arc<D>,
    ) -> Self {
        Self {
            config,
            products,
            catalogs,
            dispatcher,
        }
    }

    /// Generates and persists the catalog for one (platform, track) pair.
    ///
    /// Returns the snapshot record and the in-memory filtered document.
    ///
    /// # Errors
    ///
    /// Propagates store failures and structural catalog faults. The run is
    /// safely re-invocable after any failure.
    pub async fn generate_one(
        &self,
        platform_version: &str,
        track: Track,
    ) -> Result<(CatalogSnapshot, UpdateCatalog)> {
        self.generate_one_at(platform_version, track, Utc::now())
            .await
    }

    /// [`generate_one`](Self::generate_one) with an explicit generation
    /// timestamp, for deterministic tests.
    pub async fn generate_one_at(
        &self,
        platform_version: &str,
        track: Track,
        now: DateTime<Utc>,
    ) -> Result<(CatalogSnapshot, UpdateCatalog)> {
        let span = generation_span(platform_version, track.as_str());
        self.generate_inner(platform_version, track, now)
            .instrument(span)
            .await
    }

    async fn generate_inner(
        &self,
        platform_version: &str,
        track: Track,
        now: DateTime<Utc>,
    ) -> Result<(CatalogSnapshot, UpdateCatalog)> {
        tracing::info!("generating catalog");

        let approved = self.products.list_approved(track).await?;
        let raw = self.catalogs.master_catalog(platform_version).await?;
        let master = UpdateCatalog::parse(&raw)?;
        let filtered = filter(&master, &approved);
        let content = filtered.to_bytes()?;

        // Backup first: a crash between the writes must never leave the
        // current record pointing at content with no backup trail.
        self.catalogs
            .put_backup(platform_version, track, now, content.clone())
            .await?;
        self.catalogs
            .put_current(platform_version, track, content.clone())
            .await?;

        let snapshot = CatalogSnapshot {
            platform_version: platform_version.to_string(),
            track,
            generated_at: now,
            backup_key: CatalogKey::backup(platform_version, track, now).to_string(),
            current_key: CatalogKey::current(platform_version, track).to_string(),
            checksum_sha256: sha256_hex(&content),
            byte_size: content.len() as u64,
            product_count: filtered.product_count(),
        };

        tracing::info!(
            products = snapshot.product_count,
            bytes = snapshot.byte_size,
            "catalog generated"
        );
        Ok((snapshot, filtered))
    }

    /// Runs a dispatched generation task.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`generate_one`](Self::generate_one); the
    /// dispatcher owns the retry policy.
    pub async fn run_task(&self, task: &GenerationTask) -> Result<CatalogSnapshot> {
        let (snapshot, _) = self
            .generate_one(&task.platform_version, task.track)
            .await?;
        Ok(snapshot)
    }

    /// Generates catalogs for a track, a set of tracks, or (neither given)
    /// every configured track, across all configured platform versions.
    ///
    /// With a zero `delay` each pair is generated synchronously and the
    /// first failure propagates. With a positive `delay` each pair is
    /// scheduled on the dispatcher; a pair whose deterministic task name is
    /// already pending is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidArguments`] if both `track` and
    /// `tracks` are supplied.
    pub async fn generate_all(
        &self,
        track: Option<Track>,
        tracks: Option<Vec<Track>>,
        delay: Duration,
    ) -> Result<()> {
        self.generate_all_at(track, tracks, delay, Utc::now()).await
    }

    /// [`generate_all`](Self::generate_all) with an explicit scheduling
    /// timestamp, for deterministic tests.
    pub async fn generate_all_at(
        &self,
        track: Option<Track>,
        tracks: Option<Vec<Track>>,
        delay: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let selected = match (track, tracks) {
            (Some(_), Some(_)) => {
                return Err(CatalogError::InvalidArguments {
                    message: "only one of track and tracks is allowed".into(),
                })
            }
            (Some(track), None) => vec![track],
            (None, Some(tracks)) => tracks,
            (None, None) => self.config.tracks().to_vec(),
        };

        for track in selected {
            for platform_version in &self.config.platform_versions {
                if delay.is_zero() {
                    self.generate_one_at(platform_version, track, now).await?;
                    continue;
                }

                let name = generation_task_name(platform_version, track, now);
                let task = GenerationTask {
                    platform_version: platform_version.clone(),
                    track,
                };
                match self.dispatcher.schedule(&name, task, delay).await? {
                    ScheduleOutcome::Scheduled { message_id } => {
                        tracing::debug!(task = %name, %message_id, "scheduled catalog generation");
                    }
                    ScheduleOutcome::AlreadyPending { .. } => {
                        tracing::info!(task = %name, "skipping duplicate catalog generation task");
                    }
                }
            }
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &Bytes) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InMemoryDispatcher;
    use crate::stores::InMemoryProductStore;
    use cascade_core::{
        MemoryBackend, Product, StorageBackend, TrackSet, WritePrecondition,
    };
    use chrono::TimeZone;

    const MASTER: &str = r#"{
        "CatalogVersion": 2,
        "Products": {
            "041-0001": {"title": "Security Update"},
            "041-0002": {"title": "Safari"}
        }
    }"#;

    fn fixture() -> CatalogGenerator<InMemoryProductStore, MemoryBackend, InMemoryDispatcher> {
        let products = Arc::new(InMemoryProductStore::new());
        let storage = Arc::new(MemoryBackend::new());
        let dispatcher = Arc::new(InMemoryDispatcher::new());

        let mut config = RolloutConfig::default();
        config.platform_versions = vec!["10.6".into()];
        CatalogGenerator::new(config, products, storage, dispatcher)
    }

    async fn seed_master(generator: &CatalogGenerator<InMemoryProductStore, MemoryBackend, InMemoryDispatcher>) {
        generator
            .catalogs
            .put(
                CatalogKey::master("10.6").as_ref(),
                Bytes::from(MASTER),
                WritePrecondition::None,
            )
            .await
            .expect("seed master");
    }

    fn approve(generator: &CatalogGenerator<InMemoryProductStore, MemoryBackend, InMemoryDispatcher>, id: &str, tracks: &[Track]) {
        let mut product = Product::new(id, Utc::now());
        product.tracks = tracks.iter().copied().collect::<TrackSet>();
        generator.products.upsert(product);
    }

    #[tokio::test]
    async fn generate_one_filters_and_persists() {
        let generator = fixture();
        seed_master(&generator).await;
        approve(&generator, "041-0001", &[Track::Unstable, Track::Testing]);
        approve(&generator, "041-0002", &[Track::Unstable]);

        let ts = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
        let (snapshot, filtered) = generator
            .generate_one_at("10.6", Track::Testing, ts)
            .await
            .expect("generate");

        assert_eq!(snapshot.product_count, 1);
        assert_eq!(filtered.product_ids()[0].as_str(), "041-0001");
        assert_eq!(snapshot.current_key, "catalogs/10.6_testing");
        assert_eq!(
            snapshot.backup_key,
            "catalogs/backup_106_testing_2023-06-01-12-00-00"
        );

        // Current record and backup hold the identical serialized catalog.
        let current = generator.catalogs.get(&snapshot.current_key).await.unwrap();
        let backup = generator.catalogs.get(&snapshot.backup_key).await.unwrap();
        assert_eq!(current, backup);
        assert_eq!(sha256_hex(&current), snapshot.checksum_sha256);
    }

    #[tokio::test]
    async fn missing_master_catalog_fails_the_run() {
        let generator = fixture();
        let err = generator
            .generate_one("10.6", Track::Testing)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Store(_)));
    }

    #[tokio::test]
    async fn malformed_master_catalog_is_a_document_error() {
        let generator = fixture();
        generator
            .catalogs
            .put(
                CatalogKey::master("10.6").as_ref(),
                Bytes::from("not json"),
                WritePrecondition::None,
            )
            .await
            .expect("seed");

        let err = generator
            .generate_one("10.6", Track::Testing)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DocumentFormat { .. }));
    }

    #[tokio::test]
    async fn both_track_arguments_are_rejected() {
        let generator = fixture();
        let err = generator
            .generate_all(
                Some(Track::Stable),
                Some(vec![Track::Stable, Track::Testing]),
                Duration::ZERO,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn deferred_bulk_generation_deduplicates_within_one_second() {
        let generator = fixture();
        let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();

        generator
            .generate_all_at(None, None, Duration::from_secs(30), now)
            .await
            .expect("schedule");
        // Equivalent bulk call in the same second collapses entirely.
        generator
            .generate_all_at(None, None, Duration::from_secs(30), now)
            .await
            .expect("schedule");

        // One platform version, three tracks.
        assert_eq!(generator.dispatcher.len().unwrap(), 3);
    }

    #[tokio::test]
    async fn synchronous_bulk_generation_writes_every_pair() {
        let generator = fixture();
        seed_master(&generator).await;
        approve(&generator, "041-0001", &[Track::Unstable]);

        generator
            .generate_all(Some(Track::Unstable), None, Duration::ZERO)
            .await
            .expect("generate");

        let current = generator
            .catalogs
            .current("10.6", Track::Unstable)
            .await
            .expect("current exists");
        let catalog = UpdateCatalog::parse(&current).expect("parse");
        assert_eq!(catalog.product_count(), 1);
    }
}
