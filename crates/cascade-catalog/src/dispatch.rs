//! Deferred-generation task dispatch.
//!
//! Bulk catalog generation can fan out to an external work queue instead of
//! running inline. This module provides:
//!
//! - [`TaskDispatcher`]: trait for scheduling deferred generation work
//! - [`GenerationTask`]: serializable payload for one (platform, track) pair
//! - [`InMemoryDispatcher`]: in-memory queue for testing
//!
//! Deduplication is by deterministic task name, not locking: two schedulers
//! issuing the same logical generation within the same second produce the
//! same name, and the dispatcher reports the second as
//! [`ScheduleOutcome::AlreadyPending`] rather than failing. This is a
//! best-effort, coarse-grained collapse, never a mutual-exclusion
//! guarantee.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use cascade_core::storage_keys::{sanitize_key_segment, KEY_TIMESTAMP_FORMAT};
use cascade_core::Track;

use crate::error::Result;

/// Payload for one deferred generation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Platform version to generate for.
    pub platform_version: String,
    /// Track to generate for.
    pub track: Track,
}

/// Deterministic task name for a generation unit.
///
/// Format: `gen-catalog-{platform}-{track}-{YYYY-MM-DD-HH-MM-SS}`,
/// sanitized to word characters and hyphens. Second resolution means
/// equivalent generations scheduled within one second collide on purpose.
#[must_use]
pub fn generation_task_name(
    platform_version: &str,
    track: Track,
    timestamp: DateTime<Utc>,
) -> String {
    sanitize_key_segment(&format!(
        "gen-catalog-{platform_version}-{track}-{}",
        timestamp.format(KEY_TIMESTAMP_FORMAT)
    ))
}

/// Result of a schedule call.
///
/// Hard dispatcher failures are `Err`; a duplicate name is a normal
/// outcome, so callers never have to downcast backend-specific
/// "task already exists" errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The task was accepted.
    Scheduled {
        /// Queue-specific message id.
        message_id: String,
    },
    /// An equivalent task with the same name is already pending.
    AlreadyPending {
        /// Message id of the pending task.
        existing_message_id: String,
    },
}

impl ScheduleOutcome {
    /// Returns true if this call enqueued new work.
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled { .. })
    }
}

/// Work-dispatch facility for deferred catalog generation.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Schedules `task` for execution after `delay`.
    ///
    /// A duplicate `name` within the dispatcher's deduplication window
    /// yields [`ScheduleOutcome::AlreadyPending`], not an error.
    async fn schedule(
        &self,
        name: &str,
        task: GenerationTask,
        delay: Duration,
    ) -> Result<ScheduleOutcome>;
}

/// A task held by the in-memory dispatcher.
#[derive(Debug, Clone)]
pub struct PendingTask {
    /// Deterministic task name.
    pub name: String,
    /// Assigned message id.
    pub message_id: String,
    /// The generation payload.
    pub task: GenerationTask,
    /// Requested execution delay.
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct DispatcherState {
    queue: VecDeque<PendingTask>,
    pending_names: HashMap<String, String>,
}

/// In-memory dispatcher for testing.
///
/// Names are deduplicated while their task sits in the queue and released
/// when the task is taken, mirroring the dedup window of real queue
/// backends. The delay is recorded but not enforced.
#[derive(Debug, Default)]
pub struct InMemoryDispatcher {
    state: RwLock<DispatcherState>,
}

fn poisoned<T>(_: PoisonError<T>) -> cascade_core::Error {
    cascade_core::Error::Internal {
        message: "dispatcher lock poisoned".into(),
    }
}

impl InMemoryDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the next pending task, releasing its name for reuse.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn take(&self) -> Result<Option<PendingTask>> {
        let mut state = self.state.write().map_err(poisoned)?;
        let entry = state.queue.pop_front();
        if let Some(ref entry) = entry {
            state.pending_names.remove(&entry.name);
        }
        drop(state);
        Ok(entry)
    }

    /// Returns the number of pending tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.state.read().map_err(poisoned)?.queue.len())
    }

    /// Returns whether no tasks are pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl TaskDispatcher for InMemoryDispatcher {
    async fn schedule(
        &self,
        name: &str,
        task: GenerationTask,
        delay: Duration,
    ) -> Result<ScheduleOutcome> {
        let mut state = self.state.write().map_err(poisoned)?;

        if let Some(existing) = state.pending_names.get(name) {
            return Ok(ScheduleOutcome::AlreadyPending {
                existing_message_id: existing.clone(),
            });
        }

        let message_id = Ulid::new().to_string();
        state
            .pending_names
            .insert(name.to_string(), message_id.clone());
        state.queue.push_back(PendingTask {
            name: name.to_string(),
            message_id: message_id.clone(),
            task,
            delay,
        });
        drop(state);

        Ok(ScheduleOutcome::Scheduled { message_id })
    }
}
