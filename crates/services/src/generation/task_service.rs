use chrono::{DateTime, Duration, Utc};
use logoforge_config::GenerationSettings;
use logoforge_db::models::{LogoParams, LogoTask, TaskResult, TaskStatus};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::queue::{GenerationJob, JobQueue};
use super::task_store::TaskStore;
use crate::clock::Clock;
use crate::dao::base::DaoError;
use crate::storage::{MAX_SIGNED_URL_TTL, ObjectStorage, StorageError};

pub const TIMEOUT_MESSAGE: &str = "generation timed out";

/// A task moves at most pending -> processing -> terminal, so a reader can
/// lose the timeout race at most twice before it sees a terminal row.
const RECONCILE_ROUNDS: usize = 3;

#[derive(Debug, Error)]
pub enum LogoError {
    #[error("Task not found")]
    NotFound,
    #[error("Task has expired")]
    Expired,
    #[error("Task timed out")]
    Timeout,
    #[error("Not ready: {0}")]
    NotReady(String),
    #[error("Malformed task result: {0}")]
    MalformedResult(String),
    #[error("Invalid lifecycle setting: {0}")]
    InvalidPolicy(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

/// Time limits governing the read path.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    /// Non-terminal tasks older than this are failed on read.
    pub stale_after: Duration,
    /// Tasks older than this are no longer served.
    pub retention: Duration,
    pub hd_url_ttl: std::time::Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::minutes(5),
            retention: Duration::days(7),
            hd_url_ttl: std::time::Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl LifecyclePolicy {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self, LogoError> {
        let stale_after = i64::try_from(settings.stale_after_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                LogoError::InvalidPolicy(format!("stale_after_secs {} is out of range", settings.stale_after_secs))
            })?;
        let retention = Duration::try_days(i64::from(settings.retention_days)).ok_or_else(|| {
            LogoError::InvalidPolicy(format!("retention_days {} is out of range", settings.retention_days))
        })?;

        let hd_url_ttl = std::time::Duration::from_secs(settings.hd_url_ttl_secs);
        if hd_url_ttl.is_zero() || hd_url_ttl > MAX_SIGNED_URL_TTL {
            return Err(LogoError::InvalidPolicy(format!(
                "hd_url_ttl_secs must be between 1 and {}, got {}",
                MAX_SIGNED_URL_TTL.as_secs(),
                settings.hd_url_ttl_secs
            )));
        }

        Ok(Self {
            stale_after,
            retention,
            hd_url_ttl,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

pub struct LogoTaskService {
    store: Arc<dyn TaskStore>,
    storage: Arc<dyn ObjectStorage>,
    queue: JobQueue,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

impl LogoTaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        storage: Arc<dyn ObjectStorage>,
        queue: JobQueue,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            store,
            storage,
            queue,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Persists a pending task and hands it to the workers. Never waits for
    /// generation.
    pub async fn create(&self, owner_id: &str, params: LogoParams) -> Result<LogoTask, LogoError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let task = LogoTask::new(id, owner_id.to_string(), params, self.clock.now());
        self.store.insert(&task).await?;

        let job = GenerationJob {
            task_id: task.id.clone(),
            params: task.params.clone(),
        };
        if let Err(e) = self.queue.enqueue(job) {
            // The stale check on read still bounds how long the task looks pending
            warn!(task_id = %task.id, error = %e, "Failed to enqueue generation job");
        }

        info!(task_id = %task.id, owner_id, "Logo task created");
        Ok(task)
    }

    pub async fn status(&self, owner_id: &str, task_id: &str) -> Result<LogoTask, LogoError> {
        self.store
            .find_owned(task_id, owner_id)
            .await?
            .ok_or(LogoError::NotFound)
    }

    /// Task with its outcome, reconciling tasks that have been running too long.
    pub async fn result(&self, owner_id: &str, task_id: &str) -> Result<LogoTask, LogoError> {
        let mut task = self.status(owner_id, task_id).await?;

        for _ in 0..RECONCILE_ROUNDS {
            let now = self.clock.now();

            if now - task.created_at > self.policy.retention {
                return Err(LogoError::Expired);
            }

            if !task.status.is_terminal() && now - task.created_at > self.policy.stale_after {
                if self.time_out(&task, now).await? {
                    return Err(LogoError::Timeout);
                }
                // The row moved under us; judge whatever replaced it
                debug!(%task_id, status = %task.status, "Lost timeout race, re-reading task");
                task = self.status(owner_id, task_id).await?;
                continue;
            }

            if task.status == TaskStatus::Success {
                validate_assets(&task)?;
            }

            return Ok(task);
        }

        warn!(%task_id, status = %task.status, "Task kept changing during reconciliation");
        Err(LogoError::Timeout)
    }

    /// Signed URL for the task's first high-resolution image.
    pub async fn hd_url(&self, owner_id: &str, task_id: &str) -> Result<HdUrl, LogoError> {
        let task = self.status(owner_id, task_id).await?;

        if task.status != TaskStatus::Success {
            return Err(LogoError::NotReady(format!("task is {}", task.status)));
        }
        let Some(key) = task.hd_keys().first() else {
            return Err(LogoError::NotReady("no high-resolution image".to_string()));
        };

        let ttl = self.policy.hd_url_ttl.min(MAX_SIGNED_URL_TTL);
        let issued_at = self.clock.now();
        let url = self.storage.signed_url(key, ttl).await?;
        let expires_at = issued_at
            + Duration::from_std(ttl).map_err(|e| LogoError::InvalidPolicy(e.to_string()))?;

        debug!(%task_id, key = %key, "Issued hd url");
        Ok(HdUrl { url, expires_at })
    }

    /// Re-enqueues pending tasks still inside the staleness window. Run at startup
    /// so jobs lost with the previous process are picked up.
    pub async fn recover_pending(&self) -> Result<usize, LogoError> {
        let now = self.clock.now();
        let mut recovered = 0;
        for task in self.store.find_by_status(&[TaskStatus::Pending]).await? {
            if now - task.created_at > self.policy.stale_after {
                continue;
            }
            let job = GenerationJob {
                task_id: task.id.clone(),
                params: task.params,
            };
            match self.queue.enqueue(job) {
                Ok(()) => recovered += 1,
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Failed to re-enqueue pending task");
                    break;
                }
            }
        }
        if recovered > 0 {
            info!(recovered, "Re-enqueued pending logo tasks");
        }
        Ok(recovered)
    }

    /// Fails every non-terminal task past the staleness threshold.
    pub async fn sweep_stale(&self) -> Result<usize, LogoError> {
        let now = self.clock.now();
        let mut failed = 0;
        for task in self.store.find_by_status(&TaskStatus::NON_TERMINAL).await? {
            if now - task.created_at <= self.policy.stale_after {
                // Oldest first, so the rest are fresh too
                break;
            }
            if self.time_out(&task, now).await? {
                failed += 1;
            }
        }
        Ok(failed)
    }

    /// Returns `true` if this call performed the transition.
    async fn time_out(&self, task: &LogoTask, now: DateTime<Utc>) -> Result<bool, LogoError> {
        let won = self
            .store
            .transition(
                &task.id,
                task.status,
                TaskStatus::Fail,
                Some(TaskResult::error(TIMEOUT_MESSAGE)),
                now,
            )
            .await?;
        if won {
            warn!(task_id = %task.id, status = %task.status, "Logo task timed out");
        }
        Ok(won)
    }
}

fn validate_assets(task: &LogoTask) -> Result<(), LogoError> {
    let images = match &task.result {
        Some(TaskResult::Assets { images, .. }) => images,
        _ => return Err(LogoError::MalformedResult("missing images".to_string())),
    };
    if images.is_empty() {
        return Err(LogoError::MalformedResult("image list is empty".to_string()));
    }
    if let Some(bad) = images
        .iter()
        .find(|url| !(url.starts_with("http://") || url.starts_with("https://")))
    {
        return Err(LogoError::MalformedResult(format!("invalid image url: {bad}")));
    }
    Ok(())
}
