use logoforge_config::GenerationSettings;
use logoforge_db::models::{TaskResult, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::queue::{GenerationJob, JobReceiver};
use super::task_store::TaskStore;
use crate::clock::Clock;
use crate::dao::base::DaoResult;
use crate::provider::{GeneratedAssets, GenerationRequest, LogoProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(90),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
            attempt_timeout: Duration::from_secs(settings.attempt_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
    /// The claim was lost: another delivery owns the task or it is already terminal.
    Skipped,
    /// Generation finished but the task had been reconciled in the meantime.
    Discarded,
}

/// Drives one task from `pending` to a terminal state.
pub struct GenerationWorker {
    store: Arc<dyn TaskStore>,
    provider: Arc<dyn LogoProvider>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl GenerationWorker {
    pub fn new(
        store: Arc<dyn TaskStore>,
        provider: Arc<dyn LogoProvider>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
            policy,
        }
    }

    pub async fn process(&self, job: GenerationJob) -> DaoResult<JobOutcome> {
        let task_id = job.task_id.clone();

        let claimed = self
            .store
            .transition(&task_id, TaskStatus::Pending, TaskStatus::Processing, None, self.clock.now())
            .await?;
        if !claimed {
            debug!(%task_id, "Task already claimed or finished, skipping");
            return Ok(JobOutcome::Skipped);
        }

        let request = GenerationRequest {
            task_id: job.task_id,
            params: job.params,
        };

        match self.generate_with_retry(&request).await {
            Ok(assets) => {
                let count = assets.images.len();
                let result = TaskResult::Assets {
                    images: assets.images,
                    hd_keys: assets.hd_keys,
                };
                let stored = self
                    .store
                    .transition(&task_id, TaskStatus::Processing, TaskStatus::Success, Some(result), self.clock.now())
                    .await?;
                if !stored {
                    warn!(%task_id, "Task was reconciled before generation finished, discarding images");
                    return Ok(JobOutcome::Discarded);
                }
                info!(%task_id, count, provider = self.provider.name(), "Logo generation succeeded");
                Ok(JobOutcome::Succeeded)
            }
            Err(e) => {
                let message = format!(
                    "logo generation failed after {} attempts: {}",
                    self.policy.max_attempts, e
                );
                let stored = self
                    .store
                    .transition(
                        &task_id,
                        TaskStatus::Processing,
                        TaskStatus::Fail,
                        Some(TaskResult::error(&message)),
                        self.clock.now(),
                    )
                    .await?;
                if !stored {
                    warn!(%task_id, "Task was reconciled before generation gave up");
                    return Ok(JobOutcome::Discarded);
                }
                error!(%task_id, error = %e, "Logo generation failed");
                Ok(JobOutcome::Failed)
            }
        }
    }

    async fn generate_with_retry(&self, request: &GenerationRequest) -> Result<GeneratedAssets, ProviderError> {
        let mut attempt = 1;
        loop {
            let outcome = tokio::time::timeout(self.policy.attempt_timeout, self.provider.generate(request))
                .await
                .unwrap_or(Err(ProviderError::Timeout));

            let e = match outcome {
                Ok(assets) if !assets.images.is_empty() => return Ok(assets),
                Ok(_) => ProviderError::EmptyResult,
                Err(e) => e,
            };

            if attempt >= self.policy.max_attempts {
                return Err(e);
            }
            warn!(
                task_id = %request.task_id,
                attempt,
                max_attempts = self.policy.max_attempts,
                error = %e,
                "Generation attempt failed, retrying"
            );
            attempt += 1;
            tokio::time::sleep(self.policy.retry_delay).await;
        }
    }

    async fn run(self: Arc<Self>, worker_id: usize, jobs: JobReceiver) {
        debug!(worker_id, "Generation worker started");
        while let Some(job) = jobs.recv().await {
            let task_id = job.task_id.clone();
            if let Err(e) = self.process(job).await {
                error!(worker_id, %task_id, error = %e, "Generation job aborted by store error");
            }
        }
        debug!(worker_id, "Generation worker stopped");
    }

    /// Starts `workers` consumer loops sharing one receiver.
    pub fn spawn_pool(self: Arc<Self>, workers: usize, jobs: JobReceiver) -> Vec<JoinHandle<()>> {
        info!(workers, provider = self.provider.name(), "Starting generation workers");
        (0..workers.max(1))
            .map(|id| tokio::spawn(Arc::clone(&self).run(id, jobs.clone())))
            .collect()
    }
}
