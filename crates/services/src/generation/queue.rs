use logoforge_db::models::LogoParams;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

/// Unit of work handed from the request path to the worker pool.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub task_id: String,
    pub params: LogoParams,
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("job queue is full")]
    Full,
    #[error("job queue is closed")]
    Closed,
}

/// Producer half of the bounded job queue.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<GenerationJob>,
}

/// Consumer half, shared by every worker loop.
#[derive(Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<GenerationJob>>>,
}

pub fn channel(capacity: usize) -> (JobQueue, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        JobQueue { tx },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl JobQueue {
    /// Never waits: a full queue is reported instead of applying backpressure
    /// to the request path.
    pub fn enqueue(&self, job: GenerationJob) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

impl JobReceiver {
    /// Next job, or `None` once every producer is gone and the queue is drained.
    pub async fn recv(&self) -> Option<GenerationJob> {
        self.rx.lock().await.recv().await
    }

    /// Non-blocking poll.
    pub async fn try_recv(&self) -> Option<GenerationJob> {
        self.rx.lock().await.try_recv().ok()
    }
}
