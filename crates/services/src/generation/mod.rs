pub mod queue;
pub mod sweeper;
pub mod task_service;
pub mod task_store;
pub mod worker;

pub use queue::{EnqueueError, GenerationJob, JobQueue, JobReceiver};
pub use sweeper::spawn_sweeper;
pub use task_service::{HdUrl, LifecyclePolicy, LogoError, LogoTaskService};
pub use task_store::{MemoryTaskStore, TaskStore};
pub use worker::{GenerationWorker, JobOutcome, RetryPolicy};
