pub mod auth;
pub mod clock;
pub mod dao;
pub mod generation;
pub mod provider;
pub mod storage;

pub use auth::AuthService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use dao::*;
pub use generation::{
    GenerationWorker, LifecyclePolicy, LogoError, LogoTaskService, MemoryTaskStore, RetryPolicy,
    TaskStore,
};
pub use provider::{ImageModel, LocalProvider, LogoProvider, ModelLoader, RemoteProvider};
pub use storage::{MemoryStorage, ObjectStorage, S3Storage};
