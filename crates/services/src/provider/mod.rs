pub mod local;
pub mod remote;

use async_trait::async_trait;
use logoforge_db::models::LogoParams;
use thiserror::Error;

pub use local::{ImageModel, LocalProvider, ModelLoader};
pub use remote::RemoteProvider;

/// One generation call for a task.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task_id: String,
    pub params: LogoParams,
}

/// Output of a successful generation. `images` is never empty; `hd_keys` is
/// either empty or parallel to `images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAssets {
    pub images: Vec<String>,
    pub hd_keys: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider timed out")]
    Timeout,
    #[error("could not connect to provider: {0}")]
    Connection(String),
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("provider returned no images")]
    EmptyResult,
    #[error("model failed to load: {0}")]
    ModelLoad(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("no image could be delivered to storage")]
    NoDeliverableImages,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::Connection(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Pluggable logo generator.
#[async_trait]
pub trait LogoProvider: Send + Sync + 'static {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAssets, ProviderError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}
