use async_trait::async_trait;
use logoforge_services::provider::{GeneratedAssets, GenerationRequest, LogoProvider, ProviderError};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What the fake provider does on every call.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Two images and matching hd keys derived from the task id.
    Succeed,
    SucceedWith(GeneratedAssets),
    Fail(String),
    /// Never answers within a test's lifetime.
    Hang,
}

/// Provider double whose behavior can be switched mid-test.
pub struct FakeProvider {
    behavior: Mutex<Behavior>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogoProvider for FakeProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAssets, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();

        match behavior {
            Behavior::Succeed => {
                let id = &request.task_id;
                Ok(GeneratedAssets {
                    images: (0..2)
                        .map(|i| format!("https://cdn.test/normal/logo_{id}_{i}.jpg"))
                        .collect(),
                    hd_keys: (0..2).map(|i| format!("hd/logo_{id}_{i}_hd.png")).collect(),
                })
            }
            Behavior::SucceedWith(assets) => Ok(assets),
            Behavior::Fail(message) => Err(ProviderError::Rejected(message)),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Timeout)
            }
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
