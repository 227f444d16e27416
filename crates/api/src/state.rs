use logoforge_config::Settings;
use logoforge_services::{
    AuthService, Clock, GenerationWorker, LifecyclePolicy, LocalProvider, LogoProvider,
    LogoTaskService, ModelLoader, ObjectStorage, RemoteProvider, RetryPolicy, S3Storage,
    SystemClock, TaskStore,
    dao::LogoTaskDao,
    generation::{queue, spawn_sweeper},
};
use mongodb::Database;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub logos: Arc<LogoTaskService>,
}

impl AppState {
    /// Production wiring: MongoDB task store, S3 storage and the configured provider.
    /// `model_loader` is required when `provider.backend` is "local".
    pub fn new(
        db: &Database,
        settings: Settings,
        model_loader: Option<Arc<dyn ModelLoader>>,
    ) -> anyhow::Result<Self> {
        let store: Arc<dyn TaskStore> = Arc::new(LogoTaskDao::new(db));
        let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(&settings.s3)?);
        let provider = build_provider(&settings, storage.clone(), model_loader)?;

        Self::with_components(settings, store, storage, provider, Arc::new(SystemClock))
    }

    /// Assembles the lifecycle service and starts the worker pool and sweeper.
    /// Must be called from within a tokio runtime.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn TaskStore>,
        storage: Arc<dyn ObjectStorage>,
        provider: Arc<dyn LogoProvider>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let generation = &settings.generation;
        let policy = LifecyclePolicy::from_settings(generation)?;
        let (jobs, receiver) = queue::channel(generation.queue_capacity);

        let worker = Arc::new(GenerationWorker::new(
            store.clone(),
            provider,
            clock.clone(),
            RetryPolicy::from_settings(generation),
        ));
        worker.spawn_pool(generation.workers, receiver);

        let logos = Arc::new(LogoTaskService::new(
            store,
            storage,
            jobs,
            clock,
            policy,
        ));

        if generation.sweep_interval_secs > 0 {
            spawn_sweeper(logos.clone(), Duration::from_secs(generation.sweep_interval_secs));
        }

        let auth = Arc::new(AuthService::new(settings.jwt.clone()));

        Ok(Self {
            settings,
            auth,
            logos,
        })
    }
}

/// Provider selected by `provider.backend`.
pub fn build_provider(
    settings: &Settings,
    storage: Arc<dyn ObjectStorage>,
    model_loader: Option<Arc<dyn ModelLoader>>,
) -> anyhow::Result<Arc<dyn LogoProvider>> {
    let provider = &settings.provider;
    match provider.backend.as_str() {
        "remote" => {
            let endpoint = provider
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("provider.endpoint is required for the remote backend"))?;
            info!(endpoint, "Using remote logo provider");
            Ok(Arc::new(RemoteProvider::new(
                endpoint,
                provider.api_key.clone(),
                Duration::from_secs(provider.timeout_secs),
            )?))
        }
        "local" => {
            let loader = model_loader
                .ok_or_else(|| anyhow::anyhow!("the local backend needs a model loader"))?;
            let model_path = provider
                .model_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("provider.model_path is required for the local backend"))?;
            info!(
                model_path,
                images = provider.images_per_request,
                size = provider.image_size,
                "Using local logo provider"
            );
            Ok(Arc::new(LocalProvider::new(
                loader,
                model_path,
                storage,
                provider.images_per_request,
                provider.image_size,
            )))
        }
        other => anyhow::bail!("unknown provider backend: {other}"),
    }
}
