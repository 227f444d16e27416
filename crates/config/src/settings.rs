use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub s3: S3Settings,
    pub provider: ProviderSettings,
    pub generation: GenerationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// `true` for MinIO-style `endpoint/bucket/key` addressing,
    /// `false` for virtual-hosted `bucket.endpoint/key`.
    pub path_style: bool,
    /// CDN or public bucket origin used for display URLs.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    /// "remote" or "local".
    pub backend: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub model_path: Option<String>,
    pub images_per_request: usize,
    pub image_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationSettings {
    /// Number of worker loops consuming the job queue.
    pub workers: usize,
    pub queue_capacity: usize,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub attempt_timeout_secs: u64,
    /// Non-terminal tasks older than this are declared timed out.
    pub stale_after_secs: u64,
    pub retention_days: u32,
    pub hd_url_ttl_secs: u64,
    /// 0 disables the background sweep.
    pub sweep_interval_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("LOGOFORGE"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "logoforge")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 86400)?
            .set_default("jwt.issuer", "logoforge")?
            .set_default("s3.endpoint", "http://localhost:9000")?
            .set_default("s3.access_key", "minioadmin")?
            .set_default("s3.secret_key", "minioadmin")?
            .set_default("s3.bucket", "logo-storage")?
            .set_default("s3.region", "us-east-1")?
            .set_default("s3.path_style", true)?
            .set_default("s3.public_base_url", None::<String>)?
            .set_default("provider.backend", "remote")?
            .set_default("provider.endpoint", None::<String>)?
            .set_default("provider.api_key", None::<String>)?
            .set_default("provider.timeout_secs", 60)?
            .set_default("provider.model_path", "models/logo_generator.bin")?
            .set_default("provider.images_per_request", 3)?
            .set_default("provider.image_size", 512)?
            .set_default("generation.workers", 4)?
            .set_default("generation.queue_capacity", 256)?
            .set_default("generation.max_attempts", 3)?
            .set_default("generation.retry_delay_secs", 5)?
            .set_default("generation.attempt_timeout_secs", 90)?
            .set_default("generation.stale_after_secs", 300)?
            .set_default("generation.retention_days", 7)?
            .set_default("generation.hd_url_ttl_secs", 86400)?
            .set_default("generation.sweep_interval_secs", 60)?
            .build()?;

        config.try_deserialize()
    }
}
