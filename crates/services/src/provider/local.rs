use async_trait::async_trait;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use logoforge_db::models::LogoParams;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{GeneratedAssets, GenerationRequest, LogoProvider, ProviderError};
use crate::storage::ObjectStorage;

const JPEG_QUALITY: u8 = 80;

/// Text-to-image model. Called on the blocking pool.
pub trait ImageModel: Send + Sync + 'static {
    fn generate(&self, prompt: &str, count: usize, size: u32) -> anyhow::Result<Vec<RgbImage>>;
}

/// Produces the model from `model_path` on first use. Called on the blocking pool.
pub trait ModelLoader: Send + Sync + 'static {
    fn load(&self, model_path: &str) -> anyhow::Result<Arc<dyn ImageModel>>;
}

/// In-process generation: runs an [`ImageModel`] and uploads the renditions.
pub struct LocalProvider {
    loader: Arc<dyn ModelLoader>,
    model_path: String,
    model: OnceCell<Arc<dyn ImageModel>>,
    storage: Arc<dyn ObjectStorage>,
    images_per_request: usize,
    image_size: u32,
}

struct Rendition {
    standard: Vec<u8>,
    hd: Vec<u8>,
}

impl LocalProvider {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        model_path: impl Into<String>,
        storage: Arc<dyn ObjectStorage>,
        images_per_request: usize,
        image_size: u32,
    ) -> Self {
        Self {
            loader,
            model_path: model_path.into(),
            model: OnceCell::new(),
            storage,
            images_per_request,
            image_size,
        }
    }

    async fn model(&self) -> Result<Arc<dyn ImageModel>, ProviderError> {
        // A failed init leaves the cell empty, so the next call tries again
        let model = self
            .model
            .get_or_try_init(|| async {
                info!(model_path = %self.model_path, "Loading image model");
                let loader = self.loader.clone();
                let path = self.model_path.clone();
                let model = tokio::task::spawn_blocking(move || loader.load(&path))
                    .await
                    .map_err(|e| ProviderError::ModelLoad(format!("join error: {e}")))?
                    .map_err(|e| ProviderError::ModelLoad(e.to_string()))?;
                info!("Image model loaded");
                Ok::<_, ProviderError>(model)
            })
            .await?;
        Ok(model.clone())
    }

    async fn deliver(&self, task_id: &str, index: usize, rendition: Rendition) -> Option<(String, String)> {
        let normal_key = format!("normal/logo_{task_id}_{index}.jpg");
        let hd_key = format!("hd/logo_{task_id}_{index}_hd.png");

        if let Err(e) = self
            .storage
            .upload(&normal_key, rendition.standard, "image/jpeg")
            .await
        {
            warn!(task_id, index, error = %e, "Standard rendition upload failed");
            return None;
        }
        if let Err(e) = self.storage.upload(&hd_key, rendition.hd, "image/png").await {
            warn!(task_id, index, error = %e, "HD rendition upload failed");
            return None;
        }

        Some((self.storage.public_url(&normal_key), hd_key))
    }
}

/// Flattens generation parameters into a single model prompt.
pub fn build_prompt(params: &LogoParams) -> String {
    let mut prompt = format!(
        "company: {}; industry: {}; styles: {}; colors: {}",
        params.company_name,
        params.industry,
        params.styles.join(", "),
        params.colors.join(", "),
    );
    if let Some(notes) = params.description.as_deref().filter(|d| !d.is_empty()) {
        prompt.push_str("; notes: ");
        prompt.push_str(notes);
    }
    prompt
}

fn encode(img: &RgbImage) -> Result<Rendition, image::ImageError> {
    let mut standard = Vec::new();
    JpegEncoder::new_with_quality(&mut standard, JPEG_QUALITY).encode_image(img)?;

    let mut hd = Cursor::new(Vec::new());
    img.write_to(&mut hd, image::ImageFormat::Png)?;

    Ok(Rendition {
        standard,
        hd: hd.into_inner(),
    })
}

#[async_trait]
impl LogoProvider for LocalProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAssets, ProviderError> {
        let model = self.model().await?;
        let prompt = build_prompt(&request.params);
        let count = self.images_per_request;
        let size = self.image_size;
        let task_id = request.task_id.clone();

        // Inference and encoding are CPU-bound
        let renditions = tokio::task::spawn_blocking(move || -> Result<Vec<Rendition>, ProviderError> {
            let images = model
                .generate(&prompt, count, size)
                .map_err(|e| ProviderError::Inference(e.to_string()))?;

            let mut out = Vec::with_capacity(images.len());
            for (i, img) in images.iter().enumerate() {
                match encode(img) {
                    Ok(r) => out.push(r),
                    Err(e) => warn!(task_id = %task_id, index = i, error = %e, "Failed to encode image"),
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| ProviderError::Inference(format!("join error: {e}")))??;

        let mut images = Vec::new();
        let mut hd_keys = Vec::new();
        for (i, rendition) in renditions.into_iter().enumerate() {
            if let Some((url, hd_key)) = self.deliver(&request.task_id, i, rendition).await {
                images.push(url);
                hd_keys.push(hd_key);
            }
        }

        if images.is_empty() {
            return Err(ProviderError::NoDeliverableImages);
        }

        debug!(task_id = %request.task_id, count = images.len(), "Local generation complete");
        Ok(GeneratedAssets { images, hd_keys })
    }

    fn name(&self) -> &str {
        "local"
    }
}
