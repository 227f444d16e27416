use image::{Rgb, RgbImage};
use logoforge_api::state::build_provider;
use logoforge_services::{ImageModel, MemoryStorage, ModelLoader};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::fixtures::test_app::{TestApp, test_settings};

struct GradientModel;

impl ImageModel for GradientModel {
    fn generate(&self, _prompt: &str, count: usize, size: u32) -> anyhow::Result<Vec<RgbImage>> {
        Ok((0..count)
            .map(|i| RgbImage::from_fn(size, size, |x, y| Rgb([x as u8 * 8, y as u8 * 8, i as u8 * 60])))
            .collect())
    }
}

#[derive(Default)]
struct RecordingLoader {
    paths: Mutex<Vec<String>>,
}

impl ModelLoader for RecordingLoader {
    fn load(&self, model_path: &str) -> anyhow::Result<Arc<dyn ImageModel>> {
        self.paths.lock().unwrap().push(model_path.to_string());
        Ok(Arc::new(GradientModel))
    }
}

#[tokio::test]
async fn local_backend_serves_uploaded_renditions() {
    let loader = Arc::new(RecordingLoader::default());
    let app = TestApp::spawn_local(loader.clone()).await;
    let token = app.token_for("alice");
    let task_id = app.submit_logo(&token).await;
    app.wait_for_status(&token, &task_id, "success").await;

    let resp = app
        .auth_get(&format!("/api/logo/result?task_id={}", task_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(
        json["logos"],
        serde_json::json!([
            format!("https://storage.local/logoforge-test/normal/logo_{task_id}_0.jpg"),
            format!("https://storage.local/logoforge-test/normal/logo_{task_id}_1.jpg"),
        ])
    );

    let jpeg = app.storage.get(&format!("normal/logo_{task_id}_0.jpg")).unwrap();
    assert_eq!(jpeg.content_type, "image/jpeg");
    let png = app.storage.get(&format!("hd/logo_{task_id}_1_hd.png")).unwrap();
    assert_eq!(png.content_type, "image/png");

    let resp = app
        .auth_get(&format!("/api/image/hd-url?logo_id={}", task_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert!(
        json["hd_url"]
            .as_str()
            .unwrap()
            .starts_with(&format!("memory://logoforge-test/hd/logo_{task_id}_0_hd.png?expires="))
    );

    assert_eq!(*loader.paths.lock().unwrap(), vec!["models/test.bin".to_string()]);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn backend_selection_checks_its_inputs() {
    let storage = Arc::new(MemoryStorage::new("logoforge-test"));
    let loader: Arc<dyn ModelLoader> = Arc::new(RecordingLoader::default());
    let mut settings = test_settings();

    let err = build_provider(&settings, storage.clone(), None)
        .err()
        .expect("remote backend without endpoint must fail");
    assert!(err.to_string().contains("provider.endpoint"));

    settings.provider.endpoint = Some("http://127.0.0.1:9/generate".to_string());
    let remote = build_provider(&settings, storage.clone(), None).unwrap();
    assert_eq!(remote.name(), "remote");

    settings.provider.backend = "local".to_string();
    settings.provider.model_path = Some("models/test.bin".to_string());
    let err = build_provider(&settings, storage.clone(), None)
        .err()
        .expect("local backend without loader must fail");
    assert!(err.to_string().contains("model loader"));

    let local = build_provider(&settings, storage.clone(), Some(loader.clone())).unwrap();
    assert_eq!(local.name(), "local");

    settings.provider.model_path = None;
    let err = build_provider(&settings, storage.clone(), Some(loader.clone()))
        .err()
        .expect("local backend without model path must fail");
    assert!(err.to_string().contains("provider.model_path"));

    settings.provider.backend = "quantum".to_string();
    assert!(build_provider(&settings, storage, None).is_err());
}
