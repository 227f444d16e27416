use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{GeneratedAssets, GenerationRequest, LogoProvider, ProviderError};

/// Generation delegated to an HTTP inference service.
pub struct RemoteProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RemoteRequest<'a> {
    task_id: &'a str,
    company_name: &'a str,
    industry: &'a str,
    styles: &'a [String],
    colors: &'a [String],
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    success: bool,
    #[serde(default)]
    logos: Vec<String>,
    #[serde(default)]
    hd_keys: Option<Vec<String>>,
    message: Option<String>,
}

impl RemoteProvider {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl LogoProvider for RemoteProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAssets, ProviderError> {
        let params = &request.params;
        let body = RemoteRequest {
            task_id: &request.task_id,
            company_name: &params.company_name,
            industry: &params.industry,
            styles: &params.styles,
            colors: &params.colors,
            description: params.description.as_deref(),
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Rejected(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        let parsed: RemoteResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if !parsed.success {
            return Err(ProviderError::Rejected(
                parsed.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        if parsed.logos.is_empty() {
            return Err(ProviderError::EmptyResult);
        }

        let hd_keys = match parsed.hd_keys {
            Some(keys) if keys.len() == parsed.logos.len() => keys,
            Some(keys) => {
                warn!(
                    task_id = %request.task_id,
                    logos = parsed.logos.len(),
                    hd_keys = keys.len(),
                    "Dropping hd keys that do not line up with logos"
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        debug!(task_id = %request.task_id, count = parsed.logos.len(), "Remote generation complete");
        Ok(GeneratedAssets {
            images: parsed.logos,
            hd_keys,
        })
    }

    fn name(&self) -> &str {
        "remote"
    }
}
