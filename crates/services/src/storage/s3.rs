use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use logoforge_config::S3Settings;
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

use super::{MAX_SIGNED_URL_TTL, ObjectStorage, StorageError, validate_key};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// S3-compatible object storage (AWS, MinIO, COS/OSS S3 gateways) signed with SigV4.
pub struct S3Storage {
    client: reqwest::Client,
    settings: S3Settings,
    scheme: String,
    host: String,
}

impl S3Storage {
    pub fn new(settings: &S3Settings) -> Result<Self, StorageError> {
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|e| StorageError::Signing(format!("invalid endpoint {}: {}", settings.endpoint, e)))?;
        let endpoint_host = endpoint
            .host_str()
            .ok_or_else(|| StorageError::Signing(format!("endpoint {} has no host", settings.endpoint)))?;
        let endpoint_host = match endpoint.port() {
            Some(port) => format!("{endpoint_host}:{port}"),
            None => endpoint_host.to_string(),
        };
        let host = if settings.path_style {
            endpoint_host
        } else {
            format!("{}.{}", settings.bucket, endpoint_host)
        };

        Ok(Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
            scheme: endpoint.scheme().to_string(),
            host,
        })
    }

    fn canonical_uri(&self, key: &str) -> String {
        let encoded = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if self.settings.path_style {
            format!("/{}/{}", self.settings.bucket, encoded)
        } else {
            format!("/{encoded}")
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.canonical_uri(key))
    }

    fn scope(&self, now: DateTime<Utc>) -> String {
        format!("{}/{}/s3/aws4_request", now.format("%Y%m%d"), self.settings.region)
    }

    fn signature(&self, now: DateTime<Utc>, canonical_request: &str) -> Result<String, StorageError> {
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            now.format("%Y%m%dT%H%M%SZ"),
            self.scope(now),
            sha256_hex(canonical_request.as_bytes()),
        );

        let date = now.format("%Y%m%d").to_string();
        let secret = format!("AWS4{}", self.settings.secret_key);
        let key = hmac_sha256(secret.as_bytes(), &date)?;
        let key = hmac_sha256(&key, &self.settings.region)?;
        let key = hmac_sha256(&key, "s3")?;
        let key = hmac_sha256(&key, "aws4_request")?;

        Ok(hex::encode(hmac_sha256(&key, &string_to_sign)?))
    }

    /// Builds a presigned GET URL valid for `ttl` from `now`.
    pub fn presign_get(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> Result<String, StorageError> {
        validate_key(key)?;

        let expires = ttl.as_secs().clamp(1, MAX_SIGNED_URL_TTL.as_secs());
        let credential = format!("{}/{}", self.settings.access_key, self.scope(now));
        // Parameters must stay sorted by name
        let query = format!(
            "X-Amz-Algorithm={ALGORITHM}&X-Amz-Credential={}&X-Amz-Date={}&X-Amz-Expires={}&X-Amz-SignedHeaders=host",
            urlencoding::encode(&credential),
            now.format("%Y%m%dT%H%M%SZ"),
            expires,
        );
        let uri = self.canonical_uri(key);
        let canonical_request = format!(
            "GET\n{uri}\n{query}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            self.host
        );

        let signature = self.signature(now, &canonical_request)?;
        Ok(format!(
            "{}://{}{}?{}&X-Amz-Signature={}",
            self.scheme, self.host, uri, query, signature
        ))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = sha256_hex(&bytes);
        let uri = self.canonical_uri(key);

        let signed_headers = "content-type;host;x-amz-content-sha256;x-amz-date";
        let canonical_headers = format!(
            "content-type:{content_type}\nhost:{}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n",
            self.host
        );
        let canonical_request =
            format!("PUT\n{uri}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}");
        let signature = self.signature(now, &canonical_request)?;
        let authorization = format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={signed_headers}, Signature={signature}",
            self.settings.access_key,
            self.scope(now),
        );

        let size = bytes.len();
        let response = self
            .client
            .put(self.object_url(key))
            .header("content-type", content_type)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status { status, body });
        }

        debug!(key, size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        match &self.settings.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => self.object_url(key),
        }
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.presign_get(key, ttl, Utc::now())
    }
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, StorageError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
