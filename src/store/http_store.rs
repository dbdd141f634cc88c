use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;

use crate::core::{Blob, BlobStore, Location, Lookup};

/// Direct object storage reached over HTTP: `GET {base}/{namespace}/{path}` returns the raw
/// file bytes and a `Content-Type` header.
///
/// `404 Not Found` and `410 Gone` are reported as [`Lookup::Missing`]; any other unsuccessful
/// status, and every connection problem, is a transport error. Errors never carry the
/// request URL.
#[derive(Debug, Clone, Default)]
pub struct HttpStore {
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (timeouts, proxies, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for HttpStore {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        let response = self
            .client
            .get(location.to_string())
            .send()
            .await
            .map_err(|e| anyhow!(e.without_url()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(Lookup::Missing);
        }
        if !status.is_success() {
            return Err(anyhow!("backing store answered {status}"));
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| anyhow!(e.without_url()))?;

        Ok(Lookup::Found(Blob {
            bytes: bytes.to_vec(),
            media_type,
        }))
    }
}
