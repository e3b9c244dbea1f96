//! HTTP client for network-based API calls

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::ProductApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::query::{PaginatedResponse, QuerySpec};

/// HTTP client for making network requests to the catalog server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map an HTTP response onto the client error taxonomy
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_message(&text);
            return Err(match status {
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ClientError::Validation(message)
                }
                StatusCode::CONFLICT => ClientError::Conflict(message),
                StatusCode::PAYLOAD_TOO_LARGE => ClientError::PayloadTooLarge,
                StatusCode::UNSUPPORTED_MEDIA_TYPE => ClientError::UnsupportedMediaType(message),
                s if s.is_server_error() => ClientError::Server(s.as_u16(), message),
                s => ClientError::InvalidResponse(format!("Unexpected status {s}: {message}")),
            });
        }

        response.json().await.map_err(Into::into)
    }
}

/// Pull the `message` field out of an error body, falling back to raw text
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl ProductApi for HttpClient {
    async fn list(&self, spec: &QuerySpec) -> ClientResult<PaginatedResponse<Product>> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", spec.page.to_string()),
            ("limit", spec.limit.to_string()),
            ("sort", spec.sort.as_str().to_string()),
            ("order", spec.order.as_str().to_string()),
        ];
        if let Some(q) = &spec.search {
            params.push(("q", q.clone()));
        }
        if let Some(min) = spec.min_price {
            params.push(("minPrice", min.to_string()));
        }
        if let Some(max) = spec.max_price {
            params.push(("maxPrice", max.to_string()));
        }

        let response = self
            .client
            .get(self.url("/api/products"))
            .query(&params)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn get(&self, id: i64) -> ClientResult<Product> {
        let response = self
            .client
            .get(self.url(&format!("/api/products/{id}")))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn create(&self, payload: &ProductCreate) -> ClientResult<Product> {
        let response = self
            .client
            .post(self.url("/api/products"))
            .json(payload)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn update(&self, id: i64, payload: &ProductUpdate) -> ClientResult<Product> {
        let response = self
            .client
            .put(self.url(&format!("/api/products/{id}")))
            .json(payload)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete(&self, id: i64) -> ClientResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/products/{id}")))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            // 200 or 204, no body either way
            return Ok(());
        }
        // Reuse the error mapping; the Ok type is never produced here
        Self::handle_response::<serde_json::Value>(response)
            .await
            .map(|_| ())
    }

    async fn upload_photo(
        &self,
        id: i64,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Product> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(&format!("/api/products/{id}/photo")))
            .multipart(form)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete_photo(&self, id: i64) -> ClientResult<Product> {
        let response = self
            .client
            .delete(self.url(&format!("/api/products/{id}/photo")))
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
