//! JSON/HTTP implementation of [`StoreBackend`].

use std::sync::Arc;

use qkart_core::{CartEntry, CartUpsert, ErrorEnvelope, Product};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, StoreBackend};
use crate::config::BackendConfig;

/// Longest slice of a raw response body kept in errors and logs.
const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for the storefront backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    products_url: Url,
    search_url: Url,
    cart_url: Url,
}

impl RestClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the endpoints cannot be derived from
    /// the base URL or the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("HTTP client: {e}")))?;

        let join = |path: &str| {
            config
                .base_url
                .join(path)
                .map_err(|e| ApiError::Config(format!("endpoint {path}: {e}")))
        };

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                products_url: join("products")?,
                search_url: join("products/search")?,
                cart_url: join("cart")?,
            }),
        })
    }

    /// Send a request and decode a JSON success body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Backend request failed before a response arrived");
            ApiError::Connectivity(e.to_string())
        })?;

        let status = response.status();

        // Read as text first for better error diagnostics
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %preview(&body),
                    "Backend returned server error"
                );
            } else {
                debug!(status = %status, error = %err, "Backend rejected request");
            }
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&body),
                "Failed to parse backend response"
            );
            ApiError::InvalidResponse(e.to_string())
        })
    }
}

impl StoreBackend for RestClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let request = self.inner.client.get(self.inner.products_url.clone());
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn search_products(&self, text: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.inner.search_url.clone();
        url.query_pairs_mut().append_pair("value", text);

        let request = self.inner.client.get(url);
        self.send(request).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.inner.cart_url.clone())
            .bearer_auth(token.expose_secret());
        self.send(request).await
    }

    #[instrument(skip(self, token), fields(product_id = %upsert.product_id, qty = upsert.qty))]
    async fn upsert_cart_item(
        &self,
        token: &SecretString,
        upsert: &CartUpsert,
    ) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .post(self.inner.cart_url.clone())
            .bearer_auth(token.expose_secret())
            .json(upsert);
        self.send(request).await
    }
}

/// Map a non-success response onto an [`ApiError`].
///
/// The message comes from the `{success, message}` envelope when the body
/// has one, otherwise from the raw body, otherwise from the status text.
fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                preview(trimmed)
            }
        },
        |envelope| envelope.message,
    );

    let code = status.as_u16();
    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(message)
    } else if status.is_client_error() {
        ApiError::Client {
            status: code,
            message,
        }
    } else {
        ApiError::Server {
            status: code,
            message,
        }
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
