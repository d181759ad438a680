//! Integration test support for the `QKart` storefront core.
//!
//! [`FakeQKart`] is an in-process HTTP backend implementing the storefront
//! REST contract under `/api/v1`:
//!
//! | Route | Behaviour |
//! |---|---|
//! | `GET /products` | catalog, or 500 when failing |
//! | `GET /products/search?value=` | name/category match, 404 when empty, 500 when failing |
//! | `GET /cart` | bearer-protected cart |
//! | `POST /cart` | bearer-protected upsert, 400 for unknown products |
//!
//! Errors use the backend's `{success: false, message}` envelope.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use qkart_core::{CartEntry, CartUpsert, ErrorEnvelope};
use qkart_storefront::{ConfigError, StorefrontConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Bearer token the fake accepts.
pub const TOKEN: &str = "integration-token";

pub const MISSING_TOKEN: &str = "Protected route, Oauth2 Bearer token not found";
pub const UNKNOWN_PRODUCT: &str = "Product doesn't exist";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Default)]
struct BackendState {
    products: Vec<Value>,
    cart: Vec<CartEntry>,
    fail_products: bool,
    fail_search: bool,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running fake backend. The server stops when this is dropped.
pub struct FakeQKart {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeQKart {
    /// Bind to an ephemeral port and serve `products`.
    pub async fn start(products: Vec<Value>) -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            products,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/api/v1/products", get(list_products))
            .route("/api/v1/products/search", get(search_products))
            .route("/api/v1/cart", get(fetch_cart).post(upsert_cart))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL the storefront should be configured with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Storefront configuration pointing at this backend.
    ///
    /// `extra` entries override or add environment variables.
    pub fn config(&self, extra: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("QKART_BACKEND_URL".to_string(), self.base_url()),
            ("QKART_HTTP_TIMEOUT_SECS".to_string(), "5".to_string()),
        ]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    /// Configuration with a signed-in session using [`TOKEN`].
    pub fn signed_in_config(&self) -> Result<StorefrontConfig, ConfigError> {
        self.config(&[("QKART_USERNAME", "crio-user"), ("QKART_TOKEN", TOKEN)])
    }

    pub fn set_cart(&self, entries: &[(&str, u32)]) {
        lock(&self.state).cart = entries
            .iter()
            .map(|(id, qty)| CartEntry::new(*id, *qty))
            .collect();
    }

    #[must_use]
    pub fn cart(&self) -> Vec<CartEntry> {
        lock(&self.state).cart.clone()
    }

    pub fn fail_products(&self, fail: bool) {
        lock(&self.state).fail_products = fail;
    }

    pub fn fail_search(&self, fail: bool) {
        lock(&self.state).fail_search = fail;
    }

    /// Requests received so far, as `METHOD /path?query`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Search requests received so far.
    #[must_use]
    pub fn search_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with("GET /products/search"))
            .collect()
    }
}

impl Drop for FakeQKart {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Phone (A, 100) and Ball (B, 20), as the backend serializes them.
#[must_use]
pub fn phone_and_ball() -> Vec<Value> {
    vec![
        json!({
            "_id": "A",
            "name": "Phone",
            "category": "Electronics",
            "cost": 100,
            "rating": 4,
            "image": "https://i.imgur.com/phone.png"
        }),
        json!({
            "_id": "B",
            "name": "Ball",
            "category": "Sports",
            "cost": 20,
            "rating": 5,
            "image": "https://i.imgur.com/ball.png"
        }),
    ]
}

fn envelope(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorEnvelope::failure(message))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        == Some(TOKEN)
}

async fn list_products(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.requests.push("GET /products".to_string());
    if state.fail_products {
        return envelope(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
    }
    Json(state.products.clone()).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    value: String,
}

async fn search_products(
    State(state): State<Shared>,
    Query(params): Query<SearchParams>,
) -> Response {
    let mut state = lock(&state);
    state
        .requests
        .push(format!("GET /products/search?value={}", params.value));
    if state.fail_search {
        return envelope(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
    }

    let needle = params.value.to_lowercase();
    let matches: Vec<Value> = state
        .products
        .iter()
        .filter(|product| {
            ["name", "category"].iter().any(|field| {
                product
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        return envelope(StatusCode::NOT_FOUND, "No products found");
    }
    Json(matches).into_response()
}

async fn fetch_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    state.requests.push("GET /cart".to_string());
    if !authorized(&headers) {
        return envelope(StatusCode::UNAUTHORIZED, MISSING_TOKEN);
    }
    Json(state.cart.clone()).into_response()
}

async fn upsert_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(upsert): Json<CartUpsert>,
) -> Response {
    let mut state = lock(&state);
    state
        .requests
        .push(format!("POST /cart {} {}", upsert.product_id, upsert.qty));
    if !authorized(&headers) {
        return envelope(StatusCode::UNAUTHORIZED, MISSING_TOKEN);
    }

    let known = state
        .products
        .iter()
        .any(|product| product.get("_id").and_then(Value::as_str) == Some(upsert.product_id.as_str()));
    if !known {
        return envelope(StatusCode::BAD_REQUEST, UNKNOWN_PRODUCT);
    }

    match state
        .cart
        .iter_mut()
        .find(|entry| entry.product_id == upsert.product_id)
    {
        Some(entry) => entry.qty = upsert.qty,
        None => state
            .cart
            .push(CartEntry::new(upsert.product_id.clone(), upsert.qty)),
    }
    Json(state.cart.clone()).into_response()
}
