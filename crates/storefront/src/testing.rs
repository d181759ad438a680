//! Scripted in-memory backend for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use qkart_core::{CartEntry, CartUpsert, Product, ProductId, Rating};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;

use crate::backend::{ApiError, StoreBackend};
use crate::notify::Notice;
use crate::session::Session;

pub const TOKEN: &str = "test-token";

/// A call the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListProducts,
    Search(String),
    FetchCart,
    Upsert(CartUpsert),
}

#[derive(Default)]
struct Script {
    products: Vec<Product>,
    list_error: Option<ApiError>,
    search_error: Option<ApiError>,
    search_delays: HashMap<String, Duration>,
    cart: Vec<CartEntry>,
    cart_error: Option<ApiError>,
    upsert_error: Option<ApiError>,
    upsert_delays: HashMap<ProductId, Duration>,
}

/// Behaves like the real backend: search matches name or category,
/// `POST /cart` sets the quantity and returns the whole cart.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn with_products(products: Vec<Product>) -> Self {
        let backend = Self::default();
        backend.script.lock().unwrap().products = products;
        backend
    }

    pub fn set_cart(&self, cart: Vec<CartEntry>) {
        self.script.lock().unwrap().cart = cart;
    }

    pub fn fail_list(&self, err: ApiError) {
        self.script.lock().unwrap().list_error = Some(err);
    }

    pub fn fail_search(&self, err: ApiError) {
        self.script.lock().unwrap().search_error = Some(err);
    }

    pub fn delay_search(&self, text: &str, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .search_delays
            .insert(text.to_string(), delay);
    }

    pub fn fail_cart(&self, err: ApiError) {
        self.script.lock().unwrap().cart_error = Some(err);
    }

    pub fn fail_upsert(&self, err: ApiError) {
        self.script.lock().unwrap().upsert_error = Some(err);
    }

    pub fn delay_upsert(&self, product_id: &str, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .upsert_delays
            .insert(ProductId::new(product_id), delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_token(token: &SecretString) -> Result<(), ApiError> {
        if token.expose_secret() == TOKEN {
            Ok(())
        } else {
            Err(ApiError::Client {
                status: 401,
                message: "Protected route, Oauth2 Bearer token not found".to_string(),
            })
        }
    }
}

impl StoreBackend for FakeBackend {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(Call::ListProducts);
        let script = self.script.lock().unwrap();
        match &script.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(script.products.clone()),
        }
    }

    async fn search_products(&self, text: &str) -> Result<Vec<Product>, ApiError> {
        self.record(Call::Search(text.to_string()));
        let (result, delay) = {
            let script = self.script.lock().unwrap();
            let needle = text.to_lowercase();
            let result = script.search_error.clone().map_or_else(
                || {
                    let found: Vec<Product> = script
                        .products
                        .iter()
                        .filter(|p| {
                            p.name.to_lowercase().contains(&needle)
                                || p.category.to_lowercase().contains(&needle)
                        })
                        .cloned()
                        .collect();
                    if found.is_empty() {
                        Err(ApiError::NotFound("No products found".to_string()))
                    } else {
                        Ok(found)
                    }
                },
                Err,
            );
            (result, script.search_delays.get(text).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
        self.record(Call::FetchCart);
        Self::check_token(token)?;
        let script = self.script.lock().unwrap();
        match &script.cart_error {
            Some(err) => Err(err.clone()),
            None => Ok(script.cart.clone()),
        }
    }

    async fn upsert_cart_item(
        &self,
        token: &SecretString,
        upsert: &CartUpsert,
    ) -> Result<Vec<CartEntry>, ApiError> {
        self.record(Call::Upsert(upsert.clone()));
        Self::check_token(token)?;
        let (result, delay) = {
            let mut script = self.script.lock().unwrap();
            let delay = script.upsert_delays.get(&upsert.product_id).copied();
            if let Some(err) = &script.upsert_error {
                (Err(err.clone()), delay)
            } else {
                match script
                    .cart
                    .iter_mut()
                    .find(|e| e.product_id == upsert.product_id)
                {
                    Some(entry) => entry.qty = upsert.qty,
                    None => script
                        .cart
                        .push(CartEntry::new(upsert.product_id.clone(), upsert.qty)),
                }
                (Ok(script.cart.clone()), delay)
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

pub fn product(id: &str, name: &str, cost: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: "Misc".to_string(),
        cost: Decimal::from(cost),
        rating: Rating::new(4).unwrap(),
        image: format!("https://i.imgur.com/{id}.jpg"),
    }
}

/// Phone (A, 100) and Ball (B, 20).
pub fn phone_and_ball() -> Vec<Product> {
    vec![product("A", "Phone", 100), product("B", "Ball", 20)]
}

pub fn session() -> Session {
    Session::new("crio-user", SecretString::from(TOKEN))
}

pub fn shared(backend: FakeBackend) -> Arc<FakeBackend> {
    Arc::new(backend)
}

pub fn notices() -> (Arc<mpsc::UnboundedSender<Notice>>, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        out.push(notice);
    }
    out
}
