//! Integration test support for the storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```
//!
//! # Test Context
//!
//! - [`FakeStockApi`] - in-process `axum` server speaking the stock API
//!   (`/stock/{id}`, `/products/{id}`) on an ephemeral port
//! - [`RecordingNotifier`] - collects user warnings for assertions
//! - [`open_store`] - wires a real `HttpStockClient` and `FileStore` together

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use storefront_cart::{
    CartStore, FileStore, HeadroomPolicy, HttpStockClient, Notifier, StockApiConfig,
    StoreOptions,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Key used for the cart snapshot in tests.
pub const TEST_KEY: &str = "storefront:cart";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Fake Stock API
// =============================================================================

#[derive(Default)]
struct ApiState {
    stock: Mutex<HashMap<i32, u32>>,
    products: Mutex<HashMap<i32, Value>>,
    forced_status: AtomicU16,
    malformed: AtomicBool,
    stock_hits: AtomicUsize,
    product_hits: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
}

impl ApiState {
    fn record(&self, headers: &HeaderMap) -> Option<Response> {
        *lock(&self.last_authorization) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let status = self.forced_status.load(Ordering::SeqCst);
        if status != 0 {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Some((status, "upstream exploded").into_response());
        }
        if self.malformed.load(Ordering::SeqCst) {
            return Some((StatusCode::OK, "{\"id\": oops").into_response());
        }
        None
    }
}

/// In-process stand-in for the stock/product API.
///
/// The server task is aborted when this value is dropped.
pub struct FakeStockApi {
    addr: SocketAddr,
    state: Arc<ApiState>,
    task: JoinHandle<()>,
}

impl FakeStockApi {
    /// Bind to an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(ApiState::default());

        let router = Router::new()
            .route("/stock/{id}", get(get_stock))
            .route("/products/{id}", get(get_product))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(%addr, error = %e, "Fake stock API stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL of the fake API.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this API.
    ///
    /// # Panics
    ///
    /// Panics if the generated URL does not parse, which would be a bug here.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn api_config(&self) -> StockApiConfig {
        StockApiConfig::new(&self.base_url()).expect("fake API URL is valid")
    }

    /// Register a product with the given stock and unit price in cents.
    pub fn add_product(&self, id: i32, stock: u32, price_cents: i64) {
        lock(&self.state.stock).insert(id, stock);
        #[allow(clippy::cast_precision_loss)]
        let price = price_cents as f64 / 100.0;
        lock(&self.state.products).insert(
            id,
            json!({
                "id": id,
                "title": format!("Sneaker {id}"),
                "price": price,
                "image": format!("https://cdn.example.com/sneakers/{id}.jpg"),
            }),
        );
    }

    /// Register a product with the given stock, served as `product` verbatim.
    pub fn add_product_json(&self, id: i32, stock: u32, product: Value) {
        lock(&self.state.stock).insert(id, stock);
        lock(&self.state.products).insert(id, product);
    }

    /// Change the available stock of a product.
    pub fn set_stock(&self, id: i32, stock: u32) {
        lock(&self.state.stock).insert(id, stock);
    }

    /// Answer every request with `status` (0 restores normal behaviour).
    pub fn force_status(&self, status: u16) {
        self.state.forced_status.store(status, Ordering::SeqCst);
    }

    /// Answer every request with an undecodable 200 body.
    pub fn serve_malformed(&self, malformed: bool) {
        self.state.malformed.store(malformed, Ordering::SeqCst);
    }

    /// Number of `/stock/{id}` requests served.
    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }

    /// Number of `/products/{id}` requests served.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.state.last_authorization).clone()
    }
}

impl Drop for FakeStockApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn get_stock(
    State(state): State<Arc<ApiState>>,
    UrlPath(id): UrlPath<i32>,
    headers: HeaderMap,
) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.record(&headers) {
        return response;
    }

    let amount = lock(&state.stock).get(&id).copied();
    amount.map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
        |amount| Json(json!({ "id": id, "amount": amount })).into_response(),
    )
}

async fn get_product(
    State(state): State<Arc<ApiState>>,
    UrlPath(id): UrlPath<i32>,
    headers: HeaderMap,
) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.record(&headers) {
        return response;
    }

    let product = lock(&state.products).get(&id).cloned();
    product.map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
        |product| Json(product).into_response(),
    )
}

// =============================================================================
// Notifier
// =============================================================================

/// Notifier that records every warning.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Warnings received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}

// =============================================================================
// Store Wiring
// =============================================================================

/// A cart store wired to a fake API and a file store.
pub struct TestCart {
    pub store: Arc<CartStore>,
    pub files: FileStore,
    pub notifier: Arc<RecordingNotifier>,
}

/// Open a cart backed by `api` and a `FileStore` in `dir`.
///
/// # Panics
///
/// Panics if the client or the store directory cannot be set up.
#[must_use]
#[allow(clippy::expect_used)]
pub fn open_store(api: &FakeStockApi, dir: &Path, headroom: HeadroomPolicy) -> TestCart {
    let client = HttpStockClient::new(&api.api_config()).expect("stock client builds");
    let files = FileStore::open(dir).expect("store directory opens");
    let notifier = Arc::new(RecordingNotifier::default());

    let store = CartStore::open(
        Arc::new(client),
        Arc::new(files.clone()),
        notifier.clone(),
        StoreOptions {
            key: TEST_KEY.to_string(),
            headroom,
        },
    );

    TestCart {
        store: Arc::new(store),
        files,
        notifier,
    }
}
