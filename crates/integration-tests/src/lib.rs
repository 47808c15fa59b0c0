//! Integration test support for Driftmarket.
//!
//! Tests drive the real storefront engine - the actual `reqwest` pipeline,
//! cart store, and checkout machine - against an in-process mock of the
//! commerce backend bound to an ephemeral port. The mock keeps a working
//! cart and account state plus scriptable failure switches and atomic call
//! counters, so tests can assert on protocol behavior (how many refresh
//! exchanges ran, how many times an endpoint was hit) and not just on
//! final state.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! backend.seed_cart_line(7, 2, "10.00");
//!
//! let storefront = backend.storefront();
//! storefront.cart().refresh().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use driftmarket_storefront::Storefront;
use driftmarket_storefront::api::types::{CartLine, CartSnapshot, ProductRef};
use driftmarket_storefront::config::{ApiConfig, CurrencyConfig, StorefrontConfig};

/// Shared state of the mock backend. Tests reach in through
/// [`MockBackend::state`] to script failures and read call counters.
#[derive(Default)]
pub struct MockState {
    /// The server-side cart.
    pub cart: Mutex<CartSnapshot>,
    /// Product catalog: id -> (sku, title, unit price).
    pub products: Mutex<HashMap<i32, (String, String, Decimal)>>,
    /// Registered accounts: email -> password.
    pub accounts: Mutex<HashMap<String, String>>,
    /// Saved addresses returned by `GET /addresses/`.
    pub addresses: Mutex<Vec<Value>>,
    /// Wishlist items (raw values).
    pub wishlist: Mutex<Vec<Value>>,

    /// Access tokens the protected endpoints accept.
    pub valid_access: Mutex<HashSet<String>>,
    /// Refresh tokens the refresh endpoint accepts.
    pub valid_refresh: Mutex<HashSet<String>>,
    /// When set, protected endpoints demand a valid bearer token.
    pub enforce_auth: AtomicBool,

    /// When set, cart mutations fail with 500.
    pub fail_cart_mutations: AtomicBool,
    /// Delay applied to cart mutations before they take effect (ms).
    pub cart_mutation_delay_ms: AtomicU64,
    /// Delay applied to the orders endpoint before it responds (ms). Used
    /// to hold concurrent requests in flight together.
    pub orders_delay_ms: AtomicU64,
    /// When set, the refresh endpoint rejects every exchange.
    pub refresh_fails: AtomicBool,
    /// When set, refreshed access tokens are NOT added to the valid set,
    /// so the retried request 401s again.
    pub refresh_yields_stale: AtomicBool,

    /// Scripted `POST /checkout/` outcome; `None` means a bare confirmation.
    pub checkout_script: Mutex<Option<Result<Value, (u16, String)>>>,
    /// Last payload received by `POST /checkout/`.
    pub last_checkout_payload: Mutex<Option<Value>>,

    // Call counters
    pub refresh_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub orders_calls: AtomicUsize,
    pub cart_fetch_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,

    token_seq: AtomicUsize,
}

impl MockState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        if !self.enforce_auth.load(Ordering::SeqCst) {
            return true;
        }
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| {
                self.valid_access
                    .lock()
                    .expect("lock valid_access")
                    .contains(token)
            })
    }

    fn mint_tokens(&self) -> (String, String) {
        let n = self.token_seq.fetch_add(1, Ordering::SeqCst);
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        self.valid_access
            .lock()
            .expect("lock valid_access")
            .insert(access.clone());
        self.valid_refresh
            .lock()
            .expect("lock valid_refresh")
            .insert(refresh.clone());
        (access, refresh)
    }

    fn cart_json(&self) -> Value {
        let cart = self.cart.lock().expect("lock cart");
        serde_json::to_value(&*cart).expect("serialize cart")
    }

    fn recompute_total(cart: &mut CartSnapshot) {
        let total: Decimal = cart.items.iter().map(CartLine::subtotal).sum();
        cart.total = Some(total);
    }
}

/// An in-process mock of the commerce backend.
pub struct MockBackend {
    /// Reach-in handle for scripting and counters.
    pub state: Arc<MockState>,
    base_url: String,
}

impl MockBackend {
    /// Bind the mock to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound (test environment problem).
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });

        Self {
            state,
            base_url: format!("http://{addr}/api/"),
        }
    }

    /// Base URL the engine should be pointed at.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a storefront engine wired to this mock.
    ///
    /// # Panics
    ///
    /// Panics if the engine cannot be constructed.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        let config = StorefrontConfig {
            api: ApiConfig::for_base_url(&self.base_url).expect("valid base url"),
            currency: CurrencyConfig::default(),
            shipping_flat_rate: Decimal::from(5),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        Storefront::new(config).expect("storefront engine")
    }

    // =========================================================================
    // Seeding helpers
    // =========================================================================

    /// Register a product and put `quantity` of it in the server cart.
    pub fn seed_cart_line(&self, product_id: i32, quantity: u32, unit_price: &str) {
        self.seed_product(product_id, unit_price);

        let price: Decimal = unit_price.parse().expect("valid price");
        let mut cart = self.state.cart.lock().expect("lock cart");
        cart.items.push(CartLine {
            product: product_ref(product_id),
            quantity,
            unit_price: price,
        });
        MockState::recompute_total(&mut cart);
    }

    /// Register a product in the mock catalog.
    pub fn seed_product(&self, product_id: i32, unit_price: &str) {
        let price: Decimal = unit_price.parse().expect("valid price");
        self.state.products.lock().expect("lock products").insert(
            product_id,
            (
                format!("SKU-{product_id}"),
                format!("Product {product_id}"),
                price,
            ),
        );
    }

    /// Register an account for login.
    pub fn seed_account(&self, email: &str, password: &str) {
        self.state
            .accounts
            .lock()
            .expect("lock accounts")
            .insert(email.to_string(), password.to_string());
    }

    /// Add a complete saved address with the given id.
    pub fn seed_address(&self, id: i32) {
        self.state.addresses.lock().expect("lock addresses").push(json!({
            "id": id,
            "label": format!("Home {id}"),
            "address_line1": "12 Hill Road",
            "city": "Kathmandu",
            "state": "Bagmati",
            "postal_code": "44600",
            "country": "NP",
        }));
    }

    /// Script the next checkout responses (applies to all until re-scripted).
    pub fn script_checkout_success(&self, response: Value) {
        *self.state.checkout_script.lock().expect("lock script") = Some(Ok(response));
    }

    /// Script checkout to fail with the given status and detail.
    pub fn script_checkout_failure(&self, status: u16, detail: &str) {
        *self.state.checkout_script.lock().expect("lock script") =
            Some(Err((status, detail.to_string())));
    }

    /// Drop all valid access tokens, as if they expired server-side.
    /// Refresh tokens stay valid.
    pub fn expire_access_tokens(&self) {
        self.state
            .valid_access
            .lock()
            .expect("lock valid_access")
            .clear();
    }
}

fn product_ref(product_id: i32) -> ProductRef {
    ProductRef {
        id: product_id.into(),
        sku: format!("SKU-{product_id}"),
        title: format!("Product {product_id}"),
        primary_image: None,
    }
}

// =============================================================================
// Router & handlers
// =============================================================================

type AppState = State<Arc<MockState>>;

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route(
            "/api/cart/",
            get(get_cart).post(add_cart).patch(update_cart).delete(remove_cart),
        )
        .route("/api/cart/clear/", post(clear_cart))
        .route("/api/cart/merge/", post(merge_cart))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/register/", post(register))
        .route("/api/auth/me/", get(me))
        .route("/api/token/refresh/", post(refresh))
        .route("/api/addresses/", get(addresses))
        .route("/api/orders/", get(orders))
        .route("/api/products/", get(products))
        .route("/api/products/{slug}/", get(product_detail))
        .route("/api/products/{slug}/recommendations/", get(recommendations))
        .route("/api/categories/", get(categories))
        .route("/api/search/suggestions/", get(suggestions))
        .route("/api/checkout/", post(checkout))
        .route("/api/order-tracking/", post(track_order))
        .route("/api/wishlist/", get(wishlist).post(wishlist_add))
        .route("/api/wishlist/items/{id}/", axum::routing::delete(wishlist_remove))
        .with_state(state)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

async fn get_cart(State(state): AppState, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.cart_fetch_calls.fetch_add(1, Ordering::SeqCst);
    Json(state.cart_json()).into_response()
}

async fn mutation_gate(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    if !state.authorized(headers) {
        return Some(unauthorized());
    }
    if state.fail_cart_mutations.load(Ordering::SeqCst) {
        return Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Cart service unavailable"})),
            )
                .into_response(),
        );
    }
    let delay = state.cart_mutation_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
    None
}

async fn add_cart(State(state): AppState, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(response) = mutation_gate(&state, &headers).await {
        return response;
    }

    let product_id = body["product_id"].as_i64().unwrap_or_default() as i32;
    let quantity = body["quantity"].as_u64().unwrap_or(1) as u32;

    let Some((_, _, price)) = state
        .products
        .lock()
        .expect("lock products")
        .get(&product_id)
        .cloned()
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Product not found"})),
        )
            .into_response();
    };

    {
        let mut cart = state.cart.lock().expect("lock cart");
        if let Some(line) = cart
            .items
            .iter_mut()
            .find(|l| l.product.id.as_i32() == product_id)
        {
            line.quantity += quantity;
        } else {
            cart.items.push(CartLine {
                product: product_ref(product_id),
                quantity,
                unit_price: price,
            });
        }
        MockState::recompute_total(&mut cart);
    }

    Json(state.cart_json()).into_response()
}

async fn update_cart(
    State(state): AppState,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = mutation_gate(&state, &headers).await {
        return response;
    }

    let product_id = body["product_id"].as_i64().unwrap_or_default() as i32;
    let quantity = body["quantity"].as_u64().unwrap_or_default() as u32;

    {
        let mut cart = state.cart.lock().expect("lock cart");
        if quantity == 0 {
            cart.items.retain(|l| l.product.id.as_i32() != product_id);
        } else if let Some(line) = cart
            .items
            .iter_mut()
            .find(|l| l.product.id.as_i32() == product_id)
        {
            line.quantity = quantity;
        }
        MockState::recompute_total(&mut cart);
    }

    Json(state.cart_json()).into_response()
}

async fn remove_cart(
    State(state): AppState,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = mutation_gate(&state, &headers).await {
        return response;
    }

    let product_id = body["product_id"].as_i64().unwrap_or_default() as i32;

    {
        let mut cart = state.cart.lock().expect("lock cart");
        cart.items.retain(|l| l.product.id.as_i32() != product_id);
        MockState::recompute_total(&mut cart);
    }

    Json(state.cart_json()).into_response()
}

async fn clear_cart(State(state): AppState, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    *state.cart.lock().expect("lock cart") = CartSnapshot::empty();
    Json(state.cart_json()).into_response()
}

async fn merge_cart(State(state): AppState, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(state.cart_json()).into_response()
}

async fn login(State(state): AppState, Json(body): Json<Value>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    let matches = state
        .accounts
        .lock()
        .expect("lock accounts")
        .get(&email)
        .is_some_and(|stored| stored == password);

    if !matches {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response();
    }

    let (access, refresh) = state.mint_tokens();
    Json(json!({
        "access": access,
        "refresh": refresh,
        "user": {"id": 1, "email": email},
    }))
    .into_response()
}

async fn register(State(state): AppState, Json(body): Json<Value>) -> Response {
    state.register_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    let mut accounts = state.accounts.lock().expect("lock accounts");
    if accounts.contains_key(&email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"detail": "user with this email already exists"})),
        )
            .into_response();
    }
    accounts.insert(email.clone(), password);
    drop(accounts);

    (
        StatusCode::CREATED,
        Json(json!({
            "user": {
                "id": 2,
                "email": email,
                "first_name": body["first_name"],
                "last_name": body["last_name"],
            },
            "verify_token": "vt-0",
        })),
    )
        .into_response()
}

async fn me(State(state): AppState, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"id": 1, "email": "shopper@example.com"})).into_response()
}

async fn refresh(State(state): AppState, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    if state.refresh_fails.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        )
            .into_response();
    }

    let token = body["refresh"].as_str().unwrap_or_default();
    let known = state
        .valid_refresh
        .lock()
        .expect("lock valid_refresh")
        .contains(token);
    if !known {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        )
            .into_response();
    }

    let n = state.token_seq.fetch_add(1, Ordering::SeqCst);
    let access = format!("access-{n}");
    if !state.refresh_yields_stale.load(Ordering::SeqCst) {
        state
            .valid_access
            .lock()
            .expect("lock valid_access")
            .insert(access.clone());
    }

    Json(json!({"access": access})).into_response()
}

async fn addresses(State(state): AppState, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let list = state.addresses.lock().expect("lock addresses").clone();
    Json(Value::Array(list)).into_response()
}

async fn orders(State(state): AppState, headers: HeaderMap) -> Response {
    state.orders_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.orders_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"count": 0, "next": null, "previous": null, "results": []})).into_response()
}

async fn checkout(State(state): AppState, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }

    *state
        .last_checkout_payload
        .lock()
        .expect("lock last_checkout_payload") = Some(body);

    let script = state.checkout_script.lock().expect("lock script").clone();
    match script {
        Some(Ok(response)) => Json(response).into_response(),
        Some(Err((status, detail))) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
            Json(json!({"detail": detail})),
        )
            .into_response(),
        None => Json(json!({"order_id": 1, "payment_intent": null})).into_response(),
    }
}

fn product_json(id: i32, sku: &str, title: &str, price: &Decimal) -> Value {
    json!({
        "id": id,
        "title": title,
        "slug": format!("product-{id}"),
        "description": "",
        "base_price": price.to_string(),
        "sku": sku,
    })
}

async fn products(State(state): AppState) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);

    let products = state.products.lock().expect("lock products");
    let mut results: Vec<Value> = products
        .iter()
        .map(|(id, (sku, title, price))| product_json(*id, sku, title, price))
        .collect();
    results.sort_by_key(|p| p["id"].as_i64());

    Json(json!({
        "count": results.len(),
        "next": null,
        "previous": null,
        "results": results,
    }))
    .into_response()
}

async fn product_detail(State(state): AppState, Path(slug): Path<String>) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);

    let products = state.products.lock().expect("lock products");
    let found = products.iter().find_map(|(id, (sku, title, price))| {
        (format!("product-{id}") == slug).then(|| product_json(*id, sku, title, price))
    });

    match found {
        Some(product) => Json(product).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Product not found"})),
        )
            .into_response(),
    }
}

async fn recommendations(State(state): AppState, Path(slug): Path<String>) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);

    let products = state.products.lock().expect("lock products");
    let results: Vec<Value> = products
        .iter()
        .filter(|(id, _)| format!("product-{id}") != slug)
        .map(|(id, (sku, title, price))| product_json(*id, sku, title, price))
        .collect();

    Json(Value::Array(results)).into_response()
}

async fn categories(State(state): AppState) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!([{"id": 1, "name": "Featured", "slug": "featured"}])).into_response()
}

async fn suggestions(State(state): AppState) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"suggestions": ["sneakers", "sneaker socks"]})).into_response()
}

async fn track_order(State(_state): AppState, Json(_body): Json<Value>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": "Order not found"})),
    )
        .into_response()
}

async fn wishlist(State(state): AppState, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let items = state.wishlist.lock().expect("lock wishlist").clone();
    Json(json!({"items": items})).into_response()
}

async fn wishlist_add(
    State(state): AppState,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let product_id = body["product_id"].as_i64().unwrap_or_default() as i32;
    {
        let mut items = state.wishlist.lock().expect("lock wishlist");
        items.push(json!({
            "product": serde_json::to_value(product_ref(product_id)).expect("serialize"),
        }));
    }
    let items = state.wishlist.lock().expect("lock wishlist").clone();
    Json(json!({"items": items})).into_response()
}

async fn wishlist_remove(
    State(state): AppState,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state
        .wishlist
        .lock()
        .expect("lock wishlist")
        .retain(|item| item["product"]["id"].as_i64().unwrap_or_default() as i32 != id);
    StatusCode::NO_CONTENT.into_response()
}
