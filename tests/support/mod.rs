//! In-process fake of the catalog backend for integration tests.
//!
//! Implements just enough of `/token`, `/users`, `/users/me`, `/health` and
//! `/products` to exercise the client end to end over real HTTP.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use catalog_session::{Product, ProductDraft, ProductUpdate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde_json::json;

#[derive(Default)]
pub struct Inner {
    /// username -> (email, password)
    users: HashMap<String, (String, String)>,
    /// token -> username
    tokens: HashMap<String, String>,
    products: BTreeMap<i64, Product>,
    next_token: u64,
    next_product: i64,
    /// (method path, Authorization header) for every request.
    pub requests: Vec<(String, Option<String>)>,
}

type Shared = Arc<Mutex<Inner>>;

pub struct FakeBackend {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl FakeBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Authorization header of the most recent request to `route`.
    pub fn last_auth_for(&self, route: &str) -> Option<Option<String>> {
        self.requests()
            .into_iter()
            .rev()
            .find(|(r, _)| r == route)
            .map(|(_, auth)| auth)
    }

    pub fn revoke_all_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }
}

/// Start the fake on an ephemeral port, seeded with user `demo`/`password`.
pub async fn spawn() -> FakeBackend {
    let mut inner = Inner { next_token: 1, next_product: 1, ..Inner::default() };
    inner
        .users
        .insert("demo".into(), ("demo@example.com".into(), "password".into()));
    for (name, price, stock, category) in [
        ("Laptop", 999.99, 10, "Electronics"),
        ("Headphones", 59.5, 25, "Electronics"),
        ("Novel", 12.0, 100, "Books"),
    ] {
        let id = inner.next_product;
        inner.next_product += 1;
        inner.products.insert(
            id,
            Product {
                id,
                name: name.into(),
                description: format!("{name} description"),
                price: Decimal::from_f64(price).unwrap(),
                stock_quantity: stock,
                category: category.into(),
            },
        );
    }

    let state: Shared = Arc::new(Mutex::new(inner));
    let app = Router::new()
        .route("/token", post(login))
        .route("/users", post(register))
        .route("/users/me", get(me))
        .route("/health", get(health))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FakeBackend { addr, state }
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// =============================================================================
// HANDLERS
// =============================================================================

fn record(state: &Shared, route: &str, headers: &HeaderMap) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.lock().unwrap().requests.push((route.to_owned(), auth));
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authed_user(state: &Shared, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .to_owned();
    state.lock().unwrap().tokens.get(&token).cloned()
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<LoginBody>) -> Response {
    record(&state, "POST /token", &headers);
    let mut inner = state.lock().unwrap();
    let valid = inner
        .users
        .get(&body.username)
        .is_some_and(|(_, password)| *password == body.password);
    if !valid {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    let token = format!("token-{}-{}", body.username, inner.next_token);
    inner.next_token += 1;
    inner.tokens.insert(token.clone(), body.username);
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<RegisterBody>) -> Response {
    record(&state, "POST /users", &headers);
    let mut inner = state.lock().unwrap();
    if inner.users.contains_key(&body.username) {
        return detail(StatusCode::BAD_REQUEST, "Username already registered");
    }
    inner
        .users
        .insert(body.username.clone(), (body.email.clone(), body.password));
    (
        StatusCode::CREATED,
        Json(json!({ "username": body.username, "email": body.email, "disabled": false })),
    )
        .into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /users/me", &headers);
    let Some(username) = authed_user(&state, &headers) else {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    };
    let email = state.lock().unwrap().users[&username].0.clone();
    Json(json!({ "username": username, "email": email, "disabled": false })).into_response()
}

async fn health(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /health", &headers);
    Json(json!({ "status": "healthy", "data_service": "connected" })).into_response()
}

#[derive(Deserialize)]
struct ListQuery {
    category: Option<String>,
    max_price: Option<f64>,
}

async fn list_products(State(state): State<Shared>, headers: HeaderMap, Query(query): Query<ListQuery>) -> Response {
    record(&state, "GET /products", &headers);
    let inner = state.lock().unwrap();
    let products: Vec<Product> = inner
        .products
        .values()
        .filter(|p| match (&query.category, query.max_price) {
            (Some(category), _) => &p.category == category,
            (None, Some(max)) => p.price < Decimal::from_f64(max).unwrap(),
            (None, None) => true,
        })
        .cloned()
        .collect();
    Json(products).into_response()
}

async fn get_product(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, "GET /products/{id}", &headers);
    match state.lock().unwrap().products.get(&id) {
        Some(product) => Json(product.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, &format!("Product with ID {id} not found")),
    }
}

async fn create_product(State(state): State<Shared>, headers: HeaderMap, Json(draft): Json<ProductDraft>) -> Response {
    record(&state, "POST /products", &headers);
    if authed_user(&state, &headers).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let mut inner = state.lock().unwrap();
    let id = inner.next_product;
    inner.next_product += 1;
    let product = Product {
        id,
        name: draft.name,
        description: draft.description,
        price: draft.price,
        stock_quantity: draft.stock_quantity,
        category: draft.category,
    };
    inner.products.insert(id, product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<ProductUpdate>,
) -> Response {
    record(&state, "PUT /products/{id}", &headers);
    if authed_user(&state, &headers).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let mut inner = state.lock().unwrap();
    let Some(product) = inner.products.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, &format!("Product with ID {id} not found"));
    };
    if let Some(name) = patch.name {
        product.name = name;
    }
    if let Some(description) = patch.description {
        product.description = description;
    }
    if let Some(price) = patch.price {
        product.price = price;
    }
    if let Some(stock) = patch.stock_quantity {
        product.stock_quantity = stock;
    }
    if let Some(category) = patch.category {
        product.category = category;
    }
    Json(product.clone()).into_response()
}

async fn delete_product(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, "DELETE /products/{id}", &headers);
    if authed_user(&state, &headers).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    match state.lock().unwrap().products.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => detail(StatusCode::NOT_FOUND, &format!("Product with ID {id} not found")),
    }
}
