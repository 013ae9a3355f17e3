//! End-to-end tests for the Xeno Armory client.
//!
//! The tests in `tests/` run the real client library against [`StubArmory`],
//! an in-process axum rendition of the armory REST backend. It keeps its
//! whole world in memory (users, weapons, carts, orders), speaks the same
//! JSON shapes and `{"error": ...}` failure bodies, and counts every request
//! it receives so tests can assert that client-side short-circuits really
//! stayed off the wire.
//!
//! ```bash
//! cargo test -p xeno-armory-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use xeno_armory_client::config::ClientConfig;

/// Monotonic suffix for per-test session files and tokens.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
struct UserRecord {
    id: i64,
    password: String,
    email: String,
    address: String,
    credits: i64,
    admin: bool,
}

#[derive(Clone)]
struct WeaponRow {
    id: i64,
    name: String,
    category: String,
    price: i64,
    stock: u32,
    description: String,
    image_url: String,
}

struct OrderRow {
    id: i64,
    username: String,
    total: i64,
    created_at: DateTime<Utc>,
    items: Vec<(i64, u32)>,
}

#[derive(Default)]
struct ArmoryState {
    users: HashMap<String, UserRecord>,
    /// Bearer token to username.
    tokens: HashMap<String, String>,
    weapons: BTreeMap<i64, WeaponRow>,
    /// Username to (weapon id -> quantity).
    carts: HashMap<String, BTreeMap<i64, u32>>,
    orders: Vec<OrderRow>,
    next_user_id: i64,
    next_weapon_id: i64,
    next_order_id: i64,
    /// When set, `GET /cart` answers 503, leaving mutations untouched.
    fail_cart_reads: bool,
}

#[derive(Clone)]
struct AppState {
    state: Arc<Mutex<ArmoryState>>,
    requests: Arc<AtomicUsize>,
}

/// An in-memory armory backend listening on an ephemeral local port.
pub struct StubArmory {
    base_url: String,
    state: Arc<Mutex<ArmoryState>>,
    requests: Arc<AtomicUsize>,
}

impl StubArmory {
    /// Start the stub on `127.0.0.1:0` and serve until dropped.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let app = AppState {
            state: Arc::new(Mutex::new(ArmoryState::default())),
            requests: Arc::new(AtomicUsize::new(0)),
        };
        let router = router(app.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve stub");
        });

        Self {
            base_url: format!("http://{addr}"),
            state: app.state,
            requests: app.requests,
        }
    }

    /// A client configuration pointing at this stub, with a fresh session
    /// file so tests never see each other's credentials.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let sequence = SEQUENCE.fetch_add(1, Ordering::SeqCst);
        let session_file = std::env::temp_dir().join(format!(
            "armory-it-session-{}-{sequence}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&session_file);

        ClientConfig {
            api_url: format!("{}/api", self.base_url),
            session_file,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn seed_user(&self, username: &str, password: &str, credits: i64, admin: bool) {
        let mut state = self.lock();
        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.insert(
            username.to_string(),
            UserRecord {
                id,
                password: password.to_string(),
                email: format!("{username}@armory.test"),
                address: String::new(),
                credits,
                admin,
            },
        );
    }

    pub fn seed_weapon(&self, name: &str, category: &str, price: i64, stock: u32) -> i64 {
        let mut state = self.lock();
        state.next_weapon_id += 1;
        let id = state.next_weapon_id;
        state.weapons.insert(
            id,
            WeaponRow {
                id,
                name: name.to_string(),
                category: category.to_string(),
                price,
                stock,
                description: format!("{name} ({category})"),
                image_url: String::new(),
            },
        );
        id
    }

    /// Total number of HTTP requests the stub has received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Server-side stock for a weapon, if it still exists.
    #[must_use]
    pub fn weapon_stock(&self, id: i64) -> Option<u32> {
        self.lock().weapons.get(&id).map(|w| w.stock)
    }

    /// Server-side credit balance for a user.
    #[must_use]
    pub fn credits_of(&self, username: &str) -> Option<i64> {
        self.lock().users.get(username).map(|u| u.credits)
    }

    /// Server-side cart for a user as (weapon id, quantity) pairs.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(i64, u32)> {
        self.lock()
            .carts
            .get(username)
            .map(|cart| cart.iter().map(|(&id, &qty)| (id, qty)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Drop every issued bearer token, as a server-side session expiry.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Make `GET /cart` fail with a 503 while mutations keep working.
    pub fn fail_cart_reads(&self, fail: bool) {
        self.lock().fail_cart_reads = fail;
    }

    fn lock(&self) -> MutexGuard<'_, ArmoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn router(app: AppState) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/profile", get(profile).patch(update_profile))
        .route("/api/topup", post(topup))
        .route("/api/weapons", get(list_weapons))
        .route("/api/weapons/{id}", get(get_weapon))
        .route("/api/cart", get(get_cart).post(add_to_cart))
        .route(
            "/api/cart/{weapon_id}",
            put(set_cart_quantity).delete(remove_from_cart),
        )
        .route("/api/orders", get(list_orders).post(place_order))
        .route("/api/admin/weapons", post(admin_create_weapon))
        .route(
            "/api/admin/weapons/{id}",
            patch(admin_update_weapon).delete(admin_delete_weapon),
        )
        .route("/api/admin/orders", get(admin_list_orders))
        .layer(middleware::from_fn_with_state(app.clone(), count_requests))
        .with_state(app)
}

async fn count_requests(State(app): State<AppState>, request: Request, next: Next) -> Response {
    app.requests.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// Resolve the bearer token to a username.
fn authed(state: &ArmoryState, headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "missing token"))?;
    state
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid token"))
}

fn admin_authed(
    state: &ArmoryState,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, Json<Value>)> {
    let username = authed(state, headers)?;
    let is_admin = state.users.get(&username).is_some_and(|user| user.admin);
    if is_admin {
        Ok(username)
    } else {
        Err(fail(StatusCode::FORBIDDEN, "admin access required"))
    }
}

fn weapon_json(weapon: &WeaponRow) -> Value {
    json!({
        "id": weapon.id,
        "name": weapon.name,
        "type": weapon.category,
        "price": weapon.price,
        "stock": weapon.stock,
        "description": weapon.description,
        "image_url": weapon.image_url,
    })
}

fn order_items_json(state: &ArmoryState, items: &[(i64, u32)]) -> Vec<Value> {
    items
        .iter()
        .map(|&(weapon_id, quantity)| {
            json!({
                "weapon_id": weapon_id,
                "quantity": quantity,
                "weapon": state.weapons.get(&weapon_id).map(weapon_json),
            })
        })
        .collect()
}

async fn login(State(app): State<AppState>, Json(body): Json<Value>) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);

    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    let Some(user) = state.users.get(&username) else {
        return Err(fail(StatusCode::UNAUTHORIZED, "invalid credentials"));
    };
    if user.password != password {
        return Err(fail(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    let role = if user.admin { "admin" } else { "user" };

    let token = format!("token-{username}-{}", SEQUENCE.fetch_add(1, Ordering::SeqCst));
    state.tokens.insert(token.clone(), username);

    Ok(Json(json!({ "token": token, "role": role })))
}

async fn register(State(app): State<AppState>, Json(body): Json<Value>) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);

    let username = body["username"].as_str().unwrap_or_default().to_string();
    if username.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "username required"));
    }
    if state.users.contains_key(&username) {
        return Err(fail(StatusCode::BAD_REQUEST, "username already taken"));
    }

    state.next_user_id += 1;
    let id = state.next_user_id;
    state.users.insert(
        username,
        UserRecord {
            id,
            password: body["password"].as_str().unwrap_or_default().to_string(),
            email: body["email"].as_str().unwrap_or_default().to_string(),
            address: String::new(),
            credits: 0,
            admin: false,
        },
    );

    Ok(Json(json!({ "message": "registered" })))
}

async fn profile(State(app): State<AppState>, headers: HeaderMap) -> ApiResult {
    let state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;
    let user = state
        .users
        .get(&username)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;

    Ok(Json(json!({
        "id": user.id,
        "username": username,
        "credits": user.credits,
        "role": if user.admin { "admin" } else { "user" },
        "email": user.email,
        "address": user.address,
        "avatar": "",
    })))
}

async fn update_profile(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;
    let user = state
        .users
        .get_mut(&username)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;

    if let Some(email) = body["email"].as_str() {
        user.email = email.to_string();
    }
    if let Some(address) = body["address"].as_str() {
        user.address = address.to_string();
    }

    Ok(Json(json!({ "message": "profile updated" })))
}

async fn topup(State(app): State<AppState>, headers: HeaderMap, Json(body): Json<Value>) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    let amount = body["amount"].as_i64().unwrap_or_default();
    if amount <= 0 {
        return Err(fail(StatusCode::BAD_REQUEST, "amount must be positive"));
    }

    let user = state
        .users
        .get_mut(&username)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;
    user.credits += amount;

    Ok(Json(json!({ "new_balance": user.credits })))
}

async fn list_weapons(State(app): State<AppState>) -> ApiResult {
    let state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let weapons: Vec<Value> = state.weapons.values().map(weapon_json).collect();
    Ok(Json(json!(weapons)))
}

async fn get_weapon(State(app): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    let state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    state
        .weapons
        .get(&id)
        .map(|weapon| Json(weapon_json(weapon)))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "weapon not found"))
}

async fn get_cart(State(app): State<AppState>, headers: HeaderMap) -> ApiResult {
    let state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    if state.fail_cart_reads {
        return Err(fail(StatusCode::SERVICE_UNAVAILABLE, "cart unavailable"));
    }

    let records: Vec<Value> = state
        .carts
        .get(&username)
        .into_iter()
        .flatten()
        .filter_map(|(&weapon_id, &quantity)| {
            state.weapons.get(&weapon_id).map(|weapon| {
                json!({
                    "id": weapon_id,
                    "weapon_id": weapon_id,
                    "quantity": quantity,
                    "weapon": weapon_json(weapon),
                })
            })
        })
        .collect();

    Ok(Json(json!(records)))
}

async fn add_to_cart(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    let weapon_id = body["weapon_id"].as_i64().unwrap_or_default();
    let quantity = u32::try_from(body["quantity"].as_i64().unwrap_or_default())
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "invalid quantity"))?;

    let stock = state
        .weapons
        .get(&weapon_id)
        .map(|weapon| weapon.stock)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "weapon not found"))?;

    let cart = state.carts.entry(username).or_default();
    let current = cart.get(&weapon_id).copied().unwrap_or_default();
    if current + quantity > stock {
        return Err(fail(StatusCode::BAD_REQUEST, "insufficient stock"));
    }
    cart.insert(weapon_id, current + quantity);

    Ok(Json(json!({ "message": "added to cart" })))
}

async fn set_cart_quantity(
    State(app): State<AppState>,
    Path(weapon_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    let quantity = u32::try_from(body["quantity"].as_i64().unwrap_or_default())
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "invalid quantity"))?;

    let stock = state
        .weapons
        .get(&weapon_id)
        .map(|weapon| weapon.stock)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "weapon not found"))?;
    if quantity > stock {
        return Err(fail(StatusCode::BAD_REQUEST, "insufficient stock"));
    }

    let cart = state.carts.entry(username).or_default();
    if quantity == 0 {
        cart.remove(&weapon_id);
    } else {
        cart.insert(weapon_id, quantity);
    }

    Ok(Json(json!({ "message": "cart updated" })))
}

async fn remove_from_cart(
    State(app): State<AppState>,
    Path(weapon_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    let removed = state
        .carts
        .get_mut(&username)
        .and_then(|cart| cart.remove(&weapon_id));
    if removed.is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "weapon not in cart"));
    }

    Ok(Json(json!({ "message": "removed from cart" })))
}

async fn place_order(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    let items: Vec<(i64, u32)> = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    (
                        item["weapon_id"].as_i64().unwrap_or_default(),
                        u32::try_from(item["quantity"].as_i64().unwrap_or_default())
                            .unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    if items.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "order has no items"));
    }

    // Price and stock are decided server-side, not by the submitted total.
    let mut total: i64 = 0;
    for &(weapon_id, quantity) in &items {
        let weapon = state
            .weapons
            .get(&weapon_id)
            .ok_or_else(|| fail(StatusCode::NOT_FOUND, "weapon not found"))?;
        if quantity > weapon.stock {
            return Err(fail(StatusCode::BAD_REQUEST, "insufficient stock"));
        }
        total += weapon.price * i64::from(quantity);
    }

    let credits = state
        .users
        .get(&username)
        .map(|user| user.credits)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;
    if credits < total {
        return Err(fail(StatusCode::BAD_REQUEST, "insufficient credits"));
    }

    for &(weapon_id, quantity) in &items {
        if let Some(weapon) = state.weapons.get_mut(&weapon_id) {
            weapon.stock -= quantity;
        }
    }
    if let Some(user) = state.users.get_mut(&username) {
        user.credits -= total;
    }
    state.carts.remove(&username);

    state.next_order_id += 1;
    let order_id = state.next_order_id;
    state.orders.push(OrderRow {
        id: order_id,
        username: username.clone(),
        total,
        created_at: Utc::now(),
        items,
    });

    let remaining = state
        .users
        .get(&username)
        .map(|user| user.credits)
        .unwrap_or_default();
    Ok(Json(json!({
        "order_id": order_id,
        "total": total,
        "remaining_credits": remaining,
    })))
}

async fn list_orders(State(app): State<AppState>, headers: HeaderMap) -> ApiResult {
    let state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    let username = authed(&state, &headers)?;

    let orders: Vec<Value> = state
        .orders
        .iter()
        .rev()
        .filter(|order| order.username == username)
        .map(|order| {
            json!({
                "id": order.id,
                "total": order.total,
                "status": "paid",
                "created_at": order.created_at,
                "items": order_items_json(&state, &order.items),
            })
        })
        .collect();

    Ok(Json(json!(orders)))
}

/// Collected multipart fields of an admin weapon form.
#[derive(Default)]
struct WeaponForm {
    name: Option<String>,
    category: Option<String>,
    price: Option<i64>,
    stock: Option<u32>,
    description: Option<String>,
    image_file: Option<String>,
}

async fn read_weapon_form(
    mut multipart: Multipart,
) -> Result<WeaponForm, (StatusCode, Json<Value>)> {
    let mut form = WeaponForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            form.image_file = field.file_name().map(ToString::to_string);
            // Bytes are accepted and dropped; the stub stores no files.
            let _ = field.bytes().await;
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|_| fail(StatusCode::BAD_REQUEST, "malformed multipart field"))?;
        match name.as_str() {
            "name" => form.name = Some(text),
            "type" => form.category = Some(text),
            "price" => {
                form.price = Some(
                    text.parse()
                        .map_err(|_| fail(StatusCode::BAD_REQUEST, "invalid price"))?,
                );
            }
            "stock" => {
                form.stock = Some(
                    text.parse()
                        .map_err(|_| fail(StatusCode::BAD_REQUEST, "invalid stock"))?,
                );
            }
            "description" => form.description = Some(text),
            _ => {}
        }
    }
    Ok(form)
}

async fn admin_create_weapon(
    State(app): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult {
    // Parse before locking; the multipart stream awaits.
    let form = read_weapon_form(multipart).await?;

    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    admin_authed(&state, &headers)?;

    let name = form
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "name required"))?;

    state.next_weapon_id += 1;
    let id = state.next_weapon_id;
    state.weapons.insert(
        id,
        WeaponRow {
            id,
            name,
            category: form.category.unwrap_or_default(),
            price: form.price.unwrap_or_default(),
            stock: form.stock.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            image_url: form
                .image_file
                .map(|file| format!("uploads/{file}"))
                .unwrap_or_default(),
        },
    );

    Ok(Json(json!({ "message": "weapon created", "id": id })))
}

async fn admin_update_weapon(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult {
    let form = read_weapon_form(multipart).await?;

    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    admin_authed(&state, &headers)?;

    let weapon = state
        .weapons
        .get_mut(&id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "weapon not found"))?;

    if let Some(name) = form.name {
        weapon.name = name;
    }
    if let Some(category) = form.category {
        weapon.category = category;
    }
    if let Some(price) = form.price {
        weapon.price = price;
    }
    if let Some(stock) = form.stock {
        weapon.stock = stock;
    }
    if let Some(description) = form.description {
        weapon.description = description;
    }
    if let Some(file) = form.image_file {
        weapon.image_url = format!("uploads/{file}");
    }

    Ok(Json(json!({ "message": "weapon updated" })))
}

async fn admin_delete_weapon(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult {
    let mut state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    admin_authed(&state, &headers)?;

    if state.weapons.remove(&id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "weapon not found"));
    }
    // Carts referencing the weapon lose the line, like the cascade delete.
    for cart in state.carts.values_mut() {
        cart.remove(&id);
    }

    Ok(Json(json!({ "message": "weapon deleted" })))
}

async fn admin_list_orders(State(app): State<AppState>, headers: HeaderMap) -> ApiResult {
    let state = app.state.lock().unwrap_or_else(PoisonError::into_inner);
    admin_authed(&state, &headers)?;

    let orders: Vec<Value> = state
        .orders
        .iter()
        .rev()
        .map(|order| {
            let buyer = state.users.get(&order.username);
            json!({
                "id": order.id,
                "user_id": buyer.map(|user| user.id).unwrap_or_default(),
                "username": order.username,
                "address": buyer.map(|user| user.address.clone()).unwrap_or_default(),
                "total": order.total,
                "status": "paid",
                "created_at": order.created_at,
                "items": order_items_json(&state, &order.items),
            })
        })
        .collect();

    Ok(Json(json!(orders)))
}
