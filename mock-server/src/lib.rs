use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

// Wire types are kept independent from canteen-core on purpose; the core
// integration tests catch drift between the two.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub price_cents: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct NewOrder {
    pub lines: Vec<OrderLine>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub placed_by: String,
    pub lines: Vec<OrderLine>,
    pub total_cents: u64,
}

/// Error body every non-success response carries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

struct StoredAccount {
    password: String,
    role: String,
}

#[derive(Default)]
pub struct CanteenState {
    accounts: HashMap<String, StoredAccount>,
    menu: Vec<MenuItem>,
    orders: Vec<Order>,
}

pub type Db = Arc<RwLock<CanteenState>>;

type Rejection = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, detail: impl Into<String>) -> Rejection {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}

fn seeded_menu() -> Vec<MenuItem> {
    [
        ("Daily soup", 250),
        ("Chicken schnitzel", 680),
        ("Veggie burger", 590),
    ]
    .into_iter()
    .map(|(name, price_cents)| MenuItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price_cents,
    })
    .collect()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(CanteenState {
        menu: seeded_menu(),
        ..CanteenState::default()
    }));
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(me))
        .route("/menu", get(menu))
        .route("/orders", get(list_orders).post(place_order))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Resolves the basic-auth header to a known account's profile.
fn authenticate(state: &CanteenState, headers: &HeaderMap) -> Result<Profile, Rejection> {
    let unauthorized = || reject(StatusCode::UNAUTHORIZED, "invalid credentials");

    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(unauthorized)?;
    let blob = value.strip_prefix("Basic ").ok_or_else(unauthorized)?;
    let decoded = general_purpose::STANDARD
        .decode(blob)
        .map_err(|_| unauthorized())?;
    let decoded = String::from_utf8(decoded).map_err(|_| unauthorized())?;
    let (username, password) = decoded.split_once(':').ok_or_else(unauthorized)?;

    match state.accounts.get(username) {
        Some(account) if account.password == password => Ok(Profile {
            username: username.to_string(),
            role: account.role.clone(),
        }),
        _ => Err(unauthorized()),
    }
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<NewAccount>,
) -> Result<(StatusCode, Json<Profile>), Rejection> {
    let mut state = db.write().await;
    if state.accounts.contains_key(&input.username) {
        return Err(reject(StatusCode::CONFLICT, "username already taken"));
    }
    state.accounts.insert(
        input.username.clone(),
        StoredAccount {
            password: input.password,
            role: input.role.clone(),
        },
    );
    tracing::debug!("registered account {}", input.username);
    Ok((
        StatusCode::CREATED,
        Json(Profile {
            username: input.username,
            role: input.role,
        }),
    ))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Profile>, Rejection> {
    let state = db.read().await;
    let profile = authenticate(&state, &headers)?;
    Ok(Json(profile))
}

async fn menu(State(db): State<Db>) -> Json<Vec<MenuItem>> {
    let state = db.read().await;
    Json(state.menu.clone())
}

async fn place_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), Rejection> {
    let mut state = db.write().await;
    let profile = authenticate(&state, &headers)?;

    let mut total_cents = 0u64;
    for line in &input.lines {
        let item = state
            .menu
            .iter()
            .find(|item| item.id == line.item)
            .ok_or_else(|| {
                reject(
                    StatusCode::BAD_REQUEST,
                    format!("unknown menu item {}", line.item),
                )
            })?;
        total_cents += u64::from(item.price_cents) * u64::from(line.quantity);
    }

    let order = Order {
        id: Uuid::new_v4(),
        placed_by: profile.username,
        lines: input.lines,
        total_cents,
    };
    state.orders.push(order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, Rejection> {
    let state = db.read().await;
    let profile = authenticate(&state, &headers)?;
    let orders = state
        .orders
        .iter()
        .filter(|order| order.placed_by == profile.username)
        .cloned()
        .collect();
    Ok(Json(orders))
}
