//! Wire types for the canteen API.
//!
//! # Design
//! These types mirror the remote API's JSON schema but are defined
//! independently of the mock server; integration tests catch schema drift
//! between the two crates. The error-body shape is a type parameter of
//! `ApiConnection` (some endpoints report failures in a different schema),
//! expressed here as the `ErrorSchema` trait with `ErrorBody` as the
//! standard implementation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountRole;

/// JSON shape expected in a non-success response body.
///
/// `detail` extracts the human-readable failure message, if the body
/// carried one.
pub trait ErrorSchema: DeserializeOwned {
    fn detail(self) -> Option<String>;
}

/// Standard error body: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
}

impl ErrorSchema for ErrorBody {
    fn detail(self) -> Option<String> {
        self.detail
    }
}

/// Username/password pair sent as HTTP basic auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Request payload for registering an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub role: AccountRole,
}

/// Account record returned by the API. The password never travels back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub role: AccountRole,
}

/// One dish on the canteen menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub price_cents: u32,
}

/// One line of an order: a menu item and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: Uuid,
    pub quantity: u32,
}

/// Request payload for placing an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub lines: Vec<OrderLine>,
}

/// An order accepted by the API, priced server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub placed_by: String,
    pub lines: Vec<OrderLine>,
    pub total_cents: u64,
}
