//! Typed operations against the canteen API.
//!
//! # Design
//! One method per endpoint, each a thin composition over `ApiConnection`:
//! configure the verb, path, expected status and credentials, write the
//! JSON payload if the verb takes one, then decode the success body. All
//! calls block; run them through `ApiTask` when a UI thread is involved.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::connection::{ApiConnection, Method, API_ENDPOINT};
use crate::error::{ApiError, Result};
use crate::types::{Credentials, MenuItem, NewAccount, NewOrder, Order, Profile};

/// Client for the canteen ordering service.
#[derive(Debug, Clone)]
pub struct CanteenApi {
    endpoint: String,
}

impl CanteenApi {
    /// Client against the fixed production endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(API_ENDPOINT)
    }

    /// Client against an explicit endpoint, e.g. a local test server.
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Registers a new account. The server answers with its profile.
    pub fn register(&self, new_account: &NewAccount) -> Result<Profile> {
        let mut conn = ApiConnection::new(&self.endpoint, Method::Post, "/users", 201, None)?;
        write_json(&mut conn, new_account)?;
        read_json(conn)
    }

    /// Fetches the profile behind `credentials`; doubles as remote login
    /// verification.
    pub fn profile(&self, credentials: &Credentials) -> Result<Profile> {
        let conn = ApiConnection::new(
            &self.endpoint,
            Method::Get,
            "/users/me",
            200,
            Some(credentials),
        )?;
        read_json(conn)
    }

    /// Today's menu.
    pub fn menu(&self) -> Result<Vec<MenuItem>> {
        let conn = ApiConnection::new(&self.endpoint, Method::Get, "/menu", 200, None)?;
        read_json(conn)
    }

    /// Places an order; the server prices it and answers with the result.
    pub fn place_order(&self, credentials: &Credentials, order: &NewOrder) -> Result<Order> {
        let mut conn = ApiConnection::new(
            &self.endpoint,
            Method::Post,
            "/orders",
            201,
            Some(credentials),
        )?;
        write_json(&mut conn, order)?;
        read_json(conn)
    }

    /// Orders previously placed by the authenticated account.
    pub fn orders(&self, credentials: &Credentials) -> Result<Vec<Order>> {
        let conn = ApiConnection::new(
            &self.endpoint,
            Method::Get,
            "/orders",
            200,
            Some(credentials),
        )?;
        read_json(conn)
    }
}

impl Default for CanteenApi {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json<T: Serialize>(conn: &mut ApiConnection, payload: &T) -> Result<()> {
    let mut writer = conn.request_writer()?;
    serde_json::to_writer(&mut writer, payload)
        .map_err(|e| ApiError::Serialize(e.to_string()))?;
    writer.close()
}

fn read_json<T: DeserializeOwned>(mut conn: ApiConnection) -> Result<T> {
    let reader = conn.response_reader()?;
    serde_json::from_reader(reader).map_err(|e| ApiError::Deserialize(e.to_string()))
}
