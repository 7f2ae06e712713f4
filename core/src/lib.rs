//! Client core for the canteen ordering service.
//!
//! # Overview
//! Everything a desktop front-end needs short of the UI itself: a one-shot
//! HTTP connection with declared-success status checking and error-body
//! classification (`ApiConnection`), typed endpoint calls on top of it
//! (`CanteenApi`), the account model with role capabilities and input
//! validation (`Account`), and a background task runner that hands results
//! back to the UI thread (`ApiTask`).
//!
//! # Design
//! - `ApiConnection` owns exactly one network round trip; construction is
//!   pure, `connect` dials and verifies, failures are terminal and replayed.
//! - Blocking I/O throughout; concurrency is one worker thread per task,
//!   with outcomes crossing back through the `ui_channel` callback queue.
//! - The error-body schema is a type parameter so endpoints with
//!   non-standard failure shapes still classify cleanly.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod account;
pub mod client;
pub mod connection;
pub mod error;
pub mod task;
pub mod types;

pub use account::{login, Account, AccountRole, Capabilities, LoginOutcome, LOGIN_FAILED};
pub use client::CanteenApi;
pub use connection::{ApiConnection, Method, RequestWriter, API_ENDPOINT};
pub use error::{ApiError, Result};
pub use task::{ui_channel, ApiTask, UiHandle, UiQueue};
pub use types::{
    Credentials, ErrorBody, ErrorSchema, MenuItem, NewAccount, NewOrder, Order, OrderLine, Profile,
};
