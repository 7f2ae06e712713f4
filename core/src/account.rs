//! Account model: roles, validation, and the login boundary.
//!
//! # Design
//! Roles are a tagged enum rather than a type per role; what a role may do
//! is answered by `capabilities()`, which maps each tag to its defaults in
//! one place. Creating an account goes through `Account::create` /
//! `Account::with_role`, which trim and validate the username and password
//! and reject bad input with the exact reason shown to the user.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::types::Credentials;

/// Inline message shown when a login attempt is rejected. Deliberately
/// fixed: the underlying reason is not leaked to the login screen.
pub const LOGIN_FAILED: &str = "Login failed";

const USERNAME_TOO_SHORT: &str = "Username must be at least 4 characters";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
const USERNAME_BAD_CHARSET: &str =
    "Username must consist of alphanumeric characters plus ., _, and -.";

/// Role of a canteen account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    User,
    Worker,
    Manager,
    Administrator,
}

/// What an account is allowed to do, derived from its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub place_orders: bool,
    pub fulfill_orders: bool,
    pub edit_menu: bool,
    pub administer_accounts: bool,
}

impl AccountRole {
    /// Default capabilities for each role tag.
    pub fn capabilities(self) -> Capabilities {
        match self {
            AccountRole::User => Capabilities {
                place_orders: true,
                fulfill_orders: false,
                edit_menu: false,
                administer_accounts: false,
            },
            AccountRole::Worker => Capabilities {
                place_orders: true,
                fulfill_orders: true,
                edit_menu: false,
                administer_accounts: false,
            },
            AccountRole::Manager => Capabilities {
                place_orders: true,
                fulfill_orders: true,
                edit_menu: true,
                administer_accounts: false,
            },
            AccountRole::Administrator => Capabilities {
                place_orders: true,
                fulfill_orders: true,
                edit_menu: true,
                administer_accounts: true,
            },
        }
    }
}

/// A locally held account: validated credentials plus a role tag.
#[derive(Debug, Clone)]
pub struct Account {
    username: String,
    password: String,
    role: AccountRole,
}

impl Account {
    /// Creates an account with the default role.
    pub fn create(username: &str, password: &str) -> Result<Self> {
        Self::with_role(username, password, AccountRole::User)
    }

    /// Creates an account with an explicit role.
    ///
    /// The username is trimmed before validation. Rejections carry the
    /// reason string shown to the user.
    pub fn with_role(username: &str, password: &str, role: AccountRole) -> Result<Self> {
        let username = username.trim();
        if let Some(reason) = validate(username, password) {
            return Err(ApiError::Validation(reason.to_string()));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            role,
        })
    }

    /// Stub account used before anyone has registered.
    pub fn default_account() -> Self {
        Self {
            username: "customer".to_string(),
            password: "bonappetit".to_string(),
            role: AccountRole::User,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> AccountRole {
        self.role
    }

    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }

    /// Credentials for authenticated API calls.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Exact match against the stored credentials.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// Outcome the login screen acts on: transition forward, or show an
/// inline message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Complete,
    Failed(&'static str),
}

/// Checks the supplied credentials against `account`.
///
/// A rejection always reads "Login failed"; the detail is discarded on
/// purpose rather than echoed to the screen.
pub fn login(account: &Account, username: &str, password: &str) -> LoginOutcome {
    if account.authenticate(username, password) {
        LoginOutcome::Complete
    } else {
        LoginOutcome::Failed(LOGIN_FAILED)
    }
}

/// Returns the rejection reason, or None when the input is acceptable.
/// Checks run in a fixed order: username length, password length, charset.
fn validate(username: &str, password: &str) -> Option<&'static str> {
    if username.chars().count() < 4 {
        Some(USERNAME_TOO_SHORT)
    } else if password.chars().count() < 8 {
        Some(PASSWORD_TOO_SHORT)
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        Some(USERNAME_BAD_CHARSET)
    } else {
        None
    }
}
