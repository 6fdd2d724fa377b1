//! # Accounts
//!
//! One `Account` type for every kind of login. The role is the tag of
//! `AccountProfile`, and each role carries its own payload.
//!
//! ```text
//! Account { id, email, username, full_name, profile }
//!                                             │
//!          ┌──────────────────────────────────┼────────────────────────┐
//!          ▼                                  ▼                        ▼
//!   User { default_address }       Vendor { store_name }      Admin { level }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Address;

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A shopper.
    User,
    Vendor,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["user".into(), "vendor".into(), "admin".into()],
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    Junior,
    Senior,
    Super,
}

impl Default for AdminLevel {
    fn default() -> Self {
        AdminLevel::Junior
    }
}

// =============================================================================
// Account
// =============================================================================

/// Role-specific part of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum AccountProfile {
    User { default_address: Option<Address> },
    Vendor { store_name: Option<String> },
    Admin { level: AdminLevel },
}

impl AccountProfile {
    pub const fn role(&self) -> Role {
        match self {
            AccountProfile::User { .. } => Role::User,
            AccountProfile::Vendor { .. } => Role::Vendor,
            AccountProfile::Admin { .. } => Role::Admin,
        }
    }
}

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub profile: AccountProfile,
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self.profile, AccountProfile::Admin { level: AdminLevel::Super })
    }

    /// Stored default shipping address; only user accounts have one.
    pub fn default_address(&self) -> Option<&Address> {
        match &self.profile {
            AccountProfile::User { default_address } => default_address.as_ref(),
            _ => None,
        }
    }
}
