//! Status and role enums.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order lifecycle status as reported by the backend.
///
/// The backend marks orders `paid` at creation; the remaining states exist
/// for the order-history display and are never written by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "paid"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Account role attached to the session credential.
///
/// The role gates the admin surface client-side as a UX convenience only;
/// the backend is the actual authorization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// True for accounts allowed into the inventory editor.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Error)]
#[error("Invalid role: {0}. Valid roles: admin, user")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(ParseRoleError(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serde() {
        let status: OrderStatus = serde_json::from_str("\"paid\"").expect("parse status");
        assert_eq!(status, OrderStatus::Paid);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().expect("parse role"), Role::Admin);
        assert!("commander".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_gate() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_role_display_roundtrip() {
        let role: Role = Role::Admin.to_string().parse().expect("roundtrip");
        assert_eq!(role, Role::Admin);
    }
}
