//! Wire types for the armory REST API.
//!
//! Field names mirror the backend's JSON exactly; everything the client
//! renders is deserialized into these before any view logic touches it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xeno_armory_core::{CartLineId, Credits, OrderId, OrderStatus, Role, UserId, WeaponId};

/// A product in the armory catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub name: String,
    /// Product category ("Melee", "Plasma", "Ballistic", ...).
    #[serde(rename = "type")]
    pub category: String,
    pub price: Credits,
    /// Remaining sellable units; authoritative on the server.
    pub stock: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

impl Weapon {
    /// A weapon with zero stock stays visible in the catalog but cannot be
    /// ordered by anyone.
    #[must_use]
    pub const fn orderable(&self) -> bool {
        self.stock > 0
    }
}

/// A raw cart record as returned by `GET /cart`: the server-side line
/// identity plus an embedded product snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CartRecord {
    pub id: CartLineId,
    pub weapon_id: WeaponId,
    pub quantity: u32,
    pub weapon: Weapon,
}

/// Request body for `POST /cart` (server-side increment) and
/// `PUT /cart/:weapon_id` (absolute quantity).
#[derive(Debug, Clone, Serialize)]
pub struct CartMutation {
    pub weapon_id: WeaponId,
    pub quantity: u32,
}

/// One line of an order as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub weapon_id: WeaponId,
    pub quantity: u32,
    /// Embedded product snapshot; the admin overview omits it sometimes.
    #[serde(default)]
    pub weapon: Option<Weapon>,
}

/// An order in the user's history. Immutable from the client's perspective.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub total: Credits,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// An order in the admin overview, annotated with buyer details.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub address: String,
    pub total: Credits,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub credits: Credits,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub avatar: String,
}

/// Response of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// Request body for `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub total: Credits,
    pub items: Vec<CheckoutItem>,
}

/// One line of a checkout submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutItem {
    pub weapon_id: WeaponId,
    pub quantity: u32,
}

/// Success response of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub total: Credits,
    pub remaining_credits: Credits,
}

/// Request body for `POST /topup`.
#[derive(Debug, Serialize)]
pub struct TopupRequest {
    pub amount: Credits,
}

/// Success response of `POST /topup`.
#[derive(Debug, Deserialize)]
pub struct TopupResponse {
    pub new_balance: Credits,
}

/// Generic `{"message": ...}` acknowledgement used by several endpoints.
#[derive(Debug, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: String,
}

/// Error body shape. Handlers use `error`; a few legacy ones use `message`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The user-facing message, whichever field carried it.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_deserializes_backend_shape() {
        let json = r#"{
            "id": 3,
            "name": "Plasma Repeater",
            "type": "Plasma",
            "price": 4500,
            "stock": 2,
            "description": "Rapid-fire energy weapon",
            "image_url": "uploads/plasma.png"
        }"#;
        let weapon: Weapon = serde_json::from_str(json).expect("parse weapon");
        assert_eq!(weapon.id, WeaponId::new(3));
        assert_eq!(weapon.category, "Plasma");
        assert_eq!(weapon.price, Credits::new(4500));
        assert!(weapon.orderable());
    }

    #[test]
    fn test_out_of_stock_not_orderable() {
        let json = r#"{"id":1,"name":"Vibro Blade","type":"Melee","price":100,"stock":0}"#;
        let weapon: Weapon = serde_json::from_str(json).expect("parse weapon");
        assert!(!weapon.orderable());
    }

    #[test]
    fn test_error_body_prefers_error_field() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"insufficient stock","message":"ignored"}"#)
                .expect("parse error body");
        assert_eq!(body.into_message().as_deref(), Some("insufficient stock"));
    }

    #[test]
    fn test_error_body_falls_back_to_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"something broke"}"#).expect("parse error body");
        assert_eq!(body.into_message().as_deref(), Some("something broke"));
    }

    #[test]
    fn test_checkout_request_serializes_items() {
        let request = CheckoutRequest {
            total: Credits::new(300),
            items: vec![CheckoutItem {
                weapon_id: WeaponId::new(1),
                quantity: 3,
            }],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["total"], 300);
        assert_eq!(json["items"][0]["weapon_id"], 1);
        assert_eq!(json["items"][0]["quantity"], 3);
    }
}
