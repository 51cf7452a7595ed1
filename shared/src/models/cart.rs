//! Cart Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Session id used when the client does not send one
pub const GUEST_SESSION: &str = "guest-session";

/// Largest quantity a single cart line may hold, merged adds included
pub const MAX_QUANTITY: i64 = 999;

/// Option chosen for a cart or order line, copied at selection time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}

/// Cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub menu_item_id: i64,
    /// Current menu item name (display only)
    pub name: String,
    pub quantity: i64,
    /// Unit price copied when the line was first added
    pub price: Decimal,
    pub options: Vec<SelectedOption>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cart snapshot for one (table, session)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: i64,
    pub table_id: i64,
    pub session_id: String,
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub item_count: i64,
}

impl Cart {
    /// Placeholder returned when the cart cannot be read
    pub fn empty(table_id: i64, session_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            table_id,
            session_id: session_id.into(),
            items: Vec::new(),
            total: Decimal::ZERO,
            item_count: 0,
        }
    }
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemAdd {
    pub cart_id: i64,
    pub menu_item_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub options: Vec<SelectedOption>,
    pub notes: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Quantity update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i64,
}
