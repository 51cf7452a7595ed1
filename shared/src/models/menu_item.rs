//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub is_available: bool,
    pub display_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A selectable option inside an [`OptionGroup`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    /// Price delta added to the item when selected
    pub price: Decimal,
    pub display_order: i64,
}

/// Option group (e.g. "Spice level") attached to menu items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub min_select: i64,
    pub max_select: i64,
    pub display_order: i64,
    pub options: Vec<MenuOption>,
}

/// Menu item with its option groups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDetail {
    #[serde(flatten)]
    pub item: MenuItem,
    pub option_groups: Vec<OptionGroup>,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
    pub display_order: Option<i64>,
    /// Option groups to attach
    #[serde(default)]
    pub option_group_ids: Vec<i64>,
}

/// Update menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
    pub display_order: Option<i64>,
}
