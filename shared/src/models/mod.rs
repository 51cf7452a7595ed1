//! Data models
//!
//! Shared between order-server and frontend (via API). JSON is camelCase.
//! Rows without money use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`;
//! rows with money are mapped from integer cents in the server's db layer.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are epoch millis.

pub mod cart;
pub mod category;
pub mod dining_table;
pub mod menu_item;
pub mod order;
pub mod payment;
pub mod user;

// Re-exports
pub use cart::*;
pub use category::*;
pub use dining_table::*;
pub use menu_item::*;
pub use order::*;
pub use payment::*;
pub use user::*;
