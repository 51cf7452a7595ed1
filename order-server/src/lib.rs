//! order-server: table-side QR ordering backend
//!
//! Guests scan a table code, browse the menu, build a cart, check out and
//! pay. Staff manage orders, menu items and tables through the admin API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod services;
pub mod state;

pub use api::build_app;
pub use config::Config;
pub use state::AppState;
