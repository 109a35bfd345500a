// Library exports for binary tools and tests
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use app::{build_router, AppState};
pub use services::menu_view::{MenuEditor, Notice};
