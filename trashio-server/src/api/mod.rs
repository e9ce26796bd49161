//! HTTP API handlers for trashio-server

pub mod admin;
pub mod health;
pub mod reports;
pub mod users;
pub mod worker;

pub use admin::admin_routes;
pub use health::health_routes;
pub use reports::report_routes;
pub use users::user_routes;
pub use worker::worker_routes;
