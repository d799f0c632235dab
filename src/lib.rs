//! Usergroups Library
//!
//! Groups with a creator, members and admins, join applications and
//! invitations, served over HTTP for every registered group kind.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod forms;
pub mod models;
pub mod options;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod store;
pub mod views;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use options::{GroupConfiguration, GroupRegistry};
pub use services::GroupService;
pub use store::{GroupStore, MemoryStore, PgStore};
