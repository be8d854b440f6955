//! check-cx admin control plane
//!
//! Core modules for the console's REST API, storage and authentication.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod server;

// Re-export AppState for convenience
pub use server::AppState;
