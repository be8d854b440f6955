//! check-cx console UI
//!
//! Leptos single-page app for administering check-cx: check configs,
//! groups, system notifications and a dashboard.
//!
//! # Modules
//!
//! - [`app`]: Root application component and routing
//! - [`browser`]: fetch interceptor and theme ports for the browser
//! - [`client`]: Control plane client (`AdminClient`, `ApiClient`)
//! - [`components`]: Layout, loading bar, theme toggle and pages
//! - [`state`]: Global state (session, loading, theme)

pub mod app;
pub mod browser;
pub mod client;
pub mod components;
pub mod state;

pub use app::App;
