//! UI Components
//!
//! This module contains all UI components organized by feature:
//! - `common`: Shared/reusable components (dialogs, icons, loading bar)
//! - `layout`: The console shell
//! - `login`: Login and first-time setup
//! - `dashboard`: Overview counters
//! - `configs`: Check config management
//! - `groups`: Group management
//! - `notifications`: System notification management

pub mod common;
pub mod configs;
pub mod dashboard;
pub mod groups;
pub mod layout;
pub mod login;
pub mod notifications;
