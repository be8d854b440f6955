//! Common/Shared UI Components
//!
//! Reusable components used throughout the console.

mod icons;
mod loading_bar;
mod modal;
mod theme_toggle;

pub use icons::*;
pub use loading_bar::GlobalLoadingBar;
pub use modal::{ConfirmDialog, ErrorBanner, Modal};
pub use theme_toggle::ThemeToggle;
