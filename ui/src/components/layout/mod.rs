//! Layout Components
//!
//! - `AppShell` - Main layout container with navigation and content
//! - `Sidebar` - Section navigation
//! - `TopBar` - Page title, theme toggle and user menu

mod app_shell;
mod sidebar;
mod top_bar;

pub use app_shell::AppShell;
pub use sidebar::Sidebar;
pub use top_bar::TopBar;
