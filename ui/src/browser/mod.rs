//! Browser adapters
//!
//! Binds the platform-independent pieces of `checkcx-shared` to the
//! browser: the `window.fetch` patch that feeds the global loading signal,
//! and the theme store's storage, media query and document ports.

pub mod fetch;
pub mod theme;

pub use fetch::install_fetch_interceptor;
pub use theme::{create_theme_store, DocumentSurface, LocalPreferenceStorage, MediaQueryProbe};

/// URL of the current page, if running in a browser
pub fn page_url() -> Option<url::Url> {
    let href = web_sys::window()?.location().href().ok()?;
    url::Url::parse(&href).ok()
}
