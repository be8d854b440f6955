//! Shared types for the check-cx admin console and control plane
//!
//! This crate contains everything that is independent of the host:
//! - API wire types exchanged by the UI, CLI and control plane
//! - The global loading signal and its request classifier
//! - The debounced loading bar state machine
//! - The theme preference store and its ports
//! - zh-CN display helpers

pub mod loading;
pub mod loading_bar;
pub mod locale;
pub mod models;
pub mod theme;

pub use loading::{header_value, InflightGuard, LoadingSignal, OutgoingRequest, RequestPolicy, Subscription};
pub use loading_bar::{BarPhase, LoadingBar, LoadingBarTiming};
pub use locale::*;
pub use models::*;
pub use theme::{
    ColorSchemeProbe, PreferenceStorage, ResolvedTheme, SchemeWatch, ThemeError, ThemePreference,
    ThemeStore, ThemeSubscription, ThemeSurface, THEME_STORAGE_KEY,
};
