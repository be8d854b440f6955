//! Global State Management
//!
//! This module manages the global application state including:
//! - The session token and its claims
//! - The global loading signal, mirrored into a reactive boolean
//! - The theme store, mirrored into reactive preference/resolved signals

use checkcx_shared::{
    LoadingSignal, ResolvedTheme, SessionClaims, Subscription, ThemePreference, ThemeStore,
    ThemeSubscription,
};
use gloo_storage::{LocalStorage, Storage};
use leptos::*;
use std::rc::Rc;

use crate::client::{AdminClientError, ApiClient};

/// `localStorage` key of the bearer token
const TOKEN_STORAGE_KEY: &str = "check-cx-admin:token";

/// Global application state
#[derive(Clone)]
pub struct AppState {
    /// Bearer token of the current session
    pub token: RwSignal<Option<String>>,

    /// Claims of the current session, once loaded
    pub session: RwSignal<Option<SessionClaims>>,

    /// Whether any tracked request is in flight
    pub is_loading: RwSignal<bool>,

    pub theme_preference: RwSignal<ThemePreference>,
    pub resolved_theme: RwSignal<ResolvedTheme>,

    theme: ThemeStore,
    _loading_subscription: Rc<Subscription>,
    _theme_subscription: Rc<ThemeSubscription>,
}

impl AppState {
    pub fn new(loading: LoadingSignal, theme: ThemeStore) -> Self {
        let token = LocalStorage::get::<String>(TOKEN_STORAGE_KEY)
            .ok()
            .filter(|t| !t.is_empty());

        let is_loading = create_rw_signal(loading.is_loading());
        let loading_subscription = {
            let signal = loading.clone();
            loading.subscribe(move || is_loading.set(signal.is_loading()))
        };

        let theme_preference = create_rw_signal(theme.preference());
        let resolved_theme = create_rw_signal(theme.resolved_theme());
        let theme_subscription = {
            let store = theme.clone();
            theme.subscribe(move || {
                theme_preference.set(store.preference());
                resolved_theme.set(store.resolved_theme());
            })
        };

        Self {
            token: create_rw_signal(token),
            session: create_rw_signal(None),
            is_loading,
            theme_preference,
            resolved_theme,
            theme,
            _loading_subscription: Rc::new(loading_subscription),
            _theme_subscription: Rc::new(theme_subscription),
        }
    }

    /// Client carrying the current token
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.token.get_untracked())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.with(Option::is_some)
    }

    /// Start a session after a successful login
    pub fn sign_in(&self, token: String) {
        if let Err(e) = LocalStorage::set(TOKEN_STORAGE_KEY, &token) {
            tracing::debug!("token not persisted: {}", e);
        }
        self.session.set(None);
        self.token.set(Some(token));
    }

    pub fn sign_out(&self) {
        LocalStorage::delete(TOKEN_STORAGE_KEY);
        self.session.set(None);
        self.token.set(None);
    }

    /// User-facing message for a failed call; an expired session signs out
    pub fn error_message(&self, error: &AdminClientError, fallback: &str) -> String {
        if error.is_unauthorized() {
            tracing::info!("Session rejected, signing out");
            self.sign_out();
        }
        error.user_message(fallback)
    }

    pub fn set_theme(&self, preference: ThemePreference) {
        self.theme.set_preference(preference);
    }
}
