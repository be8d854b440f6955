//! Theme preference store
//!
//! Holds the light/dark/system preference, resolves it against the OS color
//! scheme and pushes the result to the page. The store talks to the outside
//! world through three ports:
//!
//! - [`PreferenceStorage`] - persisted preference (localStorage in the browser)
//! - [`ColorSchemeProbe`] - OS color scheme and its change notifications
//! - [`ThemeSurface`] - where the resolved theme is applied (document root)
//!
//! Failures from any port are logged at debug level and swallowed. Theming
//! degrades to "system default, no persistence" and never blocks rendering.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::debug;

/// localStorage key holding the preference
pub const THEME_STORAGE_KEY: &str = "check-cx-admin:theme";

/// User's theme choice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [Self::Light, Self::Dark, Self::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Parse a stored value; anything unrecognized is `System`
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("light") => ThemePreference::Light,
            Some("dark") => ThemePreference::Dark,
            _ => ThemePreference::System,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemePreference::Light => "浅色",
            ThemePreference::Dark => "深色",
            ThemePreference::System => "跟随系统",
        }
    }
}

/// Concrete theme after resolving `System`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    #[default]
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedTheme::Light => "light",
            ResolvedTheme::Dark => "dark",
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ResolvedTheme::Dark)
    }

    fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            ResolvedTheme::Dark
        } else {
            ResolvedTheme::Light
        }
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("preference storage unavailable: {0}")]
    Storage(String),

    #[error("color scheme query failed: {0}")]
    ColorScheme(String),

    #[error("failed to apply theme: {0}")]
    Surface(String),
}

// =============================================================================
// Ports
// =============================================================================

pub trait PreferenceStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ThemeError>;
    fn write(&self, key: &str, value: &str) -> Result<(), ThemeError>;
}

pub trait ColorSchemeProbe {
    /// Whether the OS currently prefers a dark color scheme
    fn prefers_dark(&self) -> Result<bool, ThemeError>;

    /// Start listening for OS color scheme changes.
    ///
    /// `on_change` receives the new "prefers dark" value. Listening stops
    /// when the returned [`SchemeWatch`] is dropped.
    fn watch(&self, on_change: Rc<dyn Fn(bool)>) -> Result<SchemeWatch, ThemeError>;
}

pub trait ThemeSurface {
    fn apply(&self, resolved: ResolvedTheme, preference: ThemePreference) -> Result<(), ThemeError>;
}

/// Active OS color scheme listener; dropping it removes the listener
pub struct SchemeWatch {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl SchemeWatch {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }
}

impl Drop for SchemeWatch {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

// =============================================================================
// Store
// =============================================================================

struct StoreState {
    storage: Box<dyn PreferenceStorage>,
    probe: Box<dyn ColorSchemeProbe>,
    surface: Box<dyn ThemeSurface>,
    preference: ThemePreference,
    resolved: ResolvedTheme,
    system_watch: Option<SchemeWatch>,
    observers: Vec<(u64, Rc<dyn Fn()>)>,
    next_observer_id: u64,
}

impl StoreState {
    fn resolve(&self, preference: ThemePreference) -> ResolvedTheme {
        match preference {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::System => match self.probe.prefers_dark() {
                Ok(prefers_dark) => ResolvedTheme::from_prefers_dark(prefers_dark),
                Err(e) => {
                    debug!("Falling back to light theme: {}", e);
                    ResolvedTheme::Light
                }
            },
        }
    }

    fn apply(&self) {
        if let Err(e) = self.surface.apply(self.resolved, self.preference) {
            debug!("Theme not applied: {}", e);
        }
    }

    fn observers(&self) -> Vec<Rc<dyn Fn()>> {
        self.observers.iter().map(|(_, observer)| observer.clone()).collect()
    }
}

/// Single-threaded handle to the theme state.
///
/// Cloning yields another handle to the same store. Construction reads the
/// persisted preference, resolves it and applies it to the surface, so the
/// store should be built before any view is mounted.
#[derive(Clone)]
pub struct ThemeStore {
    state: Rc<RefCell<StoreState>>,
}

impl ThemeStore {
    pub fn new(
        storage: impl PreferenceStorage + 'static,
        probe: impl ColorSchemeProbe + 'static,
        surface: impl ThemeSurface + 'static,
    ) -> Self {
        let preference = match storage.read(THEME_STORAGE_KEY) {
            Ok(stored) => ThemePreference::normalize(stored.as_deref()),
            Err(e) => {
                debug!("Theme preference not readable: {}", e);
                ThemePreference::System
            }
        };

        let mut state = StoreState {
            storage: Box::new(storage),
            probe: Box::new(probe),
            surface: Box::new(surface),
            preference,
            resolved: ResolvedTheme::Light,
            system_watch: None,
            observers: Vec::new(),
            next_observer_id: 0,
        };
        state.resolved = state.resolve(preference);
        state.apply();

        let store = Self {
            state: Rc::new(RefCell::new(state)),
        };
        store.sync_system_watch();
        store
    }

    pub fn preference(&self) -> ThemePreference {
        self.state.borrow().preference
    }

    pub fn resolved_theme(&self) -> ResolvedTheme {
        self.state.borrow().resolved
    }

    /// Whether the store is currently listening to OS color scheme changes
    pub fn follows_system(&self) -> bool {
        self.state.borrow().system_watch.is_some()
    }

    /// Persist and apply a new preference
    pub fn set_preference(&self, preference: ThemePreference) {
        {
            let state = self.state.borrow();
            if let Err(e) = state.storage.write(THEME_STORAGE_KEY, preference.as_str()) {
                debug!("Theme preference not persisted: {}", e);
            }
        }
        self.update(preference);
    }

    /// Like [`ThemeStore::set_preference`], normalizing unknown values to `System`
    pub fn set_preference_str(&self, value: &str) {
        self.set_preference(ThemePreference::normalize(Some(value)));
    }

    /// OS color scheme changed; only matters while following the system
    pub fn handle_system_change(&self, prefers_dark: bool) {
        let changed = {
            let mut state = self.state.borrow_mut();
            if state.preference != ThemePreference::System {
                return;
            }
            let resolved = ResolvedTheme::from_prefers_dark(prefers_dark);
            let changed = resolved != state.resolved;
            state.resolved = resolved;
            state.apply();
            changed
        };

        if changed {
            self.notify();
        }
    }

    /// Another browsing context wrote to storage.
    ///
    /// Only events for the theme key count. Clearing the whole storage area
    /// reports no key and leaves the preference alone.
    pub fn handle_storage_event(&self, key: Option<&str>, new_value: Option<&str>) {
        if key != Some(THEME_STORAGE_KEY) {
            return;
        }
        self.update(ThemePreference::normalize(new_value));
    }

    /// Callback suitable for a storage event listener.
    ///
    /// Holds the store weakly so the listener does not keep it alive.
    pub fn storage_listener(&self) -> impl Fn(Option<&str>, Option<&str>) + 'static {
        let weak = Rc::downgrade(&self.state);
        move |key, new_value| {
            if let Some(state) = weak.upgrade() {
                ThemeStore { state }.handle_storage_event(key, new_value);
            }
        }
    }

    /// Register a callback fired after the preference or resolved theme changes
    pub fn subscribe(&self, observer: impl Fn() + 'static) -> ThemeSubscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_observer_id;
        state.next_observer_id += 1;
        state.observers.push((id, Rc::new(observer)));

        ThemeSubscription {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    fn update(&self, preference: ThemePreference) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let resolved = state.resolve(preference);
            let changed = preference != state.preference || resolved != state.resolved;
            state.preference = preference;
            state.resolved = resolved;
            state.apply();
            changed
        };

        self.sync_system_watch();
        if changed {
            self.notify();
        }
    }

    fn sync_system_watch(&self) {
        let mut state = self.state.borrow_mut();
        let wants_watch = state.preference == ThemePreference::System;

        if !wants_watch {
            state.system_watch = None;
            return;
        }
        if state.system_watch.is_some() {
            return;
        }

        let weak: Weak<RefCell<StoreState>> = Rc::downgrade(&self.state);
        let on_change: Rc<dyn Fn(bool)> = Rc::new(move |prefers_dark| {
            if let Some(state) = weak.upgrade() {
                ThemeStore { state }.handle_system_change(prefers_dark);
            }
        });

        match state.probe.watch(on_change) {
            Ok(watch) => state.system_watch = Some(watch),
            Err(e) => debug!("Not watching OS color scheme: {}", e),
        }
    }

    fn notify(&self) {
        let observers = self.state.borrow().observers();
        for observer in observers {
            observer();
        }
    }
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ThemeStore")
            .field("preference", &state.preference)
            .field("resolved", &state.resolved)
            .field("follows_system", &state.system_watch.is_some())
            .finish()
    }
}

/// Registration handle returned by [`ThemeStore::subscribe`]
#[must_use = "dropping a ThemeSubscription unregisters its observer"]
pub struct ThemeSubscription {
    id: u64,
    state: Weak<RefCell<StoreState>>,
}

impl ThemeSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for ThemeSubscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            if let Ok(mut state) = state.try_borrow_mut() {
                state.observers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(any(test, feature = "testing"))]
mod memory;

#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryColorScheme, MemoryStorageContext, RecordingSurface, SharedMemoryStorage};

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn store_with(
        storage: &SharedMemoryStorage,
        probe: &MemoryColorScheme,
    ) -> (ThemeStore, MemoryStorageContext, RecordingSurface) {
        let context = storage.context();
        let surface = RecordingSurface::new();
        let store = ThemeStore::new(context.clone(), probe.clone(), surface.clone());
        (store, context, surface)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(ThemePreference::normalize(None), ThemePreference::System);
        assert_eq!(ThemePreference::normalize(Some("")), ThemePreference::System);
        assert_eq!(ThemePreference::normalize(Some("blue")), ThemePreference::System);
        assert_eq!(ThemePreference::normalize(Some("Dark")), ThemePreference::System);
        assert_eq!(ThemePreference::normalize(Some("dark")), ThemePreference::Dark);
        assert_eq!(ThemePreference::normalize(Some("light")), ThemePreference::Light);
    }

    #[test]
    fn test_missing_or_invalid_value_reads_as_system() {
        for stored in [None, Some(""), Some("blue")] {
            let storage = SharedMemoryStorage::new();
            if let Some(value) = stored {
                storage.insert(THEME_STORAGE_KEY, value);
            }
            let (store, _, _) = store_with(&storage, &MemoryColorScheme::new(false));
            assert_eq!(store.preference(), ThemePreference::System);
        }
    }

    #[test]
    fn test_construction_applies_before_any_change() {
        let storage = SharedMemoryStorage::new();
        storage.insert(THEME_STORAGE_KEY, "dark");
        let (store, _, surface) = store_with(&storage, &MemoryColorScheme::new(false));

        assert_eq!(store.resolved_theme(), ResolvedTheme::Dark);
        assert_eq!(
            surface.applied(),
            vec![(ResolvedTheme::Dark, ThemePreference::Dark)]
        );
        assert!(!store.follows_system());
    }

    #[test]
    fn test_explicit_preference_ignores_os() {
        let storage = SharedMemoryStorage::new();
        let probe = MemoryColorScheme::new(false);
        let (store, _, surface) = store_with(&storage, &probe);

        store.set_preference(ThemePreference::Dark);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Dark);
        assert_eq!(storage.get(THEME_STORAGE_KEY).as_deref(), Some("dark"));
        assert_eq!(surface.last(), Some((ResolvedTheme::Dark, ThemePreference::Dark)));

        probe.set_prefers_dark(true);
        probe.set_prefers_dark(false);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Dark);
    }

    #[test]
    fn test_system_preference_tracks_os_changes() {
        let storage = SharedMemoryStorage::new();
        let probe = MemoryColorScheme::new(true);
        let (store, _, surface) = store_with(&storage, &probe);

        store.set_preference(ThemePreference::System);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Dark);
        assert!(store.follows_system());

        probe.set_prefers_dark(false);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Light);
        assert_eq!(surface.last(), Some((ResolvedTheme::Light, ThemePreference::System)));
    }

    #[test]
    fn test_os_watch_torn_down_when_leaving_system() {
        let storage = SharedMemoryStorage::new();
        let probe = MemoryColorScheme::new(false);
        let (store, _, _) = store_with(&storage, &probe);
        assert_eq!(probe.watcher_count(), 1);

        store.set_preference(ThemePreference::Light);
        assert_eq!(probe.watcher_count(), 0);
        assert!(!store.follows_system());

        store.set_preference(ThemePreference::System);
        store.set_preference(ThemePreference::System);
        assert_eq!(probe.watcher_count(), 1);
    }

    #[test]
    fn test_invalid_input_normalizes_to_system() {
        let storage = SharedMemoryStorage::new();
        storage.insert(THEME_STORAGE_KEY, "dark");
        let (store, _, _) = store_with(&storage, &MemoryColorScheme::new(false));

        store.set_preference_str("neon");
        assert_eq!(store.preference(), ThemePreference::System);
        assert_eq!(storage.get(THEME_STORAGE_KEY).as_deref(), Some("system"));
    }

    #[test]
    fn test_cross_context_sync() {
        let storage = SharedMemoryStorage::new();
        let probe = MemoryColorScheme::new(false);
        let (first, _, _) = store_with(&storage, &probe);
        let (second, second_context, second_surface) = store_with(&storage, &probe);
        second_context.on_storage_event(second.storage_listener());

        first.set_preference(ThemePreference::Dark);

        assert_eq!(second.preference(), ThemePreference::Dark);
        assert_eq!(second.resolved_theme(), ResolvedTheme::Dark);
        assert_eq!(
            second_surface.last(),
            Some((ResolvedTheme::Dark, ThemePreference::Dark))
        );
    }

    #[test]
    fn test_storage_events_for_other_keys_are_ignored() {
        let storage = SharedMemoryStorage::new();
        let (store, _, _) = store_with(&storage, &MemoryColorScheme::new(false));
        store.set_preference(ThemePreference::Dark);

        store.handle_storage_event(Some("check-cx-admin:sidebar"), Some("light"));
        assert_eq!(store.preference(), ThemePreference::Dark);

        // storage.clear() reports no key
        store.handle_storage_event(None, None);
        assert_eq!(store.preference(), ThemePreference::Dark);

        store.handle_storage_event(Some(THEME_STORAGE_KEY), None);
        assert_eq!(store.preference(), ThemePreference::System);
    }

    #[test]
    fn test_failing_ports_degrade_to_defaults() {
        let storage = SharedMemoryStorage::new();
        storage.insert(THEME_STORAGE_KEY, "dark");
        storage.set_failing(true);
        let probe = MemoryColorScheme::new(true);
        probe.set_failing(true);

        let (store, _, surface) = store_with(&storage, &probe);
        assert_eq!(store.preference(), ThemePreference::System);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Light);
        assert!(!store.follows_system());
        assert_eq!(surface.applied().len(), 1);

        // writes fail quietly but still apply for this context
        store.set_preference(ThemePreference::Dark);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Dark);
    }

    #[test]
    fn test_subscribers_fire_on_changes_only() {
        let storage = SharedMemoryStorage::new();
        let probe = MemoryColorScheme::new(false);
        let (store, _, _) = store_with(&storage, &probe);

        let calls = Rc::new(Cell::new(0));
        let sub = {
            let calls = calls.clone();
            let reader = store.clone();
            store.subscribe(move || {
                // reading inside the callback must not conflict with the store
                let _ = reader.resolved_theme();
                calls.set(calls.get() + 1);
            })
        };

        store.set_preference(ThemePreference::System);
        assert_eq!(calls.get(), 0);

        probe.set_prefers_dark(true);
        assert_eq!(calls.get(), 1);

        store.set_preference(ThemePreference::Dark);
        assert_eq!(calls.get(), 2);

        sub.unsubscribe();
        store.set_preference(ThemePreference::Light);
        assert_eq!(calls.get(), 2);
    }
}
