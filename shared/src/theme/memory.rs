//! In-memory ports for tests
//!
//! Several [`MemoryStorageContext`]s over one [`SharedMemoryStorage`] stand
//! in for browsing contexts sharing an origin.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{
    ColorSchemeProbe, PreferenceStorage, ResolvedTheme, SchemeWatch, ThemeError, ThemePreference,
    ThemeSurface,
};


type StorageListener = Rc<dyn Fn(Option<&str>, Option<&str>)>;

#[derive(Default)]
struct SharedStorageState {
    values: HashMap<String, String>,
    listeners: Vec<(u64, StorageListener)>,
    next_context: u64,
    failing: bool,
}

/// Storage area shared by several simulated browsing contexts.
///
/// A write through one context notifies the listeners of every other
/// context, the way a browser fires `storage` events.
#[derive(Clone, Default)]
pub struct SharedMemoryStorage {
    shared: Rc<RefCell<SharedStorageState>>,
}

impl SharedMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new browsing context on this storage area
    pub fn context(&self) -> MemoryStorageContext {
        let mut shared = self.shared.borrow_mut();
        let id = shared.next_context;
        shared.next_context += 1;
        MemoryStorageContext {
            id,
            shared: self.shared.clone(),
        }
    }

    /// Seed a raw value without firing events
    pub fn insert(&self, key: &str, value: &str) {
        self.shared
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.shared.borrow().values.get(key).cloned()
    }

    /// Make every read and write fail, like a sandboxed iframe
    pub fn set_failing(&self, failing: bool) {
        self.shared.borrow_mut().failing = failing;
    }
}

/// One browsing context's view of a [`SharedMemoryStorage`]
#[derive(Clone)]
pub struct MemoryStorageContext {
    id: u64,
    shared: Rc<RefCell<SharedStorageState>>,
}

impl MemoryStorageContext {
    /// Listen for writes made by other contexts
    pub fn on_storage_event(&self, listener: impl Fn(Option<&str>, Option<&str>) + 'static) {
        self.shared
            .borrow_mut()
            .listeners
            .push((self.id, Rc::new(listener)));
    }
}

impl PreferenceStorage for MemoryStorageContext {
    fn read(&self, key: &str) -> Result<Option<String>, ThemeError> {
        let shared = self.shared.borrow();
        if shared.failing {
            return Err(ThemeError::Storage("storage disabled".to_string()));
        }
        Ok(shared.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        let listeners: Vec<StorageListener> = {
            let mut shared = self.shared.borrow_mut();
            if shared.failing {
                return Err(ThemeError::Storage("storage disabled".to_string()));
            }
            let previous = shared.values.insert(key.to_string(), value.to_string());
            if previous.as_deref() == Some(value) {
                return Ok(());
            }
            shared
                .listeners
                .iter()
                .filter(|(context, _)| *context != self.id)
                .map(|(_, listener)| listener.clone())
                .collect()
        };

        for listener in listeners {
            listener(Some(key), Some(value));
        }
        Ok(())
    }
}

#[derive(Default)]
struct SchemeState {
    prefers_dark: bool,
    failing: bool,
    listeners: Vec<(u64, Rc<dyn Fn(bool)>)>,
    next_id: u64,
}

/// Settable OS color scheme
#[derive(Clone, Default)]
pub struct MemoryColorScheme {
    state: Rc<RefCell<SchemeState>>,
}

impl MemoryColorScheme {
    pub fn new(prefers_dark: bool) -> Self {
        let probe = Self::default();
        probe.state.borrow_mut().prefers_dark = prefers_dark;
        probe
    }

    /// Change the simulated OS preference and notify watchers
    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        let listeners: Vec<Rc<dyn Fn(bool)>> = {
            let mut state = self.state.borrow_mut();
            state.prefers_dark = prefers_dark;
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(prefers_dark);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }

    pub fn watcher_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl ColorSchemeProbe for MemoryColorScheme {
    fn prefers_dark(&self) -> Result<bool, ThemeError> {
        let state = self.state.borrow();
        if state.failing {
            return Err(ThemeError::ColorScheme("matchMedia unavailable".to_string()));
        }
        Ok(state.prefers_dark)
    }

    fn watch(&self, on_change: Rc<dyn Fn(bool)>) -> Result<SchemeWatch, ThemeError> {
        let id = {
            let mut state = self.state.borrow_mut();
            if state.failing {
                return Err(ThemeError::ColorScheme("matchMedia unavailable".to_string()));
            }
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, on_change));
            id
        };

        let weak = Rc::downgrade(&self.state);
        Ok(SchemeWatch::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().listeners.retain(|(l, _)| *l != id);
            }
        }))
    }
}

/// Surface that records every application
#[derive(Clone, Default)]
pub struct RecordingSurface {
    applied: Rc<RefCell<Vec<(ResolvedTheme, ThemePreference)>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<(ResolvedTheme, ThemePreference)> {
        self.applied.borrow().clone()
    }

    pub fn last(&self) -> Option<(ResolvedTheme, ThemePreference)> {
        self.applied.borrow().last().copied()
    }
}

impl ThemeSurface for RecordingSurface {
    fn apply(&self, resolved: ResolvedTheme, preference: ThemePreference) -> Result<(), ThemeError> {
        self.applied.borrow_mut().push((resolved, preference));
        Ok(())
    }
}
