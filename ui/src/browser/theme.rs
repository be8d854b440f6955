//! Browser ports of the theme store
//!
//! `localStorage` for the preference, `matchMedia` for the OS scheme, and
//! the document root element as the presentation surface.

use checkcx_shared::{
    ColorSchemeProbe, PreferenceStorage, ResolvedTheme, SchemeWatch, ThemeError, ThemePreference,
    ThemeStore, ThemeSurface,
};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

fn window() -> Result<web_sys::Window, ThemeError> {
    web_sys::window().ok_or_else(|| ThemeError::Surface("no window".to_string()))
}

fn js_message(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

/// Raw string access to `localStorage`.
///
/// Uses `web_sys::Storage` directly: private browsing modes may deny
/// access, which must surface as an error rather than a panic.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPreferenceStorage;

impl LocalPreferenceStorage {
    fn storage() -> Result<web_sys::Storage, ThemeError> {
        window()?
            .local_storage()
            .map_err(|e| ThemeError::Storage(js_message(e)))?
            .ok_or_else(|| ThemeError::Storage("localStorage unavailable".to_string()))
    }
}

impl PreferenceStorage for LocalPreferenceStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ThemeError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| ThemeError::Storage(js_message(e)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| ThemeError::Storage(js_message(e)))
    }
}

/// `matchMedia('(prefers-color-scheme: dark)')`
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaQueryProbe;

impl MediaQueryProbe {
    fn query() -> Result<web_sys::MediaQueryList, ThemeError> {
        window()?
            .match_media(DARK_QUERY)
            .map_err(|e| ThemeError::ColorScheme(js_message(e)))?
            .ok_or_else(|| ThemeError::ColorScheme("matchMedia unsupported".to_string()))
    }
}

impl ColorSchemeProbe for MediaQueryProbe {
    fn prefers_dark(&self) -> Result<bool, ThemeError> {
        Ok(Self::query()?.matches())
    }

    fn watch(&self, on_change: Rc<dyn Fn(bool)>) -> Result<SchemeWatch, ThemeError> {
        let query = Self::query()?;
        let listener = Closure::<dyn FnMut(web_sys::MediaQueryListEvent)>::new(
            move |event: web_sys::MediaQueryListEvent| on_change(event.matches()),
        );

        query
            .add_event_listener_with_callback("change", listener.as_ref().unchecked_ref())
            .map_err(|e| ThemeError::ColorScheme(js_message(e)))?;

        Ok(SchemeWatch::new(move || {
            let _ = query.remove_event_listener_with_callback("change", listener.as_ref().unchecked_ref());
            drop(listener);
        }))
    }
}

/// Applies the theme to `<html>`: the `dark` class, `color-scheme` and `data-theme`
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentSurface;

impl ThemeSurface for DocumentSurface {
    fn apply(&self, resolved: ResolvedTheme, preference: ThemePreference) -> Result<(), ThemeError> {
        let root = window()?
            .document()
            .and_then(|d| d.document_element())
            .ok_or_else(|| ThemeError::Surface("no document element".to_string()))?;

        root.class_list()
            .toggle_with_force("dark", resolved.is_dark())
            .map_err(|e| ThemeError::Surface(js_message(e)))?;
        root.set_attribute("data-theme", preference.as_str())
            .map_err(|e| ThemeError::Surface(js_message(e)))?;

        if let Some(html) = root.dyn_ref::<web_sys::HtmlElement>() {
            html.style()
                .set_property("color-scheme", resolved.as_str())
                .map_err(|e| ThemeError::Surface(js_message(e)))?;
        }
        Ok(())
    }
}

/// Build the theme store and apply the theme before anything is mounted.
///
/// Also subscribes the store to `storage` events so a preference written
/// in another tab is picked up here.
pub fn create_theme_store() -> ThemeStore {
    let store = ThemeStore::new(LocalPreferenceStorage, MediaQueryProbe, DocumentSurface);

    if let Some(window) = web_sys::window() {
        let listener = store.storage_listener();
        let on_storage = Closure::<dyn FnMut(web_sys::StorageEvent)>::new(move |event: web_sys::StorageEvent| {
            listener(event.key().as_deref(), event.new_value().as_deref());
        });
        match window.add_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref()) {
            Ok(()) => on_storage.forget(),
            Err(e) => tracing::debug!("storage listener not installed: {}", js_message(e)),
        }
    }

    store
}
