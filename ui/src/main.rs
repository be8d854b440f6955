//! check-cx console entry point
//!
//! Initializes logging, applies the theme and patches `fetch` before the
//! Leptos app is mounted, so the first paint already has the right theme.

use checkcx_shared::{LoadingSignal, RequestPolicy};
use checkcx_ui::browser::{create_theme_store, install_fetch_interceptor};
use checkcx_ui::App;
use leptos::*;
use tracing_wasm::WASMLayerConfigBuilder;

fn main() {
    // Initialize WASM tracing
    let config = WASMLayerConfigBuilder::default()
        .set_max_level(tracing::Level::DEBUG)
        .build();
    tracing_wasm::set_as_global_default_with_config(config);

    tracing::info!("Starting check-cx console");

    let theme = create_theme_store();

    let loading = LoadingSignal::new();
    if let Err(e) = install_fetch_interceptor(loading.clone(), RequestPolicy::default()) {
        tracing::warn!("fetch interceptor not installed: {:?}", e);
    }

    mount_to_body(move || view! { <App loading=loading theme=theme /> });
}
