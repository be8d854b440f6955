//! App Shell Component
//!
//! Main layout container that combines:
//! - The global loading bar
//! - Side navigation
//! - Top bar (theme toggle, user menu)
//! - Main content area

use leptos::*;

use super::{Sidebar, TopBar};
use crate::components::common::GlobalLoadingBar;

/// Main application shell layout
#[component]
pub fn AppShell(
    /// Page content
    children: Children,
) -> impl IntoView {
    view! {
        <div class="h-screen flex bg-theme-bg text-theme overflow-hidden">
            <GlobalLoadingBar />
            <Sidebar />

            <div class="flex-1 flex flex-col min-w-0">
                <TopBar />
                <main class="flex-1 overflow-auto p-6">
                    {children()}
                </main>
            </div>
        </div>
    }
}
