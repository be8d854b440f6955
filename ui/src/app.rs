//! Root Application Component
//!
//! This module contains the main App component that sets up:
//! - Global state providers
//! - Routing (public login/setup pages, protected console pages)
//! - The protected shell with navigation and the loading bar

use checkcx_shared::{LoadingSignal, ThemeStore};
use leptos::*;
use leptos_meta::*;
use leptos_router::*;

use crate::client::AdminClient;
use crate::components::configs::ConfigsPage;
use crate::components::dashboard::Dashboard;
use crate::components::groups::GroupsPage;
use crate::components::layout::AppShell;
use crate::components::login::{LoginPage, SetupPage};
use crate::components::notifications::NotificationsPage;
use crate::state::AppState;

/// Root application component
#[component]
pub fn App(loading: LoadingSignal, theme: ThemeStore) -> impl IntoView {
    provide_meta_context();

    let app_state = AppState::new(loading, theme);
    provide_context(app_state.clone());

    // Load the session claims whenever the token changes
    {
        let app_state = app_state.clone();
        create_effect(move |_| {
            if app_state.token.get().is_none() {
                return;
            }
            let app_state = app_state.clone();
            spawn_local(async move {
                match app_state.client().current_user().await {
                    Ok(claims) => app_state.session.set(Some(claims)),
                    Err(e) => {
                        tracing::debug!("Session check failed: {}", e);
                        if e.is_unauthorized() {
                            app_state.sign_out();
                        }
                    }
                }
            });
        });
    }

    view! {
        <Title text="check-cx 管理后台" />
        <Router>
            <Routes>
                <Route path="/login" view=LoginPage />
                <Route path="/setup" view=SetupPage />

                <Route path="/" view=|| view! { <Protected><Dashboard /></Protected> } />
                <Route path="/configs" view=|| view! { <Protected><ConfigsPage /></Protected> } />
                <Route path="/groups" view=|| view! { <Protected><GroupsPage /></Protected> } />
                <Route path="/notifications" view=|| view! { <Protected><NotificationsPage /></Protected> } />

                <Route path="/*any" view=NotFound />
            </Routes>
        </Router>
    }
}

/// Console shell that sends signed-out visitors to the login page
#[component]
fn Protected(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let children = store_value(children);

    view! {
        <Show
            when=move || app_state.is_authenticated()
            fallback=|| view! { <Redirect path="/login" /> }
        >
            <AppShell>{children.with_value(|children| children())}</AppShell>
        </Show>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="min-h-screen flex items-center justify-center bg-theme-bg">
            <div class="text-center">
                <h1 class="text-4xl font-bold text-theme mb-2">"404"</h1>
                <p class="text-theme-secondary mb-4">"页面不存在"</p>
                <A href="/" class="btn-primary">"返回首页"</A>
            </div>
        </div>
    }
}
