//! Top Bar Component
//!
//! Page title derived from the route, the theme toggle and the user menu.

use leptos::*;
use leptos_router::*;

use crate::components::common::{LogoutIcon, ThemeToggle};
use crate::state::AppState;

/// Get the page title for a path
fn page_title(pathname: &str) -> &'static str {
    match pathname.split('/').find(|s| !s.is_empty()) {
        None => "仪表盘",
        Some("configs") => "检测配置",
        Some("groups") => "分组管理",
        Some("notifications") => "系统通知",
        Some(_) => "check-cx",
    }
}

#[component]
pub fn TopBar() -> impl IntoView {
    let location = use_location();

    view! {
        <header class="h-14 flex items-center justify-between px-6 bg-theme-surface border-b border-theme-border flex-shrink-0">
            <h1 class="text-base font-semibold text-theme">
                {move || page_title(&location.pathname.get())}
            </h1>

            <div class="flex items-center gap-3">
                <ThemeToggle />
                <UserMenu />
            </div>
        </header>
    }
}

/// Email of the signed-in user and a logout action
#[component]
fn UserMenu() -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let (open, set_open) = create_signal(false);
    let session = app_state.session;

    let email = move || {
        session
            .get()
            .and_then(|claims| claims.email)
            .unwrap_or_else(|| "管理员".to_string())
    };
    let initial = move || email().chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default();

    let logout = {
        let app_state = app_state.clone();
        let navigate = use_navigate();
        move |_: web_sys::MouseEvent| {
            set_open.set(false);
            app_state.sign_out();
            // Logout is informational; the token is already gone
            spawn_local(async {
                let _ = gloo_net::http::Request::post("/api/v1/auth/logout").send().await;
            });
            navigate("/login", Default::default());
        }
    };

    view! {
        <div class="relative">
            <button
                class="w-8 h-8 rounded-full bg-blue-600 text-white text-sm font-medium flex items-center justify-center"
                on:click=move |_| set_open.update(|o| *o = !*o)
            >
                {initial}
            </button>

            <Show when=move || open.get()>
                <div class="absolute right-0 mt-2 w-56 bg-theme-surface border border-theme-border rounded-lg shadow-lg z-40">
                    <div class="px-4 py-3 border-b border-theme-border">
                        <p class="text-xs text-theme-muted">"当前账号"</p>
                        <p class="text-sm text-theme truncate">{email}</p>
                    </div>
                    <button
                        class="w-full flex items-center gap-2 px-4 py-2 text-sm text-theme-secondary hover:bg-theme-surface-hover"
                        on:click=logout.clone()
                    >
                        <LogoutIcon />
                        "退出登录"
                    </button>
                </div>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("/"), "仪表盘");
        assert_eq!(page_title("/configs"), "检测配置");
        assert_eq!(page_title("/groups/"), "分组管理");
        assert_eq!(page_title("/notifications"), "系统通知");
    }
}
