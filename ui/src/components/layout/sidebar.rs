//! Sidebar Navigation Component

use leptos::*;
use leptos_router::*;

use crate::components::common::{BellIcon, DashboardIcon, FolderIcon, ListIcon};

#[derive(Clone, Copy, PartialEq, Eq)]
enum NavIcon {
    Dashboard,
    Configs,
    Groups,
    Notifications,
}

/// Navigation entries as (label, href, icon)
const NAV_ITEMS: [(&str, &str, NavIcon); 4] = [
    ("仪表盘", "/", NavIcon::Dashboard),
    ("检测配置", "/configs", NavIcon::Configs),
    ("分组管理", "/groups", NavIcon::Groups),
    ("系统通知", "/notifications", NavIcon::Notifications),
];

/// Whether `href` is the active section for `pathname`
fn is_active(pathname: &str, href: &str) -> bool {
    if href == "/" {
        pathname == "/"
    } else {
        pathname == href || pathname.starts_with(&format!("{}/", href))
    }
}

#[component]
pub fn Sidebar() -> impl IntoView {
    let location = use_location();

    view! {
        <aside class="w-56 h-full bg-theme-surface border-r border-theme-border flex flex-col flex-shrink-0">
            <div class="h-14 flex items-center px-4 border-b border-theme-border">
                <A href="/" class="flex items-center gap-2 text-theme font-bold">
                    <div class="w-8 h-8 bg-gradient-to-br from-blue-500 to-emerald-500 rounded-lg flex items-center justify-center">
                        <span class="text-white text-sm font-bold">"C"</span>
                    </div>
                    <span class="text-base whitespace-nowrap">"check-cx"</span>
                </A>
            </div>

            <nav class="flex-1 py-4 px-2 space-y-1">
                {NAV_ITEMS
                    .into_iter()
                    .map(|(label, href, icon)| {
                        let active = move || is_active(&location.pathname.get(), href);
                        view! {
                            <A
                                href=href
                                class=move || {
                                    let base = "flex items-center gap-3 px-3 py-2 rounded-lg text-sm transition-colors";
                                    if active() {
                                        format!("{} bg-blue-500/10 text-blue-500 font-medium", base)
                                    } else {
                                        format!("{} text-theme-secondary hover:text-theme hover:bg-theme-surface-hover", base)
                                    }
                                }
                            >
                                {match icon {
                                    NavIcon::Dashboard => view! { <DashboardIcon /> }.into_view(),
                                    NavIcon::Configs => view! { <ListIcon /> }.into_view(),
                                    NavIcon::Groups => view! { <FolderIcon /> }.into_view(),
                                    NavIcon::Notifications => view! { <BellIcon /> }.into_view(),
                                }}
                                <span>{label}</span>
                            </A>
                        }
                    })
                    .collect_view()}
            </nav>
        </aside>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_section() {
        assert!(is_active("/", "/"));
        assert!(!is_active("/configs", "/"));
        assert!(is_active("/configs", "/configs"));
        assert!(is_active("/configs/abc", "/configs"));
        assert!(!is_active("/configsx", "/configs"));
    }
}
