//! Light / dark / system theme switcher

use checkcx_shared::ThemePreference;
use leptos::*;

use super::icons::{MonitorIcon, MoonIcon, SunIcon};
use crate::state::AppState;

#[component]
pub fn ThemeToggle() -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let preference = app_state.theme_preference;

    let options = ThemePreference::ALL
        .into_iter()
        .map(|option| {
            let app_state = app_state.clone();
            let icon = match option {
                ThemePreference::Light => view! { <SunIcon /> }.into_view(),
                ThemePreference::Dark => view! { <MoonIcon /> }.into_view(),
                ThemePreference::System => view! { <MonitorIcon /> }.into_view(),
            };
            view! {
                <button
                    type="button"
                    title=option.label()
                    aria-pressed=move || (preference.get() == option).to_string()
                    class=move || {
                        let base = "p-1.5 rounded-md transition-colors";
                        if preference.get() == option {
                            format!("{} bg-theme-surface text-theme shadow-sm", base)
                        } else {
                            format!("{} text-theme-muted hover:text-theme", base)
                        }
                    }
                    on:click=move |_| app_state.set_theme(option)
                >
                    {icon}
                </button>
            }
        })
        .collect_view();

    view! {
        <div class="flex items-center gap-0.5 p-0.5 rounded-lg bg-theme-surface-hover" role="group" aria-label="主题">
            {options}
        </div>
    }
}
