//! Dashboard
//!
//! Counters for check configs, groups and notifications, plus the first
//! groups with their config counts.

use checkcx_shared::{format_number, DashboardSummary, GroupConfigCount};
use leptos::*;
use leptos_router::*;

use crate::client::AdminClient;
use crate::components::common::{ErrorBanner, RefreshIcon};
use crate::state::AppState;

#[component]
pub fn Dashboard() -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let (summary, set_summary) = create_signal(Option::<DashboardSummary>::None);
    let (error, set_error) = create_signal(Option::<String>::None);
    let (refresh_trigger, set_refresh_trigger) = create_signal(0u32);

    create_effect(move |_| {
        refresh_trigger.get();
        let app_state = app_state.clone();
        spawn_local(async move {
            match app_state.client().dashboard().await {
                Ok(data) => {
                    set_summary.set(Some(data));
                    set_error.set(None);
                }
                Err(e) => set_error.set(Some(app_state.error_message(&e, "加载仪表盘失败"))),
            }
        });
    });

    let count = move |f: fn(&DashboardSummary) -> Option<i64>| {
        move || format_number(summary.with(|s| s.as_ref().and_then(f)))
    };

    view! {
        <div class="max-w-6xl mx-auto space-y-6">
            <div class="flex items-center justify-between">
                <div>
                    <h2 class="text-2xl font-bold text-theme">"概览"</h2>
                    <p class="text-theme-secondary mt-1">"检测配置、分组与系统通知的当前状态"</p>
                </div>
                <button class="btn-secondary flex items-center gap-2" on:click=move |_| set_refresh_trigger.update(|n| *n += 1)>
                    <RefreshIcon />
                    "刷新"
                </button>
            </div>

            <ErrorBanner message=error />

            <div class="grid grid-cols-2 lg:grid-cols-4 gap-4">
                <StatCard label="检测配置" value=Signal::derive(count(|s| s.total_configs)) color="text-theme" />
                <StatCard label="已启用" value=Signal::derive(count(|s| s.enabled_configs)) color="text-emerald-500" />
                <StatCard label="维护中" value=Signal::derive(count(|s| s.maintenance_configs)) color="text-amber-500" />
                <StatCard label="已停用" value=Signal::derive(count(|s| s.disabled_configs)) color="text-theme-muted" />
            </div>

            <div class="grid grid-cols-1 lg:grid-cols-3 gap-6">
                <div class="lg:col-span-2 bg-theme-surface border border-theme-border rounded-xl p-6">
                    <div class="flex items-center justify-between mb-4">
                        <h3 class="text-lg font-semibold text-theme">"分组"</h3>
                        <A href="/groups" class="text-sm text-blue-500 hover:underline">"管理分组"</A>
                    </div>
                    {move || match summary.get() {
                        None => view! {
                            <div class="flex items-center justify-center py-8">
                                <div class="animate-spin w-8 h-8 border-4 border-blue-500 border-t-transparent rounded-full" />
                            </div>
                        }.into_view(),
                        Some(s) => view! {
                            <GroupList groups=s.groups remaining=s.groups_remaining />
                        }.into_view(),
                    }}
                </div>

                <div class="space-y-4">
                    <StatCard label="分组总数" value=Signal::derive(count(|s| s.total_groups)) color="text-blue-500" />
                    <StatCard label="系统通知" value=Signal::derive(count(|s| s.total_notifications)) color="text-theme" />
                    <StatCard label="生效中的通知" value=Signal::derive(count(|s| s.active_notifications)) color="text-emerald-500" />
                </div>
            </div>
        </div>
    }
}

#[component]
fn StatCard(label: &'static str, #[prop(into)] value: Signal<String>, color: &'static str) -> impl IntoView {
    view! {
        <div class="bg-theme-surface border border-theme-border rounded-xl p-4">
            <p class="text-sm text-theme-secondary">{label}</p>
            <p class=format!("text-2xl font-bold mt-1 {}", color)>{value}</p>
        </div>
    }
}

#[component]
fn GroupList(groups: Option<Vec<GroupConfigCount>>, remaining: Option<i64>) -> impl IntoView {
    let Some(groups) = groups else {
        return view! { <p class="text-theme-muted text-sm">"分组数据暂不可用"</p> }.into_view();
    };
    if groups.is_empty() {
        return view! { <p class="text-theme-muted text-sm">"暂无分组"</p> }.into_view();
    }

    view! {
        <ul class="divide-y divide-theme-border">
            {groups
                .into_iter()
                .map(|group| view! {
                    <li class="flex items-center justify-between py-2">
                        <span class="text-theme">{group.name}</span>
                        <span class="text-sm text-theme-secondary">
                            {format!("{} 个配置", format_number(group.config_count))}
                        </span>
                    </li>
                })
                .collect_view()}
        </ul>
        {remaining_label(remaining).map(|label| view! {
            <p class="mt-3 text-sm text-theme-muted">{label}</p>
        })}
    }
    .into_view()
}

/// "还有 N 个分组" when groups were left out of the list
fn remaining_label(remaining: Option<i64>) -> Option<String> {
    remaining
        .filter(|n| *n > 0)
        .map(|n| format!("还有 {} 个分组", format_number(Some(n))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_label() {
        assert_eq!(remaining_label(None), None);
        assert_eq!(remaining_label(Some(0)), None);
        assert_eq!(remaining_label(Some(2)).as_deref(), Some("还有 2 个分组"));
        assert_eq!(remaining_label(Some(1200)).as_deref(), Some("还有 1,200 个分组"));
    }
}
