//! Check config management
//!
//! Paged table with search, group filter and per-row toggles. Rows open
//! the create/edit/copy dialog or a delete confirmation.

mod form;

pub use form::{ConfigForm, ConfigFormDialog, FormMode};

use checkcx_shared::{
    format_local_datetime, format_number, CheckConfig, ConfigListQuery, ConfigListResponse,
    EMPTY_VALUE, UNGROUPED_FILTER,
};
use leptos::*;

use crate::client::AdminClient;
use crate::components::common::{ConfirmDialog, CopyIcon, EditIcon, ErrorBanner, PlusIcon, TrashIcon};
use crate::state::AppState;

/// Dialog currently open on the page
#[derive(Debug, Clone, PartialEq)]
enum ConfigDialog {
    Form(FormMode, Option<CheckConfig>),
    Delete(CheckConfig),
}

/// Number of pages for `total` rows, never less than one
fn total_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 {
        return 1;
    }
    ((total + per_page - 1) / per_page).max(1)
}

#[component]
pub fn ConfigsPage() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    let (search, set_search) = create_signal(String::new());
    let (applied_search, set_applied_search) = create_signal(String::new());
    let (group, set_group) = create_signal(String::new());
    let (page, set_page) = create_signal(1i64);
    let (refresh_trigger, set_refresh_trigger) = create_signal(0u32);

    let (data, set_data) = create_signal(Option::<ConfigListResponse>::None);
    let (error, set_error) = create_signal(Option::<String>::None);
    let (dialog, set_dialog) = create_signal(Option::<ConfigDialog>::None);
    let (deleting, set_deleting) = create_signal(false);

    let reload = move || set_refresh_trigger.update(|n| *n += 1);

    {
        let app_state = app_state.clone();
        create_effect(move |_| {
            refresh_trigger.get();
            let query = ConfigListQuery {
                q: Some(applied_search.get()).filter(|q| !q.trim().is_empty()),
                group: Some(group.get()).filter(|g| !g.is_empty()),
                page: Some(page.get().to_string()),
            };
            let app_state = app_state.clone();
            spawn_local(async move {
                match app_state.client().list_configs(&query).await {
                    Ok(response) => {
                        set_data.set(Some(response));
                        set_error.set(None);
                    }
                    Err(e) => set_error.set(Some(app_state.error_message(&e, "加载检测配置失败"))),
                }
            });
        });
    }

    let toggle = {
        let app_state = app_state.clone();
        move |config: CheckConfig, field: ToggleField| {
            let app_state = app_state.clone();
            spawn_local(async move {
                let client = app_state.client();
                let result = match field {
                    ToggleField::Enabled => client.set_enabled(&config.id, !config.is_enabled()).await,
                    ToggleField::Maintenance => client.set_maintenance(&config.id, !config.in_maintenance()).await,
                };
                match result {
                    Ok(()) => reload(),
                    Err(e) => set_error.set(Some(app_state.error_message(&e, "更新状态失败"))),
                }
            });
        }
    };

    let confirm_delete = {
        let app_state = app_state.clone();
        move |_: ()| {
            let Some(ConfigDialog::Delete(config)) = dialog.get_untracked() else {
                return;
            };
            set_deleting.set(true);
            let app_state = app_state.clone();
            spawn_local(async move {
                match app_state.client().delete_config(&config.id).await {
                    Ok(()) => {
                        set_dialog.set(None);
                        reload();
                    }
                    Err(e) => {
                        set_dialog.set(None);
                        set_error.set(Some(app_state.error_message(&e, "删除失败")));
                    }
                }
                set_deleting.set(false);
            });
        }
    };

    let on_search = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_page.set(1);
        set_applied_search.set(search.get_untracked());
    };

    let pages = move || data.with(|d| d.as_ref().map(|d| total_pages(d.total, d.per_page)).unwrap_or(1));

    view! {
        <div class="max-w-7xl mx-auto space-y-4">
            <div class="flex items-center justify-between gap-4">
                <form class="flex items-center gap-2 flex-1" on:submit=on_search>
                    <input
                        type="search"
                        class="input max-w-sm"
                        placeholder="搜索名称、类型、模型、端点或分组"
                        prop:value=search
                        on:input=move |ev| set_search.set(event_target_value(&ev))
                    />
                    <select
                        class="input w-48"
                        on:change=move |ev| {
                            set_page.set(1);
                            set_group.set(event_target_value(&ev));
                        }
                    >
                        <option value="" selected=move || group.get().is_empty()>"全部分组"</option>
                        <option value=UNGROUPED_FILTER selected=move || group.get() == UNGROUPED_FILTER>"未分组"</option>
                        {move || data
                            .with(|d| d.as_ref().map(|d| d.groups.clone()).unwrap_or_default())
                            .into_iter()
                            .map(|name| {
                                let is_selected = {
                                    let name = name.clone();
                                    move || group.get() == name
                                };
                                view! { <option value=name.clone() selected=is_selected>{name}</option> }
                            })
                            .collect_view()}
                    </select>
                    <button type="submit" class="btn-secondary">"搜索"</button>
                </form>
                <button
                    class="btn-primary flex items-center gap-2"
                    on:click=move |_| set_dialog.set(Some(ConfigDialog::Form(FormMode::Create, None)))
                >
                    <PlusIcon />
                    "新建配置"
                </button>
            </div>

            <ErrorBanner message=error />

            <div class="bg-theme-surface border border-theme-border rounded-xl overflow-hidden">
                <table class="w-full text-sm">
                    <thead class="bg-theme-surface-hover text-theme-secondary text-left">
                        <tr>
                            <th class="px-4 py-3 font-medium">"名称"</th>
                            <th class="px-4 py-3 font-medium">"类型"</th>
                            <th class="px-4 py-3 font-medium">"模型"</th>
                            <th class="px-4 py-3 font-medium">"分组"</th>
                            <th class="px-4 py-3 font-medium">"启用"</th>
                            <th class="px-4 py-3 font-medium">"维护"</th>
                            <th class="px-4 py-3 font-medium">"更新时间"</th>
                            <th class="px-4 py-3 font-medium text-right">"操作"</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-theme-border">
                        {move || {
                            let rows = data.with(|d| d.as_ref().map(|d| d.rows.clone()));
                            match rows {
                                None => view! {
                                    <tr><td colspan="8" class="px-4 py-8 text-center text-theme-muted">"加载中..."</td></tr>
                                }.into_view(),
                                Some(rows) if rows.is_empty() => view! {
                                    <tr><td colspan="8" class="px-4 py-8 text-center text-theme-muted">"没有匹配的检测配置"</td></tr>
                                }.into_view(),
                                Some(rows) => rows
                                    .into_iter()
                                    .map(|config| {
                                        let toggle_enabled = {
                                            let toggle = toggle.clone();
                                            let config = config.clone();
                                            move |_: web_sys::MouseEvent| toggle(config.clone(), ToggleField::Enabled)
                                        };
                                        let toggle_maintenance = {
                                            let toggle = toggle.clone();
                                            let config = config.clone();
                                            move |_: web_sys::MouseEvent| toggle(config.clone(), ToggleField::Maintenance)
                                        };
                                        let edit = config.clone();
                                        let copy = config.clone();
                                        let remove = config.clone();
                                        view! {
                                            <tr class="hover:bg-theme-surface-hover">
                                                <td class="px-4 py-3">
                                                    <div class="text-theme font-medium">{config.name.clone().unwrap_or_else(|| EMPTY_VALUE.to_string())}</div>
                                                    <div class="text-xs text-theme-muted truncate max-w-xs">{config.endpoint.clone()}</div>
                                                </td>
                                                <td class="px-4 py-3 text-theme-secondary">{config.provider_type.clone().unwrap_or_else(|| EMPTY_VALUE.to_string())}</td>
                                                <td class="px-4 py-3 text-theme-secondary">{config.model.clone().unwrap_or_else(|| EMPTY_VALUE.to_string())}</td>
                                                <td class="px-4 py-3 text-theme-secondary">{config.group_name.clone().unwrap_or_else(|| "未分组".to_string())}</td>
                                                <td class="px-4 py-3">
                                                    <Switch on=config.is_enabled() on_click=toggle_enabled color="bg-emerald-500" />
                                                </td>
                                                <td class="px-4 py-3">
                                                    <Switch on=config.in_maintenance() on_click=toggle_maintenance color="bg-amber-500" />
                                                </td>
                                                <td class="px-4 py-3 text-theme-secondary whitespace-nowrap">
                                                    {format_local_datetime(config.updated_at.as_deref().or(config.created_at.as_deref()))}
                                                </td>
                                                <td class="px-4 py-3">
                                                    <div class="flex justify-end gap-1">
                                                        <button class="p-1.5 rounded hover:bg-theme-surface-hover text-theme-secondary" title="编辑"
                                                            on:click=move |_| set_dialog.set(Some(ConfigDialog::Form(FormMode::Edit, Some(edit.clone()))))>
                                                            <EditIcon />
                                                        </button>
                                                        <button class="p-1.5 rounded hover:bg-theme-surface-hover text-theme-secondary" title="复制"
                                                            on:click=move |_| set_dialog.set(Some(ConfigDialog::Form(FormMode::Copy, Some(copy.clone()))))>
                                                            <CopyIcon />
                                                        </button>
                                                        <button class="p-1.5 rounded hover:bg-red-500/10 text-red-500" title="删除"
                                                            on:click=move |_| set_dialog.set(Some(ConfigDialog::Delete(remove.clone())))>
                                                            <TrashIcon />
                                                        </button>
                                                    </div>
                                                </td>
                                            </tr>
                                        }
                                    })
                                    .collect_view(),
                            }
                        }}
                    </tbody>
                </table>
            </div>

            <div class="flex items-center justify-between text-sm text-theme-secondary">
                <span>{move || format!("共 {} 条", format_number(data.with(|d| d.as_ref().map(|d| d.total))))}</span>
                <div class="flex items-center gap-2">
                    <button
                        class="btn-secondary disabled:opacity-50"
                        disabled=move || page.get() <= 1
                        on:click=move |_| set_page.update(|p| *p = (*p - 1).max(1))
                    >
                        "上一页"
                    </button>
                    <span>{move || format!("第 {} / {} 页", page.get(), pages())}</span>
                    <button
                        class="btn-secondary disabled:opacity-50"
                        disabled=move || page.get() >= pages()
                        on:click=move |_| set_page.update(|p| *p += 1)
                    >
                        "下一页"
                    </button>
                </div>
            </div>

            {move || dialog.get().map(|open| {
                let close = Callback::new(move |_: ()| set_dialog.set(None));
                match open {
                    ConfigDialog::Form(mode, source) => {
                        let groups = data.with_untracked(|d| d.as_ref().map(|d| d.groups.clone()).unwrap_or_default());
                        view! {
                            <ConfigFormDialog
                                mode=mode
                                source=source
                                groups=groups
                                on_close=close
                                on_saved=move |_: ()| {
                                    set_dialog.set(None);
                                    reload();
                                }
                            />
                        }.into_view()
                    }
                    ConfigDialog::Delete(config) => view! {
                        <ConfirmDialog
                            title="删除检测配置".to_string()
                            message=format!("确定要删除「{}」吗？此操作无法撤销。", config.name.unwrap_or(config.id))
                            busy=deleting
                            on_confirm=confirm_delete.clone()
                            on_close=close
                        />
                    }.into_view(),
                }
            })}
        </div>
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToggleField {
    Enabled,
    Maintenance,
}

/// Pill switch for boolean columns
#[component]
fn Switch<F>(on: bool, on_click: F, color: &'static str) -> impl IntoView
where
    F: Fn(web_sys::MouseEvent) + 'static,
{
    let track = if on { color } else { "bg-theme-border" };
    let knob = if on { "translate-x-4" } else { "translate-x-0" };
    view! {
        <button
            class=format!("relative inline-flex h-5 w-9 items-center rounded-full transition-colors {}", track)
            on:click=on_click
        >
            <span class=format!("inline-block h-4 w-4 transform rounded-full bg-white shadow transition-transform ml-0.5 {}", knob) />
        </button>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(23, 20), 2);
        assert_eq!(total_pages(5, 0), 1);
    }
}
