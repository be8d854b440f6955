//! System notification management
//!
//! Active notifications are shown as banners on the public status page.

use checkcx_shared::{format_local_datetime, NotificationInput, NotificationLevel, SystemNotification};
use leptos::*;

use crate::client::AdminClient;
use crate::components::common::{ConfirmDialog, EditIcon, ErrorBanner, Modal, PlusIcon, TrashIcon};
use crate::state::AppState;

fn level_label(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "信息",
        NotificationLevel::Warning => "警告",
        NotificationLevel::Error => "错误",
    }
}

fn level_badge_class(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "bg-blue-500/15 text-blue-500 border-blue-500/30",
        NotificationLevel::Warning => "bg-amber-500/15 text-amber-500 border-amber-500/30",
        NotificationLevel::Error => "bg-red-500/15 text-red-500 border-red-500/30",
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NotificationDialog {
    Create,
    Edit(SystemNotification),
    Delete(SystemNotification),
}

#[component]
pub fn NotificationsPage() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    let (notifications, set_notifications) = create_signal(Option::<Vec<SystemNotification>>::None);
    let (error, set_error) = create_signal(Option::<String>::None);
    let (dialog, set_dialog) = create_signal(Option::<NotificationDialog>::None);
    let (deleting, set_deleting) = create_signal(false);
    let (refresh_trigger, set_refresh_trigger) = create_signal(0u32);

    let reload = move || set_refresh_trigger.update(|n| *n += 1);

    {
        let app_state = app_state.clone();
        create_effect(move |_| {
            refresh_trigger.get();
            let app_state = app_state.clone();
            spawn_local(async move {
                match app_state.client().list_notifications().await {
                    Ok(list) => {
                        set_notifications.set(Some(list));
                        set_error.set(None);
                    }
                    Err(e) => set_error.set(Some(app_state.error_message(&e, "加载系统通知失败"))),
                }
            });
        });
    }

    let toggle_active = {
        let app_state = app_state.clone();
        move |notification: SystemNotification| {
            let app_state = app_state.clone();
            spawn_local(async move {
                let result = app_state
                    .client()
                    .set_notification_active(&notification.id, !notification.is_active)
                    .await;
                match result {
                    Ok(_) => reload(),
                    Err(e) => set_error.set(Some(app_state.error_message(&e, "更新状态失败"))),
                }
            });
        }
    };

    let confirm_delete = move |_: ()| {
        let Some(NotificationDialog::Delete(notification)) = dialog.get_untracked() else {
            return;
        };
        set_deleting.set(true);
        let app_state = app_state.clone();
        spawn_local(async move {
            let result = app_state.client().delete_notification(&notification.id).await;
            set_deleting.set(false);
            set_dialog.set(None);
            match result {
                Ok(()) => reload(),
                Err(e) => set_error.set(Some(app_state.error_message(&e, "删除失败"))),
            }
        });
    };

    view! {
        <div class="max-w-6xl mx-auto space-y-4">
            <div class="flex items-center justify-between">
                <p class="text-theme-secondary text-sm">"启用的通知会以横幅形式显示在状态页顶部。"</p>
                <button class="btn-primary flex items-center gap-2" on:click=move |_| set_dialog.set(Some(NotificationDialog::Create))>
                    <PlusIcon />
                    "新建通知"
                </button>
            </div>

            <ErrorBanner message=error />

            <div class="bg-theme-surface border border-theme-border rounded-xl overflow-hidden">
                <table class="w-full text-sm">
                    <thead class="bg-theme-surface-hover text-theme-secondary text-left">
                        <tr>
                            <th class="px-4 py-3 font-medium">"内容"</th>
                            <th class="px-4 py-3 font-medium">"级别"</th>
                            <th class="px-4 py-3 font-medium">"状态"</th>
                            <th class="px-4 py-3 font-medium">"更新时间"</th>
                            <th class="px-4 py-3 font-medium text-right">"操作"</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-theme-border">
                        {move || match notifications.get() {
                            None => view! {
                                <tr><td colspan="5" class="px-4 py-8 text-center text-theme-muted">"加载中..."</td></tr>
                            }.into_view(),
                            Some(list) if list.is_empty() => view! {
                                <tr><td colspan="5" class="px-4 py-8 text-center text-theme-muted">"暂无系统通知"</td></tr>
                            }.into_view(),
                            Some(list) => list
                                .into_iter()
                                .map(|notification| {
                                    let toggle = {
                                        let toggle_active = toggle_active.clone();
                                        let notification = notification.clone();
                                        move |_: web_sys::MouseEvent| toggle_active(notification.clone())
                                    };
                                    let edit = notification.clone();
                                    let remove = notification.clone();
                                    view! {
                                        <tr class="hover:bg-theme-surface-hover">
                                            <td class="px-4 py-3 text-theme max-w-md">
                                                <p class="line-clamp-2">{notification.message.clone()}</p>
                                            </td>
                                            <td class="px-4 py-3">
                                                <span class=format!("px-2 py-0.5 rounded border text-xs {}", level_badge_class(notification.level))>
                                                    {level_label(notification.level)}
                                                </span>
                                            </td>
                                            <td class="px-4 py-3">
                                                <button
                                                    class=if notification.is_active {
                                                        "px-2 py-0.5 rounded text-xs bg-emerald-500/15 text-emerald-500"
                                                    } else {
                                                        "px-2 py-0.5 rounded text-xs bg-theme-surface-hover text-theme-muted"
                                                    }
                                                    title="点击切换"
                                                    on:click=toggle
                                                >
                                                    {if notification.is_active { "生效中" } else { "未启用" }}
                                                </button>
                                            </td>
                                            <td class="px-4 py-3 text-theme-secondary whitespace-nowrap">
                                                {format_local_datetime(Some(&notification.updated_at))}
                                            </td>
                                            <td class="px-4 py-3">
                                                <div class="flex justify-end gap-1">
                                                    <button class="p-1.5 rounded hover:bg-theme-surface-hover text-theme-secondary" title="编辑"
                                                        on:click=move |_| set_dialog.set(Some(NotificationDialog::Edit(edit.clone())))>
                                                        <EditIcon />
                                                    </button>
                                                    <button class="p-1.5 rounded hover:bg-red-500/10 text-red-500" title="删除"
                                                        on:click=move |_| set_dialog.set(Some(NotificationDialog::Delete(remove.clone())))>
                                                        <TrashIcon />
                                                    </button>
                                                </div>
                                            </td>
                                        </tr>
                                    }
                                })
                                .collect_view(),
                        }}
                    </tbody>
                </table>
            </div>

            {move || dialog.get().map(|open| {
                let close = Callback::new(move |_: ()| set_dialog.set(None));
                let saved = Callback::new(move |_: ()| {
                    set_dialog.set(None);
                    reload();
                });
                match open {
                    NotificationDialog::Create => view! {
                        <NotificationFormDialog source=None on_close=close on_saved=saved />
                    }.into_view(),
                    NotificationDialog::Edit(notification) => view! {
                        <NotificationFormDialog source=Some(notification) on_close=close on_saved=saved />
                    }.into_view(),
                    NotificationDialog::Delete(_) => view! {
                        <ConfirmDialog
                            title="删除系统通知".to_string()
                            message="确定要删除这条通知吗？此操作无法撤销。".to_string()
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

#[component]
fn NotificationFormDialog(
    source: Option<SystemNotification>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_saved: Callback<()>,
) -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let title = if source.is_some() { "编辑系统通知" } else { "新建系统通知" };
    let source_id = source.as_ref().map(|n| n.id.clone());

    let form = create_rw_signal(match &source {
        Some(n) => NotificationInput {
            message: n.message.clone(),
            level: n.level,
            is_active: n.is_active,
        },
        None => NotificationInput {
            is_active: true,
            ..Default::default()
        },
    });
    let (error, set_error) = create_signal(Option::<String>::None);
    let (saving, set_saving) = create_signal(false);

    let save = move |_: web_sys::MouseEvent| {
        let mut input = form.get_untracked();
        input.message = input.message.trim().to_string();
        if input.message.is_empty() {
            set_error.set(Some("通知内容不能为空".to_string()));
            return;
        }

        set_error.set(None);
        set_saving.set(true);
        let app_state = app_state.clone();
        let source_id = source_id.clone();
        spawn_local(async move {
            let client = app_state.client();
            let result = match source_id.as_deref() {
                Some(id) => client.update_notification(id, &input).await,
                None => client.create_notification(&input).await,
            };
            set_saving.set(false);
            match result {
                Ok(_) => on_saved.call(()),
                Err(e) => set_error.set(Some(app_state.error_message(&e, "保存失败"))),
            }
        });
    };

    view! {
        <Modal
            title=title.to_string()
            on_close=on_close
            footer=Box::new(move || view! {
                <button class="btn-secondary" on:click=move |_| on_close.call(())>"取消"</button>
                <button class="btn-primary disabled:opacity-50" disabled=saving on:click=save.clone()>
                    {move || if saving.get() { "保存中..." } else { "保存" }}
                </button>
            })
        >
            <ErrorBanner message=error />
            <div>
                <label class="block text-theme-secondary text-sm mb-1">"通知内容"</label>
                <textarea
                    class="input h-28"
                    placeholder="例如：OpenAI 官方接口波动，检测结果可能延迟"
                    prop:value=move || form.with(|f| f.message.clone())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| f.message = value);
                    }
                />
            </div>
            <div class="flex items-center gap-6">
                <div class="flex-1">
                    <label class="block text-theme-secondary text-sm mb-1">"级别"</label>
                    <select
                        class="input"
                        on:change=move |ev| {
                            let level = NotificationLevel::from_db(&event_target_value(&ev));
                            form.update(|f| f.level = level);
                        }
                    >
                        {NotificationLevel::ALL
                            .into_iter()
                            .map(|level| view! {
                                <option value=level.as_str() selected=move || form.with(|f| f.level == level)>
                                    {level_label(level)}
                                </option>
                            })
                            .collect_view()}
                    </select>
                </div>
                <label class="flex items-center gap-2 text-sm text-theme mt-6">
                    <input
                        type="checkbox"
                        prop:checked=move || form.with(|f| f.is_active)
                        on:change=move |ev| {
                            let checked = event_target_checked(&ev);
                            form.update(|f| f.is_active = checked);
                        }
                    />
                    "立即启用"
                </label>
            </div>
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_labels_cover_every_level() {
        let labels: Vec<_> = NotificationLevel::ALL.into_iter().map(level_label).collect();
        assert_eq!(labels, vec!["信息", "警告", "错误"]);
        for level in NotificationLevel::ALL {
            assert!(level_badge_class(level).contains(match level {
                NotificationLevel::Info => "blue",
                NotificationLevel::Warning => "amber",
                NotificationLevel::Error => "red",
            }));
        }
    }
}
