//! Group management

use checkcx_shared::{format_local_datetime, format_number, GroupFieldErrors, GroupInfo, GroupInput, EMPTY_VALUE};
use leptos::*;

use crate::client::AdminClient;
use crate::components::common::{ConfirmDialog, EditIcon, ErrorBanner, Modal, PlusIcon, TrashIcon};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
enum GroupDialog {
    Create,
    Edit(GroupInfo),
    Delete(GroupInfo),
}

#[component]
pub fn GroupsPage() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    let (groups, set_groups) = create_signal(Option::<Vec<GroupInfo>>::None);
    let (error, set_error) = create_signal(Option::<String>::None);
    let (dialog, set_dialog) = create_signal(Option::<GroupDialog>::None);
    let (deleting, set_deleting) = create_signal(false);
    let (refresh_trigger, set_refresh_trigger) = create_signal(0u32);

    let reload = move || set_refresh_trigger.update(|n| *n += 1);

    {
        let app_state = app_state.clone();
        create_effect(move |_| {
            refresh_trigger.get();
            let app_state = app_state.clone();
            spawn_local(async move {
                match app_state.client().list_groups().await {
                    Ok(list) => {
                        set_groups.set(Some(list));
                        set_error.set(None);
                    }
                    Err(e) => set_error.set(Some(app_state.error_message(&e, "加载分组失败"))),
                }
            });
        });
    }

    let confirm_delete = move |_: ()| {
        let Some(GroupDialog::Delete(group)) = dialog.get_untracked() else {
            return;
        };
        set_deleting.set(true);
        let app_state = app_state.clone();
        spawn_local(async move {
            let result = app_state.client().delete_group(&group.id).await;
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
                <p class="text-theme-secondary text-sm">"分组用于在状态页上归类检测配置，并展示对应的官网链接。"</p>
                <button class="btn-primary flex items-center gap-2" on:click=move |_| set_dialog.set(Some(GroupDialog::Create))>
                    <PlusIcon />
                    "新建分组"
                </button>
            </div>

            <ErrorBanner message=error />

            <div class="bg-theme-surface border border-theme-border rounded-xl overflow-hidden">
                <table class="w-full text-sm">
                    <thead class="bg-theme-surface-hover text-theme-secondary text-left">
                        <tr>
                            <th class="px-4 py-3 font-medium">"分组名称"</th>
                            <th class="px-4 py-3 font-medium">"官网"</th>
                            <th class="px-4 py-3 font-medium">"配置数"</th>
                            <th class="px-4 py-3 font-medium">"更新时间"</th>
                            <th class="px-4 py-3 font-medium text-right">"操作"</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-theme-border">
                        {move || match groups.get() {
                            None => view! {
                                <tr><td colspan="5" class="px-4 py-8 text-center text-theme-muted">"加载中..."</td></tr>
                            }.into_view(),
                            Some(list) if list.is_empty() => view! {
                                <tr><td colspan="5" class="px-4 py-8 text-center text-theme-muted">"暂无分组"</td></tr>
                            }.into_view(),
                            Some(list) => list
                                .into_iter()
                                .map(|group| {
                                    let edit = group.clone();
                                    let remove = group.clone();
                                    let website = group.website_url.clone().unwrap_or_default();
                                    view! {
                                        <tr class="hover:bg-theme-surface-hover">
                                            <td class="px-4 py-3 text-theme font-medium">{group.group_name.clone()}</td>
                                            <td class="px-4 py-3">
                                                {if website.is_empty() {
                                                    view! { <span class="text-theme-muted">{EMPTY_VALUE}</span> }.into_view()
                                                } else {
                                                    view! {
                                                        <a href=website.clone() target="_blank" rel="noopener noreferrer" class="text-blue-500 hover:underline">
                                                            {website.clone()}
                                                        </a>
                                                    }.into_view()
                                                }}
                                            </td>
                                            <td class="px-4 py-3 text-theme-secondary">{format_number(group.config_count)}</td>
                                            <td class="px-4 py-3 text-theme-secondary whitespace-nowrap">
                                                {format_local_datetime(group.updated_at.as_deref().or(group.created_at.as_deref()))}
                                            </td>
                                            <td class="px-4 py-3">
                                                <div class="flex justify-end gap-1">
                                                    <button class="p-1.5 rounded hover:bg-theme-surface-hover text-theme-secondary" title="编辑"
                                                        on:click=move |_| set_dialog.set(Some(GroupDialog::Edit(edit.clone())))>
                                                        <EditIcon />
                                                    </button>
                                                    <button class="p-1.5 rounded hover:bg-red-500/10 text-red-500" title="删除"
                                                        on:click=move |_| set_dialog.set(Some(GroupDialog::Delete(remove.clone())))>
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
                    GroupDialog::Create => view! {
                        <GroupFormDialog source=None on_close=close on_saved=saved />
                    }.into_view(),
                    GroupDialog::Edit(group) => view! {
                        <GroupFormDialog source=Some(group) on_close=close on_saved=saved />
                    }.into_view(),
                    GroupDialog::Delete(group) => {
                        let message = delete_message(&group);
                        view! {
                            <ConfirmDialog
                                title="删除分组".to_string()
                                message=message
                                busy=deleting
                                on_confirm=confirm_delete.clone()
                                on_close=close
                            />
                        }.into_view()
                    }
                }
            })}
        </div>
    }
}

/// Deleting a group leaves its configs in place under the old name
fn delete_message(group: &GroupInfo) -> String {
    match group.config_count {
        Some(n) if n > 0 => format!(
            "确定要删除分组「{}」吗？其下的 {} 个检测配置不会被删除，但将失去分组信息。",
            group.group_name,
            format_number(Some(n))
        ),
        _ => format!("确定要删除分组「{}」吗？", group.group_name),
    }
}

#[component]
fn GroupFormDialog(
    source: Option<GroupInfo>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_saved: Callback<()>,
) -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let title = if source.is_some() { "编辑分组" } else { "新建分组" };
    let source_id = source.as_ref().map(|g| g.id.clone());

    let (group_name, set_group_name) = create_signal(source.as_ref().map(|g| g.group_name.clone()).unwrap_or_default());
    let (website_url, set_website_url) = create_signal(
        source.as_ref().and_then(|g| g.website_url.clone()).unwrap_or_default(),
    );
    let (error, set_error) = create_signal(Option::<String>::None);
    let (field_errors, set_field_errors) = create_signal(GroupFieldErrors::default());
    let (saving, set_saving) = create_signal(false);

    let save = move |_: web_sys::MouseEvent| {
        let input = GroupInput {
            group_name: group_name.get_untracked().trim().to_string(),
            website_url: website_url.get_untracked().trim().to_string(),
        };
        if input.group_name.is_empty() {
            set_field_errors.set(GroupFieldErrors {
                group_name: Some("分组名称不能为空".to_string()),
                ..Default::default()
            });
            return;
        }

        set_error.set(None);
        set_field_errors.set(GroupFieldErrors::default());
        set_saving.set(true);
        let app_state = app_state.clone();
        let source_id = source_id.clone();
        spawn_local(async move {
            let client = app_state.client();
            let result = match source_id.as_deref() {
                Some(id) => client.update_group(id, &input).await,
                None => client.create_group(&input).await,
            };
            set_saving.set(false);
            match result {
                Ok(group) => {
                    tracing::info!("Saved group {}", group.group_name);
                    on_saved.call(());
                }
                Err(e) => {
                    if let Some(errors) = e.field_errors() {
                        set_field_errors.set(errors.clone());
                    }
                    set_error.set(Some(app_state.error_message(&e, "保存失败")));
                }
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
                <label class="block text-theme-secondary text-sm mb-1">"分组名称"</label>
                <input
                    type="text"
                    class="input"
                    placeholder="OpenAI"
                    prop:value=group_name
                    on:input=move |ev| set_group_name.set(event_target_value(&ev))
                />
                <FieldError message=Signal::derive(move || field_errors.with(|e| e.group_name.clone())) />
            </div>
            <div>
                <label class="block text-theme-secondary text-sm mb-1">"官网地址"</label>
                <input
                    type="url"
                    class="input"
                    placeholder="https://openai.com"
                    prop:value=website_url
                    on:input=move |ev| set_website_url.set(event_target_value(&ev))
                />
                <FieldError message=Signal::derive(move || field_errors.with(|e| e.website_url.clone())) />
            </div>
        </Modal>
    }
}

#[component]
fn FieldError(message: Signal<Option<String>>) -> impl IntoView {
    move || message.get().map(|m| view! { <p class="mt-1 text-xs text-red-500">{m}</p> })
}
