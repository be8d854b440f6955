//! Dialog chrome shared by the console's forms

use leptos::*;

#[component]
pub fn Modal(
    title: String,
    #[prop(into)] on_close: Callback<()>,
    children: Children,
    /// Footer buttons
    #[prop(optional)] footer: Option<Children>,
    #[prop(default = "w-[480px]")] width: &'static str,
) -> impl IntoView {
    view! {
        <div class="fixed inset-0 bg-black/50 backdrop-blur-sm flex items-center justify-center z-50">
            <div class=format!("bg-theme-surface rounded-xl shadow-xl border border-theme-border max-h-[90vh] flex flex-col {}", width)>
                <div class="flex items-center justify-between p-4 border-b border-theme-border">
                    <h2 class="text-lg font-semibold text-theme">{title}</h2>
                    <button
                        class="p-1.5 hover:bg-theme-surface-hover rounded-lg text-theme-secondary hover:text-theme transition-colors"
                        on:click=move |_| on_close.call(())
                    >
                        "✕"
                    </button>
                </div>

                <div class="p-4 space-y-4 overflow-y-auto">
                    {children()}
                </div>

                {footer.map(|footer| view! {
                    <div class="p-4 border-t border-theme-border flex justify-end gap-3">
                        {footer()}
                    </div>
                })}
            </div>
        </div>
    }
}

/// Inline error message
#[component]
pub fn ErrorBanner(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        {move || message.get().map(|e| view! {
            <div class="p-3 bg-red-500/10 border border-red-500/30 rounded-lg text-red-500 text-sm">
                {e}
            </div>
        })}
    }
}

/// Yes/no confirmation for destructive actions
#[component]
pub fn ConfirmDialog(
    title: String,
    message: String,
    #[prop(into)] busy: Signal<bool>,
    #[prop(into)] on_confirm: Callback<()>,
    #[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
    view! {
        <Modal
            title=title
            on_close=on_close
            width="w-[400px]"
            footer=Box::new(move || view! {
                <button class="btn-secondary" on:click=move |_| on_close.call(())>"取消"</button>
                <button
                    class="px-4 py-2 rounded-lg bg-red-600 hover:bg-red-700 text-white text-sm font-medium disabled:opacity-50"
                    disabled=move || busy.get()
                    on:click=move |_| on_confirm.call(())
                >
                    {move || if busy.get() { "删除中..." } else { "确认删除" }}
                </button>
            })
        >
            <p class="text-sm text-theme-secondary">{message}</p>
        </Modal>
    }
}
