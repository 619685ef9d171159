use leptos::prelude::*;
use leptos::task::spawn_local;

use reelboard_shared::Video;
use reelboard_shared::date::display_date;

use crate::components::icons::{Play, Trash2};
use crate::queries::use_video_queries;

/// 删除门禁：只有确认框明确返回"确定"才放行
///
/// 取消、关闭弹窗或拿不到弹窗结果都视为放弃，不发任何请求。
fn delete_confirmed(dialog_answer: Option<bool>) -> bool {
    dialog_answer.unwrap_or(false)
}

/// 删除前的浏览器确认框
fn confirm_delete() -> bool {
    let answer = web_sys::window().and_then(|w| {
        w.confirm_with_message("Are you sure you want to delete this video?")
            .ok()
    });
    delete_confirmed(answer)
}

#[component]
pub fn VideoTable(
    videos: ReadSignal<Vec<Video>>,
    is_loading: ReadSignal<bool>,
    /// 打开预览弹窗
    on_preview: Callback<Video>,
    /// 通知回调：(消息, 是否出错)
    on_notify: Callback<(String, bool)>,
) -> impl IntoView {
    let queries = use_video_queries();
    let (deleting_id, set_deleting_id) = signal(Option::<String>::None);

    let handle_delete = move |id: String| {
        // 确认框取消时不发任何请求
        if !confirm_delete() {
            return;
        }
        set_deleting_id.set(Some(id.clone()));
        spawn_local(async move {
            match queries.0.get_value().delete(id).await {
                Ok(()) => on_notify.run(("Video deleted".to_string(), false)),
                Err(e) => on_notify.run((e.message().to_string(), true)),
            }
            set_deleting_id.set(None);
        });
    };

    let is_empty = move || videos.with(|v| v.is_empty());

    view! {
        <div class="overflow-x-auto w-full">
            <table class="table table-zebra w-full">
                <thead>
                    <tr>
                        <th>"Video ID"</th>
                        <th>"Preview"</th>
                        <th>"Script"</th>
                        <th class="hidden md:table-cell">"Created"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    <Show when=move || is_loading.get() && is_empty()>
                        <tr>
                            <td colspan="5" class="text-center py-8 text-base-content/50">
                                <span class="loading loading-spinner loading-md"></span> " Loading..."
                            </td>
                        </tr>
                    </Show>
                    <Show when=move || !is_loading.get() && is_empty()>
                        <tr>
                            <td colspan="5" class="text-center py-8 text-base-content/50">
                                "No videos yet. Add one to get started."
                            </td>
                        </tr>
                    </Show>
                    <For
                        each=move || videos.get()
                        key=|v| v.id.clone()
                        children=move |video| {
                            let delete_id = video.id.clone();
                            let row_id = video.id.clone();
                            let is_deleting = Signal::derive(move || {
                                deleting_id.get().as_deref() == Some(row_id.as_str())
                            });
                            let preview_video = video.clone();
                            let created = video
                                .created_at
                                .as_deref()
                                .map(display_date)
                                .unwrap_or_else(|| "-".to_string());

                            view! {
                                <tr>
                                    <td>
                                        <div class="badge badge-neutral font-mono">{video.video_id.clone()}</div>
                                    </td>
                                    <td>
                                        <button
                                            on:click=move |_| on_preview.run(preview_video.clone())
                                            class="btn btn-ghost btn-sm gap-2"
                                        >
                                            <Play attr:class="h-4 w-4" /> "Preview"
                                        </button>
                                    </td>
                                    <td>
                                        <div class="max-w-xs truncate text-sm opacity-70">
                                            {video.script.clone()}
                                        </div>
                                    </td>
                                    <td class="hidden md:table-cell text-sm opacity-50">
                                        {created}
                                    </td>
                                    <td>
                                        <button
                                            on:click=move |_| handle_delete(delete_id.clone())
                                            disabled=move || is_deleting.get()
                                            class="btn btn-ghost btn-sm text-error hover:bg-error/10"
                                        >
                                            {move || if is_deleting.get() {
                                                view! { <span class="loading loading-spinner loading-xs"></span> }.into_any()
                                            } else {
                                                view! { <Trash2 attr:class="h-4 w-4" /> }.into_any()
                                            }}
                                        </button>
                                    </td>
                                </tr>
                            }
                        }
                    />
                </tbody>
            </table>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_proceeds_only_on_explicit_confirmation() {
        assert!(delete_confirmed(Some(true)));
    }

    #[test]
    fn cancel_or_missing_dialog_skips_the_delete() {
        assert!(!delete_confirmed(Some(false)));
        assert!(!delete_confirmed(None));
    }
}
