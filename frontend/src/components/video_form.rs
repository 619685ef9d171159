use leptos::prelude::*;
use leptos::task::spawn_local;

use reelboard_shared::CreateVideoRequest;

use crate::queries::use_video_queries;

/// 表单状态集合
///
/// 信号句柄都是 Copy，整个状态可以按值捕获进任意闭包。
#[derive(Clone, Copy)]
struct FormState {
    video_link: RwSignal<String>,
    script: RwSignal<String>,
    video_id: RwSignal<String>,
}

impl FormState {
    fn new() -> Self {
        Self {
            video_link: RwSignal::new(String::new()),
            script: RwSignal::new(String::new()),
            video_id: RwSignal::new(String::new()),
        }
    }

    fn is_complete(&self) -> bool {
        !self.video_link.get().trim().is_empty()
            && !self.script.get().trim().is_empty()
            && !self.video_id.get().trim().is_empty()
    }

    fn to_request(self) -> CreateVideoRequest {
        CreateVideoRequest {
            video_link: self.video_link.get_untracked().trim().to_string(),
            script: self.script.get_untracked().trim().to_string(),
            video_id: self.video_id.get_untracked().trim().to_string(),
        }
    }

    /// 只在提交成功后调用
    fn reset(&self) {
        self.video_link.set(String::new());
        self.script.set(String::new());
        self.video_id.set(String::new());
    }
}

#[component]
pub fn AddVideoForm(
    /// 通知回调：(消息, 是否出错)
    on_notify: Callback<(String, bool)>,
) -> impl IntoView {
    let queries = use_video_queries();
    let state = FormState::new();
    let (is_submitting, set_is_submitting) = signal(false);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        // 在途提交期间忽略重复点击
        if is_submitting.get() {
            return;
        }
        if !state.is_complete() {
            on_notify.run(("Please fill in all fields".to_string(), true));
            return;
        }

        set_is_submitting.set(true);
        spawn_local(async move {
            let result = queries.0.get_value().create(state.to_request()).await;
            match result {
                Ok(_) => {
                    state.reset();
                    on_notify.run(("Video added successfully".to_string(), false));
                }
                // 失败时保留表单内容，方便改完重交
                Err(e) => on_notify.run((e.message().to_string(), true)),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body" on:submit=on_submit>
                <h3 class="card-title">"Add video"</h3>

                <div class="form-control">
                    <label class="label" for="video-link">
                        <span class="label-text">"Video link"</span>
                    </label>
                    <input
                        id="video-link"
                        type="url"
                        placeholder="https://www.youtube.com/watch?v=..."
                        on:input=move |ev| state.video_link.set(event_target_value(&ev))
                        prop:value=state.video_link
                        class="input input-bordered"
                        required
                    />
                </div>

                <div class="form-control">
                    <label class="label" for="video-id">
                        <span class="label-text">"Video ID"</span>
                    </label>
                    <input
                        id="video-id"
                        type="text"
                        placeholder="abc123"
                        on:input=move |ev| state.video_id.set(event_target_value(&ev))
                        prop:value=state.video_id
                        class="input input-bordered"
                        required
                    />
                </div>

                <div class="form-control">
                    <label class="label" for="script">
                        <span class="label-text">"Script"</span>
                    </label>
                    <textarea
                        id="script"
                        rows="4"
                        placeholder="Narration script for this video"
                        on:input=move |ev| state.script.set(event_target_value(&ev))
                        prop:value=state.script
                        class="textarea textarea-bordered"
                        required
                    ></textarea>
                </div>

                <div class="form-control mt-4">
                    <button class="btn btn-primary" disabled=move || is_submitting.get()>
                        {move || if is_submitting.get() {
                            view! { <span class="loading loading-spinner"></span> "Adding..." }.into_any()
                        } else {
                            "Add video".into_any()
                        }}
                    </button>
                </div>
            </form>
        </div>
    }
}
