use leptos::prelude::*;
use leptos::task::spawn_local;

use reelboard_shared::Video;
use reelboard_shared::preview::embed_url;

use crate::components::icons::{Clapperboard, LogOut, RefreshCw, X};
use crate::components::video_form::AddVideoForm;
use crate::components::video_table::VideoTable;
use crate::queries::use_video_queries;
use crate::session::{SessionState, use_session};
use crate::web::router::use_navigate;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let session = use_session();
    let queries = use_video_queries();
    let navigate = use_navigate();

    let (videos, set_videos) = signal(Vec::<Video>::new());
    let (is_loading, set_is_loading) = signal(true);
    let (notification, set_notification) = signal(Option::<(String, bool)>::None); // 消息内容, 是否出错
    let (preview, set_preview) = signal(Option::<Video>::None);

    let load_videos = move || {
        set_is_loading.set(true);
        spawn_local(async move {
            match queries.0.get_value().list().await {
                Ok(data) => set_videos.set(data),
                Err(e) => {
                    set_notification.set(Some((e.message().to_string(), true)));
                }
            }
            set_is_loading.set(false);
        });
    };

    // 手动刷新：先失效再查询，新鲜的缓存也会重新触网
    let refresh_videos = move || {
        set_is_loading.set(true);
        spawn_local(async move {
            match queries.0.get_value().refresh().await {
                Ok(data) => set_videos.set(data),
                Err(e) => {
                    set_notification.set(Some((e.message().to_string(), true)));
                }
            }
            set_is_loading.set(false);
        });
    };

    // 初始加载 + 每次列表键失效后重新拉取
    let videos_version = queries.0.with_value(|q| q.videos_version());
    Effect::new(move |_| {
        videos_version.get();
        load_videos();
    });

    let on_sign_out = {
        let navigate = navigate.clone();
        move |_| {
            let navigate = navigate.clone();
            spawn_local(async move {
                let store = session.store.get_value();
                match store.sign_out().await {
                    Ok(()) => navigate("/login"),
                    Err(e) => set_notification.set(Some((e.message().to_string(), true))),
                }
            });
        }
    };

    // 3秒后清除通知
    Effect::new(move |_| {
        if notification.get().is_some() {
            set_timeout(
                move || set_notification.set(None),
                std::time::Duration::from_secs(3),
            );
        }
    });

    let operator_email = move || match session.state.get() {
        SessionState::Authenticated(user) => user.email,
        _ => String::new(),
    };

    let on_notify = Callback::new(move |(message, is_error): (String, bool)| {
        set_notification.set(Some((message, is_error)));
    });
    let on_preview = Callback::new(move |video: Video| set_preview.set(Some(video)));

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                // 通知提示框
                <Show when=move || notification.get().is_some()>
                    <div class="toast toast-top toast-end z-50">
                        <div class=move || {
                            let is_err = notification.get().map(|(_, e)| e).unwrap_or(false);
                            if is_err {
                                "alert alert-error shadow-lg"
                            } else {
                                "alert alert-success shadow-lg"
                            }
                        }>
                            <span>{move || notification.get().map(|(m, _)| m).unwrap_or_default()}</span>
                            <button
                                on:click=move |_| set_notification.set(None)
                                class="btn btn-ghost btn-xs btn-circle"
                            >
                                <X attr:class="h-4 w-4" />
                            </button>
                        </div>
                    </div>
                </Show>

                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <Clapperboard attr:class="text-primary h-6 w-6" />
                        <a class="btn btn-ghost text-xl">"Reelboard Admin"</a>
                        <span class="badge badge-neutral hidden md:inline-flex">
                            {operator_email}
                        </span>
                    </div>
                    <div class="flex-none gap-2">
                        <button on:click=on_sign_out class="btn btn-outline btn-error gap-2">
                            <LogOut attr:class="h-4 w-4" /> "Sign out"
                        </button>
                    </div>
                </div>

                <AddVideoForm on_notify=on_notify />

                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body p-0">
                        <div class="flex items-center justify-between p-6 pb-2">
                            <div>
                                <h3 class="card-title">"Videos"</h3>
                                <p class="text-base-content/70 text-sm">"Manage the video library."</p>
                            </div>
                            <button on:click=move |_| refresh_videos() disabled=move || is_loading.get() class="btn btn-ghost btn-circle">
                                <RefreshCw attr:class=move || if is_loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                            </button>
                        </div>

                        <VideoTable
                            videos=videos
                            is_loading=is_loading
                            on_preview=on_preview
                            on_notify=on_notify
                        />
                    </div>
                </div>

                // 预览弹窗
                <Show when=move || preview.get().is_some()>
                    {move || preview.get().map(|video| {
                        let embed = embed_url(&video.video_link);
                        view! {
                            <div class="modal modal-open">
                                <div class="modal-box max-w-3xl">
                                    <div class="flex items-center justify-between mb-4">
                                        <h3 class="font-bold text-lg">
                                            "Preview " <span class="font-mono">{video.video_id.clone()}</span>
                                        </h3>
                                        <button
                                            on:click=move |_| set_preview.set(None)
                                            class="btn btn-ghost btn-sm btn-circle"
                                        >
                                            <X attr:class="h-4 w-4" />
                                        </button>
                                    </div>

                                    {match embed {
                                        Some(src) => view! {
                                            <div class="aspect-video w-full">
                                                <iframe
                                                    src=src
                                                    class="w-full h-full rounded-lg"
                                                    allowfullscreen
                                                ></iframe>
                                            </div>
                                        }.into_any(),
                                        None => view! {
                                            <div class="alert alert-warning">
                                                <span>"Preview unavailable for this link."</span>
                                            </div>
                                        }.into_any(),
                                    }}

                                    <div class="mt-4">
                                        <h4 class="font-semibold mb-1">"Script"</h4>
                                        <p class="text-sm whitespace-pre-wrap opacity-80">{video.script.clone()}</p>
                                    </div>
                                </div>
                                <div class="modal-backdrop" on:click=move |_| set_preview.set(None)></div>
                            </div>
                        }
                    })}
                </Show>
            </div>
        </div>
    }
}
