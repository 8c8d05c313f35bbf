use crate::api::{CreateDocumentRequest, SectionSeed};
use crate::components::ui::{
    Alert, AlertDescription, AlertTitle, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardItem, CardList, CardTitle, Input, Label, Spinner, Textarea,
};
use crate::editor::{SectionEditor, SlideEditor};
use crate::models::{ProjectKind, RecentProject};
use crate::state::AppContext;
use crate::storage::{load_recent_projects, save_user_to_storage, write_recent_project};
use crate::sync::{SectionSyncController, SlideSyncController};
use crate::themes::{find_theme, PPT_THEMES};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::hooks::use_params;
use leptos_router::params::Params;

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.login(&email_val, &password_val).await {
                Ok(response) => {
                    api_client.set_token(response.access_token);
                    api_client.save_to_storage();

                    // Profile fetch is best-effort; a miss only leaves the
                    // header without an email.
                    if let Ok(user) = api_client.me().await {
                        save_user_to_storage(&user);
                        app_state.0.current_user.set(Some(user));
                    }

                    app_state.0.api_client.set(api_client);
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"AiDoc Studio"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Log in"</CardTitle>
                        <CardDescription class="text-xs">"Use your email and password to continue."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| {
                                        view! {
                                            <Alert class="border-destructive/30">
                                                <AlertDescription class="text-destructive text-xs">
                                                    {e}
                                                </AlertDescription>
                                            </Alert>
                                        }
                                    })
                                }}
                            </Show>

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                "No account? "
                                <a class="text-primary underline underline-offset-4" href="/signup">"Sign up"</a>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn RegistrationPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let success: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let confirm_password_val = confirm_password.get();
        let api_client = app_state.0.api_client.get_untracked();

        if password_val != confirm_password_val {
            error.set(Some("Passwords do not match".to_string()));
            return;
        }

        if password_val.len() < 8 {
            error.set(Some("Password must be at least 8 characters".to_string()));
            return;
        }

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.register(&email_val, &password_val).await {
                Ok(_response) => {
                    success.set(true);
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"AiDoc Studio"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Create account"</CardTitle>
                        <CardDescription class="text-xs">"Sign up with your email address."</CardDescription>
                    </CardHeader>
                    <CardContent>

                    <Show
                        when=move || !success.get()
                        fallback=move || view! {
                            <Alert>
                                <AlertDescription class="text-xs">
                                    "Account created. You can now "
                                    <a class="text-primary underline underline-offset-4" href="/login">"log in"</a>
                                    "."
                                </AlertDescription>
                            </Alert>
                        }
                    >
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="confirm_password" class="text-xs">"Confirm password"</Label>
                                <Input
                                    id="confirm_password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=confirm_password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| {
                                        view! {
                                            <Alert class="border-destructive/30">
                                                <AlertDescription class="text-destructive text-xs">
                                                    {e}
                                                </AlertDescription>
                                            </Alert>
                                        }
                                    })
                                }}
                            </Show>

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Creating..." } else { "Continue" }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                "Already have an account? "
                                <a class="text-primary underline underline-offset-4" href="/login">"Log in"</a>
                            </div>
                        </form>
                    </Show>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn StudioShell(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let children = StoredValue::new(children);

    let on_logout = move |_| {
        let mut api_client = app_state.0.api_client.get_untracked();
        api_client.logout();
        app_state.0.api_client.set(api_client);
        app_state.0.current_user.set(None);
        let _ = window().location().set_href("/login");
    };

    let user_email = move || {
        app_state
            .0
            .current_user
            .get()
            .and_then(|u| u.email().map(|e| e.to_string()))
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <div class="mx-auto w-full max-w-5xl px-4 py-6">
                <header class="mb-6 flex items-center justify-between gap-3">
                    <div class="flex items-center gap-4">
                        <a href="/" class="text-sm font-semibold">"AiDoc Studio"</a>
                        <nav class="flex items-center gap-1 text-sm">
                            <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm href="/ppt">
                                "New deck"
                            </Button>
                            <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm href="/doc">
                                "New document"
                            </Button>
                        </nav>
                    </div>

                    <div class="flex items-center gap-2">
                        <span class="hidden text-xs text-muted-foreground sm:inline">{user_email}</span>
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_logout>
                            "Sign out"
                        </Button>
                    </div>
                </header>

                <main class="min-w-0">
                    {move || children.with_value(|c| c())}
                </main>
            </div>
        </div>
    }
}

/// Best-effort extraction from a loose dashboard item. Item shapes differ
/// between project kinds and backend versions.
pub(crate) fn dashboard_entry(item: &serde_json::Value) -> Option<(ProjectKind, String, String)> {
    let kind_str = item
        .get("kind")
        .or_else(|| item.get("type"))
        .and_then(|v| v.as_str())
        .unwrap_or("presentation");
    let kind = if kind_str.contains("doc") {
        ProjectKind::Document
    } else {
        ProjectKind::Presentation
    };

    let id_value = match kind {
        ProjectKind::Presentation => item
            .get("presentation_id")
            .or_else(|| item.get("id")),
        ProjectKind::Document => item.get("id").or_else(|| item.get("document_id")),
    }?;
    let id = id_value
        .as_str()
        .map(|s| s.to_string())
        .or_else(|| id_value.as_i64().map(|n| n.to_string()))?;

    let title = item
        .get("topic")
        .or_else(|| item.get("title"))
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled")
        .to_string();

    Some((kind, id, title))
}

fn studio_path(kind: ProjectKind, id: &str) -> String {
    match kind {
        ProjectKind::Presentation => format!("/ppt/{id}"),
        ProjectKind::Document => format!("/doc/{id}"),
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let items: RwSignal<Vec<serde_json::Value>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(true);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    // Snapshot once at mount; localStorage reads are not reactive.
    let recents: RwSignal<Vec<RecentProject>> = RwSignal::new(load_recent_projects());

    {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.dashboard_items().await {
                Ok(list) => items.set(list),
                Err(e) => {
                    if e.kind == crate::api::ApiErrorKind::Unauthorized {
                        let mut c = app_state.0.api_client.get_untracked();
                        c.logout();
                        app_state.0.api_client.set(c);
                        app_state.0.current_user.set(None);
                        let _ = window().location().set_href("/login");
                    } else {
                        error.set(Some(e.to_string()));
                    }
                }
            }
            loading.set(false);
        });
    }

    let export_href = move |kind: ProjectKind, id: &str| {
        let api_client = app_state.0.api_client.get_untracked();
        match kind {
            ProjectKind::Presentation => api_client.presentation_download_url(id),
            ProjectKind::Document => api_client.document_export_url(id),
        }
    };

    view! {
        <div class="space-y-6">
            <div class="grid gap-3 sm:grid-cols-2">
                <Card class="transition-colors hover:bg-accent/40">
                    <CardHeader>
                        <CardTitle class="text-sm">"Slide deck"</CardTitle>
                        <CardDescription class="text-xs">
                            "Generate a presentation from a topic, then edit it inline."
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <Button size=ButtonSize::Sm href="/ppt">"Create deck"</Button>
                    </CardContent>
                </Card>

                <Card class="transition-colors hover:bg-accent/40">
                    <CardHeader>
                        <CardTitle class="text-sm">"Word document"</CardTitle>
                        <CardDescription class="text-xs">
                            "Generate a structured document and refine it section by section."
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <Button size=ButtonSize::Sm href="/doc">"Create document"</Button>
                    </CardContent>
                </Card>
            </div>

            <div class="space-y-2">
                <h2 class="text-sm font-semibold">"Your projects"</h2>

                <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                    {move || error.get().map(|e| view! {
                        <Alert class="border-destructive/30">
                            <AlertTitle class="text-destructive text-xs">"Could not load projects"</AlertTitle>
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    })}
                </Show>

                <Show
                    when=move || !loading.get()
                    fallback=|| view! { <div class="text-xs text-muted-foreground">"Loading..."</div> }
                >
                    <Show
                        when=move || !items.get().is_empty()
                        fallback=|| view! { <div class="text-xs text-muted-foreground">"No projects yet."</div> }
                    >
                        <div class="grid gap-2 sm:grid-cols-2">
                            {move || {
                                items
                                    .get()
                                    .iter()
                                    .filter_map(dashboard_entry)
                                    .map(|(kind, id, title)| {
                                        let kind_label = match kind {
                                            ProjectKind::Presentation => "Deck",
                                            ProjectKind::Document => "Document",
                                        };
                                        let open_href = studio_path(kind, &id);
                                        let dl_href = export_href(kind, &id);

                                        view! {
                                            <Card class="gap-2 py-3">
                                                <CardHeader class="px-4">
                                                    <CardTitle class="truncate text-sm">{title}</CardTitle>
                                                    <CardDescription class="text-xs">{kind_label}</CardDescription>
                                                </CardHeader>
                                                <CardContent class="flex items-center gap-2 px-4">
                                                    <Button variant=ButtonVariant::Outline size=ButtonSize::Sm href=open_href>
                                                        "Open"
                                                    </Button>
                                                    <a
                                                        class="text-xs text-primary underline underline-offset-4"
                                                        href=dl_href
                                                        target="_blank"
                                                    >
                                                        "Export"
                                                    </a>
                                                </CardContent>
                                            </Card>
                                        }
                                        .into_any()
                                    })
                                    .collect_view()
                            }}
                        </div>
                    </Show>
                </Show>
            </div>

            <div class="space-y-2">
                <h2 class="text-sm font-semibold">"Recently opened"</h2>
                <Show
                    when=move || !recents.get().is_empty()
                    fallback=|| view! { <div class="text-xs text-muted-foreground">"Nothing here yet."</div> }
                >
                    <CardList class="gap-1">
                        {move || {
                            recents
                                .get()
                                .into_iter()
                                .map(|r| {
                                    let kind_label = match r.kind {
                                        ProjectKind::Presentation => "Deck",
                                        ProjectKind::Document => "Document",
                                    };
                                    view! {
                                        <CardItem>
                                            <a
                                                href=studio_path(r.kind, &r.id)
                                                class="block w-full rounded-md border border-border bg-background px-3 py-2 transition-colors hover:bg-accent/40"
                                            >
                                                <div class="truncate text-sm font-medium">{r.title}</div>
                                                <div class="text-xs text-muted-foreground">{kind_label}</div>
                                            </a>
                                        </CardItem>
                                    }
                                })
                                .collect_view()
                        }}
                    </CardList>
                </Show>
            </div>
        </div>
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StudioMode {
    Setup,
    Editing,
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct StudioRouteParams {
    pub id: Option<String>,
}

#[component]
pub fn SlideStudioPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<StudioRouteParams>();

    let sync = SlideSyncController::new(app_state.clone());

    let mode: RwSignal<StudioMode> = RwSignal::new(StudioMode::Setup);
    let topic: RwSignal<String> = RwSignal::new(String::new());
    let num_slides: RwSignal<String> = RwSignal::new("8".to_string());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let generating: RwSignal<bool> = RwSignal::new(false);

    let selected_theme: RwSignal<Option<String>> = RwSignal::new(None);
    let theme_busy: RwSignal<bool> = RwSignal::new(false);
    let theme_note: RwSignal<Option<String>> = RwSignal::new(None);

    // Unsent edits would be lost on tab close; flush whatever is pending.
    let sync_ph = sync.clone();
    let pagehide = window_event_listener(ev::pagehide, move |_| sync_ph.flush_all());
    let sync_cleanup = sync.clone();
    on_cleanup(move || {
        pagehide.remove();
        sync_cleanup.teardown();
    });

    // Deep link: /ppt/:id opens an existing deck.
    let sync_load = sync.clone();
    Effect::new(move |_| {
        let Some(id) = params.get().ok().and_then(|p| p.id) else {
            return;
        };
        if sync_load.presentation_id().as_deref() == Some(id.as_str()) {
            return;
        }

        let api_client = app_state.0.api_client.get_untracked();
        let sync2 = sync_load.clone();
        spawn_local(async move {
            match api_client.get_presentation(&id).await {
                Ok(pres) => {
                    write_recent_project(
                        ProjectKind::Presentation,
                        &pres.presentation_id,
                        &pres.topic,
                    );
                    selected_theme.set(pres.theme_id.clone());
                    sync2.set_presentation(pres);
                    mode.set(StudioMode::Editing);
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    });

    let sync_gen = sync.clone();
    let on_generate = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if generating.get_untracked() {
            return;
        }

        let topic_val = topic.get_untracked().trim().to_string();
        if topic_val.is_empty() {
            error.set(Some("Topic is required".to_string()));
            return;
        }
        let n: u32 = num_slides.get_untracked().trim().parse().unwrap_or(0);
        if !(1..=30).contains(&n) {
            error.set(Some("Slide count must be between 1 and 30".to_string()));
            return;
        }

        generating.set(true);
        error.set(None);

        let api_client = app_state.0.api_client.get_untracked();
        let sync2 = sync_gen.clone();
        spawn_local(async move {
            match api_client.create_presentation(&topic_val, n).await {
                Ok(pres) => {
                    write_recent_project(
                        ProjectKind::Presentation,
                        &pres.presentation_id,
                        &pres.topic,
                    );
                    sync2.set_presentation(pres);
                    selected_theme.set(None);
                    mode.set(StudioMode::Editing);
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            generating.set(false);
        });
    };

    let sync_theme = sync.clone();
    let apply_theme = move |theme_id: &'static str| {
        if theme_busy.get_untracked() {
            return;
        }
        let Some(pid) = sync_theme.presentation_id() else {
            return;
        };

        theme_busy.set(true);
        theme_note.set(None);

        let api_client = app_state.0.api_client.get_untracked();
        let preview = find_theme(theme_id).map(|t| t.preview.to_string());
        let sync2 = sync_theme.clone();
        spawn_local(async move {
            match api_client
                .configure_presentation(&pid, theme_id, preview)
                .await
            {
                Ok(_) => {
                    selected_theme.set(Some(theme_id.to_string()));
                    theme_note.set(Some("Theme applied".to_string()));
                    // Applying a theme can bump the revision server-side.
                    sync2.refresh();
                }
                Err(e) => theme_note.set(Some(e.to_string())),
            }
            theme_busy.set(false);
        });
    };

    let sync_export = sync.clone();
    let on_export = move |_| {
        let Some(pid) = sync_export.presentation_id() else {
            return;
        };
        let url = app_state
            .0
            .api_client
            .get_untracked()
            .presentation_download_url(&pid);
        let _ = window().open_with_url_and_target(&url, "_blank");
    };

    let sync_reset = sync.clone();
    let on_start_over = move |_| {
        sync_reset.reset();
        selected_theme.set(None);
        theme_note.set(None);
        topic.set(String::new());
        num_slides.set("8".to_string());
        mode.set(StudioMode::Setup);
    };

    let sync_title = sync.clone();
    let sync_list = sync.clone();

    view! {
        <div class="space-y-4">
            <Show
                when=move || mode.get() == StudioMode::Editing
                fallback=move || {
                    // Clone outside the macro; the view expansion would
                    // otherwise move the handler and make this FnOnce.
                    let on_generate = on_generate.clone();
                    view! {
                    <div class="mx-auto w-full max-w-md">
                        <Card>
                            <CardHeader>
                                <CardTitle class="text-lg">"New slide deck"</CardTitle>
                                <CardDescription class="text-xs">
                                    "Describe the topic; the deck is generated for you."
                                </CardDescription>
                            </CardHeader>
                            <CardContent>
                                <form class="flex flex-col gap-3" on:submit=on_generate>
                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="topic" class="text-xs">"Topic"</Label>
                                        <Input
                                            id="topic"
                                            placeholder="Q3 sales strategy"
                                            bind_value=topic
                                            required=true
                                            class="h-8 text-sm"
                                        />
                                    </div>

                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="num_slides" class="text-xs">"Number of slides"</Label>
                                        <Input
                                            id="num_slides"
                                            r#type="number"
                                            bind_value=num_slides
                                            class="h-8 text-sm"
                                        />
                                    </div>

                                    <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                        {move || error.get().map(|e| view! {
                                            <Alert class="border-destructive/30">
                                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                            </Alert>
                                        })}
                                    </Show>

                                    <Button
                                        class="w-full"
                                        size=ButtonSize::Sm
                                        attr:disabled=move || generating.get()
                                    >
                                        <span class="inline-flex items-center gap-2">
                                            <Show when=move || generating.get() fallback=|| ().into_view()>
                                                <Spinner />
                                            </Show>
                                            {move || if generating.get() { "Generating..." } else { "Generate deck" }}
                                        </span>
                                    </Button>
                                </form>
                            </CardContent>
                        </Card>
                    </div>
                    }
                }
            >
                <div class="flex items-center justify-between gap-3">
                    <h1 class="min-w-0 truncate text-lg font-semibold">
                        {
                            let sync_title = sync_title.clone();
                            move || sync_title.topic()
                        }
                    </h1>
                    <div class="flex shrink-0 items-center gap-2">
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_export.clone()>
                            "Download .pptx"
                        </Button>
                        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_start_over.clone()>
                            "Start over"
                        </Button>
                    </div>
                </div>

                <div class="grid gap-4 lg:grid-cols-[1fr_240px]">
                    <div class="space-y-3">
                        {
                            let sync_list = sync_list.clone();
                            move || {
                                let count = sync_list.slides().with(|s| s.len());
                                (0..count)
                                    .map(|i| {
                                        view! { <SlideEditor index=i sync=sync_list.clone() /> }
                                            .into_any()
                                    })
                                    .collect_view()
                            }
                        }
                    </div>

                    <aside class="space-y-2">
                        <h2 class="text-sm font-semibold">"Design"</h2>
                        <div class="grid grid-cols-2 gap-2 lg:grid-cols-1">
                            {PPT_THEMES
                                .iter()
                                .map(|t| {
                                    let theme_id = t.theme_id;
                                    let apply = apply_theme.clone();
                                    let is_selected = move || {
                                        selected_theme.get().as_deref() == Some(theme_id)
                                    };
                                    view! {
                                        <button
                                            type="button"
                                            class=move || {
                                                if is_selected() {
                                                    "rounded-md border-2 border-primary p-1 text-left"
                                                } else {
                                                    "rounded-md border border-border p-1 text-left hover:border-ring"
                                                }
                                            }
                                            on:click=move |_| apply(theme_id)
                                        >
                                            <img
                                                src=t.thumb
                                                alt=t.name
                                                class="h-20 w-full rounded object-cover"
                                            />
                                            <div class="mt-1 truncate text-xs">{t.name}</div>
                                        </button>
                                    }
                                })
                                .collect_view()}
                        </div>
                        <div class="min-h-[1rem] text-xs text-muted-foreground" aria-live="polite">
                            {move || {
                                if theme_busy.get() {
                                    "Applying...".to_string()
                                } else {
                                    theme_note.get().unwrap_or_default()
                                }
                            }}
                        </div>
                    </aside>
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn DocStudioPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<StudioRouteParams>();

    let sync = SectionSyncController::new(app_state.clone());

    let mode: RwSignal<StudioMode> = RwSignal::new(StudioMode::Setup);
    let title: RwSignal<String> = RwSignal::new(String::new());
    let topic: RwSignal<String> = RwSignal::new(String::new());
    let num_pages: RwSignal<String> = RwSignal::new("3".to_string());
    let outline: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let generating: RwSignal<bool> = RwSignal::new(false);
    let refining: RwSignal<Option<i64>> = RwSignal::new(None);

    let sync_ph = sync.clone();
    let pagehide = window_event_listener(ev::pagehide, move |_| sync_ph.flush_all());
    let sync_cleanup = sync.clone();
    on_cleanup(move || {
        pagehide.remove();
        sync_cleanup.teardown();
    });

    // Deep link: /doc/:id opens an existing document.
    let sync_load = sync.clone();
    Effect::new(move |_| {
        let Some(id) = params.get().ok().and_then(|p| p.id) else {
            return;
        };
        if sync_load.document_id().as_deref() == Some(id.as_str()) {
            return;
        }

        let api_client = app_state.0.api_client.get_untracked();
        let sync2 = sync_load.clone();
        spawn_local(async move {
            match api_client.get_document(&id).await {
                Ok(doc) => {
                    write_recent_project(ProjectKind::Document, &doc.id, &doc.title);
                    sync2.set_document(doc);
                    mode.set(StudioMode::Editing);
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    });

    let sync_gen = sync.clone();
    let on_generate = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if generating.get_untracked() {
            return;
        }

        let title_val = title.get_untracked().trim().to_string();
        let topic_val = topic.get_untracked().trim().to_string();
        if title_val.is_empty() || topic_val.is_empty() {
            error.set(Some("Title and topic are required".to_string()));
            return;
        }
        let pages: u32 = num_pages.get_untracked().trim().parse().unwrap_or(0);
        if !(1..=50).contains(&pages) {
            error.set(Some("Page count must be between 1 and 50".to_string()));
            return;
        }

        let sections: Vec<SectionSeed> = outline
            .get_untracked()
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(i, l)| SectionSeed {
                title: l.to_string(),
                order_index: (i + 1) as u32,
            })
            .collect();
        if sections.is_empty() {
            error.set(Some("At least one section is required".to_string()));
            return;
        }

        generating.set(true);
        error.set(None);

        let api_client = app_state.0.api_client.get_untracked();
        let sync2 = sync_gen.clone();
        spawn_local(async move {
            let req = CreateDocumentRequest {
                title: title_val,
                topic: topic_val,
                doc_type: "docx".to_string(),
                num_pages: pages,
                sections,
            };
            match api_client.create_document(req).await {
                Ok(doc) => {
                    write_recent_project(ProjectKind::Document, &doc.id, &doc.title);
                    sync2.set_document(doc);
                    mode.set(StudioMode::Editing);
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            generating.set(false);
        });
    };

    let sync_refine = sync.clone();
    let on_refine = Callback::new(move |(section_id, prompt): (i64, String)| {
        if refining.get_untracked().is_some() {
            return;
        }
        let Some(doc_id) = sync_refine.document_id() else {
            return;
        };

        refining.set(Some(section_id));

        let api_client = app_state.0.api_client.get_untracked();
        let sync2 = sync_refine.clone();
        spawn_local(async move {
            match api_client.refine_section(&doc_id, section_id, &prompt).await {
                Ok(_) => sync2.refresh(),
                Err(e) => error.set(Some(e.to_string())),
            }
            refining.set(None);
        });
    });

    let sync_export = sync.clone();
    let on_export = move |_| {
        let Some(doc_id) = sync_export.document_id() else {
            return;
        };
        let url = app_state
            .0
            .api_client
            .get_untracked()
            .document_export_url(&doc_id);
        let _ = window().open_with_url_and_target(&url, "_blank");
    };

    let sync_reset = sync.clone();
    let on_start_over = move |_| {
        sync_reset.reset();
        title.set(String::new());
        topic.set(String::new());
        num_pages.set("3".to_string());
        outline.set(String::new());
        error.set(None);
        mode.set(StudioMode::Setup);
    };

    let sync_title = sync.clone();
    let sync_pages = sync.clone();
    let sync_list = sync.clone();

    view! {
        <div class="space-y-4">
            <Show
                when=move || mode.get() == StudioMode::Editing
                fallback=move || {
                    // Clone outside the macro; the view expansion would
                    // otherwise move the handler and make this FnOnce.
                    let on_generate = on_generate.clone();
                    view! {
                    <div class="mx-auto w-full max-w-md">
                        <Card>
                            <CardHeader>
                                <CardTitle class="text-lg">"New word document"</CardTitle>
                                <CardDescription class="text-xs">
                                    "Outline the document; each section is generated for you."
                                </CardDescription>
                            </CardHeader>
                            <CardContent>
                                <form class="flex flex-col gap-3" on:submit=on_generate>
                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="doc_title" class="text-xs">"Title"</Label>
                                        <Input
                                            id="doc_title"
                                            placeholder="Annual report 2026"
                                            bind_value=title
                                            required=true
                                            class="h-8 text-sm"
                                        />
                                    </div>

                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="doc_topic" class="text-xs">"Topic"</Label>
                                        <Input
                                            id="doc_topic"
                                            placeholder="Company performance and outlook"
                                            bind_value=topic
                                            required=true
                                            class="h-8 text-sm"
                                        />
                                    </div>

                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="doc_pages" class="text-xs">"Approximate pages"</Label>
                                        <Input
                                            id="doc_pages"
                                            r#type="number"
                                            bind_value=num_pages
                                            class="h-8 text-sm"
                                        />
                                    </div>

                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="doc_outline" class="text-xs">"Sections (one per line)"</Label>
                                        <Textarea
                                            id="doc_outline"
                                            rows=5
                                            placeholder="Introduction\nMarket analysis\nConclusion"
                                            bind_value=outline
                                            class="text-sm"
                                        />
                                    </div>

                                    <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                        {move || error.get().map(|e| view! {
                                            <Alert class="border-destructive/30">
                                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                            </Alert>
                                        })}
                                    </Show>

                                    <Button
                                        class="w-full"
                                        size=ButtonSize::Sm
                                        attr:disabled=move || generating.get()
                                    >
                                        <span class="inline-flex items-center gap-2">
                                            <Show when=move || generating.get() fallback=|| ().into_view()>
                                                <Spinner />
                                            </Show>
                                            {move || if generating.get() { "Generating..." } else { "Generate document" }}
                                        </span>
                                    </Button>
                                </form>
                            </CardContent>
                        </Card>
                    </div>
                    }
                }
            >
                <div class="flex items-center justify-between gap-3">
                    <div class="min-w-0">
                        <h1 class="truncate text-lg font-semibold">
                            {
                                let sync_title = sync_title.clone();
                                move || sync_title.title()
                            }
                        </h1>
                        <div class="text-xs text-muted-foreground">
                            {
                                let sync_pages = sync_pages.clone();
                                move || format!("~{} pages", sync_pages.num_pages())
                            }
                        </div>
                    </div>
                    <div class="flex shrink-0 items-center gap-2">
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_export.clone()>
                            "Download .docx"
                        </Button>
                        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_start_over.clone()>
                            "Start over"
                        </Button>
                    </div>
                </div>

                <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                    {move || error.get().map(|e| view! {
                        <Alert class="border-destructive/30">
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    })}
                </Show>

                <Show when=move || refining.get().is_some() fallback=|| ().into_view()>
                    <div class="flex items-center gap-2 text-xs text-muted-foreground">
                        <Spinner />
                        "Refining section..."
                    </div>
                </Show>

                <div class="space-y-3">
                    {
                        let sync_list = sync_list.clone();
                        move || {
                            let ids: Vec<i64> =
                                sync_list.sections().with(|s| s.iter().map(|x| x.id).collect());
                            ids.into_iter()
                                .map(|id| {
                                    view! {
                                        <SectionEditor
                                            section_id=id
                                            sync=sync_list.clone()
                                            on_refine=on_refine
                                        />
                                    }
                                    .into_any()
                                })
                                .collect_view()
                        }
                    }
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <StudioShell>
                {move || children.with_value(|c| c())}
            </StudioShell>
        </Show>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    view! {
        <RootAuthed>
            <DashboardPage />
        </RootAuthed>
    }
}
