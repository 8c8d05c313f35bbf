//! Inline editors for generated content.
//!
//! Editors render straight from the sync controller's live collection and
//! hand every input event back as a full updated snapshot; the controller
//! does the diffing, echo, and debounced persistence. No editable state is
//! duplicated locally, so reconciliation updates flow into the inputs for
//! free.

use crate::components::ui::{Button, ButtonSize, ButtonVariant, Card, CardContent, CardFooter, CardHeader};
use crate::models::Slide;
use crate::sync::{SectionSyncController, SlideSyncController};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

pub(crate) fn event_value(ev: &web_sys::Event) -> String {
    let Some(target) = ev.target() else {
        return String::new();
    };
    if let Some(input) = target.dyn_ref::<web_sys::HtmlInputElement>() {
        return input.value();
    }
    if let Some(area) = target.dyn_ref::<web_sys::HtmlTextAreaElement>() {
        return area.value();
    }
    String::new()
}

/// Bullets are edited as one textarea line per bullet.
pub(crate) fn bullets_to_text(bullets: &[String]) -> String {
    bullets.join("\n")
}

pub(crate) fn text_to_bullets(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }
    text.split('\n').map(|s| s.to_string()).collect()
}

const FIELD_CLASS: &str = "w-full rounded-md border border-input bg-transparent px-3 py-1.5 text-sm outline-none focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2";

#[component]
pub fn SlideEditor(index: usize, sync: SlideSyncController) -> impl IntoView {
    let slides = sync.slides();
    let slide = Memo::new(move |_| slides.with(|s| s.get(index).cloned()));

    let sync_fields = sync.clone();
    let sync_status = sync.clone();
    let sync_save = sync.clone();

    let fields = move || {
        let Some(slide) = slide.get() else {
            return ().into_any();
        };

        match slide {
            Slide::Bullet { title, bullets } => {
                let s1 = sync_fields.clone();
                let bullets_t = bullets.clone();
                let on_title = move |ev: web_sys::Event| {
                    s1.on_slide_edited(
                        index,
                        &Slide::Bullet {
                            title: event_value(&ev),
                            bullets: bullets_t.clone(),
                        },
                    );
                };

                let s2 = sync_fields.clone();
                let title_b = title.clone();
                let on_bullets = move |ev: web_sys::Event| {
                    s2.on_slide_edited(
                        index,
                        &Slide::Bullet {
                            title: title_b.clone(),
                            bullets: text_to_bullets(&event_value(&ev)),
                        },
                    );
                };

                view! {
                    <input class=FIELD_CLASS placeholder="Slide title" prop:value=title on:input=on_title />
                    <textarea
                        class=FIELD_CLASS
                        rows=5
                        placeholder="One bullet per line"
                        prop:value=bullets_to_text(&bullets)
                        on:input=on_bullets
                    />
                }
                .into_any()
            }
            Slide::TwoColumn { title, left, right } => {
                let s1 = sync_fields.clone();
                let (left1, right1) = (left.clone(), right.clone());
                let on_title = move |ev: web_sys::Event| {
                    s1.on_slide_edited(
                        index,
                        &Slide::TwoColumn {
                            title: event_value(&ev),
                            left: left1.clone(),
                            right: right1.clone(),
                        },
                    );
                };

                let s2 = sync_fields.clone();
                let (title2, right2) = (title.clone(), right.clone());
                let on_left = move |ev: web_sys::Event| {
                    s2.on_slide_edited(
                        index,
                        &Slide::TwoColumn {
                            title: title2.clone(),
                            left: event_value(&ev),
                            right: right2.clone(),
                        },
                    );
                };

                let s3 = sync_fields.clone();
                let (title3, left3) = (title.clone(), left.clone());
                let on_right = move |ev: web_sys::Event| {
                    s3.on_slide_edited(
                        index,
                        &Slide::TwoColumn {
                            title: title3.clone(),
                            left: left3.clone(),
                            right: event_value(&ev),
                        },
                    );
                };

                view! {
                    <input class=FIELD_CLASS placeholder="Slide title" prop:value=title on:input=on_title />
                    <div class="grid grid-cols-2 gap-2">
                        <textarea class=FIELD_CLASS rows=5 placeholder="Left column" prop:value=left on:input=on_left />
                        <textarea class=FIELD_CLASS rows=5 placeholder="Right column" prop:value=right on:input=on_right />
                    </div>
                }
                .into_any()
            }
            Slide::Image {
                title,
                image_url,
                caption,
            } => {
                let s1 = sync_fields.clone();
                let (url1, cap1) = (image_url.clone(), caption.clone());
                let on_title = move |ev: web_sys::Event| {
                    s1.on_slide_edited(
                        index,
                        &Slide::Image {
                            title: event_value(&ev),
                            image_url: url1.clone(),
                            caption: cap1.clone(),
                        },
                    );
                };

                let s2 = sync_fields.clone();
                let (title2, cap2) = (title.clone(), caption.clone());
                let on_url = move |ev: web_sys::Event| {
                    s2.on_slide_edited(
                        index,
                        &Slide::Image {
                            title: title2.clone(),
                            image_url: event_value(&ev),
                            caption: cap2.clone(),
                        },
                    );
                };

                let s3 = sync_fields.clone();
                let (title3, url3) = (title.clone(), image_url.clone());
                let on_caption = move |ev: web_sys::Event| {
                    s3.on_slide_edited(
                        index,
                        &Slide::Image {
                            title: title3.clone(),
                            image_url: url3.clone(),
                            caption: event_value(&ev),
                        },
                    );
                };

                view! {
                    <input class=FIELD_CLASS placeholder="Slide title" prop:value=title on:input=on_title />
                    <img class="max-h-48 rounded-md border object-cover" src=image_url.clone() alt="Slide image" />
                    <input class=FIELD_CLASS placeholder="Image URL" prop:value=image_url on:input=on_url />
                    <input class=FIELD_CLASS placeholder="Caption" prop:value=caption on:input=on_caption />
                }
                .into_any()
            }
            Slide::Title { title } => {
                let s1 = sync_fields.clone();
                let on_title = move |ev: web_sys::Event| {
                    s1.on_slide_edited(
                        index,
                        &Slide::Title {
                            title: event_value(&ev),
                        },
                    );
                };

                view! {
                    <input class=FIELD_CLASS placeholder="Deck title" prop:value=title on:input=on_title />
                }
                .into_any()
            }
            Slide::Custom { title, extra } => {
                let s1 = sync_fields.clone();
                let extra1 = extra.clone();
                let on_title = move |ev: web_sys::Event| {
                    s1.on_slide_edited(
                        index,
                        &Slide::Custom {
                            title: event_value(&ev),
                            extra: extra1.clone(),
                        },
                    );
                };

                view! {
                    <input class=FIELD_CLASS placeholder="Slide title" prop:value=title on:input=on_title />
                    <p class="text-xs text-muted-foreground">
                        "Custom layout; only the title is editable here."
                    </p>
                }
                .into_any()
            }
        }
    };

    view! {
        <Card class="gap-3 py-4">
            <CardHeader class="flex-row items-center justify-between px-4">
                <span class="text-xs font-medium text-muted-foreground">
                    {format!("Slide {}", index + 1)}
                </span>
                <span class="rounded bg-accent px-2 py-0.5 text-[10px] uppercase tracking-wide text-accent-foreground">
                    {move || slide.get().map(|s| s.layout().to_string()).unwrap_or_default()}
                </span>
            </CardHeader>

            <CardContent class="flex flex-col gap-2 px-4">
                {fields}
            </CardContent>

            <CardFooter class="justify-between px-4">
                <span class="text-xs text-muted-foreground" aria-live="polite">
                    {move || sync_status.status(index).to_string()}
                </span>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| sync_save.save_now(index)
                >
                    "Save slide"
                </Button>
            </CardFooter>
        </Card>
    }
}

#[component]
pub fn SectionEditor(
    section_id: i64,
    sync: SectionSyncController,
    #[prop(into)] on_refine: Callback<(i64, String)>,
) -> impl IntoView {
    let sections = sync.sections();
    let section =
        Memo::new(move |_| sections.with(|s| s.iter().find(|x| x.id == section_id).cloned()));

    let prompt: RwSignal<String> =
        RwSignal::new("Make this more concise and formal, around 150 words.".to_string());

    let sync_title = sync.clone();
    let sync_content = sync.clone();
    let sync_status = sync.clone();
    let sync_save = sync.clone();

    let on_title = move |ev: web_sys::Event| {
        if let Some(mut s) = section.get_untracked() {
            s.title = event_value(&ev);
            sync_title.on_section_edited(&s);
        }
    };

    let on_content = move |ev: web_sys::Event| {
        if let Some(mut s) = section.get_untracked() {
            s.content = event_value(&ev);
            sync_content.on_section_edited(&s);
        }
    };

    view! {
        <Card class="gap-3 py-4">
            <CardHeader class="flex-row items-center justify-between px-4">
                <span class="text-xs font-medium text-muted-foreground">
                    {move || {
                        section
                            .get()
                            .map(|s| format!("Section {}", s.order_index))
                            .unwrap_or_default()
                    }}
                </span>
                <span class="text-xs text-muted-foreground" aria-live="polite">
                    {move || sync_status.status(section_id).to_string()}
                </span>
            </CardHeader>

            <CardContent class="flex flex-col gap-2 px-4">
                <input
                    class=FIELD_CLASS
                    placeholder="Section title"
                    prop:value=move || section.get().map(|s| s.title).unwrap_or_default()
                    on:input=on_title
                />
                <textarea
                    class=FIELD_CLASS
                    rows=7
                    placeholder="Generated content will appear here"
                    prop:value=move || section.get().map(|s| s.content).unwrap_or_default()
                    on:input=on_content
                />

                <label class="mt-2 flex flex-col gap-1">
                    <span class="text-xs text-muted-foreground">"Refinement prompt (optional)"</span>
                    <textarea
                        class=FIELD_CLASS
                        rows=3
                        prop:value=move || prompt.get()
                        on:input=move |ev| prompt.set(event_value(&ev))
                    />
                </label>
            </CardContent>

            <CardFooter class="justify-between px-4">
                <Button
                    variant=ButtonVariant::Secondary
                    size=ButtonSize::Sm
                    on:click=move |_| on_refine.run((section_id, prompt.get_untracked()))
                >
                    "Refine section"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| sync_save.save_now(section_id)
                >
                    "Save section"
                </Button>
            </CardFooter>
        </Card>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullets_text_round_trip() {
        let bullets = vec!["Intro".to_string(), "Body".to_string()];
        let text = bullets_to_text(&bullets);
        assert_eq!(text, "Intro\nBody");
        assert_eq!(text_to_bullets(&text), bullets);
    }

    #[test]
    fn test_empty_text_means_no_bullets() {
        assert!(text_to_bullets("").is_empty());
    }

    #[test]
    fn test_blank_lines_are_kept_as_positions() {
        // The textarea shows them, so the model keeps them; trimming only
        // affects change detection.
        assert_eq!(
            text_to_bullets("a\n\nb"),
            vec!["a".to_string(), String::new(), "b".to_string()]
        );
    }
}
