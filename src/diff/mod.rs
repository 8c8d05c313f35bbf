//! Minimal change sets for editable items.
//!
//! A diff holds only the fields whose current value differs from the last
//! server-acknowledged baseline. It doubles as the PUT body for the per-item
//! update endpoints (unchanged fields are omitted from the JSON) and as the
//! payload for the local in-memory merge.

use crate::models::{Section, Slide};
use serde::Serialize;

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct SlideDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl SlideDiff {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.bullets.is_none()
            && self.left.is_none()
            && self.right.is_none()
            && self.image_url.is_none()
            && self.caption.is_none()
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct SectionDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SectionDiff {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Whitespace-only edits are not worth a network write.
fn changed_str(current: &str, baseline: &str) -> Option<String> {
    if current.trim() != baseline.trim() {
        Some(current.to_string())
    } else {
        None
    }
}

/// A bullet list changed if its length differs or any element at the same
/// position differs (after trimming).
fn changed_bullets(current: &[String], baseline: &[String]) -> Option<Vec<String>> {
    let same = current.len() == baseline.len()
        && current
            .iter()
            .zip(baseline.iter())
            .all(|(c, b)| c.trim() == b.trim());
    if same {
        None
    } else {
        Some(current.to_vec())
    }
}

/// Compute the set of fields that changed relative to the baseline.
///
/// Only fields relevant to the slide's layout are considered. The layout
/// itself is immutable after generation; if the two snapshots disagree on it
/// anyway, every field of the current slide is reported so the server ends up
/// with a coherent item.
pub(crate) fn diff_slide(current: &Slide, baseline: &Slide) -> SlideDiff {
    match (current, baseline) {
        (
            Slide::Bullet { title, bullets },
            Slide::Bullet {
                title: b_title,
                bullets: b_bullets,
            },
        ) => SlideDiff {
            title: changed_str(title, b_title),
            bullets: changed_bullets(bullets, b_bullets),
            ..Default::default()
        },
        (
            Slide::TwoColumn { title, left, right },
            Slide::TwoColumn {
                title: b_title,
                left: b_left,
                right: b_right,
            },
        ) => SlideDiff {
            title: changed_str(title, b_title),
            left: changed_str(left, b_left),
            right: changed_str(right, b_right),
            ..Default::default()
        },
        (
            Slide::Image {
                title,
                image_url,
                caption,
            },
            Slide::Image {
                title: b_title,
                image_url: b_url,
                caption: b_caption,
            },
        ) => SlideDiff {
            title: changed_str(title, b_title),
            image_url: changed_str(image_url, b_url),
            caption: changed_str(caption, b_caption),
            ..Default::default()
        },
        (Slide::Title { title }, Slide::Title { title: b_title }) => SlideDiff {
            title: changed_str(title, b_title),
            ..Default::default()
        },
        (Slide::Custom { title, .. }, Slide::Custom { title: b_title, .. }) => SlideDiff {
            // Only the title is editable on custom layouts; extra fields are
            // opaque server data and never diffed.
            title: changed_str(title, b_title),
            ..Default::default()
        },
        (current, _) => snapshot_slide(current),
    }
}

fn snapshot_slide(slide: &Slide) -> SlideDiff {
    match slide {
        Slide::Bullet { title, bullets } => SlideDiff {
            title: Some(title.clone()),
            bullets: Some(bullets.clone()),
            ..Default::default()
        },
        Slide::TwoColumn { title, left, right } => SlideDiff {
            title: Some(title.clone()),
            left: Some(left.clone()),
            right: Some(right.clone()),
            ..Default::default()
        },
        Slide::Image {
            title,
            image_url,
            caption,
        } => SlideDiff {
            title: Some(title.clone()),
            image_url: Some(image_url.clone()),
            caption: Some(caption.clone()),
            ..Default::default()
        },
        Slide::Title { title } | Slide::Custom { title, .. } => SlideDiff {
            title: Some(title.clone()),
            ..Default::default()
        },
    }
}

pub(crate) fn diff_section(current: &Section, baseline: &Section) -> SectionDiff {
    SectionDiff {
        title: changed_str(&current.title, &baseline.title),
        content: changed_str(&current.content, &baseline.content),
    }
}

/// Shallow-merge a diff into one slide. Fields absent from the diff are left
/// untouched; fields irrelevant to the slide's layout are ignored.
pub(crate) fn apply_slide_diff(slide: &mut Slide, diff: &SlideDiff) {
    match slide {
        Slide::Bullet { title, bullets } => {
            if let Some(t) = &diff.title {
                *title = t.clone();
            }
            if let Some(b) = &diff.bullets {
                *bullets = b.clone();
            }
        }
        Slide::TwoColumn { title, left, right } => {
            if let Some(t) = &diff.title {
                *title = t.clone();
            }
            if let Some(l) = &diff.left {
                *left = l.clone();
            }
            if let Some(r) = &diff.right {
                *right = r.clone();
            }
        }
        Slide::Image {
            title,
            image_url,
            caption,
        } => {
            if let Some(t) = &diff.title {
                *title = t.clone();
            }
            if let Some(u) = &diff.image_url {
                *image_url = u.clone();
            }
            if let Some(c) = &diff.caption {
                *caption = c.clone();
            }
        }
        Slide::Title { title } | Slide::Custom { title, .. } => {
            if let Some(t) = &diff.title {
                *title = t.clone();
            }
        }
    }
}

/// Local echo: merge a diff into the deck's in-memory copy, keyed by index.
///
/// Used by multiple interaction paths (per-keystroke echo, reconciliation)
/// and must stay synchronous so the UI never waits on the network to reflect
/// a keystroke.
pub(crate) fn apply_to_deck(slides: &mut [Slide], index: usize, diff: &SlideDiff) -> bool {
    if diff.is_empty() {
        return false;
    }
    if let Some(slide) = slides.get_mut(index) {
        apply_slide_diff(slide, diff);
        true
    } else {
        false
    }
}

pub(crate) fn apply_to_sections(
    sections: &mut [Section],
    section_id: i64,
    diff: &SectionDiff,
) -> bool {
    if diff.is_empty() {
        return false;
    }
    if let Some(s) = sections.iter_mut().find(|s| s.id == section_id) {
        if let Some(t) = &diff.title {
            s.title = t.clone();
        }
        if let Some(c) = &diff.content {
            s.content = c.clone();
        }
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullet(title: &str, bullets: &[&str]) -> Slide {
        Slide::Bullet {
            title: title.to_string(),
            bullets: bullets.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_bullet_edit_reports_only_bullets() {
        let baseline = bullet("Agenda", &["Intro", "Body"]);
        let current = bullet("Agenda", &["Introduction", "Body", "Outro"]);

        let d = diff_slide(&current, &baseline);
        assert_eq!(
            d.bullets.as_deref(),
            Some(&["Introduction".to_string(), "Body".to_string(), "Outro".to_string()][..])
        );
        assert!(d.title.is_none());
        assert!(d.left.is_none());
        assert!(d.right.is_none());
    }

    #[test]
    fn test_caption_edit_omits_unchanged_image_url() {
        let baseline = Slide::Image {
            title: "Results".into(),
            image_url: "/img/q3.png".into(),
            caption: String::new(),
        };
        let mut current = baseline.clone();
        if let Slide::Image { caption, .. } = &mut current {
            *caption = "Q3 results".into();
        }

        let d = diff_slide(&current, &baseline);
        assert_eq!(d.caption.as_deref(), Some("Q3 results"));
        assert!(d.image_url.is_none());
        assert!(d.title.is_none());

        let body = serde_json::to_value(&d).expect("diff should serialize");
        assert_eq!(body, serde_json::json!({"caption": "Q3 results"}));
    }

    #[test]
    fn test_diff_is_idempotent() {
        let baseline = bullet("T", &["a"]);
        let current = bullet("T2", &["a", "b"]);
        assert_eq!(diff_slide(&current, &baseline), diff_slide(&current, &baseline));
    }

    #[test]
    fn test_identical_snapshots_produce_empty_diff() {
        let s = bullet("T", &["a", "b"]);
        assert!(diff_slide(&s, &s).is_empty());
    }

    #[test]
    fn test_whitespace_only_change_is_not_a_diff() {
        let baseline = bullet("Title", &["point"]);
        let current = bullet("  Title  ", &["point "]);
        assert!(diff_slide(&current, &baseline).is_empty());
    }

    #[test]
    fn test_bullet_length_change_is_a_diff() {
        let baseline = bullet("T", &["a", "b"]);
        let current = bullet("T", &["a"]);
        let d = diff_slide(&current, &baseline);
        assert_eq!(d.bullets.as_deref(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn test_two_column_diff_per_field() {
        let baseline = Slide::TwoColumn {
            title: "T".into(),
            left: "L".into(),
            right: "R".into(),
        };
        let current = Slide::TwoColumn {
            title: "T".into(),
            left: "L2".into(),
            right: "R".into(),
        };
        let d = diff_slide(&current, &baseline);
        assert_eq!(d.left.as_deref(), Some("L2"));
        assert!(d.title.is_none());
        assert!(d.right.is_none());
    }

    #[test]
    fn test_layout_mismatch_snapshots_current() {
        // Should not happen (layout is immutable), but never under-report.
        let baseline = Slide::Title { title: "T".into() };
        let current = bullet("T", &["a"]);
        let d = diff_slide(&current, &baseline);
        assert_eq!(d.title.as_deref(), Some("T"));
        assert_eq!(d.bullets.as_deref(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn test_apply_empty_diff_is_noop() {
        let mut deck = vec![bullet("T", &["a"])];
        let before = deck.clone();
        assert!(!apply_to_deck(&mut deck, 0, &SlideDiff::default()));
        assert_eq!(deck, before);
    }

    #[test]
    fn test_apply_merges_rather_than_replaces() {
        let mut deck = vec![bullet("T", &["a", "b"])];
        let d = SlideDiff {
            title: Some("T2".into()),
            ..Default::default()
        };
        assert!(apply_to_deck(&mut deck, 0, &d));
        // Bullets untouched by a title-only diff.
        assert_eq!(deck[0], bullet("T2", &["a", "b"]));
    }

    #[test]
    fn test_apply_out_of_range_index() {
        let mut deck = vec![bullet("T", &[])];
        let d = SlideDiff {
            title: Some("X".into()),
            ..Default::default()
        };
        assert!(!apply_to_deck(&mut deck, 5, &d));
    }

    #[test]
    fn test_section_diff_and_merge() {
        let baseline = Section {
            id: 3,
            title: "Intro".into(),
            content: "old".into(),
            order_index: 1,
        };
        let mut current = baseline.clone();
        current.content = "new text".into();

        let d = diff_section(&current, &baseline);
        assert_eq!(d.content.as_deref(), Some("new text"));
        assert!(d.title.is_none());

        let mut sections = vec![baseline];
        assert!(apply_to_sections(&mut sections, 3, &d));
        assert_eq!(sections[0].content, "new text");
        assert_eq!(sections[0].title, "Intro");

        // Unknown section id is a no-op.
        assert!(!apply_to_sections(&mut sections, 99, &d));
    }
}
