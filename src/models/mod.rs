use serde::{Deserialize, Serialize};

/// Backend user object (`GET /users/me`).
///
/// Kept flexible to avoid breaking when backend fields evolve.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UserInfo {
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl UserInfo {
    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(|v| v.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum SlideLayout {
    Bullet,
    TwoColumn,
    Image,
    Title,
    Custom,
}

/// One slide of a generated presentation.
///
/// The backend duck-types slide payloads on a `layout` discriminator; we model
/// that as a tagged union so every layout is handled exhaustively at the
/// diff/render boundary. The layout is assigned at generation time and never
/// changes afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub(crate) enum Slide {
    Bullet {
        #[serde(default)]
        title: String,
        #[serde(default)]
        bullets: Vec<String>,
    },
    TwoColumn {
        #[serde(default)]
        title: String,
        #[serde(default)]
        left: String,
        #[serde(default)]
        right: String,
    },
    Image {
        #[serde(default)]
        title: String,
        #[serde(default)]
        image_url: String,
        #[serde(default)]
        caption: String,
    },
    Title {
        #[serde(default)]
        title: String,
    },
    // Free-form layouts the backend may emit; extra fields ride along opaquely.
    Custom {
        #[serde(default)]
        title: String,
        #[serde(flatten)]
        extra: serde_json::Value,
    },
}

impl Slide {
    pub fn layout(&self) -> SlideLayout {
        match self {
            Slide::Bullet { .. } => SlideLayout::Bullet,
            Slide::TwoColumn { .. } => SlideLayout::TwoColumn,
            Slide::Image { .. } => SlideLayout::Image,
            Slide::Title { .. } => SlideLayout::Title,
            Slide::Custom { .. } => SlideLayout::Custom,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Slide::Bullet { title, .. }
            | Slide::TwoColumn { title, .. }
            | Slide::Image { title, .. }
            | Slide::Title { title }
            | Slide::Custom { title, .. } => title,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Presentation {
    pub presentation_id: String,

    #[serde(default)]
    pub topic: String,

    /// Slides in deck order. The index within this vec is the slide id used
    /// by the per-slide update endpoint.
    #[serde(default)]
    pub content: Vec<Slide>,

    #[serde(default)]
    pub theme_id: Option<String>,

    /// Opaque revision echoed back via If-Match on slide writes so the
    /// backend can reject writes from a stale tab.
    #[serde(default)]
    pub revision: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Section {
    pub id: i64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct WordProject {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub num_pages: u32,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub revision: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ProjectKind {
    Presentation,
    Document,
}

/// Local-only LRU entry for the dashboard "recently opened" list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecentProject {
    pub kind: ProjectKind,
    pub id: String,
    pub title: String,
    pub last_opened_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_tag_round_trip_per_layout() {
        let json = r#"{"layout":"bullet","title":"Intro","bullets":["a","b"]}"#;
        let s: Slide = serde_json::from_str(json).expect("bullet slide should parse");
        assert_eq!(s.layout(), SlideLayout::Bullet);
        assert_eq!(s.title(), "Intro");

        let json = r#"{"layout":"two_column","title":"T","left":"L","right":"R"}"#;
        let s: Slide = serde_json::from_str(json).expect("two_column slide should parse");
        assert_eq!(s.layout(), SlideLayout::TwoColumn);

        let json = r#"{"layout":"image","title":"T","image_url":"/x.png","caption":"c"}"#;
        let s: Slide = serde_json::from_str(json).expect("image slide should parse");
        assert_eq!(s.layout(), SlideLayout::Image);

        let json = r#"{"layout":"title","title":"Cover"}"#;
        let s: Slide = serde_json::from_str(json).expect("title slide should parse");
        assert_eq!(s.layout(), SlideLayout::Title);
    }

    #[test]
    fn test_slide_missing_fields_default() {
        // Generation sometimes omits fields entirely; they default to empty.
        let s: Slide = serde_json::from_str(r#"{"layout":"bullet"}"#).expect("should parse");
        assert_eq!(
            s,
            Slide::Bullet {
                title: String::new(),
                bullets: vec![],
            }
        );
    }

    #[test]
    fn test_custom_slide_keeps_unknown_fields() {
        let json = r#"{"layout":"custom","title":"X","chart":{"kind":"bar"}}"#;
        let s: Slide = serde_json::from_str(json).expect("custom slide should parse");
        let Slide::Custom { title, extra } = &s else {
            panic!("expected custom layout");
        };
        assert_eq!(title, "X");
        assert_eq!(extra["chart"]["kind"], "bar");

        // Round-trips with the discriminator restored.
        let v = serde_json::to_value(&s).expect("should serialize");
        assert_eq!(v["layout"], "custom");
        assert_eq!(v["chart"]["kind"], "bar");
    }

    #[test]
    fn test_layout_label() {
        assert_eq!(SlideLayout::TwoColumn.to_string(), "two_column");
        assert_eq!(SlideLayout::Bullet.as_ref(), "bullet");
    }

    #[test]
    fn test_presentation_contract_deserialize() {
        let json = r#"{
            "presentation_id": "p-1",
            "topic": "AI for students",
            "content": [
                {"layout": "title", "title": "AI for students"},
                {"layout": "bullet", "title": "Why", "bullets": ["fast", "cheap"]}
            ]
        }"#;
        let p: Presentation = serde_json::from_str(json).expect("presentation should parse");
        assert_eq!(p.presentation_id, "p-1");
        assert_eq!(p.content.len(), 2);
        assert!(p.revision.is_none());
    }

    #[test]
    fn test_word_project_contract_deserialize() {
        let json = r#"{
            "id": "d-9",
            "title": "Report",
            "topic": "Q3",
            "num_pages": 2,
            "sections": [{"id": 1, "title": "Intro", "content": "...", "order_index": 1}]
        }"#;
        let d: WordProject = serde_json::from_str(json).expect("document should parse");
        assert_eq!(d.sections.len(), 1);
        assert_eq!(d.sections[0].order_index, 1);
    }
}
