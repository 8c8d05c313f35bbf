use crate::models::Slide;

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Placeholder shown for image slides the generator returned without an
/// `image_url`. Served from the app's public assets.
pub(crate) const SAMPLE_IMAGE_PATH: &str = "/img/sample-slide.png";

/// Generation sometimes emits image slides with no `image_url`. Backfill a
/// placeholder so the editor always has something to render.
pub(crate) fn ensure_image_fallbacks(slides: &mut [Slide]) {
    for s in slides.iter_mut() {
        if let Slide::Image { image_url, .. } = s {
            if image_url.trim().is_empty() {
                *image_url = SAMPLE_IMAGE_PATH.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_fallback_only_fills_empty_urls() {
        let mut slides = vec![
            Slide::Image {
                title: "A".into(),
                image_url: String::new(),
                caption: String::new(),
            },
            Slide::Image {
                title: "B".into(),
                image_url: "/real.png".into(),
                caption: String::new(),
            },
            Slide::Title { title: "C".into() },
        ];

        ensure_image_fallbacks(&mut slides);

        let Slide::Image { image_url, .. } = &slides[0] else {
            panic!("expected image slide");
        };
        assert_eq!(image_url, SAMPLE_IMAGE_PATH);

        let Slide::Image { image_url, .. } = &slides[1] else {
            panic!("expected image slide");
        };
        assert_eq!(image_url, "/real.png");
    }
}
