//! Static catalog of presentation design themes. The backend applies the
//! actual colors/fonts; the client only sends the selected `theme_id`.

pub(crate) struct ThemeMeta {
    pub name: &'static str,
    pub theme_id: &'static str,
    pub thumb: &'static str,
    pub preview: &'static str,
}

pub(crate) const PPT_THEMES: &[ThemeMeta] = &[
    ThemeMeta {
        name: "Bright Orange Modern",
        theme_id: "ppt1",
        thumb: "/themes/img1.png",
        preview: "/themes/img1.png",
    },
    ThemeMeta {
        name: "Deep Blue Minimal",
        theme_id: "ppt2",
        thumb: "/themes/img2.png",
        preview: "/themes/img2.png",
    },
    ThemeMeta {
        name: "Dark Gradient Tech",
        theme_id: "ppt3",
        thumb: "/themes/img3.png",
        preview: "/themes/img3.png",
    },
    ThemeMeta {
        name: "Purple Startup Pitch",
        theme_id: "ppt4",
        thumb: "/themes/img4.png",
        preview: "/themes/img4.png",
    },
    ThemeMeta {
        name: "Cyber Neon Black",
        theme_id: "ppt5",
        thumb: "/themes/img5.png",
        preview: "/themes/img5.png",
    },
    ThemeMeta {
        name: "Soft Pastel Clean",
        theme_id: "ppt6",
        thumb: "/themes/img6.png",
        preview: "/themes/img6.png",
    },
    ThemeMeta {
        name: "Tall Gradient Modern",
        theme_id: "ppt7",
        thumb: "/themes/img7.png",
        preview: "/themes/img7.png",
    },
    ThemeMeta {
        name: "Futuristic Steel Pro",
        theme_id: "ppt8",
        thumb: "/themes/img8.png",
        preview: "/themes/img8.png",
    },
    ThemeMeta {
        name: "Orange & White Corporate",
        theme_id: "ppt9",
        thumb: "/themes/img9.png",
        preview: "/themes/img9.png",
    },
];

pub(crate) fn find_theme(theme_id: &str) -> Option<&'static ThemeMeta> {
    PPT_THEMES.iter().find(|t| t.theme_id == theme_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_ids_are_unique() {
        for (i, a) in PPT_THEMES.iter().enumerate() {
            for b in PPT_THEMES.iter().skip(i + 1) {
                assert_ne!(a.theme_id, b.theme_id);
            }
        }
    }

    #[test]
    fn test_find_theme() {
        assert_eq!(find_theme("ppt3").map(|t| t.name), Some("Dark Gradient Tech"));
        assert!(find_theme("nope").is_none());
    }
}
