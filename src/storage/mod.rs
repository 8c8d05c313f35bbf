use crate::models::{ProjectKind, RecentProject, UserInfo};
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "aidoc_token";
pub(crate) const USER_KEY: &str = "aidoc_user";

/// Local-only dashboard recents.
pub(crate) const RECENT_PROJECTS_KEY: &str = "aidoc_recent_projects";

pub(crate) fn save_user_to_storage(user: &UserInfo) {
    if let Ok(json) = serde_json::to_string(user) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.set_item(USER_KEY, &json);
        }
    }
}

pub(crate) fn load_user_from_storage() -> Option<UserInfo> {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        if let Ok(Some(json)) = storage.get_item(USER_KEY) {
            return serde_json::from_str(&json).ok();
        }
    }
    None
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    if items.len() > max {
        items.truncate(max);
    }
    items
}

pub(crate) fn load_recent_projects() -> Vec<RecentProject> {
    load_json_from_storage::<Vec<RecentProject>>(RECENT_PROJECTS_KEY).unwrap_or_default()
}

pub(crate) fn write_recent_project(kind: ProjectKind, id: &str, title: &str) {
    if id.trim().is_empty() {
        return;
    }

    let item = RecentProject {
        kind,
        id: id.to_string(),
        title: title.to_string(),
        last_opened_ms: now_ms(),
    };

    let next = upsert_lru_by_key(
        load_recent_projects(),
        item,
        |a, b| a.kind == b.kind && a.id == b.id,
        12,
    );
    save_json_to_storage(RECENT_PROJECTS_KEY, &next);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_moves_existing_key_to_front() {
        let items = vec![("a", 1), ("b", 2), ("c", 3)];
        let next = upsert_lru_by_key(items, ("b", 9), |x, y| x.0 == y.0, 10);
        assert_eq!(next, vec![("b", 9), ("a", 1), ("c", 3)]);
    }

    #[test]
    fn test_lru_truncates_at_max() {
        let items = vec![("a", 1), ("b", 2)];
        let next = upsert_lru_by_key(items, ("c", 3), |x, y| x.0 == y.0, 2);
        assert_eq!(next, vec![("c", 3), ("a", 1)]);
    }
}

// WASM-only tests (run with wasm-bindgen-test-runner in a browser).
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_recent_projects_roundtrip() {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.remove_item(RECENT_PROJECTS_KEY);
        }

        write_recent_project(ProjectKind::Presentation, "p-1", "Deck");
        write_recent_project(ProjectKind::Document, "d-1", "Report");

        let recents = load_recent_projects();
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0].id, "d-1");
        assert_eq!(recents[1].id, "p-1");
    }

    #[wasm_bindgen_test]
    fn test_user_storage_roundtrip() {
        let user = UserInfo {
            extra: serde_json::json!({"id": 1, "email": "u@example.com"}),
        };
        save_user_to_storage(&user);
        let loaded = load_user_from_storage().expect("should load user from localStorage");
        assert_eq!(loaded.email(), Some("u@example.com"));
    }
}
