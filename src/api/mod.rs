use crate::diff::{SectionDiff, SlideDiff};
use crate::models::{Presentation, UserInfo, WordProject};
use crate::storage::{TOKEN_KEY, USER_KEY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    /// Another writer updated the item since our baseline (If-Match failed).
    Conflict,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn conflict(body: String) -> Self {
        Self {
            kind: ApiErrorKind::Conflict,
            message: if body.trim().is_empty() {
                "Edited elsewhere".to_string()
            } else {
                body
            },
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn from_status(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        match status.as_u16() {
            401 => Self::unauthorized(),
            409 | 412 => Self::conflict(body),
            _ => Self::http(status, body, ctx),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Decode a 2xx response body. Write endpoints may answer with no body at
/// all (200/204); an empty body decodes as JSON `null` so `Value`-typed
/// callers see success instead of a parse error.
fn decode_success<T: serde::de::DeserializeOwned>(body: &str) -> ApiResult<T> {
    if body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null).map_err(ApiError::parse)
    } else {
        serde_json::from_str(body).map_err(ApiError::parse)
    }
}

/// Deploy-time configuration injected through `window.ENV` by the hosting
/// page. `API_URL` covers the versioned API; auth endpoints live at the
/// server root (`AUTH_URL`).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub auth_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self {
            api_url: read_env_str("API_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8000/api/v1".to_string()),
            auth_url: read_env_str("AUTH_URL").unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env_str(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let env = window.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    js_sys::Reflect::get(&env, &key.into())
        .ok()
        .and_then(|v| v.as_string())
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreatePresentationRequest {
    pub topic: String,
    pub num_slides: u32,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct ConfigurePresentationRequest {
    pub theme_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_used: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct SectionSeed {
    pub title: String,
    pub order_index: u32,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateDocumentRequest {
    pub title: String,
    pub topic: String,

    /// Always "docx" for now; the backend reserves the field for other
    /// output formats.
    pub doc_type: String,

    pub num_pages: u32,
    pub sections: Vec<SectionSeed>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct RefineSectionRequest {
    pub prompt: String,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) auth_base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[allow(dead_code)]
    pub fn new(base_url: String, auth_base_url: String) -> Self {
        Self {
            base_url,
            auth_base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let env = EnvConfig::new();
        let token = leptos::web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

        Self {
            base_url: env.api_url,
            auth_base_url: env.auth_url,
            token,
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn get_auth_token(&self) -> Option<String> {
        self.token.clone()
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<&impl serde::Serialize>,
        if_match: Option<&str>,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let mut req = client.request(method, url);
        req = Self::with_auth_headers(req, self.get_auth_token());

        if let Some(rev) = if_match {
            req = req.header("If-Match", rev);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            let body = res.text().await.map_err(ApiError::network)?;
            decode_success(&body)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, body, "Request failed"))
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth(&self, path: &str) -> String {
        format!("{}{}", self.auth_base_url, path)
    }

    // ---- auth (server root, outside /api/v1) ----

    /// FastAPI-style JWT login: form-encoded, returns `access_token`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let client = reqwest::Client::new();
        let res = client
            .post(self.auth("/auth/jwt/login"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, body, "Login failed"))
        }
    }

    /// Registration success may come back as 201 with or without a body.

    pub async fn register(&self, email: &str, password: &str) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let res = client
            .post(self.auth("/auth/register"))
            .json(&RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            decode_success(&body)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, body, "Registration failed"))
        }
    }

    pub async fn me(&self) -> ApiResult<UserInfo> {
        self.request_api(
            reqwest::Method::GET,
            self.auth("/users/me"),
            None::<&()>,
            None,
        )
        .await
    }

    // ---- presentations ----

    pub async fn create_presentation(&self, topic: &str, num_slides: u32) -> ApiResult<Presentation> {
        self.request_api(
            reqwest::Method::POST,
            self.api("/presentations/"),
            Some(&CreatePresentationRequest {
                topic: topic.to_string(),
                num_slides,
            }),
            None,
        )
        .await
    }

    pub async fn get_presentation(&self, presentation_id: &str) -> ApiResult<Presentation> {
        self.request_api(
            reqwest::Method::GET,
            self.api(&format!("/presentations/{presentation_id}")),
            None::<&()>,
            None,
        )
        .await
    }

    /// Persist a non-empty slide diff. The body carries only changed fields;
    /// `revision` (when the server provides one) is sent as If-Match so a
    /// concurrent writer surfaces as a conflict instead of a silent
    /// overwrite.
    pub async fn update_slide(
        &self,
        presentation_id: &str,
        slide_index: usize,
        diff: &SlideDiff,
        revision: Option<&str>,
    ) -> ApiResult<serde_json::Value> {
        self.request_api(
            reqwest::Method::PUT,
            self.api(&format!("/presentations/{presentation_id}/slides/{slide_index}")),
            Some(diff),
            revision,
        )
        .await
    }

    pub async fn configure_presentation(
        &self,
        presentation_id: &str,
        theme_id: &str,
        preview_used: Option<String>,
    ) -> ApiResult<serde_json::Value> {
        self.request_api(
            reqwest::Method::POST,
            self.api(&format!("/presentations/{presentation_id}/configure")),
            Some(&ConfigurePresentationRequest {
                theme_id: theme_id.to_string(),
                preview_used,
            }),
            None,
        )
        .await
    }

    pub fn presentation_download_url(&self, presentation_id: &str) -> String {
        self.api(&format!("/presentations/{presentation_id}/download"))
    }

    // ---- documents ----

    pub async fn create_document(&self, req: CreateDocumentRequest) -> ApiResult<WordProject> {
        self.request_api(
            reqwest::Method::POST,
            self.api("/documents/"),
            Some(&req),
            None,
        )
        .await
    }

    pub async fn get_document(&self, document_id: &str) -> ApiResult<WordProject> {
        self.request_api(
            reqwest::Method::GET,
            self.api(&format!("/documents/{document_id}")),
            None::<&()>,
            None,
        )
        .await
    }

    pub async fn update_section(
        &self,
        document_id: &str,
        section_id: i64,
        diff: &SectionDiff,
        revision: Option<&str>,
    ) -> ApiResult<serde_json::Value> {
        self.request_api(
            reqwest::Method::PUT,
            self.api(&format!("/documents/{document_id}/sections/{section_id}")),
            Some(diff),
            revision,
        )
        .await
    }

    pub async fn refine_section(
        &self,
        document_id: &str,
        section_id: i64,
        prompt: &str,
    ) -> ApiResult<serde_json::Value> {
        self.request_api(
            reqwest::Method::POST,
            self.api(&format!("/documents/{document_id}/sections/{section_id}/refine")),
            Some(&RefineSectionRequest {
                prompt: if prompt.trim().is_empty() {
                    "Improve clarity and structure.".to_string()
                } else {
                    prompt.to_string()
                },
            }),
            None,
        )
        .await
    }

    pub fn document_export_url(&self, document_id: &str) -> String {
        self.api(&format!("/documents/{document_id}/export"))
    }

    // ---- dashboard ----

    /// Item shapes vary by kind; callers pick fields defensively.
    pub async fn dashboard_items(&self) -> ApiResult<Vec<serde_json::Value>> {
        let data: serde_json::Value = self
            .request_api(
                reqwest::Method::GET,
                self.api("/dashboard/items"),
                None::<&()>,
                None,
            )
            .await?;

        Ok(data
            .as_array()
            .cloned()
            .or_else(|| data.get("items").and_then(|v| v.as_array()).cloned())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(
            "http://127.0.0.1:8000/api/v1".to_string(),
            "http://127.0.0.1:8000".to_string(),
        )
    }

    #[test]
    fn test_error_mapping_from_status() {
        let e = ApiError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            String::new(),
            "Request failed",
        );
        assert_eq!(e.kind, ApiErrorKind::Unauthorized);

        let e = ApiError::from_status(
            reqwest::StatusCode::PRECONDITION_FAILED,
            String::new(),
            "Request failed",
        );
        assert_eq!(e.kind, ApiErrorKind::Conflict);
        assert_eq!(e.message, "Edited elsewhere");

        let e = ApiError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
            "Request failed",
        );
        assert_eq!(e.kind, ApiErrorKind::Http);
        assert!(e.message.contains("boom"));
    }

    #[test]
    fn test_per_item_resource_paths() {
        let c = client();
        assert_eq!(
            c.api("/presentations/p-1/slides/3"),
            "http://127.0.0.1:8000/api/v1/presentations/p-1/slides/3"
        );
        assert_eq!(
            c.presentation_download_url("p-1"),
            "http://127.0.0.1:8000/api/v1/presentations/p-1/download"
        );
        assert_eq!(
            c.document_export_url("d-2"),
            "http://127.0.0.1:8000/api/v1/documents/d-2/export"
        );
        assert_eq!(c.auth("/users/me"), "http://127.0.0.1:8000/users/me");
    }

    #[test]
    fn test_create_document_request_serialization() {
        let req = CreateDocumentRequest {
            title: "Report".into(),
            topic: "Q3".into(),
            doc_type: "docx".into(),
            num_pages: 2,
            sections: vec![SectionSeed {
                title: "Intro".into(),
                order_index: 1,
            }],
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["doc_type"], "docx");
        assert_eq!(v["sections"][0]["order_index"], 1);
    }

    #[test]
    fn test_configure_request_omits_missing_preview() {
        let req = ConfigurePresentationRequest {
            theme_id: "ppt3".into(),
            preview_used: None,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["theme_id"], "ppt3");
        assert!(v.get("preview_used").is_none());
    }

    #[test]
    fn test_write_success_without_body_is_not_an_error() {
        // Item writes can be acknowledged with a bare 200/204.
        let v: serde_json::Value = decode_success("").expect("empty 2xx body should decode");
        assert!(v.is_null());

        let v: serde_json::Value = decode_success(" \n ").expect("whitespace body should decode");
        assert!(v.is_null());

        let v: serde_json::Value =
            decode_success(r#"{"ok":true}"#).expect("json body should decode");
        assert_eq!(v["ok"], true);
    }

    #[test]
    fn test_typed_response_still_requires_a_body() {
        let e = decode_success::<LoginResponse>("").expect_err("login needs a token body");
        assert_eq!(e.kind, ApiErrorKind::Parse);

        let ok: LoginResponse =
            decode_success(r#"{"access_token":"jwt"}"#).expect("token body should decode");
        assert_eq!(ok.access_token, "jwt");
    }

    #[test]
    fn test_client_auth_state() {
        let mut c = client();
        assert!(!c.is_authenticated());
        c.set_token("jwt".to_string());
        assert!(c.is_authenticated());
        assert_eq!(c.get_auth_token().as_deref(), Some("jwt"));
    }
}
