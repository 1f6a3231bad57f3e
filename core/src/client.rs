//! Named operations against the level hub.
//!
//! # Design
//! Each operation comes in two halves. `build_*` produces the `HttpRequest`
//! and never touches the network, so the exact wire shape is unit-testable.
//! The dispatching method pairs that request with the right decoder and hands
//! both to the `Dispatcher`. Nothing here blocks.
//!
//! Form bodies list their keys in sorted order, which is what the hub's own
//! client sends.

use crate::codec;
use crate::config::HubConfig;
use crate::decode::{Form, FormValues, Json, Text};
use crate::dispatch::Dispatcher;
use crate::handle::RequestHandle;
use crate::http::{encode_form, HttpRequest};
use crate::session::Session;
use crate::types::{Credentials, DeleteLevelResponse, LevelsResponse, LoginPayload, LoginResponse};

/// Client for the level hub. Cheap to clone; clones share the connection
/// pool and the session.
#[derive(Debug, Clone)]
pub struct HubClient {
    config: HubConfig,
    dispatcher: Dispatcher,
    session: Session,
}

impl HubClient {
    pub fn new(config: HubConfig) -> Self {
        Self::with_session(config, Session::new())
    }

    /// Use a session owned by the host.
    pub fn with_session(config: HubConfig, session: Session) -> Self {
        let dispatcher = Dispatcher::from_config(&config);
        Self {
            config,
            dispatcher,
            session,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base())
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, serde_json::Error> {
        let payload = LoginPayload::new(credentials, &self.config.build);
        let plaintext = serde_json::to_string(&payload)?;
        let i = codec::encode_payload(&plaintext);
        let body = encode_form([("build", self.config.build.as_str()), ("i", i.as_str())]);
        Ok(HttpRequest::post_form(self.endpoint("login.php"), body)
            .with_leading_header("referer", &self.config.referer))
    }

    pub fn build_list_levels(&self) -> HttpRequest {
        HttpRequest::get(self.endpoint("levels_get.php"))
    }

    /// `id` and `version` go into the URL as given; they must be URL-safe
    /// (hub-assigned ids and versions are plain digits).
    pub fn build_fetch_level(&self, id: &str, version: &str) -> HttpRequest {
        HttpRequest::get(self.endpoint(&format!("levels/{id}.txt?version={version}")))
    }

    /// `data` is an already form-encoded level submission and is sent as is.
    pub fn build_upload_level(&self, data: &str) -> HttpRequest {
        HttpRequest::post_form(self.endpoint("upload_level.php"), data)
    }

    pub fn build_delete_level(&self, id: &str, token: &str) -> HttpRequest {
        let body = encode_form([("level_id", id), ("token", token)]);
        HttpRequest::post_form(self.endpoint("delete_level.php"), body)
            .with_leading_header("referer", &self.config.referer)
    }

    /// Log in. A reply with `success: true` also updates the session.
    pub fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<RequestHandle<LoginResponse>, serde_json::Error> {
        let request = self.build_login(credentials)?;
        let session = self.session.clone();
        let user_name = credentials.user.clone();
        Ok(self
            .dispatcher
            .dispatch_then(request, Json, move |response: &LoginResponse| {
                session.record(&user_name, response)
            }))
    }

    pub fn list_levels(&self) -> RequestHandle<LevelsResponse> {
        self.dispatcher.dispatch(self.build_list_levels(), Json)
    }

    /// Level files are opaque text; they are not escaped well enough to parse
    /// as a form.
    pub fn fetch_level(&self, id: &str, version: &str) -> RequestHandle<String> {
        self.dispatcher.dispatch(self.build_fetch_level(id, version), Text)
    }

    pub fn upload_level(&self, data: &str) -> RequestHandle<FormValues> {
        self.dispatcher.dispatch(self.build_upload_level(data), Form)
    }

    pub fn delete_level(&self, id: &str, token: &str) -> RequestHandle<DeleteLevelResponse> {
        self.dispatcher.dispatch(self.build_delete_level(id, token), Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use crate::http::{HttpMethod, FORM_CONTENT_TYPE};

    fn client() -> HubClient {
        HubClient::new(HubConfig::with_base_url("http://localhost:3000"))
    }

    #[test]
    fn build_list_levels_produces_correct_request() {
        let req = client().build_list_levels();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/levels_get.php");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_fetch_level_uses_txt_path_and_version() {
        let req = client().build_fetch_level("6001", "4");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/levels/6001.txt?version=4");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_fetch_level_interpolates_id_unescaped() {
        let req = client().build_fetch_level("60 01", "a&b");
        assert_eq!(req.url, "http://localhost:3000/levels/60 01.txt?version=a&b");
    }

    #[test]
    fn build_upload_level_sends_body_verbatim() {
        let data = "title=My+Level&data=m3%60a&live=1";
        let req = client().build_upload_level(data);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/upload_level.php");
        assert_eq!(req.body.as_deref(), Some(data));
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert!(req.header("referer").is_none());
    }

    #[test]
    fn build_delete_level_sends_id_and_token() {
        let req = client().build_delete_level("6001", "abc");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/delete_level.php");
        assert_eq!(req.body.as_deref(), Some("level_id=6001&token=abc"));
        assert_eq!(req.header("referer"), Some("https://pr2hub.com/"));
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn build_login_encrypts_payload() {
        let req = client()
            .build_login(&Credentials::new("alice", "secret", false))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/login.php");
        assert_eq!(req.header("referer"), Some("https://pr2hub.com/"));
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));

        let form = decode::form(req.body.as_deref().unwrap().as_bytes()).unwrap();
        assert_eq!(form.get("build"), Some("22-jun-2020-v160"));
        let i = form.get("i").unwrap();
        assert!(!i.ends_with('='));

        let plaintext = codec::decode_payload(i).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&plaintext).unwrap();
        assert_eq!(doc["user_name"], "alice");
        assert_eq!(doc["user_pass"], "secret");
        assert_eq!(doc["remember"], false);
        assert_eq!(doc["build"], "22-jun-2020-v160");
        assert_eq!(doc["server"]["server_name"], "Derron");
    }

    #[test]
    fn build_login_follows_configured_build_and_referer() {
        let config = HubConfig {
            base_url: "http://hub.test".to_string(),
            referer: "http://hub.test/".to_string(),
            build: "dev-build".to_string(),
            timeout_ms: None,
        };
        let req = HubClient::new(config)
            .build_login(&Credentials::new("bob", "pw", true))
            .unwrap();
        assert_eq!(req.header("referer"), Some("http://hub.test/"));
        let form = decode::form(req.body.as_deref().unwrap().as_bytes()).unwrap();
        assert_eq!(form.get("build"), Some("dev-build"));
        let doc: serde_json::Value =
            serde_json::from_str(&codec::decode_payload(form.get("i").unwrap()).unwrap()).unwrap();
        assert_eq!(doc["build"], "dev-build");
        assert_eq!(doc["remember"], true);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = HubClient::new(HubConfig::with_base_url("http://localhost:3000/"));
        let req = client.build_list_levels();
        assert_eq!(req.url, "http://localhost:3000/levels_get.php");
    }
}
