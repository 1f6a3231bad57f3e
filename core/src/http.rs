//! HTTP request descriptors handed to the dispatcher.
//!
//! # Design
//! A named operation describes its request as plain data: method, absolute
//! URL, headers and an optional pre-encoded body. Building is pure and never
//! touches the network, so every operation's wire shape can be asserted in
//! unit tests without a server. The `Dispatcher` is the only place that turns
//! an `HttpRequest` into socket I/O.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `HubClient::build_*` methods and consumed by
/// `Dispatcher::dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A `POST` carrying an `application/x-www-form-urlencoded` body.
    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![(
                "content-type".to_string(),
                FORM_CONTENT_TYPE.to_string(),
            )],
            body: Some(body.into()),
        }
    }

    /// Insert a header ahead of the existing ones.
    pub fn with_leading_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(0, (name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Serialize `pairs` as a form body, keys in the order given.
pub fn encode_form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_displays_upper_case() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Get.as_str(), "GET");
    }

    #[test]
    fn post_form_sets_content_type() {
        let req = HttpRequest::post_form("http://h/x", "a=1");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("Content-Type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(req.body.as_deref(), Some("a=1"));
    }

    #[test]
    fn leading_header_goes_first() {
        let req = HttpRequest::post_form("http://h/x", "").with_leading_header("referer", "r");
        assert_eq!(req.headers[0], ("referer".to_string(), "r".to_string()));
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn encode_form_escapes_reserved_characters() {
        let body = encode_form([("level_id", "7"), ("token", "a b/+&")]);
        assert_eq!(body, "level_id=7&token=a+b%2F%2B%26");
    }
}
