//! Error types for the request engine.
//!
//! # Design
//! Every failure the engine detects ends up as the terminal `Failed` outcome
//! of a `RequestHandle`, so `HubError` carries the request's method and URL
//! wherever one exists. The status variant renders as
//! `ERR <METHOD> "<url>": bad status: <code>` so a log line alone identifies
//! the call. Cancellation is not an error; it is its own outcome. A response
//! whose payload says `success: false` is not an error either; it decodes
//! normally and the caller inspects it.

use crate::http::HttpMethod;

/// Terminal failure of a dispatched request.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// DNS, connect, TLS, timeout or body-read failure. Never retried.
    #[error("ERR {method} {url:?}: {source}")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("ERR {method} {url:?}: bad status: {status}")]
    Status {
        method: HttpMethod,
        url: String,
        status: u16,
    },

    /// The body did not match what the chosen decoder expects.
    #[error("ERR {method} {url:?}: {source}")]
    Decode {
        method: HttpMethod,
        url: String,
        #[source]
        source: DecodeError,
    },

    /// The worker went away without delivering anything (it panicked).
    #[error("ERR {method} {url:?}: worker exited without a result")]
    WorkerLost { method: HttpMethod, url: String },

    #[error("failed to spawn request worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl HubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A response body rejected by a `Decoder`.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed form encoding: {0}")]
    Form(String),
}

/// Failure inverting the login payload encoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ciphertext length {0} is not a multiple of the block size")]
    Unaligned(usize),

    #[error("plaintext is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_method_and_url() {
        let err = HubError::Status {
            method: HttpMethod::Get,
            url: "http://localhost/levels_get.php".to_string(),
            status: 500,
        };
        assert_eq!(
            err.to_string(),
            r#"ERR GET "http://localhost/levels_get.php": bad status: 500"#
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn decode_error_keeps_its_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = HubError::Decode {
            method: HttpMethod::Post,
            url: "http://h/login.php".to_string(),
            source: DecodeError::Json(json_err),
        };
        let msg = err.to_string();
        assert!(msg.starts_with(r#"ERR POST "http://h/login.php": invalid json"#), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status(), None);
    }
}
