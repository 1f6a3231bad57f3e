//! Client configuration.
//!
//! Loaded from JSON by the host (file IO is the host's business). Every field
//! has a default pointing at the live hub, so `{}` is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Build identifier sent with every login.
pub const BUILD: &str = "22-jun-2020-v160";

/// `Referer` the hub insists on for login and delete.
pub const REFERER: &str = "https://pr2hub.com/";

pub const DEFAULT_BASE_URL: &str = "https://pr2hub.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Scheme and host of the hub, e.g. `https://pr2hub.com`.
    pub base_url: String,
    pub referer: String,
    pub build: String,
    /// Global per-request timeout. `None` leaves requests unbounded.
    pub timeout_ms: Option<u64>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: REFERER.to_string(),
            build: BUILD.to_string(),
            timeout_ms: None,
        }
    }
}

impl HubConfig {
    /// Defaults aimed at another host, such as a local mock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// `base_url` without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
