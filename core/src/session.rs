//! Authenticated session context.
//!
//! A `Session` is owned by the host and shared (by cloning) with the
//! `HubClient`. A login worker records the account here when the hub answers
//! `success: true`. The lock only keeps the write memory-safe. Two logins in
//! flight at once race, and whichever worker finishes last wins.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::types::LoginResponse;

/// The account a successful login established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_name: String,
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<SessionInfo>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<SessionInfo> {
        self.inner.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|s| s.token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Store the account from a login reply. Replies with `success: false`
    /// leave the session untouched.
    pub(crate) fn record(&self, user_name: &str, response: &LoginResponse) {
        if !response.success {
            return;
        }
        info!(user_id = response.user_id, "session established");
        *self.inner.write() = Some(SessionInfo {
            user_name: user_name.to_string(),
            user_id: response.user_id,
            token: response.token.clone(),
        });
    }
}
