//! Runs requests on worker threads.
//!
//! # Design
//! `dispatch` spawns one OS thread per request and returns its
//! `RequestHandle` right away. The worker makes a single blocking call
//! through a shared `ureq::Agent`, checks the status, runs the body through
//! the decoder and hands exactly one result to the completer. There are no
//! retries. The only time bound is the agent's optional global timeout.
//!
//! The agent is built with `http_status_as_error(false)` so 4xx/5xx replies
//! come back as data and the status check lives here, where it can be
//! wrapped with the method and URL.
//!
//! Nothing bounds the number of workers; callers decide how many requests
//! they keep in flight. Response bodies are read in full with no size cap.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::HubConfig;
use crate::decode::Decoder;
use crate::error::HubError;
use crate::handle::{self, Completer, RequestHandle};
use crate::http::{HttpMethod, HttpRequest};

#[derive(Clone)]
pub struct Dispatcher {
    agent: ureq::Agent,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.timeout())
    }

    /// Start `request` on a new worker thread.
    pub fn dispatch<T, D>(&self, request: HttpRequest, decoder: D) -> RequestHandle<T>
    where
        T: Send + 'static,
        D: Decoder<T>,
    {
        self.dispatch_then(request, decoder, |_: &T| {})
    }

    /// Like `dispatch`, but the worker calls `on_success` with the decoded
    /// value before delivering it. Decoders stay pure; side effects such as
    /// recording a session go here. The hook runs even if the handle was
    /// cancelled, since the remote call already happened.
    pub fn dispatch_then<T, D, F>(
        &self,
        request: HttpRequest,
        decoder: D,
        on_success: F,
    ) -> RequestHandle<T>
    where
        T: Send + 'static,
        D: Decoder<T>,
        F: FnOnce(&T) + Send + 'static,
    {
        let (completer, mut handle) = handle::pair(request.method, request.url.clone());
        debug!(method = %request.method, url = %request.url, "request begin");

        let agent = self.agent.clone();
        let spawned = thread::Builder::new()
            .name("hub-request".to_string())
            .spawn(move || run(&agent, request, decoder, on_success, completer));

        // The completer went down with the unspawned closure, so the failure
        // is latched on the handle directly.
        if let Err(err) = spawned {
            warn!(method = %handle.method(), url = %handle.url(), error = %err, "failed to spawn request worker");
            handle.latch_failure(HubError::Spawn(err));
        }
        handle
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(None)
    }
}

fn run<T, D, F>(
    agent: &ureq::Agent,
    request: HttpRequest,
    decoder: D,
    on_success: F,
    completer: Completer<T>,
) where
    D: Decoder<T>,
    F: FnOnce(&T),
{
    let method = request.method;
    let url = request.url.clone();

    let result = execute(agent, request).and_then(|body| {
        decoder.decode(&body).map_err(|source| HubError::Decode {
            method,
            url: url.clone(),
            source,
        })
    });

    match &result {
        Ok(value) => {
            debug!(%method, %url, "request succeeded");
            on_success(value);
        }
        Err(err) => warn!(%method, %url, error = %err, "request failed"),
    }
    if completer.is_cancelled() {
        debug!(%method, %url, "request finished after cancel; result discarded");
    }
    completer.complete(result);
}

/// Perform the call and return the raw body of a 2xx response.
fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<Vec<u8>, HubError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let response = match method {
        HttpMethod::Get => with_headers(agent.get(&url), &headers).call(),
        HttpMethod::Post => {
            let builder = with_headers(agent.post(&url), &headers);
            match &body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = response.map_err(|source| transport(method, &url, source))?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        return Err(HubError::Status {
            method,
            url,
            status,
        });
    }

    // ureq caps `read_to_vec` at 10 MiB by default; level files may exceed it.
    response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()
        .map_err(|source| transport(method, &url, source))
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn transport(method: HttpMethod, url: &str, source: ureq::Error) -> HubError {
    HubError::Transport {
        method,
        url: url.to_string(),
        source,
    }
}
