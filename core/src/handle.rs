//! The caller-side handle of an in-flight request.
//!
//! # Design
//! Each dispatched request gets a one-slot channel. The worker holds the
//! [`Completer`], whose `complete` consumes it, so at most one result is ever
//! sent. Dropping the completer closes the channel. The consumer holds the
//! [`RequestHandle`] and calls [`RequestHandle::poll`] once per tick from its
//! update loop.
//!
//! `poll` never blocks. The first terminal outcome it sees (`Ready`,
//! `Failed` or `Cancelled`) is latched in the handle, and every later poll
//! returns that same outcome by reference.
//!
//! Cancellation only changes what this handle reports. The worker is not
//! interrupted, and whatever the remote side already did stays done. Once
//! `cancel` has been called, the next poll latches `Cancelled` unless an
//! outcome was already latched, even if the worker's result is sitting in
//! the channel.
//!
//! `poll` takes `&mut self`, so a handle has exactly one consumer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::HubError;
use crate::http::HttpMethod;

/// Terminal state of a request.
#[derive(Debug)]
pub enum Outcome<T> {
    Ready(T),
    Failed(HubError),
    Cancelled,
}

impl<T> Outcome<T> {
    /// `Ready` as `Ok(Some)`, `Cancelled` as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, HubError> {
        match self {
            Outcome::Ready(value) => Ok(Some(value)),
            Outcome::Failed(err) => Err(err),
            Outcome::Cancelled => Ok(None),
        }
    }
}

/// What a single `poll` observed.
#[derive(Debug)]
pub enum Poll<'a, T> {
    Pending,
    Ready(&'a T),
    Failed(&'a HubError),
    Cancelled,
}

impl<T> Poll<'_, T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Poll::Pending)
    }
}

/// Create a connected completer/handle pair for one request.
pub(crate) fn pair<T>(method: HttpMethod, url: String) -> (Completer<T>, RequestHandle<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let cancelled = Arc::new(AtomicBool::new(false));
    let completer = Completer {
        tx,
        cancelled: Arc::clone(&cancelled),
    };
    let handle = RequestHandle {
        rx,
        cancelled,
        outcome: None,
        method,
        url,
    };
    (completer, handle)
}

/// Worker side of the result slot.
pub(crate) struct Completer<T> {
    tx: Sender<Result<T, HubError>>,
    cancelled: Arc<AtomicBool>,
}

impl<T> Completer<T> {
    /// Deliver the single result and close the channel.
    pub(crate) fn complete(self, result: Result<T, HubError>) {
        // The handle may already be gone; nobody is left to tell.
        let _ = self.tx.send(result);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Caller-held handle for one outstanding request.
pub struct RequestHandle<T> {
    rx: Receiver<Result<T, HubError>>,
    cancelled: Arc<AtomicBool>,
    outcome: Option<Outcome<T>>,
    method: HttpMethod,
    url: String,
}

impl<T> RequestHandle<T> {
    /// Check for completion without blocking.
    pub fn poll(&mut self) -> Poll<'_, T> {
        if self.outcome.is_none() {
            match self.settle() {
                Some(outcome) => self.outcome = Some(outcome),
                None => return Poll::Pending,
            }
        }
        match &self.outcome {
            Some(Outcome::Ready(value)) => Poll::Ready(value),
            Some(Outcome::Failed(err)) => Poll::Failed(err),
            Some(Outcome::Cancelled) => Poll::Cancelled,
            None => Poll::Pending,
        }
    }

    /// Ask for the request to be abandoned. Idempotent; does not stop the
    /// worker or undo anything the server already did.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether an outcome has been latched by a previous poll.
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Poll once more and give up the handle, returning the latched outcome
    /// or `None` if the request is still pending.
    pub fn into_outcome(mut self) -> Option<Outcome<T>> {
        if self.outcome.is_none() {
            self.outcome = self.settle();
        }
        self.outcome
    }

    pub(crate) fn latch_failure(&mut self, err: HubError) {
        if self.outcome.is_none() {
            self.outcome = Some(Outcome::Failed(err));
        }
    }

    fn settle(&self) -> Option<Outcome<T>> {
        if self.is_cancelled() {
            return Some(Outcome::Cancelled);
        }
        match self.rx.try_recv() {
            Ok(Ok(value)) => Some(Outcome::Ready(value)),
            Ok(Err(err)) => Some(Outcome::Failed(err)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Outcome::Failed(HubError::WorkerLost {
                method: self.method,
                url: self.url.clone(),
            })),
        }
    }
}

impl<T> fmt::Debug for RequestHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.outcome {
            None => "pending",
            Some(Outcome::Ready(_)) => "ready",
            Some(Outcome::Failed(_)) => "failed",
            Some(Outcome::Cancelled) => "cancelled",
        };
        f.debug_struct("RequestHandle")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("state", &state)
            .field("cancel_requested", &self.is_cancelled())
            .finish()
    }
}
