//! Non-blocking request engine for the level hub.
//!
//! # Overview
//! A host update loop issues operations through [`HubClient`] and gets a
//! [`RequestHandle`] back immediately. Each request runs on its own worker
//! thread; the host calls [`RequestHandle::poll`] every tick until it sees
//! `Ready`, `Failed` or `Cancelled`.
//!
//! # Design
//! - `http`: requests as plain data; every `build_*` is pure.
//! - `dispatch`: one worker thread per request, exactly one result each.
//! - `handle`: the one-shot result slot, latching poll, cooperative cancel.
//! - `decode`: pluggable body decoders (JSON, text, form).
//! - `codec`: the zero-padded AES-128-CBC encoding of the login payload.
//! - `session`: the host-owned record of the last successful login.

pub mod client;
pub mod codec;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod http;
pub mod session;
pub mod types;

pub use client::HubClient;
pub use config::HubConfig;
pub use decode::{Decoder, Form, FormValues, Json, Text};
pub use dispatch::Dispatcher;
pub use error::{CodecError, DecodeError, HubError};
pub use handle::{Outcome, Poll, RequestHandle};
pub use http::{HttpMethod, HttpRequest};
pub use session::{Session, SessionInfo};
pub use types::{
    Credentials, DeleteLevelResponse, LevelSummary, LevelsResponse, LoginPayload, LoginResponse,
    ServerInfo,
};
