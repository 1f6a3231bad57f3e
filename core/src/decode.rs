//! Response body decoders.
//!
//! # Design
//! A `Decoder` is a pure `bytes -> T` mapping picked by the named operation
//! and moved into the worker thread. Decoders hold no state, so the same
//! value can serve any number of requests. Three strategies cover every
//! endpoint the hub exposes:
//!
//! - [`Json`] for structured responses;
//! - [`Text`] for level files, which are not escaped consistently enough to
//!   parse as anything but opaque text;
//! - [`Form`] for the `application/x-www-form-urlencoded` replies of the
//!   upload endpoint.
//!
//! Ad-hoc strategies can be built from a closure with [`from_fn`].

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::DecodeError;

/// Turns a complete response body into a typed value.
pub trait Decoder<T>: Send + 'static {
    fn decode(&self, body: &[u8]) -> Result<T, DecodeError>;
}

/// Parse the whole body as JSON into `T`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl<T: DeserializeOwned> Decoder<T> for Json {
    fn decode(&self, body: &[u8]) -> Result<T, DecodeError> {
        json(body)
    }
}

/// Pass the body through as UTF-8 text. Malformed UTF-8 is a decode error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Decoder<String> for Text {
    fn decode(&self, body: &[u8]) -> Result<String, DecodeError> {
        text(body)
    }
}

/// Parse the body as `application/x-www-form-urlencoded` key/value pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Form;

impl Decoder<FormValues> for Form {
    fn decode(&self, body: &[u8]) -> Result<FormValues, DecodeError> {
        form(body)
    }
}

/// A decoder backed by a closure.
pub struct FromFn<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

pub fn from_fn<F, T>(f: F) -> FromFn<F, T>
where
    F: Fn(&[u8]) -> Result<T, DecodeError> + Send + 'static,
{
    FromFn {
        f,
        _marker: PhantomData,
    }
}

impl<F, T> Decoder<T> for FromFn<F, T>
where
    F: Fn(&[u8]) -> Result<T, DecodeError> + Send + 'static,
    T: 'static,
{
    fn decode(&self, body: &[u8]) -> Result<T, DecodeError> {
        (self.f)(body)
    }
}

pub fn json<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

pub fn text(body: &[u8]) -> Result<String, DecodeError> {
    Ok(std::str::from_utf8(body)?.to_string())
}

pub fn form(body: &[u8]) -> Result<FormValues, DecodeError> {
    let text = std::str::from_utf8(body)?;
    validate_form(text)?;
    let mut values = FormValues::default();
    for (key, value) in form_urlencoded::parse(text.as_bytes()) {
        values.append(key.into_owned(), value.into_owned());
    }
    Ok(values)
}

/// `form_urlencoded::parse` accepts anything; reject what a strict query
/// parser would.
fn validate_form(text: &str) -> Result<(), DecodeError> {
    if let Some(pos) = text.find(';') {
        return Err(DecodeError::Form(format!(
            "semicolon separator at byte {pos}"
        )));
    }
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
            _ => {
                return Err(DecodeError::Form(format!(
                    "invalid percent escape at byte {i}"
                )))
            }
        }
    }
    Ok(())
}

/// Decoded form pairs. A key may repeat; values keep arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pairs: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    pub fn append(&mut self, key: String, value: String) {
        self.pairs.entry(key).or_default().push(value);
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.pairs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
