//! Server side of the login payload: base64, AES-128-CBC, zero padding.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::Deserialize;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const KEY: [u8; 16] = [
    85, 74, 47, 106, 110, 70, 42, 119, 82, 48, 113, 82, 75, 47, 100, 72,
];
const IV: [u8; 16] = [
    38, 99, 57, 42, 121, 42, 53, 112, 61, 49, 85, 78, 120, 47, 84, 114,
];

/// The fields of the decrypted login document the hub cares about.
#[derive(Debug, Deserialize)]
pub struct LoginDoc {
    pub build: String,
    pub user_name: String,
    pub user_pass: String,
    #[serde(default)]
    pub remember: bool,
}

/// Decode the `i` field of a login form. `None` for anything that is not a
/// well-formed payload.
pub fn open(i: &str) -> Option<LoginDoc> {
    let ciphertext = STANDARD_NO_PAD.decode(i).ok()?;
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return None;
    }
    let plaintext = Aes128CbcDec::new(&KEY.into(), &IV.into())
        .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
        .ok()?;
    let end = plaintext.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    serde_json::from_slice(&plaintext[..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // "hello" under the hub key, computed independently.
    const HELLO: &str = "Tbm8+hTp0zKhwO5WjY99Mw";

    #[test]
    fn rejects_non_json_plaintext() {
        assert!(open(HELLO).is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(open("").is_none());
        assert!(open("not*base64").is_none());
        assert!(open("AAAA").is_none());
    }
}
