//! Login payload obfuscation.
//!
//! The login endpoint expects its JSON document zero-padded to the AES block
//! size, encrypted with AES-128-CBC under a fixed key and IV, and sent as
//! unpadded standard base64. The key and IV are wire constants shared with
//! the server, not secrets.
//!
//! Zero padding is not self-delimiting: `zero_unpad` trims every trailing
//! zero byte, including ones that belonged to the plaintext. The server
//! expects exactly this format, so it is kept as is.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;

use crate::error::CodecError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const BLOCK_SIZE: usize = 16;

pub const LOGIN_KEY: [u8; 16] = [
    85, 74, 47, 106, 110, 70, 42, 119, 82, 48, 113, 82, 75, 47, 100, 72,
];

pub const LOGIN_IV: [u8; 16] = [
    38, 99, 57, 42, 121, 42, 53, 112, 61, 49, 85, 78, 120, 47, 84, 114,
];

/// Append `BLOCK_SIZE - len % BLOCK_SIZE` zero bytes. An already aligned
/// input gains a whole block.
pub fn zero_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, 0);
    padded
}

/// Trim all trailing zero bytes.
pub fn zero_unpad(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

pub fn encrypt(plaintext: &str) -> Vec<u8> {
    let padded = zero_pad(plaintext.as_bytes());
    Aes128CbcEnc::new(&LOGIN_KEY.into(), &LOGIN_IV.into())
        .encrypt_padded_vec_mut::<NoPadding>(&padded)
}

/// Decrypt block-aligned ciphertext. The zero padding is left in place.
pub fn decrypt(ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CodecError::Unaligned(ciphertext.len()));
    }
    Aes128CbcDec::new(&LOGIN_KEY.into(), &LOGIN_IV.into())
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| CodecError::Unaligned(ciphertext.len()))
}

/// Encrypt `plaintext` and encode it for the `i` form field.
pub fn encode_payload(plaintext: &str) -> String {
    STANDARD_NO_PAD.encode(encrypt(plaintext))
}

/// Inverse of [`encode_payload`], zero-trim included.
pub fn decode_payload(transport: &str) -> Result<String, CodecError> {
    let ciphertext = STANDARD_NO_PAD.decode(transport)?;
    let mut plaintext = decrypt(&ciphertext)?;
    let len = zero_unpad(&plaintext).len();
    plaintext.truncate(len);
    Ok(String::from_utf8(plaintext)?)
}
