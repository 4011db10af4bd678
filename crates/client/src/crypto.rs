//! Payload decryption for encrypted API responses.
//!
//! The backend encrypts some payloads with AES-256-CBC (PKCS7 padding) under
//! a key shared with this client and ships `{ data: <hex>, iv: <hex> }`.
//! Every failure mode maps to a distinct [`DecryptError`] variant; nothing in
//! here panics on bad input.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// Shared key compiled into the client.
///
/// Anyone holding the client binary holds this key; deployments should
/// override it through configuration (`BIZDESK_PAYLOAD_KEY`).
pub const DEFAULT_PAYLOAD_KEY: [u8; KEY_LEN] = *b"bizdesk-payload-key-0123456789ab";

#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("bad ciphertext: {0}")]
    BadCiphertext(String),

    #[error("bad initialization vector: {0}")]
    BadIv(String),

    /// Wrong key/IV or corrupted data: the PKCS7 padding did not check out.
    #[error("bad padding (wrong key, wrong IV or corrupt ciphertext)")]
    BadPadding,

    #[error("decrypted payload is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("decrypted payload is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// Encrypted response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub data: String,
    pub iv: String,
}

/// AES-256-CBC payload codec bound to one key.
#[derive(Clone)]
pub struct PayloadDecryptor {
    key: [u8; KEY_LEN],
}

impl core::fmt::Debug for PayloadDecryptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PayloadDecryptor")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Default for PayloadDecryptor {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_KEY)
    }
}

impl PayloadDecryptor {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Decrypt hex ciphertext with a hex IV and parse the plaintext as JSON.
    pub fn decrypt(&self, cipher_hex: &str, iv_hex: &str) -> Result<Value, DecryptError> {
        self.decrypt_as(cipher_hex, iv_hex)
    }

    /// Like [`decrypt`](Self::decrypt), deserializing straight into `T`.
    pub fn decrypt_as<T: DeserializeOwned>(
        &self,
        cipher_hex: &str,
        iv_hex: &str,
    ) -> Result<T, DecryptError> {
        let plaintext = self.decrypt_bytes(cipher_hex, iv_hex)?;
        let text = String::from_utf8(plaintext)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn decrypt_envelope(&self, envelope: &EncryptedEnvelope) -> Result<Value, DecryptError> {
        self.decrypt(&envelope.data, &envelope.iv)
    }

    fn decrypt_bytes(&self, cipher_hex: &str, iv_hex: &str) -> Result<Vec<u8>, DecryptError> {
        let ciphertext = hex::decode(cipher_hex.trim())
            .map_err(|e| DecryptError::BadCiphertext(e.to_string()))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(DecryptError::BadCiphertext(format!(
                "length {} is not a positive multiple of {BLOCK_LEN}",
                ciphertext.len()
            )));
        }

        let iv = hex::decode(iv_hex.trim()).map_err(|e| DecryptError::BadIv(e.to_string()))?;
        if iv.len() != IV_LEN {
            return Err(DecryptError::BadIv(format!(
                "expected {IV_LEN} bytes, got {}",
                iv.len()
            )));
        }

        let cipher = Aes256CbcDec::new_from_slices(&self.key, &iv)
            .map_err(|e| DecryptError::BadIv(e.to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| DecryptError::BadPadding)
    }

    /// Counterpart of [`decrypt`](Self::decrypt): serialize `value` to JSON,
    /// encrypt it under `iv`, and return the hex envelope.
    ///
    /// Infallible: a JSON value always serializes, and key and IV sizes are
    /// fixed by their types.
    pub fn encrypt(&self, value: &Value, iv: [u8; IV_LEN]) -> EncryptedEnvelope {
        let plaintext = value.to_string();
        let cipher = Aes256CbcEnc::new(&self.key.into(), &iv.into());
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        EncryptedEnvelope {
            data: hex::encode(ciphertext),
            iv: hex::encode(iv),
        }
    }
}

/// Decrypt with the built-in key.
pub fn decrypt(cipher_hex: &str, iv_hex: &str) -> Result<Value, DecryptError> {
    PayloadDecryptor::default().decrypt(cipher_hex, iv_hex)
}
