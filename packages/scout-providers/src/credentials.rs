//! Sealed integration credentials.
//!
//! A sealed value is `base64(nonce || ciphertext)` produced with ChaCha20-Poly1305 under the
//! deployment's `security.credentials_key`.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chacha20poly1305::{
	ChaCha20Poly1305, Key, Nonce,
	aead::{Aead, KeyInit},
};

use crate::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

pub type CredentialsKey = [u8; KEY_LEN];

pub fn decode_key(raw: &str) -> Result<CredentialsKey> {
	let bytes = BASE64
		.decode(raw.trim())
		.map_err(|err| Error::Credentials { message: format!("Invalid key encoding: {err}") })?;

	bytes.try_into().map_err(|bytes: Vec<u8>| Error::Credentials {
		message: format!("Credentials key must be {KEY_LEN} bytes, got {}.", bytes.len()),
	})
}

pub fn seal(key: &CredentialsKey, nonce: &[u8; NONCE_LEN], plaintext: &str) -> Result<String> {
	let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
	let ciphertext = cipher
		.encrypt(Nonce::from_slice(nonce), plaintext.as_bytes())
		.map_err(|_| Error::Credentials { message: "Failed to seal credential.".to_string() })?;
	let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());

	out.extend_from_slice(nonce);
	out.extend_from_slice(&ciphertext);

	Ok(BASE64.encode(out))
}

pub fn open(key: &CredentialsKey, sealed: &str) -> Result<String> {
	let raw = BASE64.decode(sealed.trim()).map_err(|err| Error::Credentials {
		message: format!("Invalid sealed credential encoding: {err}"),
	})?;

	if raw.len() <= NONCE_LEN {
		return Err(Error::Credentials { message: "Sealed credential is truncated.".to_string() });
	}

	let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
	let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
	let plaintext = cipher
		.decrypt(Nonce::from_slice(nonce), ciphertext)
		.map_err(|_| Error::Credentials { message: "Failed to open credential.".to_string() })?;

	String::from_utf8(plaintext).map_err(|_| Error::Credentials {
		message: "Opened credential is not valid UTF-8.".to_string(),
	})
}
