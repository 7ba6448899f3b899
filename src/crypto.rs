//! Key exchange and the end-to-end encrypted session channel.
//!
//! The secure protocol variant negotiates a symmetric cipher during
//! authorization: the client sends an ephemeral x25519 public key and a
//! 24-byte nonce, and the launcher answers with its own public key plus an
//! `encryptedKey` blob. Opening that blob (x25519 DH, SHA-256 key
//! derivation, XChaCha20-Poly1305 under the client's nonce) yields the
//! 32-byte session key followed by the 24-byte session nonce used for every
//! subsequent body and query string.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{Error, Result};
use crate::types::Credentials;

pub const SYMMETRIC_KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;

/// Domain separator mixed into the DH shared secret. The launcher derives
/// the box key the same way; changing it breaks the handshake.
const BOX_KEY_CONTEXT: &[u8] = b"safenet-box-v1:";

/// Ephemeral keypair and nonce for one authorization attempt. Never reused
/// across attempts.
pub struct KeyExchange {
    secret: StaticSecret,
    public: PublicKey,
    nonce: [u8; NONCE_LEN],
}

impl KeyExchange {
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        Self {
            secret,
            public,
            nonce,
        }
    }

    pub fn public_key_b64(&self) -> String {
        BASE64.encode(self.public.as_bytes())
    }

    pub fn nonce_b64(&self) -> String {
        BASE64.encode(self.nonce)
    }

    /// Private key as persisted alongside the launcher's response, so a
    /// restarted process can reopen the channel without re-authorizing.
    pub fn private_key_b64(&self) -> String {
        BASE64.encode(self.secret.to_bytes())
    }
}

/// Derive the asymmetric-box key from an x25519 shared secret.
pub fn derive_box_key(shared_secret: &[u8; 32]) -> [u8; SYMMETRIC_KEY_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(BOX_KEY_CONTEXT);
    hasher.update(shared_secret);
    let digest = hasher.finalize();
    let mut key = [0u8; SYMMETRIC_KEY_LEN];
    key.copy_from_slice(&digest);
    key
}

/// Cached symmetric cipher for one session.
///
/// A pure function of the credentials' key material: rebuild it whenever
/// the session is replaced. The per-session fixed nonce is part of the
/// launcher protocol (the session is short-lived and rotated on every
/// re-authorization); do not switch to a per-message nonce without a
/// matching launcher change.
pub struct SecureChannel {
    cipher: XChaCha20Poly1305,
    nonce: [u8; NONCE_LEN],
}

impl std::fmt::Debug for SecureChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureChannel").finish_non_exhaustive()
    }
}

impl SecureChannel {
    /// Reconstructs the channel from persisted credentials by opening the
    /// launcher's `encryptedKey` blob.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        let nonce = decode_field("nonce", credentials.nonce.as_deref())?;
        let private_key = decode_field("privateKey", credentials.private_key.as_deref())?;
        let server_public = decode_field("publicKey", credentials.public_key.as_deref())?;
        let encrypted_key = decode_field("encryptedKey", credentials.encrypted_key.as_deref())?;

        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| Error::InvalidResponse("nonce is not 24 bytes".into()))?;
        let private_key: [u8; 32] = private_key
            .try_into()
            .map_err(|_| Error::InvalidResponse("privateKey is not 32 bytes".into()))?;
        let server_public: [u8; 32] = server_public
            .try_into()
            .map_err(|_| Error::InvalidResponse("publicKey is not 32 bytes".into()))?;

        let shared = StaticSecret::from(private_key).diffie_hellman(&PublicKey::from(server_public));
        let box_key = derive_box_key(shared.as_bytes());
        let box_cipher = XChaCha20Poly1305::new_from_slice(&box_key)
            .map_err(|e| Error::Decryption(e.to_string()))?;

        let plain = box_cipher
            .decrypt(XNonce::from_slice(&nonce), encrypted_key.as_slice())
            .map_err(|_| Error::Decryption("could not open the session key blob".into()))?;

        // 32-byte session key followed by the 24-byte session nonce.
        if plain.len() != SYMMETRIC_KEY_LEN + NONCE_LEN {
            return Err(Error::Decryption(format!(
                "session key blob has unexpected length {}",
                plain.len()
            )));
        }

        let cipher = XChaCha20Poly1305::new_from_slice(&plain[..SYMMETRIC_KEY_LEN])
            .map_err(|e| Error::Decryption(e.to_string()))?;
        let mut session_nonce = [0u8; NONCE_LEN];
        session_nonce.copy_from_slice(&plain[SYMMETRIC_KEY_LEN..]);

        Ok(Self {
            cipher,
            nonce: session_nonce,
        })
    }

    /// Seals a payload with the session cipher and base64-encodes it.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let sealed = self
            .cipher
            .encrypt(XNonce::from_slice(&self.nonce), plaintext)
            .map_err(|e| Error::Decryption(e.to_string()))?;
        Ok(BASE64.encode(sealed))
    }

    /// Opens a base64 payload. Authentication failure means tampering or a
    /// channel built from stale credentials; both are fatal here.
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<Vec<u8>> {
        let sealed = BASE64
            .decode(ciphertext_b64.trim())
            .map_err(|e| Error::Decryption(format!("invalid base64 ciphertext: {e}")))?;
        self.cipher
            .decrypt(XNonce::from_slice(&self.nonce), sealed.as_slice())
            .map_err(|_| Error::Decryption("symmetric open failed".into()))
    }
}

fn decode_field(name: &str, value: Option<&str>) -> Result<Vec<u8>> {
    let value = value
        .ok_or_else(|| Error::InvalidResponse(format!("credentials are missing `{name}`")))?;
    BASE64
        .decode(value)
        .map_err(|e| Error::InvalidResponse(format!("invalid base64 in `{name}`: {e}")))
}
