use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The Launcher (or the user behind it) declined the authorization
    /// request. Expected outcome, not a transport problem.
    #[error("Authorization denied by the launcher")]
    AuthDenied,

    /// The bearer token failed the validity probe and re-authorization did
    /// not produce a fresh one.
    #[error("Session token is no longer valid")]
    TokenInvalid,

    /// Symmetric open failed: tampered ciphertext or a channel built from
    /// stale key material. Fatal — retrying with the same key reproduces it.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Structured error payload returned by the Launcher on a non-200.
    #[error("Launcher error {error_code}: {description}")]
    Gateway {
        error_code: i64,
        description: String,
        status: u16,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidResponse(err.to_string())
    }
}
