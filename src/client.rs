//! The launcher client and the single request chokepoint every operation
//! goes through.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{LauncherConfig, Protocol};
use crate::credentials::CredentialStore;
use crate::crypto::SecureChannel;
use crate::error::{Error, Result};
use crate::session::SessionManager;
use crate::types::{AppIdentity, GatewayErrorBody};

/// Request body accepted by the chokepoint.
pub(crate) enum Body {
    Json(serde_json::Value),
    Raw(Vec<u8>),
}

/// Client for one application's view of the local SAFE Launcher.
///
/// Each instance owns its session state; two clients share nothing unless
/// the caller clones the same `Arc<LauncherClient>`.
pub struct LauncherClient {
    http: reqwest::Client,
    base_url: String,
    protocol: Protocol,
    session: Arc<SessionManager>,
}

impl LauncherClient {
    /// Connects to a launcher on the default local port with default
    /// settings.
    pub fn new(app: AppIdentity) -> Result<Self> {
        Self::with_config(app, LauncherConfig::default())
    }

    pub fn with_config(app: AppIdentity, config: LauncherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let store = CredentialStore::new(&config.credentials_path);
        let session = Arc::new(SessionManager::new(
            http.clone(),
            config.base_url.clone(),
            config.protocol,
            app,
            store,
        ));
        Ok(Self {
            http,
            base_url: config.base_url,
            protocol: config.protocol,
            session,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.protocol.version_segment(), path)
    }

    /// Sends an authenticated request and returns the (decrypted) response
    /// body.
    ///
    /// The bearer token comes from the session manager, refreshing it if
    /// stale. When `secure` is set and the protocol encrypts payloads, the
    /// body and query string pass through the session channel both ways.
    /// Non-200 responses come back as [`Error::Gateway`], never a panic.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<String>,
        body: Option<Body>,
        secure: bool,
    ) -> Result<Vec<u8>> {
        let token = self.session.get_valid_token().await?;
        let channel = if secure && self.protocol.encrypts_payloads() {
            Some(self.session.channel()?)
        } else {
            None
        };

        let mut url = self.endpoint(path);
        if let Some(query) = query {
            let query = match &channel {
                Some(channel) => channel.encrypt(query.as_bytes())?,
                None => query,
            };
            url.push('?');
            url.push_str(&query);
        }

        debug!(%method, %url, "launcher request");
        let mut request = self.http.request(method, &url).bearer_auth(&token);
        if let Some(body) = body {
            request = match (body, &channel) {
                (Body::Json(value), Some(channel)) => {
                    let sealed = channel.encrypt(&serde_json::to_vec(&value)?)?;
                    request.header(CONTENT_TYPE, "text/plain").body(sealed)
                }
                (Body::Json(value), None) => request.json(&value),
                (Body::Raw(bytes), Some(channel)) => {
                    let sealed = channel.encrypt(&bytes)?;
                    request.header(CONTENT_TYPE, "text/plain").body(sealed)
                }
                (Body::Raw(bytes), None) => request
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(bytes),
            };
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.bytes().await?.to_vec();

        let payload = decode_body(channel.as_deref(), raw, status.is_success())?;
        if status.is_success() {
            Ok(payload)
        } else {
            Err(gateway_error(status.as_u16(), &payload))
        }
    }

    /// Public endpoints (DNS reads) carry no token and no encryption.
    pub(crate) async fn request_unauthenticated(
        &self,
        method: Method,
        path: &str,
        query: Option<String>,
    ) -> Result<Vec<u8>> {
        let mut url = self.endpoint(path);
        if let Some(query) = query {
            url.push('?');
            url.push_str(&query);
        }

        debug!(%method, %url, "launcher request (unauthenticated)");
        let response = self.http.request(method, &url).send().await?;
        let status = response.status();
        let raw = response.bytes().await?.to_vec();

        if status.is_success() {
            Ok(raw)
        } else {
            Err(gateway_error(status.as_u16(), &raw))
        }
    }

    pub(crate) fn parse_json<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(payload)?)
    }
}

fn decode_body(
    channel: Option<&SecureChannel>,
    raw: Vec<u8>,
    success: bool,
) -> Result<Vec<u8>> {
    let Some(channel) = channel else {
        return Ok(raw);
    };
    if raw.is_empty() {
        return Ok(raw);
    }
    let text = match std::str::from_utf8(&raw) {
        Ok(text) => text,
        Err(_) if !success => return Ok(raw),
        Err(e) => return Err(Error::Decryption(format!("non-text sealed body: {e}"))),
    };
    match channel.decrypt(text) {
        Ok(plain) => Ok(plain),
        // Error responses can arrive outside the channel (e.g. a proxy or
        // the launcher rejecting the request before it touches the body).
        Err(_) if !success => Ok(raw),
        Err(e) => Err(e),
    }
}

fn gateway_error(status: u16, payload: &[u8]) -> Error {
    match serde_json::from_slice::<GatewayErrorBody>(payload) {
        Ok(body) => Error::Gateway {
            error_code: body.error_code,
            description: body.description,
            status,
        },
        Err(_) => Error::Gateway {
            error_code: -1,
            description: String::from_utf8_lossy(payload).into_owned(),
            status,
        },
    }
}
