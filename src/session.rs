//! Authentication state: acquire, validate, refresh, revoke.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Protocol;
use crate::credentials::CredentialStore;
use crate::crypto::{KeyExchange, SecureChannel};
use crate::error::{Error, Result};
use crate::types::{AppIdentity, Credentials};

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(rename = "encryptedKey")]
    encrypted_key: Option<String>,
    #[serde(rename = "publicKey")]
    public_key: Option<String>,
}

/// Owns the session lifecycle for one client instance.
///
/// There is no background refresh: staleness is discovered lazily by the
/// validity probe, and the only automatic recovery is a single
/// re-authorization attempt inside [`get_valid_token`](Self::get_valid_token).
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    protocol: Protocol,
    app: AppIdentity,
    store: CredentialStore,
    /// In-memory copy of the persisted credentials.
    cached: RwLock<Option<Credentials>>,
    /// Set once the current token passed a probe (or was just issued), so
    /// back-to-back calls don't probe again.
    validated: AtomicBool,
    /// Symmetric channel derived from the current credentials. Dropped on
    /// every re-authorization.
    channel: RwLock<Option<Arc<SecureChannel>>>,
    /// Serializes authorization so concurrent callers that both observe a
    /// stale session converge on one launcher prompt.
    auth_flight: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        protocol: Protocol,
        app: AppIdentity,
        store: CredentialStore,
    ) -> Self {
        Self {
            http,
            base_url,
            protocol,
            app,
            store,
            cached: RwLock::new(None),
            validated: AtomicBool::new(false),
            channel: RwLock::new(None),
            auth_flight: tokio::sync::Mutex::new(()),
        }
    }

    fn auth_url(&self) -> String {
        format!("{}{}auth", self.base_url, self.protocol.version_segment())
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    fn current_credentials(&self) -> Result<Option<Credentials>> {
        if let Some(creds) = self.cached.read().clone() {
            return Ok(Some(creds));
        }
        let loaded = self.store.load()?;
        if loaded.is_some() {
            *self.cached.write() = loaded.clone();
        }
        Ok(loaded)
    }

    /// Returns a token without checking freshness. Only suitable where a
    /// stale token is tolerable; most callers want
    /// [`get_valid_token`](Self::get_valid_token).
    pub async fn get_token(&self) -> Result<String> {
        if let Some(creds) = self.current_credentials()? {
            return Ok(creds.token);
        }
        Ok(self.authorize_serialized().await?.token)
    }

    /// Primary entry point: returns a token that just passed (or skipped,
    /// when already validated) the launcher's validity probe, re-authorizing
    /// at most once.
    pub async fn get_valid_token(&self) -> Result<String> {
        let creds = match self.current_credentials()? {
            Some(creds) => creds,
            None => return Ok(self.authorize_serialized().await?.token),
        };

        if self.validated.load(Ordering::Acquire) {
            return Ok(creds.token);
        }

        if self.probe(&creds.token).await? {
            self.validated.store(true, Ordering::Release);
            return Ok(creds.token);
        }

        debug!("session token is stale, re-authorizing");
        Ok(self.authorize_serialized().await?.token)
    }

    /// Asks the launcher whether the current token is still accepted.
    pub async fn is_token_valid(&self) -> Result<bool> {
        let token = self.get_token().await?;
        self.probe(&token).await
    }

    async fn probe(&self, token: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.auth_url())
            .bearer_auth(token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Single-flight wrapper around [`authorize`](Self::authorize). Waiters
    /// re-check state after acquiring the lock so one launcher prompt serves
    /// every concurrent caller.
    async fn authorize_serialized(&self) -> Result<Credentials> {
        let _guard = self.auth_flight.lock().await;

        if self.validated.load(Ordering::Acquire) {
            if let Some(creds) = self.current_credentials()? {
                return Ok(creds);
            }
        }

        self.authorize().await?.ok_or(Error::AuthDenied)
    }

    /// Requests authorization from the launcher.
    ///
    /// Returns `Ok(None)` on any non-200: the user declining the prompt is
    /// a normal outcome, not a transport failure. On success the merged
    /// credentials are persisted before this returns, and any cached
    /// symmetric channel is discarded.
    pub async fn authorize(&self) -> Result<Option<Credentials>> {
        self.validated.store(false, Ordering::Release);

        let exchange = match self.protocol {
            Protocol::Secure => Some(KeyExchange::generate()),
            Protocol::Bearer => None,
        };

        let mut payload = json!({
            "app": {
                "name": self.app.name,
                "version": self.app.version,
                "vendor": self.app.vendor,
                "id": self.app.id,
            },
            "permissions": self.app.permissions,
        });
        if let Some(exchange) = &exchange {
            payload["publicKey"] = json!(exchange.public_key_b64());
            payload["nonce"] = json!(exchange.nonce_b64());
        }

        let response = self.http.post(self.auth_url()).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "authorization denied");
            return Ok(None);
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        // Merge the launcher's response with the locally generated secrets
        // so a later process restart can rebuild the channel.
        let credentials = Credentials {
            token: body.token,
            nonce: exchange.as_ref().map(|e| e.nonce_b64()),
            private_key: exchange.as_ref().map(|e| e.private_key_b64()),
            public_key: body.public_key,
            encrypted_key: body.encrypted_key,
        };

        self.store.store(&credentials)?;
        *self.cached.write() = Some(credentials.clone());
        *self.channel.write() = None;
        self.validated.store(true, Ordering::Release);
        debug!("authorized with launcher");

        Ok(Some(credentials))
    }

    /// Revokes the current token. The persisted credential file is left in
    /// place; use [`credential_store`](Self::credential_store)`.clear()` to
    /// remove it.
    pub async fn revoke(&self) -> Result<bool> {
        let token = self.get_valid_token().await?;
        let response = self
            .http
            .delete(self.auth_url())
            .bearer_auth(token)
            .send()
            .await?;
        let revoked = response.status().is_success();
        if revoked {
            self.validated.store(false, Ordering::Release);
        }
        Ok(revoked)
    }

    /// The symmetric channel for the current session, built lazily and
    /// cached until the next re-authorization.
    pub(crate) fn channel(&self) -> Result<Arc<SecureChannel>> {
        if let Some(channel) = self.channel.read().clone() {
            return Ok(channel);
        }
        let creds = self.current_credentials()?.ok_or(Error::TokenInvalid)?;
        let channel = Arc::new(SecureChannel::from_credentials(&creds)?);
        *self.channel.write() = Some(channel.clone());
        Ok(channel)
    }
}
