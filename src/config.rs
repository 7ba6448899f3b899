use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8100/";
const DEFAULT_CONF_FILE: &str = "safenet_conf.json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which generation of the Launcher protocol to speak.
///
/// Early launchers negotiate a symmetric channel during authorization and
/// expect every body and query string end-to-end encrypted. Later launchers
/// dropped payload encryption, rely on the bearer token alone, and moved the
/// API under a version path segment. Both are deployed; the SDK supports
/// both as a configuration switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Encrypted payloads over the negotiated symmetric channel.
    #[default]
    Secure,
    /// Plaintext payloads, bearer token only, versioned path prefix.
    Bearer,
}

impl Protocol {
    pub(crate) fn encrypts_payloads(self) -> bool {
        matches!(self, Protocol::Secure)
    }

    /// Path prefix inserted between the base URL and the endpoint path.
    pub(crate) fn version_segment(self) -> &'static str {
        match self {
            Protocol::Secure => "",
            Protocol::Bearer => "0.5/",
        }
    }
}

/// Connection settings for a [`LauncherClient`](crate::LauncherClient).
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Base URL of the local Launcher, trailing slash included.
    pub base_url: String,
    /// Where session credentials are persisted between runs.
    pub credentials_path: PathBuf,
    pub protocol: Protocol,
    pub timeout: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials_path: PathBuf::from(DEFAULT_CONF_FILE),
            protocol: Protocol::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LauncherConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}
