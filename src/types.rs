use serde::{Deserialize, Serialize};

/// Identity of the application requesting access, shown to the user by the
/// Launcher when it asks for authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
    pub vendor: String,
    pub id: String,
    #[serde(skip)]
    pub permissions: Vec<String>,
}

impl AppIdentity {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        vendor: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            vendor: vendor.into(),
            id: id.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Session credentials as persisted to the credential file and as returned
/// by `POST /auth`. The key-material fields are only present in the secure
/// protocol variant, all base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(rename = "privateKey", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(rename = "publicKey", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(rename = "encryptedKey", skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
}

impl Credentials {
    /// A credentials record is only usable for the encrypted channel when
    /// every piece of key material survived persistence.
    pub fn has_key_material(&self) -> bool {
        self.nonce.is_some()
            && self.private_key.is_some()
            && self.public_key.is_some()
            && self.encrypted_key.is_some()
    }
}

/// Structured error payload the Launcher returns on non-200 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayErrorBody {
    #[serde(rename = "errorCode")]
    pub error_code: i64,
    pub description: String,
}

/// Metadata for a directory stored on the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryInfo {
    pub name: String,
    pub is_private: bool,
    pub is_versioned: bool,
    #[serde(default)]
    pub created_on: Option<i64>,
    #[serde(default)]
    pub modified_on: Option<i64>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Metadata for a file stored on the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub created_on: Option<i64>,
    #[serde(default)]
    pub modified_on: Option<i64>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Listing of a directory: its own info plus children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResponse {
    pub info: DirectoryInfo,
    #[serde(default)]
    pub sub_directories: Vec<DirectoryInfo>,
    #[serde(default)]
    pub files: Vec<FileInfo>,
}
