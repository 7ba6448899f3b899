//! Server-side resource handles: acquire, operate, release.
//!
//! The launcher hands out numeric handles for resources that live on its
//! side of the wall (cipher configurations, data identifiers, in-flight
//! readers and writers). Every successful acquire must be paired with
//! exactly one release; the composite operations here do the pairing
//! internally so callers cannot leak.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::client::{Body, LauncherClient};
use crate::error::Result;

/// The resource families the launcher manages by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    CipherOpts,
    DataId,
    StructuredData,
    AppendableData,
    ImmutableDataReader,
    ImmutableDataWriter,
}

impl HandleKind {
    fn path(self) -> &'static str {
        match self {
            HandleKind::CipherOpts => "cipher-opts",
            HandleKind::DataId => "data-id",
            HandleKind::StructuredData => "structured-data",
            HandleKind::AppendableData => "appendable-data",
            HandleKind::ImmutableDataReader => "immutable-data/reader",
            HandleKind::ImmutableDataWriter => "immutable-data/writer",
        }
    }
}

/// Encryption applied by the launcher when storing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherOptsKind {
    Plain,
    Symmetric,
}

impl CipherOptsKind {
    fn as_str(self) -> &'static str {
        match self {
            CipherOptsKind::Plain => "PLAIN",
            CipherOptsKind::Symmetric => "SYMMETRIC",
        }
    }
}

#[derive(Deserialize)]
struct HandleResponse {
    #[serde(rename = "handleId")]
    handle_id: u64,
}

/// An acquired launcher-side resource reference.
///
/// Deliberately neither `Clone` nor `Copy`: releasing consumes the value,
/// so a handle cannot be released twice or used after release. Two handles
/// are never interchangeable even when they reference the same data.
#[derive(Debug)]
pub struct RemoteHandle {
    kind: HandleKind,
    id: u64,
}

impl RemoteHandle {
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl LauncherClient {
    /// Acquires a fresh handle of the given kind. A failed acquire creates
    /// nothing server-side, so there is nothing to release.
    pub async fn acquire_handle(
        &self,
        kind: HandleKind,
        params: serde_json::Value,
    ) -> Result<RemoteHandle> {
        let payload = self
            .request(Method::POST, kind.path(), None, Some(Body::Json(params)), true)
            .await?;
        let response: HandleResponse = self.parse_json(&payload)?;
        Ok(RemoteHandle {
            kind,
            id: response.handle_id,
        })
    }

    /// Fetches content or metadata through a handle.
    pub async fn handle_get(
        &self,
        handle: &RemoteHandle,
        query: Option<String>,
    ) -> Result<Vec<u8>> {
        let path = format!("{}/{}", handle.kind.path(), handle.id);
        self.request(Method::GET, &path, query, None, true).await
    }

    /// Mutates the resource behind a handle with a JSON payload.
    pub async fn handle_put_json(
        &self,
        handle: &RemoteHandle,
        params: serde_json::Value,
    ) -> Result<Vec<u8>> {
        let path = format!("{}/{}", handle.kind.path(), handle.id);
        self.request(Method::PUT, &path, None, Some(Body::Json(params)), true)
            .await
    }

    /// Streams raw bytes through a writer handle.
    pub async fn handle_put_bytes(
        &self,
        handle: &RemoteHandle,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let path = format!("{}/{}", handle.kind.path(), handle.id);
        self.request(Method::PUT, &path, None, Some(Body::Raw(bytes)), true)
            .await
    }

    /// Releases a handle. Consumes it: each acquire pairs with exactly one
    /// release.
    pub async fn release_handle(&self, handle: RemoteHandle) -> Result<bool> {
        let path = format!("{}/{}", handle.kind.path(), handle.id);
        self.request(Method::DELETE, &path, None, None, true).await?;
        Ok(true)
    }

    /// Releases `handle` and merges the outcome with `result`.
    ///
    /// A release failure after a failed operate is logged and the operate
    /// error propagates unmasked; a release failure after a successful
    /// operate is a real error and surfaces.
    async fn finish<T>(&self, handle: RemoteHandle, result: Result<T>) -> Result<T> {
        let (kind, id) = (handle.kind, handle.id);
        match self.release_handle(handle).await {
            Ok(_) => result,
            Err(release_err) => match result {
                Err(original) => {
                    warn!(?kind, id, error = %release_err, "handle release failed during cleanup");
                    Err(original)
                }
                Ok(_) => Err(release_err),
            },
        }
    }

    /// Acquires a cipher-options handle for subsequent data writes.
    pub async fn cipher_opts(&self, kind: CipherOptsKind) -> Result<RemoteHandle> {
        self.acquire_handle(HandleKind::CipherOpts, json!({ "type": kind.as_str() }))
            .await
    }

    /// Reads a structured-data record by name and type tag. Acquires and
    /// releases every handle involved on all exit paths.
    pub async fn structured_data_read(&self, name: &str, type_tag: u64) -> Result<Vec<u8>> {
        let data_id = self
            .acquire_handle(
                HandleKind::DataId,
                json!({ "name": name, "typeTag": type_tag, "dataType": "structured-data" }),
            )
            .await?;

        let read = async {
            let record = self
                .acquire_handle(
                    HandleKind::StructuredData,
                    json!({ "dataIdHandle": data_id.id() }),
                )
                .await?;
            let content = self.handle_get(&record, None).await;
            self.finish(record, content).await
        }
        .await;

        self.finish(data_id, read).await
    }

    /// Creates or replaces a structured-data record.
    pub async fn structured_data_write(
        &self,
        name: &str,
        type_tag: u64,
        data: &[u8],
    ) -> Result<()> {
        let cipher = self.cipher_opts(CipherOptsKind::Symmetric).await?;

        let write = async {
            let record = self
                .acquire_handle(
                    HandleKind::StructuredData,
                    json!({
                        "name": name,
                        "typeTag": type_tag,
                        "cipherOptsHandle": cipher.id(),
                        "data": BASE64.encode(data),
                    }),
                )
                .await?;
            let saved = self.handle_put_json(&record, json!({})).await.map(drop);
            self.finish(record, saved).await
        }
        .await;

        self.finish(cipher, write).await
    }

    /// Appends an existing data item (by name) to an appendable-data list.
    pub async fn appendable_data_append(
        &self,
        name: &str,
        type_tag: u64,
        item_name: &str,
    ) -> Result<()> {
        let item = self
            .acquire_handle(
                HandleKind::DataId,
                json!({ "name": item_name, "dataType": "immutable-data" }),
            )
            .await?;

        let append = async {
            let list = self
                .acquire_handle(
                    HandleKind::AppendableData,
                    json!({ "name": name, "typeTag": type_tag }),
                )
                .await?;
            let appended = self
                .handle_put_json(&list, json!({ "dataIdHandle": item.id() }))
                .await
                .map(drop);
            self.finish(list, appended).await
        }
        .await;

        self.finish(item, append).await
    }

    /// Writes an immutable blob through a writer handle.
    pub async fn immutable_data_write(&self, data: &[u8]) -> Result<()> {
        let cipher = self.cipher_opts(CipherOptsKind::Symmetric).await?;

        let write = async {
            let writer = self
                .acquire_handle(
                    HandleKind::ImmutableDataWriter,
                    json!({ "cipherOptsHandle": cipher.id() }),
                )
                .await?;
            let written = self.handle_put_bytes(&writer, data.to_vec()).await.map(drop);
            self.finish(writer, written).await
        }
        .await;

        self.finish(cipher, write).await
    }

    /// Reads an immutable blob by its network name.
    pub async fn immutable_data_read(&self, name: &str) -> Result<Vec<u8>> {
        let data_id = self
            .acquire_handle(
                HandleKind::DataId,
                json!({ "name": name, "dataType": "immutable-data" }),
            )
            .await?;

        let read = async {
            let reader = self
                .acquire_handle(
                    HandleKind::ImmutableDataReader,
                    json!({ "dataIdHandle": data_id.id() }),
                )
                .await?;
            let content = self.handle_get(&reader, None).await;
            self.finish(reader, content).await
        }
        .await;

        self.finish(data_id, read).await
    }
}
