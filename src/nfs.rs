//! Directory and file operations. Thin wrappers over the authenticated
//! request chokepoint: build a path, shape a payload, interpret the status.

use reqwest::Method;
use serde_json::json;

use crate::client::{Body, LauncherClient};
use crate::error::Result;
use crate::types::DirectoryResponse;

/// Options shared by directory and file creation.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub is_private: bool,
    pub is_versioned: bool,
    pub is_path_shared: bool,
    pub metadata: Option<String>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            is_private: true,
            is_versioned: false,
            is_path_shared: false,
            metadata: None,
        }
    }
}

/// Options for ranged file reads.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub offset: u64,
    pub length: Option<u64>,
    pub is_path_shared: bool,
}

fn escape(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

fn range_query(offset: u64, length: Option<u64>) -> String {
    match length {
        Some(length) => format!("offset={offset}&length={length}"),
        None => format!("offset={offset}"),
    }
}

impl LauncherClient {
    pub async fn create_directory(&self, dir_path: &str, options: CreateOptions) -> Result<()> {
        let mut payload = json!({
            "dirPath": dir_path,
            "isPrivate": options.is_private,
            "isVersioned": options.is_versioned,
            "isPathShared": options.is_path_shared,
        });
        if let Some(metadata) = options.metadata {
            payload["metadata"] = json!(metadata);
        }
        self.request(
            Method::POST,
            "nfs/directory",
            None,
            Some(Body::Json(payload)),
            true,
        )
        .await
        .map(drop)
    }

    pub async fn get_directory(
        &self,
        dir_path: &str,
        is_path_shared: bool,
    ) -> Result<DirectoryResponse> {
        let path = format!("nfs/directory/{}/{}", escape(dir_path), is_path_shared);
        let payload = self.request(Method::GET, &path, None, None, true).await?;
        self.parse_json(&payload)
    }

    pub async fn delete_directory(&self, dir_path: &str, is_path_shared: bool) -> Result<()> {
        let path = format!("nfs/directory/{}/{}", escape(dir_path), is_path_shared);
        self.request(Method::DELETE, &path, None, None, true)
            .await
            .map(drop)
    }

    /// Creates an (empty) file entry; contents go in via
    /// [`update_file`](Self::update_file).
    pub async fn create_file(&self, file_path: &str, options: CreateOptions) -> Result<()> {
        let mut payload = json!({
            "filePath": file_path,
            "isPrivate": options.is_private,
            "isVersioned": options.is_versioned,
            "isPathShared": options.is_path_shared,
        });
        if let Some(metadata) = options.metadata {
            payload["metadata"] = json!(metadata);
        }
        self.request(Method::POST, "nfs/file", None, Some(Body::Json(payload)), true)
            .await
            .map(drop)
    }

    /// Reads file contents, optionally a byte range.
    pub async fn get_file(&self, file_path: &str, options: ReadOptions) -> Result<Vec<u8>> {
        let path = format!("nfs/file/{}/{}", escape(file_path), options.is_path_shared);
        let query = range_query(options.offset, options.length);
        self.request(Method::GET, &path, Some(query), None, true).await
    }

    /// Writes `contents` into an existing file starting at `offset`.
    pub async fn update_file(
        &self,
        file_path: &str,
        contents: Vec<u8>,
        offset: u64,
        is_path_shared: bool,
    ) -> Result<()> {
        let path = format!("nfs/file/{}/{}", escape(file_path), is_path_shared);
        let query = format!("offset={offset}");
        self.request(
            Method::PUT,
            &path,
            Some(query),
            Some(Body::Raw(contents)),
            true,
        )
        .await
        .map(drop)
    }

    pub async fn delete_file(&self, file_path: &str, is_path_shared: bool) -> Result<()> {
        let path = format!("nfs/file/{}/{}", escape(file_path), is_path_shared);
        self.request(Method::DELETE, &path, None, None, true)
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_with_slashes_are_escaped_as_one_segment() {
        assert_eq!(escape("/photos/cats"), "%2Fphotos%2Fcats");
    }

    #[test]
    fn length_is_omitted_from_the_query_when_unset() {
        assert_eq!(range_query(3, Some(5)), "offset=3&length=5");
        assert_eq!(range_query(0, None), "offset=0");
    }
}
