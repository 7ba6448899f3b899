//! Public-name (DNS) operations: long names, services, and the
//! unauthenticated read path anyone can use to browse published content.

use reqwest::Method;
use serde_json::json;

use crate::client::{Body, LauncherClient};
use crate::error::Result;
use crate::types::DirectoryResponse;

fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl LauncherClient {
    /// Registers a new public long name owned by this session.
    pub async fn create_long_name(&self, long_name: &str) -> Result<()> {
        let path = format!("dns/{}", escape(long_name));
        self.request(Method::POST, &path, None, None, true)
            .await
            .map(drop)
    }

    /// Maps `service_name.long_name` to a home directory.
    pub async fn register_service(
        &self,
        long_name: &str,
        service_name: &str,
        service_home_dir_path: &str,
        is_path_shared: bool,
    ) -> Result<()> {
        let payload = json!({
            "longName": long_name,
            "serviceName": service_name,
            "serviceHomeDirPath": service_home_dir_path,
            "isPathShared": is_path_shared,
        });
        self.request(Method::POST, "dns", None, Some(Body::Json(payload)), true)
            .await
            .map(drop)
    }

    pub async fn list_long_names(&self) -> Result<Vec<String>> {
        let payload = self.request(Method::GET, "dns", None, None, true).await?;
        self.parse_json(&payload)
    }

    pub async fn list_services(&self, long_name: &str) -> Result<Vec<String>> {
        let path = format!("dns/{}", escape(long_name));
        let payload = self.request(Method::GET, &path, None, None, true).await?;
        self.parse_json(&payload)
    }

    /// Fetches a service's home directory. Public content: no token, no
    /// encryption.
    pub async fn get_home_dir(
        &self,
        long_name: &str,
        service_name: &str,
    ) -> Result<DirectoryResponse> {
        let path = format!("dns/{}/{}", escape(service_name), escape(long_name));
        let payload = self.request_unauthenticated(Method::GET, &path, None).await?;
        self.parse_json(&payload)
    }

    /// Fetches a published file without authentication, optionally a byte
    /// range.
    pub async fn get_file_unauth(
        &self,
        long_name: &str,
        service_name: &str,
        file_path: &str,
        offset: u64,
        length: Option<u64>,
    ) -> Result<Vec<u8>> {
        let path = format!(
            "dns/{}/{}/{}",
            escape(service_name),
            escape(long_name),
            escape(file_path)
        );
        let query = match length {
            Some(length) => format!("offset={offset}&length={length}"),
            None => format!("offset={offset}"),
        };
        self.request_unauthenticated(Method::GET, &path, Some(query))
            .await
    }
}
