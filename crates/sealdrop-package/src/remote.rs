//! Wire bindings for the package endpoints

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use sealdrop_core::SdResult;
use sealdrop_transfer::{FileSpec, SegmentStore};
use sealdrop_transport::{ApiClient, ApiReply, Method};

pub(crate) const API_BASE: &str = "/api/v2.0";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePackageResponse {
    pub package_id: String,
    pub package_code: String,
    pub server_secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddRecipientResponse {
    pub recipient_id: String,
    pub email: String,
    #[serde(default)]
    pub needs_approval: bool,
    #[serde(default)]
    pub approvers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFileResponse {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

/// Segment operations over the signed transport, scoped to one package.
/// Downloads authorize with the access checksum; wire part numbers are
/// 1-based while the engine counts from 0.
pub(crate) struct PackageStore<'a> {
    pub client: &'a ApiClient,
    pub package_id: String,
    pub checksum: String,
}

#[async_trait]
impl SegmentStore for PackageStore<'_> {
    async fn register_file(&self, spec: &FileSpec) -> SdResult<String> {
        let path = format!("{API_BASE}/package/{}/file/", self.package_id);
        let body = json!({
            "filename": spec.name,
            "fileSize": spec.size,
            "parts": spec.parts,
            "uploadType": spec.upload_type,
        });
        let reply: ApiReply<CreateFileResponse> =
            self.client.send(Method::PUT, &path, Some(body)).await?;
        Ok(reply.into_payload()?.file_id)
    }

    async fn upload_segment(&self, file_id: &str, index: u64, data: Vec<u8>) -> SdResult<()> {
        let part = index + 1;
        let path = format!(
            "{API_BASE}/package/{}/file/{file_id}/?part={part}",
            self.package_id
        );
        let file_name = format!("{file_id}.{part}");
        let reply: ApiReply<serde_json::Value> =
            self.client.send_multipart(&path, &file_name, data).await?;
        reply.into_payload().map(|_| ())
    }

    async fn download_segment(&self, file_id: &str, index: u64) -> SdResult<Vec<u8>> {
        let path = format!(
            "{API_BASE}/package/{}/file/{file_id}/download/",
            self.package_id
        );
        let body = json!({ "checksum": self.checksum, "part": index + 1 });
        self.client.send_bytes(Method::POST, &path, Some(body)).await
    }
}
