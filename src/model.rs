use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local file queued for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadItem {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,
    pub preview: Option<String>,
}

/// A file of an uploaded session, as listed by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
}

/// Creator metadata attached to uploads when a signed-in identity is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub creator_id: String,
    pub creator_name: String,
}
