use anyhow::{Context, Result, anyhow, bail};
use bytes::Bytes;
use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use url::Url;

use crate::model::{RemoteFile, SessionIdentity, UploadItem, UploadReceipt};

const FILES_FIELD: &str = "files";
const CREATOR_ID_FIELD: &str = "creatorId";
const CREATOR_NAME_FIELD: &str = "creatorName";

pub const USER_AGENT: &str = concat!("threef/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the transfer service: one upload endpoint and one catalog base URL.
pub struct TransferClient {
    client: Client,
    upload_url: Url,
    api_base_url: Url,
    file_base_url: Url,
}

impl TransferClient {
    pub fn new(upload_url: Url, api_base_url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            upload_url,
            file_base_url: api_base_url.clone(),
            api_base_url,
        })
    }

    /// Base that relative file URLs from the catalog are resolved against.
    /// Defaults to the API base URL.
    pub fn with_file_base(mut self, file_base_url: Url) -> Self {
        self.file_base_url = file_base_url;
        self
    }

    /// Sends every item in one multipart `POST`, each under the repeated `files` field.
    pub async fn upload(
        &self,
        items: &[UploadItem],
        identity: Option<&SessionIdentity>,
    ) -> Result<UploadReceipt> {
        let mut form = Form::new();

        for item in items {
            let part = Part::file(&item.path)
                .await
                .with_context(|| format!("Unable to read {}", item.path.display()))?
                .file_name(item.name.clone())
                .mime_str(&item.mime_type)
                .with_context(|| format!("Invalid MIME type for {}", item.name))?;
            form = form.part(FILES_FIELD, part);
        }

        if let Some(identity) = identity {
            form = form
                .text(CREATOR_ID_FIELD, identity.creator_id.clone())
                .text(CREATOR_NAME_FIELD, identity.creator_name.clone());
        }

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .context("Upload failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Upload rejected by server");
            bail!("Upload failed");
        }

        let receipt: UploadReceipt = response
            .json()
            .await
            .context("Upload failed: unexpected response body")?;
        tracing::debug!(id = %receipt.id, "Upload accepted");
        Ok(receipt)
    }

    pub fn catalog_url(&self, id: &str) -> Result<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid API base URL: {}", self.api_base_url))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Lists the files of an uploaded session.
    pub async fn fetch_catalog(&self, id: &str) -> Result<Vec<RemoteFile>> {
        let url = self.catalog_url(id)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch files for {}", id))?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                "Failed to fetch files for {}: {} - {}",
                id,
                status,
                response.text().await.unwrap_or_default()
            );
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid file list for {}", id))
    }

    /// Resolves a file URL from the catalog; relative URLs are taken against the file base.
    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        self.file_base_url
            .join(url)
            .with_context(|| format!("Invalid file URL: {}", url))
    }

    /// `GET` that fails on non-2xx statuses.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let url = self.resolve_url(url)?;
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            bail!("Failed to fetch {}: {}", url, response.status());
        }

        Ok(response)
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        self.get(url)
            .await?
            .bytes()
            .await
            .with_context(|| format!("Failed to download {}", url))
    }
}
