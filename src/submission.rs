use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use url::Url;

use crate::client::TransferClient;
use crate::collector::UploadCollector;
use crate::model::SessionIdentity;
use crate::platform::Platform;

pub const COPY_ACK_DURATION: Duration = Duration::from_secs(2);

const DOWNLOAD_ROUTE: &str = "d";

/// Route the download page is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// `{origin}/d/{id}`
    #[default]
    Download,
    /// `{origin}/{id}`
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub id: String,
    pub url: Url,
}

impl ShareLink {
    pub fn new(origin: &Url, id: &str, style: LinkStyle) -> Result<Self> {
        let mut url = origin.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Invalid public origin: {}", origin))?;
            segments.pop_if_empty();
            if style == LinkStyle::Download {
                segments.push(DOWNLOAD_ROUTE);
            }
            segments.push(id);
        }

        Ok(Self {
            id: id.to_string(),
            url,
        })
    }
}

/// State of one send: the queued files, then the share link once uploaded.
#[derive(Debug, Default)]
pub struct UploadSession {
    pub collector: UploadCollector,
    link: Option<ShareLink>,
    copied_at: Option<Instant>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self) -> Option<&ShareLink> {
        self.link.as_ref()
    }

    /// Uploads every queued file. The queue is only cleared on success, so a
    /// failed attempt can be retried as is.
    pub async fn submit(
        &mut self,
        client: &TransferClient,
        identity: Option<&SessionIdentity>,
        origin: &Url,
        style: LinkStyle,
    ) -> Result<&ShareLink> {
        if self.collector.is_empty() {
            bail!("No files to upload");
        }
        if let Some(error) = self.collector.error() {
            bail!("{}", error);
        }

        self.link = None;
        self.copied_at = None;

        let receipt = client.upload(self.collector.items(), identity).await?;
        self.collector.clear();

        let link = ShareLink::new(origin, &receipt.id, style)
            .with_context(|| format!("Uploaded as {} but the share link could not be built", receipt.id))?;
        Ok(&*self.link.insert(link))
    }

    /// Copies the share link. Failures are logged and reported as `false`.
    pub fn copy_link<P: Platform>(&mut self, platform: &P) -> bool {
        let Some(link) = &self.link else {
            return false;
        };

        match platform.copy_to_clipboard(link.url.as_str()) {
            Ok(()) => {
                self.copied_at = Some(Instant::now());
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to copy link");
                false
            }
        }
    }

    pub fn is_copied(&self) -> bool {
        self.is_copied_at(Instant::now())
    }

    fn is_copied_at(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|copied| now.saturating_duration_since(copied) < COPY_ACK_DURATION)
    }

    /// Forgets the previous upload so a new one can start.
    pub fn reset(&mut self) {
        self.collector.clear();
        self.link = None;
        self.copied_at = None;
    }
}
