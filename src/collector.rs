use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use futures::future::join_all;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use crate::format::{PREVIEW_LENGTH, format_size, guess_mime, is_text_file, truncate_preview};
use crate::model::UploadItem;

pub const MAX_TOTAL_SIZE: u64 = 2 * 1024 * 1024 * 1024; // 2GiB

// A UTF-8 char is at most 4 bytes, so this many bytes always hold one char more than the preview.
const PREVIEW_READ_LIMIT: u64 = (PREVIEW_LENGTH as u64 + 1) * 4;

/// Files queued for the next upload, with their running total size.
#[derive(Debug, Default)]
pub struct UploadCollector {
    items: Vec<UploadItem>,
    total_size: u64,
    error: Option<String>,
}

impl UploadCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Set while the total size is over [`MAX_TOTAL_SIZE`].
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        !self.items.is_empty() && self.error.is_none()
    }

    /// Queues a batch of local files. Text previews for the batch are read
    /// concurrently and the batch is appended in one step once all are done.
    pub async fn add_paths<P: AsRef<Path>>(&mut self, paths: &[P], preview: bool) -> Result<usize> {
        let mut batch = Vec::with_capacity(paths.len());

        for path in paths {
            let path = path.as_ref();
            let metadata = tokio::fs::metadata(path)
                .await
                .with_context(|| format!("Failed to get metadata for {}", path.display()))?;

            if metadata.is_dir() {
                bail!("{} is a directory, only files can be sent", path.display());
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("Invalid file path: {}", path.display()))?;

            batch.push(UploadItem {
                id: Uuid::new_v4(),
                mime_type: guess_mime(&name).to_string(),
                name,
                size: metadata.len(),
                path: path.to_path_buf(),
                preview: None,
            });
        }

        if preview {
            let previews = join_all(batch.iter().map(|item| async move {
                if !is_text_file(&item.name, &item.mime_type) {
                    return None;
                }
                match read_preview(&item.path).await {
                    Ok(preview) => Some(preview),
                    Err(e) => {
                        tracing::warn!(file = %item.name, error = %e, "Failed to read text preview");
                        None
                    }
                }
            }))
            .await;

            for (item, preview) in batch.iter_mut().zip(previews) {
                item.preview = preview;
            }
        }

        let added = batch.len();
        self.append(batch);
        Ok(added)
    }

    fn append(&mut self, batch: Vec<UploadItem>) {
        self.total_size += batch.iter().map(|item| item.size).sum::<u64>();
        self.items.extend(batch);
        self.refresh_error();
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let Some(position) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        let item = self.items.remove(position);
        self.total_size -= item.size;
        self.refresh_error();
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total_size = 0;
        self.error = None;
    }

    fn refresh_error(&mut self) {
        self.error = if self.total_size > MAX_TOTAL_SIZE {
            Some(format!(
                "Total size {} exceeds the {} limit",
                format_size(self.total_size),
                format_size(MAX_TOTAL_SIZE)
            ))
        } else {
            None
        };
    }
}

async fn read_preview(path: &Path) -> Result<String> {
    let file = tokio::fs::File::open(path)
        .await
        .context("Failed to open file")?;
    let mut buffer = Vec::new();
    file.take(PREVIEW_READ_LIMIT)
        .read_to_end(&mut buffer)
        .await
        .context("Failed to read file")?;
    Ok(truncate_preview(
        &String::from_utf8_lossy(&buffer),
        PREVIEW_LENGTH,
    ))
}
