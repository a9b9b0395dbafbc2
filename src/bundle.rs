use std::{
    collections::HashSet,
    io::{Cursor, Write},
    path::PathBuf,
};

use anyhow::Result;
use futures::StreamExt;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::client::TransferClient;
use crate::format::{numbered_name, safe_file_name, stem_before_first_dot};
use crate::model::RemoteFile;
use crate::platform::Platform;

/// How the folder inside the archive (and the archive itself) is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveNaming {
    #[default]
    SessionId,
    /// Stem of the first file's name, whatever the rest of the batch holds.
    FirstFile,
}

pub fn archive_folder_name(
    naming: ArchiveNaming,
    session_id: &str,
    files: &[&RemoteFile],
) -> String {
    let stem = match naming {
        ArchiveNaming::SessionId => None,
        ArchiveNaming::FirstFile => files
            .first()
            .map(|file| stem_before_first_dot(&safe_file_name(&file.name)).to_string())
            .filter(|stem| !stem.is_empty()),
    };
    stem.unwrap_or_else(|| safe_file_name(session_id))
}

#[derive(Debug)]
pub struct Archive {
    pub folder: String,
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
    pub skipped: Vec<String>,
}

impl Archive {
    pub fn file_name(&self) -> String {
        format!("{}.zip", self.folder)
    }
}

/// Fetches `files` and packs every successful one into a zip under `folder/`.
///
/// At most `jobs` files are fetched at once and entries are written in the
/// order of `files`. A file that fails to fetch is logged and left out.
/// Returns `None` when no file could be fetched.
pub async fn assemble_archive(
    client: &TransferClient,
    files: &[&RemoteFile],
    folder: &str,
    jobs: usize,
) -> Result<Option<Archive>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used_names = HashSet::new();
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    let mut fetches = futures::stream::iter(files.iter().map(|file| async move {
        let result = client.fetch_bytes(&file.url).await;
        (*file, result)
    }))
    .buffered(jobs.max(1));

    while let Some((file, result)) = fetches.next().await {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Skipping file, failed to fetch");
                skipped.push(file.name.clone());
                continue;
            }
        };

        let entry = format!("{}/{}", folder, unique_name(&mut used_names, &file.name));
        zip.start_file(entry.as_str(), options)?;
        zip.write_all(&bytes)?;
        entries.push(entry);
    }

    if entries.is_empty() {
        tracing::error!(folder, "No valid files to download");
        return Ok(None);
    }

    let bytes = zip.finish()?.into_inner();
    Ok(Some(Archive {
        folder: folder.to_string(),
        bytes,
        entries,
        skipped,
    }))
}

fn unique_name(used: &mut HashSet<String>, name: &str) -> String {
    let name = safe_file_name(name);
    let mut candidate = name.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = numbered_name(&name, n);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

#[derive(Debug)]
pub struct BundleReport {
    pub path: PathBuf,
    pub entries: Vec<String>,
    pub skipped: Vec<String>,
}

/// Builds the archive and hands it to the platform as `{folder}.zip`; the
/// in-memory archive is released as soon as it is saved. `None` means nothing
/// could be fetched and nothing was saved.
pub async fn download_bundle<P: Platform>(
    client: &TransferClient,
    platform: &P,
    files: &[&RemoteFile],
    folder: &str,
    jobs: usize,
) -> Result<Option<BundleReport>> {
    let Some(archive) = assemble_archive(client, files, folder, jobs).await? else {
        return Ok(None);
    };

    let path = platform.save_bytes(&archive.file_name(), &archive.bytes)?;
    let Archive {
        entries, skipped, ..
    } = archive;

    tracing::info!(
        path = %path.display(),
        entries = entries.len(),
        skipped = skipped.len(),
        "Archive saved"
    );
    Ok(Some(BundleReport {
        path,
        entries,
        skipped,
    }))
}
