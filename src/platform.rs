use std::{
    fs,
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::client::{TransferClient, USER_AGENT};
use crate::format::{numbered_name, safe_file_name};

/// A fetched file handed to the platform share capability.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Host capabilities the transfer flows need: clipboard, share, saving files
/// and the user agent used to pick mobile behaviour.
#[allow(async_fn_in_trait)]
pub trait Platform {
    fn user_agent(&self) -> String;

    fn copy_to_clipboard(&self, text: &str) -> Result<()>;

    fn can_share(&self) -> bool;

    fn share(&self, files: Vec<SharedFile>) -> Result<()>;

    /// Saves an in-memory file, returning where it landed.
    fn save_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// Saves a remote file without buffering it whole.
    async fn save_url(&self, client: &TransferClient, name: &str, url: &str) -> Result<PathBuf>;
}

/// Saves into a local directory and copies through the terminal's OSC 52 clipboard support.
pub struct TerminalPlatform {
    out_dir: PathBuf,
}

impl TerminalPlatform {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn staging_file(&self) -> Result<NamedTempFile> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("Failed to create {}", self.out_dir.display()))?;
        NamedTempFile::new_in(&self.out_dir).context("Failed to create temporary file")
    }

    // The staged file is removed on drop unless it was persisted.
    fn persist(&self, staged: NamedTempFile, name: &str) -> Result<PathBuf> {
        let destination = free_destination(&self.out_dir, &safe_file_name(name));
        staged
            .persist_noclobber(&destination)
            .with_context(|| format!("Failed to save {}", destination.display()))?;
        Ok(destination)
    }
}

/// Writes `text` as an OSC 52 clipboard request. Refuses when `out` is not a
/// terminal, where the sequence would end up in piped output.
fn write_osc52(out: &mut impl Write, is_terminal: bool, text: &str) -> Result<()> {
    if !is_terminal {
        bail!("Clipboard needs an interactive terminal");
    }
    write!(out, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
    out.flush()?;
    Ok(())
}

fn free_destination(dir: &Path, name: &str) -> PathBuf {
    let mut destination = dir.join(name);
    let mut n = 2;
    while destination.exists() {
        destination = dir.join(numbered_name(name, n));
        n += 1;
    }
    destination
}

impl Platform for TerminalPlatform {
    fn user_agent(&self) -> String {
        USER_AGENT.to_string()
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        let is_terminal = stdout.is_terminal();
        write_osc52(&mut stdout, is_terminal, text)
    }

    fn can_share(&self) -> bool {
        false
    }

    fn share(&self, _files: Vec<SharedFile>) -> Result<()> {
        bail!("Sharing is not available from a terminal")
    }

    fn save_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut staged = self.staging_file()?;
        staged.write_all(bytes).context("Failed to write file")?;
        self.persist(staged, name)
    }

    async fn save_url(&self, client: &TransferClient, name: &str, url: &str) -> Result<PathBuf> {
        let mut response = client.get(url).await?;
        let mut staged = self.staging_file()?;

        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to download {}", name))?
        {
            staged.write_all(&chunk).context("Failed to write file")?;
        }

        self.persist(staged, name)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every platform call in memory.
    #[derive(Default)]
    pub struct RecordingPlatform {
        pub user_agent: String,
        pub shareable: bool,
        pub fail_clipboard: bool,
        pub clipboard: Mutex<Vec<String>>,
        pub saved: Mutex<Vec<(String, Vec<u8>)>>,
        pub shared: Mutex<Vec<SharedFile>>,
    }

    impl RecordingPlatform {
        pub fn saved_names(&self) -> Vec<String> {
            self.saved
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    impl Platform for RecordingPlatform {
        fn user_agent(&self) -> String {
            self.user_agent.clone()
        }

        fn copy_to_clipboard(&self, text: &str) -> Result<()> {
            if self.fail_clipboard {
                bail!("clipboard unavailable");
            }
            self.clipboard.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn can_share(&self) -> bool {
            self.shareable
        }

        fn share(&self, files: Vec<SharedFile>) -> Result<()> {
            self.shared.lock().unwrap().extend(files);
            Ok(())
        }

        fn save_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
            self.saved
                .lock()
                .unwrap()
                .push((name.to_string(), bytes.to_vec()));
            Ok(PathBuf::from(name))
        }

        async fn save_url(
            &self,
            client: &TransferClient,
            name: &str,
            url: &str,
        ) -> Result<PathBuf> {
            let bytes = client.fetch_bytes(url).await?;
            self.save_bytes(name, &bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_bytes_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let platform = TerminalPlatform::new(dir.path().join("out"));

        let first = platform.save_bytes("report.pdf", b"one").unwrap();
        let second = platform.save_bytes("report.pdf", b"two").unwrap();

        assert_eq!(first, dir.path().join("out/report.pdf"));
        assert_eq!(second, dir.path().join("out/report (2).pdf"));
        assert_eq!(fs::read(&first).unwrap(), b"one");
        assert_eq!(fs::read(&second).unwrap(), b"two");
        assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 2);
    }

    #[test]
    fn test_save_bytes_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let platform = TerminalPlatform::new(dir.path());

        let saved = platform.save_bytes("../escape.txt", b"x").unwrap();
        assert_eq!(saved, dir.path().join("escape.txt"));
    }

    #[test]
    fn test_osc52_only_on_terminal() {
        let mut piped: Vec<u8> = Vec::new();
        assert!(write_osc52(&mut piped, false, "https://share.example/d/abc").is_err());
        assert!(piped.is_empty());

        let mut tty: Vec<u8> = Vec::new();
        write_osc52(&mut tty, true, "hi").unwrap();
        assert_eq!(tty, b"\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn test_terminal_cannot_share() {
        let platform = TerminalPlatform::new(".");
        assert!(!platform.can_share());
        assert!(platform.share(Vec::new()).is_err());
        assert!(platform.user_agent().starts_with("threef/"));
    }
}
