use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

const MAX_ENTRIES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub link: String,
    pub files: usize,
    pub total_size: u64,
    /// Seconds since the Unix epoch.
    pub sent_at: u64,
}

impl HistoryEntry {
    pub fn new(id: &str, link: &str, files: usize, total_size: u64) -> Self {
        let sent_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self {
            id: id.to_string(),
            link: link.to_string(),
            files,
            total_size,
            sent_at,
        }
    }

    pub fn sent_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.sent_at)
    }
}

/// Transfers sent from this machine, most recent last.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

pub fn history_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("fr", "threef", "threef")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    Ok(project_dirs.data_dir().join("history.toml"))
}

/// Records a sent transfer. The upload already succeeded, so failures are only logged.
pub fn record(entry: HistoryEntry) {
    let result = history_path().and_then(|path| {
        let mut history = History::load(&path)?;
        history.push(entry);
        history.save(&path)
    });

    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to update transfer history");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/history.toml");

        let mut history = History::load(&path).unwrap();
        assert!(history.entries().is_empty());

        history.push(HistoryEntry::new("abc123", "https://share.example/d/abc123", 2, 1500));
        history.save(&path).unwrap();

        let loaded = History::load(&path).unwrap();
        assert_eq!(loaded.entries(), history.entries());
    }

    #[test]
    fn test_keeps_most_recent_entries() {
        let mut history = History::default();
        for i in 0..MAX_ENTRIES + 5 {
            history.push(HistoryEntry::new(&i.to_string(), "", 1, 1));
        }

        assert_eq!(history.entries().len(), MAX_ENTRIES);
        assert_eq!(history.entries()[0].id, "5");
        assert_eq!(
            history.entries().last().unwrap().id,
            (MAX_ENTRIES + 4).to_string()
        );
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.toml");
        fs::write(&path, "entries = 3").unwrap();
        assert!(History::load(&path).is_err());
    }
}
