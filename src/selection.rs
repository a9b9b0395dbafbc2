use std::collections::BTreeSet;

use anyhow::{Result, bail};

use crate::model::RemoteFile;

/// Checked files of one catalog. Only ids present in that catalog can be members.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    known: BTreeSet<String>,
    selected: BTreeSet<String>,
}

impl Selection {
    pub fn new(files: &[RemoteFile]) -> Self {
        Self {
            known: files.iter().map(|f| f.id.clone()).collect(),
            selected: BTreeSet::new(),
        }
    }

    /// Flips membership of `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        if !self.known.contains(id) {
            bail!("No file with id {}", id);
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.to_string());
            Ok(true)
        }
    }

    /// Toggles the file at a 1-based position in `files`.
    pub fn toggle_index(&mut self, files: &[RemoteFile], index: usize) -> Result<bool> {
        let Some(file) = index.checked_sub(1).and_then(|i| files.get(i)) else {
            bail!("No file at position {} (1-{})", index, files.len());
        };
        self.toggle(&file.id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Selected files, in catalog order.
    pub fn selected<'a>(&self, files: &'a [RemoteFile]) -> Vec<&'a RemoteFile> {
        files.iter().filter(|f| self.contains(&f.id)).collect()
    }
}
