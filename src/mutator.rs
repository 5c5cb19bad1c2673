//! In-place stripping with backups, and restoring from those backups.

use crate::backup::{from_backup, to_backup};
use crate::scanner::StatementScanner;
use crate::source::EntrySource;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct FileMutator<'a, S: EntrySource> {
    source: &'a S,
    scanner: &'a StatementScanner,
    backup_suffix: &'a str,
}

impl<'a, S: EntrySource> FileMutator<'a, S> {
    pub fn new(source: &'a S, scanner: &'a StatementScanner, backup_suffix: &'a str) -> Self {
        FileMutator {
            source,
            scanner,
            backup_suffix,
        }
    }

    pub fn backup_path(&self, path: &Path) -> PathBuf {
        to_backup(path, self.backup_suffix)
    }

    /// Strip calls from `path`. Returns false, touching nothing, when the file
    /// has none.
    ///
    /// The untouched original is written to the backup before the file itself
    /// is rewritten, so a failure at any point leaves a restorable state.
    pub fn apply(&self, path: &Path) -> Result<bool> {
        let content = self
            .source
            .read(path)
            .with_context(|| format!("error reading file {}", path.display()))?;

        let edit = self.scanner.strip(&content);
        if !edit.changed {
            return Ok(false);
        }

        let backup_path = self.backup_path(path);
        self.source
            .write(&backup_path, &content)
            .with_context(|| format!("error creating backup file {}", backup_path.display()))?;

        self.source
            .write(path, &edit.content)
            .with_context(|| format!("error writing file {}", path.display()))?;

        Ok(true)
    }

    /// Copy `backup_path` over its original and delete it. The backup is only
    /// removed once the original has been written. Returns the original path.
    pub fn revert(&self, backup_path: &Path) -> Result<PathBuf> {
        let original_path = from_backup(backup_path, self.backup_suffix)?;

        let content = self
            .source
            .read(backup_path)
            .with_context(|| format!("error reading backup file {}", backup_path.display()))?;

        self.source
            .write(&original_path, &content)
            .with_context(|| format!("error writing original file {}", original_path.display()))?;

        self.source
            .remove(backup_path)
            .with_context(|| format!("error removing backup file {}", backup_path.display()))?;

        Ok(original_path)
    }
}
