//! Depth-first traversal dispatching files to the scanner, mutator or reverter.

use crate::backup::is_backup;
use crate::filter::PathFilter;
use crate::mutator::FileMutator;
use crate::scanner::{MatchRecord, StatementScanner};
use crate::source::{Entry, EntryKind, EntrySource};
use anyhow::{bail, Context, Result};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, error, warn};

/// What a run does with the files it visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print every match, write nothing
    Report,
    /// Strip matches in place, keeping a backup of each changed file
    Remove,
    /// Restore every backup under the root and delete it
    Revert,
}

/// Counters for one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    /// Files that passed the path and extension filters
    pub files_scanned: usize,
    /// Match records printed in report mode
    pub matches: usize,
    pub files_updated: usize,
    pub files_reverted: usize,
    /// Files whose read, write or remove failed
    pub failures: usize,
    /// Directories that could not be listed
    pub inaccessible: usize,
}

pub struct Walker<'a, S: EntrySource> {
    source: &'a S,
    filter: &'a PathFilter,
    scanner: &'a StatementScanner,
    backup_suffix: &'a str,
}

impl<'a, S: EntrySource> Walker<'a, S> {
    pub fn new(
        source: &'a S,
        filter: &'a PathFilter,
        scanner: &'a StatementScanner,
        backup_suffix: &'a str,
    ) -> Self {
        Walker {
            source,
            filter,
            scanner,
            backup_suffix,
        }
    }

    /// Walk `root` in `mode`, writing user-facing lines to `out`.
    ///
    /// Only a failing `out` or an unusable root aborts the walk. Other errors
    /// are logged and the walk moves on to the next entry.
    pub fn walk<W: Write>(&self, root: &Path, mode: Mode, out: &mut W) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();

        let kind = self
            .source
            .root_kind(root)
            .with_context(|| format!("cannot access {}", root.display()))?;

        match kind {
            EntryKind::Dir => {
                let children = self
                    .source
                    .list_children(root)
                    .with_context(|| format!("cannot read directory {}", root.display()))?;
                for child in children {
                    self.visit(root, child, mode, out, &mut summary)?;
                }
            }
            EntryKind::File => self.visit_file(root, root, mode, out, &mut summary)?,
            EntryKind::Other => {
                warn!("Root is neither a file nor a directory: {}", root.display());
                bail!("{} is not a file or directory", root.display());
            }
        }

        Ok(summary)
    }

    fn visit<W: Write>(
        &self,
        root: &Path,
        entry: Entry,
        mode: Mode,
        out: &mut W,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        match entry.kind {
            EntryKind::Dir => {
                // Backups are restored wherever they are, so revert never prunes
                if mode != Mode::Revert && self.filter.should_skip(relative(root, &entry.path)) {
                    debug!("Pruning skipped directory: {}", entry.path.display());
                    return Ok(());
                }

                match self.source.list_children(&entry.path) {
                    Ok(children) => {
                        for child in children {
                            self.visit(root, child, mode, out, summary)?;
                        }
                    }
                    Err(err) => {
                        log_access_error(&entry.path, &err);
                        summary.inaccessible += 1;
                    }
                }
            }
            EntryKind::File => self.visit_file(root, &entry.path, mode, out, summary)?,
            EntryKind::Other => debug!("Skipping non-regular entry: {}", entry.path.display()),
        }
        Ok(())
    }

    fn visit_file<W: Write>(
        &self,
        root: &Path,
        path: &Path,
        mode: Mode,
        out: &mut W,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        let mutator = FileMutator::new(self.source, self.scanner, self.backup_suffix);

        match mode {
            Mode::Revert => {
                if is_backup(path, self.backup_suffix) {
                    self.revert_file(&mutator, path, out, summary)?;
                }
            }
            Mode::Report => {
                if self.is_candidate(root, path) {
                    summary.files_scanned += 1;
                    self.report_file(path, out, summary)?;
                }
            }
            Mode::Remove => {
                if self.is_candidate(root, path) {
                    summary.files_scanned += 1;
                    self.strip_file(&mutator, path, out, summary)?;
                }
            }
        }
        Ok(())
    }

    fn is_candidate(&self, root: &Path, path: &Path) -> bool {
        let rel = relative(root, path);
        !self.filter.should_skip(rel) && self.filter.is_relevant_extension(rel)
    }

    fn report_file<W: Write>(
        &self,
        path: &Path,
        out: &mut W,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        let content = match self.source.read(path) {
            Ok(content) => content,
            Err(err) => {
                error!("error reading file {}: {}", path.display(), err);
                summary.failures += 1;
                return Ok(());
            }
        };

        for record in self.scanner.matches(&content) {
            write_match(out, path, &record)?;
            summary.matches += 1;
        }
        Ok(())
    }

    fn strip_file<W: Write>(
        &self,
        mutator: &FileMutator<'_, S>,
        path: &Path,
        out: &mut W,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        match mutator.apply(path) {
            Ok(true) => {
                writeln!(
                    out,
                    "Updated file: {} (backup created at {})",
                    path.display(),
                    mutator.backup_path(path).display()
                )?;
                summary.files_updated += 1;
            }
            Ok(false) => {}
            Err(err) => {
                error!("{:#}", err);
                summary.failures += 1;
            }
        }
        Ok(())
    }

    fn revert_file<W: Write>(
        &self,
        mutator: &FileMutator<'_, S>,
        path: &Path,
        out: &mut W,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        match mutator.revert(path) {
            Ok(original) => {
                writeln!(out, "Reverted file: {} (backup deleted)", original.display())?;
                summary.files_reverted += 1;
            }
            Err(err) => {
                error!("{:#}", err);
                summary.failures += 1;
            }
        }
        Ok(())
    }
}

/// Path used for filtering: relative to the root, or the file name when the
/// root is the file itself
fn relative<'p>(root: &Path, path: &'p Path) -> &'p Path {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path.file_name().map(Path::new).unwrap_or(path),
    }
}

fn write_match<W: Write>(out: &mut W, path: &Path, record: &MatchRecord) -> io::Result<()> {
    if record.is_multi_line() {
        write!(
            out,
            "File: {}\nLines {}-{}: {}\n\n",
            path.display(),
            record.start_line,
            record.end_line,
            record.text
        )
    } else {
        write!(
            out,
            "File: {}\nLine {}: {}\n\n",
            path.display(),
            record.start_line,
            record.text
        )
    }
}

fn log_access_error(path: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::PermissionDenied {
        warn!("Skipping (permission denied): {}", path.display());
    } else {
        warn!("Skipping (access error): {}: {}", path.display(), err);
    }
}
