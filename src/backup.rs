//! Mapping between original paths and their backup siblings.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// `src/app.js` -> `src/app.js.bak`
pub fn to_backup(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// `src/app.js.bak` -> `src/app.js`. Fails when the file name does not end in
/// `suffix` or nothing is left once it is stripped.
pub fn from_backup(path: &Path, suffix: &str) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a backup file name: {}", path.display()))?;

    match name.strip_suffix(suffix) {
        Some(stem) if !stem.is_empty() => Ok(path.with_file_name(stem)),
        _ => bail!("{} does not end in {}", path.display(), suffix),
    }
}

/// True if `path` names a backup that [`from_backup`] can resolve
pub fn is_backup(path: &Path, suffix: &str) -> bool {
    from_backup(path, suffix).is_ok()
}
