//! Built-in sweep table loading from sweep.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Structure to deserialize the sweep table from TOML
#[derive(Debug, Deserialize)]
struct SweepTable {
    target_call: String,
    backup_suffix: String,
    files: FilesConfig,
    skip: HashMap<String, SkipGroup>,
}

#[derive(Debug, Deserialize)]
struct FilesConfig {
    extensions: Vec<String>,
    #[serde(default)]
    minified_markers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SkipGroup {
    patterns: Vec<String>,
}

// Embed the TOML file directly in the binary at compile time
const SWEEP_TOML: &str = include_str!("../sweep.toml");

/// Process-wide configuration, built once at startup and handed to the
/// filter, scanner and walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Literal text of the call to find, e.g. `console.log`
    pub target_call: String,
    /// Suffix appended to an original path to name its backup
    pub backup_suffix: String,
    /// Lowercase extensions without the leading dot
    pub extensions: Vec<String>,
    /// Substrings marking minified files, which are never scanned
    pub minified_markers: Vec<String>,
    /// Flattened, de-duplicated skip substrings
    pub skip_patterns: Vec<String>,
}

impl SweepConfig {
    /// Parse the table embedded in the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml(SWEEP_TOML).context("Failed to parse embedded sweep table")
    }

    /// Parse a sweep table from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let table: SweepTable = toml::from_str(text)?;

        if table.target_call.is_empty() {
            anyhow::bail!("target_call must not be empty");
        }
        if table.backup_suffix.is_empty() {
            anyhow::bail!("backup_suffix must not be empty");
        }

        // Group names only document where an entry comes from; "target" is
        // listed by both the JVM and Rust groups, so collapse duplicates.
        let skip_patterns: BTreeSet<String> = table
            .skip
            .into_values()
            .flat_map(|group| group.patterns)
            .filter(|p| !p.is_empty())
            .collect();

        let extensions = table
            .files
            .extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        Ok(SweepConfig {
            target_call: table.target_call,
            backup_suffix: table.backup_suffix,
            extensions,
            minified_markers: table.files.minified_markers,
            skip_patterns: skip_patterns.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_parses() {
        let config = SweepConfig::builtin().unwrap();
        assert_eq!(config.target_call, "console.log");
        assert_eq!(config.backup_suffix, ".bak");
        assert!(config.extensions.iter().any(|e| e == "tsx"));
        assert!(config.skip_patterns.iter().any(|p| p == "node_modules"));
        assert!(config.skip_patterns.iter().any(|p| p == "*.min.js"));
    }

    #[test]
    fn test_duplicate_skip_entries_collapse() {
        let config = SweepConfig::builtin().unwrap();
        let targets = config
            .skip_patterns
            .iter()
            .filter(|p| p.as_str() == "target")
            .count();
        assert_eq!(targets, 1);
    }

    #[test]
    fn test_extensions_are_normalized() {
        let config = SweepConfig::from_toml(
            r#"
target_call = "debug.print"
backup_suffix = ".orig"

[files]
extensions = [".JS", "md"]

[skip.misc]
patterns = ["out"]
"#,
        )
        .unwrap();
        assert_eq!(config.extensions, vec!["js", "md"]);
        assert!(config.minified_markers.is_empty());
        assert_eq!(config.skip_patterns, vec!["out"]);
    }

    #[test]
    fn test_empty_target_call_rejected() {
        let result = SweepConfig::from_toml(
            r#"
target_call = ""
backup_suffix = ".bak"

[files]
extensions = ["js"]

[skip]
"#,
        );
        assert!(result.is_err());
    }
}
