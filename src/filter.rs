//! Path pruning and extension filtering.

use crate::config::SweepConfig;
use std::path::{Path, MAIN_SEPARATOR};

/// Decides which entries the walker visits. Paths handed to it are relative
/// to the walk root.
#[derive(Debug, Clone)]
pub struct PathFilter {
    skip_patterns: Vec<String>,
    extensions: Vec<String>,
    minified_markers: Vec<String>,
}

impl PathFilter {
    pub fn new(config: &SweepConfig) -> Self {
        PathFilter {
            skip_patterns: config.skip_patterns.clone(),
            extensions: config.extensions.clone(),
            minified_markers: config.minified_markers.clone(),
        }
    }

    /// True if the forward-slash form of `path` contains any skip pattern.
    ///
    /// Patterns are plain substrings: "env" also matches "environment", and
    /// "*.min.js" only matches a path with a literal asterisk in it.
    pub fn should_skip(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        self.skip_patterns
            .iter()
            .any(|pattern| normalized.contains(pattern.as_str()))
    }

    /// True for files whose lowercase extension is allowed and that do not
    /// look minified
    pub fn is_relevant_extension(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if self
            .minified_markers
            .iter()
            .any(|marker| path_str.contains(marker.as_str()))
        {
            return false;
        }

        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

fn normalize(path: &Path) -> String {
    let lossy = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        lossy.into_owned()
    } else {
        lossy.replace(MAIN_SEPARATOR, "/")
    }
}
