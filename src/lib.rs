//! logstrip - find, strip and restore `console.log` calls
//!
//! logstrip walks a source tree and reports every call to a target logging
//! function, or removes those calls in place while keeping a `.bak` copy of
//! each changed file so the edit can be reverted.
//!
//! ## Architecture
//!
//! - `config`: the built-in sweep table (target call, skip list, extensions)
//! - `filter`: which paths are pruned and which files are scanned
//! - `scanner`: the line-oriented state machine that finds calls
//! - `mutator`: backup-first rewriting and restoring
//! - `source`: filesystem access, real or in-memory
//! - `walker`: depth-first traversal tying it all together

pub mod backup;
pub mod config;
pub mod filter;
pub mod mutator;
pub mod scanner;
pub mod source;
pub mod walker;

// Re-export commonly used items
pub use backup::{from_backup, is_backup, to_backup};
pub use config::SweepConfig;
pub use filter::PathFilter;
pub use mutator::FileMutator;
pub use scanner::{
    truncate_statement, FileEdit, MatchRecord, ScanState, StatementScanner, Step,
    MAX_STATEMENT_CHARS,
};
pub use source::{Access, DiskSource, Entry, EntryKind, EntrySource, MemorySource};
pub use walker::{Mode, WalkSummary, Walker};
