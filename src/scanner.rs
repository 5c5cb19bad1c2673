//! Line-oriented statement scanner.
//!
//! The scanner walks a file one line at a time and keeps two pieces of state:
//! whether it is inside a `/* ... */` block comment, and whether it is inside
//! a call to the target function whose parentheses have not balanced yet.
//! Both reporting and stripping are driven by [`StatementScanner::advance`],
//! a pure step from `(state, line)` to a [`Step`].
//!
//! This is a heuristic, not a parser. Parentheses and comment markers inside
//! string literals are counted like any other text, so a call whose
//! parentheses never balance swallows the rest of the file.

use crate::config::SweepConfig;
use std::iter::Enumerate;
use std::slice::Split;

pub const LINE_COMMENT: &str = "//";
pub const BLOCK_COMMENT_OPEN: &str = "/*";
pub const BLOCK_COMMENT_CLOSE: &str = "*/";

/// Longest statement text shown in a match record, ellipsis included
pub const MAX_STATEMENT_CHARS: usize = 500;
const ELLIPSIS: &str = "...";

/// A detected call with its 1-based line span and display text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl MatchRecord {
    pub fn is_multi_line(&self) -> bool {
        self.end_line > self.start_line
    }
}

/// Result of stripping a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub content: Vec<u8>,
    pub changed: bool,
}

/// What the scanner decided about one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Line is not part of a call; keep it as-is
    Keep,
    /// Line belongs to a call that is still open
    Consumed,
    /// Line closes a call
    Closed(MatchRecord),
}

/// Per-file scan state. Start each file from `ScanState::default()`.
#[derive(Debug, Default)]
pub struct ScanState {
    in_block_comment: bool,
    call: Option<OpenCall>,
}

impl ScanState {
    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }

    pub fn in_call(&self) -> bool {
        self.call.is_some()
    }

    /// Current parenthesis depth of the open call, zero when none is open
    pub fn paren_depth(&self) -> usize {
        self.call.as_ref().map_or(0, |call| call.depth)
    }
}

#[derive(Debug)]
struct OpenCall {
    start_line: usize,
    depth: usize,
    lines: Vec<String>,
}

impl OpenCall {
    fn finish(self, end_line: usize) -> MatchRecord {
        MatchRecord {
            start_line: self.start_line,
            end_line,
            text: truncate_statement(&self.lines.join("\n")),
        }
    }
}

/// Finds calls to one target function, e.g. `console.log`
#[derive(Debug, Clone)]
pub struct StatementScanner {
    target_call: String,
}

impl StatementScanner {
    pub fn new(target_call: impl Into<String>) -> Self {
        StatementScanner {
            target_call: target_call.into(),
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.target_call.clone())
    }

    /// Advance `state` over one line. `index` is the 0-based line index.
    ///
    /// An open call takes every line until its parentheses balance, comment
    /// markers included. Outside a call, a line that opens, continues or
    /// closes a block comment is never searched for the target, and neither
    /// is a line starting with `//`.
    pub fn advance(&self, state: &mut ScanState, index: usize, line: &str) -> Step {
        let line_no = index + 1;

        if let Some(mut call) = state.call.take() {
            call.lines.push(strip_cr(line).to_owned());
            if balance(line, &mut call.depth) {
                return Step::Closed(call.finish(line_no));
            }
            state.call = Some(call);
            return Step::Consumed;
        }

        if state.in_block_comment {
            state.in_block_comment = block_comment_left_open(line, true);
            return Step::Keep;
        }

        if line.trim_start().starts_with(LINE_COMMENT) {
            return Step::Keep;
        }

        if line.contains(BLOCK_COMMENT_OPEN) {
            state.in_block_comment = block_comment_left_open(line, false);
            return Step::Keep;
        }

        let Some(start) = line.find(self.target_call.as_str()) else {
            return Step::Keep;
        };
        if line[..start].contains(LINE_COMMENT) {
            return Step::Keep;
        }

        // A bare reference such as `const log = console.log;` is not a call
        let rest = &line[start..];
        let Some(paren) = rest.find('(') else {
            return Step::Keep;
        };

        let mut depth = 0;
        if balance(&rest[paren..], &mut depth) {
            return Step::Closed(MatchRecord {
                start_line: line_no,
                end_line: line_no,
                text: truncate_statement(line.trim()),
            });
        }

        state.call = Some(OpenCall {
            start_line: line_no,
            depth,
            lines: vec![strip_cr(line).to_owned()],
        });
        Step::Consumed
    }

    /// Lazily yield every closed call in `content`
    pub fn matches<'a>(&'a self, content: &'a [u8]) -> Matches<'a> {
        Matches {
            scanner: self,
            state: ScanState::default(),
            lines: split_lines(content).enumerate(),
        }
    }

    /// Drop every line that belongs to a call. Kept lines are byte-identical
    /// to the input and stay in order.
    pub fn strip(&self, content: &[u8]) -> FileEdit {
        let mut state = ScanState::default();
        let mut kept: Vec<&[u8]> = Vec::new();
        let mut changed = false;

        for (index, raw) in split_lines(content).enumerate() {
            let line = String::from_utf8_lossy(raw);
            match self.advance(&mut state, index, &line) {
                Step::Keep => kept.push(raw),
                Step::Consumed | Step::Closed(_) => changed = true,
            }
        }

        if !changed {
            return FileEdit {
                content: content.to_vec(),
                changed,
            };
        }

        FileEdit {
            content: kept.join(&b'\n'),
            changed,
        }
    }
}

/// Iterator returned by [`StatementScanner::matches`]
pub struct Matches<'a> {
    scanner: &'a StatementScanner,
    state: ScanState,
    lines: Enumerate<Split<'a, u8, fn(&u8) -> bool>>,
}

impl Iterator for Matches<'_> {
    type Item = MatchRecord;

    fn next(&mut self) -> Option<MatchRecord> {
        for (index, raw) in self.lines.by_ref() {
            let line = String::from_utf8_lossy(raw);
            if let Step::Closed(record) = self.scanner.advance(&mut self.state, index, &line) {
                return Some(record);
            }
        }
        None
    }
}

/// Cap `text` at [`MAX_STATEMENT_CHARS`] characters, ending in "..." when cut
pub fn truncate_statement(text: &str) -> String {
    if text.chars().count() <= MAX_STATEMENT_CHARS {
        return text.to_string();
    }
    let keep = MAX_STATEMENT_CHARS - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn is_newline(byte: &u8) -> bool {
    *byte == b'\n'
}

// Lines keep any trailing '\r'; output is rejoined with '\n' only.
fn split_lines(content: &[u8]) -> Split<'_, u8, fn(&u8) -> bool> {
    content.split(is_newline as fn(&u8) -> bool)
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Count parentheses into `depth`; true once it drops back to zero
fn balance(text: &str, depth: &mut usize) -> bool {
    for ch in text.chars() {
        match ch {
            '(' => *depth += 1,
            ')' => {
                *depth = depth.saturating_sub(1);
                if *depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Whether a block comment is still open at the end of `line`
fn block_comment_left_open(line: &str, mut open: bool) -> bool {
    let mut rest = line;
    loop {
        let token = if open {
            BLOCK_COMMENT_CLOSE
        } else {
            BLOCK_COMMENT_OPEN
        };
        match rest.find(token) {
            Some(pos) => {
                open = !open;
                rest = &rest[pos + token.len()..];
            }
            None => return open,
        }
    }
}
