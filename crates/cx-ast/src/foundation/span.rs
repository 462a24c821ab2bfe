//! Source location tracking for error reporting and debugging.
//!
//! # Design
//!
//! - `Span` — compact source location carrying resolved line/column
//! - `SourceFile` — single source file with a line-start index
//!
//! The parser resolves byte offsets to line/column once, at node-construction
//! time, so every AST node and diagnostic carries human-readable coordinates
//! without a lookup structure travelling alongside the tree.

use serde::{Deserialize, Serialize};

/// Resolved source location.
///
/// Line and column are 1-based. `file_id` indexes the compilation's file
/// list; single-unit parses always use file 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index of the source file within the compilation
    pub file_id: u16,
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(file_id: u16, line: u32, column: u32) -> Self {
        Self {
            file_id,
            line,
            column,
        }
    }

    /// A span pointing at the start of a file.
    pub fn start_of(file_id: u16) -> Self {
        Self::new(file_id, 1, 1)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single source file with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Logical name of this file (never read from disk by the front-end)
    pub name: String,
    /// Original source text
    pub source: String,
    /// Byte offsets of each line start; `line_starts[0]` is always 0,
    /// with an EOF sentinel as the final element
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Create a new source file with a precomputed line index.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = compute_line_starts(&source);
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Get (line, column) for a byte offset. Both are 1-based.
    ///
    /// Offsets beyond EOF clamp to the end of the last line, so spans for
    /// "unexpected end of input" diagnostics stay in range.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx.min(self.line_count().saturating_sub(1)),
            Err(idx) => idx.max(1) - 1,
        };

        let line = (line_idx + 1) as u32;
        let col = (offset - self.line_starts[line_idx]) + 1;
        (line, col)
    }

    /// Resolve a byte offset into a [`Span`] for the given file id.
    pub fn span_at(&self, file_id: u16, offset: u32) -> Span {
        let (line, column) = self.line_col(offset);
        Span::new(file_id, line, column)
    }

    /// Get the number of lines in this file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Get the text of a specific line (1-based), without its newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[(line - 1) as usize] as usize;
        let end = self.line_starts[line as usize] as usize;
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// Compute byte offsets of line starts in source text.
///
/// `line_starts[0]` is byte 0; the final element is an EOF sentinel so the
/// last line's range is computable.
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];

    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }

    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }

    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_line_starts() {
        let starts = compute_line_starts("line 1\nline 2\nline 3");
        assert_eq!(starts, vec![0, 7, 14, 20]);

        let with_trailing = compute_line_starts("line 1\nline 2\n");
        assert_eq!(with_trailing, vec![0, 7, 14]);
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new("test.cx", "hello\nworld\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(5), (1, 6));
        assert_eq!(file.line_col(6), (2, 1));
        assert_eq!(file.line_col(11), (2, 6));
    }

    #[test]
    fn test_line_col_clamps_past_eof() {
        let file = SourceFile::new("test.cx", "abc");
        assert_eq!(file.line_col(100), (1, 4));
    }

    #[test]
    fn test_line_text() {
        let file = SourceFile::new("test.cx", "hello\nworld\n");
        assert_eq!(file.line_text(1), Some("hello"));
        assert_eq!(file.line_text(2), Some("world"));
        assert_eq!(file.line_text(3), None);
    }

    #[test]
    fn test_span_display() {
        let span = Span::new(0, 3, 14);
        assert_eq!(span.to_string(), "3:14");
    }
}
