use std::path::PathBuf;

/// A parsed `KEY=VALUE` entry from an env file or input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub source: Option<PathBuf>,
    pub line: u32,
}

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Empty or whitespace-only.
    Blank,
    /// First non-whitespace character is `#`.
    Comment,
    /// No `=` outside a comment; skipped without failing the load.
    Malformed { line: u32 },
    Entry(Entry),
}

/// Summary of the load operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub files_read: usize,
    pub loaded: usize,
    pub skipped_existing: usize,
    pub malformed_lines: usize,
}
