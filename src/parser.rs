use std::collections::HashMap;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, ScanError};
use crate::model::{Entry, Line};

/// Longest accepted line, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Parse env entries from UTF-8 text.
///
/// Malformed lines are skipped. When a key repeats, the last value wins and
/// keeps the position of the first occurrence.
pub fn parse_str(input: &str) -> Result<Vec<Entry>, Error> {
    parse_reader(input.as_bytes())
}

/// Parse env entries from a buffered reader.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::new();
    let mut by_key = HashMap::<String, usize>::new();

    for line in Scanner::new(reader, None) {
        let Line::Entry(entry) = line? else {
            continue;
        };

        if let Some(existing_idx) = by_key.get(&entry.key).copied() {
            entries[existing_idx] = entry;
        } else {
            by_key.insert(entry.key.clone(), entries.len());
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Line-by-line reader that classifies each line as it is read.
///
/// Iteration stops after the first error.
pub(crate) struct Scanner<R> {
    reader: R,
    source: Option<PathBuf>,
    buf: Vec<u8>,
    line_num: u32,
    done: bool,
}

impl<R: BufRead> Scanner<R> {
    pub(crate) fn new(reader: R, source: Option<&Path>) -> Self {
        Self {
            reader,
            source: source.map(Path::to_path_buf),
            buf: Vec::new(),
            line_num: 0,
            done: false,
        }
    }

    fn read_next(&mut self) -> Result<Option<String>, ScanError> {
        self.buf.clear();
        // Room for the longest line plus a `\r\n` terminator.
        let limit = MAX_LINE_LEN as u64 + 2;
        let read = (&mut self.reader).take(limit).read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        if self.buf.len() > MAX_LINE_LEN {
            return Err(ScanError::LineTooLong {
                limit: MAX_LINE_LEN,
            });
        }

        let text = String::from_utf8(std::mem::take(&mut self.buf))?;
        Ok(Some(text))
    }

    fn scan_error(&self, source: ScanError) -> Error {
        Error::Scan {
            path: self.source.clone(),
            line: self.line_num,
            source,
        }
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = Result<Line, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.line_num += 1;
        match self.read_next() {
            Ok(Some(text)) => Some(Ok(parse_line(
                &text,
                self.line_num,
                self.source.as_deref(),
            ))),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(self.scan_error(err)))
            }
        }
    }
}

pub(crate) fn parse_line(raw: &str, line_num: u32, source: Option<&Path>) -> Line {
    let working = raw.trim_start();
    if working.is_empty() {
        return Line::Blank;
    }
    if working.starts_with('#') {
        return Line::Comment;
    }

    let Some(eq_idx) = working.find('=') else {
        return Line::Malformed { line: line_num };
    };
    let key = &working[..eq_idx];
    // `KEY # note=...`: the only `=` belongs to the comment.
    if key.contains('#') {
        return Line::Malformed { line: line_num };
    }

    let value = strip_inline_comment(&working[eq_idx + 1..]).trim();
    Line::Entry(Entry {
        key: key.trim().to_owned(),
        value: unquote(value).to_owned(),
        source: source.map(Path::to_path_buf),
        line: line_num,
    })
}

fn strip_inline_comment(input: &str) -> &str {
    let leading = input.len() - input.trim_start().len();
    let mut search_from = 0usize;

    if input[leading..].starts_with('"')
        && let Some(close) = input[leading + 1..].find('"')
    {
        search_from = leading + 1 + close + 1;
    }

    match input[search_from..].find('#') {
        Some(idx) => &input[..search_from + idx],
        None => input,
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
