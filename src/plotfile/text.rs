use std::{fs, path::Path, str::FromStr};

use super::error::{Error, Result};

/// Line-by-line reader over an ASCII header, tracking the line number for
/// error messages.
pub(crate) struct TextCursor<'a> {
    path: &'a Path,
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> TextCursor<'a> {
    pub fn new(path: &'a Path, text: &'a str) -> Self {
        Self {
            path,
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    pub fn error(&self, details: impl Into<String>) -> Error {
        Error::parse(self.path, self.pos, details)
    }

    pub fn next_line(&mut self, what: &str) -> Result<&'a str> {
        match self.lines.get(self.pos) {
            Some(line) => {
                self.pos += 1;
                Ok(line.trim())
            }
            None => Err(self.error(format!("unexpected end of file, expected {}", what))),
        }
    }

    pub fn next_parsed<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let line = self.next_line(what)?;
        line.parse()
            .map_err(|_| self.error(format!("expected {}, found '{}'", what, line)))
    }

    /// Parses every whitespace-separated token of the next line.
    pub fn next_values<T: FromStr>(&mut self, what: &str) -> Result<Vec<T>> {
        let line = self.next_line(what)?;
        line.split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| self.error(format!("expected {}, found '{}'", what, token)))
            })
            .collect()
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
