use csv::{ReaderBuilder, StringRecord};
use std::fmt;
use tracing::trace;

use crate::config::ParserConfig;
use crate::process::header;
use crate::process::utils::clean_str;

/// Field separator chosen once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    Semicolon,
    Comma,
}

impl Separator {
    pub fn as_char(self) -> char {
        match self {
            Separator::Semicolon => ';',
            Separator::Comma => ',',
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Semicolon only when it strictly outnumbers commas in the first `sample` lines.
pub fn detect_separator(lines: &[&str], sample: usize) -> Separator {
    let (semicolons, commas) = lines
        .iter()
        .take(sample)
        .flat_map(|l| l.chars())
        .fold((0usize, 0usize), |(s, c), ch| match ch {
            ';' => (s + 1, c),
            ',' => (s, c + 1),
            _ => (s, c),
        });
    if semicolons > commas {
        Separator::Semicolon
    } else {
        Separator::Comma
    }
}

/// Split one physical line into cleaned fields.
///
/// Semicolon files are split literally. Comma files honour double-quoted spans,
/// falling back to a naive split when the reader produces no record.
pub fn split_line(line: &str, sep: Separator) -> Vec<String> {
    match sep {
        Separator::Semicolon => line.split(';').map(clean_str).collect(),
        Separator::Comma => split_quoted(line)
            .unwrap_or_else(|| line.split(',').map(clean_str).collect()),
    }
}

fn split_quoted(line: &str) -> Option<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => Some(record.iter().map(clean_str).collect()),
        Ok(false) => None,
        Err(e) => {
            trace!(error = %e, "quoted split failed, using naive split");
            None
        }
    }
}

/// A tokenized input file: non-blank lines, each already split into fields.
#[derive(Debug, Clone)]
pub struct Document {
    pub separator: Separator,
    rows: Vec<Vec<String>>,
    header_scan_limit: usize,
}

impl Document {
    pub fn tokenize(text: &str, config: &ParserConfig) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines: Vec<&str> = text
            .split('\n')
            .filter(|l| !l.trim().is_empty())
            .collect();

        let separator = detect_separator(&lines, config.separator_sample_lines);
        let rows = lines.iter().map(|l| split_line(l, separator)).collect();

        Self {
            separator,
            rows,
            header_scan_limit: config.header_scan_limit,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> &[String] {
        &self.rows[idx]
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows after `idx`, paired with their line index.
    pub fn rows_after(&self, idx: usize) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(idx + 1)
            .map(|(i, r)| (i, r.as_slice()))
    }

    /// First line within the scan window carrying every keyword.
    pub fn locate(&self, keywords: &[&str]) -> Option<usize> {
        header::locate(&self.rows, keywords, self.header_scan_limit)
    }
}
