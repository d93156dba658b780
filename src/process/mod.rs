// src/process/mod.rs
pub mod decode;
pub mod header;
pub mod split;
pub mod utils;

use anyhow::{bail, Context, Result};
use glob::glob;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

use crate::config::ParserConfig;
use crate::schema::{classify, ParsedReport};
use decode::decode_text;
use split::Document;

/// File extensions picked up when an input is a directory.
const INPUT_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Tokenize, classify and extract one export. Never fails: unrecognised
/// content comes back as an `UNKNOWN` report with no headers or records.
#[instrument(level = "debug", skip(text, config), fields(bytes = text.len()))]
pub fn parse_report(filename: &str, text: &str, config: &ParserConfig) -> ParsedReport {
    let doc = Document::tokenize(text, config);
    let extraction = classify(&doc, filename);
    let report = ParsedReport::new(filename, extraction.headers, extraction.records);
    debug!(
        separator = %doc.separator,
        lines = doc.len(),
        schema = %report.schema_type(),
        records = report.records.len(),
        "classified"
    );
    report
}

/// Read, size-check, decode and parse a file from disk.
#[instrument(level = "info", skip(path, config), fields(path = %path.as_ref().display()))]
pub fn load_report<P: AsRef<Path>>(path: P, config: &ParserConfig) -> Result<ParsedReport> {
    let path = path.as_ref();
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    if size > config.max_file_bytes {
        warn!(size, limit = config.max_file_bytes, "file over size limit");
        bail!(
            "{} is {} bytes, over the {} byte limit",
            path.display(),
            size,
            config.max_file_bytes
        );
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = decode_text(&bytes);
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(parse_report(&filename, &text, config))
}

/// Load every path in parallel. One failing file never affects the others.
pub fn parse_batch(paths: &[PathBuf], config: &ParserConfig) -> Vec<(PathBuf, Result<ParsedReport>)> {
    paths
        .par_iter()
        .map(|p| {
            let res = load_report(p, config);
            if let Err(e) = &res {
                warn!(path = %p.display(), error = %e, "failed to load");
            }
            (p.clone(), res)
        })
        .collect()
}

/// Expand CLI inputs: plain files pass through, directories contribute every
/// `*.csv` / `*.txt` beneath them, anything else is treated as a glob pattern.
pub fn collect_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let path = Path::new(input);
        if path.is_file() {
            out.push(path.to_path_buf());
            continue;
        }
        let patterns: Vec<String> = if path.is_dir() {
            INPUT_EXTENSIONS
                .iter()
                .map(|ext| format!("{}/**/*.{}", input.trim_end_matches('/'), ext))
                .collect()
        } else {
            vec![input.to_string()]
        };
        for pattern in patterns {
            let matched: Vec<PathBuf> = glob(&pattern)
                .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
                .filter_map(|entry| entry.ok())
                .filter(|p| p.is_file())
                .collect();
            if matched.is_empty() {
                debug!(pattern, "no files matched");
            }
            out.extend(matched);
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sondagem::process=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
