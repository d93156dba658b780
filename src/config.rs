use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Tunables for tokenizing and loading exports. Every key is optional in the
/// YAML file; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Rows inspected when looking for a header line.
    pub header_scan_limit: usize,
    /// Non-blank lines sampled to choose between `;` and `,`.
    pub separator_sample_lines: usize,
    /// Files larger than this are refused by the loader.
    pub max_file_bytes: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            header_scan_limit: 1000,
            separator_sample_lines: 5,
            max_file_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ParserConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing parser config YAML")
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
