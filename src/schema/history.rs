use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::types::{HistoryRecord, Records, SchemaType};
use super::{Extraction, Extractor};
use crate::process::header::{cell, find_containing, fold_headers};
use crate::process::split::Document;
use crate::process::utils::{fold_upper, strip_accents};

static DEDUP_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\d+$").unwrap());

/// Students down the side, one column per past edition.
pub struct History;

/// Rename the n-th repeat of a label to `label_n` so every column stays addressable.
pub fn dedupe_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    raw.iter()
        .map(|h| {
            let count = seen.entry(h.as_str()).or_insert(0);
            let label = if *count == 0 {
                h.clone()
            } else {
                format!("{}_{}", h, count)
            };
            *count += 1;
            label
        })
        .collect()
}

/// Columns that look like editions or years. The name column never counts.
fn edition_columns(headers: &[String], name_idx: Option<usize>) -> Vec<usize> {
    let looks_like_edition = |label: &str| {
        let base = DEDUP_SUFFIX.replace(label, "");
        let folded = fold_upper(&base);
        base.contains("202")
            || base.contains('[')
            || folded.contains("ANO")
            || folded.contains("ED")
            || folded.contains("DIAG")
            || (!base.is_empty() && base.chars().all(|c| c.is_ascii_digit()))
    };

    let picked: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| Some(*i) != name_idx && looks_like_edition(h))
        .map(|(i, _)| i)
        .collect();

    if picked.is_empty() && name_idx.is_some() {
        return (0..headers.len()).filter(|i| Some(*i) != name_idx).collect();
    }
    picked
}

impl Extractor for History {
    const SCHEMA: SchemaType = SchemaType::History;
    const KEYWORDS: &'static [&'static str] = &["ALUNOS"];

    /// `ALUNOS` alone is weak: also require a bracketed subject, a year
    /// fragment or an edition/year word, unless the file name says it is a
    /// history export.
    fn confirm(doc: &Document, header_idx: usize, filename: &str) -> bool {
        let pivoted = doc.row(header_idx).iter().any(|h| {
            let folded = fold_upper(h);
            h.contains('[') || h.contains("202") || folded.contains("ANO") || folded.contains("EDICAO")
        });
        pivoted || strip_accents(filename).to_lowercase().contains("historico")
    }

    fn extract(doc: &Document, header_idx: usize) -> Extraction {
        let headers = dedupe_headers(doc.row(header_idx));
        let folded = fold_headers(&headers);
        let name_idx = find_containing(&folded, &["ALUNOS", "NOME"]);
        let columns = edition_columns(&headers, name_idx);
        debug!(?name_idx, editions = columns.len(), "history columns");

        let records = doc
            .rows_after(header_idx)
            .filter(|(_, row)| row.len() >= 2)
            .map(|(_, row)| HistoryRecord {
                name: cell(row, name_idx).unwrap_or_default().to_string(),
                school: String::new(),
                results: columns
                    .iter()
                    .map(|&i| (headers[i].clone(), row.get(i).cloned().unwrap_or_default()))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect();

        Extraction {
            headers,
            records: Records::History(records),
        }
    }
}
