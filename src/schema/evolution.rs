use tracing::{debug, trace};

use super::types::{EvolutionRecord, Records, SchemaType};
use super::{Extraction, Extractor};
use crate::process::header::{cell, find_containing, find_exact, find_prefixed, fold_headers};
use crate::process::split::Document;
use crate::process::utils::parse_number;

/// Participation and correctness per (edition, subject).
pub struct Evolution;

/// Column positions used when neither metric header can be resolved.
/// Matches the platform's usual `EDIÇÃO;MATÉRIA;PARTICIPAÇÃO;ACERTOS` layout
/// and is not verified for reordered exports.
const FALLBACK_PARTICIPATION: usize = 2;
const FALLBACK_CORRECT: usize = 3;

impl Extractor for Evolution {
    const SCHEMA: SchemaType = SchemaType::Evolution;
    const KEYWORDS: &'static [&'static str] = &["PARTICIPACAO", "ACERTOS", "TOTAL_ALUNOS"];

    fn extract(doc: &Document, header_idx: usize) -> Extraction {
        let headers = doc.row(header_idx).to_vec();
        let folded = fold_headers(&headers);

        let edition_idx = find_containing(&folded, &["EDICAO"]);
        let subject_idx = find_containing(&folded, &["MATERIA"]);
        let mut participation_idx = find_exact(&folded, &["PARTICIPACAO"])
            .or_else(|| find_prefixed(&folded, "PARTICIPACAO"));
        let mut correct_idx =
            find_exact(&folded, &["ACERTOS"]).or_else(|| find_prefixed(&folded, "ACERTO"));

        if participation_idx.is_none() && correct_idx.is_none() && headers.len() >= 4 {
            debug!("evolution metrics unresolved, using positional columns");
            participation_idx = Some(FALLBACK_PARTICIPATION);
            correct_idx = Some(FALLBACK_CORRECT);
        }
        debug!(
            ?edition_idx,
            ?subject_idx,
            ?participation_idx,
            ?correct_idx,
            "evolution columns"
        );

        let mut records = Vec::new();
        for (line, row) in doc.rows_after(header_idx) {
            if row.len() < 3 {
                continue;
            }
            let edition = cell(row, edition_idx).map(str::trim).unwrap_or_default();
            let subject = cell(row, subject_idx).map(str::trim).unwrap_or_default();
            if edition.is_empty() || subject.is_empty() {
                trace!(line, "evolution row without edition or subject");
                continue;
            }
            records.push(EvolutionRecord {
                edition: edition.to_string(),
                subject: subject.to_string(),
                participation: parse_number(cell(row, participation_idx).unwrap_or_default()),
                correct_answers: parse_number(cell(row, correct_idx).unwrap_or_default()),
            });
        }

        Extraction {
            headers,
            records: Records::Evolution(records),
        }
    }
}
