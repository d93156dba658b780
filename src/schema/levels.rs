use tracing::trace;

use super::types::{LevelsSummaryRecord, Records, SchemaType};
use super::{Extraction, Extractor};
use crate::process::header::{cell, find_containing, find_exact, fold_headers};
use crate::process::split::Document;
use crate::process::utils::parse_number;

const MIN_FIELDS: usize = 5;

/// Per-edition distribution of students across reading levels.
pub struct LevelsSummary;

/// Exact label first so `FLUENTE` is not captured by `NAO_FLUENTE`.
fn bucket(folded: &[String], label: &str) -> Option<usize> {
    find_exact(folded, &[label]).or_else(|| find_containing(folded, &[label]))
}

impl Extractor for LevelsSummary {
    const SCHEMA: SchemaType = SchemaType::LevelsSummary;
    const KEYWORDS: &'static [&'static str] = &["FLUENTE", "FRASES", "SILABAS"];

    fn extract(doc: &Document, header_idx: usize) -> Extraction {
        let headers = doc.row(header_idx).to_vec();
        let folded = fold_headers(&headers);

        let edition_idx = find_containing(&folded, &["EDICAO"]);
        let fluent = bucket(&folded, "FLUENTE");
        let non_fluent = bucket(&folded, "NAO_FLUENTE");
        let phrases = bucket(&folded, "FRASES");
        let words = bucket(&folded, "PALAVRAS");
        let syllables = bucket(&folded, "SILABAS");
        let non_reader = bucket(&folded, "NAO_LEITOR");
        let not_evaluated = bucket(&folded, "NAO_AVALIADO");
        let not_informed = bucket(&folded, "NAO_INFORMADO");
        let total = bucket(&folded, "TOTAL");

        let num = |row: &[String], idx: Option<usize>| parse_number(cell(row, idx).unwrap_or_default());

        let records = doc
            .rows_after(header_idx)
            .filter(|(line, row)| {
                let keep = row.len() >= MIN_FIELDS;
                if !keep {
                    trace!(line, "levels row has too few fields");
                }
                keep
            })
            .map(|(line, row)| LevelsSummaryRecord {
                edition: match edition_idx {
                    Some(_) => cell(row, edition_idx).unwrap_or_default().to_string(),
                    None => format!("Edição {}", line),
                },
                fluent: num(row, fluent),
                non_fluent: num(row, non_fluent),
                phrases: num(row, phrases),
                words: num(row, words),
                syllables: num(row, syllables),
                non_reader: num(row, non_reader),
                not_evaluated: num(row, not_evaluated),
                not_informed: num(row, not_informed),
                total_students: num(row, total),
            })
            .collect();

        Extraction {
            headers,
            records: Records::LevelsSummary(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::schema::classify;

    fn extract(text: &str) -> Vec<LevelsSummaryRecord> {
        let doc = Document::tokenize(text, &ParserConfig::default());
        match classify(&doc, "niveis.csv").records {
            Records::LevelsSummary(recs) => recs,
            other => panic!("expected levels summary, got {:?}", other.schema_type()),
        }
    }

    #[test]
    fn buckets_follow_header_labels() {
        let recs = extract(
            "\
EDIÇÃO;NÃO_FLUENTE;FLUENTE;FRASES;PALAVRAS;SÍLABAS;NÃO_LEITOR;NAO_AVALIADO;NAO_INFORMADO;TOTAL_ALUNOS
1ª Edição;3;10;4;2;1;0;1;0;21
2ª Edição;2;12%;\"3,5\";2;1;0;0;1;21
",
        );
        assert_eq!(recs.len(), 2);
        let first = &recs[0];
        assert_eq!(first.edition, "1ª Edição");
        assert_eq!(first.non_fluent, 3.0);
        assert_eq!(first.fluent, 10.0);
        assert_eq!(first.syllables, 1.0);
        assert_eq!(first.not_evaluated, 1.0);
        assert_eq!(first.total_students, 21.0);
        assert_eq!(recs[1].fluent, 12.0);
        assert_eq!(recs[1].phrases, 3.5);
    }

    #[test]
    fn missing_edition_and_buckets_degrade() {
        let recs = extract(
            "\
Relatório de níveis
FLUENTE;FRASES;SILABAS;PALAVRAS;TOTAL
5;4;3;2;14
1;2
",
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].edition, "Edição 2");
        assert_eq!(recs[0].non_reader, 0.0);
        assert_eq!(recs[0].not_informed, 0.0);
        assert_eq!(recs[0].total_students, 14.0);
    }
}
