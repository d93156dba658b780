use std::collections::{BTreeMap, HashMap};
use tracing::trace;

use super::types::{AnswerStatus, MatrixAnswer, MatrixRecord, Records, SchemaType};
use super::{Extraction, Extractor};
use crate::process::header::{cell, find_containing, find_exact, fold_headers};
use crate::process::split::Document;
use crate::process::utils::{leading_int, normalize_level, parse_number};

/// Exam-style student × question matrix, one row per answered question.
pub struct Matrix;

impl Extractor for Matrix {
    const SCHEMA: SchemaType = SchemaType::Matrix;
    const KEYWORDS: &'static [&'static str] = &["NOME", "QUESTAO", "ACERTO"];

    fn extract(doc: &Document, header_idx: usize) -> Extraction {
        let headers = doc.row(header_idx).to_vec();
        let folded = fold_headers(&headers);

        let name_idx = find_containing(&folded, &["NOME"]);
        let subject_idx = find_containing(&folded, &["MATERIA"]);
        let avg_idx = find_containing(&folded, &["MEDIA"]);
        let level_idx = find_containing(&folded, &["NIVEL"]);
        let question_idx = find_containing(&folded, &["QUESTAO"]);
        let status_idx = find_exact(&folded, &["ACERTO"]);
        let value_idx = find_exact(&folded, &["RESPOSTA"]);

        let mut records: Vec<MatrixRecord> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for (line, row) in doc.rows_after(header_idx) {
            if row.len() < headers.len() {
                trace!(line, fields = row.len(), "short matrix row");
                continue;
            }
            let name = cell(row, name_idx).unwrap_or_default();
            let question = cell(row, question_idx).unwrap_or_default();
            if name.is_empty() || question.is_empty() || leading_int(question).is_none() {
                trace!(line, "matrix row without student or question number");
                continue;
            }
            let subject = cell(row, subject_idx).unwrap_or_default();

            let key = (name.to_string(), subject.to_string());
            let i = *index.entry(key).or_insert_with(|| {
                records.push(MatrixRecord {
                    name: name.to_string(),
                    subject: subject.to_string(),
                    average: parse_number(cell(row, avg_idx).unwrap_or_default()),
                    level: normalize_level(cell(row, level_idx).unwrap_or_default()),
                    reading: String::new(),
                    answers: BTreeMap::new(),
                });
                records.len() - 1
            });

            records[i].answers.insert(
                question.to_string(),
                MatrixAnswer {
                    status: AnswerStatus::from_flag(cell(row, status_idx).unwrap_or_default()),
                    value: cell(row, value_idx).unwrap_or_default().to_string(),
                },
            );
        }

        Extraction {
            headers,
            records: Records::Matrix(records),
        }
    }
}
