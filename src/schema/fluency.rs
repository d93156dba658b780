//! Synthesis exports: a reading-level section (name, subject, level) optionally
//! followed by one question section per subject (name, subject, question,
//! answer, correctness). Both halves are merged per (name, subject).

use std::collections::HashMap;
use tracing::{debug, trace};

use super::derive::{derive_metrics, PRIMARY_SUBJECT};
use super::types::{FluencyRecord, QuestionAnswer, Records, SchemaType};
use super::{Extraction, Extractor};
use crate::process::header::{cell, find_containing, find_exact, fold_headers, row_has_all};
use crate::process::split::Document;
use crate::process::utils::{fold_upper, leading_int, normalize_level};

const NAME_LABELS: &[&str] = &["NOME", "NOME_ALUNO"];
const QUESTION_SECTION: &[&str] = &["NOME", "QUESTAO", "ACERTO"];
const AFFIRMATIVE: &[&str] = &["certo", "sim", "1"];

pub struct FluencyDetail;

impl Extractor for FluencyDetail {
    const SCHEMA: SchemaType = SchemaType::FluencyDetail;
    const KEYWORDS: &'static [&'static str] = &["NOME", "NIVEL"];

    fn extract(doc: &Document, header_idx: usize) -> Extraction {
        let headers: Vec<String> = doc
            .row(header_idx)
            .iter()
            .map(|h| h.trim().to_uppercase())
            .collect();

        let mut acc = Students::default();
        let levels = read_level_section(doc, header_idx, &mut acc);
        read_question_sections(doc, &levels, &mut acc);

        let mut records = acc.records;
        derive_metrics(&mut records);

        Extraction {
            headers,
            records: Records::FluencyDetail(records),
        }
    }
}

/// Records in first-seen order, addressable by (name, subject).
#[derive(Default)]
struct Students {
    records: Vec<FluencyRecord>,
    index: HashMap<(String, String), usize>,
}

impl Students {
    /// Insert or replace in place, keeping the original position.
    fn put(&mut self, rec: FluencyRecord) {
        let key = (rec.name.clone(), rec.subject.clone());
        match self.index.get(&key) {
            Some(&i) => self.records[i] = rec,
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(rec);
            }
        }
    }

    fn get_or_insert_with(
        &mut self,
        name: &str,
        subject: String,
        level: impl FnOnce() -> String,
    ) -> &mut FluencyRecord {
        let key = (name.to_string(), subject);
        let idx = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.records.len();
                self.records
                    .push(FluencyRecord::new(key.0.clone(), key.1.clone(), level()));
                self.index.insert(key, i);
                i
            }
        };
        &mut self.records[idx]
    }
}

/// Subject cell, defaulting to the primary subject when the column is absent.
/// `Leitura` is the level section's name for the primary subject.
fn subject_of(row: &[String], subject_idx: Option<usize>) -> String {
    let subject = match subject_idx {
        Some(i) => row.get(i).map(|s| s.trim()).unwrap_or_default(),
        None => PRIMARY_SUBJECT,
    };
    if subject.eq_ignore_ascii_case("leitura") {
        PRIMARY_SUBJECT.to_string()
    } else {
        subject.to_string()
    }
}

/// A repeated header label in the name column.
fn is_spurious_name(name: &str) -> bool {
    let folded = fold_upper(name);
    folded.contains("NOME") || folded.contains("MATERIA")
}

/// Pass 1. Returns upper-cased name → normalized level.
fn read_level_section(
    doc: &Document,
    header_idx: usize,
    acc: &mut Students,
) -> HashMap<String, String> {
    let mut levels = HashMap::new();
    let folded = fold_headers(doc.row(header_idx));
    let (Some(name_idx), Some(level_idx)) = (
        find_exact(&folded, NAME_LABELS),
        find_containing(&folded, &["NIVEL"]),
    ) else {
        debug!(header_idx, "level section lacks a name or level column");
        return levels;
    };
    let subject_idx = find_containing(&folded, &["MATERIA"]);

    for (line, row) in doc.rows_after(header_idx) {
        if row.len() < 2 {
            continue;
        }
        if row.iter().any(|c| fold_upper(c).contains("QUESTAO")) {
            debug!(line, "level section ends at question section");
            break;
        }

        let name = cell(row, Some(name_idx)).unwrap_or_default().trim();
        let level_raw = cell(row, Some(level_idx)).unwrap_or_default().trim();
        if is_spurious_name(name) || name.is_empty() || level_raw.is_empty() {
            trace!(line, "skipping level row");
            continue;
        }

        let level = normalize_level(level_raw);
        levels.insert(name.to_uppercase(), level.clone());
        acc.put(FluencyRecord::new(
            name.to_string(),
            subject_of(row, subject_idx),
            level,
        ));
    }

    levels
}

/// Pass 2. Every line carrying name, question and correctness columns opens a
/// section running to the next such line.
fn read_question_sections(doc: &Document, levels: &HashMap<String, String>, acc: &mut Students) {
    let starts: Vec<usize> = doc
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row_has_all(row, QUESTION_SECTION))
        .map(|(i, _)| i)
        .collect();

    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(doc.len());
        let folded = fold_headers(doc.row(start));
        let name_idx = find_exact(&folded, NAME_LABELS);
        let subject_idx = find_containing(&folded, &["MATERIA"]);
        let question_idx = find_containing(&folded, &["QUESTAO"]);
        let answer_idx = find_containing(&folded, &["RESPOSTA"]);
        let correct_idx = find_containing(&folded, &["ACERTO"]);
        debug!(start, end, ?question_idx, ?correct_idx, "question section");

        for line in start + 1..end {
            let row = doc.row(line);
            if row.len() < 3 {
                continue;
            }
            let name = match cell(row, name_idx).map(str::trim) {
                Some(n) if !n.is_empty() && !is_spurious_name(n) => n,
                _ => {
                    trace!(line, "skipping question row without a student");
                    continue;
                }
            };

            let student = acc.get_or_insert_with(name, subject_of(row, subject_idx), || {
                levels
                    .get(&name.to_uppercase())
                    .cloned()
                    .unwrap_or_else(|| "-".to_string())
            });

            let (Some(q_idx), Some(c_idx)) = (question_idx, correct_idx) else {
                continue;
            };
            // Source numbering is zero-based; a blank cell counts as question 0.
            let raw_question = cell(row, Some(q_idx))
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .unwrap_or("0");
            let Some(number) = leading_int(raw_question)
                .map(|n| n + 1)
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
            else {
                trace!(line, "question number missing or invalid");
                continue;
            };

            let answer = cell(row, answer_idx).unwrap_or_default().trim().to_string();
            let flag = cell(row, Some(c_idx)).unwrap_or_default().trim().to_lowercase();
            student.questions.insert(
                number,
                QuestionAnswer {
                    answer,
                    correct: AFFIRMATIVE.contains(&flag.as_str()),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::schema::{classify, Tier};

    fn extract(text: &str) -> (Vec<String>, Vec<FluencyRecord>) {
        let doc = Document::tokenize(text, &ParserConfig::default());
        match classify(&doc, "sintese.csv") {
            Extraction {
                headers,
                records: Records::FluencyDetail(recs),
            } => (headers, recs),
            other => panic!("expected fluency detail, got {:?}", other.records.schema_type()),
        }
    }

    #[test]
    fn level_only_file() {
        let (headers, recs) = extract("NOME;NIVEL\nAna;fluente\nBruno;nao_fluente\n");
        assert_eq!(headers, vec!["NOME", "NIVEL"]);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].name, "Ana");
        assert_eq!(recs[0].level, "fluente");
        assert_eq!(recs[0].subject, PRIMARY_SUBJECT);
        assert_eq!(recs[1].name, "Bruno");
        assert_eq!(recs[1].level, "nao fluente");
        for r in &recs {
            assert!(r.questions.is_empty());
            assert_eq!(r.average, None);
            assert_eq!(r.tier, None);
        }
    }

    const MULTI_SECTION: &str = "\
NOME;MATÉRIA;NÍVEL
Ana Souza;Leitura;Fluente
Bruno Lima;Leitura;Sílabas
NOME;MATÉRIA;QUESTÃO;RESPOSTA;ACERTO
Ana Souza;Língua Portuguesa;0A;A;certo
Ana Souza;Língua Portuguesa;1C;C;certo
Ana Souza;Língua Portuguesa;2B;D;errado
Ana Souza;Língua Portuguesa;3D;D;sim
Ana Souza;Língua Portuguesa;4A;A;1
Bruno Lima;Língua Portuguesa;0A;B;errado
Bruno Lima;Língua Portuguesa;1C;C;certo
NOME;MATÉRIA;QUESTÃO;RESPOSTA;ACERTO
ana souza;Matemática;0;B;certo
Carla Dias;Matemática;0;A;errado
";

    #[test]
    fn sections_are_merged() {
        let (_, recs) = extract(MULTI_SECTION);
        let keys: Vec<(&str, &str)> = recs
            .iter()
            .map(|r| (r.name.as_str(), r.subject.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Ana Souza", PRIMARY_SUBJECT),
                ("Bruno Lima", PRIMARY_SUBJECT),
                ("ana souza", "Matemática"),
                ("Carla Dias", "Matemática"),
            ]
        );

        let ana = &recs[0];
        assert_eq!(ana.level, "fluente");
        assert_eq!(ana.questions.len(), 5);
        assert_eq!(ana.average, Some(80));
        assert_eq!(ana.tier, Some(Tier::Ranked(4)));
        assert_eq!(ana.questions[&3].answer, "D");
        assert!(!ana.questions[&3].correct);

        let bruno = &recs[1];
        assert_eq!(bruno.level, "silabas");
        assert_eq!(bruno.average, Some(50));
        assert_eq!(bruno.tier, Some(Tier::Ranked(3)));
    }

    #[test]
    fn question_numbers_shift_to_one_based() {
        let (_, recs) = extract(MULTI_SECTION);
        let ana = &recs[0];
        assert_eq!(ana.questions.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(ana.questions[&1].correct);
    }

    #[test]
    fn other_subjects_inherit_level_and_tier() {
        let (_, recs) = extract(MULTI_SECTION);
        let math_ana = &recs[2];
        assert_eq!(math_ana.level, "fluente");
        assert_eq!(math_ana.average, Some(100));
        assert_eq!(math_ana.tier, Some(Tier::Ranked(4)));

        let carla = &recs[3];
        assert_eq!(carla.level, "-");
        assert_eq!(carla.average, Some(0));
        assert_eq!(carla.tier, Some(Tier::Unranked));
    }

    #[test]
    fn math_tier_follows_language_average_of_82() {
        let mut text = String::from("NOME;NIVEL\nDavi;fluente\nNOME;MATERIA;QUESTAO;RESPOSTA;ACERTO\n");
        // 41 of 50 correct → 82%
        for q in 0..50 {
            let flag = if q < 41 { "certo" } else { "errado" };
            text.push_str(&format!("Davi;Língua Portuguesa;{};A;{}\n", q, flag));
        }
        text.push_str("NOME;MATERIA;QUESTAO;RESPOSTA;ACERTO\nDAVI;Matemática;0;A;errado\n");

        let (_, recs) = extract(&text);
        let lang = recs.iter().find(|r| r.subject == PRIMARY_SUBJECT).unwrap();
        let math = recs.iter().find(|r| r.subject == "Matemática").unwrap();
        assert_eq!(lang.average, Some(82));
        assert_eq!(math.tier, Some(Tier::Ranked(4)));
    }

    #[test]
    fn spurious_and_short_rows_are_skipped() {
        let text = "\
NOME,NIVEL
NOME,NIVEL
Ana,frases
,fluente
x
";
        let (_, recs) = extract(text);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].level, "frases");
    }

    #[test]
    fn later_level_row_replaces_in_place() {
        let (_, recs) = extract("NOME;NIVEL\nAna;silabas\nBia;frases\nAna;palavras\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].name, "Ana");
        assert_eq!(recs[0].level, "palavras");
    }

    #[test]
    fn section_without_correctness_keeps_students() {
        // Unparsable question cells store nothing but still create the record.
        let text = "\
NOME;NIVEL
Ana;fluente
NOME;MATERIA;QUESTAO;ACERTO
Ana;Matemática;x;certo
Bia;Matemática;0
";
        let (_, recs) = extract(text);
        let ana_math = recs
            .iter()
            .find(|r| r.name == "Ana" && r.subject == "Matemática")
            .unwrap();
        assert!(ana_math.questions.is_empty());
        assert_eq!(ana_math.average, None);
        let bia = recs.iter().find(|r| r.name == "Bia").unwrap();
        assert!(bia.questions.contains_key(&1));
        assert_eq!(bia.level, "-");
    }

    #[test]
    fn blank_question_cell_counts_as_first_question() {
        let text = "\
NOME;NIVEL
Ana;fluente
NOME;MATERIA;QUESTAO;RESPOSTA;ACERTO
Ana;Matemática;;A;certo
";
        let (_, recs) = extract(text);
        let ana_math = recs
            .iter()
            .find(|r| r.name == "Ana" && r.subject == "Matemática")
            .unwrap();
        assert_eq!(ana_math.questions.len(), 1);
        assert_eq!(ana_math.questions[&1].answer, "A");
        assert!(ana_math.questions[&1].correct);
        assert_eq!(ana_math.average, Some(100));
    }

    #[test]
    fn inexact_name_column_yields_no_levels() {
        let (_, recs) = extract("NOME_COMPLETO;NIVEL\nAna;fluente\n");
        assert!(recs.is_empty());
    }
}
