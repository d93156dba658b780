pub mod derive;
pub mod evolution;
pub mod fluency;
pub mod history;
pub mod levels;
pub mod matrix;
pub mod types;

use tracing::debug;

use crate::process::split::Document;

pub use derive::{level_distribution, PRIMARY_SUBJECT};
pub use types::{
    AnswerStatus, EvolutionRecord, FluencyRecord, HistoryRecord, LevelsSummaryRecord,
    MatrixAnswer, MatrixRecord, ParsedReport, QuestionAnswer, Records, SchemaType, Tier,
};

/// Headers and records produced by the extractor that claimed a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub headers: Vec<String>,
    pub records: Records,
}

impl Extraction {
    pub fn unknown() -> Self {
        Self {
            headers: Vec::new(),
            records: Records::Unknown,
        }
    }
}

/// One schema variant: how to recognise its header and how to read it.
pub trait Extractor {
    const SCHEMA: SchemaType;
    /// Every keyword must appear in some field of the header line.
    const KEYWORDS: &'static [&'static str];

    /// Second look at a located header; rejecting lets later schemas try.
    fn confirm(_doc: &Document, _header_idx: usize, _filename: &str) -> bool {
        true
    }

    fn extract(doc: &Document, header_idx: usize) -> Extraction;
}

fn try_extract<E: Extractor>(doc: &Document, filename: &str) -> Option<Extraction> {
    let header_idx = doc.locate(E::KEYWORDS)?;
    if !E::confirm(doc, header_idx, filename) {
        debug!(schema = %E::SCHEMA, header_idx, "header rejected on confirmation");
        return None;
    }
    debug!(schema = %E::SCHEMA, header_idx, "header located");
    Some(E::extract(doc, header_idx))
}

/// Try each schema in priority order, most specific signature first; the
/// first whose header is found owns the file.
pub fn classify(doc: &Document, filename: &str) -> Extraction {
    try_extract::<fluency::FluencyDetail>(doc, filename)
        .or_else(|| try_extract::<matrix::Matrix>(doc, filename))
        .or_else(|| try_extract::<levels::LevelsSummary>(doc, filename))
        .or_else(|| try_extract::<evolution::Evolution>(doc, filename))
        .or_else(|| try_extract::<history::History>(doc, filename))
        .unwrap_or_else(Extraction::unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn classify_text(text: &str, filename: &str) -> SchemaType {
        let doc = Document::tokenize(text, &ParserConfig::default());
        classify(&doc, filename).records.schema_type()
    }

    #[test]
    fn fluency_outranks_matrix() {
        let text = "NOME;MATERIA;NIVEL;QUESTAO;RESPOSTA;ACERTO\nAna;Matemática;fluente;0;A;certo\n";
        assert_eq!(classify_text(text, "x.csv"), SchemaType::FluencyDetail);
    }

    #[test]
    fn each_signature_is_recognised() {
        assert_eq!(
            classify_text("NOME,QUESTÃO,ACERTO\nAna,1,certo\n", "m.csv"),
            SchemaType::Matrix
        );
        assert_eq!(
            classify_text("EDICAO;FLUENTE;FRASES;SILABAS\n1;2;3;4\n", "l.csv"),
            SchemaType::LevelsSummary
        );
        assert_eq!(
            classify_text("EDIÇÃO;MATÉRIA;PARTICIPAÇÃO;ACERTOS;TOTAL_ALUNOS\n", "e.csv"),
            SchemaType::Evolution
        );
        assert_eq!(
            classify_text("ALUNOS;2024 [Leitura]\nAna;Fluente\n", "h.csv"),
            SchemaType::History
        );
    }

    #[test]
    fn unrecognised_files_are_unknown() {
        let doc = Document::tokenize("a;b;c\n1;2;3\n", &ParserConfig::default());
        let out = classify(&doc, "x.csv");
        assert_eq!(out, Extraction::unknown());
        assert_eq!(classify_text("", "empty.csv"), SchemaType::Unknown);
    }

    #[test]
    fn weak_history_match_falls_through() {
        assert_eq!(
            classify_text("ALUNOS;ESCOLA\nAna;Central\n", "turma.csv"),
            SchemaType::Unknown
        );
        assert_eq!(
            classify_text("ALUNOS;ESCOLA\nAna;Central\n", "Historico_turma.csv"),
            SchemaType::History
        );
    }
}
