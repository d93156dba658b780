// src/schema/types.rs

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};
use uuid::Uuid;

/// The six report shapes a file can classify as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    FluencyDetail,
    Matrix,
    LevelsSummary,
    Evolution,
    History,
    Unknown,
}

impl SchemaType {
    pub const ALL: [SchemaType; 6] = [
        SchemaType::FluencyDetail,
        SchemaType::Matrix,
        SchemaType::LevelsSummary,
        SchemaType::Evolution,
        SchemaType::History,
        SchemaType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::FluencyDetail => "FLUENCY_DETAIL",
            SchemaType::Matrix => "MATRIX",
            SchemaType::LevelsSummary => "LEVELS_SUMMARY",
            SchemaType::Evolution => "EVOLUTION",
            SchemaType::History => "HISTORY",
            SchemaType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        SchemaType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown schema type `{}`", s))
    }
}

/// Ordinal reading tier. `Unranked` renders as `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Tier {
    Ranked(u8),
    Unranked,
}

impl Tier {
    /// `≥80 → 4`, `≥50 → 3`, `≥25 → 2`, else 1.
    pub fn from_average(average: u32) -> Self {
        let rank = if average >= 80 {
            4
        } else if average >= 50 {
            3
        } else if average >= 25 {
            2
        } else {
            1
        };
        Tier::Ranked(rank)
    }

    /// Best-effort tier from a normalized level label, for records that never
    /// had one derived from answers.
    pub fn from_level_label(level: &str) -> Option<Self> {
        let rank = if level.contains("fluente") && !level.contains("nao") {
            4
        } else if level.contains("frases") {
            3
        } else if level.contains("palavras") {
            2
        } else if level.contains("silabas") || level.contains("nao leitor") {
            1
        } else {
            return None;
        };
        Some(Tier::Ranked(rank))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Ranked(n) => write!(f, "{}", n),
            Tier::Unranked => f.write_str("-"),
        }
    }
}

impl From<Tier> for String {
    fn from(t: Tier) -> Self {
        t.to_string()
    }
}

impl TryFrom<String> for Tier {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.trim() {
            "-" => Ok(Tier::Unranked),
            other => match other.parse::<u8>() {
                Ok(n @ 1..=4) => Ok(Tier::Ranked(n)),
                _ => Err(format!("invalid tier `{}`", s)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub answer: String,
    pub correct: bool,
}

/// One (student, subject) pair from a fluency/synthesis export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluencyRecord {
    pub name: String,
    pub subject: String,
    /// Normalized reading level, or `-` when the student had no level row.
    pub level: String,
    /// One-based question number → answer.
    pub questions: BTreeMap<u32, QuestionAnswer>,
    /// Rounded percentage of correct answers; absent when no question was answered.
    pub average: Option<u32>,
    pub tier: Option<Tier>,
}

impl FluencyRecord {
    pub fn new(name: String, subject: String, level: String) -> Self {
        Self {
            name,
            subject,
            level,
            questions: BTreeMap::new(),
            average: None,
            tier: None,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.questions.values().filter(|q| q.correct).count()
    }

    /// `"NN%"`, computing from the answers when no average was stored.
    /// Empty when there is nothing to show.
    pub fn average_label(&self) -> String {
        let avg = self.average.or_else(|| {
            (!self.questions.is_empty())
                .then(|| super::derive::percentage(self.correct_count(), self.questions.len()))
        });
        avg.map(|a| format!("{}%", a)).unwrap_or_default()
    }

    /// The derived tier, else one inferred from the level label, else `-`.
    pub fn display_tier(&self) -> Tier {
        self.tier
            .or_else(|| Tier::from_level_label(&self.level))
            .unwrap_or(Tier::Unranked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerStatus {
    #[serde(rename = "certo")]
    Correct,
    #[serde(rename = "errado")]
    Wrong,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AnswerStatus {
    /// Exact, case-insensitive match on `certo` / `errado`.
    pub fn from_flag(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "certo" => AnswerStatus::Correct,
            "errado" => AnswerStatus::Wrong,
            _ => AnswerStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixAnswer {
    pub status: AnswerStatus,
    pub value: String,
}

/// One (student, subject) pair from an exam-style question matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub name: String,
    pub subject: String,
    pub average: f64,
    pub level: String,
    /// Reserved column of the export; never populated.
    pub reading: String,
    /// Question label as written in the file → answer.
    pub answers: BTreeMap<String, MatrixAnswer>,
}

/// Level distribution of one assessment edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsSummaryRecord {
    pub edition: String,
    pub fluent: f64,
    pub non_fluent: f64,
    pub phrases: f64,
    pub words: f64,
    pub syllables: f64,
    pub non_reader: f64,
    pub not_evaluated: f64,
    pub not_informed: f64,
    pub total_students: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionRecord {
    pub edition: String,
    pub subject: String,
    pub participation: f64,
    pub correct_answers: f64,
}

/// One student across pivoted edition columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub name: String,
    pub school: String,
    pub results: BTreeMap<String, String>,
}

/// Records of a file, tagged by the schema they were extracted with.
/// Serializes as `schemaType` beside a `records` array, empty for `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    FluencyDetail(Vec<FluencyRecord>),
    Matrix(Vec<MatrixRecord>),
    LevelsSummary(Vec<LevelsSummaryRecord>),
    Evolution(Vec<EvolutionRecord>),
    History(Vec<HistoryRecord>),
    Unknown,
}

impl Records {
    pub fn schema_type(&self) -> SchemaType {
        match self {
            Records::FluencyDetail(_) => SchemaType::FluencyDetail,
            Records::Matrix(_) => SchemaType::Matrix,
            Records::LevelsSummary(_) => SchemaType::LevelsSummary,
            Records::Evolution(_) => SchemaType::Evolution,
            Records::History(_) => SchemaType::History,
            Records::Unknown => SchemaType::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::FluencyDetail(r) => r.len(),
            Records::Matrix(r) => r.len(),
            Records::LevelsSummary(r) => r.len(),
            Records::Evolution(r) => r.len(),
            Records::History(r) => r.len(),
            Records::Unknown => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for Records {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("schemaType", &self.schema_type())?;
        match self {
            Records::FluencyDetail(r) => map.serialize_entry("records", r)?,
            Records::Matrix(r) => map.serialize_entry("records", r)?,
            Records::LevelsSummary(r) => map.serialize_entry("records", r)?,
            Records::Evolution(r) => map.serialize_entry("records", r)?,
            Records::History(r) => map.serialize_entry("records", r)?,
            Records::Unknown => map.serialize_entry("records", &Vec::<()>::new())?,
        }
        map.end()
    }
}

/// Result of parsing one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReport {
    pub id: Uuid,
    pub filename: String,
    pub headers: Vec<String>,
    #[serde(flatten)]
    pub records: Records,
}

impl ParsedReport {
    pub fn new(filename: impl Into<String>, headers: Vec<String>, records: Records) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            headers,
            records,
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        self.records.schema_type()
    }

    /// Same headers and records, ignoring the per-parse id.
    pub fn same_content(&self, other: &ParsedReport) -> bool {
        self.filename == other.filename
            && self.headers == other.headers
            && self.records == other.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(Tier::from_average(100), Tier::Ranked(4));
        assert_eq!(Tier::from_average(80), Tier::Ranked(4));
        assert_eq!(Tier::from_average(79), Tier::Ranked(3));
        assert_eq!(Tier::from_average(50), Tier::Ranked(3));
        assert_eq!(Tier::from_average(49), Tier::Ranked(2));
        assert_eq!(Tier::from_average(25), Tier::Ranked(2));
        assert_eq!(Tier::from_average(24), Tier::Ranked(1));
        assert_eq!(Tier::from_average(0), Tier::Ranked(1));
    }

    #[test]
    fn tier_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Tier::Ranked(3)).unwrap(), "\"3\"");
        assert_eq!(serde_json::to_string(&Tier::Unranked).unwrap(), "\"-\"");
        let t: Tier = serde_json::from_str("\"-\"").unwrap();
        assert_eq!(t, Tier::Unranked);
        assert!(serde_json::from_str::<Tier>("\"7\"").is_err());
    }

    #[test]
    fn tier_from_level_label() {
        assert_eq!(Tier::from_level_label("fluente"), Some(Tier::Ranked(4)));
        assert_eq!(Tier::from_level_label("nao fluente"), None);
        assert_eq!(Tier::from_level_label("frases"), Some(Tier::Ranked(3)));
        assert_eq!(Tier::from_level_label("palavras"), Some(Tier::Ranked(2)));
        assert_eq!(Tier::from_level_label("nao leitor"), Some(Tier::Ranked(1)));
        assert_eq!(Tier::from_level_label("-"), None);
    }

    #[test]
    fn schema_type_round_trips_through_text() {
        for t in SchemaType::ALL {
            assert_eq!(t.to_string().parse::<SchemaType>(), Ok(t));
        }
        assert!("CSV".parse::<SchemaType>().is_err());
    }

    #[test]
    fn answer_status_is_exact() {
        assert_eq!(AnswerStatus::from_flag("CERTO"), AnswerStatus::Correct);
        assert_eq!(AnswerStatus::from_flag("Errado"), AnswerStatus::Wrong);
        assert_eq!(AnswerStatus::from_flag("certo!"), AnswerStatus::Unknown);
    }

    #[test]
    fn display_helpers_fall_back() {
        let mut r = FluencyRecord::new("Ana".into(), "Matemática".into(), "frases".into());
        assert_eq!(r.average_label(), "");
        assert_eq!(r.display_tier(), Tier::Ranked(3));

        r.questions.insert(1, QuestionAnswer { answer: "A".into(), correct: true });
        r.questions.insert(2, QuestionAnswer { answer: "B".into(), correct: false });
        assert_eq!(r.average_label(), "50%");

        r.tier = Some(Tier::Unranked);
        assert_eq!(r.display_tier(), Tier::Unranked);
    }

    #[test]
    fn report_serializes_tag_beside_records() {
        let report = ParsedReport::new("x.csv", vec!["NOME".into()], Records::History(vec![]));
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["schemaType"], "HISTORY");
        assert_eq!(v["filename"], "x.csv");
        assert!(v["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn unknown_report_keeps_empty_records() {
        let report = ParsedReport::new("u.txt", vec![], Records::Unknown);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["schemaType"], "UNKNOWN");
        assert_eq!(v["records"], serde_json::json!([]));

        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("records: []"));
    }
}
