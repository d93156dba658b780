use std::collections::HashMap;
use tracing::debug;

use super::types::{FluencyRecord, LevelsSummaryRecord, Tier};
use crate::process::utils::normalize_level;

/// Subject whose scores define the reading tier for every other subject.
pub const PRIMARY_SUBJECT: &str = "Língua Portuguesa";

/// Rounded `100 × correct / total`; 0 for an empty total.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 * 100.0 / total as f64).round() as u32
}

/// Fill `average` on every record with at least one answered question.
pub fn compute_averages(records: &mut [FluencyRecord]) {
    for rec in records.iter_mut().filter(|r| !r.questions.is_empty()) {
        rec.average = Some(percentage(rec.correct_count(), rec.questions.len()));
    }
}

/// Tier the primary-subject records from their averages, then copy that tier
/// onto the same student's other subjects (names compared upper-cased).
/// Other-subject records with no primary counterpart get `Unranked`; primary
/// records without an average stay untiered.
pub fn assign_tiers(records: &mut [FluencyRecord]) {
    let mut by_student: HashMap<String, Tier> = HashMap::new();

    for rec in records.iter_mut() {
        if rec.subject != PRIMARY_SUBJECT {
            continue;
        }
        if let Some(avg) = rec.average {
            let tier = Tier::from_average(avg);
            rec.tier = Some(tier);
            by_student.insert(rec.name.to_uppercase(), tier);
        }
    }

    let mut unmatched = 0usize;
    for rec in records.iter_mut().filter(|r| r.subject != PRIMARY_SUBJECT) {
        let tier = by_student
            .get(&rec.name.to_uppercase())
            .copied()
            .unwrap_or_else(|| {
                unmatched += 1;
                Tier::Unranked
            });
        rec.tier = Some(tier);
    }

    debug!(
        tiered = by_student.len(),
        unmatched, "reading tiers assigned"
    );
}

pub fn derive_metrics(records: &mut [FluencyRecord]) {
    compute_averages(records);
    assign_tiers(records);
}

/// Tally students into the level-summary buckets by their level label.
/// `nao ... fluente` wins over `fluente`; labels matching no bucket are
/// counted only in `total_students`.
pub fn level_distribution(records: &[FluencyRecord], edition: &str) -> LevelsSummaryRecord {
    let mut out = LevelsSummaryRecord {
        edition: edition.to_string(),
        fluent: 0.0,
        non_fluent: 0.0,
        phrases: 0.0,
        words: 0.0,
        syllables: 0.0,
        non_reader: 0.0,
        not_evaluated: 0.0,
        not_informed: 0.0,
        total_students: records.len() as f64,
    };

    for rec in records {
        let level = normalize_level(&rec.level);
        let negated = level.contains("nao");
        let bucket = if level.contains("fluente") && !negated {
            &mut out.fluent
        } else if level.contains("fluente") {
            &mut out.non_fluent
        } else if level.contains("frases") {
            &mut out.phrases
        } else if level.contains("palavras") {
            &mut out.words
        } else if level.contains("silabas") {
            &mut out.syllables
        } else if negated && level.contains("leitor") {
            &mut out.non_reader
        } else if negated && level.contains("avaliado") {
            &mut out.not_evaluated
        } else if negated && level.contains("informado") {
            &mut out.not_informed
        } else {
            continue;
        };
        *bucket += 1.0;
    }
    out
}
