use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static LEADING_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap());
static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+").unwrap());

/// 1) Trim whitespace + strip outer quotes if present.
///
/// Quotes are dropped independently on each side, so an unbalanced `"abc` still
/// comes out as `abc`.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// 2) Locale-tolerant number parsing: `"94%"` → 94, `"7,5"` → 7.5.
///
/// Only the leading numeric prefix counts (`"12 alunos"` → 12). Anything that
/// does not start with a number, or would not be finite, becomes 0.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned = clean_str(raw).replacen('%', "", 1).replacen(',', ".", 1);
    LEADING_FLOAT
        .find(cleaned.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Leading integer of a cell, e.g. `"0A"` → 0, `" 12 "` → 12, `"A1"` → None.
pub fn leading_int(raw: &str) -> Option<i64> {
    LEADING_INT
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Decompose and drop combining marks: `"Nível"` → `"Nivel"`, `"Ç"` → `"C"`.
pub fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Upper-case, accent-free form used for every header/keyword comparison.
pub fn fold_upper(s: &str) -> String {
    strip_accents(s).to_uppercase()
}

/// Canonical form of a reading-level label: lower-case, no accents,
/// underscores as spaces, trimmed. `"NÃO_FLUENTE"` → `"nao fluente"`.
pub fn normalize_level(raw: &str) -> String {
    strip_accents(&raw.to_lowercase())
        .replace('_', " ")
        .trim()
        .to_string()
}
