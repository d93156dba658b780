use crate::process::utils::fold_upper;

/// Scan at most `limit` rows for one where every keyword is a substring of
/// some field (not necessarily the same field). Comparison is accent- and
/// case-insensitive.
pub fn locate(rows: &[Vec<String>], keywords: &[&str], limit: usize) -> Option<usize> {
    let keywords: Vec<String> = keywords.iter().map(|k| fold_upper(k)).collect();
    rows.iter()
        .take(limit)
        .position(|row| row_has_all(row, &keywords))
}

/// True when each folded keyword appears inside at least one field of `row`.
pub fn row_has_all<S: AsRef<str>>(row: &[String], folded_keywords: &[S]) -> bool {
    let folded: Vec<String> = row.iter().map(|c| fold_upper(c)).collect();
    folded_keywords
        .iter()
        .all(|k| folded.iter().any(|c| c.contains(k.as_ref())))
}

/// Header fields in folded form, for column lookups.
pub fn fold_headers(headers: &[String]) -> Vec<String> {
    headers.iter().map(|h| fold_upper(h.trim())).collect()
}

/// First column whose folded label contains any of `needles`.
pub fn find_containing(folded: &[String], needles: &[&str]) -> Option<usize> {
    folded
        .iter()
        .position(|h| needles.iter().any(|n| h.contains(n)))
}

/// First column whose folded label equals one of `labels`.
pub fn find_exact(folded: &[String], labels: &[&str]) -> Option<usize> {
    folded.iter().position(|h| labels.iter().any(|l| h == l))
}

/// First column whose folded label starts with `prefix`.
pub fn find_prefixed(folded: &[String], prefix: &str) -> Option<usize> {
    folded.iter().position(|h| h.starts_with(prefix))
}

/// Cell at `idx`, if both the column and the cell exist.
pub fn cell(row: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i)).map(String::as_str)
}
