// src/core/classifier.rs

//! Derives a coarse query-type label from a raw N1QL statement.

/// Label used when a statement has no tokens.
pub const UNKNOWN_QUERY_TYPE: &str = "UNK";

/// Returns the statement's leading keyword in upper case, e.g. `SELECT`.
///
/// `RAW` projections are distinguished by suffixing the label (`SELECT RAW ...`
/// becomes `SELECT_RAW`). This is a heuristic, not a parser.
pub fn classify_query(statement: &str) -> String {
    let upper = statement.to_uppercase();
    let mut tokens = upper.split_whitespace();

    let Some(first) = tokens.next() else {
        return UNKNOWN_QUERY_TYPE.to_string();
    };

    match tokens.next() {
        Some("RAW") => format!("{first}_RAW"),
        _ => first.to_string(),
    }
}
