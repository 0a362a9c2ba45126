//! Identifier normalization.
//!
//! Oracle identifiers are limited to `[A-Z0-9_]` and 30 characters. Headers
//! and file names coming from spreadsheets carry accents, punctuation and
//! arbitrary spacing, so everything goes through [`normalize`] first.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use unicode_normalization::UnicodeNormalization as _;
use unicode_normalization::char::canonical_combining_class;

/// Prefixes prepended to column identifiers according to the value shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticPrefixes {
    /// Integer and floating-point columns
    pub numeric: String,
    /// Date and datetime columns
    pub date: String,
    /// Boolean columns
    pub flag: String,
    /// Text columns where at least one value contains a digit
    pub code: String,
    /// Any other text column
    pub name: String,
}

impl Default for SemanticPrefixes {
    fn default() -> Self {
        Self {
            numeric: "NU_".to_owned(),
            date: "DT_".to_owned(),
            flag: "FL_".to_owned(),
            code: "CD_".to_owned(),
            name: "NM_".to_owned(),
        }
    }
}

/// Naming conventions for generated tables and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    /// Object prefix every table name starts with
    pub table_prefix: String,
    /// Prepended to table suffixes that are empty or start with a non-letter
    pub table_fallback_prefix: String,
    /// Prepended to column names that start with a non-letter
    pub column_fallback_prefix: String,
    /// Name given to headers that normalize to nothing
    pub empty_column_placeholder: String,
    /// Identifier length ceiling of the target database
    pub identifier_max_len: usize,
    /// Column names starting with one of these are kept as they are
    pub reserved_prefixes: Vec<String>,
    pub prefixes: SemanticPrefixes,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            table_prefix: "TT_OPE_".to_owned(),
            table_fallback_prefix: "TBL_".to_owned(),
            column_fallback_prefix: "COL_".to_owned(),
            empty_column_placeholder: "COL_VAZIA_PADRAO".to_owned(),
            identifier_max_len: 30,
            reserved_prefixes: ["CD_", "DS_", "NU_", "FL_", "NM_"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            prefixes: SemanticPrefixes::default(),
        }
    }
}

impl NamingRules {
    pub fn has_reserved_prefix(&self, name: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

/// Strips accents, uppercases and drops everything outside `[A-Z0-9_ ]`.
///
/// Every whitespace character (tabs and line breaks included) becomes a
/// plain space. Internal spaces are preserved; leading and trailing ones
/// are not.
/// Missing values are handled by the caller with `Option::map`.
pub fn normalize(text: &str) -> String {
    let without_marks: String = text
        .nfkd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .collect();

    let kept: String = without_marks
        .to_uppercase()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| is_identifier_char(*c) || *c == ' ')
        .collect();

    kept.trim().to_owned()
}

/// Builds a column identifier from arbitrary header text.
///
/// The result is never empty, starts with a letter and only contains
/// `[A-Z0-9_]`.
pub fn clean_identifier(text: &str, rules: &NamingRules) -> String {
    let squashed = collapse_underscores(&underscore_whitespace(&normalize(text)));
    let cleaned = squashed.trim_matches('_');

    if cleaned.is_empty() {
        return rules.empty_column_placeholder.clone();
    }
    if starts_with_letter(cleaned) {
        cleaned.to_owned()
    } else {
        format!("{}{cleaned}", rules.column_fallback_prefix)
    }
}

/// Derives the target table name from the input file name.
///
/// The table prefix is always kept whole; only the part derived from the
/// file name is cut to respect [`NamingRules::identifier_max_len`].
pub fn table_identifier(path: &Path, rules: &NamingRules) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let filtered: String = underscore_whitespace(&normalize(&stem))
        .chars()
        .filter(|c| is_identifier_char(*c))
        .collect();
    let mut suffix = collapse_underscores(&filtered)
        .trim_matches('_')
        .to_owned();

    if !starts_with_letter(&suffix) {
        suffix = format!("{}{suffix}", rules.table_fallback_prefix);
    }

    let budget = rules
        .identifier_max_len
        .saturating_sub(rules.table_prefix.chars().count());
    let suffix = truncate_chars(&suffix, budget);

    format!("{}{}", rules.table_prefix, suffix.trim_end_matches('_')).to_uppercase()
}

/// Makes names unique while keeping their order.
///
/// Later duplicates get the first `_N` suffix that is not taken yet,
/// including by names that already carried a suffix in the input.
pub fn deduplicate(names: &[String]) -> Vec<String> {
    let mut unique = Vec::with_capacity(names.len());
    let mut seen = HashSet::new();

    for name in names {
        let mut candidate = name.clone();
        let mut count = 0;

        while seen.contains(&candidate) {
            count += 1;
            candidate = format!("{name}_{count}");
        }

        seen.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

/// A header that survived cleaning, with the position of its source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    pub source_index: usize,
    pub name: String,
}

/// Cleans and deduplicates raw headers.
///
/// With `drop_empty`, headers that clean to the empty placeholder are removed
/// before deduplication and never become columns. `source_index` still points
/// at the source column so data stays aligned with its header.
pub fn resolve_headers(
    raw_headers: &[String],
    rules: &NamingRules,
    drop_empty: bool,
) -> Vec<ResolvedHeader> {
    let kept: Vec<(usize, String)> = raw_headers
        .iter()
        .map(|raw| clean_identifier(raw, rules))
        .enumerate()
        .filter(|(_, name)| !drop_empty || *name != rules.empty_column_placeholder)
        .collect();

    let names: Vec<String> = kept.iter().map(|(_, name)| name.clone()).collect();

    kept.into_iter()
        .zip(deduplicate(&names))
        .map(|((source_index, _), name)| ResolvedHeader { source_index, name })
        .collect()
}

/// Cuts `text` to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

fn starts_with_letter(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_alphabetic)
}

fn underscore_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn collapse_underscores(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_underscore = false;
    for c in text.chars() {
        if c == '_' {
            if !last_was_underscore {
                result.push(c);
            }
            last_was_underscore = true;
        } else {
            result.push(c);
            last_was_underscore = false;
        }
    }
    result
}
