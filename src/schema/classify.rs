use super::naming::{NamingRules, truncate_chars};
use super::types::{ColumnDecision, ValueShape};
use crate::error::Result;
use polars::prelude::*;
use std::collections::HashSet;

/// What the classifier needs to know about a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    pub shape: ValueShape,
    /// Some non-null value contains a digit
    pub has_digits: bool,
    /// Longest non-null value, in characters
    pub max_text_len: usize,
}

impl ColumnProfile {
    /// Profile of a non-text column. Text statistics are not gathered.
    pub fn of_shape(shape: ValueShape) -> Self {
        Self {
            shape,
            has_digits: false,
            max_text_len: 0,
        }
    }

    /// Profile of a text column from its values; `None` entries are nulls.
    pub fn of_text<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut profile = Self::of_shape(ValueShape::Text);
        for value in values.into_iter().flatten() {
            profile.has_digits |= value.chars().any(|c| c.is_ascii_digit());
            profile.max_text_len = profile.max_text_len.max(value.chars().count());
        }
        profile
    }

    pub fn from_column(column: &Column) -> Result<Self> {
        let shape = ValueShape::from_dtype(column.dtype());
        if shape != ValueShape::Text {
            return Ok(Self::of_shape(shape));
        }

        let series = column.as_materialized_series().cast(&DataType::String)?;
        let values = series.str()?;
        Ok(Self::of_text(values.into_iter()))
    }
}

/// Chooses the final identifier and Oracle type for one column.
///
/// Names that already carry a reserved prefix are kept; every other name gets
/// the prefix of its value shape. The identifier is then hard-cut to the
/// identifier ceiling. The type always follows the value shape.
pub fn classify(raw_name: &str, profile: &ColumnProfile, rules: &NamingRules) -> ColumnDecision {
    let policy = profile.shape.policy();

    let identifier = if rules.has_reserved_prefix(raw_name) {
        raw_name.to_owned()
    } else {
        let prefix = policy.prefix.resolve(&rules.prefixes, profile.has_digits);
        format!("{prefix}{raw_name}")
    };

    ColumnDecision {
        source_name: raw_name.to_owned(),
        identifier: truncate_chars(&identifier, rules.identifier_max_len),
        column_type: policy.column_type.resolve(profile.max_text_len),
        shape: profile.shape,
    }
}

pub fn classify_column(
    raw_name: &str,
    column: &Column,
    rules: &NamingRules,
) -> Result<ColumnDecision> {
    let profile = ColumnProfile::from_column(column)?;
    Ok(classify(raw_name, &profile, rules))
}

/// Resolves identifiers that collide after prefixing and truncation.
///
/// Later colliders become `<stem>_<N>`, with the stem shortened so the result
/// still fits in `max_len`.
pub fn ensure_unique_identifiers(decisions: &mut [ColumnDecision], max_len: usize) {
    let mut seen = HashSet::new();

    for decision in decisions.iter_mut() {
        let mut count = 0;
        let mut candidate = decision.identifier.clone();

        while seen.contains(&candidate) {
            count += 1;
            let suffix = format!("_{count}");
            let stem = truncate_chars(
                &decision.identifier,
                max_len.saturating_sub(suffix.len()),
            );
            candidate = format!("{stem}{suffix}");
        }

        if candidate != decision.identifier {
            tracing::warn!(
                "Identifier {} collides after truncation, renamed to {candidate}",
                decision.identifier
            );
            decision.identifier = candidate.clone();
        }
        seen.insert(candidate);
    }
}
