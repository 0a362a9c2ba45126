//! Target schema inference.
//!
//! Turns spreadsheet headers and column values into Oracle identifiers and
//! column types:
//!
//! - [`naming`]: text normalization, column/table identifiers, header
//!   deduplication
//! - [`types`]: value shapes, Oracle types and the shape policy table
//! - [`classify`]: per-column decisions built from observed values

pub mod classify;
pub mod naming;
pub mod types;

pub use classify::{ColumnProfile, classify, classify_column, ensure_unique_identifiers};
pub use naming::{
    NamingRules, ResolvedHeader, SemanticPrefixes, clean_identifier, deduplicate, normalize,
    resolve_headers, table_identifier,
};
pub use types::{ColumnDecision, OracleType, TableSchema, ValueShape};
