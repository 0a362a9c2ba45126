//! Script generation.
//!
//! Everything the operator runs against the database is rendered here as
//! plain text by pure template functions, then written to the output folder
//! by [`artifacts::write_artifacts`]:
//!
//! - [`sql`]: the DROP TABLE and CREATE TABLE scripts for `SQL*Plus`
//! - [`powershell`]: the loader companion that builds the SQL*Loader control
//!   and parameter files at load time and runs `sqlldr`
//! - [`batch`]: the driver that collects credentials and runs the other
//!   scripts in order
//!
//! Templates take the generation time as an argument so their output only
//! depends on their inputs.

pub mod artifacts;
pub mod batch;
pub mod powershell;
pub mod sql;

pub use artifacts::{ArtifactSet, write_artifacts};

use crate::config::{ArtifactNames, GeneratorConfig, TargetEnvironment};
use crate::schema::TableSchema;
use chrono::NaiveDateTime;

/// Inputs shared by the script templates.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub schema: &'a TableSchema,
    pub files: &'a ArtifactNames,
    pub target: &'a TargetEnvironment,
    /// Field delimiter of the extract
    pub delimiter: char,
    pub generated_at: NaiveDateTime,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        schema: &'a TableSchema,
        config: &'a GeneratorConfig,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            schema,
            files: &config.files,
            target: &config.target,
            delimiter: config.output_delimiter,
            generated_at,
        }
    }

    pub fn timestamp(&self) -> String {
        format_timestamp(self.generated_at)
    }
}

pub(crate) fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
