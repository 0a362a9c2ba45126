//! End-to-end runs.
//!
//! [`generate`] is the whole batch: validate the configuration, extract and
//! classify the input, write every artifact. [`inspect`] stops after
//! classification and writes nothing.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::extract::extract;
use crate::schema::TableSchema;
use crate::scripts::{ArtifactSet, write_artifacts};
use chrono::NaiveDateTime;
use tracing::info;

/// Outcome of a successful [`generate`] run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub schema: TableSchema,
    pub rows: usize,
    pub artifacts: ArtifactSet,
}

/// Runs the full pipeline, stamping the scripts with the local time.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the input cannot be
/// read, or an artifact cannot be written.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport> {
    generate_at(config, chrono::Local::now().naive_local())
}

/// [`generate`] with an explicit generation time.
///
/// # Errors
///
/// Same as [`generate`].
pub fn generate_at(config: &GeneratorConfig, generated_at: NaiveDateTime) -> Result<GenerationReport> {
    config.validate()?;

    let dataset = extract(config)?;
    info!(
        "Table {} with {} columns",
        dataset.schema.name,
        dataset.schema.columns.len()
    );

    let artifacts = write_artifacts(&dataset, config, generated_at)?;
    info!("All artifacts written to {}", config.output_dir.display());

    Ok(GenerationReport {
        rows: dataset.row_count(),
        schema: dataset.schema,
        artifacts,
    })
}

/// Classifies the input without writing any artifact.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the input cannot be
/// read.
pub fn inspect(config: &GeneratorConfig) -> Result<TableSchema> {
    config.validate()?;
    Ok(extract(config)?.schema)
}
