use super::ScriptContext;
use super::batch::render_batch_driver;
use super::powershell::render_loader_script;
use super::sql::{render_create_table, render_drop_table};
use crate::config::{GeneratorConfig, delimiter_byte};
use crate::error::{Result, ResultExt as _};
use crate::extract::ExtractedDataset;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of everything written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub table_name_file: PathBuf,
    pub data_file: PathBuf,
    pub drop_script: PathBuf,
    pub create_script: PathBuf,
    pub loader_script: PathBuf,
    pub batch_driver: PathBuf,
}

impl ArtifactSet {
    fn new(config: &GeneratorConfig) -> Self {
        let files = &config.files;
        Self {
            table_name_file: config.output_path(&files.table_name_file),
            data_file: config.output_path(&files.data_file),
            drop_script: config.output_path(&files.drop_script),
            create_script: config.output_path(&files.create_script),
            loader_script: config.output_path(&files.loader_script),
            batch_driver: config.output_path(&files.batch_driver),
        }
    }

    /// All paths, in the order they are written.
    pub fn paths(&self) -> [&Path; 6] {
        [
            &self.table_name_file,
            &self.data_file,
            &self.drop_script,
            &self.create_script,
            &self.loader_script,
            &self.batch_driver,
        ]
    }
}

/// Writes the table marker, the extract and every script to the output
/// folder, overwriting previous runs.
///
/// # Errors
///
/// Returns an error on the first file that cannot be written.
pub fn write_artifacts(
    dataset: &ExtractedDataset,
    config: &GeneratorConfig,
    generated_at: NaiveDateTime,
) -> Result<ArtifactSet> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let set = ArtifactSet::new(config);
    let schema = &dataset.schema;
    let ctx = ScriptContext::new(schema, config, generated_at);

    write_text(&set.table_name_file, &schema.quoted_name())?;

    dataset.write_csv(&set.data_file, delimiter_byte(config.output_delimiter)?)?;
    info!(
        "Extract with {} rows written to {}",
        dataset.row_count(),
        set.data_file.display()
    );

    write_text(&set.drop_script, &render_drop_table(schema, generated_at))?;
    write_text(
        &set.create_script,
        &render_create_table(schema, &config.target.grant_user, generated_at),
    )?;
    write_text(&set.loader_script, &render_loader_script(&ctx))?;
    write_text(&set.batch_driver, &to_crlf(&render_batch_driver(&ctx)))?;

    Ok(set)
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// cmd.exe misreads labels in files with bare LF line endings.
fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NamingRules;
    use crate::scripts::test_support::generated_at;
    use polars::prelude::*;

    fn dataset() -> anyhow::Result<ExtractedDataset> {
        let frame = df!(
            "PLANO" => ["OURO", "PRATA"],
            "CODIGO" => ["A1", "B2"],
        )?;
        Ok(ExtractedDataset::classify(
            "TT_OPE_CONVENIO_PLANO".to_owned(),
            frame,
            &NamingRules::default(),
        )?)
    }

    #[test]
    fn test_every_artifact_is_written() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = GeneratorConfig::default();
        config.output_dir = dir.path().join("saida");

        let set = write_artifacts(&dataset()?, &config, generated_at())?;

        for path in set.paths() {
            assert!(path.is_file(), "{} missing", path.display());
            assert!(path.starts_with(&config.output_dir));
        }
        assert_eq!(
            std::fs::read_to_string(&set.table_name_file)?,
            "\"TT_OPE_CONVENIO_PLANO\""
        );
        assert!(set.batch_driver.ends_with("execute_db_scripts.bat"));
        Ok(())
    }

    #[test]
    fn test_batch_driver_uses_crlf() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = GeneratorConfig::default();
        config.output_dir = dir.path().to_path_buf();

        let set = write_artifacts(&dataset()?, &config, generated_at())?;
        let driver = std::fs::read_to_string(&set.batch_driver)?;

        assert!(driver.starts_with("@echo off\r\n"));
        assert!(!driver.replace("\r\n", "").contains('\n'));
        Ok(())
    }

    #[test]
    fn test_rerun_overwrites() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = GeneratorConfig::default();
        config.output_dir = dir.path().to_path_buf();

        std::fs::write(config.output_path(&config.files.drop_script), "stale")?;
        let set = write_artifacts(&dataset()?, &config, generated_at())?;

        let drop = std::fs::read_to_string(&set.drop_script)?;
        assert!(!drop.contains("stale"));
        assert!(drop.contains("TT_OPE_CONVENIO_PLANO"));
        Ok(())
    }

    #[test]
    fn test_to_crlf_is_stable() {
        assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
        assert_eq!(to_crlf(&to_crlf("x\n")), "x\r\n");
    }
}
