use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use oraload::config::{GeneratorConfig, InputKind};
use oraload::error::OraloadError;
use oraload::flows::{self, GenerationReport};
use oraload::logging;
use oraload::schema::TableSchema;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "oraload",
    version,
    about = "Generate Oracle DDL, a normalized extract and SQL*Loader scripts from a spreadsheet"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the input and write every artifact to the output directory
    Generate {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Show the table name and column decisions without writing artifacts
    Inspect {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Write a configuration file with every default filled in
    InitConfig {
        /// Where to write the configuration
        #[arg(default_value = "oraload.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Settings shared by the commands that read the input.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON configuration file. Defaults apply to anything it leaves out.
    #[arg(short, long, env = "ORALOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Spreadsheet or CSV file to read
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input kind. Inferred from the file extension when omitted.
    #[arg(short, long, value_enum)]
    pub kind: Option<InputKind>,

    /// Folder receiving the artifacts and the log file
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl RunArgs {
    /// The configuration file (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path.clone_from(input);
        }
        if let Some(kind) = self.kind {
            config.input_kind = Some(kind);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        Ok(config)
    }
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Generate { run } => with_run_logging(&run, handle_generate),
        Commands::Inspect { run } => with_run_logging(&run, handle_inspect),
        Commands::InitConfig { path, force } => handle_init_config(&path, force),
    }
}

/// Resolves the configuration, opens the run log and runs `handler`. On
/// failure the error is logged and the diagnostic checklist is printed.
fn with_run_logging<F>(run: &RunArgs, handler: F) -> Result<()>
where
    F: FnOnce(&GeneratorConfig) -> oraload::error::Result<()>,
{
    let config = run.resolve()?;
    let _guard = logging::init(&config.log_path()).context("Failed to set up logging")?;
    tracing::debug!("Configuration: {config:?}");

    if let Err(err) = handler(&config) {
        tracing::error!("Run failed: {err}");
        println!("{}", diagnostic_checklist(&err, &config));
        return Err(err.into());
    }
    Ok(())
}

fn handle_generate(config: &GeneratorConfig) -> oraload::error::Result<()> {
    let report = flows::generate(config)?;
    println!("{}", generation_summary(&report, config));
    Ok(())
}

fn handle_inspect(config: &GeneratorConfig) -> oraload::error::Result<()> {
    let schema = flows::inspect(config)?;
    println!("{}", schema_table(&schema));
    Ok(())
}

fn handle_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }
    GeneratorConfig::default().save(path)?;
    println!("Default configuration written to {}", path.display());
    Ok(())
}

fn schema_table(schema: &TableSchema) -> String {
    let width = schema
        .columns
        .iter()
        .map(|c| c.source_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "Table {} ({} columns)\n",
        schema.quoted_name(),
        schema.columns.len()
    );
    for column in &schema.columns {
        out.push_str(&format!(
            "  {:<width$}  ->  {:<30}  {}\n",
            column.source_name, column.identifier, column.column_type
        ));
    }
    out
}

fn generation_summary(report: &GenerationReport, config: &GeneratorConfig) -> String {
    let exec_dir = config
        .target
        .execution_dir
        .clone()
        .unwrap_or_else(|| "the folder you will run them from".to_owned());

    let mut out = schema_table(&report.schema);
    out.push_str(&format!("{} rows extracted\n\nFiles written:\n", report.rows));
    for path in report.artifacts.paths() {
        out.push_str(&format!("  {}\n", path.display()));
    }
    out.push_str(&format!(
        "\nNext steps:\n  1. Copy the files above to {exec_dir}.\n  2. Open a command prompt in that folder and run \"{}\".\n",
        config.files.batch_driver
    ));
    out
}

fn diagnostic_checklist(err: &OraloadError, config: &GeneratorConfig) -> String {
    let kind = config
        .input_kind
        .map(|k| k.as_str().to_owned())
        .unwrap_or_else(|| "inferred from the extension".to_owned());

    let items = [
        format!(
            "the input path '{}' is correct and the file exists",
            config.input_path.display()
        ),
        "the input file is not open in another program".to_owned(),
        format!("the input kind ({kind}) matches the real file type"),
        format!(
            "header_row ({}) is the sheet row holding the headers (1 is the first row)",
            config.sheet.header_row
        ),
        format!(
            "data_start_row ({}) is the sheet row where the data starts",
            config.sheet.data_start_row
        ),
        format!(
            "expected_columns ({}) matches the number of columns to read",
            config.sheet.expected_columns
        ),
        format!(
            "for CSV input, the delimiter '{}' is correct",
            config.input_delimiter
        ),
    ];

    let mut out = format!("\nGeneration failed: {err}\nPlease check:\n");
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
    out.push_str(&format!("Details in {}", config.log_path().display()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraload::schema::{ColumnDecision, OracleType, ValueShape};

    #[test]
    fn test_cli_parses_generate_flags() {
        let cli = Cli::parse_from([
            "oraload",
            "generate",
            "--input",
            "dados.txt",
            "--kind",
            "csv",
            "--output-dir",
            "saida",
        ]);
        let Commands::Generate { run } = cli.command else {
            panic!("expected generate");
        };
        let config = run.resolve().expect("defaults resolve");

        assert_eq!(config.input_path, PathBuf::from("dados.txt"));
        assert_eq!(config.input_kind, Some(InputKind::Csv));
        assert_eq!(config.output_dir, PathBuf::from("saida"));
        assert_eq!(config.sheet.header_row, 1);
    }

    #[test]
    fn test_overrides_apply_on_top_of_config_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("oraload.json");
        std::fs::write(
            &path,
            r#"{ "input_path": "a.xlsx", "output_dir": "out", "target": { "grant_user": "LEITOR" } }"#,
        )?;

        let run = RunArgs {
            config: Some(path),
            input: Some(PathBuf::from("b.xlsx")),
            ..RunArgs::default()
        };
        let config = run.resolve()?;
        assert_eq!(config.input_path, PathBuf::from("b.xlsx"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.target.grant_user, "LEITOR");
        Ok(())
    }

    #[test]
    fn test_diagnostic_checklist_mentions_settings() {
        let config = GeneratorConfig::default();
        let err = OraloadError::Spreadsheet("locked".to_owned());
        let text = diagnostic_checklist(&err, &config);

        assert!(text.contains("Generation failed: Spreadsheet error: locked"));
        assert!(text.contains("convenio_plano.xlsx"));
        assert!(text.contains("header_row (1)"));
        assert!(text.contains("data_start_row (2)"));
        assert!(text.contains("expected_columns (14)"));
        assert!(text.contains("delimiter ';'"));
    }

    #[test]
    fn test_schema_table_lists_decisions() {
        let schema = TableSchema {
            name: "TT_OPE_X".to_owned(),
            columns: vec![ColumnDecision {
                source_name: "PLANO".to_owned(),
                identifier: "NM_PLANO".to_owned(),
                column_type: OracleType::Varchar2(7),
                shape: ValueShape::Text,
            }],
        };
        let text = schema_table(&schema);
        assert!(text.starts_with("Table \"TT_OPE_X\" (1 columns)"));
        assert!(text.contains("PLANO  ->  NM_PLANO"));
        assert!(text.contains("VARCHAR2(7)"));
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("oraload.json");

        handle_init_config(&path, false)?;
        assert!(GeneratorConfig::load(&path).is_ok());
        assert!(handle_init_config(&path, false).is_err());
        handle_init_config(&path, true)?;
        Ok(())
    }
}
