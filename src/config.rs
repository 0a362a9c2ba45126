//! Run configuration.
//!
//! Every setting of a run lives in [`GeneratorConfig`]: where the input is and
//! how it is laid out, where artifacts go and how they are named, the Oracle
//! client environment the generated scripts run against, and the naming rules
//! for tables and columns. It is stored as JSON; missing fields take their
//! defaults.

use crate::error::{OraloadError, Result, ResultExt as _};
use crate::schema::NamingRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Spreadsheet workbook (xlsx, xlsm, xlsb, xls, ods)
    Excel,
    /// Delimited text
    Csv,
}

impl InputKind {
    /// Infers the kind from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Excel),
            "csv" | "txt" => Ok(Self::Csv),
            _ => Err(OraloadError::UnsupportedInput(format!(
                "{} (expected a spreadsheet or a delimited text file)",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Csv => "csv",
        }
    }
}

/// Where the header and the data sit in the worksheet. Rows are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub header_row: u32,
    pub data_start_row: u32,
    /// Number of columns the sheet is expected to have. Only reported.
    pub expected_columns: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_row: 1,
            data_start_row: 2,
            expected_columns: 14,
        }
    }
}

/// File names of everything a run produces or the generated scripts create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    pub drop_script: String,
    pub create_script: String,
    pub batch_driver: String,
    pub loader_script: String,
    /// Written by the loader script at load time
    pub control_file: String,
    /// Written by the loader script at load time
    pub parameter_file: String,
    /// Written by the batch driver when credentials are entered
    pub credentials_file: String,
    pub data_file: String,
    pub table_name_file: String,
    pub log_file: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            drop_script: "drop_table_script.sql".to_owned(),
            create_script: "create_table_only_script.sql".to_owned(),
            batch_driver: "execute_db_scripts.bat".to_owned(),
            loader_script: "execute_sqlldr.ps1".to_owned(),
            control_file: "sqlldr_control_file.ctl".to_owned(),
            parameter_file: "sqlldr_parameter_file.par".to_owned(),
            credentials_file: "db_credentials.txt".to_owned(),
            data_file: "temp_data_to_load.csv".to_owned(),
            table_name_file: "nome_tabela_gerado.txt".to_owned(),
            log_file: "script_execution.log".to_owned(),
        }
    }
}

/// Oracle client environment the generated scripts run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetEnvironment {
    /// Receives `GRANT ALL` on the created table
    pub grant_user: String,
    pub oracle_home: String,
    pub nls_lang: String,
    /// Decimal and group separators SQL*Loader uses for numbers in the extract
    pub nls_numeric_characters: String,
    /// Folder the artifacts are executed from. When unset the scripts use the
    /// folder they are stored in.
    pub execution_dir: Option<String>,
}

impl Default for TargetEnvironment {
    fn default() -> Self {
        Self {
            grant_user: "HUMASTER".to_owned(),
            oracle_home: r"C:\oracle\product\12.2.0\client_1".to_owned(),
            nls_lang: "BRAZILIAN PORTUGUESE_BRAZIL.AL32UTF8".to_owned(),
            nls_numeric_characters: ".,".to_owned(),
            execution_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub input_path: PathBuf,
    /// Inferred from the extension when unset
    pub input_kind: Option<InputKind>,
    /// Field delimiter of CSV input
    pub input_delimiter: char,
    pub sheet: SheetLayout,
    pub output_dir: PathBuf,
    /// Field delimiter of the generated extract
    pub output_delimiter: char,
    pub files: ArtifactNames,
    pub target: TargetEnvironment,
    pub naming: NamingRules,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("convenio_plano.xlsx"),
            input_kind: None,
            input_delimiter: ';',
            sheet: SheetLayout::default(),
            output_dir: PathBuf::from("."),
            output_delimiter: ';',
            files: ArtifactNames::default(),
            target: TargetEnvironment::default(),
            naming: NamingRules::default(),
        }
    }
}

impl GeneratorConfig {
    /// Loads a configuration file. Fields missing from the file keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Rejects settings no run could succeed with.
    ///
    /// # Errors
    ///
    /// Returns [`OraloadError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.sheet.header_row == 0 {
            return Err(OraloadError::Config(
                "header_row is 1-based and cannot be 0".to_owned(),
            ));
        }
        if self.sheet.data_start_row <= self.sheet.header_row {
            return Err(OraloadError::Config(format!(
                "data_start_row ({}) must come after header_row ({})",
                self.sheet.data_start_row, self.sheet.header_row
            )));
        }
        delimiter_byte(self.input_delimiter)?;
        delimiter_byte(self.output_delimiter)?;

        let naming = &self.naming;
        let prefix_len = naming.table_prefix.chars().count();
        if prefix_len == 0 || prefix_len >= naming.identifier_max_len {
            return Err(OraloadError::Config(format!(
                "table_prefix '{}' must be non-empty and shorter than {} characters",
                naming.table_prefix, naming.identifier_max_len
            )));
        }

        let prefixes = &naming.prefixes;
        let all_prefixes = [
            &naming.table_prefix,
            &naming.table_fallback_prefix,
            &naming.column_fallback_prefix,
            &prefixes.numeric,
            &prefixes.date,
            &prefixes.flag,
            &prefixes.code,
            &prefixes.name,
        ];
        if let Some(bad) = all_prefixes
            .into_iter()
            .chain(&naming.reserved_prefixes)
            .find(|p| !is_identifier_prefix(p))
        {
            return Err(OraloadError::Config(format!(
                "prefix '{bad}' must start with an uppercase letter and only contain A-Z, 0-9 and _"
            )));
        }
        Ok(())
    }

    /// The configured input kind, or the one implied by the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`OraloadError::UnsupportedInput`] when no kind is configured
    /// and the extension is not recognised.
    pub fn resolve_input_kind(&self) -> Result<InputKind> {
        match self.input_kind {
            Some(kind) => Ok(kind),
            None => InputKind::from_path(&self.input_path),
        }
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_path(&self.files.log_file)
    }
}

/// Converts a delimiter to the single byte the CSV reader and writer expect.
///
/// # Errors
///
/// Returns [`OraloadError::Config`] for non-ASCII delimiters.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            OraloadError::Config(format!("delimiter '{delimiter}' must be a single ASCII character"))
        })
}

fn is_identifier_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sheet.header_row, 1);
        assert_eq!(config.sheet.data_start_row, 2);
        assert_eq!(config.output_delimiter, ';');
        assert_eq!(config.files.data_file, "temp_data_to_load.csv");
        assert_eq!(config.target.grant_user, "HUMASTER");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "input_path": "dados/planos.csv",
            "sheet": { "header_row": 3, "data_start_row": 4 },
            "naming": { "table_prefix": "TT_CAD_" }
        }"#;
        let config: GeneratorConfig = serde_json::from_str(json).expect("valid config");

        assert_eq!(config.input_path, PathBuf::from("dados/planos.csv"));
        assert_eq!(config.sheet.header_row, 3);
        assert_eq!(config.sheet.expected_columns, 14);
        assert_eq!(config.naming.table_prefix, "TT_CAD_");
        assert_eq!(config.naming.identifier_max_len, 30);
        assert_eq!(config.naming.prefixes.date, "DT_");
    }

    #[test]
    fn test_save_then_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("oraload.json");

        let mut config = GeneratorConfig::default();
        config.input_kind = Some(InputKind::Csv);
        config.target.execution_dir = Some(r"\\tsclient\C\cargas".to_owned());
        config.save(&path)?;

        let loaded = GeneratorConfig::load(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_rows() {
        let mut config = GeneratorConfig::default();
        config.sheet.header_row = 0;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.sheet.header_row = 2;
        config.sheet.data_start_row = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("data_start_row"));
    }

    #[test]
    fn test_validate_rejects_bad_prefixes_and_delimiters() {
        let mut config = GeneratorConfig::default();
        config.naming.prefixes.code = "cd_".to_owned();
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.naming.table_prefix = "X".repeat(30);
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.output_delimiter = '§';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_input_kind_detection() {
        assert_eq!(
            InputKind::from_path(Path::new("convenio_plano.XLSX")).ok(),
            Some(InputKind::Excel)
        );
        assert_eq!(InputKind::from_path(Path::new("dados.csv")).ok(), Some(InputKind::Csv));

        let err = InputKind::from_path(Path::new("relatorio.pdf")).unwrap_err();
        assert!(matches!(err, OraloadError::UnsupportedInput(_)));

        let mut config = GeneratorConfig::default();
        config.input_path = PathBuf::from("sem_extensao");
        assert!(config.resolve_input_kind().is_err());
        config.input_kind = Some(InputKind::Csv);
        assert_eq!(config.resolve_input_kind().ok(), Some(InputKind::Csv));
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(';').ok(), Some(b';'));
        assert_eq!(delimiter_byte('\t').ok(), Some(b'\t'));
        assert!(delimiter_byte('é').is_err());
    }
}
