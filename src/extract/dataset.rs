use crate::error::{Result, ResultExt as _};
use crate::schema::{NamingRules, TableSchema, classify_column, ensure_unique_identifiers};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Extract timestamp layout, matching the `YYYY-MM-DD HH24:MI:SS` loader mask.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The input after classification: the target schema and the frame whose
/// columns carry the final identifiers, in input order.
#[derive(Debug, Clone)]
pub struct ExtractedDataset {
    pub schema: TableSchema,
    pub frame: DataFrame,
}

impl ExtractedDataset {
    /// Classifies every column of `frame` and renames it to its identifier.
    ///
    /// Column names of `frame` must already be cleaned and unique.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be profiled.
    pub fn classify(table_name: String, frame: DataFrame, rules: &NamingRules) -> Result<Self> {
        let mut decisions = frame
            .get_columns()
            .iter()
            .map(|column| classify_column(column.name().as_str(), column, rules))
            .collect::<Result<Vec<_>>>()?;
        ensure_unique_identifiers(&mut decisions, rules.identifier_max_len);

        for decision in &decisions {
            debug!(
                "{} -> {} {} ({})",
                decision.source_name,
                decision.identifier,
                decision.column_type,
                decision.shape.as_str()
            );
        }

        let columns: Vec<Column> = frame
            .get_columns()
            .iter()
            .zip(&decisions)
            .map(|(column, decision)| column.clone().with_name(decision.identifier.as_str().into()))
            .collect();

        Ok(Self {
            schema: TableSchema {
                name: table_name,
                columns: decisions,
            },
            frame: DataFrame::new(columns)?,
        })
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    /// Writes the extract loaded by SQL*Loader: UTF-8 with BOM, every field
    /// quoted, one header row of final identifiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv(&self, path: &Path, delimiter: u8) -> Result<()> {
        let mut frame = self.loadable_frame()?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create extract: {}", path.display()))?;

        CsvWriter::new(&mut file)
            .include_bom(true)
            .include_header(true)
            .with_separator(delimiter)
            .with_quote_style(QuoteStyle::Always)
            .with_datetime_format(Some(DATETIME_FORMAT.to_owned()))
            .finish(&mut frame)
            .with_context(|| format!("Failed to write extract: {}", path.display()))?;

        debug!("Wrote {} rows to {}", frame.height(), path.display());
        Ok(())
    }

    /// Copy of the frame as the loader expects it: booleans as 1/0 for the
    /// `NUMBER(1)` columns, plain dates as midnight timestamps so every `DATE`
    /// column shares one mask.
    fn loadable_frame(&self) -> Result<DataFrame> {
        let columns = self
            .frame
            .get_columns()
            .iter()
            .map(|column| match column.dtype() {
                DataType::Boolean => column.cast(&DataType::Int32),
                DataType::Date => column.cast(&DataType::Datetime(TimeUnit::Milliseconds, None)),
                _ => Ok(column.clone()),
            })
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::indexing_slicing)]
    use super::*;
    use crate::schema::OracleType;

    fn sample() -> anyhow::Result<ExtractedDataset> {
        let frame = df!(
            "PLANO" => ["OURO", "PRATA"],
            "IDADE" => [30i64, 41],
            "ATIVO" => [true, false],
        )?;
        Ok(ExtractedDataset::classify(
            "TT_OPE_TESTE".to_owned(),
            frame,
            &NamingRules::default(),
        )?)
    }

    #[test]
    fn test_columns_renamed_in_order() -> anyhow::Result<()> {
        let dataset = sample()?;

        let names: Vec<&str> = dataset.frame.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["NM_PLANO", "NU_IDADE", "FL_ATIVO"]);
        assert_eq!(dataset.schema.column_names().collect::<Vec<_>>(), names);
        assert_eq!(dataset.schema.columns[0].column_type, OracleType::Varchar2(5));
        assert_eq!(dataset.schema.columns[2].source_name, "ATIVO");
        assert_eq!(dataset.row_count(), 2);
        Ok(())
    }

    #[test]
    fn test_truncation_collisions_are_resolved() -> anyhow::Result<()> {
        let frame = df!(
            "QUANTIDADE_DE_BENEFICIARIOS_ATIVOS" => [1i64],
            "QUANTIDADE_DE_BENEFICIARIOS_INATIVOS" => [2i64],
        )?;
        let dataset =
            ExtractedDataset::classify("TT_OPE_X".to_owned(), frame, &NamingRules::default())?;

        let names: Vec<&str> = dataset.frame.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["NU_QUANTIDADE_DE_BENEFICIARIOS", "NU_QUANTIDADE_DE_BENEFICIARI_1"]
        );
        Ok(())
    }

    #[test]
    fn test_write_csv_format() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("extract.csv");

        sample()?.write_csv(&path, b';')?;

        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]), "missing BOM");

        let text = String::from_utf8(bytes[3..].to_vec())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("NM_PLANO") && lines[0].contains("FL_ATIVO"));
        assert!(lines[1].starts_with(r#""OURO";"#), "{}", lines[1]);
        assert_eq!(lines[1].replace('"', ""), "OURO;30;1");
        assert_eq!(lines[2].replace('"', ""), "PRATA;41;0");
        Ok(())
    }

    #[test]
    fn test_write_csv_datetime_format() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("extract.csv");

        let inicio = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .ok_or_else(|| anyhow::anyhow!("bad date"))?;
        let frame = DataFrame::new(vec![Column::new("INICIO".into(), [Some(inicio), None])])?;
        let dataset =
            ExtractedDataset::classify("TT_OPE_X".to_owned(), frame, &NamingRules::default())?;
        assert_eq!(dataset.schema.columns[0].column_type, OracleType::Date);

        dataset.write_csv(&path, b';')?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("2024-01-31 08:30:00"), "{text}");
        Ok(())
    }

    #[test]
    fn test_write_csv_dates_use_datetime_mask() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("extract.csv");

        let day = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).ok_or_else(|| anyhow::anyhow!("bad date"))?;
        let frame = DataFrame::new(vec![Column::new("VIGENCIA".into(), [day])])?;
        let dataset =
            ExtractedDataset::classify("TT_OPE_X".to_owned(), frame, &NamingRules::default())?;

        dataset.write_csv(&path, b';')?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("2024-02-29 00:00:00"), "{text}");
        Ok(())
    }
}
