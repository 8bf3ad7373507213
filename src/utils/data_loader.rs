//! Dataset loading and saving

use crate::error::{SalaryError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// On-disk dataset formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Tsv,
    Parquet,
    /// Line-delimited JSON
    Json,
}

impl DatasetFormat {
    /// Format from the file extension; unknown extensions read as CSV
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "tsv" => DatasetFormat::Tsv,
            "parquet" | "pq" => DatasetFormat::Parquet,
            "json" | "jsonl" | "ndjson" => DatasetFormat::Json,
            _ => DatasetFormat::Csv,
        }
    }
}

/// Reads salary datasets through polars
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows sampled to infer CSV column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self { infer_schema_length: 1000 }
    }

    /// Set the number of rows used for CSV type inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    fn open(path: &Path) -> Result<File> {
        File::open(path).map_err(|e| {
            SalaryError::DataError(format!("cannot open {}: {}", path.display(), e))
        })
    }

    /// Load a delimited text file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>, separator: u8) -> Result<DataFrame> {
        let file = Self::open(path.as_ref())?;
        let parse_opts = CsvParseOptions::default().with_separator(separator);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| SalaryError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = Self::open(path.as_ref())?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| SalaryError::DataError(e.to_string()))
    }

    /// Load a line-delimited JSON file
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = Self::open(path.as_ref())?;
        JsonReader::new(file)
            .with_json_format(JsonFormat::JsonLines)
            .finish()
            .map_err(|e| SalaryError::DataError(e.to_string()))
    }

    /// Detect the format from the extension and load
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let format = DatasetFormat::from_path(path);
        let df = match format {
            DatasetFormat::Csv => self.load_csv(path, b',')?,
            DatasetFormat::Tsv => self.load_csv(path, b'\t')?,
            DatasetFormat::Parquet => self.load_parquet(path)?,
            DatasetFormat::Json => self.load_json(path)?,
        };
        info!(
            path = %path.display(),
            ?format,
            rows = df.height(),
            columns = df.width(),
            "Loaded dataset"
        );
        Ok(df)
    }
}

/// Writes DataFrames in the format implied by the extension
pub struct DataSaver;

impl DataSaver {
    pub fn save(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        match DatasetFormat::from_path(path) {
            DatasetFormat::Csv => CsvWriter::new(&mut file).finish(df)?,
            DatasetFormat::Tsv => CsvWriter::new(&mut file).with_separator(b'\t').finish(df)?,
            DatasetFormat::Parquet => {
                ParquetWriter::new(file).finish(df)?;
            }
            DatasetFormat::Json => JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(df)?,
        }
        info!(path = %path.display(), rows = df.height(), "Saved dataset");
        Ok(())
    }
}
