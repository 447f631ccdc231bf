//! Dataset file loading

use crate::error::{BuilderError, Result};
use calamine::Data as Cell;
use calamine::Reader as _;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Text cells read as missing in CSV and Excel input (empty cells are always missing)
pub const NULL_MARKERS: [&str; 9] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "n/a"];

/// Rows scanned to infer CSV column types
const INFER_SCHEMA_ROWS: usize = 1000;

/// Supported dataset file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
    Parquet,
    Excel,
}

impl DataFormat {
    /// Format from the file extension, case-insensitive
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(DataFormat::Csv),
            "json" => Some(DataFormat::Json),
            "parquet" => Some(DataFormat::Parquet),
            "xlsx" | "xls" => Some(DataFormat::Excel),
            _ => None,
        }
    }

    pub fn extensions() -> &'static [&'static str] {
        &[".csv", ".json", ".parquet", ".xlsx", ".xls"]
    }
}

/// A plain file name: a single path component that is neither `.` nor `..`
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
        && name != "."
        && name != ".."
}

/// Reads uploaded datasets from a single directory
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    upload_dir: PathBuf,
}

impl DatasetLoader {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Path a dataset with this name is stored at
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        if !is_safe_file_name(name) {
            return Err(BuilderError::InvalidInput(format!("Invalid file name '{}'", name)));
        }
        Ok(self.upload_dir.join(name))
    }

    /// Existing file for a dataset name, `None` when absent or unsafe
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.path_for(name).ok().filter(|path| path.is_file())
    }

    /// Load a stored dataset by name
    pub fn load_named(&self, name: &str) -> Result<DataFrame> {
        let path = self
            .resolve(name)
            .ok_or_else(|| BuilderError::DatasetNotFound(name.to_string()))?;
        Self::load(&path)
    }

    /// Detect file format from extension and load
    pub fn load(path: &Path) -> Result<DataFrame> {
        match DataFormat::from_path(path) {
            Some(DataFormat::Csv) => Self::load_csv(path),
            Some(DataFormat::Json) => Self::load_json(path),
            Some(DataFormat::Parquet) => Self::load_parquet(path),
            Some(DataFormat::Excel) => Self::load_excel(path),
            None => Err(BuilderError::DataError(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    /// Load a CSV file with a header row
    pub fn load_csv(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        let null_values: Vec<PlSmallStr> = NULL_MARKERS.iter().map(|m| (*m).into()).collect();
        let parse_opts = CsvParseOptions::default()
            .with_null_values(Some(NullValues::AllColumns(null_values)));

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| BuilderError::DataError(e.to_string()))
    }

    /// Load a JSON file (array of records)
    pub fn load_json(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        JsonReader::new(file)
            .finish()
            .map_err(|e| BuilderError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| BuilderError::DataError(e.to_string()))
    }

    /// Load the first worksheet of an Excel workbook. The first row names
    /// the columns; each column is numeric when every present cell is a
    /// number, boolean when every present cell is a boolean, text otherwise.
    pub fn load_excel(path: &Path) -> Result<DataFrame> {
        let mut workbook = calamine::open_workbook_auto(path)
            .map_err(|e| BuilderError::DataError(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| {
                BuilderError::DataError(format!("{} has no worksheets", path.display()))
            })?
            .map_err(|e| BuilderError::DataError(e.to_string()))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| BuilderError::DataError(format!("{} is empty", path.display())))?;
        let body: Vec<&[Cell]> = rows.collect();

        let names = header_names(header);
        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(j, name)| excel_column(name, body.iter().map(|row| row.get(j))))
            .collect();

        DataFrame::new(columns).map_err(|e| BuilderError::DataError(e.to_string()))
    }
}

/// Header cells as column names; blanks become `Unnamed: <i>` and repeats get a `.<n>` suffix
fn header_names(header: &[Cell]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(j, cell)| {
            let base = match cell {
                Cell::Empty => format!("Unnamed: {}", j),
                other => other.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn excel_column<'a>(name: &str, cells: impl Iterator<Item = Option<&'a Cell>>) -> Column {
    let cells: Vec<Option<&Cell>> = cells
        .map(|cell| match cell {
            None | Some(Cell::Empty) | Some(Cell::Error(_)) => None,
            Some(Cell::String(s)) if s.trim().is_empty() || NULL_MARKERS.contains(&s.as_str()) => {
                None
            }
            Some(other) => Some(other),
        })
        .collect();
    let name: PlSmallStr = name.into();
    let present = || cells.iter().flatten();

    if present().all(|c| matches!(c, Cell::Int(_) | Cell::Float(_))) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Some(Cell::Int(v)) => Some(*v as f64),
                Some(Cell::Float(v)) => Some(*v),
                _ => None,
            })
            .collect();
        // Whole numbers without gaps read as integers, like a CSV column would
        let integral = values
            .iter()
            .all(|v| v.map_or(false, |x| x.fract() == 0.0 && x.abs() < i64::MAX as f64));
        if integral && !values.is_empty() {
            let ints: Vec<i64> = values.iter().flatten().map(|x| *x as i64).collect();
            return Column::new(name, ints);
        }
        return Column::new(name, values);
    }

    if present().all(|c| matches!(c, Cell::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Some(Cell::Bool(b)) => Some(*b),
                _ => None,
            })
            .collect();
        return Column::new(name, values);
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| c.map(|cell| cell.to_string()))
        .collect();
    Column::new(name, values)
}
