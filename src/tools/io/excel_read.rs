use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, open_workbook_auto};
use tracing::{debug, instrument};

use crate::tools::error::{Result, ToolError};
use crate::tools::io::TableSource;
use crate::tools::model::{Cell, RawTable};

/// Reads one sheet of an xlsx/xls/ods workbook, taking the first row as the
/// column names.
#[derive(Debug, Clone)]
pub struct ExcelTableSource {
    path: PathBuf,
    sheet: String,
}

impl ExcelTableSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }
}

impl TableSource for ExcelTableSource {
    fn load_table(&mut self) -> Result<RawTable> {
        read_table(&self.path, &self.sheet)
    }
}

/// Loads `sheet` from the workbook at `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), sheet = %sheet))]
pub fn read_table(path: &Path, sheet: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;

    let range = match workbook.worksheet_range(sheet) {
        Some(range) => range?,
        None => {
            return Err(ToolError::MissingSheet {
                sheet: sheet.to_string(),
                available: workbook.sheet_names().to_vec(),
            });
        }
    };

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell_to_string(Some(cell))).collect(),
        None => {
            return Err(ToolError::InvalidWorkbook(format!(
                "sheet '{sheet}' has no header row"
            )));
        }
    };

    let rows: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(to_cell).collect()).collect();
    debug!(
        column_count = columns.len(),
        row_count = rows.len(),
        "read source sheet"
    );

    Ok(RawTable::new(columns, rows))
}

fn to_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        DataType::String(value) if value.is_empty() => Cell::Empty,
        DataType::String(value) => Cell::Text(value.clone()),
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        other => Cell::Text(other.to_string()),
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
