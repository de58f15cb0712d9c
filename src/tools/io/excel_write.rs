use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Formula, Table, TableColumn, Workbook, Worksheet};
use tracing::{debug, instrument};

use crate::tools::config::{DEFAULT_INVENTORY_SHEET, DEFAULT_SUMMARY_SHEET};
use crate::tools::error::Result;
use crate::tools::io::ReportSink;
use crate::tools::model::{CanonicalInventoryTable, InventoryColumn, InventoryRow};
use crate::tools::summary::{AggregateCell, RowKind, SummaryReport};

const DECIMAL_FORMAT: &str = "0.00";

/// Writes the inventory and summary sheets to a new xlsx file.
#[derive(Debug, Clone)]
pub struct ExcelReportSink {
    path: PathBuf,
    inventory_sheet: String,
    summary_sheet: String,
}

impl ExcelReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inventory_sheet: DEFAULT_INVENTORY_SHEET.to_string(),
            summary_sheet: DEFAULT_SUMMARY_SHEET.to_string(),
        }
    }

    /// Overrides the sheet names. The inventory name must match the one the
    /// report's formulas were built against.
    pub fn with_sheet_names(
        mut self,
        inventory_sheet: impl Into<String>,
        summary_sheet: impl Into<String>,
    ) -> Self {
        self.inventory_sheet = inventory_sheet.into();
        self.summary_sheet = summary_sheet.into();
        self
    }
}

impl ReportSink for ExcelReportSink {
    fn write_report(
        &mut self,
        inventory: &CanonicalInventoryTable,
        report: &SummaryReport,
    ) -> Result<()> {
        write_workbook(
            &self.path,
            &self.inventory_sheet,
            &self.summary_sheet,
            inventory,
            report,
        )
    }
}

/// Writes both sheets to `path`, replacing any existing file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn write_workbook(
    path: &Path,
    inventory_sheet: &str,
    summary_sheet: &str,
    inventory: &CanonicalInventoryTable,
    report: &SummaryReport,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(inventory_sheet)?;
    write_inventory(worksheet, inventory)?;

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(summary_sheet)?;
    write_summary(worksheet, inventory, report)?;

    workbook.save(path)?;
    debug!(row_count = inventory.len(), "workbook saved");
    Ok(())
}

fn write_inventory(worksheet: &mut Worksheet, inventory: &CanonicalInventoryTable) -> Result<()> {
    let decimal = Format::new().set_num_format(DECIMAL_FORMAT);
    let headers = inventory.headers();

    for (col_idx, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
        worksheet.set_column_width(col_idx as u16, (header.len() as f64 + 4.0).max(12.0))?;
    }

    for (row_idx, row) in inventory.rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        for column in InventoryColumn::ALL {
            write_inventory_cell(worksheet, sheet_row, column, row, &decimal)?;
        }
    }

    let columns: Vec<TableColumn> = headers
        .iter()
        .map(|header| TableColumn::new().set_header(header))
        .collect();
    let mut excel_table = Table::new();
    excel_table.set_autofilter(true).set_columns(&columns);

    let col_end = (headers.len() as u16).saturating_sub(1);
    let row_end = inventory.len().max(1) as u32;
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_inventory_cell(
    worksheet: &mut Worksheet,
    sheet_row: u32,
    column: InventoryColumn,
    row: &InventoryRow,
    decimal: &Format,
) -> Result<()> {
    let col = column.index();
    if let Some(text) = row.text(column) {
        // Blank placeholders stay empty cells for people to fill in.
        if !text.is_empty() {
            worksheet.write_string(sheet_row, col, text)?;
        }
    } else if column == InventoryColumn::Cpus {
        worksheet.write_number(sheet_row, col, f64::from(row.cpus))?;
    } else if let Some(value) = row.number(column) {
        worksheet.write_number_with_format(sheet_row, col, value, decimal)?;
    }
    Ok(())
}

fn write_summary(
    worksheet: &mut Worksheet,
    inventory: &CanonicalInventoryTable,
    report: &SummaryReport,
) -> Result<()> {
    let bold = Format::new().set_bold();
    let total = Format::new().set_bold().set_num_format(DECIMAL_FORMAT);
    let decimal = Format::new().set_num_format(DECIMAL_FORMAT);

    for (col_idx, header) in report.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, header, &bold)?;
        worksheet.set_column_width(col_idx as u16, (header.len() as f64 + 4.0).max(14.0))?;
    }

    let evaluated = report.evaluate(inventory);
    for (section, values) in report.sections.iter().zip(&evaluated) {
        worksheet.write_string_with_format(section.heading_row - 1, 0, &section.title, &bold)?;

        for (summary_row, evaluated_row) in section.rows.iter().zip(&values.rows) {
            let sheet_row = summary_row.row - 1;
            let format = if summary_row.kind == RowKind::Group {
                &decimal
            } else {
                &total
            };
            worksheet.write_string(sheet_row, 0, &summary_row.category)?;
            worksheet.write_string(sheet_row, 1, &summary_row.sub_category)?;

            let cached = evaluated_row.values();
            for (offset, cell) in summary_row.cells.iter().enumerate() {
                let col = 2 + offset as u16;
                match cell {
                    AggregateCell::Literal(value) => {
                        worksheet.write_number_with_format(sheet_row, col, *value, format)?;
                    }
                    AggregateCell::Formula(_) => {
                        let text = cell.formula_text().unwrap_or_default();
                        let formula = Formula::new(text).set_result(cached[offset].to_string());
                        worksheet.write_formula_with_format(sheet_row, col, formula, format)?;
                    }
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}
