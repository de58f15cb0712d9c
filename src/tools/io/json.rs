use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::tools::error::Result;
use crate::tools::model::{CanonicalInventoryTable, InventoryRow, UnitConvention};
use crate::tools::summary::{EvaluatedSection, SummaryReport};

#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    units: UnitConvention,
    row_count: usize,
    sections: Vec<EvaluatedSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inventory: Option<&'a [InventoryRow]>,
}

/// Evaluated summary, optionally with the inventory rows, as JSON.
pub fn summary_to_json(
    inventory: &CanonicalInventoryTable,
    report: &SummaryReport,
    include_rows: bool,
) -> Result<Value> {
    let document = SummaryDocument {
        units: inventory.units,
        row_count: inventory.len(),
        sections: report.evaluate(inventory),
        inventory: include_rows.then_some(inventory.rows.as_slice()),
    };
    Ok(serde_json::to_value(document)?)
}

/// Writes [`summary_to_json`] output to `path`, pretty-printed.
pub fn write_summary_json(
    path: &Path,
    inventory: &CanonicalInventoryTable,
    report: &SummaryReport,
    include_rows: bool,
) -> Result<()> {
    let json = summary_to_json(inventory, report, include_rows)?;
    let json_string = serde_json::to_string_pretty(&json)?;
    fs::write(path, json_string)?;
    Ok(())
}
