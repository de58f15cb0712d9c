//! Summary report: power state, operating system and migration-scope
//! rollups over the canonical inventory.
//!
//! Aggregate cells are formulas against the inventory sheet rather than
//! precomputed numbers, so edits made to the inventory after export (most
//! often to the scope flags) flow through to the summary.
//! [`SummaryReport::evaluate`] computes the same values in process for cached
//! results and JSON output.

pub mod builder;
pub mod formula;

use std::collections::HashMap;

use serde::Serialize;

use crate::tools::model::{
    CanonicalInventoryTable, InventoryColumn, InventoryRow, UnitConvention,
};

pub use builder::{RowCursor, SummaryBuilder, build_summary};

/// Flag values, compared case-insensitively, that put a VM in scope.
pub const SCOPE_TRUTHY_VALUES: [&str; 5] = ["yes", "true", "1", "x", "y"];

/// Zero-based summary column holding the first aggregate (Count).
pub const FIRST_MEASURE_COLUMN: u16 = 2;

/// Whether a scope flag marks the row as in scope.
pub fn is_in_scope(flag: &str) -> bool {
    SCOPE_TRUTHY_VALUES
        .iter()
        .any(|truthy| flag.eq_ignore_ascii_case(truthy))
}

/// The quantity an aggregate cell reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count,
    Sum(InventoryColumn),
}

/// Aggregates in summary column order.
pub const MEASURES: [Measure; 5] = [
    Measure::Count,
    Measure::Sum(InventoryColumn::Cpus),
    Measure::Sum(InventoryColumn::Memory),
    Measure::Sum(InventoryColumn::ProvisionedDisk),
    Measure::Sum(InventoryColumn::InUseDisk),
];

/// Which inventory rows an aggregate covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    All,
    /// Case-insensitive equality, matching `COUNTIFS` semantics.
    Equals {
        column: InventoryColumn,
        value: String,
    },
    InScope(InventoryColumn),
    NotInScope(InventoryColumn),
}

impl RowFilter {
    pub fn matches(&self, row: &InventoryRow) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Equals { column, value } => row
                .text(*column)
                .is_some_and(|text| fold_case(text) == fold_case(value)),
            RowFilter::InScope(flag) => row.text(*flag).is_some_and(is_in_scope),
            RowFilter::NotInScope(flag) => !row.text(*flag).is_some_and(is_in_scope),
        }
    }
}

pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// The inventory sheet's data rows, 1-based and inclusive.
///
/// An empty inventory still spans row 2 so that range references stay valid;
/// `row_count` records the real number of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSpan {
    pub sheet: String,
    pub first_row: u32,
    pub last_row: u32,
    pub row_count: usize,
}

impl DataSpan {
    pub fn for_table(sheet: impl Into<String>, table: &CanonicalInventoryTable) -> Self {
        let first_row = 2;
        let last_row = first_row + (table.len() as u32).saturating_sub(1);
        Self {
            sheet: sheet.into(),
            first_row,
            last_row,
            row_count: table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Formula behind an aggregate cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaExpr {
    /// Conditional aggregate over the inventory sheet.
    Inventory {
        measure: Measure,
        filter: RowFilter,
        span: DataSpan,
    },
    /// Sum of a contiguous block of summary rows in one summary column.
    RangeSum {
        column: u16,
        first_row: u32,
        last_row: u32,
    },
}

/// Content of an aggregate cell.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateCell {
    Literal(f64),
    Formula(FormulaExpr),
}

impl AggregateCell {
    /// Formula text with leading `=`, or `None` for literals.
    pub fn formula_text(&self) -> Option<String> {
        match self {
            AggregateCell::Literal(_) => None,
            AggregateCell::Formula(expr) => Some(formula::render(expr)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Group,
    Subtotal,
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub category: String,
    pub sub_category: String,
    pub kind: RowKind,
    /// 1-based summary sheet row.
    pub row: u32,
    /// One cell per entry of [`MEASURES`].
    pub cells: [AggregateCell; 5],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    /// 1-based summary sheet row carrying the section title.
    pub heading_row: u32,
    pub rows: Vec<SummaryRow>,
}

impl Section {
    pub fn group_rows(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().filter(|row| row.kind == RowKind::Group)
    }

    pub fn total_row(&self) -> Option<&SummaryRow> {
        self.rows.iter().find(|row| row.kind != RowKind::Group)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub units: UnitConvention,
    pub sections: Vec<Section>,
}

/// Aggregate values of one summary row, computed in process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedRow {
    pub category: String,
    pub sub_category: String,
    pub kind: RowKind,
    pub row: u32,
    pub count: f64,
    pub cpus: f64,
    pub memory_gb: f64,
    pub provisioned_disk_gb: f64,
    pub in_use_disk_gb: f64,
}

impl EvaluatedRow {
    pub fn values(&self) -> [f64; 5] {
        [
            self.count,
            self.cpus,
            self.memory_gb,
            self.provisioned_disk_gb,
            self.in_use_disk_gb,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedSection {
    pub title: String,
    pub rows: Vec<EvaluatedRow>,
}

impl SummaryReport {
    /// Header row of the summary sheet.
    pub fn headers(&self) -> Vec<String> {
        let unit = self.units.label();
        vec![
            "Category".to_string(),
            "Sub-Category".to_string(),
            "Count".to_string(),
            "Total CPUs".to_string(),
            format!("Total Memory ({unit})"),
            format!("Total Provisioned Disk ({unit})"),
            format!("Total In Use Disk ({unit})"),
        ]
    }

    /// Computes every aggregate the way a spreadsheet would after recalculation.
    pub fn evaluate(&self, table: &CanonicalInventoryTable) -> Vec<EvaluatedSection> {
        let mut by_row: HashMap<u32, [f64; 5]> = HashMap::new();
        let mut sections = Vec::with_capacity(self.sections.len());

        for section in &self.sections {
            let mut rows = Vec::with_capacity(section.rows.len());
            for summary_row in &section.rows {
                let mut values = [0.0; 5];
                for (slot, cell) in values.iter_mut().zip(&summary_row.cells) {
                    *slot = evaluate_cell(cell, table, &by_row);
                }
                by_row.insert(summary_row.row, values);
                rows.push(EvaluatedRow {
                    category: summary_row.category.clone(),
                    sub_category: summary_row.sub_category.clone(),
                    kind: summary_row.kind,
                    row: summary_row.row,
                    count: values[0],
                    cpus: values[1],
                    memory_gb: values[2],
                    provisioned_disk_gb: values[3],
                    in_use_disk_gb: values[4],
                });
            }
            sections.push(EvaluatedSection {
                title: section.title.clone(),
                rows,
            });
        }

        sections
    }
}

fn evaluate_cell(
    cell: &AggregateCell,
    table: &CanonicalInventoryTable,
    by_row: &HashMap<u32, [f64; 5]>,
) -> f64 {
    match cell {
        AggregateCell::Literal(value) => *value,
        AggregateCell::Formula(FormulaExpr::Inventory {
            measure, filter, ..
        }) => table
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .map(|row| match measure {
                Measure::Count => 1.0,
                Measure::Sum(column) => row.number(*column).unwrap_or_default(),
            })
            .sum(),
        AggregateCell::Formula(FormulaExpr::RangeSum {
            column,
            first_row,
            last_row,
        }) => {
            let index = usize::from(column.saturating_sub(FIRST_MEASURE_COLUMN));
            (*first_row..=*last_row)
                .filter_map(|row| by_row.get(&row))
                .map(|values| values.get(index).copied().unwrap_or_default())
                .sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_flags_match_case_insensitively() {
        for flag in ["yes", "YES", "True", "1", "x", "X", "y"] {
            assert!(is_in_scope(flag), "{flag} should be in scope");
        }
        for flag in ["", "no", "n", "0", "yes please", " yes"] {
            assert!(!is_in_scope(flag), "{flag:?} should be out of scope");
        }
    }

    #[test]
    fn empty_inventory_span_still_covers_one_row() {
        let table = CanonicalInventoryTable {
            units: UnitConvention::BinaryGib,
            rows: Vec::new(),
        };
        let span = DataSpan::for_table("ServerList", &table);
        assert_eq!((span.first_row, span.last_row), (2, 2));
        assert!(span.is_empty());
    }
}
