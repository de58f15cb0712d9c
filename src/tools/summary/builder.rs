use std::collections::HashSet;

use tracing::debug;

use crate::tools::model::{CanonicalInventoryTable, InventoryColumn};
use crate::tools::summary::{
    AggregateCell, DataSpan, FIRST_MEASURE_COLUMN, FormulaExpr, MEASURES, Measure, RowFilter,
    RowKind, Section, SummaryReport, SummaryRow, fold_case,
};

pub const POWER_STATE_TITLE: &str = "Power State";
pub const OPERATING_SYSTEM_TITLE: &str = "Operating System";
pub const PROD_SCOPE_TITLE: &str = "In Scope for Prod";
pub const DR_SCOPE_TITLE: &str = "In Scope for DR";

const SUBTOTAL_LABEL: &str = "Subtotal";
const GRAND_TOTAL_LABEL: &str = "Grand Total";
const IN_SCOPE_LABEL: &str = "In Scope";
const NOT_IN_SCOPE_LABEL: &str = "Not In Scope";
const BLANK_LABEL: &str = "(blank)";

/// Next free 1-based row on the summary sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCursor {
    next: u32,
}

impl RowCursor {
    pub fn starting_at(row: u32) -> Self {
        Self { next: row }
    }

    /// Claims the current row and advances.
    pub fn take(&mut self) -> u32 {
        let row = self.next;
        self.next += 1;
        row
    }

    pub fn skip(&mut self, rows: u32) {
        self.next += rows;
    }
}

/// Lays out summary sections one after another, deriving every range from the
/// cursor position at the time a row is placed.
pub struct SummaryBuilder<'a> {
    table: &'a CanonicalInventoryTable,
    span: DataSpan,
    cursor: RowCursor,
    sections: Vec<Section>,
}

impl<'a> SummaryBuilder<'a> {
    /// Row 1 holds the header, so sections start on row 2.
    pub fn new(table: &'a CanonicalInventoryTable, inventory_sheet: &str) -> Self {
        Self {
            table,
            span: DataSpan::for_table(inventory_sheet, table),
            cursor: RowCursor::starting_at(2),
            sections: Vec::new(),
        }
    }

    /// One row per distinct value of `column`, then a subtotal over them.
    pub fn grouped_with_subtotal(&mut self, title: &str, column: InventoryColumn) -> &mut Self {
        let heading_row = self.cursor.take();
        let mut rows = self.group_rows(title, column);
        rows.push(self.subtotal_row(title, &rows));
        self.finish_section(title, heading_row, rows)
    }

    /// One row per distinct value of `column`, then a total over the whole
    /// inventory.
    pub fn grouped_with_grand_total(&mut self, title: &str, column: InventoryColumn) -> &mut Self {
        let heading_row = self.cursor.take();
        let mut rows = self.group_rows(title, column);
        let total = self.filtered_row(title, GRAND_TOTAL_LABEL, RowKind::GrandTotal, RowFilter::All);
        rows.push(total);
        self.finish_section(title, heading_row, rows)
    }

    /// In Scope / Not In Scope partition on a flag column, then a subtotal
    /// over the two.
    pub fn scope_partition(&mut self, title: &str, flag: InventoryColumn) -> &mut Self {
        let heading_row = self.cursor.take();
        let mut rows = vec![
            self.filtered_row(title, IN_SCOPE_LABEL, RowKind::Group, RowFilter::InScope(flag)),
            self.filtered_row(
                title,
                NOT_IN_SCOPE_LABEL,
                RowKind::Group,
                RowFilter::NotInScope(flag),
            ),
        ];
        rows.push(self.subtotal_row(title, &rows));
        self.finish_section(title, heading_row, rows)
    }

    pub fn build(self) -> SummaryReport {
        SummaryReport {
            units: self.table.units,
            sections: self.sections,
        }
    }

    fn group_rows(&mut self, title: &str, column: InventoryColumn) -> Vec<SummaryRow> {
        distinct_values(self.table, column)
            .into_iter()
            .map(|value| {
                let label = if value.is_empty() {
                    BLANK_LABEL.to_string()
                } else {
                    value.clone()
                };
                self.filtered_row(title, &label, RowKind::Group, RowFilter::Equals { column, value })
            })
            .collect()
    }

    fn filtered_row(
        &mut self,
        title: &str,
        label: &str,
        kind: RowKind,
        filter: RowFilter,
    ) -> SummaryRow {
        let cells = MEASURES.map(|measure| self.inventory_cell(measure, filter.clone()));
        SummaryRow {
            category: title.to_string(),
            sub_category: label.to_string(),
            kind,
            row: self.cursor.take(),
            cells,
        }
    }

    fn inventory_cell(&self, measure: Measure, filter: RowFilter) -> AggregateCell {
        // ROWS() over the placeholder span would count the blank row.
        let counts_whole_span = matches!(filter, RowFilter::All | RowFilter::NotInScope(_));
        if self.span.is_empty() && measure == Measure::Count && counts_whole_span {
            return AggregateCell::Literal(0.0);
        }
        AggregateCell::Formula(FormulaExpr::Inventory {
            measure,
            filter,
            span: self.span.clone(),
        })
    }

    fn subtotal_row(&mut self, title: &str, rows: &[SummaryRow]) -> SummaryRow {
        let bounds = rows.first().zip(rows.last());
        let cells: [AggregateCell; 5] = std::array::from_fn(|index| match bounds {
            Some((first, last)) => AggregateCell::Formula(FormulaExpr::RangeSum {
                column: FIRST_MEASURE_COLUMN + index as u16,
                first_row: first.row,
                last_row: last.row,
            }),
            None => AggregateCell::Literal(0.0),
        });
        SummaryRow {
            category: title.to_string(),
            sub_category: SUBTOTAL_LABEL.to_string(),
            kind: RowKind::Subtotal,
            row: self.cursor.take(),
            cells,
        }
    }

    fn finish_section(&mut self, title: &str, heading_row: u32, rows: Vec<SummaryRow>) -> &mut Self {
        debug!(
            section = title,
            heading_row,
            row_count = rows.len(),
            "laid out summary section"
        );
        self.sections.push(Section {
            title: title.to_string(),
            heading_row,
            rows,
        });
        self.cursor.skip(1);
        self
    }
}

/// Builds the four standard sections: power state, operating system, prod
/// scope and DR scope.
pub fn build_summary(table: &CanonicalInventoryTable, inventory_sheet: &str) -> SummaryReport {
    let mut builder = SummaryBuilder::new(table, inventory_sheet);
    builder
        .grouped_with_subtotal(POWER_STATE_TITLE, InventoryColumn::PowerState)
        .grouped_with_grand_total(OPERATING_SYSTEM_TITLE, InventoryColumn::GuestOs)
        .scope_partition(PROD_SCOPE_TITLE, InventoryColumn::InScopeProd)
        .scope_partition(DR_SCOPE_TITLE, InventoryColumn::InScopeDr);
    builder.build()
}

/// Distinct values in first-seen order. Values differing only in case share a
/// group, labelled with the first spelling seen.
fn distinct_values(table: &CanonicalInventoryTable, column: InventoryColumn) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .rows
        .iter()
        .filter_map(|row| row.text(column))
        .filter(|value| seen.insert(fold_case(value)))
        .map(str::to_string)
        .collect()
}
