//! Formula text for summary cells.
//!
//! Inventory references are absolute (`$C$2:$C$41`) so the summary sheet can
//! be re-sorted without breaking them; subtotal references point at the
//! summary sheet itself and stay relative.

use crate::tools::model::InventoryColumn;
use crate::tools::summary::{
    DataSpan, FormulaExpr, Measure, RowFilter, SCOPE_TRUTHY_VALUES,
};

/// Renders an expression as worksheet formula text, including the leading `=`.
pub fn render(expr: &FormulaExpr) -> String {
    format!("={}", body(expr))
}

fn body(expr: &FormulaExpr) -> String {
    match expr {
        FormulaExpr::Inventory {
            measure,
            filter,
            span,
        } => inventory_body(*measure, filter, span),
        FormulaExpr::RangeSum {
            column,
            first_row,
            last_row,
        } => {
            let letter = column_letter(*column);
            format!("SUM({letter}{first_row}:{letter}{last_row})")
        }
    }
}

fn inventory_body(measure: Measure, filter: &RowFilter, span: &DataSpan) -> String {
    match filter {
        RowFilter::All => whole_table(measure, span),
        RowFilter::Equals { column, value } => {
            let criteria_range = column_range(span, *column);
            let criteria = criteria_literal(value);
            match measure {
                Measure::Count => format!("COUNTIFS({criteria_range},{criteria})"),
                Measure::Sum(sum_column) => format!(
                    "SUMIFS({},{criteria_range},{criteria})",
                    column_range(span, sum_column)
                ),
            }
        }
        RowFilter::InScope(flag) => in_scope(measure, *flag, span),
        RowFilter::NotInScope(flag) => {
            format!("{}-{}", whole_table(measure, span), in_scope(measure, *flag, span))
        }
    }
}

fn whole_table(measure: Measure, span: &DataSpan) -> String {
    match measure {
        Measure::Count => format!("ROWS({})", column_range(span, InventoryColumn::VmName)),
        Measure::Sum(column) => format!("SUM({})", column_range(span, column)),
    }
}

fn in_scope(measure: Measure, flag: InventoryColumn, span: &DataSpan) -> String {
    let flags = column_range(span, flag);
    let truthy = truthy_array();
    match measure {
        Measure::Count => format!("SUM(COUNTIFS({flags},{truthy}))"),
        Measure::Sum(column) => format!(
            "SUM(SUMIFS({},{flags},{truthy}))",
            column_range(span, column)
        ),
    }
}

fn truthy_array() -> String {
    let items: Vec<String> = SCOPE_TRUTHY_VALUES
        .iter()
        .map(|value| format!("\"{value}\""))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Absolute reference to one inventory column across the data rows.
pub fn column_range(span: &DataSpan, column: InventoryColumn) -> String {
    let letter = column.letter();
    format!(
        "{}!${letter}${}:${letter}${}",
        quote_sheet_name(&span.sheet),
        span.first_row,
        span.last_row
    )
}

/// Criteria string matching `value` literally: explicit `=` operator,
/// wildcards escaped with `~`, quotes doubled for the formula literal.
pub fn criteria_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 3);
    escaped.push_str("\"=");
    for ch in value.chars() {
        match ch {
            '~' | '*' | '?' => {
                escaped.push('~');
                escaped.push(ch);
            }
            '"' => escaped.push_str("\"\""),
            other => escaped.push(other),
        }
    }
    escaped.push('"');
    escaped
}

/// Sheet names other than plain identifiers need single quotes in references.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !reads_as_reference(name);
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Names Excel would parse as a cell (`A1`, `XFD2`, `R1C1`) or a boolean.
fn reads_as_reference(name: &str) -> bool {
    if name.eq_ignore_ascii_case("true") || name.eq_ignore_ascii_case("false") {
        return true;
    }
    let upper = name.to_ascii_uppercase();
    let letters = upper.bytes().take_while(u8::is_ascii_alphabetic).count();
    let a1 = (1..=3).contains(&letters)
        && upper.len() > letters
        && upper.bytes().skip(letters).all(|byte| byte.is_ascii_digit());
    a1 || reads_as_r1c1(&upper)
}

fn reads_as_r1c1(upper: &str) -> bool {
    let digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    match upper.strip_prefix('R') {
        Some(rest) => match rest.split_once('C') {
            Some((row, col)) => digits(row) && digits(col),
            None => digits(rest),
        },
        None => upper.strip_prefix('C').is_some_and(digits),
    }
}

/// Summary-sheet column letter for a zero-based index.
pub fn column_letter(column: u16) -> char {
    (b'A' + column as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> DataSpan {
        DataSpan {
            sheet: "ServerList".into(),
            first_row: 2,
            last_row: 5,
            row_count: 4,
        }
    }

    #[test]
    fn equality_criteria_are_literal() {
        assert_eq!(criteria_literal("poweredOn"), "\"=poweredOn\"");
        assert_eq!(criteria_literal("Win*"), "\"=Win~*\"");
        assert_eq!(criteria_literal("say \"hi\"?"), "\"=say \"\"hi\"\"~?\"");
        assert_eq!(criteria_literal(""), "\"=\"");
    }

    #[test]
    fn sheet_names_are_quoted_when_needed() {
        assert_eq!(quote_sheet_name("ServerList"), "ServerList");
        assert_eq!(quote_sheet_name("Server List"), "'Server List'");
        assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn cell_like_sheet_names_are_quoted() {
        for name in ["A1", "XFD2", "ab12", "R1C1", "R", "C3", "rc", "TRUE", "false"] {
            assert_eq!(quote_sheet_name(name), format!("'{name}'"), "{name}");
        }
        for name in ["Inventory2024", "ABCD1", "Cluster", "Servers"] {
            assert_eq!(quote_sheet_name(name), name, "{name}");
        }
        let span = DataSpan {
            sheet: "A1".into(),
            ..span()
        };
        assert_eq!(column_range(&span, InventoryColumn::PowerState), "'A1'!$B$2:$B$5");
    }

    #[test]
    fn in_scope_cells_sum_over_every_truthy_flag() {
        let count = FormulaExpr::Inventory {
            measure: Measure::Count,
            filter: RowFilter::InScope(InventoryColumn::InScopeProd),
            span: span(),
        };
        let dr_cpus = FormulaExpr::Inventory {
            measure: Measure::Sum(InventoryColumn::Cpus),
            filter: RowFilter::InScope(InventoryColumn::InScopeDr),
            span: span(),
        };
        assert_eq!(
            render(&count),
            "=SUM(COUNTIFS(ServerList!$I$2:$I$5,{\"yes\",\"true\",\"1\",\"x\",\"y\"}))"
        );
        assert_eq!(
            render(&dr_cpus),
            "=SUM(SUMIFS(ServerList!$C$2:$C$5,ServerList!$J$2:$J$5,{\"yes\",\"true\",\"1\",\"x\",\"y\"}))"
        );
    }

    #[test]
    fn out_of_scope_sum_subtracts_in_scope_sum() {
        let expr = FormulaExpr::Inventory {
            measure: Measure::Sum(InventoryColumn::Memory),
            filter: RowFilter::NotInScope(InventoryColumn::InScopeProd),
            span: span(),
        };
        assert_eq!(
            render(&expr),
            "=SUM(ServerList!$D$2:$D$5)-SUM(SUMIFS(ServerList!$D$2:$D$5,ServerList!$I$2:$I$5,{\"yes\",\"true\",\"1\",\"x\",\"y\"}))"
        );
    }

    #[test]
    fn group_formulas_filter_on_the_grouping_column() {
        let filter = RowFilter::Equals {
            column: InventoryColumn::PowerState,
            value: "poweredOn".into(),
        };
        let count = FormulaExpr::Inventory {
            measure: Measure::Count,
            filter: filter.clone(),
            span: span(),
        };
        let cpus = FormulaExpr::Inventory {
            measure: Measure::Sum(InventoryColumn::Cpus),
            filter,
            span: span(),
        };
        assert_eq!(render(&count), "=COUNTIFS(ServerList!$B$2:$B$5,\"=poweredOn\")");
        assert_eq!(
            render(&cpus),
            "=SUMIFS(ServerList!$C$2:$C$5,ServerList!$B$2:$B$5,\"=poweredOn\")"
        );
    }

    #[test]
    fn scope_complement_subtracts_from_whole_table() {
        let expr = FormulaExpr::Inventory {
            measure: Measure::Count,
            filter: RowFilter::NotInScope(InventoryColumn::InScopeProd),
            span: span(),
        };
        assert_eq!(
            render(&expr),
            "=ROWS(ServerList!$A$2:$A$5)-SUM(COUNTIFS(ServerList!$I$2:$I$5,{\"yes\",\"true\",\"1\",\"x\",\"y\"}))"
        );
    }

    #[test]
    fn subtotals_sum_summary_rows() {
        let expr = FormulaExpr::RangeSum {
            column: 3,
            first_row: 3,
            last_row: 4,
        };
        assert_eq!(render(&expr), "=SUM(D3:D4)");
    }
}
