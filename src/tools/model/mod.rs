use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell as loaded from the source spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    /// Blank cell, or a position past the end of a short row.
    Empty,
    /// Text literal.
    Text(String),
    /// Numeric literal. Integers are widened to `f64`.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
}

impl Cell {
    /// Parses the cell as a finite number. Text is trimmed before parsing.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(value) => *value,
            Cell::Text(text) => text.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Renders the cell the way it should appear in a text column.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Cell::Number(value) => value.to_string(),
            Cell::Bool(value) => value.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

/// Unnormalized sheet contents: exporter-specific column names plus row-major
/// cells. Rows may be shorter than the header; missing cells read as
/// [`Cell::Empty`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Shared blank returned for cells outside a row or column.
pub static EMPTY_CELL: Cell = Cell::Empty;

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Column names in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first column carrying exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Divisor convention applied to disk figures exported in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitConvention {
    /// Binary gibibytes, MiB / 1024.
    #[default]
    BinaryGib,
    /// Decimal gigabytes, MiB / 953.7.
    DecimalGb,
}

impl UnitConvention {
    /// Unit label used in column headers.
    pub fn label(self) -> &'static str {
        match self {
            UnitConvention::BinaryGib => "GiB",
            UnitConvention::DecimalGb => "GB",
        }
    }
}

impl fmt::Display for UnitConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitConvention::BinaryGib => write!(f, "binary-gib"),
            UnitConvention::DecimalGb => write!(f, "decimal-gb"),
        }
    }
}

/// One cleaned VM record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub vm_name: String,
    pub power_state: String,
    pub cpus: u32,
    pub memory_gb: f64,
    pub provisioned_disk_gb: f64,
    pub in_use_disk_gb: f64,
    pub cluster: String,
    pub guest_os: String,
    /// Human-edited after export; always blank when produced.
    pub in_scope_prod: String,
    /// Human-edited after export; always blank when produced.
    pub in_scope_dr: String,
    /// Human-edited after export; always blank when produced.
    pub notes: String,
}

/// Columns of the canonical inventory sheet, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryColumn {
    VmName,
    PowerState,
    Cpus,
    Memory,
    ProvisionedDisk,
    InUseDisk,
    Cluster,
    GuestOs,
    InScopeProd,
    InScopeDr,
    Notes,
}

impl InventoryColumn {
    pub const ALL: [InventoryColumn; 11] = [
        InventoryColumn::VmName,
        InventoryColumn::PowerState,
        InventoryColumn::Cpus,
        InventoryColumn::Memory,
        InventoryColumn::ProvisionedDisk,
        InventoryColumn::InUseDisk,
        InventoryColumn::Cluster,
        InventoryColumn::GuestOs,
        InventoryColumn::InScopeProd,
        InventoryColumn::InScopeDr,
        InventoryColumn::Notes,
    ];

    /// Zero-based column position in the inventory sheet.
    pub fn index(self) -> u16 {
        self as u16
    }

    /// Spreadsheet column letter (`A` for the first column).
    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    pub fn header(self, units: UnitConvention) -> String {
        let unit = units.label();
        match self {
            InventoryColumn::VmName => "VM Name".to_string(),
            InventoryColumn::PowerState => "Powerstate".to_string(),
            InventoryColumn::Cpus => "CPUs".to_string(),
            InventoryColumn::Memory => format!("Memory ({unit})"),
            InventoryColumn::ProvisionedDisk => format!("Provisioned Disk ({unit})"),
            InventoryColumn::InUseDisk => format!("In Use Disk ({unit})"),
            InventoryColumn::Cluster => "Cluster".to_string(),
            InventoryColumn::GuestOs => "OS according to the configuration file".to_string(),
            InventoryColumn::InScopeProd => "In Scope for Prod?".to_string(),
            InventoryColumn::InScopeDr => "In Scope for DR?".to_string(),
            InventoryColumn::Notes => "Notes".to_string(),
        }
    }
}

impl InventoryRow {
    /// Text value of a label column; numeric columns return `None`.
    pub fn text(&self, column: InventoryColumn) -> Option<&str> {
        match column {
            InventoryColumn::VmName => Some(&self.vm_name),
            InventoryColumn::PowerState => Some(&self.power_state),
            InventoryColumn::Cluster => Some(&self.cluster),
            InventoryColumn::GuestOs => Some(&self.guest_os),
            InventoryColumn::InScopeProd => Some(&self.in_scope_prod),
            InventoryColumn::InScopeDr => Some(&self.in_scope_dr),
            InventoryColumn::Notes => Some(&self.notes),
            InventoryColumn::Cpus
            | InventoryColumn::Memory
            | InventoryColumn::ProvisionedDisk
            | InventoryColumn::InUseDisk => None,
        }
    }

    /// Numeric value of a measure column; label columns return `None`.
    pub fn number(&self, column: InventoryColumn) -> Option<f64> {
        match column {
            InventoryColumn::Cpus => Some(f64::from(self.cpus)),
            InventoryColumn::Memory => Some(self.memory_gb),
            InventoryColumn::ProvisionedDisk => Some(self.provisioned_disk_gb),
            InventoryColumn::InUseDisk => Some(self.in_use_disk_gb),
            _ => None,
        }
    }
}

/// The cleaned inventory, in source row order.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalInventoryTable {
    pub units: UnitConvention,
    pub rows: Vec<InventoryRow>,
}

impl CanonicalInventoryTable {
    /// Header row of the inventory sheet.
    pub fn headers(&self) -> Vec<String> {
        InventoryColumn::ALL
            .iter()
            .map(|column| column.header(self.units))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_parse_from_text_and_reject_junk() {
        assert_eq!(Cell::from(" 2048 ").as_number(), Some(2048.0));
        assert_eq!(Cell::from("n/a").as_number(), None);
        assert_eq!(Cell::Text("NaN".into()).as_number(), None);
        assert_eq!(Cell::Bool(true).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(7.0).to_text(), "7");
        assert_eq!(Cell::Number(7.5).to_text(), "7.5");
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = RawTable::new(vec!["a".into(), "b".into()], vec![vec![Cell::from("x")]]);
        assert_eq!(table.cell(0, 1), &Cell::Empty);
        assert_eq!(table.cell(5, 0), &Cell::Empty);
    }

    #[test]
    fn inventory_headers_follow_unit_convention() {
        let table = CanonicalInventoryTable {
            units: UnitConvention::DecimalGb,
            rows: Vec::new(),
        };
        let headers = table.headers();
        assert_eq!(headers.len(), 11);
        assert_eq!(headers[3], "Memory (GB)");
        assert_eq!(headers[10], "Notes");
        assert_eq!(InventoryColumn::Notes.letter(), 'K');
    }
}
