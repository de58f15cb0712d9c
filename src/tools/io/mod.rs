//! Adapters between the inventory pipeline and spreadsheet files.

pub mod excel_read;
pub mod excel_write;
pub mod json;

use crate::tools::error::Result;
use crate::tools::model::{CanonicalInventoryTable, RawTable};
use crate::tools::summary::SummaryReport;

/// Supplies the raw inventory table.
pub trait TableSource {
    fn load_table(&mut self) -> Result<RawTable>;
}

/// Receives the canonical inventory and its summary report.
pub trait ReportSink {
    fn write_report(
        &mut self,
        inventory: &CanonicalInventoryTable,
        report: &SummaryReport,
    ) -> Result<()>;
}

impl TableSource for RawTable {
    fn load_table(&mut self) -> Result<RawTable> {
        Ok(self.clone())
    }
}
