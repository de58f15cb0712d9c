use std::path::Path;

use tracing::{debug, info, instrument};

use crate::tools::config::PipelineOptions;
use crate::tools::error::Result;
use crate::tools::io::excel_read::ExcelTableSource;
use crate::tools::io::excel_write::ExcelReportSink;
use crate::tools::io::{ReportSink, TableSource};
use crate::tools::model::{CanonicalInventoryTable, RawTable};
use crate::tools::resolve::{ColumnResolution, resolve};
use crate::tools::summary::{SummaryReport, build_summary};
use crate::tools::transform::transform;

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub resolution: ColumnResolution,
    pub inventory: CanonicalInventoryTable,
    pub report: SummaryReport,
}

/// Resolve → transform → summarize, configured once at construction.
#[derive(Debug, Clone, Default)]
pub struct InventoryPipeline {
    options: PipelineOptions,
}

impl InventoryPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Runs the in-memory stages. Fails before any row is transformed when a
    /// column cannot be resolved.
    pub fn run(&self, table: &RawTable) -> Result<PipelineOutput> {
        let resolution = resolve(table, &self.options.synonyms)?;
        debug!(?resolution, "columns resolved");
        let inventory = transform(table, &resolution, self.options.units);
        let report = build_summary(&inventory, &self.options.inventory_sheet);
        debug!(section_count = report.sections.len(), "summary built");
        Ok(PipelineOutput {
            resolution,
            inventory,
            report,
        })
    }

    /// Loads from `source`, runs, and hands both artifacts to `sink`.
    pub fn execute<S, K>(&self, source: &mut S, sink: &mut K) -> Result<PipelineOutput>
    where
        S: TableSource + ?Sized,
        K: ReportSink + ?Sized,
    {
        let table = source.load_table()?;
        info!(
            column_count = table.columns().len(),
            row_count = table.row_count(),
            "loaded source table"
        );
        let output = self.run(&table)?;
        sink.write_report(&output.inventory, &output.report)?;
        Ok(output)
    }
}

/// Reads the source sheet of `input` and writes the inventory and summary
/// workbook to `output`.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display(), units = %options.units)
)]
pub fn process_workbook(
    input: &Path,
    output: &Path,
    options: PipelineOptions,
) -> Result<PipelineOutput> {
    let mut source = ExcelTableSource::new(input, options.source_sheet.clone());
    let mut sink = ExcelReportSink::new(output)
        .with_sheet_names(options.inventory_sheet.clone(), options.summary_sheet.clone());
    let pipeline = InventoryPipeline::new(options);
    let result = pipeline.execute(&mut source, &mut sink)?;
    info!(row_count = result.inventory.len(), "wrote inventory workbook");
    Ok(result)
}

/// Resolves the source sheet's columns without transforming anything.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn inspect_columns(input: &Path, options: &PipelineOptions) -> Result<ColumnResolution> {
    let table = ExcelTableSource::new(input, options.source_sheet.clone()).load_table()?;
    resolve(&table, &options.synonyms)
}
