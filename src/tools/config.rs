use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::tools::error::Result;
use crate::tools::model::UnitConvention;
use crate::tools::resolve::{CanonicalField, SynonymMap};

/// Sheet RVTools writes the VM inventory to.
pub const DEFAULT_SOURCE_SHEET: &str = "vInfo";
/// Sheet receiving the cleaned inventory.
pub const DEFAULT_INVENTORY_SHEET: &str = "ServerList";
/// Sheet receiving the summary report.
pub const DEFAULT_SUMMARY_SHEET: &str = "Summary";

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub source_sheet: String,
    pub inventory_sheet: String,
    pub summary_sheet: String,
    pub units: UnitConvention,
    pub synonyms: SynonymMap,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_sheet: DEFAULT_SOURCE_SHEET.to_string(),
            inventory_sheet: DEFAULT_INVENTORY_SHEET.to_string(),
            summary_sheet: DEFAULT_SUMMARY_SHEET.to_string(),
            units: UnitConvention::default(),
            synonyms: SynonymMap::default(),
        }
    }
}

/// On-disk JSON configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub source_sheet: Option<String>,
    pub inventory_sheet: Option<String>,
    pub summary_sheet: Option<String>,
    pub units: Option<UnitConvention>,
    /// Extra synonyms, tried after the built-in ones.
    pub synonyms: BTreeMap<CanonicalField, Vec<String>>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let config: ConfigFile = serde_json::from_str(&source)?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Layers the file over `options`.
    pub fn apply(self, options: &mut PipelineOptions) {
        if let Some(sheet) = self.source_sheet {
            options.source_sheet = sheet;
        }
        if let Some(sheet) = self.inventory_sheet {
            options.inventory_sheet = sheet;
        }
        if let Some(sheet) = self.summary_sheet {
            options.summary_sheet = sheet;
        }
        if let Some(units) = self.units {
            options.units = units;
        }
        for (field, names) in self.synonyms {
            options.synonyms.extend(field, names);
        }
    }
}
