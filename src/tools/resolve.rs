use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tools::error::{Result, ToolError};
use crate::tools::model::RawTable;

/// Logical attributes every inventory row must have, independent of how the
/// exporter named them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    VmName,
    PowerState,
    Cpus,
    MemoryMb,
    ProvisionedMb,
    InUseMb,
    Cluster,
    GuestOs,
}

impl CanonicalField {
    /// Resolution order. The first unresolved field in this order is the one
    /// reported.
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::VmName,
        CanonicalField::PowerState,
        CanonicalField::Cpus,
        CanonicalField::MemoryMb,
        CanonicalField::ProvisionedMb,
        CanonicalField::InUseMb,
        CanonicalField::Cluster,
        CanonicalField::GuestOs,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            CanonicalField::VmName => "VM Name",
            CanonicalField::PowerState => "Powerstate",
            CanonicalField::Cpus => "CPUs",
            CanonicalField::MemoryMb => "Memory",
            CanonicalField::ProvisionedMb => "Provisioned MB",
            CanonicalField::InUseMb => "In Use MB",
            CanonicalField::Cluster => "Cluster",
            CanonicalField::GuestOs => "OS according to the configuration file",
        }
    }

    fn default_synonyms(self) -> &'static [&'static str] {
        match self {
            CanonicalField::VmName => &["VM Name", "Name", "Virtual Machine Name", "VMName", "VM"],
            CanonicalField::PowerState => &["Powerstate", "Power State", "Power", "State"],
            CanonicalField::Cpus => &["CPUs", "CPU", "Num CPU", "vCPUs"],
            CanonicalField::MemoryMb => &["Memory", "Memory MB", "Memory (MB)", "RAM"],
            CanonicalField::ProvisionedMb => &[
                "Provisioned MB",
                "Provisioned MiB",
                "Provisioned",
                "Provisioned Storage",
                "Provisioned Space",
            ],
            CanonicalField::InUseMb => &[
                "In Use MB",
                "In Use MiB",
                "Used Space",
                "Used Storage",
                "In Use Space",
            ],
            CanonicalField::Cluster => &["Cluster", "vSphere Cluster", "ESX Cluster"],
            CanonicalField::GuestOs => &[
                "OS according to the configuration file",
                "OS According to the configuration file",
                "Guest OS",
                "Operating System",
                "OS",
            ],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Ordered synonym lists per canonical field. Order within a list is the
/// match priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymMap {
    entries: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for SynonymMap {
    fn default() -> Self {
        let entries = CanonicalField::ALL
            .iter()
            .map(|field| {
                let names = field
                    .default_synonyms()
                    .iter()
                    .map(|name| name.to_string())
                    .collect();
                (*field, names)
            })
            .collect();
        Self { entries }
    }
}

impl SynonymMap {
    pub fn synonyms(&self, field: CanonicalField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends names after the existing synonyms, skipping duplicates.
    pub fn extend<I, S>(&mut self, field: CanonicalField, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.entries.entry(field).or_default();
        for name in names {
            let name = name.into();
            if !list.contains(&name) {
                list.push(name);
            }
        }
    }
}

/// Actual source column found for every canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnResolution {
    columns: BTreeMap<CanonicalField, String>,
}

impl ColumnResolution {
    pub fn column(&self, field: CanonicalField) -> &str {
        // Construction guarantees every field is present.
        self.columns.get(&field).map(String::as_str).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.columns
            .iter()
            .map(|(field, column)| (*field, column.as_str()))
    }
}

/// Finds the source column for each canonical field, stopping at the first
/// field none of whose synonyms is present.
pub fn resolve(table: &RawTable, synonyms: &SynonymMap) -> Result<ColumnResolution> {
    let mut columns = BTreeMap::new();

    for field in CanonicalField::ALL {
        let found = synonyms
            .synonyms(field)
            .iter()
            .find(|name| table.has_column(name));

        match found {
            Some(name) => {
                debug!(field = %field, column = %name, "resolved column");
                columns.insert(field, name.clone());
            }
            None => {
                return Err(ToolError::UnresolvableColumn {
                    field,
                    available: table.columns().to_vec(),
                });
            }
        }
    }

    Ok(ColumnResolution { columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(columns: &[&str]) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), Vec::new())
    }

    #[test]
    fn first_synonym_in_list_wins_over_later_ones() {
        let table = table_with(&[
            "Name", "VM", "State", "Powerstate", "CPUs", "RAM", "Memory", "Provisioned MB",
            "In Use MB", "Cluster", "OS",
        ]);
        let resolution = resolve(&table, &SynonymMap::default()).expect("resolved");
        assert_eq!(resolution.column(CanonicalField::VmName), "Name");
        assert_eq!(resolution.column(CanonicalField::PowerState), "Powerstate");
        assert_eq!(resolution.column(CanonicalField::MemoryMb), "Memory");
        assert_eq!(resolution.column(CanonicalField::GuestOs), "OS");
    }

    #[test]
    fn later_synonyms_resolve_alternate_exports() {
        let table = table_with(&[
            "Virtual Machine Name",
            "Power State",
            "vCPUs",
            "RAM",
            "Provisioned Space",
            "Used Storage",
            "vSphere Cluster",
            "Guest OS",
        ]);
        let resolution = resolve(&table, &SynonymMap::default()).expect("resolved");
        assert_eq!(resolution.column(CanonicalField::Cpus), "vCPUs");
        assert_eq!(resolution.column(CanonicalField::InUseMb), "Used Storage");
        assert_eq!(resolution.column(CanonicalField::Cluster), "vSphere Cluster");
        assert_eq!(resolution.iter().count(), 8);
    }

    #[test]
    fn missing_field_reports_name_and_available_columns() {
        let columns = [
            "VM", "Power", "CPU", "RAM", "Provisioned", "Used Space", "Guest OS",
        ];
        let table = table_with(&columns);
        let error = resolve(&table, &SynonymMap::default()).expect_err("cluster missing");
        match error {
            ToolError::UnresolvableColumn { field, available } => {
                assert_eq!(field, CanonicalField::Cluster);
                assert_eq!(available, columns.map(String::from).to_vec());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn resolution_stops_at_first_missing_field() {
        let table = table_with(&["Cluster"]);
        let error = resolve(&table, &SynonymMap::default()).expect_err("nothing resolves");
        assert!(matches!(
            error,
            ToolError::UnresolvableColumn {
                field: CanonicalField::VmName,
                ..
            }
        ));
    }

    #[test]
    fn extended_synonyms_are_tried_after_defaults() {
        let mut synonyms = SynonymMap::default();
        synonyms.extend(CanonicalField::Cluster, ["Host Cluster", "Cluster"]);
        let list = synonyms.synonyms(CanonicalField::Cluster);
        assert_eq!(list.first().map(String::as_str), Some("Cluster"));
        assert_eq!(list.last().map(String::as_str), Some("Host Cluster"));
        assert_eq!(list.len(), 4);
    }
}
