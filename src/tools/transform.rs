use tracing::{info, warn};

use crate::tools::model::{
    CanonicalInventoryTable, Cell, EMPTY_CELL, InventoryRow, RawTable, UnitConvention,
};
use crate::tools::resolve::{CanonicalField, ColumnResolution};
use crate::tools::units::{disk_to_gb, mb_to_gb};

/// Projects the resolved source columns into the canonical inventory shape.
///
/// Row order and row count follow the source table. Memory always uses the
/// binary MB → GB divisor; disk figures follow `units`. The scope flags and
/// notes are emitted blank for people to fill in after export.
pub fn transform(
    table: &RawTable,
    resolution: &ColumnResolution,
    units: UnitConvention,
) -> CanonicalInventoryTable {
    let index = |field: CanonicalField| table.column_index(resolution.column(field));
    let vm_name = index(CanonicalField::VmName);
    let power_state = index(CanonicalField::PowerState);
    let cpus = index(CanonicalField::Cpus);
    let memory = index(CanonicalField::MemoryMb);
    let provisioned = index(CanonicalField::ProvisionedMb);
    let in_use = index(CanonicalField::InUseMb);
    let cluster = index(CanonicalField::Cluster);
    let guest_os = index(CanonicalField::GuestOs);

    let mut normalized_cells = 0usize;
    let mut rows = Vec::with_capacity(table.row_count());

    for row in 0..table.row_count() {
        let cell = |column: Option<usize>| {
            column.map_or(&EMPTY_CELL, |column| table.cell(row, column))
        };

        for column in [cpus, memory, provisioned, in_use] {
            let source = cell(column);
            if !source.is_empty() && source.as_number().is_none() {
                normalized_cells += 1;
            }
        }

        rows.push(InventoryRow {
            vm_name: cell(vm_name).to_text(),
            power_state: cell(power_state).to_text(),
            cpus: cpu_count(cell(cpus)),
            memory_gb: mb_to_gb(cell(memory)),
            provisioned_disk_gb: disk_to_gb(cell(provisioned), units),
            in_use_disk_gb: disk_to_gb(cell(in_use), units),
            cluster: cell(cluster).to_text(),
            guest_os: cell(guest_os).to_text(),
            in_scope_prod: String::new(),
            in_scope_dr: String::new(),
            notes: String::new(),
        });
    }

    if normalized_cells > 0 {
        warn!(
            cell_count = normalized_cells,
            "non-numeric values in numeric columns were treated as 0"
        );
    }
    info!(row_count = rows.len(), %units, "built canonical inventory");

    CanonicalInventoryTable { units, rows }
}

fn cpu_count(cell: &Cell) -> u32 {
    match cell.as_number() {
        Some(value) if value > 0.0 => value.round().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::resolve::{SynonymMap, resolve};

    fn alternate_export(rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable::new(
            [
                "Virtual Machine Name",
                "Power State",
                "vCPUs",
                "RAM",
                "Provisioned Space",
                "Used Storage",
                "vSphere Cluster",
                "Guest OS",
            ]
            .map(String::from)
            .to_vec(),
            rows,
        )
    }

    fn vm1() -> Vec<Cell> {
        vec![
            Cell::from("vm1"),
            Cell::from("poweredOn"),
            Cell::from(2_i64),
            Cell::from(4096_i64),
            Cell::from(102400_i64),
            Cell::from(51200_i64),
            Cell::from("clusterA"),
            Cell::from("Linux"),
        ]
    }

    #[test]
    fn single_row_converts_with_binary_units() {
        let table = alternate_export(vec![vm1()]);
        let resolution = resolve(&table, &SynonymMap::default()).expect("resolved");
        let inventory = transform(&table, &resolution, UnitConvention::BinaryGib);

        assert_eq!(inventory.len(), 1);
        let row = &inventory.rows[0];
        assert_eq!(row.vm_name, "vm1");
        assert_eq!(row.power_state, "poweredOn");
        assert_eq!(row.cpus, 2);
        assert_eq!(row.memory_gb, 4.0);
        assert_eq!(row.provisioned_disk_gb, 100.0);
        assert_eq!(row.in_use_disk_gb, 50.0);
        assert_eq!(row.cluster, "clusterA");
        assert_eq!(row.guest_os, "Linux");
        assert!(row.in_scope_prod.is_empty());
        assert!(row.in_scope_dr.is_empty());
        assert!(row.notes.is_empty());
    }

    #[test]
    fn decimal_units_change_disk_but_not_memory() {
        let table = alternate_export(vec![vm1()]);
        let resolution = resolve(&table, &SynonymMap::default()).expect("resolved");
        let inventory = transform(&table, &resolution, UnitConvention::DecimalGb);

        let row = &inventory.rows[0];
        assert_eq!(row.memory_gb, 4.0);
        assert_eq!(row.provisioned_disk_gb, 107.37);
        assert_eq!(row.in_use_disk_gb, 53.69);
    }

    #[test]
    fn junk_values_become_zero_and_row_count_is_kept() {
        let table = alternate_export(vec![
            vm1(),
            vec![Cell::from("vm2"), Cell::Empty, Cell::from("many"), Cell::from("?")],
            Vec::new(),
        ]);
        let resolution = resolve(&table, &SynonymMap::default()).expect("resolved");
        let inventory = transform(&table, &resolution, UnitConvention::BinaryGib);

        assert_eq!(inventory.len(), table.row_count());
        let junk = &inventory.rows[1];
        assert_eq!(junk.cpus, 0);
        assert_eq!(junk.memory_gb, 0.0);
        assert_eq!(junk.provisioned_disk_gb, 0.0);
        assert_eq!(junk.cluster, "");
        assert_eq!(inventory.rows[2].vm_name, "");
    }
}
