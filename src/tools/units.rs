use crate::tools::model::{Cell, UnitConvention};

const BINARY_DIVISOR: f64 = 1024.0;
const DECIMAL_DIVISOR: f64 = 953.7;

/// MiB to GiB, rounded to two decimals.
pub fn mib_to_gib(cell: &Cell) -> f64 {
    convert(cell, BINARY_DIVISOR)
}

/// MiB to decimal GB, rounded to two decimals.
pub fn mib_to_gb(cell: &Cell) -> f64 {
    convert(cell, DECIMAL_DIVISOR)
}

/// Memory MB to GB, rounded to two decimals.
pub fn mb_to_gb(cell: &Cell) -> f64 {
    convert(cell, BINARY_DIVISOR)
}

/// Disk conversion selected by the active convention.
pub fn disk_to_gb(cell: &Cell, units: UnitConvention) -> f64 {
    match units {
        UnitConvention::BinaryGib => mib_to_gib(cell),
        UnitConvention::DecimalGb => mib_to_gb(cell),
    }
}

/// Rounds half away from zero at two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Junk, non-finite and negative sources all collapse to zero.
fn convert(cell: &Cell, divisor: f64) -> f64 {
    match cell.as_number() {
        Some(value) if value > 0.0 => round2(value / divisor),
        _ => 0.0,
    }
}
