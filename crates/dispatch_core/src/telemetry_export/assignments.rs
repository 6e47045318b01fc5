use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::telemetry::DispatchTelemetry;

use super::utils::{f64_field, u64_field, write_record_batch};

/// Export one row per applied assignment across all recorded runs.
pub fn write_assignments_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &DispatchTelemetry,
) -> Result<(), Box<dyn Error>> {
    let mut order = Vec::new();
    let mut rider = Vec::new();
    let mut cost_km = Vec::new();
    let mut assigned_at = Vec::new();

    for assignment in telemetry.assignments() {
        order.push(assignment.order.to_bits());
        rider.push(assignment.rider.to_bits());
        cost_km.push(assignment.cost_km);
        assigned_at.push(assignment.assigned_at);
    }

    let schema = Schema::new(vec![
        u64_field("order"),
        u64_field("rider"),
        f64_field("cost_km"),
        u64_field("assigned_at"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(order)),
        Arc::new(UInt64Array::from(rider)),
        Arc::new(Float64Array::from(cost_km)),
        Arc::new(UInt64Array::from(assigned_at)),
    ];

    write_record_batch(path, schema, arrays)
}
