use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::DispatchTelemetry;

use super::utils::{f64_field, outcome_code, trigger_code, u64_field, u8_field, write_record_batch};

/// Export one row per dispatch run: trigger, pool sizes, results, outcome.
pub fn write_runs_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &DispatchTelemetry,
) -> Result<(), Box<dyn Error>> {
    let n = telemetry.runs.len();
    let mut trigger = Vec::with_capacity(n);
    let mut started_at = Vec::with_capacity(n);
    let mut riders_considered = Vec::with_capacity(n);
    let mut orders_considered = Vec::with_capacity(n);
    let mut assigned = Vec::with_capacity(n);
    let mut skipped = Vec::with_capacity(n);
    let mut total_cost_km = Vec::with_capacity(n);
    let mut average_cost_km = Vec::with_capacity(n);
    let mut outcome = Vec::with_capacity(n);

    for run in &telemetry.runs {
        trigger.push(trigger_code(run.trigger));
        started_at.push(run.started_at);
        riders_considered.push(run.riders_considered as u64);
        orders_considered.push(run.orders_considered as u64);
        assigned.push(run.assigned_count() as u64);
        skipped.push(run.skipped.len() as u64);
        total_cost_km.push(run.total_cost_km());
        average_cost_km.push(run.average_cost_km());
        outcome.push(outcome_code(&run.outcome));
    }

    let schema = Schema::new(vec![
        u8_field("trigger"),
        u64_field("started_at"),
        u64_field("riders_considered"),
        u64_field("orders_considered"),
        u64_field("assigned"),
        u64_field("skipped"),
        f64_field("total_cost_km"),
        f64_field("average_cost_km"),
        u8_field("outcome"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt8Array::from(trigger)),
        Arc::new(UInt64Array::from(started_at)),
        Arc::new(UInt64Array::from(riders_considered)),
        Arc::new(UInt64Array::from(orders_considered)),
        Arc::new(UInt64Array::from(assigned)),
        Arc::new(UInt64Array::from(skipped)),
        Arc::new(Float64Array::from(total_cost_km)),
        Arc::new(Float64Array::from(average_cost_km)),
        Arc::new(UInt8Array::from(outcome)),
    ];

    write_record_batch(path, schema, arrays)
}
