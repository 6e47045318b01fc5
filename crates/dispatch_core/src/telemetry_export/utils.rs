use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::telemetry::{DispatchTrigger, RunOutcome};

pub(super) fn u64_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt64, false)
}

pub(super) fn u8_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt8, false)
}

pub(super) fn f64_field(name: &'static str) -> Field {
    Field::new(name, DataType::Float64, false)
}

pub(super) fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub(super) fn trigger_code(trigger: DispatchTrigger) -> u8 {
    match trigger {
        DispatchTrigger::OrderReady => 0,
        DispatchTrigger::RiderUpdate => 1,
        DispatchTrigger::Rejection => 2,
        DispatchTrigger::Admin => 3,
    }
}

pub(super) fn outcome_code(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Completed => 0,
        RunOutcome::NoEligibleRiders => 1,
        RunOutcome::NoEligibleOrders => 2,
        RunOutcome::NoFeasiblePairs => 3,
        RunOutcome::Failed => 4,
    }
}
