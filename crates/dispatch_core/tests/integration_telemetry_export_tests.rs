use std::fs::File;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use dispatch_core::runner::{
    dispatch_schedule, publish_assignment_rejected, publish_order_ready, run_until_empty,
};
use dispatch_core::telemetry::DispatchTelemetry;
use dispatch_core::telemetry_export::{write_assignments_parquet, write_runs_parquet};
use dispatch_core::test_helpers::{
    create_test_world, spawn_available_rider, spawn_preparing_order,
};

fn temp_parquet_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{nanos}.parquet"))
}

fn parquet_column_names(path: &PathBuf) -> Vec<String> {
    let file = File::open(path).expect("parquet file should exist");
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).expect("parquet reader should build");
    builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect()
}

fn parquet_row_count(path: &PathBuf) -> usize {
    let file = File::open(path).expect("parquet file should exist");
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .expect("parquet reader should build")
        .build()
        .expect("parquet reader");
    reader
        .map(|batch| batch.expect("record batch").num_rows())
        .sum()
}

/// Drive two runs (assign, reject, re-dispatch) and export both tables.
fn world_with_recorded_runs() -> DispatchTelemetry {
    let mut world = create_test_world();
    spawn_available_rider(&mut world, 0.0, 0.0);
    let order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));

    let mut schedule = dispatch_schedule();
    publish_order_ready(&mut world, order);
    run_until_empty(&mut world, &mut schedule, 1000);
    publish_assignment_rejected(&mut world, order);
    run_until_empty(&mut world, &mut schedule, 1000);

    world.remove_resource::<DispatchTelemetry>().expect("telemetry")
}

#[test]
fn runs_parquet_has_one_row_per_run_with_expected_columns() {
    let telemetry = world_with_recorded_runs();
    assert_eq!(telemetry.runs.len(), 2);

    let path = temp_parquet_path("dispatch_runs");
    write_runs_parquet(&path, &telemetry).expect("export should succeed");

    assert_eq!(
        parquet_column_names(&path),
        vec![
            "trigger",
            "started_at",
            "riders_considered",
            "orders_considered",
            "assigned",
            "skipped",
            "total_cost_km",
            "average_cost_km",
            "outcome",
        ]
    );
    assert_eq!(parquet_row_count(&path), 2);
    std::fs::remove_file(&path).ok();
}

#[test]
fn assignments_parquet_has_one_row_per_applied_assignment() {
    let telemetry = world_with_recorded_runs();
    // First run applied one assignment; the rejection re-run applied none.
    assert_eq!(telemetry.assignments().count(), 1);

    let path = temp_parquet_path("dispatch_assignments");
    write_assignments_parquet(&path, &telemetry).expect("export should succeed");

    assert_eq!(
        parquet_column_names(&path),
        vec!["order", "rider", "cost_km", "assigned_at"]
    );
    assert_eq!(parquet_row_count(&path), 1);
    std::fs::remove_file(&path).ok();
}
