//! Run a dispatch scenario: 40 riders, 25 ready orders, one admin pass,
//! then a wave of rejections and the re-dispatch they trigger.
//!
//! Run with: cargo run -p dispatch_core --example dispatch_run

use dispatch_core::config::{AssignmentPolicyKind, DispatchConfig};
use dispatch_core::geo::Coordinate;
use dispatch_core::notify::NoopNotifier;
use dispatch_core::runner::{
    dispatch_schedule, publish_assignment_rejected, request_admin_dispatch, run_until_empty,
};
use dispatch_core::setup::{build_dispatch_world, spawn_order, spawn_rider};
use dispatch_core::telemetry::DispatchTelemetry;

fn main() {
    const NUM_RIDERS: usize = 40;
    const NUM_ORDERS: usize = 25;
    const REJECTION_WAVE: usize = 5;

    let mut world = build_dispatch_world(
        DispatchConfig::default(),
        AssignmentPolicyKind::Hungarian,
        Box::new(NoopNotifier),
    );

    // Spread riders and stores over a city-sized grid around the origin
    // (about 0.01 degrees between neighbours, roughly 1.1 km).
    for i in 0..NUM_RIDERS {
        let lat = (i % 8) as f64 * 0.01;
        let lon = (i / 8) as f64 * 0.01;
        spawn_rider(&mut world, Some(Coordinate::new(lat, lon)));
    }
    let mut orders = Vec::with_capacity(NUM_ORDERS);
    for i in 0..NUM_ORDERS {
        let lat = (i % 5) as f64 * 0.015 + 0.002;
        let lon = (i / 5) as f64 * 0.015 + 0.002;
        let store = Coordinate::new(lat, lon);
        let delivery = Coordinate::new(lat + 0.01, lon + 0.005);
        let order = spawn_order(&mut world, store, delivery);
        world
            .entity_mut(order)
            .get_mut::<dispatch_core::ecs::Order>()
            .expect("order just spawned")
            .status = dispatch_core::ecs::OrderStatus::Preparing;
        orders.push(order);
    }

    let mut schedule = dispatch_schedule();
    request_admin_dispatch(&mut world);
    let steps = run_until_empty(&mut world, &mut schedule, 10_000);

    {
        let telemetry = world.resource::<DispatchTelemetry>();
        let summary = telemetry.latest_summary().expect("summary");
        println!(
            "--- Admin dispatch ({NUM_RIDERS} riders, {NUM_ORDERS} orders, {steps} steps) ---"
        );
        println!("Assigned: {}", summary.assigned);
        println!("Total distance: {:.2} km", summary.total_distance_km);
        println!("Average distance: {:.2} km", summary.average_distance_km);
    }

    // The first few assigned riders decline; each decline re-triggers a
    // coalesced dispatch run that avoids the declining rider.
    let declined: Vec<_> = orders
        .iter()
        .copied()
        .filter(|&o| {
            world
                .entity(o)
                .get::<dispatch_core::ecs::Order>()
                .is_some_and(|order| order.rider.is_some())
        })
        .take(REJECTION_WAVE)
        .collect();
    for order in &declined {
        publish_assignment_rejected(&mut world, *order);
    }
    let steps = run_until_empty(&mut world, &mut schedule, 10_000);

    let telemetry = world.resource::<DispatchTelemetry>();
    println!("--- After {} rejections ({steps} steps) ---", declined.len());
    for (i, run) in telemetry.runs.iter().enumerate() {
        println!(
            "  run {}: trigger={:?} outcome={:?} assigned={} skipped={} avg={:.2} km",
            i + 1,
            run.trigger,
            run.outcome,
            run.assigned_count(),
            run.skipped.len(),
            run.average_cost_km(),
        );
    }
    let reassigned = declined
        .iter()
        .filter(|&&o| {
            world
                .entity(o)
                .get::<dispatch_core::ecs::Order>()
                .is_some_and(|order| order.rider.is_some())
        })
        .count();
    println!(
        "Declined orders re-assigned to other riders: {reassigned}/{}",
        declined.len()
    );
}
