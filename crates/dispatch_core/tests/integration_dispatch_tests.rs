use bevy_ecs::prelude::Entity;

use dispatch_core::ecs::{Order, OrderStatus, Rider};
use dispatch_core::notify::{AssignmentNotifier, NotifierResource, NotifyError};
use dispatch_core::runner::{
    dispatch_schedule, publish_assignment_accepted, publish_order_delivered, publish_order_ready,
    publish_rider_updated, request_admin_dispatch, run_until_empty,
};
use dispatch_core::telemetry::{DispatchTelemetry, DispatchTrigger, RunOutcome};
use dispatch_core::test_helpers::{
    create_test_world, order_rider, order_status, spawn_available_rider, spawn_preparing_order,
};

const MAX_STEPS: usize = 1000;

#[test]
fn nearest_riders_win_their_local_orders_not_crossed() {
    let mut world = create_test_world();
    let rider_near_origin = spawn_available_rider(&mut world, 0.0, 0.0);
    let rider_far = spawn_available_rider(&mut world, 10.0, 10.0);
    let order_near_origin = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));
    let order_far = spawn_preparing_order(&mut world, (10.0, 9.0), (10.0, 8.0));

    publish_order_ready(&mut world, order_near_origin);
    publish_order_ready(&mut world, order_far);

    let mut schedule = dispatch_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert!(steps < MAX_STEPS, "runner did not converge");

    assert_eq!(order_rider(&world, order_near_origin), Some(rider_near_origin));
    assert_eq!(order_rider(&world, order_far), Some(rider_far));

    let order = world
        .entity(order_near_origin)
        .get::<Order>()
        .expect("order");
    assert!(order.is_auto_assigned);
    assert!(order.assignment_score.is_some());
    assert!(order.assigned_at.is_some());
}

#[test]
fn single_rider_two_orders_takes_exactly_the_cheaper_one() {
    let mut world = create_test_world();
    let rider = spawn_available_rider(&mut world, 0.0, 0.0);
    let near_order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 1.5));
    let far_order = spawn_preparing_order(&mut world, (5.0, 5.0), (5.0, 6.0));

    publish_order_ready(&mut world, near_order);
    publish_order_ready(&mut world, far_order);

    let mut schedule = dispatch_schedule();
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    assert_eq!(order_rider(&world, near_order), Some(rider));
    assert_eq!(order_rider(&world, far_order), None);
    assert_eq!(order_status(&world, far_order), OrderStatus::Preparing);
}

#[test]
fn concurrent_triggers_coalesce_into_one_run() {
    let mut world = create_test_world();
    spawn_available_rider(&mut world, 0.0, 0.0);
    spawn_available_rider(&mut world, 1.0, 1.0);
    spawn_available_rider(&mut world, 2.0, 2.0);
    let orders: Vec<Entity> = (0..3)
        .map(|i| spawn_preparing_order(&mut world, (i as f64, 1.0), (i as f64, 2.0)))
        .collect();

    for &order in &orders {
        publish_order_ready(&mut world, order);
    }

    let mut schedule = dispatch_schedule();
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    // Three triggers, one run, all three orders assigned in that run.
    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.runs.len(), 1);
    assert_eq!(telemetry.runs[0].assigned_count(), 3);
    for &order in &orders {
        assert!(order_rider(&world, order).is_some());
    }
}

#[test]
fn dispatch_is_idempotent_without_intervening_changes() {
    let mut world = create_test_world();
    let rider = spawn_available_rider(&mut world, 0.0, 0.0);
    let order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));

    let mut schedule = dispatch_schedule();
    request_admin_dispatch(&mut world);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    request_admin_dispatch(&mut world);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    assert_eq!(order_rider(&world, order), Some(rider));

    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.runs.len(), 2);
    assert_eq!(telemetry.runs[0].outcome, RunOutcome::Completed);
    assert_eq!(telemetry.runs[0].assigned_count(), 1);
    // The second run finds nothing eligible; the order is not re-assigned.
    assert_eq!(telemetry.runs[1].outcome, RunOutcome::NoEligibleOrders);
    assert_eq!(telemetry.runs[1].assigned_count(), 0);
}

#[test]
fn admin_run_with_no_riders_reports_zero_assignments() {
    let mut world = create_test_world();
    spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));

    let mut schedule = dispatch_schedule();
    request_admin_dispatch(&mut world);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    let telemetry = world.resource::<DispatchTelemetry>();
    let summary = telemetry.latest_summary().expect("summary");
    assert_eq!(summary.assigned, 0);
    assert!(summary.error.is_none());
    assert_eq!(telemetry.runs[0].outcome, RunOutcome::NoEligibleRiders);
    assert_eq!(telemetry.runs[0].trigger, DispatchTrigger::Admin);
}

#[test]
fn delivery_frees_the_rider_for_the_next_order() {
    let mut world = create_test_world();
    let rider = spawn_available_rider(&mut world, 0.0, 0.0);
    let first_order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));

    let mut schedule = dispatch_schedule();
    publish_order_ready(&mut world, first_order);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert_eq!(order_rider(&world, first_order), Some(rider));

    publish_assignment_accepted(&mut world, first_order);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert_eq!(order_status(&world, first_order), OrderStatus::InRoute);

    // While in flight the rider is invisible to dispatch.
    let second_order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 3.0));
    publish_order_ready(&mut world, second_order);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert_eq!(order_rider(&world, second_order), None);

    publish_order_delivered(&mut world, first_order);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert_eq!(order_status(&world, first_order), OrderStatus::Delivered);
    let rider_state = world.entity(rider).get::<Rider>().expect("rider");
    assert_eq!(rider_state.current_delivery, None);

    // Freed, the rider picks up the waiting order on the next run.
    request_admin_dispatch(&mut world);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert_eq!(order_rider(&world, second_order), Some(rider));
}

#[test]
fn rider_update_retriggers_dispatch_for_pending_orders() {
    let mut world = create_test_world();
    let order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));

    // No eligible riders yet: the run completes empty.
    let mut schedule = dispatch_schedule();
    publish_order_ready(&mut world, order);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert_eq!(order_rider(&world, order), None);

    // A rider comes on shift and reports a position.
    let rider = spawn_available_rider(&mut world, 0.0, 0.0);
    publish_rider_updated(&mut world, rider);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    assert_eq!(order_rider(&world, order), Some(rider));
    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.runs.len(), 2);
    assert_eq!(telemetry.runs[1].trigger, DispatchTrigger::RiderUpdate);
}

#[test]
fn rider_update_does_not_retrigger_when_disabled() {
    let mut world = create_test_world();
    {
        let mut config = world.resource_mut::<dispatch_core::config::DispatchConfig>();
        config.retrigger_on_rider_update = false;
    }
    spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));
    let rider = spawn_available_rider(&mut world, 0.0, 0.0);

    let mut schedule = dispatch_schedule();
    publish_rider_updated(&mut world, rider);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    assert!(world.resource::<DispatchTelemetry>().runs.is_empty());
}

struct FailingNotifier;

impl AssignmentNotifier for FailingNotifier {
    fn assignment_applied(
        &self,
        _order: Entity,
        _rider: Entity,
        _cost_km: f64,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("push service unavailable".into()))
    }
}

#[test]
fn notification_failures_are_counted_but_do_not_undo_assignments() {
    let mut world = create_test_world();
    world.insert_resource(NotifierResource::new(Box::new(FailingNotifier)));
    let rider = spawn_available_rider(&mut world, 0.0, 0.0);
    let order = spawn_preparing_order(&mut world, (0.0, 1.0), (0.0, 2.0));

    let mut schedule = dispatch_schedule();
    publish_order_ready(&mut world, order);
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    assert_eq!(order_rider(&world, order), Some(rider));
    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.notify_failures, 1);
    assert_eq!(telemetry.runs[0].assigned_count(), 1);
}
