//! Dispatch runner: advances the event queue and routes events into the ECS.
//!
//! Each step pops the next event from [DispatchClock], inserts it as
//! [CurrentEvent], then runs the schedule. One event at a time: this loop
//! is the single writer of dispatch state, so applying can never race
//! with another trigger.
//!
//! The `publish_*` functions are the trigger source's entry points: the
//! surrounding system calls them when an order or rider changes, instead
//! of relying on implicit save hooks.

use bevy_ecs::prelude::{Entity, Res, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::{CurrentEvent, DispatchClock, EventKind, EventSubject};
use crate::systems::{
    assignment_accepted::assignment_accepted_system,
    assignment_rejected::assignment_rejected_system, dispatch_run::dispatch_run_system,
    order_cancelled::order_cancelled_system, order_delivered::order_delivered_system,
    order_ready::order_ready_system, request_dispatch, rider_updated::rider_updated_system,
    PendingDispatch,
};
use crate::telemetry::DispatchTrigger;

// Condition functions for each event kind
fn is_order_ready(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OrderReady)
        .unwrap_or(false)
}

fn is_rider_updated(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::RiderUpdated)
        .unwrap_or(false)
}

fn is_assignment_rejected(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::AssignmentRejected)
        .unwrap_or(false)
}

fn is_assignment_accepted(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::AssignmentAccepted)
        .unwrap_or(false)
}

fn is_order_delivered(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OrderDelivered)
        .unwrap_or(false)
}

fn is_order_cancelled(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OrderCancelled)
        .unwrap_or(false)
}

fn is_dispatch_run(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DispatchRun)
        .unwrap_or(false)
}

/// Runs one step: pops the next event, inserts it as [CurrentEvent], then
/// runs the schedule. Returns `true` if an event was processed.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let event = match world.resource_mut::<DispatchClock>().pop_next() {
        Some(event) => event,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the dispatch schedule: all event-reacting systems plus
/// [apply_deferred] so that deferred component inserts (e.g. a first
/// rejection set) are applied before the next step.
///
/// Systems are conditionally executed based on event type to reduce overhead.
pub fn dispatch_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        // OrderReady
        order_ready_system.run_if(is_order_ready),
        // RiderUpdated
        rider_updated_system.run_if(is_rider_updated),
        // AssignmentRejected
        assignment_rejected_system.run_if(is_assignment_rejected),
        // AssignmentAccepted
        assignment_accepted_system.run_if(is_assignment_accepted),
        // OrderDelivered
        order_delivered_system.run_if(is_order_delivered),
        // OrderCancelled
        order_cancelled_system.run_if(is_order_cancelled),
        // DispatchRun
        dispatch_run_system.run_if(is_dispatch_run),
        // Always run apply_deferred so inserted components are visible next step
        apply_deferred,
    ));
    schedule
}

/// Publish: an order was saved in Preparing with no rider.
pub fn publish_order_ready(world: &mut World, order: Entity) {
    let mut clock = world.resource_mut::<DispatchClock>();
    let now = clock.now();
    clock.schedule_at(now, EventKind::OrderReady, Some(EventSubject::Order(order)));
}

/// Publish: a rider's location or availability changed.
pub fn publish_rider_updated(world: &mut World, rider: Entity) {
    let mut clock = world.resource_mut::<DispatchClock>();
    let now = clock.now();
    clock.schedule_at(now, EventKind::RiderUpdated, Some(EventSubject::Rider(rider)));
}

/// Publish: the assigned rider declined the order.
pub fn publish_assignment_rejected(world: &mut World, order: Entity) {
    let mut clock = world.resource_mut::<DispatchClock>();
    let now = clock.now();
    clock.schedule_at(
        now,
        EventKind::AssignmentRejected,
        Some(EventSubject::Order(order)),
    );
}

/// Publish: the assigned rider accepted the order.
pub fn publish_assignment_accepted(world: &mut World, order: Entity) {
    let mut clock = world.resource_mut::<DispatchClock>();
    let now = clock.now();
    clock.schedule_at(
        now,
        EventKind::AssignmentAccepted,
        Some(EventSubject::Order(order)),
    );
}

/// Publish: the order reached the client.
pub fn publish_order_delivered(world: &mut World, order: Entity) {
    let mut clock = world.resource_mut::<DispatchClock>();
    let now = clock.now();
    clock.schedule_at(
        now,
        EventKind::OrderDelivered,
        Some(EventSubject::Order(order)),
    );
}

/// Publish: the order was cancelled.
pub fn publish_order_cancelled(world: &mut World, order: Entity) {
    let mut clock = world.resource_mut::<DispatchClock>();
    let now = clock.now();
    clock.schedule_at(
        now,
        EventKind::OrderCancelled,
        Some(EventSubject::Order(order)),
    );
}

/// Administrative entry point: run dispatch for every pending order now,
/// skipping the debounce window. Coalesces with any run already pending.
/// Read the structured result from
/// [crate::telemetry::DispatchTelemetry::latest_summary] after draining
/// the queue.
pub fn request_admin_dispatch(world: &mut World) {
    world.resource_scope::<PendingDispatch, _>(|world, mut pending| {
        let mut clock = world.resource_mut::<DispatchClock>();
        request_dispatch(&mut clock, &mut pending, 0, DispatchTrigger::Admin);
    });
}
