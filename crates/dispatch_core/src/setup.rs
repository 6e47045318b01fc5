//! World construction for the dispatch engine.
//!
//! The notifier and the assignment policy are injected here, once, at
//! process start; nothing in the engine reaches for ambient globals.

use bevy_ecs::prelude::{Entity, World};

use crate::clock::DispatchClock;
use crate::config::{create_policy, AssignmentPolicyKind, DispatchConfig};
use crate::ecs::{Order, RejectedRiders, Rider};
use crate::geo::Coordinate;
use crate::notify::{AssignmentNotifier, NotifierResource};
use crate::systems::PendingDispatch;
use crate::telemetry::DispatchTelemetry;

/// Build a world with every resource the dispatch schedule needs.
pub fn build_dispatch_world(
    config: DispatchConfig,
    policy: AssignmentPolicyKind,
    notifier: Box<dyn AssignmentNotifier>,
) -> World {
    let mut world = World::new();
    world.insert_resource(DispatchClock::default());
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(PendingDispatch::default());
    world.insert_resource(config);
    world.insert_resource(create_policy(policy));
    world.insert_resource(NotifierResource::new(notifier));
    world
}

/// Spawn a rider in the default on-shift state.
pub fn spawn_rider(world: &mut World, location: Option<Coordinate>) -> Entity {
    world
        .spawn(Rider {
            active: true,
            available: true,
            location,
            current_delivery: None,
        })
        .id()
}

/// Spawn an order with an empty rejection set. Orders start in Sent; the
/// surrounding system moves them through the lifecycle and publishes the
/// matching events.
pub fn spawn_order(world: &mut World, store: Coordinate, delivery: Coordinate) -> Entity {
    world
        .spawn((Order::new(store, delivery), RejectedRiders::default()))
        .id()
}
