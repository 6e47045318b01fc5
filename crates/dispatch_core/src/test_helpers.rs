//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across
//! test files.

use bevy_ecs::prelude::{Entity, World};

use crate::config::{AssignmentPolicyKind, DispatchConfig};
use crate::ecs::{Order, OrderStatus};
use crate::geo::Coordinate;
use crate::notify::NoopNotifier;
use crate::setup::{build_dispatch_world, spawn_order, spawn_rider};

pub fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon)
}

/// World with the Hungarian policy, a noop notifier, and a zero debounce
/// window so dispatch runs fire on the very next step.
pub fn create_test_world() -> World {
    build_dispatch_world(
        DispatchConfig {
            debounce_ms: 0,
            ..Default::default()
        },
        AssignmentPolicyKind::Hungarian,
        Box::new(NoopNotifier),
    )
}

/// Spawn an on-shift rider with a known position.
pub fn spawn_available_rider(world: &mut World, lat: f64, lon: f64) -> Entity {
    spawn_rider(world, Some(coord(lat, lon)))
}

/// Spawn an order already moved to Preparing, ready for dispatch.
pub fn spawn_preparing_order(
    world: &mut World,
    store: (f64, f64),
    delivery: (f64, f64),
) -> Entity {
    let entity = spawn_order(
        world,
        coord(store.0, store.1),
        coord(delivery.0, delivery.1),
    );
    world
        .entity_mut(entity)
        .get_mut::<Order>()
        .expect("order just spawned")
        .status = OrderStatus::Preparing;
    entity
}

/// The rider currently set on an order, if any.
pub fn order_rider(world: &World, order: Entity) -> Option<Entity> {
    world.entity(order).get::<Order>().expect("order").rider
}

/// The current status of an order.
pub fn order_status(world: &World, order: Entity) -> OrderStatus {
    world.entity(order).get::<Order>().expect("order").status
}
