use bevy_ecs::prelude::Entity;

use crate::geo::Coordinate;

/// Read-only snapshot of one rider, rebuilt for every dispatch run.
///
/// `location` is the last reported GPS position. Riders without one are
/// still representable; the cost matrix marks them infeasible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiderCandidate {
    pub entity: Entity,
    pub location: Option<Coordinate>,
}

/// Read-only snapshot of one unassigned order, rebuilt for every dispatch run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderCandidate {
    pub entity: Entity,
    pub store: Coordinate,
    pub delivery: Coordinate,
}

/// One rider-order pairing selected by an assignment policy.
///
/// Indices refer to the row (rider) and column (order) of the cost matrix
/// the policy consumed; the orchestrator maps them back to entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentPair {
    pub rider_index: usize,
    pub order_index: usize,
    pub cost_km: f64,
}
