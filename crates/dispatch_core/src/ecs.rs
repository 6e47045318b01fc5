use bevy_ecs::prelude::{Component, Entity};

use crate::geo::Coordinate;

/// Order lifecycle. The numeric codes are the wire/store representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Sent,
    Received,
    Preparing,
    InRoute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn code(self) -> u8 {
        match self {
            OrderStatus::Sent => 1,
            OrderStatus::Received => 2,
            OrderStatus::Preparing => 3,
            OrderStatus::InRoute => 4,
            OrderStatus::Delivered => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Rider {
    pub active: bool,
    pub available: bool,
    /// Last reported GPS position; `None` until the rider first reports.
    pub location: Option<Coordinate>,
    /// The order this rider is currently delivering (InRoute). A rider
    /// holds at most one in-flight delivery at a time.
    pub current_delivery: Option<Entity>,
}

impl Rider {
    /// A rider the dispatcher may consider: active, available, with a
    /// known position, and not already out on a delivery.
    pub fn is_eligible(&self) -> bool {
        self.active && self.available && self.location.is_some() && self.current_delivery.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Order {
    pub status: OrderStatus,
    pub rider: Option<Entity>,
    pub store: Coordinate,
    pub delivery: Coordinate,
    /// Total distance (km) of the winning pairing, set when auto-assigned.
    pub assignment_score: Option<f64>,
    pub assigned_at: Option<u64>,
    pub is_auto_assigned: bool,
}

impl Order {
    pub fn new(store: Coordinate, delivery: Coordinate) -> Self {
        Self {
            status: OrderStatus::Sent,
            rider: None,
            store,
            delivery,
            assignment_score: None,
            assigned_at: None,
            is_auto_assigned: false,
        }
    }

    /// An order the dispatcher may consider: being prepared, no rider yet.
    pub fn is_pending_assignment(&self) -> bool {
        self.status == OrderStatus::Preparing && self.rider.is_none()
    }

    /// Drop the current assignment, returning the order to the pool.
    pub fn clear_assignment(&mut self) {
        self.rider = None;
        self.assignment_score = None;
        self.assigned_at = None;
        self.is_auto_assigned = false;
    }
}

/// Riders who declined this order, in decline order. Append-only for the
/// lifetime of the order; the cost matrix treats these pairs as infeasible.
#[derive(Debug, Clone, Default, PartialEq, Component)]
pub struct RejectedRiders(Vec<Entity>);

impl RejectedRiders {
    pub fn contains(&self, rider: Entity) -> bool {
        self.0.contains(&rider)
    }

    /// Append a rider if not already present. Idempotent.
    pub fn push_if_absent(&mut self, rider: Entity) {
        if !self.contains(rider) {
            self.0.push(rider);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
