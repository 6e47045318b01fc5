//! Cost matrix construction for rider-order assignment.
//!
//! Cost of pairing a rider with an order is the rider's approach leg
//! (rider to store) plus the delivery leg (store to delivery address),
//! both haversine kilometres. Pairs that must never be selected (rider
//! without a position, rider who already rejected the order) get
//! [INFEASIBLE_COST_KM] instead of being removed, so the matrix stays
//! dense and index-stable for the solver.

use std::collections::{BTreeSet, HashMap};

use bevy_ecs::prelude::Entity;

use crate::geo::distance_km;

use super::types::{OrderCandidate, RiderCandidate};

/// Cost assigned to pairs that must never win.
///
/// A fixed constant rather than anything derived from the input, so that
/// identical snapshots always produce identical matrices. Any real-world
/// cost is a few hundred km at most; this dominates by several orders of
/// magnitude.
pub const INFEASIBLE_COST_KM: f64 = 999_999.0;

/// Riders who declined an order, keyed by order entity.
pub type RejectionMap = HashMap<Entity, BTreeSet<Entity>>;

/// Dense riders-by-orders cost matrix, built fresh per dispatch run.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Build the matrix for one dispatch run.
    ///
    /// Returns an empty matrix when either side is empty; callers treat
    /// that as "no assignment possible", not as an error.
    pub fn build(
        riders: &[RiderCandidate],
        orders: &[OrderCandidate],
        rejected: &RejectionMap,
    ) -> Self {
        if riders.is_empty() || orders.is_empty() {
            return Self {
                rows: 0,
                cols: 0,
                data: Vec::new(),
            };
        }

        // The delivery leg does not depend on the rider; compute it once per order.
        let delivery_legs: Vec<f64> = orders
            .iter()
            .map(|order| distance_km(order.store, order.delivery))
            .collect();

        let mut data = Vec::with_capacity(riders.len() * orders.len());
        for rider in riders {
            for (order, delivery_leg) in orders.iter().zip(&delivery_legs) {
                let declined = rejected
                    .get(&order.entity)
                    .is_some_and(|set| set.contains(&rider.entity));
                let cost = match rider.location {
                    Some(location) if !declined => {
                        distance_km(location, order.store) + delivery_leg
                    }
                    _ => INFEASIBLE_COST_KM,
                };
                data.push(cost);
            }
        }

        Self {
            rows: riders.len(),
            cols: orders.len(),
            data,
        }
    }

    /// Build a matrix directly from cost rows, bypassing the geographic
    /// model. Test-only: lets solver tests pin exact cost structures.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn from_costs(rows: &[&[f64]]) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            assert_eq!(row.len(), n_cols, "all rows must have the same length");
            data.extend_from_slice(row);
        }
        Self {
            rows: n_rows,
            cols: n_cols,
            data,
        }
    }

    /// Number of rider rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of order columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cost of pairing rider row `r` with order column `c`.
    pub fn at(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    /// Whether the pair at (`r`, `c`) has a real, selectable cost.
    pub fn is_feasible(&self, r: usize, c: usize) -> bool {
        self.at(r, c) < INFEASIBLE_COST_KM
    }

    /// True if at least one pair in the matrix is feasible.
    pub fn has_feasible_pair(&self) -> bool {
        self.data.iter().any(|&cost| cost < INFEASIBLE_COST_KM)
    }
}
