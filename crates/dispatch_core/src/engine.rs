//! Dispatch engine: the Gathering -> Matching -> Applying cycle over an
//! abstract rider/order store.
//!
//! The engine never owns persistence. It reads a snapshot through
//! [DispatchStore], matches in memory, and writes each winning pair back
//! through the same trait, re-validating immediately before every write.
//! A pair that fails re-validation is skipped and the rest of the batch
//! continues; only a store error fails the run, and assignments written
//! before the error are kept.

use std::fmt;

use bevy_ecs::prelude::Entity;

use crate::assignment::{
    AssignmentPolicy, CostMatrix, OrderCandidate, RejectionMap, RiderCandidate,
};
use crate::config::DispatchConfig;
use crate::telemetry::{
    AssignmentRecord, DispatchRunRecord, DispatchTrigger, RunOutcome, SkippedPair,
};

/// The store could not be reached or refused the operation outright.
/// Fatal for the current run; the next trigger starts a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store access failed: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Why Applying refused one proposed pair. Recovered locally by skipping
/// the pair; the order stays in the pool for the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The order gained a rider between Gathering and Applying.
    OrderTaken,
    /// The order left Preparing between Gathering and Applying.
    OrderNotPreparing,
    /// The rider became inactive or unavailable.
    RiderUnavailable,
    /// The rider picked up another delivery in the meantime.
    RiderInFlight,
    /// The order record disappeared from the store.
    MissingOrder,
    /// The rider record disappeared from the store.
    MissingRider,
}

/// Result of one `apply_assignment` call that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Conflict(SkipReason),
}

/// External persistence collaborator for dispatch.
///
/// Implementations must make `apply_assignment` re-validate under
/// whatever isolation they have (the in-process world, a database
/// transaction) so that a stale snapshot can never produce a double
/// assignment: checking and writing one order must be atomic.
pub trait DispatchStore {
    /// Riders the dispatcher may consider: active, available, location
    /// known, not on an in-flight delivery. Ordering must be stable for
    /// identical state; it becomes the cost-matrix row order.
    fn list_eligible_riders(&mut self) -> Result<Vec<RiderCandidate>, StoreError>;

    /// Orders awaiting a rider: Preparing, rider unset. Ordering as above;
    /// it becomes the cost-matrix column order.
    fn list_eligible_orders(&mut self) -> Result<Vec<OrderCandidate>, StoreError>;

    /// Riders who have declined each order.
    fn rejected_riders(&mut self) -> Result<RejectionMap, StoreError>;

    /// Atomically re-validate and write one assignment: set the order's
    /// rider, assignment score, assignment timestamp, and the
    /// auto-assigned flag.
    fn apply_assignment(
        &mut self,
        order: Entity,
        rider: Entity,
        cost_km: f64,
        timestamp: u64,
    ) -> Result<ApplyStatus, StoreError>;

    /// Record that `rider` declined `order`. Idempotent.
    fn append_rejection(&mut self, order: Entity, rider: Entity) -> Result<(), StoreError>;
}

fn failed_run(
    trigger: DispatchTrigger,
    started_at: u64,
    riders: usize,
    orders: usize,
    partial: Vec<AssignmentRecord>,
    skipped: Vec<SkippedPair>,
    error: StoreError,
) -> DispatchRunRecord {
    DispatchRunRecord {
        trigger,
        started_at,
        riders_considered: riders,
        orders_considered: orders,
        assignments: partial,
        skipped,
        outcome: RunOutcome::Failed,
        error: Some(error),
    }
}

fn empty_run(
    trigger: DispatchTrigger,
    started_at: u64,
    riders: usize,
    orders: usize,
    outcome: RunOutcome,
) -> DispatchRunRecord {
    DispatchRunRecord {
        trigger,
        started_at,
        riders_considered: riders,
        orders_considered: orders,
        assignments: Vec::new(),
        skipped: Vec::new(),
        outcome,
        error: None,
    }
}

/// Run one full dispatch cycle against the store.
///
/// Always returns a record; `outcome` distinguishes Done from Failed.
/// Never panics and never aborts a batch for a single conflicted pair.
pub fn run_dispatch<S: DispatchStore + ?Sized>(
    store: &mut S,
    policy: &dyn AssignmentPolicy,
    config: &DispatchConfig,
    now: u64,
    trigger: DispatchTrigger,
) -> DispatchRunRecord {
    // Gathering.
    let mut riders = match store.list_eligible_riders() {
        Ok(riders) => riders,
        Err(e) => return failed_run(trigger, now, 0, 0, Vec::new(), Vec::new(), e),
    };
    let mut orders = match store.list_eligible_orders() {
        Ok(orders) => orders,
        Err(e) => return failed_run(trigger, now, riders.len(), 0, Vec::new(), Vec::new(), e),
    };
    if let Some(cap) = config.max_batch_size {
        riders.truncate(cap);
        orders.truncate(cap);
    }

    if riders.is_empty() {
        return empty_run(trigger, now, 0, orders.len(), RunOutcome::NoEligibleRiders);
    }
    if orders.is_empty() {
        return empty_run(trigger, now, riders.len(), 0, RunOutcome::NoEligibleOrders);
    }

    let rejected = match store.rejected_riders() {
        Ok(rejected) => rejected,
        Err(e) => {
            return failed_run(
                trigger,
                now,
                riders.len(),
                orders.len(),
                Vec::new(),
                Vec::new(),
                e,
            )
        }
    };

    // Matching: pure in-memory computation, no store access.
    let matrix = CostMatrix::build(&riders, &orders, &rejected);
    let pairs = policy.assign(&matrix);
    if pairs.is_empty() {
        return empty_run(
            trigger,
            now,
            riders.len(),
            orders.len(),
            RunOutcome::NoFeasiblePairs,
        );
    }

    // Applying: re-validate and write each pair; skip conflicts, keep going.
    let mut assignments = Vec::new();
    let mut skipped = Vec::new();
    for pair in pairs {
        let rider = riders[pair.rider_index].entity;
        let order = orders[pair.order_index].entity;
        match store.apply_assignment(order, rider, pair.cost_km, now) {
            Ok(ApplyStatus::Applied) => assignments.push(AssignmentRecord {
                order,
                rider,
                cost_km: pair.cost_km,
                assigned_at: now,
            }),
            Ok(ApplyStatus::Conflict(reason)) => skipped.push(SkippedPair {
                order,
                rider,
                reason,
            }),
            // Assignments already written stay written; surface the rest
            // of the batch as failed.
            Err(e) => {
                return failed_run(
                    trigger,
                    now,
                    riders.len(),
                    orders.len(),
                    assignments,
                    skipped,
                    e,
                )
            }
        }
    }

    DispatchRunRecord {
        trigger,
        started_at: now,
        riders_considered: riders.len(),
        orders_considered: orders.len(),
        assignments,
        skipped,
        outcome: RunOutcome::Completed,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::HungarianAssignment;
    use crate::geo::Coordinate;
    use std::collections::BTreeSet;

    /// In-memory store double with scriptable failures and conflicts.
    #[derive(Default)]
    struct ScriptedStore {
        riders: Vec<RiderCandidate>,
        orders: Vec<OrderCandidate>,
        rejected: RejectionMap,
        conflicts: Vec<Entity>,
        fail_listing: bool,
        fail_apply_after: Option<usize>,
        applied: Vec<(Entity, Entity, f64, u64)>,
    }

    impl DispatchStore for ScriptedStore {
        fn list_eligible_riders(&mut self) -> Result<Vec<RiderCandidate>, StoreError> {
            if self.fail_listing {
                return Err(StoreError("connection refused".into()));
            }
            Ok(self.riders.clone())
        }

        fn list_eligible_orders(&mut self) -> Result<Vec<OrderCandidate>, StoreError> {
            Ok(self.orders.clone())
        }

        fn rejected_riders(&mut self) -> Result<RejectionMap, StoreError> {
            Ok(self.rejected.clone())
        }

        fn apply_assignment(
            &mut self,
            order: Entity,
            rider: Entity,
            cost_km: f64,
            timestamp: u64,
        ) -> Result<ApplyStatus, StoreError> {
            if self
                .fail_apply_after
                .is_some_and(|n| self.applied.len() >= n)
            {
                return Err(StoreError("write timeout".into()));
            }
            if self.conflicts.contains(&order) {
                return Ok(ApplyStatus::Conflict(SkipReason::OrderTaken));
            }
            self.applied.push((order, rider, cost_km, timestamp));
            Ok(ApplyStatus::Applied)
        }

        fn append_rejection(&mut self, order: Entity, rider: Entity) -> Result<(), StoreError> {
            self.rejected.entry(order).or_default().insert(rider);
            Ok(())
        }
    }

    fn rider(id: u32, lat: f64, lon: f64) -> RiderCandidate {
        RiderCandidate {
            entity: Entity::from_raw(id),
            location: Some(Coordinate::new(lat, lon)),
        }
    }

    fn order(id: u32, store_lat: f64, store_lon: f64) -> OrderCandidate {
        OrderCandidate {
            entity: Entity::from_raw(id),
            store: Coordinate::new(store_lat, store_lon),
            delivery: Coordinate::new(store_lat, store_lon + 0.01),
        }
    }

    fn run(store: &mut ScriptedStore) -> DispatchRunRecord {
        run_dispatch(
            store,
            &HungarianAssignment,
            &DispatchConfig::default(),
            1_000,
            DispatchTrigger::Admin,
        )
    }

    #[test]
    fn empty_rider_pool_is_a_normal_outcome() {
        let mut store = ScriptedStore {
            orders: vec![order(10, 0.0, 1.0)],
            ..Default::default()
        };
        let record = run(&mut store);
        assert_eq!(record.outcome, RunOutcome::NoEligibleRiders);
        assert_eq!(record.assigned_count(), 0);
        assert!(record.error.is_none());
    }

    #[test]
    fn empty_order_pool_is_a_normal_outcome() {
        let mut store = ScriptedStore {
            riders: vec![rider(1, 0.0, 0.0)],
            ..Default::default()
        };
        let record = run(&mut store);
        assert_eq!(record.outcome, RunOutcome::NoEligibleOrders);
    }

    #[test]
    fn fully_rejected_pool_yields_no_feasible_pairs() {
        let the_order = order(10, 0.0, 1.0);
        let the_rider = rider(1, 0.0, 0.0);
        let mut rejected = RejectionMap::new();
        rejected.insert(
            the_order.entity,
            BTreeSet::from([the_rider.entity]),
        );
        let mut store = ScriptedStore {
            riders: vec![the_rider],
            orders: vec![the_order],
            rejected,
            ..Default::default()
        };
        let record = run(&mut store);
        assert_eq!(record.outcome, RunOutcome::NoFeasiblePairs);
        assert!(store.applied.is_empty());
    }

    #[test]
    fn conflicted_pair_is_skipped_and_batch_continues() {
        let mut store = ScriptedStore {
            riders: vec![rider(1, 0.0, 0.0), rider(2, 10.0, 10.0)],
            orders: vec![order(10, 0.0, 1.0), order(11, 10.0, 9.0)],
            conflicts: vec![Entity::from_raw(10)],
            ..Default::default()
        };
        let record = run(&mut store);
        assert_eq!(record.outcome, RunOutcome::Completed);
        assert_eq!(record.assigned_count(), 1);
        assert_eq!(record.skipped.len(), 1);
        assert_eq!(record.skipped[0].reason, SkipReason::OrderTaken);
        assert_eq!(store.applied.len(), 1);
    }

    #[test]
    fn listing_failure_fails_the_run_with_no_writes() {
        let mut store = ScriptedStore {
            fail_listing: true,
            ..Default::default()
        };
        let record = run(&mut store);
        assert_eq!(record.outcome, RunOutcome::Failed);
        assert!(record.error.is_some());
        assert!(store.applied.is_empty());
    }

    #[test]
    fn apply_failure_keeps_earlier_assignments() {
        let mut store = ScriptedStore {
            riders: vec![rider(1, 0.0, 0.0), rider(2, 10.0, 10.0)],
            orders: vec![order(10, 0.0, 1.0), order(11, 10.0, 9.0)],
            fail_apply_after: Some(1),
            ..Default::default()
        };
        let record = run(&mut store);
        assert_eq!(record.outcome, RunOutcome::Failed);
        // The first write landed and is reported; the store keeps it.
        assert_eq!(record.assigned_count(), 1);
        assert_eq!(store.applied.len(), 1);
    }

    #[test]
    fn batch_cap_truncates_candidates_deterministically() {
        let mut store = ScriptedStore {
            riders: vec![rider(1, 0.0, 0.0), rider(2, 0.1, 0.1), rider(3, 0.2, 0.2)],
            orders: vec![order(10, 0.0, 1.0), order(11, 1.0, 1.0), order(12, 2.0, 1.0)],
            ..Default::default()
        };
        let config = DispatchConfig {
            max_batch_size: Some(2),
            ..Default::default()
        };
        let record = run_dispatch(
            &mut store,
            &HungarianAssignment,
            &config,
            0,
            DispatchTrigger::Admin,
        );
        assert_eq!(record.riders_considered, 2);
        assert_eq!(record.orders_considered, 2);
        assert_eq!(record.assigned_count(), 2);
    }
}
