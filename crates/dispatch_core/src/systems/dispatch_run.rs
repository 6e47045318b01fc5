//! Dispatch run system: executes one Gathering -> Matching -> Applying
//! cycle against the world when a DispatchRun event fires.
//!
//! The world is the in-process rider/order store; [WorldStore] adapts the
//! system's queries to the [DispatchStore] contract so the engine stays
//! storage-agnostic. Because the runner processes one event at a time,
//! Applying can never interleave with another writer; the per-pair
//! re-validation still runs so a snapshot gathered before earlier
//! in-batch writes or a stale coalesced trigger can never double-assign.

use std::collections::BTreeSet;

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::assignment::{AssignmentPolicyResource, OrderCandidate, RejectionMap, RiderCandidate};
use crate::clock::{CurrentEvent, DispatchClock, EventKind};
use crate::config::DispatchConfig;
use crate::ecs::{Order, OrderStatus, RejectedRiders, Rider};
use crate::engine::{run_dispatch, ApplyStatus, DispatchStore, SkipReason, StoreError};
use crate::notify::NotifierResource;
use crate::systems::PendingDispatch;
use crate::telemetry::{DispatchTelemetry, DispatchTrigger};

type RiderQuery<'w, 's> = Query<'w, 's, (Entity, &'static mut Rider)>;
type OrderQuery<'w, 's> =
    Query<'w, 's, (Entity, &'static mut Order, Option<&'static mut RejectedRiders>)>;

/// [DispatchStore] backed by the live ECS world. World access is
/// infallible, so this implementation never returns [StoreError]; the
/// conflict arm of `apply_assignment` carries all re-validation outcomes.
pub struct WorldStore<'wr, 'sr, 'wo, 'so, 'a> {
    pub riders: &'a mut RiderQuery<'wr, 'sr>,
    pub orders: &'a mut OrderQuery<'wo, 'so>,
}

impl DispatchStore for WorldStore<'_, '_, '_, '_, '_> {
    fn list_eligible_riders(&mut self) -> Result<Vec<RiderCandidate>, StoreError> {
        let mut riders: Vec<RiderCandidate> = self
            .riders
            .iter()
            .filter(|(_, rider)| rider.is_eligible())
            .map(|(entity, rider)| RiderCandidate {
                entity,
                location: rider.location,
            })
            .collect();
        // Entity order is the only ordering signal the matrix sees.
        riders.sort_by_key(|candidate| candidate.entity);
        Ok(riders)
    }

    fn list_eligible_orders(&mut self) -> Result<Vec<OrderCandidate>, StoreError> {
        let mut orders: Vec<OrderCandidate> = self
            .orders
            .iter()
            .filter(|(_, order, _)| order.is_pending_assignment())
            .map(|(entity, order, _)| OrderCandidate {
                entity,
                store: order.store,
                delivery: order.delivery,
            })
            .collect();
        orders.sort_by_key(|candidate| candidate.entity);
        Ok(orders)
    }

    fn rejected_riders(&mut self) -> Result<RejectionMap, StoreError> {
        let mut map = RejectionMap::new();
        for (entity, order, rejected) in self.orders.iter() {
            if !order.is_pending_assignment() {
                continue;
            }
            if let Some(rejected) = rejected {
                if !rejected.is_empty() {
                    map.insert(entity, rejected.iter().collect::<BTreeSet<_>>());
                }
            }
        }
        Ok(map)
    }

    fn apply_assignment(
        &mut self,
        order: Entity,
        rider: Entity,
        cost_km: f64,
        timestamp: u64,
    ) -> Result<ApplyStatus, StoreError> {
        // Re-validate the rider first: it may have gone off shift or picked
        // up a delivery since the snapshot was gathered.
        {
            let Ok((_, rider_state)) = self.riders.get(rider) else {
                return Ok(ApplyStatus::Conflict(SkipReason::MissingRider));
            };
            if !rider_state.active || !rider_state.available {
                return Ok(ApplyStatus::Conflict(SkipReason::RiderUnavailable));
            }
            if rider_state.current_delivery.is_some() {
                return Ok(ApplyStatus::Conflict(SkipReason::RiderInFlight));
            }
        }

        let Ok((_, mut order_state, _)) = self.orders.get_mut(order) else {
            return Ok(ApplyStatus::Conflict(SkipReason::MissingOrder));
        };
        if order_state.status != OrderStatus::Preparing {
            return Ok(ApplyStatus::Conflict(SkipReason::OrderNotPreparing));
        }
        if order_state.rider.is_some() {
            return Ok(ApplyStatus::Conflict(SkipReason::OrderTaken));
        }

        order_state.rider = Some(rider);
        order_state.assignment_score = Some(cost_km);
        order_state.assigned_at = Some(timestamp);
        order_state.is_auto_assigned = true;
        Ok(ApplyStatus::Applied)
    }

    fn append_rejection(&mut self, order: Entity, rider: Entity) -> Result<(), StoreError> {
        let Ok((_, _, rejected)) = self.orders.get_mut(order) else {
            return Err(StoreError(format!("unknown order {order:?}")));
        };
        let Some(mut rejected) = rejected else {
            return Err(StoreError(format!("order {order:?} has no rejection set")));
        };
        rejected.push_if_absent(rider);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
pub fn dispatch_run_system(
    clock: Res<DispatchClock>,
    event: Res<CurrentEvent>,
    mut pending: ResMut<PendingDispatch>,
    config: Option<Res<DispatchConfig>>,
    policy: Res<AssignmentPolicyResource>,
    notifier: Option<Res<NotifierResource>>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut riders: RiderQuery,
    mut orders: OrderQuery,
) {
    if event.0.kind != EventKind::DispatchRun {
        return;
    }

    let trigger = pending.0.take().unwrap_or(DispatchTrigger::Admin);
    let config = config.as_deref().copied().unwrap_or_default();

    let mut store = WorldStore {
        riders: &mut riders,
        orders: &mut orders,
    };
    let record = run_dispatch(&mut store, &**policy, &config, clock.now(), trigger);

    // Fire-and-forget notifications; failures never touch the assignments.
    if let Some(notifier) = notifier.as_deref() {
        for assignment in &record.assignments {
            if notifier
                .assignment_applied(assignment.order, assignment.rider, assignment.cost_km)
                .is_err()
            {
                telemetry.notify_failures += 1;
            }
        }
    }

    telemetry.record_run(record);
}
