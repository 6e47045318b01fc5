use bevy_ecs::prelude::{Commands, Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, DispatchClock, EventKind, EventSubject};
use crate::config::DispatchConfig;
use crate::ecs::{Order, OrderStatus, RejectedRiders, Rider};
use crate::systems::{request_dispatch, PendingDispatch};
use crate::telemetry::DispatchTrigger;

/// Handles a rider declining their assigned order.
///
/// One atomic transition within a single event: the rider joins the
/// order's rejected set (idempotent), the rider reference is cleared, the
/// order returns to Preparing, and the rider's in-flight link is dropped
/// if the decline reverted an InRoute delivery. The order is never left
/// pointing at a rider who rejected it. A coalesced dispatch run is then
/// requested so the order re-enters the pool without the declining rider.
pub fn assignment_rejected_system(
    mut commands: Commands,
    mut clock: ResMut<DispatchClock>,
    event: Res<CurrentEvent>,
    mut pending: ResMut<PendingDispatch>,
    config: Option<Res<DispatchConfig>>,
    mut riders: Query<&mut Rider>,
    mut orders: Query<(Entity, &mut Order, Option<&mut RejectedRiders>)>,
) {
    if event.0.kind != EventKind::AssignmentRejected {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok((entity, mut order, rejected)) = orders.get_mut(order_entity) else {
        return;
    };
    let Some(rider_entity) = order.rider else {
        return;
    };
    if order.status.is_terminal() {
        return;
    }

    match rejected {
        Some(mut rejected) => rejected.push_if_absent(rider_entity),
        None => {
            let mut rejected = RejectedRiders::default();
            rejected.push_if_absent(rider_entity);
            commands.entity(entity).insert(rejected);
        }
    }

    if let Ok(mut rider) = riders.get_mut(rider_entity) {
        if rider.current_delivery == Some(order_entity) {
            rider.current_delivery = None;
        }
    }

    order.status = OrderStatus::Preparing;
    order.clear_assignment();

    let config = config.as_deref().copied().unwrap_or_default();
    request_dispatch(
        &mut clock,
        &mut pending,
        config.debounce_ms,
        DispatchTrigger::Rejection,
    );
}
