use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, DispatchClock, EventKind, EventSubject};
use crate::config::DispatchConfig;
use crate::ecs::{Order, Rider};
use crate::systems::{request_dispatch, PendingDispatch};
use crate::telemetry::DispatchTrigger;

/// Reacts to a rider location/availability change.
///
/// Re-runs dispatch for all pending orders, not just one: a single run
/// must consider every pending order jointly, or a newly close rider can
/// be wasted greedily on the wrong order. Gated by
/// [DispatchConfig::retrigger_on_rider_update].
pub fn rider_updated_system(
    mut clock: ResMut<DispatchClock>,
    event: Res<CurrentEvent>,
    mut pending: ResMut<PendingDispatch>,
    config: Option<Res<DispatchConfig>>,
    riders: Query<&Rider>,
    orders: Query<&Order>,
) {
    if event.0.kind != EventKind::RiderUpdated {
        return;
    }
    let Some(EventSubject::Rider(rider_entity)) = event.0.subject else {
        return;
    };
    let config = config.as_deref().copied().unwrap_or_default();
    if !config.retrigger_on_rider_update {
        return;
    }

    // Only a rider who could actually take work re-triggers, and only
    // when something is waiting.
    let Ok(rider) = riders.get(rider_entity) else {
        return;
    };
    if !rider.is_eligible() {
        return;
    }
    if !orders.iter().any(|order| order.is_pending_assignment()) {
        return;
    }

    request_dispatch(
        &mut clock,
        &mut pending,
        config.debounce_ms,
        DispatchTrigger::RiderUpdate,
    );
}
