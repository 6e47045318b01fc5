use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, DispatchClock, EventKind, EventSubject};
use crate::config::DispatchConfig;
use crate::ecs::Order;
use crate::systems::{request_dispatch, PendingDispatch};
use crate::telemetry::DispatchTrigger;

/// Reacts to an order entering Preparing with no rider: schedules a
/// coalesced dispatch run covering all pending orders.
pub fn order_ready_system(
    mut clock: ResMut<DispatchClock>,
    event: Res<CurrentEvent>,
    mut pending: ResMut<PendingDispatch>,
    config: Option<Res<DispatchConfig>>,
    orders: Query<&Order>,
) {
    if event.0.kind != EventKind::OrderReady {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok(order) = orders.get(order_entity) else {
        return;
    };
    if !order.is_pending_assignment() {
        return;
    }

    let config = config.as_deref().copied().unwrap_or_default();
    request_dispatch(
        &mut clock,
        &mut pending,
        config.debounce_ms,
        DispatchTrigger::OrderReady,
    );
}
