use bevy_ecs::prelude::{Query, Res};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{Order, OrderStatus, Rider};

/// Handles the assigned rider accepting their order: Preparing -> InRoute.
///
/// A rider holds at most one InRoute delivery. The check here is the
/// invariant's enforcement point, not just a filter: an acceptance while
/// the rider is already out on a delivery is refused and the order stays
/// Preparing with its assignment intact.
pub fn assignment_accepted_system(
    event: Res<CurrentEvent>,
    mut riders: Query<&mut Rider>,
    mut orders: Query<&mut Order>,
) {
    if event.0.kind != EventKind::AssignmentAccepted {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut order) = orders.get_mut(order_entity) else {
        return;
    };
    if order.status != OrderStatus::Preparing {
        return;
    }
    let Some(rider_entity) = order.rider else {
        return;
    };
    let Ok(mut rider) = riders.get_mut(rider_entity) else {
        return;
    };
    if rider.current_delivery.is_some() {
        return;
    }

    order.status = OrderStatus::InRoute;
    rider.current_delivery = Some(order_entity);
}
