use bevy_ecs::prelude::{Query, Res};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{Order, OrderStatus, Rider};

/// Handles cancellation by the store or the client. Any non-terminal
/// order can be cancelled; an in-flight rider is released.
pub fn order_cancelled_system(
    event: Res<CurrentEvent>,
    mut riders: Query<&mut Rider>,
    mut orders: Query<&mut Order>,
) {
    if event.0.kind != EventKind::OrderCancelled {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut order) = orders.get_mut(order_entity) else {
        return;
    };
    if order.status.is_terminal() {
        return;
    }

    if let Some(rider_entity) = order.rider {
        if let Ok(mut rider) = riders.get_mut(rider_entity) {
            if rider.current_delivery == Some(order_entity) {
                rider.current_delivery = None;
            }
        }
    }
    order.status = OrderStatus::Cancelled;
}
