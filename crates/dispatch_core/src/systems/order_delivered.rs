use bevy_ecs::prelude::{Query, Res};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{Order, OrderStatus, Rider};

/// Handles delivery completion: InRoute -> Delivered, freeing the rider
/// for the next dispatch run. The order keeps its rider reference as the
/// record of who delivered it.
pub fn order_delivered_system(
    event: Res<CurrentEvent>,
    mut riders: Query<&mut Rider>,
    mut orders: Query<&mut Order>,
) {
    if event.0.kind != EventKind::OrderDelivered {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut order) = orders.get_mut(order_entity) else {
        return;
    };
    if order.status != OrderStatus::InRoute {
        return;
    }

    order.status = OrderStatus::Delivered;
    if let Some(rider_entity) = order.rider {
        if let Ok(mut rider) = riders.get_mut(rider_entity) {
            if rider.current_delivery == Some(order_entity) {
                rider.current_delivery = None;
            }
        }
    }
}
