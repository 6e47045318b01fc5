pub mod assignment_accepted;
pub mod assignment_rejected;
pub mod dispatch_run;
pub mod order_cancelled;
pub mod order_delivered;
pub mod order_ready;
pub mod rider_updated;

use bevy_ecs::prelude::Resource;

use crate::clock::{DispatchClock, EventKind};
use crate::telemetry::DispatchTrigger;

/// Latch that coalesces dispatch triggers.
///
/// While a [EventKind::DispatchRun] is queued, further triggers do not
/// schedule another; they fold into the run already waiting, which will
/// gather a fresh snapshot when it fires. The stored trigger is the first
/// one of the window and becomes the run's provenance.
#[derive(Debug, Default, Resource)]
pub struct PendingDispatch(pub Option<DispatchTrigger>);

/// Request a dispatch run, coalescing with any run already pending.
pub fn request_dispatch(
    clock: &mut DispatchClock,
    pending: &mut PendingDispatch,
    delay_ms: u64,
    trigger: DispatchTrigger,
) {
    if pending.0.is_some() {
        return;
    }
    pending.0 = Some(trigger);
    clock.schedule_in_ms(delay_ms, EventKind::DispatchRun, None);
}
