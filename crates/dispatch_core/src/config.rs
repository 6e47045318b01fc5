use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentPolicyResource, GreedyAssignment, HungarianAssignment};
use crate::clock::ONE_SEC_MS;

/// Which assignment policy to install when building the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentPolicyKind {
    Greedy,
    Hungarian,
}

pub fn create_policy(kind: AssignmentPolicyKind) -> AssignmentPolicyResource {
    match kind {
        AssignmentPolicyKind::Greedy => AssignmentPolicyResource::new(Box::new(GreedyAssignment)),
        AssignmentPolicyKind::Hungarian => {
            AssignmentPolicyResource::new(Box::new(HungarianAssignment))
        }
    }
}

/// Dispatch orchestration tuning.
#[derive(Debug, Clone, Copy, Resource, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Delay between a trigger and the dispatch run it schedules.
    /// Triggers arriving inside the window coalesce into that one run.
    pub debounce_ms: u64,
    /// Re-run dispatch for all pending orders when a rider's location or
    /// availability changes.
    pub retrigger_on_rider_update: bool,
    /// Cap on riders and orders considered per run. `None` = unbounded.
    /// Operational tuning for very large pools; candidates are taken in
    /// entity order so the cap stays deterministic.
    pub max_batch_size: Option<usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: ONE_SEC_MS,
            retrigger_on_rider_update: true,
            max_batch_size: None,
        }
    }
}
