pub mod cost_matrix;
pub mod greedy;
pub mod hungarian;
pub mod policy;
pub mod types;

use bevy_ecs::prelude::Resource;

pub use cost_matrix::{CostMatrix, RejectionMap, INFEASIBLE_COST_KM};
pub use greedy::GreedyAssignment;
pub use hungarian::HungarianAssignment;
pub use policy::AssignmentPolicy;
pub use types::{AssignmentPair, OrderCandidate, RiderCandidate};

/// Resource wrapper for the assignment policy trait object.
#[derive(Resource)]
pub struct AssignmentPolicyResource(pub Box<dyn AssignmentPolicy>);

impl AssignmentPolicyResource {
    pub fn new(policy: Box<dyn AssignmentPolicy>) -> Self {
        Self(policy)
    }
}

impl std::ops::Deref for AssignmentPolicyResource {
    type Target = dyn AssignmentPolicy;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
