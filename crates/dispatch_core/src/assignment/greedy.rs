use super::cost_matrix::CostMatrix;
use super::policy::AssignmentPolicy;
use super::types::AssignmentPair;

/// Greedy baseline: each order takes the cheapest rider still free.
///
/// Orders are visited in column order; ties go to the lowest rider row.
/// O(n*m) and deterministic, but not globally optimal: an early order can
/// take a rider that a later order needed more. Useful as a comparison
/// baseline and for very small pools.
#[derive(Debug, Default)]
pub struct GreedyAssignment;

impl AssignmentPolicy for GreedyAssignment {
    fn assign(&self, matrix: &CostMatrix) -> Vec<AssignmentPair> {
        if matrix.is_empty() {
            return Vec::new();
        }

        let mut used_riders = vec![false; matrix.rows()];
        let mut pairs = Vec::new();

        for order_index in 0..matrix.cols() {
            let mut best: Option<(usize, f64)> = None;
            for rider_index in 0..matrix.rows() {
                if used_riders[rider_index] || !matrix.is_feasible(rider_index, order_index) {
                    continue;
                }
                let cost = matrix.at(rider_index, order_index);
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((rider_index, cost));
                }
            }
            if let Some((rider_index, cost_km)) = best {
                used_riders[rider_index] = true;
                pairs.push(AssignmentPair {
                    rider_index,
                    order_index,
                    cost_km,
                });
            }
        }

        pairs
    }
}
