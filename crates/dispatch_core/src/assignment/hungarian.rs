//! Hungarian (Kuhn-Munkres) assignment for minimum-cost dispatch.
//!
//! Optimizes globally across all rider-order pairs in a batch so the total
//! approach-plus-delivery distance is minimized, instead of letting early
//! orders grab riders that later orders need more.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use super::cost_matrix::CostMatrix;
use super::policy::AssignmentPolicy;
use super::types::AssignmentPair;

/// Scale factor to convert f64 cost to i64 for the assignment algorithm.
const SCALE: f64 = 1_000_000.0;

/// Weight for infeasible pairs (never selected).
/// Must be worse than any feasible weight but not so extreme that negating
/// and summing (e.g. in pathfinding's internal use of neg()) overflows i64.
const INFEASIBLE_WEIGHT: i64 = -1_000_000_000_000_i64; // -1e12; feasible weights are -1e9..0

/// Simple matrix type implementing pathfinding's Weights for i64.
struct I64Weights(Vec<Vec<i64>>);

impl Weights<i64> for I64Weights {
    fn rows(&self) -> usize {
        self.0.len()
    }

    fn columns(&self) -> usize {
        self.0.first().map_or(0, |r| r.len())
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.0[row][col]
    }

    fn neg(&self) -> Self {
        I64Weights(
            self.0
                .iter()
                .map(|r| r.iter().map(|&x| x.saturating_neg()).collect())
                .collect(),
        )
    }
}

/// Convert a cost in km to an i64 weight (negate, scale, clamp).
/// Lower cost becomes higher weight, so maximizing total weight minimizes
/// total cost.
fn cost_to_weight(cost_km: f64) -> i64 {
    let w = -cost_km * SCALE;
    if w >= i64::MAX as f64 {
        i64::MAX
    } else if w <= i64::MIN as f64 {
        i64::MIN
    } else {
        w as i64
    }
}

/// Minimum-cost bipartite assignment via Kuhn-Munkres, O(n³) worst case.
///
/// Deterministic for identical input: the algorithm itself is
/// deterministic and the matrix carries the only ordering signal, so when
/// several optimal matchings exist the same one is returned every run.
/// Pairs at the infeasible sentinel are considered during the matching
/// (the algorithm needs a complete matrix) but dropped from the output.
#[derive(Debug, Default)]
pub struct HungarianAssignment;

impl AssignmentPolicy for HungarianAssignment {
    fn assign(&self, matrix: &CostMatrix) -> Vec<AssignmentPair> {
        if matrix.is_empty() || !matrix.has_feasible_pair() {
            return Vec::new();
        }

        // Kuhn-Munkres requires rows <= columns; transpose when there are
        // more riders than orders and swap the indices back afterwards.
        let transpose = matrix.rows() > matrix.cols();
        let (rows, cols) = if transpose {
            (matrix.cols(), matrix.rows())
        } else {
            (matrix.rows(), matrix.cols())
        };

        let mut weights = vec![vec![INFEASIBLE_WEIGHT; cols]; rows];
        for r in 0..rows {
            for c in 0..cols {
                let (rider, order) = if transpose { (c, r) } else { (r, c) };
                if matrix.is_feasible(rider, order) {
                    weights[r][c] = cost_to_weight(matrix.at(rider, order));
                }
            }
        }

        let weights = I64Weights(weights);
        let (_total, columns) = kuhn_munkres(&weights);

        let mut pairs = Vec::new();
        for (row, &col) in columns.iter().enumerate() {
            if weights.at(row, col) <= INFEASIBLE_WEIGHT {
                continue;
            }
            let (rider_index, order_index) = if transpose { (col, row) } else { (row, col) };
            pairs.push(AssignmentPair {
                rider_index,
                order_index,
                cost_km: matrix.at(rider_index, order_index),
            });
        }
        pairs
    }
}
