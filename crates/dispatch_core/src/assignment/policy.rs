use super::cost_matrix::CostMatrix;
use super::types::AssignmentPair;

/// Trait for policies that pair riders with orders over a cost matrix.
pub trait AssignmentPolicy: Send + Sync {
    /// Select rider-order pairs from the matrix.
    ///
    /// Returns at most `min(rows, cols)` pairs, none of them infeasible.
    /// An empty or fully infeasible matrix yields an empty result. For a
    /// given matrix the result must be reproducible; implementations must
    /// not introduce any ordering signal beyond row/column index.
    fn assign(&self, matrix: &CostMatrix) -> Vec<AssignmentPair>;
}
