//! Dispatch telemetry: one record per dispatch run, one per applied
//! assignment. Administrative triggers read their structured summary from
//! here; automatic triggers leave the records for export and analysis.

use bevy_ecs::prelude::{Entity, Resource};
use serde::Serialize;

use crate::engine::{SkipReason, StoreError};

/// What caused a dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTrigger {
    /// An order entered Preparing with no rider.
    OrderReady,
    /// A rider location/availability change re-triggered dispatch.
    RiderUpdate,
    /// A rejection returned an order to the pool.
    Rejection,
    /// Explicit administrative request.
    Admin,
}

/// Terminal state of one dispatch run.
///
/// Only `Failed` is an error; the empty outcomes are normal results of
/// Gathering or Matching finding nothing to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run reached Applying; zero applied is still Completed.
    Completed,
    NoEligibleRiders,
    NoEligibleOrders,
    /// Candidates existed but every pair was infeasible.
    NoFeasiblePairs,
    /// The store failed during Gathering or Applying.
    Failed,
}

/// One assignment written to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentRecord {
    pub order: Entity,
    pub rider: Entity,
    pub cost_km: f64,
    pub assigned_at: u64,
}

/// One pair the solver proposed but Applying refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedPair {
    pub order: Entity,
    pub rider: Entity,
    pub reason: SkipReason,
}

/// Full record of one Gathering -> Matching -> Applying cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRunRecord {
    pub trigger: DispatchTrigger,
    pub started_at: u64,
    pub riders_considered: usize,
    pub orders_considered: usize,
    pub assignments: Vec<AssignmentRecord>,
    pub skipped: Vec<SkippedPair>,
    pub outcome: RunOutcome,
    pub error: Option<StoreError>,
}

impl DispatchRunRecord {
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn total_cost_km(&self) -> f64 {
        self.assignments.iter().map(|a| a.cost_km).sum()
    }

    pub fn average_cost_km(&self) -> f64 {
        if self.assignments.is_empty() {
            0.0
        } else {
            self.total_cost_km() / self.assignments.len() as f64
        }
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            assigned: self.assigned_count(),
            skipped: self.skipped.len(),
            total_distance_km: self.total_cost_km(),
            average_distance_km: self.average_cost_km(),
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Structured result returned to administrative callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSummary {
    pub assigned: usize,
    pub skipped: usize,
    pub total_distance_km: f64,
    pub average_distance_km: f64,
    pub error: Option<String>,
}

/// Collects dispatch telemetry. Insert as a resource to record runs.
#[derive(Debug, Default, Resource)]
pub struct DispatchTelemetry {
    pub runs: Vec<DispatchRunRecord>,
    /// Notification deliveries that failed after a successful apply.
    /// Notifications are fire-and-forget; failures never undo assignments.
    pub notify_failures: u64,
}

impl DispatchTelemetry {
    pub fn record_run(&mut self, record: DispatchRunRecord) {
        self.runs.push(record);
    }

    pub fn latest_summary(&self) -> Option<DispatchSummary> {
        self.runs.last().map(DispatchRunRecord::summary)
    }

    /// All assignments applied across every recorded run.
    pub fn assignments(&self) -> impl Iterator<Item = &AssignmentRecord> + '_ {
        self.runs.iter().flat_map(|r| r.assignments.iter())
    }
}
