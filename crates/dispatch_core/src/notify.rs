//! Assignment notification collaborator.
//!
//! After Applying succeeds, the orchestrator tells the notifier about each
//! assignment so the rider and the order's client can be alerted.
//! Delivery is fire-and-forget: a failed notification is counted in
//! telemetry and never unwinds the assignment. The notifier is injected at
//! world construction and lives for the process lifetime.

use bevy_ecs::prelude::{Entity, Resource};

/// Errors encountered while delivering an assignment notification.
#[derive(Debug)]
pub enum NotifyError {
    #[cfg(feature = "webhook")]
    Http(reqwest::Error),
    /// The downstream service accepted the connection but refused the
    /// notification.
    Rejected(String),
}

#[cfg(feature = "webhook")]
impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err)
    }
}

/// Trait for collaborators that deliver assignment notifications.
pub trait AssignmentNotifier: Send + Sync {
    fn assignment_applied(
        &self,
        order: Entity,
        rider: Entity,
        cost_km: f64,
    ) -> Result<(), NotifyError>;
}

/// Resource wrapper for the notifier trait object.
#[derive(Resource)]
pub struct NotifierResource(pub Box<dyn AssignmentNotifier>);

impl NotifierResource {
    pub fn new(notifier: Box<dyn AssignmentNotifier>) -> Self {
        Self(notifier)
    }
}

impl std::ops::Deref for NotifierResource {
    type Target = dyn AssignmentNotifier;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Discards every notification. The default for tests and for deployments
/// where the surrounding system observes assignments through telemetry.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl AssignmentNotifier for NoopNotifier {
    fn assignment_applied(
        &self,
        _order: Entity,
        _rider: Entity,
        _cost_km: f64,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Posts each assignment as JSON to a configured endpoint.
#[cfg(feature = "webhook")]
pub struct WebhookNotifier {
    endpoint: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "webhook")]
impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

#[cfg(feature = "webhook")]
impl AssignmentNotifier for WebhookNotifier {
    fn assignment_applied(
        &self,
        order: Entity,
        rider: Entity,
        cost_km: f64,
    ) -> Result<(), NotifyError> {
        #[derive(serde::Serialize)]
        struct Payload {
            order: u64,
            rider: u64,
            distance_km: f64,
        }

        self.client
            .post(&self.endpoint)
            .json(&Payload {
                order: order.to_bits(),
                rider: rider.to_bits(),
                distance_km: cost_km,
            })
            .send()?
            .error_for_status()?;
        Ok(())
    }
}
