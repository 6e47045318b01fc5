pub mod assignment;
pub mod clock;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod geo;
pub mod notify;
pub mod runner;
pub mod setup;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
