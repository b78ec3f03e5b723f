//! Core types and decision logic for the skipwatch waste-bin fleet monitor.

/// Alert detection rules over a bin snapshot.
pub mod alerts;
/// Seedable demo-fleet generation.
pub mod demo;
/// Domain models shared by all storage backends.
pub mod model;
/// Traits describing the storage and estimator interfaces.
pub mod ports;
/// Overflow prediction and risk assessment.
pub mod predict;
/// Collection-route planning and navigation estimates.
pub mod route;
/// Priority scoring and status derivation.
pub mod scoring;
/// High-level service facade used by clients.
pub mod service;
/// Aggregate fleet statistics.
pub mod stats;

pub use model::*;
pub use ports::*;
pub use service::*;
