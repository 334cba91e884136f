//! Core data types for the Feuilleton continuity engine.
//!
//! This crate provides the foundation data types shared across the
//! Feuilleton workspace: the work/partition/item hierarchy, the entity
//! model, emotion points, completion requests, scan findings, progress
//! events, and the immutable run configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod emotion;
mod entity;
mod item;
mod progress;
mod request;
mod scan;
mod telemetry;
mod validation;

pub use config::{ContinuityConfig, ContinuityConfigBuilder};
pub use emotion::EmotionPoint;
pub use entity::{Entity, EntityRole, EntityStatus, EntityUpdate, EntityUpdateKind, Relation};
pub use item::{Item, Partition, Work};
pub use progress::{ItemFailure, ItemStatus, ProgressEvent, RunReport};
pub use request::{CallProfile, CompletionRequest, CompletionRequestBuilder};
pub use scan::{AppearanceScan, DeathCandidate, DeathConfidence, Violation};
pub use telemetry::init_telemetry;
pub use validation::{Boundary, IssueKind, Severity, ValidationIssue, ValidationReport};
