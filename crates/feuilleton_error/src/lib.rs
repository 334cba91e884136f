//! Error types for the Feuilleton continuity engine.
//!
//! This crate provides the foundation error types used throughout the
//! Feuilleton workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use feuilleton_error::{FeuilletonResult, StoreError};
//!
//! fn persist_body() -> FeuilletonResult<()> {
//!     Err(StoreError::new("Connection refused"))?
//! }
//!
//! match persist_body() {
//!     Ok(()) => println!("Persisted"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod generation;
mod sequence;
mod store;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{FeuilletonError, FeuilletonErrorKind, FeuilletonResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use sequence::{SequenceError, SequenceErrorKind};
pub use store::StoreError;
