//! Feuilleton - Continuity Orchestration for Serialized Generation
//!
//! Feuilleton drives an external large language model through the
//! generation of serialized long-form works whose total length far
//! exceeds any single context window. The caller brings a
//! [`GenerationDriver`] (the model call) and an [`ItemStore`] (where
//! bodies land); Feuilleton supplies the ordering, the memory, and the
//! consistency checks:
//!
//! - **Sequencer**: walks items in chronological order across partition
//!   boundaries, resumes mid-work, and separates fatal from
//!   skip-and-continue failures
//! - **Rolling summary**: a bounded synopsis refreshed on a cadence, on
//!   major plot events, and at every partition transition
//! - **Entity registry**: tracks recurring characters, records deaths,
//!   and hard-excludes deceased ones from future prompts
//! - **Boundary validator**: flags outlines that re-narrate finished
//!   events or leak the next partition's opening
//! - **Pacing analyzer**: scores emotional intensity per item and
//!   steers the next prompt away from monotony
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use feuilleton::{ContinuityConfig, Sequencer};
//!
//! #[tokio::main]
//! async fn main() -> feuilleton::FeuilletonResult<()> {
//!     let config = ContinuityConfig::load()?;
//!     let sequencer = Sequencer::new(driver, store, config);
//!     let report = sequencer
//!         .run(&work, &partitions, items, entities, None)
//!         .await?;
//!     println!("{} items written", report.completed_count);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Feuilleton is organized as a workspace with focused crates:
//!
//! - `feuilleton_core` - Data types (items, entities, config, reports)
//! - `feuilleton_interface` - Driver and store trait definitions
//! - `feuilleton_error` - Error types
//! - `feuilleton_continuity` - The orchestration engine
//!
//! This crate (`feuilleton`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use feuilleton_continuity::*;
pub use feuilleton_core::*;
pub use feuilleton_error::*;
pub use feuilleton_interface::*;
