//! Trait seams between the Feuilleton engine and its collaborators.
//!
//! The engine consumes and exposes only narrow function-shaped
//! interfaces: a generation driver, an item store, and optional
//! persistence hooks for summaries and entity updates. Everything
//! behind these traits (providers, databases, sync layers) is outside
//! the engine's scope.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{EntitySink, GenerationDriver, ItemStore, SummarySink};
