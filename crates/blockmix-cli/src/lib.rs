//! blockmix CLI library.
//!
//! Holds everything the `blockmix` binary drives: the mix plan, the block
//! orchestrator, the scoped profiler and the command implementations.

pub mod commands;
pub mod engine;
pub mod plan;
pub mod profile;

pub use engine::{EngineError, MixEngine, MixSummary};
pub use plan::{InputSpec, MixPlan, OutputSpec, Pipeline, PlanError};
pub use profile::{Profiler, ScopeReport};
