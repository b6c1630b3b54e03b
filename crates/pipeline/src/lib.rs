//! Dispatch pipeline: compile service, generation orchestrator, usage
//! accounting, and process configuration.
//!
//! Wiring happens at the binary layer: construct a [`Compiler`] over the
//! upstream providers, an [`EngineRegistry`](reelforge_engines::EngineRegistry)
//! from [`PipelineConfig::engine_config`], and hand both to the
//! [`GenerationOrchestrator`].

pub mod compile;
pub mod config;
pub mod orchestrator;
pub mod usage;

pub use compile::Compiler;
pub use config::PipelineConfig;
pub use orchestrator::{DispatchError, DispatchOutcome, GenerationOrchestrator};
pub use usage::{usage_cost, TracingUsageLogger};
