//! Engine adapters for external generation backends.
//!
//! Backends are unreliable, rate-limited, and commercially varied, so every
//! vendor integration lives behind the [`adapter::EngineAdapter`] trait and
//! normalizes its failures to [`error::EngineError`]. The orchestrator never
//! sees a vendor's request/response shapes.
//!
//! The [`stub::StubEngine`] is not a test-only convenience: it is the default
//! fallback whenever no vendor credentials are configured, so the system
//! degrades to deterministic placeholders instead of crashing.

pub mod adapter;
pub mod encode;
pub mod error;
pub mod gemini;
pub mod http;
pub mod registry;
pub mod stub;

pub use adapter::{EngineAdapter, EngineResult, ReferenceBundle};
pub use error::EngineError;
pub use registry::{EngineConfig, EngineRegistry};
