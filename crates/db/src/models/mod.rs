//! Row structs and DTOs.

pub mod generation;
pub mod shot;

pub use generation::{CreateGeneration, GenerationRow};
pub use shot::{FilmRow, ShotRow};
