//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod generation_repo;
pub mod shot_repo;

pub use generation_repo::GenerationRepo;
pub use shot_repo::ShotRepo;
