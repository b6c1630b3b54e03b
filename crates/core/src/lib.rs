//! Domain logic for the generation compilation engine.
//!
//! Everything in this crate is pure: the payload compiler, the safety-tier
//! derivation, the anachronism lookup table, and the content fingerprint are
//! all functions of their inputs with no I/O. The only async items are the
//! collaborator traits in [`providers`], which describe the seams to the
//! upstream screenplay pipeline, the blob store, and the generation store.

pub mod anachronism;
pub mod compiler;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod payload;
pub mod providers;
pub mod safety;
pub mod shot;
pub mod style;
pub mod types;
