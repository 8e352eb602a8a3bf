//! Internal implementation modules for `syncker-core`.
//!
//! Callers should go through the re-exports at the crate root.

pub mod commands;
pub mod config;
pub mod drive;
pub mod effects;
pub mod facade;
pub mod store;
pub mod sync;
pub mod tooling;
