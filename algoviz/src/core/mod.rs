//! Deterministic, pure types shared by the engine.
//!
//! Core modules are free of I/O and task spawning. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod budget;
pub mod context;
pub mod params;
pub mod types;
