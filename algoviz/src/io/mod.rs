//! File-backed inputs for the service.

pub mod config;
