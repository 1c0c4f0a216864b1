//! Algorithm execution orchestrator with a real-time step broadcast hub.
//!
//! Algorithms run synchronously and report every visualizable state
//! transition as an [`ExecutionStep`](core::types::ExecutionStep). The
//! orchestrator runs each execution on its own blocking task and forwards its
//! steps, wrapped in [`Envelope`](envelope::Envelope)s, to the [`hub`], which
//! fans them out to every connected subscriber without ever blocking.
//!
//! - **[`core`]**: Pure data model (descriptors, parameters, steps, execution
//!   contexts). No I/O, no async.
//! - **[`algorithms`]**: Built-in [`Executor`](executor::Executor)
//!   implementations.
//! - **[`io`]**: File-backed configuration.
//!
//! [`registry`], [`orchestrator`] and [`hub`] wire those pieces together; the
//! HTTP and WebSocket surface lives in the `algoviz-server` binary.

pub mod algorithms;
pub mod core;
pub mod envelope;
pub mod executor;
pub mod hub;
pub mod io;
pub mod logging;
pub mod orchestrator;
pub mod registry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
