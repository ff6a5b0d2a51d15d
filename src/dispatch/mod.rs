//! Invocation routing: lookup, validation and forwarding to packages.
//!
//! [`Dispatcher::invoke`] runs one call; [`Dispatcher::invoke_many`] runs a
//! batch with bounded concurrency, an outer deadline and per-call isolation.

mod dispatcher;
mod invocation;

pub use dispatcher::Dispatcher;
pub use invocation::{Invocation, InvocationResult, InvokeOutcome};
