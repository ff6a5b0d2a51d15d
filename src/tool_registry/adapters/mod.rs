//! Adapter implementations for the package transport and auth ports.

pub mod memory;

mod router;

pub use memory::{InMemoryAuthProvider, InMemoryPackageTransport};
pub use router::TransportRouter;
