//! In-memory adapters for package transport and authentication ports.

mod auth;
mod transport;

pub use auth::InMemoryAuthProvider;
pub use transport::{InMemoryPackageTransport, RecordedInvocation, ScriptedResponse};
