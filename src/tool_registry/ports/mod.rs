//! Port contracts for package transports and authentication.

mod auth;
mod transport;

pub use auth::{AuthError, AuthFlow, AuthFlowStatus, AuthProvider, AuthResult};
pub use transport::{PackageTransport, TransportError, TransportResult};
