//! Argument validation against tool input schemas.
//!
//! [`SchemaValidator`] compiles each distinct schema once and reports every
//! violation as a [`FieldError`] addressed by JSON Pointer.

mod error;
mod schema;

pub use error::{FieldError, ValidationError};
pub use schema::SchemaValidator;
