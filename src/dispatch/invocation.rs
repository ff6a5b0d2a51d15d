//! Invocation requests, per-call results and single-call outcomes.

use crate::error::{ErrorPayload, GatewayError};
use crate::tool_registry::domain::SchemaHash;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// One tool call addressed by package and tool name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Target package identifier.
    pub package_id: String,
    /// Target tool name.
    pub tool_id: String,
    /// Tool arguments; `null` is treated as an empty object.
    #[serde(default = "empty_arguments")]
    pub args: Value,
    /// Validate only, never contact the package.
    #[serde(default)]
    pub dry_run: bool,
}

fn empty_arguments() -> Value {
    Value::Object(Map::new())
}

impl Invocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(package_id: impl Into<String>, tool_id: impl Into<String>, args: Value) -> Self {
        Self {
            package_id: package_id.into(),
            tool_id: tool_id.into(),
            args,
            dry_run: false,
        }
    }

    /// Turns the invocation into a validation-only dry run.
    #[must_use]
    pub const fn dry(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Returns the arguments to validate and forward.
    #[must_use]
    pub fn arguments(&self) -> Value {
        if self.args.is_null() {
            empty_arguments()
        } else {
            self.args.clone()
        }
    }
}

/// Successful result of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeOutcome {
    /// The package's result, unmodified.
    Completed(Value),
    /// A dry run whose arguments passed validation.
    Validated {
        /// Package identifier.
        package_id: String,
        /// Tool name.
        tool_id: String,
        /// Fingerprint of the schema the arguments were checked against.
        schema_hash: SchemaHash,
    },
}

impl InvokeOutcome {
    /// Renders the outcome as the JSON returned to callers.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Completed(value) => value,
            Self::Validated {
                package_id,
                tool_id,
                schema_hash,
            } => json!({
                "dry_run": true,
                "valid": true,
                "package_id": package_id,
                "tool_id": tool_id,
                "schema_hash": schema_hash,
            }),
        }
    }
}

/// Result slot for one invocation of a batch.
///
/// Exactly one of `value` and `error` is present, matching `ok`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult {
    index: usize,
    package_id: String,
    tool_id: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorPayload>,
}

impl InvocationResult {
    /// Records a successful invocation.
    #[must_use]
    pub fn succeeded(index: usize, invocation: &Invocation, value: Value) -> Self {
        Self {
            index,
            package_id: invocation.package_id.clone(),
            tool_id: invocation.tool_id.clone(),
            ok: true,
            value: Some(value),
            error: None,
        }
    }

    /// Records a failed invocation.
    #[must_use]
    pub fn failed(index: usize, invocation: &Invocation, error: &GatewayError) -> Self {
        Self {
            index,
            package_id: invocation.package_id.clone(),
            tool_id: invocation.tool_id.clone(),
            ok: false,
            value: None,
            error: Some(error.to_payload()),
        }
    }

    /// Position of the invocation in the batch input.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Target package identifier as requested.
    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// Target tool name as requested.
    #[must_use]
    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    /// Whether the invocation succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// Result value, present on success.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Error payload, present on failure.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorPayload> {
        self.error.as_ref()
    }
}
