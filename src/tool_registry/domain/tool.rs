//! Tool definition and catalog tool value objects.

use super::{SchemaHash, ToolRegistryDomainError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool metadata as reported by a package transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_schema: Option<Value>,
}

impl ToolDefinition {
    /// Creates a tool definition with an input schema.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyToolName`] when the name is
    /// empty after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Result<Self, ToolRegistryDomainError> {
        Ok(Self::schemaless(name, description)?.with_input_schema(input_schema))
    }

    /// Creates a tool definition that declares no input schema.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyToolName`] when the name is
    /// empty after trimming.
    pub fn schemaless(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ToolRegistryDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(ToolRegistryDomainError::EmptyToolName);
        }

        Ok(Self {
            name: normalized_name,
            description: description.into().trim().to_owned(),
            input_schema: None,
            output_schema: None,
        })
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = Some(input_schema);
        self
    }

    /// Sets an optional output schema.
    #[must_use]
    pub fn with_output_schema(mut self, output_schema: Value) -> Self {
        self.output_schema = Some(output_schema);
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema, if declared.
    #[must_use]
    pub const fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    /// Returns the optional output schema.
    #[must_use]
    pub const fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }
}

/// A tool as held in a package catalog, paired with its schema fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tool {
    #[serde(flatten)]
    definition: ToolDefinition,
    schema_hash: SchemaHash,
}

impl Tool {
    /// Wraps a discovered definition, fingerprinting its input schema.
    #[must_use]
    pub fn from_definition(definition: ToolDefinition) -> Self {
        let schema_hash = SchemaHash::compute(definition.input_schema());
        Self {
            definition,
            schema_hash,
        }
    }

    /// Returns the underlying definition.
    #[must_use]
    pub const fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.definition.description()
    }

    /// Returns the input schema, if declared.
    #[must_use]
    pub const fn input_schema(&self) -> Option<&Value> {
        self.definition.input_schema()
    }

    /// Returns the schema fingerprint.
    #[must_use]
    pub const fn schema_hash(&self) -> &SchemaHash {
        &self.schema_hash
    }
}
