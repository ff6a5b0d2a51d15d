//! JSON Schema compilation cache and argument validation.

use super::{FieldError, ValidationError};
use crate::tool_registry::domain::{SchemaHash, Tool};
use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Validates tool arguments against declared input schemas.
///
/// Compiled validators are cached by [`SchemaHash`], so repeated calls
/// against the same tool contract compile the schema once. Validation runs
/// in all-errors mode.
#[derive(Default)]
pub struct SchemaValidator {
    compiled: RwLock<HashMap<SchemaHash, Arc<Validator>>>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SchemaValidator")
            .field("compiled", &self.compiled_count())
            .finish()
    }
}

impl SchemaValidator {
    /// Creates a validator with an empty compilation cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `data` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingSchema`] when `schema` is `None`,
    /// [`ValidationError::SchemaInvalid`] when it does not compile, and
    /// [`ValidationError::Violations`] listing every violation otherwise.
    pub fn validate(&self, schema: Option<&Value>, data: &Value) -> Result<(), ValidationError> {
        let Some(schema) = schema else {
            return Err(ValidationError::MissingSchema);
        };
        let hash = SchemaHash::compute(Some(schema));
        self.validate_compiled(&hash, schema, data)
    }

    /// Validates `data` against a catalog tool, reusing its fingerprint.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate`].
    pub fn validate_tool(&self, tool: &Tool, data: &Value) -> Result<(), ValidationError> {
        let Some(schema) = tool.input_schema() else {
            return Err(ValidationError::MissingSchema);
        };
        self.validate_compiled(tool.schema_hash(), schema, data)
    }

    /// Returns the number of cached compiled schemas.
    #[must_use]
    pub fn compiled_count(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn validate_compiled(
        &self,
        hash: &SchemaHash,
        schema: &Value,
        data: &Value,
    ) -> Result<(), ValidationError> {
        let validator = self.compiled(hash, schema)?;
        let errors = validator
            .iter_errors(data)
            .map(|error| field_error(&error))
            .collect::<Vec<_>>();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Violations(errors))
        }
    }

    fn compiled(&self, hash: &SchemaHash, schema: &Value) -> Result<Arc<Validator>, ValidationError> {
        if let Some(existing) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
        {
            return Ok(Arc::clone(existing));
        }

        debug!(schema_hash = %hash, "compiling input schema");
        let validator = Arc::new(compile_schema(schema)?);
        let mut cache = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(hash.clone()).or_insert(validator)))
    }
}

/// Compiles a schema with format assertions enabled.
///
/// Unknown formats and custom keywords are ignored rather than rejected.
fn compile_schema(schema: &Value) -> Result<Validator, ValidationError> {
    jsonschema::options()
        .should_validate_formats(true)
        .build(schema)
        .map_err(|err| ValidationError::SchemaInvalid {
            reason: err.to_string(),
        })
}

fn field_error(error: &jsonschema::ValidationError<'_>) -> FieldError {
    let schema_path = error.schema_path().to_string();
    let keyword = schema_path
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("schema")
        .to_owned();

    let mut path = error.instance_path().to_string();
    if let ValidationErrorKind::Required { property } = error.kind()
        && let Some(name) = property.as_str()
    {
        path.push('/');
        path.push_str(&name.replace('~', "~0").replace('/', "~1"));
    }

    FieldError::new(path, error.to_string(), keyword)
}
