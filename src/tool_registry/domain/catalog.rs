//! Cached per-package tool catalog and its paginated views.

use super::{PackageId, SchemaHash, Tool};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Length of the catalog revision embedded in page tokens.
const REVISION_LENGTH: usize = 12;

/// Maximum description length in summarised listings.
const SUMMARY_DESCRIPTION_LIMIT: usize = 160;

/// Fully populated tool catalog for one package.
///
/// An entry is only ever built from a complete discovery response; partial
/// catalogs are never represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    tools: Vec<Tool>,
    fetched_at: DateTime<Utc>,
    revision: String,
}

impl CatalogEntry {
    /// Creates an entry from tools in downstream order.
    #[must_use]
    pub fn new(tools: Vec<Tool>, fetched_at: DateTime<Utc>) -> Self {
        let fingerprint = tools
            .iter()
            .map(|tool| format!("{}\u{0}{}\n", tool.name(), tool.schema_hash()))
            .collect::<String>();
        let revision = SchemaHash::from_bytes(fingerprint.as_bytes())
            .as_str()
            .chars()
            .take(REVISION_LENGTH)
            .collect();

        Self {
            tools,
            fetched_at,
            revision,
        }
    }

    /// Returns the tools in downstream order.
    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Returns the discovery timestamp.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns the short digest over tool names and schema hashes.
    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the package exposes no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Finds a tool by name.
    #[must_use]
    pub fn find(&self, tool_name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name() == tool_name)
    }

    /// Returns whether the entry is still within `ttl` at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }

    /// Builds one page of summaries starting at the cursor in `page_token`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPageToken`] when the token is malformed, points past
    /// the end of the catalog, or was issued for a different revision.
    pub fn page(
        &self,
        package_id: &PackageId,
        page_token: Option<&str>,
        page_size: usize,
        view: SummaryView,
    ) -> Result<ToolPage, InvalidPageToken> {
        let offset = match page_token {
            Some(token) => self.resolve_cursor(token)?,
            None => 0,
        };

        let tools = self
            .tools
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|tool| ToolSummary::from_tool(tool, view))
            .collect::<Vec<_>>();

        let next_offset = offset.saturating_add(tools.len());
        let next_page_token = (next_offset < self.tools.len()).then(|| {
            PageCursor {
                offset: next_offset,
                revision: self.revision.clone(),
            }
            .encode()
        });

        Ok(ToolPage {
            package_id: package_id.clone(),
            tools,
            next_page_token,
            total: self.tools.len(),
        })
    }

    fn resolve_cursor(&self, token: &str) -> Result<usize, InvalidPageToken> {
        let cursor = PageCursor::parse(token)
            .ok_or_else(|| InvalidPageToken::new(token, "token is malformed"))?;
        if cursor.revision != self.revision {
            return Err(InvalidPageToken::new(
                token,
                "token was issued for a different catalog revision",
            ));
        }
        if cursor.offset > self.tools.len() {
            return Err(InvalidPageToken::new(
                token,
                "token points past the end of the catalog",
            ));
        }
        Ok(cursor.offset)
    }
}

/// Position in a cached catalog, encoded as `<offset>.<revision>`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageCursor {
    offset: usize,
    revision: String,
}

impl PageCursor {
    fn encode(&self) -> String {
        format!("{}.{}", self.offset, self.revision)
    }

    fn parse(token: &str) -> Option<Self> {
        let (offset, revision) = token.trim().split_once('.')?;
        if revision.is_empty() {
            return None;
        }
        Some(Self {
            offset: offset.parse().ok()?,
            revision: revision.to_owned(),
        })
    }
}

/// Error returned for page tokens that cannot be honoured.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid page token '{token}': {reason}")]
pub struct InvalidPageToken {
    /// The rejected token.
    pub token: String,
    /// Why the token was rejected.
    pub reason: String,
}

impl InvalidPageToken {
    fn new(token: &str, reason: &str) -> Self {
        Self {
            token: token.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

/// Caller options for `list_tools`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListToolsOptions {
    /// Maximum tools per page; defaults to the gateway setting.
    pub page_size: Option<usize>,
    /// Opaque cursor returned by a previous page.
    pub page_token: Option<String>,
    /// Trim descriptions for compact display.
    pub summarize: bool,
    /// Include full input and output schemas rather than skeletons.
    pub include_schemas: bool,
}

impl ListToolsOptions {
    /// Returns the rendering switches for summaries.
    #[must_use]
    pub const fn view(&self) -> SummaryView {
        SummaryView {
            summarize: self.summarize,
            include_schemas: self.include_schemas,
        }
    }
}

/// Rendering switches applied to each [`ToolSummary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryView {
    /// Trim descriptions to their first line.
    pub summarize: bool,
    /// Include full schemas.
    pub include_schemas: bool,
}

/// Compact listing form of a catalog tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    /// Tool name, unique within its package.
    pub name: String,
    /// Tool description, possibly trimmed.
    pub description: String,
    /// Fingerprint of the full input schema.
    pub schema_hash: SchemaHash,
    /// Full input schema or its skeleton.
    pub input_schema: Value,
    /// Output schema, present only when full schemas are requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl ToolSummary {
    /// Renders a catalog tool under the given view.
    #[must_use]
    pub fn from_tool(tool: &Tool, view: SummaryView) -> Self {
        let description = if view.summarize {
            summarize_description(tool.description())
        } else {
            tool.description().to_owned()
        };

        let (input_schema, output_schema) = if view.include_schemas {
            (
                tool.input_schema().cloned().unwrap_or(Value::Null),
                tool.definition().output_schema().cloned(),
            )
        } else {
            (schema_skeleton(tool.input_schema()), None)
        };

        Self {
            name: tool.name().to_owned(),
            description,
            schema_hash: tool.schema_hash().clone(),
            input_schema,
            output_schema,
        }
    }
}

/// One page of a package's tool listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPage {
    /// Package the tools belong to.
    pub package_id: PackageId,
    /// Tool summaries in catalog order.
    pub tools: Vec<ToolSummary>,
    /// Cursor for the next page, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Total number of tools in the catalog.
    pub total: usize,
}

fn summarize_description(description: &str) -> String {
    let first_line = description.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() <= SUMMARY_DESCRIPTION_LIMIT {
        return first_line.to_owned();
    }
    let mut trimmed = first_line
        .chars()
        .take(SUMMARY_DESCRIPTION_LIMIT.saturating_sub(3))
        .collect::<String>();
    trimmed.push_str("...");
    trimmed
}

/// Reduces a schema to `type`, `required` and per-property `type`.
fn schema_skeleton(schema: Option<&Value>) -> Value {
    let Some(Value::Object(source)) = schema else {
        return Value::Object(Map::new());
    };

    let mut skeleton = Map::new();
    for key in ["type", "required"] {
        if let Some(value) = source.get(key) {
            skeleton.insert(key.to_owned(), value.clone());
        }
    }

    if let Some(Value::Object(properties)) = source.get("properties") {
        let reduced = properties
            .iter()
            .map(|(name, property)| {
                let mut field = Map::new();
                if let Some(kind) = property.get("type") {
                    field.insert("type".to_owned(), kind.clone());
                }
                (name.clone(), Value::Object(field))
            })
            .collect::<Map<_, _>>();
        skeleton.insert("properties".to_owned(), Value::Object(reduced));
    }

    Value::Object(skeleton)
}
