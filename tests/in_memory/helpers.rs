//! Shared fixtures for gateway integration tests.

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use switchyard::config::GatewaySettings;
use switchyard::gateway::ToolGateway;
use switchyard::tool_registry::{
    adapters::{InMemoryAuthProvider, InMemoryPackageTransport},
    domain::{Package, PackageId, ToolDefinition, TransportConfig},
    services::PackageRegistry,
};

/// Clock whose time only moves when a test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock fixed at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Gateway wired to in-memory adapters.
pub type TestGateway = ToolGateway<InMemoryPackageTransport, InMemoryAuthProvider, ManualClock>;

/// Handles a test needs next to the gateway.
pub struct GatewayHarness {
    /// Transport shared with the gateway.
    pub transport: Arc<InMemoryPackageTransport>,
    /// Auth provider shared with the gateway.
    pub auth: Arc<InMemoryAuthProvider>,
    /// Clock shared with the gateway.
    pub clock: Arc<ManualClock>,
    /// Gateway under test.
    pub gateway: TestGateway,
}

/// Parses a package identifier.
pub fn package_id(value: &str) -> PackageId {
    PackageId::new(value).expect("valid package id")
}

/// `read_file` requires a string `path`.
pub fn read_file_tool() -> ToolDefinition {
    ToolDefinition::new(
        "read_file",
        "Read a file from disk.\nReturns the file content as text.",
        json!({
            "type": "object",
            "required": ["path"],
            "properties": {"path": {"type": "string"}}
        }),
    )
    .expect("valid tool")
}

/// Tool accepting any object.
pub fn open_tool(name: &str) -> ToolDefinition {
    ToolDefinition::new(name, format!("{name} tool"), json!({"type": "object"}))
        .expect("valid tool")
}

/// Builds a gateway over `filesystem`, `search`, `github` (OAuth), `labs`
/// (experimental) and `legacy` (disabled).
pub fn harness_with(settings: GatewaySettings) -> GatewayHarness {
    let stdio = TransportConfig::stdio("mcp-tools").expect("valid transport");
    let http = TransportConfig::http("https://tools.example.com").expect("valid transport");
    let registry = PackageRegistry::new(vec![
        Package::new(package_id("filesystem"), stdio.clone()).with_name("Filesystem"),
        Package::new(package_id("search"), http.clone()),
        Package::new(package_id("github"), http).with_oauth(true),
        Package::new(package_id("labs"), stdio.clone()).with_experimental(true),
        Package::new(package_id("legacy"), stdio).with_disabled(true),
    ])
    .expect("unique packages");

    let transport = Arc::new(InMemoryPackageTransport::new());
    transport
        .set_tool_catalog(
            &package_id("filesystem"),
            vec![read_file_tool(), open_tool("write_file"), open_tool("list_dir")],
        )
        .expect("catalog stored");
    transport
        .set_tool_catalog(&package_id("search"), vec![open_tool("query")])
        .expect("catalog stored");
    transport
        .set_tool_catalog(&package_id("github"), vec![open_tool("create_issue")])
        .expect("catalog stored");

    let auth = Arc::new(InMemoryAuthProvider::new());
    let clock = Arc::new(ManualClock::new());
    let gateway = ToolGateway::new(
        Arc::new(registry),
        Arc::clone(&transport),
        Arc::clone(&auth),
        Arc::clone(&clock),
        settings,
    );

    GatewayHarness {
        transport,
        auth,
        clock,
        gateway,
    }
}

/// Builds a gateway with default settings.
#[fixture]
pub fn harness() -> GatewayHarness {
    harness_with(GatewaySettings::default())
}
