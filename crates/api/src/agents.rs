//! Agent wiring: the JSON manifest and the built-in energy demo set.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use agent_core::{Agent, AgentDescriptor, AgentError};
use mock_agent::EchoAgent;
use orchestrator::{AgentRegistry, RegistryError};
use remote_agent::{HttpAgent, HttpAgentConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// One agent as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub backend: BackendSpec,
}

/// Which backend answers for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSpec {
    /// An agent hosted on the remote agent runtime.
    Http { agent_id: String, alias_id: String },
    /// Replies with the user's input. For local runs.
    Echo,
}

/// Errors while assembling the agent registry.
#[derive(Debug, Error)]
pub enum AgentsError {
    #[error("Failed to read agent manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid agent manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("Agent runtime is not configured but {0} uses an http backend")]
    MissingRuntime(String),

    #[error(transparent)]
    Backend(#[from] AgentError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Parse a manifest: a JSON array of agent entries.
pub fn parse_manifest(json: &str) -> Result<Vec<AgentEntry>, AgentsError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<AgentEntry>, AgentsError> {
    let json = fs::read_to_string(path).map_err(|source| AgentsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let entries = parse_manifest(&json)?;
    info!(path = %path.display(), agents = entries.len(), "Loaded agent manifest");
    Ok(entries)
}

/// Whether any entry needs the remote agent runtime.
pub fn requires_runtime(entries: &[AgentEntry]) -> bool {
    entries
        .iter()
        .any(|entry| matches!(entry.backend, BackendSpec::Http { .. }))
}

/// The three energy agents, with remote ids and aliases from the environment.
///
/// Reads `ENERGY_FORECAST_AGENT_ID`/`_ALIAS_ID`, `SOLAR_PANEL_AGENT_ID`/`_ALIAS_ID`
/// and `PEAK_LOAD_MANAGER_AGENT_ID`/`_ALIAS_ID` (`PEAK_LOAD_AGENT_ID`/`_ALIAS_ID`
/// are accepted too).
pub fn energy_entries_from_env() -> Result<Vec<AgentEntry>, AgentsError> {
    Ok(vec![
        AgentEntry {
            id: "energy-forecast-agent".to_string(),
            name: "Energy Forecast Agent".to_string(),
            description: "Delegate energy consumption analysis and forecasting tasks to the \
                Forecasting Agent, ensuring adherence to its specific protocols and capabilities."
                .to_string(),
            backend: BackendSpec::Http {
                agent_id: required_var(&["ENERGY_FORECAST_AGENT_ID"])?,
                alias_id: required_var(&["ENERGY_FORECAST_AGENT_ALIAS_ID"])?,
            },
        },
        AgentEntry {
            id: "solar-panel-agent".to_string(),
            name: "Solar Panel Agent".to_string(),
            description: "Assign solar panel-related inquiries and issues to the Solar Panel \
                Agent, respecting its scope and support ticket protocol."
                .to_string(),
            backend: BackendSpec::Http {
                agent_id: required_var(&["SOLAR_PANEL_AGENT_ID"])?,
                alias_id: required_var(&["SOLAR_PANEL_AGENT_ALIAS_ID"])?,
            },
        },
        AgentEntry {
            id: "peak-load-manager-agent".to_string(),
            name: "Peak Load Manager Agent".to_string(),
            description: "Direct peak load management and energy optimization tasks to the \
                Peak Load Manager Agent, leveraging its analytical capabilities."
                .to_string(),
            backend: BackendSpec::Http {
                agent_id: required_var(&["PEAK_LOAD_MANAGER_AGENT_ID", "PEAK_LOAD_AGENT_ID"])?,
                alias_id: required_var(&[
                    "PEAK_LOAD_MANAGER_AGENT_ALIAS_ID",
                    "PEAK_LOAD_AGENT_ALIAS_ID",
                ])?,
            },
        },
    ])
}

/// Build the registry, creating one backend per entry in manifest order.
pub fn build_registry(
    entries: Vec<AgentEntry>,
    runtime: Option<&HttpAgentConfig>,
) -> Result<AgentRegistry, AgentsError> {
    let mut builder = AgentRegistry::builder();
    for entry in entries {
        let backend: Arc<dyn Agent> = match entry.backend {
            BackendSpec::Http { agent_id, alias_id } => {
                let config = runtime.ok_or_else(|| AgentsError::MissingRuntime(entry.id.clone()))?;
                Arc::new(HttpAgent::new(config.clone(), agent_id, alias_id)?)
            }
            BackendSpec::Echo => Arc::new(EchoAgent::new()),
        };
        builder = builder.register(
            AgentDescriptor::new(entry.id, entry.name, entry.description),
            backend,
        )?;
    }
    Ok(builder.build()?)
}

/// First non-empty value among `keys`.
fn required_var(keys: &[&'static str]) -> Result<String, AgentsError> {
    keys.iter()
        .find_map(|key| env::var(key).ok().filter(|value| !value.trim().is_empty()))
        .ok_or(AgentsError::MissingVar(keys[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENERGY_VARS: [&str; 8] = [
        "ENERGY_FORECAST_AGENT_ID",
        "ENERGY_FORECAST_AGENT_ALIAS_ID",
        "SOLAR_PANEL_AGENT_ID",
        "SOLAR_PANEL_AGENT_ALIAS_ID",
        "PEAK_LOAD_MANAGER_AGENT_ID",
        "PEAK_LOAD_MANAGER_AGENT_ALIAS_ID",
        "PEAK_LOAD_AGENT_ID",
        "PEAK_LOAD_AGENT_ALIAS_ID",
    ];

    const MANIFEST: &str = r#"[
        {"id": "solar", "name": "Solar Panel Agent", "description": "Solar questions",
         "backend": {"kind": "http", "agent_id": "SOLAR123", "alias_id": "ALIAS1"}},
        {"id": "echo", "name": "Echo Agent", "description": "Repeats you",
         "backend": {"kind": "echo"}}
    ]"#;

    #[test]
    fn test_parse_manifest() {
        let entries = parse_manifest(MANIFEST).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].backend,
            BackendSpec::Http {
                agent_id: "SOLAR123".to_string(),
                alias_id: "ALIAS1".to_string(),
            }
        );
        assert_eq!(entries[1].backend, BackendSpec::Echo);
        assert!(requires_runtime(&entries));
        assert!(!requires_runtime(&entries[1..]));
    }

    #[test]
    fn test_parse_manifest_rejects_unknown_backend() {
        let json = r#"[{"id": "x", "name": "X", "description": "x", "backend": {"kind": "grpc"}}]"#;
        assert!(matches!(parse_manifest(json), Err(AgentsError::Parse(_))));
    }

    #[test]
    fn test_build_registry() {
        let entries = parse_manifest(MANIFEST).unwrap();
        let runtime = HttpAgentConfig::new("http://127.0.0.1:9");
        let registry = build_registry(entries, Some(&runtime)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.default_agent().id(), "solar");
        assert_eq!(registry.get("solar").unwrap().backend().kind(), "http");
        assert_eq!(registry.get("echo").unwrap().backend().kind(), "echo");
    }

    #[test]
    fn test_build_registry_needs_runtime_for_http() {
        let entries = parse_manifest(MANIFEST).unwrap();
        let err = build_registry(entries, None).unwrap_err();
        assert!(matches!(err, AgentsError::MissingRuntime(ref id) if id == "solar"));
    }

    #[test]
    fn test_build_registry_rejects_duplicates() {
        let json = r#"[
            {"id": "a", "name": "A", "description": "a", "backend": {"kind": "echo"}},
            {"id": "a", "name": "B", "description": "b", "backend": {"kind": "echo"}}
        ]"#;
        let err = build_registry(parse_manifest(json).unwrap(), None).unwrap_err();
        assert!(matches!(err, AgentsError::Registry(RegistryError::DuplicateId(_))));
    }

    #[test]
    fn test_energy_entries_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in ENERGY_VARS {
            env::remove_var(key);
        }

        assert!(matches!(
            energy_entries_from_env(),
            Err(AgentsError::MissingVar("ENERGY_FORECAST_AGENT_ID"))
        ));

        env::set_var("ENERGY_FORECAST_AGENT_ID", "FORECAST1");
        env::set_var("ENERGY_FORECAST_AGENT_ALIAS_ID", "FA1");
        env::set_var("SOLAR_PANEL_AGENT_ID", "SOLAR1");
        env::set_var("SOLAR_PANEL_AGENT_ALIAS_ID", "SA1");
        env::set_var("PEAK_LOAD_AGENT_ID", "PEAK1");
        env::set_var("PEAK_LOAD_AGENT_ALIAS_ID", "PA1");

        let entries = energy_entries_from_env().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["Energy Forecast Agent", "Solar Panel Agent", "Peak Load Manager Agent"]
        );
        assert_eq!(
            entries[2].backend,
            BackendSpec::Http {
                agent_id: "PEAK1".to_string(),
                alias_id: "PA1".to_string(),
            }
        );

        // The long name wins over the short one.
        env::set_var("PEAK_LOAD_MANAGER_AGENT_ID", "PEAK2");
        let entries = energy_entries_from_env().unwrap();
        assert!(matches!(
            &entries[2].backend,
            BackendSpec::Http { agent_id, .. } if agent_id == "PEAK2"
        ));

        for key in ENERGY_VARS {
            env::remove_var(key);
        }
    }
}
