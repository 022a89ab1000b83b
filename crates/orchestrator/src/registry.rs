//! The static set of agents available for routing.

use std::fmt;
use std::sync::Arc;

use agent_core::{Agent, AgentDescriptor};
use indexmap::IndexMap;
use tracing::info;

use crate::error::RegistryError;

/// A descriptor paired with the backend that answers for it.
#[derive(Clone)]
pub struct RegisteredAgent {
    descriptor: AgentDescriptor,
    backend: Arc<dyn Agent>,
}

impl RegisteredAgent {
    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn backend(&self) -> &Arc<dyn Agent> {
        &self.backend
    }
}

impl fmt::Debug for RegisteredAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAgent")
            .field("descriptor", &self.descriptor)
            .field("backend", &self.backend.kind())
            .finish()
    }
}

/// Collects agents during startup.
#[derive(Debug, Default)]
pub struct AgentRegistryBuilder {
    agents: IndexMap<String, RegisteredAgent>,
}

impl AgentRegistryBuilder {
    /// Add an agent. Ids must be unique.
    pub fn register(
        mut self,
        descriptor: AgentDescriptor,
        backend: Arc<dyn Agent>,
    ) -> Result<Self, RegistryError> {
        if self.agents.contains_key(&descriptor.id) {
            return Err(RegistryError::DuplicateId(descriptor.id));
        }
        self.agents.insert(
            descriptor.id.clone(),
            RegisteredAgent {
                descriptor,
                backend,
            },
        );
        Ok(self)
    }

    /// Freeze the registry. At least one agent is required.
    pub fn build(self) -> Result<AgentRegistry, RegistryError> {
        if self.agents.is_empty() {
            return Err(RegistryError::Empty);
        }
        for agent in self.agents.values() {
            info!(
                agent_id = %agent.id(),
                name = %agent.name(),
                backend = agent.backend.kind(),
                "Registered agent"
            );
        }
        Ok(AgentRegistry {
            agents: self.agents,
        })
    }
}

/// Immutable, ordered set of agents. The first registered agent is the
/// default fallback target.
#[derive(Debug)]
pub struct AgentRegistry {
    agents: IndexMap<String, RegisteredAgent>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<&AgentDescriptor> {
        self.agents.values().map(RegisteredAgent::descriptor).collect()
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Result<&RegisteredAgent, RegistryError> {
        self.find(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Look up an agent by id, returning `None` when absent.
    pub fn find(&self, id: &str) -> Option<&RegisteredAgent> {
        self.agents.get(id)
    }

    /// Case-insensitive lookup by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&RegisteredAgent> {
        self.agents
            .values()
            .find(|agent| agent.name().eq_ignore_ascii_case(name))
    }

    /// The fallback target: the first registered agent.
    pub fn default_agent(&self) -> &RegisteredAgent {
        // Non-empty by construction.
        &self.agents[0]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAgent> {
        self.agents.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_agent::EchoAgent;

    fn descriptor(id: &str, name: &str) -> AgentDescriptor {
        AgentDescriptor::new(id, name, format!("handles {}", id))
    }

    fn energy_registry() -> AgentRegistry {
        AgentRegistry::builder()
            .register(descriptor("forecast", "Energy Forecast Agent"), Arc::new(EchoAgent::new()))
            .unwrap()
            .register(descriptor("solar", "Solar Panel Agent"), Arc::new(EchoAgent::new()))
            .unwrap()
            .register(descriptor("peak", "Peak Load Manager Agent"), Arc::new(EchoAgent::new()))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let registry = energy_registry();
        let ids: Vec<&str> = registry.list().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["forecast", "solar", "peak"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.default_agent().id(), "forecast");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = AgentRegistry::builder()
            .register(descriptor("solar", "Solar"), Arc::new(EchoAgent::new()))
            .unwrap()
            .register(descriptor("solar", "Other"), Arc::new(EchoAgent::new()));

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateId("solar".to_string())
        );
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert_eq!(
            AgentRegistry::builder().build().unwrap_err(),
            RegistryError::Empty
        );
    }

    #[test]
    fn test_lookup() {
        let registry = energy_registry();
        assert_eq!(registry.get("peak").unwrap().name(), "Peak Load Manager Agent");
        assert_eq!(
            registry.get("wind").unwrap_err(),
            RegistryError::NotFound("wind".to_string())
        );
        assert_eq!(
            registry.find_by_name("solar panel agent").unwrap().id(),
            "solar"
        );
        assert!(registry.find_by_name("Wind Agent").is_none());
    }
}
