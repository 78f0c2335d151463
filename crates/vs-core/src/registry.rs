//! Explicit registry of agent types.
//!
//! Each logical type name maps to a runner constructor and an adapter
//! constructor, registered at start-up. Lookup of an unknown name fails with
//! a typed error; the `Human` sentinel resolves to no instance because human
//! participants are driven from outside the simulation.

use std::collections::HashMap;
use std::fmt;

use crate::constants::HUMAN_AGENT;
use crate::error::RegistryError;

/// Owns and drives the cognitive model of one agent type.
pub trait AgentRunner: Send {
    fn kind(&self) -> &str;

    /// Build the agent model for the given agent identifiers.
    fn build_agent(&mut self, agent_ids: &[String]);
}

/// Bridges simulation state to an agent's perceptual and motor interface.
pub trait AgentAdapter: Send {
    fn kind(&self) -> &str;
}

type RunnerFactory<E> = Box<dyn Fn(&E) -> Box<dyn AgentRunner> + Send + Sync>;
type AdapterFactory<E> = Box<dyn Fn(&E) -> Box<dyn AgentAdapter> + Send + Sync>;

struct AgentEntry<E> {
    runner: RunnerFactory<E>,
    adapter: AdapterFactory<E>,
}

/// A constructed runner/adapter pair.
pub struct AgentInstance {
    pub runner: Box<dyn AgentRunner>,
    pub adapter: Box<dyn AgentAdapter>,
}

impl fmt::Debug for AgentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentInstance")
            .field("runner", &self.runner.kind())
            .field("adapter", &self.adapter.kind())
            .finish()
    }
}

/// Agent constructors keyed by type name, generic over the environment
/// handle passed to each constructor.
pub struct AgentRegistry<E> {
    entries: HashMap<String, AgentEntry<E>>,
}

impl<E> Default for AgentRegistry<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<E> fmt::Debug for AgentRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("types", &self.names())
            .finish()
    }
}

impl<E> AgentRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R, A>(
        &mut self,
        name: impl Into<String>,
        runner: R,
        adapter: A,
    ) -> Result<(), RegistryError>
    where
        R: Fn(&E) -> Box<dyn AgentRunner> + Send + Sync + 'static,
        A: Fn(&E) -> Box<dyn AgentAdapter> + Send + Sync + 'static,
    {
        let name = name.into();
        if name == HUMAN_AGENT {
            return Err(RegistryError::reserved());
        }
        if self.entries.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }
        tracing::debug!("registered agent type '{name}'");
        self.entries.insert(
            name,
            AgentEntry {
                runner: Box::new(runner),
                adapter: Box::new(adapter),
            },
        );
        Ok(())
    }

    /// Construct the runner and adapter for `name`, building the runner's
    /// agent model for `agent_ids`. `Ok(None)` for human participants.
    pub fn resolve(
        &self,
        name: &str,
        env: &E,
        agent_ids: &[String],
    ) -> Result<Option<AgentInstance>, RegistryError> {
        if name == HUMAN_AGENT {
            return Ok(None);
        }
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered {
                name: name.to_string(),
            })?;

        let mut runner = (entry.runner)(env);
        runner.build_agent(agent_ids);
        let adapter = (entry.adapter)(env);
        Ok(Some(AgentInstance { runner, adapter }))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
