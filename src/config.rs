// config.rs

use crate::error::{Error, Result};
use crate::history::Retention;
use crate::roles::{Role, Workflows};
use crate::router::Router;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Represents the full configuration of a mesh run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,

    /// Eviction policy of the router's message history.
    #[serde(default)]
    pub history: Retention,

    /// Agents to register, in registration order.
    pub agents: Vec<AgentConfig>,

    /// Debug mode flag (enables verbose console output).
    #[serde(default)]
    pub debug: bool,
}

/// Defines the scheduler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on the number of ticks of one run.
    pub max_iterations: usize,
}

/// Defines one agent of the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The role the agent is built from.
    pub role: Role,

    /// Agent's name; the role's default name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AgentConfig {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.role.default_name())
    }
}

impl Default for Config {
    /// One agent of every role under its default name, ten ticks, unbounded
    /// history.
    fn default() -> Self {
        let roles = [
            Role::Coordinator,
            Role::Analyzer,
            Role::Planner,
            Role::Executor,
            Role::Knowledge,
        ];
        Self {
            scheduler: SchedulerConfig { max_iterations: 10 },
            history: Retention::Unbounded,
            agents: roles
                .into_iter()
                .map(|role| AgentConfig { role, name: None })
                .collect(),
            debug: false,
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// # Arguments
    /// * `path` - The file path to load the configuration from.
    ///
    /// # Returns
    /// * `Ok(Config)` if the file is read, parsed and valid.
    /// * `Err(Error)` if an error occurs.
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the current configuration to a JSON file.
    ///
    /// # Arguments
    /// * `path` - The file path to save the configuration to.
    ///
    /// # Returns
    /// * `Ok(())` if the file is successfully written.
    /// * `Err(Error)` if an error occurs.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Checks what serde cannot: a non-empty history window and unique agent
    /// names.
    pub fn validate(&self) -> Result<()> {
        if self.history == Retention::Window(0) {
            return Err(Error::Config("history window must hold at least one message".into()));
        }
        for (i, agent) in self.agents.iter().enumerate() {
            if self.agents[..i].iter().any(|other| other.name() == agent.name()) {
                return Err(Error::Config(format!("agent '{}' is listed twice", agent.name())));
            }
        }
        Ok(())
    }

    /// Builds a router holding the roster. Every coordinator records its
    /// workflows in `workflows`.
    pub fn build_router(&self, workflows: &Workflows) -> Result<Router> {
        self.validate()?;
        let mut router = Router::with_retention(self.history);
        for agent in &self.agents {
            let built = match agent.role {
                Role::Coordinator => crate::roles::coordinator(agent.name(), workflows.clone())?,
                role => role.build(agent.name())?,
            };
            router.register(built)?;
        }
        Ok(router)
    }
}
