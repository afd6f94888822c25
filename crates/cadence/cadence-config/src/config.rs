use crate::role::Role;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CadenceConfig {
    /// Slots retained by the hub's latest-value buffer.
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
    /// Upper bound for a single `wait_turn`.
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "defaults::publish_interval_ms")]
    pub publish_interval_ms: u64,
    #[serde(default = "defaults::subscriber_interval_ms")]
    pub subscriber_interval_ms: u64,
    /// The phase cycle, e.g. `[["A", "B"], ["C"]]`.
    #[serde(default = "defaults::phases")]
    pub phases: Vec<Vec<Role>>,
    /// Full barrier cycles to run before stopping. Absent = run forever.
    #[serde(default)]
    pub rounds: Option<u64>,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {reason}")]
    Invalid { reason: &'static str },
}

mod defaults {
    use crate::role::Role;

    pub fn capacity() -> usize {
        3
    }

    pub fn timeout_ms() -> u64 {
        2000
    }

    pub fn publish_interval_ms() -> u64 {
        20
    }

    pub fn subscriber_interval_ms() -> u64 {
        100
    }

    pub fn phases() -> Vec<Vec<Role>> {
        vec![vec![Role::A, Role::B], vec![Role::C]]
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::capacity(),
            timeout_ms: defaults::timeout_ms(),
            publish_interval_ms: defaults::publish_interval_ms(),
            subscriber_interval_ms: defaults::subscriber_interval_ms(),
            phases: defaults::phases(),
            rounds: None,
            log_level: defaults::log_level(),
        }
    }
}

impl CadenceConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&toml_to_str)
    }

    /// Like [`load`](Self::load), but a missing file yields the built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let cadence_config: CadenceConfig = toml::from_str(toml_str)?;
        cadence_config.validate()?;
        Ok(cadence_config)
    }

    /// Rejects layouts the hub or barrier would refuse, before any thread starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "capacity must be greater than zero",
            });
        }
        if self.phases.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one phase is required",
            });
        }
        if self.phases.iter().any(Vec::is_empty) {
            return Err(ConfigError::Invalid {
                reason: "phases must not be empty",
            });
        }
        let per_cycle = self.max_turns_per_cycle();
        if self
            .rounds
            .is_some_and(|rounds| rounds.checked_mul(per_cycle).is_none())
        {
            return Err(ConfigError::Invalid {
                reason: "rounds too large for the phase layout",
            });
        }
        Ok(())
    }

    /// Most phases any single role appears in.
    fn max_turns_per_cycle(&self) -> u64 {
        Role::ALL
            .into_iter()
            .map(|role| self.phases.iter().filter(|phase| phase.contains(&role)).count() as u64)
            .max()
            .unwrap_or(0)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn subscriber_interval(&self) -> Duration {
        Duration::from_millis(self.subscriber_interval_ms)
    }
}
