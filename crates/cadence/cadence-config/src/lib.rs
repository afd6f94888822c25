mod config;
mod role;

pub use config::{CadenceConfig, ConfigError};
pub use role::Role;
