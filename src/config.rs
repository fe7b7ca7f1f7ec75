//! Runtime configuration.
//!
//! Resolved once at startup and handed to the services, so nothing
//! reads the environment while a request or menu command is running.

use std::path::PathBuf;
use tracing::warn;

pub const DATA_DIR_VAR: &str = "WARD_DATA_DIR";
pub const BIND_ADDR_VAR: &str = "WARD_BIND_ADDR";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding `patients.csv`, `rates.cfg` and the billing report.
    pub data_dir: PathBuf,
    /// Address the HTTP API listens on.
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let data_dir = value(DATA_DIR_VAR).unwrap_or_else(|| {
            warn!("{DATA_DIR_VAR} not set, using '{DEFAULT_DATA_DIR}'");
            DEFAULT_DATA_DIR.to_string()
        });
        let bind_addr = value(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        Self {
            data_dir: PathBuf::from(data_dir),
            bind_addr,
        }
    }

    /// Applies command line overrides on top of the environment.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, bind_addr: Option<String>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(addr) = bind_addr {
            self.bind_addr = addr;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset_or_blank() {
        let env: HashMap<&str, String> = HashMap::from([(DATA_DIR_VAR, "  ".to_string())]);
        let config = AppConfig::from_lookup(|key| env.get(key).cloned());
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let env: HashMap<&str, String> = HashMap::from([
            (DATA_DIR_VAR, "/var/ward".to_string()),
            (BIND_ADDR_VAR, "0.0.0.0:8080".to_string()),
        ]);
        let config = AppConfig::from_lookup(|key| env.get(key).cloned())
            .with_overrides(Some(PathBuf::from("/tmp/ward")), None);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ward"));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }
}
