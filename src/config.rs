//! Startup configuration.
//!
//! The environment decides how much failure detail reaches clients. It is read
//! once at startup and handed to [`App::new`](crate::App::new); nothing in the
//! request path consults process-wide state.
//!
//! ```toml
//! environment = "development"
//! addr = "127.0.0.1:8080"
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Variable that overrides [`Config::environment`] in [`Config::from_env`].
pub const ENV_VAR: &str = "LARVATUS_ENV";
/// Variable that overrides [`Config::addr`] in [`Config::from_env`].
pub const ADDR_VAR: &str = "LARVATUS_ADDR";

/// Deployment mode.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Panic messages are exposed in `500` bodies.
    Development,
    /// Panic messages are replaced by a generic `Internal Server Error`.
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production  => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other                 => Err(Error::Config(format!("unknown environment `{other}`"))),
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub environment: Environment,
    pub addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl Config {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Defaults overridden by `LARVATUS_ENV` and `LARVATUS_ADDR`.
    pub fn from_env() -> Result<Self, Error> {
        Self::default().overridden_by(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn overridden_by<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(environment) = lookup(ENV_VAR) {
            self.environment = environment.parse()?;
        }
        if let Some(addr) = lookup(ADDR_VAR) {
            self.addr = addr
                .parse()
                .map_err(|e| Error::Config(format!("{ADDR_VAR}=`{addr}`: {e}")))?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_to_production() {
        let config = Config::default();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.addr.port(), 3000);
    }

    #[test]
    fn parses_toml_with_partial_keys() {
        let config = Config::from_toml_str(r#"environment = "development""#).unwrap();
        assert!(config.environment.is_development());
        assert_eq!(config.addr, Config::default().addr);

        let config = Config::from_toml_str(r#"addr = "127.0.0.1:8080""#).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn rejects_unknown_toml_keys() {
        assert!(matches!(
            Config::from_toml_str("debug = true"),
            Err(Error::ConfigFile(_))
        ));
    }

    #[test]
    fn variables_override_defaults() {
        let vars: HashMap<&str, &str> =
            [(ENV_VAR, "dev"), (ADDR_VAR, "127.0.0.1:9000")].into_iter().collect();
        let config = Config::default()
            .overridden_by(|key| vars.get(key).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.addr.port(), 9000);
    }

    #[test]
    fn bad_variables_are_reported() {
        let err = Config::default()
            .overridden_by(|key| (key == ADDR_VAR).then(|| "nowhere".to_owned()))
            .unwrap_err();
        assert!(err.to_string().contains(ADDR_VAR));

        assert!("staging".parse::<Environment>().is_err());
    }
}
