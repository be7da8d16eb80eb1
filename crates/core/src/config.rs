//! Configuration management for chainsign.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! Missing sections and keys fall back to [`Config::default_config`].

use std::path::Path;

use chainsign_crypto::{Algorithm, DigestAlgorithm, KeyConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "CHAINSIGN_CONFIG";

const MIN_RSA_BITS: usize = 1024;
const MAX_RSA_BITS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub keys: KeysConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub rsa_bits: usize,
    pub digest: String,
    /// Algorithm names accepted for new devices
    pub algorithms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            cors_enabled: false,
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            rsa_bits: 2048,
            digest: DigestAlgorithm::default().as_str().to_string(),
            algorithms: Algorithm::all()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            keys: KeysConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the file named by `CHAINSIGN_CONFIG` (or defaults), applies
    /// environment overrides and validates the result.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default_config(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up by variable name.
    ///
    /// Recognized: `LISTEN_ADDRESS`, `CORS_ENABLED`, `RSA_BITS`, `LOG_JSON`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("LISTEN_ADDRESS") {
            self.server.listen_address = address;
        }
        if let Some(value) = lookup("CORS_ENABLED") {
            self.server.cors_enabled = parse_env_bool("CORS_ENABLED", value)?;
        }
        if let Some(value) = lookup("RSA_BITS") {
            self.keys.rsa_bits = parse_env("RSA_BITS", value)?;
        }
        if let Some(value) = lookup("LOG_JSON") {
            self.logging.json = parse_env_bool("LOG_JSON", value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&self.keys.rsa_bits) {
            return Err(ConfigError::Invalid(format!(
                "rsa_bits must be between {} and {}, got {}",
                MIN_RSA_BITS, MAX_RSA_BITS, self.keys.rsa_bits
            )));
        }
        if self.keys.algorithms.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one key algorithm must be enabled".to_string(),
            ));
        }
        self.key_config()?;
        self.digest()?;
        Ok(())
    }

    /// Key registry settings derived from the `[keys]` section.
    pub fn key_config(&self) -> Result<KeyConfig> {
        let algorithms = self
            .keys
            .algorithms
            .iter()
            .map(|name| {
                name.parse::<Algorithm>()
                    .map_err(|e| ConfigError::Invalid(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(KeyConfig {
            rsa_bits: self.keys.rsa_bits,
            algorithms,
        })
    }

    /// Digest new devices sign with.
    pub fn digest(&self) -> Result<DigestAlgorithm> {
        self.keys
            .digest
            .parse()
            .map_err(|e: chainsign_crypto::CryptoError| ConfigError::Invalid(e.to_string()))
    }
}

/// Parses a boolean flag in any of the spellings
/// `1 t T TRUE true True 0 f F FALSE false False`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_env_bool(name: &str, value: String) -> Result<bool> {
    parse_bool(value.trim()).ok_or_else(|| ConfigError::InvalidEnv {
        name: name.to_string(),
        value,
    })
}

fn parse_env<T: std::str::FromStr>(name: &str, value: String) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value,
    })
}
