//! Credentials handed to every MOCO operation. Nothing in the core reads them from ambient
//! storage; the caller loads them (see [crate::storage::settings]) and passes them along.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::moco::endpoint::MocoEndpoint;

/// Problems the user has to fix in the settings before anything can reach MOCO.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Moco Domain is not set. Please configure in Setup.")]
    MissingDomain,
    #[error("Moco API Key is not set. Please configure in Setup.")]
    MissingApiKey,
    #[error("Invalid MOCO domain")]
    InvalidDomain(String),
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Company subdomain, `acme` for `acme.mocoapp.com`.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(domain: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            domain: domain.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Checks the domain is set, then the key, then that the domain forms a usable endpoint.
    pub fn endpoint(&self) -> Result<MocoEndpoint, ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::MissingDomain);
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        MocoEndpoint::new(&self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Credentials};

    #[test]
    fn test_validation_order() {
        assert_eq!(
            Credentials::new("", "").endpoint().unwrap_err(),
            ConfigError::MissingDomain
        );
        assert_eq!(
            Credentials::new("acme", " ").endpoint().unwrap_err(),
            ConfigError::MissingApiKey
        );
        assert!(matches!(
            Credentials::new("ac me", "k").endpoint().unwrap_err(),
            ConfigError::InvalidDomain(_)
        ));
        assert!(Credentials::new("acme", "k").endpoint().is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let formatted = format!("{:?}", Credentials::new("acme", "secret-key"));
        assert!(formatted.contains("acme"));
        assert!(!formatted.contains("secret-key"));
    }
}
