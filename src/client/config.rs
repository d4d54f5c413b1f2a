//! Submission client configuration with TOML file support.

use serde::{Deserialize, Serialize};

use crate::client::retry::RetryPolicy;
use crate::ledger::DEFAULT_CONTRACT_NAME;
use crate::types::*;
use crate::utils::DEFAULT_CHANNEL;

/// Identity the client transacts as
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Membership service provider ID of the identity's organization.
    pub msp_id: String,
    /// Enrollment name of the identity.
    #[serde(default = "default_identity_name")]
    pub name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            msp_id: default_msp_id(),
            name: default_identity_name(),
        }
    }
}

/// Everything the submission client needs to reach the token contract.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Gateway endpoint (`host:port`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Channel the contract is deployed on.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Name of the deployed token contract.
    #[serde(default = "default_contract")]
    pub contract: String,

    /// Identity used to sign transactions.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Which operations are retried on a commit conflict, and how often.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_endpoint() -> String {
    "localhost:7051".to_string()
}

fn default_msp_id() -> String {
    "Org1MSP".to_string()
}

fn default_identity_name() -> String {
    "appUser".to_string()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_contract() -> String {
    DEFAULT_CONTRACT_NAME.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            channel: default_channel(),
            contract: default_contract(),
            identity: IdentityConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> LedgerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> LedgerResult<String> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Same configuration, transacting as a member of another organization.
    pub fn with_msp_id(mut self, msp_id: impl Into<String>) -> Self {
        self.identity.msp_id = msp_id.into();
        self
    }

    pub fn validate(&self) -> LedgerResult<()> {
        let required = [
            ("endpoint", &self.endpoint),
            ("identity.msp_id", &self.identity.msp_id),
            ("identity.name", &self.identity.name),
            ("channel", &self.channel),
            ("contract", &self.contract),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(LedgerError::Config(format!("{} cannot be empty", field)));
            }
        }
        self.retry.validate()
    }
}
