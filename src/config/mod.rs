use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::crypto::{ConfigError, DomainTags};

/// Top-level configuration for the consensus core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub consensus: ConsensusSection,
    #[serde(default)]
    pub signing: SigningSection,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSection {
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_key_path")]
    pub staking_key_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusSection {
    #[serde(default = "default_view_timeout_ms")]
    pub view_timeout_ms: u64,
    #[serde(default = "default_delta_ms")]
    pub timeout_delta_ms: u64,
}

/// Per-role signing tags. Committees of different roles (or different
/// chains) configure different tags so their signatures never cross over.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SigningSection {
    #[serde(default = "default_proposal_tag")]
    pub proposal_tag: String,
    #[serde(default = "default_vote_tag")]
    pub vote_tag: String,
}

impl SigningSection {
    /// Validated tag pair; bad tags are fatal here, before any signer exists.
    pub fn domain_tags(&self) -> Result<DomainTags, ConfigError> {
        DomainTags::new(&self.proposal_tag, &self.vote_tag)
    }
}

// Default value functions
fn default_chain_id() -> String { "localnet".to_string() }
fn default_key_path() -> String { "staking_key".to_string() }
fn default_view_timeout_ms() -> u64 { 1000 }
fn default_delta_ms() -> u64 { 500 }
fn default_proposal_tag() -> String { "consensus-proposal-v1".to_string() }
fn default_vote_tag() -> String { "consensus-vote-v1".to_string() }

// Default impls
impl Default for NodeSection {
    fn default() -> Self {
        Self { chain_id: default_chain_id(), staking_key_path: default_key_path() }
    }
}
impl Default for ConsensusSection {
    fn default() -> Self {
        Self {
            view_timeout_ms: default_view_timeout_ms(),
            timeout_delta_ms: default_delta_ms(),
        }
    }
}
impl Default for SigningSection {
    fn default() -> Self {
        Self {
            proposal_tag: default_proposal_tag(),
            vote_tag: default_vote_tag(),
        }
    }
}
impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSection::default(),
            consensus: ConsensusSection::default(),
            signing: SigningSection::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file. Falls back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(_) => Self::default(),
        }
    }

    /// Serialize to TOML string (useful for generating template configs).
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
