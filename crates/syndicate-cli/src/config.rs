// crates/syndicate-cli/src/config.rs
//
// Deployment configuration for the Syndicate CLI.
// Loaded from a TOML file or populated with the production defaults.

use serde::Deserialize;
use std::fs;

use syndicate_core::{parse_units, AccountId, BlockEnv, SyndicateError};
use syndicate_staking::{DeployParams, LockCurve, MAX_LOCK_SECONDS, WEIGHT_MULTIPLIER};

/// Parameters of a deployment. Amounts are in whole tokens ("990", "0.5").
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_primary_symbol")]
    pub primary_symbol: String,

    #[serde(default = "default_escrowed_symbol")]
    pub escrowed_symbol: String,

    /// Primary supply minted to the fund owner at deployment.
    #[serde(default = "default_initial_supply")]
    pub initial_supply: String,

    #[serde(default = "default_max_total_supply")]
    pub max_total_supply: String,

    /// Label of the account that deploys both tokens and owns the factory.
    #[serde(default = "default_deployer")]
    pub deployer: String,

    /// Label of the second full-privilege admin, also the swap operator.
    #[serde(default = "default_super_admin")]
    pub super_admin: String,

    #[serde(default = "default_fund_owner")]
    pub fund_owner: String,

    #[serde(default = "default_reward_per_block")]
    pub reward_per_block: String,

    #[serde(default = "default_blocks_per_update")]
    pub blocks_per_update: u64,

    /// Number of blocks, from genesis, that emit rewards.
    #[serde(default = "default_emission_blocks")]
    pub emission_blocks: u64,

    #[serde(default = "default_decay_numerator")]
    pub decay_numerator: u128,

    #[serde(default = "default_decay_denominator")]
    pub decay_denominator: u128,

    /// Weight of the core pool created by `syndicate deploy`.
    #[serde(default = "default_core_pool_weight")]
    pub core_pool_weight: u32,

    #[serde(default = "default_max_lock_seconds")]
    pub max_lock_seconds: u64,

    /// Extra weight per unit at the maximum lock, out of 1e6 base weight.
    #[serde(default = "default_max_bonus")]
    pub max_bonus: u128,

    #[serde(default)]
    pub genesis_block: u64,

    /// Unix timestamp of the genesis block. Defaults to the current time.
    #[serde(default)]
    pub genesis_timestamp: Option<i64>,

    /// Open a new block before every transaction.
    #[serde(default = "default_automine")]
    pub automine: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_primary_symbol() -> String {
    "SYN".to_string()
}

fn default_escrowed_symbol() -> String {
    "sSYN".to_string()
}

fn default_initial_supply() -> String {
    "7000000000".to_string()
}

fn default_max_total_supply() -> String {
    "10000000000".to_string()
}

fn default_deployer() -> String {
    "deployer".to_string()
}

fn default_super_admin() -> String {
    "super-admin".to_string()
}

fn default_fund_owner() -> String {
    "fund-owner".to_string()
}

fn default_reward_per_block() -> String {
    "990".to_string()
}

fn default_blocks_per_update() -> u64 {
    91_252
}

fn default_emission_blocks() -> u64 {
    7_120_725
}

fn default_decay_numerator() -> u128 {
    97
}

fn default_decay_denominator() -> u128 {
    100
}

fn default_core_pool_weight() -> u32 {
    1
}

fn default_max_lock_seconds() -> u64 {
    MAX_LOCK_SECONDS
}

fn default_max_bonus() -> u128 {
    WEIGHT_MULTIPLIER
}

fn default_automine() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            primary_symbol: default_primary_symbol(),
            escrowed_symbol: default_escrowed_symbol(),
            initial_supply: default_initial_supply(),
            max_total_supply: default_max_total_supply(),
            deployer: default_deployer(),
            super_admin: default_super_admin(),
            fund_owner: default_fund_owner(),
            reward_per_block: default_reward_per_block(),
            blocks_per_update: default_blocks_per_update(),
            emission_blocks: default_emission_blocks(),
            decay_numerator: default_decay_numerator(),
            decay_denominator: default_decay_denominator(),
            core_pool_weight: default_core_pool_weight(),
            max_lock_seconds: default_max_lock_seconds(),
            max_bonus: default_max_bonus(),
            genesis_block: 0,
            genesis_timestamp: None,
            automine: default_automine(),
            log_level: default_log_level(),
        }
    }
}

impl DeploymentConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DeploymentConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or malformed. The failure, if any, is returned for the caller to log
    /// once tracing is up.
    pub fn load_or_default(path: &str) -> (Self, Option<String>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (
                Self::default(),
                Some(format!("Could not load config from {}: {}. Using defaults.", path, e)),
            ),
        }
    }

    /// Resolve labels and human amounts into ledger deployment parameters.
    pub fn to_deploy_params(&self) -> Result<DeployParams, SyndicateError> {
        let timestamp = self
            .genesis_timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        let timestamp = u64::try_from(timestamp).map_err(|_| {
            SyndicateError::InvalidArgument(format!("genesis timestamp {} is negative", timestamp))
        })?;

        Ok(DeployParams {
            deployer: AccountId::from_label(&self.deployer),
            super_admin: AccountId::from_label(&self.super_admin),
            fund_owner: AccountId::from_label(&self.fund_owner),
            primary_symbol: self.primary_symbol.clone(),
            escrowed_symbol: self.escrowed_symbol.clone(),
            initial_supply: parse_units(&self.initial_supply)?,
            max_total_supply: parse_units(&self.max_total_supply)?,
            reward_per_block: parse_units(&self.reward_per_block)?,
            blocks_per_update: self.blocks_per_update,
            emission_blocks: self.emission_blocks,
            decay_numerator: self.decay_numerator,
            decay_denominator: self.decay_denominator,
            lock_curve: LockCurve {
                max_lock_seconds: self.max_lock_seconds,
                max_bonus: self.max_bonus,
            },
            genesis: BlockEnv::new(self.genesis_block, timestamp),
            automine: self.automine,
        })
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndicate_core::units;

    #[test]
    fn test_default_config() {
        let config = DeploymentConfig::default();
        assert_eq!(config.primary_symbol, "SYN");
        assert_eq!(config.blocks_per_update, 91_252);
        assert_eq!(config.core_pool_weight, 1);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: DeploymentConfig = toml::from_str(
            r#"
            reward_per_block = "100.5"
            genesis_timestamp = 1650000000
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.reward_per_block, "100.5");
        assert_eq!(config.escrowed_symbol, "sSYN");
        assert_eq!(config.log_level, "debug");

        let params = config.to_deploy_params().unwrap();
        assert_eq!(params.reward_per_block, units(100) + units(1) / 2);
        assert_eq!(params.genesis, BlockEnv::new(0, 1_650_000_000));
    }

    #[test]
    fn test_defaults_match_deploy_params() {
        let config = DeploymentConfig {
            genesis_timestamp: Some(0),
            ..DeploymentConfig::default()
        };
        assert_eq!(config.to_deploy_params().unwrap(), DeployParams::default());
    }

    #[test]
    fn test_genesis_defaults_to_now() {
        let before = chrono::Utc::now().timestamp() as u64;
        let params = DeploymentConfig::default().to_deploy_params().unwrap();
        assert!(params.genesis.timestamp >= before);
    }

    #[test]
    fn test_bad_amount_rejected() {
        let config = DeploymentConfig {
            initial_supply: "lots".to_string(),
            ..DeploymentConfig::default()
        };
        assert!(config.to_deploy_params().is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let (config, warning) = DeploymentConfig::load_or_default("/nonexistent/syndicate.toml");
        assert!(warning.is_some());
        assert_eq!(config.deployer, "deployer");
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/etc/syndicate.toml"), "/etc/syndicate.toml");
        assert_eq!(expand_tilde("relative.toml"), "relative.toml");
    }
}
