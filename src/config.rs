use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::core_types::AccountId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing signing key: environment variable {0} is not set")]
    MissingSigningKey(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    pub transfer: TransferConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

/// EVM ledger endpoint and contract
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Tip contract address, `0x`-prefixed
    pub contract_address: String,
    /// Name of the environment variable holding the hex signing key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_required_confirmations")]
    pub required_confirmations: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_private_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_required_confirmations() -> u64 {
    1
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Minimum spacing between the starts of two outbound operations
    pub min_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1_000,
        }
    }
}

impl RateLimitConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Upper bound on the confirmation wait; exceeding it yields an ambiguous outcome
    pub confirm_timeout_ms: u64,
    /// When false, the orchestrator returns as soon as the ledger acknowledges the submission
    pub await_confirmation: bool,
    /// Fractional digits a user may type; 0 = whole tokens only
    pub max_fraction_digits: u32,
    /// The bot's own account; never a valid tip recipient. Required, non-zero.
    pub bot_account_id: AccountId,
    /// Additional reserved/system accounts that cannot receive tips
    #[serde(default)]
    pub protected_accounts: Vec<AccountId>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_ms: 120_000,
            await_confirmation: true,
            max_fraction_digits: 0,
            bot_account_id: 0,
            protected_accounts: Vec::new(),
        }
    }
}

impl TransferConfig {
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn is_protected(&self, account: AccountId) -> bool {
        account == self.bot_account_id || self.protected_accounts.contains(&account)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenConfig {
    pub symbol: String,
    pub decimals: u32,
    /// Truncate displayed balances to this many digits; full precision when unset
    #[serde(default)]
    pub display_decimals: Option<u32>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: "SPXP".to_string(),
            decimals: 18,
            display_decimals: None,
        }
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        Self::from_file(&format!("config/{}.yaml", env))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.decimals > 38 {
            return Err(ConfigError::Invalid(format!(
                "token.decimals {} exceeds the u128 range",
                self.token.decimals
            )));
        }
        if self.transfer.max_fraction_digits > self.token.decimals {
            return Err(ConfigError::Invalid(format!(
                "transfer.max_fraction_digits {} exceeds token.decimals {}",
                self.transfer.max_fraction_digits, self.token.decimals
            )));
        }
        if self.transfer.bot_account_id == 0 {
            return Err(ConfigError::Invalid(
                "transfer.bot_account_id must be the bot's own non-zero account id".into(),
            ));
        }
        if self.transfer.confirm_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "transfer.confirm_timeout_ms must be bounded and non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Read the signing key from the configured environment variable.
    ///
    /// Only the bootstrap calls this; orchestration code never looks at the environment.
    pub fn signing_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.ledger.private_key_env)
            .map_err(|_| ConfigError::MissingSigningKey(self.ledger.private_key_env.clone()))
    }
}
