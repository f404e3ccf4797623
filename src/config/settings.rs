//! Service settings loaded from a TOML file.
//!
//! The file path comes from `LEDGER_CONFIG` (default `./config.toml`). A missing
//! file is not an error: every field has a default matching the product rules
//! (₹100 signup bonus, ₹50 low-balance floor, ₹100 join threshold).

use crate::{
    core::money::Money,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Billing and wallet rules
    pub billing: BillingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API listens on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Billing and wallet rules shared by the ledger, meter, and booking gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Credited to every newly opened wallet
    pub signup_bonus: Money,
    /// Balance below which a low-balance event fires during a session
    pub low_balance_floor: Money,
    /// Minimum balance required to join a session
    pub join_threshold: Money,
    /// Seconds between scheduler passes over active sessions
    pub tick_interval_secs: u64,
    /// What the meter does when the wallet runs dry
    pub exhaustion: ExhaustionPolicy,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            signup_bonus: Money::from_major(100),
            low_balance_floor: Money::from_major(50),
            join_threshold: Money::from_major(100),
            tick_interval_secs: 5,
            exhaustion: ExhaustionPolicy::default(),
        }
    }
}

/// Behaviour of an active session once the wallet cannot cover another minute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// End the session as soon as the next minute cannot be paid for
    #[default]
    HardStop,
    /// Allow the balance to go negative down to `-limit`, then end the session
    Overdraft {
        /// Maximum overdraft, as a positive amount
        limit: Money,
    },
    /// Keep charging with no floor
    Unbounded,
}

impl ExhaustionPolicy {
    /// Lowest balance a session charge may leave behind, or `None` for no floor.
    #[must_use]
    pub fn floor(self) -> Option<Money> {
        match self {
            Self::HardStop => Some(Money::ZERO),
            Self::Overdraft { limit } => Some(-limit),
            Self::Unbounded => None,
        }
    }
}

impl Settings {
    /// Checks values that would make billing nonsensical.
    pub fn validate(&self) -> Result<()> {
        let billing = &self.billing;
        if billing.signup_bonus.is_negative() {
            return Err(config_error("billing.signup_bonus cannot be negative"));
        }
        if billing.low_balance_floor.is_negative() {
            return Err(config_error("billing.low_balance_floor cannot be negative"));
        }
        if !billing.join_threshold.is_positive() {
            return Err(config_error("billing.join_threshold must be greater than zero"));
        }
        if billing.tick_interval_secs == 0 {
            return Err(config_error("billing.tick_interval_secs must be at least 1"));
        }
        if let ExhaustionPolicy::Overdraft { limit } = billing.exhaustion {
            if limit.is_negative() {
                return Err(config_error("billing.exhaustion.limit cannot be negative"));
            }
        }
        if self.server.bind_addr.trim().is_empty() {
            return Err(config_error("server.bind_addr cannot be empty"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> Error {
    Error::Config {
        message: message.to_string(),
    }
}

/// Parses and validates settings from TOML text.
pub fn parse_config(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config: {e}"),
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails validation
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads settings from `LEDGER_CONFIG` or `./config.toml`, falling back to
/// defaults when the file does not exist.
pub fn load_default_config() -> Result<Settings> {
    let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        let settings = load_config(&path)?;
        info!("Loaded configuration from {}", path);
        Ok(settings)
    } else {
        info!("No configuration file at {}, using defaults", path);
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults_match_product_rules() {
        let settings = Settings::default();
        assert_eq!(settings.billing.signup_bonus, Money::from_major(100));
        assert_eq!(settings.billing.low_balance_floor, Money::from_major(50));
        assert_eq!(settings.billing.join_threshold, Money::from_major(100));
        assert_eq!(settings.billing.exhaustion, ExhaustionPolicy::HardStop);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_addr = "0.0.0.0:9000"

            [billing]
            signup_bonus = 250
            low_balance_floor = 75.5
            join_threshold = 120
            tick_interval_secs = 1

            [billing.exhaustion]
            policy = "overdraft"
            limit = 20
        "#;

        let settings = parse_config(toml_str).unwrap();
        assert_eq!(settings.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.billing.signup_bonus, Money::from_major(250));
        assert_eq!(settings.billing.low_balance_floor, Money::from_minor(7550));
        assert_eq!(settings.billing.join_threshold, Money::from_major(120));
        assert_eq!(settings.billing.tick_interval_secs, 1);
        assert_eq!(
            settings.billing.exhaustion,
            ExhaustionPolicy::Overdraft {
                limit: Money::from_major(20)
            }
        );
        assert_eq!(
            settings.billing.exhaustion.floor(),
            Some(Money::from_major(-20))
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings = parse_config("[billing]\nsignup_bonus = 0\n").unwrap();
        assert_eq!(settings.billing.signup_bonus, Money::ZERO);
        assert_eq!(settings.billing.join_threshold, Money::from_major(100));
        assert_eq!(settings.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_unbounded_policy_has_no_floor() {
        let settings = parse_config("[billing.exhaustion]\npolicy = \"unbounded\"\n").unwrap();
        assert_eq!(settings.billing.exhaustion, ExhaustionPolicy::Unbounded);
        assert_eq!(settings.billing.exhaustion.floor(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for bad in [
            "[billing]\ntick_interval_secs = 0\n",
            "[billing]\njoin_threshold = 0\n",
            "[billing]\nsignup_bonus = -5\n",
            "[billing.exhaustion]\npolicy = \"overdraft\"\nlimit = -1\n",
            "[billing.exhaustion]\npolicy = \"sometimes\"\n",
        ] {
            assert!(
                matches!(parse_config(bad), Err(Error::Config { .. })),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
