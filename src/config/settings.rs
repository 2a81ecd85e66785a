//! Marketplace settings loaded from `config.toml`.
//!
//! The file is optional: every setting has a default, so a fresh checkout runs
//! without one. Secrets never live in the file; the seeded admin password is
//! read from the `ADMIN_PASSWORD` environment variable.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Default stock level at or below which a product counts as low.
pub const DEFAULT_REORDER_LEVEL: i32 = 10;

/// Lowest bcrypt cost factor accepted for password hashes.
pub const MIN_HASH_COST: u32 = 4;

/// Highest bcrypt cost factor accepted for password hashes.
pub const MAX_HASH_COST: u32 = 31;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Marketplace tunables
    #[serde(default)]
    pub marketplace: MarketplaceSettings,
    /// Admin accounts to create on startup when missing
    #[serde(default)]
    pub admins: Vec<AdminSeed>,
}

/// Tunables for the marketplace core
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketplaceSettings {
    /// bcrypt cost factor for new password hashes
    pub password_hash_cost: u32,
    /// How long a recorded weather reading is served before refetching
    pub weather_cache_minutes: i64,
    /// Reorder level applied when a product is created without one
    pub default_reorder_level: i32,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            password_hash_cost: bcrypt::DEFAULT_COST,
            weather_cache_minutes: 30,
            default_reorder_level: DEFAULT_REORDER_LEVEL,
        }
    }
}

/// Admin account seeded at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    /// Login email
    pub email: String,
    /// Display name
    pub full_name: String,
}

impl Config {
    /// Rejects settings that would make the core misbehave.
    pub fn validate(&self) -> Result<()> {
        let cost = self.marketplace.password_hash_cost;
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
            return Err(Error::Config {
                message: format!(
                    "password_hash_cost must be between {MIN_HASH_COST} and {MAX_HASH_COST}, got {cost}"
                ),
            });
        }
        if self.marketplace.weather_cache_minutes < 0 {
            return Err(Error::Config {
                message: "weather_cache_minutes cannot be negative".to_string(),
            });
        }
        if self.marketplace.default_reorder_level < 0 {
            return Err(Error::Config {
                message: "default_reorder_level cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A setting is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path_ref:?}: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from the default location (./config.toml), falling back
/// to defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        warn!("config.toml not found, using default settings");
        Ok(Config::default())
    }
}
