/// Database configuration and connection management
pub mod database;

/// Marketplace settings loaded from config.toml
pub mod settings;
