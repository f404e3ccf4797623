/// Database configuration and connection management
pub mod database;

/// Server and billing settings from config.toml
pub mod settings;
