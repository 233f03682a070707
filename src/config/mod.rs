/// Database configuration and connection management
pub mod database;

/// Default tax rule loading from config.toml
pub mod taxes;
