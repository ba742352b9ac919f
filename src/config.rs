use crate::string::SmallString;
use ::config::{Environment, File, FileFormat};
use serde::Deserialize;

pub use ::config::ConfigError;

/// Defaults bundled into the binary. A `config.toml` in the working directory
/// and `BOOKSHELF__*` environment variables override them, in that order.
const DEFAULT_CONFIG: &str = include_str!("../config.toml.dist");

#[derive(Debug, Deserialize)]
pub struct Config {
    pub port: u16,
    pub comment: CommentConfig,
}

#[derive(Debug, Deserialize)]
pub struct CommentConfig {
    /// Authority id that lets a role publish comments without review.
    pub no_review_authority_id: SmallString,
    pub default_page: i64,
    pub default_page_size: i64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        ::config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::new("config.toml", FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("BOOKSHELF").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

/// Configuration built only from the bundled defaults.
#[cfg(test)]
pub fn test_config() -> Config {
    ::config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()
        .and_then(|config| config.try_deserialize())
        .unwrap_or_else(|err| panic!("Bundled config is invalid: {err}"))
}
