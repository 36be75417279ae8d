//! Service configuration.
//!
//! Loaded from an optional YAML file and `MOVIE_REVIEWS__*` environment
//! variables. Every field has a default, so an empty environment yields a
//! configuration matching the deployed table layout.

use serde::Deserialize;
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "movie-reviews.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "MOVIE_REVIEWS_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "MOVIE_REVIEWS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// AWS region. Falls back to the SDK's default provider chain when unset.
    pub region: Option<String>,
    /// Endpoint override, e.g. for DynamoDB Local.
    pub endpoint_url: Option<String>,
    pub movie_table: String,
    pub review_table: String,
    /// Index over `content` within each movie partition.
    pub rating_index: String,
    /// Index over `reviewDate` within each movie partition.
    pub date_index: String,
    /// Report caller errors as 400 rather than the legacy 404/500 codes.
    pub strict_status_codes: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            movie_table: "Movies".to_string(),
            review_table: "MovieReview".to_string(),
            rating_index: "ratingIx".to_string(),
            date_index: "reviewDateIx".to_string(),
            strict_status_codes: false,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration, with later sources overriding earlier ones:
    /// `movie-reviews.yaml` in the working directory, the file at `path`, the
    /// file named by `MOVIE_REVIEWS_CONFIG`, then `MOVIE_REVIEWS__*` variables.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployed_tables() {
        let config = ServiceConfig::default();
        assert_eq!(config.movie_table, "Movies");
        assert_eq!(config.review_table, "MovieReview");
        assert_eq!(config.rating_index, "ratingIx");
        assert_eq!(config.date_index, "reviewDateIx");
        assert!(!config.strict_status_codes);
        assert!(config.region.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ServiceConfig = ::config::Config::builder()
            .add_source(::config::File::from_str(
                "review_table: Reviews\nstrict_status_codes: true\n",
                ::config::FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.review_table, "Reviews");
        assert!(config.strict_status_codes);
        assert_eq!(config.movie_table, "Movies");
        assert_eq!(config.date_index, "reviewDateIx");
    }

    #[test]
    fn test_missing_required_file_fails() {
        let result = ServiceConfig::load(Some("/nonexistent/movie-reviews.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
