use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::avatar::AvatarConfig;
use crate::capabilities::{RecipeApiError, ValidatedUrl};
use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid recipe API base: {0}")]
    RecipeApi(#[from] RecipeApiError),
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Validation, "Invalid app configuration").with_internal(e.to_string())
    }
}

/// Deployment settings the shell may override at startup via `Event::Configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recipe_api_base: String,
    pub users_table: String,
    pub profiles_table: String,
    pub avatars_bucket: String,
    pub discover_batch_size: usize,
    pub recent_search_limit: usize,
    pub avatar: AvatarConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recipe_api_base: crate::DEFAULT_RECIPE_API_BASE.to_string(),
            users_table: "users".to_string(),
            profiles_table: "profiles".to_string(),
            avatars_bucket: "avatars".to_string(),
            discover_batch_size: crate::DEFAULT_DISCOVER_BATCH_SIZE,
            recent_search_limit: crate::DEFAULT_RECENT_SEARCH_LIMIT,
            avatar: AvatarConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.recipe_api_base.as_str())?;

        for (field, value) in [
            ("users_table", &self.users_table),
            ("profiles_table", &self.profiles_table),
            ("avatars_bucket", &self.avatars_bucket),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }

        check_range("discover_batch_size", self.discover_batch_size, 1, crate::MAX_DISCOVER_BATCH_SIZE)?;
        check_range("recent_search_limit", self.recent_search_limit, 1, 50)?;
        check_range(
            "avatar.output_dimension",
            self.avatar.output_dimension as usize,
            16,
            4096,
        )?;
        Ok(())
    }

    /// Parsed recipe API base. Always valid for a config that passed `validate`.
    pub fn recipe_api(&self) -> Result<ValidatedUrl, RecipeApiError> {
        ValidatedUrl::new(self.recipe_api_base.as_str())
    }
}

fn check_range(field: &'static str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = AppConfig {
            recipe_api_base: "ftp://example.com".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::RecipeApi(_))));
    }

    #[test]
    fn rejects_empty_names_and_ranges() {
        let config = AppConfig {
            avatars_bucket: " ".into(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty {
                field: "avatars_bucket"
            })
        );

        let config = AppConfig {
            discover_batch_size: 0,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "discover_batch_size",
                ..
            })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "recent_search_limit": 8 }"#).unwrap();
        assert_eq!(config.recent_search_limit, 8);
        assert_eq!(config.users_table, "users");
    }
}
