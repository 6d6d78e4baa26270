//! Recipe API plumbing on top of `crux_http`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{AppError, ErrorKind};

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, RecipeApiError> {
        let url = url.into();
        let parsed = Self::validate(&url)?;
        Ok(Self {
            url: parsed.to_string(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Appends `endpoint` as a path segment and the given query pairs.
    pub fn endpoint(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, RecipeApiError> {
        let mut url = Url::parse(&self.url).map_err(|e| RecipeApiError::InvalidUrl {
            url: Self::truncate_url(&self.url),
            reason: e.to_string(),
        })?;

        url.path_segments_mut()
            .map_err(|()| RecipeApiError::InvalidUrl {
                url: Self::truncate_url(&self.url),
                reason: "base URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .push(endpoint);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url.into())
    }

    fn validate(url: &str) -> Result<Url, RecipeApiError> {
        if url.trim().is_empty() {
            return Err(RecipeApiError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(RecipeApiError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(url).map_err(|e| RecipeApiError::InvalidUrl {
            url: Self::truncate_url(url),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(RecipeApiError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        let Some(host) = parsed.host_str().map(str::to_lowercase) else {
            return Err(RecipeApiError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "URL must have a host".to_string(),
            });
        };

        if Self::is_private_host(&host) {
            return Err(RecipeApiError::PrivateNetworkBlocked {
                url: Self::truncate_url(url),
                host,
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(RecipeApiError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(parsed)
    }

    fn is_private_host(host: &str) -> bool {
        if matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]" | "0.0.0.0") {
            return true;
        }

        if host.ends_with(".local") || host.ends_with(".localhost") || host.ends_with(".internal") {
            return true;
        }

        if host.starts_with("10.") || host.starts_with("192.168.") || host.starts_with("169.254.") {
            return true;
        }

        host.strip_prefix("172.")
            .and_then(|rest| rest.split('.').next())
            .and_then(|octet| octet.parse::<u8>().ok())
            .is_some_and(|octet| (16..=31).contains(&octet))
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum RecipeApiError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("private network access blocked: {url} resolves to {host}")]
    PrivateNetworkBlocked { url: String, host: String },

    #[error("request failed: {message}")]
    Request { message: String },

    #[error("response had no body")]
    EmptyBody,

    #[error("response contained no meals")]
    NoMeals,
}

impl From<RecipeApiError> for AppError {
    fn from(e: RecipeApiError) -> Self {
        let kind = match &e {
            RecipeApiError::InvalidUrl { .. } | RecipeApiError::PrivateNetworkBlocked { .. } => {
                ErrorKind::Validation
            }
            RecipeApiError::Request { .. } => ErrorKind::Network,
            RecipeApiError::EmptyBody | RecipeApiError::NoMeals => ErrorKind::Deserialization,
        };
        AppError::new(kind, "Could not load recipes").with_internal(e.to_string())
    }
}

/// Unwraps a `crux_http` response into its JSON body.
pub fn take_json<T>(
    result: crux_http::Result<crux_http::Response<T>>,
) -> Result<T, RecipeApiError> {
    match result {
        Ok(mut response) => response.take_body().ok_or(RecipeApiError::EmptyBody),
        Err(e) => Err(RecipeApiError::Request {
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_public_https() {
        let url = ValidatedUrl::new("HTTPS://www.TheMealDB.com/api/json/v1/1").unwrap();
        assert_eq!(url.as_str(), "https://www.themealdb.com/api/json/v1/1");
    }

    #[test]
    fn rejects_bad_schemes_and_hosts() {
        assert!(ValidatedUrl::new("").is_err());
        assert!(ValidatedUrl::new("ftp://example.com").is_err());
        assert!(ValidatedUrl::new("javascript:alert(1)").is_err());
        assert!(matches!(
            ValidatedUrl::new("http://localhost:8080/api"),
            Err(RecipeApiError::PrivateNetworkBlocked { .. })
        ));
        assert!(matches!(
            ValidatedUrl::new("http://172.20.1.1/api"),
            Err(RecipeApiError::PrivateNetworkBlocked { .. })
        ));
        assert!(ValidatedUrl::new("http://172.40.1.1/api").is_ok());
        assert!(ValidatedUrl::new("https://user:pw@example.com").is_err());
    }

    #[test]
    fn endpoint_appends_segment_without_dropping_base_path() {
        let base = ValidatedUrl::new("https://www.themealdb.com/api/json/v1/1").unwrap();
        assert_eq!(
            base.endpoint("random.php", &[]).unwrap(),
            "https://www.themealdb.com/api/json/v1/1/random.php"
        );

        let with_slash = ValidatedUrl::new("https://www.themealdb.com/api/json/v1/1/").unwrap();
        assert_eq!(
            with_slash.endpoint("random.php", &[]).unwrap(),
            "https://www.themealdb.com/api/json/v1/1/random.php"
        );
    }

    #[test]
    fn endpoint_encodes_query() {
        let base = ValidatedUrl::new("https://www.themealdb.com/api/json/v1/1").unwrap();
        assert_eq!(
            base.endpoint("search.php", &[("s", "mac & cheese")]).unwrap(),
            "https://www.themealdb.com/api/json/v1/1/search.php?s=mac+%26+cheese"
        );
    }

    #[test]
    fn long_urls_are_truncated_in_errors() {
        let url = format!("ftp://{}", "a".repeat(300));
        match ValidatedUrl::new(url) {
            Err(RecipeApiError::InvalidUrl { url, .. }) => assert!(url.len() <= 103),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
