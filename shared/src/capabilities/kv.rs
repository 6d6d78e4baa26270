use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind};

pub const MAX_VALUE_SIZE: usize = 64 * 1024;

const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KvKey {
    namespace: KeyNamespace,
    key: &'static str,
}

impl KvKey {
    /// Where the explicit light/dark choice is persisted.
    #[must_use]
    pub fn theme_override() -> Self {
        Self {
            namespace: KeyNamespace::Settings,
            key: THEME_KEY,
        }
    }

    #[must_use]
    pub fn raw(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyNamespace {
    Settings,
}

impl KeyNamespace {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            KeyNamespace::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum KvError {
    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl KvError {
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<KvError> for AppError {
    fn from(e: KvError) -> Self {
        let kind = match &e {
            KvError::ValueTooLarge { .. } => ErrorKind::Validation,
            KvError::Storage { .. } => ErrorKind::Storage,
        };
        AppError::new(kind, "Could not access local settings").with_internal(e.to_string())
    }
}

/// Guards a value before it is handed to the key/value store.
pub fn check_value_size(value: &[u8]) -> Result<(), KvError> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_key_is_namespaced() {
        assert_eq!(KvKey::theme_override().raw(), "settings:theme");
    }

    #[test]
    fn value_size_guard() {
        assert!(check_value_size(b"dark").is_ok());
        assert!(matches!(
            check_value_size(&vec![0u8; MAX_VALUE_SIZE + 1]),
            Err(KvError::ValueTooLarge { .. })
        ));
    }

    #[test]
    fn converts_to_app_error() {
        let err: AppError = KvError::storage("disk full").into();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.is_retryable());
        assert!(err.internal_message.unwrap().contains("disk full"));

        let err: AppError = KvError::ValueTooLarge { size: 2, max: 1 }.into();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
