use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::profile::ProfileStore;
use crate::recipes::{DiscoverState, Meal, SearchState};
use crate::saved_meals::SavedMealsStore;
use crate::session::{LoginForm, SessionStore};
use crate::theme::ThemeStore;
use crate::AppError;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(UserId);
typed_id!(MealId);

/// Ticket for one in-flight saved-meals write.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WriteId(pub u64);

impl fmt::Display for WriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

// --- Bounded user text ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ValidationError {
    #[error("value too long ({len} > {max})")]
    TooLong { len: usize, max: usize },
    #[error("value contains control characters")]
    ControlCharacters,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct BoundedText<const MAX: usize>(String);

impl<const MAX: usize> BoundedText<MAX> {
    /// Length is counted in characters so non-Latin names are not penalized.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let len = s.chars().count();
        if len > MAX {
            return Err(ValidationError::TooLong { len, max: MAX });
        }
        if s.chars().any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t')) {
            return Err(ValidationError::ControlCharacters);
        }
        Ok(Self(s))
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

// --- Alerts ---

/// A blocking notice the shell shows until it is dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

// --- Model ---

#[derive(Debug, Default)]
pub struct Model {
    pub config: AppConfig,
    pub started: bool,

    pub session: SessionStore,
    pub login: LoginForm,
    pub saved: SavedMealsStore,
    pub theme: ThemeStore,

    pub discover: DiscoverState,
    pub search: SearchState,
    /// Kept by value so the detail outlives the list it was opened from.
    pub selected_meal: Option<Meal>,
    pub profile: ProfileStore,

    pub alert: Option<Alert>,
    pub active_error: Option<AppError>,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.user().is_some()
    }

    #[must_use]
    pub fn current_user_id(&self) -> Option<&UserId> {
        self.session.user().map(|u| &u.id)
    }

    /// Looks a meal up in everything the app currently knows about.
    #[must_use]
    pub fn find_meal(&self, id: &MealId) -> Option<&Meal> {
        self.discover
            .meals()
            .iter()
            .chain(self.search.results())
            .chain(self.saved.meals())
            .chain(&self.selected_meal)
            .find(|m| &m.id == id)
    }

    /// Drops every piece of per-user state.
    pub fn clear_user_data(&mut self) {
        self.saved.reset();
        self.profile.reset();
        self.selected_meal = None;
        self.alert = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_ids_display_raw_value() {
        assert_eq!(UserId::new("abc").to_string(), "abc");
        assert_eq!(MealId::new("52772").as_str(), "52772");
        assert_eq!(WriteId(3).to_string(), "w3");
    }

    #[test]
    fn bounded_text_counts_chars() {
        assert!(BoundedText::<3>::new("äöü").is_ok());
        assert!(matches!(
            BoundedText::<3>::new("abcd"),
            Err(ValidationError::TooLong { len: 4, max: 3 })
        ));
    }

    #[test]
    fn bounded_text_rejects_control_chars() {
        assert!(BoundedText::<10>::new("line\nbreak").is_ok());
        assert!(BoundedText::<10>::new("a\r\n\tb").is_ok());
        assert_eq!(
            BoundedText::<10>::new("bell\u{7}"),
            Err(ValidationError::ControlCharacters)
        );
    }

    #[test]
    fn default_model_is_unauthenticated() {
        let model = Model::default();
        assert!(!model.is_authenticated());
        assert!(model.saved.meals().is_empty());
        assert!(model.active_error.is_none());
    }
}
