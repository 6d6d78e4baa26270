use serde::{Deserialize, Serialize};

use crate::capabilities::{
    AuthError, AuthStateChange, ColorSchemeChange, ObjectStoreError, Password, RecipeApiError,
    RecordError, Session,
};
use crate::config::AppConfig;
use crate::model::{MealId, UserId, WriteId};
use crate::profile::ProfileField;
use crate::recipes::Meal;
use crate::subscription::SubscriptionId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub enum Event {
    #[default]
    Noop,

    // Lifecycle
    Configure(AppConfig),
    AppStarted,
    AppStopped,
    AlertDismissed,

    // Session
    LoginModeToggled,
    SignInRequested { email: String, password: Password },
    SignUpRequested { email: String, password: Password },
    SignOutRequested,

    // Saved meals
    AddSavedMeal(Meal),
    RemoveSavedMeal(MealId),
    ToggleSavedMeal(MealId),
    SavedMealsRetryRequested,

    // Theme
    ThemeToggled,

    // Discover / search / detail
    DiscoverRefreshRequested,
    SearchQueryChanged(String),
    SearchSubmitted,
    RecentSearchSelected(String),
    MealSelected(MealId),
    MealDeselected,

    // Profile
    ProfileRefreshRequested,
    ProfileEditStarted,
    ProfileEditFinished,
    ProfileFieldEdited { field: ProfileField, value: String },
    AvatarPicked {
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        picked_at_ms: u64,
    },
    ProfileSaveRequested,

    // Responses from the shell
    #[serde(skip)]
    SessionRestored(Result<Option<Session>, AuthError>),
    #[serde(skip)]
    AuthStateChanged {
        subscription: SubscriptionId,
        change: AuthStateChange,
    },
    #[serde(skip)]
    SignedIn(Result<Option<Session>, AuthError>),
    #[serde(skip)]
    SignedUp {
        email: String,
        password: Password,
        result: Result<(), AuthError>,
    },
    #[serde(skip)]
    SignedOut(Result<(), AuthError>),
    #[serde(skip)]
    SavedMealsFetched {
        owner: UserId,
        result: Result<serde_json::Value, RecordError>,
    },
    #[serde(skip)]
    SavedMealsWritten {
        write: WriteId,
        result: Result<(), RecordError>,
    },
    #[serde(skip)]
    ThemeOverrideLoaded(Result<Option<Vec<u8>>, String>),
    #[serde(skip)]
    ThemeOverridePersisted(Result<(), String>),
    #[serde(skip)]
    SystemColorSchemeChanged {
        subscription: SubscriptionId,
        change: ColorSchemeChange,
    },
    #[serde(skip)]
    RandomMealReceived {
        batch: u64,
        result: Result<Meal, RecipeApiError>,
    },
    #[serde(skip)]
    SearchResultsReceived {
        term: String,
        result: Result<Vec<Meal>, RecipeApiError>,
    },
    #[serde(skip)]
    ProfileFetched {
        owner: UserId,
        result: Result<serde_json::Value, RecordError>,
    },
    #[serde(skip)]
    AvatarUploaded {
        owner: UserId,
        editor: u64,
        result: Result<String, ObjectStoreError>,
    },
    #[serde(skip)]
    AvatarUrlResolved {
        owner: UserId,
        editor: u64,
        result: Result<String, ObjectStoreError>,
    },
    #[serde(skip)]
    ProfileSaved {
        owner: UserId,
        result: Result<(), RecordError>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Event::Noop => "noop",
            Event::Configure(_) => "configure",
            Event::AppStarted => "app_started",
            Event::AppStopped => "app_stopped",
            Event::AlertDismissed => "alert_dismissed",
            Event::LoginModeToggled => "login_mode_toggled",
            Event::SignInRequested { .. } => "sign_in_requested",
            Event::SignUpRequested { .. } => "sign_up_requested",
            Event::SignOutRequested => "sign_out_requested",
            Event::AddSavedMeal(_) => "add_saved_meal",
            Event::RemoveSavedMeal(_) => "remove_saved_meal",
            Event::ToggleSavedMeal(_) => "toggle_saved_meal",
            Event::SavedMealsRetryRequested => "saved_meals_retry_requested",
            Event::ThemeToggled => "theme_toggled",
            Event::DiscoverRefreshRequested => "discover_refresh_requested",
            Event::SearchQueryChanged(_) => "search_query_changed",
            Event::SearchSubmitted => "search_submitted",
            Event::RecentSearchSelected(_) => "recent_search_selected",
            Event::MealSelected(_) => "meal_selected",
            Event::MealDeselected => "meal_deselected",
            Event::ProfileRefreshRequested => "profile_refresh_requested",
            Event::ProfileEditStarted => "profile_edit_started",
            Event::ProfileEditFinished => "profile_edit_finished",
            Event::ProfileFieldEdited { .. } => "profile_field_edited",
            Event::AvatarPicked { .. } => "avatar_picked",
            Event::ProfileSaveRequested => "profile_save_requested",
            Event::SessionRestored(_) => "session_restored",
            Event::AuthStateChanged { .. } => "auth_state_changed",
            Event::SignedIn(_) => "signed_in",
            Event::SignedUp { .. } => "signed_up",
            Event::SignedOut(_) => "signed_out",
            Event::SavedMealsFetched { .. } => "saved_meals_fetched",
            Event::SavedMealsWritten { .. } => "saved_meals_written",
            Event::ThemeOverrideLoaded(_) => "theme_override_loaded",
            Event::ThemeOverridePersisted(_) => "theme_override_persisted",
            Event::SystemColorSchemeChanged { .. } => "system_color_scheme_changed",
            Event::RandomMealReceived { .. } => "random_meal_received",
            Event::SearchResultsReceived { .. } => "search_results_received",
            Event::ProfileFetched { .. } => "profile_fetched",
            Event::AvatarUploaded { .. } => "avatar_uploaded",
            Event::AvatarUrlResolved { .. } => "avatar_url_resolved",
            Event::ProfileSaved { .. } => "profile_saved",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Event::AlertDismissed
                | Event::LoginModeToggled
                | Event::SignInRequested { .. }
                | Event::SignUpRequested { .. }
                | Event::SignOutRequested
                | Event::AddSavedMeal(_)
                | Event::RemoveSavedMeal(_)
                | Event::ToggleSavedMeal(_)
                | Event::SavedMealsRetryRequested
                | Event::ThemeToggled
                | Event::DiscoverRefreshRequested
                | Event::SearchQueryChanged(_)
                | Event::SearchSubmitted
                | Event::RecentSearchSelected(_)
                | Event::MealSelected(_)
                | Event::MealDeselected
                | Event::ProfileRefreshRequested
                | Event::ProfileEditStarted
                | Event::ProfileEditFinished
                | Event::ProfileFieldEdited { .. }
                | Event::AvatarPicked { .. }
                | Event::ProfileSaveRequested
        )
    }
}
