#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod avatar;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;
pub mod profile;
pub mod recipes;
pub mod saved_meals;
pub mod session;
pub mod subscription;
pub mod theme;
pub mod view;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

pub const DEFAULT_RECIPE_API_BASE: &str = "https://www.themealdb.com/api/json/v1/1";
pub const DEFAULT_DISCOVER_BATCH_SIZE: usize = 10;
pub const MAX_DISCOVER_BATCH_SIZE: usize = 25;
pub const DEFAULT_RECENT_SEARCH_LIMIT: usize = 5;
pub const MAX_AVATAR_INPUT_BYTES: usize = 10 * 1024 * 1024;
pub const AVATAR_OUTPUT_DIMENSION: u32 = 512;
pub const AVATAR_JPEG_QUALITY: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Storage,
    Serialization,
    Deserialization,
    ImageProcessing,
    ImageTooLarge,
    ImageFormatUnsupported,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::ImageProcessing => "IMAGE_PROCESSING_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Storage => ErrorSeverity::Transient,

            Self::Serialization | Self::Deserialization | Self::Internal | Self::InvalidState => {
                ErrorSeverity::Fatal
            }

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::ImageProcessing
            | Self::ImageTooLarge
            | Self::ImageFormatUnsupported
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Storage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Authentication | ErrorKind::Validation => self.message.clone(),
            ErrorKind::Authorization => {
                "You don't have permission to perform this action.".into()
            }
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Storage => "Unable to save your settings on this device.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please try again later.".into()
            }
            ErrorKind::ImageProcessing => {
                "Unable to process the image. Please try a different photo.".into()
            }
            ErrorKind::ImageTooLarge => format!(
                "The image is too large. Please use an image smaller than {} MB.",
                MAX_AVATAR_INPUT_BYTES / (1024 * 1024)
            ),
            ErrorKind::ImageFormatUnsupported => {
                "This image format is not supported. Please use JPEG, PNG, or WebP.".into()
            }
            ErrorKind::InvalidState => "Please wait for the current action to finish.".into(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

pub mod app {
    use tracing::{debug, info, warn};

    use crate::avatar::{normalize_avatar, AVATAR_CONTENT_TYPE};
    use crate::capabilities::{take_json, AuthError, Capabilities, Credentials, KvError, Password};
    use crate::event::Event;
    use crate::model::{Alert, Model, UserId};
    use crate::profile::{AvatarUpload, ProfileError, PROFILE_COLUMNS};
    use crate::recipes::{BatchProgress, MealsResponse, SearchOutcome};
    use crate::saved_meals::{
        FetchOutcome, PendingWrite, SavedMealsError, WriteOutcome, SAVED_MEALS_COLUMN,
    };
    use crate::session::IdentityChange;
    use crate::theme::ThemeStore;
    use crate::view::ViewModel;
    use crate::{AppError, ErrorKind};

    pub const AUTH_ALERT_TITLE: &str = "Error";
    pub const UPLOAD_ALERT_TITLE: &str = "Upload failed";
    pub const SAVE_ALERT_TITLE: &str = "Error";

    #[derive(Default)]
    pub struct App;

    impl App {
        fn start(model: &mut Model, caps: &Capabilities) {
            model.started = true;

            let (auth_id, previous) = model.session.start();
            if let Some(previous) = previous {
                caps.auth.unsubscribe(previous);
            }
            caps.auth.get_session(Event::SessionRestored);
            let subscription = auth_id.clone();
            caps.auth.subscribe(auth_id, move |change| Event::AuthStateChanged {
                subscription: subscription.clone(),
                change,
            });

            let (watch_id, previous) = model.theme.start_watching();
            if let Some(previous) = previous {
                caps.appearance.unwatch(previous);
            }
            let subscription = watch_id.clone();
            caps.appearance.watch(watch_id, move |change| Event::SystemColorSchemeChanged {
                subscription: subscription.clone(),
                change,
            });

            caps.kv.get(ThemeStore::storage_key().raw(), |result| {
                Event::ThemeOverrideLoaded(result.map_err(|e| e.to_string()))
            });

            info!("core started");
        }

        fn stop(model: &mut Model, caps: &Capabilities) {
            if let Some(id) = model.session.stop() {
                caps.auth.unsubscribe(id);
            }
            if let Some(id) = model.theme.stop_watching() {
                caps.appearance.unwatch(id);
            }
            model.started = false;
            info!("core stopped");
        }

        fn on_identity_change(change: IdentityChange, model: &mut Model, caps: &Capabilities) {
            let IdentityChange::UserChanged { previous, current } = change else {
                return;
            };
            info!(
                previous = previous.as_ref().map(UserId::as_str),
                current = current.as_ref().map(UserId::as_str),
                "identity changed"
            );

            model.clear_user_data();
            model.clear_error();
            model.login.submitting = false;
            model.login.signing_out = false;

            if let Some(owner) = current {
                Self::fetch_saved_meals(owner.clone(), model, caps);
                Self::load_profile(owner, model, caps);
                if !model.discover.has_requested() {
                    Self::refresh_discover(model, caps);
                }
            }
        }

        fn fetch_saved_meals(owner: UserId, model: &mut Model, caps: &Capabilities) {
            model.saved.begin_fetch(owner.clone());
            let tag = owner.clone();
            caps.records.select(
                &model.config.users_table,
                &[SAVED_MEALS_COLUMN],
                owner,
                move |result| Event::SavedMealsFetched { owner: tag, result },
            );
        }

        fn load_profile(owner: UserId, model: &mut Model, caps: &Capabilities) {
            model.profile.begin_load(owner.clone());
            let tag = owner.clone();
            caps.records.select(
                &model.config.profiles_table,
                &PROFILE_COLUMNS,
                owner,
                move |result| Event::ProfileFetched { owner: tag, result },
            );
        }

        fn send_saved_write(
            write: Result<Option<PendingWrite>, SavedMealsError>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match write {
                Ok(Some(PendingWrite {
                    id, meals, record, ..
                })) => {
                    debug!(write = %id, count = meals.len(), "writing saved meals");
                    caps.records.upsert(&model.config.users_table, record, move |result| {
                        Event::SavedMealsWritten { write: id, result }
                    });
                }
                Ok(None) => debug!("saved meals unchanged; nothing to write"),
                Err(e) => {
                    warn!(error = %e, "saved meals change rejected");
                    model.set_error(e.into());
                }
            }
        }

        fn refresh_discover(model: &mut Model, caps: &Capabilities) {
            let url = match model
                .config
                .recipe_api()
                .and_then(|api| api.endpoint("random.php", &[]))
            {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build discover request");
                    model.set_error(e.into());
                    return;
                }
            };

            let size = model.config.discover_batch_size;
            let Some(batch) = model.discover.begin_refresh(size) else {
                debug!("discover batch already in flight");
                return;
            };
            debug!(batch, size, "requesting discover batch");
            for _ in 0..size {
                caps.http
                    .get(&url)
                    .expect_json::<MealsResponse>()
                    .send(move |result| Event::RandomMealReceived {
                        batch,
                        result: take_json(result).and_then(MealsResponse::into_first),
                    });
            }
        }

        fn search(term: String, model: &mut Model, caps: &Capabilities) {
            let url = match model
                .config
                .recipe_api()
                .and_then(|api| api.endpoint("search.php", &[("s", term.as_str())]))
            {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build search request");
                    model.search.apply_results(&term, Err(e));
                    return;
                }
            };

            debug!(term = %term, "searching meals");
            caps.http
                .get(&url)
                .expect_json::<MealsResponse>()
                .send(move |result| Event::SearchResultsReceived {
                    term,
                    result: take_json(result).map(MealsResponse::into_meals),
                });
        }

        fn credentials(email: &str, password: Password, model: &mut Model) -> Option<Credentials> {
            match Credentials::new(email, password) {
                Ok(credentials) => Some(credentials),
                Err(e) => {
                    Self::auth_failed(e, model);
                    None
                }
            }
        }

        fn auth_failed(error: AuthError, model: &mut Model) {
            warn!(error = %error, "authentication failed");
            model.login.submitting = false;
            model.alert = Some(Alert::new(AUTH_ALERT_TITLE, error.provider_message()));
            model.set_error(error.into());
        }

        fn upload_failed(error: ProfileError, model: &mut Model) {
            let error = AppError::from(error);
            warn!(error = %error, "avatar upload failed");
            model.alert = Some(Alert::new(UPLOAD_ALERT_TITLE, error.message.clone()));
            model.set_error(error);
        }

        fn upload_avatar(
            owner: UserId,
            upload: AvatarUpload,
            bytes: &[u8],
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match normalize_avatar(&model.config.avatar, bytes) {
                Ok(jpeg) => {
                    debug!(path = %upload.path, size = jpeg.len(), "uploading avatar");
                    let editor = upload.editor;
                    caps.object_store.upload(
                        &model.config.avatars_bucket,
                        upload.path,
                        jpeg,
                        AVATAR_CONTENT_TYPE,
                        move |result| Event::AvatarUploaded {
                            owner,
                            editor,
                            result,
                        },
                    );
                }
                Err(e) => {
                    model.profile.cancel_upload(upload.editor);
                    let error = AppError::from(e);
                    warn!(error = %error, "avatar could not be prepared");
                    model.alert = Some(Alert::new(UPLOAD_ALERT_TITLE, error.user_facing_message()));
                    model.set_error(error);
                }
            }
        }

        fn owns(model: &Model, owner: &UserId) -> bool {
            let current = model.current_user_id() == Some(owner);
            if !current {
                debug!(%owner, "dropping response for a previous user");
            }
            current
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(
                event = event.name(),
                user_initiated = event.is_user_initiated(),
                "update"
            );

            match event {
                Event::Noop => return,

                Event::Configure(config) => match config.validate() {
                    Ok(()) => {
                        info!(api = %config.recipe_api_base, "configuration applied");
                        model.config = config;
                    }
                    Err(e) => {
                        warn!(error = %e, "configuration rejected");
                        model.set_error(e.into());
                    }
                },

                Event::AppStarted => Self::start(model, caps),

                Event::AppStopped => Self::stop(model, caps),

                Event::AlertDismissed => model.alert = None,

                // --- Session ---
                Event::SessionRestored(result) => {
                    if let Err(e) = &result {
                        warn!(error = %e, "session restore failed; treating as signed out");
                    }
                    let change = model.session.apply_restored(result);
                    Self::on_identity_change(change, model, caps);
                }

                Event::AuthStateChanged {
                    subscription,
                    change,
                } => {
                    let change = model.session.apply_notification(&subscription, change);
                    if change == IdentityChange::Unchanged {
                        return;
                    }
                    Self::on_identity_change(change, model, caps);
                }

                Event::LoginModeToggled => model.login.mode = model.login.mode.toggled(),

                Event::SignInRequested { email, password } => {
                    if model.login.submitting {
                        return;
                    }
                    if let Some(credentials) = Self::credentials(&email, password, model) {
                        model.login.submitting = true;
                        caps.auth.sign_in(credentials, Event::SignedIn);
                    }
                }

                Event::SignUpRequested { email, password } => {
                    if model.login.submitting {
                        return;
                    }
                    if let Some(credentials) = Self::credentials(&email, password, model) {
                        model.login.submitting = true;
                        let Credentials { email, password } = credentials.clone();
                        caps.auth.sign_up(credentials, move |result| Event::SignedUp {
                            email,
                            password,
                            result,
                        });
                    }
                }

                Event::SignedUp {
                    email,
                    password,
                    result,
                } => match result {
                    Ok(()) => {
                        info!("account created; signing in");
                        if let Some(credentials) = Self::credentials(&email, password, model) {
                            caps.auth.sign_in(credentials, Event::SignedIn);
                        }
                    }
                    Err(e) => Self::auth_failed(e, model),
                },

                Event::SignedIn(result) => match result {
                    // The identity itself arrives on the auth stream.
                    Ok(_) => {
                        info!("signed in");
                        model.login.submitting = false;
                    }
                    Err(e) => Self::auth_failed(e, model),
                },

                Event::SignOutRequested => {
                    model.login.signing_out = true;
                    caps.auth.sign_out(Event::SignedOut);
                }

                Event::SignedOut(result) => {
                    model.login.signing_out = false;
                    match result {
                        Ok(()) => info!("sign-out accepted"),
                        Err(e) => {
                            warn!(error = %e, "sign-out failed");
                            model.set_error(
                                AppError::new(ErrorKind::Authentication, e.provider_message())
                                    .with_internal(e.to_string())
                                    .with_context("operation", "sign_out"),
                            );
                        }
                    }
                }

                // --- Saved meals ---
                Event::SavedMealsFetched { owner, result } => {
                    match model.saved.apply_fetch(&owner, result) {
                        FetchOutcome::Loaded { count } => debug!(%owner, count, "saved meals loaded"),
                        FetchOutcome::Failed(e) => model.set_error(e.into()),
                        FetchOutcome::Stale => return,
                    }
                }

                Event::SavedMealsRetryRequested => {
                    let Some(owner) = model.current_user_id().cloned() else {
                        return;
                    };
                    Self::fetch_saved_meals(owner, model, caps);
                }

                Event::AddSavedMeal(meal) => {
                    let write = model.saved.prepare_add(meal);
                    Self::send_saved_write(write, model, caps);
                }

                Event::RemoveSavedMeal(id) => {
                    let write = model.saved.prepare_remove(&id);
                    Self::send_saved_write(write, model, caps);
                }

                Event::ToggleSavedMeal(id) => {
                    let Some(meal) = model.find_meal(&id).cloned() else {
                        warn!(meal = %id, "cannot toggle a meal that is not loaded");
                        return;
                    };
                    let write = model.saved.prepare_toggle(meal);
                    Self::send_saved_write(write, model, caps);
                }

                Event::SavedMealsWritten { write, result } => {
                    match model.saved.complete_write(write, result) {
                        Ok(WriteOutcome::Applied { count }) => {
                            debug!(%write, count, "saved meals write applied");
                        }
                        Ok(WriteOutcome::Discarded) => return,
                        Err(e) => model.set_error(e.into()),
                    }
                }

                // --- Theme ---
                Event::ThemeToggled => {
                    let scheme = model.theme.toggle();
                    debug!(scheme = scheme.as_str(), "theme toggled");
                    match ThemeStore::encode(scheme) {
                        Ok(value) => caps.kv.set(
                            ThemeStore::storage_key().raw(),
                            value,
                            |result| {
                                Event::ThemeOverridePersisted(
                                    result.map(|_| ()).map_err(|e| e.to_string()),
                                )
                            },
                        ),
                        Err(e) => {
                            model.theme.apply_persisted(Err(e.clone()));
                            model.set_error(e.into());
                        }
                    }
                }

                Event::ThemeOverrideLoaded(result) => {
                    let outcome = model.theme.apply_loaded(result.map_err(KvError::storage));
                    debug!(?outcome, "theme override loaded");
                }

                Event::ThemeOverridePersisted(result) => {
                    model.theme.apply_persisted(result.map_err(KvError::storage));
                    if let Some(e) = model.theme.persist_error() {
                        model.set_error(e.clone().into());
                    }
                }

                Event::SystemColorSchemeChanged {
                    subscription,
                    change,
                } => {
                    if !model.theme.apply_device_change(&subscription, change) {
                        return;
                    }
                }

                // --- Discover / search / detail ---
                Event::DiscoverRefreshRequested => Self::refresh_discover(model, caps),

                Event::RandomMealReceived { batch, result } => {
                    match model.discover.apply_response(batch, result) {
                        BatchProgress::Stale | BatchProgress::Pending { .. } => return,
                        BatchProgress::Completed { count } => {
                            info!(batch, count, "discover batch loaded");
                        }
                        BatchProgress::Failed { error } => {
                            warn!(batch, error = %error, "discover batch failed; keeping previous meals");
                            model.set_error(error.into());
                        }
                    }
                }

                Event::SearchQueryChanged(query) | Event::RecentSearchSelected(query) => {
                    if let Some(term) = model.search.set_query(query) {
                        Self::search(term, model, caps);
                    }
                }

                Event::SearchSubmitted => {
                    let limit = model.config.recent_search_limit;
                    model.search.submit(limit);
                }

                Event::SearchResultsReceived { term, result } => {
                    match model.search.apply_results(&term, result) {
                        SearchOutcome::Stale => {
                            debug!(term = %term, "dropping stale search results");
                            return;
                        }
                        SearchOutcome::Loaded { count } => debug!(term = %term, count, "search results"),
                        SearchOutcome::Failed { error } => {
                            warn!(term = %term, error = %error, "search failed");
                            model.set_error(error.into());
                        }
                    }
                }

                Event::MealSelected(id) => {
                    let Some(meal) = model.find_meal(&id).cloned() else {
                        warn!(meal = %id, "selected meal is not loaded");
                        return;
                    };
                    model.selected_meal = Some(meal);
                }

                Event::MealDeselected => model.selected_meal = None,

                // --- Profile ---
                Event::ProfileRefreshRequested => {
                    let Some(owner) = model.current_user_id().cloned() else {
                        return;
                    };
                    Self::load_profile(owner, model, caps);
                }

                Event::ProfileFetched { owner, result } => {
                    match model.profile.apply_loaded(&owner, result) {
                        Ok(true) => debug!(%owner, "profile loaded"),
                        Ok(false) => return,
                        Err(e) => model.set_error(e.into()),
                    }
                }

                Event::ProfileEditStarted => model.profile.start_editing(),

                Event::ProfileEditFinished => model.profile.stop_editing(),

                Event::ProfileFieldEdited { field, value } => {
                    if let Err(e) = model.profile.edit_field(field, value) {
                        debug!(error = %e, "profile edit rejected");
                        model.set_error(e.into());
                    }
                }

                Event::AvatarPicked {
                    bytes,
                    picked_at_ms,
                } => {
                    let Some(owner) = model.current_user_id().cloned() else {
                        warn!("avatar picked without a signed-in user");
                        return;
                    };
                    match model.profile.begin_upload(&owner, picked_at_ms) {
                        Ok(upload) => Self::upload_avatar(owner, upload, &bytes, model, caps),
                        Err(e) => {
                            debug!(error = %e, "avatar not accepted");
                            model.set_error(e.into());
                        }
                    }
                }

                Event::AvatarUploaded {
                    owner,
                    editor,
                    result,
                } => {
                    if !Self::owns(model, &owner) {
                        return;
                    }
                    if !model.profile.upload_pending(editor) {
                        debug!(editor, "dropping upload for a closed editor");
                        return;
                    }
                    match result {
                        Ok(path) => caps.object_store.public_url(
                            &model.config.avatars_bucket,
                            path,
                            move |result| Event::AvatarUrlResolved {
                                owner,
                                editor,
                                result,
                            },
                        ),
                        Err(e) => {
                            if let Err(e) = model.profile.finish_upload(editor, Err(e)) {
                                Self::upload_failed(e, model);
                            }
                        }
                    }
                }

                Event::AvatarUrlResolved {
                    owner,
                    editor,
                    result,
                } => {
                    if !Self::owns(model, &owner) {
                        return;
                    }
                    match model.profile.finish_upload(editor, result) {
                        Ok(true) => info!(%owner, "avatar uploaded"),
                        Ok(false) => return,
                        Err(e) => Self::upload_failed(e, model),
                    }
                }

                Event::ProfileSaveRequested => {
                    let Some(owner) = model.current_user_id().cloned() else {
                        return;
                    };
                    match model.profile.begin_save(&owner) {
                        Ok(record) => {
                            let tag = owner.clone();
                            caps.records.upsert(&model.config.profiles_table, record, move |result| {
                                Event::ProfileSaved { owner: tag, result }
                            });
                        }
                        Err(e) => {
                            debug!(%owner, error = %e, "profile save not started");
                            model.set_error(e.into());
                        }
                    }
                }

                Event::ProfileSaved { owner, result } => {
                    if !Self::owns(model, &owner) {
                        return;
                    }
                    match model.profile.complete_save(result) {
                        Ok(()) => info!(%owner, "profile saved"),
                        Err(e) => {
                            let error = AppError::from(e);
                            warn!(%owner, error = %error, "profile save failed");
                            model.alert = Some(Alert::new(SAVE_ALERT_TITLE, error.message.clone()));
                            model.set_error(error);
                        }
                    }
                }
            }

            caps.render.render();
        }

        fn view(&self, model: &Model) -> ViewModel {
            ViewModel::new(model)
        }
    }
}
