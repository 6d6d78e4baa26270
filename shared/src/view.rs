use serde::Serialize;

use crate::capabilities::ColorScheme;
use crate::model::{Alert, Model};
use crate::profile::ProfileEditor;
use crate::recipes::{Ingredient, Meal};
use crate::saved_meals::SyncState;
use crate::session::{Identity, LoginMode};
use crate::theme::{palette, Palette};
use crate::{AppError, ErrorSeverity};

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "route")]
pub enum Route {
    Splash,
    Login { mode: LoginMode, submitting: bool },
    Main,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

fn code_of<E>(error: Option<&E>) -> Option<String>
where
    E: Clone + Into<AppError>,
{
    error.map(|e| {
        let error: AppError = e.clone().into();
        error.code().to_string()
    })
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ThemeView {
    pub scheme: ColorScheme,
    pub palette: Palette,
    pub has_override: bool,
    pub persist_error: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MealCard {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub thumbnail: Option<String>,
    pub is_saved: bool,
}

impl MealCard {
    fn new(meal: &Meal, model: &Model) -> Self {
        Self {
            id: meal.id.to_string(),
            name: meal.name.clone(),
            category: meal.category.clone(),
            area: meal.area.clone(),
            thumbnail: meal.thumbnail.clone(),
            is_saved: model.saved.is_saved(&meal.id),
        }
    }

    fn list(meals: &[Meal], model: &Model) -> Vec<Self> {
        meals.iter().map(|m| Self::new(m, model)).collect()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DiscoverView {
    pub meals: Vec<MealCard>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<MealCard>,
    pub recent: Vec<String>,
    /// Recent searches replace the results while the query is empty.
    pub show_recent: bool,
    pub is_loading: bool,
    pub is_empty: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SavedView {
    pub meals: Vec<MealCard>,
    pub state: &'static str,
    pub is_loading: bool,
    pub pending_writes: usize,
    pub sync_error: Option<String>,
    pub write_error: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MealDetailView {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub thumbnail: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub is_saved: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProfileEditorView {
    pub full_name: String,
    pub username: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub uploading: bool,
    pub saving: bool,
    pub saved: bool,
    pub can_save: bool,
}

impl From<&ProfileEditor> for ProfileEditorView {
    fn from(editor: &ProfileEditor) -> Self {
        Self {
            full_name: editor.draft.full_name.clone(),
            username: editor.draft.username.clone(),
            bio: editor.draft.bio.clone(),
            avatar_url: editor.draft.avatar_url.clone(),
            uploading: editor.uploading,
            saving: editor.saving,
            saved: editor.saved,
            can_save: !editor.is_busy(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProfileView {
    pub display_name: String,
    pub handle: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub editor: Option<ProfileEditorView>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ViewModel {
    pub route: Route,
    pub theme: ThemeView,
    pub discover: DiscoverView,
    pub search: SearchView,
    pub saved: SavedView,
    pub detail: Option<MealDetailView>,
    pub profile: ProfileView,
    pub alert: Option<Alert>,
    pub error: Option<UserFacingError>,
    pub signing_out: bool,
}

impl ViewModel {
    #[must_use]
    pub fn new(model: &Model) -> Self {
        Self {
            route: route(model),
            theme: theme(model),
            discover: DiscoverView {
                meals: MealCard::list(model.discover.meals(), model),
                is_loading: model.discover.is_loading(),
                error: code_of(model.discover.error()),
            },
            search: search(model),
            saved: SavedView {
                meals: MealCard::list(model.saved.meals(), model),
                state: model.saved.state().name(),
                is_loading: matches!(model.saved.state(), SyncState::Fetching { .. }),
                pending_writes: model.saved.pending_writes(),
                sync_error: code_of(model.saved.fetch_error()),
                write_error: code_of(model.saved.last_write_error()),
            },
            detail: detail(model),
            profile: profile(model),
            alert: model.alert.clone(),
            error: model.active_error.as_ref().map(UserFacingError::from),
            signing_out: model.login.signing_out,
        }
    }
}

fn route(model: &Model) -> Route {
    match model.session.identity() {
        Identity::Loading => Route::Splash,
        Identity::Absent => Route::Login {
            mode: model.login.mode,
            submitting: model.login.submitting,
        },
        Identity::Present(_) => Route::Main,
    }
}

fn theme(model: &Model) -> ThemeView {
    let scheme = model.theme.effective();
    ThemeView {
        scheme,
        palette: *palette(scheme),
        has_override: model.theme.explicit().is_some(),
        persist_error: code_of(model.theme.persist_error()),
    }
}

fn search(model: &Model) -> SearchView {
    let state = &model.search;
    let blank = state.query().trim().is_empty();
    SearchView {
        query: state.query().to_string(),
        results: MealCard::list(state.results(), model),
        recent: state.recent().to_vec(),
        show_recent: blank && !state.recent().is_empty(),
        is_loading: state.is_loading(),
        is_empty: !blank && state.has_searched() && state.results().is_empty(),
        error: code_of(state.error()),
    }
}

fn detail(model: &Model) -> Option<MealDetailView> {
    let meal = model.selected_meal.as_ref()?;
    Some(MealDetailView {
        id: meal.id.to_string(),
        title: meal.name.clone(),
        category: meal.category.clone(),
        area: meal.area.clone(),
        thumbnail: meal.thumbnail.clone(),
        ingredients: meal.ingredients().iter().map(Ingredient::label).collect(),
        steps: meal.instruction_steps(),
        is_saved: model.saved.is_saved(&meal.id),
    })
}

fn profile(model: &Model) -> ProfileView {
    let store = &model.profile;
    let profile = store.profile();
    ProfileView {
        display_name: profile.display_name().to_string(),
        handle: profile.handle(),
        bio: profile.bio.clone().filter(|b| !b.trim().is_empty()),
        avatar_url: profile.avatar_url.clone(),
        email: model.session.user().and_then(|u| u.email.clone()),
        is_loading: store.is_loading(),
        error: code_of(store.error()),
        editor: store.editor().map(ProfileEditorView::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{RecipeApiError, RecordError, Session, User};
    use crate::model::UserId;
    use crate::recipes::MealsResponse;
    use serde_json::json;

    fn signed_in(model: &mut Model, id: &str) {
        let (subscription, _) = model.session.start();
        model.session.apply_notification(
            &subscription,
            crate::capabilities::AuthStateChange {
                seq: 1,
                session: Some(Session {
                    user: User {
                        id: UserId::new(id),
                        email: Some("cook@example.com".into()),
                    },
                    expires_at: None,
                }),
            },
        );
    }

    fn meal(id: &str, name: &str) -> Meal {
        serde_json::from_value(json!({
            "idMeal": id,
            "strMeal": name,
            "strCategory": "Seafood",
            "strInstructions": "Boil.\r\n\r\nServe.",
            "strIngredient1": "Rice",
            "strMeasure1": "1 cup",
            "strIngredient2": " ",
        }))
        .unwrap()
    }

    mod route_tests {
        use super::*;

        #[test]
        fn splash_until_identity_known() {
            let model = Model::default();
            assert_eq!(ViewModel::new(&model).route, Route::Splash);
        }

        #[test]
        fn login_when_absent() {
            let mut model = Model::default();
            model.session.apply_restored(Ok(None));
            model.login.mode = LoginMode::SignUp;
            assert_eq!(
                ViewModel::new(&model).route,
                Route::Login {
                    mode: LoginMode::SignUp,
                    submitting: false
                }
            );
        }

        #[test]
        fn main_when_present() {
            let mut model = Model::default();
            signed_in(&mut model, "u1");
            let view = ViewModel::new(&model);
            assert_eq!(view.route, Route::Main);
            assert_eq!(view.profile.email.as_deref(), Some("cook@example.com"));
        }
    }

    mod content_tests {
        use super::*;

        #[test]
        fn default_theme_is_light_palette() {
            let view = ViewModel::new(&Model::default());
            assert_eq!(view.theme.scheme, ColorScheme::Light);
            assert_eq!(view.theme.palette.background, "#f8f9fa");
            assert!(!view.theme.has_override);
        }

        #[test]
        fn saved_flags_follow_saved_list() {
            let mut model = Model::default();
            signed_in(&mut model, "u1");
            let owner = UserId::new("u1");
            model.saved.begin_fetch(owner.clone());
            model
                .saved
                .apply_fetch(&owner, Ok(json!({ "saved_meals": [meal("1", "Paella")] })));

            model.search.set_query("a");
            model.search.apply_results(
                "a",
                Ok(vec![meal("1", "Paella"), meal("2", "Arrabiata")]),
            );

            let view = ViewModel::new(&model);
            let flags: Vec<bool> = view.search.results.iter().map(|m| m.is_saved).collect();
            assert_eq!(flags, vec![true, false]);
            assert_eq!(view.saved.state, "ready");
            assert_eq!(view.saved.meals.len(), 1);
        }

        #[test]
        fn detail_lists_ingredients_and_steps() {
            let mut model = Model::default();
            model.search.set_query("paella");
            model
                .search
                .apply_results("paella", Ok(vec![meal("1", "Paella")]));
            model.selected_meal = Some(meal("1", "Paella"));

            let detail = ViewModel::new(&model).detail.unwrap();
            assert_eq!(detail.title, "Paella");
            assert_eq!(detail.ingredients, vec!["1 cup Rice".to_string()]);
            assert_eq!(detail.steps, vec!["Boil.".to_string(), "Serve.".to_string()]);
            assert!(!detail.is_saved);
        }

        #[test]
        fn recent_searches_show_for_blank_query() {
            let mut model = Model::default();
            model.search.set_query("cake");
            model.search.submit(5);
            model.search.set_query("  ");

            let view = ViewModel::new(&model).search;
            assert!(view.show_recent);
            assert_eq!(view.recent, vec!["cake".to_string()]);
            assert!(!view.is_empty);
        }

        #[test]
        fn empty_search_is_flagged() {
            let mut model = Model::default();
            model.search.set_query("zzz");
            model
                .search
                .apply_results("zzz", Ok(MealsResponse::default().into_meals()));
            assert!(ViewModel::new(&model).search.is_empty);
        }

        #[test]
        fn store_errors_exposed_as_codes() {
            let mut model = Model::default();
            signed_in(&mut model, "u1");
            let owner = UserId::new("u1");
            model.saved.begin_fetch(owner.clone());
            model.saved.apply_fetch(
                &owner,
                Err(RecordError::Network {
                    message: "offline".into(),
                }),
            );
            model.search.set_query("x");
            model.search.apply_results("x", Err(RecipeApiError::NoMeals));

            let view = ViewModel::new(&model);
            assert_eq!(view.saved.sync_error.as_deref(), Some("NETWORK_ERROR"));
            assert_eq!(view.saved.state, "fetch_failed");
            assert_eq!(view.search.error.as_deref(), Some("DESERIALIZATION_ERROR"));
        }

        #[test]
        fn profile_fallbacks() {
            let view = ViewModel::new(&Model::default()).profile;
            assert_eq!(view.display_name, "My Kitchen");
            assert!(view.handle.is_none());
            assert!(view.editor.is_none());
        }
    }
}
