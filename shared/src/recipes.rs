//! TheMealDB records plus the discover and search screens built on them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capabilities::RecipeApiError;
use crate::model::MealId;

pub const MAX_INGREDIENTS: usize = 20;

/// One recipe. Fields the app does not read are kept in `extra` so a meal
/// written back to the saved list keeps everything the API returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "idMeal")]
    pub id: MealId,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strCategory", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "strArea", default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(rename = "strMealThumb", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub measure: Option<String>,
}

impl Ingredient {
    /// `"1 cup Rice"`, or just the name when no measure was given.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.measure {
            Some(measure) => format!("{measure} {}", self.name),
            None => self.name.clone(),
        }
    }
}

impl Meal {
    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numbered ingredient/measure slots, skipping blank ingredients.
    #[must_use]
    pub fn ingredients(&self) -> Vec<Ingredient> {
        (1..=MAX_INGREDIENTS)
            .filter_map(|i| {
                let name = self.extra_str(&format!("strIngredient{i}"))?;
                Some(Ingredient {
                    name: name.to_string(),
                    measure: self
                        .extra_str(&format!("strMeasure{i}"))
                        .map(ToString::to_string),
                })
            })
            .collect()
    }

    /// Instruction text split into non-blank lines.
    #[must_use]
    pub fn instruction_steps(&self) -> Vec<String> {
        self.instructions
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

/// Body of both `random.php` and `search.php`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MealsResponse {
    #[serde(default)]
    pub meals: Option<Vec<Meal>>,
}

impl MealsResponse {
    #[must_use]
    pub fn into_meals(self) -> Vec<Meal> {
        self.meals.unwrap_or_default()
    }

    /// `random.php` returns a one-element list.
    pub fn into_first(self) -> Result<Meal, RecipeApiError> {
        self.into_meals()
            .into_iter()
            .next()
            .ok_or(RecipeApiError::NoMeals)
    }
}

// --- Discover ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchProgress {
    /// Response for a batch that is no longer current.
    Stale,
    Pending { remaining: usize },
    Completed { count: usize },
    Failed { error: RecipeApiError },
}

#[derive(Debug, Clone)]
struct PendingBatch {
    generation: u64,
    expected: usize,
    arrived: usize,
    meals: Vec<Meal>,
    first_error: Option<RecipeApiError>,
}

/// Random suggestions fetched as a batch of parallel requests. A batch only
/// replaces the shown meals when every request in it succeeded.
#[derive(Debug, Clone, Default)]
pub struct DiscoverState {
    meals: Vec<Meal>,
    batch: Option<PendingBatch>,
    next_generation: u64,
    error: Option<RecipeApiError>,
    requested: bool,
}

impl DiscoverState {
    #[must_use]
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.batch.is_some()
    }

    #[must_use]
    pub fn error(&self) -> Option<&RecipeApiError> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn has_requested(&self) -> bool {
        self.requested
    }

    /// Starts a batch of `size` requests; `None` while one is in flight.
    pub fn begin_refresh(&mut self, size: usize) -> Option<u64> {
        if self.batch.is_some() || size == 0 {
            return None;
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.requested = true;
        self.batch = Some(PendingBatch {
            generation,
            expected: size,
            arrived: 0,
            meals: Vec::with_capacity(size),
            first_error: None,
        });
        Some(generation)
    }

    pub fn apply_response(
        &mut self,
        generation: u64,
        result: Result<Meal, RecipeApiError>,
    ) -> BatchProgress {
        let Some(batch) = self.batch.as_mut().filter(|b| b.generation == generation) else {
            return BatchProgress::Stale;
        };

        batch.arrived += 1;
        match result {
            Ok(meal) => batch.meals.push(meal),
            Err(e) => {
                batch.first_error.get_or_insert(e);
            }
        }

        if batch.arrived < batch.expected {
            return BatchProgress::Pending {
                remaining: batch.expected - batch.arrived,
            };
        }

        let Some(done) = self.batch.take() else {
            return BatchProgress::Stale;
        };
        match done.first_error {
            Some(error) => {
                self.error = Some(error.clone());
                BatchProgress::Failed { error }
            }
            None => {
                self.error = None;
                self.meals = done.meals;
                BatchProgress::Completed {
                    count: self.meals.len(),
                }
            }
        }
    }
}

// --- Search ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Stale,
    Loaded { count: usize },
    Failed { error: RecipeApiError },
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    in_flight: Option<String>,
    results: Vec<Meal>,
    searched: bool,
    error: Option<RecipeApiError>,
    recent: Vec<String>,
}

impl SearchState {
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn results(&self) -> &[Meal] {
        &self.results
    }

    #[must_use]
    pub fn recent(&self) -> &[String] {
        &self.recent
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn error(&self) -> Option<&RecipeApiError> {
        self.error.as_ref()
    }

    /// True once a response for the current query has been applied.
    #[must_use]
    pub const fn has_searched(&self) -> bool {
        self.searched
    }

    /// Updates the query and returns the term to fetch, if any. A blank
    /// query clears the results without a request.
    pub fn set_query(&mut self, query: impl Into<String>) -> Option<String> {
        self.query = query.into();
        let term = self.query.trim().to_string();
        self.error = None;
        self.searched = false;

        if term.is_empty() {
            self.results.clear();
            self.in_flight = None;
            return None;
        }
        self.in_flight = Some(term.clone());
        Some(term)
    }

    /// Applies the response for `term` if it is still the one being waited on.
    pub fn apply_results(
        &mut self,
        term: &str,
        result: Result<Vec<Meal>, RecipeApiError>,
    ) -> SearchOutcome {
        if self.in_flight.as_deref() != Some(term) {
            return SearchOutcome::Stale;
        }
        self.in_flight = None;
        self.searched = true;

        match result {
            Ok(meals) => {
                self.results = meals;
                SearchOutcome::Loaded {
                    count: self.results.len(),
                }
            }
            Err(error) => {
                self.results.clear();
                self.error = Some(error.clone());
                SearchOutcome::Failed { error }
            }
        }
    }

    /// Remembers the current query: newest first, no duplicates, at most `limit`.
    pub fn submit(&mut self, limit: usize) {
        let term = self.query.trim();
        if term.is_empty() || self.recent.iter().any(|r| r == term) {
            return;
        }
        self.recent.insert(0, term.to_string());
        self.recent.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn meal(id: &str) -> Meal {
        serde_json::from_value(json!({ "idMeal": id, "strMeal": format!("Meal {id}") })).unwrap()
    }

    fn api_error() -> RecipeApiError {
        RecipeApiError::Request {
            message: "timeout".into(),
        }
    }

    mod meal_tests {
        use super::*;

        #[test]
        fn unknown_fields_survive_round_trip() {
            let raw = json!({
                "idMeal": "52772",
                "strMeal": "Teriyaki Chicken Casserole",
                "strCategory": "Chicken",
                "strArea": "Japanese",
                "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
                "strTags": "Meat,Casserole",
                "strYoutube": "https://www.youtube.com/watch?v=4aZr5hZXP_s",
                "strIngredient1": "soy sauce",
                "strMeasure1": "3/4 cup",
                "dateModified": null
            });
            let parsed: Meal = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(parsed.id, MealId::new("52772"));
            assert_eq!(parsed.category.as_deref(), Some("Chicken"));
            assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
        }

        #[test]
        fn ingredients_skip_blank_slots() {
            let parsed: Meal = serde_json::from_value(json!({
                "idMeal": "1",
                "strMeal": "Rice",
                "strIngredient1": "Rice",
                "strMeasure1": " 1 cup ",
                "strIngredient2": "  ",
                "strMeasure2": "pinch",
                "strIngredient3": "Salt",
                "strMeasure3": "",
                "strIngredient4": null
            }))
            .unwrap();

            let ingredients = parsed.ingredients();
            assert_eq!(
                ingredients,
                vec![
                    Ingredient {
                        name: "Rice".into(),
                        measure: Some("1 cup".into())
                    },
                    Ingredient {
                        name: "Salt".into(),
                        measure: None
                    },
                ]
            );
            assert_eq!(ingredients[0].label(), "1 cup Rice");
            assert_eq!(ingredients[1].label(), "Salt");
        }

        #[test]
        fn instructions_split_on_line_breaks() {
            let parsed: Meal = serde_json::from_value(json!({
                "idMeal": "1",
                "strMeal": "Toast",
                "strInstructions": "Slice bread.\r\n\r\nToast it.\nButter it.  \r\n"
            }))
            .unwrap();
            assert_eq!(
                parsed.instruction_steps(),
                vec!["Slice bread.", "Toast it.", "Butter it."]
            );
            assert!(meal("2").instruction_steps().is_empty());
        }

        #[test]
        fn null_meals_is_empty() {
            let response: MealsResponse = serde_json::from_str(r#"{"meals":null}"#).unwrap();
            assert!(response.clone().into_meals().is_empty());
            assert_eq!(response.into_first(), Err(RecipeApiError::NoMeals));
        }
    }

    mod discover_tests {
        use super::*;

        #[test]
        fn batch_replaces_meals_when_complete() {
            let mut discover = DiscoverState::default();
            let generation = discover.begin_refresh(3).unwrap();
            assert!(discover.is_loading());
            assert_eq!(
                discover.apply_response(generation, Ok(meal("1"))),
                BatchProgress::Pending { remaining: 2 }
            );
            discover.apply_response(generation, Ok(meal("2")));
            assert_eq!(
                discover.apply_response(generation, Ok(meal("3"))),
                BatchProgress::Completed { count: 3 }
            );
            assert!(!discover.is_loading());
            let ids: Vec<_> = discover.meals().iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["1", "2", "3"]);
        }

        #[test]
        fn refresh_ignored_while_loading() {
            let mut discover = DiscoverState::default();
            assert!(discover.begin_refresh(2).is_some());
            assert!(discover.begin_refresh(2).is_none());
        }

        #[test]
        fn one_failure_keeps_previous_meals() {
            let mut discover = DiscoverState::default();
            let first = discover.begin_refresh(1).unwrap();
            discover.apply_response(first, Ok(meal("old")));

            let second = discover.begin_refresh(2).unwrap();
            discover.apply_response(second, Ok(meal("new")));
            let progress = discover.apply_response(second, Err(api_error()));

            assert!(matches!(progress, BatchProgress::Failed { .. }));
            assert_eq!(discover.meals()[0].id.as_str(), "old");
            assert!(discover.error().is_some());
            assert!(!discover.is_loading());
        }

        #[test]
        fn stale_generation_ignored() {
            let mut discover = DiscoverState::default();
            let first = discover.begin_refresh(1).unwrap();
            discover.apply_response(first, Ok(meal("1")));
            let _second = discover.begin_refresh(1).unwrap();
            assert_eq!(
                discover.apply_response(first, Ok(meal("x"))),
                BatchProgress::Stale
            );
        }

        #[test]
        fn batch_keeps_arrival_order_and_repeats() {
            let mut discover = DiscoverState::default();
            let generation = discover.begin_refresh(3).unwrap();
            discover.apply_response(generation, Ok(meal("2")));
            discover.apply_response(generation, Ok(meal("1")));
            assert_eq!(
                discover.apply_response(generation, Ok(meal("2"))),
                BatchProgress::Completed { count: 3 }
            );
            let ids: Vec<&str> = discover.meals().iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, ["2", "1", "2"]);
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn blank_query_clears_without_request() {
            let mut search = SearchState::default();
            let term = search.set_query("curry").unwrap();
            search.apply_results(&term, Ok(vec![meal("1")]));
            assert_eq!(search.results().len(), 1);

            assert_eq!(search.set_query("   "), None);
            assert!(search.results().is_empty());
            assert!(!search.is_loading());
        }

        #[test]
        fn stale_responses_are_dropped() {
            let mut search = SearchState::default();
            let first = search.set_query("chi").unwrap();
            let second = search.set_query("chicken").unwrap();

            assert_eq!(
                search.apply_results(&first, Ok(vec![meal("old")])),
                SearchOutcome::Stale
            );
            assert!(search.results().is_empty());
            assert!(search.is_loading());

            assert_eq!(
                search.apply_results(&second, Ok(vec![meal("1"), meal("2")])),
                SearchOutcome::Loaded { count: 2 }
            );
            assert!(search.has_searched());
        }

        #[test]
        fn query_is_trimmed_for_requests() {
            let mut search = SearchState::default();
            assert_eq!(search.set_query("  pie "), Some("pie".into()));
            assert_eq!(search.query(), "  pie ");
        }

        #[test]
        fn failed_search_reports_error() {
            let mut search = SearchState::default();
            let term = search.set_query("pie").unwrap();
            assert!(matches!(
                search.apply_results(&term, Err(api_error())),
                SearchOutcome::Failed { .. }
            ));
            assert!(search.error().is_some());
        }

        #[test]
        fn recent_searches_newest_first_without_duplicates() {
            let mut search = SearchState::default();
            for q in ["a", "b", "a", "c"] {
                search.set_query(q);
                search.submit(5);
            }
            assert_eq!(search.recent(), &["c", "b", "a"]);

            search.set_query("");
            search.submit(5);
            assert_eq!(search.recent().len(), 3);
        }
    }

    proptest! {
        #[test]
        fn recent_searches_stay_bounded_and_unique(
            queries in prop::collection::vec("[a-e]{1,2}", 0..30),
            limit in 1usize..8,
        ) {
            let mut search = SearchState::default();
            for q in &queries {
                search.set_query(q.as_str());
                search.submit(limit);
            }
            let recent = search.recent();
            prop_assert!(recent.len() <= limit);
            let mut sorted = recent.to_vec();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), recent.len());
            if let Some(last) = queries.last() {
                prop_assert!(recent.contains(last));
            }
        }
    }
}
