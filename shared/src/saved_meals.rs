//! Mirror of the signed-in user's `saved_meals` column.
//!
//! Every mutation sends the whole next list to the backend and the local copy
//! only changes once that write succeeds. Each write is computed from the
//! local list at the moment it is issued, so two overlapping writes race and
//! whichever completes last wins, both here and remotely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::capabilities::RecordError;
use crate::model::{MealId, UserId, WriteId};
use crate::recipes::Meal;
use crate::{AppError, ErrorKind};

pub const SAVED_MEALS_COLUMN: &str = "saved_meals";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SavedMealsError {
    #[error("no signed-in user")]
    NoIdentity,
    #[error("saved meals are not loaded yet")]
    NotReady,
    #[error("failed to fetch saved meals: {0}")]
    Fetch(RecordError),
    #[error("saved meals record is malformed: {message}")]
    Decode { message: String },
    #[error("failed to encode saved meals: {message}")]
    Encode { message: String },
    #[error("failed to write saved meals: {0}")]
    Write(RecordError),
}

impl From<SavedMealsError> for AppError {
    fn from(e: SavedMealsError) -> Self {
        let kind = match &e {
            SavedMealsError::NoIdentity => ErrorKind::Authentication,
            SavedMealsError::NotReady => ErrorKind::InvalidState,
            SavedMealsError::Fetch(inner) | SavedMealsError::Write(inner) => {
                AppError::from(inner.clone()).kind
            }
            SavedMealsError::Decode { .. } => ErrorKind::Deserialization,
            SavedMealsError::Encode { .. } => ErrorKind::Serialization,
        };
        AppError::new(kind, "Could not update your saved meals").with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncState {
    #[default]
    Uninitialized,
    Fetching {
        owner: UserId,
    },
    Ready {
        owner: UserId,
        meals: Vec<Meal>,
    },
    FetchFailed {
        owner: UserId,
        error: SavedMealsError,
    },
}

impl SyncState {
    #[must_use]
    pub fn owner(&self) -> Option<&UserId> {
        match self {
            SyncState::Uninitialized => None,
            SyncState::Fetching { owner }
            | SyncState::Ready { owner, .. }
            | SyncState::FetchFailed { owner, .. } => Some(owner),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            SyncState::Uninitialized => "uninitialized",
            SyncState::Fetching { .. } => "fetching",
            SyncState::Ready { .. } => "ready",
            SyncState::FetchFailed { .. } => "fetch_failed",
        }
    }
}

/// Row shape of the `users` table as far as this store is concerned.
#[derive(Debug, Serialize, Deserialize)]
struct UserMealsRecord {
    #[serde(default)]
    id: Option<UserId>,
    #[serde(default)]
    saved_meals: Option<Vec<Meal>>,
}

/// A whole-list replacement to hand to the records capability.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub id: WriteId,
    pub owner: UserId,
    pub meals: Vec<Meal>,
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded { count: usize },
    Failed(SavedMealsError),
    /// Response for a user or request that is no longer current.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied { count: usize },
    /// The write finished after a sign-out or user switch.
    Discarded,
}

#[derive(Debug, Clone)]
struct InFlightWrite {
    owner: UserId,
    meals: Vec<Meal>,
}

#[derive(Debug, Clone, Default)]
pub struct SavedMealsStore {
    state: SyncState,
    in_flight: BTreeMap<WriteId, InFlightWrite>,
    next_write: u64,
    last_write_error: Option<SavedMealsError>,
}

impl SavedMealsStore {
    #[must_use]
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Current list; empty unless loaded.
    #[must_use]
    pub fn meals(&self) -> &[Meal] {
        match &self.state {
            SyncState::Ready { meals, .. } => meals,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_saved(&self, id: &MealId) -> bool {
        self.meals().iter().any(|m| &m.id == id)
    }

    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub fn last_write_error(&self) -> Option<&SavedMealsError> {
        self.last_write_error.as_ref()
    }

    #[must_use]
    pub fn fetch_error(&self) -> Option<&SavedMealsError> {
        match &self.state {
            SyncState::FetchFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Forgets everything, including writes still in flight.
    pub fn reset(&mut self) {
        self.state = SyncState::Uninitialized;
        self.in_flight.clear();
        self.last_write_error = None;
    }

    pub fn begin_fetch(&mut self, owner: UserId) {
        if self.state.owner() != Some(&owner) {
            self.in_flight.clear();
            self.last_write_error = None;
        }
        self.state = SyncState::Fetching { owner };
    }

    pub fn apply_fetch(
        &mut self,
        owner: &UserId,
        result: Result<serde_json::Value, RecordError>,
    ) -> FetchOutcome {
        if !matches!(&self.state, SyncState::Fetching { owner: current } if current == owner) {
            debug!(%owner, state = self.state.name(), "ignoring stale saved meals fetch");
            return FetchOutcome::Stale;
        }

        let loaded = match result {
            Ok(row) => serde_json::from_value::<UserMealsRecord>(row)
                .map(|record| record.saved_meals.unwrap_or_default())
                .map_err(|e| SavedMealsError::Decode {
                    message: e.to_string(),
                }),
            // A user who never saved anything has no row yet.
            Err(RecordError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(SavedMealsError::Fetch(e)),
        };

        match loaded {
            Ok(meals) => {
                let count = meals.len();
                self.state = SyncState::Ready {
                    owner: owner.clone(),
                    meals,
                };
                FetchOutcome::Loaded { count }
            }
            Err(error) => {
                warn!(%owner, error = %error, "saved meals fetch failed");
                self.state = SyncState::FetchFailed {
                    owner: owner.clone(),
                    error: error.clone(),
                };
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Appends `meal`. `Ok(None)` when it is already saved.
    pub fn prepare_add(&mut self, meal: Meal) -> Result<Option<PendingWrite>, SavedMealsError> {
        let (owner, meals) = self.ready()?;
        if meals.iter().any(|m| m.id == meal.id) {
            return Ok(None);
        }
        let mut next = meals.to_vec();
        next.push(meal);
        let owner = owner.clone();
        self.issue(owner, next).map(Some)
    }

    /// Removes every entry with `id`. `Ok(None)` when nothing matches.
    pub fn prepare_remove(&mut self, id: &MealId) -> Result<Option<PendingWrite>, SavedMealsError> {
        let (owner, meals) = self.ready()?;
        if !meals.iter().any(|m| &m.id == id) {
            return Ok(None);
        }
        let next: Vec<Meal> = meals.iter().filter(|m| &m.id != id).cloned().collect();
        let owner = owner.clone();
        self.issue(owner, next).map(Some)
    }

    /// Removes `meal` if it is saved, adds it otherwise.
    pub fn prepare_toggle(&mut self, meal: Meal) -> Result<Option<PendingWrite>, SavedMealsError> {
        if self.is_saved(&meal.id) {
            self.prepare_remove(&meal.id)
        } else {
            self.prepare_add(meal)
        }
    }

    /// Applies the result of write `id`. On success the local list becomes
    /// exactly the list that write carried.
    pub fn complete_write(
        &mut self,
        id: WriteId,
        result: Result<(), RecordError>,
    ) -> Result<WriteOutcome, SavedMealsError> {
        let Some(InFlightWrite { owner, meals }) = self.in_flight.remove(&id) else {
            debug!(write = %id, "write finished after reset; discarding");
            return Ok(WriteOutcome::Discarded);
        };

        if let Err(e) = result {
            let error = SavedMealsError::Write(e);
            warn!(write = %id, %owner, error = %error, "saved meals write failed");
            self.last_write_error = Some(error.clone());
            return Err(error);
        }

        match &mut self.state {
            SyncState::Ready {
                owner: current,
                meals: current_meals,
            } if *current == owner => {
                *current_meals = meals;
                self.last_write_error = None;
                Ok(WriteOutcome::Applied {
                    count: current_meals.len(),
                })
            }
            _ => Ok(WriteOutcome::Discarded),
        }
    }

    fn ready(&self) -> Result<(&UserId, &[Meal]), SavedMealsError> {
        match &self.state {
            SyncState::Ready { owner, meals } => Ok((owner, meals)),
            SyncState::Uninitialized => Err(SavedMealsError::NoIdentity),
            SyncState::Fetching { .. } | SyncState::FetchFailed { .. } => {
                Err(SavedMealsError::NotReady)
            }
        }
    }

    fn issue(&mut self, owner: UserId, meals: Vec<Meal>) -> Result<PendingWrite, SavedMealsError> {
        let record = serde_json::to_value(UserMealsRecord {
            id: Some(owner.clone()),
            saved_meals: Some(meals.clone()),
        })
        .map_err(|e| SavedMealsError::Encode {
            message: e.to_string(),
        })?;

        let id = WriteId(self.next_write);
        self.next_write += 1;
        self.in_flight.insert(
            id,
            InFlightWrite {
                owner: owner.clone(),
                meals: meals.clone(),
            },
        );
        Ok(PendingWrite {
            id,
            owner,
            meals,
            record,
        })
    }
}
