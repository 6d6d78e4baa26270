use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::capabilities::{ObjectStoreError, RecordError};
use crate::model::{BoundedText, UserId, ValidationError};
use crate::{AppError, ErrorKind};

pub const PROFILE_COLUMNS: [&str; 4] = ["full_name", "username", "bio", "avatar_url"];
pub const DEFAULT_DISPLAY_NAME: &str = "My Kitchen";

pub type FullName = BoundedText<100>;
pub type Username = BoundedText<40>;
pub type Bio = BoundedText<500>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ProfileError {
    #[error("no signed-in user")]
    NoIdentity,
    #[error("profile is not being edited")]
    NotEditing,
    #[error("profile is busy uploading or saving")]
    Busy,
    #[error("invalid {field}: {source}")]
    Invalid {
        field: ProfileField,
        source: ValidationError,
    },
    #[error("failed to load profile: {0}")]
    Fetch(RecordError),
    #[error("profile record is malformed: {message}")]
    Decode { message: String },
    #[error("failed to encode profile: {message}")]
    Encode { message: String },
    #[error("failed to save profile: {0}")]
    Save(RecordError),
    #[error("avatar upload failed: {0}")]
    Upload(ObjectStoreError),
}

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        let kind = match &e {
            ProfileError::NoIdentity => ErrorKind::Authentication,
            ProfileError::NotEditing | ProfileError::Busy => ErrorKind::InvalidState,
            ProfileError::Invalid { .. } => ErrorKind::Validation,
            ProfileError::Fetch(inner) | ProfileError::Save(inner) => {
                AppError::from(inner.clone()).kind
            }
            ProfileError::Upload(inner) => AppError::from(inner.clone()).kind,
            ProfileError::Decode { .. } => ErrorKind::Deserialization,
            ProfileError::Encode { .. } => ErrorKind::Serialization,
        };
        let message = match &e {
            ProfileError::Invalid { .. } => e.to_string(),
            ProfileError::Upload(inner) => inner.message(),
            _ => "Failed to update profile.".to_string(),
        };
        AppError::new(kind, message).with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Username,
    Bio,
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProfileField::FullName => "full name",
            ProfileField::Username => "username",
            ProfileField::Bio => "bio",
        })
    }
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Profile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// `@username`, only when one is set.
    #[must_use]
    pub fn handle(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| format!("@{u}"))
    }
}

/// Fields start as the stored text; only values the user types are
/// checked against the length limits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileDraft {
    pub full_name: String,
    pub username: String,
    pub bio: String,
    pub avatar_url: Option<String>,
}

impl ProfileDraft {
    fn from_profile(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            username: profile.username.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            avatar_url: profile.avatar_url.clone(),
        }
    }

    fn to_profile(&self) -> Profile {
        let non_blank = |s: &str| Some(s.to_string()).filter(|s| !s.trim().is_empty());
        Profile {
            full_name: non_blank(self.full_name.as_str()),
            username: non_blank(self.username.as_str()),
            bio: non_blank(self.bio.as_str()),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProfileRecord<'a> {
    id: &'a UserId,
    full_name: &'a str,
    username: &'a str,
    bio: &'a str,
    avatar_url: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileEditor {
    /// Bumped each time editing starts; uploads carry it back.
    pub generation: u64,
    pub draft: ProfileDraft,
    pub uploading: bool,
    pub saving: bool,
    pub saved: bool,
}

impl ProfileEditor {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.uploading || self.saving
    }
}

/// An upload the store has agreed to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    pub path: String,
    pub editor: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    owner: Option<UserId>,
    editor_generation: u64,
    profile: Profile,
    loading: bool,
    error: Option<ProfileError>,
    editor: Option<ProfileEditor>,
}

impl ProfileStore {
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&ProfileError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn editor(&self) -> Option<&ProfileEditor> {
        self.editor.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn begin_load(&mut self, owner: UserId) {
        if self.owner.as_ref() != Some(&owner) {
            self.reset();
        }
        self.owner = Some(owner);
        self.loading = true;
    }

    pub fn apply_loaded(
        &mut self,
        owner: &UserId,
        result: Result<serde_json::Value, RecordError>,
    ) -> Result<bool, ProfileError> {
        if self.owner.as_ref() != Some(owner) {
            return Ok(false);
        }
        self.loading = false;

        let loaded = match result {
            Ok(row) => serde_json::from_value::<Profile>(row).map_err(|e| ProfileError::Decode {
                message: e.to_string(),
            }),
            Err(RecordError::NotFound) => Ok(Profile::default()),
            Err(e) => Err(ProfileError::Fetch(e)),
        };

        match loaded {
            Ok(profile) => {
                self.profile = profile;
                self.error = None;
                Ok(true)
            }
            Err(e) => {
                warn!(%owner, error = %e, "profile load failed");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn start_editing(&mut self) {
        self.editor_generation += 1;
        self.editor = Some(ProfileEditor {
            generation: self.editor_generation,
            draft: ProfileDraft::from_profile(&self.profile),
            ..ProfileEditor::default()
        });
    }

    pub fn stop_editing(&mut self) {
        self.editor = None;
    }

    pub fn edit_field(&mut self, field: ProfileField, value: String) -> Result<(), ProfileError> {
        let editor = self.editor.as_mut().ok_or(ProfileError::NotEditing)?;
        let invalid = |source| ProfileError::Invalid { field, source };
        match field {
            ProfileField::FullName => {
                editor.draft.full_name = FullName::new(value).map_err(invalid)?.into_inner();
            }
            ProfileField::Username => {
                editor.draft.username = Username::new(value).map_err(invalid)?.into_inner();
            }
            ProfileField::Bio => editor.draft.bio = Bio::new(value).map_err(invalid)?.into_inner(),
        }
        editor.saved = false;
        Ok(())
    }

    /// Marks an upload as running for the open editor.
    pub fn begin_upload(
        &mut self,
        owner: &UserId,
        picked_at_ms: u64,
    ) -> Result<AvatarUpload, ProfileError> {
        let editor = self.editor.as_mut().ok_or(ProfileError::NotEditing)?;
        if editor.is_busy() {
            return Err(ProfileError::Busy);
        }
        editor.uploading = true;
        Ok(AvatarUpload {
            path: avatar_path(owner, picked_at_ms),
            editor: editor.generation,
        })
    }

    fn uploading_editor(&mut self, generation: u64) -> Option<&mut ProfileEditor> {
        self.editor
            .as_mut()
            .filter(|e| e.generation == generation && e.uploading)
    }

    /// Whether an upload tagged with `generation` still belongs to the open editor.
    #[must_use]
    pub fn upload_pending(&self, generation: u64) -> bool {
        self.editor
            .as_ref()
            .is_some_and(|e| e.generation == generation && e.uploading)
    }

    /// Releases an upload that never reached the object store.
    pub fn cancel_upload(&mut self, generation: u64) {
        if let Some(editor) = self.uploading_editor(generation) {
            editor.uploading = false;
        }
    }

    /// Ends an upload; on success the draft points at the new avatar.
    /// `Ok(false)` when the editor it was started from is gone.
    pub fn finish_upload(
        &mut self,
        generation: u64,
        result: Result<String, ObjectStoreError>,
    ) -> Result<bool, ProfileError> {
        let Some(editor) = self.uploading_editor(generation) else {
            return Ok(false);
        };
        editor.uploading = false;
        match result {
            Ok(url) => {
                editor.draft.avatar_url = Some(url);
                editor.saved = false;
                Ok(true)
            }
            Err(e) => Err(ProfileError::Upload(e)),
        }
    }

    /// Returns the upsert body for the current draft.
    pub fn begin_save(&mut self, owner: &UserId) -> Result<serde_json::Value, ProfileError> {
        let editor = self.editor.as_mut().ok_or(ProfileError::NotEditing)?;
        if editor.is_busy() {
            return Err(ProfileError::Busy);
        }
        let record = serde_json::to_value(ProfileRecord {
            id: owner,
            full_name: editor.draft.full_name.as_str(),
            username: editor.draft.username.as_str(),
            bio: editor.draft.bio.as_str(),
            avatar_url: editor.draft.avatar_url.as_deref(),
        })
        .map_err(|e| ProfileError::Encode {
            message: e.to_string(),
        })?;
        editor.saving = true;
        Ok(record)
    }

    pub fn complete_save(&mut self, result: Result<(), RecordError>) -> Result<(), ProfileError> {
        let Some(editor) = self.editor.as_mut() else {
            return Ok(());
        };
        editor.saving = false;
        match result {
            Ok(()) => {
                self.profile = editor.draft.to_profile();
                editor.saved = true;
                Ok(())
            }
            Err(e) => Err(ProfileError::Save(e)),
        }
    }
}

#[must_use]
pub fn avatar_path(owner: &UserId, picked_at_ms: u64) -> String {
    format!("{owner}/{picked_at_ms}.jpg")
}
