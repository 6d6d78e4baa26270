//! Light/dark resolution: a persisted explicit choice wins over the device
//! preference, and light is the fallback when neither is known.

use serde::Serialize;
use tracing::{debug, warn};

use crate::capabilities::{check_value_size, ColorScheme, ColorSchemeChange, KvError, KvKey};
use crate::subscription::{Subscription, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub card: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub subtext: &'static str,
    pub placeholder: &'static str,
    pub accent: &'static str,
    pub primary: &'static str,
    pub input_background: &'static str,
    pub border: &'static str,
}

pub const LIGHT_PALETTE: Palette = Palette {
    background: "#f8f9fa",
    card: "#ffffff",
    surface: "#ffffff",
    text: "#2d3436",
    subtext: "#666666",
    placeholder: "#aaaaaa",
    accent: "#ff6b6b",
    primary: "#ff6b6b",
    input_background: "#ffffff",
    border: "#e0e0e0",
};

pub const DARK_PALETTE: Palette = Palette {
    background: "#121212",
    card: "#1e1e1e",
    surface: "#1e1e1e",
    text: "#f1f1f1",
    subtext: "#aaaaaa",
    placeholder: "#777777",
    accent: "#ff6b6b",
    primary: "#ff6b6b",
    input_background: "#2c2c2c",
    border: "#333333",
};

#[must_use]
pub const fn palette(scheme: ColorScheme) -> &'static Palette {
    match scheme {
        ColorScheme::Light => &LIGHT_PALETTE,
        ColorScheme::Dark => &DARK_PALETTE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(Option<ColorScheme>),
    /// The user toggled before storage answered; their choice stands.
    Superseded,
}

#[derive(Debug, Default)]
pub struct ThemeStore {
    explicit: Option<ColorScheme>,
    device: Option<ColorScheme>,
    loaded: bool,
    toggled: bool,
    subscription: Option<Subscription>,
    persist_error: Option<KvError>,
}

impl ThemeStore {
    #[must_use]
    pub fn effective(&self) -> ColorScheme {
        self.explicit.or(self.device).unwrap_or(ColorScheme::Light)
    }

    #[must_use]
    pub fn explicit(&self) -> Option<ColorScheme> {
        self.explicit
    }

    #[must_use]
    pub fn device(&self) -> Option<ColorScheme> {
        self.device
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn persist_error(&self) -> Option<&KvError> {
        self.persist_error.as_ref()
    }

    #[must_use]
    pub fn storage_key() -> KvKey {
        KvKey::theme_override()
    }

    /// Flips the explicit choice. With no explicit choice yet, picks the
    /// opposite of the device preference (dark when it is unknown).
    /// Returns the new choice, which the caller persists.
    pub fn toggle(&mut self) -> ColorScheme {
        let next = match self.explicit {
            Some(current) => current.opposite(),
            None if self.device == Some(ColorScheme::Dark) => ColorScheme::Light,
            None => ColorScheme::Dark,
        };
        self.explicit = Some(next);
        self.toggled = true;
        next
    }

    /// The stored form of a choice, checked against the store's value limit.
    pub fn encode(scheme: ColorScheme) -> Result<Vec<u8>, KvError> {
        let value = scheme.as_str().as_bytes().to_vec();
        check_value_size(&value)?;
        Ok(value)
    }

    pub fn apply_loaded(&mut self, result: Result<Option<Vec<u8>>, KvError>) -> LoadOutcome {
        self.loaded = true;
        if self.toggled {
            return LoadOutcome::Superseded;
        }

        let stored = match result {
            Ok(Some(bytes)) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(ColorScheme::parse),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read stored theme; following device");
                None
            }
        };
        self.explicit = stored;
        LoadOutcome::Applied(stored)
    }

    /// A failed write keeps the in-memory choice.
    pub fn apply_persisted(&mut self, result: Result<(), KvError>) {
        match result {
            Ok(()) => self.persist_error = None,
            Err(e) => {
                warn!(error = %e, "theme choice not persisted");
                self.persist_error = Some(e);
            }
        }
    }

    /// Opens a fresh device-preference stream, closing any earlier one.
    pub fn start_watching(&mut self) -> (SubscriptionId, Option<SubscriptionId>) {
        let previous = self.subscription.as_mut().and_then(Subscription::close);
        let subscription = Subscription::open();
        let id = subscription.id().clone();
        self.subscription = Some(subscription);
        (id, previous)
    }

    pub fn stop_watching(&mut self) -> Option<SubscriptionId> {
        self.subscription.as_mut().and_then(Subscription::close)
    }

    /// Returns whether the device preference was updated.
    pub fn apply_device_change(&mut self, from: &SubscriptionId, change: ColorSchemeChange) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let admission = subscription.admit(from, change.seq);
        if !admission.is_accepted() {
            debug!(seq = change.seq, ?admission, "dropping appearance change");
            return false;
        }
        self.device = change.scheme;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watching(device: Option<ColorScheme>) -> ThemeStore {
        let mut store = ThemeStore::default();
        let (id, _) = store.start_watching();
        store.apply_device_change(&id, ColorSchemeChange { seq: 1, scheme: device });
        store
    }

    #[test]
    fn defaults_to_light() {
        assert_eq!(ThemeStore::default().effective(), ColorScheme::Light);
    }

    #[test]
    fn follows_device_without_override() {
        assert_eq!(watching(Some(ColorScheme::Dark)).effective(), ColorScheme::Dark);
    }

    #[test]
    fn override_beats_device() {
        let mut store = watching(Some(ColorScheme::Dark));
        store.apply_loaded(Ok(Some(b"light".to_vec())));
        assert_eq!(store.effective(), ColorScheme::Light);
    }

    #[test]
    fn toggle_from_unset_uses_device() {
        let mut dark_device = watching(Some(ColorScheme::Dark));
        assert_eq!(dark_device.toggle(), ColorScheme::Light);

        let mut light_device = watching(Some(ColorScheme::Light));
        assert_eq!(light_device.toggle(), ColorScheme::Dark);

        let mut unknown = ThemeStore::default();
        assert_eq!(unknown.toggle(), ColorScheme::Dark);
    }

    #[test]
    fn toggle_twice_restores_effective_but_not_unset() {
        let mut store = watching(Some(ColorScheme::Dark));
        let before = store.effective();
        store.toggle();
        store.toggle();
        assert_eq!(store.effective(), before);
        assert_eq!(store.explicit(), Some(ColorScheme::Dark));
    }

    #[test]
    fn double_toggle_pins_the_choice() {
        let mut store = ThemeStore::default();
        let (id, _) = store.start_watching();
        store.apply_device_change(
            &id,
            ColorSchemeChange {
                seq: 1,
                scheme: Some(ColorScheme::Light),
            },
        );
        store.toggle();
        store.toggle();
        assert_eq!(store.effective(), ColorScheme::Light);

        // The device flips, but the explicit choice no longer follows it.
        store.apply_device_change(
            &id,
            ColorSchemeChange {
                seq: 2,
                scheme: Some(ColorScheme::Dark),
            },
        );
        assert_eq!(store.effective(), ColorScheme::Light);
    }

    #[test]
    fn toggle_before_load_wins() {
        let mut store = ThemeStore::default();
        store.toggle();
        assert_eq!(
            store.apply_loaded(Ok(Some(b"light".to_vec()))),
            LoadOutcome::Superseded
        );
        assert_eq!(store.explicit(), Some(ColorScheme::Dark));
        assert!(store.is_loaded());
    }

    #[test]
    fn unknown_stored_value_is_no_override() {
        let mut store = ThemeStore::default();
        assert_eq!(
            store.apply_loaded(Ok(Some(b"system".to_vec()))),
            LoadOutcome::Applied(None)
        );
        assert_eq!(
            store.apply_loaded(Ok(Some(vec![0xff, 0xfe]))),
            LoadOutcome::Applied(None)
        );
    }

    #[test]
    fn load_error_falls_back_to_device() {
        let mut store = watching(Some(ColorScheme::Dark));
        store.apply_loaded(Err(KvError::storage("io")));
        assert_eq!(store.effective(), ColorScheme::Dark);
    }

    #[test]
    fn persist_failure_keeps_choice() {
        let mut store = ThemeStore::default();
        store.toggle();
        store.apply_persisted(Err(KvError::storage("disk full")));
        assert_eq!(store.explicit(), Some(ColorScheme::Dark));
        assert!(store.persist_error().is_some());

        store.apply_persisted(Ok(()));
        assert!(store.persist_error().is_none());
    }

    #[test]
    fn stale_and_closed_device_changes_dropped() {
        let mut store = ThemeStore::default();
        let (id, _) = store.start_watching();
        assert!(store.apply_device_change(&id, ColorSchemeChange { seq: 5, scheme: Some(ColorScheme::Dark) }));
        assert!(!store.apply_device_change(&id, ColorSchemeChange { seq: 4, scheme: Some(ColorScheme::Light) }));
        store.stop_watching();
        assert!(!store.apply_device_change(&id, ColorSchemeChange { seq: 6, scheme: Some(ColorScheme::Light) }));
        assert_eq!(store.device(), Some(ColorScheme::Dark));
    }

    #[test]
    fn palettes_differ_where_expected() {
        assert_eq!(palette(ColorScheme::Light).background, "#f8f9fa");
        assert_eq!(palette(ColorScheme::Dark).background, "#121212");
        assert_eq!(
            palette(ColorScheme::Light).accent,
            palette(ColorScheme::Dark).accent
        );
    }

    #[test]
    fn encoded_value_round_trips() {
        let bytes = ThemeStore::encode(ColorScheme::Dark).unwrap();
        assert_eq!(bytes, b"dark");
        let mut store = ThemeStore::default();
        store.apply_loaded(Ok(Some(bytes)));
        assert_eq!(store.explicit(), Some(ColorScheme::Dark));
    }
}
