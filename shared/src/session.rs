//! Who is signed in, as reported by the auth provider.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::{AuthError, AuthStateChange, Session, User};
use crate::model::UserId;
use crate::subscription::{Admission, Subscription, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum Identity {
    /// Nothing has been heard from the provider yet.
    #[default]
    Loading,
    Absent,
    Present(User),
}

impl Identity {
    fn from_session(session: Option<Session>) -> Self {
        session.map_or(Identity::Absent, |s| Identity::Present(s.user))
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Present(user) => Some(user),
            Identity::Loading | Identity::Absent => None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Identity::Loading)
    }
}

/// What an identity update meant for per-user state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    /// Dropped, or the same principal as before.
    Unchanged,
    UserChanged {
        previous: Option<UserId>,
        current: Option<UserId>,
    },
}

#[derive(Debug, Default)]
pub struct SessionStore {
    identity: Identity,
    subscription: Option<Subscription>,
}

impl SessionStore {
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.identity.user()
    }

    #[must_use]
    pub fn subscription_id(&self) -> Option<&SubscriptionId> {
        self.subscription
            .as_ref()
            .filter(|s| !s.is_closed())
            .map(Subscription::id)
    }

    /// Opens a fresh auth stream. Any earlier stream is closed and its id
    /// returned so the caller can unsubscribe it.
    pub fn start(&mut self) -> (SubscriptionId, Option<SubscriptionId>) {
        let previous = self.subscription.as_mut().and_then(Subscription::close);
        let subscription = Subscription::open();
        let id = subscription.id().clone();
        self.subscription = Some(subscription);
        (id, previous)
    }

    /// Closes the auth stream; later deliveries are ignored.
    pub fn stop(&mut self) -> Option<SubscriptionId> {
        self.subscription.as_mut().and_then(Subscription::close)
    }

    /// Result of the one-shot session read at startup. Only applied while
    /// the identity is still unknown; a stream delivery is always newer.
    pub fn apply_restored(&mut self, result: Result<Option<Session>, AuthError>) -> IdentityChange {
        if !self.identity.is_loading() {
            debug!("session restore arrived after identity was known; ignoring");
            return IdentityChange::Unchanged;
        }
        // A failed restore still has to unblock the login screen.
        let session = result.unwrap_or(None);
        self.replace(Identity::from_session(session))
    }

    pub fn apply_notification(
        &mut self,
        from: &SubscriptionId,
        change: AuthStateChange,
    ) -> IdentityChange {
        let Some(subscription) = self.subscription.as_mut() else {
            return IdentityChange::Unchanged;
        };
        match subscription.admit(from, change.seq) {
            Admission::Accepted => self.replace(Identity::from_session(change.session)),
            rejected => {
                debug!(seq = change.seq, ?rejected, "dropping auth notification");
                IdentityChange::Unchanged
            }
        }
    }

    fn replace(&mut self, next: Identity) -> IdentityChange {
        let previous = self.identity.user().map(|u| u.id.clone());
        let current = next.user().map(|u| u.id.clone());
        let was_loading = self.identity.is_loading();
        self.identity = next;

        if previous == current && !was_loading {
            IdentityChange::Unchanged
        } else {
            IdentityChange::UserChanged { previous, current }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
    #[default]
    SignIn,
    SignUp,
}

impl LoginMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            LoginMode::SignIn => LoginMode::SignUp,
            LoginMode::SignUp => LoginMode::SignIn,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub mode: LoginMode,
    pub submitting: bool,
    pub signing_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> Session {
        Session {
            user: User {
                id: UserId::new(id),
                email: Some(format!("{id}@example.com")),
            },
            expires_at: None,
        }
    }

    fn change(seq: u64, id: Option<&str>) -> AuthStateChange {
        AuthStateChange {
            seq,
            session: id.map(session),
        }
    }

    #[test]
    fn starts_loading() {
        let store = SessionStore::default();
        assert_eq!(store.identity(), &Identity::Loading);
        assert!(store.subscription_id().is_none());
    }

    #[test]
    fn restore_resolves_loading() {
        let mut store = SessionStore::default();
        let outcome = store.apply_restored(Ok(Some(session("a"))));
        assert_eq!(
            outcome,
            IdentityChange::UserChanged {
                previous: None,
                current: Some(UserId::new("a"))
            }
        );
        assert_eq!(store.user().map(|u| u.id.as_str()), Some("a"));
    }

    #[test]
    fn failed_restore_means_absent() {
        let mut store = SessionStore::default();
        store.apply_restored(Err(AuthError::Network {
            message: "offline".into(),
        }));
        assert_eq!(store.identity(), &Identity::Absent);
    }

    #[test]
    fn late_restore_does_not_override_notification() {
        let mut store = SessionStore::default();
        let (id, _) = store.start();
        store.apply_notification(&id, change(1, None));
        assert_eq!(store.identity(), &Identity::Absent);

        let outcome = store.apply_restored(Ok(Some(session("stale"))));
        assert_eq!(outcome, IdentityChange::Unchanged);
        assert_eq!(store.identity(), &Identity::Absent);
    }

    #[test]
    fn out_of_order_notifications_are_dropped() {
        let mut store = SessionStore::default();
        let (id, _) = store.start();
        store.apply_notification(&id, change(2, Some("a")));
        let outcome = store.apply_notification(&id, change(1, None));
        assert_eq!(outcome, IdentityChange::Unchanged);
        assert_eq!(store.user().map(|u| u.id.as_str()), Some("a"));
    }

    #[test]
    fn notifications_after_stop_are_dropped() {
        let mut store = SessionStore::default();
        let (id, _) = store.start();
        store.apply_notification(&id, change(1, Some("a")));
        assert_eq!(store.stop(), Some(id.clone()));
        store.apply_notification(&id, change(2, None));
        assert_eq!(store.user().map(|u| u.id.as_str()), Some("a"));
    }

    #[test]
    fn restart_closes_previous_stream() {
        let mut store = SessionStore::default();
        let (first, none) = store.start();
        assert!(none.is_none());
        let (second, previous) = store.start();
        assert_eq!(previous, Some(first.clone()));
        assert_ne!(first, second);

        assert_eq!(
            store.apply_notification(&first, change(1, Some("a"))),
            IdentityChange::Unchanged
        );
        assert!(store.identity().is_loading());
    }

    #[test]
    fn same_user_refresh_is_unchanged() {
        let mut store = SessionStore::default();
        let (id, _) = store.start();
        store.apply_notification(&id, change(1, Some("a")));
        assert_eq!(
            store.apply_notification(&id, change(2, Some("a"))),
            IdentityChange::Unchanged
        );
    }

    #[test]
    fn first_absent_after_loading_is_a_change() {
        let mut store = SessionStore::default();
        let (id, _) = store.start();
        assert_eq!(
            store.apply_notification(&id, change(1, None)),
            IdentityChange::UserChanged {
                previous: None,
                current: None
            }
        );
    }
}
