//! Bookkeeping for push streams opened with the shell (auth changes, device
//! appearance). Each stream gets a fresh id; deliveries carry a sequence
//! number that must strictly increase, and nothing is applied once the
//! stream has been torn down.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// `seq` was not newer than the last applied delivery.
    Stale { last_applied: u64 },
    /// Delivery for a stream other than the current one.
    Foreign,
    Closed,
}

impl Admission {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: SubscriptionId,
    last_applied: Option<u64>,
    closed: bool,
}

impl Subscription {
    #[must_use]
    pub fn open() -> Self {
        Self {
            id: SubscriptionId::new(),
            last_applied: None,
            closed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Decides whether a delivery may be applied and records it if so.
    pub fn admit(&mut self, from: &SubscriptionId, seq: u64) -> Admission {
        if from != &self.id {
            return Admission::Foreign;
        }
        if self.closed {
            return Admission::Closed;
        }
        match self.last_applied {
            Some(last) if seq <= last => Admission::Stale { last_applied: last },
            _ => {
                self.last_applied = Some(seq);
                Admission::Accepted
            }
        }
    }

    /// Marks the stream closed; returns the id only the first time.
    pub fn close(&mut self) -> Option<SubscriptionId> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_increasing_sequence() {
        let mut sub = Subscription::open();
        let id = sub.id().clone();
        assert_eq!(sub.admit(&id, 0), Admission::Accepted);
        assert_eq!(sub.admit(&id, 3), Admission::Accepted);
        assert_eq!(sub.admit(&id, 2), Admission::Stale { last_applied: 3 });
        assert_eq!(sub.admit(&id, 3), Admission::Stale { last_applied: 3 });
    }

    #[test]
    fn rejects_other_streams() {
        let mut sub = Subscription::open();
        let other = SubscriptionId::new();
        assert_eq!(sub.admit(&other, 1), Admission::Foreign);
        let id = sub.id().clone();
        assert_eq!(sub.admit(&id, 1), Admission::Accepted);
    }

    #[test]
    fn nothing_after_close() {
        let mut sub = Subscription::open();
        let id = sub.id().clone();
        assert_eq!(sub.close(), Some(id.clone()));
        assert_eq!(sub.close(), None);
        assert_eq!(sub.admit(&id, 10), Admission::Closed);
        assert!(sub.is_closed());
    }

    proptest! {
        #[test]
        fn applied_sequence_is_strictly_increasing(seqs in prop::collection::vec(0u64..50, 0..40)) {
            let mut sub = Subscription::open();
            let id = sub.id().clone();
            let mut applied = Vec::new();
            for seq in seqs {
                if sub.admit(&id, seq).is_accepted() {
                    applied.push(seq);
                }
            }
            prop_assert!(applied.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
