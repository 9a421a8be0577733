//! Publish/subscribe bridge for "activity submitted" notifications.
//!
//! The application shell owns one [`SubmissionEvents`] and hands clones to the
//! submit flow and the retry engine. Views that show server-derived state
//! subscribe explicitly and decide for themselves whether to refetch.
//! Delivery is fire-and-forget: no acknowledgement, no retry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::models::{ActivityId, DraftId};

/// Where a confirmed submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionSource {
    /// A live submit from the form.
    Live,
    /// A reconciled draft.
    Retry(DraftId),
}

/// Broadcast after the server confirmed a new activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySubmitted {
    pub activity_id: ActivityId,
    pub submitted_at: DateTime<Utc>,
    pub source: SubmissionSource,
}

impl ActivitySubmitted {
    pub fn now(activity_id: ActivityId, source: SubmissionSource) -> Self {
        Self {
            activity_id,
            submitted_at: Utc::now(),
            source,
        }
    }
}

type Listener = Arc<dyn Fn(&ActivitySubmitted) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<SubscriptionId, Listener>>,
}

impl Registry {
    fn listeners(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, Listener>> {
        // The map stays consistent even if a holder panicked.
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle to the shared subscriber registry.
#[derive(Clone, Default)]
pub struct SubmissionEvents {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for SubmissionEvents {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SubmissionEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl SubmissionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or passed to [`Self::unsubscribe`].
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ActivitySubmitted) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry.listeners().insert(id, Arc::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Remove a listener. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.listeners().remove(&id).is_some()
    }

    /// Deliver `event` to every current subscriber.
    pub fn publish(&self, event: &ActivitySubmitted) {
        // Snapshot so listeners may subscribe/unsubscribe while being called.
        let listeners = self
            .registry
            .listeners()
            .values()
            .cloned()
            .collect::<Vec<_>>();
        tracing::debug!(
            "Publishing activity {} to {} subscriber(s)",
            event.activity_id,
            listeners.len()
        );
        for listener in listeners {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.listeners().len()
    }
}

/// Registration guard; unregisters its listener on drop.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: std::sync::Weak<Registry>,
}

impl Subscription {
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn event(id: &str) -> ActivitySubmitted {
        ActivitySubmitted::now(ActivityId::new(id), SubmissionSource::Live)
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let events = SubmissionEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first_seen = Arc::clone(&seen);
        let _first = events.subscribe(move |event| {
            first_seen
                .lock()
                .unwrap()
                .push(format!("first:{}", event.activity_id));
        });
        let second_seen = Arc::clone(&seen);
        let _second = events.subscribe(move |event| {
            second_seen
                .lock()
                .unwrap()
                .push(format!("second:{}", event.activity_id));
        });

        events.publish(&event("abc123"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:abc123".to_string(), "second:abc123".to_string()]
        );
    }

    #[test]
    fn dropping_subscription_unregisters_listener() {
        let events = SubmissionEvents::new();
        let count = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&count);
        let subscription = events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        events.publish(&event("a"));
        drop(subscription);
        events.publish(&event("b"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_by_id_is_idempotent() {
        let events = SubmissionEvents::new();
        let subscription = events.subscribe(|_| {});
        assert!(events.unsubscribe(subscription.id()));
        assert!(!events.unsubscribe(subscription.id()));
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let events = SubmissionEvents::new();
        events.publish(&event("lonely"));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_bridge_drops_cleanly() {
        let events = SubmissionEvents::new();
        let subscription = events.subscribe(|_| {});
        drop(events);
        drop(subscription);
    }
}
