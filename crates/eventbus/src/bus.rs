//! Callback-based event bus.
//!
//! Listeners are registered per event kind and invoked synchronously, in
//! registration order, on the publishing task. The listener list is
//! snapshotted before dispatch so a listener may subscribe or unsubscribe
//! while it is being invoked.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

/// A typed payload that can travel over an [`EventBus`].
///
/// The kind plays the role of the event name: listeners subscribe to a kind
/// and receive every payload whose [`Event::kind`] matches.
pub trait Event: Send + Sync + 'static {
    /// Discriminant used as the subscription key.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The kind this payload is published under.
    fn kind(&self) -> Self::Kind;
}

/// Shared callback invoked for every matching event.
///
/// Identity is the `Arc` allocation: cloning a listener and registering the
/// clone twice counts as two registrations of the same callback.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Wrap a closure into a [`Listener`].
pub fn listener<E, F>(f: F) -> Listener<E>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle to a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription<K> {
    kind: K,
    id: u64,
}

impl<K: Copy> Subscription<K> {
    /// The kind this registration listens to.
    #[must_use]
    pub fn kind(&self) -> K {
        self.kind
    }

    /// Registration sequence number, unique per bus.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

struct Registration<E> {
    id: u64,
    listener: Listener<E>,
    // Cleared on removal so an in-flight snapshot skips it.
    active: Arc<AtomicBool>,
}

impl<E> Clone for Registration<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            active: Arc::clone(&self.active),
        }
    }
}

impl<E> Registration<E> {
    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Ordered, synchronous event bus.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use majlis_eventbus::{Event, EventBus, listener};
///
/// #[derive(Debug)]
/// struct Tick(u32);
///
/// impl Event for Tick {
///     type Kind = &'static str;
///     fn kind(&self) -> &'static str {
///         "tick"
///     }
/// }
///
/// let bus = EventBus::new();
/// let seen = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&seen);
/// bus.subscribe("tick", listener(move |t: &Tick| {
///     counter.fetch_add(t.0, Ordering::Relaxed);
/// }));
///
/// bus.publish(&Tick(3));
/// assert_eq!(seen.load(Ordering::Relaxed), 3);
/// assert_eq!(bus.total_published(), 1);
/// ```
pub struct EventBus<E: Event> {
    registry: Mutex<HashMap<E::Kind, Vec<Registration<E>>>>,
    next_id: AtomicU64,
    published: AtomicU64,
    panics: AtomicU64,
}

impl<E: Event> EventBus<E> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
            panics: AtomicU64::new(0),
        }
    }

    /// Register `listener` for `kind`.
    ///
    /// Never fails. Registering the same listener twice makes it fire twice
    /// per event.
    pub fn subscribe(&self, kind: E::Kind, listener: Listener<E>) -> Subscription<E::Kind> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .lock()
            .entry(kind)
            .or_default()
            .push(Registration {
                id,
                listener,
                active: Arc::new(AtomicBool::new(true)),
            });
        tracing::trace!(?kind, subscription = id, "listener subscribed");
        Subscription { kind, id }
    }

    /// Convenience over [`subscribe`](Self::subscribe) for a bare closure.
    pub fn subscribe_fn<F>(&self, kind: E::Kind, f: F) -> Subscription<E::Kind>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(kind, listener(f))
    }

    /// Remove every registration of `listener` under `kind`.
    ///
    /// Returns how many registrations were removed; zero when the listener
    /// was never registered.
    pub fn unsubscribe(&self, kind: E::Kind, listener: &Listener<E>) -> usize {
        let mut registry = self.registry.lock();
        let Some(list) = registry.get_mut(&kind) else {
            return 0;
        };
        let before = list.len();
        list.retain(|registration| {
            let matches = Arc::ptr_eq(&registration.listener, listener);
            if matches {
                registration.deactivate();
            }
            !matches
        });
        let removed = before - list.len();
        if list.is_empty() {
            registry.remove(&kind);
        }
        removed
    }

    /// Remove exactly the registration behind `subscription`.
    ///
    /// Returns `false` if it was already removed.
    pub fn unsubscribe_handle(&self, subscription: &Subscription<E::Kind>) -> bool {
        let mut registry = self.registry.lock();
        let Some(list) = registry.get_mut(&subscription.kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|r| r.id == subscription.id) else {
            return false;
        };
        list.remove(pos).deactivate();
        if list.is_empty() {
            registry.remove(&subscription.kind);
        }
        true
    }

    /// Deliver `event` to every listener of its kind.
    ///
    /// Listeners run synchronously in registration order. A listener that
    /// panics is logged and skipped; the rest still run. Returns the number
    /// of listeners that completed normally.
    pub fn publish(&self, event: &E) -> usize {
        let kind = event.kind();
        self.published.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<Registration<E>> = match self.registry.lock().get(&kind) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for registration in &snapshot {
            if !registration.active.load(Ordering::Acquire) {
                continue;
            }
            let callback = &registration.listener;
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    self.panics.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        ?kind,
                        subscription = registration.id,
                        reason = panic_message(payload.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }
        delivered
    }

    /// Drop every registration.
    pub fn clear(&self) {
        let mut registry = self.registry.lock();
        for registration in registry.values().flatten() {
            registration.deactivate();
        }
        registry.clear();
    }

    /// Number of registrations for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.registry.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Total number of events published since creation, listened to or not.
    #[must_use]
    pub fn total_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Number of listener invocations that panicked.
    #[must_use]
    pub fn listener_panics(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("kinds", &registry.len())
            .field("listeners", &registry.values().map(Vec::len).sum::<usize>())
            .field("published", &self.total_published())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
