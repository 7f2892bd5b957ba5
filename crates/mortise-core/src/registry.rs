#![forbid(unsafe_code)]

//! Channel registry: named content channels with last-value caching and
//! ordered subscriber fan-out.
//!
//! # Design
//!
//! [`Registry<N, T>`] maps channel names `N` to (optional cached content
//! `T`, ordered subscriber list) behind shared, reference-counted storage
//! (`Rc<RefCell<..>>`). Cloning a `Registry` creates a new handle to the
//! **same** channel state. A publish stores the content as the channel's
//! cached value, then notifies every live subscriber in registration order.
//!
//! Subscribers are stored as `Weak` callbacks; the strong reference lives in
//! the [`Subscription`] guard handed to the caller, so dropping the guard
//! unsubscribes exactly that registration. Dead entries are pruned lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. At most one cached value per channel name at any instant.
//! 2. Subscribers are notified in registration order, synchronously within
//!    the triggering `publish`/retract call.
//! 3. Fan-out iterates a snapshot taken before any callback runs: a callback
//!    that subscribes or unsubscribes mid-fan-out can neither be skipped nor
//!    double-invoked for the current notification.
//! 4. A channel's epoch increments on every publish and every effective
//!    retraction; a [`Retraction`] only clears the cache if no newer publish
//!    has occurred on its channel.
//! 5. An unknown channel name behaves as "absent, no subscribers" — every
//!    operation is total.
//!
//! # Failure Modes
//!
//! - **Re-entrant publish from a callback**: permitted. The interior borrow
//!   is released before callbacks run, so a callback may publish, read, or
//!   subscribe; it observes the registry state left by the outer publish.
//! - **Subscriber dropped mid-fan-out**: the snapshot holds the callback
//!   alive for the current notification; it stops receiving from the next
//!   notification on.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::trace;

/// Subscriber callback. Receives `Some(content)` on publish and `None` on
/// retraction.
type CallbackRc<T> = Rc<dyn Fn(Option<&T>)>;
type CallbackWeak<T> = Weak<dyn Fn(Option<&T>)>;

struct Channel<T> {
    cached: Option<T>,
    /// Bumped on every publish and every effective retraction. Guards
    /// retraction handles against clearing a newer publication.
    epoch: u64,
    /// Insertion order. Dead weak refs are pruned on notify.
    subscribers: Vec<CallbackWeak<T>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Self {
            cached: None,
            epoch: 0,
            subscribers: Vec::new(),
        }
    }
}

struct RegistryInner<N, T> {
    channels: FxHashMap<N, Channel<T>>,
}

/// Per-scope channel registry.
///
/// Cloning shares the underlying state; a scope provider owns one registry
/// and hands clones to the bindings under it.
pub struct Registry<N, T> {
    inner: Rc<RefCell<RegistryInner<N, T>>>,
}

// Manual Clone: shares the same Rc.
impl<N, T> Clone for Registry<N, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N, T> fmt::Debug for Registry<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Registry")
            .field("channels", &inner.channels.len())
            .finish()
    }
}

impl<N, T> Default for Registry<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, T> Registry<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + 'static,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                channels: FxHashMap::default(),
            })),
        }
    }

    /// Whether two handles refer to the same underlying registry.
    ///
    /// Bindings use this to detect a scope change and re-subscribe.
    #[must_use]
    pub fn same_registry(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Store `content` as the cached value for `name` (replacing any prior
    /// value), then synchronously notify every live subscriber of `name` in
    /// registration order with `Some(&content)`.
    ///
    /// Returns a [`Retraction`] handle for this particular publication.
    pub fn publish(&self, name: N, content: T) -> Retraction<N, T> {
        let epoch = {
            let mut inner = self.inner.borrow_mut();
            let channel = inner
                .channels
                .entry(name.clone())
                .or_insert_with(Channel::new);
            channel.cached = Some(content.clone());
            channel.epoch += 1;
            channel.epoch
        };
        trace!(channel = ?name, epoch, "publish");
        self.notify(&name, Some(&content));
        Retraction {
            inner: Rc::downgrade(&self.inner),
            name,
            epoch,
        }
    }

    /// Append `callback` to the subscriber list for `name`.
    ///
    /// The callback is **not** invoked with the current cached value; use
    /// [`read`](Self::read) for that. Registrations are independent by
    /// identity — subscribing the same name twice yields two registrations,
    /// and each guard removes exactly its own.
    pub fn subscribe(&self, name: N, callback: impl Fn(Option<&T>) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner
            .borrow_mut()
            .channels
            .entry(name)
            .or_insert_with(Channel::new)
            .subscribers
            .push(weak);
        // Type-erased guard: `Rc<dyn Fn(..)>` cannot coerce to `Rc<dyn Any>`
        // directly, so the strong ref is boxed behind `dyn Any`.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Current cached value for `name`, without side effects.
    #[must_use]
    pub fn read(&self, name: &N) -> Option<T> {
        self.inner
            .borrow()
            .channels
            .get(name)
            .and_then(|channel| channel.cached.clone())
    }

    /// Whether `name` currently has a cached value.
    #[must_use]
    pub fn is_cached(&self, name: &N) -> bool {
        self.inner
            .borrow()
            .channels
            .get(name)
            .is_some_and(|channel| channel.cached.is_some())
    }

    /// Number of live subscribers for `name`.
    #[must_use]
    pub fn subscriber_count(&self, name: &N) -> usize {
        self.inner
            .borrow()
            .channels
            .get(name)
            .map_or(0, |channel| {
                channel
                    .subscribers
                    .iter()
                    .filter(|weak| weak.strong_count() > 0)
                    .count()
            })
    }

    /// Notify live subscribers of `name` and prune dead ones.
    fn notify(&self, name: &N, content: Option<&T>) {
        // Snapshot live callbacks first, releasing the borrow before any
        // callback runs (invariant 3).
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            let Some(channel) = inner.channels.get_mut(name) else {
                return;
            };
            channel.subscribers.retain(|weak| weak.strong_count() > 0);
            channel
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        for callback in &callbacks {
            callback(content);
        }
    }

    fn retract_if_current(&self, name: &N, epoch: u64) {
        let cleared = {
            let mut inner = self.inner.borrow_mut();
            match inner.channels.get_mut(name) {
                Some(channel) if channel.epoch == epoch => {
                    channel.cached = None;
                    channel.epoch += 1;
                    true
                }
                _ => false,
            }
        };
        if cleared {
            trace!(channel = ?name, "retract");
            self.notify(name, None);
        }
    }
}

/// RAII guard for one subscriber registration.
///
/// Dropping the guard makes the callback unreachable: the strong `Rc` is
/// released, so the registry's `Weak` entry fails to upgrade on the next
/// notification and is pruned. Dropping after the registry itself is gone is
/// a no-op.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Handle for clearing one publication back to absent.
///
/// Calling [`retract`](Self::retract) clears the channel's cached value and
/// notifies subscribers with `None` — unless a newer publish has occurred on
/// the channel since this handle was issued, in which case it is a no-op
/// (the newer content stays). Dropping the handle without calling `retract`
/// leaves the publication in place.
pub struct Retraction<N, T> {
    inner: Weak<RefCell<RegistryInner<N, T>>>,
    name: N,
    epoch: u64,
}

impl<N, T> Retraction<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + 'static,
{
    /// Clear the publication, if it is still the channel's current one.
    ///
    /// A no-op after the registry has been torn down.
    pub fn retract(self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let registry = Registry { inner };
        registry.retract_if_current(&self.name, self.epoch);
    }
}

impl<N: fmt::Debug, T> fmt::Debug for Retraction<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retraction")
            .field("channel", &self.name)
            .field("epoch", &self.epoch)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use std::collections::HashMap;

    use super::*;
    use crate::name::SlotName;

    #[derive(Debug, Clone)]
    enum Op {
        Publish { name: u8, value: u32 },
        Retract { publish_index: usize },
        Subscribe { name: u8 },
        DropSubscription { index: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, any::<u32>()).prop_map(|(name, value)| Op::Publish { name, value }),
            (0usize..32).prop_map(|publish_index| Op::Retract { publish_index }),
            (0u8..4).prop_map(|name| Op::Subscribe { name }),
            (0usize..32).prop_map(|index| Op::DropSubscription { index }),
        ]
    }

    proptest! {
        /// `read` always returns the last un-retracted publish per name,
        /// for arbitrary interleavings of the four operations.
        #[test]
        fn cache_tracks_last_unretracted_publish(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let registry: Registry<SlotName, u32> = Registry::new();
            let names: Vec<SlotName> =
                (0..4).map(|i| SlotName::new(format!("n{i}"))).collect();

            // Model: per-name cached value plus a per-name publish counter
            // standing in for the channel epoch.
            let mut model: HashMap<u8, Option<u32>> = HashMap::new();
            let mut model_epoch: HashMap<u8, u64> = HashMap::new();
            let mut retractions: Vec<Option<(u8, u64, Retraction<SlotName, u32>)>> = Vec::new();
            let mut subscriptions: Vec<Option<Subscription>> = Vec::new();

            for op in ops {
                match op {
                    Op::Publish { name, value } => {
                        let retraction = registry.publish(names[name as usize].clone(), value);
                        let epoch = model_epoch.entry(name).or_insert(0);
                        *epoch += 1;
                        model.insert(name, Some(value));
                        retractions.push(Some((name, *epoch, retraction)));
                    }
                    Op::Retract { publish_index } => {
                        if publish_index < retractions.len() {
                            if let Some((name, epoch, retraction)) =
                                retractions[publish_index].take()
                            {
                                retraction.retract();
                                if model_epoch.get(&name) == Some(&epoch) {
                                    model.insert(name, None);
                                    *model_epoch.get_mut(&name).unwrap() += 1;
                                }
                            }
                        }
                    }
                    Op::Subscribe { name } => {
                        subscriptions
                            .push(Some(registry.subscribe(names[name as usize].clone(), |_| {})));
                    }
                    Op::DropSubscription { index } => {
                        if index < subscriptions.len() {
                            subscriptions[index] = None;
                        }
                    }
                }

                for (id, slot_name) in names.iter().enumerate() {
                    let expected = model.get(&(id as u8)).copied().flatten();
                    prop_assert_eq!(registry.read(slot_name), expected);
                }
            }
        }
    }
}
