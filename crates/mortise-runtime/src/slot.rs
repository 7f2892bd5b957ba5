#![forbid(unsafe_code)]

//! Consumer (slot) binding.
//!
//! # Design
//!
//! A `SlotBinding` is the retained state behind one slot instance. It keeps
//! exactly one live subscription for its current (registry, name) pair and a
//! shared cell holding the projected content. The host renders from the cell
//! and re-renders when the binding calls its invalidate hook.
//!
//! # Protocol
//!
//! 1. [`connect`](SlotBinding::connect) is idempotent over (registry
//!    identity, name). When either changes, the previous subscription is
//!    dropped before the new one is created.
//! 2. Immediately after subscribing, the cell is synced from a fresh
//!    `read(name)`. Subscribing alone delivers nothing, and a fill may have
//!    published before this slot mounted — the cache exists for exactly that
//!    case.
//! 3. The cell is three-valued in effect: absent (host renders fallback),
//!    published content that renders to nothing (host renders nothing — a
//!    fill publishing "empty" must visibly clear a slot, not trigger
//!    fallback), and published content.
//! 4. The presence observer, if any, fires exactly when the boolean "has
//!    published content" flips — including the flip produced by the initial
//!    cache sync, never on content-only updates.
//!
//! Timing is the host's concern: schedule `connect` through
//! [`Effects`](crate::Effects) so it runs inline in static mode and at
//! commit in interactive mode.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

use mortise_core::{Registry, Subscription};

struct SlotCell<T> {
    value: Option<T>,
}

/// Update the cell from an incoming value, firing the presence observer on
/// flips and the invalidate hook on content changes.
///
/// Shared by the subscription callback and the post-subscribe cache sync so
/// both paths have identical semantics. The cell borrow is released before
/// either hook runs.
fn deliver<T: Clone + PartialEq>(
    cell: &Rc<RefCell<SlotCell<T>>>,
    observer: Option<&Rc<dyn Fn(bool)>>,
    invalidate: &Rc<dyn Fn()>,
    incoming: Option<&T>,
) {
    let (flipped, changed, present) = {
        let mut cell = cell.borrow_mut();
        let was_present = cell.value.is_some();
        let changed = cell.value.as_ref() != incoming;
        if changed {
            cell.value = incoming.cloned();
        }
        let present = incoming.is_some();
        (was_present != present, changed, present)
    };
    if flipped {
        if let Some(observer) = observer {
            observer(present);
        }
    }
    if changed {
        invalidate();
    }
}

/// Retained consumer state for one slot instance.
pub struct SlotBinding<N, T> {
    registry: Option<Registry<N, T>>,
    name: Option<N>,
    subscription: Option<Subscription>,
    cell: Rc<RefCell<SlotCell<T>>>,
    invalidate: Rc<dyn Fn()>,
    observer: Option<Rc<dyn Fn(bool)>>,
}

impl<N, T> fmt::Debug for SlotBinding<N, T>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotBinding")
            .field("name", &self.name)
            .field("subscribed", &self.subscription.is_some())
            .field("has_content", &self.cell.borrow().value.is_some())
            .finish()
    }
}

impl<N, T> SlotBinding<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    /// Create a disconnected binding. `invalidate` is the host's re-render
    /// request hook, invoked whenever the projected content changes.
    #[must_use]
    pub fn new(invalidate: Rc<dyn Fn()>) -> Self {
        Self {
            registry: None,
            name: None,
            subscription: None,
            cell: Rc::new(RefCell::new(SlotCell { value: None })),
            invalidate,
            observer: None,
        }
    }

    /// Attach a presence observer, invoked with `true`/`false` when the
    /// "has published content" boolean flips. Set before the first
    /// [`connect`](Self::connect).
    #[must_use]
    pub fn with_observer(mut self, observer: Rc<dyn Fn(bool)>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Subscribe to `name` on `registry`, keeping exactly one live
    /// subscription per binding.
    ///
    /// A no-op when (registry identity, name) is unchanged; otherwise the
    /// previous subscription is dropped first, then the new one is created
    /// and the cell is synced from the channel's cache.
    pub fn connect(&mut self, registry: &Registry<N, T>, name: &N) {
        let unchanged = self.subscription.is_some()
            && self.name.as_ref() == Some(name)
            && self
                .registry
                .as_ref()
                .is_some_and(|current| current.same_registry(registry));
        if unchanged {
            return;
        }

        // Drop the old registration before creating the new one, so exactly
        // one subscription exists at all times.
        self.subscription = None;
        trace!(channel = ?name, "slot connect");

        let cell = Rc::clone(&self.cell);
        let invalidate = Rc::clone(&self.invalidate);
        let observer = self.observer.clone();
        let subscription = registry.subscribe(name.clone(), move |incoming| {
            deliver(&cell, observer.as_ref(), &invalidate, incoming);
        });

        self.subscription = Some(subscription);
        self.registry = Some(registry.clone());
        self.name = Some(name.clone());

        // Sync from the cache: a fill may have published before this slot
        // mounted, and subscribing alone delivers nothing.
        let current = registry.read(name);
        deliver(
            &self.cell,
            self.observer.as_ref(),
            &self.invalidate,
            current.as_ref(),
        );
    }

    /// Drop the subscription. Idempotent; the projected content is kept
    /// (the binding is usually discarded with its instance anyway).
    pub fn disconnect(&mut self) {
        if self.subscription.take().is_some() {
            trace!(channel = ?self.name, "slot disconnect");
        }
        self.registry = None;
        self.name = None;
    }

    /// The currently projected content: `None` means absent (render
    /// fallback); `Some` content may itself render to nothing.
    #[must_use]
    pub fn projected(&self) -> Option<T> {
        self.cell.borrow().value.clone()
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        self.cell.borrow().value.is_some()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }
}
