#![forbid(unsafe_code)]

//! Producer (fill) binding.
//!
//! A `FillBinding` is the retained state behind one fill instance. It
//! publishes its content under its channel name when newly activated, when
//! the (registry, name) target changes (retracting under the old target
//! first), or when the content differs from the last published value by
//! `PartialEq` — the host's change-detection granularity. Deactivation
//! retracts the publication, so slots showing the content fall back instead
//! of displaying it stale.
//!
//! As with slots, timing belongs to the host: schedule `connect` and
//! `disconnect` through [`Effects`](crate::Effects).

use std::fmt;
use std::hash::Hash;

use tracing::trace;

use mortise_core::{Registry, Retraction};

/// Retained producer state for one fill instance.
pub struct FillBinding<N, T> {
    registry: Option<Registry<N, T>>,
    name: Option<N>,
    content: Option<T>,
    retraction: Option<Retraction<N, T>>,
}

impl<N, T> fmt::Debug for FillBinding<N, T>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillBinding")
            .field("name", &self.name)
            .field("published", &self.retraction.is_some())
            .finish()
    }
}

impl<N, T> Default for FillBinding<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, T> FillBinding<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: None,
            name: None,
            content: None,
            retraction: None,
        }
    }

    /// Publish `content` under `name`, if anything changed since the last
    /// call.
    ///
    /// A target change retracts the previous publication under the old name
    /// before publishing under the new one. Equal content under an
    /// unchanged target is a no-op. Re-publishing under the same name
    /// replaces the cached value without an intermediate absent
    /// notification.
    pub fn connect(&mut self, registry: &Registry<N, T>, name: &N, content: T) {
        let same_target = self.name.as_ref() == Some(name)
            && self
                .registry
                .as_ref()
                .is_some_and(|current| current.same_registry(registry));
        if same_target && self.content.as_ref() == Some(&content) {
            return;
        }

        if !same_target {
            if let Some(retraction) = self.retraction.take() {
                retraction.retract();
            }
        }

        trace!(channel = ?name, "fill publish");
        self.retraction = Some(registry.publish(name.clone(), content.clone()));
        self.content = Some(content);
        self.registry = Some(registry.clone());
        self.name = Some(name.clone());
    }

    /// Retract the current publication, if any. Idempotent. A stale
    /// retraction (another fill has since published under the same name)
    /// leaves the newer content in place.
    pub fn disconnect(&mut self) {
        if let Some(retraction) = self.retraction.take() {
            trace!(channel = ?self.name, "fill retract");
            retraction.retract();
        }
        self.registry = None;
        self.name = None;
        self.content = None;
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.retraction.is_some()
    }

    #[must_use]
    pub fn published_name(&self) -> Option<&N> {
        self.name.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use mortise_core::SlotName;

    use super::*;

    #[test]
    fn connect_publishes_and_caches() {
        let registry: Registry<SlotName, i32> = Registry::new();
        let mut fill = FillBinding::new();
        fill.connect(&registry, &SlotName::new("c"), 1);
        assert_eq!(registry.read(&SlotName::new("c")), Some(1));
        assert!(fill.is_published());
    }

    #[test]
    fn equal_content_is_not_republished() {
        let registry: Registry<SlotName, i32> = Registry::new();
        let notifications = Rc::new(Cell::new(0u32));
        let n = Rc::clone(&notifications);
        let _s = registry.subscribe(SlotName::new("c"), move |_| {
            n.set(n.get() + 1);
        });

        let mut fill = FillBinding::new();
        fill.connect(&registry, &SlotName::new("c"), 1);
        fill.connect(&registry, &SlotName::new("c"), 1);
        assert_eq!(notifications.get(), 1);

        fill.connect(&registry, &SlotName::new("c"), 2);
        assert_eq!(notifications.get(), 2);
    }

    #[test]
    fn name_change_retracts_old_channel_first() {
        let registry: Registry<SlotName, i32> = Registry::new();
        let mut fill = FillBinding::new();
        fill.connect(&registry, &SlotName::new("old"), 1);
        fill.connect(&registry, &SlotName::new("new"), 1);

        assert_eq!(registry.read(&SlotName::new("old")), None);
        assert_eq!(registry.read(&SlotName::new("new")), Some(1));
    }

    #[test]
    fn disconnect_retracts() {
        let registry: Registry<SlotName, i32> = Registry::new();
        let mut fill = FillBinding::new();
        fill.connect(&registry, &SlotName::new("c"), 1);
        fill.disconnect();
        fill.disconnect();

        assert_eq!(registry.read(&SlotName::new("c")), None);
        assert!(!fill.is_published());
    }

    #[test]
    fn disconnect_after_successor_published_keeps_newer_content() {
        let registry: Registry<SlotName, i32> = Registry::new();
        let mut old_fill = FillBinding::new();
        old_fill.connect(&registry, &SlotName::new("c"), 1);

        let mut new_fill = FillBinding::new();
        new_fill.connect(&registry, &SlotName::new("c"), 2);

        // The old fill unmounts after its successor has published.
        old_fill.disconnect();
        assert_eq!(registry.read(&SlotName::new("c")), Some(2));
    }

    #[test]
    fn republish_under_same_name_skips_absent_notification() {
        let registry: Registry<SlotName, i32> = Registry::new();
        let saw_absent = Rc::new(Cell::new(false));
        let s = Rc::clone(&saw_absent);
        let _sub = registry.subscribe(SlotName::new("c"), move |v| {
            if v.is_none() {
                s.set(true);
            }
        });

        let mut fill = FillBinding::new();
        fill.connect(&registry, &SlotName::new("c"), 1);
        fill.connect(&registry, &SlotName::new("c"), 2);
        assert!(!saw_absent.get());
    }
}
