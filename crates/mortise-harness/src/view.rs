#![forbid(unsafe_code)]

//! Declarative view templates.
//!
//! A [`View`] tree is plain data: the driver reconciles it into a retained
//! instance tree. Fills publish their children as a [`Projection`]
//! (`Rc<Vec<View>>`); each slot materializes its own instances from the
//! projection, so content rendered at two slots yields two independent
//! mounts.

use std::fmt;
use std::rc::Rc;

use mortise_core::SlotName;

/// Content routed through a channel: a shared, immutable view list.
pub type Projection = Rc<Vec<View>>;

/// Observer attached to a slot, invoked when its "has published content"
/// boolean flips.
#[derive(Clone)]
pub struct PresenceProbe(Rc<dyn Fn(bool)>);

impl PresenceProbe {
    #[must_use]
    pub fn new(observer: impl Fn(bool) + 'static) -> Self {
        Self(Rc::new(observer))
    }

    pub(crate) fn hook(&self) -> Rc<dyn Fn(bool)> {
        Rc::clone(&self.0)
    }
}

impl fmt::Debug for PresenceProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceProbe").finish_non_exhaustive()
    }
}

// Probes compare by identity: a template carrying the same probe is the
// same template.
impl PartialEq for PresenceProbe {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// One node of a declarative template.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Literal text.
    Text(String),
    /// A markup element wrapping children.
    Element {
        tag: &'static str,
        children: Vec<View>,
    },
    /// Renders nothing. Distinct from an absent channel: a fill publishing
    /// only `Empty` (or no children) clears a slot without fallback.
    Empty,
    /// Scope provider: owns one registry for the subtree.
    Provider { children: Vec<View> },
    /// Consumer placeholder: renders the latest published content for
    /// `name`, or `fallback` while the channel is absent.
    Slot {
        name: SlotName,
        fallback: Vec<View>,
        probe: Option<PresenceProbe>,
    },
    /// Producer: publishes `content` under `name`; renders nothing itself.
    Fill {
        name: SlotName,
        content: Vec<View>,
    },
    /// A stateful click-counter button; each mount counts independently.
    Counter,
}

impl View {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn element(tag: &'static str, children: Vec<View>) -> Self {
        Self::Element { tag, children }
    }

    #[must_use]
    pub fn provider(children: Vec<View>) -> Self {
        Self::Provider { children }
    }

    #[must_use]
    pub fn slot(name: impl Into<SlotName>) -> Self {
        Self::Slot {
            name: name.into(),
            fallback: Vec::new(),
            probe: None,
        }
    }

    #[must_use]
    pub fn slot_with_fallback(name: impl Into<SlotName>, fallback: Vec<View>) -> Self {
        Self::Slot {
            name: name.into(),
            fallback,
            probe: None,
        }
    }

    #[must_use]
    pub fn observed_slot(
        name: impl Into<SlotName>,
        fallback: Vec<View>,
        probe: PresenceProbe,
    ) -> Self {
        Self::Slot {
            name: name.into(),
            fallback,
            probe: Some(probe),
        }
    }

    #[must_use]
    pub fn fill(name: impl Into<SlotName>, content: Vec<View>) -> Self {
        Self::Fill {
            name: name.into(),
            content,
        }
    }

    #[must_use]
    pub fn counter() -> Self {
        Self::Counter
    }
}
