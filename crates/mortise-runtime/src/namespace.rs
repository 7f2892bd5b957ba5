#![forbid(unsafe_code)]

//! Namespaces: independent slot/fill universes with a missing-scope policy.
//!
//! A namespace yields one provider/slot/fill universe isolated from every
//! other namespace. What happens when a binding resolves with no enclosing
//! scope is decided per namespace at construction:
//!
//! - [`Namespace::typed`] — fail loudly with [`SlotError::MissingScope`].
//!   There is no sensible registry to fall back to, and the mistake is
//!   structural, so it should surface during development.
//! - [`Namespace::shared`] — fall back to one lazily-created, namespace-wide
//!   default registry. This is an explicit opt-in default, not hidden magic:
//!   [`reset_fallback`](Namespace::reset_fallback) lets tests clear it.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use mortise_core::Registry;

use crate::error::SlotError;
use crate::scope::Scope;

/// Behavior when a binding resolves outside any scope provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingScopePolicy {
    /// Surface [`SlotError::MissingScope`].
    Fail,
    /// Use the namespace-wide default registry, creating it on first use.
    Fallback,
}

/// An isolated slot/fill universe.
///
/// The name type `N` restricts channel names at compile time: a typed
/// namespace over an enum of slot names cannot be addressed with an
/// arbitrary string.
pub struct Namespace<N, T> {
    label: &'static str,
    policy: MissingScopePolicy,
    fallback: RefCell<Option<Registry<N, T>>>,
}

impl<N, T> fmt::Debug for Namespace<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("label", &self.label)
            .field("policy", &self.policy)
            .field("has_fallback", &self.fallback.borrow().is_some())
            .finish()
    }
}

impl<N, T> Namespace<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + 'static,
{
    /// A typed, isolated namespace: resolving outside a scope is an error.
    #[must_use]
    pub fn typed(label: &'static str) -> Self {
        Self {
            label,
            policy: MissingScopePolicy::Fail,
            fallback: RefCell::new(None),
        }
    }

    /// A shared namespace: resolving outside a scope uses the namespace-wide
    /// default registry.
    #[must_use]
    pub fn shared(label: &'static str) -> Self {
        Self {
            label,
            policy: MissingScopePolicy::Fallback,
            fallback: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn policy(&self) -> MissingScopePolicy {
        self.policy
    }

    /// Resolve the registry a binding should use: the enclosing scope's if
    /// one exists, otherwise per policy.
    pub fn resolve(&self, scope: Option<&Scope<N, T>>) -> Result<Registry<N, T>, SlotError> {
        if let Some(scope) = scope {
            return Ok(scope.registry().clone());
        }
        match self.policy {
            MissingScopePolicy::Fail => Err(SlotError::MissingScope {
                namespace: self.label,
            }),
            MissingScopePolicy::Fallback => Ok(self.fallback_registry()),
        }
    }

    /// Whether the fallback registry has been created.
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.borrow().is_some()
    }

    /// Drop the fallback registry, if any. Subscriptions and cached content
    /// held through it become moot; the next scope-less resolve creates a
    /// fresh one.
    pub fn reset_fallback(&self) {
        if self.fallback.borrow_mut().take().is_some() {
            debug!(namespace = self.label, "fallback registry reset");
        }
    }

    fn fallback_registry(&self) -> Registry<N, T> {
        let mut fallback = self.fallback.borrow_mut();
        fallback
            .get_or_insert_with(|| {
                debug!(namespace = self.label, "fallback registry created");
                Registry::new()
            })
            .clone()
    }
}
