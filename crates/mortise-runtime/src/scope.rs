#![forbid(unsafe_code)]

//! Scope: one channel registry per provider activation.

use std::fmt;
use std::hash::Hash;

use mortise_core::Registry;

/// A cloneable handle to the registry owned by one scope provider.
///
/// Every provider activation creates exactly one `Scope`; all slots and
/// fills under it share the registry through cloned handles. Nested scopes
/// are fully independent — a binding resolves against the nearest one, never
/// an ancestor's. Dropping the last handle tears the registry down; any
/// remaining subscriptions and retraction handles become no-ops.
pub struct Scope<N, T> {
    registry: Registry<N, T>,
}

impl<N, T> Clone for Scope<N, T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<N, T> fmt::Debug for Scope<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").finish_non_exhaustive()
    }
}

impl<N, T> Scope<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry<N, T> {
        &self.registry
    }

    /// Whether two handles belong to the same provider activation.
    #[must_use]
    pub fn same_scope(&self, other: &Self) -> bool {
        self.registry.same_registry(&other.registry)
    }
}

impl<N, T> Default for Scope<N, T>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
