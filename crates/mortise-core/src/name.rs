#![forbid(unsafe_code)]

//! Interned channel name token used by the shared namespace.

use std::fmt;
use std::rc::Rc;

/// An opaque, cheaply cloneable channel name.
///
/// Names are compared by value and carry no structure: no hierarchy, no
/// wildcards. Typed namespaces may use their own name type (any
/// `Clone + Eq + Hash` token, e.g. an enum); `SlotName` is the string-based
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotName(Rc<str>);

impl SlotName {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Rc::from(name.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SlotName {
    fn from(name: String) -> Self {
        Self(Rc::from(name.as_str()))
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
