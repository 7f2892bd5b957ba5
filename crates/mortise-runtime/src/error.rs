#![forbid(unsafe_code)]

//! Runtime error types.

use std::error::Error;
use std::fmt;

/// Errors surfaced by the runtime layer.
///
/// The registry itself is total; the only failure is structural — a typed
/// namespace's slot or fill used with no enclosing scope provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// A `Fail`-policy namespace was resolved outside any scope provider.
    MissingScope {
        /// Label of the namespace, for diagnostics.
        namespace: &'static str,
    },
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScope { namespace } => write!(
                f,
                "slot namespace `{namespace}` must be used inside a scope provider"
            ),
        }
    }
}

impl Error for SlotError {}
