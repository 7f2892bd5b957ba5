#![forbid(unsafe_code)]

//! Render-mode flag selecting effect timing.
//!
//! The mode is injected wherever it is consumed (the runtime's effect queue
//! takes it at construction); nothing in Mortise reads it from a global.

/// Whether the host is producing one-shot static output or running an
/// interactive render/commit loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// A single synchronous pass producing final output, with no later
    /// commit phase. Publish/subscribe effects must run inline, exactly
    /// once, or the output would contain no projected content at all.
    Static,
    /// Repeated render/commit cycles. Effects are deferred to the commit
    /// point and flushed synchronously there, before anything is presented.
    #[default]
    Interactive,
}

impl RenderMode {
    #[must_use]
    pub fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }

    #[must_use]
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Interactive)
    }
}
