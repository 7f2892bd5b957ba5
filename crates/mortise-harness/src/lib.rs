#![forbid(unsafe_code)]

//! Harness: a deterministic headless host for Mortise.
//!
//! # Role in Mortise
//! The engine (`mortise-core` + `mortise-runtime`) is host-agnostic; proving
//! its properties needs a concrete host. This crate supplies the smallest
//! real one: a declarative [`View`] tree, a retained instance tree with
//! positional reconciliation, and a [`Driver`] that renders the tree to
//! markup in either render mode — static (one synchronous pass, effects
//! inline) or interactive (render/commit cycles, effects flushed at commit,
//! click events).
//!
//! The core correctness property — fully-settled interactive output is
//! byte-identical to static output for the same tree — is proven against
//! this host in `tests/`.
//!
//! # Shared default namespace
//! [`shared_namespace`] exposes one thread-local shared namespace, the
//! explicit opt-in default for hosts that do not construct their own.
//! Tests needing isolation construct a fresh [`Namespace`] instead, or call
//! `reset_fallback` on the shared one.

pub mod driver;
mod instance;
mod markup;
pub mod view;

use std::rc::Rc;

use mortise_core::SlotName;
use mortise_runtime::Namespace;

pub use driver::Driver;
pub use view::{PresenceProbe, Projection, View};

thread_local! {
    static SHARED_NAMESPACE: Rc<Namespace<SlotName, Projection>> =
        Rc::new(Namespace::shared("default"));
}

/// The process-wide (per thread of trees) shared namespace with fallback
/// policy. Lazily constructed once; every caller sees the same instance.
#[must_use]
pub fn shared_namespace() -> Rc<Namespace<SlotName, Projection>> {
    SHARED_NAMESPACE.with(Rc::clone)
}
