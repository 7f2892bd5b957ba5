#![forbid(unsafe_code)]

//! Core: the publish/subscribe engine behind Mortise slot/fill projection.
//!
//! # Role in Mortise
//! `mortise-core` is the framework-free heart. It owns the channel registry
//! (named content channels with last-value caching and ordered fan-out),
//! the RAII subscription and retraction handles, and the render-mode
//! predicate that the adapter layer uses to pick effect timing.
//!
//! # Primary responsibilities
//! - **Registry**: per-scope channel map; `publish` / `subscribe` / `read`.
//! - **Subscription**: RAII guard; dropping it unsubscribes exactly one
//!   registration.
//! - **Retraction**: epoch-guarded handle clearing a publication back to
//!   absent.
//! - **RenderMode**: injected static-vs-interactive flag.
//!
//! # How it fits in the system
//! The runtime (`mortise-runtime`) builds the slot/fill bindings on top of
//! these operations and schedules them through its dual-mode effect queue.
//! Nothing in this crate knows about trees, scopes, or commits; it is a pure
//! data structure plus notification logic.

pub mod mode;
pub mod name;
pub mod registry;

pub use mode::RenderMode;
pub use name::SlotName;
pub use registry::{Registry, Retraction, Subscription};
