#![forbid(unsafe_code)]

//! Runtime: the adapter layer between the Mortise channel registry and a
//! host UI tree.
//!
//! # Role in Mortise
//! `mortise-runtime` owns everything between the pure registry
//! (`mortise-core`) and a concrete host: scope providers, namespaces with
//! their missing-scope policies, the slot (consumer) and fill (producer)
//! bindings, and the dual-mode effect queue that keeps static and
//! interactive output identical.
//!
//! # Primary responsibilities
//! - **Scope**: one registry per provider activation.
//! - **Namespace**: typed (fail loudly outside a scope) or shared (fall back
//!   to a lazily-created default registry).
//! - **SlotBinding / FillBinding**: the subscription and publication
//!   protocols, including re-subscribe on name change, cache sync on mount,
//!   presence-flip observation, and retract-on-deactivate.
//! - **Effects**: run now (static) or at commit (interactive) — both arms
//!   execute the identical closures over the identical core, so cross-mode
//!   output identity is structural rather than coincidental.
//!
//! # How it fits in the system
//! A host (such as `mortise-harness`) threads scopes through its tree,
//! constructs bindings per slot/fill instance, and schedules their
//! `connect`/`disconnect` calls through an [`Effects`] queue it flushes at
//! its commit point.

pub mod effects;
pub mod error;
pub mod fill;
pub mod namespace;
pub mod scope;
pub mod slot;

pub use effects::Effects;
pub use error::SlotError;
pub use fill::FillBinding;
pub use namespace::{MissingScopePolicy, Namespace};
pub use scope::Scope;
pub use slot::SlotBinding;
