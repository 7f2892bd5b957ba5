#![forbid(unsafe_code)]

//! Dual-mode render driver.
//!
//! # Design
//!
//! One [`Driver`] owns one tree: a template, its retained instances, and a
//! dirty flag shared with every slot binding under it. A render runs
//! reconcile → commit-flush → repeat until no binding invalidated the tree,
//! then serializes the settled instances to markup.
//!
//! The loop is the same in both modes; only the effect arm differs (inline
//! vs at-commit), which is what makes static and interactive output
//! structurally identical for the same template.
//!
//! # Invariants
//!
//! 1. `render` returns only a settled tree: no pending effects, no dirty
//!    bindings.
//! 2. Rendering the same template twice yields identical markup
//!    (determinism).
//! 3. Counter state survives re-renders whose reconciliation keeps the
//!    counter's instance.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use mortise_core::{RenderMode, SlotName};
use mortise_runtime::{Effects, Namespace, SlotError};
use smallvec::SmallVec;

use crate::instance::{self, Instance, ReconcileCx};
use crate::markup;
use crate::view::{Projection, View};

/// Upper bound on reconcile passes per render. A tree needing more is
/// cyclic (a fill whose publication changes its own slot's content).
const MAX_SETTLE_PASSES: usize = 32;

pub struct Driver {
    mode: RenderMode,
    namespace: Rc<Namespace<SlotName, Projection>>,
    template: Vec<View>,
    roots: Vec<Instance>,
    dirty: Rc<Cell<bool>>,
}

impl Driver {
    #[must_use]
    pub fn new(
        mode: RenderMode,
        namespace: Rc<Namespace<SlotName, Projection>>,
        template: Vec<View>,
    ) -> Self {
        Self {
            mode,
            namespace,
            template,
            roots: Vec::new(),
            dirty: Rc::new(Cell::new(false)),
        }
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Render the current template to settled markup.
    pub fn render(&mut self) -> Result<String, SlotError> {
        self.settle()?;
        Ok(markup::render_to_string(&self.roots))
    }

    /// Replace the template and re-render.
    pub fn set_template(&mut self, template: Vec<View>) -> Result<String, SlotError> {
        self.template = template;
        self.render()
    }

    /// Click the `index`-th counter in document order and re-render.
    ///
    /// # Panics
    ///
    /// Panics if no counter exists at `index` (a test authoring mistake).
    pub fn click_counter(&mut self, index: usize) -> Result<String, SlotError> {
        assert!(
            self.mode.is_interactive(),
            "click events require interactive mode"
        );
        let mut seen = 0;
        let clicked = instance::click_nth_counter(&mut self.roots, index, &mut seen);
        assert!(clicked, "no counter at index {index}");
        self.render()
    }

    /// Current counter values in document order.
    #[must_use]
    pub fn counter_values(&self) -> Vec<u32> {
        let mut out: SmallVec<[u32; 8]> = SmallVec::new();
        instance::collect_counters(&self.roots, &mut out);
        out.to_vec()
    }

    fn settle(&mut self) -> Result<(), SlotError> {
        for pass in 0..MAX_SETTLE_PASSES {
            self.dirty.set(false);
            let mut effects = Effects::new(self.mode);
            let invalidate: Rc<dyn Fn()> = {
                let dirty = Rc::clone(&self.dirty);
                Rc::new(move || dirty.set(true))
            };
            {
                let mut cx = ReconcileCx {
                    namespace: self.namespace.as_ref(),
                    effects: &mut effects,
                    invalidate,
                };
                instance::reconcile_children(&mut self.roots, &self.template, None, &mut cx)?;
            }
            effects.flush_commit();
            if !self.dirty.get() {
                debug!(pass, mode = ?self.mode, "render settled");
                return Ok(());
            }
        }
        panic!("render did not settle within {MAX_SETTLE_PASSES} passes");
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("mode", &self.mode)
            .field("roots", &self.roots.len())
            .finish()
    }
}
