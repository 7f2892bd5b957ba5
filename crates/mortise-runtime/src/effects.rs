#![forbid(unsafe_code)]

//! Dual-mode effect queue.
//!
//! # Design
//!
//! Publish/subscribe side effects must run at different times depending on
//! the render mode:
//!
//! - **Static**: there is no later commit phase. Effects run inline, exactly
//!   once, as they are scheduled — deferring would produce output with no
//!   projected content at all.
//! - **Interactive**: effects are queued during the render pass and flushed
//!   synchronously at commit, before anything is presented. Never on a later
//!   tick: a slot must not visibly flash its fallback when matching content
//!   is already published.
//!
//! Both arms execute the identical closures. The mode is injected at
//! construction ([`Effects::new`]); nothing here inspects a global.

use mortise_core::RenderMode;
use tracing::trace;

type Effect = Box<dyn FnOnce()>;

/// Two-armed effect scheduler: inline in static mode, deferred-to-commit in
/// interactive mode.
pub struct Effects {
    mode: RenderMode,
    queue: Vec<Effect>,
}

impl Effects {
    #[must_use]
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            queue: Vec::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Schedule an effect. Runs immediately in static mode; queued for the
    /// next [`flush_commit`](Self::flush_commit) in interactive mode.
    pub fn run(&mut self, effect: impl FnOnce() + 'static) {
        match self.mode {
            RenderMode::Static => effect(),
            RenderMode::Interactive => self.queue.push(Box::new(effect)),
        }
    }

    /// Flush all queued effects synchronously, in scheduling order. Returns
    /// the number of effects executed. A no-op in static mode (the queue is
    /// always empty there).
    pub fn flush_commit(&mut self) -> usize {
        let mut executed = 0;
        while !self.queue.is_empty() {
            let batch = std::mem::take(&mut self.queue);
            executed += batch.len();
            for effect in batch {
                effect();
            }
        }
        if executed > 0 {
            trace!(executed, "commit flush");
        }
        executed
    }

    /// Number of effects currently queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for Effects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effects")
            .field("mode", &self.mode)
            .field("pending", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn static_mode_runs_inline() {
        let mut effects = Effects::new(RenderMode::Static);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        effects.run(move || l.borrow_mut().push(1));
        assert_eq!(&*log.borrow(), &[1]);
        assert_eq!(effects.pending(), 0);
        assert_eq!(effects.flush_commit(), 0);
    }

    #[test]
    fn interactive_mode_defers_to_commit_in_order() {
        let mut effects = Effects::new(RenderMode::Interactive);
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let l = Rc::clone(&log);
            effects.run(move || l.borrow_mut().push(i));
        }
        assert!(log.borrow().is_empty());
        assert_eq!(effects.pending(), 3);

        assert_eq!(effects.flush_commit(), 3);
        assert_eq!(&*log.borrow(), &[0, 1, 2]);
    }
}
