#![forbid(unsafe_code)]

//! Retained instance tree and reconciliation.
//!
//! # Design
//!
//! The driver keeps one [`Instance`] per mounted template node.
//! Reconciliation is positional: an instance is kept when the template node
//! at the same position has the same kind (and tag, for elements),
//! otherwise the old subtree is unmounted and a fresh one mounted. Kept
//! instances preserve their state — counters keep counting, slot bindings
//! keep their subscription.
//!
//! Slot and fill lifecycle calls (`connect`/`disconnect`) are never invoked
//! directly from reconciliation; they are scheduled through the pass's
//! [`Effects`] queue, which runs them inline in static mode and at commit
//! in interactive mode. Reconciliation itself is identical in both modes.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use mortise_core::SlotName;
use mortise_runtime::{Effects, FillBinding, Namespace, Scope, SlotBinding, SlotError};

use crate::view::{Projection, View};

type HostScope = Scope<SlotName, Projection>;
type HostSlot = Rc<RefCell<SlotBinding<SlotName, Projection>>>;
type HostFill = Rc<RefCell<FillBinding<SlotName, Projection>>>;

/// What a slot's mounted children were materialized from.
pub(crate) enum ShowSource {
    Fallback,
    Projection(Projection),
}

pub(crate) enum Instance {
    Text(String),
    Element {
        tag: &'static str,
        children: Vec<Instance>,
    },
    Empty,
    Provider {
        scope: HostScope,
        children: Vec<Instance>,
    },
    Slot {
        binding: HostSlot,
        fallback: Vec<View>,
        source: ShowSource,
        mounted: Vec<Instance>,
    },
    Fill {
        binding: HostFill,
    },
    Counter {
        count: u32,
    },
}

/// Shared per-pass reconciliation context.
pub(crate) struct ReconcileCx<'a> {
    pub namespace: &'a Namespace<SlotName, Projection>,
    pub effects: &'a mut Effects,
    /// Host re-render hook handed to slot bindings.
    pub invalidate: Rc<dyn Fn()>,
}

pub(crate) fn reconcile_children(
    instances: &mut Vec<Instance>,
    views: &[View],
    scope: Option<&HostScope>,
    cx: &mut ReconcileCx<'_>,
) -> Result<(), SlotError> {
    while instances.len() > views.len() {
        if let Some(mut extra) = instances.pop() {
            unmount(&mut extra, cx.effects);
        }
    }
    for (position, view) in views.iter().enumerate() {
        if position < instances.len() {
            if compatible(&instances[position], view) {
                update(&mut instances[position], view, scope, cx)?;
                continue;
            }
            let mut old = std::mem::replace(&mut instances[position], Instance::Empty);
            unmount(&mut old, cx.effects);
            instances[position] = mount(view, scope, cx)?;
        } else {
            let mounted = mount(view, scope, cx)?;
            instances.push(mounted);
        }
    }
    Ok(())
}

fn compatible(instance: &Instance, view: &View) -> bool {
    match (instance, view) {
        (Instance::Text(_), View::Text(_)) => true,
        (Instance::Element { tag, .. }, View::Element { tag: view_tag, .. }) => tag == view_tag,
        (Instance::Empty, View::Empty) => true,
        (Instance::Provider { .. }, View::Provider { .. }) => true,
        (Instance::Slot { .. }, View::Slot { .. }) => true,
        (Instance::Fill { .. }, View::Fill { .. }) => true,
        (Instance::Counter { .. }, View::Counter) => true,
        _ => false,
    }
}

fn mount(
    view: &View,
    scope: Option<&HostScope>,
    cx: &mut ReconcileCx<'_>,
) -> Result<Instance, SlotError> {
    match view {
        View::Text(text) => Ok(Instance::Text(text.clone())),
        View::Empty => Ok(Instance::Empty),
        View::Element { tag, children } => {
            let mut mounted = Vec::new();
            reconcile_children(&mut mounted, children, scope, cx)?;
            Ok(Instance::Element {
                tag,
                children: mounted,
            })
        }
        View::Provider { children } => {
            let provider_scope = HostScope::new();
            let mut mounted = Vec::new();
            reconcile_children(&mut mounted, children, Some(&provider_scope), cx)?;
            Ok(Instance::Provider {
                scope: provider_scope,
                children: mounted,
            })
        }
        View::Slot {
            name,
            fallback,
            probe,
        } => {
            let registry = cx.namespace.resolve(scope)?;
            let mut binding = SlotBinding::new(Rc::clone(&cx.invalidate));
            if let Some(probe) = probe {
                binding = binding.with_observer(probe.hook());
            }
            let binding = Rc::new(RefCell::new(binding));

            {
                let binding = Rc::clone(&binding);
                let name = name.clone();
                cx.effects
                    .run(move || binding.borrow_mut().connect(&registry, &name));
            }

            // In static mode the connect effect has already run; in
            // interactive mode this reads absent and the commit flush
            // triggers a follow-up pass.
            let source = match binding.borrow().projected() {
                Some(projection) => ShowSource::Projection(projection),
                None => ShowSource::Fallback,
            };
            let source_views: Projection = match &source {
                ShowSource::Projection(projection) => Rc::clone(projection),
                ShowSource::Fallback => Rc::new(fallback.clone()),
            };
            let mut mounted = Vec::new();
            reconcile_children(&mut mounted, source_views.as_slice(), scope, cx)?;
            Ok(Instance::Slot {
                binding,
                fallback: fallback.clone(),
                source,
                mounted,
            })
        }
        View::Fill { name, content } => {
            let registry = cx.namespace.resolve(scope)?;
            let binding: HostFill = Rc::new(RefCell::new(FillBinding::new()));
            let projection: Projection = Rc::new(content.clone());
            {
                let binding = Rc::clone(&binding);
                let name = name.clone();
                cx.effects
                    .run(move || binding.borrow_mut().connect(&registry, &name, projection));
            }
            Ok(Instance::Fill { binding })
        }
        View::Counter => Ok(Instance::Counter { count: 0 }),
    }
}

fn update(
    instance: &mut Instance,
    view: &View,
    scope: Option<&HostScope>,
    cx: &mut ReconcileCx<'_>,
) -> Result<(), SlotError> {
    match (instance, view) {
        (Instance::Text(current), View::Text(text)) => {
            if *current != *text {
                *current = text.clone();
            }
            Ok(())
        }
        (Instance::Empty, View::Empty) | (Instance::Counter { .. }, View::Counter) => Ok(()),
        (Instance::Element { children, .. }, View::Element { children: views, .. }) => {
            reconcile_children(children, views, scope, cx)
        }
        (Instance::Provider { scope: provider_scope, children }, View::Provider { children: views }) => {
            let provider_scope = provider_scope.clone();
            reconcile_children(children, views, Some(&provider_scope), cx)
        }
        (
            Instance::Slot {
                binding,
                fallback,
                source,
                mounted,
            },
            View::Slot {
                name,
                fallback: view_fallback,
                ..
            },
        ) => {
            let registry = cx.namespace.resolve(scope)?;
            {
                let binding = Rc::clone(binding);
                let name = name.clone();
                cx.effects
                    .run(move || binding.borrow_mut().connect(&registry, &name));
            }
            *fallback = view_fallback.clone();

            let desired = binding.borrow().projected();
            let unchanged = match (&*source, &desired) {
                (ShowSource::Fallback, None) => true,
                (ShowSource::Projection(current), Some(next)) => {
                    Rc::ptr_eq(current, next) || current == next
                }
                _ => false,
            };
            if !unchanged {
                unmount_children(mounted, cx.effects);
                *source = match desired {
                    Some(projection) => ShowSource::Projection(projection),
                    None => ShowSource::Fallback,
                };
            }
            let source_views: Projection = match &*source {
                ShowSource::Projection(projection) => Rc::clone(projection),
                ShowSource::Fallback => Rc::new(fallback.clone()),
            };
            reconcile_children(mounted, source_views.as_slice(), scope, cx)
        }
        (Instance::Fill { binding }, View::Fill { name, content }) => {
            let registry = cx.namespace.resolve(scope)?;
            let binding = Rc::clone(binding);
            let name = name.clone();
            let projection: Projection = Rc::new(content.clone());
            cx.effects
                .run(move || binding.borrow_mut().connect(&registry, &name, projection));
            Ok(())
        }
        // compatible() rules out every other pairing.
        _ => Ok(()),
    }
}

fn unmount(instance: &mut Instance, effects: &mut Effects) {
    match instance {
        Instance::Text(_) | Instance::Empty | Instance::Counter { .. } => {}
        Instance::Element { children, .. } | Instance::Provider { children, .. } => {
            unmount_children(children, effects);
        }
        Instance::Slot { binding, mounted, .. } => {
            unmount_children(mounted, effects);
            let binding = Rc::clone(binding);
            effects.run(move || binding.borrow_mut().disconnect());
        }
        Instance::Fill { binding } => {
            let binding = Rc::clone(binding);
            effects.run(move || binding.borrow_mut().disconnect());
        }
    }
}

fn unmount_children(children: &mut Vec<Instance>, effects: &mut Effects) {
    for child in children.iter_mut() {
        unmount(child, effects);
    }
    children.clear();
}

/// Increment the `index`-th counter in document order (depth-first,
/// including slot-mounted content). Returns whether one was found.
pub(crate) fn click_nth_counter(
    instances: &mut Vec<Instance>,
    index: usize,
    seen: &mut usize,
) -> bool {
    for instance in instances.iter_mut() {
        match instance {
            Instance::Counter { count } => {
                if *seen == index {
                    *count += 1;
                    return true;
                }
                *seen += 1;
            }
            Instance::Element { children, .. } | Instance::Provider { children, .. } => {
                if click_nth_counter(children, index, seen) {
                    return true;
                }
            }
            Instance::Slot { mounted, .. } => {
                if click_nth_counter(mounted, index, seen) {
                    return true;
                }
            }
            Instance::Text(_) | Instance::Empty | Instance::Fill { .. } => {}
        }
    }
    false
}

/// Collect counter values in document order.
pub(crate) fn collect_counters(instances: &[Instance], out: &mut SmallVec<[u32; 8]>) {
    for instance in instances {
        match instance {
            Instance::Counter { count } => out.push(*count),
            Instance::Element { children, .. } | Instance::Provider { children, .. } => {
                collect_counters(children, out);
            }
            Instance::Slot { mounted, .. } => collect_counters(mounted, out),
            Instance::Text(_) | Instance::Empty | Instance::Fill { .. } => {}
        }
    }
}
