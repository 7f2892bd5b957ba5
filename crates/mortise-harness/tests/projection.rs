#![forbid(unsafe_code)]

//! Integration tests for content projection through the headless host:
//! fan-out, caching, retraction, isolation, presence observation, and
//! namespace policy.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::Level;

use mortise_core::RenderMode;
use mortise_harness::{shared_namespace, Driver, PresenceProbe, View};
use mortise_runtime::{Namespace, SlotError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
}

fn shared_ns() -> Rc<Namespace<mortise_core::SlotName, mortise_harness::Projection>> {
    Rc::new(Namespace::shared("test"))
}

fn typed_ns() -> Rc<Namespace<mortise_core::SlotName, mortise_harness::Projection>> {
    Rc::new(Namespace::typed("typed-test"))
}

#[test]
fn fan_out_to_every_slot_with_the_name() {
    init_tracing();
    let template = vec![View::provider(vec![
        View::element("header", vec![View::slot("banner")]),
        View::element("footer", vec![View::slot("banner")]),
        View::fill("banner", vec![View::text("hi")]),
    ])];
    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), template);
    assert_eq!(
        driver.render().unwrap(),
        "<header>hi</header><footer>hi</footer>"
    );
}

#[test]
fn slot_mounting_after_fill_reads_cache() {
    init_tracing();
    let mut driver = Driver::new(
        RenderMode::Interactive,
        shared_ns(),
        vec![View::provider(vec![View::fill(
            "late",
            vec![View::text("cached")],
        )])],
    );
    assert_eq!(driver.render().unwrap(), "");

    // The slot mounts a render later; the publish happened in the past.
    let markup = driver
        .set_template(vec![View::provider(vec![
            View::fill("late", vec![View::text("cached")]),
            View::element("aside", vec![View::slot("late")]),
        ])])
        .unwrap();
    assert_eq!(markup, "<aside>cached</aside>");
}

#[test]
fn fill_unmount_restores_fallback() {
    init_tracing();
    let with_fill = vec![View::provider(vec![
        View::slot_with_fallback("s", vec![View::text("fallback")]),
        View::fill("s", vec![View::text("filled")]),
    ])];
    let without_fill = vec![View::provider(vec![View::slot_with_fallback(
        "s",
        vec![View::text("fallback")],
    )])];

    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), with_fill);
    assert_eq!(driver.render().unwrap(), "filled");
    assert_eq!(driver.set_template(without_fill).unwrap(), "fallback");
}

#[test]
fn explicit_empty_fill_clears_without_fallback() {
    init_tracing();
    let template = vec![View::provider(vec![
        View::element(
            "div",
            vec![View::slot_with_fallback("s", vec![View::text("fallback")])],
        ),
        View::fill("s", vec![]),
    ])];
    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), template);
    // Published empty content is distinct from absent: no fallback.
    assert_eq!(driver.render().unwrap(), "<div></div>");
}

#[test]
fn per_name_isolation() {
    init_tracing();
    let template = vec![View::provider(vec![
        View::slot_with_fallback("a", vec![View::text("a-fallback")]),
        View::slot_with_fallback("b", vec![View::text("b-fallback")]),
        View::fill("a", vec![View::text("a-content")]),
    ])];
    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), template);
    assert_eq!(driver.render().unwrap(), "a-contentb-fallback");
}

#[test]
fn nested_scopes_are_independent() {
    init_tracing();
    let template = vec![View::provider(vec![
        View::slot_with_fallback("s", vec![View::text("outer-fallback")]),
        View::provider(vec![
            View::fill("s", vec![View::text("inner-content")]),
            View::slot("s"),
        ]),
    ])];
    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), template);
    // The inner fill reaches only the inner slot; the outer slot keeps its
    // fallback.
    assert_eq!(driver.render().unwrap(), "outer-fallbackinner-content");
}

#[test]
fn presence_observer_fires_once_per_flip() {
    init_tracing();
    let flips = Rc::new(RefCell::new(Vec::new()));
    let probe = {
        let flips = Rc::clone(&flips);
        PresenceProbe::new(move |present| flips.borrow_mut().push(present))
    };

    let slot_only = |probe: PresenceProbe| {
        vec![View::provider(vec![View::observed_slot(
            "s",
            vec![View::text("fb")],
            probe,
        )])]
    };
    let with_fill = |probe: PresenceProbe, text: &str| {
        vec![View::provider(vec![
            View::observed_slot("s", vec![View::text("fb")], probe),
            View::fill("s", vec![View::text(text)]),
        ])]
    };

    let mut driver = Driver::new(
        RenderMode::Interactive,
        shared_ns(),
        slot_only(probe.clone()),
    );
    driver.render().unwrap();
    assert!(flips.borrow().is_empty());

    driver.set_template(with_fill(probe.clone(), "one")).unwrap();
    assert_eq!(&*flips.borrow(), &[true]);

    // Content-only update: presence unchanged, no extra invocation.
    driver.set_template(with_fill(probe.clone(), "two")).unwrap();
    assert_eq!(&*flips.borrow(), &[true]);

    driver.set_template(slot_only(probe)).unwrap();
    assert_eq!(&*flips.borrow(), &[true, false]);
}

#[test]
fn slot_name_change_resubscribes() {
    init_tracing();
    let template_for = |slot_name: &'static str| {
        vec![View::provider(vec![
            View::slot(slot_name),
            View::fill("a", vec![View::text("A")]),
            View::fill("b", vec![View::text("B")]),
        ])]
    };

    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), template_for("a"));
    assert_eq!(driver.render().unwrap(), "A");

    // Renaming the slot re-subscribes and syncs from the new channel's
    // cache.
    assert_eq!(driver.set_template(template_for("b")).unwrap(), "B");
}

#[test]
fn typed_namespace_fails_without_provider() {
    init_tracing();
    let mut driver = Driver::new(RenderMode::Interactive, typed_ns(), vec![View::slot("s")]);
    assert_eq!(
        driver.render(),
        Err(SlotError::MissingScope {
            namespace: "typed-test"
        })
    );
}

#[test]
fn typed_namespace_works_inside_provider() {
    init_tracing();
    let template = vec![View::provider(vec![
        View::slot("s"),
        View::fill("s", vec![View::text("typed")]),
    ])];
    let mut driver = Driver::new(RenderMode::Interactive, typed_ns(), template);
    assert_eq!(driver.render().unwrap(), "typed");
}

#[test]
fn shared_namespace_routes_across_trees_without_providers() {
    init_tracing();
    let ns = shared_ns();

    let mut producer = Driver::new(
        RenderMode::Interactive,
        Rc::clone(&ns),
        vec![View::fill("global", vec![View::text("from afar")])],
    );
    producer.render().unwrap();

    let mut consumer = Driver::new(
        RenderMode::Interactive,
        Rc::clone(&ns),
        vec![View::slot_with_fallback("global", vec![View::text("none")])],
    );
    // Both trees fell back to the same namespace-wide registry.
    assert_eq!(consumer.render().unwrap(), "from afar");

    ns.reset_fallback();
    let mut fresh = Driver::new(
        RenderMode::Interactive,
        Rc::clone(&ns),
        vec![View::slot_with_fallback("global", vec![View::text("none")])],
    );
    assert_eq!(fresh.render().unwrap(), "none");
}

#[test]
fn default_namespace_is_one_per_thread() {
    init_tracing();
    let ns = shared_namespace();
    assert!(Rc::ptr_eq(&ns, &shared_namespace()));

    let mut producer = Driver::new(
        RenderMode::Interactive,
        shared_namespace(),
        vec![View::fill("motd", vec![View::text("hello")])],
    );
    producer.render().unwrap();

    // A driver built independently still routes through the same fallback
    // registry.
    let mut consumer = Driver::new(
        RenderMode::Interactive,
        shared_namespace(),
        vec![View::slot_with_fallback("motd", vec![View::text("none")])],
    );
    assert_eq!(consumer.render().unwrap(), "hello");

    ns.reset_fallback();
}

#[test]
fn passthrough_children_render_in_place() {
    init_tracing();
    let template = vec![View::provider(vec![View::element(
        "main",
        vec![
            View::text("before "),
            View::slot("s"),
            View::text(" after"),
            View::fill("s", vec![View::text("middle")]),
        ],
    )])];
    let mut driver = Driver::new(RenderMode::Interactive, shared_ns(), template);
    assert_eq!(driver.render().unwrap(), "<main>before middle after</main>");
}
