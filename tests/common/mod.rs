//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};
use tally_core::{
    dom::{Document, NodeId},
    TallyEvent,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times - subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A sessionlab-shaped host view rendered into a document.
pub struct HostView {
    pub doc: Document,
    pub host_root: NodeId,
    pub scope: NodeId,
    pub scope_total: NodeId,
    pub anchor: NodeId,
}

/// Render the stable host scaffolding: `#main-panel` view root,
/// `#react-header-left` header timer (the watch scope), and the
/// `#vertical-tabs-tabpane-info` anchor with one pre-existing child.
#[allow(dead_code)]
pub fn render_host(doc: &Document) -> HostView {
    let host_root = doc.create_element("div");
    doc.set_attr(host_root, "id", "main-panel");
    doc.append_child(doc.root(), host_root);

    let scope = doc.create_element("div");
    doc.set_attr(scope, "id", "react-header-left");
    let scope_total = doc.create_element("span");
    doc.set_text(scope_total, "0min");
    doc.append_child(scope, scope_total);
    doc.append_child(doc.root(), scope);

    let anchor = doc.create_element("div");
    doc.set_attr(anchor, "id", "vertical-tabs-tabpane-info");
    let existing = doc.create_element("div");
    doc.add_class(existing, "session-meta");
    doc.append_child(anchor, existing);
    doc.append_child(doc.root(), anchor);

    HostView {
        doc: doc.clone(),
        host_root,
        scope,
        scope_total,
        anchor,
    }
}

/// Append one session block; returns the participant grouping node.
#[allow(dead_code)]
pub fn add_block(
    view: &HostView,
    duration_fields: &[&str],
    participants: &[(&str, &str)],
) -> NodeId {
    let doc = &view.doc;
    let block = doc.create_element("div");
    doc.add_class(block, "session-block");

    let duration_side = doc.create_element("div");
    let container = doc.create_element("div");
    doc.add_class(container, "FuzzyDurationTimeInput");
    let span = doc.create_element("span");
    for field in duration_fields {
        let b = doc.create_element("b");
        doc.set_text(b, field);
        doc.append_child(span, b);
    }
    doc.append_child(container, span);
    doc.append_child(duration_side, container);

    let group = doc.create_element("div");
    doc.add_class(group, "block-users");
    for (name, avatar) in participants {
        let entry = doc.create_element("span");
        doc.add_class(entry, "user");
        doc.add_class(entry, "user-inline");
        let img = doc.create_element("img");
        doc.set_attr(img, "alt", name);
        doc.set_attr(img, "src", avatar);
        doc.append_child(entry, img);

        let edit = doc.create_element("span");
        doc.add_class(edit, "user-edit");
        let button = doc.create_element("a");
        doc.set_attr(button, "role", "button");
        doc.append_child(edit, button);
        doc.append_child(entry, edit);

        doc.append_child(group, entry);
    }

    doc.append_child(block, duration_side);
    doc.append_child(block, group);
    doc.append_child(view.host_root, block);
    group
}

/// Block until an event matching `pred` arrives, or panic after 5 seconds.
#[allow(dead_code)]
pub fn wait_for_event(
    rx: &Receiver<TallyEvent>,
    pred: impl Fn(&TallyEvent) -> bool,
) -> TallyEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .expect("timed out waiting for event");
        let event = rx
            .recv_timeout(remaining)
            .expect("timed out waiting for event");
        if pred(&event) {
            return event;
        }
    }
}

/// Collect every event arriving within `window`.
#[allow(dead_code)]
pub fn drain_events(rx: &Receiver<TallyEvent>, window: Duration) -> Vec<TallyEvent> {
    let deadline = Instant::now() + window;
    let mut events = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(event) => events.push(event),
            Err(_) => break,
        }
    }
    events
}
