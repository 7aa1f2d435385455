//! Shared test utilities for building sessionlab-shaped host documents.

use crate::dom::{Document, NodeId};

/// Initialize logging for tests
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A host document rendered in the sessionlab layout the built-in schema
/// targets.
pub struct SessionFixture {
    pub doc: Document,
    /// `#main-panel`, the host view root holding session blocks.
    pub host_root: NodeId,
    /// `#react-header-left`, the lightweight mutation-observation scope.
    pub scope: NodeId,
    /// `#vertical-tabs-tabpane-info`, the panel placement anchor.
    pub anchor: NodeId,
}

/// Render the stable host scaffolding into a fresh document: view root,
/// header timer scope (with a total-minutes text node), and placement anchor
/// that already carries one host child ahead of the panel slot.
pub fn render_host(doc: &Document) -> SessionFixture {
    let host_root = doc.create_element("div");
    doc.set_attr(host_root, "id", "main-panel");
    doc.append_child(doc.root(), host_root);

    let scope = doc.create_element("div");
    doc.set_attr(scope, "id", "react-header-left");
    let total = doc.create_element("span");
    doc.set_text(total, "0min");
    doc.append_child(scope, total);
    doc.append_child(doc.root(), scope);

    let anchor = doc.create_element("div");
    doc.set_attr(anchor, "id", "vertical-tabs-tabpane-info");
    let existing = doc.create_element("div");
    doc.add_class(existing, "session-meta");
    doc.append_child(anchor, existing);
    doc.append_child(doc.root(), anchor);

    SessionFixture {
        doc: doc.clone(),
        host_root,
        scope,
        anchor,
    }
}

/// Append one session block to the host root.
///
/// `duration_fields` become the numeric `<b>` texts inside the block's
/// duration specification, in order (e.g. `&["1", "30"]` for 1h 30min,
/// `&["45"]` for plain minutes, `&[]` for an empty specification). Pass
/// `None` to omit the duration specification entirely. Returns the
/// participant grouping node.
pub fn add_block(
    fixture: &SessionFixture,
    duration_fields: Option<&[&str]>,
    participants: &[(&str, &str)],
) -> NodeId {
    let doc = &fixture.doc;
    let block = doc.create_element("div");
    doc.add_class(block, "session-block");

    let duration_side = doc.create_element("div");
    if let Some(fields) = duration_fields {
        let container = doc.create_element("div");
        doc.add_class(container, "FuzzyDurationTimeInput");
        let span = doc.create_element("span");
        for field in fields {
            let b = doc.create_element("b");
            doc.set_text(b, field);
            doc.append_child(span, b);
        }
        doc.append_child(container, span);
        doc.append_child(duration_side, container);
    }

    let group = doc.create_element("div");
    doc.add_class(group, "block-users");
    for (name, avatar) in participants {
        doc.append_child(group, build_participant(doc, name, avatar));
    }

    // The duration specification sits in the grouping's previous sibling.
    doc.append_child(block, duration_side);
    doc.append_child(block, group);
    doc.append_child(fixture.host_root, block);
    group
}

/// Build one inline participant entry with a reassignment control next to
/// the avatar, mirroring the host's user chip markup.
pub fn build_participant(doc: &Document, name: &str, avatar: &str) -> NodeId {
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

    entry
}

/// Append a decorative, childless node to a grouping; extraction must skip it.
#[allow(dead_code)]
pub fn add_decoration(doc: &Document, group: NodeId) -> NodeId {
    let decoration = doc.create_element("span");
    doc.add_class(decoration, "user-inline");
    doc.append_child(group, decoration);
    decoration
}
