//! Rendering of the aggregate into the host document's summary panel.
//!
//! The [`Projector`] owns the panel subtree: a box with a title, a
//! manual-refresh control, and one row per facilitator. The panel node is
//! created once, lazily, and reused for the lifetime of the session; each
//! cycle atomically replaces its rows and re-asserts its placement under the
//! anchor without ever duplicating it.

use std::sync::Arc;

use crate::{
    dom::{Document, NodeId},
    extract::{Aggregate, FacilitatorEntry},
    schema::DocSchema,
};

/// Format a minute total as `"{m}min"` under an hour, `"{h}h {m}min"`
/// otherwise. The minutes remainder is shown even when zero.
pub fn format_minutes(total: u32) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    if hours == 0 {
        format!("{minutes}min")
    } else {
        format!("{hours}h {minutes}min")
    }
}

pub struct Projector {
    schema: Arc<DocSchema>,
    title: String,
    /// Panel and row-group nodes, created on the first sync.
    panel: Option<(NodeId, NodeId)>,
}

impl Projector {
    pub fn new(schema: Arc<DocSchema>, title: String) -> Self {
        Projector {
            schema,
            title,
            panel: None,
        }
    }

    /// The panel node, if it has been created yet.
    pub fn panel(&self) -> Option<NodeId> {
        self.panel.map(|(panel, _)| panel)
    }

    /// Rebuild the panel rows from `aggregate`, replacing all prior rows.
    pub fn sync(&mut self, doc: &Document, aggregate: &Aggregate) {
        let (_, rows) = self.ensure_panel(doc);
        for stale in doc.children(rows) {
            doc.remove(stale);
        }
        for (name, entry) in aggregate {
            let row = build_row(doc, name, entry);
            doc.append_child(rows, row);
        }
        tracing::debug!("rendered {} facilitator rows", aggregate.len());
    }

    /// Place the panel at child index 1 under the anchor. A missing anchor
    /// defers placement to the next cycle; an already-positioned panel is
    /// left untouched.
    pub fn place(&mut self, doc: &Document) {
        let Some((panel, _)) = self.panel else {
            return;
        };
        let Some(anchor) = doc.select_first(doc.root(), &self.schema.placement_anchor) else {
            tracing::debug!("placement anchor not present, deferring panel insertion");
            return;
        };
        let children = doc.children(anchor);
        let position = children.iter().position(|&child| child == panel);
        // Target slot is computed over the anchor's other children, so a
        // panel that is already the sole child stays put.
        let siblings = children.len() - position.map_or(0, |_| 1);
        let target = siblings.min(1);
        if position == Some(target) {
            return;
        }
        doc.insert_child(anchor, target, panel);
    }

    fn ensure_panel(&mut self, doc: &Document) -> (NodeId, NodeId) {
        if let Some(existing) = self.panel {
            return existing;
        }

        let panel = doc.create_element("div");
        for class in ["box", "box-small", "box-lighter", "box-border-bottom"] {
            doc.add_class(panel, class);
        }

        let title = doc.create_element("h3");
        doc.add_class(title, "small");
        doc.add_class(title, "no-margin-top");
        doc.set_text(title, &self.title);

        let refresh_wrapper = doc.create_element("div");
        doc.add_class(refresh_wrapper, "float-end");
        let refresh = doc.create_element("a");
        doc.add_class(refresh, "btn-icon");
        doc.add_class(refresh, "tally-refresh");
        doc.set_attr(refresh, "href", "#");
        let refresh_icon = doc.create_element("i");
        for class in ["fa-sm", "fa-solid", "fa-history"] {
            doc.add_class(refresh_icon, class);
        }
        doc.set_attr(refresh_icon, "aria-hidden", "true");
        doc.append_child(refresh, refresh_icon);
        doc.append_child(refresh_wrapper, refresh);
        doc.append_child(title, refresh_wrapper);

        let rows = doc.create_element("div");
        doc.set_attr(rows, "id", "time-division-users");

        doc.append_child(panel, title);
        doc.append_child(panel, rows);

        self.panel = Some((panel, rows));
        (panel, rows)
    }
}

fn build_row(doc: &Document, name: &str, entry: &FacilitatorEntry) -> NodeId {
    let row = doc.create_element("div");
    doc.add_class(row, "category-row");
    doc.add_class(row, "d-flex");

    let user = doc.create_element("span");
    doc.add_class(user, "user");
    doc.add_class(user, "user-inline");
    let avatar = doc.create_element("img");
    doc.add_class(avatar, "gravatar");
    doc.set_attr(avatar, "height", "18");
    doc.set_attr(avatar, "alt", name);
    doc.set_attr(avatar, "src", &entry.avatar);
    doc.append_child(user, avatar);

    let label = doc.create_element("span");
    let name_el = doc.create_element("b");
    doc.set_text(name_el, &format!("{name}: "));
    let time_el = doc.create_element("small");
    doc.set_text(time_el, &format_minutes(entry.minutes));
    doc.append_child(label, name_el);
    doc.append_child(label, time_el);

    doc.append_child(row, user);
    doc.append_child(row, label);
    row
}
