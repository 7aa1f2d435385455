//! Extraction and aggregation of per-facilitator time allocations.
//!
//! [`extract`] is the algorithmic heart of the crate: a pure, read-only,
//! deterministic pass over the host subtree that locates every session
//! block's participant grouping, resolves the block's duration from the
//! structurally adjacent duration specification, and folds the results into
//! one [`Aggregate`].
//!
//! Malformed content never raises an error here. Missing duration
//! specifications skip their block, non-numeric duration text contributes
//! zero, and decorative nodes inside a grouping are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    dom::{Document, NodeId},
    schema::DocSchema,
};

/// Per-facilitator totals keyed by display name.
///
/// Keys are exactly the distinct display names observed in the current pass;
/// the map is rebuilt from scratch on every cycle.
pub type Aggregate = BTreeMap<String, FacilitatorEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitatorEntry {
    /// Total allocated time in whole minutes.
    pub minutes: u32,
    /// Avatar locator from the first block this facilitator appeared in.
    /// Later occurrences never overwrite it.
    pub avatar: String,
}

/// Convert one or two numeric duration fields into minutes.
///
/// Two or more fields: the first is hours, the last is minutes. One field:
/// minutes alone. No fields, or non-numeric text: zero. Absurdly large
/// fields saturate rather than overflow; the host owns the content and the
/// engine must survive whatever it writes.
pub fn parse_duration(fields: &[String]) -> u32 {
    let Some(last) = fields.last() else {
        return 0;
    };
    let mut minutes = parse_field(last);
    if fields.len() > 1 {
        minutes = minutes.saturating_add(parse_field(&fields[0]).saturating_mul(60));
    }
    minutes
}

fn parse_field(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

/// Walk the host subtree under `root` and compute the per-facilitator
/// aggregate according to `schema`.
pub fn extract(doc: &Document, root: NodeId, schema: &DocSchema) -> Aggregate {
    let mut aggregate = Aggregate::new();

    for group in doc.select_all(root, &schema.participant_group) {
        // The duration specification lives in the grouping's previous
        // sibling, not inside the grouping itself.
        let Some(duration_node) = doc
            .prev_sibling(group)
            .and_then(|sibling| doc.select_first(sibling, &schema.duration_container))
        else {
            tracing::debug!("participant grouping without duration specification, skipping block");
            continue;
        };

        let fields: Vec<String> = doc
            .select_all(duration_node, &schema.duration_field)
            .into_iter()
            .map(|field| doc.text(field))
            .collect();
        let minutes = parse_duration(&fields);

        for entry in doc.children(group) {
            // Only inline participant entries with content count; the rest of
            // the grouping's children are decorative.
            if !doc.matches(entry, &schema.participant_entry) || doc.children(entry).is_empty() {
                continue;
            }
            let Some(avatar_node) = doc.select_first(entry, &schema.avatar) else {
                tracing::debug!("participant entry without avatar node, skipping");
                continue;
            };
            let name = doc.attr(avatar_node, "alt").unwrap_or_default();
            let avatar = doc.attr(avatar_node, "src").unwrap_or_default();

            aggregate
                .entry(name)
                .and_modify(|existing| {
                    existing.minutes = existing.minutes.saturating_add(minutes)
                })
                .or_insert(FacilitatorEntry { minutes, avatar });
        }
    }

    aggregate
}
