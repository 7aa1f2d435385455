// Schema registry for host document layouts
//
// Traversal logic never hard-codes a host application's markup. A DocSchema
// names every structural marker the engine relies on, and schemas can be
// registered at runtime by downstream hosts.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::error::TallyError;

/// Global singleton schema registry with the built-in `sessionlab` schema
pub static SCHEMAS: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::create);

/// A minimal structural selector: optional tag, `#id`, `.class`, and one
/// `[key=value]` attribute constraint. All present parts must match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
    pub attr: Option<(String, String)>,
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Selector {
            tag: Some(tag.to_string()),
            ..Default::default()
        }
    }

    pub fn id(id: &str) -> Self {
        Selector {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Selector {
            class: Some(class.to_string()),
            ..Default::default()
        }
    }

    /// Parse a selector of the form `tag#id.class[key=value]`, any parts
    /// optional but in that order, e.g. `span.user-inline` or `#main-panel`.
    pub fn parse(src: &str) -> Result<Self, TallyError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(TallyError::Schema("empty selector".to_string()));
        }
        let mut selector = Selector::default();
        let mut rest = src;

        let tag_end = rest
            .find(|c| c == '#' || c == '.' || c == '[')
            .unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_string());
            rest = &rest[tag_end..];
        }

        while !rest.is_empty() {
            let (marker, tail) = rest.split_at(1);
            match marker {
                "#" | "." => {
                    let end = tail
                        .find(|c| c == '#' || c == '.' || c == '[')
                        .unwrap_or(tail.len());
                    let value = &tail[..end];
                    if value.is_empty() {
                        return Err(TallyError::Schema(format!(
                            "selector '{src}' has an empty '{marker}' segment"
                        )));
                    }
                    if marker == "#" {
                        selector.id = Some(value.to_string());
                    } else {
                        selector.class = Some(value.to_string());
                    }
                    rest = &tail[end..];
                }
                "[" => {
                    let end = tail.find(']').ok_or_else(|| {
                        TallyError::Schema(format!("selector '{src}' has an unclosed attribute"))
                    })?;
                    let (key, value) = tail[..end].split_once('=').ok_or_else(|| {
                        TallyError::Schema(format!(
                            "selector '{src}' attribute segment is missing '='"
                        ))
                    })?;
                    let value = value.trim_matches('\'').trim_matches('"');
                    selector.attr = Some((key.to_string(), value.to_string()));
                    rest = &tail[end + 1..];
                }
                _ => {
                    return Err(TallyError::Schema(format!(
                        "selector '{src}' has an unexpected '{marker}' segment"
                    )))
                }
            }
        }
        Ok(selector)
    }
}

/// The structural contract one host application's markup fulfills.
///
/// Every selector names a marker the engine traverses by; swapping schemas
/// adapts the engine to a different host layout without touching traversal
/// code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSchema {
    /// Stable root of the host view. Its presence gates the whole session.
    pub host_root: Selector,
    /// Lightweight scope observed for mutations. Disjoint from the subtree
    /// the engine writes, which is what rules out recompute feedback loops.
    pub watch_scope: Selector,
    /// Parent the summary panel is placed under (at child index 1).
    pub placement_anchor: Selector,
    /// Marker of a session block's participant grouping.
    pub participant_group: Selector,
    /// Duration specification container, found inside the grouping's
    /// previous sibling.
    pub duration_container: Selector,
    /// Numeric text fields inside the duration container.
    pub duration_field: Selector,
    /// Inline participant entries within a grouping.
    pub participant_entry: Selector,
    /// Image-like node carrying the display name (`alt`) and avatar locator
    /// (`src`) of a participant entry.
    pub avatar: Selector,
    /// Wrapper marking a facilitator-reassignment affordance.
    pub reassign_scope: Selector,
    /// The activatable control within the reassignment wrapper. Clicks on
    /// the wrapper outside this control do not count.
    pub reassign_control: Selector,
    /// The panel's own manual-refresh affordance.
    pub refresh_control: Selector,
}

impl DocSchema {
    /// The SessionLab planner layout this engine was originally written for.
    pub fn sessionlab() -> Self {
        DocSchema {
            host_root: Selector::id("main-panel"),
            watch_scope: Selector::id("react-header-left"),
            placement_anchor: Selector::id("vertical-tabs-tabpane-info"),
            participant_group: Selector::class("block-users"),
            duration_container: Selector::class("FuzzyDurationTimeInput"),
            duration_field: Selector::tag("b"),
            participant_entry: Selector::class("user-inline"),
            avatar: Selector::tag("img"),
            reassign_scope: Selector::class("user-edit"),
            reassign_control: Selector {
                tag: Some("a".to_string()),
                attr: Some(("role".to_string(), "button".to_string())),
                ..Default::default()
            },
            refresh_control: Selector::class("tally-refresh"),
        }
    }
}

/// Thread-safe registry of host document schemas
///
/// Global singleton behind [`SCHEMAS`]: cheap Arc clones out, last
/// registration wins.
pub struct SchemaRegistry(Arc<RwLock<HashMap<String, Arc<DocSchema>>>>);

impl Clone for SchemaRegistry {
    fn clone(&self) -> Self {
        SchemaRegistry(self.0.clone())
    }
}

impl SchemaRegistry {
    /// Create registry with built-in schemas
    pub fn create() -> Self {
        let registry = SchemaRegistry(Arc::new(RwLock::new(HashMap::new())));
        registry.register("sessionlab".to_string(), DocSchema::sessionlab());
        registry
    }

    /// Register a schema definition
    ///
    /// If a schema with this name already exists, it will be overwritten and a
    /// log message emitted.
    pub fn register(&self, schema_name: String, definition: DocSchema) {
        while self.0.is_locked() {
            tracing::info!(
                "[SchemaRegistry::register] Waiting for write access to schema registry"
            );
            std::thread::sleep(Duration::from_millis(100));
        }

        let mut writer = self.0.write();
        if writer.contains_key(&schema_name) {
            tracing::info!(
                "[SchemaRegistry::register] Overwriting existing schema: {}",
                schema_name
            );
        }
        writer.insert(schema_name, Arc::new(definition));
    }

    /// Retrieve a schema definition by name
    ///
    /// Returns a cheap Arc clone if the schema exists.
    pub fn get(&self, schema_name: &str) -> Option<Arc<DocSchema>> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[SchemaRegistry::get] Waiting for read access to schema registry");
            std::thread::sleep(Duration::from_millis(100));
        }
        let reader = self.0.read();
        reader.get(schema_name).cloned()
    }

    /// List all registered schema names
    pub fn list_schemas(&self) -> Vec<String> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[SchemaRegistry::list] Waiting for read access to schema registry");
            std::thread::sleep(Duration::from_millis(100));
        }
        let reader = self.0.read();
        reader.keys().cloned().collect()
    }
}
