//! Live hierarchical document model.
//!
//! The host application owns a [`Document`] and mutates it freely, including
//! while a recompute pass is running. The engine treats the tree as read-only
//! except for the single summary subtree it maintains.
//!
//! ## Observation
//!
//! [`Document::subscribe`] registers a scoped observer: every structural or
//! text mutation at or under the scope node pushes one [`Mutation`] record to
//! the subscription channel. Subscribers are expected to drain bursts and
//! coalesce them themselves (see [`watch`](crate::watch)).
//!
//! ## Node lifetime
//!
//! Nodes live in an arena and are never freed; [`Document::remove`] detaches a
//! subtree from the tree, after which [`Document::is_attached`] reports false
//! for every node in it. Detached nodes can be re-inserted later, which is how
//! the summary panel survives re-placement.

use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::schema::Selector;

/// Opaque handle to a node within a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A structural or text mutation observed within a subscription scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Children of the node were added, removed, or reordered.
    ChildrenChanged(NodeId),
    /// The direct text content of the node changed.
    TextChanged(NodeId),
    /// The node itself was detached from the tree.
    Removed(NodeId),
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Observer {
    scope: NodeId,
    tx: UnboundedSender<Mutation>,
}

#[derive(Default)]
struct DocTree {
    nodes: Vec<NodeData>,
    observers: Vec<Observer>,
}

impl DocTree {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// True when `node` is `scope` or a descendant of it.
    fn in_scope(&self, scope: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == scope {
                return true;
            }
            cursor = self.node(current).parent;
        }
        false
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.in_scope(NodeId(0), node)
    }

    /// Push one record to every live observer whose scope covers `at`.
    /// Observers with a dropped receiver are pruned as a side effect.
    fn notify(&mut self, mutation: Mutation, at: NodeId) {
        let mut dead = Vec::new();
        for (idx, observer) in self.observers.iter().enumerate() {
            if self.in_scope(observer.scope, at) && observer.tx.send(mutation).is_err() {
                dead.push(idx);
            }
        }
        for idx in dead.into_iter().rev() {
            self.observers.swap_remove(idx);
        }
    }

    /// Detach `node` from its parent, returning the old parent if any.
    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        self.node_mut(parent).children.retain(|&child| child != node);
        self.node_mut(node).parent = None;
        Some(parent)
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let data = self.node(node);
        if let Some(tag) = &selector.tag {
            if &data.tag != tag {
                return false;
            }
        }
        if let Some(id) = &selector.id {
            if data.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if let Some(class) = &selector.class {
            if !data.classes.contains(class) {
                return false;
            }
        }
        if let Some((key, value)) = &selector.attr {
            if data.attrs.get(key) != Some(value) {
                return false;
            }
        }
        true
    }

    /// Depth-first pre-order walk over the descendants of `scope`, excluding
    /// `scope` itself.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            ordered.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        ordered
    }
}

/// Cloneable handle to a live document tree.
///
/// All clones share the same tree; interior mutability is guarded by a
/// [`parking_lot::RwLock`] so readers (extraction passes) and the single
/// writer of the summary subtree never observe torn state.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<DocTree>>,
}

impl Document {
    /// Create a document holding a single root element.
    pub fn new(root_tag: &str) -> Self {
        let tree = DocTree {
            nodes: vec![NodeData {
                tag: root_tag.to_string(),
                ..Default::default()
            }],
            observers: Vec::new(),
        };
        Document {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Create a detached element. It joins the tree once appended or inserted.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut tree = self.inner.write();
        let id = NodeId(tree.nodes.len());
        tree.nodes.push(NodeData {
            tag: tag.to_string(),
            ..Default::default()
        });
        id
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut tree = self.inner.write();
        tree.detach(child);
        tree.node_mut(parent).children.push(child);
        tree.node_mut(child).parent = Some(parent);
        tree.notify(Mutation::ChildrenChanged(parent), parent);
    }

    /// Insert `child` at `index` among `parent`'s children (clamped to the
    /// current child count). Detaches `child` from any prior parent first.
    pub fn insert_child(&self, parent: NodeId, index: usize, child: NodeId) {
        let mut tree = self.inner.write();
        tree.detach(child);
        let index = index.min(tree.node(parent).children.len());
        tree.node_mut(parent).children.insert(index, child);
        tree.node_mut(child).parent = Some(parent);
        tree.notify(Mutation::ChildrenChanged(parent), parent);
    }

    /// Detach `node` and its subtree. Removing the root is a no-op.
    pub fn remove(&self, node: NodeId) {
        let mut tree = self.inner.write();
        let was_attached = tree.is_attached(node);
        // Observers are matched against the pre-detachment position, so a
        // scope learns about the removal of its own subtree.
        if was_attached && tree.node(node).parent.is_some() {
            tree.notify(Mutation::Removed(node), node);
        }
        if let Some(parent) = tree.detach(node) {
            if was_attached {
                tree.notify(Mutation::ChildrenChanged(parent), parent);
            }
        }
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        let mut tree = self.inner.write();
        if tree.node(node).text == text {
            return;
        }
        tree.node_mut(node).text = text.to_string();
        tree.notify(Mutation::TextChanged(node), node);
    }

    pub fn set_attr(&self, node: NodeId, key: &str, value: &str) {
        let mut tree = self.inner.write();
        tree.node_mut(node)
            .attrs
            .insert(key.to_string(), value.to_string());
    }

    pub fn add_class(&self, node: NodeId, class: &str) {
        let mut tree = self.inner.write();
        let data = tree.node_mut(node);
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.inner.read().node(node).tag.clone()
    }

    pub fn text(&self, node: NodeId) -> String {
        self.inner.read().node(node).text.clone()
    }

    pub fn attr(&self, node: NodeId, key: &str) -> Option<String> {
        self.inner.read().node(node).attrs.get(key).cloned()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.inner.read().node(node).classes.iter().any(|c| c == class)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.read().node(node).parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.read().node(node).children.clone()
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.inner.read();
        let parent = tree.node(node).parent?;
        let siblings = &tree.node(parent).children;
        let position = siblings.iter().position(|&sibling| sibling == node)?;
        position.checked_sub(1).map(|idx| siblings[idx])
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.inner.read().is_attached(node)
    }

    /// True when `node` is `ancestor` or lies within its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.read().in_scope(ancestor, node)
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.inner.read().matches(node, selector)
    }

    /// Nearest of `node` or its ancestors matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let tree = self.inner.read();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if tree.matches(current, selector) {
                return Some(current);
            }
            cursor = tree.node(current).parent;
        }
        None
    }

    /// First descendant of `scope` (excluding `scope` itself) matching
    /// `selector`, in depth-first pre-order.
    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let tree = self.inner.read();
        tree.descendants(scope)
            .into_iter()
            .find(|&node| tree.matches(node, selector))
    }

    /// All descendants of `scope` (excluding `scope` itself) matching
    /// `selector`, in depth-first pre-order.
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let tree = self.inner.read();
        tree.descendants(scope)
            .into_iter()
            .filter(|&node| tree.matches(node, selector))
            .collect()
    }

    /// Observe mutations at or under `scope`. The channel is unbounded; the
    /// receiver side is responsible for draining bursts.
    pub fn subscribe(&self, scope: NodeId) -> UnboundedReceiver<Mutation> {
        let (tx, rx) = unbounded_channel();
        self.inner.write().observers.push(Observer { scope, tx });
        rx
    }
}
