//! In-process model of the host page's DOM.
//!
//! Host code mutates the document through the same primitives the content
//! script uses. Once a subtree is observed, every child-list change inside
//! it is queued as a [`MutationRecord`] until drained with
//! [`Document::take_records`].

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef, Tree};
use gptcard_core::{MutationKind, MutationRecord, NodeInfo};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::text::render_inner_text;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} has no parent")]
    Orphan(NodeId),
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Collapsed caret position: after the `offset`-th child of `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

enum Anchor {
    Before(NodeId),
    AppendTo(NodeId),
}

pub struct Document {
    html: Html,
    observed: Option<NodeId>,
    records: Vec<MutationRecord<NodeId>>,
    key_listeners: HashMap<NodeId, usize>,
    focused: Option<NodeId>,
    caret: Option<Caret>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            observed: None,
            records: Vec::new(),
            key_listeners: HashMap::new(),
            focused: None,
            caret: None,
        }
    }

    /// First attached element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        let parsed = Selector::parse(selector).map_err(|err| DomError::InvalidSelector {
            selector: selector.to_string(),
            message: err.to_string(),
        })?;
        Ok(self.html.root_element().select(&parsed).next().map(|el| el.id()))
    }

    /// First attached element carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().classes().any(|c| c == class))
            .map(|el| el.id())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .map(|el| el.value().classes().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.html.tree.get(node)?.parent().map(|p| p.id())
    }

    pub fn last_element_child(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let node = self.node(node)?;
        Ok(node
            .children()
            .rev()
            .find(|child| child.value().is_element())
            .map(|child| child.id()))
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(node) {
            Some(found) => found.id() == root || found.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    pub fn inner_text(&self, node: NodeId) -> Result<String, DomError> {
        Ok(render_inner_text(self.node(node)?))
    }

    pub fn inner_html(&self, node: NodeId) -> Result<String, DomError> {
        Ok(self.element(node).ok_or(DomError::NotAnElement(node))?.inner_html())
    }

    pub fn outer_html(&self, node: NodeId) -> Result<String, DomError> {
        Ok(self.element(node).ok_or(DomError::NotAnElement(node))?.html())
    }

    /// Starts queueing child-list records for `root` and its descendants.
    pub fn observe(&mut self, root: NodeId) {
        self.observed = Some(root);
    }

    pub fn is_observing(&self) -> bool {
        self.observed.is_some()
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord<NodeId>> {
        std::mem::take(&mut self.records)
    }

    /// Parses `html` as a fragment and inserts its nodes before `reference`.
    pub fn insert_html_before(
        &mut self,
        reference: NodeId,
        html: &str,
    ) -> Result<Vec<NodeId>, DomError> {
        let (parent, previous, next) = {
            let node = self.node(reference)?;
            let parent = node.parent().ok_or(DomError::Orphan(reference))?;
            (
                parent.id(),
                node.prev_sibling().map(node_info),
                Some(node_info(node)),
            )
        };
        let added = self.graft_fragment(html, || Anchor::Before(reference))?;
        self.push_record(parent, &added, previous, next);
        Ok(added)
    }

    /// Parses `html` as a fragment and appends its nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let previous = self.node(parent)?.last_child().map(node_info);
        let added = self.graft_fragment(html, || Anchor::AppendTo(parent))?;
        self.push_record(parent, &added, previous, None);
        Ok(added)
    }

    /// Detaches `node` (with its subtree) from its parent.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let (parent, previous, next, removed) = {
            let found = self.node(node)?;
            let parent = found.parent().ok_or(DomError::Orphan(node))?;
            (
                parent.id(),
                found.prev_sibling().map(node_info),
                found.next_sibling().map(node_info),
                node_info(found),
            )
        };
        if let Some(mut found) = self.html.tree.get_mut(node) {
            found.detach();
        }
        if self.focused.is_some_and(|focused| !self.is_attached(focused)) {
            self.focused = None;
            self.caret = None;
        }
        self.push_record_infos(parent, Vec::new(), vec![removed], previous, next);
        Ok(())
    }

    pub fn add_key_listener(&mut self, node: NodeId) {
        *self.key_listeners.entry(node).or_insert(0) += 1;
    }

    /// Returns false when no listener was registered on `node`.
    pub fn remove_key_listener(&mut self, node: NodeId) -> bool {
        let Some(count) = self.key_listeners.get_mut(&node) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.key_listeners.remove(&node);
        }
        true
    }

    pub fn has_key_listener(&self, node: NodeId) -> bool {
        self.key_listener_count(node) > 0
    }

    pub fn key_listener_count(&self, node: NodeId) -> usize {
        self.key_listeners.get(&node).copied().unwrap_or(0)
    }

    /// Total number of key listeners registered across all nodes.
    pub fn total_key_listeners(&self) -> usize {
        self.key_listeners.values().sum()
    }

    pub fn focus(&mut self, node: NodeId) -> Result<(), DomError> {
        self.element(node).ok_or(DomError::NotAnElement(node))?;
        self.focused = Some(node);
        Ok(())
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Selects all children of `node` and collapses the selection to its end.
    pub fn collapse_caret_to_end(&mut self, node: NodeId) -> Result<(), DomError> {
        let offset = self.node(node)?.children().count();
        self.caret = Some(Caret { node, offset });
        Ok(())
    }

    pub fn caret(&self) -> Option<Caret> {
        self.caret
    }

    fn node(&self, id: NodeId) -> Result<NodeRef<'_, Node>, DomError> {
        self.html.tree.get(id).ok_or(DomError::MissingNode(id))
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    fn graft_fragment(
        &mut self,
        html: &str,
        anchor: impl Fn() -> Anchor,
    ) -> Result<Vec<NodeId>, DomError> {
        let fragment = Html::parse_fragment(html);
        let mut added = Vec::new();
        for child in fragment.root_element().children() {
            added.push(graft(&mut self.html.tree, anchor(), child)?);
        }
        Ok(added)
    }

    fn push_record(
        &mut self,
        target: NodeId,
        added: &[NodeId],
        previous_sibling: Option<NodeInfo<NodeId>>,
        next_sibling: Option<NodeInfo<NodeId>>,
    ) {
        let added = added
            .iter()
            .filter_map(|id| self.html.tree.get(*id).map(node_info))
            .collect();
        self.push_record_infos(target, added, Vec::new(), previous_sibling, next_sibling);
    }

    fn push_record_infos(
        &mut self,
        target: NodeId,
        added: Vec<NodeInfo<NodeId>>,
        removed: Vec<NodeInfo<NodeId>>,
        previous_sibling: Option<NodeInfo<NodeId>>,
        next_sibling: Option<NodeInfo<NodeId>>,
    ) {
        if added.is_empty() && removed.is_empty() {
            return;
        }
        if !self.observes(target) {
            return;
        }
        let Some(target) = self.html.tree.get(target).map(node_info) else {
            return;
        };
        self.records.push(MutationRecord {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
            previous_sibling,
            next_sibling,
        });
    }

    fn observes(&self, target: NodeId) -> bool {
        let Some(root) = self.observed else {
            return false;
        };
        match self.html.tree.get(target) {
            Some(node) => node.id() == root || node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }
}

fn node_info(node: NodeRef<'_, Node>) -> NodeInfo<NodeId> {
    match node.value() {
        Node::Element(element) => NodeInfo {
            node: node.id(),
            is_element: true,
            classes: element.classes().map(str::to_string).collect(),
        },
        _ => NodeInfo::text(node.id()),
    }
}

/// Copies `source` and its subtree into `tree` at `anchor`.
fn graft(tree: &mut Tree<Node>, anchor: Anchor, source: NodeRef<'_, Node>) -> Result<NodeId, DomError> {
    let value = source.value().clone();
    let id = match anchor {
        Anchor::Before(reference) => tree
            .get_mut(reference)
            .ok_or(DomError::MissingNode(reference))?
            .insert_before(value)
            .id(),
        Anchor::AppendTo(parent) => tree
            .get_mut(parent)
            .ok_or(DomError::MissingNode(parent))?
            .append(value)
            .id(),
    };
    for child in source.children() {
        graft(tree, Anchor::AppendTo(id), child)?;
    }
    Ok(id)
}
