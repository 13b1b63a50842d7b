//! Pure lifecycle classifier over child-list mutation records.
//!
//! The host page gives no open/close hooks for its editor cards, so card
//! lifecycle is inferred from the shape of individual mutation records. The
//! marker class names below track the host's current markup and break when
//! the host changes it.

/// Kind of structural change a mutation record describes.
///
/// The document observer only queues `ChildList` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// Snapshot of a node as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo<N> {
    pub node: N,
    pub is_element: bool,
    pub classes: Vec<String>,
}

impl<N> NodeInfo<N> {
    pub fn element(node: N, classes: &[&str]) -> Self {
        Self {
            node,
            is_element: true,
            classes: classes.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    pub fn text(node: N) -> Self {
        Self {
            node,
            is_element: false,
            classes: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.is_element && self.classes.iter().any(|c| c == class)
    }
}

/// One mutation record, shaped like a DOM `MutationRecord`.
///
/// `previous_sibling` and `next_sibling` are captured before the change was
/// applied, so for removals they describe the neighbours of the removed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub target: NodeInfo<N>,
    pub added: Vec<NodeInfo<N>>,
    pub removed: Vec<NodeInfo<N>>,
    pub previous_sibling: Option<NodeInfo<N>>,
    pub next_sibling: Option<NodeInfo<N>>,
}

impl<N> MutationRecord<N> {
    pub fn child_list(target: NodeInfo<N>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
        }
    }

    pub fn with_added(mut self, node: NodeInfo<N>) -> Self {
        self.added.push(node);
        self
    }

    pub fn with_removed(mut self, node: NodeInfo<N>) -> Self {
        self.removed.push(node);
        self
    }

    pub fn with_previous_sibling(mut self, node: NodeInfo<N>) -> Self {
        self.previous_sibling = Some(node);
        self
    }
}

/// Class names the host page uses for its editor markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerClasses {
    /// Class carried by the editable root of an open card.
    pub editor: String,
    /// Class carried by the element that hosts the editor root.
    pub container: String,
}

impl Default for MarkerClasses {
    fn default() -> Self {
        Self {
            editor: "ProseMirror".to_string(),
            container: "editor-container".to_string(),
        }
    }
}

/// Lifecycle transition inferred from a single mutation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle<N> {
    /// A fresh editor root appeared; carries the editor node.
    Opened(N),
    /// An editor root is going away; carries the editor node.
    Closed(N),
}

/// Classifies one record. Returns `None` for the (common) irrelevant churn.
///
/// Open: the target is an editor root that just received its first child,
/// or a container that just received an editor root as its first child.
/// Close: a container lost nodes right after an editor root.
pub fn classify<N: Copy>(record: &MutationRecord<N>, markers: &MarkerClasses) -> Option<Lifecycle<N>> {
    if record.kind != MutationKind::ChildList || !record.target.is_element {
        return None;
    }

    if record.previous_sibling.is_none() {
        if record.target.has_class(&markers.editor) {
            return Some(Lifecycle::Opened(record.target.node));
        }
        if record.target.has_class(&markers.container) {
            return record
                .added
                .iter()
                .find(|node| node.has_class(&markers.editor))
                .map(|node| Lifecycle::Opened(node.node));
        }
        return None;
    }

    if !record.removed.is_empty() && record.target.has_class(&markers.container) {
        return record
            .previous_sibling
            .as_ref()
            .filter(|sibling| sibling.has_class(&markers.editor))
            .map(|sibling| Lifecycle::Closed(sibling.node));
    }

    None
}
