use serde::{Deserialize, Serialize};

/// Span information for source location tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the node's first character
    pub start: usize,
    /// Byte offset one past the node's last character
    pub end: usize,
    pub line: u32,
    pub column: u32,
    /// Stable node id, `{document-id}-{n}`
    pub id: String,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32, id: String) -> Self {
        Self {
            start,
            end,
            line,
            column,
            id,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Index of a node within a [`StyleSheet`] arena
pub type NodeId = usize;

/// Node payload, tagged by the parser collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum NodeKind {
    /// Document root
    Root,

    /// Style rule (selector kept as authored)
    Rule { selector: String },

    /// At-rule (`media`, `mixin`, `include`, `import`, `font-face`, ...)
    AtRule { name: String, params: String },

    /// Property declaration
    Declaration {
        property: String,
        value: String,
        important: bool,
    },

    /// Variable definition (`$name: value`)
    Variable {
        name: String,
        value: String,
        is_default: bool,
        is_global: bool,
    },

    /// Comment node
    Comment { text: String },

    /// Any unrecognized tag; traversed transparently
    Other { tag: String },
}

/// One node in the arena. Children are index lists; the parent link is a
/// lookup relation, never an ownership edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// A parsed stylesheet: flat arena of nodes addressed by index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    /// Source file path as reported by the parser
    pub path: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl StyleSheet {
    pub(crate) fn from_parts(path: String, nodes: Vec<Node>, root: NodeId) -> Self {
        Self { path, nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the root index actually addresses a `Root` node. A sheet
    /// failing this check is structurally unreadable and must be rejected
    /// before extraction.
    pub fn has_valid_root(&self) -> bool {
        matches!(self.nodes.get(self.root).map(|n| &n.kind), Some(NodeKind::Root))
    }

    /// Iterate all nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }
}
