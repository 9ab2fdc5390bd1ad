//! Programmatic tree construction.
//!
//! The text-to-tree parser lives in an external collaborator; hosts (and
//! tests) that already hold structured data build sheets through this
//! cursor-style builder. `open_*` descends into a new container node,
//! `close` returns to its parent, mirroring the nesting of the source.

use crate::id::IdGenerator;
use crate::tree::{Node, NodeId, NodeKind, Span, StyleSheet};

/// Cursor-style builder for [`StyleSheet`] arenas
pub struct TreeBuilder {
    path: String,
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
    ids: IdGenerator,
}

impl TreeBuilder {
    pub fn new(path: &str) -> Self {
        let mut ids = IdGenerator::new(path);
        let root = Node {
            kind: NodeKind::Root,
            span: Span::new(0, 0, 1, 1, ids.new_id()),
            children: Vec::new(),
            parent: None,
        };
        Self {
            path: path.to_string(),
            nodes: vec![root],
            stack: vec![0],
            ids,
        }
    }

    /// Id of the root node
    pub fn root(&self) -> NodeId {
        0
    }

    /// Id of the container new nodes currently attach to
    pub fn current(&self) -> NodeId {
        *self.stack.last().unwrap_or(&0)
    }

    fn push_node(&mut self, kind: NodeKind, span: Option<Span>) -> NodeId {
        let parent = self.current();
        let span = span.unwrap_or_else(|| Span::new(0, 0, 0, 0, self.ids.new_id()));
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            span,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Open a rule node; subsequent nodes attach inside it until [`close`](Self::close)
    pub fn open_rule(&mut self, selector: &str) -> NodeId {
        let id = self.push_node(
            NodeKind::Rule {
                selector: selector.to_string(),
            },
            None,
        );
        self.stack.push(id);
        id
    }

    /// Open an at-rule node (`media`, `mixin`, `font-face`, ...)
    pub fn open_at_rule(&mut self, name: &str, params: &str) -> NodeId {
        let id = self.push_node(
            NodeKind::AtRule {
                name: name.to_string(),
                params: params.to_string(),
            },
            None,
        );
        self.stack.push(id);
        id
    }

    /// Open a node with an unrecognized tag
    pub fn open_other(&mut self, tag: &str) -> NodeId {
        let id = self.push_node(
            NodeKind::Other {
                tag: tag.to_string(),
            },
            None,
        );
        self.stack.push(id);
        id
    }

    /// Return to the parent container. Closing the root is a no-op.
    pub fn close(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn declaration(&mut self, property: &str, value: &str, important: bool) -> NodeId {
        self.push_node(
            NodeKind::Declaration {
                property: property.to_string(),
                value: value.to_string(),
                important,
            },
            None,
        )
    }

    /// Leaf at-rule with no body (`include`, `import`, `use`, ...)
    pub fn at_rule(&mut self, name: &str, params: &str) -> NodeId {
        self.push_node(
            NodeKind::AtRule {
                name: name.to_string(),
                params: params.to_string(),
            },
            None,
        )
    }

    pub fn variable(&mut self, name: &str, value: &str) -> NodeId {
        self.variable_with_flags(name, value, false, false)
    }

    pub fn variable_with_flags(
        &mut self,
        name: &str,
        value: &str,
        is_default: bool,
        is_global: bool,
    ) -> NodeId {
        // Variable names are stored sigil-prefixed so references and
        // definitions share one key space.
        let name = if name.starts_with('$') {
            name.to_string()
        } else {
            format!("${}", name)
        };
        self.push_node(
            NodeKind::Variable {
                name,
                value: value.to_string(),
                is_default,
                is_global,
            },
            None,
        )
    }

    pub fn comment(&mut self, text: &str) -> NodeId {
        self.push_node(
            NodeKind::Comment {
                text: text.to_string(),
            },
            None,
        )
    }

    /// Override the span of the most recently created node
    pub fn set_span(&mut self, id: NodeId, span: Span) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.span = span;
        }
    }

    pub fn build(self) -> StyleSheet {
        StyleSheet::from_parts(self.path, self.nodes, 0)
    }
}

/// Convenience variants of the `open_*` methods used throughout the tests;
/// `rule(parent, ...)`-style positional construction for hosts that hold
/// explicit parent ids.
impl TreeBuilder {
    pub fn rule(&mut self, parent: NodeId, selector: &str) -> NodeId {
        self.at_parent(parent, |b| b.open_rule(selector))
    }

    pub fn declaration_in(
        &mut self,
        parent: NodeId,
        property: &str,
        value: &str,
        important: bool,
    ) -> NodeId {
        let keep = self.stack.clone();
        self.stack = vec![parent];
        let id = self.declaration(property, value, important);
        self.stack = keep;
        id
    }

    fn at_parent(&mut self, parent: NodeId, f: impl FnOnce(&mut Self) -> NodeId) -> NodeId {
        let keep = self.stack.clone();
        self.stack = vec![parent];
        let id = f(self);
        self.stack = keep;
        id
    }
}
