use crate::tree::{NodeId, NodeKind, StyleSheet};

/// Visitor pattern for traversing sheet nodes immutably
///
/// Default implementations walk the entire tree; override specific
/// `visit_*` methods to act on nodes. Container kinds (root, rule, at-rule,
/// unrecognized tags) descend into their children by default, leaves do not.
pub trait Visitor: Sized {
    fn visit_root(&mut self, sheet: &StyleSheet, id: NodeId) {
        walk_children(self, sheet, id);
    }

    fn visit_rule(&mut self, sheet: &StyleSheet, id: NodeId, _selector: &str) {
        walk_children(self, sheet, id);
    }

    fn visit_at_rule(&mut self, sheet: &StyleSheet, id: NodeId, _name: &str, _params: &str) {
        walk_children(self, sheet, id);
    }

    fn visit_declaration(
        &mut self,
        _sheet: &StyleSheet,
        _id: NodeId,
        _property: &str,
        _value: &str,
        _important: bool,
    ) {
        // Leaf node, no children to walk
    }

    fn visit_variable(
        &mut self,
        _sheet: &StyleSheet,
        _id: NodeId,
        _name: &str,
        _value: &str,
        _is_default: bool,
        _is_global: bool,
    ) {
        // Leaf node, no children to walk
    }

    fn visit_comment(&mut self, _sheet: &StyleSheet, _id: NodeId, _text: &str) {
        // Leaf node, no children to walk
    }

    fn visit_other(&mut self, sheet: &StyleSheet, id: NodeId, _tag: &str) {
        // Unrecognized tags are traversed transparently
        walk_children(self, sheet, id);
    }
}

/// Walk an entire sheet from its root
pub fn walk<V: Visitor>(visitor: &mut V, sheet: &StyleSheet) {
    walk_node(visitor, sheet, sheet.root());
}

/// Dispatch one node to the matching `visit_*` method
pub fn walk_node<V: Visitor>(visitor: &mut V, sheet: &StyleSheet, id: NodeId) {
    let Some(node) = sheet.node(id) else {
        return;
    };
    match &node.kind {
        NodeKind::Root => visitor.visit_root(sheet, id),
        NodeKind::Rule { selector } => visitor.visit_rule(sheet, id, selector),
        NodeKind::AtRule { name, params } => visitor.visit_at_rule(sheet, id, name, params),
        NodeKind::Declaration {
            property,
            value,
            important,
        } => visitor.visit_declaration(sheet, id, property, value, *important),
        NodeKind::Variable {
            name,
            value,
            is_default,
            is_global,
        } => visitor.visit_variable(sheet, id, name, value, *is_default, *is_global),
        NodeKind::Comment { text } => visitor.visit_comment(sheet, id, text),
        NodeKind::Other { tag } => visitor.visit_other(sheet, id, tag),
    }
}

/// Walk the children of a container node
pub fn walk_children<V: Visitor>(visitor: &mut V, sheet: &StyleSheet, id: NodeId) {
    for &child in sheet.children(id) {
        walk_node(visitor, sheet, child);
    }
}
