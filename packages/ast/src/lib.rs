pub mod builder;
pub mod id;
pub mod tree;
pub mod visitor;

pub use builder::TreeBuilder;
pub use id::{get_document_id, IdGenerator};
pub use tree::{Node, NodeId, NodeKind, Span, StyleSheet};
pub use visitor::{walk, walk_children, walk_node, Visitor};
