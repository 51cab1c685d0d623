//! The tree model: a value graph flattened into an ordered tree of nodes.
//!
//! [`new`] walks a [`Graph`] and produces a [`List`] of [`Node`]s. Scalars
//! become leaves, sequences and records become nodes with children, and
//! references are followed. A reference target reached a second time is not
//! built again: its node gets a [`Label`] and the second visit becomes a leaf
//! holding that label, so shared and cyclic structures come out finite.
//!
//! [`fill`] is the inverse. Given a [`Schema`] describing the destination, it
//! populates a graph from a node list and turns labels back into shared
//! references.
//!
//! Record fields whose node is a leaf carry the field name (see
//! [`FieldValue`]) and are routed back by name. Fields whose node has children
//! carry no name and cannot be routed back; filling drops them.
//!
//! ```rust
//! use serde_teff::model::{self, Graph, Record, Schema, Value};
//!
//! let mut graph = Graph::new(Value::Ref(None));
//! let shared = graph.alloc(Value::Int(7));
//! graph.root = Value::Record(
//!     Record::new()
//!         .with_field("left", Value::Ref(Some(shared)))
//!         .with_field("right", Value::Ref(Some(shared))),
//! );
//! let list = model::new(&graph).unwrap();
//!
//! let mut schema = Schema::new();
//! let int = schema.int();
//! let int_ref = schema.reference(int);
//! let pair = schema.record("Pair");
//! schema.field(pair, "left", int_ref).unwrap();
//! schema.field(pair, "right", int_ref).unwrap();
//!
//! let mut copy = Graph::new(schema.zero(pair).unwrap());
//! model::fill(&list, &schema, pair, &mut copy).unwrap();
//!
//! let Value::Record(record) = &copy.root else { unreachable!() };
//! assert_eq!(record.get("left"), record.get("right"));
//! assert_eq!(copy.heap.len(), 1);
//! ```

mod convert;
mod filler;
mod graph;
mod maker;
mod schema;

pub use convert::{from_graph, to_graph};
pub use graph::{Graph, Heap, Record, RefId, Value};
pub use schema::{RecordShape, Schema, Shape, ShapeId};

use crate::{ModelOptions, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A back-reference label: a serial number assigned, starting at 1, to a node
/// the first time its target is revisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(u32);

impl Label {
    #[must_use]
    pub const fn new(serial: u32) -> Self {
        Label(serial)
    }

    #[must_use]
    pub const fn serial(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A leaf value: a scalar or a back-reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leaf {
    Int(i64),
    Str(String),
    /// Stands in for the node carrying this label.
    Ref(Label),
}

impl Leaf {
    #[inline]
    #[must_use]
    pub const fn as_label(&self) -> Option<Label> {
        match self {
            Leaf::Ref(label) => Some(*label),
            _ => None,
        }
    }
}

/// A leaf that came from a named record field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    /// `None` when the field held a null reference.
    pub value: Option<Leaf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    Leaf(Leaf),
    Field(FieldValue),
}

impl NodeValue {
    /// The leaf, looking through a field tag.
    #[must_use]
    pub fn leaf(&self) -> Option<&Leaf> {
        match self {
            NodeValue::Leaf(leaf) => Some(leaf),
            NodeValue::Field(field) => field.value.as_ref(),
        }
    }

    #[must_use]
    pub fn field(&self) -> Option<&FieldValue> {
        match self {
            NodeValue::Field(field) => Some(field),
            NodeValue::Leaf(_) => None,
        }
    }

    /// The back-reference label, if the leaf is one.
    #[must_use]
    pub fn label(&self) -> Option<Label> {
        self.leaf().and_then(Leaf::as_label)
    }
}

/// One node of the tree model.
///
/// A node holds either a value or children. `label` marks a node that some
/// back-reference leaf points at; it may sit on either form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<List>,
}

/// An ordered sequence of sibling nodes.
pub type List = Vec<Node>;

impl Node {
    #[must_use]
    pub fn leaf(leaf: Leaf) -> Self {
        Node {
            value: Some(NodeValue::Leaf(leaf)),
            ..Node::default()
        }
    }

    #[must_use]
    pub fn field(name: &str, value: Option<Leaf>) -> Self {
        Node {
            value: Some(NodeValue::Field(FieldValue {
                name: name.to_string(),
                value,
            })),
            ..Node::default()
        }
    }

    #[must_use]
    pub fn branch(children: List) -> Self {
        Node {
            children: Some(children),
            ..Node::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// The node's leaf, looking through a field tag.
    #[must_use]
    pub fn leaf_value(&self) -> Option<&Leaf> {
        self.value.as_ref().and_then(NodeValue::leaf)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Builds the tree model of a graph's root value.
///
/// A null root yields an empty list.
///
/// # Errors
///
/// Returns [`crate::Error::DepthLimit`] if nesting exceeds the default
/// [`ModelOptions::max_depth`], and [`crate::Error::UnsupportedShape`] for a
/// reference to a slot the heap does not have.
pub fn new(graph: &Graph) -> Result<List> {
    new_with_options(graph, &ModelOptions::default())
}

/// Builds the tree model of a graph's root value.
///
/// # Errors
///
/// See [`new`].
#[tracing::instrument(level = "debug", skip_all, fields(max_depth = options.max_depth))]
pub fn new_with_options(graph: &Graph, options: &ModelOptions) -> Result<List> {
    maker::Maker::new(graph, options.max_depth).make(&graph.root)
}

/// Populates `graph.root` (of shape `shape`) from a node list.
///
/// References are allocated in `graph.heap`; labels come back as shared
/// references. On error the destination keeps whatever was filled before the
/// failure.
///
/// # Errors
///
/// Returns [`crate::Error::MalformedScalar`] for text that does not parse as an
/// integer destination, [`crate::Error::UnknownLabel`] for a back-reference to a
/// label not seen earlier in the list, [`crate::Error::UnsupportedShape`] when
/// the destination value does not match its shape, and
/// [`crate::Error::DepthLimit`].
pub fn fill(list: &[Node], schema: &Schema, shape: ShapeId, graph: &mut Graph) -> Result<()> {
    fill_with_options(list, schema, shape, graph, &ModelOptions::default())
}

/// Populates `graph.root` from a node list.
///
/// # Errors
///
/// See [`fill`].
#[tracing::instrument(level = "debug", skip_all, fields(nodes = list.len()))]
pub fn fill_with_options(
    list: &[Node],
    schema: &Schema,
    shape: ShapeId,
    graph: &mut Graph,
    options: &ModelOptions,
) -> Result<()> {
    let Graph { root, heap } = graph;
    filler::Filler::new(schema, heap, options.max_depth).fill_list(list, shape, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn ints() -> (Schema, ShapeId) {
        let mut schema = Schema::new();
        let int = schema.int();
        let seq = schema.seq(int);
        (schema, seq)
    }

    #[test]
    fn test_scalar_and_sequence() {
        assert_eq!(
            new(&Graph::new(Value::Int(1))).unwrap(),
            vec![Node::leaf(Leaf::Int(1))]
        );
        let graph = Graph::new(Value::Seq(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(
            new(&graph).unwrap(),
            vec![Node::leaf(Leaf::Int(1)), Node::leaf(Leaf::Int(2))]
        );
    }

    #[test]
    fn test_nil_root() {
        assert!(new(&Graph::new(Value::Ref(None))).unwrap().is_empty());
    }

    #[test]
    fn test_sequence_round_trip() {
        let (schema, seq) = ints();
        let source = Graph::new(Value::Seq(vec![Value::Int(3), Value::Int(-4)]));
        let list = new(&source).unwrap();

        let mut copy = Graph::new(schema.zero(seq).unwrap());
        fill(&list, &schema, seq, &mut copy).unwrap();
        assert_eq!(copy, source);
    }

    #[test]
    fn test_fill_malformed_scalar() {
        let (schema, seq) = ints();
        let list = vec![Node::leaf(Leaf::Str("seven".into()))];
        let mut copy = Graph::new(schema.zero(seq).unwrap());
        assert_eq!(
            fill(&list, &schema, seq, &mut copy),
            Err(Error::malformed_scalar("integer", "seven"))
        );
    }

    #[test]
    fn test_fill_unknown_label() {
        let mut schema = Schema::new();
        let int = schema.int();
        let int_ref = schema.reference(int);
        let seq = schema.seq(int_ref);
        let list = vec![Node::leaf(Leaf::Ref(Label::new(9)))];
        let mut copy = Graph::new(schema.zero(seq).unwrap());
        assert_eq!(
            fill(&list, &schema, seq, &mut copy),
            Err(Error::UnknownLabel(Label::new(9)))
        );
    }

    #[test]
    fn test_node_json_shape() {
        let node = Node::branch(vec![
            Node::field("n", Some(Leaf::Int(1))).with_label(Label::new(1)),
            Node::leaf(Leaf::Ref(Label::new(1))),
        ]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "children": [
                    {"label": 1, "value": {"name": "n", "value": {"int": 1}}},
                    {"value": {"ref": 1}}
                ]
            })
        );
        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
