//! Tree model to graph.

use super::{Heap, Label, Leaf, Node, NodeValue, RecordShape, RefId, Schema, Shape, ShapeId, Value};
use crate::{Error, Result};
use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{trace, warn};

/// A scalar read from a leaf or copied from a labelled slot.
enum Scalar<'s> {
    Int(i64),
    Str(&'s str),
}

pub(super) struct Filler<'a> {
    schema: &'a Schema,
    heap: &'a mut Heap,
    /// Label to the heap slot allocated for the labelled node.
    labels: IndexMap<Label, RefId>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Filler<'a> {
    pub(super) fn new(schema: &'a Schema, heap: &'a mut Heap, max_depth: usize) -> Self {
        Filler {
            schema,
            heap,
            labels: IndexMap::new(),
            depth: 0,
            max_depth,
        }
    }

    pub(super) fn fill_list(&mut self, list: &[Node], shape: ShapeId, dest: &mut Value) -> Result<()> {
        let schema = self.schema;
        match schema.get(shape)? {
            Shape::Int | Shape::Str => match list.first() {
                Some(node) => self.fill_node(node, shape, dest),
                None => Ok(()),
            },
            Shape::Seq(element) => self.fill_seq(list, *element, dest),
            Shape::Record(record) => self.fill_record(list, record, dest),
            Shape::Ref(target) => {
                let target = *target;
                let id = self.slot_for(target, dest)?;
                self.with_slot(id, |filler, slot| filler.fill_list(list, target, slot))
            }
        }
    }

    fn fill_node(&mut self, node: &Node, shape: ShapeId, dest: &mut Value) -> Result<()> {
        self.enter()?;
        let schema = self.schema;
        let children = node.children.as_deref().unwrap_or(&[]);
        match schema.get(shape)? {
            kind @ (Shape::Int | Shape::Str) => self.fill_scalar(node.value.as_ref(), kind, dest)?,
            Shape::Seq(element) => self.fill_seq(children, *element, dest)?,
            Shape::Record(record) => self.fill_record(children, record, dest)?,
            Shape::Ref(target) => self.fill_ref(node, *target, dest)?,
        }
        self.leave();
        Ok(())
    }

    fn fill_seq(&mut self, list: &[Node], element: ShapeId, dest: &mut Value) -> Result<()> {
        let Value::Seq(items) = dest else {
            return Err(mismatch("sequence", dest));
        };
        for node in list {
            let index = items.len();
            items.push(self.schema.zero(element)?);
            self.fill_node(node, element, &mut items[index])?;
        }
        Ok(())
    }

    fn fill_record(&mut self, list: &[Node], shape: &RecordShape, dest: &mut Value) -> Result<()> {
        let Value::Record(record) = dest else {
            return Err(mismatch("record", dest));
        };
        for node in list {
            let Some(field) = node.value.as_ref().and_then(NodeValue::field) else {
                trace!(record = %shape.name, "dropping untagged child");
                continue;
            };
            let Some(&field_shape) = shape.fields.get(&field.name) else {
                trace!(record = %shape.name, field = %field.name, "dropping unknown field");
                continue;
            };
            if !record.contains(&field.name) {
                record.insert(field.name.clone(), self.schema.zero(field_shape)?);
            }
            if let Some(slot) = record.get_mut(&field.name) {
                self.fill_node(node, field_shape, slot)?;
            }
        }
        Ok(())
    }

    fn fill_ref(&mut self, node: &Node, target: ShapeId, dest: &mut Value) -> Result<()> {
        if !matches!(dest, Value::Ref(_)) {
            return Err(mismatch("reference", dest));
        }
        if let Some(label) = node.label {
            // registered before descending: back-references inside resolve here.
            // Nested reference levels see the same label and keep the outermost slot.
            let id = self.slot_for(target, dest)?;
            if let Entry::Vacant(entry) = self.labels.entry(label) {
                entry.insert(id);
                trace!(%label, slot = id.index(), "registered label");
            }
            return self.with_slot(id, |filler, slot| filler.fill_node(node, target, slot));
        }
        if let Some(label) = node.value.as_ref().and_then(NodeValue::label) {
            let id = self.lookup(label)?;
            trace!(%label, slot = id.index(), "resolved label");
            *dest = Value::Ref(Some(id));
            return Ok(());
        }
        if node.leaf_value().is_none() && node.children.is_none() {
            *dest = Value::Ref(None);
            return Ok(());
        }
        let id = self.slot_for(target, dest)?;
        self.with_slot(id, |filler, slot| filler.fill_node(node, target, slot))
    }

    fn fill_scalar(&self, value: Option<&NodeValue>, kind: &Shape, dest: &mut Value) -> Result<()> {
        match value.and_then(NodeValue::leaf) {
            None => Ok(()),
            Some(Leaf::Int(i)) => assign(Scalar::Int(*i), kind, dest),
            Some(Leaf::Str(s)) => assign(Scalar::Str(s), kind, dest),
            Some(Leaf::Ref(label)) => {
                let id = self.lookup(*label)?;
                match self.heap.get(id) {
                    Some(Value::Int(i)) => assign(Scalar::Int(*i), kind, dest),
                    Some(Value::Str(s)) => assign(Scalar::Str(s), kind, dest),
                    other => {
                        let found = other.map_or("nothing", Value::kind);
                        warn!(
                            %label,
                            found,
                            "label in a scalar slot does not name a scalar, slot left unchanged"
                        );
                        Ok(())
                    }
                }
            }
        }
    }

    /// The slot `dest` points at, allocating a zero value of `target` if it is null.
    fn slot_for(&mut self, target: ShapeId, dest: &mut Value) -> Result<RefId> {
        match dest {
            Value::Ref(Some(id)) => Ok(*id),
            Value::Ref(None) => {
                let id = self.heap.alloc(self.schema.zero(target)?);
                *dest = Value::Ref(Some(id));
                Ok(id)
            }
            other => Err(mismatch("reference", other)),
        }
    }

    /// Fills a heap slot in place. The slot is moved out for the duration and
    /// put back even when `f` fails.
    fn with_slot<F>(&mut self, id: RefId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self, &mut Value) -> Result<()>,
    {
        let mut value = self.heap.take(id).ok_or_else(|| {
            Error::unsupported_shape(&format!("dangling reference to slot {}", id.index()))
        })?;
        let result = f(self, &mut value);
        self.heap.put(id, value);
        result
    }

    fn lookup(&self, label: Label) -> Result<RefId> {
        self.labels
            .get(&label)
            .copied()
            .ok_or(Error::UnknownLabel(label))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::DepthLimit {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

fn assign(source: Scalar<'_>, kind: &Shape, dest: &mut Value) -> Result<()> {
    *dest = match (kind, source) {
        (Shape::Int, Scalar::Int(i)) => Value::Int(i),
        (Shape::Int, Scalar::Str(s)) => Value::Int(
            s.parse()
                .map_err(|_| Error::malformed_scalar("integer", s))?,
        ),
        (Shape::Str, Scalar::Str(s)) => Value::Str(s.to_string()),
        (Shape::Str, Scalar::Int(i)) => Value::Str(i.to_string()),
        _ => return Err(Error::unsupported_shape("scalar destination expected")),
    };
    Ok(())
}

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::unsupported_shape(&format!(
        "destination is not a {expected} but a {}",
        found.kind()
    ))
}

#[cfg(test)]
mod tests {
    use crate::model::{fill, new, Graph, Label, Leaf, Node, Record, Schema, ShapeId, Value};
    use crate::Error;

    /// `Link { value: int, next: &Link }`
    fn link_schema() -> (Schema, ShapeId, ShapeId) {
        let mut schema = Schema::new();
        let int = schema.int();
        let link = schema.record("Link");
        let next = schema.reference(link);
        schema.field(link, "value", int).unwrap();
        schema.field(link, "next", next).unwrap();
        (schema, link, next)
    }

    #[test]
    fn test_shared_reference_restores_identity() {
        let mut schema = Schema::new();
        let string = schema.string();
        let string_ref = schema.reference(string);
        let pair = schema.record("Pair");
        schema.field(pair, "a", string_ref).unwrap();
        schema.field(pair, "b", string_ref).unwrap();

        let mut source = Graph::new(Value::Ref(None));
        let shared = source.alloc(Value::from("both"));
        source.root = Value::Record(
            Record::new()
                .with_field("a", Value::Ref(Some(shared)))
                .with_field("b", Value::Ref(Some(shared))),
        );
        let list = new(&source).unwrap();
        let labels: Vec<_> = list.iter().filter_map(|node| node.label).collect();
        assert_eq!(labels, vec![Label::new(1)]);

        let mut copy = Graph::new(schema.zero(pair).unwrap());
        fill(&list, &schema, pair, &mut copy).unwrap();
        let Value::Record(record) = &copy.root else {
            panic!("expected a record");
        };
        let a = record.get("a").and_then(Value::as_ref_id).unwrap();
        let b = record.get("b").and_then(Value::as_ref_id).unwrap();
        assert_eq!(a, b);
        assert_eq!(copy.heap.get(a), Some(&Value::from("both")));
    }

    #[test]
    fn test_shared_reference_to_reference_keeps_outer_slot() {
        let mut schema = Schema::new();
        let int = schema.int();
        let int_ref = schema.reference(int);
        let ref_ref = schema.reference(int_ref);
        let seq = schema.seq(ref_ref);

        let mut source = Graph::new(Value::Ref(None));
        let inner = source.alloc(Value::Int(5));
        let outer = source.alloc(Value::Ref(Some(inner)));
        source.root = Value::Seq(vec![Value::Ref(Some(outer)), Value::Ref(Some(outer))]);

        let list = new(&source).unwrap();
        assert_eq!(
            list,
            vec![
                Node::leaf(Leaf::Int(5)).with_label(Label::new(1)),
                Node::leaf(Leaf::Ref(Label::new(1))),
            ]
        );

        let mut copy = Graph::new(schema.zero(seq).unwrap());
        fill(&list, &schema, seq, &mut copy).unwrap();
        let Value::Seq(items) = &copy.root else {
            panic!("expected a sequence");
        };
        let first = items[0].as_ref_id().unwrap();
        assert_eq!(items[1].as_ref_id(), Some(first));
        let middle = copy.heap.get(first).and_then(Value::as_ref_id).unwrap();
        assert_eq!(copy.heap.get(middle), Some(&Value::Int(5)));
        assert_eq!(copy.heap.len(), 2);
    }

    #[test]
    fn test_cycle_round_trip() {
        let (mut schema, _, next) = link_schema();
        let seq = schema.seq(next);

        let mut source = Graph::new(Value::Ref(None));
        let link = source.alloc(Value::Ref(None));
        source.heap.put(
            link,
            Value::Record(
                Record::new()
                    .with_field("value", Value::Int(1))
                    .with_field("next", Value::Ref(Some(link))),
            ),
        );
        source.root = Value::Seq(vec![Value::Ref(Some(link))]);

        let list = new(&source).unwrap();
        let mut copy = Graph::new(schema.zero(seq).unwrap());
        fill(&list, &schema, seq, &mut copy).unwrap();
        assert_eq!(copy, source);
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let (schema, link, _) = link_schema();
        let list = vec![
            Node::field("value", Some(Leaf::Int(4))),
            Node::field("colour", Some(Leaf::Str("red".into()))),
            Node::branch(vec![Node::leaf(Leaf::Int(9))]),
        ];
        let mut copy = Graph::new(schema.zero(link).unwrap());
        fill(&list, &schema, link, &mut copy).unwrap();
        assert_eq!(
            copy.root,
            Value::Record(
                Record::new()
                    .with_field("value", Value::Int(4))
                    .with_field("next", Value::Ref(None))
            )
        );
    }

    #[test]
    fn test_nil_reference_stays_nil() {
        let (schema, link, _) = link_schema();
        let list = vec![Node::field("next", None)];
        let mut copy = Graph::new(schema.zero(link).unwrap());
        fill(&list, &schema, link, &mut copy).unwrap();
        assert!(copy.heap.is_empty());
    }

    #[test]
    fn test_text_leaves_parse_into_integers() {
        let mut schema = Schema::new();
        let int = schema.int();
        let string = schema.string();
        let pair = schema.record("Pair");
        schema.field(pair, "n", int).unwrap();
        schema.field(pair, "s", string).unwrap();
        let list = vec![
            Node::field("n", Some(Leaf::Str("-12".into()))),
            Node::field("s", Some(Leaf::Int(3))),
        ];
        let mut copy = Graph::new(schema.zero(pair).unwrap());
        fill(&list, &schema, pair, &mut copy).unwrap();
        assert_eq!(
            copy.root,
            Value::Record(
                Record::new()
                    .with_field("n", Value::Int(-12))
                    .with_field("s", Value::from("3"))
            )
        );
    }

    #[test]
    fn test_label_in_scalar_slot_copies_value() {
        let mut schema = Schema::new();
        let int = schema.int();
        let int_ref = schema.reference(int);
        let pair = schema.record("Pair");
        schema.field(pair, "shared", int_ref).unwrap();
        schema.field(pair, "copy", int).unwrap();

        let label = Label::new(1);
        let list = vec![
            Node::field("shared", Some(Leaf::Int(8))).with_label(label),
            Node::field("copy", Some(Leaf::Ref(label))),
        ];
        let mut copy = Graph::new(schema.zero(pair).unwrap());
        fill(&list, &schema, pair, &mut copy).unwrap();
        let Value::Record(record) = &copy.root else {
            panic!("expected a record");
        };
        assert_eq!(record.get("copy"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_label_in_scalar_slot_must_be_known() {
        let mut schema = Schema::new();
        let int = schema.int();
        let list = vec![Node::leaf(Leaf::Ref(Label::new(3)))];
        let mut copy = Graph::new(Value::Int(0));
        assert_eq!(
            fill(&list, &schema, int, &mut copy),
            Err(Error::UnknownLabel(Label::new(3)))
        );
    }

    #[test]
    fn test_empty_list_into_scalar_is_a_no_op() {
        let mut schema = Schema::new();
        let int = schema.int();
        let mut copy = Graph::new(Value::Int(41));
        fill(&[], &schema, int, &mut copy).unwrap();
        assert_eq!(copy.root, Value::Int(41));
    }

    #[test]
    fn test_destination_mismatch() {
        let mut schema = Schema::new();
        let int = schema.int();
        let seq = schema.seq(int);
        let mut copy = Graph::new(Value::Int(0));
        let list = vec![Node::leaf(Leaf::Int(1))];
        assert!(matches!(
            fill(&list, &schema, seq, &mut copy),
            Err(Error::UnsupportedShape(_))
        ));
    }
}
