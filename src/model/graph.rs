//! Value graphs: the in-memory values the tree model converts from and into.
//!
//! A [`Graph`] is a root [`Value`] plus a [`Heap`] of reference targets. A
//! [`Value::Ref`] points at a heap slot by [`RefId`], so two references holding
//! the same `RefId` share one target, and a target may (directly or through
//! other slots) refer back to itself.
//!
//! ```rust
//! use serde_teff::model::{Graph, Record, Value};
//!
//! let mut graph = Graph::new(Value::Ref(None));
//! let shared = graph.alloc(Value::Int(7));
//! graph.root = Value::Record(
//!     Record::new()
//!         .with_field("left", Value::Ref(Some(shared)))
//!         .with_field("right", Value::Ref(Some(shared))),
//! );
//! assert_eq!(graph.heap.get(shared), Some(&Value::Int(7)));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The identity of a heap slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(usize);

impl RefId {
    /// The slot's position in its heap.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A value of one of the five kinds the tree model understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Str(String),
    Seq(Vec<Value>),
    Record(Record),
    /// A reference to a heap slot; `None` is the null reference.
    Ref(Option<RefId>),
}

impl Value {
    /// A short name for the value's kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Record(_) => "record",
            Value::Ref(_) => "reference",
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_ref_id(&self) -> Option<RefId> {
        match self {
            Value::Ref(id) => *id,
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// Named fields in declaration order.
///
/// A thin wrapper around [`IndexMap`]; iteration follows insertion order,
/// which is the order fields are visited when building a tree model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Record(IndexMap::with_capacity(capacity))
    }

    /// Appends a field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    /// Inserts a field. An existing field keeps its position and gets the new value.
    pub fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        self.0.insert(name, value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Record(IndexMap::from_iter(iter))
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An arena of reference targets addressed by [`RefId`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heap {
    slots: Vec<Value>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Heap { slots: Vec::new() }
    }

    /// Stores `value` in a fresh slot.
    pub fn alloc(&mut self, value: Value) -> RefId {
        self.slots.push(value);
        RefId(self.slots.len() - 1)
    }

    #[must_use]
    pub fn get(&self, id: RefId) -> Option<&Value> {
        self.slots.get(id.0)
    }

    pub fn get_mut(&mut self, id: RefId) -> Option<&mut Value> {
        self.slots.get_mut(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Moves a slot's value out, leaving a null reference behind until [`Heap::put`].
    pub(crate) fn take(&mut self, id: RefId) -> Option<Value> {
        self.slots
            .get_mut(id.0)
            .map(|slot| std::mem::replace(slot, Value::Ref(None)))
    }

    pub(crate) fn put(&mut self, id: RefId, value: Value) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = value;
        }
    }
}

/// A root value and the heap its references point into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub root: Value,
    pub heap: Heap,
}

impl Graph {
    #[must_use]
    pub fn new(root: Value) -> Self {
        Graph {
            root,
            heap: Heap::new(),
        }
    }

    /// Stores `value` in a fresh heap slot.
    pub fn alloc(&mut self, value: Value) -> RefId {
        self.heap.alloc(value)
    }

    /// Follows a reference value to its target.
    #[must_use]
    pub fn deref(&self, value: &Value) -> Option<&Value> {
        value.as_ref_id().and_then(|id| self.heap.get(id))
    }
}
