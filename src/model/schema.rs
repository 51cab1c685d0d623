//! Shape descriptors for fill destinations.
//!
//! Filling needs to know more than the destination's current value holds: an
//! empty sequence says nothing about its elements, a null reference nothing
//! about its target. A [`Schema`] records that once per type. Shapes refer to
//! each other by [`ShapeId`], so recursive types (a record with a reference
//! to its own shape) are declared in two steps:
//!
//! ```rust
//! use serde_teff::model::{Schema, Shape};
//!
//! let mut schema = Schema::new();
//! let int = schema.int();
//! let link = schema.record("Link");
//! let next = schema.reference(link);
//! schema.field(link, "value", int).unwrap();
//! schema.field(link, "next", next).unwrap();
//!
//! assert!(matches!(schema.get(next), Ok(Shape::Ref(_))));
//! ```

use super::graph::{Record, Value};
use crate::{Error, Result};
use indexmap::IndexMap;

/// The identity of a shape within its [`Schema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeId(usize);

/// The kind of a destination value, with the shapes of whatever it contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Int,
    Str,
    /// A sequence of elements of one shape.
    Seq(ShapeId),
    Record(RecordShape),
    /// A reference to a target of one shape.
    Ref(ShapeId),
}

/// A record's name and its declared fields, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordShape {
    pub name: String,
    pub fields: IndexMap<String, ShapeId>,
}

/// A registry of shapes.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    shapes: Vec<Shape>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Schema { shapes: Vec::new() }
    }

    pub fn int(&mut self) -> ShapeId {
        self.add(Shape::Int)
    }

    pub fn string(&mut self) -> ShapeId {
        self.add(Shape::Str)
    }

    pub fn seq(&mut self, element: ShapeId) -> ShapeId {
        self.add(Shape::Seq(element))
    }

    pub fn reference(&mut self, target: ShapeId) -> ShapeId {
        self.add(Shape::Ref(target))
    }

    /// Declares a record with no fields yet; add them with [`Schema::field`].
    pub fn record(&mut self, name: &str) -> ShapeId {
        self.add(Shape::Record(RecordShape {
            name: name.to_string(),
            fields: IndexMap::new(),
        }))
    }

    /// Appends a field to a declared record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedShape`] if `record` is not a record shape.
    pub fn field(&mut self, record: ShapeId, name: &str, shape: ShapeId) -> Result<()> {
        match self.shapes.get_mut(record.0) {
            Some(Shape::Record(declared)) => {
                declared.fields.insert(name.to_string(), shape);
                Ok(())
            }
            _ => Err(Error::unsupported_shape(&format!(
                "shape {} is not a record",
                record.0
            ))),
        }
    }

    /// Looks up a shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedShape`] for an id from another schema.
    pub fn get(&self, id: ShapeId) -> Result<&Shape> {
        self.shapes
            .get(id.0)
            .ok_or_else(|| Error::unsupported_shape(&format!("unknown shape {}", id.0)))
    }

    /// The value a fresh destination of this shape starts with: zero, the empty
    /// string, an empty sequence, a record of zero fields, or a null reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedShape`] for unknown ids and for records that
    /// contain themselves by value.
    pub fn zero(&self, id: ShapeId) -> Result<Value> {
        self.zero_inner(id, &mut Vec::new())
    }

    fn zero_inner(&self, id: ShapeId, open: &mut Vec<ShapeId>) -> Result<Value> {
        match self.get(id)? {
            Shape::Int => Ok(Value::Int(0)),
            Shape::Str => Ok(Value::Str(String::new())),
            Shape::Seq(_) => Ok(Value::Seq(Vec::new())),
            Shape::Ref(_) => Ok(Value::Ref(None)),
            Shape::Record(shape) => {
                if open.contains(&id) {
                    return Err(Error::unsupported_shape(&format!(
                        "record {} contains itself by value",
                        shape.name
                    )));
                }
                open.push(id);
                let mut record = Record::with_capacity(shape.fields.len());
                for (name, field) in &shape.fields {
                    record.insert(name.clone(), self.zero_inner(*field, open)?);
                }
                open.pop();
                Ok(Value::Record(record))
            }
        }
    }

    fn add(&mut self, shape: Shape) -> ShapeId {
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }
}
