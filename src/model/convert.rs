//! Serde bridge between Rust types and value graphs.
//!
//! [`to_graph`] maps integers, strings, sequences and structs onto the five
//! value kinds; every `Some` gets its own heap slot, so the result is always
//! a tree. [`from_graph`] reads any graph back, following references.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_teff::model::{from_graph, to_graph};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Link {
//!     value: i32,
//!     next: Option<Box<Link>>,
//! }
//!
//! let list = Link { value: 1, next: Some(Box::new(Link { value: 2, next: None })) };
//! let graph = to_graph(&list).unwrap();
//! assert_eq!(graph.heap.len(), 1);
//! assert_eq!(from_graph::<Link>(&graph).unwrap(), list);
//! ```

use super::{Graph, Heap, Record, RefId, Value};
use crate::options::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::ser::{self, Impossible, Serialize};

/// Converts a serializable value into a graph.
///
/// # Errors
///
/// Returns [`Error::UnsupportedShape`] for booleans, floats, unit, maps, enum
/// variants and integers outside the `i64` range.
pub fn to_graph<T>(value: &T) -> Result<Graph>
where
    T: ?Sized + Serialize,
{
    let mut heap = Heap::new();
    let root = value.serialize(ValueSerializer { heap: &mut heap })?;
    Ok(Graph { root, heap })
}

/// Reads a graph back into a Rust value.
///
/// A null reference reads as `None` (or unit); any other reference is
/// followed transparently.
///
/// # Errors
///
/// Returns the type's own deserialization errors, [`Error::UnsupportedShape`]
/// for dangling references and [`Error::DepthLimit`] for cyclic graphs.
pub fn from_graph<T>(graph: &Graph) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(&graph.root, &graph.heap, 0))
}

struct ValueSerializer<'h> {
    heap: &'h mut Heap,
}

struct SerializeVec<'h> {
    heap: &'h mut Heap,
    vec: Vec<Value>,
}

struct SerializeRecord<'h> {
    heap: &'h mut Heap,
    record: Record,
}

impl<'h> ser::Serializer for ValueSerializer<'h> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec<'h>;
    type SerializeTuple = SerializeVec<'h>;
    type SerializeTupleStruct = SerializeVec<'h>;
    type SerializeTupleVariant = Impossible<Value, Error>;
    type SerializeMap = Impossible<Value, Error>;
    type SerializeStruct = SerializeRecord<'h>;
    type SerializeStructVariant = Impossible<Value, Error>;

    fn serialize_bool(self, _v: bool) -> Result<Value> {
        Err(Error::unsupported_shape("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| Error::unsupported_shape(&format!("integer {v} out of range")))
    }

    fn serialize_f32(self, _v: f32) -> Result<Value> {
        Err(Error::unsupported_shape("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<Value> {
        Err(Error::unsupported_shape("f64"))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Seq(v.iter().map(|&b| Value::Int(i64::from(b))).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Ref(None))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let heap = self.heap;
        let target = value.serialize(ValueSerializer { heap: &mut *heap })?;
        Ok(Value::Ref(Some(heap.alloc(target))))
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(Error::unsupported_shape("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Err(Error::unsupported_shape(&format!("unit struct {name}")))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Err(Error::unsupported_shape(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::unsupported_shape(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec<'h>> {
        Ok(SerializeVec {
            heap: self.heap,
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec<'h>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec<'h>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::unsupported_shape(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::unsupported_shape("map"))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeRecord<'h>> {
        Ok(SerializeRecord {
            heap: self.heap,
            record: Record::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::unsupported_shape(&format!("enum variant {name}::{variant}")))
    }
}

impl SerializeVec<'_> {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = value.serialize(ValueSerializer {
            heap: &mut *self.heap,
        })?;
        self.vec.push(value);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Seq(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Seq(self.vec))
    }
}

impl ser::SerializeTupleStruct for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Seq(self.vec))
    }
}

impl ser::SerializeStruct for SerializeRecord<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = value.serialize(ValueSerializer {
            heap: &mut *self.heap,
        })?;
        self.record.insert(key.to_string(), value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

struct ValueDeserializer<'g> {
    value: &'g Value,
    heap: &'g Heap,
    depth: usize,
}

impl<'g> ValueDeserializer<'g> {
    fn new(value: &'g Value, heap: &'g Heap, depth: usize) -> Self {
        ValueDeserializer { value, heap, depth }
    }

    fn nested(&self, value: &'g Value) -> Result<Self> {
        if self.depth >= DEFAULT_MAX_DEPTH {
            return Err(Error::DepthLimit {
                limit: DEFAULT_MAX_DEPTH,
            });
        }
        Ok(ValueDeserializer::new(value, self.heap, self.depth + 1))
    }

    fn target(&self, id: RefId) -> Result<Self> {
        let target = self.heap.get(id).ok_or_else(|| {
            Error::unsupported_shape(&format!("dangling reference to slot {}", id.index()))
        })?;
        self.nested(target)
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = self.value;
        match value {
            Value::Int(i) => visitor.visit_i64(*i),
            Value::Str(s) => visitor.visit_str(s),
            Value::Seq(items) => visitor.visit_seq(SeqDeserializer {
                iter: items.iter(),
                parent: self,
            }),
            Value::Record(record) => visitor.visit_map(MapDeserializer {
                iter: record.iter(),
                value: None,
                parent: self,
            }),
            Value::Ref(Some(id)) => self.target(*id)?.deserialize_any(visitor),
            Value::Ref(None) => visitor.visit_unit(),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = self.value;
        match value {
            Value::Ref(None) => visitor.visit_none(),
            Value::Ref(Some(id)) => visitor.visit_some(self.target(*id)?),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct SeqDeserializer<'g> {
    iter: std::slice::Iter<'g, Value>,
    parent: ValueDeserializer<'g>,
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'_> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(self.parent.nested(value)?).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer<'g> {
    iter: indexmap::map::Iter<'g, String, Value>,
    value: Option<&'g Value>,
    parent: ValueDeserializer<'g>,
}

impl<'de> de::MapAccess<'de> for MapDeserializer<'_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key: de::value::StrDeserializer<'_, Error> = key.as_str().into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(self.parent.nested(value)?),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
