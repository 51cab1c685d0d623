//! Plain-text marshalling of integers, strings and flat sequences of them.
//!
//! A scalar marshals to one line and a sequence to one line per element.
//! Strings that would not survive a line on their own are quoted (see
//! [`crate::tree::quote`]). An absent value marshals to `nil`.
//!
//! This adapter only handles flat data: records, nested sequences, maps,
//! floats and booleans are rejected with [`Error::UnsupportedShape`]. Use
//! [`crate::model`] for anything with structure or sharing.
//!
//! ```rust
//! use serde_teff::marshal::{from_list, to_list};
//! use serde_teff::tree::TextNode;
//! use serde_teff::RenderOptions;
//!
//! let list = to_list(&vec!["plain", " padded"], &RenderOptions::default()).unwrap();
//! assert_eq!(list, vec![TextNode::new("plain"), TextNode::new("\" padded\"")]);
//!
//! let back: Vec<String> = from_list(&list).unwrap();
//! assert_eq!(back, vec!["plain", " padded"]);
//! ```

use crate::model::{to_graph, Graph, Value};
use crate::tree::{needs_quotes, quote, unquote, TextList, TextNode};
use crate::{Error, RenderOptions, Result};
use serde::de::{self, DeserializeOwned};
use serde::Serialize;

/// The line an absent value marshals to.
pub const NIL: &str = "nil";

/// Converts a value into a text tree.
///
/// # Errors
///
/// Returns [`Error::UnsupportedShape`] for anything but integers, strings,
/// options of them and sequences of them.
pub fn to_list<T>(value: &T, options: &RenderOptions) -> Result<TextList>
where
    T: ?Sized + Serialize,
{
    let graph = to_graph(value)?;
    list_from_value(&graph, &graph.root, options)
}

fn list_from_value(graph: &Graph, value: &Value, options: &RenderOptions) -> Result<TextList> {
    match value {
        Value::Int(_) | Value::Str(_) => Ok(vec![node_from_value(graph, value, options)?]),
        Value::Seq(items) => items
            .iter()
            .map(|item| node_from_value(graph, item, options))
            .collect(),
        Value::Ref(None) => Ok(vec![TextNode::new(NIL)]),
        Value::Ref(Some(_)) => match graph.deref(value) {
            Some(target) => list_from_value(graph, target, options),
            None => Err(Error::unsupported_shape("dangling reference")),
        },
        Value::Record(_) => Err(Error::unsupported_shape("record")),
    }
}

fn node_from_value(graph: &Graph, value: &Value, options: &RenderOptions) -> Result<TextNode> {
    match value {
        Value::Int(i) => Ok(TextNode::new(&i.to_string())),
        Value::Str(s) if s == NIL || needs_quotes(s, options.annotation_marker) => {
            Ok(TextNode::new(&quote(s)))
        }
        Value::Str(s) => Ok(TextNode::new(s)),
        Value::Ref(Some(_)) => match graph.deref(value) {
            Some(target) => node_from_value(graph, target, options),
            None => Err(Error::unsupported_shape("dangling reference")),
        },
        Value::Ref(None) => Err(Error::unsupported_shape("nil element")),
        Value::Seq(_) => Err(Error::unsupported_shape("nested sequence")),
        Value::Record(_) => Err(Error::unsupported_shape("record")),
    }
}

/// Reads a value back from a text tree.
///
/// The tree `[nil]` reads as `None` or as an empty sequence.
///
/// # Errors
///
/// Returns [`Error::MalformedScalar`] for lines that do not parse as the
/// requested integer type, or an empty tree where a scalar is requested, and
/// [`Error::UnsupportedShape`] for unsupported target types.
pub fn from_list<T>(list: &[TextNode]) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ListDeserializer { list })
}

fn is_nil(list: &[TextNode]) -> bool {
    matches!(list, [node] if node.value == NIL && node.children.is_empty())
}

macro_rules! unsupported {
    ($($method:ident => $what:literal),* $(,)?) => {
        $(
            fn $method<V>(self, _visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                Err(Error::unsupported_shape($what))
            }
        )*
    };
}

struct ListDeserializer<'a> {
    list: &'a [TextNode],
}

impl<'a> ListDeserializer<'a> {
    fn first(&self) -> Result<NodeDeserializer<'a>> {
        self.list
            .first()
            .map(|node| NodeDeserializer { node })
            .ok_or_else(|| Error::malformed_scalar("a line", "end of input"))
    }
}

impl<'de> de::Deserializer<'de> for ListDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.list {
            [node] => NodeDeserializer { node }.deserialize_any(visitor),
            _ => self.deserialize_seq(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.list.is_empty() || is_nil(self.list) {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let list = if is_nil(self.list) { &[][..] } else { self.list };
        visitor.visit_seq(SeqDeserializer { iter: list.iter() })
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.first()?.deserialize_i64(visitor)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.first()?.deserialize_u64(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.first()?.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    serde::forward_to_deserialize_any! {
        i128 u128
    }

    fn deserialize_i8<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i16<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i32<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_u8<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u16<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u32<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_char<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    unsupported! {
        deserialize_bool => "bool",
        deserialize_f32 => "f32",
        deserialize_f64 => "f64",
        deserialize_bytes => "bytes",
        deserialize_byte_buf => "bytes",
        deserialize_unit => "unit",
        deserialize_map => "map",
        deserialize_identifier => "identifier",
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape("unit struct"))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape(&format!("record {name}")))
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape(&format!("enum {name}")))
    }
}

struct SeqDeserializer<'a> {
    iter: std::slice::Iter<'a, TextNode>,
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'_> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(node) => seed.deserialize(NodeDeserializer { node }).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// One line. Nested lines are ignored.
struct NodeDeserializer<'a> {
    node: &'a TextNode,
}

impl NodeDeserializer<'_> {
    fn text(&self) -> String {
        unquote(&self.node.value).unwrap_or_else(|| self.node.value.clone())
    }
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.node.value.parse::<i64>() {
            Ok(i) => visitor.visit_i64(i),
            Err(_) => visitor.visit_string(self.text()),
        }
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = &self.node.value;
        let i = value
            .parse::<i64>()
            .map_err(|_| Error::malformed_scalar("integer", value))?;
        visitor.visit_i64(i)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = &self.node.value;
        let u = value
            .parse::<u64>()
            .map_err(|_| Error::malformed_scalar("unsigned integer", value))?;
        visitor.visit_u64(u)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.text())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.node.value == NIL {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_i8<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i16<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i32<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_u8<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u16<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u32<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_char<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    serde::forward_to_deserialize_any! {
        i128 u128
    }

    unsupported! {
        deserialize_bool => "bool",
        deserialize_f32 => "f32",
        deserialize_f64 => "f64",
        deserialize_bytes => "bytes",
        deserialize_byte_buf => "bytes",
        deserialize_unit => "unit",
        deserialize_seq => "nested sequence",
        deserialize_map => "map",
        deserialize_identifier => "identifier",
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape("unit struct"))
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape("nested sequence"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape("nested sequence"))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape(&format!("record {name}")))
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_shape(&format!("enum {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(values: &[&str]) -> TextList {
        values.iter().map(|value| TextNode::new(value)).collect()
    }

    #[test]
    fn test_scalars() {
        let options = RenderOptions::default();
        assert_eq!(to_list(&42, &options).unwrap(), lines(&["42"]));
        assert_eq!(to_list("word", &options).unwrap(), lines(&["word"]));
        assert_eq!(from_list::<i32>(&lines(&["-7"])).unwrap(), -7);
        assert_eq!(from_list::<String>(&lines(&["word"])).unwrap(), "word");
    }

    #[test]
    fn test_nil() {
        let options = RenderOptions::default();
        assert_eq!(to_list(&None::<i32>, &options).unwrap(), lines(&[NIL]));
        assert_eq!(to_list(&Some(3), &options).unwrap(), lines(&["3"]));
        assert_eq!(from_list::<Option<i32>>(&lines(&[NIL])).unwrap(), None);
        assert_eq!(from_list::<Vec<i32>>(&lines(&[NIL])).unwrap(), Vec::<i32>::new());
        assert_eq!(from_list::<Option<i32>>(&lines(&["5"])).unwrap(), Some(5));
    }

    #[test]
    fn test_string_that_reads_as_nil_is_quoted() {
        let list = to_list("nil", &RenderOptions::default()).unwrap();
        assert_eq!(list, lines(&["\"nil\""]));
        assert_eq!(from_list::<Option<String>>(&list).unwrap(), Some("nil".into()));
    }

    #[test]
    fn test_annotation_marker_is_quoted() {
        let options = RenderOptions::new().with_annotation_marker(';');
        assert_eq!(to_list("; x", &options).unwrap(), lines(&["\"; x\""]));
        assert_eq!(to_list("# x", &options).unwrap(), lines(&["# x"]));
    }

    #[test]
    fn test_malformed_integer() {
        assert_eq!(
            from_list::<Vec<i64>>(&lines(&["1", "two"])),
            Err(Error::malformed_scalar("integer", "two"))
        );
        assert_eq!(
            from_list::<i64>(&[]),
            Err(Error::malformed_scalar("a line", "end of input"))
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        let options = RenderOptions::default();
        assert!(matches!(
            to_list(&vec![vec![1]], &options),
            Err(Error::UnsupportedShape(_))
        ));
        assert!(matches!(
            to_list(&vec![Some(1), None], &options),
            Err(Error::UnsupportedShape(_))
        ));
        assert!(matches!(to_list(&1.5, &options), Err(Error::UnsupportedShape(_))));
        assert!(matches!(
            from_list::<bool>(&lines(&["true"])),
            Err(Error::UnsupportedShape(_))
        ));
    }
}
