use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeSeed, EnumAccess, IntoDeserializer, Unexpected, VariantAccess, Visitor,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use crate::error::CborError;
use crate::tags::Tagged;

/// Dynamic CBOR value type, the result of generic decoding.
///
/// Map entries keep the order they had in the input stream. Keys may be any
/// value; a repeated key replaces the earlier entry's value in place.
///
/// # Example
/// ```
/// use cbor_codec::{Value, decode, to_vec};
///
/// let value = Value::Map(vec![
///     (Value::from("name"), Value::from("Alice")),
///     (Value::from("age"), Value::from(30u64)),
/// ]);
///
/// let bytes = to_vec(&value).unwrap();
/// let decoded = decode(&bytes).unwrap();
/// assert_eq!(decoded, Some(value));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned integer (major type 0)
    Unsigned(u64),
    /// Negative integer (major type 1), always below zero
    Negative(i64),
    /// Byte string
    Bytes(Vec<u8>),
    /// Text string
    Text(String),
    /// Array of values
    Array(Vec<Value>),
    /// Map entries in stream order
    Map(Vec<(Value, Value)>),
    /// Tagged value (tag number, boxed content)
    Tag(u64, Box<Value>),
    /// Boolean value
    Bool(bool),
    /// Null, also produced for undefined
    Null,
    /// Floating point value, widened to double precision
    Float(f64),
}

/// Collects map entries in stream order, a repeated key replacing the earlier value in place.
///
/// Keys are identified by their encoding, so floats compare by bit pattern:
/// `0.0` and `-0.0` are distinct keys and a repeated NaN matches itself.
#[derive(Debug, Default)]
pub(crate) struct MapBuilder {
    entries: Vec<(Value, Value)>,
    index: HashMap<Vec<u8>, usize>,
}

impl MapBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: Value, value: Value) -> Result<(), CborError> {
        let identity = crate::to_vec(&key)?;
        match self.index.entry(identity) {
            Entry::Occupied(slot) => self.entries[*slot.get()].1 = value,
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((key, value));
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Value {
        Value::Map(self.entries)
    }
}

impl Value {
    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for either integer variant
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Unsigned(_) | Value::Negative(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the value as a signed integer, if it is one that fits
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Unsigned(u) => i64::try_from(*u).ok(),
            Value::Negative(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the tag number and inner value, if this is a tagged value
    pub fn as_tag(&self) -> Option<(u64, &Value)> {
        match self {
            Value::Tag(tag, value) => Some((*tag, value)),
            _ => None,
        }
    }

    /// Looks up a text key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Unsigned(u) => Unexpected::Unsigned(*u),
            Value::Negative(i) => Unexpected::Signed(*i),
            Value::Bytes(b) => Unexpected::Bytes(b),
            Value::Text(s) => Unexpected::Str(s),
            Value::Array(_) => Unexpected::Seq,
            Value::Map(_) => Unexpected::Map,
            Value::Tag(_, _) => Unexpected::Other("tagged value"),
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::Null => Unexpected::Unit,
            Value::Float(f) => Unexpected::Float(*f),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        if v >= 0 {
            Value::Unsigned(v as u64)
        } else {
            Value::Negative(v)
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Unsigned(u) => serializer.serialize_u64(*u),
            Value::Negative(i) => serializer.serialize_i64(*i),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(a) => a.serialize(serializer),
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Tag(tag, value) => Tagged::new(Some(*tag), &**value).serialize(serializer),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_none(),
            Value::Float(f) => serializer.serialize_f64(*f),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid CBOR value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::Unsigned(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Text(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::Text(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_seq<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut map = MapBuilder::new();
                while let Some((key, value)) = visitor.next_entry()? {
                    map.insert(key, value).map_err(de::Error::custom)?;
                }
                Ok(map.finish())
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

// A decoded `Value` drives typed deserialization for `from_slice`.
impl<'de> Deserializer<'de> for Value {
    type Error = CborError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CborError> {
        match self {
            Value::Unsigned(u) => visitor.visit_u64(u),
            Value::Negative(i) => visitor.visit_i64(i),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::Text(s) => visitor.visit_string(s),
            Value::Array(a) => {
                let mut seq = SeqDeserializer::<_, CborError>::new(a.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            Value::Map(m) => {
                let mut map = MapDeserializer::<_, CborError>::new(m.into_iter());
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(value)
            }
            // Tag information is dropped; the content is what the caller asked for
            Value::Tag(_, inner) => inner.deserialize_any(visitor),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Null => visitor.visit_unit(),
            Value::Float(f) => visitor.visit_f64(f),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CborError> {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CborError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CborError> {
        match self {
            Value::Text(variant) => {
                let variant: StringDeserializer<CborError> = variant.into_deserializer();
                visitor.visit_enum(variant)
            }
            Value::Map(entries) if entries.len() == 1 => {
                let mut entries = entries.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer { variant, value }),
                    None => Err(de::Error::invalid_length(0, &"a single-entry map")),
                }
            }
            Value::Tag(_, inner) => inner.deserialize_enum(name, variants, visitor),
            other => Err(de::Error::invalid_type(
                other.unexpected(),
                &"a string or a single-entry map",
            )),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, CborError> for Value {
    type Deserializer = Value;

    fn into_deserializer(self) -> Value {
        self
    }
}

struct EnumDeserializer {
    variant: Value,
    value: Value,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = CborError;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantDeserializer), CborError> {
        let variant = seed.deserialize(self.variant)?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = CborError;

    fn unit_variant(self) -> Result<(), CborError> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(de::Error::invalid_type(other.unexpected(), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, CborError> {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, CborError> {
        match self.value {
            array @ Value::Array(_) => array.deserialize_any(visitor),
            other => Err(de::Error::invalid_type(other.unexpected(), &"tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CborError> {
        match self.value {
            map @ Value::Map(_) => map.deserialize_any(visitor),
            other => Err(de::Error::invalid_type(other.unexpected(), &"struct variant")),
        }
    }
}
