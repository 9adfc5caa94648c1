//! Tag support (major type 6): the `Tagged` encode wrapper, the registry of
//! decode-time transforms and a few standard tag helpers.
//!
//! # Registry discipline
//! A [`TagRegistry`] is populated once and then only read. The process-wide
//! registry used by [`crate::decode`] and [`crate::Decoder::new`] is swapped
//! copy-on-write, so a decoder keeps the snapshot it started with; tags should
//! still be registered during initialization, before any decode relies on them.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::decoder::Decoder;
use crate::error::{BoxError, CborError, Result};
use crate::value::Value;
use crate::{Encoder, MAJOR_TAG};

// Standard CBOR tags (RFC 7049)
pub const TAG_DATETIME_STRING: u64 = 0; // Standard date/time string (RFC 3339)
pub const TAG_EPOCH_DATETIME: u64 = 1; // Epoch-based date/time
pub const TAG_POSITIVE_BIGNUM: u64 = 2; // Positive bignum
pub const TAG_NEGATIVE_BIGNUM: u64 = 3; // Negative bignum
pub const TAG_URI: u64 = 32; // URI (RFC 3986)
pub const TAG_BASE64URL: u64 = 33; // Base64url-encoded text
pub const TAG_BASE64: u64 = 34; // Base64-encoded text

/// Newtype-struct name the encoder recognizes as "emit a tag header, then the value".
pub(crate) const TAGGED_TOKEN: &str = "@@CBOR_TAGGED@@";

/// A tagged CBOR value
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    /// The CBOR tag number (optional for compatibility)
    pub tag: Option<u64>,
    /// The tagged value
    pub value: T,
}

impl<T> Tagged<T> {
    /// Create a new tagged value
    pub fn new(tag: Option<u64>, value: T) -> Self {
        Tagged { tag, value }
    }
}

impl<T: Serialize> Serialize for Tagged<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.tag {
            // Other serializers see a plain `[tag, value]` pair.
            Some(tag) => serializer.serialize_newtype_struct(TAGGED_TOKEN, &(tag, &self.value)),
            None => self.value.serialize(serializer),
        }
    }
}

impl<T: de::DeserializeOwned> Tagged<T> {
    /// Decodes a single item, capturing its outermost tag number if it has one.
    ///
    /// Registered transforms are not applied to the outer tag.
    pub fn from_tagged_slice(slice: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(slice);
        let tag = match decoder.peek_major() {
            Some(MAJOR_TAG) => Some(decoder.read_tag()?),
            Some(_) => None,
            None => return Err(CborError::UnexpectedEof),
        };
        let value = match decoder.decode()? {
            Some(value) => value,
            None => return Err(CborError::StandaloneTag(tag.unwrap_or_default())),
        };
        Ok(Tagged {
            tag,
            value: T::deserialize(value)?,
        })
    }
}

// Handles both tagged CBOR values and plain values (e.g., from JSON)
impl<'de, T> Deserialize<'de> for Tagged<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TaggedVisitor<T> {
            marker: PhantomData<T>,
        }

        impl<'de, T> Visitor<'de> for TaggedVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = Tagged<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a tagged value or a plain value")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::BoolDeserializer::new(v)).map(untagged)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::I64Deserializer::new(v)).map(untagged)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::U64Deserializer::new(v)).map(untagged)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::F64Deserializer::new(v)).map(untagged)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::StrDeserializer::new(v)).map(untagged)
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::StringDeserializer::new(v)).map(untagged)
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::BytesDeserializer::new(v)).map(untagged)
            }

            fn visit_byte_buf<E: de::Error>(
                self,
                v: Vec<u8>,
            ) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::BytesDeserializer::new(&v)).map(untagged)
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Tagged<T>, E> {
                T::deserialize(de::value::UnitDeserializer::new()).map(untagged)
            }

            fn visit_seq<A>(self, seq: A) -> std::result::Result<Tagged<T>, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                T::deserialize(de::value::SeqAccessDeserializer::new(seq)).map(untagged)
            }

            fn visit_map<A>(self, map: A) -> std::result::Result<Tagged<T>, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                #[derive(Deserialize)]
                struct TaggedHelper<T> {
                    tag: Option<u64>,
                    value: T,
                }

                TaggedHelper::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(|helper| Tagged {
                        tag: helper.tag,
                        value: helper.value,
                    })
                    .map_err(|_| de::Error::custom("expected tagged value structure or plain value"))
            }
        }

        deserializer.deserialize_any(TaggedVisitor {
            marker: PhantomData,
        })
    }
}

fn untagged<T>(value: T) -> Tagged<T> {
    Tagged { tag: None, value }
}

/// Decode-time transform applied to the item following a registered tag.
pub type TagTransform = dyn Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync;

/// Mapping from tag number to the transform interpreting it.
///
/// Tags without a transform decode to their inner item unchanged.
#[derive(Clone, Default)]
pub struct TagRegistry {
    transforms: HashMap<u64, Arc<TagTransform>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `transform` for `tag`, replacing any previous one.
    pub fn register<F>(&mut self, tag: u64, transform: F) -> &mut Self
    where
        F: Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        if self.transforms.insert(tag, Arc::new(transform)).is_some() {
            tracing::debug!(tag, "replaced tag transform");
        } else {
            tracing::debug!(tag, "registered tag transform");
        }
        self
    }

    /// Removes the transform for `tag`, returning whether one was registered.
    pub fn unregister(&mut self, tag: u64) -> bool {
        self.transforms.remove(&tag).is_some()
    }

    pub fn contains(&self, tag: u64) -> bool {
        self.transforms.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub(crate) fn apply(&self, tag: u64, value: Value) -> Result<Value> {
        match self.transforms.get(&tag) {
            Some(transform) => {
                tracing::trace!(tag, "applying tag transform");
                transform(value).map_err(|source| CborError::TagTransform { tag, source })
            }
            None => {
                tracing::trace!(tag, "no transform registered, passing inner item through");
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.transforms.keys().collect();
        tags.sort();
        f.debug_struct("TagRegistry").field("tags", &tags).finish()
    }
}

static GLOBAL_REGISTRY: LazyLock<RwLock<Arc<TagRegistry>>> =
    LazyLock::new(|| RwLock::new(Arc::new(TagRegistry::new())));

/// Snapshot of the process-wide registry.
pub fn global_registry() -> Arc<TagRegistry> {
    GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Registers a transform in the process-wide registry.
///
/// Decoders already running keep the registry they started with.
pub fn register_tag<F>(tag: u64, transform: F)
where
    F: Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
{
    let mut guard = GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::make_mut(&mut guard).register(tag, transform);
}

/// Removes a transform from the process-wide registry.
pub fn unregister_tag(tag: u64) -> bool {
    let mut guard = GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::make_mut(&mut guard).unregister(tag)
}

/// Ready-made transforms for [`TagRegistry::register`].
pub mod transforms {
    use super::*;

    /// Keeps the tag in the decoded tree as [`Value::Tag`].
    pub fn preserve(
        tag: u64,
    ) -> impl Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static {
        move |value| Ok(Value::Tag(tag, Box::new(value)))
    }

    /// Tag 2: big-endian magnitude narrowed to an unsigned integer.
    pub fn positive_bignum(value: Value) -> std::result::Result<Value, BoxError> {
        Ok(Value::Unsigned(bignum_magnitude(&value)?))
    }

    /// Tag 3: `-1 - n` for a big-endian magnitude `n`, narrowed to a negative integer.
    pub fn negative_bignum(value: Value) -> std::result::Result<Value, BoxError> {
        let n = bignum_magnitude(&value)?;
        if n > i64::MAX as u64 {
            return Err(CborError::IntegerOverflow(n).into());
        }
        Ok(Value::Negative(-1 - n as i64))
    }

    fn bignum_magnitude(value: &Value) -> std::result::Result<u64, BoxError> {
        let bytes = value
            .as_bytes()
            .ok_or("bignum content must be a byte string")?;
        let significant = match bytes.iter().position(|&b| b != 0) {
            Some(start) => &bytes[start..],
            None => &[],
        };
        if significant.len() > 8 {
            return Err("bignum does not fit in 64 bits".into());
        }
        Ok(significant
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }
}

// Tagged value helpers
/// Encode a tagged value (tag number + content)
pub fn encode_tagged<W: Write, T: Serialize>(writer: &mut W, tag: u64, value: &T) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encoder.write_tag(tag)?;
    encoder.encode(value)?;
    Ok(())
}

/// Helper to encode a date/time string (tag 0)
pub fn encode_datetime_string<W: Write>(writer: &mut W, datetime: &str) -> Result<()> {
    encode_tagged(writer, TAG_DATETIME_STRING, &datetime)
}

/// Helper to encode an epoch timestamp (tag 1)
pub fn encode_epoch_datetime<W: Write>(writer: &mut W, epoch: i64) -> Result<()> {
    encode_tagged(writer, TAG_EPOCH_DATETIME, &epoch)
}

/// Helper to encode a URI (tag 32)
pub fn encode_uri<W: Write>(writer: &mut W, uri: &str) -> Result<()> {
    encode_tagged(writer, TAG_URI, &uri)
}

/// Helper to encode base64url data (tag 33)
pub fn encode_base64url<W: Write>(writer: &mut W, data: &str) -> Result<()> {
    encode_tagged(writer, TAG_BASE64URL, &data)
}

/// Helper to encode base64 data (tag 34)
pub fn encode_base64<W: Write>(writer: &mut W, data: &str) -> Result<()> {
    encode_tagged(writer, TAG_BASE64, &data)
}
