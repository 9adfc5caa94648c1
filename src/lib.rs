//! # CBOR Codec
//!
//! A CBOR (Concise Binary Object Representation, RFC 7049) encoder/decoder
//! built on serde.
//!
//! ## Features
//! - All eight major types, with minimal-width integer and length headers
//! - Definite and indefinite-length strings, arrays and maps on decode
//! - Half, single and double precision floats on decode; floats always
//!   encode as double precision
//! - Structs encode as indefinite-length maps keyed by field name, honoring
//!   `#[serde(rename)]` and `#[serde(skip)]`
//! - Tags (major type 6), interpreted on decode through a [`TagRegistry`]:
//!   - Date/time strings (tag 0)
//!   - Epoch timestamps (tag 1)
//!   - Bignums (tags 2 and 3), see [`tags::transforms`]
//!   - URIs (tag 32)
//!   - Base64url and base64 text (tags 33 and 34)
//! - Types can take over their own encoding through the capability traits in
//!   [`marshal`]
//!
//! ## Byte strings
//! `Vec<u8>` and `[u8]` are sequences to serde and encode as CBOR arrays.
//! Use `serde_bytes::ByteBuf` or `#[serde(with = "serde_bytes")]` to get a
//! byte string.
//!
//! ## Example
//! ```rust
//! use cbor_codec::{Value, decode, encode_uri, from_slice, to_vec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Person {
//!     #[serde(rename = "Name")]
//!     name: String,
//!     #[serde(rename = "Age")]
//!     age: u32,
//! }
//!
//! let person = Person { name: "Ann".to_string(), age: 30 };
//! let bytes = to_vec(&person).unwrap();
//! assert_eq!(from_slice::<Person>(&bytes).unwrap(), person);
//!
//! let value = decode(&bytes).unwrap().unwrap();
//! assert_eq!(value.get("Age"), Some(&Value::Unsigned(30)));
//!
//! // Encode a URI with tag 32
//! let mut buf = Vec::new();
//! encode_uri(&mut buf, "https://example.com").unwrap();
//! let decoded: String = from_slice(&buf).unwrap();
//! assert_eq!(decoded, "https://example.com");
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::sync::Arc;

// CBOR major types
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

// Simple values
pub(crate) const FALSE: u8 = 20;
pub(crate) const TRUE: u8 = 21;
pub(crate) const NULL: u8 = 22;
pub(crate) const UNDEFINED: u8 = 23;

/// Terminates an indefinite-length item
pub(crate) const BREAK: u8 = 0xff;

pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod int;
pub mod marshal;
pub mod tags;
pub mod value;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{BoxError, CborError, Result};
pub use marshal::{EncodeCbor, Marshal, MarshalBinary, MarshalCbor, MarshalText};
pub use tags::{
    TagRegistry, Tagged, encode_base64, encode_base64url, encode_datetime_string,
    encode_epoch_datetime, encode_tagged, encode_uri, global_registry, register_tag,
    unregister_tag,
};
pub use value::Value;

/// Serializes `value` into a new buffer.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(&mut buf, value)?;
    Ok(buf)
}

/// Serializes `value` into `writer`.
pub fn to_writer<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encoder.encode(value)
}

/// Encodes a type through its highest-priority [`Marshal`] capability.
///
/// Capability errors are returned unchanged as [`CborError::Marshal`].
pub fn to_vec_marshaled<T: Marshal + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf);
    encoder.marshal(value)?;
    Ok(buf)
}

/// Decodes the first item of `bytes` using the process-wide tag registry.
///
/// Returns `Ok(None)` for empty input. Bytes after the first item are ignored;
/// use [`Decoder`] to read a sequence of items.
pub fn decode(bytes: &[u8]) -> Result<Option<Value>> {
    Decoder::new(bytes).decode()
}

/// Like [`decode`], with an explicit tag registry.
pub fn decode_with(bytes: &[u8], tags: Arc<TagRegistry>) -> Result<Option<Value>> {
    Decoder::with_registry(bytes, tags).decode()
}

/// Decodes the first item of `slice` into `T`.
pub fn from_slice<T: DeserializeOwned>(slice: &[u8]) -> Result<T> {
    let value = decode(slice)?.ok_or(CborError::UnexpectedEof)?;
    T::deserialize(value)
}
