//! Capabilities a type can implement to take over its own encoding.
//!
//! A type states which capabilities it has through [`Marshal`] (usually via
//! [`impl_marshal!`](crate::impl_marshal)). The encoder resolves them in a
//! fixed order:
//!
//! 1. [`EncodeCbor`]: pre-encoded CBOR, emitted verbatim
//! 2. [`MarshalCbor`]: pre-encoded CBOR, or an error that aborts the encode
//! 3. [`MarshalBinary`]: opaque bytes, emitted as a byte string
//! 4. [`MarshalText`]: text, emitted as a text string
//!
//! A type declaring none of them is reported as [`CborError::UnsupportedType`].

use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::error::{BoxError, CborError, Result};

/// Newtype-struct name the encoder recognizes as "write these bytes verbatim".
pub(crate) const RAW_TOKEN: &str = "@@CBOR_RAW@@";

/// Emits its own complete CBOR encoding.
pub trait EncodeCbor {
    fn encode_cbor(&self) -> Vec<u8>;
}

/// Emits its own CBOR encoding, or fails.
pub trait MarshalCbor {
    fn marshal_cbor(&self) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Produces an opaque binary form, carried as a CBOR byte string.
pub trait MarshalBinary {
    fn marshal_binary(&self) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Produces a textual form, carried as a CBOR text string.
pub trait MarshalText {
    fn marshal_text(&self) -> std::result::Result<String, BoxError>;
}

/// Declares which encoding capabilities a type satisfies.
pub trait Marshal {
    fn as_encode_cbor(&self) -> Option<&dyn EncodeCbor> {
        None
    }

    fn as_marshal_cbor(&self) -> Option<&dyn MarshalCbor> {
        None
    }

    fn as_marshal_binary(&self) -> Option<&dyn MarshalBinary> {
        None
    }

    fn as_marshal_text(&self) -> Option<&dyn MarshalText> {
        None
    }
}

/// Implements [`Marshal`] for a type from the list of capabilities it implements.
///
/// ```
/// use cbor_codec::marshal::MarshalText;
/// use cbor_codec::{impl_marshal, to_vec_marshaled};
///
/// struct Version(u8, u8);
///
/// impl MarshalText for Version {
///     fn marshal_text(&self) -> Result<String, cbor_codec::BoxError> {
///         Ok(format!("{}.{}", self.0, self.1))
///     }
/// }
///
/// impl_marshal!(Version: MarshalText);
///
/// assert_eq!(to_vec_marshaled(&Version(1, 2)).unwrap(), b"\x631.2");
/// ```
#[macro_export]
macro_rules! impl_marshal {
    (@accessor EncodeCbor) => {
        fn as_encode_cbor(&self) -> Option<&dyn $crate::marshal::EncodeCbor> {
            Some(self)
        }
    };
    (@accessor MarshalCbor) => {
        fn as_marshal_cbor(&self) -> Option<&dyn $crate::marshal::MarshalCbor> {
            Some(self)
        }
    };
    (@accessor MarshalBinary) => {
        fn as_marshal_binary(&self) -> Option<&dyn $crate::marshal::MarshalBinary> {
            Some(self)
        }
    };
    (@accessor MarshalText) => {
        fn as_marshal_text(&self) -> Option<&dyn $crate::marshal::MarshalText> {
            Some(self)
        }
    };
    ($ty:ty : $($cap:ident),+ $(,)?) => {
        impl $crate::marshal::Marshal for $ty {
            $($crate::impl_marshal!(@accessor $cap);)+
        }
    };
}

/// Output of the highest-priority capability a value offers.
#[derive(Debug, Clone, PartialEq)]
pub enum Marshaled {
    /// Complete CBOR, written as-is
    Raw(Vec<u8>),
    /// Payload of a byte string
    Bytes(Vec<u8>),
    /// Payload of a text string
    Text(String),
}

/// Resolves the capabilities of `value` in priority order.
pub fn resolve<T: Marshal + ?Sized>(value: &T) -> Result<Marshaled> {
    if let Some(encoder) = value.as_encode_cbor() {
        return Ok(Marshaled::Raw(encoder.encode_cbor()));
    }
    if let Some(marshaler) = value.as_marshal_cbor() {
        return marshaler
            .marshal_cbor()
            .map(Marshaled::Raw)
            .map_err(CborError::Marshal);
    }
    if let Some(marshaler) = value.as_marshal_binary() {
        return marshaler
            .marshal_binary()
            .map(Marshaled::Bytes)
            .map_err(CborError::Marshal);
    }
    if let Some(marshaler) = value.as_marshal_text() {
        return marshaler
            .marshal_text()
            .map(Marshaled::Text)
            .map_err(CborError::Marshal);
    }
    Err(CborError::UnsupportedType(
        std::any::type_name::<T>().to_string(),
    ))
}

impl Serialize for Marshaled {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Marshaled::Raw(raw) => {
                serializer.serialize_newtype_struct(RAW_TOKEN, serde_bytes::Bytes::new(raw))
            }
            Marshaled::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Marshaled::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Serde adapter for embedding a [`Marshal`] type in a serde-encoded structure.
///
/// Capability errors surface as custom serializer errors carrying the
/// original message; use [`crate::to_vec_marshaled`] to keep the error itself.
#[derive(Debug)]
pub struct AsCbor<'a, T: ?Sized>(pub &'a T);

impl<T: Marshal + ?Sized> Serialize for AsCbor<'_, T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        resolve(self.0)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// For `#[serde(serialize_with = "cbor_codec::marshal::serialize")]`.
pub fn serialize<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Marshal + ?Sized,
    S: Serializer,
{
    AsCbor(value).serialize(serializer)
}
