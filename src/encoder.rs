use serde::Serialize;
use std::io::Write;

use crate::error::{CborError, Result};
use crate::int::Header;
use crate::marshal::{self, Marshal, Marshaled, RAW_TOKEN};
use crate::tags::TAGGED_TOKEN;
use crate::{
    BREAK, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG,
    MAJOR_TEXT, MAJOR_UNSIGNED, NULL, TRUE,
};

const INDEFINITE: u8 = 31;
const FLOAT64: u8 = 27;

/// What the next primitive written belongs to, set by the marker newtype structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    /// `(tag, value)` tuple follows: no array header
    TaggedTuple,
    /// next `u64` is a tag number
    TagNumber,
    /// next byte string is pre-encoded CBOR
    Raw,
}

// Encoder
pub struct Encoder<W: Write> {
    writer: W,
    pending: Pending,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder {
            writer,
            pending: Pending::None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_type_value(&mut self, major: u8, value: u64) -> Result<()> {
        self.writer.write_all(Header::new(major, value).as_bytes())?;
        Ok(())
    }

    fn write_indefinite(&mut self, major: u8) -> Result<()> {
        self.writer.write_all(&[(major << 5) | INDEFINITE])?;
        Ok(())
    }

    fn take_pending(&mut self) -> Pending {
        std::mem::replace(&mut self.pending, Pending::None)
    }

    pub fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.write_type_value(MAJOR_TAG, tag)
    }

    /// Writes pre-encoded CBOR verbatim.
    pub fn write_raw(&mut self, raw: &[u8]) -> Result<()> {
        self.writer.write_all(raw)?;
        Ok(())
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self)
    }

    /// Encodes a value through its declared capabilities.
    ///
    /// Errors from the value's own marshaler are returned unchanged inside
    /// [`CborError::Marshal`].
    pub fn marshal<T: Marshal + ?Sized>(&mut self, value: &T) -> Result<()> {
        match marshal::resolve(value)? {
            Marshaled::Raw(raw) => self.write_raw(&raw),
            Marshaled::Bytes(bytes) => self.write_bytes(&bytes),
            Marshaled::Text(text) => self.write_text(&text),
        }
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.write_type_value(MAJOR_BYTES, v.len() as u64)?;
        self.writer.write_all(v)?;
        Ok(())
    }

    fn write_text(&mut self, v: &str) -> Result<()> {
        self.write_type_value(MAJOR_TEXT, v.len() as u64)?;
        self.writer.write_all(v.as_bytes())?;
        Ok(())
    }

    fn begin_map(&mut self, len: Option<usize>) -> Result<Compound<'_, W>> {
        match len {
            Some(len) => self.write_type_value(MAJOR_MAP, len as u64)?,
            None => self.write_indefinite(MAJOR_MAP)?,
        }
        Ok(Compound {
            enc: self,
            indefinite: len.is_none(),
        })
    }
}

/// Serializer state for arrays and maps; closes indefinite ones with a break.
pub struct Compound<'a, W: Write> {
    enc: &'a mut Encoder<W>,
    indefinite: bool,
}

impl<W: Write> Compound<'_, W> {
    fn finish(self) -> Result<()> {
        if self.indefinite {
            self.enc.writer.write_all(&[BREAK])?;
        }
        Ok(())
    }
}

impl<'a, W: Write> serde::Serializer for &'a mut Encoder<W> {
    type Ok = ();
    type Error = CborError;
    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = Compound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        let val = if v { TRUE } else { FALSE };
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | val])?;
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        if v >= 0 {
            self.write_type_value(MAJOR_UNSIGNED, v as u64)
        } else {
            self.write_type_value(MAJOR_NEGATIVE, (-1 - v) as u64)
        }
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        // Major types 0 and 1 together cover -2^64..2^64
        let (major, arg) = if v >= 0 {
            (MAJOR_UNSIGNED, u64::try_from(v))
        } else {
            (MAJOR_NEGATIVE, u64::try_from(-1 - v))
        };
        match arg {
            Ok(arg) => self.write_type_value(major, arg),
            Err(_) => Err(CborError::UnsupportedType(format!("i128 value {}", v))),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        let major = match self.take_pending() {
            Pending::TagNumber => MAJOR_TAG,
            _ => MAJOR_UNSIGNED,
        };
        self.write_type_value(major, v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        match u64::try_from(v) {
            Ok(v) => self.serialize_u64(v),
            Err(_) => Err(CborError::UnsupportedType(format!("u128 value {}", v))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | FLOAT64])?;
        self.writer.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_text(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        match self.take_pending() {
            Pending::Raw => self.write_raw(v),
            _ => self.write_bytes(v),
        }
    }

    fn serialize_none(self) -> Result<()> {
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | NULL])?;
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        match name {
            TAGGED_TOKEN => self.pending = Pending::TaggedTuple,
            RAW_TOKEN => self.pending = Pending::Raw,
            _ => {}
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.write_type_value(MAJOR_MAP, 1)?;
        variant.serialize(&mut *self)?;
        value.serialize(self)?;
        Ok(())
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        match len {
            Some(len) => self.write_type_value(MAJOR_ARRAY, len as u64)?,
            None => self.write_indefinite(MAJOR_ARRAY)?,
        }
        Ok(Compound {
            enc: self,
            indefinite: len.is_none(),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        if self.pending == Pending::TaggedTuple {
            self.pending = Pending::TagNumber;
            return Ok(Compound {
                enc: self,
                indefinite: false,
            });
        }
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.write_type_value(MAJOR_MAP, 1)?;
        variant.serialize(&mut *self)?;
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        self.begin_map(len)
    }

    // Structs are always indefinite-length maps: skipped fields make the
    // declared field count unreliable.
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.begin_map(None)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.write_type_value(MAJOR_MAP, 1)?;
        variant.serialize(&mut *self)?;
        self.begin_map(None)
    }
}

impl<W: Write> serde::ser::SerializeSeq for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Write> serde::ser::SerializeTuple for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Write> serde::ser::SerializeTupleStruct for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Write> serde::ser::SerializeTupleVariant for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Write> serde::ser::SerializeMap for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut *self.enc)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Write> serde::ser::SerializeStruct for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.enc.write_text(key)?;
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Write> serde::ser::SerializeStructVariant for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.enc.write_text(key)?;
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}
