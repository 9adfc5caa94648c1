use std::sync::Arc;

use crate::cursor::Cursor;
use crate::error::{CborError, Result};
use crate::int::{decode_signed, decode_unsigned};
use crate::tags::{TagRegistry, global_registry};
use crate::value::{MapBuilder, Value};
use crate::{
    BREAK, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_UNSIGNED, NULL, TRUE, UNDEFINED,
};

const INDEFINITE: u8 = 31;
const SIMPLE_EXTENDED: u8 = 24;
const FLOAT16: u8 = 25;
const FLOAT32: u8 = 26;
const FLOAT64: u8 = 27;

/// Decodes CBOR items from an in-memory buffer into [`Value`] trees.
///
/// Tags are interpreted through the decoder's [`TagRegistry`]. Every error
/// aborts the current item; nothing partially decoded is returned.
pub struct Decoder<'a> {
    cursor: Cursor<'a>,
    tags: Arc<TagRegistry>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder using a snapshot of the process-wide tag registry.
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_registry(input, global_registry())
    }

    pub fn with_registry(input: &'a [u8], tags: Arc<TagRegistry>) -> Self {
        Decoder {
            cursor: Cursor::new(input),
            tags,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Major type of the next item, if any input is left.
    pub fn peek_major(&self) -> Option<u8> {
        self.cursor.peek_u8().map(|b| b >> 5)
    }

    /// Decodes the next item, or returns `None` once the input is exhausted.
    pub fn decode(&mut self) -> Result<Option<Value>> {
        if self.cursor.is_empty() {
            return Ok(None);
        }
        let initial = self.cursor.read_u8()?;
        self.decode_item(initial).map(Some)
    }

    /// Reads a tag header without its content.
    pub fn read_tag(&mut self) -> Result<u64> {
        let initial = self.cursor.read_u8()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        if major != MAJOR_TAG {
            return Err(CborError::ExpectedTag { major });
        }

        decode_unsigned(info, &mut self.cursor)
    }

    fn decode_item(&mut self, initial: u8) -> Result<Value> {
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            MAJOR_UNSIGNED => Ok(Value::Unsigned(decode_unsigned(info, &mut self.cursor)?)),
            MAJOR_NEGATIVE => Ok(Value::Negative(decode_signed(info, &mut self.cursor)?)),
            MAJOR_BYTES => self.decode_bytes(info).map(Value::Bytes),
            MAJOR_TEXT => self.decode_text(info).map(Value::Text),
            MAJOR_ARRAY => self.decode_array(info),
            MAJOR_MAP => self.decode_map(info),
            MAJOR_TAG => self.decode_tag(info),
            _ => self.decode_simple(info),
        }
    }

    /// Reads the next item inside a container, `None` on a break byte.
    fn decode_element(&mut self) -> Result<Option<Value>> {
        match self.cursor.read_u8()? {
            BREAK => Ok(None),
            initial => self.decode_item(initial).map(Some),
        }
    }

    fn decode_bytes(&mut self, info: u8) -> Result<Vec<u8>> {
        if info == INDEFINITE {
            let mut out = Vec::new();
            while let Some(chunk_info) = self.next_chunk(MAJOR_BYTES)? {
                out.extend_from_slice(self.definite_payload(chunk_info)?);
            }
            return Ok(out);
        }
        Ok(self.definite_payload(info)?.to_vec())
    }

    fn decode_text(&mut self, info: u8) -> Result<String> {
        if info == INDEFINITE {
            let mut out = String::new();
            while let Some(chunk_info) = self.next_chunk(MAJOR_TEXT)? {
                out.push_str(utf8(self.definite_payload(chunk_info)?)?);
            }
            return Ok(out);
        }
        Ok(utf8(self.definite_payload(info)?)?.to_owned())
    }

    /// Reads the header of the next chunk of an indefinite-length string.
    ///
    /// Chunks must be definite-length strings of the enclosing major type.
    fn next_chunk(&mut self, major: u8) -> Result<Option<u8>> {
        let initial = self.cursor.read_u8()?;
        if initial == BREAK {
            return Ok(None);
        }
        let (chunk_major, info) = (initial >> 5, initial & 0x1f);
        if chunk_major != major || info == INDEFINITE {
            return Err(CborError::InvalidChunk {
                major: chunk_major,
                info,
            });
        }
        Ok(Some(info))
    }

    fn definite_payload(&mut self, info: u8) -> Result<&'a [u8]> {
        let len = decode_unsigned(info, &mut self.cursor)?;
        self.cursor.take(len)
    }

    fn decode_array(&mut self, info: u8) -> Result<Value> {
        if info == INDEFINITE {
            let mut out = Vec::new();
            while let Some(item) = self.decode_element()? {
                out.push(item);
            }
            return Ok(Value::Array(out));
        }

        let len = decode_unsigned(info, &mut self.cursor)?;
        // Every element takes at least one byte, so cap the preallocation
        let mut out = Vec::with_capacity(len.min(self.cursor.remaining() as u64) as usize);
        for i in 0..len {
            let item = self.definite_element(len, i)?;
            out.push(item);
        }
        Ok(Value::Array(out))
    }

    fn decode_map(&mut self, info: u8) -> Result<Value> {
        let mut map = MapBuilder::new();
        if info == INDEFINITE {
            while let Some(key) = self.decode_element()? {
                let initial = self.cursor.read_u8()?;
                let value = self.decode_item(initial)?;
                map.insert(key, value)?;
            }
            return Ok(map.finish());
        }

        let len = decode_unsigned(info, &mut self.cursor)?;
        for i in 0..len {
            let key = self.definite_element(len, i)?;
            let value = self.definite_element(len, i)?;
            map.insert(key, value)?;
        }
        Ok(map.finish())
    }

    /// Decodes element `index` of a definite container of `len` elements.
    fn definite_element(&mut self, len: u64, index: u64) -> Result<Value> {
        let initial = self
            .cursor
            .read_u8()
            .map_err(|e| match e {
                CborError::UnexpectedEof => CborError::TruncatedContainer {
                    expected: len,
                    missing: len - index,
                },
                other => other,
            })?;
        self.decode_item(initial)
    }

    fn decode_tag(&mut self, info: u8) -> Result<Value> {
        let tag = decode_unsigned(info, &mut self.cursor)?;
        let initial = self
            .cursor
            .read_u8()
            .map_err(|e| match e {
                CborError::UnexpectedEof => CborError::StandaloneTag(tag),
                other => other,
            })?;
        let inner = self.decode_item(initial)?;
        self.tags.apply(tag, inner)
    }

    fn decode_simple(&mut self, info: u8) -> Result<Value> {
        match info {
            FALSE => Ok(Value::Bool(false)),
            TRUE => Ok(Value::Bool(true)),
            NULL | UNDEFINED => Ok(Value::Null),
            // No simple values are assigned in the one-byte extension range
            SIMPLE_EXTENDED => Err(CborError::UnassignedSimple(self.cursor.read_u8()?)),
            FLOAT16 => {
                let bits = u16::from_be_bytes(self.cursor.read_array()?);
                Ok(Value::Float(half::f16::from_bits(bits).to_f64()))
            }
            FLOAT32 => {
                let bits = u32::from_be_bytes(self.cursor.read_array()?);
                Ok(Value::Float(f32::from_bits(bits) as f64))
            }
            FLOAT64 => {
                let bits = u64::from_be_bytes(self.cursor.read_array()?);
                Ok(Value::Float(f64::from_bits(bits)))
            }
            28..=30 => Err(CborError::InvalidAdditionalInfo(info)),
            INDEFINITE => Err(CborError::UnexpectedBreak),
            _ => Err(CborError::UnassignedSimple(info)),
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| CborError::InvalidUtf8)
}
