use crate::error::{CborError, Result};

/// Forward-only read position over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Looks at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek_u8().ok_or(CborError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    /// Reads exactly `N` bytes, failing without consuming anything if fewer remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or(CborError::UnexpectedEof)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        self.pos += N;
        Ok(buf)
    }

    /// Reads a payload whose length was declared by a header.
    pub fn take(&mut self, len: u64) -> Result<&'a [u8]> {
        let available = self.remaining();
        match usize::try_from(len) {
            Ok(n) if n <= available => {
                let bytes = &self.data[self.pos..self.pos + n];
                self.pos += n;
                Ok(bytes)
            }
            _ => Err(CborError::LengthMismatch {
                expected: len,
                available,
            }),
        }
    }
}
