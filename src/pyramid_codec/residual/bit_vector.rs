//! Append-only packed bit storage, most significant bit first within each byte.

use crate::pyramid_codec::common::error::{CodecError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitVector {
    bytes: Vec<u8>,
    len: usize,
}

impl BitVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already packed bits. `bytes` must hold exactly `ceil(len / 8)` bytes.
    pub fn from_bytes(bytes: Vec<u8>, len: usize) -> Result<Self> {
        if bytes.len() != byte_len(len) {
            return Err(CodecError::MalformedPayload(format!(
                "{} sign bytes cannot hold exactly {} bits",
                bytes.len(),
                len
            )));
        }
        Ok(Self { bytes, len })
    }

    pub fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some((self.bytes[index / 8] >> (7 - index % 8)) & 1 == 1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| (self.bytes[i / 8] >> (7 - i % 8)) & 1 == 1)
    }
}

/// Number of bytes needed to hold `bits` bits.
pub fn byte_len(bits: usize) -> usize {
    bits.div_ceil(8)
}
