//! Residual byte stream, escape table and their serialized payload.
//!
//! Payload layout, integers little-endian:
//!
//! ```text
//! escape_count : u32
//! offsets      : escape_count x u32   (byte offsets into the residual stream)
//! signs        : ceil(escape_count / 8) bytes, MSB first, 1 = negative
//! residuals    : one byte per pixel, all levels, finest level first
//! ```
//!
//! A residual `d` in `-128..=127` is stored as `d + 128`. Anything else is an
//! escape: the stream holds `|d|`, its offset goes to the escape table and its
//! sign to the sign bits.

use tracing::trace;

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::residual::bit_vector::{BitVector, byte_len};

pub const RESIDUAL_BIAS: i16 = 128;

const COUNT_LEN: usize = 4;
const OFFSET_LEN: usize = 4;

/// Accumulates residuals during a pyramid build.
#[derive(Debug, Default)]
pub struct ResidualEncoder {
    stream: Vec<u8>,
    escapes: Vec<u32>,
    signs: BitVector,
}

impl ResidualEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one residual. Only `-255..=255` can occur between 8-bit planes.
    pub fn push(&mut self, residual: i16) -> Result<()> {
        let biased = residual + RESIDUAL_BIAS;
        if (0..=255).contains(&biased) {
            self.stream.push(biased as u8);
            return Ok(());
        }

        let magnitude = u8::try_from(residual.unsigned_abs()).map_err(|_| {
            CodecError::MalformedPayload(format!("residual {residual} exceeds one byte"))
        })?;
        let offset = u32::try_from(self.stream.len())
            .map_err(|_| CodecError::PayloadTooLarge(self.stream.len()))?;

        trace!(offset, residual, "escaping residual");
        self.escapes.push(offset);
        self.signs.push(residual < 0);
        self.stream.push(magnitude);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    pub fn escape_count(&self) -> usize {
        self.escapes.len()
    }

    pub fn into_payload(self) -> Result<Vec<u8>> {
        let count = u32::try_from(self.escapes.len())
            .map_err(|_| CodecError::PayloadTooLarge(self.escapes.len()))?;

        let mut payload = Vec::with_capacity(
            COUNT_LEN
                + self.escapes.len() * OFFSET_LEN
                + self.signs.as_bytes().len()
                + self.stream.len(),
        );
        payload.extend_from_slice(&count.to_le_bytes());
        for offset in &self.escapes {
            payload.extend_from_slice(&offset.to_le_bytes());
        }
        payload.extend_from_slice(self.signs.as_bytes());
        payload.extend_from_slice(&self.stream);
        Ok(payload)
    }
}

/// A parsed payload, borrowing its residual stream.
#[derive(Debug)]
pub struct ResidualPayload<'a> {
    escapes: Vec<u32>,
    signs: BitVector,
    stream: &'a [u8],
}

impl<'a> ResidualPayload<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let (count, rest) = bytes
            .split_first_chunk::<COUNT_LEN>()
            .ok_or_else(|| malformed("missing escape count".to_string()))?;
        let count = u32::from_le_bytes(*count) as usize;

        let table_len = count
            .checked_mul(OFFSET_LEN)
            .filter(|&len| len <= rest.len())
            .ok_or_else(|| malformed(format!("escape table of {count} entries is truncated")))?;
        let (table, rest) = rest.split_at(table_len);

        let sign_len = byte_len(count);
        if sign_len > rest.len() {
            return Err(malformed(format!("sign bits for {count} escapes are truncated")));
        }
        let (sign_bytes, stream) = rest.split_at(sign_len);

        let escapes: Vec<u32> = table
            .chunks_exact(OFFSET_LEN)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        if let Some(bad) = escapes.iter().find(|&&offset| offset as usize >= stream.len()) {
            return Err(malformed(format!(
                "escape offset {bad} outside residual stream of {} bytes",
                stream.len()
            )));
        }
        // Offsets are written in stream order, one per escaped byte.
        if let Some(pair) = escapes.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(malformed(format!(
                "escape offsets not strictly increasing: {} then {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self {
            escapes,
            signs: BitVector::from_bytes(sign_bytes.to_vec(), count)?,
            stream,
        })
    }

    pub fn escape_count(&self) -> usize {
        self.escapes.len()
    }

    pub fn stream_len(&self) -> usize {
        self.stream.len()
    }

    /// Signed residuals in stream order.
    pub fn decode(&self) -> Vec<i16> {
        let mut residuals: Vec<i16> = self
            .stream
            .iter()
            .map(|&byte| i16::from(byte) - RESIDUAL_BIAS)
            .collect();

        for (&offset, negative) in self.escapes.iter().zip(self.signs.iter()) {
            let slot = &mut residuals[offset as usize];
            *slot += RESIDUAL_BIAS;
            if negative {
                *slot = -*slot;
            }
        }
        residuals
    }
}

fn malformed(message: String) -> CodecError {
    CodecError::MalformedPayload(message)
}
