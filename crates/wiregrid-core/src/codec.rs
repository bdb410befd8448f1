//! Compact binary encoding for integer grids.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! "WGRD" | version: u8 | chunk size: u16 | chunk count: u32
//! per chunk: chunk x: u32 | chunk y: u32 | payload len: u32 | payload
//! ```
//!
//! Each payload is the raw-deflate compression of one chunk's `N * N` cells,
//! so every chunk can be inflated on its own.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::chunk::{Chunk, ChunkCoord, ChunkedGrid};
use crate::error::CodecError;

const MAGIC: &[u8; 4] = b"WGRD";
const VERSION: u8 = 1;

impl<const N: usize> ChunkedGrid<u32, N> {
    /// Encode every allocated chunk into the compact persisted form.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let chunks = self.sorted_chunks();

        let mut out = Vec::with_capacity(11 + chunks.len() * 64);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&(N as u16).to_le_bytes());
        out.extend_from_slice(&(chunks.len() as u32).to_le_bytes());

        for (coord, chunk) in chunks {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            for cell in chunk.cells() {
                encoder.write_all(&cell.to_le_bytes())?;
            }
            let payload = encoder.finish()?;

            out.extend_from_slice(&coord.x.to_le_bytes());
            out.extend_from_slice(&coord.y.to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&payload);
        }

        Ok(out)
    }

    /// Rebuild a grid from bytes produced by [`ChunkedGrid::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader { bytes };

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(CodecError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let size = reader.u16()? as usize;
        if size != N {
            return Err(CodecError::ChunkSizeMismatch {
                expected: N,
                found: size,
            });
        }

        let count = reader.u32()?;
        let expected = N * N * 4;
        let mut grid = Self::new();

        for _ in 0..count {
            let x = reader.u32()?;
            let y = reader.u32()?;
            let len = reader.u32()? as usize;
            let payload = reader.take(len)?;

            // A chunk origin must still be addressable as a cell position
            let limit = i32::MAX as u64 / N as u64;
            if u64::from(x) > limit || u64::from(y) > limit {
                return Err(CodecError::ChunkOutOfRange { x, y });
            }

            let mut raw = Vec::with_capacity(expected);
            DeflateDecoder::new(payload)
                .take(expected as u64 + 1)
                .read_to_end(&mut raw)?;
            let length_error = |found| CodecError::ChunkLength {
                x,
                y,
                expected,
                found,
            };
            if raw.len() != expected {
                return Err(length_error(raw.len()));
            }

            let cells: Vec<u32> = raw
                .chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            let chunk = Chunk::from_cells(cells).ok_or_else(|| length_error(raw.len()))?;
            grid.insert_chunk(ChunkCoord { x, y }, chunk);
        }

        Ok(grid)
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.bytes.len() < len {
            return Err(CodecError::Truncated);
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Serde adapter storing an integer grid as its encoded bytes.
///
/// Use with `#[serde(with = "wiregrid_core::codec::wire_grid_serde")]`.
pub mod wire_grid_serde {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    use crate::chunk::ChunkedGrid;

    pub fn serialize<S, const N: usize>(
        grid: &ChunkedGrid<u32, N>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = grid.encode().map_err(ser::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub fn deserialize<'de, D, const N: usize>(
        deserializer: D,
    ) -> Result<ChunkedGrid<u32, N>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        ChunkedGrid::decode(&bytes).map_err(de::Error::custom)
    }
}
