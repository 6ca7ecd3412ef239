//! ORC compression streams.
//!
//! A compressed stream is a run of chunks, each prefixed by a 3-byte
//! little-endian header `(chunk_len << 1) | is_original`. Original chunks are
//! stored verbatim. With `NONE` the stream has no chunk headers at all.

use serde::Serialize;
use std::fmt;
use std::io::Read;

use crate::error::ProbeError;

/// Block size ORC writers use when the postscript does not declare one.
pub const DEFAULT_BLOCK_SIZE: u64 = 256 * 1024;

const CHUNK_HEADER_LEN: usize = 3;

/// Codec declared in the postscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Zlib,
    Snappy,
    Lzo,
    Lz4,
    Zstd,
    Brotli,
}

impl Compression {
    /// Map the postscript `CompressionKind` id; absent means `NONE`.
    pub fn from_proto(id: Option<i32>) -> Result<Self, ProbeError> {
        Ok(match id.unwrap_or(0) {
            0 => Compression::None,
            1 => Compression::Zlib,
            2 => Compression::Snappy,
            3 => Compression::Lzo,
            4 => Compression::Lz4,
            5 => Compression::Zstd,
            6 => Compression::Brotli,
            other => {
                return Err(ProbeError::corrupt(format!(
                    "unknown compression kind {}",
                    other
                )))
            }
        })
    }

    pub fn proto_id(&self) -> i32 {
        match self {
            Compression::None => 0,
            Compression::Zlib => 1,
            Compression::Snappy => 2,
            Compression::Lzo => 3,
            Compression::Lz4 => 4,
            Compression::Zstd => 5,
            Compression::Brotli => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Zlib => "zlib",
            Compression::Snappy => "snappy",
            Compression::Lzo => "lzo",
            Compression::Lz4 => "lz4",
            Compression::Zstd => "zstd",
            Compression::Brotli => "brotli",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Compression::None | Compression::Zlib | Compression::Snappy | Compression::Zstd
        )
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a whole compressed stream. `block_size` bounds every chunk's
/// decompressed size.
pub fn decompress(codec: Compression, block_size: u64, input: &[u8]) -> Result<Vec<u8>, ProbeError> {
    if codec == Compression::None {
        return Ok(input.to_vec());
    }
    if !codec.is_supported() {
        return Err(ProbeError::corrupt(format!(
            "unsupported compression codec {}",
            codec
        )));
    }
    let limit = usize::try_from(block_size)
        .map_err(|_| ProbeError::corrupt(format!("compression block size {} too large", block_size)))?;

    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos < input.len() {
        if input.len() - pos < CHUNK_HEADER_LEN {
            return Err(ProbeError::corrupt("truncated compression chunk header"));
        }
        let header = u32::from(input[pos])
            | (u32::from(input[pos + 1]) << 8)
            | (u32::from(input[pos + 2]) << 16);
        pos += CHUNK_HEADER_LEN;
        let is_original = header & 1 == 1;
        let len = (header >> 1) as usize;
        if len > input.len() - pos {
            return Err(ProbeError::corrupt(format!(
                "compression chunk of {} bytes overruns stream ({} left)",
                len,
                input.len() - pos
            )));
        }
        let chunk = &input[pos..pos + len];
        pos += len;
        if is_original {
            out.extend_from_slice(chunk);
        } else {
            decode_chunk(codec, chunk, limit, &mut out)?;
        }
    }
    Ok(out)
}

fn decode_chunk(codec: Compression, chunk: &[u8], limit: usize, out: &mut Vec<u8>) -> Result<(), ProbeError> {
    let corrupt = |e: &dyn fmt::Display| ProbeError::corrupt(format!("{} chunk: {}", codec, e));
    let decoded = match codec {
        Compression::Zlib => {
            let mut buf = Vec::new();
            flate2::read::DeflateDecoder::new(chunk)
                .take(limit as u64 + 1)
                .read_to_end(&mut buf)
                .map_err(|e| corrupt(&e))?;
            buf
        }
        Compression::Snappy => {
            let len = snap::raw::decompress_len(chunk).map_err(|e| corrupt(&e))?;
            if len > limit {
                return Err(ProbeError::corrupt(format!(
                    "snappy chunk expands to {} bytes, block size is {}",
                    len, limit
                )));
            }
            snap::raw::Decoder::new()
                .decompress_vec(chunk)
                .map_err(|e| corrupt(&e))?
        }
        Compression::Zstd => zstd::bulk::decompress(chunk, limit).map_err(|e| corrupt(&e))?,
        other => {
            return Err(ProbeError::corrupt(format!(
                "unsupported compression codec {}",
                other
            )))
        }
    };
    if decoded.len() > limit {
        return Err(ProbeError::corrupt(format!(
            "{} chunk expands past block size {}",
            codec, limit
        )));
    }
    out.extend_from_slice(&decoded);
    Ok(())
}

/// Encode a stream the way an ORC writer would. Used to build synthetic
/// trailers; chunks that do not shrink are stored as originals.
#[cfg(any(test, feature = "test-util"))]
pub fn compress(codec: Compression, block_size: u64, input: &[u8]) -> std::io::Result<Vec<u8>> {
    use std::io::Write;

    if codec == Compression::None {
        return Ok(input.to_vec());
    }
    let block = usize::try_from(block_size.max(1)).unwrap_or(usize::MAX);
    let mut out = Vec::new();
    for piece in input.chunks(block) {
        let packed = match codec {
            Compression::Zlib => {
                let mut enc =
                    flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(piece)?;
                enc.finish()?
            }
            Compression::Snappy => snap::raw::Encoder::new()
                .compress_vec(piece)
                .map_err(std::io::Error::other)?,
            Compression::Zstd => zstd::bulk::compress(piece, 3)?,
            other => {
                return Err(std::io::Error::other(format!(
                    "cannot encode {} streams",
                    other
                )))
            }
        };
        let (body, original) = if packed.len() < piece.len() {
            (packed.as_slice(), 0u32)
        } else {
            (piece, 1u32)
        };
        let header = ((body.len() as u32) << 1) | original;
        out.extend_from_slice(&header.to_le_bytes()[..CHUNK_HEADER_LEN]);
        out.extend_from_slice(body);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> Vec<u8> {
        (0u8..50).cycle().take(10_000).collect()
    }

    #[test]
    fn none_is_passthrough() {
        let data = sample();
        assert_eq!(decompress(Compression::None, 0, &data).unwrap(), data);
    }

    #[test]
    fn supported_codecs_decode_what_they_encode() {
        let data = sample();
        for codec in [Compression::Zlib, Compression::Snappy, Compression::Zstd] {
            let packed = compress(codec, 4096, &data).unwrap();
            assert!(packed.len() < data.len(), "{} should shrink repetitive input", codec);
            assert_eq!(decompress(codec, 4096, &packed).unwrap(), data, "{}", codec);
        }
    }

    #[test]
    fn original_chunks_are_copied() {
        let mut stream = vec![(3u32 << 1 | 1) as u8, 0, 0];
        stream.extend_from_slice(b"abc");
        assert_eq!(decompress(Compression::Zlib, 1024, &stream).unwrap(), b"abc");
    }

    #[test]
    fn unsupported_codec_is_corrupt_format() {
        let err = decompress(Compression::Lzo, 1024, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
        assert!(err.message.contains("unsupported"));
    }

    #[test]
    fn chunk_overrun_is_corrupt_format() {
        let stream = [(100u32 << 1) as u8, 0, 0, 1, 2];
        let err = decompress(Compression::Zstd, 1024, &stream).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
    }

    #[test]
    fn chunk_larger_than_block_size_is_rejected() {
        let data = vec![0u8; 8192];
        let packed = compress(Compression::Zstd, 8192, &data).unwrap();
        let err = decompress(Compression::Zstd, 1024, &packed).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
    }

    #[test]
    fn unknown_codec_id_is_rejected() {
        assert_eq!(Compression::from_proto(None).unwrap(), Compression::None);
        assert_eq!(Compression::from_proto(Some(5)).unwrap(), Compression::Zstd);
        assert!(Compression::from_proto(Some(42)).is_err());
    }
}
