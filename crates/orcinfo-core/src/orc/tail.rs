//! Decoding of the ORC file tail: postscript length byte, postscript and footer.
//!
//! The helpers here work on byte slices so both trailer tiers share them; the
//! range tier decides which bytes to fetch, [`read_tail`] reads through a
//! seekable handle.

use prost::Message;
use std::io::{Read, Seek, SeekFrom};

use super::compression::{self, Compression, DEFAULT_BLOCK_SIZE};
use super::proto::{Footer, PostScript};
use crate::error::ProbeError;

/// Magic string at the start of the file and in the postscript.
pub const ORC_MAGIC: &str = "ORC";

/// Smallest file that can hold a trailer: header magic, one postscript byte,
/// and the postscript length byte.
pub const MIN_FILE_LEN: u64 = ORC_MAGIC.len() as u64 + 2;

/// Fully decoded tail of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTail {
    pub file_length: u64,
    pub postscript_length: u64,
    pub postscript: PostScript,
    pub footer: Footer,
    pub compression: Compression,
}

impl FileTail {
    /// Raw (uncompressed) data size: the footer's `contentLength` when
    /// present, otherwise the sum of per-column `bytesOnDisk`.
    pub fn raw_data_size(&self) -> Option<u64> {
        if let Some(len) = self.footer.content_length {
            return Some(len);
        }
        let mut seen = false;
        let mut total = 0u64;
        for stats in &self.footer.statistics {
            if let Some(bytes) = stats.bytes_on_disk {
                seen = true;
                total = total.saturating_add(bytes);
            }
        }
        seen.then_some(total)
    }

    pub fn stripe_count(&self) -> Result<u32, ProbeError> {
        u32::try_from(self.footer.stripes.len()).map_err(|_| {
            ProbeError::corrupt(format!("{} stripes overflow u32", self.footer.stripes.len()))
        })
    }

    /// Offset of the first footer byte.
    pub fn footer_offset(&self) -> u64 {
        self.file_length - 1 - self.postscript_length - self.postscript.footer_length.unwrap_or(0)
    }

    pub fn block_size(&self) -> u64 {
        effective_block_size(&self.postscript)
    }
}

/// Interpret the final byte of the file. Zero is never valid.
pub fn postscript_length(last_byte: u8, file_length: u64) -> Result<u64, ProbeError> {
    let len = u64::from(last_byte);
    if len == 0 {
        return Err(ProbeError::corrupt("postscript length is zero"));
    }
    if len + 1 > file_length {
        return Err(ProbeError::corrupt(format!(
            "postscript length {} exceeds file length {}",
            len, file_length
        )));
    }
    Ok(len)
}

/// Decode and validate the postscript, returning it with its codec.
///
/// `bytes` must be exactly the postscript (without the trailing length byte).
pub fn decode_postscript(
    bytes: &[u8],
    file_length: u64,
) -> Result<(PostScript, Compression), ProbeError> {
    let postscript = PostScript::decode(bytes)
        .map_err(|e| ProbeError::corrupt(format!("postscript does not decode: {}", e)))?;
    match postscript.magic.as_deref() {
        Some(ORC_MAGIC) => {}
        Some(other) => {
            return Err(ProbeError::corrupt(format!(
                "postscript magic is {:?}, expected {:?}",
                other, ORC_MAGIC
            )))
        }
        None => return Err(ProbeError::corrupt("postscript has no magic")),
    }
    let footer_length = postscript
        .footer_length
        .ok_or_else(|| ProbeError::corrupt("postscript has no footer length"))?;
    let tail_len = footer_length
        .checked_add(bytes.len() as u64 + 1)
        .ok_or_else(|| ProbeError::corrupt("footer length overflows"))?;
    if tail_len > file_length {
        return Err(ProbeError::corrupt(format!(
            "footer ({} bytes) and postscript ({} bytes) exceed file length {}",
            footer_length,
            bytes.len(),
            file_length
        )));
    }
    let compression = Compression::from_proto(postscript.compression)?;
    Ok((postscript, compression))
}

/// Byte range `[start, end)` of the footer given a validated postscript.
pub fn footer_range(file_length: u64, postscript_length: u64, footer_length: u64) -> (u64, u64) {
    let end = file_length - 1 - postscript_length;
    (end - footer_length, end)
}

/// Decompress and decode the footer bytes.
pub fn decode_footer(bytes: &[u8], postscript: &PostScript, codec: Compression) -> Result<Footer, ProbeError> {
    let plain = compression::decompress(codec, effective_block_size(postscript), bytes)?;
    Footer::decode(plain.as_slice())
        .map_err(|e| ProbeError::corrupt(format!("footer does not decode: {}", e)))
}

fn effective_block_size(postscript: &PostScript) -> u64 {
    match postscript.compression_block_size {
        Some(size) if size > 0 => size,
        _ => DEFAULT_BLOCK_SIZE,
    }
}

/// Read the tail through a seekable handle, the way a format reader opens a file.
pub fn read_tail<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<FileTail, ProbeError> {
    let io = |what: &'static str| move |e: std::io::Error| ProbeError::from_io(&e, what);

    let file_length = reader.seek(SeekFrom::End(0)).map_err(io("seek to end"))?;
    if file_length < MIN_FILE_LEN {
        return Err(ProbeError::corrupt(format!(
            "file is {} bytes, smaller than the minimum ORC file ({} bytes)",
            file_length, MIN_FILE_LEN
        )));
    }

    let mut last = [0u8; 1];
    reader.seek(SeekFrom::Start(file_length - 1)).map_err(io("seek to length byte"))?;
    reader.read_exact(&mut last).map_err(io("read length byte"))?;
    let ps_len = postscript_length(last[0], file_length)?;

    let mut ps_bytes = vec![0u8; ps_len as usize];
    reader
        .seek(SeekFrom::Start(file_length - 1 - ps_len))
        .map_err(io("seek to postscript"))?;
    reader.read_exact(&mut ps_bytes).map_err(io("read postscript"))?;
    let (postscript, codec) = decode_postscript(&ps_bytes, file_length)?;

    let footer_length = postscript.footer_length.unwrap_or(0);
    let (start, end) = footer_range(file_length, ps_len, footer_length);
    let mut footer_bytes = vec![0u8; (end - start) as usize];
    reader.seek(SeekFrom::Start(start)).map_err(io("seek to footer"))?;
    reader.read_exact(&mut footer_bytes).map_err(io("read footer"))?;
    let footer = decode_footer(&footer_bytes, &postscript, codec)?;

    Ok(FileTail {
        file_length,
        postscript_length: ps_len,
        postscript,
        footer,
        compression: codec,
    })
}
