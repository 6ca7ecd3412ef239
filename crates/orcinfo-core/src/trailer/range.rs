//! Range tier: reconstruct the tail from a handful of byte-range reads.
//!
//! One read of the last `tail_read_size` bytes usually covers the length
//! byte, postscript and footer. When it does not, the window is extended
//! backward at most once for the postscript and once for the footer.

use super::TrailerSource;
use crate::accessor::ObjectAccessor;
use crate::error::ProbeError;
use crate::orc::{tail, FileTail, MIN_FILE_LEN};
use crate::target::ObjectLocation;

/// Default bytes fetched from the end of a file on the first read.
pub const DEFAULT_TAIL_READ_SIZE: u64 = 16 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct RangeReadSource {
    tail_read_size: u64,
}

impl RangeReadSource {
    pub fn new(tail_read_size: u64) -> Self {
        Self {
            tail_read_size: tail_read_size.max(1),
        }
    }
}

impl Default for RangeReadSource {
    fn default() -> Self {
        Self::new(DEFAULT_TAIL_READ_SIZE)
    }
}

/// Bytes `[start, file_length)` of one object.
struct TailWindow<'a> {
    accessor: &'a dyn ObjectAccessor,
    location: &'a ObjectLocation,
    start: u64,
    bytes: Vec<u8>,
}

impl<'a> TailWindow<'a> {
    fn fetch(
        accessor: &'a dyn ObjectAccessor,
        location: &'a ObjectLocation,
        file_length: u64,
        len: u64,
    ) -> Result<Self, ProbeError> {
        let start = file_length - len;
        let bytes = accessor.read_range(location, start, len)?;
        Ok(Self {
            accessor,
            location,
            start,
            bytes,
        })
    }

    /// Grow the window so it starts at `start`. One range read, or none.
    fn cover_from(&mut self, start: u64, what: &str) -> Result<(), ProbeError> {
        if start >= self.start {
            return Ok(());
        }
        tracing::debug!(
            location = %self.location,
            missing = self.start - start,
            "{} extends past tail window, corrective read",
            what
        );
        let mut missing = self
            .accessor
            .read_range(self.location, start, self.start - start)?;
        missing.extend_from_slice(&self.bytes);
        self.bytes = missing;
        self.start = start;
        Ok(())
    }

    /// Absolute `[start, end)`; must already be covered.
    fn slice(&self, start: u64, end: u64) -> &[u8] {
        &self.bytes[(start - self.start) as usize..(end - self.start) as usize]
    }

    fn last_byte(&self) -> u8 {
        self.bytes.last().copied().unwrap_or(0)
    }
}

impl TrailerSource for RangeReadSource {
    fn name(&self) -> &'static str {
        "range"
    }

    fn read_tail(
        &self,
        accessor: &dyn ObjectAccessor,
        location: &ObjectLocation,
    ) -> Result<Option<FileTail>, ProbeError> {
        let file_length = accessor.size(location)?;
        if file_length < MIN_FILE_LEN {
            return Err(ProbeError::corrupt(format!(
                "file is {} bytes, smaller than the minimum ORC file ({} bytes)",
                file_length, MIN_FILE_LEN
            )));
        }

        let first = self.tail_read_size.min(file_length);
        let mut window = TailWindow::fetch(accessor, location, file_length, first)?;

        let ps_len = tail::postscript_length(window.last_byte(), file_length)?;
        let ps_start = file_length - 1 - ps_len;
        window.cover_from(ps_start, "postscript")?;
        let (postscript, compression) =
            tail::decode_postscript(window.slice(ps_start, file_length - 1), file_length)?;

        let footer_length = postscript.footer_length.unwrap_or(0);
        let (footer_start, footer_end) = tail::footer_range(file_length, ps_len, footer_length);
        window.cover_from(footer_start, "footer")?;
        let footer = tail::decode_footer(
            window.slice(footer_start, footer_end),
            &postscript,
            compression,
        )?;

        Ok(Some(FileTail {
            file_length,
            postscript_length: ps_len,
            postscript,
            footer,
            compression,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::MemoryAccessor;
    use crate::error::ErrorKind;
    use crate::orc::fixture::SyntheticOrc;
    use crate::orc::Compression;

    const TARGET: &str = "s3://bucket/part-0.orc";

    fn setup(bytes: Vec<u8>) -> (MemoryAccessor, ObjectLocation) {
        let mut acc = MemoryAccessor::new();
        acc.insert(TARGET, bytes);
        (acc, ObjectLocation::parse(TARGET).unwrap())
    }

    #[test]
    fn single_read_when_tail_fits() {
        let (acc, loc) = setup(SyntheticOrc::new(5).content_length(12345).file_length(9876).build());
        let tail = RangeReadSource::new(16 * 1024).read_tail(&acc, &loc).unwrap().unwrap();
        assert_eq!(tail.file_length, 9876);
        assert_eq!(tail.stripe_count().unwrap(), 5);
        assert_eq!(tail.raw_data_size(), Some(12345));
        assert_eq!(acc.size_calls(), 1);
        assert_eq!(acc.range_calls(), 1);
    }

    #[test]
    fn tail_read_larger_than_file_reads_whole_file() {
        let bytes = SyntheticOrc::new(2).build();
        let len = bytes.len() as u64;
        let (acc, loc) = setup(bytes);
        let tail = RangeReadSource::new(1 << 30).read_tail(&acc, &loc).unwrap().unwrap();
        assert_eq!(tail.file_length, len);
        assert_eq!(acc.range_calls(), 1);
    }

    #[test]
    fn one_corrective_read_for_large_footer() {
        let bytes = SyntheticOrc::new(3).wide(2_000).build();
        let (acc, loc) = setup(bytes);
        let tail = RangeReadSource::new(256).read_tail(&acc, &loc).unwrap().unwrap();
        assert_eq!(tail.stripe_count().unwrap(), 3);
        assert_eq!(tail.footer.types.len(), 2_003);
        assert_eq!(acc.range_calls(), 2);
    }

    #[test]
    fn postscript_outside_window_costs_at_most_two_extra_reads() {
        let (acc, loc) = setup(SyntheticOrc::new(3).compression(Compression::Zstd).build());
        let tail = RangeReadSource::new(2).read_tail(&acc, &loc).unwrap().unwrap();
        assert_eq!(tail.compression, Compression::Zstd);
        assert_eq!(tail.stripe_count().unwrap(), 3);
        assert!(acc.range_calls() <= 3, "range calls: {}", acc.range_calls());
    }

    #[test]
    fn below_minimum_length_is_corrupt_without_range_read() {
        let (acc, loc) = setup(vec![b'O', b'R', b'C', 0]);
        let err = RangeReadSource::default().read_tail(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
        assert_eq!(acc.range_calls(), 0);
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let mut bytes = SyntheticOrc::new(5).content_length(12345).build();
        // Cut off the middle of the footer, keep the last byte as-is.
        let last = *bytes.last().unwrap();
        bytes.truncate(bytes.len() / 2);
        bytes.push(last);
        let (acc, loc) = setup(bytes);
        let err = RangeReadSource::default().read_tail(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
    }

    #[test]
    fn zero_postscript_length_is_corrupt() {
        let (acc, loc) = setup(vec![b'O', b'R', b'C', 1, 2, 3, 0]);
        let err = RangeReadSource::default().read_tail(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
    }

    #[test]
    fn missing_object_is_not_found() {
        let acc = MemoryAccessor::new();
        let loc = ObjectLocation::parse(TARGET).unwrap();
        let err = RangeReadSource::default().read_tail(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn unsupported_codec_is_corrupt() {
        let (acc, loc) = setup(SyntheticOrc::new(2).compression(Compression::Lzo).build());
        let err = RangeReadSource::default().read_tail(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptFormat);
    }
}
