//! Native tier: read the tail through a seekable handle.

use super::TrailerSource;
use crate::accessor::ObjectAccessor;
use crate::error::ProbeError;
use crate::orc::{self, FileTail};
use crate::target::ObjectLocation;

/// Uses [`ObjectAccessor::open_file`]; unavailable when the backend has no
/// seekable handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeMetadataSource;

impl TrailerSource for NativeMetadataSource {
    fn name(&self) -> &'static str {
        "native"
    }

    fn read_tail(
        &self,
        accessor: &dyn ObjectAccessor,
        location: &ObjectLocation,
    ) -> Result<Option<FileTail>, ProbeError> {
        let Some(mut handle) = accessor.open_file(location)? else {
            return Ok(None);
        };
        orc::read_tail(&mut handle).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::MemoryAccessor;
    use crate::error::ErrorKind;
    use crate::orc::fixture::SyntheticOrc;

    #[test]
    fn reads_through_seekable_handle_without_range_calls() {
        let mut acc = MemoryAccessor::new().seekable(true);
        acc.insert(
            "s3://b/k.orc",
            SyntheticOrc::new(5).content_length(12345).file_length(9876).build(),
        );
        let loc = ObjectLocation::parse("s3://b/k.orc").unwrap();
        let tail = NativeMetadataSource.read_tail(&acc, &loc).unwrap().unwrap();
        assert_eq!(tail.file_length, 9876);
        assert_eq!(tail.stripe_count().unwrap(), 5);
        assert_eq!(tail.raw_data_size(), Some(12345));
        assert_eq!(acc.range_calls(), 0);
    }

    #[test]
    fn unavailable_without_handles() {
        let mut acc = MemoryAccessor::new();
        acc.insert("s3://b/k.orc", SyntheticOrc::new(1).build());
        let loc = ObjectLocation::parse("s3://b/k.orc").unwrap();
        assert!(NativeMetadataSource.read_tail(&acc, &loc).unwrap().is_none());
    }

    #[test]
    fn missing_object_is_not_found() {
        let acc = MemoryAccessor::new().seekable(true);
        let loc = ObjectLocation::parse("s3://b/nope.orc").unwrap();
        let err = NativeMetadataSource.read_tail(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
