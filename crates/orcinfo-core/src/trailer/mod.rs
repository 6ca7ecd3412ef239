//! Trailer location: turn an object into its stripe count, length and raw size.
//!
//! A [`Locator`] tries its [`TrailerSource`] tiers in order. A tier that
//! cannot serve a target returns `Ok(None)` and is skipped; a failure moves
//! on to the next tier only when its kind allows fallback. When every tier
//! fails, the last error is returned.

mod native;
mod range;

use serde::Serialize;

use crate::accessor::ObjectAccessor;
use crate::config::ProbeConfig;
use crate::error::{ErrorKind, ProbeError};
use crate::orc::{Compression, FileTail};
use crate::target::ObjectLocation;

pub use native::NativeMetadataSource;
pub use range::RangeReadSource;

/// Summary extracted from one file's tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailerInfo {
    pub file_length: u64,
    pub stripe_count: u32,
    pub raw_data_size: Option<u64>,
    pub number_of_rows: Option<u64>,
    pub compression: Compression,
}

impl TrailerInfo {
    pub fn from_tail(tail: &FileTail) -> Result<Self, ProbeError> {
        Ok(Self {
            file_length: tail.file_length,
            stripe_count: tail.stripe_count()?,
            raw_data_size: tail.raw_data_size(),
            number_of_rows: tail.footer.number_of_rows,
            compression: tail.compression,
        })
    }
}

/// One strategy for reading a file's tail.
pub trait TrailerSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this tier cannot read the target at all.
    fn read_tail(
        &self,
        accessor: &dyn ObjectAccessor,
        location: &ObjectLocation,
    ) -> Result<Option<FileTail>, ProbeError>;
}

/// Ordered trailer tiers.
pub struct Locator {
    sources: Vec<Box<dyn TrailerSource>>,
}

impl Locator {
    pub fn new(sources: Vec<Box<dyn TrailerSource>>) -> Self {
        Self { sources }
    }

    /// Native handle first, then range reads of `tail_read_size` bytes.
    pub fn with_defaults(tail_read_size: u64) -> Self {
        Self::new(vec![
            Box::new(NativeMetadataSource),
            Box::new(RangeReadSource::new(tail_read_size)),
        ])
    }

    pub fn from_config(cfg: &ProbeConfig) -> Self {
        Self::with_defaults(cfg.tail_read_size)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Decoded tail from the first tier that succeeds.
    pub fn locate_tail(
        &self,
        accessor: &dyn ObjectAccessor,
        location: &ObjectLocation,
    ) -> Result<FileTail, ProbeError> {
        let mut last_err = None;
        for source in &self.sources {
            match source.read_tail(accessor, location) {
                Ok(Some(tail)) => {
                    tracing::debug!(tier = source.name(), %location, "trailer located");
                    return Ok(tail);
                }
                Ok(None) => {
                    tracing::debug!(tier = source.name(), %location, "tier unavailable");
                }
                Err(e) if e.kind.allows_fallback() => {
                    tracing::debug!(tier = source.name(), %location, "tier failed: {}", e);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ProbeError::new(
                ErrorKind::InvalidTarget,
                format!("no trailer source can read {}", location),
            )
        }))
    }

    pub fn locate(
        &self,
        accessor: &dyn ObjectAccessor,
        location: &ObjectLocation,
    ) -> Result<TrailerInfo, ProbeError> {
        TrailerInfo::from_tail(&self.locate_tail(accessor, location)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::MemoryAccessor;
    use crate::orc::fixture::SyntheticOrc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tier that always fails with a fixed kind and counts its calls.
    struct Failing {
        kind: ErrorKind,
        calls: AtomicUsize,
    }

    impl TrailerSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn read_tail(
            &self,
            _accessor: &dyn ObjectAccessor,
            _location: &ObjectLocation,
        ) -> Result<Option<FileTail>, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProbeError::new(self.kind, "boom"))
        }
    }

    fn memory_with(target: &str, bytes: Vec<u8>) -> MemoryAccessor {
        let mut acc = MemoryAccessor::new();
        acc.insert(target, bytes);
        acc
    }

    #[test]
    fn falls_back_after_corrupt_native_read() {
        let acc = memory_with("s3://b/k.orc", SyntheticOrc::new(4).build());
        let locator = Locator::new(vec![
            Box::new(Failing {
                kind: ErrorKind::CorruptFormat,
                calls: AtomicUsize::new(0),
            }),
            Box::new(RangeReadSource::new(1024)),
        ]);
        let loc = ObjectLocation::parse("s3://b/k.orc").unwrap();
        assert_eq!(locator.locate(&acc, &loc).unwrap().stripe_count, 4);
    }

    #[test]
    fn access_denied_stops_the_chain() {
        let acc = memory_with("s3://b/k.orc", SyntheticOrc::new(4).build());
        let locator = Locator::new(vec![
            Box::new(Failing {
                kind: ErrorKind::AccessDenied,
                calls: AtomicUsize::new(0),
            }),
            Box::new(RangeReadSource::new(1024)),
        ]);
        let loc = ObjectLocation::parse("s3://b/k.orc").unwrap();
        let err = locator.locate(&acc, &loc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccessDenied);
        assert_eq!(acc.range_calls(), 0);
    }

    #[test]
    fn all_tiers_failing_reports_last_error() {
        let acc = MemoryAccessor::new();
        let locator = Locator::new(vec![
            Box::new(Failing {
                kind: ErrorKind::TransientIo,
                calls: AtomicUsize::new(0),
            }),
            Box::new(Failing {
                kind: ErrorKind::CorruptFormat,
                calls: AtomicUsize::new(0),
            }),
        ]);
        let loc = ObjectLocation::parse("s3://b/k.orc").unwrap();
        assert_eq!(locator.locate(&acc, &loc).unwrap_err().kind, ErrorKind::CorruptFormat);
    }

    #[test]
    fn no_available_tier_is_an_error_not_a_default() {
        let acc = memory_with("s3://b/k.orc", SyntheticOrc::new(1).build());
        let locator = Locator::new(vec![Box::new(NativeMetadataSource)]);
        let loc = ObjectLocation::parse("s3://b/k.orc").unwrap();
        assert!(locator.locate(&acc, &loc).is_err());
    }

    #[test]
    fn default_tier_order() {
        assert_eq!(
            Locator::with_defaults(4096).source_names(),
            vec!["native", "range"]
        );
    }
}
