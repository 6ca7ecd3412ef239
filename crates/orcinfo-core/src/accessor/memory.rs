//! In-memory backend with call counters.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{check_range, ObjectAccessor, SeekRead};
use crate::error::{ErrorKind, ProbeError};
use crate::target::ObjectLocation;

/// Objects keyed by their target string (`s3://b/k` or a path).
///
/// Counts `size` and `read_range` calls so callers can assert how many
/// requests a probe issued. Seekable handles are off unless enabled.
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    objects: HashMap<String, Arc<[u8]>>,
    denied: HashSet<String>,
    seekable: bool,
    size_calls: AtomicUsize,
    range_calls: AtomicUsize,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also serve `open_file`, enabling the native tier.
    pub fn seekable(mut self, enabled: bool) -> Self {
        self.seekable = enabled;
        self
    }

    pub fn insert(&mut self, target: &str, bytes: impl Into<Vec<u8>>) {
        self.objects.insert(target.to_string(), Arc::from(bytes.into()));
    }

    /// Every call for `target` fails with `AccessDenied`.
    pub fn deny(&mut self, target: &str) {
        self.denied.insert(target.to_string());
    }

    pub fn size_calls(&self) -> usize {
        self.size_calls.load(Ordering::SeqCst)
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.size_calls.store(0, Ordering::SeqCst);
        self.range_calls.store(0, Ordering::SeqCst);
    }

    fn object(&self, location: &ObjectLocation) -> Result<&Arc<[u8]>, ProbeError> {
        let key = location.to_string();
        if self.denied.contains(&key) {
            return Err(ProbeError::new(
                ErrorKind::AccessDenied,
                format!("access denied: {}", key),
            ));
        }
        self.objects
            .get(&key)
            .ok_or_else(|| ProbeError::not_found(format!("no such object: {}", key)))
    }
}

impl ObjectAccessor for MemoryAccessor {
    fn size(&self, location: &ObjectLocation) -> Result<u64, ProbeError> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.object(location)?.len() as u64)
    }

    fn read_range(
        &self,
        location: &ObjectLocation,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, ProbeError> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self.object(location)?;
        check_range(offset, length, bytes.len() as u64)?;
        Ok(bytes[offset as usize..(offset + length) as usize].to_vec())
    }

    fn open_file(&self, location: &ObjectLocation) -> Result<Option<Box<dyn SeekRead>>, ProbeError> {
        if !self.seekable {
            return Ok(None);
        }
        let bytes = Arc::clone(self.object(location)?);
        Ok(Some(Box::new(Cursor::new(bytes))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn loc(s: &str) -> ObjectLocation {
        ObjectLocation::parse(s).unwrap()
    }

    #[test]
    fn counts_calls_and_serves_ranges() {
        let mut acc = MemoryAccessor::new();
        acc.insert("s3://b/k.orc", b"hello world".to_vec());
        assert_eq!(acc.size(&loc("s3://b/k.orc")).unwrap(), 11);
        assert_eq!(acc.read_range(&loc("s3://b/k.orc"), 6, 5).unwrap(), b"world");
        assert_eq!(acc.size_calls(), 1);
        assert_eq!(acc.range_calls(), 1);
        acc.reset_counters();
        assert_eq!(acc.range_calls(), 0);
    }

    #[test]
    fn missing_and_denied_objects() {
        let mut acc = MemoryAccessor::new();
        acc.insert("s3://b/secret.orc", vec![0u8; 8]);
        acc.deny("s3://b/secret.orc");
        assert_eq!(acc.size(&loc("s3://b/nope.orc")).unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(
            acc.size(&loc("s3://b/secret.orc")).unwrap_err().kind,
            ErrorKind::AccessDenied
        );
    }

    #[test]
    fn open_file_only_when_seekable() {
        let mut acc = MemoryAccessor::new();
        acc.insert("s3://b/k.orc", b"abc".to_vec());
        assert!(acc.open_file(&loc("s3://b/k.orc")).unwrap().is_none());

        let acc = {
            let mut a = MemoryAccessor::new().seekable(true);
            a.insert("s3://b/k.orc", b"abc".to_vec());
            a
        };
        let mut handle = acc.open_file(&loc("s3://b/k.orc")).unwrap().unwrap();
        let mut out = String::new();
        handle.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn range_past_end_is_unsatisfiable() {
        let mut acc = MemoryAccessor::new();
        acc.insert("s3://b/k.orc", vec![1u8; 4]);
        let err = acc.read_range(&loc("s3://b/k.orc"), 2, 3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RangeUnsatisfiable);
    }
}
