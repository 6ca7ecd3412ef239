//! Object accessors: how bytes are fetched for a target.
//!
//! Every backend answers two questions, the object's size and the bytes of a
//! range. Backends that can hand out a seekable handle also implement
//! [`ObjectAccessor::open_file`], which unlocks the native trailer tier.
//!
//! Calls are blocking; the batch runner gives each worker its own thread.

pub mod http;
mod local;
mod memory;
mod router;

use std::io::{Read, Seek};

use crate::error::ProbeError;
use crate::target::ObjectLocation;

pub use http::HttpAccessor;
pub use local::LocalAccessor;
pub use memory::MemoryAccessor;
pub use router::RouterAccessor;

/// Seekable byte source handed to the native trailer tier.
pub trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

/// Size and range access to objects. Shared by all workers of a batch.
pub trait ObjectAccessor: Send + Sync {
    /// Object size in bytes.
    fn size(&self, location: &ObjectLocation) -> Result<u64, ProbeError>;

    /// Exactly `length` bytes starting at `offset`. A range that ends past
    /// the object is `RangeUnsatisfiable`.
    fn read_range(
        &self,
        location: &ObjectLocation,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, ProbeError>;

    /// A seekable handle, when the backend can provide one.
    fn open_file(&self, _location: &ObjectLocation) -> Result<Option<Box<dyn SeekRead>>, ProbeError> {
        Ok(None)
    }
}

/// Check `[offset, offset + length)` against `size`.
pub(crate) fn check_range(offset: u64, length: u64, size: u64) -> Result<(), ProbeError> {
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ProbeError::range_unsatisfiable(offset, length, size)),
    }
}
