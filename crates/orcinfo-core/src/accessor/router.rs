//! Dispatch by target kind: `s3://` to HTTP, paths to the local filesystem.

use super::{HttpAccessor, LocalAccessor, ObjectAccessor, SeekRead};
use crate::config::ProbeConfig;
use crate::error::{ConfigError, ProbeError};
use crate::target::ObjectLocation;

/// The accessor the CLI uses for mixed target lists.
pub struct RouterAccessor {
    http: HttpAccessor,
    local: LocalAccessor,
}

impl RouterAccessor {
    pub fn from_config(cfg: &ProbeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: HttpAccessor::from_config(cfg)?,
            local: LocalAccessor::new(),
        })
    }

    fn backend(&self, location: &ObjectLocation) -> &dyn ObjectAccessor {
        match location {
            ObjectLocation::S3 { .. } => &self.http,
            ObjectLocation::Local(_) => &self.local,
        }
    }
}

impl ObjectAccessor for RouterAccessor {
    fn size(&self, location: &ObjectLocation) -> Result<u64, ProbeError> {
        self.backend(location).size(location)
    }

    fn read_range(
        &self,
        location: &ObjectLocation,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, ProbeError> {
        self.backend(location).read_range(location, offset, length)
    }

    fn open_file(&self, location: &ObjectLocation) -> Result<Option<Box<dyn SeekRead>>, ProbeError> {
        self.backend(location).open_file(location)
    }
}
