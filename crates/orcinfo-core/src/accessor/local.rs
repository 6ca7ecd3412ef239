//! Local filesystem backend.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::{check_range, ObjectAccessor, SeekRead};
use crate::error::ProbeError;
use crate::target::ObjectLocation;

/// Reads `file://` and bare-path targets with `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAccessor;

impl LocalAccessor {
    pub fn new() -> Self {
        Self
    }

    fn path<'a>(&self, location: &'a ObjectLocation) -> Result<&'a Path, ProbeError> {
        match location {
            ObjectLocation::Local(path) => Ok(path),
            other => Err(ProbeError::invalid_target(format!(
                "{} is not a local path",
                other
            ))),
        }
    }

    fn open(&self, path: &Path) -> Result<File, ProbeError> {
        let meta = fs::metadata(path)
            .map_err(|e| ProbeError::from_io(&e, &format!("stat {}", path.display())))?;
        if meta.is_dir() {
            return Err(ProbeError::invalid_target(format!(
                "{} is a directory",
                path.display()
            )));
        }
        File::open(path).map_err(|e| ProbeError::from_io(&e, &format!("open {}", path.display())))
    }
}

impl ObjectAccessor for LocalAccessor {
    fn size(&self, location: &ObjectLocation) -> Result<u64, ProbeError> {
        let path = self.path(location)?;
        let file = self.open(path)?;
        file.metadata()
            .map(|m| m.len())
            .map_err(|e| ProbeError::from_io(&e, &format!("stat {}", path.display())))
    }

    fn read_range(
        &self,
        location: &ObjectLocation,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, ProbeError> {
        let path = self.path(location)?;
        let mut file = self.open(path)?;
        let size = file
            .metadata()
            .map_err(|e| ProbeError::from_io(&e, &format!("stat {}", path.display())))?
            .len();
        check_range(offset, length, size)?;
        let mut buf = vec![0u8; length as usize];
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut buf))
            .map_err(|e| ProbeError::from_io(&e, &format!("read {}", path.display())))?;
        Ok(buf)
    }

    fn open_file(&self, location: &ObjectLocation) -> Result<Option<Box<dyn SeekRead>>, ProbeError> {
        let path = self.path(location)?;
        Ok(Some(Box::new(self.open(path)?)))
    }
}
