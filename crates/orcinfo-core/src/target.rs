//! Parsing of input lines into object locations.
//!
//! Accepted forms:
//! - `s3://bucket/key/with/slashes.orc`
//! - `file:///absolute/path.orc`
//! - a bare filesystem path (`/data/x.orc`, `./x.orc`)

use std::fmt;
use std::path::PathBuf;

use crate::error::ProbeError;

/// Where one probe target lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectLocation {
    S3 { bucket: String, key: String },
    Local(PathBuf),
}

impl ObjectLocation {
    /// Parse a single target string. Errors are `InvalidTarget`.
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ProbeError::invalid_target("empty target"));
        }
        match raw.split_once("://") {
            Some((scheme, _)) if scheme.eq_ignore_ascii_case("s3") => parse_s3(raw),
            Some((scheme, _)) if scheme.eq_ignore_ascii_case("file") => {
                let parsed = url::Url::parse(raw)
                    .map_err(|e| ProbeError::invalid_target(format!("{}: {}", raw, e)))?;
                let path = parsed
                    .to_file_path()
                    .map_err(|_| ProbeError::invalid_target(format!("not a file path: {}", raw)))?;
                Ok(ObjectLocation::Local(path))
            }
            Some((scheme, _)) => Err(ProbeError::invalid_target(format!(
                "unsupported scheme {:?} in {}",
                scheme, raw
            ))),
            None => Ok(ObjectLocation::Local(PathBuf::from(raw))),
        }
    }
}

fn parse_s3(raw: &str) -> Result<ObjectLocation, ProbeError> {
    // Everything after the scheme: bucket up to the first '/', then the key verbatim.
    // Keys may contain characters `Url` would normalise, so no URL round-trip here.
    let rest = &raw[raw.find("://").map(|i| i + 3).unwrap_or(0)..];
    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(ProbeError::invalid_target(format!("missing bucket: {}", raw)));
    }
    if bucket.contains(|c: char| c.is_whitespace() || c == '?' || c == '#') {
        return Err(ProbeError::invalid_target(format!("invalid bucket name: {}", raw)));
    }
    let key = key.trim_start_matches('/');
    if key.is_empty() {
        return Err(ProbeError::invalid_target(format!("missing object key: {}", raw)));
    }
    Ok(ObjectLocation::S3 {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectLocation::S3 { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
            ObjectLocation::Local(p) => write!(f, "{}", p.display()),
        }
    }
}
