//! S3 (and S3-compatible) backend over HTTP, using the curl crate (libcurl).
//!
//! Size comes from `HEAD` + `Content-Length`, ranges from `GET` with a
//! `Range` header. Requests are unsigned; configured headers are added to
//! every call. Each request is bounded by the per-call timeout and retried
//! on transient faults according to the retry policy.

mod parse;

use curl::easy::{Easy, List};
use std::str;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

use super::ObjectAccessor;
use crate::config::ProbeConfig;
use crate::error::{ConfigError, ProbeError};
use crate::retry::{run_with_retry, RequestError, RetryPolicy};
use crate::target::ObjectLocation;

/// Idle curl handles kept for connection reuse.
const MAX_IDLE_HANDLES: usize = 64;
/// Preallocation cap for range bodies.
const MAX_PREALLOC: u64 = 1 << 20;

#[derive(Debug, Clone)]
enum Addressing {
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`
    VirtualHosted { region: String },
    /// `{endpoint}/{bucket}/{key}`
    PathStyle { endpoint: Url },
}

pub struct HttpAccessor {
    addressing: Addressing,
    headers: Vec<String>,
    connect_timeout: Duration,
    timeout: Duration,
    policy: RetryPolicy,
    idle: Mutex<Vec<Easy>>,
}

impl HttpAccessor {
    pub fn from_config(cfg: &ProbeConfig) -> Result<Self, ConfigError> {
        let addressing = match &cfg.endpoint {
            Some(endpoint) => {
                let parsed = Url::parse(endpoint).map_err(|e| ConfigError::Endpoint {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                })?;
                if parsed.cannot_be_a_base() {
                    return Err(ConfigError::Endpoint {
                        endpoint: endpoint.clone(),
                        reason: "endpoint cannot carry a path".to_string(),
                    });
                }
                Addressing::PathStyle { endpoint: parsed }
            }
            None => Addressing::VirtualHosted {
                region: cfg.effective_region(),
            },
        };
        Ok(Self {
            addressing,
            headers: cfg
                .headers
                .iter()
                .map(|(k, v)| format!("{}: {}", k.trim(), v.trim()))
                .collect(),
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.per_call_timeout(),
            policy: cfg.retry_policy(),
            idle: Mutex::new(Vec::new()),
        })
    }

    /// URL of `s3://bucket/key`. Key segments are percent-encoded; `/` separates them.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, ProbeError> {
        let mut url = match &self.addressing {
            Addressing::PathStyle { endpoint } => endpoint.clone(),
            Addressing::VirtualHosted { region } => {
                Url::parse(&format!("https://{}.s3.{}.amazonaws.com/", bucket, region)).map_err(
                    |e| ProbeError::invalid_target(format!("bucket {:?}: {}", bucket, e)),
                )?
            }
        };
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ProbeError::invalid_target(format!("cannot address {}", bucket)))?;
            segments.pop_if_empty();
            if matches!(self.addressing, Addressing::PathStyle { .. }) {
                segments.push(bucket);
            }
            segments.extend(key.split('/'));
        }
        Ok(url)
    }

    fn url_for(&self, location: &ObjectLocation) -> Result<Url, ProbeError> {
        match location {
            ObjectLocation::S3 { bucket, key } => self.object_url(bucket, key),
            ObjectLocation::Local(_) => Err(ProbeError::invalid_target(format!(
                "{} is not an s3:// target",
                location
            ))),
        }
    }

    fn checkout(&self) -> Easy {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(Easy::new)
    }

    fn checkin(&self, mut easy: Easy) {
        easy.reset();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE_HANDLES {
            idle.push(easy);
        }
    }

    fn prepare(&self, easy: &mut Easy, url: &Url) -> Result<(), curl::Error> {
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        if !self.headers.is_empty() {
            let mut list = List::new();
            for header in &self.headers {
                list.append(header)?;
            }
            easy.http_headers(list)?;
        }
        Ok(())
    }

    fn head(&self, url: &Url) -> Result<u64, RequestError> {
        let mut easy = self.checkout();
        let result = self.head_with(&mut easy, url);
        self.checkin(easy);
        result
    }

    fn head_with(&self, easy: &mut Easy, url: &Url) -> Result<u64, RequestError> {
        self.prepare(easy, url).map_err(RequestError::Curl)?;
        easy.nobody(true).map_err(RequestError::Curl)?;

        let mut lines: Vec<String> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(RequestError::Curl)?;
            transfer.perform().map_err(RequestError::Curl)?;
        }

        let code = easy.response_code().map_err(RequestError::Curl)?;
        if !(200..300).contains(&code) {
            return Err(RequestError::Http(code));
        }
        parse::parse_headers(&lines)
            .content_length
            .ok_or_else(|| RequestError::BadResponse("HEAD response has no Content-Length".into()))
    }

    fn get_range(&self, url: &Url, offset: u64, length: u64) -> Result<Vec<u8>, RequestError> {
        let mut easy = self.checkout();
        let result = self.get_range_with(&mut easy, url, offset, length);
        self.checkin(easy);
        result
    }

    fn get_range_with(
        &self,
        easy: &mut Easy,
        url: &Url,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, RequestError> {
        self.prepare(easy, url).map_err(RequestError::Curl)?;
        let end = offset.saturating_add(length);
        easy.range(&format!("{}-{}", offset, end - 1))
            .map_err(RequestError::Curl)?;

        // A server that ignores Range answers 200 with the whole object from
        // byte 0; stop reading once the requested range has arrived.
        let limit = usize::try_from(end).unwrap_or(usize::MAX);
        let mut body: Vec<u8> = Vec::with_capacity(length.min(MAX_PREALLOC) as usize);
        let mut lines: Vec<String> = Vec::new();
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(RequestError::Curl)?;
            transfer
                .write_function(|data| {
                    let room = limit - body.len();
                    if data.len() > room {
                        body.extend_from_slice(&data[..room]);
                        return Ok(0);
                    }
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(RequestError::Curl)?;
            transfer.perform()
        };
        if let Err(e) = performed {
            if !(e.is_write_error() && body.len() == limit) {
                return Err(RequestError::Curl(e));
            }
        }

        let code = easy.response_code().map_err(RequestError::Curl)?;
        let headers = parse::parse_headers(&lines);
        match code {
            206 => {
                if let Some((first, _, _)) = headers.content_range {
                    if first != offset {
                        return Err(RequestError::BadResponse(format!(
                            "asked for bytes from {}, server sent from {}",
                            offset, first
                        )));
                    }
                }
            }
            200 => {
                let received = body.len() as u64;
                if received < end {
                    return Err(RequestError::ShortRead {
                        expected: length,
                        received: received.saturating_sub(offset),
                        total: Some(received),
                    });
                }
                body.drain(..offset as usize);
            }
            416 => {
                tracing::debug!(
                    total = ?parse::unsatisfied_total(&lines),
                    "range {}-{} not satisfiable",
                    offset,
                    end - 1
                );
                return Err(RequestError::Http(code));
            }
            c if !(200..300).contains(&c) => return Err(RequestError::Http(c)),
            c => {
                return Err(RequestError::BadResponse(format!(
                    "unexpected HTTP {} for a range request",
                    c
                )))
            }
        }

        let received = body.len() as u64;
        if received < length {
            return Err(RequestError::ShortRead {
                expected: length,
                received,
                total: headers.content_range.and_then(|(_, _, total)| total),
            });
        }
        body.truncate(length as usize);
        Ok(body)
    }
}

impl ObjectAccessor for HttpAccessor {
    fn size(&self, location: &ObjectLocation) -> Result<u64, ProbeError> {
        let url = self.url_for(location)?;
        tracing::debug!(%url, "HEAD");
        run_with_retry(&self.policy, || self.head(&url))
            .map_err(|e| e.into_probe_error(&format!("HEAD {}", location)))
    }

    fn read_range(
        &self,
        location: &ObjectLocation,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, ProbeError> {
        let url = self.url_for(location)?;
        if length == 0 {
            return Ok(Vec::new());
        }
        tracing::debug!(%url, offset, length, "GET range");
        run_with_retry(&self.policy, || self.get_range(&url, offset, length)).map_err(|e| {
            e.into_probe_error(&format!(
                "GET {} bytes={}-{}",
                location,
                offset,
                offset.saturating_add(length) - 1
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accessor(endpoint: Option<&str>, region: Option<&str>) -> HttpAccessor {
        let cfg = ProbeConfig {
            endpoint: endpoint.map(str::to_string),
            region: region.map(str::to_string),
            ..ProbeConfig::default()
        };
        HttpAccessor::from_config(&cfg).unwrap()
    }

    #[test]
    fn virtual_hosted_url() {
        let acc = accessor(None, Some("eu-west-1"));
        let url = acc.object_url("logs", "dt=2024-01-01/part 0.orc").unwrap();
        assert_eq!(
            url.as_str(),
            "https://logs.s3.eu-west-1.amazonaws.com/dt=2024-01-01/part%200.orc"
        );
    }

    #[test]
    fn path_style_url_keeps_endpoint_prefix() {
        let acc = accessor(Some("http://127.0.0.1:9000/s3/"), None);
        let url = acc.object_url("b", "a/b.orc").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/s3/b/a/b.orc");

        let acc = accessor(Some("http://localhost:9000"), None);
        let url = acc.object_url("b", "k.orc").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/b/k.orc");
    }

    #[test]
    fn bad_endpoint_is_config_error() {
        let cfg = ProbeConfig {
            endpoint: Some("not a url".to_string()),
            ..ProbeConfig::default()
        };
        assert!(matches!(
            HttpAccessor::from_config(&cfg),
            Err(ConfigError::Endpoint { .. })
        ));
    }

    #[test]
    fn local_location_is_invalid_target() {
        let acc = accessor(Some("http://localhost:9000"), None);
        let loc = ObjectLocation::Local("/tmp/x.orc".into());
        assert_eq!(
            acc.size(&loc).unwrap_err().kind,
            crate::error::ErrorKind::InvalidTarget
        );
    }
}
