//! Parse HTTP response header lines.

/// Headers relevant to size and range responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ResponseHeaders {
    pub content_length: Option<u64>,
    /// `(first, last, total)` from `Content-Range: bytes first-last/total`.
    pub content_range: Option<(u64, u64, Option<u64>)>,
}

/// Parse collected header lines. With redirects curl reports several header
/// blocks; each status line starts a fresh block so the final response wins.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut out = ResponseHeaders::default();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            out = ResponseHeaders::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    out.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("content-range") {
                out.content_range = parse_content_range(value);
            }
        }
    }
    out
}

/// `bytes 0-99/1234`, `bytes 0-99/*`. The unsatisfied form `bytes */1234`
/// yields `None`; its total is recovered by [`unsatisfied_total`].
fn parse_content_range(value: &str) -> Option<(u64, u64, Option<u64>)> {
    let rest = value.strip_prefix("bytes")?.trim_start();
    let (span, total) = rest.split_once('/')?;
    let (first, last) = span.split_once('-')?;
    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse().ok()?),
    };
    Some((first.trim().parse().ok()?, last.trim().parse().ok()?, total))
}

/// Total from `Content-Range: bytes */1234` (sent with 416).
pub(crate) fn unsatisfied_total(lines: &[String]) -> Option<u64> {
    lines.iter().rev().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("content-range") {
            return None;
        }
        value.trim().strip_prefix("bytes */")?.trim().parse().ok()
    })
}
