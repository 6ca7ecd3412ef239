//! Minimal HTTP/1.1 object server that supports HEAD and Range GET for integration tests.
//!
//! Serves objects by path (`/{bucket}/{key}`), the way an S3-compatible endpoint
//! does with path-style addressing. Unknown paths get 404, denied paths 403.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RangeServerOptions {
    /// Paths answered with 403.
    pub denied: HashSet<String>,
    /// If set, requests without this `name: value` header get 403.
    pub required_header: Option<(String, String)>,
    /// The first N requests get 503 (exercises retries).
    pub fail_first: usize,
    /// If true, GET ignores Range and always returns 200 with the full body.
    pub ignore_ranges: bool,
    /// Hold every response this long after reading the request.
    pub stall: Option<Duration>,
}

/// Handle to a running server.
pub struct RangeServer {
    /// e.g. "http://127.0.0.1:12345"
    pub endpoint: String,
    requests: Arc<AtomicUsize>,
    range_gets: Arc<AtomicUsize>,
}

impl RangeServer {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn range_gets(&self) -> usize {
        self.range_gets.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `objects` (path -> body).
/// The server runs until the process exits.
pub fn start(objects: HashMap<String, Vec<u8>>) -> RangeServer {
    start_with_options(objects, RangeServerOptions::default())
}

pub fn start_with_options(objects: HashMap<String, Vec<u8>>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects = Arc::new(objects);
    let opts = Arc::new(opts);
    let requests = Arc::new(AtomicUsize::new(0));
    let range_gets = Arc::new(AtomicUsize::new(0));
    let (req, gets) = (Arc::clone(&requests), Arc::clone(&range_gets));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let opts = Arc::clone(&opts);
            let req = Arc::clone(&req);
            let gets = Arc::clone(&gets);
            thread::spawn(move || handle(stream, &objects, &opts, &req, &gets));
        }
    });
    RangeServer {
        endpoint: format!("http://127.0.0.1:{}", port),
        requests,
        range_gets,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    objects: &HashMap<String, Vec<u8>>,
    opts: &RangeServerOptions,
    requests: &AtomicUsize,
    range_gets: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let parsed = parse_request(request);
    let seen = requests.fetch_add(1, Ordering::SeqCst);
    if let Some(stall) = opts.stall {
        thread::sleep(stall);
    }

    if seen < opts.fail_first {
        return reply(&mut stream, "503 Service Unavailable", &[], &[]);
    }
    if let Some((name, value)) = &opts.required_header {
        let ok = parsed
            .headers
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case(name) && v == value);
        if !ok {
            return reply(&mut stream, "403 Forbidden", &[], &[]);
        }
    }
    if opts.denied.contains(parsed.path) {
        return reply(&mut stream, "403 Forbidden", &[], &[]);
    }
    let Some(body) = objects.get(parsed.path) else {
        return reply(&mut stream, "404 Not Found", &[], &[]);
    };
    let total = body.len() as u64;

    if parsed.method.eq_ignore_ascii_case("HEAD") {
        return write_response(&mut stream, "200 OK", &["Accept-Ranges: bytes"], total, &[]);
    }
    if !parsed.method.eq_ignore_ascii_case("GET") {
        return reply(&mut stream, "405 Method Not Allowed", &[], &[]);
    }
    match parsed.range {
        Some((start, end_incl)) if !opts.ignore_ranges => {
            range_gets.fetch_add(1, Ordering::SeqCst);
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start >= total || start > end_incl {
                let cr = format!("Content-Range: bytes */{}", total);
                return reply(&mut stream, "416 Range Not Satisfiable", &[cr.as_str()], &[]);
            }
            let slice = &body[start as usize..=end_incl as usize];
            let cr = format!("Content-Range: bytes {}-{}/{}", start, end_incl, total);
            reply(&mut stream, "206 Partial Content", &[cr.as_str()], slice)
        }
        _ => reply(&mut stream, "200 OK", &[], body),
    }
}

fn reply(stream: &mut std::net::TcpStream, status: &str, headers: &[&str], body: &[u8]) {
    write_response(stream, status, headers, body.len() as u64, body);
}

/// Writes head and body. `content_length` differs from `body.len()` only for HEAD.
fn write_response(
    stream: &mut std::net::TcpStream,
    status: &str,
    headers: &[&str],
    content_length: u64,
    body: &[u8],
) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nConnection: close\r\nContent-Length: {}\r\n",
        status, content_length
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

struct Request<'a> {
    method: &'a str,
    path: &'a str,
    range: Option<(u64, u64)>,
    headers: Vec<(&'a str, &'a str)>,
}

/// Method, path, optional (start, end_inclusive) for `Range: bytes=X-Y`, and headers.
fn parse_request(request: &str) -> Request<'_> {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    let mut range = None;
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let (name, value) = (name.trim(), value.trim());
            headers.push((name, value));
            if name.eq_ignore_ascii_case("range") {
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end_incl = match b.trim() {
                            "" => u64::MAX,
                            end => end.parse::<u64>().unwrap_or(0),
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    Request {
        method,
        path,
        range,
        headers,
    }
}
