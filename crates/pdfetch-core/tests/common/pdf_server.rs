//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed table of routes and counts hits per path. HEAD can be
//! refused per route, and a route can demand a browser-like User-Agent.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    /// If false, HEAD returns 405 (servers that block HEAD).
    pub head_allowed: bool,
    /// If true, requests without "Mozilla" in the User-Agent get 403.
    pub require_browser_ua: bool,
}

impl Route {
    pub fn pdf(path: &str, body: Vec<u8>) -> Self {
        Self {
            path: path.to_string(),
            status: 200,
            content_type: "application/pdf".to_string(),
            body,
            head_allowed: true,
            require_browser_ua: false,
        }
    }

    pub fn html(path: &str, body: Vec<u8>) -> Self {
        Self {
            content_type: "text/html; charset=utf-8".to_string(),
            ..Self::pdf(path, body)
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn without_head(mut self) -> Self {
        self.head_allowed = false;
        self
    }

    pub fn browser_only(mut self) -> Self {
        self.require_browser_ua = true;
        self
    }
}

pub struct PdfServer {
    /// e.g. "http://127.0.0.1:12345"
    pub base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl PdfServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET and HEAD requests seen for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

/// Starts the server on a background thread. It runs until the process exits.
pub fn start(routes: Vec<Route>) -> PdfServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> =
        Arc::new(routes.into_iter().map(|r| (r.path.clone(), r)).collect());
    let hits = Arc::new(Mutex::new(HashMap::new()));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    PdfServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if data.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(data).ok()
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(request) = read_head(&mut stream) else {
        return;
    };
    let (method, path, user_agent) = parse_request(&request);
    if method.is_empty() {
        return;
    }
    *hits.lock().unwrap().entry(path.to_string()).or_default() += 1;

    let Some(route) = routes.get(path) else {
        respond(&mut stream, 404, "text/plain", b"not found", method);
        return;
    };
    if method.eq_ignore_ascii_case("HEAD") && !route.head_allowed {
        respond(&mut stream, 405, "text/plain", b"", method);
        return;
    }
    if route.require_browser_ua && !user_agent.is_some_and(|ua| ua.contains("Mozilla")) {
        respond(&mut stream, 403, "text/html", b"<html>Forbidden</html>", method);
        return;
    }
    respond(&mut stream, route.status, &route.content_type, &route.body, method);
}

fn respond(stream: &mut TcpStream, status: u16, content_type: &str, body: &[u8], method: &str) {
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(body);
    }
    let _ = stream.flush();
}

/// Returns (method, path, User-Agent header if present).
fn parse_request(request: &str) -> (&str, &str, Option<&str>) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    let user_agent = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("user-agent"))
        .map(|(_, value)| value.trim());
    (method, path, user_agent)
}
