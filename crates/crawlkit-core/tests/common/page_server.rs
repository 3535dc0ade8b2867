//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of pages by path and records every request head it
//! receives. Requests in absolute form (`GET http://host/path HTTP/1.1`) are
//! answered too, so the same server doubles as a forward proxy.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct Routes {
    pages: HashMap<String, String>,
    /// Path -> number of 503 answers to give before serving the page.
    fail_first: HashMap<String, u32>,
    /// Path -> time to hold the request before answering.
    delays: HashMap<String, Duration>,
}

/// Requests currently being held on a slow route, and the most seen at once.
#[derive(Debug, Default)]
struct Concurrency {
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// A running test server. Lives until the process exits.
#[derive(Debug, Clone)]
pub struct PageServer {
    pub base: String,
    pub port: u16,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<String>>>,
    concurrency: Arc<Concurrency>,
}

impl PageServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(Mutex::new(Routes::default()));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let concurrency = Arc::new(Concurrency::default());
        let (r, q, c) = (
            Arc::clone(&routes),
            Arc::clone(&requests),
            Arc::clone(&concurrency),
        );
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let (r, q, c) = (Arc::clone(&r), Arc::clone(&q), Arc::clone(&c));
                thread::spawn(move || handle(stream, &r, &q, &c));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            port,
            routes,
            requests,
            concurrency,
        }
    }

    /// Serve `body` (as text/html) at `path`.
    pub fn page(self, path: &str, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .pages
            .insert(path.to_string(), body.to_string());
        self
    }

    /// Answer `path` with 503 for the first `times` requests.
    pub fn flaky(self, path: &str, times: u32) -> Self {
        self.routes
            .lock()
            .unwrap()
            .fail_first
            .insert(path.to_string(), times);
        self
    }

    /// Hold every request for `path` for `delay` before answering.
    pub fn slow(self, path: &str, delay: Duration) -> Self {
        self.routes
            .lock()
            .unwrap()
            .delays
            .insert(path.to_string(), delay);
        self
    }

    /// Most requests held on slow routes at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.concurrency.peak.load(Ordering::SeqCst)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Every request head received so far (request line plus headers).
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Request lines only, e.g. `GET /a HTTP/1.1`.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|h| h.lines().next().map(str::to_string))
            .collect()
    }
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

fn handle(
    mut stream: TcpStream,
    routes: &Mutex<Routes>,
    requests: &Mutex<Vec<String>>,
    concurrency: &Concurrency,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return;
    };
    let head = String::from_utf8_lossy(&buf[..end]).into_owned();
    // Drain the request body so the connection closes cleanly.
    let body_len = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut have = buf.len() - end - 4;
    while have < body_len {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => have += n,
        }
    }
    let target = head
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    requests.lock().unwrap().push(head);

    let path = path_of(&target);
    let delay = routes.lock().unwrap().delays.get(&path).copied();
    if let Some(delay) = delay {
        // Counted only while held, before any response byte is sent.
        let now = concurrency.active.fetch_add(1, Ordering::SeqCst) + 1;
        concurrency.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(delay);
        concurrency.active.fetch_sub(1, Ordering::SeqCst);
    }
    let (status, body) = {
        let mut routes = routes.lock().unwrap();
        let remaining = routes.fail_first.get(&path).copied().unwrap_or(0);
        if remaining > 0 {
            routes.fail_first.insert(path.clone(), remaining - 1);
            ("503 Service Unavailable", String::new())
        } else {
            match routes.pages.get(&path) {
                Some(body) => ("200 OK", body.clone()),
                None => ("404 Not Found", "not found".to_string()),
            }
        }
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Path of an origin-form (`/a?b`) or absolute-form (`http://h/a?b`) target.
fn path_of(target: &str) -> String {
    let path = match target.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => target,
    };
    path.to_string()
}
