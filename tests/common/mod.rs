#![allow(dead_code)]

//! Minimal scripted registry for driving the client's HTTP pipeline.
//!
//! Serves canned responses per path in queue order and records every
//! request it saw, which makes call-sequencing behavior (refresh-and-retry,
//! page fetch counts) directly observable.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl ScriptedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            delay: None,
        }
    }

    /// A 401 carrying a bearer challenge pointing at `realm`.
    pub fn challenge(realm: &str, service: &str) -> Self {
        Self::empty(401).with_header(
            "WWW-Authenticate",
            &format!(r#"Bearer realm="{}",service="{}""#, realm, service),
        )
    }

    /// A token-service response.
    pub fn token(secret: &str, expires_in: u64) -> Self {
        Self::json(
            200,
            &format!(r#"{{"token":"{}","expires_in":{}}}"#, secret, expires_in),
        )
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query, exactly as requested.
    pub target: String,
    pub authorization: Option<String>,
}

#[derive(Clone)]
pub struct ScriptedRegistry {
    addr: SocketAddr,
    scripts: Arc<Mutex<HashMap<String, VecDeque<ScriptedResponse>>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedRegistry {
    /// Start a registry on a random local port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind scripted registry");
        let addr = listener.local_addr().expect("scripted registry address");

        let registry = Self {
            addr,
            scripts: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let accepting = registry.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let connection = accepting.clone();
                tokio::spawn(async move { connection.handle(stream).await });
            }
        });

        registry
    }

    pub fn root_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn realm_url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    /// Queue a response for a path. Successive requests to the same path
    /// consume queued responses in order; an exhausted path answers 404.
    pub fn script(&self, path: &str, response: ScriptedResponse) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Requests received for a path, ignoring query strings.
    pub fn hits(&self, path: &str) -> usize {
        self.requests_for(path).len()
    }

    pub fn requests_for(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|r| r.target.split('?').next() == Some(path))
            .cloned()
            .collect()
    }

    async fn handle(&self, mut stream: TcpStream) {
        // Read the request head; test requests never carry bodies.
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            }
        }

        let head = String::from_utf8_lossy(&buffer);
        let mut lines = head.lines();
        let request_line = lines.next().unwrap_or("");
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or("").to_string();
        let target = parts.next().unwrap_or("").to_string();
        let authorization = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.trim().to_string());

        let path = target.split('?').next().unwrap_or("").to_string();
        self.requests
            .lock()
            .expect("requests lock")
            .push(Recorded {
                method,
                target: target.clone(),
                authorization,
            });

        let response = self
            .scripts
            .lock()
            .expect("scripts lock")
            .get_mut(&path)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                ScriptedResponse::json(
                    404,
                    r#"{"errors":[{"code":"NAME_UNKNOWN","message":"unscripted path"}]}"#,
                )
            });

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        let reason = match response.status {
            200 => "OK",
            401 => "Unauthorized",
            404 => "Not Found",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Status",
        };

        let mut header = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            response.status,
            reason,
            response.body.len()
        );
        for (key, value) in &response.headers {
            header.push_str(&format!("{}: {}\r\n", key, value));
        }
        header.push_str("\r\n");

        let _ = stream.write_all(header.as_bytes()).await;
        let _ = stream.write_all(&response.body).await;
        let _ = stream.shutdown().await;
    }
}
