//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use graphql_cache_proxy::cache::{MemoryCache, NoopCache, ResponseCache};
use graphql_cache_proxy::upstream::HttpUpstream;
use graphql_cache_proxy::{HttpServer, ProxyConfig, Shutdown};

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Received {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Handle to a running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockUpstream {
    pub fn uri(&self) -> String {
        format!("http://{}/v1/graphql", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a mock upstream answering every request with `status` and `body`.
pub async fn start_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        500 => "500 Internal Server Error",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    start_raw_upstream(response).await
}

/// Start a mock upstream writing `response` verbatim to every connection.
pub async fn start_raw_upstream(response: String) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();
    let response = Arc::new(response);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let log = log.clone();
            let response = response.clone();
            tokio::spawn(async move {
                serve_connection(socket, &response, log).await;
            });
        }
    });

    MockUpstream { addr, received }
}

async fn serve_connection(
    mut socket: TcpStream,
    response: &str,
    log: Arc<Mutex<Vec<Received>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    log.lock().unwrap().push(request);

    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<Received> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(Received {
        request_line,
        headers,
        body: buf[header_end..].to_vec(),
    })
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running proxy and what it needs to be stopped.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn proxy_config(upstream_uri: String) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.uri = upstream_uri;
    config.upstream.secret = "test-secret".into();
    config
}

/// Start the proxy with the real HTTP upstream client and the given cache.
pub async fn start_proxy(config: ProxyConfig, cache: Option<MemoryCache>) -> RunningProxy {
    let upstream = Arc::new(HttpUpstream::new(&config.upstream).unwrap());
    let cache: Arc<dyn ResponseCache> = match cache {
        Some(memory) => Arc::new(memory),
        None => Arc::new(NoopCache),
    };

    let server = HttpServer::new(config, upstream, cache).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningProxy { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
