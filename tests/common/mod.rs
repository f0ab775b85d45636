//! Shared utilities for integration testing.
//!
//! Everything binds to `127.0.0.1:0` so tests can run in parallel.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::AbortHandle;

use view_counter::config::{ServiceConfig, StorageEnv};
use view_counter::lifecycle::{build_state, Shutdown};
use view_counter::HttpServer;

/// A running service instance. Dropping it stops the server.
pub struct TestService {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_service(config: ServiceConfig, env: StorageEnv) -> TestService {
    let state = build_state(&config, env).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, state);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestService { addr, shutdown }
}

/// Build a `StorageEnv` from literal variable pairs.
pub fn env(vars: &[(&str, &str)]) -> StorageEnv {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    StorageEnv::from_lookup(|key| map.get(key).cloned())
}

/// Config with the counter file inside `dir`.
pub fn config_in(dir: &tempfile::TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.storage.file_path = dir
        .path()
        .join("view-counts.json")
        .to_string_lossy()
        .into_owned();
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a programmable HTTP upstream. `f` picks the status and JSON body
/// for each request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                // Drain the request head; upstream GETs carry no body.
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => return,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => {}
                    }
                }

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let mut socket = reader.into_inner();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Minimal RESP2 server holding string values in memory.
///
/// Understands the commands the counter issues (GET, SET/SETEX, INCR/INCRBY,
/// DEL, PING) and acknowledges anything else with `+OK`.
pub struct FakeRedis {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    data: Arc<Mutex<HashMap<String, String>>>,
    connections: Arc<Mutex<Vec<AbortHandle>>>,
}

impl FakeRedis {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let data = Arc::new(Mutex::new(HashMap::new()));
        let connections = Arc::new(Mutex::new(Vec::new()));

        let fake = Self {
            addr,
            accepted: accepted.clone(),
            data: data.clone(),
            connections: connections.clone(),
        };

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let data = data.clone();
                let handle = tokio::spawn(serve_resp(socket, data));
                connections.lock().unwrap().push(handle.abort_handle());
            }
        });

        fake
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Close every open client connection; the listener keeps accepting.
    pub async fn drop_connections(&self) {
        for handle in self.connections.lock().unwrap().drain(..) {
            handle.abort();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn serve_resp(socket: tokio::net::TcpStream, data: Arc<Mutex<HashMap<String, String>>>) {
    let mut reader = BufReader::new(socket);
    while let Some(args) = read_command(&mut reader).await {
        let reply = execute(&args, &data);
        if reader.get_mut().write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_command(reader: &mut BufReader<tokio::net::TcpStream>) -> Option<Vec<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8(buf).ok()?);
    }
    Some(args)
}

fn bulk(value: Option<&String>) -> String {
    match value {
        Some(v) => format!("${}\r\n{}\r\n", v.len(), v),
        None => "$-1\r\n".to_string(),
    }
}

fn execute(args: &[String], data: &Mutex<HashMap<String, String>>) -> String {
    let mut data = data.lock().unwrap();
    let command = args.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();
    match (command.as_str(), args.len()) {
        ("PING", _) => "+PONG\r\n".to_string(),
        ("GET", 2) => bulk(data.get(&args[1])),
        ("SET", n) if n >= 3 => {
            data.insert(args[1].clone(), args[2].clone());
            "+OK\r\n".to_string()
        }
        ("SETEX", 4) => {
            data.insert(args[1].clone(), args[3].clone());
            "+OK\r\n".to_string()
        }
        ("INCR", 2) | ("INCRBY", 3) => {
            let delta: i64 = args.get(2).and_then(|d| d.parse().ok()).unwrap_or(1);
            let current: i64 = match data.get(&args[1]).map(|v| v.parse()) {
                None => 0,
                Some(Ok(v)) => v,
                Some(Err(_)) => {
                    return "-ERR value is not an integer or out of range\r\n".to_string()
                }
            };
            let next = current + delta;
            data.insert(args[1].clone(), next.to_string());
            format!(":{}\r\n", next)
        }
        ("DEL", _) => {
            let removed = args[1..].iter().filter(|k| data.remove(*k).is_some()).count();
            format!(":{}\r\n", removed)
        }
        _ => "+OK\r\n".to_string(),
    }
}

/// Fake REST KV endpoint: POST a JSON command array with a bearer token,
/// get `{"result": ...}` or `{"error": ...}` back.
pub struct FakeRestKv {
    pub addr: SocketAddr,
    state: RestState,
}

#[derive(Clone)]
struct RestState {
    token: String,
    data: Arc<Mutex<HashMap<String, String>>>,
    commands: Arc<AtomicUsize>,
}

impl FakeRestKv {
    pub async fn start(token: &str) -> Self {
        let state = RestState {
            token: token.to_string(),
            data: Arc::new(Mutex::new(HashMap::new())),
            commands: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/", post(rest_command))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.state.data.lock().unwrap().get(key).cloned()
    }

    pub fn commands(&self) -> usize {
        self.state.commands.load(Ordering::SeqCst)
    }
}

async fn rest_command(
    State(state): State<RestState>,
    headers: HeaderMap,
    Json(args): Json<Vec<String>>,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", state.token);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        );
    }
    state.commands.fetch_add(1, Ordering::SeqCst);

    let mut data = state.data.lock().unwrap();
    let command = args.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();
    let result = match (command.as_str(), args.len()) {
        ("GET", 2) => match data.get(&args[1]) {
            Some(v) => json!(v),
            None => Value::Null,
        },
        ("SET", n) if n >= 3 => {
            data.insert(args[1].clone(), args[2].clone());
            json!("OK")
        }
        ("INCR", 2) => {
            let current: u64 = data.get(&args[1]).and_then(|v| v.parse().ok()).unwrap_or(0);
            data.insert(args[1].clone(), (current + 1).to_string());
            json!(current + 1)
        }
        ("DEL", 2) => json!(u64::from(data.remove(&args[1]).is_some())),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("ERR unknown command '{}'", command) })),
            )
        }
    };
    (StatusCode::OK, Json(json!({ "result": result })))
}
