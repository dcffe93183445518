//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use spa_gateway::config::{GatewayConfig, RouteDeclaration, RuntimeConfig};
use spa_gateway::{GatewayServer, RouteTable, Shutdown};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Start a mock backend that echoes the request line and body.
///
/// Requests whose path ends in `/redirect` get a 302 instead.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else { break };
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut reader = BufReader::new(read);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.is_err() {
                    return;
                }

                let mut host = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        match name.to_ascii_lowercase().as_str() {
                            "host" => host = value.trim().to_string(),
                            "content-length" => content_length = value.trim().parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                }

                let mut body = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body).await;

                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or("").to_string();
                let target = parts.next().unwrap_or("").to_string();

                let response = if target.split('?').next().unwrap_or("").ends_with("/redirect") {
                    "HTTP/1.1 302 Found\r\nLocation: /elsewhere\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                } else {
                    let payload = format!("{} {}\n{}", method, target, String::from_utf8_lossy(&body));
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Echo-Host: {}\r\nConnection: close\r\n\r\n{}",
                        payload.len(),
                        host,
                        payload
                    )
                };
                let _ = write.write_all(response.as_bytes()).await;
                let _ = write.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// Gateway configuration with the given routes and assets root.
pub fn gateway_config(routes: Vec<RouteDeclaration>, public_root: PathBuf) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routes = routes;
    config.assets.public_root = public_root;
    config.timeouts.request_secs = 5;
    config
}

/// Start a gateway with the given routes and assets root.
pub async fn start_gateway(
    routes: Vec<RouteDeclaration>,
    public_root: PathBuf,
    runtime: RuntimeConfig,
) -> (SocketAddr, Shutdown) {
    start_gateway_with(gateway_config(routes, public_root), runtime).await
}

/// Start a gateway from a full configuration.
pub async fn start_gateway_with(config: GatewayConfig, runtime: RuntimeConfig) -> (SocketAddr, Shutdown) {
    let table = RouteTable::from_declarations(&config.routes).unwrap();
    let server = GatewayServer::new(&config, table, Arc::new(runtime)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// Send `request_target` over a plain socket and return the status line.
///
/// HTTP clients normalize dot segments before sending; this does not.
pub async fn raw_get(gateway: SocketAddr, request_target: &str) -> String {
    let mut stream = TcpStream::connect(gateway).await.unwrap();
    let request = format!("GET {request_target} HTTP/1.1\r\nHost: {gateway}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Test client: no proxy, no redirect following.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
