//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use bytes::Bytes;
use http::{Request, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use pushcache::cache::{Cache, CachedResponse, MemoryCache, RequestInfo};
use pushcache::config::PushSettings;

/// Start a programmable HTTP/1.1 backend. The closure receives the request path.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head);
                        let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A resource the push server promises on every pull request.
#[allow(dead_code)]
pub struct PushedFixture {
    pub path: &'static str,
    pub chunks: Vec<&'static str>,
}

/// Handle to a running h2 push server.
#[allow(dead_code)]
pub struct PushServer {
    pub addr: SocketAddr,
    pulls: Arc<AtomicUsize>,
    connections: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl PushServer {
    /// Pull requests received so far.
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    /// TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn transport_url(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

/// Start an HTTP/2 server over plain TCP that answers each request by
/// pushing `fixtures` and then opening the response body.
///
/// With `end_pull` the response body ends immediately, so every pull
/// terminates right after its pushes.
#[allow(dead_code)]
pub async fn start_push_server(fixtures: Vec<PushedFixture>, end_pull: bool) -> PushServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let pulls = Arc::new(AtomicUsize::new(0));
    let connections = Arc::new(AtomicUsize::new(0));
    let fixtures = Arc::new(fixtures);

    let (pull_count, connection_count) = (pulls.clone(), connections.clone());
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            connection_count.fetch_add(1, Ordering::SeqCst);
            let fixtures = fixtures.clone();
            let pull_count = pull_count.clone();

            tokio::spawn(async move {
                let Ok(mut conn) = h2::server::handshake(socket).await else {
                    return;
                };
                let mut open_bodies = Vec::new();

                while let Some(Ok((request, mut respond))) = conn.accept().await {
                    pull_count.fetch_add(1, Ordering::SeqCst);
                    let authority = request
                        .uri()
                        .authority()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| addr.to_string());

                    for fixture in fixtures.iter() {
                        let promised = Request::get(format!("http://{}{}", authority, fixture.path))
                            .body(())
                            .unwrap();
                        let Ok(mut pushed) = respond.push_request(promised) else {
                            continue;
                        };
                        let head = Response::builder()
                            .status(200)
                            .header("content-type", "text/css")
                            .body(())
                            .unwrap();
                        let Ok(mut stream) = pushed.send_response(head, false) else {
                            continue;
                        };
                        for chunk in &fixture.chunks {
                            let _ = stream.send_data(Bytes::from_static(chunk.as_bytes()), false);
                        }
                        let _ = stream.send_data(Bytes::new(), true);
                    }

                    if let Ok(mut body) = respond.send_response(Response::new(()), false) {
                        if end_pull {
                            let _ = body.send_data(Bytes::new(), true);
                        } else {
                            open_bodies.push(body);
                        }
                    }
                }
            });
        }
    });

    PushServer {
        addr,
        pulls,
        connections,
    }
}

/// Reconnect settings short enough for tests.
#[allow(dead_code)]
pub fn fast_push_settings() -> PushSettings {
    PushSettings {
        base_delay_ms: 1,
        max_delay_ms: 10,
    }
}

/// Poll the cache until `url` is present.
#[allow(dead_code)]
pub async fn wait_for_entry(cache: &MemoryCache, url: &str) -> CachedResponse {
    let key = RequestInfo::get(url);
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(entry) = cache.match_request(&key).await {
                return entry;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("entry never cached")
}

/// Poll until `check` holds.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(check: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never met")
}
