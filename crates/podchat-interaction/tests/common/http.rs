//! A bare HTTP/1.1 listener for driving [`DpopSession`] over a real socket.
//!
//! The identity provider endpoints are answered here; every other request
//! goes to the test's handler, which returns the raw response text. That
//! lets a test send redirects or cut a body short.

use podchat_core::account::ClientCredentials;
use podchat_interaction::DpopSession;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A running listener. It stops with the test runtime.
pub struct HttpPod {
    base: String,
    requests: Arc<Mutex<Vec<RawRequest>>>,
}

impl HttpPod {
    /// Starts listening on a free local port. `handler` gets the request and
    /// the server's base URL.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RawRequest, &str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (server_base, log) = (base.clone(), requests.clone());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let Some(request) = read_request(&mut socket).await else {
                    continue;
                };
                let reply = match request.path.as_str() {
                    "/.well-known/openid-configuration" => response(
                        "200 OK",
                        &[("Content-Type", "application/json")],
                        &format!(r#"{{"token_endpoint":"{server_base}/token"}}"#),
                    ),
                    "/token" => response(
                        "200 OK",
                        &[("Content-Type", "application/json")],
                        r#"{"access_token":"token-1","token_type":"DPoP","expires_in":300}"#,
                    ),
                    _ => handler(&request, &server_base),
                };
                log.lock().unwrap().push(request);
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Requests seen so far, identity provider calls included.
    pub fn requests(&self) -> Vec<RawRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn session(&self) -> DpopSession {
        DpopSession::new(
            &self.base,
            ClientCredentials {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }
}

/// A complete response with a matching `Content-Length`.
pub fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

/// A 200 announcing more body than it sends; the connection closes early.
pub fn truncated(partial_body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/turtle\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{partial_body}",
        partial_body.len() + 4096
    )
}

async fn read_request(socket: &mut TcpStream) -> Option<RawRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 2048];
    let head_end = loop {
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let body_start = head_end + 4;
    while buf.len() < body_start + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(body_start + length);
    let body = String::from_utf8_lossy(&buf[body_start..body_end]).to_string();

    Some(RawRequest {
        method,
        path,
        headers,
        body,
    })
}
