//! Loopback HTTP servers for provider and clip download tests

use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serve `app` on an ephemeral loopback port; returns the base URL
pub async fn spawn_http_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Clip server whose first response declares `declared_len` bytes, sends
/// `prefix`, then never finishes. Later requests get `full` in one piece.
///
/// Returns the base URL and the request counter.
pub async fn spawn_stalling_clip_server(
    prefix: &'static [u8],
    declared_len: usize,
    full: &'static [u8],
) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stalling server");
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            tokio::spawn(async move {
                if first {
                    respond_and_stall(stream, prefix, declared_len).await;
                } else {
                    respond(stream, full).await;
                }
            });
        }
    });

    (format!("http://{}", addr), hits)
}

async fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

async fn respond_and_stall(mut stream: TcpStream, prefix: &[u8], declared_len: usize) {
    read_request_head(&mut stream).await;
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nContent-Length: {}\r\n\r\n",
        declared_len
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(prefix).await;
    let _ = stream.flush().await;
    // Hold the connection open until the client goes away
    let mut buf = [0u8; 64];
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

async fn respond(mut stream: TcpStream, body: &[u8]) {
    read_request_head(&mut stream).await;
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(body).await;
    let _ = stream.flush().await;
}
