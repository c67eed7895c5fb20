//! WebSocket carriage for the host's web gateway.
//!
//! The gateway frames the same terminal byte stream as binary messages. A
//! bridge task unwraps them into one end of an in-memory duplex stream,
//! and the other end is attached like any TCP connection.

use crate::config::Config;
use crate::error::{BotError, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, duplex};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{debug, info, warn};

const BRIDGE_CAPACITY: usize = 64 * 1024;
const READ_CHUNK: usize = 4096;

/// Open the configured WebSocket URL and return the byte stream it carries.
pub async fn connect(config: &Config) -> Result<DuplexStream> {
    // Already installed is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut request = config.url.as_str().into_client_request()?;
    if let Some(origin) = &config.origin {
        let value = HeaderValue::from_str(origin)
            .map_err(|err| BotError::Config(format!("invalid origin '{origin}': {err}")))?;
        request.headers_mut().insert("Origin", value);
    }
    info!(url = %config.url, "connecting");
    let (socket, response) = tokio_tungstenite::connect_async(request).await?;
    debug!(status = %response.status(), "websocket handshake done");

    let (local, remote) = duplex(BRIDGE_CAPACITY);
    tokio::spawn(bridge(socket, remote));
    Ok(local)
}

/// Pump messages from `socket` into `stream` and bytes from `stream` out as
/// binary messages, until either side closes.
pub(crate) async fn bridge<S>(socket: WebSocketStream<S>, stream: DuplexStream)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut source) = socket.split();
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            message = source.next() => {
                let bytes = match message {
                    Some(Ok(Message::Binary(data))) => data,
                    Some(Ok(Message::Text(text))) => text.into_bytes(),
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "host closed the websocket");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        warn!(%err, "websocket read failed");
                        break;
                    }
                    None => break,
                };
                if writer.write_all(&bytes).await.is_err() {
                    break;
                }
            }
            read = reader.read(&mut buf) => match read {
                Ok(0) | Err(_) => {
                    let _ = sink.close().await;
                    break;
                }
                Ok(n) => {
                    if let Err(err) = sink.send(Message::binary(buf[..n].to_vec())).await {
                        warn!(%err, "websocket write failed");
                        break;
                    }
                }
            },
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use crate::session::{Phase, Session};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[tokio::test]
    async fn test_session_over_websocket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let origin = Arc::new(Mutex::new(None::<String>));
        let seen_origin = origin.clone();

        let host = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = move |request: &Request, response: Response| -> std::result::Result<Response, ErrorResponse> {
                *seen_origin.lock().unwrap() = request
                    .headers()
                    .get("Origin")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(response)
            };
            let mut socket = tokio_tungstenite::accept_hdr_async(tcp, callback).await.unwrap();
            let received = match socket.next().await {
                Some(Ok(Message::Binary(data))) => data,
                other => panic!("unexpected message: {other:?}"),
            };
            socket
                .send(Message::binary(b"\x1b[1;1Hhello".to_vec()))
                .await
                .unwrap();
            let _ = socket.next().await;
            received
        });

        let mut config = Config::default();
        config.protocol = Protocol::WebSocket;
        config.url = format!("ws://127.0.0.1:{port}/bbs");
        config.origin = Some("https://example.org".to_string());
        config.timeout_ms = 50;
        let mut session = Session::new(config);
        session.connect().await.unwrap();
        assert_eq!(session.state().phase(), Phase::Connected);

        assert!(session.send("x").await.unwrap());
        assert_eq!(session.screen().text(0), "hello");

        session.disconnect();
        let received = tokio::time::timeout(Duration::from_secs(2), host)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, b"x");
        assert_eq!(origin.lock().unwrap().as_deref(), Some("https://example.org"));
    }

    #[tokio::test]
    async fn test_rejects_bad_origin() {
        let mut config = Config::default();
        config.url = "ws://127.0.0.1:1/bbs".to_string();
        config.origin = Some("bad\norigin".to_string());
        assert!(matches!(connect(&config).await, Err(BotError::Config(_))));
    }
}
