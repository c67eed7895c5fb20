//! Byte transport between the session and the host.
//!
//! A connection is split into a reader task, which forwards inbound chunks as
//! [`TransportEvent`]s, and a writer task, which drains [`Outbound`]
//! messages and owns the idle-keepalive timer. The WebSocket gateway is
//! bridged into the same byte stream by [`websocket::connect`].

mod reader;
pub(crate) mod telnet;
pub mod websocket;

use crate::config::{Config, Protocol};
use crate::error::Result;
use crate::keys;
use reader::spawn_reader;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

/// Pause between the two keystrokes of a keepalive.
const KEEPALIVE_GAP: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum TransportEvent {
    Data(Vec<u8>),
    /// The connection ended, with the I/O error if there was one.
    Closed(Option<String>),
}

#[derive(Debug)]
pub(crate) enum Outbound {
    /// Encoded keystrokes from the session.
    Payload(Vec<u8>),
    /// Protocol bytes written verbatim.
    Raw(Vec<u8>),
    /// Arm the idle timer for the given interval, or clear it.
    Keepalive(Option<Duration>),
}

/// Both halves of an attached connection, as seen by the session.
/// Dropping it stops both tasks and closes the connection.
pub(crate) struct Wire {
    pub(crate) outbound: UnboundedSender<Outbound>,
    pub(crate) inbound: UnboundedReceiver<TransportEvent>,
    reader: JoinHandle<()>,
}

impl Drop for Wire {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Open a TCP connection to the configured host.
pub async fn connect(config: &Config) -> Result<TcpStream> {
    info!(host = %config.host, port = config.port, "connecting");
    let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Start the reader and writer tasks for `stream`.
pub(crate) fn spawn<S>(stream: S, protocol: Protocol) -> Wire
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let telnet = protocol == Protocol::Telnet;
    let (read_half, write_half) = tokio::io::split(stream);
    let (outbound, outbound_rx) = unbounded_channel();
    let (inbound, reader) = spawn_reader(read_half, telnet, outbound.downgrade());
    tokio::spawn(write_loop(write_half, outbound_rx, telnet));
    Wire {
        outbound,
        inbound,
        reader,
    }
}

async fn write_loop<W>(mut writer: W, mut rx: UnboundedReceiver<Outbound>, telnet: bool)
where
    W: AsyncWrite + Unpin,
{
    let mut interval: Option<Duration> = None;
    let mut deadline: Option<Instant> = None;
    loop {
        let at = deadline;
        let idle = async move {
            match at {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        let result = tokio::select! {
            message = rx.recv() => match message {
                Some(Outbound::Payload(bytes)) => {
                    if telnet {
                        write_all(&mut writer, &telnet::escape(&bytes)).await
                    } else {
                        write_all(&mut writer, &bytes).await
                    }
                }
                Some(Outbound::Raw(bytes)) => write_all(&mut writer, &bytes).await,
                Some(Outbound::Keepalive(armed)) => {
                    interval = armed;
                    deadline = interval.map(|d| Instant::now() + d);
                    Ok(())
                }
                None => break, // Session detached
            },
            () = idle => {
                debug!("sending idle keepalive");
                let sent = match write_all(&mut writer, keys::CTRL_U.as_bytes()).await {
                    Ok(()) => {
                        sleep(KEEPALIVE_GAP).await;
                        write_all(&mut writer, keys::ARROW_LEFT.as_bytes()).await
                    }
                    Err(err) => Err(err),
                };
                // Stays armed until the session clears it.
                deadline = interval.map(|d| Instant::now() + d);
                sent
            }
        };
        if let Err(err) = result {
            warn!(%err, "write to host failed");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

async fn write_all<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, duplex};
    use tokio::time::timeout;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    async fn collect(host: &mut tokio::io::DuplexStream, window: Duration) -> Vec<u8> {
        let mut received = Vec::new();
        let mut buf = [0u8; 256];
        let end = Instant::now() + window;
        while let Ok(Ok(n)) = tokio::time::timeout_at(end, host.read(&mut buf)).await {
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        received
    }

    #[tokio::test]
    async fn test_keepalive_repeats_while_idle() {
        let (client, mut host) = duplex(1024);
        let (tx, rx) = unbounded_channel();
        tokio::spawn(write_loop(client, rx, false));
        tx.send(Outbound::Keepalive(Some(Duration::from_millis(20))))
            .unwrap();

        let received = collect(&mut host, Duration::from_millis(600)).await;
        assert!(count(&received, keys::CTRL_U.as_bytes()) >= 3, "got: {received:?}");
        assert!(count(&received, keys::ARROW_LEFT.as_bytes()) >= 3);
    }

    #[tokio::test]
    async fn test_cleared_keepalive_stays_quiet() {
        let (client, mut host) = duplex(1024);
        let (tx, rx) = unbounded_channel();
        tokio::spawn(write_loop(client, rx, false));
        tx.send(Outbound::Keepalive(Some(Duration::from_millis(20))))
            .unwrap();
        tx.send(Outbound::Keepalive(None)).unwrap();
        tx.send(Outbound::Payload(b"x".to_vec())).unwrap();

        let received = collect(&mut host, Duration::from_millis(200)).await;
        assert_eq!(received, b"x");
        drop(tx);
        let closed = timeout(Duration::from_millis(200), host.read(&mut [0u8; 8])).await;
        assert!(matches!(closed, Ok(Ok(0))));
    }

    #[tokio::test]
    async fn test_telnet_payload_is_escaped() {
        let (client, mut host) = duplex(1024);
        let (tx, rx) = unbounded_channel();
        tokio::spawn(write_loop(client, rx, true));
        tx.send(Outbound::Payload(vec![b'a', 0xff])).unwrap();
        let received = collect(&mut host, Duration::from_millis(100)).await;
        assert_eq!(received, vec![b'a', 0xff, 0xff]);
    }
}
