use super::telnet::TelnetFilter;
use super::{Outbound, TransportEvent};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns a background task reading from the host connection.
///
/// With `telnet` set, negotiation is stripped from the stream and replies are
/// queued on `outbound` as raw bytes. The sender is weak so that dropping the
/// session's handle still shuts the writer down.
pub(crate) fn spawn_reader<R: AsyncRead + Send + Unpin + 'static>(
    mut reader: R,
    telnet: bool,
    outbound: WeakUnboundedSender<Outbound>,
) -> (UnboundedReceiver<TransportEvent>, JoinHandle<()>) {
    let (tx, rx) = unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut filter = telnet.then(TelnetFilter::new);
        let mut buffer = [0u8; 4096];
        let reason = loop {
            match reader.read(&mut buffer).await {
                Ok(0) => break None, // EOF
                Ok(n) => {
                    let data = match filter.as_mut() {
                        Some(filter) => {
                            let data = filter.feed(&buffer[..n]);
                            let replies = filter.take_replies();
                            if !replies.is_empty() {
                                if let Some(outbound) = outbound.upgrade() {
                                    let _ = outbound.send(Outbound::Raw(replies));
                                }
                            }
                            data
                        }
                        None => buffer[..n].to_vec(),
                    };
                    if data.is_empty() {
                        continue;
                    }
                    if tx.send(TransportEvent::Data(data)).is_err() {
                        return; // Session dropped
                    }
                }
                Err(err) => break Some(err.to_string()),
            }
        };
        debug!(?reason, "host connection closed");
        let _ = tx.send(TransportEvent::Closed(reason));
    });

    (rx, handle)
}
