use futures::{SinkExt, StreamExt};
use shared::{error::ChannelError, protocol::Frame};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

use crate::ChannelSink;

/// Inbound half of the channel: decoded frames plus the single
/// termination notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSignal {
    Message { channel: String, payload: String },
    Terminated { reason: String },
}

/// Websocket-backed named-channel messenger. A writer task drains the
/// outbound queue; a reader task decodes inbound frames into
/// [`ChannelSignal`]s. Transport-level resilience (reconnection,
/// backoff) is not provided here.
pub struct WsChannel {
    outbound: mpsc::UnboundedSender<Frame>,
}

impl WsChannel {
    /// Connects to `server_url` and returns the sink half plus the
    /// inbound signal stream. `http(s)://` urls are rewritten to the
    /// websocket scheme; the `/ws` endpoint is appended.
    pub async fn connect(
        server_url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelSignal>), ChannelError> {
        let ws_url = normalize_ws_url(server_url)?;
        let (ws_stream, _) = connect_async(&ws_url).await.map_err(|err| {
            ChannelError::Transport(format!("failed to connect websocket {ws_url}: {err}"))
        })?;
        let (mut writer, mut reader) = ws_stream.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
        let (signals, signals_rx) = mpsc::unbounded_channel::<ChannelSignal>();

        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(err) => {
                        error!(%err, channel = %frame.channel, "failed to encode frame");
                        continue;
                    }
                };
                if let Err(err) = writer.send(Message::Text(text)).await {
                    warn!(%err, "websocket send failed");
                    break;
                }
            }
            debug!("websocket writer finished");
        });

        tokio::spawn(async move {
            let mut terminated = false;
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<Frame>(&text) {
                        Ok(frame) => {
                            let _ = signals.send(ChannelSignal::Message {
                                channel: frame.channel,
                                payload: frame.payload,
                            });
                        }
                        Err(err) => {
                            let err = ChannelError::InvalidFrame(err.to_string());
                            warn!(%err, "dropping inbound frame");
                        }
                    },
                    Ok(Message::Close(close)) => {
                        let reason = close
                            .map(|frame| frame.reason.to_string())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "connection closed by peer".to_string());
                        let _ = signals.send(ChannelSignal::Terminated { reason });
                        terminated = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let _ = signals.send(ChannelSignal::Terminated {
                            reason: format!("websocket receive failed: {err}"),
                        });
                        terminated = true;
                        break;
                    }
                }
            }
            if !terminated {
                let _ = signals.send(ChannelSignal::Terminated {
                    reason: "connection closed".to_string(),
                });
            }
            debug!("websocket reader finished");
        });

        Ok((Self { outbound }, signals_rx))
    }
}

impl ChannelSink for WsChannel {
    fn send(&self, channel: &'static str, payload: String) {
        if self.outbound.send(Frame::new(channel, payload)).is_err() {
            warn!(%channel, "dropping outbound message: channel writer is gone");
        }
    }
}

fn normalize_ws_url(server_url: &str) -> Result<String, ChannelError> {
    let base = if server_url.starts_with("ws://") || server_url.starts_with("wss://") {
        server_url.to_string()
    } else if server_url.starts_with("https://") {
        server_url.replacen("https://", "wss://", 1)
    } else if server_url.starts_with("http://") {
        server_url.replacen("http://", "ws://", 1)
    } else {
        return Err(ChannelError::Transport(format!(
            "server_url must start with ws://, wss://, http:// or https://: {server_url}"
        )));
    };
    Ok(format!("{}/ws", base.trim_end_matches('/')))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
