//! Transport seam between the connection client and the socket.
//!
//! A [`Connector`] opens one transport and hands back a [`TransportLink`]:
//! a bounded outgoing channel and an incoming channel of text frames and a
//! final close notice. [`WsConnector`] implements it over `tokio-tungstenite`
//! with one writer task and one reader task per socket.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace};
use wisebot_core::constants::{ABNORMAL_CLOSURE, NO_STATUS_RECEIVED};

use crate::errors::TransportError;

/// Default capacity of the link channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Item written to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outgoing {
    /// Text frame.
    Frame(String),
    /// Close handshake; the writer stops after sending it.
    Close {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// How a transport ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseInfo {
    /// Close code (1005 when the peer sent none, 1006 when the socket dropped).
    pub code: u16,
    /// Close reason or error text.
    pub reason: String,
}

impl CloseInfo {
    /// Close without a handshake.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: ABNORMAL_CLOSURE,
            reason: reason.into(),
        }
    }
}

/// Item read from the transport. `Closed` is always the last item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text frame.
    Frame(String),
    /// The transport ended.
    Closed(CloseInfo),
}

/// Channels of one open transport.
#[derive(Debug)]
pub struct TransportLink {
    /// Frames and close requests to write.
    pub outgoing: mpsc::Sender<Outgoing>,
    /// Frames read, followed by one close notice.
    pub incoming: mpsc::Receiver<TransportEvent>,
}

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a transport to `url`.
    async fn open(&self, url: &str) -> Result<TransportLink, TransportError>;
}

/// WebSocket connector.
#[derive(Clone, Debug)]
pub struct WsConnector {
    capacity: usize,
}

impl WsConnector {
    /// Connector whose link channels hold `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, url: &str) -> Result<TransportLink, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        debug!(url, "websocket handshake complete");
        let (mut sink, mut stream) = ws.split();

        let (out_tx, mut out_rx) = mpsc::channel::<Outgoing>(self.capacity);
        let (in_tx, in_rx) = mpsc::channel::<TransportEvent>(self.capacity);

        // Writer: drain outgoing into the socket.
        let _ = tokio::spawn(async move {
            while let Some(item) = out_rx.recv().await {
                match item {
                    Outgoing::Frame(text) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Outgoing::Close { code, reason } => {
                        let frame = CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        };
                        let _ = sink.send(Message::Close(Some(frame))).await;
                        break;
                    }
                }
            }
            let _ = sink.close().await;
            trace!("websocket writer finished");
        });

        // Reader: map socket messages to transport events.
        let _ = tokio::spawn(async move {
            let close = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if in_tx.send(TransportEvent::Frame(text.as_str().to_owned())).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => {
                            if in_tx
                                .send(TransportEvent::Frame(text.to_owned()))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(_) => debug!(len = data.len(), "dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map_or_else(
                            || CloseInfo {
                                code: NO_STATUS_RECEIVED,
                                reason: String::new(),
                            },
                            |f| CloseInfo {
                                code: u16::from(f.code),
                                reason: f.reason.as_str().to_owned(),
                            },
                        );
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break CloseInfo::abnormal(e.to_string()),
                    None => break CloseInfo::abnormal("stream ended"),
                }
            };
            let _ = in_tx.send(TransportEvent::Closed(close)).await;
            trace!("websocket reader finished");
        });

        Ok(TransportLink {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abnormal_close_code() {
        let info = CloseInfo::abnormal("reset");
        assert_eq!(info.code, 1006);
        assert_eq!(info.reason, "reset");
    }

    #[test]
    fn connector_capacity_is_positive() {
        assert_eq!(WsConnector::new(0).capacity, 1);
        assert_eq!(WsConnector::default().capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[tokio::test]
    async fn open_refused_is_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("ws://{addr}/ws/user_abc");
        let result = WsConnector::default().open(&url).await;
        assert!(matches!(result, Err(TransportError::Open(_))));
    }

    #[tokio::test]
    async fn open_invalid_url_is_error() {
        let result = WsConnector::default().open("not a url").await;
        assert!(result.is_err());
    }
}
