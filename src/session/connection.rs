//! One websocket connection to a room endpoint.
//!
//! The handle owns exactly one connection; there is no buffering, no
//! retry and no automatic reconnect. Reconnection means dropping this
//! handle, opening a new one and re-sending the join action.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::SessionError;
use crate::models::ClientAction;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the room endpoint URL: `{base}/chess/{room}/?token={token}`.
/// The bearer token travels as a query parameter.
pub fn build_room_url(base: &str, room_id: &str, token: &str) -> Result<Url, SessionError> {
    let mut url = Url::parse(base)?;
    let base_path = url.path().trim_end_matches('/');
    let path = format!("{}/chess/{}/", base_path, room_id);
    url.set_path(&path);
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// An open websocket session.
pub struct SessionConnection {
    sender: SessionSender,
    receiver: SessionReceiver,
}

/// Outbound half of a connection.
pub struct SessionSender {
    write: SplitSink<WsStream, Message>,
}

/// Inbound half of a connection.
pub struct SessionReceiver {
    read: SplitStream<WsStream>,
}

impl SessionConnection {
    /// Open the connection. Callers must not `send` until this returns.
    pub async fn open(url: &Url) -> Result<Self, SessionError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(SessionError::Connect)?;
        info!(
            "websocket connection established: {}",
            url.host_str().unwrap_or("?")
        );
        let (write, read) = stream.split();
        Ok(SessionConnection {
            sender: SessionSender { write },
            receiver: SessionReceiver { read },
        })
    }

    pub async fn send(&mut self, action: &ClientAction) -> Result<(), SessionError> {
        self.sender.send(action).await
    }

    pub async fn recv(&mut self) -> Result<Option<String>, SessionError> {
        self.receiver.recv().await
    }

    pub async fn close(self) {
        self.sender.close().await;
    }

    /// Split into independently owned halves, for drivers that select
    /// over inbound frames while sending from event handlers.
    pub fn into_split(self) -> (SessionSender, SessionReceiver) {
        (self.sender, self.receiver)
    }
}

impl SessionSender {
    /// Send one action frame. At-most-once: a transport error means the
    /// frame may not have been delivered and will not be retried here.
    pub async fn send(&mut self, action: &ClientAction) -> Result<(), SessionError> {
        let payload = serde_json::to_string(action)?;
        self.write.send(Message::Text(payload)).await?;
        Ok(())
    }

    /// Close the connection. Consumes the handle, so a double close
    /// cannot happen; errors on the close frame are ignored.
    pub async fn close(mut self) {
        let _ = self.write.send(Message::Close(None)).await;
    }
}

impl SessionReceiver {
    /// Next inbound text frame, in transport delivery order. Ping/pong
    /// is handled by the transport layer; `Ok(None)` means the peer
    /// closed.
    pub async fn recv(&mut self) -> Result<Option<String>, SessionError> {
        while let Some(frame) = self.read.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Binary(_) => {
                    warn!("binary frames are not part of the protocol");
                }
                Message::Close(reason) => {
                    info!("connection closed by server: {:?}", reason);
                    return Ok(None);
                }
                Message::Frame(_) => {}
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_url_carries_path_and_token() {
        let url = build_room_url("ws://example.org", "room-42", "sekrit").unwrap();
        assert_eq!(url.as_str(), "ws://example.org/chess/room-42/?token=sekrit");
    }

    #[test]
    fn room_url_preserves_a_base_path() {
        let url = build_room_url("wss://example.org/api/", "r1", "t").unwrap();
        assert_eq!(url.path(), "/api/chess/r1/");
        assert_eq!(url.query(), Some("token=t"));
    }

    #[test]
    fn bad_base_url_is_an_error() {
        assert!(build_room_url("not a url", "r1", "t").is_err());
    }
}
