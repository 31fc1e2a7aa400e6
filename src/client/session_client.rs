use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::client::replica::WorkspaceReplica;
use crate::models::{ClientEvent, ServerEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid message: {0}")]
    Codec(#[from] serde_json::Error),
}

/// WebSocket client for a collaboration session
pub struct SessionClient {
    sink: SplitSink<Socket, Message>,
    stream: SplitStream<Socket>,
}

impl SessionClient {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _response) = connect_async(url).await?;
        info!("Connected to {}", url);
        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let text = serde_json::to_string(event)?;
        self.sink.send(Message::text(text)).await?;
        Ok(())
    }

    /// Send a raw text frame, bypassing the typed protocol.
    pub async fn send_raw(&mut self, text: &str) -> Result<(), ClientError> {
        self.sink.send(Message::text(text.to_string())).await?;
        Ok(())
    }

    /// Next server event, or `None` once the server closed the socket.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                Message::Close(_) => return Ok(None),
                other => debug!("Skipping non-text frame: {:?}", other),
            }
        }
        Ok(None)
    }

    /// Receive one event, apply it to the replica and send back whatever the
    /// replica asks for (sync answers to a newcomer).
    pub async fn pump(&mut self, replica: &mut WorkspaceReplica) -> Result<Option<ServerEvent>, ClientError> {
        let Some(event) = self.next_event().await? else {
            return Ok(None);
        };
        for request in replica.apply(&event) {
            self.send(&request).await?;
        }
        Ok(Some(event))
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.close().await?;
        Ok(())
    }
}
