use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{RECV_TIMEOUT_MS, SILENCE_MS};

/// A real websocket client speaking the relay's JSON protocol.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_path(addr, "/ws").await
    }

    pub async fn connect_path(addr: SocketAddr, path: &str) -> Result<Self> {
        let url = format!("ws://{addr}{path}");
        let (stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to {url}"))?;
        Ok(Self { stream })
    }

    pub async fn join(&mut self, room: &str, role: &str) -> Result<()> {
        self.send_json(&json!({"type": "join", "roomId": room, "role": role}))
            .await
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<()> {
        self.send_text(&value.to_string()).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) -> Result<()> {
        self.stream.send(Message::Binary(data.into())).await?;
        Ok(())
    }

    /// Next JSON text frame. Pings are answered by the library while reading.
    pub async fn recv_json(&mut self) -> Result<Value> {
        loop {
            let msg = timeout(Duration::from_millis(RECV_TIMEOUT_MS), self.stream.next())
                .await
                .context("timed out waiting for a frame")?
                .context("stream ended")??;
            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => bail!("expected a text frame, got {other:?}"),
            }
        }
    }

    /// Reads until the server closes the socket, returning its close frame.
    pub async fn recv_close(&mut self) -> Result<Option<CloseFrame>> {
        loop {
            let next = timeout(Duration::from_millis(RECV_TIMEOUT_MS), self.stream.next())
                .await
                .context("timed out waiting for close")?;
            match next {
                None => return Ok(None),
                Some(Err(_)) => return Ok(None),
                Some(Ok(Message::Close(frame))) => return Ok(frame),
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Asserts no text frame arrives for a short while.
    pub async fn expect_silence(&mut self) -> Result<()> {
        match timeout(Duration::from_millis(SILENCE_MS), self.recv_json()).await {
            Err(_) => Ok(()),
            Ok(Err(_)) => Ok(()),
            Ok(Ok(frame)) => bail!("unexpected frame: {frame}"),
        }
    }

    /// Drops the TCP connection without a close handshake.
    pub fn abort(self) {
        drop(self.stream);
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
