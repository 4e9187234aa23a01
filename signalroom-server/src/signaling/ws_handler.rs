use crate::lifecycle::ConnectionMeta;
use crate::server::AppState;
use crate::signaling::HubHandle;
use crate::transport::Outbound;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use signalroom_core::ConnectionId;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, instrument, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let meta = ConnectionMeta {
        remote_addr: Some(remote_addr),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };
    let AppState { hub, sessions } = state;
    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| {
        sessions.track_future(handle_socket(socket, connection_id, hub, meta))
    })
}

#[instrument(skip_all, name = "ws_session", fields(%connection_id))]
async fn handle_socket(
    socket: WebSocket,
    connection_id: ConnectionId,
    hub: HubHandle,
    meta: ConnectionMeta,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    if hub.connect(connection_id, tx, meta).await.is_err() {
        warn!("hub closed, rejecting websocket");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let msg = match outbound {
                Outbound::Text(text) => Message::Text(text.into()),
                Outbound::Ping => Message::Ping(Bytes::new()),
                Outbound::Close => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::AWAY,
                            reason: Utf8Bytes::from_static("server shutting down"),
                        })))
                        .await;
                    break;
                }
                Outbound::Terminate => break,
            };
            if let Err(e) = sender.send(msg).await {
                debug!(error = %e, "websocket write failed");
                break;
            }
        }
    }
    .in_current_span());

    let mut recv_task = tokio::spawn({
        let hub = hub.clone();

        async move {
            while let Some(msg) = receiver.next().await {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        error!(error = %e, "websocket read failed");
                        break;
                    }
                };
                let sent = match msg {
                    Message::Text(text) => hub.frame(connection_id, text.as_str().to_owned()).await,
                    Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => hub.frame(connection_id, text).await,
                        Err(_) => {
                            debug!("dropping non-UTF-8 binary frame");
                            Ok(())
                        }
                    },
                    Message::Pong(_) => hub.pong(connection_id).await,
                    Message::Close(_) => break,
                    Message::Ping(_) => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
        .in_current_span()
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // The hub may already have forgotten this connection after a heartbeat
    // timeout or shutdown; a second disconnect is a no-op there.
    let _ = hub.disconnect(connection_id).await;
    info!("websocket finished");
}
