//! Per-connection socket pump: parse inbound frames, dispatch through the
//! gateway, drain the outbound channel into the sink.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::directory::SessionDirectory;
use crate::gateway::Gateway;
use crate::protocol::ClientMessage;

/// Handle a single WebSocket connection from accept to teardown.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    directory: SessionDirectory,
) {
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut gateway = Gateway::connect(directory, tx).await;

    tracing::info!(peer = %addr, id = %gateway.peer(), "Client connected");

    // The loop has a single exit, so teardown below runs exactly once no
    // matter how closure is signaled.
    loop {
        tokio::select! {
            // Relayed traffic addressed to this client → its WebSocket.
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            // Frames from this client → gateway dispatch.
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => gateway.handle(msg).await,
                            Err(e) => {
                                tracing::warn!(peer = %addr, error = %e, "Unparseable message");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %addr, id = %gateway.peer(), "Client disconnected");
    gateway.disconnect().await;
}
