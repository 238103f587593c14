//! WebSocket front end. Every frame a client sends is one request; nothing is
//! ever sent back, outcomes only show up in the log.

use crate::bridge::Bridge;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

/// Upgrades on any path.
pub fn router(bridge: Arc<Bridge>) -> Router {
    Router::new().fallback(upgrade).with_state(bridge)
}

pub async fn serve(
    listener: TcpListener,
    bridge: Arc<Bridge>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    log::info!("=== WS Server Started ws://{addr} ===");
    axum::serve(
        listener,
        router(bridge).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("WebSocket server failed")
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(bridge): State<Arc<Bridge>>,
) -> Response {
    ws.on_upgrade(move |socket| connection(socket, peer, bridge))
}

async fn connection(mut socket: WebSocket, peer: SocketAddr, bridge: Arc<Bridge>) {
    log::info!(
        "Client connected - Host[{}] Port[{}]",
        peer.ip(),
        peer.port()
    );

    while let Some(frame) = socket.recv().await {
        let outcome = match frame {
            Ok(Message::Text(text)) => bridge.handle(text.as_str().as_bytes()),
            Ok(Message::Binary(bytes)) => bridge.handle(&bytes),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(e) => {
                log::warn!("Connection error from {peer}: {e}");
                break;
            }
        };

        match outcome {
            Ok(sent) => log::debug!("Request from {peer} done - {sent}"),
            Err(e) => log::warn!("{e}. Aborting this message"),
        }
    }

    log::info!("Client disconnected - Host[{}] Port[{}]", peer.ip(), peer.port());
}
