//! HTTP front end: one request per POST, answered with JSON and a status code.

use crate::bridge::{Bridge, BridgeError, SentNote};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const LIVENESS_TEXT: &str = "MIDI Bridge API Running";
pub const TEAPOT_TEXT: &str = "418 I'm a teapot";

pub fn router(bridge: Arc<Bridge>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/midi", post(send_midi))
        .route("/devices", get(devices))
        .route("/teapot", get(teapot))
        .with_state(bridge)
}

pub async fn serve(
    listener: TcpListener,
    bridge: Arc<Bridge>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    log::info!("=== HTTP Server Started http://{addr} ===");
    axum::serve(listener, router(bridge))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

#[derive(Serialize)]
struct Reply<'a> {
    success: bool,
    msg: String,
    #[serde(flatten)]
    sent: Option<&'a SentNote>,
}

async fn send_midi(State(bridge): State<Arc<Bridge>>, body: Bytes) -> Response {
    match bridge.handle(&body) {
        Ok(sent) => Json(Reply {
            success: true,
            msg: "Successfully sent MIDI message".to_string(),
            sent: Some(&sent),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn devices(State(bridge): State<Arc<Bridge>>) -> Response {
    match bridge.registry().current_devices() {
        Ok(names) => Json(names).into_response(),
        Err(e) => {
            log::error!("Listing MIDI devices failed: {e}");
            let reply = Reply {
                success: false,
                msg: e.to_string(),
                sent: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(reply)).into_response()
        }
    }
}

async fn teapot() -> (StatusCode, &'static str) {
    (StatusCode::IM_A_TEAPOT, TEAPOT_TEXT)
}

async fn index() -> &'static str {
    LIVENESS_TEXT
}

pub fn status_of(error: &BridgeError) -> StatusCode {
    match error {
        BridgeError::PortOpenFailure(_) | BridgeError::SendFailure { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        BridgeError::MalformedPayload(_)
        | BridgeError::UnknownDevice(_)
        | BridgeError::TypeMismatch
        | BridgeError::ChannelOutOfRange(_)
        | BridgeError::NoteOutOfRange(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let msg = format!("{self}. Aborting request");
        log::info!("{msg}");
        let reply = Reply {
            success: false,
            msg,
            sent: None,
        };
        (status_of(&self), Json(reply)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_trouble_is_a_server_error() {
        assert_eq!(
            status_of(&BridgeError::PortOpenFailure("Synth A".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(&BridgeError::SendFailure {
                device: "Synth A".into(),
                reason: "gone".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_input_is_a_client_error() {
        for e in [
            BridgeError::MalformedPayload("eof".into()),
            BridgeError::UnknownDevice("Nope".into()),
            BridgeError::TypeMismatch,
            BridgeError::ChannelOutOfRange("16".into()),
            BridgeError::NoteOutOfRange("-1".into()),
        ] {
            assert_eq!(status_of(&e), StatusCode::BAD_REQUEST, "{e}");
        }
    }

    #[test]
    fn success_reply_layout() {
        let sent = SentNote {
            channel: 2,
            note: 60,
            device: "TestPort".into(),
        };
        let reply = Reply {
            success: true,
            msg: "ok".into(),
            sent: Some(&sent),
        };
        let text = serde_json::to_string(&reply).unwrap();
        assert!(text.contains(r#""channel":2,"note":60,"device":"TestPort""#), "{text}");
    }
}
