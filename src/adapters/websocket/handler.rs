//! WebSocket upgrade handler for real-time connections.
//!
//! Connection lifecycle:
//! 1. Resolve the handshake identity (`?token=` or `?userId=`); reject
//!    with 401 before upgrading when it is missing or invalid
//! 2. Upgrade and register the connection (joins `user:<id>`, gets `welcome`)
//! 3. Pump the outbound queue into the socket while feeding client frames
//!    to the gateway
//! 4. On either side closing, remove the connection from every room

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

use super::gateway::{HandshakeParams, RealtimeGateway};
use super::messages::OutboundFrame;

/// State shared by every real-time connection.
#[derive(Clone)]
pub struct RealtimeState {
    pub gateway: Arc<RealtimeGateway>,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
}

impl RealtimeState {
    pub fn new(gateway: Arc<RealtimeGateway>, outbound_buffer: usize) -> Self {
        Self {
            gateway,
            outbound_buffer: outbound_buffer.max(1),
        }
    }
}

/// Route: `GET /realtime?token=<jwt>` or `GET /realtime?userId=<id>`
pub async fn realtime_ws_handler(
    State(state): State<RealtimeState>,
    Query(params): Query<HandshakeParams>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let user = match state.gateway.authenticate(&params).await {
        Ok(user) => user,
        Err(e) => return auth_rejection(e),
    };

    match ws {
        Some(ws) => ws.on_upgrade(move |socket| handle_socket(socket, user, state)),
        None => (StatusCode::UPGRADE_REQUIRED, "WebSocket upgrade required").into_response(),
    }
}

fn auth_rejection(error: AuthError) -> Response {
    tracing::debug!(error = %error, "real-time handshake rejected");
    let status = match error {
        AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::MissingCredential | AuthError::InvalidToken | AuthError::TokenExpired => {
            StatusCode::UNAUTHORIZED
        }
    };
    (status, error.to_string()).into_response()
}

async fn handle_socket(socket: WebSocket, user: AuthenticatedUser, state: RealtimeState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<OutboundFrame>(state.outbound_buffer);

    let gateway = state.gateway;
    let connection_id = gateway.connect(&user, tx);

    // Outbound: queue → socket. Ends when the registry drops the sender.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match frame.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(event = frame.name(), error = %e, "failed to encode frame");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                tracing::debug!(connection_id = %connection_id, error = %e, "send failed, closing");
                break;
            }
        }
    });

    // Inbound: socket → gateway.
    let recv_gateway = gateway.clone();
    let user_id = user.id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    recv_gateway.handle_text(connection_id, &user_id, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(connection_id = %connection_id, "ignoring binary frame");
                }
                Ok(Message::Close(_)) => break,
                // Protocol ping/pong is answered by axum
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    gateway.disconnect(connection_id);
}

/// Router exposing the real-time endpoint.
///
/// ```ignore
/// let app = Router::new()
///     .merge(realtime_router(state))
///     .route("/health", get(health));
/// ```
pub fn realtime_router(state: RealtimeState) -> Router {
    Router::new()
        .route("/realtime", get(realtime_ws_handler))
        .with_state(state)
}
