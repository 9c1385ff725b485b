use std::sync::Arc;

use atrium_core::channels::FRAME_CONNECTED;
use atrium_core::types::DbId;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::notifications::NotificationRouter;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Browsers cannot set headers on a WebSocket handshake, so the access token
/// travels in the query string.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: Option<String>,
}

/// GET /api/v1/ws?token=<access token>
///
/// Validates the token and the account before upgrading; rejected
/// handshakes get the usual JSON error with 401.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
) -> AppResult<impl IntoResponse> {
    let token = params
        .token
        .ok_or_else(|| AppError::unauthorized("Missing token query parameter"))?;
    let claims = validate_token(&token, &state.config.jwt)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    let profile = state
        .gate
        .profile(claims.sub)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::unauthorized("Account is inactive"))?;

    let notifier = NotificationRouter::new(state.pool.clone(), Arc::clone(&state.ws_manager));
    let manager = Arc::clone(&state.ws_manager);
    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, manager, notifier, profile.user_id, profile.home_tenant_id)
    }))
}

/// Drive one upgraded socket.
///
/// Order on the wire: the `connected` frame, then any backlog of missed
/// notifications, then live traffic from the manager channel. The socket is
/// registered first so nothing routed during the replay is lost; it waits in
/// the channel until the backlog has been written.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    notifier: NotificationRouter,
    user_id: DbId,
    tenant_id: Option<DbId>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id, tenant_id).await;

    let (mut sink, mut stream) = socket.split();

    let hello = serde_json::json!({
        "type": FRAME_CONNECTED,
        "connection_id": conn_id,
        "user_id": user_id,
    });
    if sink
        .send(Message::Text(hello.to_string().into()))
        .await
        .is_err()
    {
        ws_manager.remove(&conn_id).await;
        return;
    }

    match notifier.replay_backlog(user_id, &mut sink).await {
        Ok(0) => {}
        Ok(count) => tracing::debug!(conn_id = %conn_id, user_id, count, "Replayed notification backlog"),
        Err(e) => tracing::warn!(conn_id = %conn_id, user_id, error = %e, "Failed to replay notification backlog"),
    }

    // Forward channel messages to the sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Clients only answer pings; anything else they send is ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}
