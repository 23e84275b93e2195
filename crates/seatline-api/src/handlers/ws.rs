//! WebSocket upgrade handlers for passenger, driver, and user sockets.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use seatline_core::types::{DriverId, TripId, UserId};
use seatline_realtime::{ConnectionHandle, OutboundFrame};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for passenger sockets.
#[derive(Debug, Default, Deserialize)]
pub struct TripSocketQuery {
    /// Also deliver this user's booking updates on the socket.
    pub user_id: Option<UserId>,
}

/// GET /ws/trips/{trip_id}?user_id=: passenger socket for one trip
pub async fn trip_socket(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    Query(query): Query<TripSocketQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    state.services.trips.get_trip(trip_id).await?;

    Ok(ws.on_upgrade(move |socket| async move {
        let (handle, outbound_rx) = state.hub.register_passenger(trip_id, query.user_id).await;
        send_latest_location(&state, &handle, trip_id).await;
        serve_socket(state, handle, outbound_rx, socket).await;
    }))
}

/// GET /ws/drivers/{driver_id}: driver socket
pub async fn driver_socket(
    State(state): State<AppState>,
    Path(driver_id): Path<DriverId>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (handle, outbound_rx) = state.hub.register_driver(driver_id).await;
        serve_socket(state, handle, outbound_rx, socket).await;
    })
}

/// GET /ws/users/{user_id}: booking updates for one user
pub async fn user_socket(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (handle, outbound_rx) = state.hub.register_user(user_id).await;
        serve_socket(state, handle, outbound_rx, socket).await;
    })
}

/// New passengers see the vehicle right away instead of waiting for the
/// next fix.
async fn send_latest_location(state: &AppState, handle: &ConnectionHandle, trip_id: TripId) {
    match state.services.tracking.get_current_location(trip_id).await {
        Ok(Some(location)) => {
            if let Ok(text) = serde_json::to_string(&OutboundFrame::LocationUpdate(location)) {
                handle.send(&text);
            }
        }
        Ok(None) => {}
        Err(e) => debug!(trip_id = %trip_id, error = %e, "No initial location"),
    }
}

/// Pumps frames both ways until either side closes.
async fn serve_socket(
    state: AppState,
    handle: Arc<ConnectionHandle>,
    mut outbound_rx: mpsc::Receiver<String>,
    socket: WebSocket,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let conn_id = handle.id;

    info!(conn_id = %conn_id, role = ?handle.role, "WebSocket connection established");

    // Spawn outbound message forwarder
    let writer = handle.clone();
    let outbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = writer.closed() => break,
                next = outbound_rx.recv() => match next {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    // Process inbound messages
    loop {
        tokio::select! {
            _ = handle.closed() => break,
            next = ws_rx.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    state.ingress.handle_frame(&handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    // Cleanup
    state.hub.unregister(&conn_id).await;
    outbound_task.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
