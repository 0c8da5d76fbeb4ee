use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::agent::{ImageService, TextStreamService};
use crate::models::{SessionSnapshot, WsClientEvent, WsEvent};
use crate::routes::{AppContext, LiveSession};
use crate::service::session::ChatSession;

/// GET `/ws/session` — upgrades to a WebSocket carrying one chat session.
pub async fn ws_session_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<AppContext>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx.new_session()))
}

/// Handles a single WebSocket connection; the session lives as long as the socket.
///
/// Protocol:
/// - Client sends `{ "type": "submit", "message": "..." }`
///   or `{ "type": "set_mode", "mode": "chat" | "image" }`
/// - Server pushes `{ "type": "snapshot", "messages": [...], "busy": ..., "error": ..., "mode": ... }`
///   after every state change, or `{ "type": "error", "message": "..." }` when a
///   request is rejected outright.
async fn handle_socket(mut socket: WebSocket, session: LiveSession) {
    info!("WebSocket client connected");

    let mut conn = Connection::new(session);
    let initial = WsEvent::Snapshot(conn.session.snapshot().await);

    if send_event(&mut socket, &initial).await {
        loop {
            let outgoing = tokio::select! {
                incoming = socket.recv() => {
                    let msg = match incoming {
                        Some(Ok(m)) => m,
                        Some(Err(e)) => {
                            warn!("WebSocket receive error: {e}");
                            break;
                        }
                        None => break,
                    };

                    // Only handle text messages
                    match &msg {
                        Message::Text(t) => conn.on_frame(t.as_str()).await,
                        Message::Close(_) => break,
                        _ => continue,
                    }
                }
                snapshot = conn.next_snapshot() => match snapshot {
                    Some(snap) => Some(WsEvent::Snapshot(snap)),
                    None => break,
                },
            };

            if let Some(event) = outgoing {
                if !send_event(&mut socket, &event).await {
                    break;
                }
            }
        }
    }

    // The store goes away with the socket, so an unfinished request has nowhere to land.
    conn.close();
    info!("WebSocket client disconnected");
}

/// Socket-independent side of one connection: routes client frames into the
/// session and yields the snapshots to forward.
struct Connection<T, I> {
    session: ChatSession<T, I>,
    snapshots: broadcast::Receiver<SessionSnapshot>,
    in_flight: Option<JoinHandle<()>>,
}

impl<T, I> Connection<T, I>
where
    T: TextStreamService,
    I: ImageService,
{
    fn new(session: ChatSession<T, I>) -> Self {
        let snapshots = session.subscribe();
        Self { session, snapshots, in_flight: None }
    }

    /// Applies one client frame; returns the event to send back when the
    /// frame is rejected outright.
    async fn on_frame(&mut self, text: &str) -> Option<WsEvent> {
        let event = match parse_client_event(text) {
            Ok(event) => event,
            Err(reply) => return Some(reply),
        };

        match event {
            WsClientEvent::SetMode { mode } => {
                self.session.set_mode(mode).await;
                None
            }
            WsClientEvent::Submit { message } => match self.session.begin(&message).await {
                Ok(submission) => {
                    self.in_flight = Some(tokio::spawn(async move {
                        match submission.run().await {
                            Ok(()) => {}
                            Err(e) if e.is_service_failure() => warn!("Submission failed: {e}"),
                            Err(e) => debug!("Submission finished with error: {e}"),
                        }
                    }));
                    None
                }
                Err(e) => {
                    if e.is_validation() {
                        debug!("Rejected blank submission");
                    }
                    Some(WsEvent::Error { message: e.banner() })
                }
            },
        }
    }

    /// Next snapshot in publish order. After a lag the skipped snapshots are
    /// gone and forwarding resumes at the oldest one still buffered, which is
    /// newer than anything already sent.
    async fn next_snapshot(&mut self) -> Option<SessionSnapshot> {
        loop {
            match self.snapshots.recv().await {
                Ok(snap) => return Some(snap),
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {skipped} snapshots"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Aborts the in-flight submission, if any, and hands back its task.
    fn close(&mut self) -> Option<JoinHandle<()>> {
        let handle = self.in_flight.take()?;
        handle.abort();
        Some(handle)
    }
}

/// Parses a client frame, or returns the error event to send back.
fn parse_client_event(text: &str) -> Result<WsClientEvent, WsEvent> {
    serde_json::from_str(text).map_err(|e| WsEvent::Error {
        message: format!("Invalid request: {e}"),
    })
}

/// Serializes a `WsEvent` and sends it; false once the client is gone.
async fn send_event(socket: &mut WebSocket, event: &WsEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize event: {e}");
            return true;
        }
    };
    match socket.send(Message::Text(json.into())).await {
        Ok(()) => true,
        Err(e) => {
            debug!("WebSocket send failed, closing: {e}");
            false
        }
    }
}
