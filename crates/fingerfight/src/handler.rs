//! Per-connection handler: session, message routing and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Open a session → the connection gets its ephemeral `PlayerId`
//!   2. Spawn a writer task draining the player's outbox into the socket
//!   3. Loop: receive frames → rate-limit → decode → dispatch, while also
//!      answering heartbeat signals from the liveness sweep
//!   4. On close or timeout, leave the room and drop the session

use std::sync::Arc;

use fingerfight_engine::PlayerSink;
use fingerfight_protocol::{
    ClientMessage, Codec, ErrorCode, JsonCodec, PlayerId, ServerMessage, unix_millis,
};
use fingerfight_room::{RoomError, RoomHandle};
use fingerfight_session::{ConnectionSignal, SessionError};
use fingerfight_transport::{Connection, Incoming, WebSocketConnection};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::FingerFightError;
use crate::server::ServerState;

/// Longest nickname accepted, in characters, after trimming.
const MAX_NICKNAME_CHARS: usize = 12;

/// Why a single request failed. Reported to the sender as an `error`
/// frame; the connection stays open.
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error("nickname must be 1-12 characters")]
    InvalidNickname,

    #[error("not in a room")]
    NoRoom,

    #[error(transparent)]
    Room(#[from] RoomError),
}

impl RequestError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidNickname => ErrorCode::InvalidNickname,
            Self::NoRoom => ErrorCode::RoomNotFound,
            Self::Room(e) => e.code(),
        }
    }
}

/// Trims `raw` and checks its length.
fn validate_nickname(raw: &str) -> Result<String, RequestError> {
    let nickname = raw.trim();
    let chars = nickname.chars().count();
    if chars == 0 || chars > MAX_NICKNAME_CHARS {
        return Err(RequestError::InvalidNickname);
    }
    Ok(nickname.to_string())
}

/// One connected player, as seen from their handler task.
struct Client {
    player_id: PlayerId,
    /// Queue drained by the writer task.
    outbox: mpsc::UnboundedSender<ServerMessage>,
    /// The same queue, as handed to rooms.
    sink: Arc<dyn PlayerSink>,
    /// Cached so tap traffic skips the registry lock.
    room: Option<RoomHandle>,
}

impl Client {
    fn send(&self, msg: ServerMessage) {
        let _ = self.outbox.send(msg);
    }

    fn send_error(&self, code: ErrorCode, message: impl Into<String>) {
        self.send(ServerMessage::error(code, message));
    }

    fn current_room(&self) -> Result<&RoomHandle, RequestError> {
        self.room.as_ref().ok_or(RequestError::NoRoom)
    }

    /// Handles one inbound frame. Returns `false` once the session is gone.
    async fn handle_frame(&mut self, state: &ServerState, data: &[u8]) -> bool {
        let rate = {
            let mut sessions = state.sessions.lock().await;
            sessions.touch(self.player_id);
            sessions.check_rate(self.player_id)
        };
        match rate {
            Ok(()) => {}
            Err(SessionError::RateLimited(_)) => {
                self.send_error(ErrorCode::RateLimited, "Too many messages");
                return true;
            }
            Err(SessionError::NotFound(_)) => return false,
        }

        let msg: ClientMessage = match state.codec.decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(player_id = %self.player_id, error = %e, "failed to decode frame");
                self.send_error(ErrorCode::InvalidMessage, "Invalid message format");
                return true;
            }
        };

        let kind = msg.kind();
        if let Err(e) = self.dispatch(state, msg).await {
            debug!(player_id = %self.player_id, kind, error = %e, "request failed");
            self.send_error(e.code(), e.to_string());
        }
        true
    }

    async fn dispatch(&mut self, state: &ServerState, msg: ClientMessage) -> Result<(), RequestError> {
        match msg {
            ClientMessage::CreateRoom { nickname } => {
                let nickname = validate_nickname(&nickname)?;
                let mut rooms = state.rooms.lock().await;
                let snapshot = rooms
                    .create_room(self.player_id, nickname, Arc::clone(&self.sink))
                    .await;
                self.room = rooms.handle(snapshot.room_id);
            }

            ClientMessage::JoinRoom {
                room_code,
                nickname,
            } => {
                let nickname = validate_nickname(&nickname)?;
                let mut rooms = state.rooms.lock().await;
                let joined = rooms
                    .join_room(&room_code, self.player_id, nickname, Arc::clone(&self.sink))
                    .await;
                self.room = rooms.handle_for(self.player_id);
                joined?;
            }

            ClientMessage::LeaveRoom => self.leave(state).await,

            ClientMessage::StartMatch => {
                self.current_room()?.start_match(self.player_id).await?;
            }

            ClientMessage::UpdateSettings { settings } => {
                self.current_room()?
                    .update_settings(self.player_id, settings)
                    .await?;
            }

            // Tap and ready traffic outside a room is dropped silently.
            ClientMessage::TapData { payload } => {
                if let Some(room) = &self.room {
                    if let Err(e) = room.submit_taps(self.player_id, payload).await {
                        debug!(player_id = %self.player_id, error = %e, "taps not delivered");
                    }
                }
            }

            ClientMessage::Ready => {
                if let Some(room) = &self.room {
                    if let Err(e) = room.ready(self.player_id).await {
                        debug!(player_id = %self.player_id, error = %e, "ready not delivered");
                    }
                }
            }

            ClientMessage::Ping { timestamp } => self.send(ServerMessage::Pong {
                timestamp,
                server_time: unix_millis(),
            }),
        }
        Ok(())
    }

    /// Leaves the current room, if any. Same path for `leave-room` and
    /// disconnects.
    async fn leave(&mut self, state: &ServerState) {
        self.room = None;
        let departure = state.rooms.lock().await.remove_player(self.player_id).await;
        if let Some(departure) = departure {
            debug!(
                player_id = %self.player_id,
                room_id = %departure.room_id,
                remaining = departure.remaining,
                "left room"
            );
        }
    }
}

/// Drains `outbox` into the socket until every sender is gone or a send
/// fails.
async fn write_frames(
    conn: Arc<WebSocketConnection>,
    codec: JsonCodec,
    mut outbox: mpsc::UnboundedReceiver<ServerMessage>,
    player_id: PlayerId,
) {
    while let Some(msg) = outbox.recv().await {
        let text = match codec.encode(&msg).map(String::from_utf8) {
            Ok(Ok(text)) => text,
            _ => {
                warn!(%player_id, kind = msg.kind(), "failed to encode frame");
                continue;
            }
        };
        if let Err(e) = conn.send(&text).await {
            debug!(%player_id, error = %e, "send failed");
            break;
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), FingerFightError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    let (signal_tx, mut signals) = mpsc::unbounded_channel();
    let player_id = state.sessions.lock().await.open(signal_tx);
    info!(%conn_id, %player_id, "player connected");

    let (outbox, outbox_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(
        Arc::clone(&conn),
        state.codec,
        outbox_rx,
        player_id,
    ));
    let mut client = Client {
        player_id,
        sink: Arc::new(outbox.clone()),
        outbox,
        room: None,
    };

    let result = loop {
        tokio::select! {
            incoming = conn.recv() => match incoming {
                Ok(Some(Incoming::Data(data))) => {
                    if !client.handle_frame(&state, &data).await {
                        break Ok(());
                    }
                }
                Ok(Some(Incoming::Pong)) => {
                    state.sessions.lock().await.touch(player_id);
                }
                Ok(None) => {
                    info!(%player_id, "connection closed cleanly");
                    break Ok(());
                }
                Err(e) => break Err(FingerFightError::from(e)),
            },
            signal = signals.recv() => match signal {
                Some(ConnectionSignal::Ping) => {
                    if let Err(e) = conn.ping().await {
                        break Err(FingerFightError::from(e));
                    }
                }
                Some(ConnectionSignal::Disconnect) | None => {
                    info!(%player_id, "dropping silent connection");
                    break Ok(());
                }
            },
        }
    };

    client.leave(&state).await;
    let _ = state.sessions.lock().await.close(player_id);
    drop(client);
    writer.abort();
    let _ = conn.close().await;
    info!(%player_id, "player disconnected");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_trims() {
        assert_eq!(validate_nickname("  ana  ").unwrap(), "ana");
    }

    #[test]
    fn test_validate_nickname_length_bounds() {
        assert!(validate_nickname("a").is_ok());
        assert!(validate_nickname("abcdefghijkl").is_ok());
        assert!(matches!(
            validate_nickname("abcdefghijklm"),
            Err(RequestError::InvalidNickname)
        ));
        assert!(matches!(
            validate_nickname("   "),
            Err(RequestError::InvalidNickname)
        ));
        assert!(matches!(
            validate_nickname(""),
            Err(RequestError::InvalidNickname)
        ));
    }

    #[test]
    fn test_validate_nickname_counts_chars_not_bytes() {
        assert!(validate_nickname("éééééééééééé").is_ok());
    }

    #[test]
    fn test_request_error_codes() {
        assert_eq!(RequestError::InvalidNickname.code(), ErrorCode::InvalidNickname);
        assert_eq!(RequestError::NoRoom.code(), ErrorCode::RoomNotFound);
        assert_eq!(
            RequestError::from(RoomError::NotHost).code(),
            ErrorCode::NotHost
        );
    }
}
