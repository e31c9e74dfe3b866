//! Outbound delivery seams.
//!
//! The orchestrator emits every event through a [`BroadcastGateway`]. The
//! room actor implements it over its members' [`PlayerSink`]s; the local
//! adapter implements it with a closure. Neither the engine nor the room
//! ever sees a socket.

use fingerfight_protocol::{PlayerId, ServerMessage};
use tokio::sync::mpsc;

/// A capability for pushing messages to one player.
pub trait PlayerSink: Send + Sync {
    /// Queues `msg` for delivery. Returns false if the player is gone.
    fn send(&self, msg: &ServerMessage) -> bool;

    fn is_connected(&self) -> bool;
}

/// An unbounded channel to a connection's writer task is the usual sink.
impl PlayerSink for mpsc::UnboundedSender<ServerMessage> {
    fn send(&self, msg: &ServerMessage) -> bool {
        mpsc::UnboundedSender::send(self, msg.clone()).is_ok()
    }

    fn is_connected(&self) -> bool {
        !self.is_closed()
    }
}

/// Fan-out to every member of a match or room.
///
/// Fire-and-forget: implementations skip disconnected members silently
/// and never block the caller.
pub trait BroadcastGateway {
    fn broadcast(&self, msg: &ServerMessage, exclude: Option<PlayerId>);
}

/// Adapts a closure into a [`BroadcastGateway`].
pub struct FnGateway<F>(pub F);

impl<F> BroadcastGateway for FnGateway<F>
where
    F: Fn(&ServerMessage, Option<PlayerId>),
{
    fn broadcast(&self, msg: &ServerMessage, exclude: Option<PlayerId>) {
        (self.0)(msg, exclude)
    }
}
