//! Ordered room membership.

use std::sync::Arc;

use fingerfight_engine::{BroadcastGateway, PlayerSink};
use fingerfight_protocol::{PLAYER_COLORS, Player, PlayerColor, PlayerId, ServerMessage};

struct Member {
    player: Player,
    sink: Arc<dyn PlayerSink>,
    ready: bool,
}

/// Members in join order. The host is always the earliest remaining
/// joiner, and no two members share a color.
#[derive(Default)]
pub(crate) struct Members {
    list: Vec<Member>,
}

/// What [`Members::remove`] took out.
pub(crate) struct Removed {
    pub was_host: bool,
    pub new_host: Option<PlayerId>,
}

impl Members {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.list.first().map(|m| m.player.id)
    }

    pub fn nickname_taken(&self, nickname: &str) -> bool {
        let wanted = nickname.to_lowercase();
        self.list
            .iter()
            .any(|m| m.player.nickname.to_lowercase() == wanted)
    }

    /// First palette color nobody holds; the first color if all four are
    /// taken.
    fn free_color(&self) -> PlayerColor {
        PLAYER_COLORS
            .into_iter()
            .find(|c| self.list.iter().all(|m| m.player.color != *c))
            .unwrap_or(PLAYER_COLORS[0])
    }

    pub fn add(&mut self, id: PlayerId, nickname: String, sink: Arc<dyn PlayerSink>) -> Player {
        let player = Player {
            id,
            nickname,
            color: self.free_color(),
            is_host: self.list.is_empty(),
            is_cpu: false,
            connected: true,
        };
        self.list.push(Member {
            player: player.clone(),
            sink,
            ready: false,
        });
        player
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Removed> {
        let index = self.list.iter().position(|m| m.player.id == id)?;
        self.list.remove(index);
        let was_host = index == 0;
        let new_host = if was_host {
            self.list.first_mut().map(|m| {
                m.player.is_host = true;
                m.player.id
            })
        } else {
            None
        };
        Some(Removed { was_host, new_host })
    }

    /// Current players, with `connected` read from each sink.
    pub fn players(&self) -> Vec<Player> {
        self.list
            .iter()
            .map(|m| Player {
                connected: m.sink.is_connected(),
                ..m.player.clone()
            })
            .collect()
    }

    pub fn mark_ready(&mut self, id: PlayerId) -> bool {
        match self.list.iter_mut().find(|m| m.player.id == id) {
            Some(member) => {
                member.ready = true;
                true
            }
            None => false,
        }
    }

    pub fn ready_players(&self) -> Vec<PlayerId> {
        self.list
            .iter()
            .filter(|m| m.ready)
            .map(|m| m.player.id)
            .collect()
    }

    pub fn reset_ready(&mut self) {
        for member in &mut self.list {
            member.ready = false;
        }
    }

    /// Sends to one member. Silently drops if they are gone.
    pub fn send_to(&self, id: PlayerId, msg: &ServerMessage) {
        if let Some(member) = self.list.iter().find(|m| m.player.id == id) {
            member.sink.send(msg);
        }
    }
}

impl BroadcastGateway for Members {
    fn broadcast(&self, msg: &ServerMessage, exclude: Option<PlayerId>) {
        for member in &self.list {
            if Some(member.player.id) == exclude || !member.sink.is_connected() {
                continue;
            }
            member.sink.send(msg);
        }
    }
}
