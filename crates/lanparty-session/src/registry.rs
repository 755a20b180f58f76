//! The player registry.
//!
//! Players are kept in registration order. A player's lobby number is its
//! 1-based position in that order, rewritten for every player whenever a
//! new one registers. Unregistering does not renumber: numbers are only
//! guaranteed to be the dense range `1..=len` right after a registration.
//!
//! Registering "nothing" is not expressible here (a [`Player`] is always a
//! value), so the only rejected registration is a duplicate id.

use lanparty_protocol::PlayerId;
use tracing::{debug, info, warn};

use crate::Player;

/// Players attached to the current session, in registration order.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    local: Option<PlayerId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `player` and renumbers everyone by position.
    ///
    /// Returns the stored player, or `None` (with a warning) if a player
    /// with the same id is already registered.
    pub fn register(&mut self, player: Player) -> Option<&Player> {
        if self.contains(player.id) {
            warn!(player = %player.id, "player already registered, ignoring");
            return None;
        }

        if player.is_local {
            if let Some(previous) = self.local.replace(player.id) {
                warn!(%previous, player = %player.id, "replacing local player");
            }
        }

        self.players.push(player);
        for (index, p) in self.players.iter_mut().enumerate() {
            p.number = index as u32 + 1;
        }

        let registered = self.players.last()?;
        info!(
            player = %registered.id,
            number = registered.number,
            local = registered.is_local,
            "player registered"
        );
        Some(registered)
    }

    /// Removes the player with `id`, returning it. `None` if absent.
    pub fn unregister(&mut self, id: PlayerId) -> Option<Player> {
        let Some(index) = self.players.iter().position(|p| p.id == id) else {
            debug!(player = %id, "player not registered, nothing to unregister");
            return None;
        };

        let player = self.players.remove(index);
        if self.local == Some(id) {
            self.local = None;
        }
        info!(player = %id, number = player.number, "player unregistered");
        Some(player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// All players in registration order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The player driven by this process, if registered.
    pub fn local_player(&self) -> Option<&Player> {
        self.local.and_then(|id| self.get(id))
    }

    /// Sets a player's readiness flag and returns the previous value, or
    /// `None` if the player is unknown.
    pub fn set_ready(&mut self, id: PlayerId, ready: bool) -> Option<bool> {
        let player = self.players.iter_mut().find(|p| p.id == id)?;
        Some(std::mem::replace(&mut player.ready, ready))
    }

    /// `true` iff every registered player is ready. Vacuously `true` when
    /// nobody is registered.
    pub fn all_ready(&self) -> bool {
        self.players.iter().all(|p| p.ready)
    }

    pub fn ready_count(&self) -> usize {
        self.players.iter().filter(|p| p.ready).count()
    }

    /// Removes every player, returning them in registration order.
    pub fn clear(&mut self) -> Vec<Player> {
        self.local = None;
        std::mem::take(&mut self.players)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
