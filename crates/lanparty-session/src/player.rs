//! Player records.

use std::fmt;

use lanparty_protocol::PlayerId;
use serde::{Deserialize, Serialize};

/// One player attached to the session.
///
/// `id` is the stable network id assigned by the host. `number` is the
/// player's 1-based lobby slot; it is not stored authoritatively but
/// rewritten by the [`PlayerRegistry`](crate::PlayerRegistry) from list
/// position on every registration, so it can change while the player is
/// connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub number: u32,
    pub ready: bool,
    /// Whether this player is driven by this process.
    pub is_local: bool,
    pub label: String,
}

impl Player {
    /// A remote player, not ready, not numbered yet.
    pub fn new(id: PlayerId, label: impl Into<String>) -> Self {
        Self {
            id,
            number: 0,
            ready: false,
            is_local: false,
            label: label.into(),
        }
    }

    /// The player owned by this process.
    pub fn local(id: PlayerId, label: impl Into<String>) -> Self {
        Self {
            is_local: true,
            ..Self::new(id, label)
        }
    }

    /// Display color, derived from the lobby number.
    pub fn color(&self) -> PlayerColor {
        PlayerColor::for_number(self.number)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.number, self.label, self.id)
    }
}

// ---------------------------------------------------------------------------
// PlayerColor
// ---------------------------------------------------------------------------

/// The fixed lobby palette. Numbers past the end wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Cyan,
    Pink,
}

impl PlayerColor {
    pub const PALETTE: [PlayerColor; 8] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::Orange,
        Self::Cyan,
        Self::Pink,
    ];

    /// Color for lobby slot `number` (1-based). Slot 0 maps to the first color.
    pub fn for_number(number: u32) -> Self {
        let index = number.saturating_sub(1) as usize % Self::PALETTE.len();
        Self::PALETTE[index]
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Red => [0xe6, 0x39, 0x46],
            Self::Blue => [0x1d, 0x6f, 0xd8],
            Self::Green => [0x2a, 0x9d, 0x4b],
            Self::Yellow => [0xf4, 0xc4, 0x30],
            Self::Purple => [0x8e, 0x44, 0xad],
            Self::Orange => [0xf3, 0x8b, 0x1c],
            Self::Cyan => [0x1a, 0xb8, 0xc4],
            Self::Pink => [0xe8, 0x6a, 0xa6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_is_remote_and_not_ready() {
        let p = Player::new(PlayerId(3), "guest");
        assert!(!p.is_local);
        assert!(!p.ready);
        assert_eq!(p.number, 0);
        assert!(Player::local(PlayerId(1), "me").is_local);
    }

    #[test]
    fn test_color_follows_number_and_wraps() {
        let mut p = Player::new(PlayerId(9), "x");
        p.number = 1;
        assert_eq!(p.color(), PlayerColor::Red);
        p.number = 8;
        assert_eq!(p.color(), PlayerColor::Pink);
        p.number = 9;
        assert_eq!(p.color(), PlayerColor::Red);
    }
}
