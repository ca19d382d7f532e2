//! Boundary types shared between the minefog engine and its hosts
//! (wallet frontends, CLI tasks, test drivers).

use serde::{Deserialize, Serialize};

/// Opaque player identity assigned by the host (wallet address hash,
/// session id, ...). The engine only ever uses it as a map key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// Difficulty of a generated board. `Custom` marks a board injected by the
/// player instead of produced by a generator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Difficulty {
    Easy = 0,
    Medium = 1,
    Hard = 2,
    Custom = 0xff,
}

impl Difficulty {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Custom)
    }

    pub const fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Easy),
            1 => Some(Self::Medium),
            2 => Some(Self::Hard),
            0xff => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Board dimensions as seen by a renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDims {
    pub rows: u8,
    pub cols: u8,
}

impl BoardDims {
    pub const fn cell_count(self) -> u8 {
        self.rows * self.cols
    }
}

/// Snapshot of a player's outstanding decryption request.
///
/// `cell_index_plus_one` is 1-based; 0 means no request is pending, in which
/// case the other fields are zero as well.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecryption {
    pub cell_index_plus_one: u8,
    pub expired: bool,
    pub deadline: u64,
}

impl PendingDecryption {
    pub const fn is_pending(self) -> bool {
        self.cell_index_plus_one > 0
    }

    pub const fn cell_index(self) -> Option<u8> {
        match self.cell_index_plus_one {
            0 => None,
            n => Some(n - 1),
        }
    }
}

/// Emitted once the gateway callback commits a decrypted clue.
///
/// `clue` is already clamped: values below the bomb threshold are neighbor
/// counts, the threshold itself means the revealed cell was a bomb.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRevealed {
    pub player: PlayerId,
    pub cell_index: u8,
    pub clue: u8,
    pub victory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_round_trips_through_u8() {
        for level in [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Custom,
        ] {
            assert_eq!(Difficulty::from_u8(level.as_u8()), Some(level));
        }
        assert_eq!(Difficulty::from_u8(3), None);
    }

    #[test]
    fn pending_decryption_default_is_idle() {
        let pending = PendingDecryption::default();
        assert!(!pending.is_pending());
        assert_eq!(pending.cell_index(), None);
    }

    #[test]
    fn pending_decryption_exposes_zero_based_cell() {
        let pending = PendingDecryption {
            cell_index_plus_one: 31,
            expired: false,
            deadline: 1000,
        };
        assert!(pending.is_pending());
        assert_eq!(pending.cell_index(), Some(30));
    }
}
