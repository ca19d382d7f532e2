use serde::{Deserialize, Serialize};

use crate::{CellIndex, ClearCache, Ct256, Difficulty, EncryptedCache, Word256};

/// One player's confidential game. Absence from the engine's store is the
/// canonical "no game" state; a record is only ever created whole by
/// `new_game`/`new_custom_game` and destroyed whole.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub level: Difficulty,
    pub board: Ct256,
    /// Bit `2 * cell` set once the cell has been requested or revealed.
    pub moves: Word256,
    /// Set forever once a bomb clue comes back from the oracle.
    pub exploded: bool,
    /// Every non-bomb cell revealed. Never true together with `exploded`.
    pub victory: bool,
    /// The cell guaranteed bomb-free at game start.
    pub first_cell: CellIndex,
}

impl Game {
    pub fn new(level: Difficulty, board: Ct256, first_cell: CellIndex) -> Self {
        Self {
            level,
            board,
            moves: Word256::ZERO,
            exploded: false,
            victory: false,
            first_cell,
        }
    }

    pub fn in_progress(&self) -> bool {
        !self.exploded && !self.victory
    }
}

/// Everything the engine keeps for one player besides the pending request.
/// Removing the slot removes the game and both caches in one step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PlayerSlot {
    pub game: Game,
    pub clear_cache: ClearCache,
    pub encrypted_cache: EncryptedCache,
}

impl PlayerSlot {
    pub fn start(game: Game) -> Self {
        Self {
            game,
            clear_cache: ClearCache::default(),
            encrypted_cache: EncryptedCache::default(),
        }
    }
}
