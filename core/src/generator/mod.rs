use crate::{BOARD_MASK, CellIndex, Difficulty, ValidationError, Word256, cell_mask};

pub use deterministic::*;
pub use random::*;

mod deterministic;
mod random;

/// Source of fresh clear boards for a player's first click. The produced
/// word is already masked to legal bomb bits with the first cell cleared.
pub trait BoardGenerator {
    fn generate(
        &mut self,
        level: Difficulty,
        first_cell: CellIndex,
    ) -> Result<Word256, ValidationError>;
}

/// Per-level AND/OR combination over five 256-bit draws; this is what tunes
/// the bomb density of each difficulty.
pub(crate) fn shape_board(draws: [Word256; 5], level: Difficulty) -> Word256 {
    let [r0, r1, r2, r3, r4] = draws;
    let mut board = r0 & r1;
    if matches!(level, Difficulty::Easy | Difficulty::Medium) {
        board = board & r3;
    }
    if !matches!(level, Difficulty::Medium) {
        board = board & (r2 | r4);
    }
    board
}

/// Restrict a shaped board to legal bomb bits and clear the first-clicked
/// cell's slot.
pub(crate) fn finish_board(
    board: Word256,
    first_cell: CellIndex,
) -> Result<Word256, ValidationError> {
    Ok(board & BOARD_MASK & cell_mask(first_cell)?)
}

pub(crate) fn check_generated_level(level: Difficulty) -> Result<(), ValidationError> {
    if level.is_custom() {
        return Err(ValidationError::Level(level.as_u8()));
    }
    Ok(())
}
