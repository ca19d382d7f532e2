//! Neighbor-clue computation over the packed board.
//!
//! The board is never unpacked: for a target cell we pull an 8-bit window
//! out of its row and the two adjacent rows, sum the three windows, and read
//! the per-column counters back out of the sum's 2-bit sub-fields. Each
//! sub-field receives at most one bomb bit from each of the three rows, so
//! the fields cannot carry into each other.

use serde::{Deserialize, Serialize};

use crate::{
    BITS_PER_CELL, CELL_MASK, CellIndex, COLS, Ct4, Ct8, Ct32, Ct256, ROWS, ValidationError,
    cell_to_row_col, row_col_to_bit,
};

/// What the engine learns about one cell: its own bomb bit and the clue
/// value destined for the decryption oracle.
///
/// `clue` is the 3x3 bomb count (own cell included); if the cell itself is a
/// bomb the count additionally has bits 0 and 3 forced on, which pushes it
/// into the `>= 9` sentinel range of [`crate::CELL_IS_BOMB_THRESHOLD`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellProbe {
    pub is_bomb: Ct8,
    pub clue: Ct4,
}

/// Window over a packed row covering the cell's own slot plus its horizontal
/// neighbors: at column 0 the 4 bits starting at the row origin, otherwise
/// 8 bits starting one slot before the cell.
pub fn six_bits_at(board: Ct256, row: u8, col: u8) -> Result<Ct8, ValidationError> {
    if col == 0 {
        Ok(board.shr(row_col_to_bit(row, 0)?).as_ct8().and(0xF))
    } else {
        Ok(board.shr(row_col_to_bit(row, col - 1)?).as_ct8())
    }
}

/// Full packed row of the board (the low 22 bits of the result).
pub fn row_of(board: Ct256, row: u8) -> Result<Ct32, ValidationError> {
    Ok(board.shr(row_col_to_bit(row, 0)?).as_ct32())
}

/// Bomb bit and clue for one cell of the packed board.
pub fn probe_cell(board: Ct256, cell: CellIndex) -> Result<CellProbe, ValidationError> {
    let (row, col) = cell_to_row_col(cell)?;

    let row_bits = six_bits_at(board, row, col)?;
    let prev_bits = if row > 0 {
        six_bits_at(board, row - 1, col)?
    } else {
        Ct8::ZERO
    };
    let next_bits = if row < ROWS - 1 {
        six_bits_at(board, row + 1, col)?
    } else {
        Ct8::ZERO
    };

    let sum = next_bits.add(row_bits.add(prev_bits)?)?;

    let mut right = sum.as_ct4().and(CELL_MASK)?;
    let mut middle = sum.shr(BITS_PER_CELL).as_ct4().and(CELL_MASK)?;
    let mut left = sum.shr(2 * BITS_PER_CELL).as_ct4().and(CELL_MASK)?;

    if col == 0 {
        // window starts at the cell itself, no left neighbor column
        left = middle;
        middle = right;
        right = Ct4::ZERO;
    } else if col == COLS - 1 {
        // window's top slot is past the last column
        left = Ct4::ZERO;
    }

    let mut clue = left.add(middle.add(right)?)?;

    let is_bomb = if col == 0 {
        row_bits.and(CELL_MASK)
    } else {
        row_bits.shr(BITS_PER_CELL).and(CELL_MASK)
    };

    let row_bits4 = row_bits.as_ct4();
    let bomb_bit = if col == 0 {
        row_bits4.and(CELL_MASK)?
    } else {
        row_bits4.shr(BITS_PER_CELL)
    };

    clue = clue.or(bomb_bit);
    clue = clue.or(bomb_bit.shl(3)?);

    Ok(CellProbe { is_bomb, clue })
}
