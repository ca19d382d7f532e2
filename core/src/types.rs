use crate::{ValidationError, Word256};

/// Index of a cell in row-major order: `cell = row * COLS + col`.
pub type CellIndex = u8;

pub const ROWS: u8 = 11;
pub const COLS: u8 = 11;
pub const CELL_COUNT: u8 = ROWS * COLS;
pub const BITS_PER_CELL: u8 = 2;

/// Low two bits of a packed cell slot.
pub const CELL_MASK: u8 = 0b11;

/// Stored clues below this are neighbor counts; at or above it the revealed
/// cell itself was a bomb.
pub const CELL_IS_BOMB_THRESHOLD: u8 = 9;

/// Legal bomb-bit positions: bit `2*i` for each of the 121 cells, all other
/// bits forced to zero.
pub const BOARD_MASK: Word256 = Word256::from_limbs([
    0x5555555555555555,
    0x5555555555555555,
    0x5555555555555555,
    0x0001555555555555,
]);

pub fn cell_to_row_col(cell: CellIndex) -> Result<(u8, u8), ValidationError> {
    if cell >= CELL_COUNT {
        return Err(ValidationError::CellIndex(cell));
    }
    Ok((cell / COLS, cell % COLS))
}

pub fn row_col_to_cell(row: u8, col: u8) -> Result<CellIndex, ValidationError> {
    if row >= ROWS || col >= COLS {
        return Err(ValidationError::RowCol(row, col));
    }
    Ok(row * COLS + col)
}

/// Bit offset of a cell's 2-bit slot inside the packed board.
pub fn row_col_to_bit(row: u8, col: u8) -> Result<u8, ValidationError> {
    Ok(row_col_to_cell(row, col)? * BITS_PER_CELL)
}

pub fn bit_to_row_col(bit_index: u8) -> Result<(u8, u8), ValidationError> {
    if bit_index >= CELL_COUNT * BITS_PER_CELL {
        return Err(ValidationError::BitIndex(bit_index));
    }
    Ok((
        bit_index / (COLS * BITS_PER_CELL),
        (bit_index % (COLS * BITS_PER_CELL)) / BITS_PER_CELL,
    ))
}

/// Mask clearing the 2-bit slot of `cell`: AND-ing it into a board
/// guarantees that cell is bomb-free.
pub fn cell_mask(cell: CellIndex) -> Result<Word256, ValidationError> {
    if cell >= CELL_COUNT {
        return Err(ValidationError::CellIndex(cell));
    }
    Ok(!Word256::from_u64(CELL_MASK as u64).shl(cell as u32 * BITS_PER_CELL as u32))
}
