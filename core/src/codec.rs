//! Encoding and decoding of the packed board, the moves mask, and the two
//! clue caches.
//!
//! Layouts: the board and moves mask give every cell a 2-bit slot at bit
//! `2 * cell` (only the low bit of each slot is ever set). The caches give
//! every cell a 4-bit field, 64 fields per 256-bit block, two blocks; clear
//! fields store `clue + 1` so that 0 can mean "not revealed yet".

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    BITS_PER_CELL, BOARD_MASK, CELL_COUNT, CellIndex, COLS, Ct4, Ct256, ROWS, ValidationError,
    Word256,
};

/// 4-bit fields held by one 256-bit cache block.
pub const FIELDS_PER_BLOCK: u8 = 64;

const FIELD_BITS: u32 = 4;

/// Pack a bomb layout: sets bit `2 * cell` for every listed cell.
pub fn encode_board(bomb_cells: &[CellIndex]) -> Result<Word256, ValidationError> {
    let mut board = Word256::ZERO;
    for &cell in bomb_cells {
        if cell >= CELL_COUNT {
            return Err(ValidationError::CellIndex(cell));
        }
        board = board.with_bit(cell as u32 * BITS_PER_CELL as u32);
    }
    Ok(board)
}

/// Extract bit `2 * cell` of the moves mask for the first `cell_count` cells.
pub fn decode_moves(
    moves: Word256,
    cell_count: u8,
) -> Result<SmallVec<[bool; 128]>, ValidationError> {
    if cell_count > 2 * FIELDS_PER_BLOCK {
        return Err(ValidationError::DecodeLength(cell_count));
    }
    Ok((0..cell_count)
        .map(|cell| moves.bit(cell as u32 * BITS_PER_CELL as u32))
        .collect())
}

/// Split both cache blocks into 4-bit fields, index order, first
/// `cell_count` fields across the pair.
pub fn decode_clear_cache(
    blocks: [Word256; 2],
    cell_count: u8,
) -> Result<SmallVec<[u8; 128]>, ValidationError> {
    if cell_count > 2 * FIELDS_PER_BLOCK {
        return Err(ValidationError::DecodeLength(cell_count));
    }
    Ok((0..cell_count)
        .map(|cell| {
            let (block, field) = (cell / FIELDS_PER_BLOCK, cell % FIELDS_PER_BLOCK);
            (blocks[block as usize].shr(field as u32 * FIELD_BITS).low_u64() & 0xF) as u8
        })
        .collect())
}

fn cache_slot(cell: CellIndex) -> Result<(usize, u32), ValidationError> {
    if cell >= CELL_COUNT {
        return Err(ValidationError::CellIndex(cell));
    }
    let block = cell / FIELDS_PER_BLOCK;
    if block > 1 {
        return Err(ValidationError::CacheBlock(block));
    }
    Ok((block as usize, (cell % FIELDS_PER_BLOCK) as u32 * FIELD_BITS))
}

/// Decrypted clue fields, written once per cell by the gateway callback and
/// never rolled back.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCache {
    blocks: [Word256; 2],
}

impl ClearCache {
    pub fn blocks(&self) -> [Word256; 2] {
        self.blocks
    }

    pub fn field(&self, cell: CellIndex) -> Result<u8, ValidationError> {
        let (block, shift) = cache_slot(cell)?;
        Ok((self.blocks[block].shr(shift).low_u64() & 0xF) as u8)
    }

    /// OR a 4-bit value into the cell's field.
    pub fn set_field(&mut self, cell: CellIndex, value: u8) -> Result<(), ValidationError> {
        if value > 0xF {
            return Err(ValidationError::CacheValue(value));
        }
        let (block, shift) = cache_slot(cell)?;
        self.blocks[block] = self.blocks[block] | Word256::from_u64(value as u64).shl(shift);
        Ok(())
    }

    pub fn is_set(&self, cell: CellIndex) -> Result<bool, ValidationError> {
        Ok(self.field(cell)? > 0)
    }
}

/// Confidential mirror of [`ClearCache`]: accumulates the not-yet-decrypted
/// clue values in the identical bit layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedCache {
    blocks: [Ct256; 2],
}

impl EncryptedCache {
    pub fn blocks(&self) -> [Ct256; 2] {
        self.blocks
    }

    pub fn accumulate(&mut self, cell: CellIndex, value: Ct4) -> Result<(), ValidationError> {
        let (block, shift) = cache_slot(cell)?;
        let widened = Ct256::seal(Word256::from_u64(value.reveal() as u64)).shl(shift as u8)?;
        self.blocks[block] = self.blocks[block].or(widened);
        Ok(())
    }
}

/// Per-cell bomb bits of a clear board as a `ROWS x COLS` grid.
pub fn bomb_grid(clear_board: Word256) -> Array2<u8> {
    Array2::from_shape_fn((ROWS as usize, COLS as usize), |(row, col)| {
        let cell = row * COLS as usize + col;
        clear_board.bit(cell as u32 * BITS_PER_CELL as u32) as u8
    })
}

/// Neighbor-count grid computed naively from a clear board; bomb cells get
/// `bomb_mark` OR-ed in. This is the independent oracle the bit-window clue
/// engine is tested against.
pub fn clue_grid(clear_board: Word256, bomb_mark: u8) -> Result<Array2<u8>, ValidationError> {
    if bomb_mark > 0xF {
        return Err(ValidationError::CacheValue(bomb_mark));
    }
    let bombs = bomb_grid(clear_board);
    Ok(Array2::from_shape_fn(
        (ROWS as usize, COLS as usize),
        |(row, col)| {
            let mut count = 0;
            for dr in -1i32..=1 {
                for dc in -1i32..=1 {
                    let (r, c) = (row as i32 + dr, col as i32 + dc);
                    if (0..ROWS as i32).contains(&r) && (0..COLS as i32).contains(&c) {
                        count += bombs[(r as usize, c as usize)];
                    }
                }
            }
            if bombs[(row, col)] > 0 {
                count |= bomb_mark;
            }
            count
        },
    ))
}

/// Revealed-cell bits of a moves mask as a grid.
pub fn moves_grid(moves: Word256) -> Array2<bool> {
    Array2::from_shape_fn((ROWS as usize, COLS as usize), |(row, col)| {
        let cell = row * COLS as usize + col;
        moves.bit(cell as u32 * BITS_PER_CELL as u32)
    })
}

/// Clear-cache fields (still `clue + 1` encoded) as a grid.
pub fn cache_grid(blocks: [Word256; 2]) -> Array2<u8> {
    Array2::from_shape_fn((ROWS as usize, COLS as usize), |(row, col)| {
        let cell = (row * COLS as usize + col) as u8;
        let (block, field) = (cell / FIELDS_PER_BLOCK, cell % FIELDS_PER_BLOCK);
        (blocks[block as usize].shr(field as u32 * FIELD_BITS).low_u64() & 0xF) as u8
    })
}

/// Bomb density of a clear board, in percent of the cell count.
pub fn density(clear_board: Word256) -> f64 {
    100.0 * (clear_board & BOARD_MASK).count_ones() as f64 / CELL_COUNT as f64
}
