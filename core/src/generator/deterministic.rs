use std::sync::atomic::{AtomicU64, Ordering};

use tiny_keccak::{Hasher, Keccak};

use super::*;

/// Reproducible board generation: five Keccak-256 draws over the encoding
/// of `(counter, level, draw index)`, shaped per level. The counter is
/// global across players and atomically advanced, so concurrent `new_game`
/// calls never reuse a seed.
#[derive(Debug, Default)]
pub struct DeterministicGenerator {
    counter: AtomicU64,
}

impl DeterministicGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boards already generated; the next board uses this as its seed.
    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// The board for a given counter value, independent of generator state.
    pub fn board_at(
        level: Difficulty,
        counter: u64,
        first_cell: CellIndex,
    ) -> Result<Word256, ValidationError> {
        check_generated_level(level)?;
        let draws =
            core::array::from_fn(|i| draw(counter, level.as_u8(), i as u64));
        finish_board(shape_board(draws, level), first_cell)
    }
}

impl BoardGenerator for DeterministicGenerator {
    fn generate(
        &mut self,
        level: Difficulty,
        first_cell: CellIndex,
    ) -> Result<Word256, ValidationError> {
        check_generated_level(level)?;
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let board = Self::board_at(level, counter, first_cell)?;
        log::debug!(
            "generated deterministic board: level={} counter={counter} first_cell={first_cell}",
            level.as_u8()
        );
        Ok(board)
    }
}

/// One 256-bit draw: Keccak-256 over three 32-byte big-endian words
/// `(counter, level, index)`, the ABI-style tuple encoding.
fn draw(counter: u64, level: u8, index: u64) -> Word256 {
    let mut data = [0u8; 96];
    data[24..32].copy_from_slice(&counter.to_be_bytes());
    data[63] = level;
    data[88..96].copy_from_slice(&index.to_be_bytes());

    let mut hasher = Keccak::v256();
    hasher.update(&data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    Word256::from_be_bytes(output)
}
