use rand::Rng;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::*;

/// Board generation without a reproducible seed. Uses the same per-level
/// shaping as the deterministic path, so the density characteristics of
/// each difficulty carry over unchanged.
#[derive(Clone, Debug)]
pub struct RandomGenerator {
    rng: SmallRng,
}

impl RandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn draw(&mut self) -> Word256 {
        Word256::from_limbs(core::array::from_fn(|_| self.rng.next_u64()))
    }
}

impl BoardGenerator for RandomGenerator {
    fn generate(
        &mut self,
        level: Difficulty,
        first_cell: CellIndex,
    ) -> Result<Word256, ValidationError> {
        check_generated_level(level)?;
        let draws = [
            self.draw(),
            self.draw(),
            self.draw(),
            self.draw(),
            self.draw(),
        ];
        finish_board(shape_board(draws, level), first_cell)
    }
}
