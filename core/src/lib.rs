pub use minefog_protocol::{BoardDims, CellRevealed, Difficulty, PendingDecryption, PlayerId};

pub use cipher::*;
pub use clue::*;
pub use codec::*;
pub use engine::*;
pub use error::*;
pub use game::*;
pub use gateway::*;
pub use generator::*;
pub use types::*;
pub use word::*;

mod cipher;
mod clue;
mod codec;
mod engine;
mod error;
mod game;
mod gateway;
mod generator;
mod types;
mod word;
