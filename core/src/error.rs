use thiserror::Error;

/// Precondition failures, always detected before any state mutation.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cell index {0} out of range")]
    CellIndex(u8),
    #[error("bit index {0} out of range")]
    BitIndex(u8),
    #[error("row/col ({0}, {1}) out of range")]
    RowCol(u8, u8),
    #[error("invalid difficulty level {0}")]
    Level(u8),
    #[error("{width}-bit value overflow")]
    Overflow { width: u16 },
    #[error("cache block index {0} out of range")]
    CacheBlock(u8),
    #[error("cache field value {0} exceeds four bits")]
    CacheValue(u8),
    #[error("decode length {0} exceeds cache capacity")]
    DecodeLength(u8),
}

/// Violations of the per-player game/request lifecycle.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("cell already revealed")]
    AlreadyRevealed,
    #[error("a decryption request is already pending")]
    AlreadyRequested,
    #[error("game over")]
    GameOver,
    #[error("player has no active game")]
    NotAPlayer,
    #[error("stale or duplicate decryption callback for request {request_id}")]
    StaleCallback { request_id: u64 },
    #[error("no decrypted value cached for this cell")]
    NotAvailable,
    #[error("cannot force expiry while gateway requests are queued")]
    GatewayBusy,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("no decryption result after {retries} polls")]
    Timeout { retries: u32 },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
