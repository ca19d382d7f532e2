//! The confidential-board engine: per-player game store, the reveal state
//! machine, and the gateway round-trip that turns captured ciphertexts into
//! clear clues.
//!
//! Per player the request lifecycle is Idle -> Pending -> Idle. A pending
//! request either resolves through [`Engine::decryption_callback`] or, once
//! expired, is superseded by the next `reveal_cell` call, which re-submits
//! the originally captured ciphertext without recomputing the clue.

use core::mem;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    BITS_PER_CELL, BOARD_MASK, BoardDims, CELL_COUNT, CELL_IS_BOMB_THRESHOLD, CellIndex,
    CellRevealed, COLS, Ct4, Ct256, CtBool, Difficulty, Error, Game, PendingDecryption, PlayerId,
    ROWS, Result, StateError, ValidationError, Word256, cell_mask, clue,
    game::PlayerSlot,
    gateway::{Gateway, GatewayTicket},
    generator::{BoardGenerator, DeterministicGenerator, RandomGenerator},
    DecryptionRequest,
};

/// Block-timestamp seconds granted to the oracle before a request expires.
pub const GATEWAY_DEADLINE_SECS: u64 = 100;

/// Host-tunable timing knobs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Oracle resolution delay in milliseconds; 0 drains the gateway
    /// synchronously inside the call that filed the request.
    pub gateway_interval_ms: u64,
    /// Granularity of the coarse block timestamps.
    pub block_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway_interval_ms: 0,
            block_interval_secs: 10,
        }
    }
}

/// Test-harness controls, consumed by the next `reveal_cell` call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealOverrides {
    /// File the request with an already-elapsed deadline.
    pub force_expired: bool,
    /// Leave the request queued instead of driving a synchronous gateway.
    pub defer_gateway: bool,
}

pub struct Engine {
    config: EngineConfig,
    players: HashMap<PlayerId, PlayerSlot>,
    pending: HashMap<PlayerId, DecryptionRequest>,
    request_owners: HashMap<u64, PlayerId>,
    gateway: Gateway,
    deterministic: bool,
    deterministic_generator: DeterministicGenerator,
    random_generator: RandomGenerator,
    next_reveal: RevealOverrides,
    events: Vec<CellRevealed>,
    clock_ms: fn() -> u64,
}

fn wall_clock_ms() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, wall_clock_ms)
    }

    /// Engine with an injected millisecond clock, for deterministic tests.
    pub fn with_clock(config: EngineConfig, clock_ms: fn() -> u64) -> Self {
        Self {
            players: HashMap::new(),
            pending: HashMap::new(),
            request_owners: HashMap::new(),
            gateway: Gateway::new(config.gateway_interval_ms),
            deterministic: true,
            deterministic_generator: DeterministicGenerator::new(),
            random_generator: RandomGenerator::new(clock_ms()),
            next_reveal: RevealOverrides::default(),
            events: Vec::new(),
            clock_ms,
            config,
        }
    }

    /// Coarse chain-style timestamp all deadlines are measured against.
    pub fn block_timestamp(&self) -> u64 {
        self.config.block_interval_secs * ((self.clock_ms)() / 10_000)
    }

    pub fn deterministic(&self) -> bool {
        self.deterministic
    }

    pub fn set_deterministic_mode(&mut self, enabled: bool) {
        self.deterministic = enabled;
    }

    pub fn set_next_reveal_overrides(&mut self, overrides: RevealOverrides) {
        self.next_reveal = overrides;
    }

    pub fn size(&self) -> BoardDims {
        BoardDims {
            rows: ROWS,
            cols: COLS,
        }
    }

    pub fn cell_count(&self) -> u8 {
        CELL_COUNT
    }

    // ---- game lifecycle ----

    pub fn new_game(
        &mut self,
        player: PlayerId,
        level: Difficulty,
        first_cell: CellIndex,
    ) -> Result<()> {
        if level.is_custom() {
            return Err(ValidationError::Level(level.as_u8()).into());
        }
        if first_cell >= CELL_COUNT {
            return Err(ValidationError::CellIndex(first_cell).into());
        }
        let board = if self.deterministic {
            self.deterministic_generator.generate(level, first_cell)?
        } else {
            self.random_generator.generate(level, first_cell)?
        };
        self.install_game(player, level, Ct256::seal(board), first_cell);
        Ok(())
    }

    /// Start a game on a player-supplied board. The board is masked to
    /// legal bomb bits and the first cell's slot is cleared, exactly like a
    /// generated one.
    pub fn new_custom_game(
        &mut self,
        player: PlayerId,
        first_cell: CellIndex,
        board: Word256,
    ) -> Result<()> {
        if first_cell >= CELL_COUNT {
            return Err(ValidationError::CellIndex(first_cell).into());
        }
        let masked = board & BOARD_MASK & cell_mask(first_cell)?;
        self.install_game(player, Difficulty::Custom, Ct256::seal(masked), first_cell);
        Ok(())
    }

    pub fn resign(&mut self, player: PlayerId) -> Result<()> {
        if !self.players.contains_key(&player) {
            return Err(StateError::NotAPlayer.into());
        }
        self.discard_player(player);
        Ok(())
    }

    fn install_game(
        &mut self,
        player: PlayerId,
        level: Difficulty,
        board: Ct256,
        first_cell: CellIndex,
    ) {
        self.discard_player(player);
        self.players
            .insert(player, PlayerSlot::start(Game::new(level, board, first_cell)));
    }

    /// Drops the game, both caches, and any pending request in one step; no
    /// partial state survives.
    fn discard_player(&mut self, player: PlayerId) {
        self.players.remove(&player);
        if let Some(request) = self.pending.remove(&player) {
            self.request_owners.remove(&request.request_id);
            log::debug!(
                "discarded pending request {} of player {}",
                request.request_id,
                player.0
            );
        }
    }

    // ---- reveal protocol ----

    pub fn reveal_cell(&mut self, player: PlayerId, cell_index: CellIndex) -> Result<()> {
        if cell_index >= CELL_COUNT {
            return Err(ValidationError::CellIndex(cell_index).into());
        }
        if self.next_reveal.force_expired && !self.gateway.is_idle() {
            return Err(StateError::GatewayBusy.into());
        }
        let slot = self.players.get(&player).ok_or(StateError::NotAPlayer)?;
        if slot.game.exploded {
            return Err(StateError::GameOver.into());
        }
        if slot.clear_cache.is_set(cell_index)? {
            return Err(StateError::AlreadyRevealed.into());
        }

        let now = self.block_timestamp();
        let (cell_index, clue, victory) = if let Some(&request) = self.pending.get(&player) {
            if !request.expired_at(now) {
                return Err(StateError::AlreadyRequested.into());
            }
            // Expired: re-submit the captured ciphertext for the original
            // cell, whichever cell this call named.
            self.pending.remove(&player);
            self.request_owners.remove(&request.request_id);
            log::debug!(
                "re-issuing expired request {} for cell {}",
                request.request_id,
                request.cell_index
            );
            (request.cell_index, request.clue, request.victory)
        } else {
            let slot = self
                .players
                .get_mut(&player)
                .ok_or(StateError::NotAPlayer)?;
            let probe = clue::probe_cell(slot.game.board, cell_index)?;
            slot.game.moves = slot
                .game
                .moves
                .with_bit(cell_index as u32 * BITS_PER_CELL as u32);
            slot.encrypted_cache.accumulate(cell_index, probe.clue)?;
            let victory = slot
                .game
                .board
                .xor(Ct256::seal(slot.game.moves))
                .eq(Ct256::seal(BOARD_MASK));
            (cell_index, probe.clue, victory)
        };

        self.file_request(player, cell_index, clue, victory, now)
    }

    fn file_request(
        &mut self,
        player: PlayerId,
        cell_index: CellIndex,
        clue: Ct4,
        victory: CtBool,
        now: u64,
    ) -> Result<()> {
        let overrides = mem::take(&mut self.next_reveal);
        let deadline = if overrides.force_expired {
            now.saturating_sub(GATEWAY_DEADLINE_SECS)
        } else {
            now + GATEWAY_DEADLINE_SECS
        };

        let request_id = self.gateway.allocate_request_id();
        self.request_owners.insert(request_id, player);
        self.pending.insert(
            player,
            DecryptionRequest {
                request_id,
                player,
                cell_index,
                clue,
                victory,
                deadline,
                completed: false,
            },
        );
        self.gateway.enqueue(GatewayTicket {
            request_id,
            clue,
            victory,
            deadline,
        });
        log::debug!(
            "filed decryption request {request_id}: player {} cell {cell_index} deadline {deadline}",
            player.0
        );

        if overrides.defer_gateway {
            return Ok(());
        }
        if self.gateway.synchronous() {
            self.service_gateway()?;
        }
        Ok(())
    }

    /// Drain the gateway queue: expired tickets are skipped (the request
    /// stays pending for its player until re-issued), everything else is
    /// decrypted and committed through the callback. Hosts running a
    /// non-zero gateway interval call this from their timer.
    pub fn service_gateway(&mut self) -> Result<()> {
        let now = self.block_timestamp();
        while let Some(ticket) = self.gateway.pop() {
            if now > ticket.deadline {
                log::debug!(
                    "gateway: skipping expired request {} (deadline {})",
                    ticket.request_id,
                    ticket.deadline
                );
                continue;
            }
            let clue = ticket.clue.reveal();
            let victory = ticket.victory.reveal();
            match self.decryption_callback(ticket.request_id, clue, victory) {
                Ok(()) => {}
                // A game deleted after filing leaves its ticket behind;
                // drop it without losing the rest of the queue.
                Err(Error::State(StateError::StaleCallback { request_id })) => {
                    log::warn!("gateway: dropping stale request {request_id}");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Oracle-side commit of a decrypted clue. Fails with `StaleCallback`
    /// when the request no longer exists, belongs to a different id, or was
    /// already completed.
    pub fn decryption_callback(
        &mut self,
        request_id: u64,
        clear_clue: u8,
        clear_victory: bool,
    ) -> Result<()> {
        let Some(&player) = self.request_owners.get(&request_id) else {
            return Err(StateError::StaleCallback { request_id }.into());
        };
        let Some(request) = self.pending.get_mut(&player) else {
            return Err(StateError::StaleCallback { request_id }.into());
        };
        if request.request_id != request_id || request.completed {
            return Err(StateError::StaleCallback { request_id }.into());
        }
        request.completed = true;
        let cell_index = request.cell_index;
        self.pending.remove(&player);
        self.request_owners.remove(&request_id);

        let slot = self
            .players
            .get_mut(&player)
            .ok_or(StateError::NotAPlayer)?;
        // Clamp before storing clue + 1, and latch the explosion.
        let clue = if clear_clue >= CELL_IS_BOMB_THRESHOLD {
            slot.game.exploded = true;
            CELL_IS_BOMB_THRESHOLD
        } else {
            clear_clue
        };
        slot.clear_cache.set_field(cell_index, clue + 1)?;
        slot.game.victory = clear_victory;
        debug_assert!(!(slot.game.exploded && slot.game.victory));

        log::debug!(
            "request {request_id} resolved: player {} cell {cell_index} clue {clue} victory {clear_victory}",
            player.0
        );
        self.events.push(CellRevealed {
            player,
            cell_index,
            clue,
            victory: clear_victory,
        });
        Ok(())
    }

    /// Poll until the cell's clear value is available, servicing the
    /// gateway between polls. `sleep` receives the attempt number and is
    /// expected to block for the caller's chosen backoff; after `max_polls`
    /// attempts the wait surfaces [`Error::Timeout`] instead of hanging.
    pub fn wait_for_clear_cell(
        &mut self,
        player: PlayerId,
        cell_index: CellIndex,
        max_polls: u32,
        mut sleep: impl FnMut(u32),
    ) -> Result<u8> {
        for attempt in 0..max_polls {
            self.service_gateway()?;
            if self.is_clear_cell_available(player, cell_index)? {
                return self.get_clear_cell(player, cell_index);
            }
            sleep(attempt);
        }
        Err(Error::Timeout { retries: max_polls })
    }

    // ---- queries ----

    pub fn is_player(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    pub fn board_of(&self, player: PlayerId) -> Option<Ct256> {
        self.players.get(&player).map(|slot| slot.game.board)
    }

    pub fn moves_of(&self, player: PlayerId) -> Option<Word256> {
        self.players.get(&player).map(|slot| slot.game.moves)
    }

    pub fn is_victory(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|slot| slot.game.victory)
    }

    pub fn is_game_over(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|slot| slot.game.exploded)
    }

    pub fn has_game_in_progress(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|slot| slot.game.in_progress())
    }

    pub fn first_cell_index_of(&self, player: PlayerId) -> Result<CellIndex> {
        if !self.has_game_in_progress(player) {
            return Err(StateError::NotAPlayer.into());
        }
        Ok(self.players[&player].game.first_cell)
    }

    /// Both clear-cache blocks; zero for players without any resolved
    /// reveals (or without a game at all).
    pub fn get_clear_cache(&self, player: PlayerId) -> [Word256; 2] {
        self.players
            .get(&player)
            .map(|slot| slot.clear_cache.blocks())
            .unwrap_or([Word256::ZERO; 2])
    }

    pub fn get_encrypted_cache(&self, player: PlayerId) -> Option<[Ct256; 2]> {
        self.players
            .get(&player)
            .map(|slot| slot.encrypted_cache.blocks())
    }

    pub fn is_clear_cell_available(
        &self,
        player: PlayerId,
        cell_index: CellIndex,
    ) -> Result<bool> {
        match self.players.get(&player) {
            None => {
                if cell_index >= CELL_COUNT {
                    return Err(ValidationError::CellIndex(cell_index).into());
                }
                Ok(false)
            }
            Some(slot) => Ok(slot.clear_cache.is_set(cell_index)?),
        }
    }

    /// The decrypted clue of a revealed cell (`cache - 1`).
    pub fn get_clear_cell(&self, player: PlayerId, cell_index: CellIndex) -> Result<u8> {
        if cell_index >= CELL_COUNT {
            return Err(ValidationError::CellIndex(cell_index).into());
        }
        let slot = self.players.get(&player).ok_or(StateError::NotAPlayer)?;
        if slot.game.exploded {
            return Err(StateError::GameOver.into());
        }
        match slot.clear_cache.field(cell_index)? {
            0 => Err(StateError::NotAvailable.into()),
            field => Ok(field - 1),
        }
    }

    pub fn pending_decryption_request(&self, player: PlayerId) -> PendingDecryption {
        match self.pending.get(&player) {
            None => PendingDecryption::default(),
            Some(request) => PendingDecryption {
                cell_index_plus_one: request.cell_index + 1,
                expired: request.expired_at(self.block_timestamp()),
                deadline: request.deadline,
            },
        }
    }

    /// Committed `CellRevealed` notifications since the last drain, in
    /// commit order.
    pub fn drain_events(&mut self) -> Vec<CellRevealed> {
        mem::take(&mut self.events)
    }
}
