//! End-to-end exercises of the reveal protocol: pinned deterministic
//! boards, full-board sweeps against the naive clue oracle, explosion and
//! victory flows, rejection paths, expiry replay, and the bounded wait.

use minefog_core::{
    BOARD_MASK, CELL_COUNT, CELL_IS_BOMB_THRESHOLD, CellIndex, CellRevealed, Difficulty,
    DeterministicGenerator, Engine, EngineConfig, Error, GATEWAY_DEADLINE_SECS, PlayerId,
    RevealOverrides, StateError, Word256, clue_grid, decode_clear_cache, decode_moves, density,
    encode_board,
};

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);

fn fixed_clock() -> u64 {
    // 1_000_000 ms -> block timestamp 1000 with the default 10 s interval
    1_000_000
}

fn sync_engine() -> Engine {
    Engine::with_clock(EngineConfig::default(), fixed_clock)
}

fn deferred_engine() -> Engine {
    Engine::with_clock(
        EngineConfig {
            gateway_interval_ms: 50,
            block_interval_secs: 10,
        },
        fixed_clock,
    )
}

fn oracle_clues(clear_board: Word256) -> Vec<u8> {
    clue_grid(clear_board, CELL_IS_BOMB_THRESHOLD)
        .unwrap()
        .into_iter()
        .collect()
}

fn bomb_cells(clear_board: Word256) -> Vec<CellIndex> {
    (0..CELL_COUNT)
        .filter(|&cell| clear_board.bit(cell as u32 * 2))
        .collect()
}

#[test]
fn level0_pinned_board_and_safe_reveal() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();

    let board = engine.board_of(ALICE).unwrap().reveal();
    assert_eq!(
        board.limbs(),
        [
            0x0000000000000000,
            0x0014400400000000,
            0x0000000000401010,
            0x0000000000004000,
        ]
    );
    assert_eq!(board.count_ones(), 8);
    assert!(!board.bit(32), "first cell must be bomb-free");

    assert!(!engine.is_clear_cell_available(ALICE, 30).unwrap());
    engine.reveal_cell(ALICE, 30).unwrap();

    assert!(engine.is_clear_cell_available(ALICE, 30).unwrap());
    assert_eq!(engine.get_clear_cell(ALICE, 30).unwrap(), 0);
    assert!(!engine.is_game_over(ALICE));
    assert!(!engine.is_victory(ALICE));
    assert!(!engine.pending_decryption_request(ALICE).is_pending());

    let moves = decode_moves(engine.moves_of(ALICE).unwrap(), CELL_COUNT).unwrap();
    assert!(moves[30]);
    assert_eq!(moves.iter().filter(|&&m| m).count(), 1);

    let events = engine.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].player, ALICE);
    assert_eq!(events[0].cell_index, 30);
    assert_eq!(events[0].clue, 0);
    assert!(!events[0].victory);
}

#[test]
fn full_safe_sweep_reaches_victory() {
    for (level, first_cell) in [
        (Difficulty::Easy, 16),
        (Difficulty::Medium, 4),
        (Difficulty::Hard, 4),
    ] {
        let mut engine = sync_engine();
        engine.new_game(ALICE, level, first_cell).unwrap();

        let board = engine.board_of(ALICE).unwrap().reveal();
        let clues = oracle_clues(board);
        let bombs = bomb_cells(board);

        for cell in 0..CELL_COUNT {
            if bombs.contains(&cell) {
                continue;
            }
            engine.reveal_cell(ALICE, cell).unwrap();
            assert_eq!(
                engine.get_clear_cell(ALICE, cell).unwrap(),
                clues[cell as usize],
                "cell {cell}"
            );
        }

        assert!(engine.is_victory(ALICE));
        assert!(!engine.is_game_over(ALICE));
        assert!(!engine.has_game_in_progress(ALICE));

        // clear cache holds clue + 1 on revealed cells, 0 on bombs
        let cache = decode_clear_cache(engine.get_clear_cache(ALICE), CELL_COUNT).unwrap();
        // encrypted cache mirrors the same layout, pre-decryption values
        let [enc0, enc1] = engine.get_encrypted_cache(ALICE).unwrap();
        let encrypted =
            decode_clear_cache([enc0.reveal(), enc1.reveal()], CELL_COUNT).unwrap();
        for cell in 0..CELL_COUNT as usize {
            if bombs.contains(&(cell as u8)) {
                assert_eq!(cache[cell], 0);
                assert_eq!(encrypted[cell], 0);
            } else {
                assert_eq!(cache[cell], clues[cell] + 1);
                assert_eq!(encrypted[cell], clues[cell]);
            }
        }

        let events = engine.drain_events();
        assert_eq!(events.len(), CELL_COUNT as usize - bombs.len());
        assert!(events.last().unwrap().victory);
        assert!(events.iter().rev().skip(1).all(|event| !event.victory));
    }
}

#[test]
fn revealing_a_bomb_explodes() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    let board = engine.board_of(ALICE).unwrap().reveal();
    let bomb = bomb_cells(board)[0];

    engine.reveal_cell(ALICE, bomb).unwrap();

    assert!(engine.is_game_over(ALICE));
    assert!(!engine.is_victory(ALICE));
    assert!(!engine.has_game_in_progress(ALICE));

    // the stored field is clamped to the threshold
    let cache = decode_clear_cache(engine.get_clear_cache(ALICE), CELL_COUNT).unwrap();
    assert_eq!(cache[bomb as usize], CELL_IS_BOMB_THRESHOLD + 1);
    assert!(engine.is_clear_cell_available(ALICE, bomb).unwrap());
    assert_eq!(
        engine.get_clear_cell(ALICE, bomb),
        Err(StateError::GameOver.into())
    );

    let events = engine.drain_events();
    assert_eq!(events[0].clue, CELL_IS_BOMB_THRESHOLD);
    assert!(!events[0].victory);

    // exploded games accept no further reveals
    assert_eq!(
        engine.reveal_cell(ALICE, 0),
        Err(StateError::GameOver.into())
    );
}

#[test]
fn duplicate_reveals_are_rejected() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.reveal_cell(ALICE, 30).unwrap();
    assert_eq!(
        engine.reveal_cell(ALICE, 30),
        Err(StateError::AlreadyRevealed.into())
    );
}

#[test]
fn pending_request_blocks_new_reveals() {
    let mut engine = deferred_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();

    engine.reveal_cell(ALICE, 30).unwrap();
    let pending = engine.pending_decryption_request(ALICE);
    assert_eq!(pending.cell_index(), Some(30));
    assert!(!pending.expired);
    assert_eq!(pending.deadline, engine.block_timestamp() + GATEWAY_DEADLINE_SECS);

    assert_eq!(
        engine.reveal_cell(ALICE, 31),
        Err(StateError::AlreadyRequested.into())
    );
    assert_eq!(
        engine.reveal_cell(ALICE, 30),
        Err(StateError::AlreadyRequested.into())
    );
    assert!(!engine.is_clear_cell_available(ALICE, 30).unwrap());

    // host timer fires
    engine.service_gateway().unwrap();
    assert_eq!(engine.get_clear_cell(ALICE, 30).unwrap(), 0);
    assert!(!engine.pending_decryption_request(ALICE).is_pending());

    // other players are independent
    engine.new_game(BOB, Difficulty::Easy, 16).unwrap();
    engine.reveal_cell(BOB, 30).unwrap();
    engine.reveal_cell(ALICE, 31).unwrap();
    engine.service_gateway().unwrap();
    assert!(engine.is_clear_cell_available(BOB, 30).unwrap());
    assert!(engine.is_clear_cell_available(ALICE, 31).unwrap());
}

#[test]
fn expired_request_is_reissued_with_the_captured_ciphertext() {
    let bombs = [1u8, 13, 14, 20, 31, 44, 49, 54, 68, 69, 87, 94, 106];
    let board = encode_board(&bombs).unwrap();

    let mut engine = sync_engine();
    engine.new_custom_game(ALICE, 0, board).unwrap();
    engine.new_custom_game(BOB, 0, board).unwrap();

    // unexpired run for reference
    engine.reveal_cell(ALICE, 12).unwrap();
    let expected = engine.get_clear_cell(ALICE, 12).unwrap();
    assert_eq!(expected, 2);

    // forced-expired run: the synchronous drain skips the request
    engine.set_next_reveal_overrides(RevealOverrides {
        force_expired: true,
        defer_gateway: false,
    });
    engine.reveal_cell(BOB, 12).unwrap();
    assert!(!engine.is_clear_cell_available(BOB, 12).unwrap());
    let pending = engine.pending_decryption_request(BOB);
    assert_eq!(pending.cell_index(), Some(12));
    assert!(pending.expired);

    // a reveal naming a DIFFERENT cell re-issues the captured one
    engine.reveal_cell(BOB, 77).unwrap();
    assert_eq!(engine.get_clear_cell(BOB, 12).unwrap(), expected);
    assert!(!engine.is_clear_cell_available(BOB, 77).unwrap());
    assert!(!engine.pending_decryption_request(BOB).is_pending());

    // the clue was not recomputed for cell 77, nor was 77 marked played
    let moves = decode_moves(engine.moves_of(BOB).unwrap(), CELL_COUNT).unwrap();
    assert!(moves[12]);
    assert!(!moves[77]);
}

#[test]
fn forcing_expiry_needs_an_idle_gateway() {
    let mut engine = deferred_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.new_game(BOB, Difficulty::Easy, 16).unwrap();

    engine.reveal_cell(ALICE, 30).unwrap();
    engine.set_next_reveal_overrides(RevealOverrides {
        force_expired: true,
        defer_gateway: false,
    });
    assert_eq!(
        engine.reveal_cell(BOB, 30),
        Err(StateError::GatewayBusy.into())
    );
}

#[test]
fn stale_callbacks_are_rejected() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.reveal_cell(ALICE, 30).unwrap();

    // request 0 already resolved by the synchronous drain
    assert_eq!(
        engine.decryption_callback(0, 0, false),
        Err(StateError::StaleCallback { request_id: 0 }.into())
    );
    assert_eq!(
        engine.decryption_callback(999, 0, false),
        Err(StateError::StaleCallback { request_id: 999 }.into())
    );
}

#[test]
fn deleting_a_game_orphans_its_queued_ticket() {
    let mut engine = deferred_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.reveal_cell(ALICE, 30).unwrap();

    // the new game discards the pending request while its ticket is queued
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.service_gateway().unwrap();

    assert!(!engine.is_clear_cell_available(ALICE, 30).unwrap());
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.moves_of(ALICE), Some(Word256::ZERO));
}

#[test]
fn wait_for_clear_cell_polls_until_resolution() {
    let mut engine = deferred_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.reveal_cell(ALICE, 30).unwrap();

    let mut sleeps = 0;
    let clue = engine
        .wait_for_clear_cell(ALICE, 30, 5, |_| sleeps += 1)
        .unwrap();
    assert_eq!(clue, 0);
    assert_eq!(sleeps, 0, "first service pass already resolves");
}

#[test]
fn wait_for_clear_cell_times_out() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.set_next_reveal_overrides(RevealOverrides {
        force_expired: true,
        defer_gateway: false,
    });
    engine.reveal_cell(ALICE, 30).unwrap();

    let mut sleeps = 0;
    assert_eq!(
        engine.wait_for_clear_cell(ALICE, 30, 3, |_| sleeps += 1),
        Err(Error::Timeout { retries: 3 })
    );
    assert_eq!(sleeps, 3);
}

#[test]
fn generated_densities_stay_in_band() {
    let bands = [
        (Difficulty::Easy, 8.0, 10.5),
        (Difficulty::Medium, 11.0, 13.0),
        (Difficulty::Hard, 17.0, 20.0),
    ];
    for (level, low, high) in bands {
        let average: f64 = (0..50)
            .map(|counter| {
                density(DeterministicGenerator::board_at(level, counter, 0).unwrap())
            })
            .sum::<f64>()
            / 50.0;
        assert!(
            (low..=high).contains(&average),
            "level {:?} average density {average}",
            level
        );
    }
}

#[test]
fn new_game_resets_previous_state() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    let first_board = engine.board_of(ALICE).unwrap();
    let bomb = bomb_cells(first_board.reveal())[0];
    engine.reveal_cell(ALICE, bomb).unwrap();
    assert!(engine.is_game_over(ALICE));

    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    assert!(engine.has_game_in_progress(ALICE));
    assert!(!engine.is_game_over(ALICE));
    assert_eq!(engine.moves_of(ALICE), Some(Word256::ZERO));
    assert_eq!(engine.get_clear_cache(ALICE), [Word256::ZERO; 2]);
    assert_ne!(engine.board_of(ALICE), Some(first_board), "counter advanced");
    let board = engine.board_of(ALICE).unwrap().reveal();
    assert_eq!(board & BOARD_MASK, board);
}

#[test]
fn event_payloads_serialize_for_observers() {
    let mut engine = sync_engine();
    engine.new_game(ALICE, Difficulty::Easy, 16).unwrap();
    engine.reveal_cell(ALICE, 30).unwrap();
    let events = engine.drain_events();
    let json = serde_json::to_string(&events).unwrap();
    let back: Vec<CellRevealed> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, events);
}
