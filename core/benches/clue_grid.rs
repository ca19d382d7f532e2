use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use minefog_core::{CELL_COUNT, Ct256, DeterministicGenerator, Difficulty, probe_cell};

fn probe_full_board(c: &mut Criterion) {
    let board = Ct256::seal(DeterministicGenerator::board_at(Difficulty::Hard, 0, 0).unwrap());
    c.bench_function("probe_full_board", |b| {
        b.iter(|| {
            for cell in 0..CELL_COUNT {
                black_box(probe_cell(black_box(board), cell).unwrap());
            }
        })
    });
}

fn generate_boards(c: &mut Criterion) {
    c.bench_function("generate_boards", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            black_box(DeterministicGenerator::board_at(Difficulty::Easy, counter, 16).unwrap())
        })
    });
}

criterion_group!(benches, probe_full_board, generate_boards);
criterion_main!(benches);
