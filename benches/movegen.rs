//! Benchmarks for the critical move generation codepath: raw generation
//! over positions from different game phases, make-move, and a shallow
//! perft that exercises both together.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tabiya::{movegen::generate_moves, perft::perft, Board};

/// Test positions representing different game phases and move complexity.
fn benchmark_positions() -> Vec<(&'static str, Board)> {
    [
        (
            "starting",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        ),
        (
            "tactical",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        ),
        (
            "middlegame",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - -",
        ),
        ("endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -"),
    ]
    .iter()
    .map(|&(name, fen)| (name, Board::from_fen(fen).unwrap().0))
    .collect()
}

/// Benchmarks full legal move generation for each position.
fn benchmark_move_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Move Generation");

    for (name, board) in benchmark_positions() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &board, |b, board| {
            b.iter(|| black_box(generate_moves(black_box(board))))
        });
    }

    group.finish();
}

/// Benchmarks applying every legal move of a position.
fn benchmark_make_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("Make Move");

    for (name, board) in benchmark_positions() {
        let moves = generate_moves(&board);
        group.bench_with_input(BenchmarkId::from_parameter(name), &board, |b, board| {
            b.iter(|| {
                for &m in &moves {
                    black_box(board.make_move(black_box(m)));
                }
            })
        });
    }

    group.finish();
}

/// Benchmarks a shallow perft from the starting position, the closest
/// thing to an end-to-end throughput number for the generator.
fn benchmark_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("Perft");
    group.sample_size(20);

    group.bench_function("startpos depth 4", |b| {
        b.iter(|| {
            perft(
                black_box("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
                4,
            )
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_move_generation,
    benchmark_make_move,
    benchmark_perft
);
criterion_main!(benches);
