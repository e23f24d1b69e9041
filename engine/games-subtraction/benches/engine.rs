use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use games_subtraction::{Board, Rules, StateIndex, SubtractionGame};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtraction_reset");
    group.bench_function("reset", |b| {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let mut game = SubtractionGame::new(Rules::default(), &mut rng).unwrap();
        b.iter(|| game.reset(&mut rng));
    });
    group.finish();
}

fn bench_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtraction_rules");
    let board = Board::from_rows([[17, 4, 29], [8, 61, 3], [40, 12, 9]]);

    group.bench_function("legal_mask", |b| {
        b.iter(|| board.legal_mask());
    });

    group.bench_function("termination", |b| {
        b.iter(|| board.termination());
    });

    group.bench_function("apply", |b| {
        let base = SubtractionGame::from_board(Rules::default(), board);
        b.iter_batched(
            || base.clone(),
            |mut game| {
                game.apply(0).unwrap();
                game
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtraction_encoding");
    group.bench_function("encode_current", |b| {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let game = SubtractionGame::new(Rules::default(), &mut rng).unwrap();
        b.iter(|| game.encode(StateIndex::Current).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_reset, bench_rules, bench_encode);
criterion_main!(benches);
