//! Mining benchmarks: dense blocks with planted noise, growing domains.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::io::Cursor;
use std::time::Duration;

use nsetmine::{mine_relation, CollectingSink, MiningConfig};

/// Deterministic planted-block relation: two overlapping dense blocks over
/// a side x side grid, with every fourth cell of the second block degraded.
fn planted_relation(side: usize) -> String {
    let half = side / 2;
    let mut text = String::new();
    let mut toggle = 0usize;
    for r in 0..side {
        for c in 0..side {
            let in_first = r <= half && c <= half;
            let in_second = r >= half.saturating_sub(1) && c >= half.saturating_sub(1);
            if !(in_first || in_second) {
                continue;
            }
            toggle += 1;
            if in_second && !in_first && toggle % 4 == 0 {
                text.push_str(&format!("r{r} c{c} 0.5\n"));
            } else {
                text.push_str(&format!("r{r} c{c} 1\n"));
            }
        }
    }
    text
}

fn bench_mining(c: &mut Criterion) {
    let mut group = c.benchmark_group("mine_planted_blocks");
    for side in [8usize, 12, 16] {
        let relation = planted_relation(side);
        let mut config = MiningConfig::default();
        config.constraints.epsilon = vec![1.0, 1.0];
        config.constraints.min_sizes = vec![3, 3];

        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| {
                let mut sink = CollectingSink::default();
                mine_relation(&config, Cursor::new(relation.clone()), "bench", &mut sink)
                    .expect("mines");
                sink.patterns.len()
            });
        });
    }
    group.finish();
}

fn bench_reduction(c: &mut Criterion) {
    let relation = planted_relation(24);
    let mut config = MiningConfig::default();
    config.constraints.epsilon = vec![0.5, 0.5];
    config.constraints.min_sizes = vec![4, 4];
    config.engine.reduction_only = true;

    c.bench_function("reduce_planted_blocks", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            nsetmine::run(&config, Cursor::new(relation.clone()), "bench", &mut out)
                .expect("reduces");
            out.len()
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_mining, bench_reduction
}
criterion_main!(benches);
