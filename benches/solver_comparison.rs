use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use equal_teams::catalog::SubsetCatalog;
use equal_teams::cegar::CegarLoop;
use equal_teams::encoder::{CandidateEncoder, EncoderOptions};
use equal_teams::engine::exhaustive::ExhaustiveSolver;
use equal_teams::engine::sat::SatBackend;
use equal_teams::static_solver::StaticSolver;
use equal_teams::sweep::Budget;

/// CEGAR against static encoding, on both backends, for small pools
fn solver_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver_comparison");
    group.sample_size(10);

    for (size, max_value) in [(10usize, 4i64), (11, 3)] {
        let catalog = SubsetCatalog::new(size).unwrap();
        let encoder = CandidateEncoder::new(
            size,
            EncoderOptions {
                min_value: 1,
                max_value,
                pruning: true,
                threads: 1,
            },
        );
        let name = format!("n{size}_max{max_value}");

        group.bench_with_input(BenchmarkId::new("cegar_exhaustive", &name), &(), |b, _| {
            b.iter(|| {
                CegarLoop::new(&catalog, &encoder)
                    .run(ExhaustiveSolver::new(), &Budget::unlimited())
                    .unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("cegar_sat", &name), &(), |b, _| {
            b.iter(|| {
                CegarLoop::new(&catalog, &encoder)
                    .run(SatBackend::default(), &Budget::unlimited())
                    .unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("static_sat", &name), &(), |b, _| {
            b.iter(|| {
                StaticSolver::new(&catalog, &encoder)
                    .run(SatBackend::default(), &Budget::unlimited())
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, solver_comparison);
criterion_main!(benches);
