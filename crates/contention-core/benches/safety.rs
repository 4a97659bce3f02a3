use contention_core::{AllocationState, SafetyRequest, check_safety, check_state};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const PROCESS_TIERS: [usize; 3] = [16, 128, 512];
const RESOURCES: usize = 8;

/// Every process holds one unit of each resource and process `i` needs
/// `P - i` more, so only the last unfinished process is runnable in each
/// pass. This is the slowest shape for the pass loop.
fn reverse_chain(processes: usize) -> AllocationState {
    let allocation = vec![vec![1; RESOURCES]; processes];
    let max = (0..processes)
        .map(|i| vec![(processes - i) as u64 + 1; RESOURCES])
        .collect();
    AllocationState {
        available: vec![1; RESOURCES],
        max,
        allocation,
    }
}

fn bench_safety(c: &mut Criterion) {
    let mut group = c.benchmark_group("safety.reverse_chain");

    for processes in PROCESS_TIERS {
        let state = reverse_chain(processes);
        let snapshot = SafetyRequest {
            state: state.clone(),
            request: vec![0; RESOURCES],
            process: 0,
        };
        group.throughput(Throughput::Elements(processes as u64));

        group.bench_with_input(BenchmarkId::new("check_state", processes), &state, |b, s| {
            b.iter(|| black_box(check_state(s)))
        });

        group.bench_with_input(
            BenchmarkId::new("check_safety", processes),
            &snapshot,
            |b, s| b.iter(|| black_box(check_safety(s))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_safety);
criterion_main!(benches);
