//! # Shard-Chain Subsystem Benchmarks
//!
//! | Subsystem | Operation |
//! |-----------|-----------|
//! | sc-01 Ledger | Batch application, relative-state computation |
//! | sc-02 Sharding | Validator shuffle, transaction routing |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sc_01_ledger::{apply_batch, compute_relative_state, LedgerParams};
use sc_02_sharding::{assign_validators_to_shards, TransactionRouter};
use shared_types::{Account, FundsTx, GlobalState, Transaction, TxBatch};

fn address(i: u32) -> [u8; 32] {
    let mut address = [0u8; 32];
    address[..4].copy_from_slice(&i.to_be_bytes());
    address
}

fn funded_state(accounts: u32) -> GlobalState {
    (0..accounts)
        .map(|i| (address(i), Account::new(address(i), 1_000_000)))
        .collect()
}

fn staking_state(validators: u32) -> GlobalState {
    (0..validators)
        .map(|i| (address(i), Account::validator(address(i), 5_000, address(i))))
        .collect()
}

fn transfers(count: u32, accounts: u32) -> Vec<Transaction> {
    (0..count)
        .map(|i| {
            Transaction::Funds(FundsTx {
                from: address(i % accounts),
                to: address((i + 1) % accounts),
                amount: 10,
                fee: 1,
                nonce: u64::from(i),
            })
        })
        .collect()
}

// ============================================================================
// SC-01: Ledger
// ============================================================================

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-01-ledger");
    let params = LedgerParams::default();
    let state = funded_state(1_000);
    let beneficiary = address(0);

    for size in [10u32, 100, 1_000] {
        let batch: TxBatch = transfers(size, 1_000).into_iter().collect();
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("apply_batch", size), &batch, |b, batch| {
            b.iter(|| apply_batch(black_box(state.clone()), &beneficiary, batch, &params))
        });

        let after = apply_batch(state.clone(), &beneficiary, &batch, &params).unwrap();
        group.bench_with_input(
            BenchmarkId::new("compute_relative_state", size),
            &after,
            |b, after| b.iter(|| compute_relative_state(black_box(&state), after, 2)),
        );
    }
    group.finish();
}

// ============================================================================
// SC-02: Sharding
// ============================================================================

fn bench_sharding(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-02-sharding");

    for validators in [16u32, 256, 4_096] {
        let state = staking_state(validators);
        group.bench_with_input(
            BenchmarkId::new("assign_validators", validators),
            &state,
            |b, state| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| assign_validators_to_shards(black_box(state), 4, None, 0, &mut rng))
            },
        );
    }

    let open = transfers(10_000, 1_000);
    let senders = funded_state(1_000);
    group.throughput(Throughput::Elements(open.len() as u64));
    group.bench_function("route_10000", |b| {
        b.iter(|| {
            let mut router = TransactionRouter::new();
            router.route(black_box(&open), 0, 16)
        })
    });
    group.bench_function("route_funded_10000", |b| {
        b.iter(|| {
            let mut router = TransactionRouter::new();
            router.route_funded(black_box(&open), 0, 16, &senders)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_ledger, bench_sharding);
criterion_main!(benches);
