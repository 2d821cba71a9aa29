use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_engine::{
    AccountType, MemoryLedger, Money, NewAccount, PostingEngine, PostingEntry, PostingRequest,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn engine_with_accounts(count: usize) -> PostingEngine<MemoryLedger> {
    let store = Arc::new(MemoryLedger::new());
    for i in 0..count {
        let account_type = if i % 2 == 0 {
            AccountType::Asset
        } else {
            AccountType::Liability
        };
        store
            .open_account(NewAccount::new(format!("{:04}", i), "bench", account_type, "CNY"))
            .unwrap();
    }
    PostingEngine::new(store)
}

fn bench_post_transaction(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("post_transaction");

    for legs in [1usize, 5, 25] {
        let engine = engine_with_accounts(legs * 2);
        let counter = AtomicU64::new(0);

        group.bench_with_input(BenchmarkId::from_parameter(legs * 2), &legs, |b, &legs| {
            b.iter(|| {
                let n = counter.fetch_add(1, Ordering::Relaxed);
                let mut entries = Vec::with_capacity(legs * 2);
                for leg in 0..legs {
                    entries.push(PostingEntry::debit(format!("{:04}", leg * 2), "12.3400"));
                    entries.push(PostingEntry::credit(format!("{:04}", leg * 2 + 1), "12.3400"));
                }
                let request = PostingRequest::new(format!("bench-{}", n), "BENCH", entries);
                rt.block_on(engine.post_transaction(black_box(request))).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_money_parse(c: &mut Criterion) {
    c.bench_function("money_parse", |b| {
        b.iter(|| Money::parse(black_box("1234567.8901")).unwrap())
    });
}

criterion_group!(benches, bench_post_transaction, bench_money_parse);
criterion_main!(benches);
