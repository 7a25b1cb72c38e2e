use criterion::{criterion_group, criterion_main, Criterion};
use octopus::mentions::{extract_addresses, replace_addresses};
use octopus::push::trim_message;
use std::collections::HashMap;
use std::hint::black_box;

fn address(i: usize) -> String {
    format!("cosmos1{:038x}", i)
}

fn benchmark_mentions(c: &mut Criterion) {
    // A long argument with a dozen mentions, some repeated
    let mut body = String::new();
    for i in 0..60 {
        body.push_str("Staking on this claim because the evidence is strong. ");
        if i % 5 == 0 {
            body.push_str(&format!("cc @{} ", address(i % 20)));
        }
    }
    let usernames: HashMap<String, String> = (0..20)
        .map(|i| (address(i), format!("user_{i}")))
        .collect();

    let mut group = c.benchmark_group("mentions");

    group.bench_function("extract_addresses", |b| {
        b.iter(|| extract_addresses(black_box(&body)))
    });

    group.bench_function("replace_addresses", |b| {
        b.iter(|| replace_addresses(black_box(&body), black_box(&usernames)))
    });

    group.bench_function("trim_message", |b| {
        b.iter(|| trim_message(black_box(&body)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_mentions);
criterion_main!(benches);
