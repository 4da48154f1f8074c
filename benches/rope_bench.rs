use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ropebuf::Rope;

fn build_rope(char_len: usize) -> Rope {
    let mut rope = Rope::new();
    let chunk = "the quick brown fox jumps over the lazy dog ";
    while rope.len_chars() < char_len {
        rope = rope.insert(rope.len_chars(), chunk).unwrap();
    }
    rope
}

fn bench_insert_middle(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_middle");
    for &size in &[1_000usize, 10_000, 100_000] {
        let rope = build_rope(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &rope, |b, rope| {
            b.iter(|| rope.insert(rope.len_chars() / 2, "x").unwrap());
        });
    }
    group.finish();
}

fn bench_char_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("char_at");
    for &size in &[1_000usize, 10_000, 100_000] {
        let rope = build_rope(size).balance();
        group.bench_with_input(BenchmarkId::from_parameter(size), &rope, |b, rope| {
            b.iter(|| rope.char_at(rope.len_chars() / 2).unwrap());
        });
    }
    group.finish();
}

fn bench_balance(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance");
    for &size in &[1_000usize, 10_000, 100_000] {
        let rope = build_rope(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &rope, |b, rope| {
            b.iter(|| rope.balance());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert_middle, bench_char_at, bench_balance);
criterion_main!(benches);
