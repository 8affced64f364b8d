use criterion::{criterion_group, criterion_main, Criterion};
use retrie::Machine;
use std::hint::black_box;

fn keyword_machine() -> Machine<u8, u32> {
    let mut m: Machine<u8, u32> = Machine::new();
    m.match_sequence(b"if").exit_point(1);
    m.root().match_sequence(b"else").exit_point(2);
    m.root().match_sequence(b"while").exit_point(3);
    m.root().match_sequence(b"return").exit_point(4);
    m.optimize();
    m
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("find keyword", |b| {
        let m = keyword_machine();
        b.iter(|| m.find(black_box(b"x = 1; while (x) { if (y) { return 0 } else { } }")))
    });

    c.bench_function("find_iter keywords", |b| {
        let m = keyword_machine();
        b.iter(|| {
            m.find_iter(black_box(b"if a while b else c return d"))
                .count()
        })
    });

    c.bench_function("build and optimize", |b| {
        b.iter(|| {
            let mut m: Machine<u8> = Machine::new();
            m.match_any_of(b"abcdef").exit_point(());
            m.optimize();
            black_box(m.len())
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
