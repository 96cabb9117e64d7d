use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use formlang::{Nfa, determinize, minimize};

/// Words over {a, b} whose `n`-th symbol from the end is `a`. The DFA has 2^n states.
fn nth_from_end(n: usize) -> Nfa {
    let labels: Vec<String> = (0..=n).map(|i| i.to_string()).collect();
    let mut builder = Nfa::builder().symbol("a").symbol("b").start("0");
    for (i, label) in labels.iter().enumerate() {
        builder = builder.state(label, i == n);
    }
    builder = builder
        .transition("0", "a", "0")
        .transition("0", "b", "0")
        .transition("0", "a", "1");
    for i in 1..n {
        builder = builder
            .transition(&labels[i], "a", &labels[i + 1])
            .transition(&labels[i], "b", &labels[i + 1]);
    }
    builder.build().unwrap()
}

fn bench_determinize(c: &mut Criterion) {
    let mut group = c.benchmark_group("determinize");
    for n in [4, 8, 12] {
        let nfa = nth_from_end(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &nfa, |b, nfa| {
            b.iter(|| determinize(black_box(nfa)))
        });
    }
    group.finish();
}

fn bench_minimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize");
    for n in [4, 8, 12] {
        let dfa = determinize(&nth_from_end(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &dfa, |b, dfa| {
            b.iter(|| minimize(black_box(dfa)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_determinize, bench_minimize);
criterion_main!(benches);
