use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use lithium::{lexer, parser, token::Token};

static INPUT: &str = include_str!("../../demos/calculator.li");

fn parser(input: &str, tokens: &[Token]) {
    let decls = parser::parse_decls(input, tokens).unwrap();
    _ = black_box(decls);
}

fn criterion_benchmark(c: &mut Criterion) {
    let tokens = lexer::lex_in_new(INPUT);

    c.bench_function("parser", |b| {
        b.iter(|| {
            black_box(parser(black_box(INPUT), black_box(&tokens)));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
