use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use lithium::{lexer, token::Token};

static INPUT: &str = include_str!("../../demos/calculator.li");

fn lexer(input: &str, tokens: &mut Vec<Token>) {
    lexer::lex(input, tokens);
    let trivia = tokens.iter().filter(|t| t.kind.is_trivia()).count();
    black_box(trivia);
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);

    c.bench_function("lexer", |b| {
        b.iter(|| {
            tokens.clear();
            black_box(lexer(black_box(INPUT), &mut tokens));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
