use std::hint::black_box;

use chatmark_core::StreamingProcessor;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
mod common;

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize");
    group.sample_size(10);

    for sections in [10, 100] {
        let content = common::generate_chat_reply(sections);
        group.bench_with_input(BenchmarkId::new("chatmark", sections), &content, |b, text| {
            b.iter(|| {
                let tree = StreamingProcessor::new().finalize(black_box(text));
                black_box(tree);
            });
        });
        group.bench_with_input(
            BenchmarkId::new("pulldown_cmark", sections),
            &content,
            |b, text| {
                b.iter(|| {
                    let events: Vec<_> = pulldown_cmark::Parser::new(black_box(text)).collect();
                    black_box(events);
                });
            },
        );
    }

    group.finish();
}

fn bench_reveal(c: &mut Criterion) {
    let mut group = c.benchmark_group("reveal");
    group.sample_size(10);

    let reply = common::generate_chat_reply(10);
    group.bench_function("char_by_char", |b| {
        b.iter(|| {
            let mut processor = StreamingProcessor::new();
            for visible in 1..=reply.chars().count() {
                black_box(processor.append_text(&reply, visible));
            }
            black_box(processor.finalize(&reply));
        });
    });

    group.bench_function("chunks_of_16", |b| {
        b.iter(|| {
            let total = reply.chars().count();
            let mut processor = StreamingProcessor::new();
            let mut visible = 0;
            while visible < total {
                visible = (visible + 16).min(total);
                black_box(processor.append_text(&reply, visible));
            }
            black_box(processor.finalize(&reply));
        });
    });

    let prose = common::generate_plain_prose(20);
    group.bench_function("plain_prose", |b| {
        b.iter(|| {
            let mut processor = StreamingProcessor::new();
            for visible in 1..=prose.chars().count() {
                black_box(processor.append_text(&prose, visible));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_finalize, bench_reveal);
criterion_main!(benches);
