use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use curl_sections::{CurlParser, SectionSettings, parse, render_sections};
use std::hint::black_box;

fn commands() -> Vec<&'static str> {
    vec![
        "curl https://api.example.com/users",
        "curl 'https://jsonplaceholder.typicode.com/posts?userId=1&_limit=5'",
        r#"curl 'https://api.example.com/users?page=1' -X POST -H 'Content-Type: application/json' -H 'Authorization: Bearer abc123' -d '{"name":"John"}'"#,
        "curl 'https://x.com' --data 'a=1&b=2' -u 'alice:secret' --insecure -L --compressed",
    ]
}

fn bench_shared_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_parser");
    for (i, cmd) in commands().iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("parse", i), cmd, |b, cmd| {
            b.iter(|| parse(black_box(cmd)))
        });
    }
    group.finish();
}

fn bench_owned_parser(c: &mut Criterion) {
    let parser = CurlParser::new().unwrap();
    let mut group = c.benchmark_group("owned_parser");
    for (i, cmd) in commands().iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("parse", i), cmd, |b, cmd| {
            b.iter(|| parser.parse(black_box(cmd)))
        });
    }
    group.finish();
}

fn bench_sections(c: &mut Criterion) {
    let settings = SectionSettings::default();
    let parsed: Vec<_> = commands().into_iter().map(parse).collect();
    let mut group = c.benchmark_group("sections");
    for (i, req) in parsed.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("render", i), req, |b, req| {
            b.iter(|| render_sections(black_box(req), &settings).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_shared_parser, bench_owned_parser, bench_sections);
criterion_main!(benches);
