//! Framing benchmarks
//!
//! Measures request/response encoding and incremental request parsing.
//!
//! Run with: cargo bench --bench framing

use barehttp::http::{HttpRequest, HttpResponse, Method, RequestParser, Status};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn post_wire(body_len: usize) -> Vec<u8> {
    HttpRequest::builder()
        .method(Method::Post)
        .target("/upload.bin")
        .header("Content-Length", body_len.to_string())
        .body(vec![b'x'; body_len])
        .build()
        .to_wire()
        .to_vec()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("get_request", |b| {
        let request = HttpRequest::new(Method::Get, "/index.html");
        b.iter(|| black_box(request.to_wire()));
    });

    group.bench_function("not_found_response", |b| {
        let response = HttpResponse::new(Status::NOT_FOUND);
        b.iter(|| black_box(response.to_wire()));
    });

    group.finish();
}

fn bench_parse_post(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_post");

    for size in [0usize, 1024, 64 * 1024, 1024 * 1024] {
        let wire = post_wire(size);
        group.throughput(Throughput::Bytes(wire.len() as u64));

        group.bench_with_input(BenchmarkId::new("single_read", size), &wire, |b, wire| {
            b.iter(|| {
                let mut parser = RequestParser::new();
                black_box(parser.parse(black_box(wire)).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("4k_reads", size), &wire, |b, wire| {
            b.iter(|| {
                let mut parser = RequestParser::new();
                let mut parsed = None;
                for chunk in wire.chunks(4096) {
                    if let Some(request) = parser.parse(chunk).unwrap() {
                        parsed = Some(request);
                    }
                }
                black_box(parsed)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_parse_post);
criterion_main!(benches);
