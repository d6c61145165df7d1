//! Routing benchmarks.
//!
//! Run with: `cargo bench -p daedalus-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use daedalus_router::Router;
use http::Method;

fn build_router(num_routes: usize) -> Router<usize> {
    let mut router = Router::new();
    let third = num_routes / 3;

    for i in 0..third {
        router
            .insert(&Method::GET, &format!("/api/v1/resource{i}"), i)
            .unwrap();
    }
    for i in 0..third {
        router
            .insert(&Method::GET, &format!("/api/v1/resource{i}/:id"), third + i)
            .unwrap();
    }
    for i in 0..third {
        router
            .insert(
                &Method::GET,
                &format!("/api/v1/org/:org/resource{i}/:id"),
                2 * third + i,
            )
            .unwrap();
    }

    router
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource25/12345")));
    });
}

fn bench_route_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_by_size");
    for size in [30, 300, 3000] {
        let router = build_router(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &router, |b, router| {
            b.iter(|| {
                black_box(router.match_route(&Method::GET, "/api/v1/org/acme/resource5/42"))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_static_match, bench_param_match, bench_route_count);
criterion_main!(benches);
