use criterion::{Criterion, black_box, criterion_group, criterion_main};
use smon::filter::{FilterCriteria, apply_filter};
use smon::fixtures::FixtureBackend;
use smon::parser::{parse_jobs, parse_nodes};

fn benchmark_parse_nodes(c: &mut Criterion) {
    let text = FixtureBackend::new().node_text();
    c.bench_function("parse nodes", |b| b.iter(|| parse_nodes(black_box(&text))));
}

fn benchmark_parse_jobs(c: &mut Criterion) {
    let text = FixtureBackend::new().job_text();
    c.bench_function("parse jobs", |b| b.iter(|| parse_jobs(black_box(&text))));
}

fn benchmark_filter_jobs(c: &mut Criterion) {
    // Scale the demo queue up to something closer to a busy cluster
    let text = FixtureBackend::new().job_text().repeat(50);
    let jobs = parse_jobs(&text).records;
    let criteria = FilterCriteria::new(Some("ALICE"), Some("train"));
    c.bench_function("filter jobs", |b| {
        b.iter(|| apply_filter(black_box(&jobs), black_box(&criteria)))
    });
}

criterion_group!(
    benches,
    benchmark_parse_nodes,
    benchmark_parse_jobs,
    benchmark_filter_jobs
);
criterion_main!(benches);
