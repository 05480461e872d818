//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jobflow::prelude::*;
use jobflow::testing::{AppendTask, RecordingMiddleware};

fn build(tasks: usize) -> JobPipeline {
    let pipeline = JobPipeline::default();
    pipeline.add_pre_middleware(RecordingMiddleware::new());
    pipeline.add_post_middleware(RecordingMiddleware::new());
    for n in 0..tasks {
        pipeline.add_task(AppendTask::new(".", format!("t{n}")));
    }
    pipeline
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    c.bench_function("run_16_tasks", |b| {
        b.iter(|| {
            let pipeline = build(16);
            let outcome = runtime.block_on(pipeline.execute_pipeline(black_box("seed")));
            black_box(outcome)
        })
    });

    c.bench_function("run_16_tasks_with_events", |b| {
        b.iter(|| {
            let pipeline = build(16);
            pipeline.subscribe(std::sync::Arc::new(NoOpEventSink));
            let outcome = runtime.block_on(pipeline.execute_pipeline(black_box("seed")));
            black_box(outcome)
        })
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
