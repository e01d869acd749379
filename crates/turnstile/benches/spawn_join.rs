use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use turnstile::{Runtime, RuntimeOptions, Semaphore, Word};

fn bench_spawn_release_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_release_join");

    for tasks in [1usize, 8, 64] {
        group.throughput(Throughput::Elements(tasks as u64));
        group.bench_with_input(BenchmarkId::new("noop", tasks), &tasks, |b, &tasks| {
            b.iter(|| {
                let rt = Runtime::new(RuntimeOptions::default());
                for i in 0..tasks {
                    rt.spawn(&format!("bench-{}", i), || {});
                }
                rt.run_all_threads();
                black_box(rt.task_count())
            });
        });
    }

    group.finish();
}

fn bench_word_args(c: &mut Criterion) {
    c.bench_function("spawn_with_eight_args", |b| {
        b.iter(|| {
            let rt = Runtime::new(RuntimeOptions::default());
            let sum = Arc::new(AtomicUsize::new(0));
            let total = sum.clone();
            rt.spawn_with_args(
                "adder",
                move |args: &[Word]| {
                    total.fetch_add(args.iter().sum::<usize>(), Ordering::Relaxed);
                },
                black_box(&[1, 2, 3, 4, 5, 6, 7, 8]),
            );
            rt.run_all_threads();
            sum.load(Ordering::Relaxed)
        });
    });
}

fn bench_transitive(c: &mut Criterion) {
    c.bench_function("parent_spawns_children", |b| {
        b.iter(|| {
            let rt = Runtime::new(RuntimeOptions::default());
            let task_rt = rt.clone();
            rt.spawn("parent", move || {
                for i in 0..8 {
                    task_rt.spawn(&format!("child-{}", i), || {});
                }
            });
            rt.run_all_threads();
        });
    });
}

fn bench_semaphore(c: &mut Criterion) {
    let sem = Semaphore::new(0);
    c.bench_function("semaphore_signal_wait", |b| {
        b.iter(|| {
            sem.signal();
            sem.wait();
        });
    });
}

criterion_group!(
    benches,
    bench_spawn_release_join,
    bench_word_args,
    bench_transitive,
    bench_semaphore
);
criterion_main!(benches);
