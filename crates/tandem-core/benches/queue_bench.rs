use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use tandem_core::{Command, CommandQueue};

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("Command Queue");

    group.bench_function("Enqueue + drain 1,000 markers", |b| {
        let queue = CommandQueue::new();
        b.iter(|| {
            for n in 0..1_000u32 {
                queue.enqueue(Command::DebugMarker(n.to_string()));
            }
            black_box(queue.drain_for_execution().len());
        });
    });

    group.bench_function("Enqueue_all 1,000 presents", |b| {
        let queue = CommandQueue::new();
        b.iter(|| {
            queue.enqueue_all((0..1_000).map(|_| Command::Present));
            black_box(queue.drain_for_execution().len());
        });
    });

    group.bench_function("4 producers x 250 enqueues, 1 drainer", |b| {
        let queue = Arc::new(CommandQueue::new());
        b.iter(|| {
            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        for _ in 0..250 {
                            queue.enqueue(Command::EndPass);
                        }
                    })
                })
                .collect();
            for producer in producers {
                producer.join().unwrap();
            }
            black_box(queue.drain_for_execution().len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_queue);
criterion_main!(benches);
