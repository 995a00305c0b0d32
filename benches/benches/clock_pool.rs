// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for clock reuse and per-tick animation sampling.

use core::time::Duration;
use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::rc::Rc;

use trellis_animation::{ClockPool, Easing, LoopBehavior, PoolConfig};
use trellis_property::PropertyRegistry;
use trellis_ui::{FrameworkProperties, Leaf, Presentation, PresentationConfig};

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("animation/pool");

    group.bench_function("retrieve_release_warm", |b| {
        let mut pool: ClockPool<u32> = ClockPool::new(PoolConfig::default());
        b.iter(|| {
            let handle = pool.retrieve(7, Duration::from_millis(100), LoopBehavior::None);
            black_box(pool.release(handle))
        });
    });

    group.bench_function("retrieve_release_cold", |b| {
        let config = PoolConfig {
            initial_capacity: 0,
            high_watermark: 0,
        };
        let mut pool: ClockPool<u32> = ClockPool::new(config);
        b.iter(|| {
            let handle = pool.retrieve(7, Duration::from_millis(100), LoopBehavior::None);
            black_box(pool.release(handle))
        });
    });

    for active in [16_u32, 256] {
        group.bench_function(BenchmarkId::new("update", active), |b| {
            b.iter_batched_ref(
                || {
                    let mut pool = ClockPool::new(PoolConfig::default());
                    for i in 0..active {
                        pool.retrieve(i, Duration::from_secs(1), LoopBehavior::Repeat);
                    }
                    pool
                },
                |pool| black_box(pool.update(Duration::from_millis(16))),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_tweens(c: &mut Criterion) {
    let mut group = c.benchmark_group("animation/tween_tick");
    for count in [16_usize, 256] {
        let mut registry = PropertyRegistry::new();
        let fw = FrameworkProperties::register(&mut registry);
        let mut presentation =
            Presentation::new(Rc::new(registry), fw, PresentationConfig::default());
        let id = presentation.add_view();
        let nodes: Vec<_> = (0..count)
            .map(|_| presentation.view_mut(id).unwrap().add_root("Leaf", Leaf::new(10.0, 10.0)))
            .collect();
        for &node in &nodes {
            presentation
                .animate(id, node, fw.opacity, 0.0, Easing::EaseInOut, Duration::from_secs(3600))
                .unwrap();
        }
        presentation.update(Duration::ZERO);
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| black_box(presentation.update(Duration::from_millis(1))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pool, bench_tweens);
criterion_main!(benches);
