// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for tiered property resolution.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use peniko::Color;
use std::rc::Rc;
use std::sync::Once;

use trellis_property::{
    ErasedValue, Property, PropertyMetadataBuilder, PropertyRegistry, PropertyStore, ValueTier,
    walk_inherited,
};
use trellis_ui::{FrameworkProperties, Leaf, View};

fn bench_store(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: PropertyStore={} ErasedValue={}",
            size_of::<PropertyStore>(),
            size_of::<ErasedValue>(),
        );
    });

    let mut registry = PropertyRegistry::new();
    let width: Property<f64> =
        registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
    let font_size: Property<f64> = registry.register(
        "FontSize",
        PropertyMetadataBuilder::styled(12.0_f64)
            .inherits(true)
            .build(),
    );

    let mut group = c.benchmark_group("property/store");

    group.bench_function("local", |b| {
        let mut store = PropertyStore::new();
        store.set_local(width, 100.0);
        b.iter(|| black_box(store.get_effective(width, &registry)));
    });

    group.bench_function("animated_over_local", |b| {
        let mut store = PropertyStore::new();
        store.set_local(width, 100.0);
        store.set(ValueTier::Animated, width, 200.0);
        b.iter(|| black_box(store.get_effective(width, &registry)));
    });

    group.bench_function("default", |b| {
        let store = PropertyStore::new();
        b.iter(|| black_box(store.get_effective(width, &registry)));
    });

    for chain_len in [4_usize, 16, 64] {
        let mut stores: Vec<PropertyStore> = (0..chain_len).map(|_| PropertyStore::new()).collect();
        stores[0].set(ValueTier::Styled, font_size, 16.0);
        let parents: Vec<Option<usize>> =
            (0..chain_len).map(|i| i.checked_sub(1)).collect();
        let lookup = |key: usize| Some((&stores[key], parents[key]));
        group.bench_function(BenchmarkId::new("inherited", chain_len), |b| {
            b.iter(|| black_box(walk_inherited(parents[chain_len - 1], font_size, &lookup)));
        });
    }

    group.finish();
}

fn bench_view(c: &mut Criterion) {
    let mut registry = PropertyRegistry::new();
    let fw = FrameworkProperties::register(&mut registry);
    let mut view = View::new(Rc::new(registry), fw);

    let root = view.add_root("Panel", Leaf::new(0.0, 0.0));
    view.set_local(root, fw.foreground, Color::from_rgb8(10, 20, 30)).unwrap();
    let mut leaf = root;
    for _ in 0..15 {
        leaf = view.add_child(leaf, "Panel", Leaf::new(0.0, 0.0)).unwrap();
    }
    view.set_local(leaf, fw.width, 40.0).unwrap();

    let mut group = c.benchmark_group("property/view");
    group.bench_function("local", |b| {
        b.iter(|| black_box(view.get(leaf, fw.width).unwrap()));
    });
    group.bench_function("default", |b| {
        b.iter(|| black_box(view.get(leaf, fw.opacity).unwrap()));
    });
    group.bench_function(BenchmarkId::new("inherited", 16), |b| {
        b.iter(|| black_box(view.get(leaf, fw.foreground).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_store, bench_view);
criterion_main!(benches);
