// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for selector parsing and full-tree restyles.

use core::time::Duration;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::rc::Rc;

use kurbo::Size;
use trellis_property::PropertyRegistry;
use trellis_style::{ComparisonOp, RuleBuilder, Selector, StyleSheetBuilder, TriggerBuilder};
use trellis_ui::{FrameworkProperties, Leaf, NodeId, Presentation, PresentationConfig, StackPanel, ViewId};

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("style/parse");
    for text in ["Button", "Panel > Button.primary:focused", "#main StackPanel .item.selected"] {
        group.bench_with_input(BenchmarkId::from_parameter(text), text, |b, text| {
            b.iter(|| black_box(Selector::parse(text).unwrap()));
        });
    }
    group.finish();
}

/// A root stack with `rows` rows of four buttons each.
fn build(rows: usize) -> (Presentation, ViewId, Vec<NodeId>) {
    let mut registry = PropertyRegistry::new();
    let fw = FrameworkProperties::register(&mut registry);
    let registry = Rc::new(registry);
    let sheet = StyleSheetBuilder::new()
        .rule(RuleBuilder::new("Button").set("Margin", "2").set("Height", "24"))
        .rule(RuleBuilder::new("StackPanel > StackPanel").set("Margin", "4"))
        .rule(RuleBuilder::new(".primary").set("Foreground", "#3366ff"))
        .rule(RuleBuilder::new("Button.primary:hover").set("Opacity", "0.8"))
        .rule(RuleBuilder::new("#toolbar Button").set("Width", "32"))
        .rule(RuleBuilder::new("Button").trigger(
            TriggerBuilder::property("Opacity", ComparisonOp::Less, "1").set("Foreground", "red"),
        ))
        .build(&registry)
        .unwrap();

    let mut presentation = Presentation::new(registry, fw, PresentationConfig::default());
    let id = presentation.add_view();
    let view = presentation.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    view.set_viewport(Size::new(800.0, 600.0));
    let root = view.add_root("StackPanel", StackPanel::vertical());
    view.set_name(root, Some("toolbar")).unwrap();
    let mut buttons = Vec::new();
    for row in 0..rows {
        let line = view.add_child(root, "StackPanel", StackPanel::horizontal()).unwrap();
        for column in 0..4 {
            let button = view.add_child(line, "Button", Leaf::new(20.0, 10.0)).unwrap();
            if (row + column) % 3 == 0 {
                view.add_class(button, "primary").unwrap();
                view.set_pseudo_class(button, "hover", true).unwrap();
            }
            buttons.push(button);
        }
    }
    presentation.update(Duration::ZERO);
    (presentation, id, buttons)
}

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("style/cascade");
    for rows in [16_usize, 128] {
        let (mut presentation, id, buttons) = build(rows);
        let root = presentation.view(id).unwrap().roots()[0];
        group.throughput(Throughput::Elements((rows * 5 + 1) as u64));
        group.bench_function(BenchmarkId::new("restyle_all", rows), |b| {
            b.iter(|| {
                presentation.view_mut(id).unwrap().mark_subtree_style_dirty(root);
                black_box(presentation.update(Duration::ZERO).styled)
            });
        });

        let target = buttons[buttons.len() / 2];
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("toggle_hover", rows), |b| {
            let mut hover = false;
            b.iter(|| {
                hover = !hover;
                let view = presentation.view_mut(id).unwrap();
                view.set_pseudo_class(target, "hover", hover).unwrap();
                black_box(presentation.update(Duration::ZERO).styled)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_cascade);
criterion_main!(benches);
