// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout driven by `Presentation::update`, including custom layouts.

use core::time::Duration;
use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Affine, Rect, Size};
use trellis_animation::Easing;
use trellis_property::PropertyRegistry;
use trellis_style::{RuleBuilder, StyleSheetBuilder};
use trellis_ui::{
    ElementLayout, FrameworkProperties, LayoutCx, LayoutError, Leaf, Presentation,
    PresentationConfig, StackPanel, ViewId,
};

fn setup() -> (Presentation, ViewId, FrameworkProperties) {
    let mut registry = PropertyRegistry::new();
    let fw = FrameworkProperties::register(&mut registry);
    let mut presentation =
        Presentation::new(Rc::new(registry), fw, PresentationConfig::default());
    let view = presentation.add_view();
    (presentation, view, fw)
}

/// Gives every child an equal share of the width, counting measure calls.
#[derive(Debug, Default)]
struct EvenRow {
    measures: Rc<Cell<usize>>,
}

impl ElementLayout for EvenRow {
    fn measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        self.measures.set(self.measures.get() + 1);
        let children = cx.children();
        let share = available.width / children.len().max(1) as f64;
        let mut height: f64 = 0.0;
        for child in children {
            height = height.max(cx.measure_child(child, Size::new(share, available.height)).height);
        }
        Size::new(available.width, height)
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, bounds: Rect) {
        let children = cx.children();
        let share = bounds.width() / children.len().max(1) as f64;
        for (i, child) in children.into_iter().enumerate() {
            let x = bounds.x0 + share * i as f64;
            cx.arrange_child(child, Rect::new(x, bounds.y0, x + share, bounds.y1));
        }
    }
}

#[test]
fn custom_layouts_place_children() {
    let (mut p, id, _) = setup();
    let view = p.view_mut(id).unwrap();
    view.set_viewport(Size::new(300.0, 40.0));
    let row = view.add_root("Row", EvenRow::default());
    let cells: Vec<_> = (0..3)
        .map(|_| view.add_child(row, "Cell", Leaf::new(10.0, 20.0)).unwrap())
        .collect();

    p.update(Duration::ZERO);
    let view = p.view(id).unwrap();
    assert_eq!(view.desired_size(row).unwrap(), Size::new(300.0, 20.0));
    assert_eq!(view.bounds(row).unwrap(), Rect::new(0.0, 0.0, 300.0, 40.0));
    assert_eq!(view.bounds(cells[1]).unwrap(), Rect::new(100.0, 0.0, 200.0, 40.0));
    assert_eq!(view.bounds(cells[2]).unwrap(), Rect::new(200.0, 0.0, 300.0, 40.0));
}

#[test]
fn quiet_ticks_skip_layout() {
    let (mut p, id, fw) = setup();
    let measures = Rc::new(Cell::new(0));
    let view = p.view_mut(id).unwrap();
    view.set_viewport(Size::new(100.0, 100.0));
    let row = view.add_root(
        "Row",
        EvenRow {
            measures: measures.clone(),
        },
    );
    let cell = view.add_child(row, "Cell", Leaf::new(10.0, 10.0)).unwrap();

    p.update(Duration::ZERO);
    p.update(Duration::from_millis(16));
    p.update(Duration::from_millis(16));
    assert_eq!(measures.get(), 1);

    // A layout property on a child re-measures its ancestors.
    p.view_mut(id).unwrap().set_local(cell, fw.height, 30.0).unwrap();
    p.update(Duration::ZERO);
    assert_eq!(measures.get(), 2);
    assert_eq!(p.view(id).unwrap().desired_size(row).unwrap().height, 30.0);

    // A changed viewport is a different question.
    p.view_mut(id).unwrap().set_viewport(Size::new(50.0, 100.0));
    p.update(Duration::ZERO);
    assert_eq!(measures.get(), 3);
    // Stretched across, centered vertically at its explicit height.
    assert_eq!(
        p.view(id).unwrap().bounds(cell).unwrap(),
        Rect::new(0.0, 35.0, 50.0, 65.0)
    );
}

#[test]
fn styled_sizing_properties_reach_layout() {
    let (mut p, id, _) = setup();
    let view = p.view_mut(id).unwrap();
    let sheet = StyleSheetBuilder::new()
        .rule(
            RuleBuilder::new("Button")
                .set("Margin", "4")
                .set("HorizontalAlignment", "Left"),
        )
        .build(view.registry())
        .unwrap();
    view.set_style_sheet(sheet);
    view.set_viewport(Size::new(200.0, 100.0));
    let root = view.add_root("StackPanel", StackPanel::vertical());
    let button = view.add_child(root, "Button", Leaf::new(40.0, 10.0)).unwrap();
    let label = view.add_child(root, "Label", Leaf::new(40.0, 10.0)).unwrap();

    p.update(Duration::ZERO);
    let view = p.view(id).unwrap();
    assert_eq!(view.desired_size(button).unwrap(), Size::new(48.0, 18.0));
    assert_eq!(view.bounds(button).unwrap(), Rect::new(4.0, 4.0, 44.0, 14.0));
    assert_eq!(view.bounds(label).unwrap(), Rect::new(0.0, 18.0, 200.0, 28.0));
    assert_eq!(view.bounds(root).unwrap(), Rect::new(0.0, 0.0, 200.0, 100.0));
}

#[test]
fn roots_larger_than_the_viewport_are_clipped() {
    let (mut p, id, _) = setup();
    let view = p.view_mut(id).unwrap();
    view.set_viewport(Size::new(200.0, 100.0));
    let wide = view.add_root("Leaf", Leaf::new(300.0, 50.0));

    p.update(Duration::ZERO);
    let view = p.view(id).unwrap();
    assert_eq!(view.bounds(wide).unwrap(), Rect::new(0.0, 0.0, 200.0, 100.0));
    assert_eq!(
        view.clip_rect(wide).unwrap(),
        Some(Rect::new(0.0, 0.0, 200.0, 100.0))
    );
}

#[test]
fn clones_follow_animated_originals() {
    let (mut p, id, fw) = setup();
    let view = p.view_mut(id).unwrap();
    let original = view.add_root("Leaf", Leaf::new(100.0, 50.0));
    let clone = view.add_visual_clone(None, original).unwrap();
    view.set_local(original, fw.width, 100.0).unwrap();
    assert_eq!(p.view(id).unwrap().clone_source(clone), Some(original));

    let report = p.update(Duration::ZERO);
    assert_eq!(report.layout_passes, 2);
    assert_eq!(
        p.view(id).unwrap().desired_size(clone).unwrap(),
        Size::new(100.0, 50.0)
    );
    assert_eq!(p.update(Duration::ZERO).layout_passes, 1);

    p.animate(id, original, fw.width, 200.0, Easing::Linear, Duration::from_millis(100))
        .unwrap();
    p.update(Duration::from_millis(50));
    assert_eq!(
        p.view(id).unwrap().desired_size(clone).unwrap(),
        Size::new(150.0, 50.0)
    );

    p.view_mut(id)
        .unwrap()
        .set_local(original, fw.render_transform, Affine::scale(2.0))
        .unwrap();
    p.update(Duration::from_millis(50));
    assert_eq!(
        p.view(id).unwrap().desired_size(clone).unwrap(),
        Size::new(400.0, 100.0)
    );

    // Removing the original leaves the clone empty.
    p.view_mut(id).unwrap().remove(original).unwrap();
    p.update(Duration::ZERO);
    let view = p.view(id).unwrap();
    assert_eq!(view.clone_source(clone), None);
    assert_eq!(view.desired_size(clone).unwrap(), Size::ZERO);
}

#[test]
fn arrange_rejects_bad_slots() {
    let (mut p, id, _) = setup();
    let view = p.view_mut(id).unwrap();
    let node = view.add_root("Leaf", Leaf::new(10.0, 10.0));
    let bad = Rect::new(0.0, 0.0, -5.0, 10.0);
    assert_eq!(
        view.arrange(node, bad),
        Err(LayoutError::InvalidArrangeRect(bad))
    );
    view.remove(node).unwrap();
    assert!(matches!(
        view.arrange(node, Rect::new(0.0, 0.0, 10.0, 10.0)),
        Err(LayoutError::Tree(_))
    ));
}
