// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end cascade behavior through `Presentation::update`.

use core::time::Duration;
use std::rc::Rc;

use peniko::Color;
use trellis_property::{PropertyRegistry, ValueTier};
use trellis_style::{
    ComparisonOp, RuleBuilder, StyleSheet, StyleSheetBuilder, ThemeBuilder, TriggerBuilder,
};
use trellis_ui::{
    DiagnosticKind, FrameworkProperties, Leaf, NodeId, Panel, Presentation, PresentationConfig,
    StackPanel, StyleState, ViewId,
};

const RED: Color = Color::from_rgb8(255, 0, 0);
const GREEN: Color = Color::from_rgb8(0, 128, 0);
const BLUE: Color = Color::from_rgb8(0, 0, 255);

fn setup() -> (Presentation, ViewId, FrameworkProperties) {
    let mut registry = PropertyRegistry::new();
    let fw = FrameworkProperties::register(&mut registry);
    let mut presentation =
        Presentation::new(Rc::new(registry), fw, PresentationConfig::default());
    let view = presentation.add_view();
    (presentation, view, fw)
}

fn sheet(presentation: &Presentation, rules: impl IntoIterator<Item = RuleBuilder>) -> StyleSheet {
    let mut builder = StyleSheetBuilder::new();
    for rule in rules {
        builder = builder.rule(rule);
    }
    let view = presentation.views().next().map(|(_, v)| v).unwrap();
    builder.build(view.registry()).unwrap()
}

fn assert_foreground(presentation: &Presentation, view: ViewId, node: NodeId, expected: Color) {
    let view = presentation.view(view).unwrap();
    let actual = view.get(node, view.framework().foreground).unwrap();
    let close = actual
        .components
        .iter()
        .zip(expected.components)
        .all(|(a, b)| (a - b).abs() < 1e-3);
    assert!(close, "{node}: expected {expected:?}, got {actual:?}");
}

#[test]
fn specificity_beats_declaration_order() {
    let (mut p, id, _) = setup();
    let sheet = sheet(
        &p,
        [
            RuleBuilder::new("Button.highlight").set("Foreground", "blue"),
            RuleBuilder::new(".highlight").set("Foreground", "red"),
        ],
    );
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    let button = view.add_root("Button", Leaf::new(10.0, 10.0));
    view.add_class(button, "highlight").unwrap();
    let label = view.add_root("Label", Leaf::new(10.0, 10.0));
    view.add_class(label, "highlight").unwrap();

    p.update(Duration::ZERO);
    assert_foreground(&p, id, button, BLUE);
    assert_foreground(&p, id, label, RED);
}

#[test]
fn later_rule_wins_a_specificity_tie() {
    let (mut p, id, _) = setup();
    let sheet = sheet(
        &p,
        [
            RuleBuilder::new("Button").set("Foreground", "red"),
            RuleBuilder::new("Button").set("Foreground", "green"),
        ],
    );
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    let button = view.add_root("Button", Leaf::new(10.0, 10.0));
    p.update(Duration::ZERO);
    assert_foreground(&p, id, button, GREEN);
}

#[test]
fn child_combinator_with_class_and_pseudo_class() {
    let (mut p, id, fw) = setup();
    let sheet = sheet(
        &p,
        [RuleBuilder::new("Panel > Button.primary:focused").set("Width", "99")],
    );
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    let panel = view.add_root("Panel", Panel);
    let direct = view.add_child(panel, "Button", Leaf::new(1.0, 1.0)).unwrap();
    let stack = view.add_child(panel, "StackPanel", StackPanel::vertical()).unwrap();
    let nested = view.add_child(stack, "Button", Leaf::new(1.0, 1.0)).unwrap();
    for button in [direct, nested] {
        view.add_class(button, "primary").unwrap();
        view.set_pseudo_class(button, "focused", true).unwrap();
    }
    let unfocused = view.add_child(panel, "Button", Leaf::new(1.0, 1.0)).unwrap();
    view.add_class(unfocused, "primary").unwrap();
    let plain = view.add_child(panel, "Button", Leaf::new(1.0, 1.0)).unwrap();
    view.set_pseudo_class(plain, "focused", true).unwrap();

    p.update(Duration::ZERO);
    let view = p.view(id).unwrap();
    assert_eq!(view.get(direct, fw.width).unwrap(), 99.0);
    for miss in [nested, unfocused, plain] {
        assert!(view.get(miss, fw.width).unwrap().is_nan(), "{miss} should not match");
    }

    // Losing focus unstyles it on the next tick.
    p.view_mut(id)
        .unwrap()
        .set_pseudo_class(direct, "focused", false)
        .unwrap();
    p.update(Duration::ZERO);
    assert!(p.view(id).unwrap().get(direct, fw.width).unwrap().is_nan());
}

#[test]
fn cascade_is_deterministic() {
    let build = || {
        let (mut p, id, fw) = setup();
        let sheet = sheet(
            &p,
            [
                RuleBuilder::new("Panel").set("Opacity", "0.9"),
                RuleBuilder::new("Panel Button").set("Width", "40"),
                RuleBuilder::new(".wide").set("Width", "400"),
                RuleBuilder::new("#ok").set("Opacity", "0.3"),
                RuleBuilder::new("Button:hover").set("Foreground", "green"),
            ],
        );
        let view = p.view_mut(id).unwrap();
        view.set_style_sheet(sheet);
        let root = view.add_root("Panel", StackPanel::vertical());
        let mut nodes = vec![root];
        for i in 0..6 {
            let button = view.add_child(root, "Button", Leaf::new(10.0, 10.0)).unwrap();
            if i % 2 == 0 {
                view.add_class(button, "wide").unwrap();
            }
            if i == 3 {
                view.set_name(button, Some("ok")).unwrap();
                view.set_pseudo_class(button, "hover", true).unwrap();
            }
            nodes.push(button);
        }
        p.update(Duration::ZERO);
        let view = p.view(id).unwrap();
        nodes
            .iter()
            .map(|&n| {
                (
                    view.get(n, fw.width).unwrap().to_bits(),
                    view.get(n, fw.opacity).unwrap().to_bits(),
                    view.get(n, fw.foreground).unwrap().components,
                )
            })
            .collect::<Vec<_>>()
    };
    let first = build();
    assert_eq!(first, build());
    assert_eq!(f64::from_bits(first[1].0), 400.0);
    assert_eq!(f64::from_bits(first[2].0), 40.0);
    assert_eq!(f64::from_bits(first[4].1), 0.3);
}

#[test]
fn restyling_without_changes_is_a_no_op() {
    let (mut p, id, fw) = setup();
    let sheet = sheet(
        &p,
        [RuleBuilder::new("Button").set("Width", "50").trigger(
            TriggerBuilder::property("Width", ComparisonOp::Equal, "50").set("Opacity", "0.5"),
        )],
    );
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    let button = view.add_root("Button", Leaf::new(10.0, 10.0));
    let first = p.update(Duration::ZERO);
    assert_eq!(first.styled, 1);
    assert_eq!(
        p.view(id).unwrap().style_state(button).unwrap(),
        StyleState::Clean
    );

    let second = p.update(Duration::ZERO);
    assert_eq!(second.styled, 0);

    let view = p.view_mut(id).unwrap();
    view.mark_style_dirty(button);
    view.apply_styles(button).unwrap();
    view.apply_styles(button).unwrap();
    assert_eq!(view.get(button, fw.opacity).unwrap(), 0.5);
    assert_eq!(
        view.get_tier(button, ValueTier::Triggered, fw.opacity).unwrap(),
        Some(0.5)
    );
}

#[test]
fn inherited_values_reach_descendants() {
    let (mut p, id, _) = setup();
    let sheet = sheet(&p, [RuleBuilder::new("Panel").set("Foreground", "red")]);
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    let panel = view.add_root("Panel", Panel);
    let label = view.add_child(panel, "Label", Leaf::new(1.0, 1.0)).unwrap();
    let other = view.add_root("Label", Leaf::new(1.0, 1.0));
    p.update(Duration::ZERO);
    assert_foreground(&p, id, label, RED);
    assert_foreground(&p, id, other, Color::BLACK);

    // Reparenting out of the panel drops the inherited value.
    p.view_mut(id).unwrap().move_to(label, None).unwrap();
    p.update(Duration::ZERO);
    assert_foreground(&p, id, label, Color::BLACK);
}

#[test]
fn missing_resources_are_reported_and_skipped() {
    let (mut p, id, fw) = setup();
    let sheet = sheet(
        &p,
        [
            RuleBuilder::new("Button")
                .set("Width", "20")
                .set_resource("Height", "ButtonHeight"),
        ],
    );
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(sheet);
    let button = view.add_root("Button", Leaf::new(1.0, 1.0));

    let report = p.update(Duration::ZERO);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].node, button);
    assert_eq!(
        report.diagnostics[0].kind,
        DiagnosticKind::MissingResource("ButtonHeight".into())
    );
    let view = p.view(id).unwrap();
    assert_eq!(view.get(button, fw.width).unwrap(), 20.0);
    assert!(view.get(button, fw.height).unwrap().is_nan());

    p.view_mut(id)
        .unwrap()
        .set_theme(ThemeBuilder::new().set("ButtonHeight", 32.0_f64).build());
    let report = p.update(Duration::ZERO);
    assert!(report.diagnostics.is_empty());
    assert_eq!(p.view(id).unwrap().get(button, fw.height).unwrap(), 32.0);
    assert_eq!(p.view(id).unwrap().desired_size(button).unwrap().height, 32.0);
}

#[test]
fn replacing_the_sheet_restyles_everything() {
    let (mut p, id, fw) = setup();
    let first = sheet(&p, [RuleBuilder::new("Button").set("Width", "10")]);
    let second = sheet(&p, [RuleBuilder::new("Button").set("Height", "10")]);
    let view = p.view_mut(id).unwrap();
    view.set_style_sheet(first);
    let button = view.add_root("Button", Leaf::new(1.0, 1.0));
    p.update(Duration::ZERO);

    p.view_mut(id).unwrap().set_style_sheet(second);
    let report = p.update(Duration::ZERO);
    assert_eq!(report.styled, 1);
    let view = p.view(id).unwrap();
    assert!(view.get(button, fw.width).unwrap().is_nan());
    assert_eq!(view.get(button, fw.height).unwrap(), 10.0);
}
