// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style pass for one element.

use hashbrown::HashSet;
use smallvec::SmallVec;
use trellis_property::{ErasedValue, PropertyId, ValueTier};
use trellis_style::{PropertyCondition, Rule, TriggerCondition, ValueExpr};

use crate::error::{Diagnostic, DiagnosticKind, TreeError};
use crate::tree::{NodeId, StyleState, TriggerKey};
use crate::view::{TriggerEffect, View};

/// Collects `(property, value)` pairs where a later write for the same
/// property replaces the earlier one but keeps its position.
fn last_wins<'a>(
    pairs: impl IntoIterator<Item = (PropertyId, &'a ValueExpr)>,
) -> SmallVec<[(PropertyId, &'a ValueExpr); 8]> {
    let mut out: SmallVec<[(PropertyId, &'a ValueExpr); 8]> = SmallVec::new();
    for (id, expr) in pairs {
        match out.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = expr,
            None => out.push((id, expr)),
        }
    }
    out
}

impl View {
    /// Styles `node` against the current sheet and theme.
    ///
    /// Matching rules are applied lowest precedence first, so for each
    /// property the setter of the most specific (and then latest) rule wins.
    /// Values that cannot be resolved keep their previous styled value and
    /// are reported as [`Diagnostic`]s. Then every trigger of the matched
    /// rules is evaluated; triggers that flip queue their actions, and the
    /// triggered tier is rebuilt from the `Set` actions of active property
    /// triggers.
    ///
    /// Running it twice with nothing changed in between produces the same
    /// values and no trigger flips.
    pub fn apply_styles(&mut self, node: NodeId) -> Result<Vec<Diagnostic>, TreeError> {
        self.tree.element(node)?;
        let sheet = self.sheet.clone();
        let rules = sheet.matching_rules(&self.tree, node);
        let mut diagnostics = Vec::new();

        let styled = last_wins(
            rules
                .iter()
                .flat_map(|rule| rule.setters())
                .map(|setter| (setter.property, &setter.value)),
        );
        self.write_resolved(node, ValueTier::Styled, &styled, &mut diagnostics);

        let active = self.evaluate_triggers(node, &rules)?;

        let triggered = last_wins(
            rules
                .iter()
                .flat_map(|rule| {
                    rule.triggers()
                        .iter()
                        .enumerate()
                        .map(move |(index, trigger)| (TriggerKey { rule: rule.order(), index }, trigger))
                })
                .filter(|(key, _)| active.contains(key))
                .flat_map(|(_, trigger)| trigger.setters()),
        );
        self.write_resolved(node, ValueTier::Triggered, &triggered, &mut diagnostics);

        let el = self.tree.element_mut(node)?;
        el.style = StyleState::Clean;
        el.has_property_triggers = rules
            .iter()
            .flat_map(|rule| rule.triggers())
            .any(|trigger| !trigger.is_event());
        Ok(diagnostics)
    }

    /// Replaces one tier with `values`, clearing properties it no longer
    /// sets. Unresolvable values keep whatever the tier held before.
    fn write_resolved(
        &mut self,
        node: NodeId,
        tier: ValueTier,
        values: &[(PropertyId, &ValueExpr)],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let Some(el) = self.tree.get(node) else {
            return;
        };
        let stale: SmallVec<[PropertyId; 8]> = el
            .store
            .tier_ids(tier)
            .filter(|id| !values.iter().any(|(set, _)| set == id))
            .collect();
        for id in stale {
            self.write_tier(node, tier, id, None);
        }
        for &(id, expr) in values {
            match self.resolve_expr(id, expr) {
                Ok(value) => {
                    self.write_tier(node, tier, id, Some(value));
                }
                Err(kind) => {
                    let diagnostic = Diagnostic {
                        node,
                        property: id,
                        kind,
                    };
                    tracing::warn!(%diagnostic, "style value not applied");
                    diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn resolve_expr(&self, id: PropertyId, expr: &ValueExpr) -> Result<ErasedValue, DiagnosticKind> {
        let (source, value) = match expr {
            ValueExpr::Literal(value) => return Ok(value.clone()),
            ValueExpr::Resource(name) => {
                let value = self
                    .theme
                    .get_erased(name)
                    .ok_or_else(|| DiagnosticKind::MissingResource(name.clone()))?;
                (name, value.clone())
            }
            ValueExpr::Asset(asset) => {
                let loader = self
                    .asset_loader
                    .as_ref()
                    .ok_or_else(|| DiagnosticKind::NoAssetLoader(asset.clone()))?;
                (asset, loader.load(id, asset)?)
            }
        };
        if !self.registry.accepts(id, &value) {
            return Err(DiagnosticKind::TypeMismatch {
                source_name: source.clone(),
                found: value.type_name(),
            });
        }
        Ok(self.registry.coerce(id, value))
    }

    fn condition_holds(&self, node: NodeId, condition: &PropertyCondition) -> bool {
        self.get_erased(node, condition.property)
            .is_ok_and(|current| condition.evaluate(&self.registry, &current))
    }

    /// Evaluates the triggers of `rules`, queues the actions of every flip
    /// and returns the property triggers now active.
    fn evaluate_triggers(
        &mut self,
        node: NodeId,
        rules: &[&Rule],
    ) -> Result<HashSet<TriggerKey>, TreeError> {
        let events = core::mem::take(&mut self.tree.element_mut(node)?.pending_events);
        let mut now_active: Vec<TriggerKey> = Vec::new();
        let mut fired: Vec<TriggerKey> = Vec::new();
        for rule in rules {
            for (index, trigger) in rule.triggers().iter().enumerate() {
                let key = TriggerKey {
                    rule: rule.order(),
                    index,
                };
                match trigger.condition() {
                    TriggerCondition::Property(conditions) => {
                        if conditions.iter().all(|c| self.condition_holds(node, c)) {
                            now_active.push(key);
                        }
                    }
                    TriggerCondition::Event(name) => {
                        if events.iter().any(|event| event == name) {
                            fired.push(key);
                        }
                    }
                }
            }
        }

        let el = self.tree.element_mut(node)?;
        let mut deactivated: Vec<TriggerKey> = el
            .active_triggers
            .iter()
            .filter(|key| !now_active.contains(key))
            .copied()
            .collect();
        deactivated.sort_unstable();
        let activated: Vec<TriggerKey> = now_active
            .iter()
            .filter(|key| !el.active_triggers.contains(*key))
            .copied()
            .collect();
        el.active_triggers = now_active.iter().copied().collect();

        // Triggers of rules that stopped matching are looked up in the sheet,
        // not in `rules`.
        for key in deactivated {
            tracing::debug!(%node, rule = key.rule, trigger = key.index, "trigger deactivated");
            self.queue_actions(node, key, false);
        }
        for key in activated.into_iter().chain(fired) {
            tracing::debug!(%node, rule = key.rule, trigger = key.index, "trigger activated");
            self.queue_actions(node, key, true);
        }
        Ok(now_active.into_iter().collect())
    }

    fn queue_actions(&mut self, node: NodeId, key: TriggerKey, activate: bool) {
        let Some(trigger) = self
            .sheet
            .rule(key.rule)
            .and_then(|rule| rule.triggers().get(key.index))
        else {
            return;
        };
        self.pending
            .extend(trigger.actions().iter().map(|action| TriggerEffect {
                action: action.clone(),
                element: node,
                activate,
            }));
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use peniko::Color;
    use trellis_property::PropertyRegistry;
    use trellis_style::{ComparisonOp, RuleBuilder, StyleSheetBuilder, ThemeBuilder, TriggerBuilder};

    use super::*;
    use crate::asset::AssetError;
    use crate::layout::{Leaf, Panel};
    use crate::properties::FrameworkProperties;

    fn view() -> (View, FrameworkProperties) {
        let mut registry = PropertyRegistry::new();
        let fw = FrameworkProperties::register(&mut registry);
        (View::new(Rc::new(registry), fw), fw)
    }

    #[test]
    fn setters_of_unmatched_rules_are_cleared() {
        let (mut view, fw) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(RuleBuilder::new(".wide").set("Width", "300"))
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        let node = view.add_root("Panel", Panel);
        view.add_class(node, "wide").unwrap();
        view.apply_styles(node).unwrap();
        assert_eq!(view.get(node, fw.width).unwrap(), 300.0);

        view.remove_class(node, "wide").unwrap();
        view.apply_styles(node).unwrap();
        assert!(view.get(node, fw.width).unwrap().is_nan());
        assert_eq!(view.get_tier(node, ValueTier::Styled, fw.width).unwrap(), None);
    }

    #[test]
    fn local_values_beat_styled_values() {
        let (mut view, fw) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(RuleBuilder::new("Panel").set("Opacity", "0.5"))
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        let node = view.add_root("Panel", Panel);
        view.set_local(node, fw.opacity, 0.25).unwrap();
        view.apply_styles(node).unwrap();
        assert_eq!(view.get(node, fw.opacity).unwrap(), 0.25);
        assert_eq!(
            view.get_tier(node, ValueTier::Styled, fw.opacity).unwrap(),
            Some(0.5)
        );
    }

    #[test]
    fn resources_resolve_through_the_theme() {
        let (mut view, fw) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(RuleBuilder::new("Label").set_resource("Foreground", "Accent"))
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        let accent = Color::from_rgb8(0, 120, 215);
        view.set_theme(ThemeBuilder::new().set("Accent", accent).build());
        let node = view.add_root("Label", Leaf::new(1.0, 1.0));
        assert!(view.apply_styles(node).unwrap().is_empty());
        assert_eq!(view.get(node, fw.foreground).unwrap().components, accent.components);
    }

    #[test]
    fn unresolvable_values_keep_the_previous_value() {
        let (mut view, fw) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(RuleBuilder::new("Label").set_resource("Opacity", "Dim"))
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        view.set_theme(ThemeBuilder::new().set("Dim", 0.4_f64).build());
        let node = view.add_root("Label", Leaf::new(1.0, 1.0));
        view.apply_styles(node).unwrap();
        assert_eq!(view.get(node, fw.opacity).unwrap(), 0.4);

        // Wrong type: the old value stays.
        view.set_theme(ThemeBuilder::new().set("Dim", "very").build());
        let diagnostics = view.apply_styles(node).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::TypeMismatch { .. }
        ));
        assert_eq!(view.get(node, fw.opacity).unwrap(), 0.4);

        // Missing entirely.
        view.set_theme(ThemeBuilder::new().build());
        let diagnostics = view.apply_styles(node).unwrap();
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::MissingResource("Dim".into())
        );
        assert_eq!(diagnostics[0].property, fw.opacity.id());
        assert_eq!(view.get(node, fw.opacity).unwrap(), 0.4);
    }

    #[test]
    fn assets_go_through_the_loader() {
        let (mut view, fw) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(RuleBuilder::new("Image").set_asset("Width", "logo"))
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        let node = view.add_root("Image", Leaf::new(1.0, 1.0));

        let diagnostics = view.apply_styles(node).unwrap();
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::NoAssetLoader("logo".into())
        );

        view.set_asset_loader(|_: PropertyId, asset: &str| match asset {
            "logo" => Ok(ErasedValue::new(64.0_f64)),
            other => Err(AssetError::NotFound(other.into())),
        });
        assert!(view.apply_styles(node).unwrap().is_empty());
        assert_eq!(view.get(node, fw.width).unwrap(), 64.0);
    }

    #[test]
    fn property_triggers_set_and_unset() {
        let (mut view, fw) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(
                RuleBuilder::new("Button").trigger(
                    TriggerBuilder::property("Width", ComparisonOp::Greater, "100")
                        .set("Opacity", "0.5"),
                ),
            )
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        let node = view.add_root("Button", Leaf::new(1.0, 1.0));
        view.apply_styles(node).unwrap();
        assert_eq!(view.get(node, fw.opacity).unwrap(), 1.0);
        assert!(view.take_pending().is_empty());

        view.set_local(node, fw.width, 150.0).unwrap();
        view.apply_styles(node).unwrap();
        assert_eq!(view.get(node, fw.opacity).unwrap(), 0.5);
        let effects = view.take_pending();
        assert_eq!(effects.len(), 1);
        assert!(effects[0].activate);

        // No change, no flip.
        view.apply_styles(node).unwrap();
        assert!(view.take_pending().is_empty());

        view.set_local(node, fw.width, 50.0).unwrap();
        view.apply_styles(node).unwrap();
        assert_eq!(view.get(node, fw.opacity).unwrap(), 1.0);
        let effects = view.take_pending();
        assert_eq!(effects.len(), 1);
        assert!(!effects[0].activate);
    }

    #[test]
    fn event_triggers_fire_once() {
        let (mut view, _) = view();
        let sheet = StyleSheetBuilder::new()
            .rule(
                RuleBuilder::new("Button")
                    .trigger(TriggerBuilder::event("Click").play_storyboard("Flash")),
            )
            .build(view.registry())
            .unwrap();
        view.set_style_sheet(sheet);
        let node = view.add_root("Button", Leaf::new(1.0, 1.0));
        view.apply_styles(node).unwrap();
        assert!(view.take_pending().is_empty());

        view.raise_event(node, "Hover").unwrap();
        view.apply_styles(node).unwrap();
        assert!(view.take_pending().is_empty());

        view.raise_event(node, "Click").unwrap();
        assert!(view.style_state(node).unwrap().needs_style());
        view.apply_styles(node).unwrap();
        let effects = view.take_pending();
        assert_eq!(effects.len(), 1);
        assert!(effects[0].activate);

        view.apply_styles(node).unwrap();
        assert!(view.take_pending().is_empty());
    }

    #[test]
    fn last_wins_keeps_first_position() {
        let a = ValueExpr::Resource("a".into());
        let b = ValueExpr::Resource("b".into());
        let c = ValueExpr::Resource("c".into());
        let p = PropertyId::new(0);
        let q = PropertyId::new(1);
        let out = last_wins([(p, &a), (q, &b), (p, &c)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, p);
        assert!(matches!(out[0].1, ValueExpr::Resource(name) if &**name == "c"));
    }
}
