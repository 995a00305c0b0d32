// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style sheets and the compiler that builds them.
//!
//! A [`StyleSheet`] is an immutable, ordered collection of [`Rule`]s plus
//! named [`Storyboard`]s. It is produced by [`StyleSheetBuilder::build`],
//! which parses selectors and literals against a [`PropertyRegistry`].
//!
//! Rules are bucketed by their rightmost selector part so that matching a
//! node only visits rules that could possibly apply to it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use trellis_animation::{Easing, Keyframe, KeyframeTrack, LoopBehavior};
use trellis_property::{PropertyId, PropertyRegistry};

use crate::error::CompileError;
use crate::rule::{
    ComparisonOp, PropertyCondition, Rule, Setter, Trigger, TriggerAction, TriggerCondition,
    ValueExpr,
};
use crate::selector::{Selector, SelectorInputs, SelectorPart, SelectorTree};
use crate::storyboard::{Storyboard, StoryboardTarget};

#[derive(Debug, Default)]
struct RuleIndex {
    by_name: HashMap<Box<str>, Vec<usize>>,
    by_class: HashMap<Box<str>, Vec<usize>>,
    by_type: HashMap<Box<str>, Vec<usize>>,
    universal: Vec<usize>,
}

impl RuleIndex {
    fn insert(&mut self, subject: &SelectorPart, index: usize) {
        if let Some(name) = subject.name() {
            self.by_name.entry(name.into()).or_default().push(index);
        } else if let Some(class) = subject.classes().first() {
            self.by_class.entry(class.clone()).or_default().push(index);
        } else if let Some(type_name) = subject.type_name() {
            self.by_type
                .entry(type_key(type_name).into_boxed_str())
                .or_default()
                .push(index);
        } else {
            self.universal.push(index);
        }
    }

    /// Returns the indices of rules that may match, ascending.
    fn candidates(&self, inputs: &SelectorInputs<'_>) -> SmallVec<[usize; 16]> {
        let mut out: SmallVec<[usize; 16]> = SmallVec::new();
        out.extend_from_slice(&self.universal);
        if let Some(name) = inputs.name
            && let Some(rules) = self.by_name.get(name)
        {
            out.extend_from_slice(rules);
        }
        for class in inputs.classes {
            if let Some(rules) = self.by_class.get(class) {
                out.extend_from_slice(rules);
            }
        }
        if let Some(rules) = self.by_type.get(type_key(inputs.type_name).as_str()) {
            out.extend_from_slice(rules);
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[derive(Debug, Default)]
struct StyleSheetData {
    rules: Vec<Rule>,
    storyboards: Vec<Rc<Storyboard>>,
    index: RuleIndex,
}

/// A compiled, immutable style sheet.
///
/// Cloning is cheap: clones share one allocation.
///
/// # Example
///
/// ```rust
/// use trellis_property::{PropertyMetadataBuilder, PropertyRegistry};
/// use trellis_style::{RuleBuilder, StyleSheetBuilder};
///
/// let mut registry = PropertyRegistry::new();
/// let width = registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
///
/// let sheet = StyleSheetBuilder::new()
///     .rule(RuleBuilder::new("Button").set("Width", "80"))
///     .rule(RuleBuilder::new("Button.wide").set("Width", "200"))
///     .build(&registry)
///     .unwrap();
///
/// assert_eq!(sheet.len(), 2);
/// let literal = sheet.rules()[1].setters()[0].value.as_literal().unwrap();
/// assert_eq!(literal.downcast_ref::<f64>(), Some(&200.0));
/// assert_eq!(sheet.rules()[1].setters()[0].property, width.id());
///
/// assert!(StyleSheetBuilder::new()
///     .rule(RuleBuilder::new("Button").set("Width", "wide"))
///     .build(&registry)
///     .is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
    inner: Rc<StyleSheetData>,
}

impl StyleSheet {
    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.rules.len()
    }

    /// Returns `true` if the sheet has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.rules.is_empty()
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.inner.rules
    }

    /// Returns the rule at `order`.
    #[must_use]
    pub fn rule(&self, order: usize) -> Option<&Rule> {
        self.inner.rules.get(order)
    }

    /// Returns the storyboards in declaration order.
    #[must_use]
    pub fn storyboards(&self) -> &[Rc<Storyboard>] {
        &self.inner.storyboards
    }

    /// Looks up a storyboard by name.
    #[must_use]
    pub fn storyboard(&self, name: &str) -> Option<&Rc<Storyboard>> {
        self.inner.storyboards.iter().find(|s| s.name() == name)
    }

    /// Returns `true` if both handles share the same compiled sheet.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the rules whose selector matches `node`, lowest precedence
    /// first.
    ///
    /// Precedence is specificity, then declaration order. Rules anchored with
    /// `:trigger-root` never match here; they only make sense as trigger or
    /// storyboard targets.
    pub fn matching_rules<T: SelectorTree + ?Sized>(&self, tree: &T, node: T::Node) -> Vec<&Rule> {
        let Some(inputs) = tree.inputs(node) else {
            return Vec::new();
        };
        let mut matched: Vec<&Rule> = self
            .inner
            .index
            .candidates(&inputs)
            .into_iter()
            .filter_map(|i| self.inner.rules.get(i))
            .filter(|rule| rule.selector().matches(tree, node))
            .collect();
        matched.sort_by_key(|rule| rule.precedence());
        matched
    }
}

/// A value as written in a declaration, before compilation.
#[derive(Clone, Debug)]
enum ValueSource {
    Literal(Box<str>),
    Resource(Box<str>),
    Asset(Box<str>),
}

impl ValueSource {
    fn compile(
        &self,
        registry: &PropertyRegistry,
        rule: usize,
        property: &str,
    ) -> Result<(PropertyId, ValueExpr), CompileError> {
        let id = registry
            .by_name(property)
            .ok_or_else(|| CompileError::UnknownProperty {
                rule,
                property: property.into(),
            })?;
        if !registry.is_styleable(id) {
            return Err(CompileError::NotStyleable {
                rule,
                property: property.into(),
            });
        }
        let expr = match self {
            Self::Literal(text) => ValueExpr::Literal(registry.parse_value(id, text).ok_or_else(
                || CompileError::InvalidValue {
                    rule,
                    property: property.into(),
                    value: text.clone(),
                },
            )?),
            Self::Resource(name) => ValueExpr::Resource(name.clone()),
            Self::Asset(asset) => ValueExpr::Asset(asset.clone()),
        };
        Ok((id, expr))
    }
}

/// Declares one rule: a selector, setters and triggers.
#[derive(Clone, Debug)]
pub struct RuleBuilder {
    selector: Box<str>,
    setters: Vec<(Box<str>, ValueSource)>,
    triggers: Vec<TriggerBuilder>,
}

impl RuleBuilder {
    /// Starts a rule for the given selector text.
    #[must_use]
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.into(),
            setters: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Sets a property to a literal.
    #[must_use]
    pub fn set(mut self, property: &str, literal: &str) -> Self {
        self.setters
            .push((property.into(), ValueSource::Literal(literal.into())));
        self
    }

    /// Sets a property to a theme resource.
    #[must_use]
    pub fn set_resource(mut self, property: &str, resource: &str) -> Self {
        self.setters
            .push((property.into(), ValueSource::Resource(resource.into())));
        self
    }

    /// Sets a property to a loaded asset.
    #[must_use]
    pub fn set_asset(mut self, property: &str, asset: &str) -> Self {
        self.setters
            .push((property.into(), ValueSource::Asset(asset.into())));
        self
    }

    /// Adds a trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: TriggerBuilder) -> Self {
        self.triggers.push(trigger);
        self
    }

    fn compile(&self, registry: &PropertyRegistry, order: usize) -> Result<Rule, CompileError> {
        let selector = Selector::parse(&self.selector)
            .map_err(|source| CompileError::Selector { rule: order, source })?;
        let setters = self
            .setters
            .iter()
            .map(|(property, source)| {
                let (property, value) = source.compile(registry, order, property)?;
                Ok(Setter { property, value })
            })
            .collect::<Result<Box<[_]>, CompileError>>()?;
        let triggers = self
            .triggers
            .iter()
            .map(|trigger| trigger.compile(registry, order))
            .collect::<Result<Box<[_]>, CompileError>>()?;
        Ok(Rule::new(selector, setters, triggers, order))
    }
}

#[derive(Clone, Debug)]
enum ConditionSource {
    Property(Vec<(Box<str>, ComparisonOp, Box<str>)>),
    Event(Box<str>),
}

#[derive(Clone, Debug)]
enum ActionSource {
    Play {
        storyboard: Box<str>,
        selector: Option<Box<str>>,
    },
    Set {
        property: Box<str>,
        value: ValueSource,
    },
}

/// Declares a trigger and its ordered actions.
///
/// # Example
///
/// ```rust
/// use trellis_style::{ComparisonOp, RuleBuilder, TriggerBuilder};
///
/// let rule = RuleBuilder::new("Button").trigger(
///     TriggerBuilder::property("IsPressed", ComparisonOp::Equal, "true")
///         .set("Opacity", "0.5")
///         .play_storyboard("Pulse"),
/// );
/// # let _ = rule;
/// ```
#[derive(Clone, Debug)]
pub struct TriggerBuilder {
    condition: ConditionSource,
    actions: Vec<ActionSource>,
}

impl TriggerBuilder {
    /// Starts a property trigger with one condition.
    #[must_use]
    pub fn property(property: &str, op: ComparisonOp, value: &str) -> Self {
        Self {
            condition: ConditionSource::Property(alloc::vec![(
                property.into(),
                op,
                value.into()
            )]),
            actions: Vec::new(),
        }
    }

    /// Starts an event trigger.
    #[must_use]
    pub fn event(name: &str) -> Self {
        Self {
            condition: ConditionSource::Event(name.into()),
            actions: Vec::new(),
        }
    }

    /// Adds a condition; all conditions must hold.
    ///
    /// Ignored on event triggers.
    #[must_use]
    pub fn and(mut self, property: &str, op: ComparisonOp, value: &str) -> Self {
        if let ConditionSource::Property(conditions) = &mut self.condition {
            conditions.push((property.into(), op, value.into()));
        }
        self
    }

    /// Adds a `Set` action with a literal value.
    #[must_use]
    pub fn set(mut self, property: &str, literal: &str) -> Self {
        self.actions.push(ActionSource::Set {
            property: property.into(),
            value: ValueSource::Literal(literal.into()),
        });
        self
    }

    /// Adds a `Set` action with a theme resource.
    #[must_use]
    pub fn set_resource(mut self, property: &str, resource: &str) -> Self {
        self.actions.push(ActionSource::Set {
            property: property.into(),
            value: ValueSource::Resource(resource.into()),
        });
        self
    }

    /// Adds an action that plays a storyboard on the trigger's element.
    #[must_use]
    pub fn play_storyboard(mut self, storyboard: &str) -> Self {
        self.actions.push(ActionSource::Play {
            storyboard: storyboard.into(),
            selector: None,
        });
        self
    }

    /// Adds an action that plays a storyboard on every element `selector`
    /// finds.
    #[must_use]
    pub fn play_storyboard_on(mut self, storyboard: &str, selector: &str) -> Self {
        self.actions.push(ActionSource::Play {
            storyboard: storyboard.into(),
            selector: Some(selector.into()),
        });
        self
    }

    fn compile(&self, registry: &PropertyRegistry, rule: usize) -> Result<Trigger, CompileError> {
        let condition = match &self.condition {
            ConditionSource::Event(name) => TriggerCondition::Event(name.clone()),
            ConditionSource::Property(conditions) => TriggerCondition::Property(
                conditions
                    .iter()
                    .map(|(property, op, text)| {
                        let id = registry
                            .by_name(property)
                            .filter(|id| registry.is_styleable(*id))
                            .ok_or_else(|| CompileError::UnknownTriggerProperty {
                                rule,
                                property: property.clone(),
                            })?;
                        let value = registry.parse_value(id, text).ok_or_else(|| {
                            CompileError::InvalidValue {
                                rule,
                                property: property.clone(),
                                value: text.clone(),
                            }
                        })?;
                        Ok(PropertyCondition {
                            property: id,
                            op: *op,
                            value,
                        })
                    })
                    .collect::<Result<Box<[_]>, CompileError>>()?,
            ),
        };
        let actions = self
            .actions
            .iter()
            .map(|action| match action {
                ActionSource::Play {
                    storyboard,
                    selector,
                } => {
                    let selector = selector
                        .as_deref()
                        .map(Selector::parse)
                        .transpose()
                        .map_err(|source| CompileError::Selector { rule, source })?;
                    Ok(TriggerAction::PlayStoryboard {
                        storyboard: storyboard.clone(),
                        selector,
                    })
                }
                ActionSource::Set { property, value } => {
                    let (property, value) = value.compile(registry, rule, property)?;
                    Ok(TriggerAction::Set { property, value })
                }
            })
            .collect::<Result<Box<[_]>, CompileError>>()?;
        Ok(Trigger::new(condition, actions))
    }
}

/// Declares the tracks a storyboard applies to one set of elements.
#[derive(Clone, Debug, Default)]
pub struct TargetBuilder {
    selector: Option<Box<str>>,
    keyframes: Vec<(Box<str>, Duration, Box<str>, Easing)>,
}

impl TargetBuilder {
    /// Targets the element the storyboard plays on.
    #[must_use]
    pub fn element() -> Self {
        Self::default()
    }

    /// Targets the elements `selector` finds, rooted at the element the
    /// storyboard plays on.
    #[must_use]
    pub fn select(selector: &str) -> Self {
        Self {
            selector: Some(selector.into()),
            keyframes: Vec::new(),
        }
    }

    /// Adds a keyframe to the track for `property`.
    ///
    /// Keyframes of one property must be added in time order.
    #[must_use]
    pub fn keyframe(mut self, property: &str, time: Duration, value: &str, easing: Easing) -> Self {
        self.keyframes
            .push((property.into(), time, value.into(), easing));
        self
    }

    fn compile(
        &self,
        registry: &PropertyRegistry,
        index: usize,
        storyboard: &str,
    ) -> Result<StoryboardTarget, CompileError> {
        let selector = self
            .selector
            .as_deref()
            .map(Selector::parse)
            .transpose()
            .map_err(|source| CompileError::Selector {
                rule: index,
                source,
            })?;

        // Group keyframes per property, keeping first-mention order.
        let mut grouped: Vec<(PropertyId, &str, Vec<Keyframe>)> = Vec::new();
        for (property, time, text, easing) in &self.keyframes {
            let id = registry
                .by_name(property)
                .ok_or_else(|| CompileError::UnknownProperty {
                    rule: index,
                    property: property.clone(),
                })?;
            if !registry.is_animatable(id) {
                return Err(CompileError::NotAnimatable {
                    storyboard: storyboard.into(),
                    property: property.clone(),
                });
            }
            let value = registry
                .parse_value(id, text)
                .ok_or_else(|| CompileError::InvalidValue {
                    rule: index,
                    property: property.clone(),
                    value: text.clone(),
                })?;
            let keyframe = Keyframe::new(*time, value, *easing);
            match grouped.iter_mut().find(|(p, ..)| *p == id) {
                Some((.., frames)) => frames.push(keyframe),
                None => grouped.push((id, &**property, alloc::vec![keyframe])),
            }
        }

        let tracks = grouped
            .into_iter()
            .map(|(id, property, frames)| {
                KeyframeTrack::new(id, frames).map_err(|_| CompileError::UnsortedKeyframes {
                    storyboard: storyboard.into(),
                    property: property.into(),
                })
            })
            .collect::<Result<Box<[_]>, CompileError>>()?;
        Ok(StoryboardTarget::new(selector, tracks))
    }
}

/// Declares a named storyboard.
#[derive(Clone, Debug)]
pub struct StoryboardBuilder {
    name: Box<str>,
    loop_behavior: LoopBehavior,
    targets: Vec<TargetBuilder>,
}

impl StoryboardBuilder {
    /// Starts a storyboard that plays once.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            loop_behavior: LoopBehavior::None,
            targets: Vec::new(),
        }
    }

    /// Sets the loop behavior.
    #[must_use]
    pub fn loop_behavior(mut self, loop_behavior: LoopBehavior) -> Self {
        self.loop_behavior = loop_behavior;
        self
    }

    /// Adds a target.
    #[must_use]
    pub fn target(mut self, target: TargetBuilder) -> Self {
        self.targets.push(target);
        self
    }

    fn compile(
        &self,
        registry: &PropertyRegistry,
        index: usize,
    ) -> Result<Storyboard, CompileError> {
        let targets = self
            .targets
            .iter()
            .map(|target| target.compile(registry, index, &self.name))
            .collect::<Result<Box<[_]>, CompileError>>()?;
        Ok(Storyboard::new(self.name.clone(), self.loop_behavior, targets))
    }
}

/// Collects rule and storyboard declarations and compiles them.
#[derive(Clone, Debug, Default)]
pub struct StyleSheetBuilder {
    rules: Vec<RuleBuilder>,
    storyboards: Vec<StoryboardBuilder>,
}

impl StyleSheetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Declaration order breaks specificity ties.
    #[must_use]
    pub fn rule(mut self, rule: RuleBuilder) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a storyboard.
    #[must_use]
    pub fn storyboard(mut self, storyboard: StoryboardBuilder) -> Self {
        self.storyboards.push(storyboard);
        self
    }

    /// Compiles the declarations against `registry`.
    ///
    /// Fails on the first selector that does not parse, property that is
    /// unknown or not styleable, literal that does not parse, duplicate
    /// storyboard name, or out-of-order keyframes.
    pub fn build(self, registry: &PropertyRegistry) -> Result<StyleSheet, CompileError> {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(order, rule)| rule.compile(registry, order))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut storyboards = Vec::with_capacity(self.storyboards.len());
        for (index, storyboard) in self.storyboards.iter().enumerate() {
            if !seen.insert(&*storyboard.name) {
                return Err(CompileError::DuplicateStoryboard(storyboard.name.clone()));
            }
            storyboards.push(Rc::new(storyboard.compile(registry, index)?));
        }

        let mut index = RuleIndex::default();
        for rule in &rules {
            index.insert(rule.selector().subject(), rule.order());
        }

        tracing::debug!(
            rules = rules.len(),
            storyboards = storyboards.len(),
            "compiled style sheet"
        );
        Ok(StyleSheet {
            inner: Rc::new(StyleSheetData {
                rules,
                storyboards,
                index,
            }),
        })
    }
}

/// Lowercases a type name for case-insensitive lookups.
fn type_key(type_name: &str) -> String {
    type_name.to_ascii_lowercase()
}
