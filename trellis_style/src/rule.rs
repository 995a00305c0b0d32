// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compiled rules, setters and triggers.

use alloc::boxed::Box;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use trellis_property::{ErasedValue, PropertyId, PropertyRegistry};

use crate::selector::{Selector, Specificity};

/// Where a setter's value comes from.
#[derive(Clone, Debug)]
pub enum ValueExpr {
    /// A literal, parsed when the sheet was compiled.
    Literal(ErasedValue),
    /// A named resource, looked up in the active theme during the cascade.
    Resource(Box<str>),
    /// An asset identifier, loaded during the cascade.
    Asset(Box<str>),
}

impl ValueExpr {
    /// Returns the literal value, if this is a literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&ErasedValue> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }
}

/// Assigns a value to a property.
#[derive(Clone, Debug)]
pub struct Setter {
    /// Target property.
    pub property: PropertyId,
    /// Value to assign.
    pub value: ValueExpr,
}

/// How a property trigger compares the current value with its literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

impl ComparisonOp {
    /// Applies the operator to the result of comparing the current value
    /// with the condition's value.
    ///
    /// Incomparable values satisfy only [`NotEqual`](Self::NotEqual).
    #[must_use]
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Self::NotEqual, ordering) => ordering != Some(Ordering::Equal),
            (_, None) => false,
            (Self::Equal, Some(o)) => o.is_eq(),
            (Self::Less, Some(o)) => o.is_lt(),
            (Self::LessOrEqual, Some(o)) => o.is_le(),
            (Self::Greater, Some(o)) => o.is_gt(),
            (Self::GreaterOrEqual, Some(o)) => o.is_ge(),
        }
    }

    /// Returns the operator's textual form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The text was not a comparison operator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown comparison operator")]
pub struct ParseComparisonOpError;

impl FromStr for ComparisonOp {
    type Err = ParseComparisonOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "==" | "=" => Self::Equal,
            "!=" | "<>" => Self::NotEqual,
            "<" => Self::Less,
            "<=" => Self::LessOrEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterOrEqual,
            _ => return Err(ParseComparisonOpError),
        })
    }
}

/// One clause of a property trigger.
#[derive(Clone, Debug)]
pub struct PropertyCondition {
    /// Property whose effective value is tested.
    pub property: PropertyId,
    /// Comparison applied as `current <op> value`.
    pub op: ComparisonOp,
    /// Value compared against.
    pub value: ErasedValue,
}

impl PropertyCondition {
    /// Evaluates the condition against a property's current value.
    #[must_use]
    pub fn evaluate(&self, registry: &PropertyRegistry, current: &ErasedValue) -> bool {
        self.op
            .holds(registry.compare(self.property, current, &self.value))
    }
}

/// What makes a trigger active.
#[derive(Clone, Debug)]
pub enum TriggerCondition {
    /// Active while every condition holds.
    Property(Box<[PropertyCondition]>),
    /// Fires once each time the named event is raised on the element.
    Event(Box<str>),
}

/// Something a trigger does when it activates or deactivates.
#[derive(Clone, Debug)]
pub enum TriggerAction {
    /// Begins a storyboard on activation and stops it on deactivation.
    ///
    /// Without a selector the storyboard plays on the trigger's element.
    /// With one, it plays on every element the selector finds, using the
    /// trigger's element as the root for `:trigger-root` selectors.
    PlayStoryboard {
        /// Storyboard name, resolved when the action runs.
        storyboard: Box<str>,
        /// Optional target selector.
        selector: Option<Selector>,
    },
    /// Overrides a property on the trigger's element while active.
    Set {
        /// Target property.
        property: PropertyId,
        /// Value to assign.
        value: ValueExpr,
    },
}

/// A trigger declared on a rule.
#[derive(Clone, Debug)]
pub struct Trigger {
    condition: TriggerCondition,
    actions: Box<[TriggerAction]>,
}

impl Trigger {
    pub(crate) fn new(condition: TriggerCondition, actions: Box<[TriggerAction]>) -> Self {
        Self { condition, actions }
    }

    /// Returns the activation condition.
    #[must_use]
    pub fn condition(&self) -> &TriggerCondition {
        &self.condition
    }

    /// Returns the actions in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[TriggerAction] {
        &self.actions
    }

    /// Returns `true` for event triggers.
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self.condition, TriggerCondition::Event(_))
    }

    /// Returns the `Set` actions as setters.
    pub fn setters(&self) -> impl Iterator<Item = (PropertyId, &ValueExpr)> + '_ {
        self.actions.iter().filter_map(|action| match action {
            TriggerAction::Set { property, value } => Some((*property, value)),
            TriggerAction::PlayStoryboard { .. } => None,
        })
    }
}

/// A compiled style rule.
#[derive(Clone, Debug)]
pub struct Rule {
    selector: Selector,
    setters: Box<[Setter]>,
    triggers: Box<[Trigger]>,
    order: usize,
}

impl Rule {
    pub(crate) fn new(
        selector: Selector,
        setters: Box<[Setter]>,
        triggers: Box<[Trigger]>,
        order: usize,
    ) -> Self {
        Self {
            selector,
            setters,
            triggers,
            order,
        }
    }

    /// Returns the selector.
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Returns the setters in declaration order.
    #[must_use]
    pub fn setters(&self) -> &[Setter] {
        &self.setters
    }

    /// Returns the triggers in declaration order.
    #[must_use]
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Returns the rule's position in its sheet.
    #[must_use]
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the cascade key: specificity first, then declaration order.
    #[must_use]
    #[inline]
    pub fn precedence(&self) -> (Specificity, usize) {
        (self.selector.specificity(), self.order)
    }
}
