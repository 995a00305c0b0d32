// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Style: selectors, style sheets, triggers and storyboards.
//!
//! This crate compiles textual style declarations into an immutable
//! [`StyleSheet`]. The sheet holds everything the cascade needs; applying it
//! to a tree is the job of the UI layer.
//!
//! - [`Selector`]: a chain of type, `#name`, `.class` and `:pseudo`
//!   constraints joined by descendant (whitespace) or child (`>`)
//!   combinators, with a [`Specificity`] of
//!   `(names, classes, types, pseudo-classes)`.
//! - [`Rule`]: a selector, ordered [`Setter`]s and [`Trigger`]s.
//! - [`Storyboard`]: named keyframe animations that triggers can play.
//! - [`Theme`]: named resources that setters can reference.
//!
//! ## Matching
//!
//! Selectors match against any tree implementing [`SelectorTree`].
//!
//! ```rust
//! use trellis_style::{Selector, SelectorInputs, SelectorTree};
//!
//! struct Pair {
//!     classes: [Box<str>; 1],
//!     children: [u8; 1],
//! }
//!
//! impl SelectorTree for Pair {
//!     type Node = u8;
//!     fn parent(&self, node: u8) -> Option<u8> { (node == 1).then_some(0) }
//!     fn children(&self, node: u8) -> &[u8] {
//!         if node == 0 { &self.children[..] } else { &[] }
//!     }
//!     fn roots(&self) -> &[u8] { &[0] }
//!     fn inputs(&self, node: u8) -> Option<SelectorInputs<'_>> {
//!         match node {
//!             0 => Some(SelectorInputs::new("Panel", None, &[], &[])),
//!             1 => Some(SelectorInputs::new("Button", None, &self.classes, &[])),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let tree = Pair { classes: ["primary".into()], children: [1] };
//! let selector = Selector::parse("Panel > Button.primary").unwrap();
//! assert!(selector.matches(&tree, 1));
//! assert!(!selector.matches(&tree, 0));
//! assert_eq!(selector.select_all(&tree, None), [1]);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod rule;
mod selector;
mod storyboard;
mod stylesheet;
mod theme;

pub use error::{CompileError, SelectorErrorKind, SelectorParseError};
pub use rule::{
    ComparisonOp, ParseComparisonOpError, PropertyCondition, Rule, Setter, Trigger, TriggerAction,
    TriggerCondition, ValueExpr,
};
pub use selector::{
    Combinator, IdSet, Selector, SelectorInputs, SelectorPart, SelectorTree, Specificity,
    TRIGGER_ROOT,
};
pub use storyboard::{Storyboard, StoryboardTarget};
pub use stylesheet::{
    RuleBuilder, StoryboardBuilder, StyleSheet, StyleSheetBuilder, TargetBuilder, TriggerBuilder,
};
pub use theme::{Theme, ThemeBuilder};
