// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis UI: a retained element tree that is styled, animated and laid out.
//!
//! A [`Presentation`] owns one or more [`View`]s and the clock pool that
//! animates them. Each view owns an element arena addressed by generational
//! [`NodeId`]s, a [`StyleSheet`](trellis_style::StyleSheet), a
//! [`Theme`](trellis_style::Theme) and a [`StoryboardRegistry`].
//!
//! Every [`Presentation::update`] runs the same pipeline:
//!
//! 1. Clocks advance. Storyboards and tweens write the animated tier.
//! 2. Elements marked for styling are styled in document order. The cascade
//!    writes the styled tier, evaluates triggers, and the actions of flipped
//!    triggers run before the next element is styled.
//! 3. Each root is measured and arranged against the view's viewport. Passes
//!    repeat while visual clones are invalidated, up to
//!    [`PresentationConfig::max_layout_iterations`].
//!
//! Property values resolve animated, then triggered, then local, then
//! styled; inheriting properties then consult ancestors before falling back
//! to the registered default.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use core::time::Duration;
//! use peniko::Color;
//! use trellis_property::PropertyRegistry;
//! use trellis_style::{ComparisonOp, RuleBuilder, StyleSheetBuilder, TriggerBuilder};
//! use trellis_ui::{FrameworkProperties, Leaf, Presentation, PresentationConfig, StackPanel};
//!
//! let mut registry = PropertyRegistry::new();
//! let fw = FrameworkProperties::register(&mut registry);
//! let registry = Rc::new(registry);
//!
//! let sheet = StyleSheetBuilder::new()
//!     .rule(RuleBuilder::new(".highlight").set("Foreground", "#ff0000"))
//!     .rule(RuleBuilder::new("Button.highlight").set("Foreground", "#0000ff"))
//!     .rule(
//!         RuleBuilder::new("Button").trigger(
//!             TriggerBuilder::property("Width", ComparisonOp::GreaterOrEqual, "200")
//!                 .set("Opacity", "0.5"),
//!         ),
//!     )
//!     .build(&registry)
//!     .unwrap();
//!
//! let mut presentation = Presentation::new(registry, fw, PresentationConfig::default());
//! let id = presentation.add_view();
//! let view = presentation.view_mut(id).unwrap();
//! view.set_style_sheet(sheet);
//! let root = view.add_root("StackPanel", StackPanel::vertical());
//! let button = view.add_child(root, "Button", Leaf::new(80.0, 24.0)).unwrap();
//! view.add_class(button, "highlight").unwrap();
//!
//! presentation.update(Duration::ZERO);
//! let view = presentation.view(id).unwrap();
//! let blue = Color::from_rgb8(0, 0, 255);
//! assert_eq!(view.get(button, fw.foreground).unwrap().components, blue.components);
//! assert_eq!(view.get(button, fw.opacity).unwrap(), 1.0);
//! assert_eq!(view.desired_size(root).unwrap().height, 24.0);
//!
//! presentation.view_mut(id).unwrap().set_local(button, fw.width, 240.0).unwrap();
//! presentation.update(Duration::ZERO);
//! assert_eq!(presentation.view(id).unwrap().get(button, fw.opacity).unwrap(), 0.5);
//! ```

mod asset;
mod cascade;
mod error;
mod layout;
mod presentation;
mod properties;
mod storyboard;
mod tree;
mod view;

pub use asset::{AssetError, AssetLoader};
pub use error::{Diagnostic, DiagnosticKind, LayoutError, TreeError};
pub use layout::{ElementLayout, LayoutCx, Leaf, Panel, StackPanel, VisualClone};
pub use presentation::{Presentation, PresentationConfig, UpdateReport, ViewId};
pub use properties::{FrameworkProperties, HorizontalAlignment, Visibility, VerticalAlignment};
pub use storyboard::{ClockBinding, StoryboardRegistry};
pub use tree::{NodeId, StyleState};
pub use view::View;
