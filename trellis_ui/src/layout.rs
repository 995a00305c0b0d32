// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two-phase layout protocol.
//!
//! Layout runs measure (how big would you like to be, given this much room?)
//! and then arrange (here is your slot). Both phases are cached per element:
//! a clean element asked the same question again returns its previous answer
//! without calling its [`ElementLayout`].
//!
//! The framework properties wrap every element's own layout: margins are
//! subtracted from the room it sees, explicit and min/max sizes clamp what
//! it reports, alignment places it within its slot, and a collapsed element
//! is skipped entirely and takes no space.

use kurbo::{Insets, Point, Rect, Size};
use smallvec::SmallVec;

use crate::error::{LayoutError, TreeError};
use crate::properties::{HorizontalAlignment, VerticalAlignment, Visibility};
use crate::tree::NodeId;
use crate::view::View;

/// Per-element layout behavior.
///
/// Implementations measure and arrange their children through the
/// [`LayoutCx`]; the framework handles sizing properties around them.
pub trait ElementLayout {
    /// Returns the content size this element wants within `available`.
    ///
    /// `available` may be infinite in either dimension.
    fn measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size;

    /// Positions children inside `bounds`, the element's final rectangle.
    fn arrange(&mut self, cx: &mut LayoutCx<'_>, bounds: Rect);
}

/// Access to the view while one element is being laid out.
pub struct LayoutCx<'a> {
    view: &'a mut View,
    node: NodeId,
}

impl core::fmt::Debug for LayoutCx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutCx")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl LayoutCx<'_> {
    /// The element being laid out.
    #[must_use]
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The element's children, in order.
    #[must_use]
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        self.view.children(self.node).iter().copied().collect()
    }

    /// Measures `child` and returns its desired size, margins included.
    pub fn measure_child(&mut self, child: NodeId, available: Size) -> Size {
        match self.view.measure(child, available) {
            Ok(size) => size,
            Err(err) => {
                tracing::warn!(parent = %self.node, %child, %err, "child measure failed");
                Size::ZERO
            }
        }
    }

    /// Arranges `child` into `slot`.
    pub fn arrange_child(&mut self, child: NodeId, slot: Rect) {
        if let Err(err) = self.view.arrange(child, slot) {
            tracing::warn!(parent = %self.node, %child, %err, "child arrange failed");
        }
    }

    /// The last measured size of `child`.
    #[must_use]
    pub fn desired_size(&self, child: NodeId) -> Size {
        self.view.desired_size(child).unwrap_or(Size::ZERO)
    }

    /// The effective value of `property` on the element.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, property: trellis_property::Property<T>) -> Option<T> {
        self.view.get(self.node, property).ok()
    }

    /// For a visual clone, the original's arranged size after its render
    /// transform.
    #[must_use]
    pub fn clone_source_size(&self) -> Option<Size> {
        let original = self.view.clone_source(self.node)?;
        let bounds = self.view.bounds(original).ok()?;
        let transform = self
            .view
            .get(original, self.view.framework().render_transform)
            .ok()?;
        let local = Rect::from_origin_size(Point::ORIGIN, bounds.size());
        Some(transform.transform_rect_bbox(local).size())
    }
}

/// Overlays every child in the full slot.
#[derive(Copy, Clone, Debug, Default)]
pub struct Panel;

impl ElementLayout for Panel {
    fn measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let mut size = Size::ZERO;
        for child in cx.children() {
            let desired = cx.measure_child(child, available);
            size.width = size.width.max(desired.width);
            size.height = size.height.max(desired.height);
        }
        size
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, bounds: Rect) {
        for child in cx.children() {
            cx.arrange_child(child, bounds);
        }
    }
}

/// Stacks children along one axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StackPanel {
    /// `true` stacks top to bottom, `false` left to right.
    pub vertical: bool,
}

impl StackPanel {
    /// Top-to-bottom stacking.
    #[must_use]
    pub const fn vertical() -> Self {
        Self { vertical: true }
    }

    /// Left-to-right stacking.
    #[must_use]
    pub const fn horizontal() -> Self {
        Self { vertical: false }
    }
}

impl ElementLayout for StackPanel {
    fn measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let child_available = if self.vertical {
            Size::new(available.width, f64::INFINITY)
        } else {
            Size::new(f64::INFINITY, available.height)
        };
        let mut size = Size::ZERO;
        for child in cx.children() {
            let desired = cx.measure_child(child, child_available);
            if self.vertical {
                size.width = size.width.max(desired.width);
                size.height += desired.height;
            } else {
                size.width += desired.width;
                size.height = size.height.max(desired.height);
            }
        }
        size
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, bounds: Rect) {
        let mut offset = 0.0;
        for child in cx.children() {
            let desired = cx.desired_size(child);
            let slot = if self.vertical {
                let y = bounds.y0 + offset;
                offset += desired.height;
                Rect::new(bounds.x0, y, bounds.x1, y + desired.height)
            } else {
                let x = bounds.x0 + offset;
                offset += desired.width;
                Rect::new(x, bounds.y0, x + desired.width, bounds.y1)
            };
            cx.arrange_child(child, slot);
        }
    }
}

/// A childless element with a fixed content size, such as an image or a
/// glyph run that was shaped elsewhere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Leaf {
    /// The content size.
    pub intrinsic: Size,
}

impl Leaf {
    /// Creates a leaf of the given content size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            intrinsic: Size::new(width, height),
        }
    }
}

impl ElementLayout for Leaf {
    fn measure(&mut self, _cx: &mut LayoutCx<'_>, _available: Size) -> Size {
        self.intrinsic
    }

    fn arrange(&mut self, _cx: &mut LayoutCx<'_>, _bounds: Rect) {}
}

/// Sizes itself to mirror another element.
///
/// Created by [`View::add_visual_clone`]; its desired size is the original's
/// arranged size as transformed by the original's render transform.
#[derive(Copy, Clone, Debug, Default)]
pub struct VisualClone;

impl ElementLayout for VisualClone {
    fn measure(&mut self, cx: &mut LayoutCx<'_>, _available: Size) -> Size {
        cx.clone_source_size().unwrap_or(Size::ZERO)
    }

    fn arrange(&mut self, _cx: &mut LayoutCx<'_>, _bounds: Rect) {}
}

/// Framework sizing properties for one element, read once per phase.
#[derive(Copy, Clone, Debug)]
struct Constraints {
    width: f64,
    height: f64,
    min: Size,
    max: Size,
    margin: Insets,
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
    collapsed: bool,
}

impl Constraints {
    /// Returns the `(min, max)` range for one axis.
    fn range(explicit: f64, min: f64, max: f64) -> (f64, f64) {
        let min = finite_or_zero(min);
        // `f64::max` ignores NaN, so a NaN bound becomes `min`.
        let max = if max.is_nan() { f64::INFINITY } else { max.max(min) };
        if explicit.is_finite() {
            let size = explicit.clamp(min, max);
            (size, size)
        } else {
            (min, max)
        }
    }

    fn width_range(&self) -> (f64, f64) {
        Self::range(self.width, self.min.width, self.max.width)
    }

    fn height_range(&self) -> (f64, f64) {
        Self::range(self.height, self.min.height, self.max.height)
    }

    fn margin_size(&self) -> Size {
        Size::new(
            self.margin.x0 + self.margin.x1,
            self.margin.y0 + self.margin.y1,
        )
    }

    /// The room the element's own layout is offered.
    fn content_available(&self, available: Size) -> Size {
        let margin = self.margin_size();
        let (min_w, max_w) = self.width_range();
        let (min_h, max_h) = self.height_range();
        Size::new(
            (available.width - margin.width).max(0.0).clamp(min_w, max_w),
            (available.height - margin.height).max(0.0).clamp(min_h, max_h),
        )
    }

    /// The desired size reported to the parent.
    fn desired(&self, content: Size) -> Size {
        let margin = self.margin_size();
        let (min_w, max_w) = self.width_range();
        let (min_h, max_h) = self.height_range();
        Size::new(
            finite_or_zero(content.width).clamp(min_w, max_w) + margin.width,
            finite_or_zero(content.height).clamp(min_h, max_h) + margin.height,
        )
    }

    /// Places the element within `slot`.
    fn place(&self, slot: Rect, desired: Size) -> Rect {
        let margin = self.margin_size();
        let x0 = slot.x0 + self.margin.x0;
        let y0 = slot.y0 + self.margin.y0;
        let room = Size::new(
            (slot.width() - margin.width).max(0.0),
            (slot.height() - margin.height).max(0.0),
        );
        let want = Size::new(
            (desired.width - margin.width).max(0.0),
            (desired.height - margin.height).max(0.0),
        );

        let (min_w, max_w) = self.width_range();
        let width = match self.horizontal {
            HorizontalAlignment::Stretch => room.width,
            _ => want.width.min(room.width),
        }
        .clamp(min_w, max_w);
        let (min_h, max_h) = self.height_range();
        let height = match self.vertical {
            VerticalAlignment::Stretch => room.height,
            _ => want.height.min(room.height),
        }
        .clamp(min_h, max_h);

        let x = match self.horizontal {
            HorizontalAlignment::Left => x0,
            HorizontalAlignment::Right => x0 + room.width - width,
            HorizontalAlignment::Center | HorizontalAlignment::Stretch => {
                x0 + (room.width - width) / 2.0
            }
        };
        let y = match self.vertical {
            VerticalAlignment::Top => y0,
            VerticalAlignment::Bottom => y0 + room.height - height,
            VerticalAlignment::Center | VerticalAlignment::Stretch => {
                y0 + (room.height - height) / 2.0
            }
        };
        Rect::from_origin_size((x, y), (width, height))
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn is_valid_slot(rect: Rect) -> bool {
    rect.is_finite() && rect.width() >= 0.0 && rect.height() >= 0.0
}

const CLIP_EPSILON: f64 = 1e-9;

impl View {
    fn constraints(&self, node: NodeId) -> Result<Constraints, TreeError> {
        let fw = self.framework;
        Ok(Constraints {
            width: self.get(node, fw.width)?,
            height: self.get(node, fw.height)?,
            min: Size::new(self.get(node, fw.min_width)?, self.get(node, fw.min_height)?),
            max: Size::new(self.get(node, fw.max_width)?, self.get(node, fw.max_height)?),
            margin: self.get(node, fw.margin)?,
            horizontal: self.get(node, fw.horizontal_alignment)?,
            vertical: self.get(node, fw.vertical_alignment)?,
            collapsed: self.get(node, fw.visibility)? == Visibility::Collapsed,
        })
    }

    /// Measures `node` against `available` and returns its desired size.
    ///
    /// A clean element measured against the same `available` returns the
    /// cached size without running its layout.
    pub fn measure(&mut self, node: NodeId, available: Size) -> Result<Size, TreeError> {
        let state = &self.tree.element(node)?.layout;
        if !state.measure_dirty && state.last_available == Some(available) {
            tracing::trace!(%node, "measure cached");
            return Ok(state.desired);
        }
        let constraints = self.constraints(node)?;
        let (desired, content) = if constraints.collapsed {
            (Size::ZERO, Size::ZERO)
        } else {
            let content = self.run_measure(node, constraints.content_available(available));
            (constraints.desired(content), content)
        };
        let state = &mut self.tree.element_mut(node)?.layout;
        if state.desired != desired {
            state.arrange_dirty = true;
        }
        state.desired = desired;
        state.content = content;
        state.last_available = Some(available);
        state.measure_dirty = false;
        Ok(desired)
    }

    fn run_measure(&mut self, node: NodeId, available: Size) -> Size {
        let Some(mut behavior) = self.tree.get_mut(node).and_then(|el| el.behavior.take()) else {
            return Size::ZERO;
        };
        let size = behavior.measure(&mut LayoutCx { view: self, node }, available);
        if let Some(el) = self.tree.get_mut(node) {
            el.behavior = Some(behavior);
        }
        size
    }

    /// Arranges `node` into `slot`.
    ///
    /// `slot` must be finite with a non-negative size; otherwise the node is
    /// left untouched and [`LayoutError::InvalidArrangeRect`] is returned.
    pub fn arrange(&mut self, node: NodeId, slot: Rect) -> Result<(), LayoutError> {
        if !is_valid_slot(slot) {
            return Err(LayoutError::InvalidArrangeRect(slot));
        }
        let state = &self.tree.element(node)?.layout;
        if !state.arrange_dirty && state.last_slot == Some(slot) {
            tracing::trace!(%node, "arrange cached");
            return Ok(());
        }
        let desired = state.desired;
        let constraints = self.constraints(node)?;
        let bounds = if constraints.collapsed {
            Rect::from_origin_size(slot.origin(), Size::ZERO)
        } else {
            let bounds = constraints.place(slot, desired);
            self.run_arrange(node, bounds);
            bounds
        };

        let el = self.tree.element_mut(node)?;
        let moved = el.layout.bounds != bounds;
        el.layout.bounds = bounds;
        el.layout.last_slot = Some(slot);
        el.layout.arrange_dirty = false;
        if moved && !el.clones.is_empty() {
            let clones = el.clones.clone();
            tracing::debug!(%node, clones = clones.len(), "layout updated");
            for clone in clones {
                self.invalidate_measure(clone);
            }
            self.layout_updated = true;
        }
        Ok(())
    }

    fn run_arrange(&mut self, node: NodeId, bounds: Rect) {
        let Some(mut behavior) = self.tree.get_mut(node).and_then(|el| el.behavior.take()) else {
            return;
        };
        behavior.arrange(&mut LayoutCx { view: self, node }, bounds);
        if let Some(el) = self.tree.get_mut(node) {
            el.behavior = Some(behavior);
        }
    }

    /// Returns the rectangle drawing of `node` must be clipped to, if any.
    ///
    /// Only content that overflows the arranged size is clipped, and then to
    /// the arranged bounds. A visual clone overflows when its original's
    /// transformed size exceeds the slot the clone was given.
    pub fn clip_rect(&self, node: NodeId) -> Result<Option<Rect>, TreeError> {
        let state = &self.tree.element(node)?.layout;
        let bounds = state.bounds;
        let overflows = state.content.width > bounds.width() + CLIP_EPSILON
            || state.content.height > bounds.height() + CLIP_EPSILON;
        Ok(overflows.then_some(bounds))
    }

    /// Measures and arranges every root against the viewport.
    ///
    /// A pass that moves an element with visual clones invalidates the
    /// clones, and the pass repeats up to `max_iterations` times. Returns the
    /// number of passes run.
    pub fn update_layout(&mut self, max_iterations: usize) -> usize {
        let max_iterations = max_iterations.max(1);
        for iteration in 1..=max_iterations {
            self.layout_updated = false;
            for root in self.tree.roots().to_vec() {
                self.layout_root(root);
            }
            if !self.layout_updated {
                return iteration;
            }
        }
        tracing::debug!(max_iterations, "layout did not settle");
        max_iterations
    }

    fn layout_root(&mut self, root: NodeId) {
        let viewport = self.viewport;
        let desired = match self.measure(root, viewport) {
            Ok(size) => size,
            Err(err) => {
                tracing::warn!(%root, %err, "root measure failed");
                return;
            }
        };
        let size = Size::new(
            if viewport.width.is_finite() { viewport.width } else { desired.width },
            if viewport.height.is_finite() { viewport.height } else { desired.height },
        );
        if let Err(err) = self.arrange(root, Rect::from_origin_size(Point::ORIGIN, size)) {
            tracing::warn!(%root, %err, "root arrange failed");
        }
    }
}
