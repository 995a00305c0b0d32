// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property values.
//!
//! [`ErasedValue`] stores a value of any registered property type so that tiered
//! stores, style sheets and keyframe tracks can hold heterogeneous values.
//! [`StyleValue`] is the capability a type needs to be written from a style
//! sheet or animated.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cmp::Ordering;
use core::fmt;

use kurbo::{Affine, Insets, Point, Size, Vec2};
use peniko::Color;

/// A type-erased property value.
///
/// Wraps a value of any `'static + Clone` type together with its [`TypeId`].
///
/// # Example
///
/// ```rust
/// use trellis_property::ErasedValue;
///
/// let value = ErasedValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// assert_eq!(value.downcast_ref::<f64>(), None);
/// ```
pub struct ErasedValue {
    inner: Box<dyn CloneAny>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedValue {
    /// Wraps a concrete value.
    #[must_use]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust type name of the contained value, for diagnostics.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is a `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrows the contained value as a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }

    /// Takes the contained value out as a `T`, or gives the erased value back.
    pub fn downcast<T: Clone + 'static>(self) -> Result<T, Self> {
        match self.downcast_ref::<T>() {
            Some(value) => Ok(value.clone()),
            None => Err(self),
        }
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

trait CloneAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn CloneAny>;
}

impl<T: Clone + 'static> CloneAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn CloneAny> {
        Box::new(self.clone())
    }
}

/// A value type that style sheets can write and storyboards can animate.
///
/// Registering a property with
/// [`PropertyMetadataBuilder::styled`](crate::PropertyMetadataBuilder::styled)
/// installs these three operations as the property's erased hooks.
pub trait StyleValue: Clone + 'static {
    /// Parses the literal form used in style sheets and trigger conditions.
    fn parse_style(text: &str) -> Option<Self>;

    /// Blends from `self` towards `to` at progress `t` in `[0, 1]`.
    ///
    /// The default switches discretely to `to` once `t` reaches 1.
    #[must_use]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        if t >= 1.0 { to.clone() } else { self.clone() }
    }

    /// Orders two values for trigger conditions.
    ///
    /// Returns `Some(Ordering::Equal)` for equal values and `None` when the
    /// values are different but have no meaningful order.
    fn compare(&self, other: &Self) -> Option<Ordering>;
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Splits `a,b` or `a b` into numbers.
fn numbers(text: &str) -> Option<Vec<f64>> {
    text.split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>().ok())
        .collect()
}

impl StyleValue for f64 {
    fn parse_style(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("auto") {
            return Some(Self::NAN);
        }
        text.parse().ok()
    }

    fn interpolate(&self, to: &Self, t: f64) -> Self {
        if self.is_nan() || to.is_nan() {
            return if t >= 1.0 { *to } else { *self };
        }
        lerp(*self, *to, t)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.is_nan() && other.is_nan() {
            return Some(Ordering::Equal);
        }
        self.partial_cmp(other)
    }
}

impl StyleValue for f32 {
    fn parse_style(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "interpolating between two f32 endpoints stays in f32 range"
    )]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(f64::from(*self), f64::from(*to), t) as Self
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp(other)
    }
}

impl StyleValue for i32 {
    fn parse_style(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "interpolating between two i32 endpoints stays in i32 range"
    )]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        round_half_away(lerp(f64::from(*self), f64::from(*to), t)) as Self
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl StyleValue for u32 {
    fn parse_style(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "interpolating between two u32 endpoints stays in u32 range"
    )]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        round_half_away(lerp(f64::from(*self), f64::from(*to), t)) as Self
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rounds half away from zero without needing `std`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "callers only round values that fit in i64"
)]
fn round_half_away(x: f64) -> f64 {
    let truncated = x as i64 as f64;
    let fraction = x - truncated;
    if fraction >= 0.5 {
        truncated + 1.0
    } else if fraction <= -0.5 {
        truncated - 1.0
    } else {
        truncated
    }
}

impl StyleValue for bool {
    fn parse_style(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for String {
    fn parse_style(text: &str) -> Option<Self> {
        let text = text.trim();
        let unquoted = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
            .unwrap_or(text);
        Some(Self::from(unquoted))
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for Size {
    fn parse_style(text: &str) -> Option<Self> {
        match numbers(text)?.as_slice() {
            [w, h] => Some(Self::new(*w, *h)),
            _ => None,
        }
    }

    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self::new(lerp(self.width, to.width, t), lerp(self.height, to.height, t))
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for Point {
    fn parse_style(text: &str) -> Option<Self> {
        match numbers(text)?.as_slice() {
            [x, y] => Some(Self::new(*x, *y)),
            _ => None,
        }
    }

    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self.lerp(*to, t)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for Vec2 {
    fn parse_style(text: &str) -> Option<Self> {
        match numbers(text)?.as_slice() {
            [x, y] => Some(Self::new(*x, *y)),
            _ => None,
        }
    }

    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self.lerp(*to, t)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for Insets {
    /// Accepts `all`, `horizontal,vertical` or `left,top,right,bottom`.
    fn parse_style(text: &str) -> Option<Self> {
        match numbers(text)?.as_slice() {
            [all] => Some(Self::uniform(*all)),
            [x, y] => Some(Self::uniform_xy(*x, *y)),
            [x0, y0, x1, y1] => Some(Self::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }

    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self::new(
            lerp(self.x0, to.x0, t),
            lerp(self.y0, to.y0, t),
            lerp(self.x1, to.x1, t),
            lerp(self.y1, to.y1, t),
        )
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for Affine {
    /// Accepts `identity` or a sequence of `translate(x,y)`, `scale(s)`,
    /// `scale(sx,sy)` and `rotate(degrees)`, applied left to right.
    fn parse_style(text: &str) -> Option<Self> {
        let mut rest = text.trim();
        if rest.eq_ignore_ascii_case("identity") {
            return Some(Self::IDENTITY);
        }
        let mut transform = Self::IDENTITY;
        while !rest.is_empty() {
            let open = rest.find('(')?;
            let close = rest.find(')')?;
            if close < open {
                return None;
            }
            let func = rest[..open].trim();
            let args = numbers(&rest[open + 1..close])?;
            let step = match (func, args.as_slice()) {
                ("translate", [x, y]) => Self::translate((*x, *y)),
                ("scale", [s]) => Self::scale(*s),
                ("scale", [sx, sy]) => Self::scale_non_uniform(*sx, *sy),
                ("rotate", [degrees]) => Self::rotate(degrees * core::f64::consts::PI / 180.0),
                _ => return None,
            };
            transform = step * transform;
            rest = rest[close + 1..].trim_start();
        }
        Some(transform)
    }

    fn interpolate(&self, to: &Self, t: f64) -> Self {
        let a = self.as_coeffs();
        let b = to.as_coeffs();
        let mut out = [0.0; 6];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = lerp(a[i], b[i], t);
        }
        Self::new(out)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self == other).then_some(Ordering::Equal)
    }
}

impl StyleValue for Color {
    /// Accepts any CSS color: named colors, `#rgb`, `#rrggbb`, `rgb()` and so on.
    fn parse_style(text: &str) -> Option<Self> {
        let lowered = text.trim().to_ascii_lowercase();
        let parsed = peniko::color::parse_color(&lowered).ok()?;
        Some(parsed.to_alpha_color::<peniko::color::Srgb>())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "color components are f32 by definition"
    )]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        let mut components = [0.0_f32; 4];
        for (i, slot) in components.iter_mut().enumerate() {
            *slot = lerp(
                f64::from(self.components[i]),
                f64::from(to.components[i]),
                t,
            ) as f32;
        }
        Self::new(components)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        (self.components == other.components).then_some(Ordering::Equal)
    }
}
