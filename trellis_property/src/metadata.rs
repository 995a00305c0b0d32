// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property metadata definitions.
//!
//! [`PropertyMetadata`] holds a property's configuration and
//! [`PropertyMetadataBuilder`] constructs it.

use alloc::boxed::Box;
use core::cmp::Ordering;
use core::fmt;

use crate::invalidation::Invalidation;
use crate::value::StyleValue;

/// Callback for coercing a property value before it's stored.
///
/// Applied to parsed style literals and by [`PropertyRegistry::coerce`](crate::PropertyRegistry::coerce),
/// which the element tree calls before writing any tier.
pub type CoerceValueCallback<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// Hooks captured from [`StyleValue`] at registration time.
pub(crate) struct StyleHooks<T> {
    pub(crate) parse: fn(&str) -> Option<T>,
    pub(crate) interpolate: Option<fn(&T, &T, f64) -> T>,
    pub(crate) compare: fn(&T, &T) -> Option<Ordering>,
}

impl<T: StyleValue> StyleHooks<T> {
    fn from_style_value() -> Self {
        Self {
            parse: T::parse_style,
            interpolate: Some(T::interpolate),
            compare: T::compare,
        }
    }
}

/// Metadata for a dependency property.
///
/// # Example
///
/// ```rust
/// use trellis_property::{Invalidation, PropertyMetadataBuilder};
///
/// let metadata = PropertyMetadataBuilder::styled(14.0_f64)
///     .inherits(true)
///     .invalidates(Invalidation::LAYOUT)
///     .build();
///
/// assert_eq!(metadata.default_value(), &14.0);
/// assert!(metadata.inherits());
/// assert!(metadata.is_styleable());
/// assert!(metadata.is_animatable());
/// ```
pub struct PropertyMetadata<T: Clone + 'static> {
    default_value: T,
    inherits: bool,
    invalidates: Invalidation,
    coerce_callback: Option<CoerceValueCallback<T>>,
    hooks: Option<StyleHooks<T>>,
}

impl<T: Clone + 'static> PropertyMetadata<T> {
    /// Returns the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns whether this property inherits from ancestors.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Returns the passes invalidated by a change to this property.
    #[must_use]
    #[inline]
    pub fn invalidates(&self) -> Invalidation {
        self.invalidates
    }

    /// Returns whether style sheets may set this property.
    #[must_use]
    #[inline]
    pub fn is_styleable(&self) -> bool {
        self.hooks.is_some()
    }

    /// Returns whether storyboards and tweens may animate this property.
    #[must_use]
    #[inline]
    pub fn is_animatable(&self) -> bool {
        self.hooks.as_ref().is_some_and(|h| h.interpolate.is_some())
    }

    /// Coerces a value using the coerce callback, if one is set.
    #[inline]
    pub fn coerce(&self, value: T) -> T {
        match &self.coerce_callback {
            Some(callback) => callback(value),
            None => value,
        }
    }

    /// Returns whether a coerce callback is set.
    #[must_use]
    #[inline]
    pub fn has_coerce_callback(&self) -> bool {
        self.coerce_callback.is_some()
    }

    /// Parses a literal with the property's [`StyleValue`] grammar.
    ///
    /// Returns `None` for properties that are not styleable.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<T> {
        self.hooks.as_ref().and_then(|h| (h.parse)(text))
    }

    /// Interpolates between two values.
    ///
    /// Returns `None` for properties that are not animatable.
    #[must_use]
    pub fn interpolate(&self, from: &T, to: &T, t: f64) -> Option<T> {
        let interpolate = self.hooks.as_ref()?.interpolate?;
        Some(interpolate(from, to, t))
    }

    /// Compares two values.
    ///
    /// Returns `None` for unordered values and for properties that are not
    /// styleable.
    #[must_use]
    pub fn compare(&self, a: &T, b: &T) -> Option<Ordering> {
        self.hooks.as_ref().and_then(|h| (h.compare)(a, b))
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for PropertyMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default_value", &self.default_value)
            .field("inherits", &self.inherits)
            .field("invalidates", &self.invalidates)
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .field("styleable", &self.is_styleable())
            .field("animatable", &self.is_animatable())
            .finish()
    }
}

/// Builder for [`PropertyMetadata`].
///
/// [`new`](Self::new) accepts any clonable type; such properties can only be
/// written from code. [`styled`](Self::styled) requires a [`StyleValue`] and
/// makes the property settable from style sheets and animatable.
///
/// # Example
///
/// ```rust
/// use trellis_property::{Invalidation, PropertyMetadataBuilder};
///
/// let opacity = PropertyMetadataBuilder::styled(1.0_f64)
///     .invalidates(Invalidation::RENDER)
///     .coerce(|v: f64| v.clamp(0.0, 1.0))
///     .build();
/// assert_eq!(opacity.coerce(1.5), 1.0);
///
/// let tag = PropertyMetadataBuilder::new(0_u64).build();
/// assert!(!tag.is_styleable());
/// ```
pub struct PropertyMetadataBuilder<T: Clone + 'static> {
    default_value: T,
    inherits: bool,
    invalidates: Invalidation,
    coerce_callback: Option<CoerceValueCallback<T>>,
    hooks: Option<StyleHooks<T>>,
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for PropertyMetadataBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadataBuilder")
            .field("default_value", &self.default_value)
            .field("inherits", &self.inherits)
            .field("invalidates", &self.invalidates)
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .field("styleable", &self.hooks.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> PropertyMetadataBuilder<T> {
    /// Creates a builder for a code-only property.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            inherits: false,
            invalidates: Invalidation::empty(),
            coerce_callback: None,
            hooks: None,
        }
    }

    /// Sets whether this property inherits from ancestors.
    #[must_use]
    pub fn inherits(mut self, inherits: bool) -> Self {
        self.inherits = inherits;
        self
    }

    /// Sets the passes invalidated when the effective value changes.
    #[must_use]
    pub fn invalidates(mut self, invalidates: Invalidation) -> Self {
        self.invalidates = invalidates;
        self
    }

    /// Sets a callback to coerce values before they are stored.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.coerce_callback = Some(Box::new(callback));
        self
    }

    /// Keeps the property styleable but rejects it in storyboards and tweens.
    #[must_use]
    pub fn not_animatable(mut self) -> Self {
        if let Some(hooks) = &mut self.hooks {
            hooks.interpolate = None;
        }
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata<T> {
        PropertyMetadata {
            default_value: self.default_value,
            inherits: self.inherits,
            invalidates: self.invalidates,
            coerce_callback: self.coerce_callback,
            hooks: self.hooks,
        }
    }
}

impl<T: StyleValue> PropertyMetadataBuilder<T> {
    /// Creates a builder for a property that style sheets can set and
    /// storyboards can animate.
    #[must_use]
    pub fn styled(default_value: T) -> Self {
        Self {
            hooks: Some(StyleHooks::from_style_value()),
            ..Self::new(default_value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn plain_metadata_has_no_hooks() {
        let metadata = PropertyMetadataBuilder::new(42_i32).build();
        assert_eq!(metadata.default_value(), &42);
        assert!(!metadata.inherits());
        assert!(metadata.invalidates().is_empty());
        assert!(!metadata.is_styleable());
        assert!(!metadata.is_animatable());
        assert_eq!(metadata.parse("7"), None);
        assert_eq!(metadata.interpolate(&0, &10, 0.5), None);
    }

    #[test]
    fn styled_metadata_uses_style_value() {
        let metadata = PropertyMetadataBuilder::styled(0.0_f64)
            .invalidates(Invalidation::MEASURE)
            .build();
        assert!(metadata.is_styleable());
        assert!(metadata.is_animatable());
        assert_eq!(metadata.parse("2.5"), Some(2.5));
        assert_eq!(metadata.interpolate(&0.0, &10.0, 0.5), Some(5.0));
        assert_eq!(metadata.compare(&1.0, &2.0), Some(Ordering::Less));
        assert_eq!(metadata.invalidates(), Invalidation::MEASURE);
    }

    #[test]
    fn not_animatable_keeps_parsing() {
        let metadata = PropertyMetadataBuilder::styled(false)
            .not_animatable()
            .build();
        assert!(metadata.is_styleable());
        assert!(!metadata.is_animatable());
        assert_eq!(metadata.parse("true"), Some(true));
    }

    #[test]
    fn coerce_clamps() {
        let metadata = PropertyMetadataBuilder::styled(0.0_f64)
            .coerce(|v| v.clamp(0.0, 100.0))
            .build();
        assert!(metadata.has_coerce_callback());
        assert_eq!(metadata.coerce(-10.0), 0.0);
        assert_eq!(metadata.coerce(50.0), 50.0);
        assert_eq!(metadata.coerce(150.0), 100.0);
    }

    #[test]
    fn debug_reports_flags() {
        let metadata = PropertyMetadataBuilder::styled(42_i32).inherits(true).build();
        let debug = format!("{metadata:?}");
        assert!(debug.contains("PropertyMetadata"));
        assert!(debug.contains("42"));
        assert!(debug.contains("styleable: true"));
    }
}
