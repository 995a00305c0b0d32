// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Properties the layout protocol reads.

use core::cmp::Ordering;

use kurbo::{Affine, Insets};
use peniko::Color;
use trellis_property::{
    Invalidation, Property, PropertyMetadataBuilder, PropertyRegistry, StyleValue,
};

macro_rules! keyword_value {
    ($ty:ident { $($variant:ident => [$($word:literal),+]),+ $(,)? }) => {
        impl StyleValue for $ty {
            fn parse_style(text: &str) -> Option<Self> {
                let text = text.trim();
                $(
                    if [$($word),+].iter().any(|w| text.eq_ignore_ascii_case(w)) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }

            fn compare(&self, other: &Self) -> Option<Ordering> {
                (self == other).then_some(Ordering::Equal)
            }
        }
    };
}

/// Horizontal placement within the layout slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    /// Against the left edge.
    Left,
    /// Centered.
    Center,
    /// Against the right edge.
    Right,
    /// Fill the slot unless a width is set.
    #[default]
    Stretch,
}

keyword_value!(HorizontalAlignment {
    Left => ["left"],
    Center => ["center"],
    Right => ["right"],
    Stretch => ["stretch"],
});

/// Vertical placement within the layout slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    /// Against the top edge.
    Top,
    /// Centered.
    Center,
    /// Against the bottom edge.
    Bottom,
    /// Fill the slot unless a height is set.
    #[default]
    Stretch,
}

keyword_value!(VerticalAlignment {
    Top => ["top"],
    Center => ["center"],
    Bottom => ["bottom"],
    Stretch => ["stretch"],
});

/// Whether an element is drawn and takes up space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Drawn and laid out.
    #[default]
    Visible,
    /// Laid out but not drawn.
    Hidden,
    /// Neither drawn nor given any space.
    Collapsed,
}

keyword_value!(Visibility {
    Visible => ["visible"],
    Hidden => ["hidden"],
    Collapsed => ["collapsed"],
});

/// The framework properties, registered once per registry.
///
/// # Example
///
/// ```rust
/// use trellis_property::PropertyRegistry;
/// use trellis_ui::{FrameworkProperties, HorizontalAlignment};
///
/// let mut registry = PropertyRegistry::new();
/// let fw = FrameworkProperties::register(&mut registry);
///
/// let id = registry.by_name("HorizontalAlignment").unwrap();
/// let parsed = registry.parse_value(id, "center").unwrap();
/// assert_eq!(parsed.downcast_ref(), Some(&HorizontalAlignment::Center));
/// assert!(registry.get_metadata(fw.width).unwrap().default_value().is_nan());
/// ```
#[derive(Copy, Clone, Debug)]
pub struct FrameworkProperties {
    /// Explicit width; NaN means sized by content.
    pub width: Property<f64>,
    /// Explicit height; NaN means sized by content.
    pub height: Property<f64>,
    /// Lower width bound.
    pub min_width: Property<f64>,
    /// Lower height bound.
    pub min_height: Property<f64>,
    /// Upper width bound.
    pub max_width: Property<f64>,
    /// Upper height bound.
    pub max_height: Property<f64>,
    /// Space kept around the element.
    pub margin: Property<Insets>,
    /// Horizontal placement in the slot.
    pub horizontal_alignment: Property<HorizontalAlignment>,
    /// Vertical placement in the slot.
    pub vertical_alignment: Property<VerticalAlignment>,
    /// Visibility.
    pub visibility: Property<Visibility>,
    /// Opacity in `[0, 1]`.
    pub opacity: Property<f64>,
    /// Transform applied when drawing; does not affect layout.
    pub render_transform: Property<Affine>,
    /// Text and glyph color; inherited.
    pub foreground: Property<Color>,
}

impl FrameworkProperties {
    /// Registers every framework property.
    ///
    /// # Panics
    ///
    /// Panics if any of the names is already registered.
    pub fn register(registry: &mut PropertyRegistry) -> Self {
        let length = |default: f64| {
            PropertyMetadataBuilder::styled(default)
                .invalidates(Invalidation::LAYOUT)
                .build()
        };
        let non_negative = |default: f64| {
            PropertyMetadataBuilder::styled(default)
                .invalidates(Invalidation::LAYOUT)
                .coerce(|v: f64| if v < 0.0 { 0.0 } else { v })
                .build()
        };
        Self {
            width: registry.register("Width", length(f64::NAN)),
            height: registry.register("Height", length(f64::NAN)),
            min_width: registry.register("MinWidth", non_negative(0.0)),
            min_height: registry.register("MinHeight", non_negative(0.0)),
            max_width: registry.register("MaxWidth", non_negative(f64::INFINITY)),
            max_height: registry.register("MaxHeight", non_negative(f64::INFINITY)),
            margin: registry.register(
                "Margin",
                PropertyMetadataBuilder::styled(Insets::ZERO)
                    .invalidates(Invalidation::LAYOUT)
                    .build(),
            ),
            horizontal_alignment: registry.register(
                "HorizontalAlignment",
                PropertyMetadataBuilder::styled(HorizontalAlignment::Stretch)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            vertical_alignment: registry.register(
                "VerticalAlignment",
                PropertyMetadataBuilder::styled(VerticalAlignment::Stretch)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            visibility: registry.register(
                "Visibility",
                PropertyMetadataBuilder::styled(Visibility::Visible)
                    .invalidates(Invalidation::LAYOUT | Invalidation::RENDER)
                    .build(),
            ),
            opacity: registry.register(
                "Opacity",
                PropertyMetadataBuilder::styled(1.0_f64)
                    .invalidates(Invalidation::RENDER)
                    .coerce(|v: f64| v.clamp(0.0, 1.0))
                    .build(),
            ),
            render_transform: registry.register(
                "RenderTransform",
                PropertyMetadataBuilder::styled(Affine::IDENTITY)
                    .invalidates(Invalidation::RENDER)
                    .build(),
            ),
            foreground: registry.register(
                "Foreground",
                PropertyMetadataBuilder::styled(Color::BLACK)
                    .inherits(true)
                    .invalidates(Invalidation::RENDER)
                    .build(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!(Visibility::parse_style(" Collapsed "), Some(Visibility::Collapsed));
        assert_eq!(VerticalAlignment::parse_style("BOTTOM"), Some(VerticalAlignment::Bottom));
        assert_eq!(HorizontalAlignment::parse_style("middle"), None);
    }

    #[test]
    fn keywords_compare_for_equality_only() {
        use Ordering::Equal;
        assert_eq!(Visibility::Hidden.compare(&Visibility::Hidden), Some(Equal));
        assert_eq!(Visibility::Hidden.compare(&Visibility::Visible), None);
    }

    #[test]
    fn keywords_switch_discretely() {
        let a = HorizontalAlignment::Left;
        let b = HorizontalAlignment::Right;
        assert_eq!(a.interpolate(&b, 0.99), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
    }

    #[test]
    fn coercion_clamps() {
        let mut registry = PropertyRegistry::new();
        let fw = FrameworkProperties::register(&mut registry);
        let opacity = registry.parse_value(fw.opacity.id(), "1.5").unwrap();
        assert_eq!(opacity.downcast_ref::<f64>(), Some(&1.0));
        let min = registry.parse_value(fw.min_width.id(), "-3").unwrap();
        assert_eq!(min.downcast_ref::<f64>(), Some(&0.0));
        assert!(registry.inherits(fw.foreground.id()));
        assert!(registry.invalidates(fw.width.id()).contains(Invalidation::MEASURE));
    }
}
