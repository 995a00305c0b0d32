// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named resources referenced from style sheets.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use trellis_property::ErasedValue;

/// A set of named resources.
///
/// Setters written with [`RuleBuilder::set_resource`] look their value up
/// here when the cascade runs, so swapping the theme restyles a view without
/// recompiling its sheet. Themes are immutable and cheap to clone.
///
/// [`RuleBuilder::set_resource`]: crate::RuleBuilder::set_resource
///
/// # Example
///
/// ```rust
/// use trellis_style::ThemeBuilder;
///
/// let light = ThemeBuilder::new().set("Accent", 0x0078D4_u32).build();
/// let dark = light.to_builder().set("Accent", 0x4CC2FF_u32).build();
///
/// assert_eq!(light.get::<u32>("Accent"), Some(&0x0078D4));
/// assert_eq!(dark.get::<u32>("Accent"), Some(&0x4CC2FF));
/// assert!(dark.get::<f64>("Accent").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Theme {
    inner: Rc<ThemeData>,
}

#[derive(Debug, Default)]
struct ThemeData {
    /// Sorted by name.
    resources: Vec<(Box<str>, ErasedValue)>,
}

impl Theme {
    /// Returns `true` if the theme has no resources.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.resources.is_empty()
    }

    /// Returns the number of resources.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.resources.len()
    }

    /// Returns the erased resource named `name`.
    #[must_use]
    pub fn get_erased(&self, name: &str) -> Option<&ErasedValue> {
        self.inner
            .resources
            .binary_search_by(|(k, _)| (**k).cmp(name))
            .ok()
            .map(|idx| &self.inner.resources[idx].1)
    }

    /// Returns the resource named `name` if it holds a `T`.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Option<&T> {
        self.get_erased(name)?.downcast_ref()
    }

    /// Returns `true` if a resource named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get_erased(name).is_some()
    }

    /// Returns the resource names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.resources.iter().map(|(k, _)| &**k)
    }

    /// Returns a builder seeded with this theme's resources.
    #[must_use]
    pub fn to_builder(&self) -> ThemeBuilder {
        ThemeBuilder {
            resources: self.inner.resources.clone(),
        }
    }
}

/// Builds a [`Theme`].
#[derive(Clone, Debug, Default)]
pub struct ThemeBuilder {
    resources: Vec<(Box<str>, ErasedValue)>,
}

impl ThemeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a resource, replacing any earlier value with the same name.
    #[must_use]
    pub fn set<T: Clone + 'static>(self, name: &str, value: T) -> Self {
        self.set_erased(name, ErasedValue::new(value))
    }

    /// Sets an already erased resource.
    #[must_use]
    pub fn set_erased(mut self, name: &str, value: ErasedValue) -> Self {
        match self.resources.binary_search_by(|(k, _)| (**k).cmp(name)) {
            Ok(idx) => self.resources[idx].1 = value,
            Err(idx) => self.resources.insert(idx, (name.into(), value)),
        }
        self
    }

    /// Builds the theme.
    #[must_use]
    pub fn build(self) -> Theme {
        Theme {
            inner: Rc::new(ThemeData {
                resources: self.resources,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_theme() {
        let theme = Theme::default();
        assert!(theme.is_empty());
        assert!(!theme.contains("Accent"));
    }

    #[test]
    fn later_set_replaces() {
        let theme = ThemeBuilder::new()
            .set("B", 1.0_f64)
            .set("A", 2_i32)
            .set("B", 3.0_f64)
            .build();
        assert_eq!(theme.len(), 2);
        assert_eq!(theme.get::<f64>("B"), Some(&3.0));
        assert_eq!(theme.names().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn clones_share_storage() {
        let theme = ThemeBuilder::new().set("A", 1_u32).build();
        let clone = theme.clone();
        assert!(Rc::ptr_eq(&theme.inner, &clone.inner));
    }
}
