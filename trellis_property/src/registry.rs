// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property registry.
//!
//! [`PropertyRegistry`] owns every property's metadata and exposes it both
//! typed (through [`Property<T>`]) and erased (through [`PropertyId`]) so that
//! the style engine can parse, interpolate and compare values it only knows
//! by name.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cmp::Ordering;
use core::fmt;
use hashbrown::HashMap;

use crate::id::{Property, PropertyId};
use crate::invalidation::Invalidation;
use crate::metadata::PropertyMetadata;
use crate::value::ErasedValue;

/// A registration entry for a property.
pub struct PropertyRegistration {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    default: ErasedValue,
    metadata: Box<dyn ErasedMetadata>,
}

impl PropertyRegistration {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the [`TypeId`] of the property's value type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust name of the property's value type.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the default value, erased.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &ErasedValue {
        &self.default
    }

    /// Returns the passes invalidated by this property.
    #[must_use]
    #[inline]
    pub fn invalidates(&self) -> Invalidation {
        self.metadata.invalidates()
    }

    /// Returns whether this property inherits from ancestors.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.metadata.inherits()
    }

    /// Returns whether style sheets may set this property.
    #[must_use]
    #[inline]
    pub fn is_styleable(&self) -> bool {
        self.metadata.is_styleable()
    }

    /// Returns whether this property may be animated.
    #[must_use]
    #[inline]
    pub fn is_animatable(&self) -> bool {
        self.metadata.is_animatable()
    }
}

impl fmt::Debug for PropertyRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistration")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("inherits", &self.inherits())
            .field("invalidates", &self.invalidates())
            .finish_non_exhaustive()
    }
}

/// A registry for dependency properties.
///
/// Properties are registered once at startup; afterwards the registry is
/// shared read-only by stores, sheets and the presentation.
///
/// # Example
///
/// ```rust
/// use trellis_property::{Invalidation, PropertyMetadataBuilder, PropertyRegistry};
///
/// let mut registry = PropertyRegistry::new();
/// let width = registry.register(
///     "Width",
///     PropertyMetadataBuilder::styled(0.0_f64)
///         .invalidates(Invalidation::MEASURE)
///         .build(),
/// );
///
/// assert_eq!(registry.name(width.id()), Some("Width"));
/// assert!(registry.invalidates(width.id()).contains(Invalidation::MEASURE));
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    properties: Vec<PropertyRegistration>,
    by_name: HashMap<&'static str, PropertyId>,
}

impl PropertyRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property and returns its typed handle.
    ///
    /// # Panics
    ///
    /// Panics if a property with the same name is already registered,
    /// or if more than 65,535 properties are registered.
    pub fn register<T: Clone + 'static>(
        &mut self,
        name: &'static str,
        metadata: PropertyMetadata<T>,
    ) -> Property<T> {
        assert!(
            !self.by_name.contains_key(name),
            "Property '{name}' is already registered"
        );
        assert!(
            self.properties.len() < u16::MAX as usize,
            "Too many properties registered (max {})",
            u16::MAX
        );

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.properties.len() as u16);

        self.properties.push(PropertyRegistration {
            name,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            default: ErasedValue::new(metadata.default_value().clone()),
            metadata: Box::new(metadata),
        });
        self.by_name.insert(name, id);

        Property::from_id(id)
    }

    /// Returns the number of registered properties.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if no properties are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    /// Returns the name of a property.
    #[must_use]
    pub fn name(&self, id: PropertyId) -> Option<&'static str> {
        self.get(id).map(PropertyRegistration::name)
    }

    /// Returns the registration for a property.
    #[must_use]
    #[inline]
    pub fn get(&self, id: PropertyId) -> Option<&PropertyRegistration> {
        self.properties.get(id.slot())
    }

    /// Returns the passes invalidated by a property, empty if unregistered.
    #[must_use]
    pub fn invalidates(&self, id: PropertyId) -> Invalidation {
        self.get(id)
            .map(PropertyRegistration::invalidates)
            .unwrap_or_default()
    }

    /// Returns whether a property inherits from ancestors.
    #[must_use]
    pub fn inherits(&self, id: PropertyId) -> bool {
        self.get(id).is_some_and(PropertyRegistration::inherits)
    }

    /// Returns whether a property may be set from a style sheet.
    #[must_use]
    pub fn is_styleable(&self, id: PropertyId) -> bool {
        self.get(id).is_some_and(PropertyRegistration::is_styleable)
    }

    /// Returns whether a property may be animated.
    #[must_use]
    pub fn is_animatable(&self, id: PropertyId) -> bool {
        self.get(id).is_some_and(PropertyRegistration::is_animatable)
    }

    /// Returns whether `value` has the type `id` was registered with.
    #[must_use]
    pub fn accepts(&self, id: PropertyId, value: &ErasedValue) -> bool {
        self.get(id).is_some_and(|r| r.type_id == value.type_id())
    }

    /// Returns the erased default value of a property.
    #[must_use]
    pub fn default_value(&self, id: PropertyId) -> Option<&ErasedValue> {
        self.get(id).map(PropertyRegistration::default_value)
    }

    /// Returns the metadata for a typed property.
    ///
    /// Returns `None` if the property is not registered or the type doesn't match.
    #[must_use]
    pub fn get_metadata<T: Clone + 'static>(
        &self,
        property: Property<T>,
    ) -> Option<&PropertyMetadata<T>> {
        self.get(property.id())
            .and_then(|r| r.metadata.as_any().downcast_ref())
    }

    /// Parses a style literal for a property.
    ///
    /// Returns `None` when the property is unknown, not styleable, or the
    /// text does not parse.
    #[must_use]
    pub fn parse_value(&self, id: PropertyId, text: &str) -> Option<ErasedValue> {
        self.get(id)?.metadata.parse_erased(text)
    }

    /// Interpolates between two erased values of a property.
    ///
    /// Returns `None` when the property is not animatable or either value has
    /// the wrong type.
    #[must_use]
    pub fn interpolate(
        &self,
        id: PropertyId,
        from: &ErasedValue,
        to: &ErasedValue,
        t: f64,
    ) -> Option<ErasedValue> {
        self.get(id)?.metadata.interpolate_erased(from, to, t)
    }

    /// Compares two erased values of a property.
    #[must_use]
    pub fn compare(&self, id: PropertyId, a: &ErasedValue, b: &ErasedValue) -> Option<Ordering> {
        self.get(id)?.metadata.compare_erased(a, b)
    }

    /// Returns `true` when both values are known to be equal.
    ///
    /// Values of properties without style hooks are never considered equal.
    #[must_use]
    pub fn values_equal(&self, id: PropertyId, a: &ErasedValue, b: &ErasedValue) -> bool {
        self.compare(id, a, b) == Some(Ordering::Equal)
    }

    /// Applies the property's coerce callback to an erased value.
    ///
    /// Values of the wrong type pass through unchanged.
    #[must_use]
    pub fn coerce(&self, id: PropertyId, value: ErasedValue) -> ErasedValue {
        match self.get(id) {
            Some(r) => r.metadata.coerce_erased(value),
            None => value,
        }
    }

    /// Returns an iterator over all registered properties.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyRegistration)> {
        self.properties.iter().enumerate().map(|(i, r)| {
            #[expect(clippy::cast_possible_truncation, reason = "index < len < u16::MAX")]
            (PropertyId::new(i as u16), r)
        })
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("count", &self.properties.len())
            .field(
                "properties",
                &self.properties.iter().map(|r| r.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Object-safe view of a [`PropertyMetadata<T>`] for heterogeneous storage.
trait ErasedMetadata: Any {
    fn as_any(&self) -> &dyn Any;
    fn invalidates(&self) -> Invalidation;
    fn inherits(&self) -> bool;
    fn is_styleable(&self) -> bool;
    fn is_animatable(&self) -> bool;
    fn parse_erased(&self, text: &str) -> Option<ErasedValue>;
    fn interpolate_erased(
        &self,
        from: &ErasedValue,
        to: &ErasedValue,
        t: f64,
    ) -> Option<ErasedValue>;
    fn compare_erased(&self, a: &ErasedValue, b: &ErasedValue) -> Option<Ordering>;
    fn coerce_erased(&self, value: ErasedValue) -> ErasedValue;
}

impl<T: Clone + 'static> ErasedMetadata for PropertyMetadata<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn invalidates(&self) -> Invalidation {
        Self::invalidates(self)
    }

    fn inherits(&self) -> bool {
        Self::inherits(self)
    }

    fn is_styleable(&self) -> bool {
        Self::is_styleable(self)
    }

    fn is_animatable(&self) -> bool {
        Self::is_animatable(self)
    }

    fn parse_erased(&self, text: &str) -> Option<ErasedValue> {
        self.parse(text)
            .map(|value| ErasedValue::new(self.coerce(value)))
    }

    fn interpolate_erased(
        &self,
        from: &ErasedValue,
        to: &ErasedValue,
        t: f64,
    ) -> Option<ErasedValue> {
        let from = from.downcast_ref::<T>()?;
        let to = to.downcast_ref::<T>()?;
        self.interpolate(from, to, t).map(ErasedValue::new)
    }

    fn compare_erased(&self, a: &ErasedValue, b: &ErasedValue) -> Option<Ordering> {
        self.compare(a.downcast_ref::<T>()?, b.downcast_ref::<T>()?)
    }

    fn coerce_erased(&self, value: ErasedValue) -> ErasedValue {
        if !self.has_coerce_callback() {
            return value;
        }
        match value.downcast::<T>() {
            Ok(typed) => ErasedValue::new(self.coerce(typed)),
            Err(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PropertyMetadataBuilder;
    use alloc::{format, vec, vec::Vec};

    #[test]
    fn registry_new() {
        let registry = PropertyRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let mut registry = PropertyRegistry::new();
        let width = registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
        let height = registry.register("Height", PropertyMetadataBuilder::styled(0.0_f64).build());
        assert_eq!(width.id().index(), 0);
        assert_eq!(height.id().index(), 1);
        assert_eq!(registry.by_name("Height"), Some(height.id()));
        assert_eq!(registry.by_name("Depth"), None);
        assert_eq!(registry.name(PropertyId::new(999)), None);
    }

    #[test]
    fn flags_come_from_metadata() {
        let mut registry = PropertyRegistry::new();
        let font_size = registry.register(
            "FontSize",
            PropertyMetadataBuilder::styled(12.0_f64)
                .inherits(true)
                .invalidates(Invalidation::LAYOUT)
                .build(),
        );
        let tag = registry.register("Tag", PropertyMetadataBuilder::new(0_u64).build());

        assert!(registry.inherits(font_size.id()));
        assert!(registry.invalidates(font_size.id()).contains(Invalidation::ARRANGE));
        assert!(registry.is_styleable(font_size.id()));
        assert!(!registry.inherits(tag.id()));
        assert!(!registry.is_styleable(tag.id()));
        assert!(!registry.is_animatable(tag.id()));
        assert!(registry.invalidates(PropertyId::new(42)).is_empty());
    }

    #[test]
    fn erased_hooks_round_trip_through_registry() {
        let mut registry = PropertyRegistry::new();
        let opacity = registry.register(
            "Opacity",
            PropertyMetadataBuilder::styled(1.0_f64)
                .coerce(|v| v.clamp(0.0, 1.0))
                .build(),
        )
        .id();

        let parsed = registry.parse_value(opacity, "2").unwrap();
        assert_eq!(parsed.downcast_ref::<f64>(), Some(&1.0));
        assert!(registry.parse_value(opacity, "lots").is_none());

        let from = ErasedValue::new(0.0_f64);
        let to = ErasedValue::new(1.0_f64);
        let mid = registry.interpolate(opacity, &from, &to, 0.5).unwrap();
        assert_eq!(mid.downcast_ref::<f64>(), Some(&0.5));
        assert_eq!(registry.compare(opacity, &from, &to), Some(Ordering::Less));
        assert!(registry.values_equal(opacity, &to, &to.clone()));

        let wrong = ErasedValue::new(1_i32);
        assert!(registry.interpolate(opacity, &from, &wrong, 0.5).is_none());
        assert!(!registry.accepts(opacity, &wrong));
        assert!(registry.accepts(opacity, &from));

        let coerced = registry.coerce(opacity, ErasedValue::new(-3.0_f64));
        assert_eq!(coerced.downcast_ref::<f64>(), Some(&0.0));
    }

    #[test]
    fn typed_metadata_lookup() {
        let mut registry = PropertyRegistry::new();
        let width = registry.register("Width", PropertyMetadataBuilder::styled(100.0_f64).build());
        let metadata = registry.get_metadata(width).unwrap();
        assert_eq!(metadata.default_value(), &100.0);
        let wrong: Property<i32> = Property::from_id(width.id());
        assert!(registry.get_metadata(wrong).is_none());
        assert_eq!(
            registry.default_value(width.id()).and_then(|v| v.downcast_ref::<f64>()),
            Some(&100.0)
        );
    }

    #[test]
    fn iter_in_registration_order() {
        let mut registry = PropertyRegistry::new();
        registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
        registry.register("Height", PropertyMetadataBuilder::styled(0.0_f64).build());
        let names: Vec<_> = registry.iter().map(|(_, r)| r.name()).collect();
        assert_eq!(names, vec!["Width", "Height"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_name_panics() {
        let mut registry = PropertyRegistry::new();
        registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
        registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
    }

    #[test]
    fn debug_lists_names() {
        let mut registry = PropertyRegistry::new();
        registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
        let debug = format!("{registry:?}");
        assert!(debug.contains("PropertyRegistry"));
        assert!(debug.contains("Width"));
    }
}
