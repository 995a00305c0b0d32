// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element tiered property storage.
//!
//! # Implementation
//!
//! Entries live in a `SmallVec` sorted by [`PropertyId`] and are found with a
//! binary search. Each entry holds one optional value per [`ValueTier`]; an
//! entry is removed once all of its slots are empty, so elements only pay for
//! the properties that were actually written.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::id::{Property, PropertyId};
use crate::registry::PropertyRegistry;
use crate::value::ErasedValue;

/// Most elements carry only a handful of styled or local values.
const INLINE_CAPACITY: usize = 4;

/// A precedence slot for property values.
///
/// Tiers are ordered: a higher tier wins over every lower one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueTier {
    /// Written by the style cascade from matching rules.
    Styled = 0,
    /// Written by application code.
    Local = 1,
    /// Written by `Set` actions of active triggers.
    Triggered = 2,
    /// Written by running storyboards and tweens.
    Animated = 3,
}

impl ValueTier {
    /// Every tier from highest to lowest precedence.
    pub const BY_PRECEDENCE: [Self; 4] = [Self::Animated, Self::Triggered, Self::Local, Self::Styled];

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

type Slots = [Option<ErasedValue>; 4];

#[derive(Clone, Debug)]
struct Entry {
    id: PropertyId,
    slots: Slots,
}

impl Entry {
    fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Per-element storage for property values, one slot per [`ValueTier`].
///
/// Resolution order is Animated → Triggered → Local → Styled. Inheritance and
/// registry defaults come after that and are handled by
/// [`walk_inherited`](crate::walk_inherited) and
/// [`get_effective`](Self::get_effective).
///
/// # Example
///
/// ```rust
/// use trellis_property::{PropertyMetadataBuilder, PropertyRegistry, PropertyStore, ValueTier};
///
/// let mut registry = PropertyRegistry::new();
/// let width = registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
///
/// let mut store = PropertyStore::new();
/// assert!(store.get(ValueTier::Local, width).is_none());
/// assert_eq!(store.get_effective(width, &registry), 0.0);
///
/// store.set(ValueTier::Triggered, width, 40.0);
/// store.set(ValueTier::Local, width, 100.0);
/// assert_eq!(store.resolve(width.id()).map(|(tier, _)| tier), Some(ValueTier::Triggered));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PropertyStore {
    entries: SmallVec<[Entry; INLINE_CAPACITY]>,
}

impl PropertyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no tier holds any value.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of properties with at least one tier set.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the properties with at least one tier set, in id order.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// Returns the properties with a value in `tier`, in id order.
    pub fn tier_ids(&self, tier: ValueTier) -> impl Iterator<Item = PropertyId> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.slots[tier.slot()].is_some())
            .map(|e| e.id)
    }

    #[inline]
    fn find(&self, id: PropertyId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |e| e.id)
    }

    /// Returns the erased value of `id` in `tier`.
    #[must_use]
    pub fn get_erased(&self, tier: ValueTier, id: PropertyId) -> Option<&ErasedValue> {
        let idx = self.find(id).ok()?;
        self.entries[idx].slots[tier.slot()].as_ref()
    }

    /// Writes an erased value into `tier`, returning the value it replaced.
    ///
    /// The value is stored as given; callers that need coercion or type
    /// checking go through [`PropertyRegistry::coerce`] and
    /// [`PropertyRegistry::accepts`] first.
    pub fn set_erased(
        &mut self,
        tier: ValueTier,
        id: PropertyId,
        value: ErasedValue,
    ) -> Option<ErasedValue> {
        match self.find(id) {
            Ok(idx) => self.entries[idx].slots[tier.slot()].replace(value),
            Err(idx) => {
                let mut slots = Slots::default();
                slots[tier.slot()] = Some(value);
                self.entries.insert(idx, Entry { id, slots });
                None
            }
        }
    }

    /// Clears `id` in `tier`, returning the removed value.
    pub fn clear_erased(&mut self, tier: ValueTier, id: PropertyId) -> Option<ErasedValue> {
        let idx = self.find(id).ok()?;
        let removed = self.entries[idx].slots[tier.slot()].take();
        if self.entries[idx].is_empty() {
            self.entries.remove(idx);
        }
        removed
    }

    /// Clears every value in `tier` and returns the affected properties.
    pub fn clear_tier(&mut self, tier: ValueTier) -> Vec<PropertyId> {
        let mut cleared = Vec::new();
        for entry in &mut self.entries {
            if entry.slots[tier.slot()].take().is_some() {
                cleared.push(entry.id);
            }
        }
        self.entries.retain(|e| !e.is_empty());
        cleared
    }

    /// Returns the highest populated tier of `id` and its value.
    #[must_use]
    pub fn resolve(&self, id: PropertyId) -> Option<(ValueTier, &ErasedValue)> {
        let idx = self.find(id).ok()?;
        let slots = &self.entries[idx].slots;
        ValueTier::BY_PRECEDENCE
            .into_iter()
            .find_map(|tier| slots[tier.slot()].as_ref().map(|v| (tier, v)))
    }

    /// Returns the typed value of `property` in `tier`.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, tier: ValueTier, property: Property<T>) -> Option<&T> {
        self.get_erased(tier, property.id())?.downcast_ref()
    }

    /// Writes a typed value into `tier`.
    pub fn set<T: Clone + 'static>(&mut self, tier: ValueTier, property: Property<T>, value: T) {
        self.set_erased(tier, property.id(), ErasedValue::new(value));
    }

    /// Clears `property` in `tier`, returning `true` if a value was removed.
    pub fn clear<T>(&mut self, tier: ValueTier, property: Property<T>) -> bool {
        self.clear_erased(tier, property.id()).is_some()
    }

    /// Returns the highest-tier typed value, falling back to the registry default.
    ///
    /// Does not consult ancestors; see [`walk_inherited`](crate::walk_inherited).
    ///
    /// # Panics
    ///
    /// Panics if `property` is not registered in `registry`.
    #[must_use]
    pub fn get_effective<T: Clone + 'static>(
        &self,
        property: Property<T>,
        registry: &PropertyRegistry,
    ) -> T {
        if let Some(value) = self
            .resolve(property.id())
            .and_then(|(_, v)| v.downcast_ref::<T>())
        {
            return value.clone();
        }
        registry
            .get_metadata(property)
            .map(|m| m.default_value().clone())
            .unwrap_or_else(|| panic!("property {:?} is not registered", property.id()))
    }

    /// Returns the local value of `property`.
    #[must_use]
    #[inline]
    pub fn get_local<T: Clone + 'static>(&self, property: Property<T>) -> Option<&T> {
        self.get(ValueTier::Local, property)
    }

    /// Writes the local value of `property`.
    #[inline]
    pub fn set_local<T: Clone + 'static>(&mut self, property: Property<T>, value: T) {
        self.set(ValueTier::Local, property, value);
    }

    /// Clears the local value of `property`.
    #[inline]
    pub fn clear_local<T>(&mut self, property: Property<T>) -> bool {
        self.clear(ValueTier::Local, property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PropertyMetadataBuilder;
    use alloc::vec;

    fn setup() -> (PropertyRegistry, Property<f64>, Property<f64>) {
        let mut registry = PropertyRegistry::new();
        let width = registry.register("Width", PropertyMetadataBuilder::styled(10.0_f64).build());
        let height = registry.register("Height", PropertyMetadataBuilder::styled(20.0_f64).build());
        (registry, width, height)
    }

    #[test]
    fn empty_store_uses_default() {
        let (registry, width, _) = setup();
        let store = PropertyStore::new();
        assert!(store.is_empty());
        assert!(store.resolve(width.id()).is_none());
        assert_eq!(store.get_effective(width, &registry), 10.0);
    }

    #[test]
    fn precedence_is_animated_triggered_local_styled() {
        let (registry, width, _) = setup();
        let mut store = PropertyStore::new();

        store.set(ValueTier::Styled, width, 1.0);
        assert_eq!(store.get_effective(width, &registry), 1.0);
        store.set(ValueTier::Local, width, 2.0);
        assert_eq!(store.get_effective(width, &registry), 2.0);
        store.set(ValueTier::Triggered, width, 3.0);
        assert_eq!(store.get_effective(width, &registry), 3.0);
        store.set(ValueTier::Animated, width, 4.0);
        assert_eq!(store.get_effective(width, &registry), 4.0);

        assert!(store.clear(ValueTier::Animated, width));
        assert!(store.clear(ValueTier::Triggered, width));
        assert_eq!(store.resolve(width.id()).map(|(t, _)| t), Some(ValueTier::Local));
        assert!(store.clear_local(width));
        assert_eq!(store.get_effective(width, &registry), 1.0);
    }

    #[test]
    fn entries_removed_when_all_tiers_empty() {
        let (_, width, height) = setup();
        let mut store = PropertyStore::new();
        store.set_local(height, 5.0);
        store.set_local(width, 5.0);
        store.set(ValueTier::Styled, width, 6.0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.property_ids().collect::<Vec<_>>(), vec![width.id(), height.id()]);

        store.clear_local(width);
        assert_eq!(store.len(), 2);
        store.clear(ValueTier::Styled, width);
        assert_eq!(store.len(), 1);
        assert!(!store.clear_local(width));
    }

    #[test]
    fn set_erased_returns_previous() {
        let (_, width, _) = setup();
        let mut store = PropertyStore::new();
        assert!(store.set_erased(ValueTier::Local, width.id(), ErasedValue::new(1.0_f64)).is_none());
        let previous = store
            .set_erased(ValueTier::Local, width.id(), ErasedValue::new(2.0_f64))
            .unwrap();
        assert_eq!(previous.downcast_ref::<f64>(), Some(&1.0));
        assert_eq!(store.get_local(width), Some(&2.0));
    }

    #[test]
    fn clear_tier_reports_cleared_ids() {
        let (_, width, height) = setup();
        let mut store = PropertyStore::new();
        store.set(ValueTier::Animated, width, 1.0);
        store.set(ValueTier::Animated, height, 1.0);
        store.set_local(height, 9.0);

        let cleared = store.clear_tier(ValueTier::Animated);
        assert_eq!(cleared, vec![width.id(), height.id()]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.tier_ids(ValueTier::Local).collect::<Vec<_>>(), vec![height.id()]);
        assert!(store.clear_tier(ValueTier::Animated).is_empty());
    }

    #[test]
    fn wrong_type_reads_as_none() {
        let (_, width, _) = setup();
        let mut store = PropertyStore::new();
        store.set_erased(ValueTier::Local, width.id(), ErasedValue::new(3_i32));
        assert!(store.get_local(width).is_none());
    }
}
