// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value inheritance along a parent chain.

use crate::id::{Property, PropertyId};
use crate::store::PropertyStore;
use crate::value::ErasedValue;

/// Parent-chain access for inheritance.
///
/// Given a key, returns its store and the key of its parent. Closures of the
/// right shape implement this trait.
pub trait ParentLookup<'a, K: Copy + 'a> {
    /// Looks up the store and parent key for `key`.
    fn lookup(&self, key: K) -> Option<(&'a PropertyStore, Option<K>)>;
}

impl<'a, K, F> ParentLookup<'a, K> for F
where
    K: Copy + 'a,
    F: Fn(K) -> Option<(&'a PropertyStore, Option<K>)>,
{
    #[inline]
    fn lookup(&self, key: K) -> Option<(&'a PropertyStore, Option<K>)> {
        self(key)
    }
}

/// Walks up from `start` and returns the first resolved value of `id`.
///
/// At each ancestor the highest populated tier wins. Returns `None` when no
/// ancestor has the property set, in which case the registry default applies.
///
/// # Example
///
/// ```rust
/// use trellis_property::{
///     PropertyMetadataBuilder, PropertyRegistry, PropertyStore, ValueTier, walk_inherited,
/// };
///
/// let mut registry = PropertyRegistry::new();
/// let font = registry.register(
///     "FontSize",
///     PropertyMetadataBuilder::styled(12.0_f64).inherits(true).build(),
/// );
///
/// let mut stores = vec![PropertyStore::new(), PropertyStore::new(), PropertyStore::new()];
/// stores[0].set(ValueTier::Styled, font, 18.0);
/// let parents = [None, Some(0_usize), Some(1)];
///
/// let lookup = |key: usize| Some((&stores[key], parents[key]));
/// assert_eq!(walk_inherited(parents[2], font, &lookup), Some(18.0));
/// assert_eq!(walk_inherited(parents[0], font, &lookup), None);
/// ```
pub fn walk_inherited<'a, K, T, F>(start: Option<K>, property: Property<T>, lookup: &F) -> Option<T>
where
    K: Copy + 'a,
    T: Clone + 'static,
    F: ParentLookup<'a, K> + ?Sized,
{
    walk_inherited_erased(start, property.id(), lookup)?
        .downcast_ref::<T>()
        .cloned()
}

/// Erased variant of [`walk_inherited`].
pub fn walk_inherited_erased<'a, K, F>(
    mut current: Option<K>,
    id: PropertyId,
    lookup: &F,
) -> Option<&'a ErasedValue>
where
    K: Copy + 'a,
    F: ParentLookup<'a, K> + ?Sized,
{
    while let Some(key) = current {
        let (store, parent) = lookup.lookup(key)?;
        if let Some((_, value)) = store.resolve(id) {
            return Some(value);
        }
        current = parent;
    }
    None
}
