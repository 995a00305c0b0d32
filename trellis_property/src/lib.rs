// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Property: dependency properties with tiered value storage.
//!
//! This crate is the bottom layer of the Trellis style engine. It answers
//! "which value does this property have on this element right now?" without
//! knowing anything about selectors, style sheets or layout.
//!
//! ## Core Concepts
//!
//! ### Registration
//!
//! Properties are registered once in a [`PropertyRegistry`], which hands back a
//! typed [`Property<T>`] handle. The registry also keeps the metadata that the
//! higher layers need to work with values they only know by name:
//!
//! - a default value,
//! - whether the property inherits down the tree,
//! - which passes a change [invalidates](Invalidation),
//! - hooks to parse, interpolate and compare values (installed from
//!   [`StyleValue`] by [`PropertyMetadataBuilder::styled`]).
//!
//! ### Tiered storage
//!
//! [`PropertyStore`] keeps, per property, one slot per [`ValueTier`]. The
//! effective value is the highest populated slot:
//!
//! **Animated → Triggered → Local → Styled → (Inherited) → Default**
//!
//! ```rust
//! use trellis_property::{PropertyMetadataBuilder, PropertyRegistry, PropertyStore, ValueTier};
//!
//! let mut registry = PropertyRegistry::new();
//! let width = registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
//!
//! let mut store = PropertyStore::new();
//! store.set(ValueTier::Styled, width, 80.0);
//! store.set(ValueTier::Local, width, 100.0);
//! assert_eq!(store.get_effective(width, &registry), 100.0);
//!
//! store.set(ValueTier::Animated, width, 150.0);
//! assert_eq!(store.get_effective(width, &registry), 150.0);
//!
//! store.clear(ValueTier::Animated, width);
//! store.clear(ValueTier::Local, width);
//! assert_eq!(store.get_effective(width, &registry), 80.0);
//! ```
//!
//! ### Working by name
//!
//! Style sheets refer to properties by name and carry values as text. The
//! registry turns both into erased handles and values:
//!
//! ```rust
//! use trellis_property::{PropertyMetadataBuilder, PropertyRegistry};
//!
//! let mut registry = PropertyRegistry::new();
//! registry.register("Opacity", PropertyMetadataBuilder::styled(1.0_f64).build());
//!
//! let id = registry.by_name("Opacity").unwrap();
//! let half = registry.parse_value(id, "0.5").unwrap();
//! assert_eq!(half.downcast_ref::<f64>(), Some(&0.5));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Enable the `libm` feature instead
//! of `std` to build without the standard library.

#![no_std]

extern crate alloc;

mod id;
mod inherit;
mod invalidation;
mod metadata;
mod registry;
mod store;
mod value;

pub use id::{Property, PropertyId};
pub use inherit::{ParentLookup, walk_inherited, walk_inherited_erased};
pub use invalidation::Invalidation;
pub use metadata::{CoerceValueCallback, PropertyMetadata, PropertyMetadataBuilder};
pub use registry::{PropertyRegistration, PropertyRegistry};
pub use store::{PropertyStore, ValueTier};
pub use value::{ErasedValue, StyleValue};
