// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The asset-loading collaborator.

use trellis_property::{ErasedValue, PropertyId};

/// Loading an asset failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// No asset has this id.
    #[error("asset `{0}` not found")]
    NotFound(Box<str>),
    /// The asset exists but could not be turned into a value.
    #[error("asset `{asset}` failed to load: {message}")]
    Failed {
        /// The asset id.
        asset: Box<str>,
        /// Loader-specific detail.
        message: Box<str>,
    },
}

/// Loads assets referenced by style setters.
///
/// Called synchronously during the cascade. The returned value must have the
/// property's registered type; otherwise the setter is skipped with a
/// diagnostic.
pub trait AssetLoader {
    /// Loads `asset` for `property`.
    fn load(&self, property: PropertyId, asset: &str) -> Result<ErasedValue, AssetError>;
}

impl<F> AssetLoader for F
where
    F: Fn(PropertyId, &str) -> Result<ErasedValue, AssetError>,
{
    fn load(&self, property: PropertyId, asset: &str) -> Result<ErasedValue, AssetError> {
        self(property, asset)
    }
}
