// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

bitflags::bitflags! {
    /// Passes that must re-run when a property's effective value changes.
    ///
    /// Declared per property through
    /// [`PropertyMetadataBuilder::invalidates`](crate::PropertyMetadataBuilder::invalidates).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Invalidation: u8 {
        /// The element's desired size may change.
        const MEASURE = 0b0000_0001;
        /// The element's position or final size may change.
        const ARRANGE = 0b0000_0010;
        /// Only the rendered output changes.
        const RENDER  = 0b0000_0100;
        /// The element must be re-styled (selector inputs changed).
        const STYLE   = 0b0000_1000;
        /// Measure implies arrange.
        const LAYOUT  = Self::MEASURE.bits() | Self::ARRANGE.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_measure_and_arrange() {
        assert!(Invalidation::LAYOUT.contains(Invalidation::MEASURE));
        assert!(Invalidation::LAYOUT.contains(Invalidation::ARRANGE));
        assert!(!Invalidation::LAYOUT.contains(Invalidation::RENDER));
        assert!(Invalidation::default().is_empty());
    }
}
