// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyframe tracks.

use alloc::vec::Vec;
use core::time::Duration;

use trellis_property::{ErasedValue, PropertyId, PropertyRegistry};

use crate::easing::Easing;

/// One point on a [`KeyframeTrack`].
///
/// `easing` shapes the segment that ends at this keyframe.
#[derive(Clone, Debug)]
pub struct Keyframe {
    /// Offset from the start of the storyboard.
    pub time: Duration,
    /// Value reached at `time`.
    pub value: ErasedValue,
    /// Curve used while approaching `value`.
    pub easing: Easing,
}

impl Keyframe {
    /// Creates a keyframe.
    #[must_use]
    pub fn new(time: Duration, value: ErasedValue, easing: Easing) -> Self {
        Self {
            time,
            value,
            easing,
        }
    }
}

/// Keyframe times were not in ascending order.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("keyframes are not in time order")]
pub struct KeyframeOrderError;

/// The animated values of one property over time.
///
/// # Example
///
/// ```rust
/// use core::time::Duration;
/// use trellis_animation::{Easing, Keyframe, KeyframeTrack};
/// use trellis_property::{ErasedValue, PropertyMetadataBuilder, PropertyRegistry};
///
/// let mut registry = PropertyRegistry::new();
/// let width = registry.register("Width", PropertyMetadataBuilder::styled(0.0_f64).build());
///
/// let track = KeyframeTrack::new(
///     width.id(),
///     vec![Keyframe::new(Duration::from_secs(1), ErasedValue::new(100.0_f64), Easing::Linear)],
/// )
/// .unwrap();
///
/// let base = ErasedValue::new(0.0_f64);
/// let half = track.sample(Duration::from_millis(500), &base, &registry).unwrap();
/// assert_eq!(half.downcast_ref::<f64>(), Some(&50.0));
/// ```
#[derive(Clone, Debug)]
pub struct KeyframeTrack {
    property: PropertyId,
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    /// Creates a track; keyframe times must be non-decreasing.
    pub fn new(property: PropertyId, keyframes: Vec<Keyframe>) -> Result<Self, KeyframeOrderError> {
        if keyframes.windows(2).any(|w| w[1].time < w[0].time) {
            return Err(KeyframeOrderError);
        }
        Ok(Self {
            property,
            keyframes,
        })
    }

    /// Returns the animated property.
    #[must_use]
    #[inline]
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// Returns the keyframes in time order.
    #[must_use]
    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Returns the time of the last keyframe.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.keyframes.last().map_or(Duration::ZERO, |k| k.time)
    }

    /// Samples the track at `time`.
    ///
    /// Before the first keyframe the value blends from `base` (the property's
    /// value without this animation). After the last keyframe the last value
    /// holds. Returns `None` for an empty track or when the registry cannot
    /// interpolate the values.
    #[must_use]
    pub fn sample(
        &self,
        time: Duration,
        base: &ErasedValue,
        registry: &PropertyRegistry,
    ) -> Option<ErasedValue> {
        let next = self.keyframes.partition_point(|k| k.time <= time);
        if next == self.keyframes.len() {
            return self.keyframes.last().map(|k| k.value.clone());
        }
        let to = &self.keyframes[next];
        let (from_time, from_value) = match next.checked_sub(1) {
            Some(prev) => (self.keyframes[prev].time, &self.keyframes[prev].value),
            None => (Duration::ZERO, base),
        };
        let span = to.time.saturating_sub(from_time).as_secs_f64();
        if span <= 0.0 {
            return Some(to.value.clone());
        }
        let linear = time.saturating_sub(from_time).as_secs_f64() / span;
        registry.interpolate(self.property, from_value, &to.value, to.easing.apply(linear))
    }
}
