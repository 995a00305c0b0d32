// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Animation: easing, keyframe tracks and pooled clocks.
//!
//! - [`Easing`] maps linear progress to eased progress.
//! - [`KeyframeTrack`] samples one property's value over time, using the
//!   property registry to interpolate erased values.
//! - [`Clock`] is a timeline with a [`LoopBehavior`] and a [`ClockState`].
//! - [`ClockPool`] owns clocks, hands out generational [`ClockHandle`]s and
//!   recycles released clocks up to a high watermark.
//!
//! Time never comes from a system clock: callers pass [`Duration`] deltas to
//! [`ClockPool::update`].
//!
//! [`Duration`]: core::time::Duration
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod clock;
mod easing;
mod keyframe;
mod pool;

pub use clock::{Clock, ClockState, LoopBehavior};
pub use easing::{Easing, ParseEasingError, StepPosition, cubic_bezier};
pub use keyframe::{Keyframe, KeyframeOrderError, KeyframeTrack};
pub use pool::{ClockHandle, ClockPool, PoolConfig};
