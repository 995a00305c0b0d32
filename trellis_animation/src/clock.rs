// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation clocks.

use core::time::Duration;

/// What a clock does when it reaches its duration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoopBehavior {
    /// Play once, then finish.
    #[default]
    None,
    /// Start over from the beginning.
    Repeat,
    /// Play backwards, then forwards again, indefinitely.
    Reverse,
}

impl LoopBehavior {
    /// Returns `true` if a clock with this behavior never finishes on its own.
    #[must_use]
    #[inline]
    pub fn loops(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Playback state of a [`Clock`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockState {
    /// Not running; elapsed time is zero.
    #[default]
    Stopped,
    /// Advancing on every update.
    Playing,
    /// Holding its current time.
    Paused,
}

/// A timeline that drives one binding.
///
/// `T` identifies what the clock animates. Clocks are created and recycled
/// by [`ClockPool`](crate::ClockPool); the pool hands out handles, not clocks.
#[derive(Clone, Debug)]
pub struct Clock<T> {
    elapsed: Duration,
    duration: Duration,
    loop_behavior: LoopBehavior,
    state: ClockState,
    binding: Option<T>,
}

impl<T> Clock<T> {
    pub(crate) fn idle() -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
            loop_behavior: LoopBehavior::None,
            state: ClockState::Stopped,
            binding: None,
        }
    }

    pub(crate) fn start(&mut self, binding: T, duration: Duration, loop_behavior: LoopBehavior) {
        self.elapsed = Duration::ZERO;
        self.duration = duration;
        self.loop_behavior = loop_behavior;
        self.state = ClockState::Playing;
        self.binding = Some(binding);
    }

    /// Stops the clock, rewinds it and takes its binding.
    pub(crate) fn reset(&mut self) -> Option<T> {
        self.elapsed = Duration::ZERO;
        self.state = ClockState::Stopped;
        self.binding.take()
    }

    /// Advances a playing clock. Returns `true` once a non-looping clock
    /// has reached its end.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        if self.state != ClockState::Playing {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        if !self.loop_behavior.loops() && self.elapsed >= self.duration {
            self.elapsed = self.duration;
            return true;
        }
        false
    }

    pub(crate) fn set_state(&mut self, state: ClockState) {
        self.state = state;
    }

    /// Returns the playback state.
    #[must_use]
    #[inline]
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Returns the total time played, across loops.
    #[must_use]
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the length of one pass.
    #[must_use]
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the loop behavior.
    #[must_use]
    #[inline]
    pub fn loop_behavior(&self) -> LoopBehavior {
        self.loop_behavior
    }

    /// Returns what this clock drives.
    #[must_use]
    #[inline]
    pub fn binding(&self) -> Option<&T> {
        self.binding.as_ref()
    }

    /// Returns `true` once a non-looping clock has played to its end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.loop_behavior.loops() && self.elapsed >= self.duration
    }

    /// Returns the position within one pass, in `[0, 1]`.
    ///
    /// Repeating clocks wrap; reversing clocks run back down on odd passes.
    /// A zero-length clock reports `1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let duration = self.duration.as_secs_f64();
        if duration <= 0.0 {
            return 1.0;
        }
        let elapsed = self.elapsed.as_secs_f64();
        match self.loop_behavior {
            LoopBehavior::None => (elapsed / duration).min(1.0),
            LoopBehavior::Repeat => (elapsed % duration) / duration,
            LoopBehavior::Reverse => {
                let period = 2.0 * duration;
                let phase = elapsed % period;
                if phase <= duration {
                    phase / duration
                } else {
                    (period - phase) / duration
                }
            }
        }
    }

    /// Returns the current position on the timeline, `progress() * duration()`.
    #[must_use]
    pub fn position(&self) -> Duration {
        self.duration.mul_f64(self.progress())
    }
}
