// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pooled clock scheduling.
//!
//! [`ClockPool`] owns every clock. A clock moves Free → Active on
//! [`retrieve`](ClockPool::retrieve) and Active → Free on
//! [`release`](ClockPool::release) (explicit, or automatic when a
//! non-looping clock finishes during [`update`](ClockPool::update)). Released
//! clocks are kept for reuse until the pool holds `high_watermark` of them;
//! beyond that they are dropped.

use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use crate::clock::{Clock, ClockState, LoopBehavior};

/// Sizing for a [`ClockPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Free clocks allocated up front.
    pub initial_capacity: usize,
    /// Maximum number of free clocks kept for reuse.
    pub high_watermark: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            high_watermark: 64,
        }
    }
}

/// A generational handle to an active clock.
///
/// Handles go stale when their clock is released; stale handles are ignored
/// by every pool operation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockHandle {
    index: u32,
    generation: u32,
}

impl fmt::Debug for ClockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockHandle({}v{})", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    clock: Option<Clock<T>>,
}

/// A pool of reusable animation clocks.
///
/// `T` is the binding each clock drives; it is handed back when the clock is
/// released.
///
/// # Example
///
/// ```rust
/// use core::time::Duration;
/// use trellis_animation::{ClockPool, LoopBehavior, PoolConfig};
///
/// let mut pool = ClockPool::new(PoolConfig { initial_capacity: 2, high_watermark: 4 });
/// let fade = pool.retrieve("fade", Duration::from_millis(100), LoopBehavior::None);
/// assert_eq!(pool.active_count(), 1);
/// assert_eq!(pool.available_count(), 1);
///
/// let done = pool.update(Duration::from_millis(150));
/// assert_eq!(done, vec![(fade, "fade")]);
/// assert_eq!(pool.active_count(), 0);
/// assert_eq!(pool.available_count(), 2);
/// ```
pub struct ClockPool<T> {
    config: PoolConfig,
    slots: Vec<Slot<T>>,
    free_slots: Vec<u32>,
    available: Vec<Clock<T>>,
    active: usize,
}

impl<T> ClockPool<T> {
    /// Creates a pool and preallocates `initial_capacity` free clocks, capped
    /// at the high watermark.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let mut available = Vec::with_capacity(config.high_watermark);
        let preallocated = config.initial_capacity.min(config.high_watermark);
        available.extend((0..preallocated).map(|_| Clock::idle()));
        Self {
            config,
            slots: Vec::new(),
            free_slots: Vec::new(),
            available,
            active: 0,
        }
    }

    /// Returns the pool's configuration.
    #[must_use]
    #[inline]
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Returns the number of clocks currently handed out.
    #[must_use]
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Returns the number of free clocks held for reuse.
    #[must_use]
    #[inline]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Starts a clock for `binding` and returns its handle.
    ///
    /// Reuses a free clock when one is held; otherwise allocates.
    pub fn retrieve(
        &mut self,
        binding: T,
        duration: Duration,
        loop_behavior: LoopBehavior,
    ) -> ClockHandle {
        let mut clock = match self.available.pop() {
            Some(clock) => clock,
            None => {
                tracing::trace!(active = self.active, "clock pool empty, allocating");
                Clock::idle()
            }
        };
        clock.start(binding, duration, loop_behavior);

        let handle = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.clock = Some(clock);
                ClockHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    clock: Some(clock),
                });
                ClockHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.active += 1;
        tracing::trace!(?handle, ?duration, "clock retrieved");
        handle
    }

    /// Stops and returns a clock to the pool, handing back its binding.
    ///
    /// Returns `None` for stale handles, so releasing twice is harmless.
    pub fn release(&mut self, handle: ClockHandle) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let mut clock = slot.clock.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index);
        self.active -= 1;

        let binding = clock.reset();
        if self.available.len() < self.config.high_watermark {
            self.available.push(clock);
            tracing::trace!(?handle, "clock released to pool");
        } else {
            tracing::trace!(?handle, "clock released past high watermark, dropped");
        }
        binding
    }

    /// Advances every playing clock by `dt`.
    ///
    /// Non-looping clocks that reach their end are released; their handles
    /// and bindings are returned in handle order.
    pub fn update(&mut self, dt: Duration) -> Vec<(ClockHandle, T)> {
        let mut finished = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(clock) = &mut slot.clock
                && clock.advance(dt)
            {
                finished.push(ClockHandle {
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    generation: slot.generation,
                });
            }
        }
        finished
            .into_iter()
            .filter_map(|handle| self.release(handle).map(|binding| (handle, binding)))
            .collect()
    }

    /// Pauses a playing clock. Returns `false` for stale handles.
    pub fn pause(&mut self, handle: ClockHandle) -> bool {
        self.transition(handle, ClockState::Playing, ClockState::Paused)
    }

    /// Resumes a paused clock. Returns `false` for stale handles.
    pub fn resume(&mut self, handle: ClockHandle) -> bool {
        self.transition(handle, ClockState::Paused, ClockState::Playing)
    }

    fn transition(&mut self, handle: ClockHandle, from: ClockState, to: ClockState) -> bool {
        let Some(clock) = self.clock_mut(handle) else {
            return false;
        };
        if clock.state() == from {
            clock.set_state(to);
        }
        true
    }

    /// Returns the clock behind a handle.
    #[must_use]
    pub fn get(&self, handle: ClockHandle) -> Option<&Clock<T>> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.clock.as_ref()
    }

    /// Returns `true` if `handle` refers to an active clock.
    #[must_use]
    pub fn contains(&self, handle: ClockHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the state of a clock; stale handles read as stopped.
    #[must_use]
    pub fn state(&self, handle: ClockHandle) -> ClockState {
        self.get(handle).map_or(ClockState::Stopped, Clock::state)
    }

    /// Returns the total time a clock has played.
    #[must_use]
    pub fn elapsed(&self, handle: ClockHandle) -> Option<Duration> {
        self.get(handle).map(Clock::elapsed)
    }

    /// Returns the position of a clock within one pass, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, handle: ClockHandle) -> Option<f64> {
        self.get(handle).map(Clock::progress)
    }

    /// Returns the handles and bindings of every active clock, in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (ClockHandle, &Clock<T>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let clock = slot.clock.as_ref()?;
            Some((
                ClockHandle {
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    generation: slot.generation,
                },
                clock,
            ))
        })
    }

    /// Releases every active clock and returns their bindings.
    pub fn clear(&mut self) -> Vec<T> {
        let handles: Vec<_> = self.iter().map(|(handle, _)| handle).collect();
        handles
            .into_iter()
            .filter_map(|handle| self.release(handle))
            .collect()
    }

    fn slot_mut(&mut self, handle: ClockHandle) -> Option<&mut Slot<T>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        (slot.generation == handle.generation).then_some(slot)
    }

    fn clock_mut(&mut self, handle: ClockHandle) -> Option<&mut Clock<T>> {
        self.slot_mut(handle)?.clock.as_mut()
    }
}

impl<T> Default for ClockPool<T> {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl<T> fmt::Debug for ClockPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockPool")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("available", &self.available.len())
            .finish_non_exhaustive()
    }
}
