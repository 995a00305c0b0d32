// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Storyboard declarations.

use alloc::boxed::Box;
use core::time::Duration;

use trellis_animation::{KeyframeTrack, LoopBehavior};

use crate::selector::Selector;

/// A group of keyframe tracks applied to the elements a selector finds.
#[derive(Clone, Debug)]
pub struct StoryboardTarget {
    selector: Option<Selector>,
    tracks: Box<[KeyframeTrack]>,
}

impl StoryboardTarget {
    pub(crate) fn new(selector: Option<Selector>, tracks: Box<[KeyframeTrack]>) -> Self {
        Self { selector, tracks }
    }

    /// Returns the target selector.
    ///
    /// `None` targets the element the storyboard plays on. Otherwise the
    /// selector is resolved with that element as the trigger root.
    #[must_use]
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    /// Returns one track per animated property.
    #[must_use]
    pub fn tracks(&self) -> &[KeyframeTrack] {
        &self.tracks
    }
}

/// A named animation declared in a style sheet.
#[derive(Clone, Debug)]
pub struct Storyboard {
    name: Box<str>,
    loop_behavior: LoopBehavior,
    targets: Box<[StoryboardTarget]>,
    duration: Duration,
}

impl Storyboard {
    pub(crate) fn new(
        name: Box<str>,
        loop_behavior: LoopBehavior,
        targets: Box<[StoryboardTarget]>,
    ) -> Self {
        let duration = targets
            .iter()
            .flat_map(|target| target.tracks.iter())
            .map(KeyframeTrack::duration)
            .max()
            .unwrap_or(Duration::ZERO);
        Self {
            name,
            loop_behavior,
            targets,
            duration,
        }
    }

    /// Returns the storyboard's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns what happens when playback reaches the end.
    #[must_use]
    #[inline]
    pub fn loop_behavior(&self) -> LoopBehavior {
        self.loop_behavior
    }

    /// Returns the targets in declaration order.
    #[must_use]
    pub fn targets(&self) -> &[StoryboardTarget] {
        &self.targets
    }

    /// Returns the time of the latest keyframe of any track.
    #[must_use]
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
