// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Storyboard playback and per-property tweens.
//!
//! Every running storyboard instance and tween owns one pooled clock. The
//! clock's binding names what it drives, so completion reported by
//! [`ClockPool::update`] can be routed back to the right view.
//!
//! Sampled values go to the animated tier. A finished tween holds its final
//! value. When a storyboard or tween lets go of a property, the slot passes
//! to a running tween, then to another playing storyboard, then to a held
//! tween value, and is cleared when nothing is left.

use core::fmt;
use core::time::Duration;
use std::rc::Rc;

use hashbrown::HashMap;
use trellis_animation::{Clock, ClockHandle, ClockPool, Easing, LoopBehavior};
use trellis_property::{ErasedValue, PropertyId, ValueTier};
use trellis_style::{Selector, StyleSheet, Storyboard};

use crate::error::TreeError;
use crate::presentation::ViewId;
use crate::tree::NodeId;
use crate::view::View;

/// Storyboards a view can play, by name.
///
/// Replacing the view's style sheet registers the sheet's storyboards here.
/// Names are resolved when a storyboard is begun, so storyboards registered
/// later are found by triggers compiled earlier.
#[derive(Clone, Default)]
pub struct StoryboardRegistry {
    by_name: HashMap<Box<str>, Rc<Storyboard>>,
}

impl fmt::Debug for StoryboardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

impl StoryboardRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered storyboards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Looks up a storyboard by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Storyboard> {
        self.by_name.get(name).map(|s| &**s)
    }

    pub(crate) fn find_shared(&self, name: &str) -> Option<Rc<Storyboard>> {
        self.by_name.get(name).cloned()
    }

    /// Registers a storyboard, returning the one it replaced.
    pub fn register(&mut self, storyboard: Rc<Storyboard>) -> Option<Rc<Storyboard>> {
        self.by_name.insert(storyboard.name().into(), storyboard)
    }

    /// Registers every storyboard of `sheet`.
    pub fn register_sheet(&mut self, sheet: &StyleSheet) {
        for storyboard in sheet.storyboards() {
            self.register(storyboard.clone());
        }
    }

    /// Removes a storyboard. Running instances keep playing.
    pub fn remove(&mut self, name: &str) -> Option<Rc<Storyboard>> {
        self.by_name.remove(name)
    }

    /// Iterates the registered names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(|k| &**k)
    }
}

/// What a pooled clock drives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClockBinding {
    /// A storyboard playing on an element.
    Storyboard {
        /// The view the element belongs to.
        view: ViewId,
        /// The element the storyboard was begun on.
        element: NodeId,
        /// The storyboard name.
        storyboard: Box<str>,
    },
    /// A tween of one property.
    Tween {
        /// The view the node belongs to.
        view: ViewId,
        /// The animated node.
        node: NodeId,
        /// The animated property.
        property: PropertyId,
    },
}

impl ClockBinding {
    /// The view the clock belongs to.
    #[must_use]
    pub fn view(&self) -> ViewId {
        match self {
            Self::Storyboard { view, .. } | Self::Tween { view, .. } => *view,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct InstanceKey {
    pub(crate) element: NodeId,
    pub(crate) storyboard: Box<str>,
}

impl InstanceKey {
    pub(crate) fn new(element: NodeId, storyboard: &str) -> Self {
        Self {
            element,
            storyboard: storyboard.into(),
        }
    }
}

/// One storyboard playing on one element.
#[derive(Debug)]
pub(crate) struct StoryboardInstance {
    storyboard: Rc<Storyboard>,
    /// Resolved nodes, one list per storyboard target.
    targets: Vec<Vec<NodeId>>,
    clock: ClockHandle,
    /// Where the last sample was taken.
    position: Duration,
}

impl StoryboardInstance {
    fn animates(&self, node: NodeId, id: PropertyId) -> bool {
        self.storyboard
            .targets()
            .iter()
            .zip(&self.targets)
            .any(|(target, nodes)| {
                nodes.contains(&node) && target.tracks().iter().any(|t| t.property() == id)
            })
    }
}

#[derive(Debug)]
pub(crate) struct Tween {
    clock: ClockHandle,
    from: ErasedValue,
    to: ErasedValue,
    easing: Easing,
    current: ErasedValue,
}

impl View {
    /// Returns `true` if `storyboard` is playing on `element`.
    #[must_use]
    pub fn is_playing(&self, element: NodeId, storyboard: &str) -> bool {
        self.playing
            .contains_key(&InstanceKey::new(element, storyboard))
    }

    /// Returns the number of running storyboard instances.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }

    /// Returns `true` if a tween drives `property` on `node`.
    #[must_use]
    pub fn is_tweening(&self, node: NodeId, property: PropertyId) -> bool {
        self.tweens.contains_key(&(node, property))
    }

    /// Writes the animated tier; elements with property triggers are
    /// re-styled so the triggers see the new value.
    pub(crate) fn write_animated(
        &mut self,
        node: NodeId,
        id: PropertyId,
        value: Option<ErasedValue>,
    ) {
        if self.write_tier(node, ValueTier::Animated, id, value)
            && self
                .tree
                .get(node)
                .is_some_and(|el| el.has_property_triggers)
        {
            self.mark_style_dirty(node);
        }
    }

    /// Nodes a trigger action addresses.
    ///
    /// Rooted selectors search below `element`; others search the whole view.
    /// A removed element has nothing below it.
    pub(crate) fn action_targets(&self, selector: Option<&Selector>, element: NodeId) -> Vec<NodeId> {
        match selector {
            None => vec![element],
            Some(selector) if selector.is_rooted() && !self.tree.contains(element) => Vec::new(),
            Some(selector) => selector.select_all(&self.tree, Some(element)),
        }
    }

    /// Nodes a storyboard target animates: the element itself, or matches
    /// within the element's subtree.
    fn storyboard_targets(&self, selector: Option<&Selector>, element: NodeId) -> Vec<NodeId> {
        match selector {
            None => vec![element],
            Some(selector) if selector.is_rooted() => selector.select_all(&self.tree, Some(element)),
            Some(selector) => self
                .tree
                .subtree(element)
                .into_iter()
                .filter(|node| selector.matches(&self.tree, *node))
                .collect(),
        }
    }

    /// Begins `name` on `element`.
    ///
    /// Returns `false` without side effects if it is already playing there,
    /// the name is not registered, or the element is gone.
    pub(crate) fn begin_storyboard(
        &mut self,
        view: ViewId,
        pool: &mut ClockPool<ClockBinding>,
        element: NodeId,
        name: &str,
    ) -> bool {
        if !self.tree.contains(element) {
            return false;
        }
        let key = InstanceKey::new(element, name);
        if self.playing.contains_key(&key) {
            tracing::trace!(storyboard = name, %element, "storyboard already playing");
            return false;
        }
        let Some(storyboard) = self.storyboards.find_shared(name) else {
            tracing::debug!(storyboard = name, %element, "storyboard not registered");
            return false;
        };
        let targets = storyboard
            .targets()
            .iter()
            .map(|target| self.storyboard_targets(target.selector(), element))
            .collect();
        let clock = pool.retrieve(
            ClockBinding::Storyboard {
                view,
                element,
                storyboard: name.into(),
            },
            storyboard.duration(),
            storyboard.loop_behavior(),
        );
        tracing::debug!(storyboard = name, %element, "storyboard begun");
        self.playing.insert(
            key.clone(),
            StoryboardInstance {
                storyboard,
                targets,
                clock,
                position: Duration::ZERO,
            },
        );
        self.sample_storyboard(&key, Duration::ZERO);
        true
    }

    /// Stops `name` on `element`. Returns `false` if it was not playing.
    pub(crate) fn stop_storyboard(
        &mut self,
        pool: &mut ClockPool<ClockBinding>,
        element: NodeId,
        name: &str,
    ) -> bool {
        let Some(instance) = self.playing.remove(&InstanceKey::new(element, name)) else {
            return false;
        };
        pool.release(instance.clock);
        self.release_storyboard_values(&instance);
        tracing::debug!(storyboard = name, %element, "storyboard stopped");
        true
    }

    /// Handles a storyboard clock that ran to its end.
    pub(crate) fn finish_storyboard(&mut self, handle: ClockHandle, element: NodeId, name: &str) {
        let key = InstanceKey::new(element, name);
        if self.playing.get(&key).is_none_or(|i| i.clock != handle) {
            return;
        }
        if let Some(instance) = self.playing.remove(&key) {
            self.release_storyboard_values(&instance);
            tracing::debug!(storyboard = name, %element, "storyboard completed");
        }
    }

    fn sample_storyboard(&mut self, key: &InstanceKey, position: Duration) {
        let Some(instance) = self.playing.get_mut(key) else {
            return;
        };
        instance.position = position;
        let storyboard = instance.storyboard.clone();
        let targets = instance.targets.clone();
        for (target, nodes) in storyboard.targets().iter().zip(&targets) {
            for &node in nodes {
                for track in target.tracks() {
                    let id = track.property();
                    let Ok(base) = self.effective(node, id, ValueTier::Triggered) else {
                        continue;
                    };
                    if let Some(value) = track.sample(position, &base, &self.registry) {
                        self.write_animated(node, id, Some(value));
                    }
                }
            }
        }
    }

    fn release_storyboard_values(&mut self, instance: &StoryboardInstance) {
        for (target, nodes) in instance.storyboard.targets().iter().zip(&instance.targets) {
            for &node in nodes {
                for track in target.tracks() {
                    self.restore_animated(node, track.property());
                }
            }
        }
    }

    /// Hands the animated slot of `id` on `node` to the next writer.
    fn restore_animated(&mut self, node: NodeId, id: PropertyId) {
        if let Some(tween) = self.tweens.get(&(node, id)) {
            let current = tween.current.clone();
            self.write_animated(node, id, Some(current));
            return;
        }
        // Storyboards sample in key order, so the last one wins.
        let owner = self
            .playing
            .iter()
            .filter(|(_, instance)| instance.animates(node, id))
            .map(|(key, instance)| (key, instance.position))
            .max_by(|a, b| a.0.cmp(b.0))
            .map(|(key, position)| (key.clone(), position));
        if let Some((key, position)) = owner {
            self.sample_storyboard(&key, position);
            return;
        }
        let held = self.held_tweens.get(&(node, id)).cloned();
        self.write_animated(node, id, held);
    }

    /// Starts a tween of `id` on `node` from its current value to `to`.
    ///
    /// A running tween of the same property is replaced and continues from
    /// wherever it had got to.
    pub(crate) fn start_tween(
        &mut self,
        view: ViewId,
        pool: &mut ClockPool<ClockBinding>,
        node: NodeId,
        id: PropertyId,
        to: ErasedValue,
        easing: Easing,
        duration: Duration,
    ) -> Result<(), TreeError> {
        self.tree.element(node)?;
        let registration = self.registry.get(id).ok_or(TreeError::UnknownProperty(id))?;
        if !registration.is_animatable() {
            return Err(TreeError::NotAnimatable(registration.name()));
        }
        if !self.registry.accepts(id, &to) {
            return Err(self.type_mismatch(id, to.type_name()));
        }
        let to = self.registry.coerce(id, to);
        let from = self.get_erased(node, id)?;
        if let Some(old) = self.tweens.remove(&(node, id)) {
            pool.release(old.clock);
        }
        self.held_tweens.remove(&(node, id));
        let clock = pool.retrieve(
            ClockBinding::Tween {
                view,
                node,
                property: id,
            },
            duration,
            LoopBehavior::None,
        );
        self.tweens.insert(
            (node, id),
            Tween {
                clock,
                from: from.clone(),
                to,
                easing,
                current: from.clone(),
            },
        );
        self.write_animated(node, id, Some(from));
        Ok(())
    }

    /// Stops a tween, or drops the value a finished one left behind.
    ///
    /// Returns `false` if there was neither.
    pub(crate) fn stop_tween(
        &mut self,
        pool: &mut ClockPool<ClockBinding>,
        node: NodeId,
        id: PropertyId,
    ) -> bool {
        let running = self.tweens.remove(&(node, id));
        if let Some(tween) = &running {
            pool.release(tween.clock);
        }
        let held = self.held_tweens.remove(&(node, id)).is_some();
        if running.is_none() && !held {
            return false;
        }
        self.restore_animated(node, id);
        true
    }

    /// Handles a tween clock that ran to its end; the final value holds.
    pub(crate) fn finish_tween(&mut self, handle: ClockHandle, node: NodeId, id: PropertyId) {
        if self.tweens.get(&(node, id)).is_none_or(|t| t.clock != handle) {
            return;
        }
        if let Some(tween) = self.tweens.remove(&(node, id)) {
            self.held_tweens.insert((node, id), tween.to.clone());
            self.write_animated(node, id, Some(tween.to));
        }
    }

    /// Samples every running storyboard and tween at its clock's position.
    ///
    /// Instances whose element is gone, or whose clock was released from
    /// outside, are dropped.
    pub(crate) fn advance_animations(&mut self, pool: &mut ClockPool<ClockBinding>) {
        let mut keys: Vec<InstanceKey> = self.playing.keys().cloned().collect();
        keys.sort_unstable();
        for key in keys {
            let Some(instance) = self.playing.get(&key) else {
                continue;
            };
            match pool.get(instance.clock).map(Clock::position) {
                Some(position) if self.tree.contains(key.element) => {
                    self.sample_storyboard(&key, position);
                }
                _ => {
                    if let Some(instance) = self.playing.remove(&key) {
                        pool.release(instance.clock);
                        self.release_storyboard_values(&instance);
                        tracing::debug!(storyboard = &*key.storyboard, element = %key.element, "storyboard dropped");
                    }
                }
            }
        }

        let mut tweens: Vec<(NodeId, PropertyId)> = self.tweens.keys().copied().collect();
        tweens.sort_unstable();
        for (node, id) in tweens {
            let Some(tween) = self.tweens.get_mut(&(node, id)) else {
                continue;
            };
            let progress = pool.get(tween.clock).map(Clock::progress);
            match progress {
                Some(progress) if self.tree.contains(node) => {
                    let t = tween.easing.apply(progress);
                    let value = self.registry.interpolate(id, &tween.from, &tween.to, t);
                    if let Some(value) = value {
                        tween.current = value.clone();
                        self.write_animated(node, id, Some(value));
                    }
                }
                _ => {
                    if let Some(tween) = self.tweens.remove(&(node, id)) {
                        pool.release(tween.clock);
                    }
                }
            }
        }
        self.held_tweens.retain(|(node, _), _| self.tree.contains(*node));
    }

    /// Releases every clock this view holds and clears animated values.
    pub(crate) fn dispose_animations(&mut self, pool: &mut ClockPool<ClockBinding>) {
        let mut touched: Vec<(NodeId, PropertyId)> =
            self.held_tweens.drain().map(|(key, _)| key).collect();
        let instances: Vec<_> = self.playing.drain().map(|(_, instance)| instance).collect();
        for instance in instances {
            pool.release(instance.clock);
            for (target, nodes) in instance.storyboard.targets().iter().zip(&instance.targets) {
                for &node in nodes {
                    touched.extend(target.tracks().iter().map(|t| (node, t.property())));
                }
            }
        }
        let tweens: Vec<_> = self.tweens.drain().collect();
        for (key, tween) in tweens {
            pool.release(tween.clock);
            touched.push(key);
        }
        touched.sort_unstable();
        touched.dedup();
        for (node, id) in touched {
            self.write_animated(node, id, None);
        }
    }
}
