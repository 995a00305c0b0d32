// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The presentation: views, the clock pool and the per-tick pipeline.

use core::fmt;
use core::time::Duration;
use std::rc::Rc;

use trellis_animation::{ClockPool, Easing, PoolConfig};
use trellis_property::{ErasedValue, Property, PropertyId, PropertyRegistry};
use trellis_style::TriggerAction;

use crate::error::{Diagnostic, TreeError};
use crate::properties::FrameworkProperties;
use crate::storyboard::ClockBinding;
use crate::tree::{NodeId, StyleState};
use crate::view::View;

/// Identifies a view within its [`Presentation`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u32);

impl ViewId {
    /// Creates a view id from its raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

/// Tuning for a [`Presentation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PresentationConfig {
    /// Clock pool sizing.
    pub pool: PoolConfig,
    /// Layout passes per tick while visual clones keep being invalidated.
    pub max_layout_iterations: usize,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            max_layout_iterations: 4,
        }
    }
}

/// What one [`Presentation::update`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Values the style pass could not resolve, in document order per view.
    pub diagnostics: Vec<Diagnostic>,
    /// Elements styled across all views.
    pub styled: usize,
    /// Clocks that ran to completion this tick.
    pub completed: usize,
    /// The largest number of layout passes any view needed.
    pub layout_passes: usize,
}

/// Views plus the clock pool that animates them.
///
/// Each call to [`update`](Self::update) advances clocks, samples animated
/// values, styles dirty elements (running trigger actions as they flip) and
/// lays out every view.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use core::time::Duration;
/// use trellis_animation::Easing;
/// use trellis_property::PropertyRegistry;
/// use trellis_ui::{FrameworkProperties, Leaf, Presentation, PresentationConfig};
///
/// let mut registry = PropertyRegistry::new();
/// let fw = FrameworkProperties::register(&mut registry);
/// let mut presentation = Presentation::new(Rc::new(registry), fw, PresentationConfig::default());
///
/// let view = presentation.add_view();
/// let node = presentation.view_mut(view).unwrap().add_root("Leaf", Leaf::new(10.0, 10.0));
/// presentation
///     .animate(view, node, fw.opacity, 0.0, Easing::Linear, Duration::from_millis(100))
///     .unwrap();
///
/// presentation.update(Duration::from_millis(50));
/// let halfway = presentation.view(view).unwrap().get(node, fw.opacity).unwrap();
/// assert!((halfway - 0.5).abs() < 1e-9);
///
/// presentation.update(Duration::from_millis(50));
/// assert_eq!(presentation.view(view).unwrap().get(node, fw.opacity).unwrap(), 0.0);
/// ```
pub struct Presentation {
    registry: Rc<PropertyRegistry>,
    framework: FrameworkProperties,
    config: PresentationConfig,
    pool: ClockPool<ClockBinding>,
    views: Vec<View>,
}

impl fmt::Debug for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presentation")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("views", &self.views)
            .finish_non_exhaustive()
    }
}

impl Presentation {
    /// Creates a presentation with a pool sized by `config`.
    #[must_use]
    pub fn new(
        registry: Rc<PropertyRegistry>,
        framework: FrameworkProperties,
        config: PresentationConfig,
    ) -> Self {
        Self::with_pool(registry, framework, config, ClockPool::new(config.pool))
    }

    /// Creates a presentation driving an existing pool.
    #[must_use]
    pub fn with_pool(
        registry: Rc<PropertyRegistry>,
        framework: FrameworkProperties,
        config: PresentationConfig,
        pool: ClockPool<ClockBinding>,
    ) -> Self {
        Self {
            registry,
            framework,
            config,
            pool,
            views: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> PresentationConfig {
        self.config
    }

    /// Returns the clock pool.
    #[must_use]
    pub fn pool(&self) -> &ClockPool<ClockBinding> {
        &self.pool
    }

    /// Adds an empty view.
    pub fn add_view(&mut self) -> ViewId {
        let id = ViewId(u32::try_from(self.views.len()).unwrap_or(u32::MAX));
        self.views
            .push(View::new(self.registry.clone(), self.framework));
        id
    }

    /// Returns a view.
    #[must_use]
    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(id.0 as usize)
    }

    /// Returns a view for mutation.
    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(id.0 as usize)
    }

    /// Iterates every view.
    pub fn views(&self) -> impl Iterator<Item = (ViewId, &View)> + '_ {
        (0_u32..)
            .zip(&self.views)
            .map(|(index, view)| (ViewId(index), view))
    }

    fn split(&mut self, id: ViewId) -> Result<(&mut View, &mut ClockPool<ClockBinding>), TreeError> {
        let view = self
            .views
            .get_mut(id.0 as usize)
            .ok_or(TreeError::UnknownView(id))?;
        Ok((view, &mut self.pool))
    }

    /// Runs a trigger action's activation on `target`.
    ///
    /// `PlayStoryboard` begins the storyboard on `target`, or on every
    /// element its selector finds. `Set` actions live in the triggered tier
    /// and are applied by the style pass, so they do nothing here.
    pub fn activate(
        &mut self,
        view: ViewId,
        action: &TriggerAction,
        target: NodeId,
    ) -> Result<(), TreeError> {
        self.run_action(view, action, target, true)
    }

    /// Runs a trigger action's deactivation on `target`.
    ///
    /// `target` may already have been removed; unrooted selectors still
    /// find the elements its activation reached.
    pub fn deactivate(
        &mut self,
        view: ViewId,
        action: &TriggerAction,
        target: NodeId,
    ) -> Result<(), TreeError> {
        self.run_action(view, action, target, false)
    }

    fn run_action(
        &mut self,
        view_id: ViewId,
        action: &TriggerAction,
        target: NodeId,
        activate: bool,
    ) -> Result<(), TreeError> {
        let (view, pool) = self.split(view_id)?;
        if activate {
            view.tree.element(target)?;
        }
        match action {
            TriggerAction::PlayStoryboard {
                storyboard,
                selector,
            } => {
                for element in view.action_targets(selector.as_ref(), target) {
                    if activate {
                        view.begin_storyboard(view_id, pool, element, storyboard);
                    } else {
                        view.stop_storyboard(pool, element, storyboard);
                    }
                }
            }
            TriggerAction::Set { .. } => {}
        }
        Ok(())
    }

    /// Begins `storyboard` on `element`.
    ///
    /// Returns `Ok(false)` if it is already playing there or is not
    /// registered in the view.
    pub fn begin_storyboard(
        &mut self,
        view: ViewId,
        element: NodeId,
        storyboard: &str,
    ) -> Result<bool, TreeError> {
        let (v, pool) = self.split(view)?;
        v.tree.element(element)?;
        Ok(v.begin_storyboard(view, pool, element, storyboard))
    }

    /// Stops `storyboard` on `element` and lets go of what it animated.
    ///
    /// Each released property falls back to another animation of it if one
    /// remains, and is cleared otherwise.
    ///
    /// Returns `Ok(false)` if it was not playing.
    pub fn stop_storyboard(
        &mut self,
        view: ViewId,
        element: NodeId,
        storyboard: &str,
    ) -> Result<bool, TreeError> {
        let (v, pool) = self.split(view)?;
        Ok(v.stop_storyboard(pool, element, storyboard))
    }

    /// Returns `true` if `storyboard` is playing on `element`.
    #[must_use]
    pub fn is_playing(&self, view: ViewId, element: NodeId, storyboard: &str) -> bool {
        self.view(view)
            .is_some_and(|v| v.is_playing(element, storyboard))
    }

    /// Animates `property` on `node` from its current value to `to`.
    ///
    /// A tween already running for the same property is replaced. When the
    /// tween ends, `to` stays in the animated tier until
    /// [`stop_animation`](Self::stop_animation).
    pub fn animate<T: Clone + 'static>(
        &mut self,
        view: ViewId,
        node: NodeId,
        property: Property<T>,
        to: T,
        easing: Easing,
        duration: Duration,
    ) -> Result<(), TreeError> {
        self.animate_erased(view, node, property.id(), ErasedValue::new(to), easing, duration)
    }

    /// Erased variant of [`animate`](Self::animate).
    pub fn animate_erased(
        &mut self,
        view: ViewId,
        node: NodeId,
        property: PropertyId,
        to: ErasedValue,
        easing: Easing,
        duration: Duration,
    ) -> Result<(), TreeError> {
        let (v, pool) = self.split(view)?;
        v.start_tween(view, pool, node, property, to, easing, duration)
    }

    /// Stops a tween, or drops the final value a completed tween holds.
    ///
    /// A storyboard still animating the property takes it back over.
    ///
    /// Returns `Ok(false)` if the property was not tweened.
    pub fn stop_animation<T>(
        &mut self,
        view: ViewId,
        node: NodeId,
        property: Property<T>,
    ) -> Result<bool, TreeError> {
        let (v, pool) = self.split(view)?;
        Ok(v.stop_tween(pool, node, property.id()))
    }

    /// Advances time by `dt` and brings every view up to date.
    ///
    /// In order: clocks advance and completions are applied; running
    /// storyboards and tweens are sampled; dirty elements are styled in
    /// document order, each element's trigger actions running right after
    /// it is styled; then every view is laid out.
    pub fn update(&mut self, dt: Duration) -> UpdateReport {
        let mut report = UpdateReport::default();

        let completed = self.pool.update(dt);
        report.completed = completed.len();
        for (handle, binding) in completed {
            let Some(view) = self.views.get_mut(binding.view().0 as usize) else {
                continue;
            };
            match binding {
                ClockBinding::Storyboard {
                    element,
                    storyboard,
                    ..
                } => view.finish_storyboard(handle, element, &storyboard),
                ClockBinding::Tween { node, property, .. } => {
                    view.finish_tween(handle, node, property);
                }
            }
        }
        for view in &mut self.views {
            view.advance_animations(&mut self.pool);
        }

        for index in 0..self.views.len() {
            let view_id = ViewId(u32::try_from(index).unwrap_or(u32::MAX));
            self.style_view(view_id, &mut report);
        }

        let max_iterations = self.config.max_layout_iterations;
        for view in &mut self.views {
            let passes = view.update_layout(max_iterations);
            report.layout_passes = report.layout_passes.max(passes);
        }
        report
    }

    fn style_view(&mut self, view_id: ViewId, report: &mut UpdateReport) {
        // Effects queued outside the pass, e.g. by a sheet replacement.
        self.run_pending(view_id);
        let Some(order) = self.view(view_id).map(View::document_order) else {
            return;
        };
        for node in order {
            let Ok((view, _)) = self.split(view_id) else {
                return;
            };
            if !view.style_state(node).is_ok_and(StyleState::needs_style) {
                continue;
            }
            match view.apply_styles(node) {
                Ok(diagnostics) => {
                    report.styled += 1;
                    report.diagnostics.extend(diagnostics);
                }
                Err(err) => tracing::debug!(%node, %err, "element vanished during style pass"),
            }
            self.run_pending(view_id);
        }
    }

    fn run_pending(&mut self, view_id: ViewId) {
        let Ok((view, _)) = self.split(view_id) else {
            return;
        };
        for effect in view.take_pending() {
            let result = if effect.activate {
                self.activate(view_id, &effect.action, effect.element)
            } else {
                self.deactivate(view_id, &effect.action, effect.element)
            };
            if let Err(err) = result {
                tracing::debug!(element = %effect.element, %err, "trigger action skipped");
            }
        }
    }

    /// Releases every clock and clears every animated value.
    pub fn dispose(&mut self) {
        for view in &mut self.views {
            view.dispose_animations(&mut self.pool);
        }
        let leftovers = self.pool.clear();
        if !leftovers.is_empty() {
            tracing::debug!(count = leftovers.len(), "released orphaned clocks");
        }
    }
}
