// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Views: an element tree with its sheet, theme and storyboards.

use std::rc::Rc;

use hashbrown::HashMap;
use kurbo::{Rect, Size};
use trellis_property::{
    ErasedValue, Invalidation, Property, PropertyId, PropertyRegistry, ValueTier,
    walk_inherited_erased,
};
use trellis_style::{IdSet, StyleSheet, Theme, TriggerAction};

use crate::asset::AssetLoader;
use crate::error::TreeError;
use crate::layout::{ElementLayout, VisualClone};
use crate::properties::FrameworkProperties;
use crate::storyboard::{InstanceKey, StoryboardInstance, StoryboardRegistry, Tween};
use crate::tree::{NodeId, StyleState, VisualTree};

/// A trigger action waiting to run.
#[derive(Clone, Debug)]
pub(crate) struct TriggerEffect {
    pub(crate) action: TriggerAction,
    pub(crate) element: NodeId,
    pub(crate) activate: bool,
}

/// An element tree plus everything needed to style and lay it out.
///
/// A view owns its elements, its [`StyleSheet`], [`Theme`] and
/// [`StoryboardRegistry`]. It is driven by a
/// [`Presentation`](crate::Presentation), which owns the clock pool.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use trellis_property::PropertyRegistry;
/// use trellis_style::{RuleBuilder, StyleSheetBuilder};
/// use trellis_ui::{FrameworkProperties, Leaf, StackPanel, View};
///
/// let mut registry = PropertyRegistry::new();
/// let fw = FrameworkProperties::register(&mut registry);
/// let registry = Rc::new(registry);
///
/// let sheet = StyleSheetBuilder::new()
///     .rule(RuleBuilder::new("StackPanel > Button").set("Width", "120"))
///     .build(&registry)
///     .unwrap();
///
/// let mut view = View::new(registry, fw);
/// view.set_style_sheet(sheet);
/// let root = view.add_root("StackPanel", StackPanel::vertical());
/// let button = view.add_child(root, "Button", Leaf::new(10.0, 30.0)).unwrap();
///
/// view.apply_styles(button).unwrap();
/// assert_eq!(view.get(button, fw.width).unwrap(), 120.0);
/// ```
pub struct View {
    pub(crate) tree: VisualTree,
    pub(crate) registry: Rc<PropertyRegistry>,
    pub(crate) framework: FrameworkProperties,
    pub(crate) sheet: StyleSheet,
    pub(crate) theme: Theme,
    pub(crate) storyboards: StoryboardRegistry,
    pub(crate) asset_loader: Option<Box<dyn AssetLoader>>,
    pub(crate) viewport: Size,
    pub(crate) pending: Vec<TriggerEffect>,
    pub(crate) playing: HashMap<InstanceKey, StoryboardInstance>,
    pub(crate) tweens: HashMap<(NodeId, PropertyId), Tween>,
    /// Final values of finished tweens, kept until `stop_animation`.
    pub(crate) held_tweens: HashMap<(NodeId, PropertyId), ErasedValue>,
    pub(crate) layout_updated: bool,
}

impl core::fmt::Debug for View {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("View")
            .field("elements", &self.tree.len())
            .field("rules", &self.sheet.len())
            .field("theme", &self.theme.len())
            .field("storyboards", &self.storyboards)
            .field("has_asset_loader", &self.asset_loader.is_some())
            .field("viewport", &self.viewport)
            .field("playing", &self.playing.len())
            .field("tweens", &self.tweens.len())
            .field("held_tweens", &self.held_tweens.len())
            .finish_non_exhaustive()
    }
}

impl View {
    /// Creates an empty view.
    ///
    /// `framework` must have been registered in `registry`.
    #[must_use]
    pub fn new(registry: Rc<PropertyRegistry>, framework: FrameworkProperties) -> Self {
        Self {
            tree: VisualTree::default(),
            registry,
            framework,
            sheet: StyleSheet::default(),
            theme: Theme::default(),
            storyboards: StoryboardRegistry::default(),
            asset_loader: None,
            viewport: Size::new(f64::INFINITY, f64::INFINITY),
            pending: Vec::new(),
            playing: HashMap::new(),
            tweens: HashMap::new(),
            held_tweens: HashMap::new(),
            layout_updated: false,
        }
    }

    /// Returns the property registry.
    #[must_use]
    pub fn registry(&self) -> &Rc<PropertyRegistry> {
        &self.registry
    }

    /// Returns the framework property handles.
    #[must_use]
    #[inline]
    pub fn framework(&self) -> FrameworkProperties {
        self.framework
    }

    /// Returns the active style sheet.
    #[must_use]
    pub fn style_sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Replaces the style sheet.
    ///
    /// Every active trigger of the old sheet is deactivated, the sheet's
    /// storyboards are registered, and every element is marked for styling.
    pub fn set_style_sheet(&mut self, sheet: StyleSheet) {
        for node in self.tree.document_order() {
            self.queue_deactivations(node);
            let Some(el) = self.tree.get_mut(node) else {
                continue;
            };
            let cleared = el.store.clear_tier(ValueTier::Triggered);
            for id in cleared {
                self.value_changed(node, id);
            }
        }
        for old in self.sheet.storyboards() {
            if self
                .storyboards
                .find_shared(old.name())
                .is_some_and(|registered| Rc::ptr_eq(&registered, old))
            {
                self.storyboards.remove(old.name());
            }
        }
        self.storyboards.register_sheet(&sheet);
        self.sheet = sheet;
        tracing::debug!(rules = self.sheet.len(), "style sheet replaced");
        self.mark_all_style_dirty();
    }

    /// Queues the undo of every trigger active on `node` and forgets them.
    fn queue_deactivations(&mut self, node: NodeId) {
        let Some(el) = self.tree.get_mut(node) else {
            return;
        };
        let mut active: Vec<_> = el.active_triggers.drain().collect();
        active.sort_unstable();
        for key in active {
            let Some(trigger) = self
                .sheet
                .rule(key.rule)
                .and_then(|rule| rule.triggers().get(key.index))
            else {
                continue;
            };
            self.pending
                .extend(trigger.actions().iter().map(|action| TriggerEffect {
                    action: action.clone(),
                    element: node,
                    activate: false,
                }));
        }
    }

    /// Returns the active theme.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replaces the theme and marks every element for styling.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.mark_all_style_dirty();
    }

    /// Installs the loader used for asset setters.
    pub fn set_asset_loader(&mut self, loader: impl AssetLoader + 'static) {
        self.asset_loader = Some(Box::new(loader));
        self.mark_all_style_dirty();
    }

    /// Returns the storyboard registry.
    #[must_use]
    pub fn storyboards(&self) -> &StoryboardRegistry {
        &self.storyboards
    }

    /// Returns the storyboard registry for direct registration.
    pub fn storyboards_mut(&mut self) -> &mut StoryboardRegistry {
        &mut self.storyboards
    }

    /// Returns the size roots are measured against.
    #[must_use]
    #[inline]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Sets the size roots are measured against.
    ///
    /// Infinite dimensions let roots size to their content.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        for root in self.tree.roots().to_vec() {
            self.invalidate_measure(root);
        }
    }

    fn mark_all_style_dirty(&mut self) {
        for node in self.tree.document_order() {
            self.mark_style_dirty(node);
        }
    }

    // --- structure ---

    /// Adds a top-level element.
    pub fn add_root(&mut self, type_name: &str, layout: impl ElementLayout + 'static) -> NodeId {
        self.tree.insert_root(type_name, Box::new(layout))
    }

    /// Adds an element as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        type_name: &str,
        layout: impl ElementLayout + 'static,
    ) -> Result<NodeId, TreeError> {
        self.insert(Some(parent), type_name, Box::new(layout))
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        type_name: &str,
        layout: Box<dyn ElementLayout>,
    ) -> Result<NodeId, TreeError> {
        let id = self.tree.insert(parent, type_name, layout)?;
        if let Some(parent) = parent {
            self.invalidate_measure(parent);
        }
        Ok(id)
    }

    /// Adds a visual clone of `original` under `parent` (or as a root).
    ///
    /// The clone must not sit inside the original's subtree.
    pub fn add_visual_clone(
        &mut self,
        parent: Option<NodeId>,
        original: NodeId,
    ) -> Result<NodeId, TreeError> {
        self.tree.element(original)?;
        if let Some(parent) = parent
            && self.tree.is_ancestor_or_self(original, parent)
        {
            return Err(TreeError::WouldCycle {
                node: original,
                parent,
            });
        }
        let clone = self.insert(parent, "VisualClone", Box::new(VisualClone))?;
        self.tree.element_mut(clone)?.clone_of = Some(original);
        self.tree.element_mut(original)?.clones.push(clone);
        Ok(clone)
    }

    /// Returns the element a visual clone mirrors.
    #[must_use]
    pub fn clone_source(&self, clone: NodeId) -> Option<NodeId> {
        self.tree.get(clone)?.clone_of
    }

    /// Removes `node` and its subtree.
    ///
    /// Triggers active on removed elements are deactivated, and storyboards
    /// and tweens driving removed elements are released, on the next update.
    pub fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        let parent = self.tree.element(node)?.parent;
        for id in self.tree.subtree(node) {
            self.queue_deactivations(id);
        }
        let removed = self.tree.remove(node)?;
        // Survivors may still point at removed clones or originals.
        for id in self.tree.document_order() {
            let Some(el) = self.tree.get_mut(id) else {
                continue;
            };
            el.clones.retain(|c| !removed.contains(c));
            if el.clone_of.is_some_and(|original| removed.contains(&original)) {
                el.clone_of = None;
                self.invalidate_measure(id);
            }
        }
        if let Some(parent) = parent {
            self.invalidate_measure(parent);
        }
        Ok(())
    }

    /// Moves `node` under `parent`, or makes it a root.
    pub fn move_to(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), TreeError> {
        if let (Some(original), Some(parent)) = (self.clone_source(node), parent)
            && self.tree.is_ancestor_or_self(original, parent)
        {
            return Err(TreeError::WouldCycle { node, parent });
        }
        let old_parent = self.tree.element(node)?.parent;
        self.tree.reparent(node, parent)?;
        for p in [old_parent, parent].into_iter().flatten() {
            self.invalidate_measure(p);
        }
        self.mark_subtree_style_dirty(node);
        Ok(())
    }

    // --- queries ---

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the view has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Returns `true` if `node` is alive in this view.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.contains(node)
    }

    /// Returns the top-level elements.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        self.tree.roots()
    }

    /// Returns every element in document order.
    #[must_use]
    pub fn document_order(&self) -> Vec<NodeId> {
        self.tree.document_order()
    }

    /// Returns the parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.get(node)?.parent
    }

    /// Returns the children of `node`.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.tree.get(node).map_or(&[], |el| &el.children)
    }

    /// Returns the element type name.
    #[must_use]
    pub fn type_name(&self, node: NodeId) -> Option<&str> {
        Some(&self.tree.get(node)?.type_name)
    }

    /// Returns the element name.
    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.tree.get(node)?.name.as_deref()
    }

    /// Returns the classes, sorted.
    #[must_use]
    pub fn classes(&self, node: NodeId) -> &[Box<str>] {
        self.tree.get(node).map_or(&[], |el| el.classes.as_slice())
    }

    /// Returns the active pseudo-classes, sorted.
    #[must_use]
    pub fn pseudo_classes(&self, node: NodeId) -> &[Box<str>] {
        self.tree.get(node).map_or(&[], |el| el.pseudos.as_slice())
    }

    /// Returns the style state of `node`.
    pub fn style_state(&self, node: NodeId) -> Result<StyleState, TreeError> {
        Ok(self.tree.element(node)?.style)
    }

    /// Returns the size computed by the last measure.
    pub fn desired_size(&self, node: NodeId) -> Result<Size, TreeError> {
        Ok(self.tree.element(node)?.layout.desired)
    }

    /// Returns the bounds assigned by the last arrange.
    pub fn bounds(&self, node: NodeId) -> Result<Rect, TreeError> {
        Ok(self.tree.element(node)?.layout.bounds)
    }

    /// Returns `true` if the next layout pass will re-measure `node`.
    #[must_use]
    pub fn needs_measure(&self, node: NodeId) -> bool {
        self.tree.get(node).is_some_and(|el| el.layout.measure_dirty)
    }

    /// Returns `true` if the next layout pass will re-arrange `node`.
    #[must_use]
    pub fn needs_arrange(&self, node: NodeId) -> bool {
        self.tree.get(node).is_some_and(|el| el.layout.arrange_dirty)
    }

    // --- selector state ---

    /// Sets or clears the element name.
    pub fn set_name(&mut self, node: NodeId, name: Option<&str>) -> Result<(), TreeError> {
        let el = self.tree.element_mut(node)?;
        if el.name.as_deref() == name {
            return Ok(());
        }
        el.name = name.map(Into::into);
        self.mark_subtree_style_dirty(node);
        Ok(())
    }

    /// Adds a class.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), TreeError> {
        let el = self.tree.element_mut(node)?;
        if el.classes.contains(class) {
            return Ok(());
        }
        el.classes = el.classes.with(class.into());
        self.mark_subtree_style_dirty(node);
        Ok(())
    }

    /// Removes a class.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), TreeError> {
        let el = self.tree.element_mut(node)?;
        if !el.classes.contains(class) {
            return Ok(());
        }
        el.classes = el.classes.without(class);
        self.mark_subtree_style_dirty(node);
        Ok(())
    }

    /// Replaces every class.
    pub fn set_classes<'a>(
        &mut self,
        node: NodeId,
        classes: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), TreeError> {
        let el = self.tree.element_mut(node)?;
        let classes: IdSet<Box<str>> = classes.into_iter().map(Box::from).collect();
        if el.classes == classes {
            return Ok(());
        }
        el.classes = classes;
        self.mark_subtree_style_dirty(node);
        Ok(())
    }

    /// Turns a pseudo-class such as `focused` on or off.
    pub fn set_pseudo_class(
        &mut self,
        node: NodeId,
        pseudo: &str,
        active: bool,
    ) -> Result<(), TreeError> {
        let el = self.tree.element_mut(node)?;
        if el.pseudos.contains(pseudo) == active {
            return Ok(());
        }
        el.pseudos = if active {
            el.pseudos.with(pseudo.into())
        } else {
            el.pseudos.without(pseudo)
        };
        self.mark_subtree_style_dirty(node);
        Ok(())
    }

    /// Raises an event on `node` for its event triggers.
    ///
    /// The event is consumed by the node's next style pass.
    pub fn raise_event(&mut self, node: NodeId, event: &str) -> Result<(), TreeError> {
        self.tree.element_mut(node)?.pending_events.push(event.into());
        self.mark_style_dirty(node);
        Ok(())
    }

    // --- property values ---

    /// Returns the effective value of `property` on `node`.
    ///
    /// Tiers win in the order animated, triggered, local, styled; then an
    /// inheriting property takes the nearest ancestor's value; then the
    /// registered default applies.
    pub fn get<T: Clone + 'static>(
        &self,
        node: NodeId,
        property: Property<T>,
    ) -> Result<T, TreeError> {
        let value = self.get_erased(node, property.id())?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| self.type_mismatch(property.id(), core::any::type_name::<T>()))
    }

    /// Erased variant of [`get`](Self::get).
    pub fn get_erased(&self, node: NodeId, id: PropertyId) -> Result<ErasedValue, TreeError> {
        self.effective(node, id, ValueTier::Animated)
    }

    /// Returns the value of `property` in one tier, if set.
    pub fn get_tier<T: Clone + 'static>(
        &self,
        node: NodeId,
        tier: ValueTier,
        property: Property<T>,
    ) -> Result<Option<T>, TreeError> {
        Ok(self.tree.element(node)?.store.get(tier, property).cloned())
    }

    /// Resolves `id` considering only tiers up to and including `top`.
    pub(crate) fn effective(
        &self,
        node: NodeId,
        id: PropertyId,
        top: ValueTier,
    ) -> Result<ErasedValue, TreeError> {
        let el = self.tree.element(node)?;
        let registration = self.registry.get(id).ok_or(TreeError::UnknownProperty(id))?;
        for tier in ValueTier::BY_PRECEDENCE {
            if tier > top {
                continue;
            }
            if let Some(value) = el.store.get_erased(tier, id) {
                return Ok(value.clone());
            }
        }
        if registration.inherits() {
            let lookup = |key: NodeId| {
                let el = self.tree.get(key)?;
                Some((&el.store, el.parent))
            };
            if let Some(value) = walk_inherited_erased(el.parent, id, &lookup) {
                return Ok(value.clone());
            }
        }
        Ok(registration.default_value().clone())
    }

    pub(crate) fn type_mismatch(&self, id: PropertyId, found: &'static str) -> TreeError {
        match self.registry.get(id) {
            Some(r) => TreeError::TypeMismatch {
                property: r.name(),
                expected: r.type_name(),
                found,
            },
            None => TreeError::UnknownProperty(id),
        }
    }

    /// Writes the local value of `property` and marks `node` for styling.
    pub fn set_local<T: Clone + 'static>(
        &mut self,
        node: NodeId,
        property: Property<T>,
        value: T,
    ) -> Result<(), TreeError> {
        self.set_local_erased(node, property.id(), ErasedValue::new(value))
    }

    /// Erased variant of [`set_local`](Self::set_local).
    ///
    /// The value is coerced by the property's metadata.
    pub fn set_local_erased(
        &mut self,
        node: NodeId,
        id: PropertyId,
        value: ErasedValue,
    ) -> Result<(), TreeError> {
        self.tree.element(node)?;
        if self.registry.get(id).is_none() {
            return Err(TreeError::UnknownProperty(id));
        }
        if !self.registry.accepts(id, &value) {
            return Err(self.type_mismatch(id, value.type_name()));
        }
        let value = self.registry.coerce(id, value);
        self.write_tier(node, ValueTier::Local, id, Some(value));
        self.mark_style_dirty(node);
        Ok(())
    }

    /// Clears the local value of `property`.
    pub fn clear_local<T>(&mut self, node: NodeId, property: Property<T>) -> Result<(), TreeError> {
        self.tree.element(node)?;
        if self.write_tier(node, ValueTier::Local, property.id(), None) {
            self.mark_style_dirty(node);
        }
        Ok(())
    }

    /// Writes or clears one tier and propagates invalidation.
    ///
    /// Returns `true` if the effective value changed.
    pub(crate) fn write_tier(
        &mut self,
        node: NodeId,
        tier: ValueTier,
        id: PropertyId,
        value: Option<ErasedValue>,
    ) -> bool {
        let before = self.get_erased(node, id).ok();
        let Some(el) = self.tree.get_mut(node) else {
            return false;
        };
        match value {
            Some(value) => {
                el.store.set_erased(tier, id, value);
            }
            None => {
                el.store.clear_erased(tier, id);
            }
        }
        let after = self.get_erased(node, id).ok();
        let changed = match (&before, &after) {
            (Some(a), Some(b)) => !self.registry.values_equal(id, a, b),
            _ => true,
        };
        if changed {
            self.value_changed(node, id);
        }
        changed
    }

    /// Applies a property's invalidation flags after its value changed.
    pub(crate) fn value_changed(&mut self, node: NodeId, id: PropertyId) {
        let flags = self.registry.invalidates(id);
        self.invalidate(node, flags);
        if id == self.framework.render_transform.id() {
            let clones = self.tree.get(node).map(|el| el.clones.clone());
            for clone in clones.into_iter().flatten() {
                self.invalidate_measure(clone);
            }
        }
        if self.registry.inherits(id) {
            for descendant in self.tree.subtree(node).into_iter().skip(1) {
                self.invalidate(descendant, flags);
                if self
                    .tree
                    .get(descendant)
                    .is_some_and(|el| el.has_property_triggers)
                {
                    self.mark_style_dirty(descendant);
                }
            }
        }
    }

    fn invalidate(&mut self, node: NodeId, flags: Invalidation) {
        if flags.contains(Invalidation::MEASURE) {
            self.invalidate_measure(node);
        } else if flags.contains(Invalidation::ARRANGE) {
            self.invalidate_arrange(node);
        }
        if flags.contains(Invalidation::STYLE) {
            self.mark_style_dirty(node);
        }
    }

    // --- invalidation ---

    /// Marks `node` and its ancestors for re-measure and re-arrange.
    pub fn invalidate_measure(&mut self, node: NodeId) {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(el) = self.tree.get_mut(id) else {
                break;
            };
            el.layout.measure_dirty = true;
            el.layout.arrange_dirty = true;
            current = el.parent;
        }
    }

    /// Marks `node` and its ancestors for re-arrange.
    pub fn invalidate_arrange(&mut self, node: NodeId) {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(el) = self.tree.get_mut(id) else {
                break;
            };
            el.layout.arrange_dirty = true;
            current = el.parent;
        }
    }

    /// Marks `node` for styling, which also invalidates its layout.
    pub fn mark_style_dirty(&mut self, node: NodeId) {
        let Some(el) = self.tree.get_mut(node) else {
            return;
        };
        if el.style == StyleState::Clean {
            el.style = StyleState::Dirty;
        }
        self.invalidate_measure(node);
    }

    /// Marks `node` and every descendant for styling.
    pub fn mark_subtree_style_dirty(&mut self, node: NodeId) {
        for id in self.tree.subtree(node) {
            self.mark_style_dirty(id);
        }
    }

    pub(crate) fn take_pending(&mut self) -> Vec<TriggerEffect> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Leaf, Panel};
    use peniko::Color;

    fn view() -> (View, FrameworkProperties) {
        let mut registry = PropertyRegistry::new();
        let fw = FrameworkProperties::register(&mut registry);
        (View::new(Rc::new(registry), fw), fw)
    }

    #[test]
    fn tiers_resolve_by_precedence() {
        let (mut view, fw) = view();
        let node = view.add_root("Panel", Panel);
        assert!(view.get(node, fw.width).unwrap().is_nan());

        view.write_tier(node, ValueTier::Styled, fw.width.id(), Some(ErasedValue::new(10.0_f64)));
        assert_eq!(view.get(node, fw.width).unwrap(), 10.0);
        view.set_local(node, fw.width, 20.0).unwrap();
        assert_eq!(view.get(node, fw.width).unwrap(), 20.0);
        view.write_tier(node, ValueTier::Triggered, fw.width.id(), Some(ErasedValue::new(30.0_f64)));
        assert_eq!(view.get(node, fw.width).unwrap(), 30.0);
        view.write_tier(node, ValueTier::Animated, fw.width.id(), Some(ErasedValue::new(40.0_f64)));
        assert_eq!(view.get(node, fw.width).unwrap(), 40.0);

        view.write_tier(node, ValueTier::Animated, fw.width.id(), None);
        view.write_tier(node, ValueTier::Triggered, fw.width.id(), None);
        view.clear_local(node, fw.width).unwrap();
        assert_eq!(view.get(node, fw.width).unwrap(), 10.0);
    }

    #[test]
    fn inheriting_properties_walk_ancestors() {
        let (mut view, fw) = view();
        let root = view.add_root("Panel", Panel);
        let mid = view.add_child(root, "Panel", Panel).unwrap();
        let leaf = view.add_child(mid, "Label", Leaf::new(1.0, 1.0)).unwrap();
        let red = Color::from_rgb8(255, 0, 0);
        view.set_local(root, fw.foreground, red).unwrap();
        assert_eq!(view.get(leaf, fw.foreground).unwrap().components, red.components);
        // Non-inheriting properties fall back to the default instead.
        view.set_local(root, fw.opacity, 0.5).unwrap();
        assert_eq!(view.get(leaf, fw.opacity).unwrap(), 1.0);
    }

    #[test]
    fn local_writes_are_type_checked_and_coerced() {
        let (mut view, fw) = view();
        let node = view.add_root("Panel", Panel);
        let err = view
            .set_local_erased(node, fw.width.id(), ErasedValue::new(1_u32))
            .unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { property: "Width", .. }));
        view.set_local(node, fw.opacity, 3.0).unwrap();
        assert_eq!(view.get(node, fw.opacity).unwrap(), 1.0);
    }

    #[test]
    fn stale_nodes_are_errors() {
        let (mut view, fw) = view();
        let node = view.add_root("Panel", Panel);
        view.remove(node).unwrap();
        assert_eq!(view.get(node, fw.width), Err(TreeError::StaleNode(node)));
        assert_eq!(view.add_class(node, "x"), Err(TreeError::StaleNode(node)));
        assert!(view.is_empty());
    }

    #[test]
    fn unknown_properties_are_errors() {
        let (mut view, _) = view();
        let foreign = PropertyId::new(999);
        let node = view.add_root("Panel", Panel);
        assert_eq!(
            view.get_erased(node, foreign).unwrap_err(),
            TreeError::UnknownProperty(foreign)
        );
        assert_eq!(
            view.set_local_erased(node, foreign, ErasedValue::new(1.0_f64)),
            Err(TreeError::UnknownProperty(foreign))
        );
    }

    #[test]
    fn style_dirt_propagates_layout_dirt_upwards() {
        let (mut view, _) = view();
        let root = view.add_root("Panel", Panel);
        let child = view.add_child(root, "Panel", Panel).unwrap();
        for node in [root, child] {
            let el = view.tree.get_mut(node).unwrap();
            el.style = StyleState::Clean;
            el.layout.measure_dirty = false;
            el.layout.arrange_dirty = false;
        }
        view.add_class(child, "hot").unwrap();
        assert_eq!(view.style_state(child).unwrap(), StyleState::Dirty);
        assert_eq!(view.style_state(root).unwrap(), StyleState::Clean);
        assert!(view.needs_measure(root));
        assert!(view.needs_arrange(root));
    }

    #[test]
    fn clones_cannot_live_inside_their_original() {
        let (mut view, _) = view();
        let original = view.add_root("Panel", Panel);
        let inner = view.add_child(original, "Panel", Panel).unwrap();
        assert!(matches!(
            view.add_visual_clone(Some(inner), original),
            Err(TreeError::WouldCycle { .. })
        ));
        let clone = view.add_visual_clone(None, original).unwrap();
        assert_eq!(view.clone_source(clone), Some(original));
        assert!(matches!(
            view.move_to(clone, Some(inner)),
            Err(TreeError::WouldCycle { .. })
        ));
        view.remove(original).unwrap();
        assert_eq!(view.clone_source(clone), None);
    }
}
