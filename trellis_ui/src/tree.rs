// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element arena.
//!
//! Elements live in generational slots. Parents are stored as ids, so a child
//! never owns its parent and removing a subtree leaves no dangling links.

use core::fmt;

use hashbrown::HashSet;
use kurbo::{Rect, Size};
use smallvec::SmallVec;
use trellis_property::PropertyStore;
use trellis_style::{IdSet, SelectorInputs, SelectorTree};

use crate::error::TreeError;
use crate::layout::ElementLayout;

/// Handle to an element in a [`View`](crate::View).
///
/// Removing an element bumps its slot's generation, so old handles stop
/// resolving instead of aliasing whatever reuses the slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    const fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Where an element stands in the style pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StyleState {
    /// Never styled.
    #[default]
    Unstyled,
    /// Styled, and nothing relevant changed since.
    Clean,
    /// Styled, but its inputs changed.
    Dirty,
}

impl StyleState {
    /// Returns `true` if the element must be styled in the next pass.
    #[must_use]
    #[inline]
    pub fn needs_style(self) -> bool {
        !matches!(self, Self::Clean)
    }
}

/// Identifies one trigger of one rule of the current sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TriggerKey {
    pub(crate) rule: usize,
    pub(crate) index: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct LayoutState {
    pub(crate) measure_dirty: bool,
    pub(crate) arrange_dirty: bool,
    pub(crate) last_available: Option<Size>,
    pub(crate) desired: Size,
    /// What the element's layout asked for, before size constraints.
    pub(crate) content: Size,
    pub(crate) last_slot: Option<Rect>,
    pub(crate) bounds: Rect,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            measure_dirty: true,
            arrange_dirty: true,
            last_available: None,
            desired: Size::ZERO,
            content: Size::ZERO,
            last_slot: None,
            bounds: Rect::ZERO,
        }
    }
}

pub(crate) struct Element {
    pub(crate) type_name: Box<str>,
    pub(crate) name: Option<Box<str>>,
    pub(crate) classes: IdSet<Box<str>>,
    pub(crate) pseudos: IdSet<Box<str>>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) store: PropertyStore,
    pub(crate) style: StyleState,
    pub(crate) layout: LayoutState,
    pub(crate) active_triggers: HashSet<TriggerKey>,
    pub(crate) has_property_triggers: bool,
    pub(crate) pending_events: Vec<Box<str>>,
    /// Taken out while the element's own measure or arrange runs.
    pub(crate) behavior: Option<Box<dyn ElementLayout>>,
    pub(crate) clone_of: Option<NodeId>,
    pub(crate) clones: SmallVec<[NodeId; 1]>,
}

impl Element {
    fn new(type_name: &str, behavior: Box<dyn ElementLayout>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            classes: IdSet::default(),
            pseudos: IdSet::default(),
            parent: None,
            children: SmallVec::new(),
            store: PropertyStore::new(),
            style: StyleState::Unstyled,
            layout: LayoutState::default(),
            active_triggers: HashSet::new(),
            has_property_triggers: false,
            pending_events: Vec::new(),
            behavior: Some(behavior),
            clone_of: None,
            clones: SmallVec::new(),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("classes", &self.classes)
            .field("pseudos", &self.pseudos)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("style", &self.style)
            .field("bounds", &self.layout.bounds)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// The arena behind a view: elements, their links and the top-level roots.
#[derive(Debug, Default)]
pub(crate) struct VisualTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    len: usize,
}

impl VisualTree {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Element> {
        let slot = self.slots.get(id.slot())?;
        (slot.generation == id.generation)
            .then_some(slot.element.as_ref())
            .flatten()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(id.slot())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.element.as_mut()
    }

    pub(crate) fn element(&self, id: NodeId) -> Result<&Element, TreeError> {
        self.get(id).ok_or(TreeError::StaleNode(id))
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, TreeError> {
        self.get_mut(id).ok_or(TreeError::StaleNode(id))
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn allocate(&mut self, element: Element) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            element: Some(element),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn insert(
        &mut self,
        parent: Option<NodeId>,
        type_name: &str,
        behavior: Box<dyn ElementLayout>,
    ) -> Result<NodeId, TreeError> {
        if let Some(parent) = parent {
            self.element(parent)?;
        }
        let id = self.allocate(Element::new(type_name, behavior));
        self.link(id, parent);
        Ok(id)
    }

    pub(crate) fn insert_root(
        &mut self,
        type_name: &str,
        behavior: Box<dyn ElementLayout>,
    ) -> NodeId {
        let id = self.allocate(Element::new(type_name, behavior));
        self.link(id, None);
        id
    }

    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent_el) => parent_el.children.push(id),
            None => self.roots.push(id),
        }
        if let Some(el) = self.get_mut(id) {
            el.parent = parent;
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.get(id).and_then(|el| el.parent);
        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent_el) => parent_el.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|el| el.parent);
        }
        false
    }

    pub(crate) fn reparent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), TreeError> {
        self.element(id)?;
        if let Some(parent) = parent {
            self.element(parent)?;
            if self.is_ancestor_or_self(id, parent) {
                return Err(TreeError::WouldCycle { node: id, parent });
            }
        }
        self.unlink(id);
        self.link(id, parent);
        Ok(())
    }

    /// Removes `id` and its subtree, returning the removed ids in preorder.
    pub(crate) fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        self.element(id)?;
        self.unlink(id);
        let removed = self.subtree(id);
        for node in &removed {
            let Some(slot) = self.slots.get_mut(node.slot()) else {
                continue;
            };
            if slot.element.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
                self.len -= 1;
            }
        }
        Ok(removed)
    }

    /// Returns `id` and its descendants in preorder.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(el) = self.get(node) else {
                continue;
            };
            out.push(node);
            stack.extend(el.children.iter().rev().copied());
        }
        out
    }

    /// Returns every element in document order.
    pub(crate) fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len);
        for root in &self.roots {
            out.extend(self.subtree(*root));
        }
        out
    }

    pub(crate) fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.get(id).and_then(|el| el.parent);
        core::iter::from_fn(move || {
            let id = current?;
            current = self.get(id).and_then(|el| el.parent);
            Some(id)
        })
    }
}

impl SelectorTree for VisualTree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map_or(&[], |el| &el.children)
    }

    fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn inputs(&self, node: NodeId) -> Option<SelectorInputs<'_>> {
        let el = self.get(node)?;
        Some(SelectorInputs::new(
            &el.type_name,
            el.name.as_deref(),
            el.classes.as_slice(),
            el.pseudos.as_slice(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Panel;

    fn panel() -> Box<dyn ElementLayout> {
        Box::new(Panel)
    }

    #[test]
    fn removal_invalidates_handles() {
        let mut tree = VisualTree::default();
        let root = tree.insert_root("Panel", panel());
        let child = tree.insert(Some(root), "Button", panel()).unwrap();
        let grandchild = tree.insert(Some(child), "Label", panel()).unwrap();
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.remove(child).unwrap(), vec![child, grandchild]);
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(child));
        assert!(tree.get(root).unwrap().children.is_empty());
        assert_eq!(tree.remove(child), Err(TreeError::StaleNode(child)));

        let reused = tree.insert(Some(root), "Button", panel()).unwrap();
        assert_ne!(reused, child);
        assert!(!tree.contains(child));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = VisualTree::default();
        let a = tree.insert_root("A", panel());
        let b = tree.insert(Some(a), "B", panel()).unwrap();
        let c = tree.insert(Some(b), "C", panel()).unwrap();
        assert_eq!(
            tree.reparent(a, Some(c)),
            Err(TreeError::WouldCycle { node: a, parent: c })
        );
        tree.reparent(c, None).unwrap();
        assert_eq!(tree.roots(), &[a, c]);
        assert_eq!(tree.ancestors(b).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn document_order_is_preorder() {
        let mut tree = VisualTree::default();
        let a = tree.insert_root("A", panel());
        let b = tree.insert(Some(a), "B", panel()).unwrap();
        let c = tree.insert(Some(b), "C", panel()).unwrap();
        let d = tree.insert(Some(a), "D", panel()).unwrap();
        let e = tree.insert_root("E", panel());
        assert_eq!(tree.document_order(), vec![a, b, c, d, e]);
    }
}
