// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selectors: parsing, specificity and matching against a tree.
//!
//! A [`Selector`] is a chain of [`SelectorPart`]s joined by [`Combinator`]s,
//! written the way style sheets write them:
//!
//! ```text
//! Panel > Button.primary:focused
//! :trigger-root ListItem #title
//! *.card
//! ```
//!
//! Matching walks the parts right to left. Descendant combinators backtrack,
//! so every assignment of ancestors to parts is tried before giving up.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::error::{SelectorErrorKind, SelectorParseError};

/// The pseudo-class that anchors a selector to an explicit root.
pub const TRIGGER_ROOT: &str = "trigger-root";

/// Selector specificity: `(names, classes, types, pseudo-classes)`.
///
/// Fields are ordered highest weight first so the derived `Ord` compares
/// lexicographically: one name outranks any number of classes, and so on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32, pub u32);

impl core::ops::Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(
            self.0.saturating_add(rhs.0),
            self.1.saturating_add(rhs.1),
            self.2.saturating_add(rhs.2),
            self.3.saturating_add(rhs.3),
        )
    }
}

/// An owned, sorted, deduplicated set.
///
/// Membership is O(log n); subset checks are a merge walk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdSet<T>(Box<[T]>);

impl<T> Default for IdSet<T> {
    fn default() -> Self {
        Self(Vec::new().into_boxed_slice())
    }
}

impl<T: Ord> IdSet<T> {
    /// Constructs a set from an iterator, sorting and deduplicating.
    #[must_use]
    pub fn from_ids(iter: impl IntoIterator<Item = T>) -> Self {
        let mut ids: Vec<T> = iter.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self(ids.into_boxed_slice())
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the members in order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Returns `true` if `id` is a member.
    #[must_use]
    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.0
            .binary_search_by(|probe| Borrow::<Q>::borrow(probe).cmp(id))
            .is_ok()
    }

    /// Returns `true` if every member also appears in the sorted slice `other`.
    #[must_use]
    pub fn is_subset_of_slice<U>(&self, other: &[U]) -> bool
    where
        T: Borrow<str>,
        U: Borrow<str>,
    {
        is_subset(self.as_slice(), other)
    }

    /// Returns a copy with `id` inserted.
    #[must_use]
    pub fn with(&self, id: T) -> Self
    where
        T: Clone,
    {
        Self::from_ids(self.0.iter().cloned().chain(core::iter::once(id)))
    }

    /// Returns a copy with `id` removed.
    #[must_use]
    pub fn without<Q>(&self, id: &Q) -> Self
    where
        T: Clone + Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self(
            self.0
                .iter()
                .filter(|member| Borrow::<Q>::borrow(*member) != id)
                .cloned()
                .collect(),
        )
    }
}

impl<T: Ord> FromIterator<T> for IdSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

fn is_subset<A: Borrow<str>, B: Borrow<str>>(needles: &[A], haystack: &[B]) -> bool {
    let mut j = 0;
    for needle in needles {
        loop {
            let Some(candidate) = haystack.get(j) else {
                return false;
            };
            j += 1;
            match Borrow::<str>::borrow(needle).cmp(Borrow::<str>::borrow(candidate)) {
                Ordering::Equal => break,
                Ordering::Greater => {}
                Ordering::Less => return false,
            }
        }
    }
    true
}

/// A borrowed snapshot of what selectors can see of one element.
///
/// `classes` and `pseudos` must be sorted and deduplicated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectorInputs<'a> {
    /// Element type name, compared ASCII case-insensitively.
    pub type_name: &'a str,
    /// Unique name, if any.
    pub name: Option<&'a str>,
    /// Sorted, unique classes.
    pub classes: &'a [Box<str>],
    /// Sorted, unique active pseudo-classes.
    pub pseudos: &'a [Box<str>],
}

impl<'a> SelectorInputs<'a> {
    /// Constructs selector inputs from borrowed parts.
    ///
    /// # Panics (debug only)
    ///
    /// Panics in debug builds if the slices are not sorted and deduplicated.
    #[must_use]
    pub fn new(
        type_name: &'a str,
        name: Option<&'a str>,
        classes: &'a [Box<str>],
        pseudos: &'a [Box<str>],
    ) -> Self {
        debug_assert!(is_sorted_unique(classes), "`classes` must be sorted and unique");
        debug_assert!(is_sorted_unique(pseudos), "`pseudos` must be sorted and unique");
        Self {
            type_name,
            name,
            classes,
            pseudos,
        }
    }
}

fn is_sorted_unique<T: Ord>(slice: &[T]) -> bool {
    slice.windows(2).all(|w| w[0] < w[1])
}

/// The tree shape selectors match against.
///
/// Implemented by the element tree; tests implement it over plain vectors.
pub trait SelectorTree {
    /// Node handle.
    type Node: Copy + Eq;

    /// Returns the parent of `node`, `None` for roots and unknown nodes.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the children of `node` in document order.
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// Returns the top-level nodes in document order.
    fn roots(&self) -> &[Self::Node];

    /// Returns the selector inputs of `node`, `None` for unknown nodes.
    fn inputs(&self, node: Self::Node) -> Option<SelectorInputs<'_>>;
}

/// How a part relates to the part on its left.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Whitespace: the left part matches any ancestor.
    Descendant,
    /// `>`: the left part matches the immediate parent.
    Child,
}

/// One compound of a selector: `Type#name.class:pseudo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorPart {
    type_name: Option<Box<str>>,
    name: Option<Box<str>>,
    classes: IdSet<Box<str>>,
    pseudo: Option<Box<str>>,
    combinator: Combinator,
}

impl SelectorPart {
    /// Returns the type constraint; `None` means any type (`*` or omitted).
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Returns the `#name` constraint.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the required classes.
    #[must_use]
    pub fn classes(&self) -> &[Box<str>] {
        self.classes.as_slice()
    }

    /// Returns the required pseudo-class.
    #[must_use]
    pub fn pseudo(&self) -> Option<&str> {
        self.pseudo.as_deref()
    }

    /// Returns how this part relates to the part on its left.
    ///
    /// Meaningless for the first part, which reports [`Combinator::Descendant`].
    #[must_use]
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Returns `true` if this part is the `:trigger-root` anchor.
    #[must_use]
    pub fn is_trigger_root(&self) -> bool {
        self.pseudo.as_deref() == Some(TRIGGER_ROOT)
    }

    fn specificity(&self) -> Specificity {
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Specificity(
            u32::from(self.name.is_some()),
            count(self.classes.len()),
            u32::from(self.type_name.is_some()),
            u32::from(self.pseudo.is_some() && !self.is_trigger_root()),
        )
    }

    fn matches_inputs(&self, inputs: &SelectorInputs<'_>, is_root: bool) -> bool {
        if let Some(type_name) = &self.type_name
            && !type_name.eq_ignore_ascii_case(inputs.type_name)
        {
            return false;
        }
        if self.name.is_some() && self.name.as_deref() != inputs.name {
            return false;
        }
        if !self.classes.is_subset_of_slice(inputs.classes) {
            return false;
        }
        match self.pseudo.as_deref() {
            None => true,
            Some(TRIGGER_ROOT) => is_root,
            Some(pseudo) => inputs
                .pseudos
                .binary_search_by(|p| (**p).cmp(pseudo))
                .is_ok(),
        }
    }
}

/// A parsed selector.
///
/// # Example
///
/// ```rust
/// use trellis_style::{Selector, Specificity};
///
/// let selector = Selector::parse("Panel > Button.primary:focused").unwrap();
/// assert_eq!(selector.parts().len(), 2);
/// assert_eq!(selector.specificity(), Specificity(0, 1, 2, 1));
/// assert!(!selector.is_rooted());
///
/// assert!(Selector::parse("Panel >").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Box<[SelectorPart]>,
    specificity: Specificity,
    text: Box<str>,
}

impl Selector {
    /// Parses selector text.
    pub fn parse(text: &str) -> Result<Self, SelectorParseError> {
        Parser::new(text).parse()
    }

    /// Returns the parts, leftmost first.
    #[must_use]
    pub fn parts(&self) -> &[SelectorPart] {
        &self.parts
    }

    /// Returns the rightmost part, the one that must match the subject node.
    #[must_use]
    pub fn subject(&self) -> &SelectorPart {
        // Parsing guarantees at least one part.
        &self.parts[self.parts.len() - 1]
    }

    /// Returns the selector's specificity.
    #[must_use]
    #[inline]
    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Returns the text this selector was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the first part is anchored with `:trigger-root`.
    #[must_use]
    pub fn is_rooted(&self) -> bool {
        self.parts[0].is_trigger_root()
    }

    /// Returns `true` if `node` matches, ignoring any root anchor.
    ///
    /// A rooted selector never matches without a root; see
    /// [`matches_rooted`](Self::matches_rooted).
    #[must_use]
    pub fn matches<T: SelectorTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        self.matches_rooted(tree, None, node)
    }

    /// Returns `true` if `node` matches with `root` as the trigger root.
    ///
    /// Non-rooted selectors ignore `root`. Rooted selectors require the first
    /// part to match `root` itself and never match when `root` is `None`.
    #[must_use]
    pub fn matches_rooted<T: SelectorTree + ?Sized>(
        &self,
        tree: &T,
        root: Option<T::Node>,
        node: T::Node,
    ) -> bool {
        let root = if self.is_rooted() {
            match root {
                Some(root) => Some(root),
                None => return false,
            }
        } else {
            None
        };
        self.match_part(tree, self.parts.len() - 1, node, root)
    }

    fn match_part<T: SelectorTree + ?Sized>(
        &self,
        tree: &T,
        index: usize,
        node: T::Node,
        root: Option<T::Node>,
    ) -> bool {
        let part = &self.parts[index];
        let Some(inputs) = tree.inputs(node) else {
            return false;
        };
        if !part.matches_inputs(&inputs, root == Some(node)) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match part.combinator {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|parent| self.match_part(tree, index - 1, parent, root)),
            Combinator::Descendant => {
                let mut ancestor = tree.parent(node);
                while let Some(candidate) = ancestor {
                    if self.match_part(tree, index - 1, candidate, root) {
                        return true;
                    }
                    if root == Some(candidate) {
                        break;
                    }
                    ancestor = tree.parent(candidate);
                }
                false
            }
        }
    }

    /// Returns every matching node in document order.
    ///
    /// Rooted selectors search the subtree of `root` (including `root`) and
    /// return nothing without one. Other selectors search the whole tree.
    pub fn select_all<T: SelectorTree + ?Sized>(
        &self,
        tree: &T,
        root: Option<T::Node>,
    ) -> Vec<T::Node> {
        let mut stack: Vec<T::Node> = if self.is_rooted() {
            match root {
                Some(root) => alloc::vec![root],
                None => return Vec::new(),
            }
        } else {
            tree.roots().iter().rev().copied().collect()
        };
        let mut found = Vec::new();
        while let Some(node) = stack.pop() {
            if self.matches_rooted(tree, root, node) {
                found.push(node);
            }
            stack.extend(tree.children(node).iter().rev().copied());
        }
        found
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.text).finish()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Selector {
    type Err = SelectorParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self, kind: SelectorErrorKind) -> SelectorParseError {
        SelectorParseError {
            position: self.pos,
            kind,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skips whitespace and returns `true` if any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.bump();
        }
        self.pos != start
    }

    fn ident(&mut self) -> Result<Box<str>, SelectorParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error(SelectorErrorKind::ExpectedIdent));
        }
        Ok(self.text[start..self.pos].into())
    }

    fn parse(mut self) -> Result<Selector, SelectorParseError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error(SelectorErrorKind::Empty));
        }

        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            parts.push(self.part(combinator)?);

            let had_ws = self.skip_ws();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    if self.peek().is_none() {
                        return Err(self.error(SelectorErrorKind::DanglingCombinator));
                    }
                    combinator = Combinator::Child;
                }
                Some(_) if had_ws => combinator = Combinator::Descendant,
                Some(c) => return Err(self.error(SelectorErrorKind::UnexpectedChar(c))),
            }
        }

        if parts.iter().skip(1).any(SelectorPart::is_trigger_root) {
            return Err(SelectorParseError {
                position: 0,
                kind: SelectorErrorKind::MisplacedTriggerRoot,
            });
        }

        let specificity = parts
            .iter()
            .map(SelectorPart::specificity)
            .fold(Specificity::default(), |acc, s| acc + s);
        Ok(Selector {
            parts: parts.into_boxed_slice(),
            specificity,
            text: self.text.trim().into(),
        })
    }

    fn part(&mut self, combinator: Combinator) -> Result<SelectorPart, SelectorParseError> {
        let start = self.pos;
        let mut part = SelectorPart {
            type_name: None,
            name: None,
            classes: IdSet::default(),
            pseudo: None,
            combinator,
        };
        let mut classes = Vec::new();

        match self.peek() {
            Some('*') => self.bump(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => part.type_name = Some(self.ident()?),
            Some('>') => return Err(self.error(SelectorErrorKind::DanglingCombinator)),
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    if part.name.is_some() {
                        return Err(self.error(SelectorErrorKind::DuplicateName));
                    }
                    part.name = Some(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    classes.push(self.ident()?);
                }
                Some(':') => {
                    self.bump();
                    if part.pseudo.is_some() {
                        return Err(self.error(SelectorErrorKind::DuplicatePseudoClass));
                    }
                    part.pseudo = Some(self.ident()?);
                }
                Some('*') => return Err(self.error(SelectorErrorKind::MisplacedType)),
                Some(c) if self.pos != start && (c.is_ascii_alphabetic() || c == '_') => {
                    return Err(self.error(SelectorErrorKind::MisplacedType));
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.error(SelectorErrorKind::UnexpectedChar(c)),
                None => self.error(SelectorErrorKind::Empty),
            });
        }
        part.classes = IdSet::from_ids(classes);
        Ok(part)
    }
}

#[cfg(test)]
pub(crate) mod test_tree {
    use super::*;
    use alloc::string::String;

    /// A vector-backed tree for selector tests.
    #[derive(Default)]
    pub(crate) struct TestTree {
        nodes: Vec<TestNode>,
        roots: Vec<usize>,
    }

    struct TestNode {
        type_name: String,
        name: Option<String>,
        classes: IdSet<Box<str>>,
        pseudos: IdSet<Box<str>>,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    impl TestTree {
        pub(crate) fn add(
            &mut self,
            parent: Option<usize>,
            type_name: &str,
            name: Option<&str>,
            classes: &[&str],
            pseudos: &[&str],
        ) -> usize {
            let id = self.nodes.len();
            self.nodes.push(TestNode {
                type_name: type_name.into(),
                name: name.map(Into::into),
                classes: classes.iter().map(|c| Box::from(*c)).collect(),
                pseudos: pseudos.iter().map(|c| Box::from(*c)).collect(),
                parent,
                children: Vec::new(),
            });
            match parent {
                Some(p) => self.nodes[p].children.push(id),
                None => self.roots.push(id),
            }
            id
        }
    }

    impl SelectorTree for TestTree {
        type Node = usize;

        fn parent(&self, node: usize) -> Option<usize> {
            self.nodes.get(node)?.parent
        }

        fn children(&self, node: usize) -> &[usize] {
            self.nodes.get(node).map_or(&[], |n| &n.children)
        }

        fn roots(&self) -> &[usize] {
            &self.roots
        }

        fn inputs(&self, node: usize) -> Option<SelectorInputs<'_>> {
            let n = self.nodes.get(node)?;
            Some(SelectorInputs::new(
                &n.type_name,
                n.name.as_deref(),
                n.classes.as_slice(),
                n.pseudos.as_slice(),
            ))
        }
    }
}
