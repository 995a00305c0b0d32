// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while parsing selectors and compiling style sheets.

use alloc::boxed::Box;

/// What went wrong in a selector.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorErrorKind {
    /// The selector text was empty or whitespace.
    #[error("selector is empty")]
    Empty,
    /// A character that cannot start or continue a selector part.
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    /// A `#`, `.` or `:` was not followed by an identifier.
    #[error("expected an identifier")]
    ExpectedIdent,
    /// A combinator had no part on one of its sides.
    #[error("combinator is missing a selector part")]
    DanglingCombinator,
    /// A part carried two `#name` constraints.
    #[error("a selector part may have only one name")]
    DuplicateName,
    /// A part carried two pseudo-classes.
    #[error("a selector part may have only one pseudo-class")]
    DuplicatePseudoClass,
    /// A type constraint came after a name, class or pseudo-class.
    #[error("the type must come first in a selector part")]
    MisplacedType,
    /// `:trigger-root` appeared anywhere but the first part.
    #[error(":trigger-root is only allowed on the first selector part")]
    MisplacedTriggerRoot,
}

/// A selector failed to parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector at byte {position}: {kind}")]
pub struct SelectorParseError {
    /// Byte offset into the selector text.
    pub position: usize,
    /// The failure.
    pub kind: SelectorErrorKind,
}

/// A style sheet failed to compile.
///
/// Rules and storyboards are identified by their index in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A rule, trigger or storyboard target selector did not parse.
    #[error("rule {rule}: {source}")]
    Selector {
        /// Index of the rule (or storyboard) carrying the selector.
        rule: usize,
        /// The parse failure.
        #[source]
        source: SelectorParseError,
    },
    /// A setter, trigger or track named a property that is not registered.
    #[error("rule {rule}: unknown property `{property}`")]
    UnknownProperty {
        /// Index of the rule (or storyboard).
        rule: usize,
        /// The unknown name.
        property: Box<str>,
    },
    /// A literal did not parse for its property's type.
    #[error("rule {rule}: `{value}` is not a valid value for `{property}`")]
    InvalidValue {
        /// Index of the rule (or storyboard).
        rule: usize,
        /// The property name.
        property: Box<str>,
        /// The offending literal.
        value: Box<str>,
    },
    /// The property has no style hooks and cannot be set from a sheet.
    #[error("rule {rule}: property `{property}` is not styleable")]
    NotStyleable {
        /// Index of the rule (or storyboard).
        rule: usize,
        /// The property name.
        property: Box<str>,
    },
    /// A storyboard track targets a property that cannot be animated.
    #[error("storyboard `{storyboard}`: property `{property}` is not animatable")]
    NotAnimatable {
        /// The storyboard name.
        storyboard: Box<str>,
        /// The property name.
        property: Box<str>,
    },
    /// Two storyboards in one sheet share a name.
    #[error("storyboard `{0}` is declared more than once")]
    DuplicateStoryboard(Box<str>),
    /// Keyframe times in a track were not in ascending order.
    #[error("storyboard `{storyboard}`: keyframes for `{property}` are not in time order")]
    UnsortedKeyframes {
        /// The storyboard name.
        storyboard: Box<str>,
        /// The property name.
        property: Box<str>,
    },
    /// A property trigger condition named an unknown or non-styleable property.
    #[error("rule {rule}: trigger condition on unknown property `{property}`")]
    UnknownTriggerProperty {
        /// Index of the rule.
        rule: usize,
        /// The property name.
        property: Box<str>,
    },
}
