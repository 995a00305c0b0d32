// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors and diagnostics.

use kurbo::Rect;
use trellis_property::PropertyId;

use crate::asset::AssetError;
use crate::presentation::ViewId;
use crate::tree::NodeId;

/// A tree operation failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node was removed, or never belonged to this view.
    #[error("node {0} is not in the tree")]
    StaleNode(NodeId),
    /// The property is not registered.
    #[error("property {0} is not registered")]
    UnknownProperty(PropertyId),
    /// A value of the wrong type was written to a property.
    #[error("property `{property}` holds `{expected}`, got `{found}`")]
    TypeMismatch {
        /// Property name.
        property: &'static str,
        /// The registered value type.
        expected: &'static str,
        /// The type that was supplied.
        found: &'static str,
    },
    /// The property cannot be animated.
    #[error("property `{0}` is not animatable")]
    NotAnimatable(&'static str),
    /// The move would make a node its own ancestor.
    #[error("moving {node} under {parent} would create a cycle")]
    WouldCycle {
        /// The node being moved.
        node: NodeId,
        /// The requested parent.
        parent: NodeId,
    },
    /// The view id does not belong to this presentation.
    #[error("unknown view {0:?}")]
    UnknownView(ViewId),
}

/// Arrange was asked to do something impossible.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The rectangle had a non-finite coordinate or a negative size.
    #[error("invalid arrange rectangle {0:?}")]
    InvalidArrangeRect(Rect),
    /// The node is not in the tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Why a setter could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiagnosticKind {
    /// The active theme has no resource with this name.
    #[error("resource `{0}` is not defined")]
    MissingResource(Box<str>),
    /// A resource or asset has the wrong type for the property.
    #[error("`{source_name}` holds `{found}`, which the property does not accept")]
    TypeMismatch {
        /// Resource name or asset id.
        source_name: Box<str>,
        /// The type that was found.
        found: &'static str,
    },
    /// Loading an asset failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// A setter referenced an asset but the view has no loader.
    #[error("asset `{0}` requested but no asset loader is installed")]
    NoAssetLoader(Box<str>),
}

/// A non-fatal failure recorded while styling a node.
///
/// The property keeps its previous styled value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{node}: cannot resolve {property}: {kind}")]
pub struct Diagnostic {
    /// The node being styled.
    pub node: NodeId,
    /// The property whose value could not be resolved.
    pub property: PropertyId,
    /// What went wrong.
    pub kind: DiagnosticKind,
}
