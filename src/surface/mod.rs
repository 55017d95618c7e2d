//! Boundary to the interaction surface the dwell engine drives.
//!
//! The engine never talks to a concrete UI tree: it sees an
//! [`InteractionSurface`] that answers hit-tests and turns one opaque
//! `activate` call into whatever low-level event sequence the toolkit needs.
//! Adapters own the translation; tests inject a scripted fake.

#[cfg(windows)]
pub mod uia;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::geometry::{Point, Rect, ViewportSize};

/// Closed set of interactive element kinds the engine understands.
///
/// Each kind carries its own activation strategy inside the adapter: plain
/// clickables get exactly one synthesized click, text entry gets
/// focus + click + caret placement, selection lists go through the mirrored
/// option picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Button,
    Link,
    TextInput,
    TextArea,
    ContentEditable,
    SelectList,
    GenericClickable,
}

impl TargetKind {
    /// Kinds that accept a text caret.
    pub fn is_text_entry(self) -> bool {
        matches!(
            self,
            TargetKind::TextInput | TargetKind::TextArea | TargetKind::ContentEditable
        )
    }

    /// Kinds the target search prefers over plain clickables when both match
    /// along the same ancestor chain.
    pub fn is_input_like(self) -> bool {
        self.is_text_entry() || self == TargetKind::SelectList
    }
}

/// Errors crossing the adapter boundary. All of them are handled inside the
/// frame loop; none aborts it.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("interaction surface unavailable: {0}")]
    Unavailable(String),
    #[error("hit-test failed: {0}")]
    HitTest(String),
    #[error("event dispatch failed: {0}")]
    Dispatch(String),
}

/// What `activate` did with the target.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// The kind-specific event sequence was dispatched.
    Dispatched,
    /// The target is a selection control that cannot be driven reliably with
    /// synthetic events; the engine should open the mirrored option picker
    /// over these options instead.
    NeedsOptionPicker(Vec<String>),
}

/// Capability contract of the target surface.
///
/// `Node` is an opaque element reference with identity comparison: the same
/// on-surface element must compare equal across frames.
pub trait InteractionSurface {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Whether the surface document is currently reachable.
    fn is_ready(&self) -> bool;

    /// Size of the surface viewport, for coordinate mapping.
    fn viewport(&self) -> ViewportSize;

    /// Topmost element at a point in surface coordinates.
    fn topmost_at(&self, point: Point) -> Result<Option<Self::Node>, SurfaceError>;

    /// Containment parent, if any.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// The interactive kind of this node, or `None` for passive content.
    fn interactive_kind(&self, node: &Self::Node) -> Option<TargetKind>;

    fn node_rect(&self, node: &Self::Node) -> Option<Rect>;

    /// Whether the node is still part of the element tree.
    fn node_alive(&self, node: &Self::Node) -> bool {
        true
    }

    /// Bumped whenever the interactive element set may have changed; backed by
    /// push notifications or bounded-interval polling inside the adapter.
    fn revision(&self) -> u64 {
        0
    }

    /// Rate-limited pointer-move forwarding so in-surface hover stays live.
    fn pointer_moved(&mut self, _point: Point) {}

    /// Visual lock marker on/off. Rendering is the adapter's business.
    fn set_highlight(&mut self, _node: &Self::Node, _on: bool) {}

    /// One opaque activation. The adapter translates it into the event
    /// sequence the kind requires. Must not commit partial state on failure.
    fn activate(
        &mut self,
        node: &Self::Node,
        kind: TargetKind,
        point: Point,
    ) -> Result<ActivationOutcome, SurfaceError>;

    /// Commits an option chosen in the mirrored picker back to the selection
    /// control it mirrors.
    fn commit_option(&mut self, node: &Self::Node, index: usize) -> Result<(), SurfaceError>;
}
