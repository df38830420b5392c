/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;

use app_units::Au;
use bitflags::bitflags;

use crate::debug_options::FragmentationDebugOptions;
use crate::logical_geometry::WritingMode;
use crate::properties::FragmentProperties;

/// A stable handle to a fragment owned by a [`FragmentHost`]. Two handles refer to
/// the same fragment if and only if they are equal.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FragmentId(u32);

impl FragmentId {
    pub fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => FragmentId(index),
            Err(_) => panic!("Fragment index {index} doesn't fit in a FragmentId"),
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FragmentId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "Fragment#{}", self.0)
    }
}

/// The kind of box a fragment was generated for. Only fragments of the same type
/// may be continuations of each other.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FragmentType {
    Block,
    Inline,
    Text,
    FieldSet,
    Table,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ContinuationFlags: u8 {
        /// The link from the previous continuation into this fragment is fluid:
        /// it was produced by overflow or pagination rather than a forced break.
        const IS_FLUID_CONTINUATION = 1 << 0;
    }
}

/// The continuation links and head caches stored on every splittable fragment.
///
/// Hosts only ever create these with `Default` and hand them out through
/// [`FragmentHost::links`]; all rewiring goes through
/// [`crate::ContinuationChain`].
#[derive(Clone, Debug, Default)]
pub struct ContinuationLinks {
    pub(crate) prev_continuation: Option<FragmentId>,
    pub(crate) next_continuation: Option<FragmentId>,
    /// `None` means the cache is stale and has to be recomputed by walking.
    pub(crate) first_continuation: Option<FragmentId>,
    /// `None` means the cache is stale and has to be recomputed by walking.
    pub(crate) first_in_flow: Option<FragmentId>,
    pub(crate) flags: ContinuationFlags,
}

impl ContinuationLinks {
    /// The cached head of the continuation chain, if the cache is populated.
    pub fn cached_first_continuation(&self) -> Option<FragmentId> {
        self.first_continuation
    }

    /// The cached head of the in-flow chain, if the cache is populated.
    pub fn cached_first_in_flow(&self) -> Option<FragmentId> {
        self.first_in_flow
    }

    pub fn flags(&self) -> ContinuationFlags {
        self.flags
    }

    pub fn is_linked(&self) -> bool {
        self.prev_continuation.is_some() || self.next_continuation.is_some()
    }
}

/// <https://drafts.csswg.org/css-break/#break-decoration>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BoxDecorationBreak {
    #[default]
    Slice,
    Clone,
}

/// The anonymous or pseudo-element role a fragment's style was computed for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PseudoStyleType {
    #[default]
    NotPseudo,
    /// The anonymous box holding the content of a `<fieldset>`, below its legend.
    FieldsetContent,
}

/// The computed style inputs that fragmentation reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FragmentStyle {
    pub writing_mode: WritingMode,
    pub box_decoration_break: BoxDecorationBreak,
    pub pseudo: PseudoStyleType,
}

/// The parts of the reflow state of a fragment used to size its continuations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReflowInput {
    /// The computed block size of the box, or `None` when it is unconstrained.
    pub computed_block_size: Option<Au>,
}

impl ReflowInput {
    pub fn new(computed_block_size: Option<Au>) -> Self {
        Self {
            computed_block_size,
        }
    }
}

/// Everything the fragmentation code needs from whatever owns the fragments.
///
/// The host owns fragment storage and lifetime. This crate only rewires the
/// continuation links and caches returned by `links_mut` and the values stored in
/// `properties_mut`; every other query is read-only.
pub trait FragmentHost {
    fn links(&self, fragment: FragmentId) -> &ContinuationLinks;
    fn links_mut(&mut self, fragment: FragmentId) -> &mut ContinuationLinks;

    fn fragment_type(&self, fragment: FragmentId) -> FragmentType;
    fn style(&self, fragment: FragmentId) -> &FragmentStyle;

    fn writing_mode(&self, fragment: FragmentId) -> WritingMode {
        self.style(fragment).writing_mode
    }

    /// The block size of the content box of a laid out fragment, measured in `writing_mode`.
    fn content_block_size(&self, fragment: FragmentId, writing_mode: WritingMode) -> Au;

    /// Whether this fragment only holds overflowing descendants of a previous
    /// continuation, rather than content of its own.
    fn is_true_overflow_container(&self, fragment: FragmentId) -> bool;

    /// Whether the box continues after a column-spanning sibling later on.
    fn has_column_span_siblings(&self, fragment: FragmentId) -> bool;

    fn is_in_reflow(&self, fragment: FragmentId) -> bool;

    fn parent(&self, fragment: FragmentId) -> Option<FragmentId>;

    /// The block size taken by the legend of a `<fieldset>` fragment, or `None` if
    /// `fragment` is not a fieldset.
    fn legend_space(&self, fragment: FragmentId) -> Option<Au>;

    fn properties(&self, fragment: FragmentId) -> &FragmentProperties;
    fn properties_mut(&mut self, fragment: FragmentId) -> &mut FragmentProperties;

    fn debug_options(&self) -> &FragmentationDebugOptions {
        &FragmentationDebugOptions::DEFAULT
    }
}
