/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use app_units::Au;
use bitflags::bitflags;
use log::debug;

use crate::continuation::ContinuationChain;
use crate::debug_options::FragmentationDebugOptions;
use crate::fragment::{ContinuationLinks, FragmentHost, FragmentId, FragmentStyle, FragmentType};
use crate::logical_geometry::WritingMode;
use crate::properties::FragmentProperties;

bitflags! {
    /// Layout state of a fragment that fragmentation only ever reads.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct FragmentStateFlags: u8 {
        /// The fragment holds overflowing descendants of a previous continuation
        /// instead of content of its own.
        const IS_TRUE_OVERFLOW_CONTAINER = 1 << 0;
        /// The box continues after a column-spanning sibling later on.
        const HAS_COLUMN_SPAN_SIBLINGS = 1 << 1;
        const IN_REFLOW = 1 << 2;
    }
}

/// Information necessary to create a new [`SplittableFragment`].
#[derive(Clone, Debug)]
pub struct SplittableFragmentInfo {
    pub fragment_type: FragmentType,
    pub style: Arc<FragmentStyle>,
    pub parent: Option<FragmentId>,
    /// The block size of the content box, in the fragment's own writing mode.
    pub content_block_size: Au,
    /// For fieldsets, the block size taken by the legend.
    pub legend_space: Option<Au>,
    pub state: FragmentStateFlags,
}

impl SplittableFragmentInfo {
    pub fn new(fragment_type: FragmentType, style: Arc<FragmentStyle>) -> Self {
        Self {
            fragment_type,
            style,
            parent: None,
            content_block_size: Au(0),
            legend_space: None,
            state: FragmentStateFlags::empty(),
        }
    }

    pub fn with_content_block_size(mut self, content_block_size: Au) -> Self {
        self.content_block_size = content_block_size;
        self
    }

    pub fn with_parent(mut self, parent: FragmentId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_legend_space(mut self, legend_space: Au) -> Self {
        self.legend_space = Some(legend_space);
        self
    }

    pub fn with_state(mut self, state: FragmentStateFlags) -> Self {
        self.state = state;
        self
    }
}

#[derive(Debug)]
pub struct SplittableFragment {
    pub fragment_type: FragmentType,
    pub style: Arc<FragmentStyle>,
    pub parent: Option<FragmentId>,
    pub content_block_size: Au,
    pub legend_space: Option<Au>,
    pub state: FragmentStateFlags,
    links: ContinuationLinks,
    properties: FragmentProperties,
}

impl From<SplittableFragmentInfo> for SplittableFragment {
    fn from(info: SplittableFragmentInfo) -> Self {
        Self {
            fragment_type: info.fragment_type,
            style: info.style,
            parent: info.parent,
            content_block_size: info.content_block_size,
            legend_space: info.legend_space,
            state: info.state,
            links: ContinuationLinks::default(),
            properties: FragmentProperties::default(),
        }
    }
}

/// Storage for splittable fragments, addressed by [`FragmentId`].
///
/// This plays the part of the layout code that builds and destroys fragments:
/// it creates continuations, runs the destroy hook, and updates the inputs that
/// fragmentation reads. Slots of destroyed fragments are never reused, so a stale
/// handle can't alias a newer fragment.
#[derive(Debug, Default)]
pub struct FragmentTree {
    fragments: Vec<Option<SplittableFragment>>,
    debug_options: FragmentationDebugOptions,
}

impl FragmentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug_options(debug_options: FragmentationDebugOptions) -> Self {
        Self {
            fragments: Vec::new(),
            debug_options,
        }
    }

    /// Create a fragment that isn't part of any continuation chain yet.
    pub fn insert(&mut self, info: SplittableFragmentInfo) -> FragmentId {
        let id = FragmentId::new(self.fragments.len());
        self.fragments.push(Some(info.into()));
        id
    }

    /// Create a continuation of `prev` with the same type, style and parent, and
    /// link it right after `prev`.
    pub fn create_continuation(&mut self, prev: FragmentId, fluid: bool) -> FragmentId {
        let prev_fragment = self.fragment(prev);
        let info = SplittableFragmentInfo {
            parent: prev_fragment.parent,
            legend_space: prev_fragment.legend_space,
            ..SplittableFragmentInfo::new(prev_fragment.fragment_type, prev_fragment.style.clone())
        };
        let continuation = self.insert(info);
        self.insert_continuation_after(continuation, prev, fluid);
        debug!(
            "Created {} continuation {:?} of {:?}",
            if fluid { "fluid" } else { "non-fluid" },
            continuation,
            prev
        );
        continuation
    }

    /// Destroy `fragment`, taking it out of its continuation chain first.
    pub fn destroy(&mut self, fragment: FragmentId) {
        self.disconnect_from_flow(fragment);
        self.fragments[fragment.index()] = None;
        debug!("Destroyed {:?}", fragment);
    }

    pub fn contains(&self, fragment: FragmentId) -> bool {
        self.get(fragment).is_some()
    }

    pub fn get(&self, fragment: FragmentId) -> Option<&SplittableFragment> {
        self.fragments.get(fragment.index())?.as_ref()
    }

    /// The handles of every live fragment, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = FragmentId> + '_ {
        self.fragments
            .iter()
            .enumerate()
            .filter(|(_, fragment)| fragment.is_some())
            .map(|(index, _)| FragmentId::new(index))
    }

    pub fn len(&self) -> usize {
        self.fragments.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_debug_options(&mut self, debug_options: FragmentationDebugOptions) {
        self.debug_options = debug_options;
    }

    pub fn set_content_block_size(&mut self, fragment: FragmentId, content_block_size: Au) {
        self.fragment_mut(fragment).content_block_size = content_block_size;
    }

    pub fn set_style(&mut self, fragment: FragmentId, style: Arc<FragmentStyle>) {
        self.fragment_mut(fragment).style = style;
    }

    pub fn set_legend_space(&mut self, fragment: FragmentId, legend_space: Option<Au>) {
        self.fragment_mut(fragment).legend_space = legend_space;
    }

    pub fn set_state(&mut self, fragment: FragmentId, state: FragmentStateFlags, value: bool) {
        self.fragment_mut(fragment).state.set(state, value);
    }

    fn fragment(&self, fragment: FragmentId) -> &SplittableFragment {
        match self.get(fragment) {
            Some(entry) => entry,
            None => panic!("Use of destroyed fragment {fragment:?}"),
        }
    }

    fn fragment_mut(&mut self, fragment: FragmentId) -> &mut SplittableFragment {
        match self
            .fragments
            .get_mut(fragment.index())
            .and_then(Option::as_mut)
        {
            Some(entry) => entry,
            None => panic!("Use of destroyed fragment {fragment:?}"),
        }
    }
}

impl FragmentHost for FragmentTree {
    fn links(&self, fragment: FragmentId) -> &ContinuationLinks {
        &self.fragment(fragment).links
    }

    fn links_mut(&mut self, fragment: FragmentId) -> &mut ContinuationLinks {
        &mut self.fragment_mut(fragment).links
    }

    fn fragment_type(&self, fragment: FragmentId) -> FragmentType {
        self.fragment(fragment).fragment_type
    }

    fn style(&self, fragment: FragmentId) -> &FragmentStyle {
        &self.fragment(fragment).style
    }

    fn content_block_size(&self, fragment: FragmentId, writing_mode: WritingMode) -> Au {
        let fragment = self.fragment(fragment);
        debug_assert_eq!(
            fragment.style.writing_mode.is_vertical(),
            writing_mode.is_vertical(),
            "Content block sizes are only stored for parallel writing modes"
        );
        fragment.content_block_size
    }

    fn is_true_overflow_container(&self, fragment: FragmentId) -> bool {
        self.fragment(fragment)
            .state
            .contains(FragmentStateFlags::IS_TRUE_OVERFLOW_CONTAINER)
    }

    fn has_column_span_siblings(&self, fragment: FragmentId) -> bool {
        self.fragment(fragment)
            .state
            .contains(FragmentStateFlags::HAS_COLUMN_SPAN_SIBLINGS)
    }

    fn is_in_reflow(&self, fragment: FragmentId) -> bool {
        self.fragment(fragment)
            .state
            .contains(FragmentStateFlags::IN_REFLOW)
    }

    fn parent(&self, fragment: FragmentId) -> Option<FragmentId> {
        self.fragment(fragment).parent
    }

    fn legend_space(&self, fragment: FragmentId) -> Option<Au> {
        let fragment = self.fragment(fragment);
        match fragment.fragment_type {
            FragmentType::FieldSet => Some(fragment.legend_space.unwrap_or(Au(0))),
            _ => None,
        }
    }

    fn properties(&self, fragment: FragmentId) -> &FragmentProperties {
        &self.fragment(fragment).properties
    }

    fn properties_mut(&mut self, fragment: FragmentId) -> &mut FragmentProperties {
        &mut self.fragment_mut(fragment).properties
    }

    fn debug_options(&self) -> &FragmentationDebugOptions {
        &self.debug_options
    }
}
