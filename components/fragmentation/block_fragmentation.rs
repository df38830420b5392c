/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Block-direction quantities of a fragmented box: how much of its block size
//! earlier continuations used up, how much is left for a given fragment, and which
//! of its block sides carry decorations.

use std::cmp::max;

use app_units::Au;
use log::debug;

use crate::continuation::ContinuationChain;
use crate::fragment::{BoxDecorationBreak, FragmentId, PseudoStyleType, ReflowInput};
use crate::logical_geometry::{LogicalSide, LogicalSideFlags, LogicalSides};
use crate::properties::FragmentProperty;

pub trait BlockFragmentation: ContinuationChain {
    /// The sum of the content block sizes of every previous continuation of
    /// `fragment`, cached on `fragment` for its later continuations to reuse.
    ///
    /// Continuations are expected to ask for this in order, first to last, so that
    /// each walk stops at the nearest previous continuation with a cached value.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "BlockFragmentation::consumed_block_size",
            skip_all,
            fields(servo_profiling = true),
            level = "trace",
        )
    )]
    fn consumed_block_size(&mut self, fragment: FragmentId) -> Au {
        let Some(mut prev) = self.prev_continuation(fragment) else {
            return Au(0);
        };

        let writing_mode = self.writing_mode(fragment);
        let mut block_size = Au(0);
        loop {
            // Overflow containers might not get reflowed, and they have no block size anyway.
            if !self.is_true_overflow_container(prev) {
                block_size += self.content_block_size(prev, writing_mode);
                if let Some(consumed) = self
                    .properties(prev)
                    .get(FragmentProperty::ConsumedBlockSize)
                {
                    block_size += consumed;
                    break;
                }
                debug_assert!(
                    self.prev_continuation(prev).is_none(),
                    "Property should always be set on prev continuation if not the first continuation"
                );
            }
            match self.prev_continuation(prev) {
                Some(earlier) => prev = earlier,
                None => break,
            }
        }

        debug!("consumed_block_size: {:?} -> {:?}", fragment, block_size);
        self.properties_mut(fragment)
            .set(FragmentProperty::ConsumedBlockSize, block_size);
        block_size
    }

    fn cached_consumed_block_size(&self, fragment: FragmentId) -> Option<Au> {
        self.properties(fragment)
            .get(FragmentProperty::ConsumedBlockSize)
    }

    fn invalidate_consumed_block_size(&mut self, fragment: FragmentId) {
        self.properties_mut(fragment)
            .remove(FragmentProperty::ConsumedBlockSize);
    }

    /// The part of the computed block size of `reflow_input` left for `fragment`,
    /// once `consumed_block_size` has been laid out in earlier continuations.
    /// `None` if the computed block size is unconstrained.
    fn effective_computed_block_size(
        &self,
        fragment: FragmentId,
        reflow_input: &ReflowInput,
        consumed_block_size: Au,
    ) -> Option<Au> {
        debug_assert!(
            self.is_in_reflow(fragment),
            "Asking for the effective block size of a fragment outside of reflow"
        );
        let mut block_size = reflow_input.computed_block_size?;
        block_size -= consumed_block_size;

        // The inner fragments of a fieldset are special, since some of their content
        // box may be consumed by the legend placed above it in each fragment of the
        // fieldset.
        if self.is_true_overflow_container(fragment) &&
            self.style(fragment).pseudo == PseudoStyleType::FieldsetContent
        {
            let mut fieldset = self.parent(fragment);
            while let Some(current) = fieldset {
                let Some(legend_space) = self.legend_space(current) else {
                    break;
                };
                block_size -= legend_space;
                fieldset = self.prev_in_flow(current);
            }
        }

        // We may have stretched the fragment beyond its computed block size.
        Some(max(Au(0), block_size))
    }

    /// The block sides of `fragment` whose border and padding are not drawn because
    /// the box continues in another fragment on that side.
    fn block_level_logical_skip_sides(
        &self,
        fragment: FragmentId,
        after_reflow: bool,
    ) -> LogicalSides {
        let mut skip = LogicalSides::new(self.writing_mode(fragment));
        if self.is_true_overflow_container(fragment) {
            skip.insert_sides(LogicalSideFlags::BLOCK_BOTH);
            return skip;
        }

        if self.style(fragment).box_decoration_break == BoxDecorationBreak::Clone {
            return skip;
        }

        if self.prev_continuation(fragment).is_some() {
            skip.insert(LogicalSide::BlockStart);
        }

        // Always skip the block-end side if we have a *later* sibling across a
        // column-span split.
        if self.has_column_span_siblings(fragment) {
            skip.insert(LogicalSide::BlockEnd);
        }

        if after_reflow {
            let next = self.next_continuation(fragment);
            if next.is_some_and(|next| !self.is_true_overflow_container(next)) {
                skip.insert(LogicalSide::BlockEnd);
            }
        }

        skip
    }
}

impl<H: ContinuationChain + ?Sized> BlockFragmentation for H {}
