/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! Bookkeeping for boxes that are split into several fragments across lines,
//! columns or pages.
//!
//! The fragments of one box form a continuation chain. This crate maintains the
//! links of that chain and the caches derived from it, and answers the
//! block-direction questions a fragmented box asks during layout. Fragment storage
//! belongs to whoever implements [`FragmentHost`]; [`FragmentTree`] is a simple
//! arena implementation of it.

mod block_fragmentation;
mod continuation;
pub mod debug_options;
mod fragment;
mod fragment_tree;
pub mod logical_geometry;
mod properties;
mod verify;

pub use block_fragmentation::BlockFragmentation;
pub use continuation::{ContinuationChain, Continuations};
pub use debug_options::FragmentationDebugOptions;
pub use fragment::{
    BoxDecorationBreak, ContinuationFlags, ContinuationLinks, FragmentHost, FragmentId,
    FragmentStyle, FragmentType, PseudoStyleType, ReflowInput,
};
pub use fragment_tree::{
    FragmentStateFlags, FragmentTree, SplittableFragment, SplittableFragmentInfo,
};
pub use properties::{FragmentProperties, FragmentProperty};
pub use verify::{ContinuationChainError, verify_continuation_chain};
