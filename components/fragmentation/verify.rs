/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A full consistency check of a continuation chain, for tests and for the
//! `verify-continuation-chains` debug option.

use rustc_hash::FxHashSet;

use crate::continuation::ContinuationChain;
use crate::fragment::{FragmentHost, FragmentId, FragmentType};
use crate::properties::FragmentProperty;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ContinuationChainError {
    #[error("{fragment:?} links to {neighbour:?}, which links back to {back_link:?}")]
    AsymmetricLink {
        fragment: FragmentId,
        neighbour: FragmentId,
        back_link: Option<FragmentId>,
    },
    #[error("{prev:?} ({prev_type:?}) is continued by {next:?} ({next_type:?})")]
    TypeMismatch {
        prev: FragmentId,
        prev_type: FragmentType,
        next: FragmentId,
        next_type: FragmentType,
    },
    #[error("the continuation chain of {fragment:?} loops")]
    Loop { fragment: FragmentId },
    #[error("{fragment:?} is a fluid continuation without a prev continuation")]
    FluidWithoutPrev { fragment: FragmentId },
    #[error("{fragment:?} caches {cached:?} as its first continuation instead of {actual:?}")]
    StaleFirstContinuation {
        fragment: FragmentId,
        cached: FragmentId,
        actual: FragmentId,
    },
    #[error("{fragment:?} caches {cached:?} as its first in flow instead of {actual:?}")]
    StaleFirstInFlow {
        fragment: FragmentId,
        cached: FragmentId,
        actual: FragmentId,
    },
    #[error("{fragment:?} caches a consumed block size but is a first continuation")]
    ConsumedBlockSizeOnFirstContinuation { fragment: FragmentId },
}

/// Check every invariant of the continuation chain that contains `fragment`,
/// returning the first violation found.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "verify_continuation_chain",
        skip_all,
        fields(servo_profiling = true),
        level = "trace",
    )
)]
pub fn verify_continuation_chain<H: FragmentHost + ?Sized>(
    host: &H,
    fragment: FragmentId,
) -> Result<(), ContinuationChainError> {
    // Walk to the head without trusting any cache, checking the prev links on the way.
    let mut visited = FxHashSet::default();
    let mut head = fragment;
    visited.insert(head);
    while let Some(prev) = host.prev_continuation(head) {
        if !visited.insert(prev) {
            return Err(ContinuationChainError::Loop { fragment });
        }
        let back_link = host.next_continuation(prev);
        if back_link != Some(head) {
            return Err(ContinuationChainError::AsymmetricLink {
                fragment: head,
                neighbour: prev,
                back_link,
            });
        }
        head = prev;
    }

    visited.clear();
    let mut head_in_flow = head;
    let mut current = Some(head);
    while let Some(fragment) = current {
        if !visited.insert(fragment) {
            return Err(ContinuationChainError::Loop { fragment });
        }

        let prev = host.prev_continuation(fragment);
        if prev.is_none() && host.is_fluid_continuation(fragment) {
            return Err(ContinuationChainError::FluidWithoutPrev { fragment });
        }
        if prev.is_none() &&
            host.properties(fragment)
                .contains(FragmentProperty::ConsumedBlockSize)
        {
            return Err(ContinuationChainError::ConsumedBlockSizeOnFirstContinuation { fragment });
        }

        if host.prev_in_flow(fragment).is_none() {
            head_in_flow = fragment;
        }
        let links = host.links(fragment);
        if let Some(cached) = links.cached_first_continuation() {
            if cached != head {
                return Err(ContinuationChainError::StaleFirstContinuation {
                    fragment,
                    cached,
                    actual: head,
                });
            }
        }
        if let Some(cached) = links.cached_first_in_flow() {
            if cached != head_in_flow {
                return Err(ContinuationChainError::StaleFirstInFlow {
                    fragment,
                    cached,
                    actual: head_in_flow,
                });
            }
        }

        let next = host.next_continuation(fragment);
        if let Some(next) = next {
            let back_link = host.prev_continuation(next);
            if back_link != Some(fragment) {
                return Err(ContinuationChainError::AsymmetricLink {
                    fragment,
                    neighbour: next,
                    back_link,
                });
            }
            let (prev_type, next_type) = (host.fragment_type(fragment), host.fragment_type(next));
            if prev_type != next_type {
                return Err(ContinuationChainError::TypeMismatch {
                    prev: fragment,
                    prev_type,
                    next,
                    next_type,
                });
            }
        }
        current = next;
    }

    Ok(())
}
