/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Continuation chains: the doubly-linked list of fragments a single box has been
//! split into across lines, columns or pages.
//!
//! Every fragment stores one pair of neighbour links. A link is *fluid* when the
//! later fragment has [`ContinuationFlags::IS_FLUID_CONTINUATION`] set, which means
//! the box simply overflowed into it. The fluid links form contiguous runs of the
//! continuation chain, the in-flow chains. Each fragment also caches the heads of
//! both chains, so that `first_continuation` and `first_in_flow` are usually O(1).

use log::{debug, error, trace};

use crate::fragment::{ContinuationFlags, FragmentHost, FragmentId};
use crate::properties::FragmentProperty;
use crate::verify::verify_continuation_chain;

/// Continuation chain queries and rewiring, available on every [`FragmentHost`].
///
/// The four setters only rewrite the side of the link their name refers to; the
/// caller is responsible for wiring the other endpoint too.
pub trait ContinuationChain: FragmentHost {
    fn prev_continuation(&self, fragment: FragmentId) -> Option<FragmentId> {
        self.links(fragment).prev_continuation
    }

    fn next_continuation(&self, fragment: FragmentId) -> Option<FragmentId> {
        self.links(fragment).next_continuation
    }

    fn is_fluid_continuation(&self, fragment: FragmentId) -> bool {
        self.links(fragment)
            .flags
            .contains(ContinuationFlags::IS_FLUID_CONTINUATION)
    }

    fn prev_in_flow(&self, fragment: FragmentId) -> Option<FragmentId> {
        if self.is_fluid_continuation(fragment) {
            self.prev_continuation(fragment)
        } else {
            None
        }
    }

    fn next_in_flow(&self, fragment: FragmentId) -> Option<FragmentId> {
        self.next_continuation(fragment)
            .filter(|next| self.is_fluid_continuation(*next))
    }

    fn set_prev_continuation(&mut self, fragment: FragmentId, prev: Option<FragmentId>) {
        debug_assert!(
            has_same_type(&*self, fragment, prev),
            "setting a prev continuation with incorrect type!"
        );
        debug_assert!(
            !is_in_prev_continuation_chain(&*self, prev, fragment),
            "creating a loop in continuation chain!"
        );
        let links = self.links_mut(fragment);
        links.prev_continuation = prev;
        links.flags.remove(ContinuationFlags::IS_FLUID_CONTINUATION);
        update_first_continuation_and_first_in_flow_cache(self, fragment);
    }

    fn set_prev_in_flow(&mut self, fragment: FragmentId, prev: Option<FragmentId>) {
        debug_assert!(
            has_same_type(&*self, fragment, prev),
            "setting a prev in flow with incorrect type!"
        );
        debug_assert!(
            !is_in_prev_continuation_chain(&*self, prev, fragment),
            "creating a loop in continuation chain!"
        );
        let links = self.links_mut(fragment);
        links.prev_continuation = prev;
        // A fragment without a prev continuation is never fluid.
        links
            .flags
            .set(ContinuationFlags::IS_FLUID_CONTINUATION, prev.is_some());
        update_first_continuation_and_first_in_flow_cache(self, fragment);
    }

    fn set_next_continuation(&mut self, fragment: FragmentId, next: Option<FragmentId>) {
        debug_assert!(
            has_same_type(&*self, fragment, next),
            "setting a next continuation with incorrect type!"
        );
        debug_assert!(
            !is_in_next_continuation_chain(&*self, next, fragment),
            "creating a loop in continuation chain!"
        );
        self.links_mut(fragment).next_continuation = next;
        if let Some(next) = next {
            self.links_mut(next)
                .flags
                .remove(ContinuationFlags::IS_FLUID_CONTINUATION);
        }
    }

    fn set_next_in_flow(&mut self, fragment: FragmentId, next: Option<FragmentId>) {
        debug_assert!(
            has_same_type(&*self, fragment, next),
            "setting a next in flow with incorrect type!"
        );
        debug_assert!(
            !is_in_next_continuation_chain(&*self, next, fragment),
            "creating a loop in continuation chain!"
        );
        self.links_mut(fragment).next_continuation = next;
        if let Some(next) = next {
            self.links_mut(next)
                .flags
                .insert(ContinuationFlags::IS_FLUID_CONTINUATION);
        }
    }

    fn first_continuation(&self, fragment: FragmentId) -> FragmentId {
        if let Some(first) = self.links(fragment).first_continuation {
            return first;
        }

        // We fall back to the slow path during fragment destruction, where the
        // cache was purged.
        let mut first = fragment;
        while let Some(prev) = self.prev_continuation(first) {
            first = prev;
        }
        first
    }

    fn last_continuation(&self, fragment: FragmentId) -> FragmentId {
        let mut last = fragment;
        while let Some(next) = self.next_continuation(last) {
            last = next;
        }
        last
    }

    fn first_in_flow(&self, fragment: FragmentId) -> FragmentId {
        if let Some(first) = self.links(fragment).first_in_flow {
            return first;
        }

        let mut first = fragment;
        while let Some(prev) = self.prev_in_flow(first) {
            first = prev;
        }
        first
    }

    fn last_in_flow(&self, fragment: FragmentId) -> FragmentId {
        let mut last = fragment;
        while let Some(next) = self.next_in_flow(last) {
            last = next;
        }
        last
    }

    /// `fragment` followed by each of its later continuations.
    fn continuations(&self, fragment: FragmentId) -> Continuations<'_, Self> {
        Continuations {
            host: self,
            next: Some(fragment),
            in_flow_only: false,
        }
    }

    /// `fragment` followed by each of its later fluid continuations.
    fn in_flow(&self, fragment: FragmentId) -> Continuations<'_, Self> {
        Continuations {
            host: self,
            next: Some(fragment),
            in_flow_only: true,
        }
    }

    /// Hook a newly created `fragment` into the flow after `prev_in_flow`.
    fn init_continuation(&mut self, fragment: FragmentId, prev_in_flow: Option<FragmentId>) {
        if let Some(prev_in_flow) = prev_in_flow {
            self.insert_continuation_after(fragment, prev_in_flow, true);
        }
    }

    /// Link the unlinked `fragment` right after `prev`, fluidly or not. If `prev`
    /// already had a next continuation, it now follows `fragment` and keeps the
    /// fluidity of its old link.
    fn insert_continuation_after(&mut self, fragment: FragmentId, prev: FragmentId, fluid: bool) {
        debug_assert!(
            !self.links(fragment).is_linked(),
            "inserting a fragment that is already part of a continuation chain!"
        );
        let old_next = self.next_continuation(prev);
        let old_next_was_fluid = self.next_in_flow(prev).is_some();

        if fluid {
            self.set_prev_in_flow(fragment, Some(prev));
            self.set_next_in_flow(prev, Some(fragment));
        } else {
            self.set_prev_continuation(fragment, Some(prev));
            self.set_next_continuation(prev, Some(fragment));
        }

        if let Some(next) = old_next {
            if old_next_was_fluid {
                self.set_next_in_flow(fragment, Some(next));
                self.set_prev_in_flow(next, Some(fragment));
            } else {
                self.set_next_continuation(fragment, Some(next));
                self.set_prev_continuation(next, Some(fragment));
            }
        }
        verify_after_relinking(&*self, [fragment]);
    }

    /// Splice `fragment` out of its continuation chain, linking its neighbours to
    /// each other. The new link is fluid only if both links of `fragment` were.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "ContinuationChain::remove_from_flow",
            skip_all,
            fields(servo_profiling = true),
            level = "trace",
        )
    )]
    fn remove_from_flow(&mut self, fragment: FragmentId) {
        let prev = self.prev_continuation(fragment);
        let next = self.next_continuation(fragment);
        let fluid = self.prev_in_flow(fragment).is_some() && self.next_in_flow(fragment).is_some();
        debug!(
            "remove_from_flow: {:?} (prev={:?}, next={:?}, fluid={})",
            fragment, prev, next, fluid
        );

        if fluid {
            if let Some(prev) = prev {
                self.set_next_in_flow(prev, next);
            }
            if let Some(next) = next {
                self.set_prev_in_flow(next, prev);
            }
        } else {
            if let Some(prev) = prev {
                self.set_next_continuation(prev, next);
            }
            if let Some(next) = next {
                self.set_prev_continuation(next, prev);
            }
        }

        // The next link has to be cleared before the prev link: clearing the prev
        // link purges the head caches of every later continuation, and those must
        // no longer include the fragments we were just detached from.
        self.set_next_in_flow(fragment, None);
        self.set_prev_in_flow(fragment, None);

        // The consumed block size only makes sense for a fragment with a prev continuation.
        self.properties_mut(fragment)
            .remove(FragmentProperty::ConsumedBlockSize);
        if let (None, Some(next)) = (prev, next) {
            self.properties_mut(next)
                .remove(FragmentProperty::ConsumedBlockSize);
        }

        verify_after_relinking(&*self, prev.or(next).into_iter().chain([fragment]));
    }

    /// The hook to run when `fragment` is about to be destroyed.
    fn disconnect_from_flow(&mut self, fragment: FragmentId) {
        if self.links(fragment).is_linked() {
            self.remove_from_flow(fragment);
        }
    }
}

impl<H: FragmentHost + ?Sized> ContinuationChain for H {}

/// An iterator over a fragment and its later continuations.
pub struct Continuations<'a, H: ?Sized> {
    host: &'a H,
    next: Option<FragmentId>,
    in_flow_only: bool,
}

impl<H: FragmentHost + ?Sized> Iterator for Continuations<'_, H> {
    type Item = FragmentId;

    fn next(&mut self) -> Option<FragmentId> {
        let current = self.next?;
        self.next = if self.in_flow_only {
            self.host.next_in_flow(current)
        } else {
            self.host.next_continuation(current)
        };
        Some(current)
    }
}

fn has_same_type<H: FragmentHost + ?Sized>(
    host: &H,
    fragment: FragmentId,
    other: Option<FragmentId>,
) -> bool {
    other.is_none_or(|other| host.fragment_type(other) == host.fragment_type(fragment))
}

/// Whether `target` can be reached from `start` by following prev links. The walk is
/// bounded so that debug builds don't slow down too much on long chains.
fn is_in_prev_continuation_chain<H: FragmentHost + ?Sized>(
    host: &H,
    start: Option<FragmentId>,
    target: FragmentId,
) -> bool {
    let mut current = start;
    let mut iterations = 0;
    while let Some(fragment) = current {
        if iterations >= host.debug_options().loop_check_depth {
            break;
        }
        if fragment == target {
            return true;
        }
        current = host.prev_continuation(fragment);
        iterations += 1;
    }
    false
}

fn is_in_next_continuation_chain<H: FragmentHost + ?Sized>(
    host: &H,
    start: Option<FragmentId>,
    target: FragmentId,
) -> bool {
    let mut current = start;
    let mut iterations = 0;
    while let Some(fragment) = current {
        if iterations >= host.debug_options().loop_check_depth {
            break;
        }
        if fragment == target {
            return true;
        }
        current = host.next_continuation(fragment);
        iterations += 1;
    }
    false
}

/// Refresh the head caches of `fragment` and the fragments after it, once its prev
/// link has changed.
///
/// When `fragment` gains a new head, the new head is written forward. When it
/// becomes a head itself, the caches after it are purged instead: writing the new
/// head forward would make destroying a chain from the front O(n^2).
///
/// Purged caches form a run that reaches the end of the chain. A fragment linked
/// after a purged fragment joins that run, so a set cache never follows a purged
/// one, and a purge can stop at the first cache that is already purged.
fn update_first_continuation_and_first_in_flow_cache<H: FragmentHost + ?Sized>(
    host: &mut H,
    fragment: FragmentId,
) {
    let new_first_continuation = host
        .prev_continuation(fragment)
        .and_then(|prev| cached_head(host, prev, false));
    refresh_forward(host, fragment, false, new_first_continuation);

    let new_first_in_flow = host
        .prev_in_flow(fragment)
        .and_then(|prev| cached_head(host, prev, true));
    refresh_forward(host, fragment, true, new_first_in_flow);
}

/// The head `prev` can pass on to the fragment after it: `prev` itself if it is a
/// head, otherwise its cached head, which is `None` inside a purged run.
fn cached_head<H: FragmentHost + ?Sized>(
    host: &H,
    prev: FragmentId,
    in_flow: bool,
) -> Option<FragmentId> {
    let links = host.links(prev);
    if in_flow {
        match host.prev_in_flow(prev) {
            Some(_) => links.first_in_flow,
            None => Some(prev),
        }
    } else {
        match links.prev_continuation {
            Some(_) => links.first_continuation,
            None => Some(prev),
        }
    }
}

fn refresh_forward<H: FragmentHost + ?Sized>(
    host: &mut H,
    fragment: FragmentId,
    in_flow: bool,
    head: Option<FragmentId>,
) {
    let old_head = if in_flow {
        host.links(fragment).first_in_flow
    } else {
        host.links(fragment).first_continuation
    };
    let count = match head {
        Some(_) if old_head == head => return,
        Some(head) => rewrite_forward(host, fragment, in_flow, head),
        None => {
            let is_head = if in_flow {
                host.prev_in_flow(fragment).is_none()
            } else {
                host.prev_continuation(fragment).is_none()
            };
            purge_forward(host, fragment, in_flow, is_head)
        },
    };
    if count > 0 && host.debug_options().trace_continuation_caches {
        trace!(
            "{:?}: {} of {} fragment(s) is now {:?}",
            fragment,
            if in_flow { "first in flow" } else { "first continuation" },
            count,
            head
        );
    }
}

fn next_in_chain<H: FragmentHost + ?Sized>(
    host: &H,
    fragment: FragmentId,
    in_flow: bool,
) -> Option<FragmentId> {
    if in_flow {
        host.next_in_flow(fragment)
    } else {
        host.next_continuation(fragment)
    }
}

fn head_cache<H: FragmentHost + ?Sized>(
    host: &mut H,
    fragment: FragmentId,
    in_flow: bool,
) -> &mut Option<FragmentId> {
    let links = host.links_mut(fragment);
    if in_flow {
        &mut links.first_in_flow
    } else {
        &mut links.first_continuation
    }
}

/// Store `head` in one of the head caches of `fragment` and every later fragment
/// of the same chain. Returns the number of fragments touched.
fn rewrite_forward<H: FragmentHost + ?Sized>(
    host: &mut H,
    fragment: FragmentId,
    in_flow: bool,
    head: FragmentId,
) -> usize {
    let mut count = 0;
    let mut current = Some(fragment);
    while let Some(fragment) = current {
        *head_cache(host, fragment, in_flow) = Some(head);
        current = next_in_chain(&*host, fragment, in_flow);
        count += 1;
    }
    count
}

/// Purge one of the head caches of `fragment` and of the later fragments of the
/// same chain, up to the first one that is already purged. If `fragment` is a head,
/// later fragments that already cache it are left alone. Returns the number of
/// caches that were set.
fn purge_forward<H: FragmentHost + ?Sized>(
    host: &mut H,
    fragment: FragmentId,
    in_flow: bool,
    is_head: bool,
) -> usize {
    let head = fragment;
    let mut count = usize::from(head_cache(host, fragment, in_flow).take().is_some());
    let mut current = next_in_chain(&*host, fragment, in_flow);
    while let Some(fragment) = current {
        let cache = head_cache(host, fragment, in_flow);
        match *cache {
            None => break,
            Some(cached) if is_head && cached == head => break,
            Some(_) => *cache = None,
        }
        count += 1;
        current = next_in_chain(&*host, fragment, in_flow);
    }
    count
}

/// Check the chains containing `fragments` if the host asked for it.
pub(crate) fn verify_after_relinking<H: FragmentHost + ?Sized>(
    host: &H,
    fragments: impl IntoIterator<Item = FragmentId>,
) {
    if !host.debug_options().verify_continuation_chains {
        return;
    }
    for fragment in fragments {
        if let Err(violation) = verify_continuation_chain(host, fragment) {
            error!("Broken continuation chain: {}", violation);
            debug_assert!(false, "Broken continuation chain: {violation}");
        }
    }
}
