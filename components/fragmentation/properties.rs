/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use app_units::Au;
use smallvec::SmallVec;

/// Keys of the values that can be attached to a single fragment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FragmentProperty {
    /// The block size consumed by every previous continuation of the fragment.
    /// Only ever set on fragments that have a previous continuation.
    ConsumedBlockSize,
}

/// A small per-fragment key/value store.
///
/// Fragments rarely carry more than one or two of these, so they are kept inline
/// and looked up linearly.
#[derive(Clone, Debug, Default)]
pub struct FragmentProperties {
    entries: SmallVec<[(FragmentProperty, Au); 1]>,
}

impl FragmentProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: FragmentProperty) -> Option<Au> {
        self.entries
            .iter()
            .find(|(key, _)| *key == property)
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, property: FragmentProperty) -> bool {
        self.get(property).is_some()
    }

    /// Sets `property` to `value`, replacing any previous value.
    pub fn set(&mut self, property: FragmentProperty, value: Au) {
        match self.entries.iter_mut().find(|(key, _)| *key == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    /// Removes `property`, returning its value if it was present.
    pub fn remove(&mut self, property: FragmentProperty) -> Option<Au> {
        let index = self.entries.iter().position(|(key, _)| *key == property)?;
        Some(self.entries.swap_remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
