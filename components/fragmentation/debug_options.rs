/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Debugging switches for continuation chain maintenance.

use serde::{Deserialize, Serialize};

/// The depth of the bounded walk used to catch loops when linking continuations.
pub const DEFAULT_LOOP_CHECK_DEPTH: usize = 10;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FragmentationDebugOptions {
    /// Check every invariant of the affected continuation chains after each
    /// symmetric relinking operation.
    pub verify_continuation_chains: bool,

    /// Log every first-continuation and first-in-flow cache rewrite or purge.
    pub trace_continuation_caches: bool,

    /// How many links to follow when checking that a new link doesn't create a loop.
    pub loop_check_depth: usize,
}

impl FragmentationDebugOptions {
    pub const DEFAULT: FragmentationDebugOptions = FragmentationDebugOptions {
        verify_continuation_chains: false,
        trace_continuation_caches: false,
        loop_check_depth: DEFAULT_LOOP_CHECK_DEPTH,
    };

    /// Enable the options named in a comma-separated `debug_string`, returning the
    /// first option that couldn't be understood.
    pub fn extend(&mut self, debug_string: &str) -> Result<(), String> {
        for option in debug_string.split(',') {
            match option.trim() {
                "verify-continuation-chains" => self.verify_continuation_chains = true,
                "trace-continuation-caches" => self.trace_continuation_caches = true,
                "" => {},
                other => match other.strip_prefix("loop-check-depth=") {
                    Some(depth) => {
                        self.loop_check_depth =
                            depth.parse().map_err(|_| String::from(option))?;
                    },
                    None => return Err(String::from(option)),
                },
            };
        }
        Ok(())
    }
}

impl Default for FragmentationDebugOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extend() {
        let mut options = FragmentationDebugOptions::default();
        assert_eq!(options.loop_check_depth, DEFAULT_LOOP_CHECK_DEPTH);

        options
            .extend("verify-continuation-chains,,loop-check-depth=32")
            .unwrap();
        assert!(options.verify_continuation_chains);
        assert!(!options.trace_continuation_caches);
        assert_eq!(options.loop_check_depth, 32);
    }

    #[test]
    fn test_extend_rejects_unknown_options() {
        let mut options = FragmentationDebugOptions::default();
        assert_eq!(
            options.extend("trace-continuation-caches,dump-flow-tree"),
            Err(String::from("dump-flow-tree"))
        );
        assert!(options.trace_continuation_caches);

        assert_eq!(
            options.extend("loop-check-depth=many"),
            Err(String::from("loop-check-depth=many"))
        );
    }
}
