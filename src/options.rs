//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

/// The default maximum nesting depth of the object graph.
///
/// Resolution recurses once per level, so the limit must fit the 2 MiB stack
/// of a spawned thread in an unoptimized build.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The default maximum number of objects a document may declare.
pub const DEFAULT_MAX_OBJECTS: usize = 1 << 24;

/// Limits applied while decoding untrusted documents.
///
/// ```
/// use bplist_graph::DecodeOptions;
///
/// let options = DecodeOptions::default().max_depth(64);
/// assert_eq!(options.max_depth, 64);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DecodeOptions {
    /// The deepest a container may be nested below the root, which is at depth 0.
    pub max_depth: usize,
    /// The largest object count the trailer may declare. Checked before
    /// anything sized by the object count is allocated.
    pub max_objects: usize,
}

impl DecodeOptions {

    /// Sets the maximum nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of objects.
    pub fn max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_objects: DEFAULT_MAX_OBJECTS,
        }
    }
}
