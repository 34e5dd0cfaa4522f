//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! A decoder for binary property list (bplist00) documents.
//!
//! ```
//! let document: &[u8] = &[
//!     // Header
//!     b'b', b'p', b'l', b'i', b's', b't', b'0', b'0',
//!     // Objects: ["a", "a"], "a"
//!     0xA2, 0x01, 0x01,
//!     0x51, b'a',
//!     // Offset table
//!     0x08, 0x0B,
//!     // Trailer
//!     0, 0, 0, 0, 0, 0, 1, 1,
//!     0, 0, 0, 0, 0, 0, 0, 2,
//!     0, 0, 0, 0, 0, 0, 0, 0,
//!     0, 0, 0, 0, 0, 0, 0, 13,
//! ];
//!
//! let root = bplist_graph::decode(document)?;
//! let elements = root.as_object().and_then(|object| object.as_elements()).unwrap();
//! assert_eq!(elements[0].as_object().and_then(|object| object.as_str()), Some("a"));
//! assert!(elements[0].same_object(&elements[1]));
//! # Ok::<(), bplist_graph::Error>(())
//! ```

mod de;
mod document;
mod error;
mod options;

pub mod object;
pub use object::{from_value, Date, Dictionary, Key, Object, Value};

pub use de::{decode, decode_file, decode_with_options, from_slice, Decoder};
pub use document::{ObjectFormat, OffsetTable, RawObject, Trailer};
pub use error::{Error, Result, TrailerDefect};
pub use options::DecodeOptions;
