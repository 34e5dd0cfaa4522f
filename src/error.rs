//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::{self, Display};
use std::io;

use serde::de;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Binary property list decoding error.
///
/// Every error is terminal for the decode call which produced it. Variants
/// raised while reading the document carry the absolute byte offset or the
/// object index at which the problem was found.
#[derive(Debug, Error)]
pub enum Error {
    /// The first 8 bytes of the input are not the `bplist00` magic number.
    #[error("missing or invalid bplist00 header")]
    BadMagic,

    /// The trailer is missing, too short, or describes a document layout
    /// which cannot exist in an input of this length.
    #[error("truncated or malformed trailer in {length}-byte input: {defect}")]
    TruncatedTrailer {
        length: usize,
        defect: TrailerDefect,
    },

    /// An object payload extends past the end of the object table.
    #[error("unexpected end of object table at offset {offset:#x}")]
    Truncated { offset: usize },

    /// An integer, real or extended length field declares a byte width
    /// not supported by the format.
    #[error("unsupported {width}-byte field at offset {offset:#x}")]
    UnsupportedWidth { offset: usize, width: usize },

    /// The marker byte names a known kind with an encoding this library does not support.
    #[error("unsupported encoding for marker {marker:#04x} at offset {offset:#x}")]
    UnsupportedEncoding { offset: usize, marker: u8 },

    /// A singleton marker other than null, false or true.
    #[error("invalid singleton marker {marker:#04x} at offset {offset:#x}")]
    InvalidSingleton { offset: usize, marker: u8 },

    /// String payload is not valid ASCII or UTF-16.
    #[error("invalid string encoding at offset {offset:#x}")]
    InvalidEncoding { offset: usize },

    /// The high nibble of the marker byte is not a known object kind.
    #[error("unknown object marker {marker:#04x} at offset {offset:#x}")]
    UnknownTag { offset: usize, marker: u8 },

    /// An offset table entry points outside the object table.
    #[error("object {index} has offset {offset:#x} outside of the object table")]
    OffsetOutOfRange { index: usize, offset: usize },

    /// A container refers to an object not in the offset table.
    #[error("object {index} refers to nonexistent object {reference}")]
    DanglingReference { index: usize, reference: usize },

    /// A dictionary key resolved to an array, set or dictionary.
    #[error("object {index} cannot be used as a dictionary key")]
    UnhashableKey { index: usize },

    /// The object graph is nested deeper than the configured limit.
    #[error("object {index} exceeds the maximum nesting depth of {limit}")]
    TooDeep { index: usize, limit: usize },

    /// The trailer declares more objects than the configured limit.
    #[error("document declares {count} objects, the limit is {limit}")]
    TooManyObjects { count: usize, limit: usize },

    /// A back reference was found while deserializing into a finite type.
    #[error("cycle detected at object {index}")]
    CycleDetected { index: usize },

    /// Reading the input from the file system failed.
    #[error("unable to read input: {0}")]
    Io(#[from] io::Error),

    /// Constructed from serde deserialization errors.
    #[error("{0}")]
    Message(String),
}

/// The specific inconsistency found in a trailer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrailerDefect {
    /// The input cannot hold both the header and the trailer.
    TooShort,
    /// The offset table entry width is not 1, 2, 4 or 8.
    OffsetWidth(u8),
    /// The object reference width is not 1, 2, 4 or 8.
    ReferenceWidth(u8),
    /// The document declares no objects.
    NoObjects,
    /// The root object is not in the offset table.
    RootOutOfRange { root: usize, count: usize },
    /// The offset table overlaps the header or the trailer.
    OffsetTableOutOfRange { start: usize },
}

impl Display for TrailerDefect {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrailerDefect::TooShort =>
                formatter.write_str("input too short"),
            TrailerDefect::OffsetWidth(width) =>
                write!(formatter, "invalid offset width {}", width),
            TrailerDefect::ReferenceWidth(width) =>
                write!(formatter, "invalid object reference width {}", width),
            TrailerDefect::NoObjects =>
                formatter.write_str("no objects"),
            TrailerDefect::RootOutOfRange { root, count } =>
                write!(formatter, "root object {} not among {} objects", root, count),
            TrailerDefect::OffsetTableOutOfRange { start } =>
                write!(formatter, "offset table at {:#x} does not fit", start),
        }
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
