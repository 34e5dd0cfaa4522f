//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The bplist document format.
//!
//! Constants and structures defined in this module represent the various
//! sections of a binary property list document.
//!
//! A bplist document is organized into four segments:
//!
//! 1. Header
//! 2. Object Table
//! 3. Offset Table
//! 4. Trailer
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-855.17/CFBinaryPList.c

/// The number of bytes of data required to define a bplist header.
pub const HEADER_SIZE: usize = 8;

/// The bplist magic number and version 00 marker ("bplist00").
pub const HEADER_MAGIC: &[u8] = b"bplist00";

/// The number of bytes of data required to define a bplist trailer.
pub const TRAILER_SIZE: usize = 32;

/// The number of unused bytes at the start of the trailer.
pub const TRAILER_PREAMBLE_UNUSED_SIZE: usize = 6;

/// The number of unused bytes preceding each 32-bit trailer field.
pub const TRAILER_FIELD_UNUSED_SIZE: usize = 4;

/// Binary property list offset table.
///
/// The offset table is a mapping from element identifiers to byte offset from
/// the start of the file at which the object resides.
pub type OffsetTable = Vec<usize>;

/// Binary property list trailer.
///
/// The trailer contains information necessary to interpret the preceding
/// document, particularly the size of variably-sized offsets and references.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub struct Trailer {
    /// Number of bytes needed for each offset table entry.
    pub offset_table_entry_size: usize,
    /// Number of bytes needed for each object reference in a container.
    pub object_reference_size: usize,
    /// Number of objects encoded in the document.
    pub number_of_objects: usize,
    /// Element id of the root object.
    pub root_object: usize,
    /// Offset into the file denoting the start of the offset table.
    pub offset_table_offset: usize,
}

/// Binary property list object wire format.
///
/// The bplist00 format is self-describing. Each object consists of a marker byte
/// and zero or more bytes of additional data. The high nibble of the marker is a
/// tag which specifies the format, the low nibble carries up to four bits of
/// embedded value data.
///
/// # Notes
/// 1. All values are stored in network byte order (big endian).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ObjectFormat {
    /// Null, false or true, encoded entirely in the marker.
    Singleton,
    /// An integer of `2^n` bytes.
    Integer,
    /// A floating point value of `2^n` bytes.
    Real,
    /// A 64-bit double-precision CFAbsoluteTime value.
    Date,
    /// An arbitrary set of bytes.
    Data,
    /// A 7-bit ASCII string.
    AsciiString,
    /// A 16-bit UTF16 string.
    Utf16String,
    /// A legacy byte string, decoded as ASCII.
    Uid,
    /// An array of object references.
    Array,
    /// A set of object references.
    Set,
    /// A dictionary of key and value object references.
    Dictionary,
}

impl ObjectFormat {

    /// Identifies the format of a marker byte from its tag bits, if known.
    pub fn from_marker(marker: u8) -> Option<ObjectFormat> {
        use ObjectFormat::*;
        let format = match marker >> 4 {
            0x0 => Singleton,
            0x1 => Integer,
            0x2 => Real,
            0x3 => Date,
            0x4 => Data,
            0x5 => AsciiString,
            0x6 => Utf16String,
            0x8 => Uid,
            0xA => Array,
            0xC => Set,
            0xD => Dictionary,
            _ => return None,
        };
        Some(format)
    }

    /// Uniquely identifies the object format when compared to the tag bits of a marker byte.
    pub fn tag_bits(self) -> u8 {
        use ObjectFormat::*;
        match self {
            Singleton => 0b0000_0000,
            Integer => 0b0001_0000,
            Real => 0b0010_0000,
            Date => 0b0011_0000,
            Data => 0b0100_0000,
            AsciiString => 0b0101_0000,
            Utf16String => 0b0110_0000,
            Uid => 0b1000_0000,
            Array => 0b1010_0000,
            Set => 0b1100_0000,
            Dictionary => 0b1101_0000,
        }
    }

}

/// Singleton marker value bits for null.
pub const SINGLETON_NULL: u8 = 0b0000;

/// Singleton marker value bits for false.
pub const SINGLETON_FALSE: u8 = 0b1000;

/// Singleton marker value bits for true.
pub const SINGLETON_TRUE: u8 = 0b1001;

/// Value bits indicating the length of an object is stored in a trailing integer.
pub const EXTENDED_LENGTH: u8 = 0b1111;

/// A decoded marker byte.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Marker {
    /// The format named by the tag bits.
    pub format: ObjectFormat,
    /// The four value bits.
    pub info: u8,
}

impl Marker {
    /// Reassembles the marker byte.
    pub fn byte(self) -> u8 {
        self.format.tag_bits() | self.info
    }
}

/// A single object as encoded in the object table, before any of the
/// objects it refers to have been resolved.
///
/// Containers hold the indices of their elements in the offset table.
/// Sets are decoded exactly like arrays, the format does not enforce
/// uniqueness of their elements and neither does this library.
#[derive(Clone, Debug, PartialEq)]
pub enum RawObject<'a> {
    /// The null singleton.
    Null,
    /// The false or true singleton.
    Boolean(bool),
    /// An integer. 8-byte integers are signed, narrower ones unsigned.
    Integer(i64),
    /// A single- or double-precision real, widened to double precision.
    Real(f64),
    /// Seconds since 1 January 2001, 00:00:00 UTC.
    Date(f64),
    /// Bytes borrowed from the input.
    Data(&'a [u8]),
    /// An ASCII string borrowed from the input.
    AsciiString(&'a str),
    /// A string decoded from big-endian UTF-16.
    Utf16String(String),
    /// Element references, in order.
    Array(Vec<usize>),
    /// Element references, in order.
    Set(Vec<usize>),
    /// Key and value reference pairs, in order.
    Dictionary(Vec<(usize, usize)>),
}
