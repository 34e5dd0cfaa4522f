//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

mod parser;
mod resolve;

use tracing::{debug, trace};
use serde::de::DeserializeOwned;

use std::fs;
use std::path::Path;

use crate::de::parser::utils::is_supported_width;
use crate::document::{
    OffsetTable,
    RawObject,
    Trailer,
    HEADER_MAGIC,
    HEADER_SIZE,
    TRAILER_SIZE,
};
use crate::error::{Error, Result, TrailerDefect};
use crate::object::{self, Value};
use crate::options::DecodeOptions;

/// Decodes a binary property list document held in memory.
pub fn decode(input: &[u8]) -> Result<Value> {
    decode_with_options(input, DecodeOptions::default())
}

/// Decodes a binary property list document held in memory with custom limits.
pub fn decode_with_options(input: &[u8], options: DecodeOptions) -> Result<Value> {
    Decoder::with_options(input, options)?.decode()
}

/// Reads a file in its entirety and decodes it as a binary property list document.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let input = fs::read(path)?;
    debug!("read {} bytes from {}", input.len(), path.display());
    decode(&input)
}

/// Support for deserializing any supported type from a binary property list document.
pub fn from_slice<T>(input: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = decode(input)?;
    object::from_value(&value)
}

/// A binary property list document whose trailer and offset table have been
/// parsed and validated.
///
/// Objects are decoded on demand. `decode` resolves the object graph from the
/// root object, `raw_object` decodes one object without resolving its references.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// The bytes which represent the totality of the input document.
    input: &'a [u8],
    options: DecodeOptions,
    trailer: Trailer,
    /// The table of offsets from the start of the input to the location of a given object.
    offset_table: OffsetTable,
}

impl<'a> Decoder<'a> {

    /// Parses the metadata of a document using the default limits.
    pub fn new(input: &'a [u8]) -> Result<Self> {
        Decoder::with_options(input, DecodeOptions::default())
    }

    /// Parses the metadata of a document.
    pub fn with_options(input: &'a [u8], options: DecodeOptions) -> Result<Self> {
        let trailer = parse_trailer(input, &options)?;
        let offset_table = parse_offset_table(input, &trailer)?;
        Ok(Decoder {
            input,
            options,
            trailer,
            offset_table,
        })
    }

    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    pub fn offset_table(&self) -> &[usize] {
        &self.offset_table
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The number of objects in the document.
    pub fn object_count(&self) -> usize {
        self.offset_table.len()
    }

    /// The region of the input in which objects may reside. Object payloads
    /// may not extend into the offset table.
    fn object_table(&self) -> &'a [u8] {
        &self.input[.. self.trailer.offset_table_offset]
    }

    /// Decodes the object with the given index without resolving the
    /// objects it refers to.
    ///
    /// An `index` not less than `object_count()` fails with
    /// `DanglingReference`, naming the index as both referrer and reference.
    pub fn raw_object(&self, index: usize) -> Result<RawObject<'a>> {
        let offset = match self.offset_table.get(index) {
            Some(&offset) => offset,
            None => return Err(Error::DanglingReference { index, reference: index }),
        };
        let object_table = self.object_table();
        let (_, object) = parser::object::object(self.trailer.object_reference_size)(&object_table[offset ..])
            .map_err(|error| parser::to_error(object_table, error))?;
        trace!("object {} at {:#x}: {:?}", index, offset, object);
        Ok(object)
    }

    /// Resolves the object graph starting at the root object.
    pub fn decode(&self) -> Result<Value> {
        resolve::Resolver::new(self).resolve_root()
    }

}

/// Parses the trailer from the end of the input and sanity checks the fields.
///
/// # Notes
///
/// The smallest possible document consists of:
///   1. A fixed-sized header.
///   2. An object table with a single one-byte entry such as a null.
///   3. An offset table with a single one-byte entry for the root object.
///   4. A fixed-sized trailer.
fn parse_trailer(input: &[u8], options: &DecodeOptions) -> Result<Trailer> {
    let length = input.len();
    let malformed = |defect| Error::TruncatedTrailer { length, defect };

    if length < HEADER_SIZE + TRAILER_SIZE {
        return Err(malformed(TrailerDefect::TooShort));
    }
    if &input[.. HEADER_SIZE] != HEADER_MAGIC {
        return Err(Error::BadMagic);
    }

    let trailer_start = length - TRAILER_SIZE;
    let (_, trailer) = parser::document::trailer(&input[trailer_start ..])
        .map_err(|error| parser::to_error(input, error))?;

    if !is_supported_width(trailer.offset_table_entry_size) {
        return Err(malformed(TrailerDefect::OffsetWidth(trailer.offset_table_entry_size as u8)));
    }
    if !is_supported_width(trailer.object_reference_size) {
        return Err(malformed(TrailerDefect::ReferenceWidth(trailer.object_reference_size as u8)));
    }
    if trailer.number_of_objects == 0 {
        return Err(malformed(TrailerDefect::NoObjects));
    }
    if trailer.number_of_objects > options.max_objects {
        return Err(Error::TooManyObjects {
            count: trailer.number_of_objects,
            limit: options.max_objects,
        });
    }
    if trailer.root_object >= trailer.number_of_objects {
        return Err(malformed(TrailerDefect::RootOutOfRange {
            root: trailer.root_object,
            count: trailer.number_of_objects,
        }));
    }

    // The offset table must sit between the header and the trailer.
    let start = trailer.offset_table_offset;
    let end = trailer.number_of_objects
        .checked_mul(trailer.offset_table_entry_size)
        .and_then(|table_length| table_length.checked_add(start));
    match end {
        Some(end) if start >= HEADER_SIZE && end <= trailer_start => {}
        _ => return Err(malformed(TrailerDefect::OffsetTableOutOfRange { start })),
    }

    debug!(
        "trailer: {} objects, root {}, offset table at {:#x}, {}-byte offsets, {}-byte references",
        trailer.number_of_objects,
        trailer.root_object,
        trailer.offset_table_offset,
        trailer.offset_table_entry_size,
        trailer.object_reference_size,
    );
    Ok(trailer)
}

/// Parses the offset table described by a validated trailer and checks every
/// entry points into the object table.
fn parse_offset_table(input: &[u8], trailer: &Trailer) -> Result<OffsetTable> {
    let start = trailer.offset_table_offset;
    let (_, offset_table) = parser::document::offset_table(
        trailer.number_of_objects,
        trailer.offset_table_entry_size,
    )(&input[start ..]).map_err(|error| parser::to_error(input, error))?;

    let object_table_range = HEADER_SIZE .. start;
    if let Some((index, &offset)) = offset_table
        .iter()
        .enumerate()
        .find(|(_, offset)| !object_table_range.contains(*offset))
    {
        return Err(Error::OffsetOutOfRange { index, offset });
    }

    debug!("offset table: {} entries in {:#x}..{:#x}", offset_table.len(), HEADER_SIZE, start);
    Ok(offset_table)
}
