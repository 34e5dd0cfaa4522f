//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use crate::de::parser::ParseResult;
use crate::de::parser::utils::{be_usize_list, be_usize_n, byte, bytes};
use crate::document::{
    OffsetTable,
    Trailer,
    TRAILER_FIELD_UNUSED_SIZE,
    TRAILER_PREAMBLE_UNUSED_SIZE,
};

/// Returns a parser for an offset table with the specified number of entries,
/// each of the specified size.
pub fn offset_table(
    entries: usize,
    entry_size: usize,
) -> impl Fn(&[u8]) -> ParseResult<'_, OffsetTable> {
    move |input: &[u8]| be_usize_list(entries, entry_size)(input)
}

/// Parses a 32-bit big-endian trailer field and the unused bytes preceding it.
fn trailer_field(input: &[u8]) -> ParseResult<'_, usize> {
    let (input, _) = bytes(TRAILER_FIELD_UNUSED_SIZE)(input)?;
    be_usize_n(4)(input)
}

/// Parses a fixed-sized 32-byte trailer object from the input array.
///
/// Unused bytes are skipped without being validated. The fields are not
/// checked for consistency with each other or with the document.
pub fn trailer(input: &[u8]) -> ParseResult<'_, Trailer> {
    let (input, _) = bytes(TRAILER_PREAMBLE_UNUSED_SIZE)(input)?;
    let (input, offset_table_entry_size) = byte(input)?;
    let (input, object_reference_size) = byte(input)?;
    let (input, number_of_objects) = trailer_field(input)?;
    let (input, root_object) = trailer_field(input)?;
    let (input, offset_table_offset) = trailer_field(input)?;
    Ok((input, Trailer {
        offset_table_entry_size: usize::from(offset_table_entry_size),
        object_reference_size: usize::from(object_reference_size),
        number_of_objects,
        root_object,
        offset_table_offset,
    }))
}
