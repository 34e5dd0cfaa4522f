//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ascii::AsciiStr;

use crate::de::parser::{Failure, FailureKind, ParseResult};
use crate::de::parser::utils::{
    be_usize_list,
    be_usize_n,
    byte,
    bytes,
    fixed_float,
    fixed_uint,
    float64,
    is_supported_width,
};
use crate::document::{
    Marker,
    ObjectFormat,
    RawObject,
    EXTENDED_LENGTH,
    SINGLETON_FALSE,
    SINGLETON_NULL,
    SINGLETON_TRUE,
};

/// Parses a marker byte and returns both the object format and encoded value.
pub fn marker(input: &[u8]) -> ParseResult<'_, Marker> {
    let (rest, value) = byte(input)?;
    match ObjectFormat::from_marker(value) {
        Some(format) => Ok((rest, Marker { format, info: value & 0b0000_1111 })),
        None => Failure::fail(input, FailureKind::UnknownTag(value)),
    }
}

/// Returns a parser for the length of an object payload.
/// The parameter is the value encoded in the marker byte to which the payload corresponds.
/// If the encoded value is:
///   0b0000_0000 ..= 0b0000_1110:
///     No additional input is consumed and the encoded value represents directly
///     the payload count value.
///   0b0000_1111:
///     An integer marker follows whose low nibble `n` gives a width of `2^n` bytes,
///     followed by that many bytes of big-endian unsigned count.
///
/// Including the object's own marker, the header therefore spans either 1 byte
/// or `2 + 2^n` bytes.
pub fn length(encoded_value: u8) -> impl Fn(&[u8]) -> ParseResult<'_, usize> {
    move |input: &[u8]| {
        if encoded_value != EXTENDED_LENGTH {
            return Ok((input, usize::from(encoded_value & 0b0000_1111)));
        }
        let (rest, length_marker) = byte(input)?;
        let width = 1usize << (length_marker & 0b0000_1111);
        if !is_supported_width(width) {
            return Failure::fail(input, FailureKind::UnsupportedWidth(width));
        }
        be_usize_n(width)(rest)
    }
}

/// Parses an integer payload of `2^info` bytes.
/// Integers narrower than 8 bytes are unsigned, 8-byte integers are signed.
fn integer(info: u8) -> impl Fn(&[u8]) -> ParseResult<'_, i64> {
    move |input: &[u8]| {
        let (input, value) = fixed_uint(1usize << info)(input)?;
        Ok((input, value as i64))
    }
}

/// Parses a variable-length ASCII string payload and returns a borrowed string slice.
///
/// # Notes
///
/// 1. Validates that the data contained in the object is an ASCII string.
/// 2. This is a zero-copy operation.
fn ascii_string(info: u8) -> impl Fn(&[u8]) -> ParseResult<'_, &str> {
    move |input: &[u8]| {
        let (payload, char_count) = length(info)(input)?;
        let (rest, text) = bytes(char_count)(payload)?;
        match AsciiStr::from_ascii(text) {
            Ok(text) => Ok((rest, text.as_str())),
            Err(_) => Failure::fail(payload, FailureKind::InvalidEncoding),
        }
    }
}

/// Parses a variable-length UTF-16 string payload and returns an owned string.
///
/// # Notes
///
/// 1. The length counts UTF-16 code units, not bytes.
/// 2. This is not a zero-copy operation.
fn utf16_string(info: u8) -> impl Fn(&[u8]) -> ParseResult<'_, String> {
    move |input: &[u8]| {
        let (payload, char_count) = length(info)(input)?;
        let byte_count = match char_count.checked_mul(2) {
            Some(byte_count) => byte_count,
            None => return Failure::fail(payload, FailureKind::Truncated),
        };
        let (rest, text) = bytes(byte_count)(payload)?;
        let code_units = text
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>();
        match String::from_utf16(&code_units) {
            Ok(text) => Ok((rest, text)),
            Err(_) => Failure::fail(payload, FailureKind::InvalidEncoding),
        }
    }
}

/// Parses a counted run of object references.
fn references(
    info: u8,
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> ParseResult<'_, Vec<usize>> {
    move |input: &[u8]| {
        let (input, count) = length(info)(input)?;
        be_usize_list(count, object_reference_size)(input)
    }
}

/// Parses a dictionary payload with the specified-width key and value references.
///
/// All key references precede all value references. In each tuple returned,
/// the key is first and the value is second.
fn dictionary(
    info: u8,
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> ParseResult<'_, Vec<(usize, usize)>> {
    move |input: &[u8]| {
        let (input, entry_count) = length(info)(input)?;
        let (input, keys) = be_usize_list(entry_count, object_reference_size)(input)?;
        let (input, values) = be_usize_list(entry_count, object_reference_size)(input)?;
        Ok((input, keys.into_iter().zip(values).collect()))
    }
}

/// Returns a parser for any single object whose container references are
/// `object_reference_size` bytes wide.
///
/// Containers are returned with their references unresolved.
pub fn object(
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> ParseResult<'_, RawObject<'_>> {
    move |input: &[u8]| {
        let (payload, marker) = marker(input)?;
        let info = marker.info;
        match marker.format {
            ObjectFormat::Singleton => match info {
                SINGLETON_NULL => Ok((payload, RawObject::Null)),
                SINGLETON_FALSE => Ok((payload, RawObject::Boolean(false))),
                SINGLETON_TRUE => Ok((payload, RawObject::Boolean(true))),
                _ => Failure::fail(input, FailureKind::InvalidSingleton(marker.byte())),
            },
            ObjectFormat::Integer => {
                let (rest, value) = integer(info)(payload)?;
                Ok((rest, RawObject::Integer(value)))
            }
            ObjectFormat::Real => {
                let (rest, value) = fixed_float(1usize << info)(payload)?;
                Ok((rest, RawObject::Real(value)))
            }
            ObjectFormat::Date => {
                if info != 0b0011 {
                    return Failure::fail(input, FailureKind::UnsupportedEncoding(marker.byte()));
                }
                let (rest, value) = float64(payload)?;
                Ok((rest, RawObject::Date(value)))
            }
            ObjectFormat::Data => {
                let (payload, data_length) = length(info)(payload)?;
                let (rest, data) = bytes(data_length)(payload)?;
                Ok((rest, RawObject::Data(data)))
            }
            ObjectFormat::AsciiString | ObjectFormat::Uid => {
                let (rest, text) = ascii_string(info)(payload)?;
                Ok((rest, RawObject::AsciiString(text)))
            }
            ObjectFormat::Utf16String => {
                let (rest, text) = utf16_string(info)(payload)?;
                Ok((rest, RawObject::Utf16String(text)))
            }
            ObjectFormat::Array => {
                let (rest, objects) = references(info, object_reference_size)(payload)?;
                Ok((rest, RawObject::Array(objects)))
            }
            ObjectFormat::Set => {
                let (rest, objects) = references(info, object_reference_size)(payload)?;
                Ok((rest, RawObject::Set(objects)))
            }
            ObjectFormat::Dictionary => {
                let (rest, pairs) = dictionary(info, object_reference_size)(payload)?;
                Ok((rest, RawObject::Dictionary(pairs)))
            }
        }
    }
}
