//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    bytes::complete::take,
    number::complete::{be_f32, be_f64, be_u8},
};

use std::convert::TryFrom;

use crate::de::parser::{Failure, FailureKind, ParseResult};

/// Returns a parser which takes exactly `n` bytes of input.
pub fn bytes(n: usize) -> impl Fn(&[u8]) -> ParseResult<'_, &[u8]> {
    move |input: &[u8]| take(n)(input)
}

/// Parses a single byte.
pub fn byte(input: &[u8]) -> ParseResult<'_, u8> {
    be_u8(input)
}

/// Parses a big-endian IEEE-754 double.
pub fn float64(input: &[u8]) -> ParseResult<'_, f64> {
    be_f64(input)
}

/// Parses a big-endian IEEE-754 single, widened to a double.
pub fn float32(input: &[u8]) -> ParseResult<'_, f64> {
    let (input, value) = be_f32(input)?;
    Ok((input, f64::from(value)))
}

/// Whether a field width is one the format defines for integers and references.
pub fn is_supported_width(width: usize) -> bool {
    matches!(width, 1 | 2 | 4 | 8)
}

/// Returns a parser which recognizes a big-endian unsigned number
/// 1, 2, 4 or 8 bytes long. Any other width is rejected without consuming input.
///
/// # Notes
///
/// 1. 8-byte values may be reinterpreted as signed by the caller.
pub fn fixed_uint(width: usize) -> impl Fn(&[u8]) -> ParseResult<'_, u64> {
    move |input: &[u8]| {
        if !is_supported_width(width) {
            return Failure::fail(input, FailureKind::UnsupportedWidth(width));
        }
        let (input, bytes) = bytes(width)(input)?;
        let value = bytes.iter().fold(0u64, |acc, x| {
            (acc << 8) | u64::from(*x)
        });
        Ok((input, value))
    }
}

/// Returns a parser which recognizes a big-endian IEEE-754 value
/// 4 or 8 bytes long. Any other width is rejected without consuming input.
pub fn fixed_float(width: usize) -> impl Fn(&[u8]) -> ParseResult<'_, f64> {
    move |input: &[u8]| {
        match width {
            4 => float32(input),
            8 => float64(input),
            _ => Failure::fail(input, FailureKind::UnsupportedWidth(width)),
        }
    }
}

/// Returns a parser which recognizes a fixed-width unsigned big-endian number.
/// This value is then converted safely into a usize, which varies based on the
/// pointer size of the platform.
///
/// # Notes
///
/// 1. width may be 8 even on platforms with smaller word sizes.
/// 2. The value is checked to confirm it is in range before it is cast to usize.
pub fn be_usize_n(width: usize) -> impl Fn(&[u8]) -> ParseResult<'_, usize> {
    move |input: &[u8]| {
        let (rest, value) = fixed_uint(width)(input)?;
        match usize::try_from(value) {
            Ok(value) => Ok((rest, value)),
            Err(_) => Failure::fail(input, FailureKind::UnsupportedWidth(width)),
        }
    }
}

/// Returns a parser for `count` consecutive fixed-width unsigned numbers.
///
/// The whole run is bounds-checked before anything is allocated, so a
/// corrupt count cannot request more memory than the input could describe.
pub fn be_usize_list(
    count: usize,
    width: usize,
) -> impl Fn(&[u8]) -> ParseResult<'_, Vec<usize>> {
    move |input: &[u8]| {
        if !is_supported_width(width) {
            return Failure::fail(input, FailureKind::UnsupportedWidth(width));
        }
        match count.checked_mul(width) {
            Some(length) if length <= input.len() => {}
            _ => return Failure::fail(input, FailureKind::Truncated),
        }

        let mut values = Vec::with_capacity(count);
        let mut remaining = input;
        for _ in 0 .. count {
            let (rest, value) = be_usize_n(width)(remaining)?;
            values.push(value);
            remaining = rest;
        }
        Ok((remaining, values))
    }
}
