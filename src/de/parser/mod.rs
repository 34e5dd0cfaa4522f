//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Parsers for the individual sections of a bplist document.
//!
//! Every parser is applied to a suffix of a larger buffer. A failure records
//! the remaining input at the point of failure, which is enough to recover the
//! absolute offset once the parser returns to the decoder.

use nom::IResult;
use nom::error::{ErrorKind, ParseError};

use crate::error::Error;

pub mod document;
pub mod object;
pub mod utils;

/// The result of applying one of the bplist parsers.
pub type ParseResult<'a, T> = IResult<&'a [u8], T, Failure<'a>>;

/// The reason a parser rejected its input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// The input ended before the value was complete.
    Truncated,
    /// A field width outside of 1, 2, 4 or 8 bytes.
    UnsupportedWidth(usize),
    /// A known marker with an unsupported value encoding.
    UnsupportedEncoding(u8),
    /// A singleton marker which is not null, false or true.
    InvalidSingleton(u8),
    /// A string payload which is not valid text.
    InvalidEncoding,
    /// A marker with unknown tag bits.
    UnknownTag(u8),
}

/// Parser error carrying the input remaining where parsing failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure<'a> {
    pub input: &'a [u8],
    pub kind: FailureKind,
}

impl<'a> Failure<'a> {

    /// Aborts the current parser with a failure at the start of `input`.
    pub fn fail<T>(input: &'a [u8], kind: FailureKind) -> ParseResult<'a, T> {
        Err(nom::Err::Failure(Failure { input, kind }))
    }

    /// Converts the failure into a decoding error.
    /// `base` must be the buffer of which the failed input is a suffix.
    pub fn into_error(self, base: &[u8]) -> Error {
        let offset = base.len().saturating_sub(self.input.len());
        match self.kind {
            FailureKind::Truncated =>
                Error::Truncated { offset },
            FailureKind::UnsupportedWidth(width) =>
                Error::UnsupportedWidth { offset, width },
            FailureKind::UnsupportedEncoding(marker) =>
                Error::UnsupportedEncoding { offset, marker },
            FailureKind::InvalidSingleton(marker) =>
                Error::InvalidSingleton { offset, marker },
            FailureKind::InvalidEncoding =>
                Error::InvalidEncoding { offset },
            FailureKind::UnknownTag(marker) =>
                Error::UnknownTag { offset, marker },
        }
    }

}

/// All nom errors raised by the complete parsers used here are short reads.
impl<'a> ParseError<&'a [u8]> for Failure<'a> {
    fn from_error_kind(input: &'a [u8], _kind: ErrorKind) -> Self {
        Failure { input, kind: FailureKind::Truncated }
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Converts the error returned by a parser applied to a suffix of `base`.
pub fn to_error(base: &[u8], error: nom::Err<Failure<'_>>) -> Error {
    match error {
        nom::Err::Incomplete(_) =>
            Error::Truncated { offset: base.len() },
        nom::Err::Error(failure) | nom::Err::Failure(failure) =>
            failure.into_error(base),
    }
}
