//! Creating and consuming stamp fields in wire format.
//!
//! With the exception of the protocol identifier and the properties block,
//! all data in a stamp payload is kept in variable-length fields. Each field
//! is encoded as one octet giving its length followed by that many octets
//! of content. Consequently, no field can be longer than 255 octets.
//!
//! Fields are either text, which is encoded as UTF-8, or raw binary data
//! such as public keys and certificate hashes. The latter are presented as
//! hex strings at the API boundary.
//!
//! This module also provides the error types for encoding and decoding
//! stamps.

use crate::utils::{base16, base64};
use core::{fmt, str};
use octseq::builder::{OctetsBuilder, ShortBuf};
use octseq::parse::{Parser, ShortInput};

//------------ Constants -----------------------------------------------------

/// The maximum length of the content of a field.
pub const MAX_FIELD_LEN: usize = 0xFF;

/// The number of reserved octets following the properties octet.
pub const RESERVED_LEN: usize = 7;

//------------ compose functions ---------------------------------------------

/// Returns the length octet for a field of the given content.
///
/// Fails if the content is longer than [`MAX_FIELD_LEN`] octets. The field
/// name is only used for the error.
pub fn length_prefix(
    field: &'static str,
    content: &[u8],
) -> Result<u8, EncodeError> {
    u8::try_from(content.len()).map_err(|_| EncodeError::FieldTooLong {
        field,
        len: content.len(),
    })
}

/// Appends a length-prefixed field.
///
/// Nothing is appended if the content is too long.
pub fn compose_field<Target: OctetsBuilder + ?Sized>(
    target: &mut Target,
    field: &'static str,
    content: &[u8],
) -> Result<(), EncodeError> {
    let len = length_prefix(field, content)?;
    append(target, &[len])?;
    append(target, content)
}

/// Appends a text field.
///
/// The text is encoded as UTF-8.
pub fn compose_text<Target: OctetsBuilder + ?Sized>(
    target: &mut Target,
    field: &'static str,
    text: &str,
) -> Result<(), EncodeError> {
    compose_field(target, field, text.as_bytes())
}

/// Appends the properties block.
///
/// This is the properties octet followed by the reserved octets, which are
/// always zero.
pub fn compose_props_block<Target: OctetsBuilder + ?Sized>(
    target: &mut Target,
    props: crate::props::Properties,
) -> Result<(), EncodeError> {
    append(target, &[props.to_bits()])?;
    append(target, &[0; RESERVED_LEN])
}

/// Appends a slice, converting the builder’s error.
fn append<Target: OctetsBuilder + ?Sized>(
    target: &mut Target,
    slice: &[u8],
) -> Result<(), EncodeError> {
    target
        .append_slice(slice)
        .map_err(|err| EncodeError::from(Into::<ShortBuf>::into(err)))
}

//------------ parse functions -----------------------------------------------

/// Takes a length-prefixed field from the beginning of a parser.
///
/// Returns the content of the field without the length octet.
pub fn parse_field<'a, Octs: AsRef<[u8]> + ?Sized>(
    parser: &mut Parser<'a, Octs>,
) -> Result<&'a [u8], DecodeError> {
    let len = usize::from(parser.parse_u8()?);
    let pos = parser.pos();
    parser.advance(len)?;
    Ok(&parser.octets_ref().as_ref()[pos..pos + len])
}

/// Takes a text field from the beginning of a parser.
pub fn parse_text<'a, Octs: AsRef<[u8]> + ?Sized>(
    parser: &mut Parser<'a, Octs>,
) -> Result<String, DecodeError> {
    decode_text(parse_field(parser)?)
}

/// Takes a binary field from the beginning of a parser.
pub fn parse_binary<'a, Octs: AsRef<[u8]> + ?Sized>(
    parser: &mut Parser<'a, Octs>,
) -> Result<Vec<u8>, DecodeError> {
    parse_field(parser).map(Into::into)
}

/// Takes the properties block from the beginning of a parser.
///
/// The reserved octets are skipped without checking their content.
pub fn parse_props_block<'a, Octs: AsRef<[u8]> + ?Sized>(
    parser: &mut Parser<'a, Octs>,
) -> Result<crate::props::Properties, DecodeError> {
    let props = crate::props::Properties::from_bits(parser.parse_u8()?);
    parser.advance(RESERVED_LEN)?;
    Ok(props)
}

//------------ Field conversions ---------------------------------------------

/// Converts the content of a text field into a string.
///
/// Content that isn’t valid UTF-8 is rejected.
pub fn decode_text(content: &[u8]) -> Result<String, DecodeError> {
    str::from_utf8(content)
        .map(Into::into)
        .map_err(DecodeError::InvalidText)
}

/// Converts a hex string into the content of a binary field.
///
/// Colons, spaces, and tabs between the digits are ignored.
pub fn encode_hex(hex: &str) -> Result<Vec<u8>, EncodeError> {
    base16::decode_vec(hex).map_err(Into::into)
}

/// Converts the content of a binary field into a hex string.
///
/// The string uses lowercase digits without separators.
pub fn decode_hex(content: &[u8]) -> String {
    base16::encode_string(content)
}

//============ Error Types ===================================================

//------------ EncodeError ---------------------------------------------------

/// An error happened while encoding a stamp.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EncodeError {
    /// A hex string given for a binary field was invalid.
    InvalidHex(base16::DecodeError),

    /// The content of a field is longer than 255 octets.
    FieldTooLong {
        /// The name of the field.
        field: &'static str,

        /// The length of the content in octets.
        len: usize,
    },

    /// The target buffer is too short.
    ShortBuf,
}

//--- From

impl From<base16::DecodeError> for EncodeError {
    fn from(err: base16::DecodeError) -> Self {
        EncodeError::InvalidHex(err)
    }
}

impl From<ShortBuf> for EncodeError {
    fn from(_: ShortBuf) -> Self {
        EncodeError::ShortBuf
    }
}

//--- Display and Error

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::InvalidHex(ref err) => {
                write!(f, "invalid hex string: {}", err)
            }
            EncodeError::FieldTooLong { field, len } => {
                write!(
                    f,
                    "field '{}' is {} octets long (at most {} allowed)",
                    field, len, MAX_FIELD_LEN
                )
            }
            EncodeError::ShortBuf => fmt::Display::fmt(&ShortBuf, f),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::InvalidHex(err) => Some(err),
            _ => None,
        }
    }
}

//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding a stamp.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// The string doesn’t start with `sdns://`.
    InvalidScheme,

    /// The payload isn’t valid *base64url*.
    InvalidEncoding(base64::DecodeError),

    /// The protocol identifier is unknown.
    UnsupportedProtocol(u8),

    /// The payload ended in the middle of a field.
    Truncated,

    /// A text field isn’t valid UTF-8.
    InvalidText(str::Utf8Error),
}

//--- From

impl From<ShortInput> for DecodeError {
    fn from(_: ShortInput) -> Self {
        DecodeError::Truncated
    }
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        DecodeError::InvalidEncoding(err)
    }
}

impl From<str::Utf8Error> for DecodeError {
    fn from(err: str::Utf8Error) -> Self {
        DecodeError::InvalidText(err)
    }
}

//--- Display and Error

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::InvalidScheme => f.write_str("invalid scheme"),
            DecodeError::InvalidEncoding(ref err) => {
                write!(f, "invalid payload encoding: {}", err)
            }
            DecodeError::UnsupportedProtocol(tag) => {
                write!(f, "unsupported protocol: {}", tag)
            }
            DecodeError::Truncated => f.write_str("unexpected end of payload"),
            DecodeError::InvalidText(ref err) => {
                write!(f, "invalid text field: {}", err)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidEncoding(err) => Some(err),
            DecodeError::InvalidText(err) => Some(err),
            _ => None,
        }
    }
}

//============ Testing =======================================================
