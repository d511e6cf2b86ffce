//! Decoding and encoding of Base 64 with the URL and filename safe alphabet.
//!
//! The Base 64 encoding is defined in [RFC 4648]. There are two variants
//! defined in the RFC, dubbed *base64* and *base64url* which are
//! differenciated by the last two characters in the alphabet. Stamps use
//! the *base64url* variant without padding, so this is what is implemented
//! by the module.
//!
//! Encoding never produces padding. Decoding accepts an unpadded final
//! group of two or three characters and, for leniency, also accepts a
//! correctly padded one.
//!
//! The module defines the type [`Decoder`] which keeps the state necessary
//! for decoding. The various functions offered use such a decoder to decode
//! and encode octets in various forms.
//!
//! [RFC 4648]: https://tools.ietf.org/html/rfc4648

use core::fmt;
use octseq::builder::{
    EmptyBuilder, FreezeBuilder, FromBuilder, OctetsBuilder, ShortBuf,
};

//------------ Convenience Functions -----------------------------------------

/// Decodes a string with *base64url* encoded data.
///
/// The function attempts to decode the entire string and returns the result
/// as an `Octets` value.
pub fn decode<Octets>(s: &str) -> Result<Octets, DecodeError>
where
    Octets: FromBuilder,
    <Octets as FromBuilder>::Builder: OctetsBuilder + EmptyBuilder,
{
    let mut decoder = Decoder::<<Octets as FromBuilder>::Builder>::new();
    for ch in s.chars() {
        decoder.push(ch)?;
    }
    decoder.finalize()
}

/// Decodes a string with *base64url* encoded data and returns it as a vec.
pub fn decode_vec(s: &str) -> Result<Vec<u8>, DecodeError> {
    decode(s)
}

/// Encodes binary data in unpadded *base64url* into a format stream.
///
/// This function is intended to be used in implementations of formatting
/// traits:
///
/// ```
/// use core::fmt;
/// use sdns_stamp::utils::base64;
///
/// struct Foo<'a>(&'a [u8]);
///
/// impl<'a> fmt::Display for Foo<'a> {
///     fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
///         base64::display(&self.0, f)
///     }
/// }
/// ```
pub fn display<B, W>(bytes: &B, f: &mut W) -> fmt::Result
where
    B: AsRef<[u8]> + ?Sized,
    W: fmt::Write,
{
    for chunk in bytes.as_ref().chunks(3) {
        for ch in encode_chunk(chunk) {
            f.write_char(ch)?;
        }
    }
    Ok(())
}

/// Encodes binary data in unpadded *base64url* and returns it as a string.
pub fn encode_string<B: AsRef<[u8]> + ?Sized>(bytes: &B) -> String {
    let mut res = String::with_capacity((bytes.as_ref().len() / 3 + 1) * 4);
    for chunk in bytes.as_ref().chunks(3) {
        res.extend(encode_chunk(chunk));
    }
    res
}

/// Returns the characters for up to three octets.
///
/// Without padding, one octet results in two characters and two octets in
/// three.
fn encode_chunk(chunk: &[u8]) -> impl Iterator<Item = char> {
    let a = chunk.first().copied().unwrap_or(0);
    let b = chunk.get(1).copied().unwrap_or(0);
    let c = chunk.get(2).copied().unwrap_or(0);
    [
        a >> 2,
        (a & 0x03) << 4 | b >> 4,
        (b & 0x0F) << 2 | c >> 6,
        c & 0x3F,
    ]
    .into_iter()
    .take(if chunk.is_empty() { 0 } else { chunk.len() + 1 })
    .map(|i| ENCODE_ALPHABET[usize::from(i)])
}

//------------ Decoder -------------------------------------------------------

/// A *base64url* decoder.
///
/// This type keeps all the state for decoding a sequence of characters
/// representing data encoded in *base64url*. Upon success, the decoder
/// returns the decoded data.
pub struct Decoder<Builder> {
    /// A buffer for up to four characters.
    ///
    /// We only keep `u8`s here because only ASCII characters are used by
    /// Base64.
    buf: [u8; 4],

    /// The index in `buf` where we place the next character.
    ///
    /// We also abuse this to mark when we are done (because there was
    /// padding, in which case we set it to 0xF0).
    next: usize,

    /// The target or an error if something went wrong.
    target: Result<Builder, DecodeError>,
}

impl<Builder: EmptyBuilder> Decoder<Builder> {
    /// Creates a new empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Decoder {
            buf: [0; 4],
            next: 0,
            target: Ok(Builder::empty()),
        }
    }
}

impl<Builder: OctetsBuilder> Decoder<Builder> {
    /// Finalizes decoding and returns the decoded data.
    ///
    /// An incomplete final group of two or three characters is the
    /// unpadded form and is decoded into one or two octets, respectively.
    pub fn finalize(mut self) -> Result<Builder::Octets, DecodeError>
    where
        Builder: FreezeBuilder,
    {
        match self.next {
            0 | 0xF0 => {}
            1 => return Err(DecodeError::ShortInput),
            3 if self.buf[2] == 0x80 => return Err(DecodeError::ShortInput),
            2 => {
                let octet = self.buf[0] << 2 | self.buf[1] >> 4;
                self.append(&[octet]);
            }
            3 => {
                let octets = [
                    self.buf[0] << 2 | self.buf[1] >> 4,
                    self.buf[1] << 4 | self.buf[2] >> 2,
                ];
                self.append(&octets);
            }
            _ => return Err(DecodeError::ShortInput),
        }
        self.target.map(FreezeBuilder::freeze)
    }

    /// Decodes one more character of data.
    ///
    /// Returns an error as soon as the encoded data is determined to be
    /// illegal. It is okay to push more data after the first error. The
    /// method will just keep returned errors.
    pub fn push(&mut self, ch: char) -> Result<(), DecodeError> {
        if let Err(err) = self.target {
            return Err(err);
        }
        if self.next == 0xF0 {
            self.target = Err(DecodeError::TrailingInput);
            return Err(DecodeError::TrailingInput);
        }

        let val = if ch == PAD {
            // Only up to two padding characters possible.
            if self.next < 2 {
                return Err(DecodeError::IllegalChar(ch));
            }
            0x80 // Acts as a marker later on.
        } else {
            if self.next > 2 && self.buf[2] == 0x80 {
                return Err(DecodeError::TrailingInput);
            }
            match DECODE_ALPHABET.get(ch as usize) {
                Some(&val) if val != 0xFF => val,
                _ => return Err(DecodeError::IllegalChar(ch)),
            }
        };
        self.buf[self.next] = val;
        self.next += 1;

        if self.next == 4 {
            if self.buf[2] == 0x80 {
                self.append(&[self.buf[0] << 2 | self.buf[1] >> 4]);
                self.next = 0xF0;
            } else if self.buf[3] == 0x80 {
                self.append(&[
                    self.buf[0] << 2 | self.buf[1] >> 4,
                    self.buf[1] << 4 | self.buf[2] >> 2,
                ]);
                self.next = 0xF0;
            } else {
                self.append(&[
                    self.buf[0] << 2 | self.buf[1] >> 4,
                    self.buf[1] << 4 | self.buf[2] >> 2,
                    (self.buf[2] << 6) | self.buf[3],
                ]);
                self.next = 0;
            }
        }

        match self.target {
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Appends decoded octets to the target.
    fn append(&mut self, octets: &[u8]) {
        let target = match self.target.as_mut() {
            Ok(target) => target,
            Err(_) => return,
        };
        if let Err(err) = target.append_slice(octets) {
            self.target = Err(Into::<ShortBuf>::into(err).into());
        }
    }
}

//--- Default

impl<Builder: EmptyBuilder> Default for Decoder<Builder> {
    fn default() -> Self {
        Self::new()
    }
}

//============ Error Types ===================================================

//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding a *base64url* encoded string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// A character was pushed that isn’t allowed in the encoding.
    IllegalChar(char),

    /// There was trailing data after a padding sequence.
    TrailingInput,

    /// The input ended with an incomplete sequence.
    ShortInput,

    /// The buffer to decode into is too short.
    ShortBuf,
}

impl From<ShortBuf> for DecodeError {
    fn from(_: ShortBuf) -> Self {
        DecodeError::ShortBuf
    }
}

//--- Display and Error

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::TrailingInput => f.write_str("trailing input"),
            DecodeError::IllegalChar(ch) => {
                write!(f, "illegal character '{}'", ch)
            }
            DecodeError::ShortInput => f.write_str("incomplete input"),
            DecodeError::ShortBuf => fmt::Display::fmt(&ShortBuf, f),
        }
    }
}

impl std::error::Error for DecodeError {}

//============ Constants =====================================================

/// The alphabet used by the decoder.
///
/// This maps encoding characters into their values. A value of 0xFF stands in
/// for illegal characters. We only provide the first 128 characters since the
/// alphabet will only use ASCII characters.
const DECODE_ALPHABET: [u8; 128] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x00 .. 0x07
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x08 .. 0x0F
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x10 .. 0x17
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x18 .. 0x1F
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x20 .. 0x27
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x3E, 0xFF, 0xFF, // 0x28 .. 0x2F
    0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, // 0x30 .. 0x37
    0x3C, 0x3D, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x38 .. 0x3F
    0xFF, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, // 0x40 .. 0x47
    0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, // 0x48 .. 0x4F
    0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, // 0x50 .. 0x57
    0x17, 0x18, 0x19, 0xFF, 0xFF, 0xFF, 0xFF, 0x3F, // 0x58 .. 0x5F
    0xFF, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, 0x20, // 0x60 .. 0x67
    0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // 0x68 .. 0x6F
    0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F, 0x30, // 0x70 .. 0x77
    0x31, 0x32, 0x33, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // 0x78 .. 0x7F
];

const ENCODE_ALPHABET: [char; 64] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', // 0x00 .. 0x07
    'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', // 0x08 .. 0x0F
    'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', // 0x10 .. 0x17
    'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', // 0x18 .. 0x1F
    'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', // 0x20 .. 0x27
    'o', 'p', 'q', 'r', 's', 't', 'u', 'v', // 0x28 .. 0x2F
    'w', 'x', 'y', 'z', '0', '1', '2', '3', // 0x30 .. 0x37
    '4', '5', '6', '7', '8', '9', '-', '_', // 0x38 .. 0x3F
];

/// The padding character
const PAD: char = '=';

//============ Test ==========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_str() {
        assert_eq!(&decode_vec("").unwrap(), b"");
        assert_eq!(&decode_vec("Zg").unwrap(), b"f");
        assert_eq!(&decode_vec("Zm8").unwrap(), b"fo");
        assert_eq!(&decode_vec("Zm9v").unwrap(), b"foo");
        assert_eq!(&decode_vec("Zm9vYg").unwrap(), b"foob");
        assert_eq!(&decode_vec("Zm9vYmE").unwrap(), b"fooba");
        assert_eq!(&decode_vec("Zm9vYmFy").unwrap(), b"foobar");
        assert_eq!(&decode_vec("-_8").unwrap(), b"\xfb\xff");

        // Padding is tolerated.
        assert_eq!(&decode_vec("Zg==").unwrap(), b"f");
        assert_eq!(&decode_vec("Zm8=").unwrap(), b"fo");

        assert_eq!(decode_vec("Z"), Err(DecodeError::ShortInput));
        assert_eq!(decode_vec("Zm9vY"), Err(DecodeError::ShortInput));
        assert_eq!(decode_vec("Zg="), Err(DecodeError::ShortInput));
        assert_eq!(decode_vec("Z="), Err(DecodeError::IllegalChar('=')));
        assert_eq!(decode_vec("+w"), Err(DecodeError::IllegalChar('+')));
        assert_eq!(decode_vec("/w"), Err(DecodeError::IllegalChar('/')));
        assert_eq!(decode_vec("Zm 9v"), Err(DecodeError::IllegalChar(' ')));
        assert_eq!(decode_vec("Zö"), Err(DecodeError::IllegalChar('ö')));
        assert_eq!(decode_vec("Zg==Zg"), Err(DecodeError::TrailingInput));
        assert_eq!(decode_vec("Zg=a"), Err(DecodeError::TrailingInput));
    }

    #[test]
    fn display_bytes() {
        fn fmt(s: &[u8]) -> String {
            let mut out = String::new();
            display(s, &mut out).unwrap();
            out
        }

        assert_eq!(fmt(b""), "");
        assert_eq!(fmt(b"f"), "Zg");
        assert_eq!(fmt(b"fo"), "Zm8");
        assert_eq!(fmt(b"foo"), "Zm9v");
        assert_eq!(fmt(b"foob"), "Zm9vYg");
        assert_eq!(fmt(b"fooba"), "Zm9vYmE");
        assert_eq!(fmt(b"foobar"), "Zm9vYmFy");
        assert_eq!(fmt(b"\xfb\xff"), "-_8");
        assert_eq!(encode_string(b"\x81\x03foo"), "gQNmb28");
    }

    #[test]
    fn encode_tails() {
        assert_eq!(encode_string(b""), "");
        assert_eq!(encode_string(b"f"), "Zg");
        assert_eq!(encode_string(b"fo"), "Zm8");
        assert_eq!(encode_string(b"foo"), "Zm9v");
        assert_eq!(encode_string(b"foobar\xfb\xff"), "Zm9vYmFy-_8");
        for len in 0..64 {
            let data: Vec<u8> = (0..len).map(|i| (i * 37) as u8).collect();
            let encoded = encode_string(&data);
            assert_eq!(encoded.len(), (len * 4 + 2) / 3);
            assert_eq!(decode_vec(&encoded).unwrap(), data);
        }
    }
}
