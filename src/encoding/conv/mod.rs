/*!
Bulk transcoding drivers.

One generic loop drives every conversion: decode a scalar from the source scheme, encode it in the destination scheme, append the encoded units to the output arena.  The worst-case output size is reserved in a single growth call before the loop, so a successful transcode performs at most one allocation; the logical size then ends up at exactly the bytes written.

Malformed scalars degrade to the replacement scalar (or the ASCII fallback) and the transcode continues.  Only resource errors abort.
*/
pub mod code_page;

pub use self::code_page::{utf8_from_code_page, utf8_to_code_page, CodePage};

use log::trace;
use thiserror::Error;

use crate::alloc::{AllocError, Allocator};
use crate::arena::{Arena, ArenaError};

use super::{
    Decoded, Encoding, Scheme, Unit, Utf16Be, Utf16Le, Utf32Be, Utf32Le, Utf8, ASCII_FALLBACK,
    MAX_ASCII,
};

// Large enough for the widest MAX_UNITS across the schemes.
const UNIT_BUF: usize = 4;

/**
An error from a bulk transcoding operation.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum TranscodeError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("scheme cannot be used for this conversion")]
    UnsupportedScheme,
}

impl From<AllocError> for TranscodeError {
    fn from(err: AllocError) -> Self {
        TranscodeError::Arena(ArenaError::from(err))
    }
}

/**
Transcodes `input` from `Src` to `Dst`, appending the encoded wire bytes to `output`.

An empty input is a no-op success.  On a resource error nothing useful is in `output` beyond its prior logical size, and the arena itself remains valid.
*/
pub fn transcode<Src, Dst, A>(
    input: &[Src::Unit],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError>
where
    Src: Encoding,
    Dst: Encoding,
    A: Allocator,
{
    if input.is_empty() {
        return Ok(());
    }

    let worst = input
        .len()
        .checked_mul(Dst::MAX_UNITS * <Dst::Unit as Unit>::WIDTH)
        .ok_or(AllocError::SizeOverflow)?;
    output.reserve(worst)?;
    trace!(
        "transcode: {} input units, {} output bytes reserved",
        input.len(),
        worst
    );

    let mut units = [Dst::Unit::zero(); UNIT_BUF];
    let mut rest = input;
    while let Some(Decoded { scalar, consumed }) = Src::decode_one(rest) {
        let written = Dst::encode_one(scalar, &mut units);
        for &unit in &units[..written] {
            unit.append_to(output)?;
        }
        rest = &rest[consumed.min(rest.len())..];
    }
    Ok(())
}

/**
Transcodes UTF-8 bytes to UTF-16LE wire bytes.
*/
pub fn utf8_to_utf16le<A: Allocator>(
    input: &[u8],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf8, Utf16Le, A>(input, output)
}

/**
Transcodes UTF-8 bytes to UTF-16BE wire bytes.
*/
pub fn utf8_to_utf16be<A: Allocator>(
    input: &[u8],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf8, Utf16Be, A>(input, output)
}

/**
Transcodes UTF-8 bytes to UTF-32LE wire bytes.
*/
pub fn utf8_to_utf32le<A: Allocator>(
    input: &[u8],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf8, Utf32Le, A>(input, output)
}

/**
Transcodes UTF-8 bytes to UTF-32BE wire bytes.
*/
pub fn utf8_to_utf32be<A: Allocator>(
    input: &[u8],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf8, Utf32Be, A>(input, output)
}

/**
Transcodes UTF-16LE units to UTF-8 bytes.
*/
pub fn utf16le_to_utf8<A: Allocator>(
    input: &[u16],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf16Le, Utf8, A>(input, output)
}

/**
Transcodes UTF-16BE units to UTF-8 bytes.  Units are memory images: read them from wire bytes little-endian, as [`to_ascii`] does.
*/
pub fn utf16be_to_utf8<A: Allocator>(
    input: &[u16],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf16Be, Utf8, A>(input, output)
}

/**
Transcodes UTF-32LE words to UTF-8 bytes.
*/
pub fn utf32le_to_utf8<A: Allocator>(
    input: &[u32],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf32Le, Utf8, A>(input, output)
}

/**
Transcodes UTF-32BE words to UTF-8 bytes.  Words are memory images, as with [`utf16be_to_utf8`].
*/
pub fn utf32be_to_utf8<A: Allocator>(
    input: &[u32],
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    transcode::<Utf32Be, Utf8, A>(input, output)
}

/**
Decodes a byte range in `scheme` down to seven-bit ASCII.

Every scalar above U+007F, and every scalar encoded in more than one unit, degrades to `?`.  A trailing partial unit is dropped.  [`Scheme::Ascii`] names no decoder and is rejected.
*/
pub fn to_ascii<A: Allocator>(
    data: &[u8],
    scheme: Scheme,
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    if data.is_empty() {
        return Ok(());
    }
    match scheme {
        Scheme::Utf8 => to_ascii_loop::<Utf8, A>(data, output),
        Scheme::Utf16Le => to_ascii_loop::<Utf16Le, A>(data, output),
        Scheme::Utf16Be => to_ascii_loop::<Utf16Be, A>(data, output),
        Scheme::Utf32Le => to_ascii_loop::<Utf32Le, A>(data, output),
        Scheme::Utf32Be => to_ascii_loop::<Utf32Be, A>(data, output),
        Scheme::Ascii => Err(TranscodeError::UnsupportedScheme),
    }
}

fn to_ascii_loop<E, A>(data: &[u8], output: &mut Arena<A>) -> Result<(), TranscodeError>
where
    E: Encoding,
    A: Allocator,
{
    let width = <E::Unit as Unit>::WIDTH;
    output.reserve(data.len() / width + 1)?;

    let mut rest = data;
    while rest.len() >= width {
        let mut units = [E::Unit::zero(); UNIT_BUF];
        let mut have = 0;
        while have < E::MAX_UNITS {
            match rest.get(have * width..).and_then(E::Unit::from_le_bytes) {
                Some(unit) => {
                    units[have] = unit;
                    have += 1;
                }
                None => break,
            }
        }

        let decoded = match E::decode_one(&units[..have]) {
            Some(decoded) => decoded,
            None => break,
        };
        let byte = if decoded.consumed > 1 || decoded.scalar > MAX_ASCII {
            ASCII_FALLBACK
        } else {
            decoded.scalar as u8
        };
        output.push(byte)?;
        rest = &rest[(decoded.consumed * width).min(rest.len())..];
    }
    Ok(())
}

/**
Widens seven-bit ASCII bytes into `scheme` wire bytes.  Bytes above 0x7F degrade to `?` first.
*/
pub fn from_ascii<A: Allocator>(
    data: &[u8],
    scheme: Scheme,
    output: &mut Arena<A>,
) -> Result<(), TranscodeError> {
    if data.is_empty() {
        return Ok(());
    }
    match scheme {
        Scheme::Utf8 => from_ascii_loop::<Utf8, A>(data, output),
        Scheme::Utf16Le => from_ascii_loop::<Utf16Le, A>(data, output),
        Scheme::Utf16Be => from_ascii_loop::<Utf16Be, A>(data, output),
        Scheme::Utf32Le => from_ascii_loop::<Utf32Le, A>(data, output),
        Scheme::Utf32Be => from_ascii_loop::<Utf32Be, A>(data, output),
        Scheme::Ascii => Err(TranscodeError::UnsupportedScheme),
    }
}

fn from_ascii_loop<E, A>(data: &[u8], output: &mut Arena<A>) -> Result<(), TranscodeError>
where
    E: Encoding,
    A: Allocator,
{
    let width = <E::Unit as Unit>::WIDTH;
    // An ASCII scalar is always a single unit in every scheme.
    let worst = data.len().checked_mul(width).ok_or(AllocError::SizeOverflow)?;
    output.reserve(worst)?;

    let mut units = [E::Unit::zero(); UNIT_BUF];
    for &byte in data {
        let scalar = if byte as u32 > MAX_ASCII {
            ASCII_FALLBACK as u32
        } else {
            byte as u32
        };
        let written = E::encode_one(scalar, &mut units);
        for &unit in &units[..written] {
            unit.append_to(output)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    fn fresh() -> Arena {
        Arena::new()
    }

    #[test]
    fn empty_input_is_a_noop_success() {
        let mut out = fresh();
        utf8_to_utf16le(&[], &mut out).unwrap();
        utf16le_to_utf8(&[], &mut out).unwrap();
        to_ascii(&[], Scheme::Utf8, &mut out).unwrap();
        from_ascii(&[], Scheme::Utf32Be, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.capacity(), 0);
    }

    #[test]
    fn utf8_to_utf16le_wire_bytes() {
        let mut out = fresh();
        utf8_to_utf16le("A€".as_bytes(), &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0x41, 0x00, 0xAC, 0x20]);
    }

    #[test]
    fn utf8_to_utf16be_wire_bytes() {
        let mut out = fresh();
        utf8_to_utf16be("A€".as_bytes(), &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0x00, 0x41, 0x20, 0xAC]);
    }

    #[test]
    fn utf16le_surrogate_pair_becomes_utf8_replacement() {
        // 😀 needs an astral scalar, which the UTF-8 side cannot carry.
        let mut out = fresh();
        utf16le_to_utf8(&[0xD83D, 0xDE00], &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0xEF, 0xBF, 0xBD]);
    }

    #[test]
    fn utf8_to_utf32be_wire_bytes() {
        let mut out = fresh();
        utf8_to_utf32be("A".as_bytes(), &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0x00, 0x00, 0x00, 0x41]);
    }

    #[test]
    fn utf32le_to_utf8_round_trip() {
        let mut wide = fresh();
        utf8_to_utf32le("héllo".as_bytes(), &mut wide).unwrap();

        let words: Vec<u32> = wide
            .as_slice()
            .chunks(4)
            .map(|raw| u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            .collect();
        let mut narrow = fresh();
        utf32le_to_utf8(&words, &mut narrow).unwrap();
        assert_eq!(narrow.as_slice(), "héllo".as_bytes());
    }

    #[test]
    fn transcode_appends_after_existing_content() {
        let mut out = fresh();
        out.append(b"prefix:").unwrap();
        utf8_to_utf16le(b"A", &mut out).unwrap();
        assert_eq!(out.as_slice(), b"prefix:\x41\x00");
    }

    #[test]
    fn to_ascii_degrades_wide_scalars() {
        let mut out = fresh();
        to_ascii("Ab€".as_bytes(), Scheme::Utf8, &mut out).unwrap();
        assert_eq!(out.as_slice(), b"Ab?");
    }

    #[test]
    fn to_ascii_reads_utf16be_wire_bytes() {
        let mut out = fresh();
        to_ascii(&[0x00, 0x41, 0x20, 0xAC], Scheme::Utf16Be, &mut out).unwrap();
        assert_eq!(out.as_slice(), b"A?");
    }

    #[test]
    fn to_ascii_drops_a_trailing_partial_unit() {
        let mut out = fresh();
        to_ascii(&[0x41, 0x00, 0x42], Scheme::Utf16Le, &mut out).unwrap();
        assert_eq!(out.as_slice(), b"A");
    }

    #[test]
    fn to_ascii_rejects_the_ascii_scheme() {
        let mut out = fresh();
        assert_eq!(
            to_ascii(b"x", Scheme::Ascii, &mut out),
            Err(TranscodeError::UnsupportedScheme)
        );
    }

    #[test]
    fn from_ascii_widens_and_degrades() {
        let mut out = fresh();
        from_ascii(&[0x41, 0xE9], Scheme::Utf16Be, &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0x00, 0x41, 0x00, 0x3F]);

        let mut out = fresh();
        from_ascii(&[0x41], Scheme::Utf32Le, &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0x41, 0x00, 0x00, 0x00]);
    }
}
