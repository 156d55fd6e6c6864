/*!
Encoding schemes and the code units they are built from.

Each supported scheme is a marker type implementing [`Encoding`]: a per-scalar decoder and encoder over that scheme's [`Unit`].  The bulk drivers in [`conv`] are generic over these markers, so the per-width transcoding loop exists exactly once.

Unit values are *memory images*: the big-endian schemes carry byte-swapped unit values, and serialising any unit little-endian therefore produces the scheme's wire bytes.
*/
use crate::alloc::Allocator;
use crate::arena::{Arena, ArenaError};

pub mod bom;
pub mod conv;

mod utf16;
mod utf32;
mod utf8;

pub use self::utf16::{Utf16Be, Utf16Le};
pub use self::utf32::{Utf32Be, Utf32Le};
pub use self::utf8::Utf8;

/**
The Unicode replacement scalar, emitted for malformed input.
*/
pub const REPLACEMENT: u32 = 0xFFFD;

/**
The ASCII fallback byte (`?`), emitted where a scalar has no representation in the target encoding.
*/
pub const ASCII_FALLBACK: u8 = 0x3F;

pub(crate) const MAX_ASCII: u32 = 0x7F;

/**
One code unit of an encoding scheme.
*/
pub trait Unit: Copy + Eq {
    /**
    Width of the unit in bytes.
    */
    const WIDTH: usize;

    fn zero() -> Self;

    /**
    Reads one unit from the little-endian memory image at the front of `bytes`.  Returns `None` when fewer than `WIDTH` bytes remain.
    */
    fn from_le_bytes(bytes: &[u8]) -> Option<Self>;

    /**
    Appends this unit's little-endian memory image to `out`.
    */
    fn append_to<A: Allocator>(self, out: &mut Arena<A>) -> Result<(), ArenaError>;
}

macro_rules! int_unit_impl {
    ($ty:ty, $width:expr, $push:ident) => {
        impl Unit for $ty {
            const WIDTH: usize = $width;

            #[inline]
            fn zero() -> Self {
                0
            }

            fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
                if bytes.len() < Self::WIDTH {
                    return None;
                }
                let mut raw = [0u8; $width];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                Some(<$ty>::from_le_bytes(raw))
            }

            fn append_to<A: Allocator>(self, out: &mut Arena<A>) -> Result<(), ArenaError> {
                out.$push(self)
            }
        }
    };
}

int_unit_impl! { u8, 1, push }
int_unit_impl! { u16, 2, push_u16 }
int_unit_impl! { u32, 4, push_u32 }

/**
The result of decoding one scalar from the front of a unit slice.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /**
    The decoded scalar, or [`REPLACEMENT`] for malformed input.
    */
    pub scalar: u32,

    /**
    Units consumed.  For a high surrogate at the very end of the input this reports 2 although only one unit exists; bulk callers clamp against the remaining length.
    */
    pub consumed: usize,
}

/**
A fixed-width text encoding scheme.
*/
pub trait Encoding {
    /**
    The code unit this scheme is built from.
    */
    type Unit: Unit;

    /**
    The most units one scalar can encode to.
    */
    const MAX_UNITS: usize;

    /**
    Decodes one scalar from the front of `input`.

    Returns `None` only for an empty slice.  Malformed input decodes to [`REPLACEMENT`] with a well-defined consumed count; decoding never aborts a transcode.
    */
    fn decode_one(input: &[Self::Unit]) -> Option<Decoded>;

    /**
    Encodes `scalar` into the front of `out`, returning the number of units written.  `out` must hold at least `MAX_UNITS` units.
    */
    fn encode_one(scalar: u32, out: &mut [Self::Unit]) -> usize;
}

/**
Names an encoding scheme at runtime, for BOM classification and the byte-range entry points.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}
