/*!
Byte-order-mark detection and emission.
*/
use crate::alloc::Allocator;
use crate::arena::Arena;

use super::conv::TranscodeError;
use super::Scheme;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF32BE_BOM: [u8; 4] = [0x00, 0x00, 0xFE, 0xFF];
const UTF32LE_BOM: [u8; 4] = [0xFF, 0xFE, 0x00, 0x00];

/**
Classifies `data` by its leading byte-order mark.

Signatures are tested longest first: the UTF-32LE mark begins with the UTF-16LE mark, so the four-byte checks must win.  Inputs shorter than two bytes, and inputs carrying no recognised mark, classify as [`Scheme::Ascii`].
*/
pub fn detect(data: &[u8]) -> Scheme {
    if data.len() < 2 {
        return Scheme::Ascii;
    }
    if data.len() >= 4 {
        if data[..4] == UTF32BE_BOM {
            return Scheme::Utf32Be;
        }
        if data[..4] == UTF32LE_BOM {
            return Scheme::Utf32Le;
        }
    }
    if data.len() >= 3 && data[..3] == UTF8_BOM {
        return Scheme::Utf8;
    }
    if data[..2] == UTF16BE_BOM {
        return Scheme::Utf16Be;
    }
    if data[..2] == UTF16LE_BOM {
        return Scheme::Utf16Le;
    }
    Scheme::Ascii
}

/**
Appends the byte-order mark for `scheme` to `output`.

ASCII and UTF-8 append nothing and succeed: the original tooling this crate round-trips with never emits a UTF-8 mark.
*/
pub fn write_bom<A: Allocator>(scheme: Scheme, output: &mut Arena<A>) -> Result<(), TranscodeError> {
    let mark: &[u8] = match scheme {
        Scheme::Ascii | Scheme::Utf8 => &[],
        Scheme::Utf16Be => &UTF16BE_BOM,
        Scheme::Utf16Le => &UTF16LE_BOM,
        Scheme::Utf32Be => &UTF32BE_BOM,
        Scheme::Utf32Le => &UTF32LE_BOM,
    };
    output.append(mark)?;
    Ok(())
}
