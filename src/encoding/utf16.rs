use super::{Decoded, Encoding, REPLACEMENT};

const REPLACEMENT_UNIT: u16 = 0xFFFD;

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

fn decode_native(input: &[u16]) -> Option<Decoded> {
    let first = *input.first()?;

    if !(0xD800..=0xDFFF).contains(&first) {
        return Some(Decoded {
            scalar: first as u32,
            consumed: 1,
        });
    }
    if is_low_surrogate(first) {
        return Some(Decoded {
            scalar: REPLACEMENT,
            consumed: 1,
        });
    }

    // A high surrogate claims both units of its pair whether or not the
    // pair is complete; the bulk drivers clamp against a truncated input.
    let scalar = match input.get(1) {
        Some(&low) if is_low_surrogate(low) => {
            0x10000 + (((first as u32 & 0x3FF) << 10) | (low as u32 & 0x3FF))
        }
        _ => REPLACEMENT,
    };

    Some(Decoded {
        scalar,
        consumed: 2,
    })
}

fn encode_native(scalar: u32, out: &mut [u16]) -> usize {
    if (0xD800..=0xDFFF).contains(&scalar) || scalar > 0x10_FFFF {
        out[0] = REPLACEMENT_UNIT;
        return 1;
    }
    if scalar < 0x10000 {
        out[0] = scalar as u16;
        return 1;
    }

    let offset = scalar - 0x10000;
    out[0] = 0xD800 + (offset >> 10) as u16;
    out[1] = 0xDC00 + (offset & 0x3FF) as u16;
    2
}

/**
UTF-16 little-endian.
*/
pub enum Utf16Le {}

impl Encoding for Utf16Le {
    type Unit = u16;
    const MAX_UNITS: usize = 2;

    fn decode_one(input: &[u16]) -> Option<Decoded> {
        decode_native(input)
    }

    fn encode_one(scalar: u32, out: &mut [u16]) -> usize {
        encode_native(scalar, out)
    }
}

/**
UTF-16 big-endian.

Operates by byte-swapping each unit and applying the little-endian logic, so unit values here are byte-swapped memory images: serialising them little-endian yields big-endian wire bytes.
*/
pub enum Utf16Be {}

impl Encoding for Utf16Be {
    type Unit = u16;
    const MAX_UNITS: usize = 2;

    fn decode_one(input: &[u16]) -> Option<Decoded> {
        let len = input.len().min(2);
        let mut native = [0u16; 2];
        for (dst, src) in native[..len].iter_mut().zip(input) {
            *dst = src.swap_bytes();
        }
        decode_native(&native[..len])
    }

    fn encode_one(scalar: u32, out: &mut [u16]) -> usize {
        let written = encode_native(scalar, out);
        for unit in &mut out[..written] {
            *unit = unit.swap_bytes();
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmp_unit_decodes_directly() {
        assert_eq!(
            Utf16Le::decode_one(&[0x20AC]),
            Some(Decoded {
                scalar: 0x20AC,
                consumed: 1
            })
        );
    }

    #[test]
    fn lone_high_surrogate_consumes_two() {
        assert_eq!(
            Utf16Le::decode_one(&[0xD800]),
            Some(Decoded {
                scalar: REPLACEMENT,
                consumed: 2
            })
        );
    }

    #[test]
    fn lone_low_surrogate_consumes_one() {
        assert_eq!(
            Utf16Le::decode_one(&[0xDC00]),
            Some(Decoded {
                scalar: REPLACEMENT,
                consumed: 1
            })
        );
    }

    #[test]
    fn minimal_surrogate_pair_combines() {
        assert_eq!(
            Utf16Le::decode_one(&[0xD800, 0xDC00]),
            Some(Decoded {
                scalar: 0x10000,
                consumed: 2
            })
        );
    }

    #[test]
    fn high_surrogate_with_bad_follower_consumes_both() {
        assert_eq!(
            Utf16Le::decode_one(&[0xD800, 0x0041]),
            Some(Decoded {
                scalar: REPLACEMENT,
                consumed: 2
            })
        );
    }

    #[test]
    fn astral_scalar_splits_into_a_pair() {
        let mut out = [0u16; 2];
        assert_eq!(Utf16Le::encode_one(0x1F600, &mut out), 2);
        assert_eq!(out, [0xD83D, 0xDE00]);
    }

    #[test]
    fn surrogate_scalar_encodes_to_replacement_unit() {
        let mut out = [0u16; 2];
        assert_eq!(Utf16Le::encode_one(0xD800, &mut out), 1);
        assert_eq!(out[0], REPLACEMENT_UNIT);
        assert_eq!(Utf16Le::encode_one(0x110000, &mut out), 1);
        assert_eq!(out[0], REPLACEMENT_UNIT);
    }

    #[test]
    fn big_endian_units_are_byte_swapped() {
        // 0x20AC on the wire as BE is 20 AC; read little-endian that is 0xAC20.
        assert_eq!(
            Utf16Be::decode_one(&[0xAC20]),
            Some(Decoded {
                scalar: 0x20AC,
                consumed: 1
            })
        );

        let mut out = [0u16; 2];
        assert_eq!(Utf16Be::encode_one(0x20AC, &mut out), 1);
        assert_eq!(out[0], 0xAC20);
    }

    #[test]
    fn big_endian_surrogate_pair_round_trips() {
        let mut out = [0u16; 2];
        let written = Utf16Be::encode_one(0x1F600, &mut out);
        assert_eq!(written, 2);
        assert_eq!(
            Utf16Be::decode_one(&out),
            Some(Decoded {
                scalar: 0x1F600,
                consumed: 2
            })
        );
    }
}
