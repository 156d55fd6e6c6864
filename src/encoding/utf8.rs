use super::{Decoded, Encoding, REPLACEMENT};

/**
The replacement scalar's UTF-8 byte sequence.
*/
pub(crate) const REPLACEMENT_UTF8: [u8; 3] = [0xEF, 0xBF, 0xBD];

/**
UTF-8, restricted to the basic multilingual plane.

Scalars above U+FFFF have no representation here: four-byte sequences are rejected on decode, and encoding an astral scalar produces the replacement sequence.  The UTF-16 schemes keep full surrogate-pair support, so this limitation is only observable on the UTF-8 side.
*/
pub enum Utf8 {}

fn is_continuation(byte: u8) -> bool {
    (0x80..=0xBF).contains(&byte)
}

// A 0xE0 lead followed by 0x80..=0x9F would re-encode a two-byte scalar.
fn is_valid_after_e0(byte: u8) -> bool {
    (0xA0..=0xBF).contains(&byte)
}

impl Encoding for Utf8 {
    type Unit = u8;
    const MAX_UNITS: usize = 3;

    fn decode_one(input: &[u8]) -> Option<Decoded> {
        let lead = *input.first()?;

        if lead < 0x80 {
            return Some(Decoded {
                scalar: lead as u32,
                consumed: 1,
            });
        }
        // A lone continuation byte.  Leads >= 0xF0 fall through to the
        // gather below and come out as replacements there.
        if lead < 0xC0 {
            return Some(Decoded {
                scalar: REPLACEMENT,
                consumed: 1,
            });
        }

        // Gather up to two continuation bytes, stopping at the first byte
        // that is not one.
        let mut tail = [0u8; 2];
        let mut count = 0;
        for &byte in input.iter().skip(1).take(2) {
            if !is_continuation(byte) {
                break;
            }
            tail[count] = byte;
            count += 1;
        }

        let scalar = match count {
            2 if (0xE0..=0xEF).contains(&lead) => {
                if lead == 0xE0 && !is_valid_after_e0(tail[0]) {
                    REPLACEMENT
                } else {
                    ((lead as u32 & 0x1F) << 12)
                        | ((tail[0] as u32 & 0x3F) << 6)
                        | (tail[1] as u32 & 0x3F)
                }
            }
            1 if lead < 0xE0 => ((lead as u32 & 0x1F) << 6) | (tail[0] as u32 & 0x3F),
            _ => REPLACEMENT,
        };

        Some(Decoded {
            scalar,
            consumed: 1 + count,
        })
    }

    fn encode_one(scalar: u32, out: &mut [u8]) -> usize {
        if scalar < 0x80 {
            out[0] = scalar as u8;
            1
        } else if scalar < 0x800 {
            out[0] = 0xC0 + ((scalar >> 6) & 0x1F) as u8;
            out[1] = 0x80 + (scalar & 0x3F) as u8;
            2
        } else if scalar < 0x10000 && !(0xD800..=0xDFFF).contains(&scalar) {
            out[0] = 0xE0 + ((scalar >> 12) & 0x0F) as u8;
            out[1] = 0x80 + ((scalar >> 6) & 0x3F) as u8;
            out[2] = 0x80 + (scalar & 0x3F) as u8;
            3
        } else {
            out[..3].copy_from_slice(&REPLACEMENT_UTF8);
            3
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Decoded {
        Utf8::decode_one(input).unwrap()
    }

    fn encode(scalar: u32) -> Vec<u8> {
        let mut out = [0u8; 3];
        let written = Utf8::encode_one(scalar, &mut out);
        out[..written].to_vec()
    }

    #[test]
    fn ascii_decodes_directly() {
        assert_eq!(
            decode(&[0x41]),
            Decoded {
                scalar: 0x41,
                consumed: 1
            }
        );
    }

    #[test]
    fn lone_continuation_byte_is_replaced() {
        assert_eq!(
            decode(&[0x80]),
            Decoded {
                scalar: REPLACEMENT,
                consumed: 1
            }
        );
    }

    #[test]
    fn two_byte_sequence_decodes() {
        assert_eq!(
            decode(&[0xC3, 0xA9]),
            Decoded {
                scalar: 0xE9,
                consumed: 2
            }
        );
    }

    #[test]
    fn truncated_two_byte_sequence_is_replaced() {
        assert_eq!(
            decode(&[0xC3]),
            Decoded {
                scalar: REPLACEMENT,
                consumed: 1
            }
        );
    }

    #[test]
    fn euro_sign_round_trips() {
        assert_eq!(encode(0x20AC), vec![0xE2, 0x82, 0xAC]);
        assert_eq!(
            decode(&[0xE2, 0x82, 0xAC]),
            Decoded {
                scalar: 0x20AC,
                consumed: 3
            }
        );
    }

    #[test]
    fn overlong_e0_sequence_is_replaced() {
        assert_eq!(
            decode(&[0xE0, 0x80, 0x80]),
            Decoded {
                scalar: REPLACEMENT,
                consumed: 3
            }
        );
    }

    #[test]
    fn e0_with_valid_second_byte_decodes() {
        // U+0800, the smallest three-byte scalar.
        assert_eq!(
            decode(&[0xE0, 0xA0, 0x80]),
            Decoded {
                scalar: 0x800,
                consumed: 3
            }
        );
    }

    #[test]
    fn four_byte_lead_is_replaced() {
        // The gathered continuation bytes are consumed with the bad lead.
        let got = decode(&[0xF0, 0x9F, 0x98, 0x80]);
        assert_eq!(got.scalar, REPLACEMENT);
        assert_eq!(got.consumed, 3);
    }

    #[test]
    fn astral_scalar_encodes_to_replacement() {
        assert_eq!(encode(0x1F600), REPLACEMENT_UTF8.to_vec());
        assert_eq!(encode(0xD800), REPLACEMENT_UTF8.to_vec());
    }

    #[test]
    fn bmp_round_trip_is_idempotent() {
        for scalar in (0u32..0x1_0000)
            .filter(|scalar| !(0xD800..=0xDFFF).contains(scalar))
        {
            let first = encode(scalar);
            let decoded = decode(&first);
            assert_eq!(decoded.consumed, first.len());
            assert_eq!(encode(decoded.scalar), first, "scalar {:#X}", scalar);
        }
    }
}
