use super::{Decoded, Encoding};

/**
UTF-32 little-endian: the identity transform.  No surrogate or range validation is performed in either direction.
*/
pub enum Utf32Le {}

impl Encoding for Utf32Le {
    type Unit = u32;
    const MAX_UNITS: usize = 1;

    fn decode_one(input: &[u32]) -> Option<Decoded> {
        input.first().map(|&word| Decoded {
            scalar: word,
            consumed: 1,
        })
    }

    fn encode_one(scalar: u32, out: &mut [u32]) -> usize {
        out[0] = scalar;
        1
    }
}

/**
UTF-32 big-endian: every word byte-swapped, otherwise the identity transform.
*/
pub enum Utf32Be {}

impl Encoding for Utf32Be {
    type Unit = u32;
    const MAX_UNITS: usize = 1;

    fn decode_one(input: &[u32]) -> Option<Decoded> {
        input.first().map(|&word| Decoded {
            scalar: word.swap_bytes(),
            consumed: 1,
        })
    }

    fn encode_one(scalar: u32, out: &mut [u32]) -> usize {
        out[0] = scalar.swap_bytes();
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_is_identity() {
        assert_eq!(
            Utf32Le::decode_one(&[0x1F600]),
            Some(Decoded {
                scalar: 0x1F600,
                consumed: 1
            })
        );

        let mut out = [0u32; 1];
        assert_eq!(Utf32Le::encode_one(0x20AC, &mut out), 1);
        assert_eq!(out[0], 0x20AC);
    }

    #[test]
    fn big_endian_swaps_words() {
        assert_eq!(
            Utf32Be::decode_one(&[0xAC20_0000]),
            Some(Decoded {
                scalar: 0x20AC,
                consumed: 1
            })
        );

        let mut out = [0u32; 1];
        assert_eq!(Utf32Be::encode_one(0x20AC, &mut out), 1);
        assert_eq!(out[0], 0xAC20_0000);
    }

    #[test]
    fn out_of_range_words_pass_through() {
        // UTF-32 performs no validation; garbage in, garbage out.
        assert_eq!(
            Utf32Le::decode_one(&[0xFFFF_FFFF]),
            Some(Decoded {
                scalar: 0xFFFF_FFFF,
                consumed: 1
            })
        );
    }
}
