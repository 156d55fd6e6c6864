/*!
This crate converts text between byte-level encodings, writing its results through a growable, pool-recyclable byte arena.

The supported schemes are UTF-8 (basic multilingual plane only), UTF-16 and UTF-32 in both byte orders, seven-bit ASCII, and ten single-byte Windows code pages.  Malformed input never aborts a conversion: bad sequences degrade to the replacement scalar (or `?` when narrowing), and only resource exhaustion surfaces as an error.

# Quick Reference

The following table describes the main entry points, and when to use them.

| Task | Entry point |
| ---: | --- |
| Grow, reuse, and release byte storage | [`Arena`] |
| Recycle arenas across conversions | [`Pool`] |
| Convert between Unicode schemes | [`encoding::conv::transcode`] and its concrete wrappers |
| Narrow to / widen from ASCII | [`encoding::conv::to_ascii`], [`encoding::conv::from_ascii`] |
| Convert to / from a Windows code page | [`encoding::conv::utf8_to_code_page`], [`encoding::conv::utf8_from_code_page`] |
| Classify input by its byte-order mark | [`encoding::bom::detect`] |

Allocation is pluggable through the [`alloc::Allocator`] trait; [`alloc::Malloc`] is the default.
*/
pub mod alloc;
pub mod arena;
pub mod encoding;

pub use arena::{Arena, ArenaError, ArenaId, Pool, PoolError};
pub use encoding::conv::{CodePage, TranscodeError};
pub use encoding::Scheme;
