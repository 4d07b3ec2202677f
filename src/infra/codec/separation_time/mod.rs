//! STmin (minimum separation time) byte format.
//!
//! | Byte        | Meaning            |
//! |-------------|--------------------|
//! | `0x00-0x7F` | 0 to 127 ms        |
//! | `0xF1-0xF9` | 100 to 900 µs      |
//! | other       | reserved, read as 0 |

/// Largest separation time representable on the wire (µs).
pub const MAX_ST_MIN_US: u32 = 127_000;

/// Decode an STmin byte into microseconds. Reserved values decode to 0.
pub fn st_min_to_us(st_min: u8) -> u32 {
    match st_min {
        0x00..=0x7F => st_min as u32 * 1000,
        0xF1..=0xF9 => (st_min - 0xF0) as u32 * 100,
        _ => 0,
    }
}

/// Encode microseconds into an STmin byte.
///
/// 100 to 900 µs select the sub-millisecond codes (truncated to 100 µs steps);
/// anything else is truncated to whole milliseconds. Values above 127 ms cannot
/// be represented and encode to 0.
pub fn us_to_st_min(us: u32) -> u8 {
    if us > MAX_ST_MIN_US {
        return 0;
    }
    if (100..=900).contains(&us) {
        0xF0 + (us / 100) as u8
    } else {
        (us / 1000) as u8
    }
}
