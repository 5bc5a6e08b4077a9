//! Pitch lookup tables.
//!
//! Frequencies are kept in milli-Hertz so that integer arithmetic in the
//! voice compiler keeps three decimal places of precision.

use std::sync::OnceLock;

/// Number of fractional bits in fixed-point sample positions.
pub const FRACTION_BITS: u32 = 12;

/// Frequency of MIDI note 0 in milli-Hertz.
const NOTE_ZERO_MHZ: f64 = 8175.798_915_643_707;

/// Frequency of each MIDI note in milli-Hertz (note 69 = 440 000).
pub fn freq_table() -> &'static [i32; 128] {
    static TABLE: OnceLock<[i32; 128]> = OnceLock::new();
    TABLE.get_or_init(|| {
        std::array::from_fn(|note| (NOTE_ZERO_MHZ * 2f64.powf(note as f64 / 12.0)).round() as i32)
    })
}

/// Frequency of `note` in milli-Hertz. Notes above 127 read the top entry.
pub fn note_frequency(note: u8) -> i32 {
    freq_table()[usize::from(note.min(127))]
}

/// Frequency ratios for 1/256 semitone steps: `bend_fine()[i] = 2^(i / 3072)`.
pub fn bend_fine() -> &'static [f64; 256] {
    static TABLE: OnceLock<[f64; 256]> = OnceLock::new();
    TABLE.get_or_init(|| std::array::from_fn(|i| 2f64.powf(i as f64 / (12.0 * 256.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freq_table_reference_points() {
        let table = freq_table();
        assert_eq!(table[0], 8176);
        assert_eq!(table[60], 261_626);
        assert_eq!(table[69], 440_000);
        assert_eq!(table[81], 880_000);
    }

    #[test]
    fn test_freq_table_is_increasing() {
        let table = freq_table();
        assert!(table.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_note_frequency_clamps() {
        assert_eq!(note_frequency(200), freq_table()[127]);
    }

    #[test]
    fn test_bend_fine_spans_one_semitone() {
        let table = bend_fine();
        assert_eq!(table[0], 1.0);
        let semitone = 2f64.powf(1.0 / 12.0);
        assert!(table[255] < semitone);
        assert!((table[255] * 2f64.powf(1.0 / 3072.0) - semitone).abs() < 1e-9);
    }
}
