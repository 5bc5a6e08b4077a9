//! Root pitch calculation.

use sfbank_dsp::{bend_fine, freq_table};

use super::units::FormatUnits;
use crate::generator::Generator;
use crate::layer::Layer;
use crate::parser::SampleInfo;

/// Bring `tune` into (-100, 0] by moving whole semitones into `root`.
///
/// Banks that encode the root far above the key range are pulled down
/// five octaves first.
pub fn normalize_root(mut root: i32, mut tune: i32, key_high: Option<u8>) -> (i32, i32) {
    if let Some(high) = key_high {
        if root >= i32::from(high) + 60 {
            root -= 60;
        }
    }
    while tune <= -100 {
        root += 1;
        tune += 100;
    }
    while tune > 0 {
        root -= 1;
        tune -= 100;
    }
    (root, tune)
}

/// Frequency in milli-Hertz of `root` raised by `-tune` cents.
pub fn root_frequency(root: i32, tune: i32) -> i32 {
    let note = root.clamp(0, 127) as usize;
    let bend = ((-tune * 255) / 100).clamp(0, 255) as usize;
    (f64::from(freq_table()[note]) * bend_fine()[bend]) as i32
}

/// Frequency the sample sounds at when played unshifted, in milli-Hertz.
pub fn calc_root_freq(
    units: &dyn FormatUnits,
    layer: &Layer,
    sample: &SampleInfo,
    scale_tuning: i32,
) -> i32 {
    let (root, tune) = units.root_and_tune(layer, sample, scale_tuning);
    let key_high = layer.range(Generator::KeyRange).map(|r| r.high);
    let (root, tune) = normalize_root(root, tune, key_high);
    if !(0..=127).contains(&root) {
        log::debug!("Root note {} of sample '{}' clamped to MIDI range", root, sample.name);
    }
    root_frequency(root, tune)
}
