//! Per-format unit conversions.
//!
//! Version-1 and version-2 banks store the same operators in different
//! units. The compiler picks one [`FormatUnits`] implementation per bank
//! and routes every amount through it.

use crate::generator::Generator;
use crate::layer::Layer;
use crate::parser::{FormatVersion, SampleInfo};

/// Root note used when a sample declares an out-of-range original pitch.
pub const DEFAULT_ROOT_KEY: i32 = 60;

/// Milliseconds from absolute timecents.
pub fn timecents_to_msec(timecents: i32) -> i32 {
    (1000.0 * 2f64.powf(f64::from(timecents) / 1200.0)) as i32
}

/// Milli-Hertz from absolute cents (0 cents is 8.176 Hz).
pub fn abs_cents_to_mhz(cents: i32) -> i32 {
    (8176.0 * 2f64.powf(f64::from(cents) / 1200.0)) as i32
}

/// Hertz from absolute cents.
pub fn abs_cents_to_hz(cents: i32) -> i32 {
    (8.176 * 2f64.powf(f64::from(cents) / 1200.0)) as i32
}

/// Linear gain from an attenuation in centibels.
pub fn centibels_to_linear(centibels: f64) -> f64 {
    10f64.powf(-centibels / 200.0)
}

/// 0-255 envelope level from an attenuation in centibels.
pub fn centibels_to_level(centibels: f64) -> i32 {
    (255.0 * (1.0 - centibels / (1200.0 * 2f64.log10()))).clamp(0.0, 255.0) as i32
}

/// Unit conventions of one bank format.
pub trait FormatUnits: Send + Sync {
    fn version(&self) -> FormatVersion;

    /// Cents per key step for a set scale-tuning amount.
    fn scale_tuning(&self, amount: i16) -> i32;

    /// Root note and tune offset in cents before normalization.
    fn root_and_tune(&self, layer: &Layer, sample: &SampleInfo, scale_tuning: i32) -> (i32, i32);

    /// Envelope stage duration in milliseconds for a set time amount.
    fn time_msec(&self, amount: i16) -> i32;

    /// Envelope sustain level (0-255) for a set sustain amount.
    fn sustain_level(&self, amount: i16) -> i32;

    /// Linear output volume from the attenuation amount.
    fn volume(&self, amount: i16) -> f32;

    /// Pan position (0-127) for a set pan amount.
    fn pan(&self, amount: i16) -> i8;

    /// LFO frequency in milli-Hertz from the frequency operator.
    fn lfo_freq_mhz(&self, amount: Option<i16>) -> i32;

    /// Tremolo depth in centibels.
    fn tremolo_centibels(&self, amount: i16) -> i32;

    /// Vibrato depth in cents.
    fn vibrato_cents(&self, amount: i16) -> i32;

    /// Initial filter cutoff in absolute cents for a set cutoff amount.
    fn initial_cutoff_cents(&self, amount: i16) -> i32;

    /// Filter Q in centibels.
    fn filter_q_centibels(&self, amount: i16) -> i32;
}

/// Version-1 (SBK) conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sf1Units;

/// Version-2 (SF2) conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sf2Units;

/// The conversion table for `format`.
pub fn units_for(format: FormatVersion) -> &'static dyn FormatUnits {
    match format {
        FormatVersion::V1 => &Sf1Units,
        FormatVersion::V2 => &Sf2Units,
    }
}

fn sample_root(sample: &SampleInfo) -> i32 {
    match sample.original_pitch {
        pitch @ 0..=127 => i32::from(pitch),
        _ => DEFAULT_ROOT_KEY,
    }
}

/// Linear LFO rate of version-1 banks mapped onto absolute cents.
fn sbk_lfo_cents(amount: i16) -> i32 {
    (3986.0 * f64::from(amount).log10() - 7925.0) as i32
}

impl FormatUnits for Sf1Units {
    fn version(&self) -> FormatVersion {
        FormatVersion::V1
    }

    fn scale_tuning(&self, amount: i16) -> i32 {
        if amount != 0 {
            50
        } else {
            100
        }
    }

    fn root_and_tune(&self, layer: &Layer, sample: &SampleInfo, scale_tuning: i32) -> (i32, i32) {
        let mut root = sample_root(sample);
        let mut tune = i32::from(sample.pitch_correction);
        if let Some(pitch) = layer.get(Generator::SamplePitch) {
            let pitch = i32::from(pitch);
            root = pitch / 100;
            tune = -(pitch % 100);
            if tune <= -50 {
                root += 1;
                tune += 100;
            }
            if scale_tuning == 50 {
                tune /= 2;
            }
        }
        if let Some(key) = layer.get(Generator::OverridingRootKey) {
            root += i32::from(key) - 60;
        }
        tune += i32::from(layer.amount(Generator::CoarseTune)) * scale_tuning
            + i32::from(layer.amount(Generator::FineTune)) * scale_tuning / 100;
        (root, tune)
    }

    fn time_msec(&self, amount: i16) -> i32 {
        i32::from(amount)
    }

    fn sustain_level(&self, amount: i16) -> i32 {
        let level = i32::from(amount);
        if level >= 96 {
            return 0;
        }
        centibels_to_level(f64::from(1000 * (96 - level) / 96))
    }

    fn volume(&self, amount: i16) -> f32 {
        (f32::from(amount) * 2.0) / 255.0
    }

    fn pan(&self, amount: i16) -> i8 {
        amount as i8
    }

    fn lfo_freq_mhz(&self, amount: Option<i16>) -> i32 {
        match amount {
            Some(rate) if rate > 0 => abs_cents_to_mhz(sbk_lfo_cents(rate)),
            Some(cents) => abs_cents_to_mhz(i32::from(cents)),
            None => abs_cents_to_mhz(-725),
        }
    }

    fn tremolo_centibels(&self, amount: i16) -> i32 {
        120 * i32::from(amount) / 64
    }

    fn vibrato_cents(&self, amount: i16) -> i32 {
        (1200 * i32::from(amount) / 64 + 1) / 2
    }

    fn initial_cutoff_cents(&self, amount: i16) -> i32 {
        match amount {
            127 => 14_400,
            v if v > 0 => 50 * i32::from(v) + 4366,
            v => i32::from(v),
        }
    }

    fn filter_q_centibels(&self, amount: i16) -> i32 {
        i32::from(amount) * 3 / 2
    }
}

impl FormatUnits for Sf2Units {
    fn version(&self) -> FormatVersion {
        FormatVersion::V2
    }

    fn scale_tuning(&self, amount: i16) -> i32 {
        i32::from(amount)
    }

    fn root_and_tune(&self, layer: &Layer, sample: &SampleInfo, _scale_tuning: i32) -> (i32, i32) {
        let root = layer
            .get(Generator::OverridingRootKey)
            .map(i32::from)
            .unwrap_or_else(|| sample_root(sample));
        let tune = i32::from(sample.pitch_correction)
            + i32::from(layer.amount(Generator::CoarseTune)) * 100
            + i32::from(layer.amount(Generator::FineTune));
        (root, tune)
    }

    fn time_msec(&self, amount: i16) -> i32 {
        timecents_to_msec(i32::from(amount))
    }

    fn sustain_level(&self, amount: i16) -> i32 {
        centibels_to_level(f64::from(amount))
    }

    fn volume(&self, amount: i16) -> f32 {
        centibels_to_linear(f64::from(amount) / 10.0) as f32
    }

    fn pan(&self, amount: i16) -> i8 {
        let amount = i32::from(amount).clamp(-500, 500);
        ((amount + 500) * 127 / 1000) as i8
    }

    fn lfo_freq_mhz(&self, amount: Option<i16>) -> i32 {
        abs_cents_to_mhz(amount.map(i32::from).unwrap_or(0))
    }

    fn tremolo_centibels(&self, amount: i16) -> i32 {
        i32::from(amount)
    }

    fn vibrato_cents(&self, amount: i16) -> i32 {
        i32::from(amount)
    }

    fn initial_cutoff_cents(&self, amount: i16) -> i32 {
        i32::from(amount)
    }

    fn filter_q_centibels(&self, amount: i16) -> i32 {
        i32::from(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SampleType;

    fn sample(pitch: u8, correction: i8) -> SampleInfo {
        SampleInfo {
            name: String::new(),
            start: 0,
            end: 100,
            loop_start: 10,
            loop_end: 90,
            sample_rate: 44_100,
            original_pitch: pitch,
            pitch_correction: correction,
            sample_link: 0,
            sample_type: SampleType::MONO,
        }
    }

    #[test]
    fn test_units_follow_format() {
        assert_eq!(units_for(FormatVersion::V1).version(), FormatVersion::V1);
        assert_eq!(units_for(FormatVersion::V2).version(), FormatVersion::V2);
    }

    #[test]
    fn test_timecents() {
        assert_eq!(timecents_to_msec(0), 1000);
        assert_eq!(timecents_to_msec(1200), 2000);
        assert_eq!(timecents_to_msec(-1200), 500);
    }

    #[test]
    fn test_absolute_cents() {
        assert_eq!(abs_cents_to_mhz(0), 8176);
        assert_eq!(abs_cents_to_mhz(1200), 16_352);
        assert_eq!(abs_cents_to_hz(6900), 440);
    }

    #[test]
    fn test_centibel_levels() {
        assert_eq!(centibels_to_level(0.0), 255);
        assert_eq!(centibels_to_level(2000.0), 0);
        assert!((centibels_to_linear(200.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_scale_tuning_by_format() {
        assert_eq!(Sf1Units.scale_tuning(7), 50);
        assert_eq!(Sf1Units.scale_tuning(0), 100);
        assert_eq!(Sf2Units.scale_tuning(7), 7);
    }

    #[test]
    fn test_pan_by_format() {
        assert_eq!(Sf1Units.pan(100), 100);
        assert_eq!(Sf2Units.pan(0), 63);
        assert_eq!(Sf2Units.pan(-500), 0);
        assert_eq!(Sf2Units.pan(500), 127);
        assert_eq!(Sf2Units.pan(900), 127);
    }

    #[test]
    fn test_volume_by_format() {
        assert!((Sf1Units.volume(255) - 2.0).abs() < 1e-6);
        assert!((Sf2Units.volume(0) - 1.0).abs() < 1e-6);
        assert!((Sf2Units.volume(2000) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_sf1_sustain_scale() {
        assert_eq!(Sf1Units.sustain_level(96), 0);
        assert_eq!(Sf1Units.sustain_level(120), 0);
        assert_eq!(Sf1Units.sustain_level(0), centibels_to_level(1000.0));
    }

    #[test]
    fn test_sf1_cutoff_special_cases() {
        assert_eq!(Sf1Units.initial_cutoff_cents(127), 14_400);
        assert_eq!(Sf1Units.initial_cutoff_cents(10), 4866);
        assert_eq!(Sf1Units.initial_cutoff_cents(0), 0);
        assert_eq!(Sf2Units.initial_cutoff_cents(127), 127);
    }

    #[test]
    fn test_lfo_defaults() {
        assert_eq!(Sf2Units.lfo_freq_mhz(None), 8176);
        assert_eq!(Sf1Units.lfo_freq_mhz(None), abs_cents_to_mhz(-725));
        assert_eq!(Sf1Units.lfo_freq_mhz(Some(100)), abs_cents_to_mhz(3986 * 2 - 7925));
    }

    #[test]
    fn test_sf2_root_and_tune() {
        let mut layer = Layer::new();
        layer.set(Generator::CoarseTune, -2);
        layer.set(Generator::FineTune, 15);
        assert_eq!(Sf2Units.root_and_tune(&layer, &sample(60, -5), 100), (60, -190));

        layer.set(Generator::OverridingRootKey, 72);
        assert_eq!(Sf2Units.root_and_tune(&layer, &sample(60, 0), 100).0, 72);
        assert_eq!(Sf2Units.root_and_tune(&Layer::new(), &sample(255, 0), 100).0, 60);
    }

    #[test]
    fn test_sf1_sample_pitch_carry() {
        let mut layer = Layer::new();
        layer.set(Generator::SamplePitch, 6070);
        // 60.70 semitones: the remainder of -70 borrows into the root
        assert_eq!(Sf1Units.root_and_tune(&layer, &sample(60, 0), 100), (61, 30));

        layer.set(Generator::SamplePitch, 6020);
        assert_eq!(Sf1Units.root_and_tune(&layer, &sample(60, 0), 100), (60, -20));
        assert_eq!(Sf1Units.root_and_tune(&layer, &sample(60, 0), 50), (60, -10));
    }

    #[test]
    fn test_sf1_root_key_is_relative() {
        let mut layer = Layer::new();
        layer.set(Generator::OverridingRootKey, 64);
        layer.set(Generator::CoarseTune, 1);
        assert_eq!(Sf1Units.root_and_tune(&layer, &sample(60, 0), 50), (64, 50));
    }
}
