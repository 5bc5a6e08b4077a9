//! Tremolo and vibrato conversion.

use super::units::{centibels_to_linear, FormatUnits};
use crate::config::SynthConfig;
use crate::generator::Generator;
use crate::layer::Layer;
use crate::types::{Tremolo, Vibrato};

/// Extra precision bits of the tremolo phase accumulator.
pub const RATE_SHIFT: u32 = 5;
/// Entries in one period of the mixer's sine table.
pub const SINE_CYCLE_LENGTH: i64 = 1024;
/// Vibrato table steps per half period.
pub const VIBRATO_SAMPLE_INCREMENTS: i64 = 32;

/// Tremolo parameters, if the layer modulates volume from the LFO.
pub fn tremolo(units: &dyn FormatUnits, layer: &Layer, config: &SynthConfig) -> Option<Tremolo> {
    let amount = layer.get(Generator::ModLfoToVolume)?;
    let depth = centibels_to_linear(f64::from(units.tremolo_centibels(amount))) as f32;
    let freq = i64::from(units.lfo_freq_mhz(layer.get(Generator::FreqModLfo)));
    let increment = ((SINE_CYCLE_LENGTH << RATE_SHIFT) * freq * i64::from(config.control_ratio()))
        / (1000 * i64::from(config.output_rate.max(1)));
    Some(Tremolo {
        depth,
        phase_increment: increment.clamp(0, i64::from(i32::MAX)) as i32,
        sweep_increment: 0,
    })
}

/// Vibrato parameters, if the layer modulates pitch from the LFO.
pub fn vibrato(units: &dyn FormatUnits, layer: &Layer, config: &SynthConfig) -> Option<Vibrato> {
    let amount = layer.get(Generator::VibLfoToPitch)?;
    let depth = (units.vibrato_cents(amount) * 256 / 400).clamp(i32::from(i8::MIN), i32::from(i8::MAX));
    let freq = i64::from(units.lfo_freq_mhz(layer.get(Generator::FreqVibLfo))).max(1);
    let ratio = i64::from(config.output_rate) * 1000 / (freq * 2 * VIBRATO_SAMPLE_INCREMENTS);
    Some(Vibrato {
        depth: depth as i8,
        control_ratio: ratio.clamp(0, i64::from(i32::MAX)) as i32,
        sweep_increment: 0,
    })
}
