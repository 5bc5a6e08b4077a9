//! Volume envelope conversion.
//!
//! Stages: attack to full level, hold, decay to the sustain level,
//! release, then two terminal stages the mixer uses to fade the voice out.

use super::units::FormatUnits;
use crate::config::SynthConfig;
use crate::generator::Generator;
use crate::layer::Layer;
use crate::types::Envelope;

/// Shortest stage duration used in rate calculations.
pub const MIN_STAGE_MSEC: i32 = 6;

/// Sustain level used when the layer sets none.
pub const DEFAULT_SUSTAIN_LEVEL: i32 = 250;

/// 8-bit level to envelope fixed point.
pub fn to_offset(level: i32) -> i32 {
    level << (7 + 15)
}

/// Ramp rate covering `diff` levels in `msec` milliseconds.
pub fn calc_rate(diff: i32, msec: i32, output_rate: u32, control_ratio: u32) -> i32 {
    let msec = i64::from(msec.max(MIN_STAGE_MSEC));
    let diff = match diff {
        0 => 255,
        d => i64::from(d).abs(),
    };
    let scaled = diff << (7 + 15);
    let rate = (scaled / i64::from(output_rate.max(1))) * i64::from(control_ratio);
    (rate * 1000 / msec).min(i64::from(i32::MAX)) as i32
}

fn stage_msec(units: &dyn FormatUnits, layer: &Layer, generator: Generator) -> i32 {
    layer
        .get(generator)
        .map(|amount| units.time_msec(amount))
        .unwrap_or(MIN_STAGE_MSEC)
}

/// Sustain level (0-255) of `layer`.
pub fn sustain_level(units: &dyn FormatUnits, layer: &Layer) -> i32 {
    layer
        .get(Generator::SustainVolEnv)
        .map(|amount| units.sustain_level(amount))
        .unwrap_or(DEFAULT_SUSTAIN_LEVEL)
}

/// Build the six-stage envelope for a looping sample.
pub fn volume_envelope(units: &dyn FormatUnits, layer: &Layer, config: &SynthConfig) -> Envelope {
    let rate = |diff, msec| calc_rate(diff, msec, config.output_rate, config.control_ratio());

    let attack = stage_msec(units, layer, Generator::AttackVolEnv);
    let hold = stage_msec(units, layer, Generator::HoldVolEnv);
    let decay = stage_msec(units, layer, Generator::DecayVolEnv);
    let release = stage_msec(units, layer, Generator::ReleaseVolEnv);
    let sustain = sustain_level(units, layer);

    Envelope {
        offsets: [
            to_offset(255),
            to_offset(250),
            to_offset(sustain),
            to_offset(5),
            to_offset(4),
            to_offset(4),
        ],
        rates: [
            rate(255, attack).saturating_mul(2),
            rate(5, hold),
            rate(250 - sustain, decay),
            rate(255, release),
            to_offset(200),
            to_offset(200),
        ],
    }
}
