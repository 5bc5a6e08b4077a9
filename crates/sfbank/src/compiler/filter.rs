//! Filter cutoff and resonance.

use super::units::{abs_cents_to_hz, FormatUnits};
use crate::generator::Generator;
use crate::layer::Layer;

/// Cutoffs at or above this many absolute cents disable the filter.
pub const CUTOFF_DISABLED_CENTS: i32 = 13_500;

/// Cutoff in Hz for an absolute-cents value, 0 when disabled.
pub fn cents_to_cutoff_hz(cents: i32) -> i32 {
    if cents >= CUTOFF_DISABLED_CENTS {
        0
    } else {
        abs_cents_to_hz(cents)
    }
}

/// Load-time low-pass cutoff in Hz, 0 when the layer asks for no filtering.
pub fn cutoff_hz(units: &dyn FormatUnits, layer: &Layer) -> i32 {
    if !layer.is_set(Generator::InitialFilterFc) && !layer.is_set(Generator::ModEnvToFilterFc) {
        return 0;
    }
    let base = layer
        .get(Generator::InitialFilterFc)
        .map(|amount| units.initial_cutoff_cents(amount))
        .unwrap_or(CUTOFF_DISABLED_CENTS);
    let envelope = layer.get(Generator::ModEnvToFilterFc).map(i32::from).unwrap_or(0);
    cents_to_cutoff_hz(base + envelope)
}

/// Resonance as a linear gain above unity, never negative.
pub fn resonance(units: &dyn FormatUnits, layer: &Layer) -> f32 {
    let Some(amount) = layer.get(Generator::InitialFilterQ) else {
        return 0.0;
    };
    let centibels = f64::from(units.filter_q_centibels(amount));
    (10f64.powf(centibels / 2.0 / 200.0) - 1.0).max(0.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::units::{Sf1Units, Sf2Units};

    #[test]
    fn test_disable_boundary() {
        assert_eq!(cents_to_cutoff_hz(13_500), 0);
        assert_eq!(cents_to_cutoff_hz(14_000), 0);
        let hz = cents_to_cutoff_hz(13_499);
        assert!(hz > 19_000 && hz < 20_000);
    }

    #[test]
    fn test_no_filter_operators_means_no_filter() {
        assert_eq!(cutoff_hz(&Sf2Units, &Layer::new()), 0);
    }

    #[test]
    fn test_envelope_delta_alone_lowers_default() {
        let mut layer = Layer::new();
        layer.set(Generator::ModEnvToFilterFc, -1200);
        assert_eq!(cutoff_hz(&Sf2Units, &layer), abs_cents_to_hz(12_300));
    }

    #[test]
    fn test_sf1_open_filter() {
        let mut layer = Layer::new();
        layer.set(Generator::InitialFilterFc, 127);
        assert_eq!(cutoff_hz(&Sf1Units, &layer), 0);
        layer.set(Generator::InitialFilterFc, 100);
        assert_eq!(cutoff_hz(&Sf1Units, &layer), abs_cents_to_hz(9366));
    }

    #[test]
    fn test_resonance_clamped_at_zero() {
        let mut layer = Layer::new();
        assert_eq!(resonance(&Sf2Units, &layer), 0.0);
        layer.set(Generator::InitialFilterQ, -100);
        assert_eq!(resonance(&Sf2Units, &layer), 0.0);
        layer.set(Generator::InitialFilterQ, 400);
        assert!((resonance(&Sf2Units, &layer) - 9.0).abs() < 1e-4);
    }
}
