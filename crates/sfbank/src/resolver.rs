//! Preset and instrument resolution.
//!
//! A preset is a list of bags. A bag without an instrument reference is
//! the preset's global layer; every other bag selects an instrument and
//! contributes its generators on top of the global layer. Instruments are
//! resolved the same way one level down, with bags that carry a sample
//! reference becoming voices.
//!
//! Global layers only apply to bags that follow them and never leak from
//! one preset or instrument into the next.

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::layer::{append_layer, Layer};
use crate::parser::Bank;

/// A fully combined layer for one preset/instrument/sample triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayer {
    /// Index of the preset in the bank's header table
    pub preset: usize,
    /// Index of the instrument in the bank's header table
    pub instrument: usize,
    pub layer: Layer,
}

/// Walk one preset and hand every combined sample layer to `emit`.
pub fn resolve_preset<F>(bank: &Bank, preset: usize, mut emit: F) -> Result<()>
where
    F: FnMut(ResolvedLayer) -> Result<()>,
{
    let mut global = Layer::new();
    for bag in bank.preset_bag_range(preset)? {
        let mut layer = Layer::from_generators(bank.preset_bag_generators(bag)?);
        match layer.get(Generator::Instrument) {
            None => global = layer,
            Some(amount) => {
                let instrument = usize::from(amount as u16);
                if instrument >= bank.instrument_count() {
                    return Err(Error::bad_reference("pgen", instrument, bank.instrument_count()));
                }
                append_layer(&mut layer, &global, bank.format);
                resolve_instrument(bank, preset, instrument, &layer, &mut emit)?;
            }
        }
    }
    Ok(())
}

fn resolve_instrument<F>(
    bank: &Bank,
    preset: usize,
    instrument: usize,
    preset_layer: &Layer,
    emit: &mut F,
) -> Result<()>
where
    F: FnMut(ResolvedLayer) -> Result<()>,
{
    let mut global = *preset_layer;
    for bag in bank.instrument_bag_range(instrument)? {
        let mut layer = Layer::from_generators(bank.instrument_bag_generators(bag)?);
        if layer.is_set(Generator::SampleId) {
            append_layer(&mut layer, &global, bank.format);
            emit(ResolvedLayer {
                preset,
                instrument,
                layer,
            })?;
        } else {
            append_layer(&mut global, &layer, bank.format);
        }
    }
    Ok(())
}
