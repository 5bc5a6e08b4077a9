//! Generator operators.
//!
//! A generator is an `(operator, amount)` pair stored in a bag. Operators
//! are small integer ids; this module names the 59 ids the voice builder
//! knows about. Id 55 is the sample pitch in version-1 banks and reserved
//! in later versions.

use std::fmt;

/// Number of operator slots in a [`crate::layer::Layer`].
pub const GENERATOR_COUNT: usize = 59;

/// Known generator operators, numbered by their on-disk id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Generator {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    SamplePitch = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
}

impl Generator {
    /// Every operator, indexed by id.
    pub const ALL: [Generator; GENERATOR_COUNT] = [
        Generator::StartAddrsOffset,
        Generator::EndAddrsOffset,
        Generator::StartloopAddrsOffset,
        Generator::EndloopAddrsOffset,
        Generator::StartAddrsCoarseOffset,
        Generator::ModLfoToPitch,
        Generator::VibLfoToPitch,
        Generator::ModEnvToPitch,
        Generator::InitialFilterFc,
        Generator::InitialFilterQ,
        Generator::ModLfoToFilterFc,
        Generator::ModEnvToFilterFc,
        Generator::EndAddrsCoarseOffset,
        Generator::ModLfoToVolume,
        Generator::Unused1,
        Generator::ChorusEffectsSend,
        Generator::ReverbEffectsSend,
        Generator::Pan,
        Generator::Unused2,
        Generator::Unused3,
        Generator::Unused4,
        Generator::DelayModLfo,
        Generator::FreqModLfo,
        Generator::DelayVibLfo,
        Generator::FreqVibLfo,
        Generator::DelayModEnv,
        Generator::AttackModEnv,
        Generator::HoldModEnv,
        Generator::DecayModEnv,
        Generator::SustainModEnv,
        Generator::ReleaseModEnv,
        Generator::KeynumToModEnvHold,
        Generator::KeynumToModEnvDecay,
        Generator::DelayVolEnv,
        Generator::AttackVolEnv,
        Generator::HoldVolEnv,
        Generator::DecayVolEnv,
        Generator::SustainVolEnv,
        Generator::ReleaseVolEnv,
        Generator::KeynumToVolEnvHold,
        Generator::KeynumToVolEnvDecay,
        Generator::Instrument,
        Generator::Reserved1,
        Generator::KeyRange,
        Generator::VelRange,
        Generator::StartloopAddrsCoarseOffset,
        Generator::Keynum,
        Generator::Velocity,
        Generator::InitialAttenuation,
        Generator::Reserved2,
        Generator::EndloopAddrsCoarseOffset,
        Generator::CoarseTune,
        Generator::FineTune,
        Generator::SampleId,
        Generator::SampleModes,
        Generator::SamplePitch,
        Generator::ScaleTuning,
        Generator::ExclusiveClass,
        Generator::OverridingRootKey,
    ];

    /// Look up an on-disk operator id. Ids outside 0..59 are unknown.
    pub fn from_id(id: i16) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Slot of this operator in a layer.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the amount packs a low/high byte pair.
    pub fn is_range(self) -> bool {
        matches!(self, Generator::KeyRange | Generator::VelRange)
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_table_positions() {
        for (i, generator) in Generator::ALL.iter().enumerate() {
            assert_eq!(generator.index(), i);
        }
    }

    #[test]
    fn test_from_id() {
        assert_eq!(Generator::from_id(0), Some(Generator::StartAddrsOffset));
        assert_eq!(Generator::from_id(43), Some(Generator::KeyRange));
        assert_eq!(Generator::from_id(58), Some(Generator::OverridingRootKey));
        assert_eq!(Generator::from_id(59), None);
        assert_eq!(Generator::from_id(-3), None);
    }

    #[test]
    fn test_range_operators() {
        assert!(Generator::KeyRange.is_range());
        assert!(Generator::VelRange.is_range());
        assert!(!Generator::Pan.is_range());
    }
}
