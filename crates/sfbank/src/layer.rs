//! Generator layers and layer merging.
//!
//! A [`Layer`] is the decoded content of one bag: one 16-bit amount per
//! operator plus a record of which operators the bag actually set. Layers
//! from the preset and instrument levels are combined with
//! [`append_layer`] before a voice is compiled.

use std::fmt;

use crate::generator::{Generator, GENERATOR_COUNT};
use crate::parser::{FormatVersion, GeneratorRecord};

/// A low/high byte pair packed into one generator amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRange {
    pub low: u8,
    pub high: u8,
}

impl PackedRange {
    /// The whole MIDI key or velocity range.
    pub const FULL: PackedRange = PackedRange { low: 0, high: 127 };

    pub fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// Low byte is the lower bound, high byte the upper bound.
    pub fn from_amount(amount: i16) -> Self {
        let raw = amount as u16;
        Self {
            low: (raw & 0xff) as u8,
            high: (raw >> 8) as u8,
        }
    }

    pub fn to_amount(self) -> i16 {
        ((u16::from(self.high) << 8) | u16::from(self.low)) as i16
    }

    /// Overlap of two ranges. May come out empty.
    pub fn intersect(self, other: PackedRange) -> PackedRange {
        PackedRange {
            low: self.low.max(other.low),
            high: self.high.min(other.high),
        }
    }

    pub fn contains(self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }

    pub fn is_empty(self) -> bool {
        self.low > self.high
    }
}

/// One amount per operator and the set of operators present.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    values: [i16; GENERATOR_COUNT],
    set: u64,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    pub const fn new() -> Self {
        Self {
            values: [0; GENERATOR_COUNT],
            set: 0,
        }
    }

    /// Build a layer from a bag's generator list. Later records for the
    /// same operator overwrite earlier ones; unknown operators are dropped.
    pub fn from_generators(records: &[GeneratorRecord]) -> Self {
        let mut layer = Self::new();
        for record in records {
            match Generator::from_id(record.operator) {
                Some(generator) => layer.set(generator, record.amount),
                None => log::trace!("Ignoring unknown generator {}", record.operator),
            }
        }
        layer
    }

    pub fn set(&mut self, generator: Generator, amount: i16) {
        self.values[generator.index()] = amount;
        self.set |= 1u64 << generator.index();
    }

    pub fn is_set(&self, generator: Generator) -> bool {
        self.set & (1u64 << generator.index()) != 0
    }

    pub fn get(&self, generator: Generator) -> Option<i16> {
        self.is_set(generator).then(|| self.values[generator.index()])
    }

    /// Amount of `generator`, zero when unset.
    pub fn amount(&self, generator: Generator) -> i16 {
        self.values[generator.index()]
    }

    /// Decode a range operator, `None` when unset.
    pub fn range(&self, generator: Generator) -> Option<PackedRange> {
        self.get(generator).map(PackedRange::from_amount)
    }

    pub fn is_empty(&self) -> bool {
        self.set == 0
    }

    pub fn len(&self) -> usize {
        self.set.count_ones() as usize
    }

    /// Operators that are set, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Generator, i16)> + '_ {
        Generator::ALL
            .iter()
            .filter(|g| self.is_set(**g))
            .map(|&g| (g, self.values[g.index()]))
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Fold `src` into `dst`.
///
/// - operators unset in `dst` take the value from `src`
/// - key and velocity ranges intersect
/// - in version-1 banks the attenuation from `src` replaces the one in `dst`
/// - every other operator adds, wrapping at 16 bits
pub fn append_layer(dst: &mut Layer, src: &Layer, format: FormatVersion) {
    for (generator, amount) in src.iter() {
        let merged = match dst.get(generator) {
            None => amount,
            Some(existing) if generator.is_range() => PackedRange::from_amount(existing)
                .intersect(PackedRange::from_amount(amount))
                .to_amount(),
            Some(_) if format == FormatVersion::V1 && generator == Generator::InitialAttenuation => amount,
            Some(existing) => existing.wrapping_add(amount),
        };
        dst.set(generator, merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(pairs: &[(Generator, i16)]) -> Layer {
        let mut layer = Layer::new();
        for &(g, v) in pairs {
            layer.set(g, v);
        }
        layer
    }

    #[test]
    fn test_packed_range_bytes() {
        let range = PackedRange::from_amount(0x3C24);
        assert_eq!(range, PackedRange::new(0x24, 0x3C));
        assert_eq!(range.to_amount(), 0x3C24);
        assert!(range.contains(40));
        assert!(!range.contains(61));

        let top = PackedRange::new(0, 255);
        assert_eq!(PackedRange::from_amount(top.to_amount()), top);
    }

    #[test]
    fn test_from_generators_last_write_wins() {
        let records = [
            GeneratorRecord { operator: 17, amount: -200 },
            GeneratorRecord { operator: 99, amount: 5 },
            GeneratorRecord { operator: 17, amount: 150 },
        ];
        let layer = Layer::from_generators(&records);
        assert_eq!(layer.get(Generator::Pan), Some(150));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_unset_reads_zero() {
        let layer = Layer::new();
        assert_eq!(layer.get(Generator::CoarseTune), None);
        assert_eq!(layer.amount(Generator::CoarseTune), 0);
        assert!(layer.is_empty());
    }

    #[test]
    fn test_ranges_intersect() {
        let key = PackedRange::new(36, 60).to_amount();
        let other = PackedRange::new(48, 72).to_amount();
        let mut dst = layer(&[(Generator::KeyRange, key)]);
        append_layer(&mut dst, &layer(&[(Generator::KeyRange, other)]), FormatVersion::V2);
        assert_eq!(dst.range(Generator::KeyRange), Some(PackedRange::new(48, 60)));
    }

    #[test]
    fn test_unset_range_takes_other_side() {
        let vel = PackedRange::new(64, 127).to_amount();
        let mut dst = Layer::new();
        append_layer(&mut dst, &layer(&[(Generator::VelRange, vel)]), FormatVersion::V2);
        assert_eq!(dst.range(Generator::VelRange), Some(PackedRange::new(64, 127)));

        let mut dst = layer(&[(Generator::VelRange, vel)]);
        append_layer(&mut dst, &Layer::new(), FormatVersion::V2);
        assert_eq!(dst.range(Generator::VelRange), Some(PackedRange::new(64, 127)));
    }

    #[test]
    fn test_additive_merge_is_order_independent() {
        let a = layer(&[(Generator::CoarseTune, 3), (Generator::Pan, -100)]);
        let b = layer(&[(Generator::CoarseTune, -5)]);
        let c = layer(&[(Generator::CoarseTune, 12), (Generator::Pan, 40)]);

        let mut left = a;
        append_layer(&mut left, &b, FormatVersion::V2);
        append_layer(&mut left, &c, FormatVersion::V2);

        let mut right = c;
        append_layer(&mut right, &b, FormatVersion::V2);
        append_layer(&mut right, &a, FormatVersion::V2);

        assert_eq!(left, right);
        assert_eq!(left.get(Generator::CoarseTune), Some(10));
        assert_eq!(left.get(Generator::Pan), Some(-60));
    }

    #[test]
    fn test_attenuation_by_format() {
        let inner = layer(&[(Generator::InitialAttenuation, 100)]);
        let outer = layer(&[(Generator::InitialAttenuation, 30)]);

        let mut v1 = inner;
        append_layer(&mut v1, &outer, FormatVersion::V1);
        assert_eq!(v1.get(Generator::InitialAttenuation), Some(30));

        let mut v2 = inner;
        append_layer(&mut v2, &outer, FormatVersion::V2);
        assert_eq!(v2.get(Generator::InitialAttenuation), Some(130));
    }

    #[test]
    fn test_addition_wraps() {
        let mut dst = layer(&[(Generator::FineTune, i16::MAX)]);
        append_layer(&mut dst, &layer(&[(Generator::FineTune, 1)]), FormatVersion::V2);
        assert_eq!(dst.get(Generator::FineTune), Some(i16::MIN));
    }
}
