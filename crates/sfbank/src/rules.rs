//! Exclusion and ordering rules.
//!
//! Rules match on (bank, program, key) with every field independently
//! wildcardable. Rules are checked in registration order and the first
//! match wins.

/// A (bank, program, key) pattern. `None` matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoicePattern {
    pub bank: Option<u16>,
    pub program: Option<u16>,
    pub key: Option<u8>,
}

impl VoicePattern {
    pub fn new(bank: Option<u16>, program: Option<u16>, key: Option<u8>) -> Self {
        Self { bank, program, key }
    }

    /// Build a pattern from integer fields where any negative value is a
    /// wildcard.
    ///
    /// Returns `None` when a non-negative field is too large to name a
    /// bank, program or key, since such a pattern can match no voice.
    pub fn from_raw(bank: i32, program: i32, key: i32) -> Option<Self> {
        fn field<T: TryFrom<i32>>(value: i32) -> Option<Option<T>> {
            if value < 0 {
                Some(None)
            } else {
                T::try_from(value).ok().map(Some)
            }
        }
        Some(Self {
            bank: field(bank)?,
            program: field(program)?,
            key: field(key)?,
        })
    }

    /// Whether a voice identity matches. A keyed pattern only matches keyed
    /// voices with the same key.
    pub fn matches(&self, bank: u16, program: u16, key: Option<u8>) -> bool {
        self.bank.map_or(true, |b| b == bank)
            && self.program.map_or(true, |p| p == program)
            && self.key.map_or(true, |k| key == Some(k))
    }
}

/// Reassigns the playback order of matching voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRule {
    pub pattern: VoicePattern,
    pub order: i32,
}

/// Registered exclusion and ordering rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    excludes: Vec<VoicePattern>,
    orders: Vec<OrderRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(&mut self, pattern: VoicePattern) {
        self.excludes.push(pattern);
    }

    pub fn set_order(&mut self, pattern: VoicePattern, order: i32) {
        self.orders.push(OrderRule { pattern, order });
    }

    pub fn is_excluded(&self, bank: u16, program: u16, key: Option<u8>) -> bool {
        self.excludes.iter().any(|p| p.matches(bank, program, key))
    }

    /// Order from the first matching rule.
    pub fn order_for(&self, bank: u16, program: u16, key: Option<u8>) -> Option<i32> {
        self.orders
            .iter()
            .find(|rule| rule.pattern.matches(bank, program, key))
            .map(|rule| rule.order)
    }

    pub fn excludes(&self) -> &[VoicePattern] {
        &self.excludes
    }

    pub fn orders(&self) -> &[OrderRule] {
        &self.orders
    }

    pub fn is_empty(&self) -> bool {
        self.excludes.is_empty() && self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.excludes.clear();
        self.orders.clear();
    }
}
