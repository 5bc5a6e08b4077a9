//! The voice registry.
//!
//! [`SoundfontManager`] owns everything a running synthesizer needs from its
//! SoundFont banks: the resolved voices of every loaded bank, the
//! exclusion/order rules and the open bank files their PCM is read from.
//! Sample data is loaded lazily the first time a voice is materialized and
//! cached on the voice afterwards.
//!
//! The manager does no internal locking. Share it behind a lock if the
//! control path and playback path run on different threads.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::compiler::Compiler;
use crate::config::SynthConfig;
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::layer::PackedRange;
use crate::loader::load_sample;
use crate::parser::{parse_bank, Bank};
use crate::resolver::{resolve_preset, ResolvedLayer};
use crate::rules::{RuleSet, VoicePattern};
use crate::types::{Instrument, ResolvedVoice, DRUM_BANK};

/// A loaded bank file and, unless configured otherwise, its open handle.
#[derive(Debug)]
struct BankSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
}

impl BankSource {
    fn reader(&mut self) -> Result<&mut BufReader<File>> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => {
                log::debug!("Reopening bank file {}", self.path.display());
                BufReader::new(File::open(&self.path)?)
            }
        };
        Ok(self.reader.insert(reader))
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

/// Registry of resolved voices from one or more SoundFont banks.
pub struct SoundfontManager {
    config: SynthConfig,
    rules: RuleSet,
    sources: Vec<BankSource>,
    voices: Vec<ResolvedVoice>,
}

impl Default for SoundfontManager {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}

impl SoundfontManager {
    pub fn new(config: SynthConfig) -> Self {
        Self {
            config,
            rules: RuleSet::new(),
            sources: Vec::new(),
            voices: Vec::new(),
        }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Exclude matching voices. Negative fields are wildcards.
    ///
    /// Exclusions apply to banks loaded later and hide already loaded
    /// voices from lookups. A rule with an out-of-range field is ignored.
    pub fn exclude(&mut self, bank: i32, program: i32, key: i32) {
        match VoicePattern::from_raw(bank, program, key) {
            Some(pattern) => self.exclude_pattern(pattern),
            None => log::warn!("Ignoring exclusion {}:{} key {}: out of range", bank, program, key),
        }
    }

    pub fn exclude_pattern(&mut self, pattern: VoicePattern) {
        log::debug!("Excluding {:?}", pattern);
        self.rules.exclude(pattern);
    }

    /// Override the order of matching voices in banks loaded later.
    /// Negative fields are wildcards; a rule with an out-of-range field is
    /// ignored.
    pub fn set_order(&mut self, bank: i32, program: i32, key: i32, order: i32) {
        match VoicePattern::from_raw(bank, program, key) {
            Some(pattern) => self.set_order_pattern(pattern, order),
            None => log::warn!(
                "Ignoring order {} for {}:{} key {}: out of range",
                order,
                bank,
                program,
                key
            ),
        }
    }

    pub fn set_order_pattern(&mut self, pattern: VoicePattern, order: i32) {
        log::debug!("Order {} for {:?}", order, pattern);
        self.rules.set_order(pattern, order);
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    /// Parse a bank file and register its voices under `order`.
    ///
    /// Either every voice of the bank is registered or, on error, none is.
    /// Returns the number of voices added.
    pub fn load_bank(&mut self, path: impl AsRef<Path>, order: i32) -> anyhow::Result<usize> {
        let path = path.as_ref();
        log::info!("Loading SoundFont bank: {}", path.display());

        let file = File::open(path).with_context(|| format!("Failed to open bank: {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let bank = parse_bank(&mut reader).with_context(|| format!("Failed to parse bank: {}", path.display()))?;

        let source = self.sources.len();
        let mut staged = Vec::new();
        let compiler = Compiler::new(&bank, &self.config);
        for (index, preset) in bank.presets() {
            if self.rules.is_excluded(preset.bank, preset.program, None) {
                log::debug!(
                    "Excluded preset '{}' ({}:{})",
                    preset.name,
                    preset.bank,
                    preset.program
                );
                continue;
            }
            resolve_preset(&bank, index, |resolved| {
                register_layer(&mut staged, &self.rules, &compiler, &bank, source, order, resolved)
            })
            .with_context(|| {
                format!(
                    "Failed to resolve preset '{}' ({}:{}) in {}",
                    preset.name,
                    preset.bank,
                    preset.program,
                    path.display()
                )
            })?;
        }

        let added = staged.len();
        log::info!(
            "Loaded bank '{}' (format {:?}): {} presets, {} voices",
            bank.name.as_deref().unwrap_or("unnamed"),
            bank.format,
            bank.preset_count(),
            added
        );

        self.voices.extend(staged);
        self.sources.push(BankSource {
            path: path.to_path_buf(),
            reader: (!self.config.reopen_per_lookup).then_some(reader),
        });
        Ok(added)
    }

    /// Load a bank, logging instead of returning any failure.
    pub fn init_from_file(&mut self, path: impl AsRef<Path>, order: i32) {
        let path = path.as_ref();
        if let Err(e) = self.load_bank(path, order) {
            log::error!("Could not load SoundFont {}: {:#}", path.display(), e);
        }
    }

    /// Index of the first matching voice that is not excluded.
    ///
    /// `key` of `None` matches any voice, keyed or not.
    pub fn find(&self, order: i32, bank: u16, program: u16, key: Option<u8>) -> Option<usize> {
        self.voices.iter().position(|voice| {
            voice.order == order
                && voice.bank == bank
                && voice.program == program
                && (key.is_none() || voice.key == key)
                && !self.rules.is_excluded(voice.bank, voice.program, voice.key)
        })
    }

    pub fn lookup(&self, order: i32, bank: u16, program: u16, key: Option<u8>) -> Option<&ResolvedVoice> {
        self.find(order, bank, program, key).map(|index| &self.voices[index])
    }

    /// Load the PCM of every sample of voice `index` that is not cached yet
    /// and return the playable instrument.
    pub fn materialize(&mut self, index: usize) -> Result<Instrument> {
        let Self {
            config,
            sources,
            voices,
            ..
        } = self;
        let voice_count = voices.len();
        let voice = voices
            .get_mut(index)
            .ok_or_else(|| Error::bad_reference("voices", index, voice_count))?;

        if !voice.is_loaded() {
            let source_count = sources.len();
            let source = sources
                .get_mut(voice.source)
                .ok_or_else(|| Error::bad_reference("sources", voice.source, source_count))?;

            let loaded = load_voice(source, voice, config);
            if config.reopen_per_lookup {
                source.close();
            }
            loaded?;
        }

        Ok(Instrument {
            bank: voice.bank,
            program: voice.program,
            key: voice.key,
            name: voice.name.clone(),
            samples: voice
                .samples
                .iter()
                .filter_map(|record| record.loaded().cloned())
                .collect(),
        })
    }

    /// Look up a voice and load its samples. Failures are logged and
    /// reported as absent.
    pub fn lookup_and_materialize(
        &mut self,
        order: i32,
        bank: u16,
        program: u16,
        key: Option<u8>,
    ) -> Option<Instrument> {
        let index = self.find(order, bank, program, key)?;
        match self.materialize(index) {
            Ok(instrument) if instrument.samples.is_empty() => None,
            Ok(instrument) => Some(instrument),
            Err(e) => {
                log::warn!(
                    "Could not load voice {}:{} key {:?}: {}",
                    bank,
                    program,
                    key,
                    e
                );
                None
            }
        }
    }

    pub fn voices(&self) -> &[ResolvedVoice] {
        &self.voices
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Paths of the loaded bank files, in load order.
    pub fn bank_paths(&self) -> impl Iterator<Item = &Path> {
        self.sources.iter().map(|source| source.path.as_path())
    }

    /// Drop all cached PCM. Voices load again on their next materialize.
    pub fn clear_cache(&mut self) {
        for record in self.voices.iter_mut().flat_map(|voice| voice.samples.iter_mut()) {
            record.loaded = None;
        }
    }

    /// Bytes of PCM currently cached.
    pub fn cache_size(&self) -> usize {
        self.voices
            .iter()
            .flat_map(|voice| voice.samples.iter())
            .filter_map(|record| record.loaded())
            .map(|sample| sample.data.len() * std::mem::size_of::<i16>())
            .sum()
    }

    /// Release all voices, rules and open bank files.
    pub fn teardown(&mut self) {
        if !self.voices.is_empty() || !self.sources.is_empty() {
            log::debug!(
                "Releasing {} voices from {} banks",
                self.voices.len(),
                self.sources.len()
            );
        }
        self.voices.clear();
        self.sources.clear();
        self.rules.clear();
    }
}

impl Drop for SoundfontManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SoundfontManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundfontManager")
            .field("banks", &self.sources.len())
            .field("voices", &self.voices.len())
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

fn load_voice(source: &mut BankSource, voice: &mut ResolvedVoice, config: &SynthConfig) -> Result<()> {
    let reader = source.reader()?;
    for record in voice.samples.iter_mut().filter(|record| !record.is_loaded()) {
        log::trace!("Loading sample '{}' ({} bytes)", record.sample_name, record.byte_len);
        record.loaded = Some(load_sample(reader, record, config)?);
    }
    Ok(())
}

/// Compile one resolved layer and file it under its voice.
fn register_layer(
    voices: &mut Vec<ResolvedVoice>,
    rules: &RuleSet,
    compiler: &Compiler<'_>,
    bank: &Bank,
    source: usize,
    default_order: i32,
    resolved: ResolvedLayer,
) -> Result<()> {
    let preset = &bank.presets[resolved.preset];
    let key = (preset.bank == DRUM_BANK)
        .then(|| PackedRange::from_amount(resolved.layer.amount(Generator::KeyRange)).low);

    if rules.is_excluded(preset.bank, preset.program, key) {
        log::trace!("Excluded {}:{} key {:?}", preset.bank, preset.program, key);
        return Ok(());
    }

    let Some(record) = compiler.compile(&resolved.layer, key)? else {
        return Ok(());
    };

    let existing = voices.iter().position(|voice| {
        voice.source == source && voice.bank == preset.bank && voice.program == preset.program && voice.key == key
    });
    let index = match existing {
        Some(index) => index,
        None => {
            let order = rules.order_for(preset.bank, preset.program, key).unwrap_or(default_order);
            let name = bank.instruments[resolved.instrument].name.clone();
            log::trace!(
                "New voice '{}' {}:{} key {:?} order {}",
                name,
                preset.bank,
                preset.program,
                key,
                order
            );
            voices.push(ResolvedVoice {
                bank: preset.bank,
                program: preset.program,
                key,
                order,
                name,
                source,
                samples: Vec::new(),
            });
            voices.len() - 1
        }
    };
    voices[index].samples.push(record);
    Ok(())
}
