//! Lazy PCM loading.
//!
//! Sample data stays in the bank file until a voice is first requested.
//! Loading reads the little-endian frames, appends guard frames for the
//! mixer's interpolation lookahead, then applies the load-time low-pass
//! filter and drum pre-resampling.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use sfbank_dsp::{lowpass_in_place, note_frequency, pre_resample, FRACTION_BITS};

use crate::config::SynthConfig;
use crate::error::Result;
use crate::layer::PackedRange;
use crate::types::{LoadedSample, SampleSynthRecord};

/// Zero frames appended after the last stored frame.
pub const GUARD_FRAMES: usize = 3;

/// Read the stored frames of `record` and append the guard frames.
pub fn read_sample_pcm<R: Read + Seek>(reader: &mut R, record: &SampleSynthRecord) -> Result<Vec<i16>> {
    let frames = record.stored_frames();
    reader.seek(SeekFrom::Start(record.file_offset))?;
    let mut data = vec![0i16; frames + GUARD_FRAMES];
    reader.read_i16_into::<LittleEndian>(&mut data[..frames])?;
    Ok(data)
}

/// Post-process freshly read PCM into a ready sample.
pub fn prepare_sample(record: &SampleSynthRecord, mut data: Vec<i16>, config: &SynthConfig) -> Result<LoadedSample> {
    let mut params = record.params.clone();
    let stored = data.len().saturating_sub(GUARD_FRAMES);

    if config.cutoff && record.cutoff_hz > 0 {
        let frames = params.frames().min(stored);
        let rate = u32::try_from(params.sample_rate).unwrap_or(0);
        log::debug!(
            "Low-pass '{}' at {} Hz (resonance {})",
            record.sample_name,
            record.cutoff_hz,
            record.resonance
        );
        lowpass_in_place(&mut data[..frames], rate, record.cutoff_hz, record.resonance);
    }

    if config.pre_resample && !params.is_looping() {
        // note 0 marks a drum layer without a key range, which plays unshifted
        if let Some(note) = params.note_to_use.filter(|&note| note > 0) {
            let frames = params.frames().min(stored);
            let rate = u32::try_from(params.sample_rate).unwrap_or(0);
            let resampled = pre_resample(&data[..frames], rate, params.root_freq, note, config.output_rate)?;
            let scale = |position: i64| (position as f64 / resampled.step) as i64;
            params.loop_start = scale(params.loop_start);
            params.loop_end = scale(params.loop_end);
            params.data_length = (resampled.data.len() as i64) << FRACTION_BITS;
            params.sample_rate = config.output_rate as i32;
            params.root_freq = note_frequency(note);
            params.low_freq = note_frequency(PackedRange::FULL.low);
            params.high_freq = note_frequency(PackedRange::FULL.high);
            data = resampled.data;
            data.extend_from_slice(&[0; GUARD_FRAMES]);
        }
    }

    Ok(LoadedSample {
        params,
        data: Arc::from(data),
    })
}

/// Read and prepare the sample of `record`.
pub fn load_sample<R: Read + Seek>(
    reader: &mut R,
    record: &SampleSynthRecord,
    config: &SynthConfig,
) -> Result<LoadedSample> {
    let data = read_sample_pcm(reader, record)?;
    prepare_sample(record, data, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Envelope, SampleModes, SampleParams};
    use sfbank_dsp::freq_table;
    use std::io::Cursor;

    fn record(file_offset: u64, frames: u64) -> SampleSynthRecord {
        SampleSynthRecord {
            sample_index: 0,
            sample_name: "test".to_string(),
            file_offset,
            byte_len: frames * 2,
            params: SampleParams {
                loop_start: 2 << FRACTION_BITS,
                loop_end: 6 << FRACTION_BITS,
                data_length: (frames as i64) << FRACTION_BITS,
                sample_rate: 22_050,
                low_freq: freq_table()[0],
                high_freq: freq_table()[127],
                root_freq: freq_table()[60],
                key_range: PackedRange::FULL,
                velocity_range: PackedRange::FULL,
                scale_tuning: 100,
                volume: 1.0,
                panning: 64,
                envelope: Envelope::default(),
                tremolo: None,
                vibrato: None,
                modes: SampleModes::BIT16,
                note_to_use: None,
            },
            cutoff_hz: 0,
            resonance: 0.0,
            loaded: None,
        }
    }

    fn file_with(prefix: usize, frames: &[i16]) -> Cursor<Vec<u8>> {
        let mut bytes = vec![0xEEu8; prefix];
        for f in frames {
            bytes.extend_from_slice(&f.to_le_bytes());
        }
        Cursor::new(bytes)
    }

    #[test]
    fn test_reads_little_endian_with_guards() {
        let mut file = file_with(6, &[1, -2, 300, -32768]);
        let data = read_sample_pcm(&mut file, &record(6, 4)).unwrap();
        assert_eq!(data, vec![1, -2, 300, -32768, 0, 0, 0]);
    }

    #[test]
    fn test_short_file_is_an_error() {
        let mut file = file_with(0, &[1, 2]);
        assert!(read_sample_pcm(&mut file, &record(0, 8)).is_err());
    }

    #[test]
    fn test_untouched_without_filter_or_drum_note() {
        let rec = record(0, 4);
        let loaded = prepare_sample(&rec, vec![5, 6, 7, 8, 0, 0, 0], &SynthConfig::default()).unwrap();
        assert_eq!(&loaded.data[..], &[5, 6, 7, 8, 0, 0, 0]);
        assert_eq!(loaded.params, rec.params);
    }

    #[test]
    fn test_filter_only_when_enabled() {
        let mut rec = record(0, 4);
        rec.cutoff_hz = 500;
        let data = vec![10_000, 10_000, 10_000, 10_000, 0, 0, 0];

        let off = prepare_sample(&rec, data.clone(), &SynthConfig::default()).unwrap();
        assert_eq!(&off.data[..4], &[10_000; 4]);

        let config = SynthConfig {
            cutoff: true,
            ..Default::default()
        };
        let on = prepare_sample(&rec, data, &config).unwrap();
        assert!(on.data[0] < 10_000);
        assert_eq!(&on.data[4..], &[0, 0, 0]);
    }

    #[test]
    fn test_drum_note_pre_resamples() {
        let mut rec = record(0, 8);
        rec.params.note_to_use = Some(60);
        let data = vec![0, 10, 20, 30, 40, 50, 60, 70, 0, 0, 0];
        let loaded = prepare_sample(&rec, data, &SynthConfig::default()).unwrap();
        // 22.05 kHz source at its root note doubles in length at 44.1 kHz
        assert_eq!(loaded.params.frames(), 16);
        assert_eq!(loaded.data.len(), 16 + GUARD_FRAMES);
        assert_eq!(loaded.params.sample_rate, 44_100);
        assert_eq!(loaded.params.loop_start, 4 << FRACTION_BITS);
        assert_eq!(loaded.params.loop_end, 12 << FRACTION_BITS);
        assert_eq!(loaded.params.root_freq, freq_table()[60]);
        assert_eq!(loaded.data[1], 5);
    }

    #[test]
    fn test_drum_note_zero_is_not_resampled() {
        let mut rec = record(0, 4);
        rec.params.note_to_use = Some(0);
        let loaded = prepare_sample(&rec, vec![1, 2, 3, 4, 0, 0, 0], &SynthConfig::default()).unwrap();
        assert_eq!(&loaded.data[..], &[1, 2, 3, 4, 0, 0, 0]);
        assert_eq!(loaded.params.sample_rate, 22_050);
    }

    #[test]
    fn test_looping_drum_is_not_resampled() {
        let mut rec = record(0, 4);
        rec.params.note_to_use = Some(60);
        rec.params.modes |= SampleModes::LOOPING;
        let loaded = prepare_sample(&rec, vec![1, 2, 3, 4, 0, 0, 0], &SynthConfig::default()).unwrap();
        assert_eq!(loaded.data.len(), 7);
        assert_eq!(loaded.params.sample_rate, 22_050);
    }
}
