//! In-memory bank construction for tests.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::generator::Generator;

/// Route `log` output through the test harness.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A bag as a list of generator assignments.
pub(crate) type TestBag = Vec<(Generator, i16)>;

/// Sample descriptor with positions relative to the sample's own data.
#[derive(Debug, Clone)]
pub(crate) struct TestSample {
    name: String,
    start: i32,
    end: i32,
    loop_start: i32,
    loop_end: i32,
    sample_rate: i32,
    original_pitch: u8,
    pitch_correction: i8,
    sample_type: u16,
}

impl TestSample {
    pub(crate) fn new(name: &str, start: i32, end: i32, loop_start: i32, loop_end: i32) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            loop_start,
            loop_end,
            sample_rate: 44_100,
            original_pitch: 60,
            pitch_correction: 0,
            sample_type: 1,
        }
    }

    pub(crate) fn rate(mut self, sample_rate: i32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub(crate) fn pitch(mut self, original_pitch: u8, pitch_correction: i8) -> Self {
        self.original_pitch = original_pitch;
        self.pitch_correction = pitch_correction;
        self
    }

    pub(crate) fn rom(mut self) -> Self {
        self.sample_type = 0x8001;
        self
    }
}

/// Builds a complete RIFF `sfbk` image.
#[derive(Debug, Clone)]
pub(crate) struct BankBuilder {
    version: Option<u16>,
    name: Option<String>,
    extra_info: Vec<([u8; 4], Vec<u8>)>,
    info_last: bool,
    presets: Vec<(String, u16, u16, Vec<TestBag>)>,
    instruments: Vec<(String, Vec<TestBag>)>,
    samples: Vec<TestSample>,
    pcm: Vec<i16>,
}

impl BankBuilder {
    pub(crate) fn new(version: u16) -> Self {
        Self {
            version: Some(version),
            name: None,
            extra_info: Vec::new(),
            info_last: false,
            presets: Vec::new(),
            instruments: Vec::new(),
            samples: Vec::new(),
            pcm: Vec::new(),
        }
    }

    pub(crate) fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub(crate) fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    /// Place the INFO list after sdta and pdta.
    pub(crate) fn info_last(mut self) -> Self {
        self.info_last = true;
        self
    }

    pub(crate) fn extra_info_chunk(mut self, tag: [u8; 4], payload: &[u8]) -> Self {
        self.extra_info.push((tag, payload.to_vec()));
        self
    }

    /// Append PCM data and a sample row pointing into it. Returns the sample index.
    pub(crate) fn add_sample(&mut self, sample: TestSample, data: &[i16]) -> usize {
        let base = self.pcm.len() as i32;
        self.pcm.extend_from_slice(data);
        self.samples.push(TestSample {
            start: sample.start + base,
            end: sample.end + base,
            loop_start: sample.loop_start + base,
            loop_end: sample.loop_end + base,
            ..sample
        });
        self.samples.len() - 1
    }

    pub(crate) fn add_instrument(&mut self, name: &str, bags: Vec<TestBag>) -> usize {
        self.instruments.push((name.to_string(), bags));
        self.instruments.len() - 1
    }

    pub(crate) fn add_preset(&mut self, name: &str, bank: u16, program: u16, bags: Vec<TestBag>) -> usize {
        self.presets.push((name.to_string(), bank, program, bags));
        self.presets.len() - 1
    }

    fn is_v1(&self) -> bool {
        self.version == Some(1)
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let info = self.info_list();
        let sdta = self.sample_data_list();
        let pdta = self.preset_data_list();

        let mut body = b"sfbk".to_vec();
        if self.info_last {
            body.extend(sdta);
            body.extend(pdta);
            body.extend(info);
        } else {
            body.extend(info);
            body.extend(sdta);
            body.extend(pdta);
        }
        chunk(b"RIFF", &body)
    }

    fn info_list(&self) -> Vec<u8> {
        let mut children = Vec::new();
        if let Some(major) = self.version {
            let mut ifil = Vec::new();
            ifil.write_u16::<LittleEndian>(major).unwrap();
            ifil.write_u16::<LittleEndian>(1).unwrap();
            children.push(chunk(b"ifil", &ifil));
        }
        if let Some(name) = &self.name {
            let mut inam = name.as_bytes().to_vec();
            inam.push(0);
            if inam.len() % 2 == 1 {
                inam.push(0);
            }
            children.push(chunk(b"INAM", &inam));
        }
        for (tag, payload) in &self.extra_info {
            children.push(chunk(tag, payload));
        }
        list(b"INFO", &children)
    }

    fn sample_data_list(&self) -> Vec<u8> {
        let mut children = Vec::new();
        if self.is_v1() {
            let mut snam = Vec::new();
            for sample in &self.samples {
                snam.extend_from_slice(&name_field(&sample.name));
            }
            children.push(chunk(b"snam", &snam));
        }
        let mut smpl = Vec::new();
        for &frame in &self.pcm {
            smpl.write_i16::<LittleEndian>(frame).unwrap();
        }
        children.push(chunk(b"smpl", &smpl));
        list(b"sdta", &children)
    }

    fn preset_data_list(&self) -> Vec<u8> {
        let (mut phdr, mut pbag, mut pgen) = (Vec::new(), Vec::new(), Vec::new());
        let (mut bag_count, mut gen_count) = (0u16, 0u16);
        for (name, bank, program, bags) in &self.presets {
            phdr.write_all(&name_field(name)).unwrap();
            phdr.write_u16::<LittleEndian>(*program).unwrap();
            phdr.write_u16::<LittleEndian>(*bank).unwrap();
            phdr.write_u16::<LittleEndian>(bag_count).unwrap();
            phdr.write_all(&[0; 12]).unwrap();
            write_bags(bags, &mut pbag, &mut pgen, &mut bag_count, &mut gen_count);
        }
        phdr.write_all(&name_field("EOP")).unwrap();
        phdr.write_all(&[0; 4]).unwrap();
        phdr.write_u16::<LittleEndian>(bag_count).unwrap();
        phdr.write_all(&[0; 12]).unwrap();
        close_bags(&mut pbag, &mut pgen, gen_count);

        let (mut inst, mut ibag, mut igen) = (Vec::new(), Vec::new(), Vec::new());
        let (mut bag_count, mut gen_count) = (0u16, 0u16);
        for (name, bags) in &self.instruments {
            inst.write_all(&name_field(name)).unwrap();
            inst.write_u16::<LittleEndian>(bag_count).unwrap();
            write_bags(bags, &mut ibag, &mut igen, &mut bag_count, &mut gen_count);
        }
        inst.write_all(&name_field("EOI")).unwrap();
        inst.write_u16::<LittleEndian>(bag_count).unwrap();
        close_bags(&mut ibag, &mut igen, gen_count);

        let mut shdr = Vec::new();
        for sample in &self.samples {
            self.write_sample_row(&mut shdr, sample);
        }
        if !self.is_v1() {
            self.write_sample_row(&mut shdr, &TestSample::new("EOS", 0, 0, 0, 0));
        }

        list(
            b"pdta",
            &[
                chunk(b"phdr", &phdr),
                chunk(b"pbag", &pbag),
                chunk(b"pmod", &[0; 10]),
                chunk(b"pgen", &pgen),
                chunk(b"inst", &inst),
                chunk(b"ibag", &ibag),
                chunk(b"imod", &[0; 10]),
                chunk(b"igen", &igen),
                chunk(b"shdr", &shdr),
            ],
        )
    }

    fn write_sample_row(&self, shdr: &mut Vec<u8>, sample: &TestSample) {
        if self.is_v1() {
            for v in [sample.start, sample.end, sample.loop_start, sample.loop_end] {
                shdr.write_i32::<LittleEndian>(v).unwrap();
            }
            return;
        }
        shdr.write_all(&name_field(&sample.name)).unwrap();
        for v in [
            sample.start,
            sample.end,
            sample.loop_start,
            sample.loop_end,
            sample.sample_rate,
        ] {
            shdr.write_i32::<LittleEndian>(v).unwrap();
        }
        shdr.write_u8(sample.original_pitch).unwrap();
        shdr.write_i8(sample.pitch_correction).unwrap();
        shdr.write_u16::<LittleEndian>(0).unwrap();
        shdr.write_u16::<LittleEndian>(sample.sample_type).unwrap();
    }
}

fn write_bags(
    bags: &[TestBag],
    bag_table: &mut Vec<u8>,
    gen_table: &mut Vec<u8>,
    bag_count: &mut u16,
    gen_count: &mut u16,
) {
    for bag in bags {
        bag_table.write_u16::<LittleEndian>(*gen_count).unwrap();
        bag_table.write_u16::<LittleEndian>(0).unwrap();
        *bag_count += 1;
        for &(generator, amount) in bag {
            gen_table.write_u16::<LittleEndian>(generator.index() as u16).unwrap();
            gen_table.write_i16::<LittleEndian>(amount).unwrap();
            *gen_count += 1;
        }
    }
}

/// Sentinel bag and terminal generator record.
fn close_bags(bag_table: &mut Vec<u8>, gen_table: &mut Vec<u8>, gen_count: u16) {
    bag_table.write_u16::<LittleEndian>(gen_count).unwrap();
    bag_table.write_u16::<LittleEndian>(0).unwrap();
    gen_table.write_all(&[0; 4]).unwrap();
}

fn name_field(name: &str) -> [u8; 20] {
    let mut field = [0u8; 20];
    let len = name.len().min(20);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    field
}

pub(crate) fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = tag.to_vec();
    buf.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    buf.extend_from_slice(payload);
    buf
}

fn list(list_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = list_type.to_vec();
    for child in children {
        payload.extend_from_slice(child);
    }
    chunk(b"LIST", &payload)
}
