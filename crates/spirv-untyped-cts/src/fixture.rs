//! Byte buffers that cases read from and are compared against.
//!
//! Each element is `kind.size()` bytes of lane data followed by `padding` zero bytes, so the
//! distance between elements is the stride the container requires.

use crate::atomic::AtomicStep;
use crate::container::Container;
use crate::data_type::DataType;
use half::f16;
use rand::{Rng as _, RngCore, SeedableRng as _};
use rand_chacha::ChaCha8Rng;
use spirv_untyped_cts_types::{BufferUsage, Resource};

/// Random fills always draw at least this many elements, so small requests from one seed are
/// prefixes of each other.
const MIN_RANDOM_ELEMENTS: usize = 24;

/// Random float lanes are drawn from `[-FLOAT_RANGE, FLOAT_RANGE)`.
const FLOAT_RANGE: f32 = 1000.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FillStrategy {
    /// Every lane of every element holds this value, converted with `as`.
    Constant(f64),
    /// Every lane of element `i` holds `i`.
    Sequential,
    Random { seed: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FillSpec {
    pub strategy: FillStrategy,
    pub count: usize,
    /// Zero bytes after each element.
    pub padding: u32,
}

impl FillSpec {
    pub fn constant(value: f64, count: usize) -> Self {
        Self::new(FillStrategy::Constant(value), count)
    }

    pub fn sequential(count: usize) -> Self {
        Self::new(FillStrategy::Sequential, count)
    }

    pub fn random(seed: u32, count: usize) -> Self {
        Self::new(FillStrategy::Random { seed }, count)
    }

    /// Random data seeded from the name of the group the case lives in.
    pub fn random_for_group(group: &str, count: usize) -> Self {
        Self::random(string_hash(group), count)
    }

    fn new(strategy: FillStrategy, count: usize) -> Self {
        Self {
            strategy,
            count,
            padding: 0,
        }
    }

    pub fn with_padding(self, padding: u32) -> Self {
        Self { padding, ..self }
    }

    /// Pads every element of `kind` up to `container`'s array stride.
    pub fn for_container(self, container: Container, kind: DataType) -> Self {
        self.with_padding(container.padding(kind))
    }
}

/// The `djb2` hash of `name`.
pub fn string_hash(name: &str) -> u32 {
    name.bytes().fold(5381u32, |hash, byte| {
        hash.wrapping_mul(33).wrapping_add(u32::from(byte))
    })
}

/// A buffer of `count` elements laid out with `stride` bytes between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
    pub kind: DataType,
    pub bytes: Vec<u8>,
    pub stride: u32,
    pub count: usize,
}

impl Fixture {
    pub fn zeroed(kind: DataType, stride: u32, count: usize) -> Self {
        debug_assert!(stride >= kind.size());
        Self {
            kind,
            bytes: vec![0; stride as usize * count],
            stride,
            count,
        }
    }

    pub fn padding(&self) -> u32 {
        self.stride - self.kind.size()
    }

    /// The data bytes of element `index`, without padding.
    pub fn element(&self, index: usize) -> &[u8] {
        let start = index * self.stride as usize;
        &self.bytes[start..start + self.kind.size() as usize]
    }

    pub fn elements(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.count).map(|index| self.element(index))
    }

    /// The same element data laid out with another stride.
    pub fn restride(&self, stride: u32) -> Self {
        let mut out = Self::zeroed(self.kind, stride, self.count);
        let size = self.kind.size() as usize;
        for (index, element) in self.elements().enumerate() {
            let start = index * stride as usize;
            out.bytes[start..start + size].copy_from_slice(element);
        }
        out
    }

    /// The elements in reverse order, with the same stride.
    pub fn reversed(&self) -> Self {
        let stride = self.stride as usize;
        let bytes = self
            .bytes
            .chunks_exact(stride)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self {
            bytes,
            ..self.clone()
        }
    }

    /// The same bytes viewed as elements of `kind`, which must have the same size.
    pub fn reinterpret(&self, kind: DataType) -> Self {
        debug_assert_eq!(kind.size(), self.kind.size());
        Self {
            kind,
            ..self.clone()
        }
    }

    pub fn to_resource(&self, usage: BufferUsage) -> Resource {
        Resource::new(
            usage,
            self.stride as usize,
            self.count,
            self.bytes.clone(),
        )
    }
}

/// Appends one lane of scalar `lane` holding `value`.
fn push_int_lane(lane: DataType, value: i64, out: &mut Vec<u8>) {
    match lane {
        DataType::Uint8 => out.extend_from_slice(bytemuck::bytes_of(&(value as u8))),
        DataType::Int8 => out.extend_from_slice(bytemuck::bytes_of(&(value as i8))),
        DataType::Uint16 => out.extend_from_slice(bytemuck::bytes_of(&(value as u16))),
        DataType::Int16 => out.extend_from_slice(bytemuck::bytes_of(&(value as i16))),
        DataType::Float16 => out.extend_from_slice(bytemuck::bytes_of(&f16::from_f64(value as f64))),
        DataType::Uint32 => out.extend_from_slice(bytemuck::bytes_of(&(value as u32))),
        DataType::Int32 => out.extend_from_slice(bytemuck::bytes_of(&(value as i32))),
        DataType::Float32 => out.extend_from_slice(bytemuck::bytes_of(&(value as f32))),
        DataType::Uint64 => out.extend_from_slice(bytemuck::bytes_of(&(value as u64))),
        DataType::Int64 => out.extend_from_slice(bytemuck::bytes_of(&value)),
        DataType::Float64 => out.extend_from_slice(bytemuck::bytes_of(&(value as f64))),
        vector => unreachable!("{vector} is not a lane type"),
    }
}

fn push_float_lane(lane: DataType, value: f64, out: &mut Vec<u8>) {
    match lane {
        DataType::Uint8 => out.extend_from_slice(bytemuck::bytes_of(&(value as u8))),
        DataType::Int8 => out.extend_from_slice(bytemuck::bytes_of(&(value as i8))),
        DataType::Uint16 => out.extend_from_slice(bytemuck::bytes_of(&(value as u16))),
        DataType::Int16 => out.extend_from_slice(bytemuck::bytes_of(&(value as i16))),
        DataType::Float16 => out.extend_from_slice(bytemuck::bytes_of(&f16::from_f64(value))),
        DataType::Uint32 => out.extend_from_slice(bytemuck::bytes_of(&(value as u32))),
        DataType::Int32 => out.extend_from_slice(bytemuck::bytes_of(&(value as i32))),
        DataType::Float32 => out.extend_from_slice(bytemuck::bytes_of(&(value as f32))),
        DataType::Uint64 => out.extend_from_slice(bytemuck::bytes_of(&(value as u64))),
        DataType::Int64 => out.extend_from_slice(bytemuck::bytes_of(&(value as i64))),
        DataType::Float64 => out.extend_from_slice(bytemuck::bytes_of(&value)),
        vector => unreachable!("{vector} is not a lane type"),
    }
}

/// Integer lanes take raw bits from the stream; float lanes a finite value in range.
fn push_random_lane(lane: DataType, rng: &mut ChaCha8Rng, out: &mut Vec<u8>) {
    match lane {
        DataType::Float16 => {
            let value = f16::from_f32(rng.gen_range(-FLOAT_RANGE..FLOAT_RANGE));
            out.extend_from_slice(bytemuck::bytes_of(&value));
        }
        DataType::Float32 => {
            let value: f32 = rng.gen_range(-FLOAT_RANGE..FLOAT_RANGE);
            out.extend_from_slice(bytemuck::bytes_of(&value));
        }
        DataType::Float64 => {
            let range = f64::from(FLOAT_RANGE);
            let value: f64 = rng.gen_range(-range..range);
            out.extend_from_slice(bytemuck::bytes_of(&value));
        }
        _ => {
            let bits = rng.next_u64().to_le_bytes();
            out.extend_from_slice(&bits[..lane.size() as usize]);
        }
    }
}

/// Builds `fill.count` elements of `kind` as described by `fill`.
pub fn synthesize(kind: DataType, fill: &FillSpec) -> Fixture {
    let lane = kind.lane();
    let lanes = kind.element_count();
    let stride = kind.size() + fill.padding;
    let padding = fill.padding as usize;

    let generated = match fill.strategy {
        FillStrategy::Random { .. } => fill.count.max(MIN_RANDOM_ELEMENTS),
        FillStrategy::Constant(_) | FillStrategy::Sequential => fill.count,
    };
    let mut rng = match fill.strategy {
        FillStrategy::Random { seed } => Some(ChaCha8Rng::seed_from_u64(u64::from(seed))),
        FillStrategy::Constant(_) | FillStrategy::Sequential => None,
    };

    let mut bytes = Vec::with_capacity(stride as usize * generated);
    for index in 0..generated {
        for _ in 0..lanes {
            match (fill.strategy, rng.as_mut()) {
                (FillStrategy::Constant(value), _) => push_float_lane(lane, value, &mut bytes),
                (FillStrategy::Sequential, _) => push_int_lane(lane, index as i64, &mut bytes),
                (FillStrategy::Random { .. }, Some(rng)) => {
                    push_random_lane(lane, rng, &mut bytes);
                }
                (FillStrategy::Random { .. }, None) => unreachable!(),
            }
        }
        bytes.resize(bytes.len() + padding, 0);
    }
    bytes.truncate(stride as usize * fill.count);

    Fixture {
        kind,
        bytes,
        stride,
        count: fill.count,
    }
}

/// Initial contents of an atomic target together with the steps applied to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtomicFixture {
    pub initial: Fixture,
    pub steps: Vec<AtomicStep>,
}

/// A zeroed buffer of `count` elements of `kind` and a copy of `steps`.
///
/// The value the buffer holds after the steps run is left to whoever executes the case.
pub fn synthesize_atomic_target(kind: DataType, count: usize, steps: &[AtomicStep]) -> AtomicFixture {
    AtomicFixture {
        initial: Fixture::zeroed(kind, kind.size(), count),
        steps: steps.to_vec(),
    }
}
