//! Reference evaluation of atomic step sequences.

use bytemuck::Pod;
use half::f16;
use spirv_untyped_cts::{AtomicFixture, AtomicOp, AtomicStep, DataType};

/// Element types an atomic target can hold.
trait AtomicValue: Pod + PartialEq {
    fn operand(value: i64) -> Self;

    /// `self <op> rhs` for read-modify-write operations.
    fn combine(self, op: AtomicOp, rhs: Self) -> Self;
}

macro_rules! int_atomic_value {
    ($($ty:ty),+) => {$(
        impl AtomicValue for $ty {
            fn operand(value: i64) -> Self {
                value as $ty
            }

            fn combine(self, op: AtomicOp, rhs: Self) -> Self {
                match op {
                    AtomicOp::Add => self.wrapping_add(rhs),
                    AtomicOp::Sub => self.wrapping_sub(rhs),
                    AtomicOp::Min => self.min(rhs),
                    AtomicOp::Max => self.max(rhs),
                    AtomicOp::And => self & rhs,
                    AtomicOp::Or => self | rhs,
                    AtomicOp::Xor => self ^ rhs,
                    other => unreachable!("{other} does not combine values"),
                }
            }
        }
    )+};
}

int_atomic_value!(u32, i32, u64, i64);

macro_rules! float_atomic_value {
    ($($ty:ty => $from_f64:expr),+) => {$(
        impl AtomicValue for $ty {
            fn operand(value: i64) -> Self {
                $from_f64(value as f64)
            }

            fn combine(self, op: AtomicOp, rhs: Self) -> Self {
                match op {
                    AtomicOp::Add => self + rhs,
                    AtomicOp::Min => self.min(rhs),
                    AtomicOp::Max => self.max(rhs),
                    other => unreachable!("{other} is not a float atomic"),
                }
            }
        }
    )+};
}

float_atomic_value!(
    f16 => f16::from_f64,
    f32 => |value: f64| value as f32,
    f64 => |value: f64| value
);

fn apply<T: AtomicValue>(value: T, step: &AtomicStep) -> T {
    let operand = || match step.value {
        Some(operand) => T::operand(operand),
        None => unreachable!("`{step}` is missing its operand"),
    };
    match step.op {
        AtomicOp::Load => value,
        AtomicOp::Store | AtomicOp::Exchange => operand(),
        AtomicOp::CompareExchange => match step.comparator {
            Some(comparator) if value == T::operand(comparator) => operand(),
            Some(_) => value,
            None => unreachable!("`{step}` is missing its comparator"),
        },
        AtomicOp::Increment => value.combine(AtomicOp::Add, T::operand(1)),
        AtomicOp::Decrement => value.combine(AtomicOp::Sub, T::operand(1)),
        op => value.combine(op, operand()),
    }
}

fn replay_as<T: AtomicValue>(target: &AtomicFixture) -> Vec<u8> {
    let mut out = Vec::with_capacity(target.initial.bytes.len());
    for element in target.initial.elements() {
        let initial: T = bytemuck::pod_read_unaligned(element);
        let last = target.steps.iter().fold(initial, apply);
        out.extend_from_slice(bytemuck::bytes_of(&last));
        out.resize(out.len() + target.initial.padding() as usize, 0);
    }
    out
}

/// The bytes `target` holds after every element has gone through the steps.
pub fn replay(target: &AtomicFixture) -> Vec<u8> {
    match target.initial.kind {
        DataType::Uint32 => replay_as::<u32>(target),
        DataType::Int32 => replay_as::<i32>(target),
        DataType::Uint64 => replay_as::<u64>(target),
        DataType::Int64 => replay_as::<i64>(target),
        DataType::Float16 => replay_as::<f16>(target),
        DataType::Float32 => replay_as::<f32>(target),
        DataType::Float64 => replay_as::<f64>(target),
        other => unreachable!("{other} is not atomic eligible"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spirv_untyped_cts::fixture::synthesize_atomic_target;

    fn run<T: AtomicValue>(kind: DataType, op: AtomicOp) -> T {
        let target = synthesize_atomic_target(kind, 3, &op.steps());
        let bytes = replay(&target);
        assert_eq!(bytes.len(), target.initial.bytes.len());
        let size = kind.size() as usize;
        let first: T = bytemuck::pod_read_unaligned(&bytes[..size]);
        assert!(
            bytes.chunks_exact(size).all(|chunk| chunk == &bytes[..size]),
            "every element sees the same steps"
        );
        first
    }

    #[test]
    fn test_unsigned_sub_wraps() {
        assert_eq!(run::<u32>(DataType::Uint32, AtomicOp::Sub), u32::MAX - 1);
        assert_eq!(run::<i64>(DataType::Int64, AtomicOp::Sub), -2);
    }

    #[test]
    fn test_min_max_follow_signedness() {
        assert_eq!(run::<i32>(DataType::Int32, AtomicOp::Min), -3);
        assert_eq!(run::<u32>(DataType::Uint32, AtomicOp::Min), 5);
        assert_eq!(run::<i64>(DataType::Int64, AtomicOp::Max), 9);
        assert_eq!(run::<u64>(DataType::Uint64, AtomicOp::Max), u64::MAX - 2);
        assert_eq!(run::<f32>(DataType::Float32, AtomicOp::Min), -3.0);
    }

    #[test]
    fn test_read_modify_write() {
        assert_eq!(run::<u32>(DataType::Uint32, AtomicOp::CompareExchange), 9);
        assert_eq!(run::<u32>(DataType::Uint32, AtomicOp::Increment), 7);
        assert_eq!(run::<i32>(DataType::Int32, AtomicOp::Decrement), 4);
        assert_eq!(run::<u64>(DataType::Uint64, AtomicOp::And), 8);
        assert_eq!(run::<u64>(DataType::Uint64, AtomicOp::Or), 15);
        assert_eq!(run::<i32>(DataType::Int32, AtomicOp::Xor), 6);
        assert_eq!(run::<u32>(DataType::Uint32, AtomicOp::Add), 7);
    }

    #[test]
    fn test_float_atomics() {
        assert_eq!(run::<f16>(DataType::Float16, AtomicOp::Add), f16::from_f32(7.0));
        assert_eq!(run::<f64>(DataType::Float64, AtomicOp::Exchange), 9.0);
        assert_eq!(run::<f32>(DataType::Float32, AtomicOp::Load), 5.0);
        assert_eq!(run::<f16>(DataType::Float16, AtomicOp::Store), f16::from_f32(5.0));
    }
}
