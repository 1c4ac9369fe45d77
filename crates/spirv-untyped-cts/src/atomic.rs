use crate::data_type::{DataType, NumericClass};
use std::fmt;
use strum::{EnumIter, IntoStaticStr};

/// The atomic instruction families cases are generated for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum AtomicOp {
    #[strum(to_string = "load")]
    Load,
    #[strum(to_string = "store")]
    Store,
    #[strum(to_string = "exchange")]
    Exchange,
    #[strum(to_string = "compare_exchange")]
    CompareExchange,
    #[strum(to_string = "increment")]
    Increment,
    #[strum(to_string = "decrement")]
    Decrement,
    #[strum(to_string = "add")]
    Add,
    #[strum(to_string = "sub")]
    Sub,
    #[strum(to_string = "min")]
    Min,
    #[strum(to_string = "max")]
    Max,
    #[strum(to_string = "and")]
    And,
    #[strum(to_string = "or")]
    Or,
    #[strum(to_string = "xor")]
    Xor,
}

impl AtomicOp {
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Float kinds only have load, store, exchange, add, min and max.
    pub fn supports(self, kind: DataType) -> bool {
        !kind.is_float()
            || matches!(
                self,
                Self::Load | Self::Store | Self::Exchange | Self::Add | Self::Min | Self::Max
            )
    }

    /// Number of value operands the instruction takes besides pointer, scope and semantics.
    pub fn operand_count(self) -> usize {
        match self {
            Self::Load | Self::Increment | Self::Decrement => 0,
            Self::CompareExchange => 2,
            Self::Store
            | Self::Exchange
            | Self::Add
            | Self::Sub
            | Self::Min
            | Self::Max
            | Self::And
            | Self::Or
            | Self::Xor => 1,
        }
    }

    /// The opcode that implements `self` on `kind`.
    pub fn opcode(self, kind: DataType) -> &'static str {
        let class = kind.class();
        match (self, class) {
            (Self::Load, _) => "OpAtomicLoad",
            (Self::Store, _) => "OpAtomicStore",
            (Self::Exchange, _) => "OpAtomicExchange",
            (Self::CompareExchange, _) => "OpAtomicCompareExchange",
            (Self::Increment, _) => "OpAtomicIIncrement",
            (Self::Decrement, _) => "OpAtomicIDecrement",
            (Self::Add, NumericClass::Float) => "OpAtomicFAddEXT",
            (Self::Add, _) => "OpAtomicIAdd",
            (Self::Sub, _) => "OpAtomicISub",
            (Self::Min, NumericClass::Float) => "OpAtomicFMinEXT",
            (Self::Min, NumericClass::Signed) => "OpAtomicSMin",
            (Self::Min, NumericClass::Unsigned) => "OpAtomicUMin",
            (Self::Max, NumericClass::Float) => "OpAtomicFMaxEXT",
            (Self::Max, NumericClass::Signed) => "OpAtomicSMax",
            (Self::Max, NumericClass::Unsigned) => "OpAtomicUMax",
            (Self::And, _) => "OpAtomicAnd",
            (Self::Or, _) => "OpAtomicOr",
            (Self::Xor, _) => "OpAtomicXor",
        }
    }

    /// The step sequence a case for `self` applies to every target element.
    ///
    /// All but the store case start by storing a known value, so the result never depends on
    /// the initial contents. Operands are small enough to be exact in every atomic kind; the
    /// negative operands make signed and unsigned min/max/sub diverge.
    pub fn steps(self) -> Vec<AtomicStep> {
        use AtomicStep as S;
        let seed = |value| S::unary(Self::Store, value);
        match self {
            Self::Load => vec![seed(5), S::nullary(Self::Load)],
            Self::Store => vec![seed(5)],
            Self::Exchange => vec![seed(5), S::unary(Self::Exchange, 9)],
            Self::CompareExchange => vec![
                seed(5),
                S::compare_exchange(9, 5),
                S::compare_exchange(3, 4),
            ],
            Self::Increment => vec![
                seed(5),
                S::nullary(Self::Increment),
                S::nullary(Self::Increment),
            ],
            Self::Decrement => vec![seed(5), S::nullary(Self::Decrement)],
            Self::Add => vec![seed(5), S::unary(Self::Add, 3), S::unary(Self::Add, -1)],
            Self::Sub => vec![seed(5), S::unary(Self::Sub, 7)],
            Self::Min => vec![seed(5), S::unary(Self::Min, -3), S::unary(Self::Min, 9)],
            Self::Max => vec![seed(5), S::unary(Self::Max, -3), S::unary(Self::Max, 9)],
            Self::And => vec![seed(12), S::unary(Self::And, 10)],
            Self::Or => vec![seed(12), S::unary(Self::Or, 3)],
            Self::Xor => vec![seed(12), S::unary(Self::Xor, 10)],
        }
    }
}

impl fmt::Display for AtomicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One atomic instruction with its operands.
///
/// Operands are stored as `i64` and converted to the target kind with `as` semantics, so the
/// same step applies to every atomic kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtomicStep {
    pub op: AtomicOp,
    pub value: Option<i64>,
    /// Only set for [`AtomicOp::CompareExchange`].
    pub comparator: Option<i64>,
}

impl AtomicStep {
    pub fn nullary(op: AtomicOp) -> Self {
        debug_assert_eq!(op.operand_count(), 0);
        Self {
            op,
            value: None,
            comparator: None,
        }
    }

    pub fn unary(op: AtomicOp, value: i64) -> Self {
        debug_assert_eq!(op.operand_count(), 1);
        Self {
            op,
            value: Some(value),
            comparator: None,
        }
    }

    pub fn compare_exchange(value: i64, comparator: i64) -> Self {
        Self {
            op: AtomicOp::CompareExchange,
            value: Some(value),
            comparator: Some(comparator),
        }
    }

    /// Operands in instruction order.
    pub fn operands(&self) -> impl Iterator<Item = i64> {
        self.value.into_iter().chain(self.comparator)
    }
}

impl fmt::Display for AtomicStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for operand in self.operands() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_op_subset() {
        let float_ops: Vec<_> = AtomicOp::iter()
            .filter(|op| op.supports(DataType::Float32))
            .collect();
        assert_eq!(
            float_ops,
            vec![
                AtomicOp::Load,
                AtomicOp::Store,
                AtomicOp::Exchange,
                AtomicOp::Add,
                AtomicOp::Min,
                AtomicOp::Max,
            ]
        );
        assert!(AtomicOp::iter().all(|op| op.supports(DataType::Int64)));
    }

    #[test]
    fn test_steps_match_operand_counts() {
        for op in AtomicOp::iter() {
            let steps = op.steps();
            assert_eq!(steps.last().map(|step| step.op), Some(op));
            for step in steps {
                assert_eq!(step.operands().count(), step.op.operand_count());
            }
        }
    }

    #[test]
    fn test_opcodes_follow_class() {
        assert_eq!(AtomicOp::Min.opcode(DataType::Int32), "OpAtomicSMin");
        assert_eq!(AtomicOp::Min.opcode(DataType::Uint64), "OpAtomicUMin");
        assert_eq!(AtomicOp::Add.opcode(DataType::Float16), "OpAtomicFAddEXT");
        assert_eq!(AtomicOp::Add.opcode(DataType::Uint32), "OpAtomicIAdd");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(AtomicStep::compare_exchange(9, 5).to_string(), "compare_exchange 9 5");
        assert_eq!(AtomicStep::nullary(AtomicOp::Load).to_string(), "load");
    }
}
