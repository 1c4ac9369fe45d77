//! The closed catalog of scalar and vector data types cases are generated for.
//!
//! Every structural fact about a type lives in one table, [`CATALOG`], indexed by the
//! [`DataType`] discriminant. Sizes are computed from the lane width when the table is built,
//! and the table shape is checked at compile time, so a lookup can never disagree with the
//! enum.

use itertools::Itertools as _;
use rspirv::spirv::Capability;
use std::fmt;
use strum::{EnumCount, EnumIter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount)]
pub enum DataType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Float16,
    Uint32,
    Int32,
    Float32,
    Uint64,
    Int64,
    Float64,

    Vec2Uint8,
    Vec2Int8,
    Vec2Uint16,
    Vec2Int16,
    Vec2Float16,
    Vec2Uint32,
    Vec2Int32,
    Vec2Float32,
    Vec2Uint64,
    Vec2Int64,
    Vec2Float64,

    Vec3Uint8,
    Vec3Int8,
    Vec3Uint16,
    Vec3Int16,
    Vec3Float16,
    Vec3Uint32,
    Vec3Int32,
    Vec3Float32,
    Vec3Uint64,
    Vec3Int64,
    Vec3Float64,

    Vec4Uint8,
    Vec4Int8,
    Vec4Uint16,
    Vec4Int16,
    Vec4Float16,
    Vec4Uint32,
    Vec4Int32,
    Vec4Float32,
    Vec4Uint64,
    Vec4Int64,
    Vec4Float64,
}

/// How the bits of a lane are interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericClass {
    Unsigned,
    Signed,
    Float,
}

/// Structural facts about one [`DataType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub kind: DataType,
    /// The scalar type of each lane; the type itself for scalars.
    pub lane: DataType,
    pub lanes: u32,
    /// Total size in bytes, always `lane size * lanes`.
    pub size: u32,
    pub class: NumericClass,
    /// Capability needed to declare the lane type at all.
    pub capability: Option<Capability>,
    pub name: &'static str,
}

impl TypeDescriptor {
    const fn scalar(
        kind: DataType,
        class: NumericClass,
        size: u32,
        capability: Option<Capability>,
        name: &'static str,
    ) -> Self {
        Self {
            kind,
            lane: kind,
            lanes: 1,
            size,
            class,
            capability,
            name,
        }
    }

    const fn vector(kind: DataType, lane: TypeDescriptor, lanes: u32, name: &'static str) -> Self {
        Self {
            kind,
            lane: lane.kind,
            lanes,
            size: lane.size * lanes,
            class: lane.class,
            capability: lane.capability,
            name,
        }
    }
}

const UINT8: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Uint8,
    NumericClass::Unsigned,
    1,
    Some(Capability::Int8),
    "uint8",
);
const INT8: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Int8,
    NumericClass::Signed,
    1,
    Some(Capability::Int8),
    "int8",
);
const UINT16: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Uint16,
    NumericClass::Unsigned,
    2,
    Some(Capability::Int16),
    "uint16",
);
const INT16: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Int16,
    NumericClass::Signed,
    2,
    Some(Capability::Int16),
    "int16",
);
const FLOAT16: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Float16,
    NumericClass::Float,
    2,
    Some(Capability::Float16),
    "float16",
);
const UINT32: TypeDescriptor =
    TypeDescriptor::scalar(DataType::Uint32, NumericClass::Unsigned, 4, None, "uint32");
const INT32: TypeDescriptor =
    TypeDescriptor::scalar(DataType::Int32, NumericClass::Signed, 4, None, "int32");
const FLOAT32: TypeDescriptor =
    TypeDescriptor::scalar(DataType::Float32, NumericClass::Float, 4, None, "float32");
const UINT64: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Uint64,
    NumericClass::Unsigned,
    8,
    Some(Capability::Int64),
    "uint64",
);
const INT64: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Int64,
    NumericClass::Signed,
    8,
    Some(Capability::Int64),
    "int64",
);
const FLOAT64: TypeDescriptor = TypeDescriptor::scalar(
    DataType::Float64,
    NumericClass::Float,
    8,
    Some(Capability::Float64),
    "float64",
);

const TABLE: [TypeDescriptor; DataType::COUNT] = {
    use DataType::*;
    use TypeDescriptor as T;
    [
        UINT8,
        INT8,
        UINT16,
        INT16,
        FLOAT16,
        UINT32,
        INT32,
        FLOAT32,
        UINT64,
        INT64,
        FLOAT64,
        T::vector(Vec2Uint8, UINT8, 2, "vec2_uint8"),
        T::vector(Vec2Int8, INT8, 2, "vec2_int8"),
        T::vector(Vec2Uint16, UINT16, 2, "vec2_uint16"),
        T::vector(Vec2Int16, INT16, 2, "vec2_int16"),
        T::vector(Vec2Float16, FLOAT16, 2, "vec2_float16"),
        T::vector(Vec2Uint32, UINT32, 2, "vec2_uint32"),
        T::vector(Vec2Int32, INT32, 2, "vec2_int32"),
        T::vector(Vec2Float32, FLOAT32, 2, "vec2_float32"),
        T::vector(Vec2Uint64, UINT64, 2, "vec2_uint64"),
        T::vector(Vec2Int64, INT64, 2, "vec2_int64"),
        T::vector(Vec2Float64, FLOAT64, 2, "vec2_float64"),
        T::vector(Vec3Uint8, UINT8, 3, "vec3_uint8"),
        T::vector(Vec3Int8, INT8, 3, "vec3_int8"),
        T::vector(Vec3Uint16, UINT16, 3, "vec3_uint16"),
        T::vector(Vec3Int16, INT16, 3, "vec3_int16"),
        T::vector(Vec3Float16, FLOAT16, 3, "vec3_float16"),
        T::vector(Vec3Uint32, UINT32, 3, "vec3_uint32"),
        T::vector(Vec3Int32, INT32, 3, "vec3_int32"),
        T::vector(Vec3Float32, FLOAT32, 3, "vec3_float32"),
        T::vector(Vec3Uint64, UINT64, 3, "vec3_uint64"),
        T::vector(Vec3Int64, INT64, 3, "vec3_int64"),
        T::vector(Vec3Float64, FLOAT64, 3, "vec3_float64"),
        T::vector(Vec4Uint8, UINT8, 4, "vec4_uint8"),
        T::vector(Vec4Int8, INT8, 4, "vec4_int8"),
        T::vector(Vec4Uint16, UINT16, 4, "vec4_uint16"),
        T::vector(Vec4Int16, INT16, 4, "vec4_int16"),
        T::vector(Vec4Float16, FLOAT16, 4, "vec4_float16"),
        T::vector(Vec4Uint32, UINT32, 4, "vec4_uint32"),
        T::vector(Vec4Int32, INT32, 4, "vec4_int32"),
        T::vector(Vec4Float32, FLOAT32, 4, "vec4_float32"),
        T::vector(Vec4Uint64, UINT64, 4, "vec4_uint64"),
        T::vector(Vec4Int64, INT64, 4, "vec4_int64"),
        T::vector(Vec4Float64, FLOAT64, 4, "vec4_float64"),
    ]
};

// Entry `i` must describe discriminant `i`, lanes must point at scalar entries, and every size
// must be the lane size times the lane count.
const _: () = {
    let mut i = 0;
    while i < TABLE.len() {
        let entry = &TABLE[i];
        assert!(entry.kind as usize == i);
        let lane = &TABLE[entry.lane as usize];
        assert!(lane.lanes == 1);
        assert!(entry.size == lane.size * entry.lanes);
        assert!(entry.lanes >= 1 && entry.lanes <= 4);
        i += 1;
    }
};

/// Process-wide catalog, indexed by `DataType as usize`.
pub static CATALOG: [TypeDescriptor; DataType::COUNT] = TABLE;

impl DataType {
    /// All scalar kinds, in catalog order.
    pub const SCALARS: [DataType; 11] = [
        DataType::Uint8,
        DataType::Int8,
        DataType::Uint16,
        DataType::Int16,
        DataType::Float16,
        DataType::Uint32,
        DataType::Int32,
        DataType::Float32,
        DataType::Uint64,
        DataType::Int64,
        DataType::Float64,
    ];

    /// Kinds that atomic cases are generated for. 8 and 16-bit integer atomics are left out,
    /// no known conformant hardware supports them.
    pub const ATOMIC_TYPES: [DataType; 7] = [
        DataType::Float16,
        DataType::Uint32,
        DataType::Int32,
        DataType::Float32,
        DataType::Uint64,
        DataType::Int64,
        DataType::Float64,
    ];

    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    pub fn vectors() -> impl Iterator<Item = Self> {
        Self::iter().filter(|ty| ty.is_vector())
    }

    pub fn descriptor(self) -> &'static TypeDescriptor {
        &CATALOG[self as usize]
    }

    /// Total size in bytes.
    pub fn size(self) -> u32 {
        self.descriptor().size
    }

    /// Number of lanes, 1 for scalars.
    pub fn element_count(self) -> u32 {
        self.descriptor().lanes
    }

    /// The lane type of a vector, `None` for scalars.
    pub fn base_scalar(self) -> Option<DataType> {
        self.is_vector().then(|| self.descriptor().lane)
    }

    /// The lane type of a vector, or the scalar itself.
    pub fn lane(self) -> DataType {
        self.descriptor().lane
    }

    pub fn lane_size(self) -> u32 {
        self.lane().size()
    }

    pub fn lane_bits(self) -> u32 {
        self.lane_size() * 8
    }

    pub fn class(self) -> NumericClass {
        self.descriptor().class
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn is_scalar(self) -> bool {
        self.element_count() == 1
    }

    pub fn is_vector(self) -> bool {
        !self.is_scalar()
    }

    pub fn is_float(self) -> bool {
        self.class() == NumericClass::Float
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Capability required to use this type at all; `None` for 32-bit lanes.
    pub fn capability_tag(self) -> Option<Capability> {
        self.descriptor().capability
    }

    pub fn is_atomic_eligible(self) -> bool {
        Self::ATOMIC_TYPES.contains(&self)
    }

    /// Every other scalar kind with the same total byte size, in catalog order.
    pub fn same_size_scalar_partners(self) -> Vec<DataType> {
        Self::SCALARS
            .into_iter()
            .filter(|&other| other != self && other.size() == self.size())
            .collect()
    }

    /// Every vector kind whose total byte size exactly equals this type's size.
    ///
    /// 3-lane vectors are never returned.
    pub fn same_size_vector_partners(self) -> Vec<DataType> {
        Self::vectors()
            .filter(|&other| {
                other != self && other.element_count() != 3 && other.size() == self.size()
            })
            .collect()
    }

    /// The `%name` the generated module uses for this type.
    pub fn spirv_id(self) -> String {
        format!("%{}", self.name())
    }

    /// The right-hand side of this type's declaration.
    pub fn spirv_type_op(self) -> String {
        let descriptor = self.descriptor();
        if self.is_vector() {
            return format!(
                "OpTypeVector {} {}",
                descriptor.lane.spirv_id(),
                descriptor.lanes
            );
        }
        match descriptor.class {
            NumericClass::Unsigned => format!("OpTypeInt {} 0", self.lane_bits()),
            NumericClass::Signed => format!("OpTypeInt {} 1", self.lane_bits()),
            NumericClass::Float => format!("OpTypeFloat {}", self.lane_bits()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declarations for `types` and everything they depend on, lanes before vectors, each once.
pub fn declare_types(types: impl IntoIterator<Item = DataType>) -> String {
    let mut needed: Vec<DataType> = Vec::new();
    for ty in types {
        needed.push(ty.lane());
        needed.push(ty);
    }
    needed
        .into_iter()
        .unique()
        .sorted_by_key(|ty| (ty.is_vector(), *ty))
        .map(|ty| format!("{} = {}\n", ty.spirv_id(), ty.spirv_type_op()))
        .collect()
}
