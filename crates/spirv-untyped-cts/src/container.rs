use crate::data_type::DataType;
use rspirv::spirv::StorageClass;
use spirv_untyped_cts_types::BufferUsage;
use std::fmt;
use strum::EnumIter;

/// Where the data a case accesses lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Container {
    StorageBuffer,
    Uniform,
    PushConstant,
    Workgroup,
}

/// Uniform arrays use the extended (std140) layout, which rounds every array stride up to this.
const UNIFORM_ARRAY_ALIGNMENT: u32 = 16;

/// Minimum `maxPushConstantsSize` every implementation supports.
const PUSH_CONSTANT_BUDGET: u32 = 128;

impl Container {
    /// Containers a host buffer can be bound to.
    pub const ADDRESSABLE: [Container; 3] = [
        Container::StorageBuffer,
        Container::Uniform,
        Container::PushConstant,
    ];

    /// Containers atomic operations are generated for.
    pub const ATOMIC: [Container; 2] = [Container::StorageBuffer, Container::Workgroup];

    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Uniform | Self::PushConstant)
    }

    pub fn storage_class(self) -> StorageClass {
        match self {
            Self::StorageBuffer => StorageClass::StorageBuffer,
            Self::Uniform => StorageClass::Uniform,
            Self::PushConstant => StorageClass::PushConstant,
            Self::Workgroup => StorageClass::Workgroup,
        }
    }

    /// The storage class operand as written in assembly.
    pub fn storage_class_label(self) -> &'static str {
        match self.storage_class() {
            StorageClass::StorageBuffer => "StorageBuffer",
            StorageClass::Uniform => "Uniform",
            StorageClass::PushConstant => "PushConstant",
            StorageClass::Workgroup => "Workgroup",
            other => unreachable!("no container uses storage class {other:?}"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StorageBuffer => "storage_buffer",
            Self::Uniform => "uniform",
            Self::PushConstant => "push_constant",
            Self::Workgroup => "workgroup",
        }
    }

    /// Whether the interface variable needs `DescriptorSet`/`Binding` decorations.
    pub fn has_binding(self) -> bool {
        matches!(self, Self::StorageBuffer | Self::Uniform)
    }

    /// How the host supplies data for this container. Workgroup memory has no host binding;
    /// cases stage it through a storage buffer.
    pub fn buffer_usage(self) -> Option<BufferUsage> {
        match self {
            Self::StorageBuffer => Some(BufferUsage::Storage),
            Self::Uniform => Some(BufferUsage::Uniform),
            Self::PushConstant => Some(BufferUsage::PushConstant),
            Self::Workgroup => None,
        }
    }

    /// Distance between consecutive array elements of `ty` in this container.
    pub fn array_stride(self, ty: DataType) -> u32 {
        // 3-lane vectors are aligned like 4-lane ones.
        let natural = if ty.element_count() == 3 {
            4 * ty.lane_size()
        } else {
            ty.size()
        };
        match self {
            Self::Uniform => natural.next_multiple_of(UNIFORM_ARRAY_ALIGNMENT),
            Self::StorageBuffer | Self::PushConstant | Self::Workgroup => natural,
        }
    }

    /// Trailing bytes after each element of `ty`.
    pub fn padding(self, ty: DataType) -> u32 {
        self.array_stride(ty) - ty.size()
    }

    pub fn byte_budget(self) -> Option<u32> {
        match self {
            Self::PushConstant => Some(PUSH_CONSTANT_BUDGET),
            Self::StorageBuffer | Self::Uniform | Self::Workgroup => None,
        }
    }

    /// `requested` clamped to what fits into this container's byte budget.
    pub fn element_count(self, ty: DataType, requested: usize) -> usize {
        match self.byte_budget() {
            Some(budget) => requested.min((budget / self.array_stride(ty)) as usize),
            None => requested,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
