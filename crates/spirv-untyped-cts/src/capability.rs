//! Accumulates what a generated program must declare and what the device must enable.
//!
//! Every `require_*` function only appends. A [`CapabilitySet`] may therefore contain the same
//! entry more than once; the rendering helpers drop duplicates (first occurrence wins) without
//! touching the set.

use crate::atomic::AtomicOp;
use crate::container::Container;
use crate::data_type::DataType;
use itertools::Itertools as _;
use rspirv::spirv::{Capability, MemoryModel};
use spirv_untyped_cts_types::{MemoryModelKind, SpirvVersion};

macro_rules! required_features {
    ($($field:ident),+ $(,)?) => {
        /// Device feature flags a case needs, named after the Vulkan feature struct members.
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub struct RequiredFeatures {
            $(pub $field: bool,)+
        }

        impl RequiredFeatures {
            /// Names of every enabled flag, in declaration order.
            pub fn enabled_names(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(
                    if self.$field {
                        names.push(stringify!($field));
                    }
                )+
                names
            }
        }
    };
}

required_features! {
    shader_untyped_pointers,
    shader_int8,
    shader_int16,
    shader_float16,
    shader_int64,
    shader_float64,
    storage_buffer8_bit_access,
    uniform_and_storage_buffer8_bit_access,
    storage_push_constant8,
    storage_buffer16_bit_access,
    uniform_and_storage_buffer16_bit_access,
    storage_push_constant16,
    workgroup_memory_explicit_layout,
    workgroup_memory_explicit_layout8_bit_access,
    workgroup_memory_explicit_layout16_bit_access,
    vulkan_memory_model,
    shader_buffer_int64_atomics,
    shader_shared_int64_atomics,
    shader_buffer_float16_atomics,
    shader_buffer_float16_atomic_add,
    shader_buffer_float16_atomic_min_max,
    shader_shared_float16_atomics,
    shader_shared_float16_atomic_add,
    shader_shared_float16_atomic_min_max,
    shader_buffer_float32_atomics,
    shader_buffer_float32_atomic_add,
    shader_buffer_float32_atomic_min_max,
    shader_shared_float32_atomics,
    shader_shared_float32_atomic_add,
    shader_shared_float32_atomic_min_max,
    shader_buffer_float64_atomics,
    shader_buffer_float64_atomic_add,
    shader_buffer_float64_atomic_min_max,
    shader_shared_float64_atomics,
    shader_shared_float64_atomic_add,
    shader_shared_float64_atomic_min_max,
}

/// Which memory an atomic feature flag covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AtomicScope {
    Buffer,
    Shared,
}

impl AtomicScope {
    fn of(container: Container) -> Self {
        match container {
            Container::Workgroup => Self::Shared,
            Container::StorageBuffer | Container::Uniform | Container::PushConstant => {
                Self::Buffer
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FloatAtomicFeature {
    Atomics,
    Add,
    MinMax,
}

impl RequiredFeatures {
    fn float_atomic(
        &mut self,
        kind: DataType,
        scope: AtomicScope,
        feature: FloatAtomicFeature,
    ) -> &mut bool {
        use AtomicScope::*;
        use FloatAtomicFeature::*;
        match (kind, scope, feature) {
            (DataType::Float16, Buffer, Atomics) => &mut self.shader_buffer_float16_atomics,
            (DataType::Float16, Buffer, Add) => &mut self.shader_buffer_float16_atomic_add,
            (DataType::Float16, Buffer, MinMax) => &mut self.shader_buffer_float16_atomic_min_max,
            (DataType::Float16, Shared, Atomics) => &mut self.shader_shared_float16_atomics,
            (DataType::Float16, Shared, Add) => &mut self.shader_shared_float16_atomic_add,
            (DataType::Float16, Shared, MinMax) => &mut self.shader_shared_float16_atomic_min_max,
            (DataType::Float32, Buffer, Atomics) => &mut self.shader_buffer_float32_atomics,
            (DataType::Float32, Buffer, Add) => &mut self.shader_buffer_float32_atomic_add,
            (DataType::Float32, Buffer, MinMax) => &mut self.shader_buffer_float32_atomic_min_max,
            (DataType::Float32, Shared, Atomics) => &mut self.shader_shared_float32_atomics,
            (DataType::Float32, Shared, Add) => &mut self.shader_shared_float32_atomic_add,
            (DataType::Float32, Shared, MinMax) => &mut self.shader_shared_float32_atomic_min_max,
            (DataType::Float64, Buffer, Atomics) => &mut self.shader_buffer_float64_atomics,
            (DataType::Float64, Buffer, Add) => &mut self.shader_buffer_float64_atomic_add,
            (DataType::Float64, Buffer, MinMax) => &mut self.shader_buffer_float64_atomic_min_max,
            (DataType::Float64, Shared, Atomics) => &mut self.shader_shared_float64_atomics,
            (DataType::Float64, Shared, Add) => &mut self.shader_shared_float64_atomic_add,
            (DataType::Float64, Shared, MinMax) => &mut self.shader_shared_float64_atomic_min_max,
            (kind, ..) => unreachable!("{kind} has no float atomic features"),
        }
    }
}

const UNTYPED_POINTERS_DEVICE_EXT: &str = "VK_KHR_shader_untyped_pointers";

/// Everything a single case needs declared or enabled, in the order it was required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilitySet {
    pub capabilities: Vec<Capability>,
    pub extensions: Vec<&'static str>,
    pub device_extensions: Vec<&'static str>,
    pub features: RequiredFeatures,
    pub min_spirv_version: SpirvVersion,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self {
            capabilities: Vec::new(),
            extensions: Vec::new(),
            device_extensions: Vec::new(),
            features: RequiredFeatures::default(),
            min_spirv_version: SpirvVersion::MIN,
        }
    }
}

impl CapabilitySet {
    /// A set seeded with what every untyped-pointer case needs on the device side.
    ///
    /// The `UntypedPointersKHR` capability and its SPIR-V extension are part of the program
    /// header and are not listed here.
    pub fn for_untyped_pointers() -> Self {
        let mut set = Self::default();
        set.add_device_ext(UNTYPED_POINTERS_DEVICE_EXT);
        set.features.shader_untyped_pointers = true;
        set
    }

    pub fn add_cap(&mut self, cap: Capability) {
        self.capabilities.push(cap);
    }

    pub fn add_ext(&mut self, ext: &'static str) {
        self.extensions.push(ext);
    }

    pub fn add_device_ext(&mut self, ext: &'static str) {
        self.device_extensions.push(ext);
    }

    pub fn require_version(&mut self, version: SpirvVersion) {
        self.min_spirv_version = self.min_spirv_version.max(version);
    }

    pub fn unique_capabilities(&self) -> Vec<Capability> {
        self.capabilities.iter().copied().unique().collect()
    }

    pub fn unique_extensions(&self) -> Vec<&'static str> {
        self.extensions.iter().copied().unique().collect()
    }

    pub fn unique_device_extensions(&self) -> Vec<&'static str> {
        self.device_extensions.iter().copied().unique().collect()
    }

    /// `OpCapability` lines for the program header.
    pub fn capability_decls(&self) -> String {
        self.unique_capabilities()
            .into_iter()
            .map(|cap| format!("OpCapability {cap:?}\n"))
            .collect()
    }

    /// `OpExtension` lines for the program header.
    pub fn extension_decls(&self) -> String {
        self.unique_extensions()
            .into_iter()
            .map(|ext| format!("OpExtension \"{ext}\"\n"))
            .collect()
    }
}

/// Declares `kind`'s lane type: its capability and the matching arithmetic feature.
pub fn require_for_type(kind: DataType, set: &mut CapabilitySet) {
    let Some(cap) = kind.capability_tag() else {
        return;
    };
    set.add_cap(cap);
    match cap {
        Capability::Int8 => {
            set.add_device_ext("VK_KHR_shader_float16_int8");
            set.features.shader_int8 = true;
        }
        Capability::Int16 => set.features.shader_int16 = true,
        Capability::Float16 => {
            set.add_device_ext("VK_KHR_shader_float16_int8");
            set.features.shader_float16 = true;
        }
        Capability::Int64 => set.features.shader_int64 = true,
        Capability::Float64 => set.features.shader_float64 = true,
        other => unreachable!("{other:?} is not a lane capability"),
    }
}

fn require_atomic_type(kind: DataType, scope: AtomicScope, set: &mut CapabilitySet) {
    match kind {
        DataType::Uint32 | DataType::Int32 => {}
        DataType::Uint64 | DataType::Int64 => {
            set.add_cap(Capability::Int64Atomics);
            set.add_device_ext("VK_KHR_shader_atomic_int64");
            match scope {
                AtomicScope::Buffer => set.features.shader_buffer_int64_atomics = true,
                AtomicScope::Shared => set.features.shader_shared_int64_atomics = true,
            }
        }
        DataType::Float32 | DataType::Float64 => {
            set.add_device_ext("VK_EXT_shader_atomic_float");
            *set
                .features
                .float_atomic(kind, scope, FloatAtomicFeature::Atomics) = true;
        }
        DataType::Float16 => {
            set.add_device_ext("VK_EXT_shader_atomic_float2");
            *set
                .features
                .float_atomic(kind, scope, FloatAtomicFeature::Atomics) = true;
        }
        _ => unreachable!("{kind} is not atomic eligible"),
    }
}

/// Atomic access to `kind` in a buffer.
///
/// Only kinds in [`DataType::ATOMIC_TYPES`] may be passed.
pub fn require_for_atomic(kind: DataType, set: &mut CapabilitySet) {
    require_atomic_type(kind, AtomicScope::Buffer, set);
}

/// Atomic `op` on `kind` in `container`, including the per-operation float capabilities.
pub fn require_for_atomic_op(
    kind: DataType,
    op: AtomicOp,
    container: Container,
    set: &mut CapabilitySet,
) {
    let scope = AtomicScope::of(container);
    require_atomic_type(kind, scope, set);
    if !kind.is_float() {
        return;
    }
    match op {
        AtomicOp::Add => {
            set.add_cap(match kind {
                DataType::Float16 => Capability::AtomicFloat16AddEXT,
                DataType::Float32 => Capability::AtomicFloat32AddEXT,
                _ => Capability::AtomicFloat64AddEXT,
            });
            set.add_ext("SPV_EXT_shader_atomic_float_add");
            if kind == DataType::Float16 {
                set.add_ext("SPV_EXT_shader_atomic_float16_add");
            }
            *set.features.float_atomic(kind, scope, FloatAtomicFeature::Add) = true;
        }
        AtomicOp::Min | AtomicOp::Max => {
            set.add_cap(match kind {
                DataType::Float16 => Capability::AtomicFloat16MinMaxEXT,
                DataType::Float32 => Capability::AtomicFloat32MinMaxEXT,
                _ => Capability::AtomicFloat64MinMaxEXT,
            });
            set.add_ext("SPV_EXT_shader_atomic_float_min_max");
            set.add_device_ext("VK_EXT_shader_atomic_float2");
            *set
                .features
                .float_atomic(kind, scope, FloatAtomicFeature::MinMax) = true;
        }
        _ => {}
    }
}

/// Storage capability for sub-32-bit lanes of `kind` living in `container`.
pub fn require_for_small_container(container: Container, kind: DataType, set: &mut CapabilitySet) {
    let features = &mut set.features;
    match kind.lane_bits() {
        8 => {
            let cap = match container {
                Container::StorageBuffer => {
                    features.storage_buffer8_bit_access = true;
                    Capability::StorageBuffer8BitAccess
                }
                Container::Uniform => {
                    features.uniform_and_storage_buffer8_bit_access = true;
                    Capability::UniformAndStorageBuffer8BitAccess
                }
                Container::PushConstant => {
                    features.storage_push_constant8 = true;
                    Capability::StoragePushConstant8
                }
                Container::Workgroup => {
                    features.workgroup_memory_explicit_layout8_bit_access = true;
                    set.add_cap(Capability::WorkgroupMemoryExplicitLayout8BitAccessKHR);
                    return;
                }
            };
            set.add_cap(cap);
            set.add_ext("SPV_KHR_8bit_storage");
            set.add_device_ext("VK_KHR_8bit_storage");
        }
        16 => {
            let cap = match container {
                Container::StorageBuffer => {
                    features.storage_buffer16_bit_access = true;
                    Capability::StorageBuffer16BitAccess
                }
                Container::Uniform => {
                    features.uniform_and_storage_buffer16_bit_access = true;
                    Capability::UniformAndStorageBuffer16BitAccess
                }
                Container::PushConstant => {
                    features.storage_push_constant16 = true;
                    Capability::StoragePushConstant16
                }
                Container::Workgroup => {
                    features.workgroup_memory_explicit_layout16_bit_access = true;
                    set.add_cap(Capability::WorkgroupMemoryExplicitLayout16BitAccessKHR);
                    return;
                }
            };
            set.add_cap(cap);
            set.add_ext("SPV_KHR_16bit_storage");
            set.add_device_ext("VK_KHR_16bit_storage");
        }
        _ => {}
    }
}

/// Explicitly laid out workgroup memory, needed to alias it through untyped pointers.
pub fn require_for_workgroup_layout(set: &mut CapabilitySet) {
    set.add_cap(Capability::WorkgroupMemoryExplicitLayoutKHR);
    set.add_ext("SPV_KHR_workgroup_memory_explicit_layout");
    set.add_device_ext("VK_KHR_workgroup_memory_explicit_layout");
    set.features.workgroup_memory_explicit_layout = true;
}

/// Requirements of `model`, returning the `OpMemoryModel` instruction that declares it.
pub fn require_for_memory_model(model: MemoryModelKind, set: &mut CapabilitySet) -> String {
    let memory_model = match model {
        MemoryModelKind::Glsl450 => MemoryModel::GLSL450,
        MemoryModelKind::Vulkan => {
            set.add_cap(Capability::VulkanMemoryModel);
            // Core since 1.5, but the extension is still listed for older consumers.
            set.add_ext("SPV_KHR_vulkan_memory_model");
            set.add_device_ext("VK_KHR_vulkan_memory_model");
            set.features.vulkan_memory_model = true;
            set.require_version(SpirvVersion::Spv_1_5);
            MemoryModel::Vulkan
        }
    };
    format!("OpMemoryModel Logical {memory_model:?}")
}
