//! Program text for every operation.
//!
//! A program is [`HEADER`] followed by one operation template. Operation templates share a
//! naming scheme: `%in_*` is what the case reads, `%out_*` what the executor reads back,
//! `%index` the invocation's element.

use super::Template;

pub const HEADER: Template = Template::new(
    "header",
    r#"OpCapability Shader
OpCapability UntypedPointersKHR
${capabilities}OpExtension "SPV_KHR_untyped_pointers"
${extensions}${memory_model}
OpEntryPoint GLCompute %main "main" %gid ${interface}
OpExecutionMode %main LocalSize ${local_size} 1 1
OpDecorate %gid BuiltIn GlobalInvocationId
"#,
);

/// Declarations shared by every operation, expected right after the decorations.
macro_rules! prelude {
    () => {
        r#"%void = OpTypeVoid
%void_fn = OpTypeFunction %void
${types}%c_0 = OpConstant %uint32 0
%c_count = OpConstant %uint32 ${count}
%gid_ptr = OpTypePointer Input %vec3_uint32
%gid = OpVariable %gid_ptr Input
"#
    };
}

macro_rules! entry {
    () => {
        r#"%main = OpFunction %void None %void_fn
%entry = OpLabel
%gid_vec = OpLoad %vec3_uint32 %gid
%index = OpCompositeExtract %uint32 %gid_vec 0
"#
    };
}

macro_rules! exit {
    () => {
        r#"OpReturn
OpFunctionEnd
"#
    };
}

/// The input block, reached through an untyped pointer in `${in_storage}`.
macro_rules! untyped_input_decorations {
    () => {
        r#"OpDecorate %in_array ArrayStride ${in_stride}
OpDecorate %in_block Block
OpMemberDecorate %in_block 0 Offset 0
${in_bindings}"#
    };
}

macro_rules! untyped_input_declarations {
    () => {
        r#"%in_array = ${in_array}
%in_block = OpTypeStruct %in_array
%in_ptr = OpTypeUntypedPointerKHR ${in_storage}
%in_var = OpUntypedVariableKHR %in_ptr ${in_storage} %in_block
"#
    };
}

/// A storage buffer input reached through ordinary typed pointers.
macro_rules! typed_input_decorations {
    () => {
        r#"OpDecorate %in_array ArrayStride ${in_stride}
OpDecorate %in_block Block
OpMemberDecorate %in_block 0 Offset 0
OpDecorate %in_var DescriptorSet 0
OpDecorate %in_var Binding 0
"#
    };
}

macro_rules! typed_input_declarations {
    () => {
        r#"%in_array = OpTypeRuntimeArray ${in_type}
%in_block = OpTypeStruct %in_array
%in_block_ptr = OpTypePointer StorageBuffer %in_block
%in_elem_ptr = OpTypePointer StorageBuffer ${in_type}
%in_var = OpVariable %in_block_ptr StorageBuffer
"#
    };
}

macro_rules! output_decorations {
    () => {
        r#"OpDecorate %out_array ArrayStride ${out_stride}
OpDecorate %out_block Block
OpMemberDecorate %out_block 0 Offset 0
OpDecorate %out_var DescriptorSet 0
OpDecorate %out_var Binding ${out_binding}
"#
    };
}

macro_rules! typed_output_declarations {
    () => {
        r#"%out_array = OpTypeRuntimeArray ${out_type}
%out_block = OpTypeStruct %out_array
%out_block_ptr = OpTypePointer StorageBuffer %out_block
%out_elem_ptr = OpTypePointer StorageBuffer ${out_type}
%out_var = OpVariable %out_block_ptr StorageBuffer
"#
    };
}

macro_rules! untyped_output_declarations {
    () => {
        r#"%out_array = OpTypeRuntimeArray ${out_type}
%out_block = OpTypeStruct %out_array
%out_ptr = OpTypeUntypedPointerKHR StorageBuffer
%out_var = OpUntypedVariableKHR %out_ptr StorageBuffer %out_block
"#
    };
}

/// Loads element `%index` through an untyped access chain and stores it to the typed output.
pub const LOAD: Template = Template::new(
    "load",
    concat!(
        untyped_input_decorations!(),
        output_decorations!(),
        prelude!(),
        untyped_input_declarations!(),
        typed_output_declarations!(),
        entry!(),
        r#"%src = OpUntypedAccessChainKHR %in_ptr %in_block %in_var %c_0 %index
%value = OpLoad ${access_type} %src
%dst = OpAccessChain %out_elem_ptr %out_var %c_0 %index
OpStore %dst %value
"#,
        exit!(),
    ),
);

/// Loads through a typed pointer and stores through an untyped access chain.
pub const STORE: Template = Template::new(
    "store",
    concat!(
        typed_input_decorations!(),
        output_decorations!(),
        prelude!(),
        typed_input_declarations!(),
        untyped_output_declarations!(),
        entry!(),
        r#"%src = OpAccessChain %in_elem_ptr %in_var %c_0 %index
%value = OpLoad ${in_type} %src
%dst = OpUntypedAccessChainKHR %out_ptr %out_block %out_var %c_0 %index
OpStore %dst %value
"#,
        exit!(),
    ),
);

/// Copies from an untyped source into a typed destination.
pub const COPY: Template = Template::new(
    "copy",
    concat!(
        untyped_input_decorations!(),
        output_decorations!(),
        prelude!(),
        untyped_input_declarations!(),
        typed_output_declarations!(),
        entry!(),
        r#"%src = OpUntypedAccessChainKHR %in_ptr %in_block %in_var %c_0 %index
%dst = OpAccessChain %out_elem_ptr %out_var %c_0 %index
OpCopyMemory %dst %src
"#,
        exit!(),
    ),
);

/// Writes the runtime array length of the input to the first output element.
pub const ARRAY_LENGTH: Template = Template::new(
    "array_length",
    concat!(
        untyped_input_decorations!(),
        output_decorations!(),
        prelude!(),
        untyped_input_declarations!(),
        typed_output_declarations!(),
        entry!(),
        r#"%length = OpUntypedArrayLengthKHR %uint32 %in_block %in_var 0
%dst = OpAccessChain %out_elem_ptr %out_var %c_0 %c_0
OpStore %dst %length
"#,
        exit!(),
    ),
);

/// Applies `${steps}` to element `%index` of a storage buffer.
pub const ATOMIC_STORAGE_BUFFER: Template = Template::new(
    "atomic_storage_buffer",
    concat!(
        r#"OpDecorate %out_array ArrayStride ${out_stride}
OpDecorate %out_block Block
OpMemberDecorate %out_block 0 Offset 0
OpDecorate %out_var DescriptorSet 0
OpDecorate %out_var Binding 0
"#,
        prelude!(),
        r#"%c_scope = OpConstant %uint32 ${scope}
%c_semantics = OpConstant %uint32 0
${step_constants}"#,
        untyped_output_declarations!(),
        entry!(),
        r#"%target = OpUntypedAccessChainKHR %out_ptr %out_block %out_var %c_0 %index
${steps}"#,
        exit!(),
    ),
);

/// Applies `${steps}` to element `%index` of an untyped workgroup array and copies the result
/// out. Every sequence starts with a store, so the uninitialized workgroup memory is never read.
pub const ATOMIC_WORKGROUP: Template = Template::new(
    "atomic_workgroup",
    concat!(
        output_decorations!(),
        prelude!(),
        r#"%c_scope = OpConstant %uint32 ${scope}
%c_semantics = OpConstant %uint32 0
${step_constants}%wg_array = OpTypeArray ${out_type} %c_count
%wg_ptr = OpTypeUntypedPointerKHR Workgroup
%wg_var = OpUntypedVariableKHR %wg_ptr Workgroup %wg_array
"#,
        typed_output_declarations!(),
        entry!(),
        r#"%target = OpUntypedAccessChainKHR %wg_ptr %wg_array %wg_var %index
${steps}%final = OpAtomicLoad ${out_type} %target %c_scope %c_semantics
%dst = OpAccessChain %out_elem_ptr %out_var %c_0 %index
OpStore %dst %final
"#,
        exit!(),
    ),
);

/// Reaches the element with two chains: the first to the array, the second indexing it as
/// an array of the access type.
pub const MULTIPLE_ACCESS_CHAINS: Template = Template::new(
    "multiple_access_chains",
    concat!(
        untyped_input_decorations!(),
        r#"OpDecorate %pun_array ArrayStride ${in_stride}
"#,
        output_decorations!(),
        prelude!(),
        untyped_input_declarations!(),
        r#"%pun_array = OpTypeRuntimeArray ${access_type}
"#,
        typed_output_declarations!(),
        entry!(),
        r#"%array = OpUntypedAccessChainKHR %in_ptr %in_block %in_var %c_0
%src = OpUntypedAccessChainKHR %in_ptr %pun_array %array %index
%value = OpLoad ${access_type} %src
%dst = OpAccessChain %out_elem_ptr %out_var %c_0 %index
OpStore %dst %value
"#,
        exit!(),
    ),
);

/// Stores every element into explicitly laid out workgroup memory, waits, and writes the
/// mirrored element back out.
pub const WORKGROUP_COPY: Template = Template::new(
    "workgroup_copy",
    concat!(
        typed_input_decorations!(),
        output_decorations!(),
        r#"OpDecorate %wg_array ArrayStride ${in_stride}
OpDecorate %wg_block Block
OpMemberDecorate %wg_block 0 Offset 0
"#,
        prelude!(),
        r#"%c_last = OpConstant %uint32 ${last_index}
%c_wg_scope = OpConstant %uint32 2
%c_wg_semantics = OpConstant %uint32 264
%wg_array = OpTypeArray ${in_type} %c_count
%wg_block = OpTypeStruct %wg_array
%wg_ptr = OpTypeUntypedPointerKHR Workgroup
%wg_var = OpUntypedVariableKHR %wg_ptr Workgroup %wg_block
"#,
        typed_input_declarations!(),
        typed_output_declarations!(),
        entry!(),
        r#"%src = OpAccessChain %in_elem_ptr %in_var %c_0 %index
%value = OpLoad ${in_type} %src
%slot = OpUntypedAccessChainKHR %wg_ptr %wg_block %wg_var %c_0 %index
OpStore %slot %value
OpControlBarrier %c_wg_scope %c_wg_scope %c_wg_semantics
%mirror = OpISub %uint32 %c_last %index
%mirror_slot = OpUntypedAccessChainKHR %wg_ptr %wg_block %wg_var %c_0 %mirror
%mirrored = OpLoad ${in_type} %mirror_slot
%dst = OpAccessChain %out_elem_ptr %out_var %c_0 %index
OpStore %dst %mirrored
"#,
        exit!(),
    ),
);

pub const OPERATION_TEMPLATES: [Template; 8] = [
    LOAD,
    STORE,
    COPY,
    ARRAY_LENGTH,
    ATOMIC_STORAGE_BUFFER,
    ATOMIC_WORKGROUP,
    MULTIPLE_ACCESS_CHAINS,
    WORKGROUP_COPY,
];
