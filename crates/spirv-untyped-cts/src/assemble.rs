//! Turns a [`TestCombination`] into a program with its buffers, and feeds whole trees of them
//! to a [`CaseRegistry`].

use crate::atomic::{AtomicOp, AtomicStep};
use crate::capability::{
    CapabilitySet, require_for_atomic_op, require_for_memory_model, require_for_small_container,
    require_for_type, require_for_workgroup_layout,
};
use crate::container::Container;
use crate::data_type::{DataType, NumericClass, declare_types};
use crate::enumerate::{Operation, TestCombination, TestGroup, enumerate};
use crate::fixture::{AtomicFixture, FillSpec, Fixture, synthesize, synthesize_atomic_target};
use crate::template::{self, Substitutions, Template, TemplateError};
use spirv_untyped_cts_types::{
    BufferUsage, ConfigError, GeneratorConfig, MemoryModelKind, Resource, SpirvVersion,
};
use std::error::Error;
use thiserror::Error;
use tracing::{debug, info, trace};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("invalid generator config")]
    Config(#[from] ConfigError),
    #[error("failed to assemble `{case}`")]
    Template {
        case: String,
        #[source]
        source: TemplateError,
    },
    #[error("failed to register `{case}`")]
    Register {
        case: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// What the executor compares against after the dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    /// Output buffers, in binding order after the inputs.
    Buffers(Vec<Resource>),
    /// An atomic target; its final contents come from replaying the steps.
    Atomic {
        target: AtomicFixture,
        binding: u32,
    },
}

/// One case, ready to be registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseBundle {
    pub name: String,
    pub program: String,
    pub capabilities: CapabilitySet,
    pub inputs: Vec<Resource>,
    pub expected: Expected,
    pub workgroups: [u32; 3],
    pub local_size: u32,
}

impl CaseBundle {
    pub fn spirv_version(&self) -> SpirvVersion {
        self.capabilities.min_spirv_version
    }

    pub fn atomic_steps(&self) -> &[AtomicStep] {
        match &self.expected {
            Expected::Atomic { target, .. } => &target.steps,
            Expected::Buffers(_) => &[],
        }
    }
}

/// Receives assembled cases, for example to turn them into test trials.
pub trait CaseRegistry {
    type Error: Error + Send + Sync + 'static;

    /// `path` is the chain of group names from the root to the case's group.
    fn register(&mut self, path: &[&str], bundle: CaseBundle) -> Result<(), Self::Error>;
}

impl CaseRegistry for Vec<(String, CaseBundle)> {
    type Error = std::convert::Infallible;

    fn register(&mut self, path: &[&str], bundle: CaseBundle) -> Result<(), Self::Error> {
        self.push((path.join("."), bundle));
        Ok(())
    }
}

/// Generation parameters shared by every case in a group.
#[derive(Copy, Clone, Debug)]
pub struct AssembleContext<'a> {
    /// Seeds random fills, so every case in a group sees the same data.
    pub group: &'a str,
    pub element_count: usize,
}

/// Storage class of every output buffer.
const OUTPUT: Container = Container::StorageBuffer;

/// Scope operand for atomics: `Workgroup`, or `Device` (`QueueFamily` under the Vulkan memory
/// model, where `Device` needs an extra feature).
fn atomic_scope(container: Container, model: MemoryModelKind) -> u32 {
    match (container, model) {
        (Container::Workgroup, _) => 2,
        (_, MemoryModelKind::Glsl450) => 1,
        (_, MemoryModelKind::Vulkan) => 5,
    }
}

/// `value` as an `OpConstant` literal of `kind`.
fn literal(kind: DataType, value: i64) -> String {
    match kind.class() {
        NumericClass::Float => format!("{:?}", value as f64),
        NumericClass::Signed => value.to_string(),
        NumericClass::Unsigned => {
            let bits = kind.lane_bits();
            let mask = if bits == 64 { u64::MAX } else { (1 << bits) - 1 };
            ((value as u64) & mask).to_string()
        }
    }
}

/// Operand constants and instructions applying `steps` to `%target`.
fn render_steps(kind: DataType, steps: &[AtomicStep]) -> (String, String) {
    let ty = kind.spirv_id();
    let mut constants = String::new();
    let mut body = String::new();
    for (n, step) in steps.iter().enumerate() {
        if let Some(value) = step.value {
            constants += &format!("%s{n}_v = OpConstant {ty} {}\n", literal(kind, value));
        }
        if let Some(comparator) = step.comparator {
            constants += &format!("%s{n}_c = OpConstant {ty} {}\n", literal(kind, comparator));
        }
        let opcode = step.op.opcode(kind);
        body += &match step.op {
            AtomicOp::Store => format!("{opcode} %target %c_scope %c_semantics %s{n}_v\n"),
            AtomicOp::CompareExchange => format!(
                "%r{n} = {opcode} {ty} %target %c_scope %c_semantics %c_semantics %s{n}_v %s{n}_c\n"
            ),
            op if op.operand_count() == 0 => {
                format!("%r{n} = {opcode} {ty} %target %c_scope %c_semantics\n")
            }
            _ => format!("%r{n} = {opcode} {ty} %target %c_scope %c_semantics %s{n}_v\n"),
        };
    }
    (constants, body)
}

/// `OpTypeRuntimeArray` for storage buffers, a sized array elsewhere.
fn array_decl(container: Container, kind: DataType) -> String {
    match container {
        Container::StorageBuffer => format!("OpTypeRuntimeArray {}", kind.spirv_id()),
        Container::Uniform | Container::PushConstant | Container::Workgroup => {
            format!("OpTypeArray {} %c_count", kind.spirv_id())
        }
    }
}

fn binding_decorations(container: Container, var: &str, binding: u32) -> String {
    if container.has_binding() {
        format!("OpDecorate {var} DescriptorSet 0\nOpDecorate {var} Binding {binding}\n")
    } else {
        String::new()
    }
}

/// Input as a host resource, bound at 0 unless it is a push constant range.
fn input_resource(container: Container, fixture: &Fixture) -> Resource {
    let usage = container
        .buffer_usage()
        .unwrap_or(BufferUsage::StorageReadOnly);
    let resource = fixture.to_resource(usage);
    if container.has_binding() {
        resource.with_binding(0)
    } else {
        resource
    }
}

/// Assembled pieces before the program is rendered.
struct Plan {
    template: Template,
    subs: Substitutions,
    set: CapabilitySet,
    memory_model: MemoryModelKind,
    types: Vec<DataType>,
    interface: &'static str,
    local_size: usize,
    inputs: Vec<Resource>,
    expected: Expected,
}

fn plan_transfer(combination: &TestCombination, ctx: &AssembleContext<'_>) -> Plan {
    let container = combination.container;
    let primary = combination.primary;
    let access = combination.access_type();
    let mut set = CapabilitySet::for_untyped_pointers();
    let mut subs = Substitutions::new();

    let (template, in_container, in_type, out_type) = match combination.operation {
        Operation::Load | Operation::PunLoad => (template::LOAD, container, primary, access),
        Operation::Copy | Operation::PunCopy => (template::COPY, container, primary, access),
        Operation::MultipleAccessChains => {
            (template::MULTIPLE_ACCESS_CHAINS, container, primary, access)
        }
        // Stores read the access type from a typed buffer and write primary-typed memory.
        Operation::Store | Operation::PunStore => (template::STORE, OUTPUT, access, primary),
        other => unreachable!("{other:?} is not a transfer"),
    };

    let count = in_container.element_count(in_type, ctx.element_count);
    for ty in [in_type, out_type, access] {
        require_for_type(ty, &mut set);
    }
    require_for_small_container(in_container, in_type, &mut set);
    require_for_small_container(OUTPUT, out_type, &mut set);
    if access != in_type {
        require_for_small_container(in_container, access, &mut set);
    }

    let fill = FillSpec::random_for_group(ctx.group, count).for_container(in_container, in_type);
    let input = synthesize(in_type, &fill);
    // Punning only renames the bytes.
    let output = input
        .reinterpret(out_type)
        .restride(OUTPUT.array_stride(out_type));

    subs.set("in_type", in_type.spirv_id())
        .set("out_type", out_type.spirv_id())
        .set("access_type", access.spirv_id())
        .set("in_storage", in_container.storage_class_label())
        .set("in_array", array_decl(in_container, in_type))
        .set("in_stride", input.stride)
        .set("out_stride", output.stride)
        .set("in_bindings", binding_decorations(in_container, "%in_var", 0))
        .set("out_binding", 1)
        .set("count", count);

    Plan {
        template,
        subs,
        set,
        memory_model: MemoryModelKind::Glsl450,
        types: vec![in_type, out_type, access],
        interface: "%in_var %out_var",
        local_size: count,
        inputs: vec![input_resource(in_container, &input)],
        expected: Expected::Buffers(vec![output.to_resource(BufferUsage::Storage).with_binding(1)]),
    }
}

fn plan_array_length(combination: &TestCombination, ctx: &AssembleContext<'_>) -> Plan {
    let primary = combination.primary;
    let mut set = CapabilitySet::for_untyped_pointers();
    require_for_type(primary, &mut set);
    require_for_small_container(Container::StorageBuffer, primary, &mut set);

    let count = ctx.element_count;
    let fill = FillSpec::random_for_group(ctx.group, count)
        .for_container(Container::StorageBuffer, primary);
    let input = synthesize(primary, &fill);
    let length = synthesize(DataType::Uint32, &FillSpec::constant(count as f64, 1));

    let mut subs = Substitutions::new();
    subs.set("in_type", primary.spirv_id())
        .set("out_type", DataType::Uint32.spirv_id())
        .set("in_storage", Container::StorageBuffer.storage_class_label())
        .set("in_array", array_decl(Container::StorageBuffer, primary))
        .set("in_stride", input.stride)
        .set("out_stride", length.stride)
        .set(
            "in_bindings",
            binding_decorations(Container::StorageBuffer, "%in_var", 0),
        )
        .set("out_binding", 1)
        .set("count", count);

    Plan {
        template: template::ARRAY_LENGTH,
        subs,
        set,
        memory_model: MemoryModelKind::Glsl450,
        types: vec![primary],
        interface: "%in_var %out_var",
        local_size: 1,
        inputs: vec![input_resource(Container::StorageBuffer, &input)],
        expected: Expected::Buffers(vec![length.to_resource(BufferUsage::Storage).with_binding(1)]),
    }
}

fn plan_atomic(
    combination: &TestCombination,
    op: AtomicOp,
    model: MemoryModelKind,
    ctx: &AssembleContext<'_>,
) -> Plan {
    let kind = combination.primary;
    let container = combination.container;
    let mut set = CapabilitySet::for_untyped_pointers();
    require_for_type(kind, &mut set);
    require_for_atomic_op(kind, op, container, &mut set);
    // The target, or the copy of a workgroup target, is read back from a storage buffer.
    require_for_small_container(OUTPUT, kind, &mut set);

    let count = ctx.element_count;
    let target = synthesize_atomic_target(kind, count, &op.steps());
    let (step_constants, steps) = render_steps(kind, &target.steps);

    let mut subs = Substitutions::new();
    subs.set("out_type", kind.spirv_id())
        .set("out_stride", kind.size())
        .set("out_binding", 0)
        .set("scope", atomic_scope(container, model))
        .set("step_constants", step_constants)
        .set("steps", steps)
        .set("count", count);

    let (template, interface, inputs) = match container {
        Container::Workgroup => (template::ATOMIC_WORKGROUP, "%wg_var %out_var", vec![]),
        _ => (
            template::ATOMIC_STORAGE_BUFFER,
            "%out_var",
            vec![target.initial.to_resource(BufferUsage::Storage).with_binding(0)],
        ),
    };

    Plan {
        template,
        subs,
        set,
        memory_model: model,
        types: vec![kind],
        interface,
        local_size: count,
        inputs,
        expected: Expected::Atomic { target, binding: 0 },
    }
}

fn plan_workgroup_copy(combination: &TestCombination, ctx: &AssembleContext<'_>) -> Plan {
    let primary = combination.primary;
    let mut set = CapabilitySet::for_untyped_pointers();
    require_for_type(primary, &mut set);
    require_for_small_container(Container::StorageBuffer, primary, &mut set);
    require_for_workgroup_layout(&mut set);
    require_for_small_container(Container::Workgroup, primary, &mut set);

    let count = ctx.element_count;
    let fill = FillSpec::random_for_group(ctx.group, count)
        .for_container(Container::StorageBuffer, primary);
    let input = synthesize(primary, &fill);
    let output = input.reversed();

    let mut subs = Substitutions::new();
    subs.set("in_type", primary.spirv_id())
        .set("out_type", primary.spirv_id())
        .set("in_stride", Container::Workgroup.array_stride(primary))
        .set("out_stride", output.stride)
        .set("out_binding", 1)
        .set("last_index", count - 1)
        .set("count", count);

    Plan {
        template: template::WORKGROUP_COPY,
        subs,
        set,
        memory_model: MemoryModelKind::Glsl450,
        types: vec![primary],
        interface: "%in_var %out_var %wg_var",
        local_size: count,
        inputs: vec![input.to_resource(BufferUsage::StorageReadOnly).with_binding(0)],
        expected: Expected::Buffers(vec![output.to_resource(BufferUsage::Storage).with_binding(1)]),
    }
}

/// Builds the program and buffers for one combination.
pub fn assemble(
    combination: &TestCombination,
    ctx: &AssembleContext<'_>,
) -> Result<CaseBundle, TemplateError> {
    let mut plan = match combination.operation {
        Operation::ArrayLength => plan_array_length(combination, ctx),
        Operation::Atomic { op, model } => plan_atomic(combination, op, model, ctx),
        Operation::WorkgroupCopy => plan_workgroup_copy(combination, ctx),
        Operation::Load
        | Operation::Store
        | Operation::Copy
        | Operation::PunLoad
        | Operation::PunStore
        | Operation::PunCopy
        | Operation::MultipleAccessChains => plan_transfer(combination, ctx),
    };

    let memory_model = require_for_memory_model(plan.memory_model, &mut plan.set);
    let mut types = plan.types.clone();
    types.extend([DataType::Uint32, DataType::Vec3Uint32]);
    plan.subs
        .set("capabilities", plan.set.capability_decls())
        .set("extensions", plan.set.extension_decls())
        .set("memory_model", memory_model)
        .set("interface", plan.interface)
        .set("local_size", plan.local_size)
        .set("types", declare_types(types));

    let header_keys = template::HEADER.placeholders()?;
    let body_keys = plan.template.placeholders()?;
    for key in plan.subs.keys() {
        if !header_keys.contains(&key) && !body_keys.contains(&key) {
            trace!(case = %combination.name, key, "unused substitution");
        }
    }

    let mut program = template::HEADER.render(&plan.subs)?;
    program += &plan.template.render(&plan.subs)?;

    Ok(CaseBundle {
        name: combination.name.clone(),
        program,
        capabilities: plan.set,
        inputs: plan.inputs,
        expected: plan.expected,
        workgroups: [1, 1, 1],
        local_size: plan.local_size as u32,
    })
}

/// Assembles every case under `group` and hands it to `registry`, stopping at the first error.
pub fn register_group(
    registry: &mut impl CaseRegistry,
    group: &TestGroup,
    element_count: usize,
) -> Result<usize, AssembleError> {
    let mut registered = 0;
    group.walk(&mut |path, combination| -> Result<(), AssembleError> {
        let group_name = path.join(".");
        let ctx = AssembleContext {
            group: &group_name,
            element_count,
        };
        let bundle = assemble(combination, &ctx).map_err(|source| AssembleError::Template {
            case: format!("{group_name}.{}", combination.name),
            source,
        })?;
        registry
            .register(path, bundle)
            .map_err(|source| AssembleError::Register {
                case: format!("{group_name}.{}", combination.name),
                source: Box::new(source),
            })?;
        registered += 1;
        Ok(())
    })?;
    debug!(group = %group.name, registered, "registered group");
    Ok(registered)
}

/// Enumerates the whole tree for `config` and registers every case.
///
/// `config` is validated first, so an element count outside `1..=MAX_ELEMENT_COUNT` is an
/// error rather than a bad local size.
pub fn generate(
    registry: &mut impl CaseRegistry,
    config: &GeneratorConfig,
) -> Result<usize, AssembleError> {
    config.validate()?;
    let root = enumerate(&config.memory_models);
    let registered = register_group(registry, &root, config.element_count)?;
    info!(registered, "generated untyped pointer cases");
    Ok(registered)
}
