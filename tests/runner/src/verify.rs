//! Checks a bundle is self-consistent before it is handed to an executor.

use crate::replay::replay;
use spirv_untyped_cts::{BufferUsage, CaseBundle, Container, Expected, Resource};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("{kind} {index} has {len} bytes, expected {count} elements of stride {stride}")]
    Length {
        kind: &'static str,
        index: usize,
        len: usize,
        stride: usize,
        count: usize,
    },
    #[error("no array in the program has stride {stride}, used by {kind} {index}")]
    Stride {
        kind: &'static str,
        index: usize,
        stride: usize,
    },
    #[error("push constant range of {len} bytes exceeds {budget}")]
    PushConstantBudget { len: usize, budget: u32 },
    #[error("binding {0} is used by more than one buffer")]
    DuplicateBinding(u32),
    #[error("{kind} {index} needs a binding")]
    MissingBinding { kind: &'static str, index: usize },
    #[error("program does not declare `{0}`")]
    MissingDeclaration(String),
    #[error("program has an unsubstituted placeholder")]
    Placeholder,
}

fn check_resource(kind: &'static str, index: usize, resource: &Resource, program: &str) -> Result<(), VerifyError> {
    if resource.stride * resource.count != resource.data.len() {
        return Err(VerifyError::Length {
            kind,
            index,
            len: resource.data.len(),
            stride: resource.stride,
            count: resource.count,
        });
    }
    if !program.contains(&format!("ArrayStride {}\n", resource.stride)) {
        return Err(VerifyError::Stride {
            kind,
            index,
            stride: resource.stride,
        });
    }
    if resource.usage == BufferUsage::PushConstant {
        let budget = Container::PushConstant.byte_budget().unwrap_or(u32::MAX);
        if resource.data.len() > budget as usize {
            return Err(VerifyError::PushConstantBudget {
                len: resource.data.len(),
                budget,
            });
        }
    } else if resource.binding.is_none() {
        return Err(VerifyError::MissingBinding { kind, index });
    }
    Ok(())
}

/// Checks `bundle` and returns the buffers an executor compares after the dispatch.
///
/// For atomic cases the expected buffer is computed by replaying the steps.
pub fn verify(bundle: &CaseBundle) -> Result<Vec<Resource>, VerifyError> {
    let program = bundle.program.as_str();
    if program.contains("${") {
        return Err(VerifyError::Placeholder);
    }
    let set = &bundle.capabilities;
    let declarations = set
        .unique_capabilities()
        .into_iter()
        .map(|cap| format!("OpCapability {cap:?}\n"))
        .chain(
            set.unique_extensions()
                .into_iter()
                .map(|ext| format!("OpExtension \"{ext}\"\n")),
        );
    for declaration in declarations {
        if !program.contains(&declaration) {
            return Err(VerifyError::MissingDeclaration(declaration.trim_end().to_owned()));
        }
    }

    let outputs = match &bundle.expected {
        Expected::Buffers(outputs) => outputs.clone(),
        Expected::Atomic { target, binding } => {
            let expected = Resource::new(
                BufferUsage::Storage,
                target.initial.stride as usize,
                target.initial.count,
                replay(target),
            );
            vec![expected.with_binding(*binding)]
        }
    };

    let mut bindings = HashSet::new();
    for (index, input) in bundle.inputs.iter().enumerate() {
        check_resource("input", index, input, program)?;
        if let Some(binding) = input.binding
            && !bindings.insert(binding)
        {
            return Err(VerifyError::DuplicateBinding(binding));
        }
    }
    for (index, output) in outputs.iter().enumerate() {
        check_resource("output", index, output, program)?;
        // An atomic storage buffer target is read back from the binding it was uploaded to.
        let shared = matches!(bundle.expected, Expected::Atomic { .. })
            && bundle.inputs.iter().any(|input| input.binding == output.binding);
        if let Some(binding) = output.binding
            && !shared
            && !bindings.insert(binding)
        {
            return Err(VerifyError::DuplicateBinding(binding));
        }
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_untyped_cts::{
        AssembleContext, AtomicOp, DataType, MemoryModelKind, Operation, TestCombination,
        assemble,
    };

    fn bundle(combination: TestCombination) -> CaseBundle {
        let ctx = AssembleContext {
            group: "untyped_pointers.verify",
            element_count: 8,
        };
        assemble(&combination, &ctx).unwrap()
    }

    #[test]
    fn test_load_passes() {
        let bundle = bundle(TestCombination::new(
            DataType::Int16,
            Some(DataType::Float16),
            Container::Uniform,
            Operation::PunLoad,
        ));
        let outputs = verify(&bundle).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].stride, 2);
    }

    #[test]
    fn test_atomic_target_is_replayed() {
        let bundle = bundle(TestCombination::new(
            DataType::Int32,
            None,
            Container::StorageBuffer,
            Operation::Atomic {
                op: AtomicOp::Xor,
                model: MemoryModelKind::Glsl450,
            },
        ));
        let outputs = verify(&bundle).unwrap();
        assert_eq!(outputs[0].data, 6i32.to_ne_bytes().repeat(8));
        assert_eq!(outputs[0].binding, Some(0));
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let mut bundle = bundle(TestCombination::new(
            DataType::Uint64,
            None,
            Container::StorageBuffer,
            Operation::Load,
        ));
        bundle.inputs[0].data.pop();
        assert!(matches!(
            verify(&bundle),
            Err(VerifyError::Length { kind: "input", .. })
        ));
    }

    #[test]
    fn test_undeclared_capability_is_rejected() {
        let mut bundle = bundle(TestCombination::new(
            DataType::Uint8,
            None,
            Container::StorageBuffer,
            Operation::Store,
        ));
        bundle.program = bundle.program.replace("OpCapability Int8\n", "");
        assert_eq!(
            verify(&bundle),
            Err(VerifyError::MissingDeclaration("OpCapability Int8".into()))
        );
    }
}
