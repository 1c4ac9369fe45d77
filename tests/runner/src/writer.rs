use spirv_untyped_cts::{CaseBundle, CaseManifest, Resource, ResourceEntry};
use std::fs;
use std::io;
use std::path::Path;
use tracing::trace;

pub const PROGRAM_FILE: &str = "program.spvasm";
pub const MANIFEST_FILE: &str = "case.json";

fn write_resources(dir: &Path, prefix: &str, resources: &[Resource]) -> io::Result<Vec<ResourceEntry>> {
    resources
        .iter()
        .enumerate()
        .map(|(index, resource)| {
            let file = format!("{prefix}{index}.bin");
            fs::write(dir.join(&file), &resource.data)?;
            Ok(ResourceEntry {
                file,
                usage: resource.usage,
                binding: resource.binding,
                stride: resource.stride,
                count: resource.count,
            })
        })
        .collect()
}

/// Writes `bundle` into `dir` so an executor outside this workspace can run it.
pub fn write_case(dir: &Path, bundle: &CaseBundle, outputs: &[Resource]) -> io::Result<CaseManifest> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(PROGRAM_FILE), &bundle.program)?;
    let set = &bundle.capabilities;
    let manifest = CaseManifest {
        name: bundle.name.clone(),
        program: PROGRAM_FILE.to_owned(),
        spirv_version: bundle.spirv_version(),
        capabilities: set
            .unique_capabilities()
            .iter()
            .map(|cap| format!("{cap:?}"))
            .collect(),
        spirv_extensions: set.unique_extensions().into_iter().map(String::from).collect(),
        device_extensions: set
            .unique_device_extensions()
            .into_iter()
            .map(String::from)
            .collect(),
        features: set.features.enabled_names().into_iter().map(String::from).collect(),
        workgroups: bundle.workgroups,
        inputs: write_resources(dir, "input", &bundle.inputs)?,
        outputs: write_resources(dir, "expected", outputs)?,
        atomic_steps: bundle.atomic_steps().iter().map(ToString::to_string).collect(),
    };
    manifest.write(dir.join(MANIFEST_FILE))?;
    trace!(dir = %dir.display(), "wrote case");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify;
    use pretty_assertions::assert_eq;
    use spirv_untyped_cts::{
        AssembleContext, AtomicOp, BufferUsage, Container, DataType, MemoryModelKind, Operation,
        SpirvVersion, TestCombination, assemble,
    };
    use tempfile::tempdir;

    #[test]
    fn test_write_load_case() {
        let combination =
            TestCombination::new(DataType::Float64, None, Container::Uniform, Operation::Load);
        let ctx = AssembleContext {
            group: "untyped_pointers.basic.load.uniform",
            element_count: 4,
        };
        let bundle = assemble(&combination, &ctx).unwrap();
        let outputs = verify(&bundle).unwrap();
        let dir = tempdir().unwrap();

        let manifest = write_case(dir.path(), &bundle, &outputs).unwrap();
        assert_eq!(CaseManifest::read(dir.path().join(MANIFEST_FILE)).unwrap(), manifest);
        assert_eq!(
            fs::read_to_string(dir.path().join(PROGRAM_FILE)).unwrap(),
            bundle.program
        );
        assert_eq!(fs::read(dir.path().join("input0.bin")).unwrap(), bundle.inputs[0].data);
        assert_eq!(fs::read(dir.path().join("expected0.bin")).unwrap(), outputs[0].data);
        assert_eq!(manifest.inputs[0].usage, BufferUsage::Uniform);
        assert_eq!(manifest.outputs[0].binding, Some(1));
        assert_eq!(manifest.capabilities, vec!["Float64"]);
        assert!(manifest.atomic_steps.is_empty());
    }

    #[test]
    fn test_write_atomic_case() {
        let combination = TestCombination::new(
            DataType::Float32,
            None,
            Container::Workgroup,
            Operation::Atomic {
                op: AtomicOp::Max,
                model: MemoryModelKind::Vulkan,
            },
        );
        let ctx = AssembleContext {
            group: "untyped_pointers.atomics.vulkan.max.workgroup",
            element_count: 2,
        };
        let bundle = assemble(&combination, &ctx).unwrap();
        let outputs = verify(&bundle).unwrap();
        let dir = tempdir().unwrap();

        let manifest = write_case(dir.path(), &bundle, &outputs).unwrap();
        assert_eq!(manifest.spirv_version, SpirvVersion::Spv_1_5);
        assert!(manifest.inputs.is_empty());
        assert_eq!(manifest.atomic_steps, vec!["store 5", "max -3", "max 9"]);
        assert!(manifest.features.contains(&"shader_shared_float32_atomic_min_max".to_owned()));
        assert_eq!(
            fs::read(dir.path().join("expected0.bin")).unwrap(),
            9f32.to_ne_bytes().repeat(2)
        );
    }
}
