//! Generates conformance cases for SPIR-V untyped pointers (`SPV_KHR_untyped_pointers`).
//!
//! Cases are enumerated as a tree of [`TestGroup`]s. Each [`TestCombination`] is assembled
//! into a [`CaseBundle`]: SPIR-V assembly text, the capabilities and device features it needs,
//! input buffers, and the expected outputs (or, for atomics, the steps an executor replays to
//! derive them). A [`CaseRegistry`] receives the bundles.
//!
//! ```no_run
//! use spirv_untyped_cts::{CaseBundle, GeneratorConfig, generate};
//!
//! let mut cases: Vec<(String, CaseBundle)> = Vec::new();
//! let count = generate(&mut cases, &GeneratorConfig::default()).unwrap();
//! assert_eq!(count, cases.len());
//! ```

pub mod assemble;
pub mod atomic;
pub mod capability;
pub mod container;
pub mod data_type;
pub mod enumerate;
pub mod fixture;
pub mod template;

pub use assemble::{
    AssembleContext, AssembleError, CaseBundle, CaseRegistry, Expected, assemble, generate,
    register_group,
};
pub use atomic::{AtomicOp, AtomicStep};
pub use capability::{CapabilitySet, RequiredFeatures};
pub use container::Container;
pub use data_type::{CATALOG, DataType, NumericClass, TypeDescriptor};
pub use enumerate::{Operation, TestCombination, TestGroup, enumerate};
pub use fixture::{AtomicFixture, FillSpec, FillStrategy, Fixture};

pub use spirv_untyped_cts_types::{
    BufferUsage, CaseManifest, GeneratorConfig, MemoryModelKind, Resource, ResourceEntry,
    SpirvVersion,
};
