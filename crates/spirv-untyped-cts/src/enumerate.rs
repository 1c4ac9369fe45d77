//! Builds the tree of test groups and the combinations in each.
//!
//! Enumeration order is catalog order crossed with the nested loop order below, so case
//! names and their positions are stable for a given revision.

use crate::atomic::AtomicOp;
use crate::container::Container;
use crate::data_type::DataType;
use spirv_untyped_cts_types::MemoryModelKind;
use tracing::debug;

pub const ROOT_GROUP: &str = "untyped_pointers";

/// Separator between the primary and partner names of a punning case.
const PARTNER_SEPARATOR: &str = "_to_";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Load through an untyped pointer into `container`.
    Load,
    /// Store through an untyped pointer into a storage buffer.
    Store,
    /// Copy from an untyped pointer into `container` to a storage buffer.
    Copy,
    ArrayLength,
    Atomic {
        op: AtomicOp,
        model: MemoryModelKind,
    },
    /// Load the primary's bytes as the partner type.
    PunLoad,
    /// Store a partner-typed value into primary-typed memory.
    PunStore,
    PunCopy,
    /// Two chained untyped access chains that disagree on the element type.
    MultipleAccessChains,
    /// Round trip through explicitly laid out workgroup memory.
    WorkgroupCopy,
}

/// One fully specified case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCombination {
    pub primary: DataType,
    pub partner: Option<DataType>,
    pub container: Container,
    pub operation: Operation,
    pub name: String,
}

impl TestCombination {
    pub fn new(
        primary: DataType,
        partner: Option<DataType>,
        container: Container,
        operation: Operation,
    ) -> Self {
        Self {
            primary,
            partner,
            container,
            operation,
            name: combination_name(primary, partner),
        }
    }

    /// The type the program accesses memory as.
    pub fn access_type(&self) -> DataType {
        self.partner.unwrap_or(self.primary)
    }
}

/// `<primary>` or `<primary>_to_<partner>`.
pub fn combination_name(primary: DataType, partner: Option<DataType>) -> String {
    match partner {
        Some(partner) => format!("{primary}{PARTNER_SEPARATOR}{partner}"),
        None => primary.name().to_owned(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestGroup {
    pub name: String,
    pub children: Vec<TestGroup>,
    pub cases: Vec<TestCombination>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn with_children(name: impl Into<String>, children: Vec<TestGroup>) -> Self {
        Self {
            children,
            ..Self::new(name)
        }
    }

    fn with_cases(name: impl Into<String>, cases: Vec<TestCombination>) -> Self {
        Self {
            cases,
            ..Self::new(name)
        }
    }

    pub fn case_count(&self) -> usize {
        self.cases.len() + self.children.iter().map(Self::case_count).sum::<usize>()
    }

    pub fn child(&self, name: &str) -> Option<&TestGroup> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Follows `path` down from this group.
    pub fn find(&self, path: &[&str]) -> Option<&TestGroup> {
        path.iter().try_fold(self, |group, name| group.child(name))
    }

    /// Calls `visit` with the group path (this group's name first) of every case, depth first.
    pub fn walk<'a, E>(
        &'a self,
        visit: &mut impl FnMut(&[&'a str], &'a TestCombination) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut path = Vec::new();
        self.walk_inner(&mut path, visit)
    }

    fn walk_inner<'a, E>(
        &'a self,
        path: &mut Vec<&'a str>,
        visit: &mut impl FnMut(&[&'a str], &'a TestCombination) -> Result<(), E>,
    ) -> Result<(), E> {
        path.push(&self.name);
        for case in &self.cases {
            visit(path, case)?;
        }
        for child in &self.children {
            child.walk_inner(path, visit)?;
        }
        path.pop();
        Ok(())
    }
}

/// Which part of a value a punning case reinterprets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PunSlot {
    /// The whole value; any partner of the same total size fits.
    Whole,
    /// One lane at a time; the partner must have as many lanes as the primary.
    PerLane,
}

/// Scalar partners, then vector partners, of `primary` that fit `slot`.
pub fn punning_partners(primary: DataType, slot: PunSlot) -> Vec<DataType> {
    let mut partners = primary.same_size_scalar_partners();
    partners.extend(
        primary
            .same_size_vector_partners()
            .into_iter()
            .filter(|partner| match slot {
                PunSlot::Whole => true,
                PunSlot::PerLane => partner.element_count() == primary.element_count(),
            }),
    );
    partners
}

fn scalar_cases(container: Container, operation: Operation) -> Vec<TestCombination> {
    DataType::SCALARS
        .into_iter()
        .map(|ty| TestCombination::new(ty, None, container, operation))
        .collect()
}

fn per_container(
    name: &str,
    containers: &[Container],
    cases: impl Fn(Container) -> Vec<TestCombination>,
) -> TestGroup {
    let children = containers
        .iter()
        .map(|&container| TestGroup::with_cases(container.name(), cases(container)))
        .collect();
    TestGroup::with_children(name, children)
}

pub fn enumerate_basic() -> TestGroup {
    TestGroup::with_children(
        "basic",
        vec![
            per_container("load", &Container::ADDRESSABLE, |container| {
                scalar_cases(container, Operation::Load)
            }),
            // Read-only containers are never store destinations.
            per_container("store", &[Container::StorageBuffer], |container| {
                scalar_cases(container, Operation::Store)
            }),
            per_container("copy", &Container::ADDRESSABLE, |container| {
                scalar_cases(container, Operation::Copy)
            }),
        ],
    )
}

pub fn enumerate_array_length() -> TestGroup {
    per_container("array_length", &[Container::StorageBuffer], |container| {
        scalar_cases(container, Operation::ArrayLength)
    })
}

/// Atomic cases for every model in `models`; only [`DataType::ATOMIC_TYPES`] participate.
pub fn enumerate_atomics(models: &[MemoryModelKind]) -> TestGroup {
    let model_groups = models
        .iter()
        .map(|&model| {
            let op_groups = AtomicOp::iter()
                .map(|op| {
                    per_container(op.name(), &Container::ATOMIC, |container| {
                        DataType::ATOMIC_TYPES
                            .into_iter()
                            .filter(|&ty| op.supports(ty))
                            .map(|ty| {
                                TestCombination::new(
                                    ty,
                                    None,
                                    container,
                                    Operation::Atomic { op, model },
                                )
                            })
                            .collect()
                    })
                })
                .collect();
            TestGroup::with_children(model.as_str(), op_groups)
        })
        .collect();
    TestGroup::with_children("atomics", model_groups)
}

fn punning_cases(container: Container, operation: Operation, slot: PunSlot) -> Vec<TestCombination> {
    DataType::SCALARS
        .into_iter()
        .flat_map(|primary| {
            punning_partners(primary, slot)
                .into_iter()
                .map(move |partner| TestCombination::new(primary, Some(partner), container, operation))
        })
        .collect()
}

pub fn enumerate_type_punning() -> TestGroup {
    TestGroup::with_children(
        "type_punning",
        vec![
            per_container("load", &Container::ADDRESSABLE, |container| {
                punning_cases(container, Operation::PunLoad, PunSlot::Whole)
            }),
            per_container("store", &[Container::StorageBuffer], |container| {
                punning_cases(container, Operation::PunStore, PunSlot::Whole)
            }),
            per_container("copy", &Container::ADDRESSABLE, |container| {
                punning_cases(container, Operation::PunCopy, PunSlot::Whole)
            }),
            per_container(
                "multiple_access_chains",
                &[Container::StorageBuffer],
                |container| {
                    punning_cases(container, Operation::MultipleAccessChains, PunSlot::PerLane)
                },
            ),
        ],
    )
}

pub fn enumerate_workgroup_layout() -> TestGroup {
    let copy = TestGroup::with_cases("copy", scalar_cases(Container::Workgroup, Operation::WorkgroupCopy));
    TestGroup::with_children("workgroup_memory_explicit_layout", vec![copy])
}

/// The whole tree, atomics restricted to `models`.
pub fn enumerate(models: &[MemoryModelKind]) -> TestGroup {
    let root = TestGroup::with_children(
        ROOT_GROUP,
        vec![
            enumerate_basic(),
            enumerate_array_length(),
            enumerate_atomics(models),
            enumerate_type_punning(),
            enumerate_workgroup_layout(),
        ],
    );
    for group in &root.children {
        debug!(group = %group.name, cases = group.case_count(), "enumerated");
    }
    root
}
