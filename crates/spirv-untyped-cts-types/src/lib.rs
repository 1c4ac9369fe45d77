//! Types shared between `spirv-untyped-cts` and the harness that registers its cases.

mod config;
mod resource;
mod version;

pub use config::*;
pub use resource::*;
pub use version::*;

// Re-exported so the harness deserializes manifests with the same versions.
pub use serde;
pub use serde_json;
