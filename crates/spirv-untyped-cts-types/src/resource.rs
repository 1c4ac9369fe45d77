use serde::{Deserialize, Serialize};

/// How a buffer is bound when the case executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferUsage {
    Storage,
    StorageReadOnly,
    Uniform,
    PushConstant,
}

impl BufferUsage {
    /// Whether the executor reads this buffer back after the dispatch.
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Storage)
    }
}

/// One buffer handed to the executor, tagged with its binding kind.
///
/// `stride` is the distance in bytes between consecutive elements; it is at least the natural
/// size of the element type and includes any trailing padding the container requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub usage: BufferUsage,
    /// Descriptor binding in set 0; `None` for push constants.
    pub binding: Option<u32>,
    pub stride: usize,
    pub count: usize,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Resource {
    pub fn new(usage: BufferUsage, stride: usize, count: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(stride * count, data.len());
        Self {
            usage,
            binding: None,
            stride,
            count,
            data,
        }
    }

    pub fn with_binding(self, binding: u32) -> Self {
        debug_assert_ne!(self.usage, BufferUsage::PushConstant);
        Self {
            binding: Some(binding),
            ..self
        }
    }
}
