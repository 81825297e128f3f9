//! Common types used across IPC messages.

use serde::{Deserialize, Serialize};

/// Identifies one capturable display output.
///
/// The `(adapter_index, output_index)` pair is unique within a single
/// enumeration snapshot and matches platform enumeration order. A snapshot
/// can go stale if the display topology changes; a stale pair is rejected
/// with an out-of-range error when the session next validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Index of the graphics adapter in enumeration order.
    pub adapter_index: u32,

    /// Index of the output on that adapter, in enumeration order.
    pub output_index: u32,

    /// Device name reported by the driver (e.g. `\\.\DISPLAY1`).
    pub name: String,
}

impl DisplayInfo {
    /// Create a display descriptor.
    pub fn new(adapter_index: u32, output_index: u32, name: impl Into<String>) -> Self {
        Self {
            adapter_index,
            output_index,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for DisplayInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (adapter {}, output {})",
            self.name, self.adapter_index, self.output_index
        )
    }
}
