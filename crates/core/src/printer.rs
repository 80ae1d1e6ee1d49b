//! Output capability handed the converted resources
//!
//! The core only defines the contract. Rendering to YAML or JSON and writing
//! to a terminal is the job of the caller.

use crate::api::v3::V3Resource;

/// Serializes and writes a finished batch of v3 resources.
pub trait Printer {
    fn print(&mut self, resources: &[V3Resource]) -> Result<(), PrinterError>;
}

/// Opaque printer failure, surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to print resources: {0}")]
pub struct PrinterError(pub String);

impl PrinterError {
    pub fn new(message: impl ToString) -> Self {
        PrinterError(message.to_string())
    }
}
