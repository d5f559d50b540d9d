//! Error type for power meter operations.
//!
//! The driver reports failures as nonzero status codes and distinguishes
//! them only by the message text obtained from a secondary lookup call.
//! This module mirrors that contract: one failure type carrying the native
//! status code and the driver-produced message, with no further hierarchy.

use thiserror::Error;

/// Result type alias for power meter operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// VISA status code for a malformed resource name.
///
/// Raised by the binding itself when a resource string cannot be passed to
/// the driver (embedded NUL byte); the same code the driver returns for
/// resource names it rejects.
pub const VI_ERROR_INV_RSRC_NAME: i32 = 0xBFFF_0012_u32 as i32;

/// A failure reported by the TLPM driver.
///
/// Callers needing finer semantics than success/failure (for example,
/// distinguishing "sensor does not support this function" from a timeout)
/// must match on the message text; the native driver does not classify its
/// errors beyond that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("TLPM driver error ({code}): {message}")]
pub struct DriverError {
    /// Native status code as returned by the driver (always nonzero).
    pub code: i32,
    /// Human-readable description from the driver's message lookup.
    pub message: String,
}

impl DriverError {
    /// Create a driver error from a status code and message text.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error for a resource string the driver cannot accept.
    pub(crate) fn invalid_resource_name(resource: &str) -> Self {
        Self::new(
            VI_ERROR_INV_RSRC_NAME,
            format!("Invalid resource name: {:?}", resource),
        )
    }
}
