//! Hardware abstraction layer traits.
//!
//! This module defines the bus interface the driver talks through, so the
//! same driver works over direct Linux I2C, a tunneled management protocol,
//! or a mock bus in tests.

pub mod i2c;

pub use i2c::{I2c, I2cError};

/// Common error type for hardware operations
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    /// I/O error from underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bus-level I2C failure
    #[error(transparent)]
    I2c(#[from] I2cError),

    /// Invalid parameter or argument
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timeout waiting for hardware response
    #[error("Hardware timeout")]
    Timeout,

    /// Other hardware-specific error
    #[error("Hardware error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
