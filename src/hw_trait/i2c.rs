//! I2C hardware abstraction trait.

use async_trait::async_trait;

use super::Result;

/// I2C-specific errors
#[derive(Debug, thiserror::Error)]
pub enum I2cError {
    /// No acknowledgment from device
    #[error("No acknowledgment from device at address 0x{0:02x}")]
    NoAck(u8),

    /// Bus arbitration lost
    #[error("Bus arbitration lost")]
    ArbitrationLost,

    /// Bus error
    #[error("Bus error")]
    BusError,

    /// Device returned fewer bytes than requested
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Other I2C error
    #[error("I2C error: {0}")]
    Other(String),
}

/// I2C bus abstraction
///
/// Implementations must fill the caller's read buffer completely or report
/// [`I2cError::ShortRead`]; a partial read never succeeds silently.
/// `write_read` must hold the bus between the write and the read (repeated
/// start), since PMBus devices treat the pair as one register-select-and-read
/// exchange.
#[async_trait]
pub trait I2c: Send + Sync {
    /// Write data to an I2C device.
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()>;

    /// Read data from an I2C device.
    async fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<()>;

    /// Write data then read from an I2C device (repeated start).
    async fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> Result<()>;
}
