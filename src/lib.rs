//! Driver for the Recom RACM600-SL power supply, a 600W AC/DC module
//! monitored and controlled over PMBus (I2C).
//!
//! The driver is generic over an [`hw_trait::I2c`] bus implementation, so it
//! runs unchanged over direct Linux I2C, a tunneled management protocol, or a
//! mock bus in tests. Fault diagnostics are emitted as `tracing` events;
//! telemetry and control results come back through `Result` values.
//!
//! ```no_run
//! # use racm600::{Racm600, hw_trait::{I2c, Result}};
//! # async fn demo(bus: impl I2c) -> Result<()> {
//! let mut psu = Racm600::new(bus);
//! psu.enable_output().await?;
//! let volts = psu.read_voltage().await?;
//! let status = psu.read_faults().await?;
//! # Ok(())
//! # }
//! ```

pub mod hw_trait;
pub mod pmbus;

mod racm600;

pub use racm600::{Racm600, Ratings, DEFAULT_ADDRESS};
