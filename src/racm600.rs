//! Recom RACM600-SL power supply driver.
//!
//! The RACM600-SL is a 600W AC/DC supply monitored and controlled over PMBus.
//! The driver exposes output on/off control, scaled telemetry (output
//! voltage/current, three temperature sensors, input-side readings) and a
//! two-level fault decode: the STATUS_WORD summary first, then the per-domain
//! detail register for each asserted fault class.
//!
//! Every accessor performs one fresh bus transaction; no device state is
//! cached between calls. Callers with more than one logical thread of control
//! must serialize access to a handle themselves.

use tracing::{debug, error, info, warn};

use crate::hw_trait::{I2c, Result};
use crate::pmbus::{fault_label, operation, FaultClass, PmbusCommand, StatusDecoder, StatusWord};

/// Default I2C address for the RACM600
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Volts per LSB for READ_VIN, READ_VCAP, READ_VOUT and the rating registers
const VOLT_SCALE: f32 = 0.01;
/// Amperes per LSB for READ_IOUT and the current limit/rating registers
const AMP_SCALE: f32 = 0.01;
/// Watts per LSB for READ_POUT and the power rating registers
const WATT_SCALE: f32 = 0.01;

/// Manufacturer rating registers (0xA0..=0xA9), read as one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Ratings {
    /// Minimum rated input voltage (V)
    pub vin_min: f32,
    /// Maximum rated input voltage (V)
    pub vin_max: f32,
    /// Maximum rated input current (A)
    pub iin_max: f32,
    /// Maximum rated input power (W)
    pub pin_max: f32,
    /// Minimum rated output voltage (V)
    pub vout_min: f32,
    /// Maximum rated output voltage (V)
    pub vout_max: f32,
    /// Maximum rated output current (A)
    pub iout_max: f32,
    /// Maximum rated output power (W)
    pub pout_max: f32,
    /// Maximum rated ambient temperature (°C)
    pub tambient_max: f32,
    /// Minimum rated ambient temperature (°C)
    pub tambient_min: f32,
}

/// RACM600-SL driver
pub struct Racm600<I: I2c> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Racm600<I> {
    /// Create a new driver with the default address (0x27)
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Create a new driver with a custom address
    pub fn new_with_address(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The device address this handle talks to
    pub fn address(&self) -> u8 {
        self.address
    }

    // ------------------------------------------------------------------
    // Control operations
    // ------------------------------------------------------------------

    /// Turn the power output on (OPERATION bit 7 set). No readback.
    pub async fn enable_output(&mut self) -> Result<()> {
        self.write_byte(PmbusCommand::Operation, operation::ON).await?;
        debug!("power output enabled");
        Ok(())
    }

    /// Turn the power output off (OPERATION bit 7 clear). No readback.
    pub async fn disable_output(&mut self) -> Result<()> {
        self.write_byte(PmbusCommand::Operation, operation::OFF_IMMEDIATE)
            .await?;
        debug!("power output disabled");
        Ok(())
    }

    /// Clear all latched fault bits in the device's status registers
    pub async fn clear_faults(&mut self) -> Result<()> {
        self.send_byte(PmbusCommand::ClearFaults).await
    }

    /// Select the output page (0 = main output, 1 = auxiliary)
    pub async fn select_page(&mut self, page: u8) -> Result<()> {
        self.write_byte(PmbusCommand::Page, page).await
    }

    // ------------------------------------------------------------------
    // Measurement accessors
    // ------------------------------------------------------------------

    /// Read the output voltage in volts
    pub async fn read_voltage(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadVout).await?;
        Ok(raw as f32 * VOLT_SCALE)
    }

    /// Read the output current in amperes
    pub async fn read_current(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadIout).await?;
        Ok(raw as f32 * AMP_SCALE)
    }

    /// Read the ambient temperature in degrees Celsius
    pub async fn read_ambient_temperature(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadTemperature1).await?;
        // The device reports this register directly in °C
        Ok(raw as f32)
    }

    /// Read the AC-input (PFC stage) temperature in degrees Celsius
    pub async fn read_ac_input_temperature(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadTemperature2).await?;
        Ok(raw as f32)
    }

    /// Read the DC-output (LLC stage) temperature in degrees Celsius
    pub async fn read_dc_output_temperature(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadTemperature3).await?;
        Ok(raw as f32)
    }

    /// Read the input voltage in volts
    pub async fn read_input_voltage(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadVin).await?;
        Ok(raw as f32 * VOLT_SCALE)
    }

    /// Read the energy storage capacitor voltage in volts
    pub async fn read_cap_voltage(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadVcap).await?;
        Ok(raw as f32 * VOLT_SCALE)
    }

    /// Read the output power in watts
    pub async fn read_output_power(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::ReadPout).await?;
        Ok(raw as f32 * WATT_SCALE)
    }

    // ------------------------------------------------------------------
    // Fault decoding
    // ------------------------------------------------------------------

    /// Read STATUS_WORD and decode all asserted fault and warning bits.
    ///
    /// One diagnostic line is logged per asserted bit, and for each of the
    /// five fault classes with a detail register (output voltage, output
    /// current, input, temperature, communication) the detail register is
    /// read and its flags logged too, walking classes from the most
    /// significant asserted bit downward.
    ///
    /// Always returns the raw STATUS_WORD value, even when it is zero;
    /// callers needing machine-readable fault state test the bits themselves.
    pub async fn read_faults(&mut self) -> Result<u16> {
        let status = self.read_word(PmbusCommand::StatusWord).await?;
        debug!("Fault Status: 0x{:04X}", status);

        if status == 0 {
            info!("No faults detected.");
            return Ok(status);
        }

        let flags = StatusWord::from_bits_truncate(status);

        if flags.contains(StatusWord::BUSY) {
            error!("FAULT: {}", fault_label::BUSY);
        }
        if flags.contains(StatusWord::OFF) {
            error!("FAULT: {}", fault_label::OFF);
        }

        for class in FaultClass::ALL {
            if flags.contains(class.summary_bit()) {
                error!("FAULT: {}", class.summary_label());
                self.read_detailed_fault(class).await?;
            }
        }

        if flags.contains(StatusWord::UNKNOWN) {
            error!("FAULT: {}", fault_label::UNKNOWN);
        }

        for line in StatusDecoder::decode_warnings(status) {
            warn!("WARNING: {}", line);
        }

        Ok(status)
    }

    /// Read one fault class's detail register and log each asserted flag
    async fn read_detailed_fault(&mut self, class: FaultClass) -> Result<()> {
        let cmd = class.detail_command();
        let raw = self.read_byte(cmd).await?;
        debug!("{} Details: 0x{:02X}", cmd, raw);

        for line in class.decode_detail(raw) {
            error!(" - {}", line);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Protection limits and device information
    // ------------------------------------------------------------------

    /// Set the output overvoltage fault threshold in volts
    pub async fn set_vout_ov_fault_limit(&mut self, volts: f32) -> Result<()> {
        self.write_word(
            PmbusCommand::VoutOvFaultLimit,
            (volts / VOLT_SCALE).round() as u16,
        )
        .await
    }

    /// Set the output overcurrent fault threshold in amperes
    pub async fn set_iout_oc_fault_limit(&mut self, amps: f32) -> Result<()> {
        self.write_word(
            PmbusCommand::IoutOcFaultLimit,
            (amps / AMP_SCALE).round() as u16,
        )
        .await
    }

    /// Set the output overcurrent warning threshold in amperes
    pub async fn set_iout_oc_warn_limit(&mut self, amps: f32) -> Result<()> {
        self.write_word(
            PmbusCommand::IoutOcWarnLimit,
            (amps / AMP_SCALE).round() as u16,
        )
        .await
    }

    /// Read the overtemperature fault threshold in degrees Celsius
    pub async fn read_ot_fault_limit(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::OtFaultLimit).await?;
        Ok(raw as f32)
    }

    /// Read the overtemperature warning threshold in degrees Celsius
    pub async fn read_ot_warn_limit(&mut self) -> Result<f32> {
        let raw = self.read_word(PmbusCommand::OtWarnLimit).await?;
        Ok(raw as f32)
    }

    /// Read all manufacturer rating registers (0xA0..=0xA9)
    pub async fn read_ratings(&mut self) -> Result<Ratings> {
        let vin_min = self.read_word(PmbusCommand::MfrVinMin).await? as f32 * VOLT_SCALE;
        let vin_max = self.read_word(PmbusCommand::MfrVinMax).await? as f32 * VOLT_SCALE;
        let iin_max = self.read_word(PmbusCommand::MfrIinMax).await? as f32 * AMP_SCALE;
        let pin_max = self.read_word(PmbusCommand::MfrPinMax).await? as f32 * WATT_SCALE;
        let vout_min = self.read_word(PmbusCommand::MfrVoutMin).await? as f32 * VOLT_SCALE;
        let vout_max = self.read_word(PmbusCommand::MfrVoutMax).await? as f32 * VOLT_SCALE;
        let iout_max = self.read_word(PmbusCommand::MfrIoutMax).await? as f32 * AMP_SCALE;
        let pout_max = self.read_word(PmbusCommand::MfrPoutMax).await? as f32 * WATT_SCALE;
        let tambient_max = self.read_word(PmbusCommand::MfrTambientMax).await? as f32;
        let tambient_min = self.read_word(PmbusCommand::MfrTambientMin).await? as f32;

        Ok(Ratings {
            vin_min,
            vin_max,
            iin_max,
            pin_max,
            vout_min,
            vout_max,
            iout_max,
            pout_max,
            tambient_max,
            tambient_min,
        })
    }

    /// Read the PMBus revision compliance byte
    pub async fn read_pmbus_revision(&mut self) -> Result<u8> {
        self.read_byte(PmbusCommand::PmbusRevision).await
    }

    /// Read and decode the CAPABILITY register
    pub async fn read_capability(&mut self) -> Result<u8> {
        let cap = self.read_byte(PmbusCommand::Capability).await?;
        debug!(
            "CAPABILITY: 0x{:02X} ({})",
            cap,
            StatusDecoder::decode_capability(cap).join(", ")
        );
        Ok(cap)
    }

    // ------------------------------------------------------------------
    // Register transport
    // ------------------------------------------------------------------

    /// Read a 16-bit register: command byte, repeated start, two bytes back,
    /// low byte first on the wire.
    async fn read_word(&mut self, cmd: PmbusCommand) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[cmd.as_u8()], &mut buf)
            .await?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read an 8-bit register
    async fn read_byte(&mut self, cmd: PmbusCommand) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[cmd.as_u8()], &mut buf)
            .await?;
        Ok(buf[0])
    }

    /// Write a 16-bit register, low byte first on the wire
    async fn write_word(&mut self, cmd: PmbusCommand, value: u16) -> Result<()> {
        let bytes = value.to_le_bytes();
        self.i2c
            .write(self.address, &[cmd.as_u8(), bytes[0], bytes[1]])
            .await
    }

    /// Write a single-byte register
    async fn write_byte(&mut self, cmd: PmbusCommand, value: u8) -> Result<()> {
        self.i2c.write(self.address, &[cmd.as_u8(), value]).await
    }

    /// Issue a zero-payload command
    async fn send_byte(&mut self, cmd: PmbusCommand) -> Result<()> {
        self.i2c.write(self.address, &[cmd.as_u8()]).await
    }
}
