//! PMBus command and status register definitions for the RACM600-SL.
//!
//! The RACM600 speaks a subset of standard PMBus plus a block of
//! manufacturer-specific rating registers (0xA0..=0xA9). The command table
//! here mirrors the datasheet command set byte for byte.
//!
//! PMBus specification: <https://pmbus.org/specification-documents/>

use std::fmt;

use bitflags::bitflags;
use thiserror::Error;

// ============================================================================
// PMBus Commands
// ============================================================================

/// Macro to define PMBus commands with metadata in one place
macro_rules! define_pmbus_commands {
    (
        $(
            $variant:ident = $value:literal,
            $name:literal,
            $desc:literal
        ),* $(,)?
    ) => {
        /// PMBus command codes understood by the RACM600
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum PmbusCommand {
            $(
                $variant = $value,
            )*
        }

        impl PmbusCommand {
            /// Command metadata: (value, name, description)
            const METADATA: &'static [(u8, &'static str, &'static str)] = &[
                $(
                    ($value, $name, $desc),
                )*
            ];

            /// Get the command name as a string
            pub fn name(&self) -> &'static str {
                let value = self.as_u8();
                Self::METADATA
                    .iter()
                    .find(|(v, _, _)| *v == value)
                    .map(|(_, name, _)| *name)
                    .unwrap_or("UNKNOWN")
            }

            /// Get command description
            pub fn description(&self) -> &'static str {
                let value = self.as_u8();
                Self::METADATA
                    .iter()
                    .find(|(v, _, _)| *v == value)
                    .map(|(_, _, desc)| *desc)
                    .unwrap_or("unknown command")
            }

            /// Convert to u8 command code
            pub fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl fmt::Display for PmbusCommand {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name())
            }
        }

        impl TryFrom<u8> for PmbusCommand {
            type Error = PmbusError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $(
                        $value => Ok(Self::$variant),
                    )*
                    _ => Err(PmbusError::CommandNotSupported(value)),
                }
            }
        }

        impl From<PmbusCommand> for u8 {
            fn from(cmd: PmbusCommand) -> Self {
                cmd.as_u8()
            }
        }
    };
}

// The full RACM600 command set, standard range first, then the
// manufacturer-specific rating registers.
define_pmbus_commands! {
    Page = 0x00, "PAGE", "select output page (0 = main, 1 = aux)",
    Operation = 0x01, "OPERATION", "output on/off control (bit 7)",
    ClearFaults = 0x03, "CLEAR_FAULTS", "clears all fault status bits",
    Capability = 0x19, "CAPABILITY", "device capability",
    Query = 0x1A, "QUERY", "check command support and format",
    VoutMode = 0x20, "VOUT_MODE", "output voltage data format",
    VoutOvFaultLimit = 0x40, "VOUT_OV_FAULT_LIMIT", "output overvoltage fault limit",
    IoutOcFaultLimit = 0x46, "IOUT_OC_FAULT_LIMIT", "output overcurrent fault limit",
    IoutOcWarnLimit = 0x4A, "IOUT_OC_WARN_LIMIT", "output overcurrent warning limit",
    OtFaultLimit = 0x4F, "OT_FAULT_LIMIT", "overtemperature fault limit",
    OtWarnLimit = 0x51, "OT_WARN_LIMIT", "overtemperature warning limit",
    StatusByte = 0x78, "STATUS_BYTE", "summary of most critical faults",
    StatusWord = 0x79, "STATUS_WORD", "fault condition summary",
    StatusVout = 0x7A, "STATUS_VOUT", "output voltage status",
    StatusIout = 0x7B, "STATUS_IOUT", "output current status",
    StatusInput = 0x7C, "STATUS_INPUT", "input status",
    StatusTemperature = 0x7D, "STATUS_TEMPERATURE", "temperature status",
    StatusCml = 0x7E, "STATUS_CML", "communication status",
    StatusOther = 0x7F, "STATUS_OTHER", "other status",
    StatusMfrSpecific = 0x80, "STATUS_MFR_SPECIFIC", "manufacturer specific status",
    ReadVin = 0x88, "READ_VIN", "input voltage",
    ReadVcap = 0x8A, "READ_VCAP", "energy storage capacitor voltage",
    ReadVout = 0x8B, "READ_VOUT", "output voltage",
    ReadIout = 0x8C, "READ_IOUT", "output current",
    ReadTemperature1 = 0x8D, "READ_TEMPERATURE_1", "ambient temperature",
    ReadTemperature2 = 0x8E, "READ_TEMPERATURE_2", "PFC stage temperature",
    ReadTemperature3 = 0x8F, "READ_TEMPERATURE_3", "LLC stage temperature",
    ReadPout = 0x96, "READ_POUT", "output power",
    PmbusRevision = 0x98, "PMBUS_REVISION", "PMBus revision compliance",
    MfrVinMin = 0xA0, "MFR_VIN_MIN", "minimum rated input voltage",
    MfrVinMax = 0xA1, "MFR_VIN_MAX", "maximum rated input voltage",
    MfrIinMax = 0xA2, "MFR_IIN_MAX", "maximum rated input current",
    MfrPinMax = 0xA3, "MFR_PIN_MAX", "maximum rated input power",
    MfrVoutMin = 0xA4, "MFR_VOUT_MIN", "minimum rated output voltage",
    MfrVoutMax = 0xA5, "MFR_VOUT_MAX", "maximum rated output voltage",
    MfrIoutMax = 0xA6, "MFR_IOUT_MAX", "maximum rated output current",
    MfrPoutMax = 0xA7, "MFR_POUT_MAX", "maximum rated output power",
    MfrTambientMax = 0xA8, "MFR_TAMBIENT_MAX", "maximum rated ambient temperature",
    MfrTambientMin = 0xA9, "MFR_TAMBIENT_MIN", "minimum rated ambient temperature",
}

/// OPERATION (0x01) command values. Bit 7 controls the output.
pub mod operation {
    /// Output on
    pub const ON: u8 = 0x80;
    /// Output off, immediately
    pub const OFF_IMMEDIATE: u8 = 0x00;
}

/// Diagnostic labels for the STATUS_WORD fault bits that have no detail
/// register; the five detailed classes get theirs from
/// [`FaultClass::summary_label`].
pub mod fault_label {
    pub const BUSY: &str = "Device Busy";
    pub const OFF: &str = "Power Output Off";
    pub const UNKNOWN: &str = "Unknown Fault";
}

// ============================================================================
// Status Register Bits
// ============================================================================

bitflags! {
    /// STATUS_WORD (0x79) register flags.
    ///
    /// Low byte carries the fault-class bits, high byte the warning bits.
    /// Note the RACM600 reports fans at 0x0200 and "other" at 0x0100, one
    /// bit position below where standard PMBus places them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusWord: u16 {
        const VOUT_WARN = 0x8000;
        const IOUT_POUT_WARN = 0x4000;
        const INPUT_WARN = 0x2000;
        const MFR_WARN = 0x1000;
        const PGOOD_LOST = 0x0800;
        const FAN_WARN = 0x0200;
        const OTHER_WARN = 0x0100;
        const BUSY = 0x0080;
        const OFF = 0x0040;
        const VOUT_OV = 0x0020;
        const IOUT_OC = 0x0010;
        const VIN_UV = 0x0008;
        const TEMPERATURE = 0x0004;
        const CML = 0x0002;
        const UNKNOWN = 0x0001;
    }
}

bitflags! {
    /// STATUS_VOUT (0x7A) register flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusVout: u8 {
        const OV_FAULT = 0x80;
        const OV_WARN = 0x40;
        const UV_WARN = 0x10;
        const UV_FAULT = 0x08;
    }
}

bitflags! {
    /// STATUS_IOUT (0x7B) register flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusIout: u8 {
        const OC_FAULT = 0x80;
        const CC_FAULT = 0x40;
        const OC_WARN = 0x20;
    }
}

bitflags! {
    /// STATUS_INPUT (0x7C) register flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusInput: u8 {
        const OV_FAULT = 0x80;
        const OV_WARN = 0x40;
        const UV_WARN = 0x10;
        const UV_FAULT = 0x08;
    }
}

bitflags! {
    /// STATUS_TEMPERATURE (0x7D) register flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusTemperature: u8 {
        const OT_FAULT = 0x80;
        const OT_WARN = 0x40;
    }
}

bitflags! {
    /// STATUS_CML (0x7E) register flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusCml: u8 {
        const INVALID_CMD = 0x80;
        const INVALID_DATA = 0x40;
        const PEC_FAULT = 0x20;
    }
}

// ============================================================================
// Fault Classes
// ============================================================================

/// The fault classes in STATUS_WORD that have a per-domain detail register.
///
/// Ordered by summary-bit position, most significant first; fault decoding
/// walks them in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    OutputVoltage,
    OutputCurrent,
    Input,
    Temperature,
    Communication,
}

impl FaultClass {
    pub const ALL: [FaultClass; 5] = [
        FaultClass::OutputVoltage,
        FaultClass::OutputCurrent,
        FaultClass::Input,
        FaultClass::Temperature,
        FaultClass::Communication,
    ];

    /// The class bit in STATUS_WORD that gates the detail read
    pub fn summary_bit(self) -> StatusWord {
        match self {
            Self::OutputVoltage => StatusWord::VOUT_OV,
            Self::OutputCurrent => StatusWord::IOUT_OC,
            Self::Input => StatusWord::VIN_UV,
            Self::Temperature => StatusWord::TEMPERATURE,
            Self::Communication => StatusWord::CML,
        }
    }

    /// The detail status register for this class
    pub fn detail_command(self) -> PmbusCommand {
        match self {
            Self::OutputVoltage => PmbusCommand::StatusVout,
            Self::OutputCurrent => PmbusCommand::StatusIout,
            Self::Input => PmbusCommand::StatusInput,
            Self::Temperature => PmbusCommand::StatusTemperature,
            Self::Communication => PmbusCommand::StatusCml,
        }
    }

    /// Summary diagnostic line for the class bit itself
    pub fn summary_label(self) -> &'static str {
        match self {
            Self::OutputVoltage => "Output Overvoltage",
            Self::OutputCurrent => "Output Overcurrent",
            Self::Input => "Input Undervoltage",
            Self::Temperature => "Temperature Fault",
            Self::Communication => "Communication Fault (CML)",
        }
    }

    /// Decode this class's detail register byte into diagnostic lines
    pub fn decode_detail(self, raw: u8) -> Vec<&'static str> {
        match self {
            Self::OutputVoltage => StatusDecoder::decode_status_vout(raw),
            Self::OutputCurrent => StatusDecoder::decode_status_iout(raw),
            Self::Input => StatusDecoder::decode_status_input(raw),
            Self::Temperature => StatusDecoder::decode_status_temperature(raw),
            Self::Communication => StatusDecoder::decode_status_cml(raw),
        }
    }
}

// ============================================================================
// Status Decoder
// ============================================================================

/// Macro to generate status decoder methods
macro_rules! decode_status_flags {
    ($flags:expr => {
        $($flag:expr => $desc:literal),* $(,)?
    }) => {{
        let mut desc = Vec::new();
        $(if $flags.contains($flag) { desc.push($desc); })*
        desc
    }};
}

/// Pure decoders from raw status register values to diagnostic line text.
///
/// These never touch the bus; the driver reads the registers and feeds the
/// raw values through here before logging.
pub struct StatusDecoder;

impl StatusDecoder {
    /// Decode STATUS_WORD fault-class bits, most significant first
    pub fn decode_faults(status: u16) -> Vec<&'static str> {
        let flags = StatusWord::from_bits_truncate(status);
        let mut desc = Vec::new();
        if flags.contains(StatusWord::BUSY) {
            desc.push(fault_label::BUSY);
        }
        if flags.contains(StatusWord::OFF) {
            desc.push(fault_label::OFF);
        }
        for class in FaultClass::ALL {
            if flags.contains(class.summary_bit()) {
                desc.push(class.summary_label());
            }
        }
        if flags.contains(StatusWord::UNKNOWN) {
            desc.push(fault_label::UNKNOWN);
        }
        desc
    }

    /// Decode STATUS_WORD warning bits (the high byte)
    pub fn decode_warnings(status: u16) -> Vec<&'static str> {
        let flags = StatusWord::from_bits_truncate(status);
        decode_status_flags!(flags => {
            StatusWord::VOUT_WARN => "Output Voltage Issue",
            StatusWord::IOUT_POUT_WARN => "Output Current or Power Issue",
            StatusWord::INPUT_WARN => "Input Voltage or Power Issue",
            StatusWord::MFR_WARN => "Manufacturer-Specific Issue",
            StatusWord::PGOOD_LOST => "Power Good Signal Lost",
            StatusWord::FAN_WARN => "Fan or Airflow Issue",
            StatusWord::OTHER_WARN => "Other Status Warning",
        })
    }

    pub fn decode_status_vout(status: u8) -> Vec<&'static str> {
        let flags = StatusVout::from_bits_truncate(status);
        decode_status_flags!(flags => {
            StatusVout::OV_FAULT => "Output Overvoltage Fault",
            StatusVout::OV_WARN => "Output Overvoltage Warning",
            StatusVout::UV_WARN => "Output Undervoltage Warning",
            StatusVout::UV_FAULT => "Output Undervoltage Fault",
        })
    }

    pub fn decode_status_iout(status: u8) -> Vec<&'static str> {
        let flags = StatusIout::from_bits_truncate(status);
        decode_status_flags!(flags => {
            StatusIout::OC_FAULT => "Output Overcurrent Fault",
            StatusIout::CC_FAULT => "Critical Constant Current Mode Fault",
            StatusIout::OC_WARN => "Output Overcurrent Warning",
        })
    }

    pub fn decode_status_input(status: u8) -> Vec<&'static str> {
        let flags = StatusInput::from_bits_truncate(status);
        decode_status_flags!(flags => {
            StatusInput::OV_FAULT => "Input Overvoltage Fault",
            StatusInput::OV_WARN => "Input Overvoltage Warning",
            StatusInput::UV_WARN => "Input Undervoltage Warning",
            StatusInput::UV_FAULT => "Input Undervoltage Fault",
        })
    }

    pub fn decode_status_temperature(status: u8) -> Vec<&'static str> {
        let flags = StatusTemperature::from_bits_truncate(status);
        decode_status_flags!(flags => {
            StatusTemperature::OT_FAULT => "Overtemperature Fault",
            StatusTemperature::OT_WARN => "Overtemperature Warning",
        })
    }

    pub fn decode_status_cml(status: u8) -> Vec<&'static str> {
        let flags = StatusCml::from_bits_truncate(status);
        decode_status_flags!(flags => {
            StatusCml::INVALID_CMD => "Invalid Command Received",
            StatusCml::INVALID_DATA => "Invalid Data Received",
            StatusCml::PEC_FAULT => "Packet Error Check Failed",
        })
    }

    /// Decode the CAPABILITY (0x19) register
    pub fn decode_capability(value: u8) -> Vec<&'static str> {
        let mut flags = Vec::new();

        if value & 0x80 != 0 {
            flags.push("PEC supported");
        }
        if value & 0x40 != 0 {
            flags.push("400kHz max");
        } else {
            flags.push("100kHz max");
        }
        if value & 0x20 != 0 {
            flags.push("SMBALERT supported");
        }

        flags
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum PmbusError {
    #[error("Command 0x{0:02x} not supported")]
    CommandNotSupported(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_datasheet() {
        assert_eq!(PmbusCommand::Page.as_u8(), 0x00);
        assert_eq!(PmbusCommand::Operation.as_u8(), 0x01);
        assert_eq!(PmbusCommand::ClearFaults.as_u8(), 0x03);
        assert_eq!(PmbusCommand::StatusWord.as_u8(), 0x79);
        assert_eq!(PmbusCommand::ReadVout.as_u8(), 0x8B);
        assert_eq!(PmbusCommand::ReadIout.as_u8(), 0x8C);
        assert_eq!(PmbusCommand::ReadTemperature1.as_u8(), 0x8D);
        assert_eq!(PmbusCommand::ReadTemperature2.as_u8(), 0x8E);
        assert_eq!(PmbusCommand::ReadTemperature3.as_u8(), 0x8F);
        assert_eq!(PmbusCommand::PmbusRevision.as_u8(), 0x98);
        assert_eq!(PmbusCommand::MfrVinMin.as_u8(), 0xA0);
        assert_eq!(PmbusCommand::MfrTambientMin.as_u8(), 0xA9);
    }

    #[test]
    fn command_round_trip() {
        let cmd = PmbusCommand::try_from(0x8Bu8).unwrap();
        assert_eq!(cmd, PmbusCommand::ReadVout);
        assert_eq!(cmd.name(), "READ_VOUT");
        assert_eq!(u8::from(cmd), 0x8B);
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(PmbusCommand::try_from(0x05u8).is_err());
        assert!(PmbusCommand::try_from(0xFFu8).is_err());
    }

    #[test]
    fn decode_faults_orders_msb_first() {
        let lines = StatusDecoder::decode_faults(0x00E4);
        assert_eq!(
            lines,
            vec!["Device Busy", "Power Output Off", "Output Overvoltage", "Temperature Fault"]
        );
    }

    #[test]
    fn decode_faults_uses_the_class_label_table() {
        for class in FaultClass::ALL {
            let lines = StatusDecoder::decode_faults(class.summary_bit().bits());
            assert_eq!(lines, vec![class.summary_label()]);
        }
        assert_eq!(StatusDecoder::decode_faults(0x0080), vec![fault_label::BUSY]);
        assert_eq!(StatusDecoder::decode_faults(0x0040), vec![fault_label::OFF]);
        assert_eq!(StatusDecoder::decode_faults(0x0001), vec![fault_label::UNKNOWN]);
    }

    #[test]
    fn decode_faults_ignores_warning_byte() {
        assert!(StatusDecoder::decode_faults(0x8000).is_empty());
        assert_eq!(StatusDecoder::decode_warnings(0x8000), vec!["Output Voltage Issue"]);
    }

    #[test]
    fn decode_status_vout_single_bit() {
        assert_eq!(
            StatusDecoder::decode_status_vout(0x80),
            vec!["Output Overvoltage Fault"]
        );
        // UV warning sits at 0x10 on this device, not the standard 0x20
        assert_eq!(
            StatusDecoder::decode_status_vout(0x10),
            vec!["Output Undervoltage Warning"]
        );
    }

    #[test]
    fn decode_status_iout_all_bits() {
        assert_eq!(
            StatusDecoder::decode_status_iout(0xE0),
            vec![
                "Output Overcurrent Fault",
                "Critical Constant Current Mode Fault",
                "Output Overcurrent Warning"
            ]
        );
    }

    #[test]
    fn decode_status_cml() {
        assert_eq!(
            StatusDecoder::decode_status_cml(0x20),
            vec!["Packet Error Check Failed"]
        );
        assert!(StatusDecoder::decode_status_cml(0x00).is_empty());
    }

    #[test]
    fn fault_class_tables() {
        assert_eq!(
            FaultClass::OutputVoltage.detail_command(),
            PmbusCommand::StatusVout
        );
        assert_eq!(FaultClass::Communication.detail_command(), PmbusCommand::StatusCml);
        assert_eq!(FaultClass::OutputVoltage.summary_bit(), StatusWord::VOUT_OV);

        // Walk order is summary-bit position, most significant first
        let bits: Vec<u16> = FaultClass::ALL.iter().map(|c| c.summary_bit().bits()).collect();
        let mut sorted = bits.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(bits, sorted);
    }

    #[test]
    fn capability_decode() {
        let flags = StatusDecoder::decode_capability(0xA0);
        assert!(flags.contains(&"PEC supported"));
        assert!(flags.contains(&"100kHz max"));
        assert!(flags.contains(&"SMBALERT supported"));
    }
}
