//! IEC 60870-5 constants and common data types shared by CS101 and CS104.
use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// IEC60870 protocol variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IecProtocolVersion {
    /// IEC 60870-5-101 (serial, FT 1.2 framing)
    Iec101,
    /// IEC 60870-5-104 (TCP, APCI framing)
    Iec104,
}

impl fmt::Display for IecProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IecProtocolVersion::Iec101 => write!(f, "IEC 60870-5-101"),
            IecProtocolVersion::Iec104 => write!(f, "IEC 60870-5-104"),
        }
    }
}

/// IEC60870 error types.
///
/// Propagation policy (see spec's error handling design): parsing errors are
/// non-fatal at the frame level - the caller drops the offending frame and
/// transitions the owning state machine. Checksum and sequence-number errors
/// are always terminal for the frame/connection they occurred on. Timeout
/// errors always close the connection.
#[derive(Error, Debug)]
pub enum IecError {
    /// Error in connection establishment or I/O.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Timeout error (t0 connect timeout, t1 ack, t2 confirm, t3 idle).
    #[error("timeout error: {0}")]
    TimeoutError(String),

    /// Generic protocol error.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A frame was shorter than its declared or minimum length.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    /// FT 1.2 checksum did not match.
    #[error("bad checksum: expected {expected:#04x}, got {actual:#04x}")]
    BadChecksum { expected: u8, actual: u8 },

    /// FT 1.2 variable frame length bytes did not match each other.
    #[error("length mismatch: L1={l1}, L2={l2}")]
    LengthMismatch { l1: u8, l2: u8 },

    /// Frame did not begin with an expected start byte.
    #[error("unexpected start byte: {0:#04x}")]
    UnexpectedStartByte(u8),

    /// FT 1.2 function code not recognized by the state machine that received it.
    #[error("unknown function code: {0:#04x}")]
    UnknownFunctionCode(u8),

    /// CS104 sequence number error: N(S) out of order, or N(R) outside the send window.
    #[error("sequence number error: {0}")]
    SequenceNumberError(String),

    /// CS104 connection handshake (STARTDT) did not complete in time.
    #[error("handshake timeout")]
    HandshakeTimeout,

    /// T3 exceeded with more than two unanswered TESTFR_ACT messages.
    #[error("idle (t3) timeout")]
    IdleTimeout,

    /// T1 exceeded for an outstanding I-frame or U-message.
    #[error("confirm (t1) timeout")]
    ConfirmTimeout,

    /// TLS certificate validation failure, surfaced for callers that layer TLS
    /// underneath this crate's connections. This crate never constructs this
    /// variant itself - TLS is an external collaborator (see spec §6).
    #[error("certificate error: {0}")]
    CertificateError(#[from] CertificateError),

    /// Data conversion error (value out of range, invalid enum discriminant, ...).
    #[error("data conversion error: {0}")]
    DataConversionError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Underlying I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client/connection not connected.
    #[error("not connected")]
    NotConnected,

    /// Data transfer (STARTDT) not yet activated.
    #[error("data transfer not started")]
    DataTransferNotStarted,
}

/// TLS certificate validation failure kinds.
///
/// Named here so callers of a `TlsLayer` can match on them; this crate does
/// not implement TLS and never constructs these values itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateError {
    #[error("certificate expired")]
    Expired,
    #[error("certificate not yet valid")]
    NotYetValid,
    #[error("certificate revoked")]
    Revoked,
    #[error("certificate not trusted")]
    NotTrusted,
    #[error("no certificate configured")]
    NotConfigured,
    #[error("bad key")]
    BadKey,
    #[error("certificate chain validation failed")]
    ValidationFailed,
}

/// Common protocol result type.
pub type IecResult<T> = Result<T, IecError>;

/// Quality descriptor flags shared by single/double-point information (SIQ/DIQ).
///
/// `overflow` (OV) is intentionally absent: it is forbidden for single- and
/// double-point information and is masked off before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityDescriptor {
    /// Blocked (BL, 0x10): value is blocked for transmission by a local lock.
    pub blocked: bool,
    /// Substituted (SB, 0x20): value has been provided by the operator.
    pub substituted: bool,
    /// Not topical (NT, 0x40): value is outdated.
    pub not_topical: bool,
    /// Invalid (IV, 0x80): value is invalid.
    pub invalid: bool,
}

impl QualityDescriptor {
    pub const fn new() -> Self {
        Self {
            blocked: false,
            substituted: false,
            not_topical: false,
            invalid: false,
        }
    }

    pub const fn invalid() -> Self {
        Self {
            blocked: false,
            substituted: false,
            not_topical: false,
            invalid: true,
        }
    }

    pub const fn from_byte(value: u8) -> Self {
        Self {
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    /// Encode to the high-nibble quality bits only; the low nibble (value bits)
    /// is the caller's responsibility.
    pub const fn to_byte(&self) -> u8 {
        let mut value = 0u8;
        if self.blocked {
            value |= 0x10;
        }
        if self.substituted {
            value |= 0x20;
        }
        if self.not_topical {
            value |= 0x40;
        }
        if self.invalid {
            value |= 0x80;
        }
        value
    }

    pub const fn is_good(&self) -> bool {
        !(self.blocked || self.substituted || self.not_topical || self.invalid)
    }
}

/// Quality descriptor for measured values (QDS): adds Overflow (OV, 0x01).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeasuredQuality {
    pub overflow: bool,
    pub blocked: bool,
    pub substituted: bool,
    pub not_topical: bool,
    pub invalid: bool,
}

impl MeasuredQuality {
    pub const fn new() -> Self {
        Self {
            overflow: false,
            blocked: false,
            substituted: false,
            not_topical: false,
            invalid: false,
        }
    }

    pub const fn invalid() -> Self {
        Self {
            overflow: false,
            blocked: false,
            substituted: false,
            not_topical: false,
            invalid: true,
        }
    }

    pub const fn from_byte(value: u8) -> Self {
        Self {
            overflow: (value & 0x01) != 0,
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    pub const fn to_byte(&self) -> u8 {
        let mut value = 0u8;
        if self.overflow {
            value |= 0x01;
        }
        if self.blocked {
            value |= 0x10;
        }
        if self.substituted {
            value |= 0x20;
        }
        if self.not_topical {
            value |= 0x40;
        }
        if self.invalid {
            value |= 0x80;
        }
        value
    }

    pub const fn is_good(&self) -> bool {
        !(self.overflow || self.blocked || self.substituted || self.not_topical || self.invalid)
    }
}

/// Quality descriptor for protection equipment (QDP): adds EI (0x08) in place
/// of overflow, and a reserved bit (0x04) that is always encoded as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtectionQuality {
    /// EI (0x08): elapsed time invalid.
    pub elapsed_time_invalid: bool,
    pub blocked: bool,
    pub substituted: bool,
    pub not_topical: bool,
    pub invalid: bool,
}

impl ProtectionQuality {
    pub const fn from_byte(value: u8) -> Self {
        Self {
            elapsed_time_invalid: (value & 0x08) != 0,
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    pub const fn to_byte(&self) -> u8 {
        let mut value = 0u8;
        if self.elapsed_time_invalid {
            value |= 0x08;
        }
        if self.blocked {
            value |= 0x10;
        }
        if self.substituted {
            value |= 0x20;
        }
        if self.not_topical {
            value |= 0x40;
        }
        if self.invalid {
            value |= 0x80;
        }
        value
    }
}

/// Cause of Transmission (COT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CauseOfTransmission {
    Periodic = 1,
    Background = 2,
    Spontaneous = 3,
    Initialized = 4,
    Request = 5,
    Activation = 6,
    ActivationConfirmation = 7,
    Deactivation = 8,
    DeactivationConfirmation = 9,
    ActivationTermination = 10,
    RemoteCommand = 11,
    LocalCommand = 12,
    FileTransfer = 13,
    Authentication = 14,
    SessionKey = 15,
    UserRoleAndAuthKey = 16,
    StationInterrogation = 20,
    Group1Interrogation = 21,
    Group2Interrogation = 22,
    Group3Interrogation = 23,
    Group4Interrogation = 24,
    Group5Interrogation = 25,
    Group6Interrogation = 26,
    Group7Interrogation = 27,
    Group8Interrogation = 28,
    Group9Interrogation = 29,
    Group10Interrogation = 30,
    Group11Interrogation = 31,
    Group12Interrogation = 32,
    Group13Interrogation = 33,
    Group14Interrogation = 34,
    Group15Interrogation = 35,
    Group16Interrogation = 36,
    GeneralCounterRequest = 37,
    Group1CounterRequest = 38,
    Group2CounterRequest = 39,
    Group3CounterRequest = 40,
    Group4CounterRequest = 41,
    UnknownTypeIdentification = 44,
    UnknownCauseOfTransmission = 45,
    UnknownCommonAddress = 46,
    UnknownInfoObjAddress = 47,
}

impl CauseOfTransmission {
    pub fn from_byte(value: u8) -> IecResult<Self> {
        Ok(match value {
            1 => Self::Periodic,
            2 => Self::Background,
            3 => Self::Spontaneous,
            4 => Self::Initialized,
            5 => Self::Request,
            6 => Self::Activation,
            7 => Self::ActivationConfirmation,
            8 => Self::Deactivation,
            9 => Self::DeactivationConfirmation,
            10 => Self::ActivationTermination,
            11 => Self::RemoteCommand,
            12 => Self::LocalCommand,
            13 => Self::FileTransfer,
            14 => Self::Authentication,
            15 => Self::SessionKey,
            16 => Self::UserRoleAndAuthKey,
            20 => Self::StationInterrogation,
            21 => Self::Group1Interrogation,
            22 => Self::Group2Interrogation,
            23 => Self::Group3Interrogation,
            24 => Self::Group4Interrogation,
            25 => Self::Group5Interrogation,
            26 => Self::Group6Interrogation,
            27 => Self::Group7Interrogation,
            28 => Self::Group8Interrogation,
            29 => Self::Group9Interrogation,
            30 => Self::Group10Interrogation,
            31 => Self::Group11Interrogation,
            32 => Self::Group12Interrogation,
            33 => Self::Group13Interrogation,
            34 => Self::Group14Interrogation,
            35 => Self::Group15Interrogation,
            36 => Self::Group16Interrogation,
            37 => Self::GeneralCounterRequest,
            38 => Self::Group1CounterRequest,
            39 => Self::Group2CounterRequest,
            40 => Self::Group3CounterRequest,
            41 => Self::Group4CounterRequest,
            44 => Self::UnknownTypeIdentification,
            45 => Self::UnknownCauseOfTransmission,
            46 => Self::UnknownCommonAddress,
            47 => Self::UnknownInfoObjAddress,
            other => {
                return Err(IecError::ProtocolError(format!(
                    "unknown cause of transmission: {other}"
                )))
            }
        })
    }

    pub const fn to_byte(&self) -> u8 {
        *self as u8
    }
}

/// Size of the common address field: 1 or 2 octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommonAddrSize {
    OneOctet,
    TwoOctets,
}

impl CommonAddrSize {
    pub const fn len(self) -> usize {
        match self {
            Self::OneOctet => 1,
            Self::TwoOctets => 2,
        }
    }

    /// The broadcast common address for this size (255 or 65535).
    pub const fn broadcast(self) -> u32 {
        match self {
            Self::OneOctet => 255,
            Self::TwoOctets => 65535,
        }
    }
}

/// Size of the information-object address field: 1, 2, or 3 octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoObjAddrSize {
    OneOctet,
    TwoOctets,
    ThreeOctets,
}

impl InfoObjAddrSize {
    pub const fn len(self) -> usize {
        match self {
            Self::OneOctet => 1,
            Self::TwoOctets => 2,
            Self::ThreeOctets => 3,
        }
    }

    pub fn try_from_len(len: usize) -> IecResult<Self> {
        match len {
            1 => Ok(Self::OneOctet),
            2 => Ok(Self::TwoOctets),
            3 => Ok(Self::ThreeOctets),
            other => Err(IecError::ConfigError(format!(
                "invalid information object address size: {other}"
            ))),
        }
    }
}

/// Size of the cause-of-transmission field: 1 octet, or 2 (COT + originator address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CotSize {
    OneOctet,
    TwoOctets,
}

impl CotSize {
    pub const fn len(self) -> usize {
        match self {
            Self::OneOctet => 1,
            Self::TwoOctets => 2,
        }
    }
}

/// Application-layer parameters, immutable for the lifetime of a session.
///
/// These four size parameters (type-id size is always 1 and VSQ size is
/// always 1, so they are not stored here) determine every byte offset in the
/// ASDU and information-object codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLayerParameters {
    pub cot_size: CotSize,
    /// Originator address used when `cot_size` is `TwoOctets` (0-255).
    pub originator_address: u8,
    pub common_addr_size: CommonAddrSize,
    pub ioa_size: InfoObjAddrSize,
    /// Maximum encoded ASDU size: <= 249 for CS104, <= 254 for CS101.
    pub max_asdu_size: usize,
}

impl Default for ApplicationLayerParameters {
    /// Defaults matching a CS104 session: 2-octet COT (with originator
    /// address), 2-octet common address, 3-octet IOA, 249-byte max ASDU.
    fn default() -> Self {
        Self {
            cot_size: CotSize::TwoOctets,
            originator_address: 0,
            common_addr_size: CommonAddrSize::TwoOctets,
            ioa_size: InfoObjAddrSize::ThreeOctets,
            max_asdu_size: 249,
        }
    }
}

impl ApplicationLayerParameters {
    /// Defaults matching a typical CS101 session: 1-octet COT, 1-octet
    /// common address, 2-octet IOA, 254-byte max ASDU.
    pub fn cs101_default() -> Self {
        Self {
            cot_size: CotSize::OneOctet,
            originator_address: 0,
            common_addr_size: CommonAddrSize::OneOctet,
            ioa_size: InfoObjAddrSize::TwoOctets,
            max_asdu_size: 254,
        }
    }

    /// Size of the fixed ASDU header: type-id (1) + VSQ (1) + COT + CA.
    pub const fn header_len(&self) -> usize {
        2 + self.cot_size.len() + self.common_addr_size.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_descriptor_roundtrip() {
        for val in [0x00u8, 0x10, 0x20, 0x40, 0x80, 0xF0] {
            let q = QualityDescriptor::from_byte(val);
            assert_eq!(q.to_byte(), val & 0xF0);
        }
    }

    #[test]
    fn quality_descriptor_is_good() {
        assert!(QualityDescriptor::new().is_good());
        assert!(!QualityDescriptor::invalid().is_good());
    }

    #[test]
    fn measured_quality_overflow_bit() {
        let q = MeasuredQuality::from_byte(0x01);
        assert!(q.overflow);
        assert_eq!(q.to_byte(), 0x01);
    }

    #[test]
    fn protection_quality_reserved_bit_not_emitted() {
        let q = ProtectionQuality::from_byte(0xFF);
        assert!(q.elapsed_time_invalid);
        // bit 0x04 (reserved) is never set on encode even if set on decode input
        assert_eq!(q.to_byte() & 0x04, 0);
    }

    #[test]
    fn cause_of_transmission_roundtrip() {
        let cot = CauseOfTransmission::from_byte(6).unwrap();
        assert_eq!(cot, CauseOfTransmission::Activation);
        assert_eq!(cot.to_byte(), 6);
    }

    #[test]
    fn cause_of_transmission_unknown_is_error() {
        assert!(CauseOfTransmission::from_byte(200).is_err());
    }

    #[test]
    fn common_addr_broadcast_values() {
        assert_eq!(CommonAddrSize::OneOctet.broadcast(), 255);
        assert_eq!(CommonAddrSize::TwoOctets.broadcast(), 65535);
    }

    #[test]
    fn application_layer_parameters_header_len() {
        let p = ApplicationLayerParameters::default();
        assert_eq!(p.header_len(), 2 + 2 + 2);
        let p101 = ApplicationLayerParameters::cs101_default();
        assert_eq!(p101.header_len(), 2 + 1 + 1);
    }
}
