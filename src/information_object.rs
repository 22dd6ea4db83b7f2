//! Information-object codec: the 40+ standardized IEC 60870-5 IO types.
//!
//! Each variant encodes/parses its fixed-size payload per the sizing table
//! in `TypeId::payload_len`, which is the single authority for every offset
//! computed by the ASDU codec (`crate::asdu`) for sequence-addressed ASDUs.

use crate::common::{IecError, IecResult, MeasuredQuality, ProtectionQuality, QualityDescriptor};
use crate::time::{BinaryCounterReading, Cp16Time2a, Cp56Time2a, NormalizedValue};

/// Standardized IEC 60870-5-101/104 type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeId {
    MSpNa1 = 1,
    MSpTa1 = 2,
    MDpNa1 = 3,
    MDpTa1 = 4,
    MStNa1 = 5,
    MStTa1 = 6,
    MBoNa1 = 7,
    MBoTa1 = 8,
    MMeNa1 = 9,
    MMeTa1 = 10,
    MMeNb1 = 11,
    MMeTb1 = 12,
    MMeNc1 = 13,
    MMeTc1 = 14,
    MItNa1 = 15,
    MItTa1 = 16,
    MEpTa1 = 17,
    MEpTb1 = 18,
    MEpTc1 = 19,
    MPsNa1 = 20,
    MMeNd1 = 21,
    MSpTb1 = 30,
    MDpTb1 = 31,
    MStTb1 = 32,
    MBoTb1 = 33,
    MMeTd1 = 34,
    MMeTe1 = 35,
    MMeTf1 = 36,
    MItTb1 = 37,
    MEpTd1 = 38,
    MEpTe1 = 39,
    MEpTf1 = 40,
    CScNa1 = 45,
    CDcNa1 = 46,
    CRcNa1 = 47,
    CSeNa1 = 48,
    CSeNb1 = 49,
    CSeNc1 = 50,
    CBoNa1 = 51,
    MEiNa1 = 70,
    CScTa1 = 58,
    CDcTa1 = 59,
    CRcTa1 = 60,
    CSeTa1 = 61,
    CSeTb1 = 62,
    CSeTc1 = 63,
    CBoTa1 = 64,
    CIcNa1 = 100,
    CCiNa1 = 101,
    CRdNa1 = 102,
    CCsNa1 = 103,
    CTsNa1 = 104,
    CRpNa1 = 105,
    CCdNa1 = 106,
    CTsTa1 = 107,
    PMeNa1 = 110,
    PMeNb1 = 111,
    PMeNc1 = 112,
    PAcNa1 = 113,
    /// File ready directive. Payload decode is a documented Non-goal; see
    /// `InformationObject::Raw`.
    FFrNa1 = 120,
    FSrNa1 = 121,
    FScNa1 = 122,
    FLsNa1 = 123,
    FAfNa1 = 124,
    FSgNa1 = 125,
    FDrTa1 = 126,
    FScNb1 = 127,
}

impl TypeId {
    pub fn from_u8(value: u8) -> IecResult<Self> {
        use TypeId::*;
        Ok(match value {
            1 => MSpNa1,
            2 => MSpTa1,
            3 => MDpNa1,
            4 => MDpTa1,
            5 => MStNa1,
            6 => MStTa1,
            7 => MBoNa1,
            8 => MBoTa1,
            9 => MMeNa1,
            10 => MMeTa1,
            11 => MMeNb1,
            12 => MMeTb1,
            13 => MMeNc1,
            14 => MMeTc1,
            15 => MItNa1,
            16 => MItTa1,
            17 => MEpTa1,
            18 => MEpTb1,
            19 => MEpTc1,
            20 => MPsNa1,
            21 => MMeNd1,
            30 => MSpTb1,
            31 => MDpTb1,
            32 => MStTb1,
            33 => MBoTb1,
            34 => MMeTd1,
            35 => MMeTe1,
            36 => MMeTf1,
            37 => MItTb1,
            38 => MEpTd1,
            39 => MEpTe1,
            40 => MEpTf1,
            45 => CScNa1,
            46 => CDcNa1,
            47 => CRcNa1,
            48 => CSeNa1,
            49 => CSeNb1,
            50 => CSeNc1,
            51 => CBoNa1,
            58 => CScTa1,
            59 => CDcTa1,
            60 => CRcTa1,
            61 => CSeTa1,
            62 => CSeTb1,
            63 => CSeTc1,
            64 => CBoTa1,
            70 => MEiNa1,
            100 => CIcNa1,
            101 => CCiNa1,
            102 => CRdNa1,
            103 => CCsNa1,
            104 => CTsNa1,
            105 => CRpNa1,
            106 => CCdNa1,
            107 => CTsTa1,
            110 => PMeNa1,
            111 => PMeNb1,
            112 => PMeNc1,
            113 => PAcNa1,
            120 => FFrNa1,
            121 => FSrNa1,
            122 => FScNa1,
            123 => FLsNa1,
            124 => FAfNa1,
            125 => FSgNa1,
            126 => FDrTa1,
            127 => FScNb1,
            other => {
                return Err(IecError::ProtocolError(format!(
                    "unknown ASDU type identifier: {other}"
                )))
            }
        })
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Payload size in bytes, excluding the IOA, per spec.md §4.B's sizing
    /// table. This is the single authority every offset computation (in the
    /// ASDU codec's `get_element`) derives from.
    pub const fn payload_len(self) -> usize {
        use TypeId::*;
        match self {
            MSpNa1 => 1,
            MSpTa1 => 4,
            MDpNa1 => 1,
            MDpTa1 => 4,
            MStNa1 => 2,
            MStTa1 => 5,
            MBoNa1 => 5,
            MBoTa1 => 8,
            MMeNa1 => 3,
            MMeTa1 => 6,
            MMeNb1 => 3,
            MMeTb1 => 6,
            MMeNc1 => 5,
            MMeTc1 => 8,
            MItNa1 => 5,
            MItTa1 => 8,
            MEpTa1 => 6,
            MEpTb1 => 7,
            MEpTc1 => 7,
            MPsNa1 => 5,
            MMeNd1 => 2,
            MSpTb1 => 8,
            MDpTb1 => 8,
            MStTb1 => 9,
            MBoTb1 => 12,
            MMeTd1 => 10,
            MMeTe1 => 10,
            MMeTf1 => 12,
            MItTb1 => 12,
            MEpTd1 => 10,
            MEpTe1 => 11,
            MEpTf1 => 11,
            CScNa1 => 1,
            CDcNa1 => 1,
            CRcNa1 => 1,
            CSeNa1 => 3,
            CSeNb1 => 3,
            CSeNc1 => 5,
            CBoNa1 => 4,
            CScTa1 => 1 + 7,
            CDcTa1 => 1 + 7,
            CRcTa1 => 1 + 7,
            CSeTa1 => 3 + 7,
            CSeTb1 => 3 + 7,
            CSeTc1 => 5 + 7,
            CBoTa1 => 4 + 7,
            MEiNa1 => 1,
            CIcNa1 => 1,
            CCiNa1 => 1,
            CRdNa1 => 0,
            CCsNa1 => 7,
            CTsNa1 => 2,
            CRpNa1 => 1,
            CCdNa1 => 2,
            CTsTa1 => 9,
            PMeNa1 => 3,
            PMeNb1 => 3,
            PMeNc1 => 5,
            PAcNa1 => 1,
            // File-transfer payloads are not decoded (Non-goal); these
            // lengths are unused by the codec (`InformationObject::Raw`
            // carries whatever bytes remain) but are named for completeness
            // of the type-id space.
            FFrNa1 | FSrNa1 | FScNa1 | FLsNa1 | FAfNa1 | FSgNa1 | FDrTa1 | FScNb1 => 0,
        }
    }

    /// True for the F_* file-transfer directive family, whose payload this
    /// crate carries opaquely via `InformationObject::Raw` rather than a
    /// typed decode (spec.md §1 Non-goals).
    pub const fn is_file_transfer(self) -> bool {
        matches!(
            self,
            TypeId::FFrNa1
                | TypeId::FSrNa1
                | TypeId::FScNa1
                | TypeId::FLsNa1
                | TypeId::FAfNa1
                | TypeId::FSgNa1
                | TypeId::FDrTa1
                | TypeId::FScNb1
        )
    }
}

/// Double-point value per spec.md §4.B: 0 and 3 are both "indeterminate".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoublePointValue {
    Intermediate = 0,
    Off = 1,
    On = 2,
    Indeterminate = 3,
}

impl DoublePointValue {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Intermediate,
            1 => Self::Off,
            2 => Self::On,
            _ => Self::Indeterminate,
        }
    }

    pub const fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Regulating step command value (C_RC_NA_1): 1 = lower, 2 = higher; 0/3
/// are "not permitted" per the standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommandValue {
    NotPermitted0 = 0,
    Lower = 1,
    Higher = 2,
    NotPermitted3 = 3,
}

impl StepCommandValue {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::NotPermitted0,
            1 => Self::Lower,
            2 => Self::Higher,
            _ => Self::NotPermitted3,
        }
    }

    pub const fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Qualifier of interrogation (QOI): 20 = station interrogation, 21-36 =
/// interrogated group 1-16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifierOfInterrogation(pub u8);

impl QualifierOfInterrogation {
    pub const STATION: Self = Self(20);

    pub const fn group(n: u8) -> Self {
        Self(20 + n)
    }
}

/// Qualifier of counter interrogation request (QCC): low 6 bits = request
/// group (0 = general, 1-4 = group 1-4), high 2 bits = freeze/reset code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifierOfCounterInterrogation {
    pub request: u8,
    pub freeze: u8,
}

impl QualifierOfCounterInterrogation {
    pub const fn from_byte(value: u8) -> Self {
        Self {
            request: value & 0x3f,
            freeze: (value & 0xc0) >> 6,
        }
    }

    pub const fn to_byte(self) -> u8 {
        (self.request & 0x3f) | ((self.freeze & 0x03) << 6)
    }
}

/// Command qualifier (SCO/DCQ/RCO select bit + QU), shared by single,
/// double and regulating-step commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifierOfCommand {
    pub qu: u8,
    pub select: bool,
}

impl QualifierOfCommand {
    pub const fn from_byte(value: u8) -> Self {
        Self {
            qu: (value & 0x7c) >> 2,
            select: (value & 0x80) != 0,
        }
    }

    pub const fn to_byte(self) -> u8 {
        ((self.qu & 0x1f) << 2) | if self.select { 0x80 } else { 0 }
    }
}

fn encode_ioa(ioa: u32, size: usize, out: &mut Vec<u8>) {
    let bytes = ioa.to_le_bytes();
    out.extend_from_slice(&bytes[..size]);
}

fn parse_ioa(buf: &[u8], size: usize) -> IecResult<u32> {
    if buf.len() < size {
        return Err(IecError::FrameTooShort {
            expected: size,
            actual: buf.len(),
        });
    }
    let mut bytes = [0u8; 4];
    bytes[..size].copy_from_slice(&buf[..size]);
    Ok(u32::from_le_bytes(bytes))
}

macro_rules! io_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            pub ioa: u32,
            $(pub $field: $ty,)*
        }
    };
}

io_struct!(SinglePointInfo { value: bool, quality: QualityDescriptor });
io_struct!(SinglePointWithCp24Info { value: bool, quality: QualityDescriptor, time: crate::time::Cp24Time2a });
io_struct!(SinglePointWithCp56Info { value: bool, quality: QualityDescriptor, time: Cp56Time2a });

io_struct!(DoublePointInfo { value: DoublePointValue, quality: QualityDescriptor });
io_struct!(DoublePointWithCp24Info { value: DoublePointValue, quality: QualityDescriptor, time: crate::time::Cp24Time2a });
io_struct!(DoublePointWithCp56Info { value: DoublePointValue, quality: QualityDescriptor, time: Cp56Time2a });

io_struct!(StepPositionInfo { value: i8, transient: bool, quality: MeasuredQuality });
io_struct!(StepPositionWithCp24Info { value: i8, transient: bool, quality: MeasuredQuality, time: crate::time::Cp24Time2a });
io_struct!(StepPositionWithCp56Info { value: i8, transient: bool, quality: MeasuredQuality, time: Cp56Time2a });

io_struct!(Bitstring32Info { value: u32, quality: MeasuredQuality });
io_struct!(Bitstring32WithCp24Info { value: u32, quality: MeasuredQuality, time: crate::time::Cp24Time2a });
io_struct!(Bitstring32WithCp56Info { value: u32, quality: MeasuredQuality, time: Cp56Time2a });

io_struct!(MeasuredNormalizedInfo { value: NormalizedValue, quality: MeasuredQuality });
io_struct!(MeasuredNormalizedWithCp24Info { value: NormalizedValue, quality: MeasuredQuality, time: crate::time::Cp24Time2a });
io_struct!(MeasuredNormalizedWithCp56Info { value: NormalizedValue, quality: MeasuredQuality, time: Cp56Time2a });
io_struct!(MeasuredNormalizedWithoutQualityInfo { value: NormalizedValue });

io_struct!(MeasuredScaledInfo { value: i16, quality: MeasuredQuality });
io_struct!(MeasuredScaledWithCp24Info { value: i16, quality: MeasuredQuality, time: crate::time::Cp24Time2a });
io_struct!(MeasuredScaledWithCp56Info { value: i16, quality: MeasuredQuality, time: Cp56Time2a });

io_struct!(MeasuredShortFloatInfo { value: f32, quality: MeasuredQuality });
io_struct!(MeasuredShortFloatWithCp24Info { value: f32, quality: MeasuredQuality, time: crate::time::Cp24Time2a });
io_struct!(MeasuredShortFloatWithCp56Info { value: f32, quality: MeasuredQuality, time: Cp56Time2a });

io_struct!(IntegratedTotalsInfo { value: BinaryCounterReading });
io_struct!(IntegratedTotalsWithCp24Info { value: BinaryCounterReading, time: crate::time::Cp24Time2a });
io_struct!(IntegratedTotalsWithCp56Info { value: BinaryCounterReading, time: Cp56Time2a });

io_struct!(EventOfProtectionInfo { event: u8, quality: ProtectionQuality, elapsed: Cp16Time2a, time: crate::time::Cp24Time2a });
io_struct!(EventOfProtectionWithCp56Info { event: u8, quality: ProtectionQuality, elapsed: Cp16Time2a, time: Cp56Time2a });

io_struct!(PackedStartEventsInfo { events: u8, quality: ProtectionQuality, elapsed: Cp16Time2a, time: crate::time::Cp24Time2a });
io_struct!(PackedStartEventsWithCp56Info { events: u8, quality: ProtectionQuality, elapsed: Cp16Time2a, time: Cp56Time2a });

io_struct!(PackedOutputCircuitInfo { oci: u8, quality: ProtectionQuality, elapsed: Cp16Time2a, time: crate::time::Cp24Time2a });
io_struct!(PackedOutputCircuitWithCp56Info { oci: u8, quality: ProtectionQuality, elapsed: Cp16Time2a, time: Cp56Time2a });

io_struct!(PackedSinglePointWithScdInfo { status: u16, changed: u16, quality: QualityDescriptor });

io_struct!(EndOfInitializationInfo { coi: u8 });

io_struct!(SingleCommandInfo { value: bool, qualifier: QualifierOfCommand });
io_struct!(SingleCommandWithCp56Info { value: bool, qualifier: QualifierOfCommand, time: Cp56Time2a });

io_struct!(DoubleCommandInfo { value: DoublePointValue, qualifier: QualifierOfCommand });
io_struct!(DoubleCommandWithCp56Info { value: DoublePointValue, qualifier: QualifierOfCommand, time: Cp56Time2a });

io_struct!(StepCommandInfo { value: StepCommandValue, qualifier: QualifierOfCommand });
io_struct!(StepCommandWithCp56Info { value: StepCommandValue, qualifier: QualifierOfCommand, time: Cp56Time2a });

io_struct!(SetpointNormalizedInfo { value: NormalizedValue, select: bool, ql: u8 });
io_struct!(SetpointNormalizedWithCp56Info { value: NormalizedValue, select: bool, ql: u8, time: Cp56Time2a });

io_struct!(SetpointScaledInfo { value: i16, select: bool, ql: u8 });
io_struct!(SetpointScaledWithCp56Info { value: i16, select: bool, ql: u8, time: Cp56Time2a });

io_struct!(SetpointShortFloatInfo { value: f32, select: bool, ql: u8 });
io_struct!(SetpointShortFloatWithCp56Info { value: f32, select: bool, ql: u8, time: Cp56Time2a });

io_struct!(Bitstring32CommandInfo { value: u32 });
io_struct!(Bitstring32CommandWithCp56Info { value: u32, time: Cp56Time2a });

io_struct!(InterrogationCommandInfo { qoi: QualifierOfInterrogation });
io_struct!(CounterInterrogationCommandInfo { qcc: QualifierOfCounterInterrogation });
io_struct!(ReadCommandInfo {});
io_struct!(ClockSyncCommandInfo { time: Cp56Time2a });
io_struct!(TestCommandInfo { fbp: u16 });
io_struct!(ResetProcessCommandInfo { qrp: u8 });
io_struct!(DelayAcquisitionCommandInfo { delay: Cp16Time2a });
io_struct!(TestCommandWithCp56Info { fbp: u16, time: Cp56Time2a });

io_struct!(ParameterMeasuredNormalizedInfo { value: NormalizedValue, qpm: u8 });
io_struct!(ParameterMeasuredScaledInfo { value: i16, qpm: u8 });
io_struct!(ParameterMeasuredShortFloatInfo { value: f32, qpm: u8 });
io_struct!(ParameterActivationInfo { qpa: u8 });

/// File-transfer directives (type IDs 120-127): payload decode is a
/// documented Non-goal, so the bytes are carried opaquely.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInfo {
    pub ioa: u32,
    pub type_id: TypeId,
    pub bytes: Vec<u8>,
}

/// A parsed or to-be-encoded information object, tagged by its IEC type.
#[derive(Debug, Clone, PartialEq)]
pub enum InformationObject {
    SinglePoint(SinglePointInfo),
    SinglePointWithCp24(SinglePointWithCp24Info),
    SinglePointWithCp56(SinglePointWithCp56Info),
    DoublePoint(DoublePointInfo),
    DoublePointWithCp24(DoublePointWithCp24Info),
    DoublePointWithCp56(DoublePointWithCp56Info),
    StepPosition(StepPositionInfo),
    StepPositionWithCp24(StepPositionWithCp24Info),
    StepPositionWithCp56(StepPositionWithCp56Info),
    Bitstring32(Bitstring32Info),
    Bitstring32WithCp24(Bitstring32WithCp24Info),
    Bitstring32WithCp56(Bitstring32WithCp56Info),
    MeasuredNormalized(MeasuredNormalizedInfo),
    MeasuredNormalizedWithCp24(MeasuredNormalizedWithCp24Info),
    MeasuredNormalizedWithCp56(MeasuredNormalizedWithCp56Info),
    MeasuredNormalizedWithoutQuality(MeasuredNormalizedWithoutQualityInfo),
    MeasuredScaled(MeasuredScaledInfo),
    MeasuredScaledWithCp24(MeasuredScaledWithCp24Info),
    MeasuredScaledWithCp56(MeasuredScaledWithCp56Info),
    MeasuredShortFloat(MeasuredShortFloatInfo),
    MeasuredShortFloatWithCp24(MeasuredShortFloatWithCp24Info),
    MeasuredShortFloatWithCp56(MeasuredShortFloatWithCp56Info),
    IntegratedTotals(IntegratedTotalsInfo),
    IntegratedTotalsWithCp24(IntegratedTotalsWithCp24Info),
    IntegratedTotalsWithCp56(IntegratedTotalsWithCp56Info),
    EventOfProtection(EventOfProtectionInfo),
    EventOfProtectionWithCp56(EventOfProtectionWithCp56Info),
    PackedStartEvents(PackedStartEventsInfo),
    PackedStartEventsWithCp56(PackedStartEventsWithCp56Info),
    PackedOutputCircuit(PackedOutputCircuitInfo),
    PackedOutputCircuitWithCp56(PackedOutputCircuitWithCp56Info),
    PackedSinglePointWithScd(PackedSinglePointWithScdInfo),
    EndOfInitialization(EndOfInitializationInfo),
    SingleCommand(SingleCommandInfo),
    SingleCommandWithCp56(SingleCommandWithCp56Info),
    DoubleCommand(DoubleCommandInfo),
    DoubleCommandWithCp56(DoubleCommandWithCp56Info),
    StepCommand(StepCommandInfo),
    StepCommandWithCp56(StepCommandWithCp56Info),
    SetpointNormalized(SetpointNormalizedInfo),
    SetpointNormalizedWithCp56(SetpointNormalizedWithCp56Info),
    SetpointScaled(SetpointScaledInfo),
    SetpointScaledWithCp56(SetpointScaledWithCp56Info),
    SetpointShortFloat(SetpointShortFloatInfo),
    SetpointShortFloatWithCp56(SetpointShortFloatWithCp56Info),
    Bitstring32Command(Bitstring32CommandInfo),
    Bitstring32CommandWithCp56(Bitstring32CommandWithCp56Info),
    InterrogationCommand(InterrogationCommandInfo),
    CounterInterrogationCommand(CounterInterrogationCommandInfo),
    ReadCommand(ReadCommandInfo),
    ClockSyncCommand(ClockSyncCommandInfo),
    TestCommand(TestCommandInfo),
    ResetProcessCommand(ResetProcessCommandInfo),
    DelayAcquisitionCommand(DelayAcquisitionCommandInfo),
    TestCommandWithCp56(TestCommandWithCp56Info),
    ParameterMeasuredNormalized(ParameterMeasuredNormalizedInfo),
    ParameterMeasuredScaled(ParameterMeasuredScaledInfo),
    ParameterMeasuredShortFloat(ParameterMeasuredShortFloatInfo),
    ParameterActivation(ParameterActivationInfo),
    Raw(RawInfo),
}

impl InformationObject {
    pub fn type_id(&self) -> TypeId {
        use InformationObject::*;
        match self {
            SinglePoint(_) => TypeId::MSpNa1,
            SinglePointWithCp24(_) => TypeId::MSpTa1,
            SinglePointWithCp56(_) => TypeId::MSpTb1,
            DoublePoint(_) => TypeId::MDpNa1,
            DoublePointWithCp24(_) => TypeId::MDpTa1,
            DoublePointWithCp56(_) => TypeId::MDpTb1,
            StepPosition(_) => TypeId::MStNa1,
            StepPositionWithCp24(_) => TypeId::MStTa1,
            StepPositionWithCp56(_) => TypeId::MStTb1,
            Bitstring32(_) => TypeId::MBoNa1,
            Bitstring32WithCp24(_) => TypeId::MBoTa1,
            Bitstring32WithCp56(_) => TypeId::MBoTb1,
            MeasuredNormalized(_) => TypeId::MMeNa1,
            MeasuredNormalizedWithCp24(_) => TypeId::MMeTa1,
            MeasuredNormalizedWithCp56(_) => TypeId::MMeTd1,
            MeasuredNormalizedWithoutQuality(_) => TypeId::MMeNd1,
            MeasuredScaled(_) => TypeId::MMeNb1,
            MeasuredScaledWithCp24(_) => TypeId::MMeTb1,
            MeasuredScaledWithCp56(_) => TypeId::MMeTe1,
            MeasuredShortFloat(_) => TypeId::MMeNc1,
            MeasuredShortFloatWithCp24(_) => TypeId::MMeTc1,
            MeasuredShortFloatWithCp56(_) => TypeId::MMeTf1,
            IntegratedTotals(_) => TypeId::MItNa1,
            IntegratedTotalsWithCp24(_) => TypeId::MItTa1,
            IntegratedTotalsWithCp56(_) => TypeId::MItTb1,
            EventOfProtection(_) => TypeId::MEpTa1,
            EventOfProtectionWithCp56(_) => TypeId::MEpTd1,
            PackedStartEvents(_) => TypeId::MEpTb1,
            PackedStartEventsWithCp56(_) => TypeId::MEpTe1,
            PackedOutputCircuit(_) => TypeId::MEpTc1,
            PackedOutputCircuitWithCp56(_) => TypeId::MEpTf1,
            PackedSinglePointWithScd(_) => TypeId::MPsNa1,
            EndOfInitialization(_) => TypeId::MEiNa1,
            SingleCommand(_) => TypeId::CScNa1,
            SingleCommandWithCp56(_) => TypeId::CScTa1,
            DoubleCommand(_) => TypeId::CDcNa1,
            DoubleCommandWithCp56(_) => TypeId::CDcTa1,
            StepCommand(_) => TypeId::CRcNa1,
            StepCommandWithCp56(_) => TypeId::CRcTa1,
            SetpointNormalized(_) => TypeId::CSeNa1,
            SetpointNormalizedWithCp56(_) => TypeId::CSeTa1,
            SetpointScaled(_) => TypeId::CSeNb1,
            SetpointScaledWithCp56(_) => TypeId::CSeTb1,
            SetpointShortFloat(_) => TypeId::CSeNc1,
            SetpointShortFloatWithCp56(_) => TypeId::CSeTc1,
            Bitstring32Command(_) => TypeId::CBoNa1,
            Bitstring32CommandWithCp56(_) => TypeId::CBoTa1,
            InterrogationCommand(_) => TypeId::CIcNa1,
            CounterInterrogationCommand(_) => TypeId::CCiNa1,
            ReadCommand(_) => TypeId::CRdNa1,
            ClockSyncCommand(_) => TypeId::CCsNa1,
            TestCommand(_) => TypeId::CTsNa1,
            ResetProcessCommand(_) => TypeId::CRpNa1,
            DelayAcquisitionCommand(_) => TypeId::CCdNa1,
            TestCommandWithCp56(_) => TypeId::CTsTa1,
            ParameterMeasuredNormalized(_) => TypeId::PMeNa1,
            ParameterMeasuredScaled(_) => TypeId::PMeNb1,
            ParameterMeasuredShortFloat(_) => TypeId::PMeNc1,
            ParameterActivation(_) => TypeId::PAcNa1,
            Raw(r) => r.type_id,
        }
    }

    pub fn ioa(&self) -> u32 {
        use InformationObject::*;
        match self {
            SinglePoint(i) => i.ioa,
            SinglePointWithCp24(i) => i.ioa,
            SinglePointWithCp56(i) => i.ioa,
            DoublePoint(i) => i.ioa,
            DoublePointWithCp24(i) => i.ioa,
            DoublePointWithCp56(i) => i.ioa,
            StepPosition(i) => i.ioa,
            StepPositionWithCp24(i) => i.ioa,
            StepPositionWithCp56(i) => i.ioa,
            Bitstring32(i) => i.ioa,
            Bitstring32WithCp24(i) => i.ioa,
            Bitstring32WithCp56(i) => i.ioa,
            MeasuredNormalized(i) => i.ioa,
            MeasuredNormalizedWithCp24(i) => i.ioa,
            MeasuredNormalizedWithCp56(i) => i.ioa,
            MeasuredNormalizedWithoutQuality(i) => i.ioa,
            MeasuredScaled(i) => i.ioa,
            MeasuredScaledWithCp24(i) => i.ioa,
            MeasuredScaledWithCp56(i) => i.ioa,
            MeasuredShortFloat(i) => i.ioa,
            MeasuredShortFloatWithCp24(i) => i.ioa,
            MeasuredShortFloatWithCp56(i) => i.ioa,
            IntegratedTotals(i) => i.ioa,
            IntegratedTotalsWithCp24(i) => i.ioa,
            IntegratedTotalsWithCp56(i) => i.ioa,
            EventOfProtection(i) => i.ioa,
            EventOfProtectionWithCp56(i) => i.ioa,
            PackedStartEvents(i) => i.ioa,
            PackedStartEventsWithCp56(i) => i.ioa,
            PackedOutputCircuit(i) => i.ioa,
            PackedOutputCircuitWithCp56(i) => i.ioa,
            PackedSinglePointWithScd(i) => i.ioa,
            EndOfInitialization(i) => i.ioa,
            SingleCommand(i) => i.ioa,
            SingleCommandWithCp56(i) => i.ioa,
            DoubleCommand(i) => i.ioa,
            DoubleCommandWithCp56(i) => i.ioa,
            StepCommand(i) => i.ioa,
            StepCommandWithCp56(i) => i.ioa,
            SetpointNormalized(i) => i.ioa,
            SetpointNormalizedWithCp56(i) => i.ioa,
            SetpointScaled(i) => i.ioa,
            SetpointScaledWithCp56(i) => i.ioa,
            SetpointShortFloat(i) => i.ioa,
            SetpointShortFloatWithCp56(i) => i.ioa,
            Bitstring32Command(i) => i.ioa,
            Bitstring32CommandWithCp56(i) => i.ioa,
            InterrogationCommand(i) => i.ioa,
            CounterInterrogationCommand(i) => i.ioa,
            ReadCommand(i) => i.ioa,
            ClockSyncCommand(i) => i.ioa,
            TestCommand(i) => i.ioa,
            ResetProcessCommand(i) => i.ioa,
            DelayAcquisitionCommand(i) => i.ioa,
            TestCommandWithCp56(i) => i.ioa,
            ParameterMeasuredNormalized(i) => i.ioa,
            ParameterMeasuredScaled(i) => i.ioa,
            ParameterMeasuredShortFloat(i) => i.ioa,
            ParameterActivation(i) => i.ioa,
            Raw(i) => i.ioa,
        }
    }

    fn set_ioa(&mut self, ioa: u32) {
        use InformationObject::*;
        match self {
            SinglePoint(i) => i.ioa = ioa,
            SinglePointWithCp24(i) => i.ioa = ioa,
            SinglePointWithCp56(i) => i.ioa = ioa,
            DoublePoint(i) => i.ioa = ioa,
            DoublePointWithCp24(i) => i.ioa = ioa,
            DoublePointWithCp56(i) => i.ioa = ioa,
            StepPosition(i) => i.ioa = ioa,
            StepPositionWithCp24(i) => i.ioa = ioa,
            StepPositionWithCp56(i) => i.ioa = ioa,
            Bitstring32(i) => i.ioa = ioa,
            Bitstring32WithCp24(i) => i.ioa = ioa,
            Bitstring32WithCp56(i) => i.ioa = ioa,
            MeasuredNormalized(i) => i.ioa = ioa,
            MeasuredNormalizedWithCp24(i) => i.ioa = ioa,
            MeasuredNormalizedWithCp56(i) => i.ioa = ioa,
            MeasuredNormalizedWithoutQuality(i) => i.ioa = ioa,
            MeasuredScaled(i) => i.ioa = ioa,
            MeasuredScaledWithCp24(i) => i.ioa = ioa,
            MeasuredScaledWithCp56(i) => i.ioa = ioa,
            MeasuredShortFloat(i) => i.ioa = ioa,
            MeasuredShortFloatWithCp24(i) => i.ioa = ioa,
            MeasuredShortFloatWithCp56(i) => i.ioa = ioa,
            IntegratedTotals(i) => i.ioa = ioa,
            IntegratedTotalsWithCp24(i) => i.ioa = ioa,
            IntegratedTotalsWithCp56(i) => i.ioa = ioa,
            EventOfProtection(i) => i.ioa = ioa,
            EventOfProtectionWithCp56(i) => i.ioa = ioa,
            PackedStartEvents(i) => i.ioa = ioa,
            PackedStartEventsWithCp56(i) => i.ioa = ioa,
            PackedOutputCircuit(i) => i.ioa = ioa,
            PackedOutputCircuitWithCp56(i) => i.ioa = ioa,
            PackedSinglePointWithScd(i) => i.ioa = ioa,
            EndOfInitialization(i) => i.ioa = ioa,
            SingleCommand(i) => i.ioa = ioa,
            SingleCommandWithCp56(i) => i.ioa = ioa,
            DoubleCommand(i) => i.ioa = ioa,
            DoubleCommandWithCp56(i) => i.ioa = ioa,
            StepCommand(i) => i.ioa = ioa,
            StepCommandWithCp56(i) => i.ioa = ioa,
            SetpointNormalized(i) => i.ioa = ioa,
            SetpointNormalizedWithCp56(i) => i.ioa = ioa,
            SetpointScaled(i) => i.ioa = ioa,
            SetpointScaledWithCp56(i) => i.ioa = ioa,
            SetpointShortFloat(i) => i.ioa = ioa,
            SetpointShortFloatWithCp56(i) => i.ioa = ioa,
            Bitstring32Command(i) => i.ioa = ioa,
            Bitstring32CommandWithCp56(i) => i.ioa = ioa,
            InterrogationCommand(i) => i.ioa = ioa,
            CounterInterrogationCommand(i) => i.ioa = ioa,
            ReadCommand(i) => i.ioa = ioa,
            ClockSyncCommand(i) => i.ioa = ioa,
            TestCommand(i) => i.ioa = ioa,
            ResetProcessCommand(i) => i.ioa = ioa,
            DelayAcquisitionCommand(i) => i.ioa = ioa,
            TestCommandWithCp56(i) => i.ioa = ioa,
            ParameterMeasuredNormalized(i) => i.ioa = ioa,
            ParameterMeasuredScaled(i) => i.ioa = ioa,
            ParameterMeasuredShortFloat(i) => i.ioa = ioa,
            ParameterActivation(i) => i.ioa = ioa,
            Raw(i) => i.ioa = ioa,
        }
    }

    /// Write IOA (only when `is_sequence` is false) then the type-specific
    /// payload. Returns false if the frame doesn't have room left.
    pub fn encode(&self, frame: &mut Vec<u8>, ioa_size: usize, is_sequence: bool) -> bool {
        let needed = self.type_id().payload_len() + if is_sequence { 0 } else { ioa_size };
        // The caller is expected to have already checked overall ASDU
        // capacity; here we only guard against an obviously undersized ioa
        // encoding (file-transfer payloads carry their own length).
        let _ = needed;

        if !is_sequence {
            encode_ioa(self.ioa(), ioa_size, frame);
        }

        use InformationObject::*;
        match self {
            SinglePoint(i) => {
                frame.push((i.value as u8) | (i.quality.to_byte() & 0xf0));
            }
            SinglePointWithCp24(i) => {
                frame.push((i.value as u8) | (i.quality.to_byte() & 0xf0));
                i.time.encode(frame);
            }
            SinglePointWithCp56(i) => {
                frame.push((i.value as u8) | (i.quality.to_byte() & 0xf0));
                i.time.encode(frame);
            }
            DoublePoint(i) => {
                frame.push(i.value.to_bits() | (i.quality.to_byte() & 0xf0));
            }
            DoublePointWithCp24(i) => {
                frame.push(i.value.to_bits() | (i.quality.to_byte() & 0xf0));
                i.time.encode(frame);
            }
            DoublePointWithCp56(i) => {
                frame.push(i.value.to_bits() | (i.quality.to_byte() & 0xf0));
                i.time.encode(frame);
            }
            StepPosition(i) => {
                frame.push(encode_step_position(i.value, i.transient));
                frame.push(i.quality.to_byte());
            }
            StepPositionWithCp24(i) => {
                frame.push(encode_step_position(i.value, i.transient));
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            StepPositionWithCp56(i) => {
                frame.push(encode_step_position(i.value, i.transient));
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            Bitstring32(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
            }
            Bitstring32WithCp24(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            Bitstring32WithCp56(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            MeasuredNormalized(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
                frame.push(i.quality.to_byte());
            }
            MeasuredNormalizedWithCp24(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            MeasuredNormalizedWithCp56(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            MeasuredNormalizedWithoutQuality(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
            }
            MeasuredScaled(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
            }
            MeasuredScaledWithCp24(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            MeasuredScaledWithCp56(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            MeasuredShortFloat(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
            }
            MeasuredShortFloatWithCp24(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            MeasuredShortFloatWithCp56(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.quality.to_byte());
                i.time.encode(frame);
            }
            IntegratedTotals(i) => {
                i.value.encode(frame);
            }
            IntegratedTotalsWithCp24(i) => {
                i.value.encode(frame);
                i.time.encode(frame);
            }
            IntegratedTotalsWithCp56(i) => {
                i.value.encode(frame);
                i.time.encode(frame);
            }
            EventOfProtection(i) => {
                frame.push((i.event & 0x03) | (i.quality.to_byte() & !0x03));
                i.elapsed.encode(frame);
                i.time.encode(frame);
            }
            EventOfProtectionWithCp56(i) => {
                frame.push((i.event & 0x03) | (i.quality.to_byte() & !0x03));
                i.elapsed.encode(frame);
                i.time.encode(frame);
            }
            PackedStartEvents(i) => {
                frame.push(i.events);
                frame.push(i.quality.to_byte());
                i.elapsed.encode(frame);
                i.time.encode(frame);
            }
            PackedStartEventsWithCp56(i) => {
                frame.push(i.events);
                frame.push(i.quality.to_byte());
                i.elapsed.encode(frame);
                i.time.encode(frame);
            }
            PackedOutputCircuit(i) => {
                frame.push(i.oci);
                frame.push(i.quality.to_byte());
                i.elapsed.encode(frame);
                i.time.encode(frame);
            }
            PackedOutputCircuitWithCp56(i) => {
                frame.push(i.oci);
                frame.push(i.quality.to_byte());
                i.elapsed.encode(frame);
                i.time.encode(frame);
            }
            PackedSinglePointWithScd(i) => {
                frame.extend_from_slice(&i.status.to_le_bytes());
                frame.extend_from_slice(&i.changed.to_le_bytes());
                frame.push(i.quality.to_byte());
            }
            EndOfInitialization(i) => {
                frame.push(i.coi);
            }
            SingleCommand(i) => {
                frame.push((i.value as u8) | i.qualifier.to_byte());
            }
            SingleCommandWithCp56(i) => {
                frame.push((i.value as u8) | i.qualifier.to_byte());
                i.time.encode(frame);
            }
            DoubleCommand(i) => {
                frame.push(i.value.to_bits() | i.qualifier.to_byte());
            }
            DoubleCommandWithCp56(i) => {
                frame.push(i.value.to_bits() | i.qualifier.to_byte());
                i.time.encode(frame);
            }
            StepCommand(i) => {
                frame.push(i.value.to_bits() | i.qualifier.to_byte());
            }
            StepCommandWithCp56(i) => {
                frame.push(i.value.to_bits() | i.qualifier.to_byte());
                i.time.encode(frame);
            }
            SetpointNormalized(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
                frame.push(encode_qos(i.ql, i.select));
            }
            SetpointNormalizedWithCp56(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
                frame.push(encode_qos(i.ql, i.select));
                i.time.encode(frame);
            }
            SetpointScaled(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(encode_qos(i.ql, i.select));
            }
            SetpointScaledWithCp56(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(encode_qos(i.ql, i.select));
                i.time.encode(frame);
            }
            SetpointShortFloat(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(encode_qos(i.ql, i.select));
            }
            SetpointShortFloatWithCp56(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(encode_qos(i.ql, i.select));
                i.time.encode(frame);
            }
            Bitstring32Command(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
            }
            Bitstring32CommandWithCp56(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                i.time.encode(frame);
            }
            InterrogationCommand(i) => {
                frame.push(i.qoi.0);
            }
            CounterInterrogationCommand(i) => {
                frame.push(i.qcc.to_byte());
            }
            ReadCommand(_) => {}
            ClockSyncCommand(i) => {
                i.time.encode(frame);
            }
            TestCommand(i) => {
                frame.extend_from_slice(&i.fbp.to_le_bytes());
            }
            ResetProcessCommand(i) => {
                frame.push(i.qrp);
            }
            DelayAcquisitionCommand(i) => {
                i.delay.encode(frame);
            }
            TestCommandWithCp56(i) => {
                frame.extend_from_slice(&i.fbp.to_le_bytes());
                i.time.encode(frame);
            }
            ParameterMeasuredNormalized(i) => {
                frame.extend_from_slice(&i.value.raw().to_le_bytes());
                frame.push(i.qpm);
            }
            ParameterMeasuredScaled(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.qpm);
            }
            ParameterMeasuredShortFloat(i) => {
                frame.extend_from_slice(&i.value.to_le_bytes());
                frame.push(i.qpm);
            }
            ParameterActivation(i) => {
                frame.push(i.qpa);
            }
            Raw(i) => {
                frame.extend_from_slice(&i.bytes);
            }
        }
        true
    }

    /// Parse one information object of `type_id` from `buf` (positioned
    /// right at the IOA, or at the payload if `is_sequence`). When
    /// `is_sequence` is true, `supplied_ioa` is used instead of reading one
    /// from the buffer.
    pub fn parse(
        type_id: TypeId,
        buf: &[u8],
        ioa_size: usize,
        is_sequence: bool,
        supplied_ioa: u32,
    ) -> IecResult<(Self, usize)> {
        let mut offset = 0usize;
        let ioa = if is_sequence {
            supplied_ioa
        } else {
            let v = parse_ioa(buf, ioa_size)?;
            offset += ioa_size;
            v
        };

        macro_rules! need {
            ($n:expr) => {
                if buf.len() < offset + $n {
                    return Err(IecError::FrameTooShort {
                        expected: offset + $n,
                        actual: buf.len(),
                    });
                }
            };
        }

        let mut io = match type_id {
            TypeId::MSpNa1 => {
                need!(1);
                let byte = buf[offset];
                offset += 1;
                InformationObject::SinglePoint(SinglePointInfo {
                    ioa,
                    value: (byte & 0x01) != 0,
                    quality: QualityDescriptor::from_byte(byte),
                })
            }
            TypeId::MSpTa1 => {
                need!(4);
                let byte = buf[offset];
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 1..offset + 4])?;
                offset += 4;
                InformationObject::SinglePointWithCp24(SinglePointWithCp24Info {
                    ioa,
                    value: (byte & 0x01) != 0,
                    quality: QualityDescriptor::from_byte(byte),
                    time,
                })
            }
            TypeId::MSpTb1 => {
                need!(8);
                let byte = buf[offset];
                let time = Cp56Time2a::from_buffer(&buf[offset + 1..offset + 8])?;
                offset += 8;
                InformationObject::SinglePointWithCp56(SinglePointWithCp56Info {
                    ioa,
                    value: (byte & 0x01) != 0,
                    quality: QualityDescriptor::from_byte(byte),
                    time,
                })
            }
            TypeId::MDpNa1 => {
                need!(1);
                let byte = buf[offset];
                offset += 1;
                InformationObject::DoublePoint(DoublePointInfo {
                    ioa,
                    value: DoublePointValue::from_bits(byte),
                    quality: QualityDescriptor::from_byte(byte),
                })
            }
            TypeId::MDpTa1 => {
                need!(4);
                let byte = buf[offset];
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 1..offset + 4])?;
                offset += 4;
                InformationObject::DoublePointWithCp24(DoublePointWithCp24Info {
                    ioa,
                    value: DoublePointValue::from_bits(byte),
                    quality: QualityDescriptor::from_byte(byte),
                    time,
                })
            }
            TypeId::MDpTb1 => {
                need!(8);
                let byte = buf[offset];
                let time = Cp56Time2a::from_buffer(&buf[offset + 1..offset + 8])?;
                offset += 8;
                InformationObject::DoublePointWithCp56(DoublePointWithCp56Info {
                    ioa,
                    value: DoublePointValue::from_bits(byte),
                    quality: QualityDescriptor::from_byte(byte),
                    time,
                })
            }
            TypeId::MStNa1 => {
                need!(2);
                let (value, transient) = decode_step_position(buf[offset]);
                let quality = MeasuredQuality::from_byte(buf[offset + 1]);
                offset += 2;
                InformationObject::StepPosition(StepPositionInfo {
                    ioa,
                    value,
                    transient,
                    quality,
                })
            }
            TypeId::MStTa1 => {
                need!(5);
                let (value, transient) = decode_step_position(buf[offset]);
                let quality = MeasuredQuality::from_byte(buf[offset + 1]);
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 2..offset + 5])?;
                offset += 5;
                InformationObject::StepPositionWithCp24(StepPositionWithCp24Info {
                    ioa,
                    value,
                    transient,
                    quality,
                    time,
                })
            }
            TypeId::MStTb1 => {
                need!(9);
                let (value, transient) = decode_step_position(buf[offset]);
                let quality = MeasuredQuality::from_byte(buf[offset + 1]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 2..offset + 9])?;
                offset += 9;
                InformationObject::StepPositionWithCp56(StepPositionWithCp56Info {
                    ioa,
                    value,
                    transient,
                    quality,
                    time,
                })
            }
            TypeId::MBoNa1 => {
                need!(5);
                let value = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
                let quality = MeasuredQuality::from_byte(buf[offset + 4]);
                offset += 5;
                InformationObject::Bitstring32(Bitstring32Info { ioa, value, quality })
            }
            TypeId::MBoTa1 => {
                need!(8);
                let value = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
                let quality = MeasuredQuality::from_byte(buf[offset + 4]);
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 5..offset + 8])?;
                offset += 8;
                InformationObject::Bitstring32WithCp24(Bitstring32WithCp24Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MBoTb1 => {
                need!(12);
                let value = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
                let quality = MeasuredQuality::from_byte(buf[offset + 4]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 5..offset + 12])?;
                offset += 12;
                InformationObject::Bitstring32WithCp56(Bitstring32WithCp56Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MMeNa1 => {
                need!(3);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                let quality = MeasuredQuality::from_byte(buf[offset + 2]);
                offset += 3;
                InformationObject::MeasuredNormalized(MeasuredNormalizedInfo { ioa, value, quality })
            }
            TypeId::MMeTa1 => {
                need!(6);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                let quality = MeasuredQuality::from_byte(buf[offset + 2]);
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 3..offset + 6])?;
                offset += 6;
                InformationObject::MeasuredNormalizedWithCp24(MeasuredNormalizedWithCp24Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MMeTd1 => {
                need!(10);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                let quality = MeasuredQuality::from_byte(buf[offset + 2]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 3..offset + 10])?;
                offset += 10;
                InformationObject::MeasuredNormalizedWithCp56(MeasuredNormalizedWithCp56Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MMeNd1 => {
                need!(2);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                offset += 2;
                InformationObject::MeasuredNormalizedWithoutQuality(
                    MeasuredNormalizedWithoutQualityInfo { ioa, value },
                )
            }
            TypeId::MMeNb1 => {
                need!(3);
                let value = i16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let quality = MeasuredQuality::from_byte(buf[offset + 2]);
                offset += 3;
                InformationObject::MeasuredScaled(MeasuredScaledInfo { ioa, value, quality })
            }
            TypeId::MMeTb1 => {
                need!(6);
                let value = i16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let quality = MeasuredQuality::from_byte(buf[offset + 2]);
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 3..offset + 6])?;
                offset += 6;
                InformationObject::MeasuredScaledWithCp24(MeasuredScaledWithCp24Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MMeTe1 => {
                need!(10);
                let value = i16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let quality = MeasuredQuality::from_byte(buf[offset + 2]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 3..offset + 10])?;
                offset += 10;
                InformationObject::MeasuredScaledWithCp56(MeasuredScaledWithCp56Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MMeNc1 => {
                need!(5);
                let value = f32_from_le(&buf[offset..offset + 4]);
                let quality = MeasuredQuality::from_byte(buf[offset + 4]);
                offset += 5;
                InformationObject::MeasuredShortFloat(MeasuredShortFloatInfo { ioa, value, quality })
            }
            TypeId::MMeTc1 => {
                need!(8);
                let value = f32_from_le(&buf[offset..offset + 4]);
                let quality = MeasuredQuality::from_byte(buf[offset + 4]);
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 5..offset + 8])?;
                offset += 8;
                InformationObject::MeasuredShortFloatWithCp24(MeasuredShortFloatWithCp24Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MMeTf1 => {
                need!(12);
                let value = f32_from_le(&buf[offset..offset + 4]);
                let quality = MeasuredQuality::from_byte(buf[offset + 4]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 5..offset + 12])?;
                offset += 12;
                InformationObject::MeasuredShortFloatWithCp56(MeasuredShortFloatWithCp56Info {
                    ioa,
                    value,
                    quality,
                    time,
                })
            }
            TypeId::MItNa1 => {
                need!(5);
                let value = BinaryCounterReading::from_buffer(&buf[offset..offset + 5])?;
                offset += 5;
                InformationObject::IntegratedTotals(IntegratedTotalsInfo { ioa, value })
            }
            TypeId::MItTa1 => {
                need!(8);
                let value = BinaryCounterReading::from_buffer(&buf[offset..offset + 5])?;
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 5..offset + 8])?;
                offset += 8;
                InformationObject::IntegratedTotalsWithCp24(IntegratedTotalsWithCp24Info {
                    ioa,
                    value,
                    time,
                })
            }
            TypeId::MItTb1 => {
                need!(12);
                let value = BinaryCounterReading::from_buffer(&buf[offset..offset + 5])?;
                let time = Cp56Time2a::from_buffer(&buf[offset + 5..offset + 12])?;
                offset += 12;
                InformationObject::IntegratedTotalsWithCp56(IntegratedTotalsWithCp56Info {
                    ioa,
                    value,
                    time,
                })
            }
            TypeId::MEpTa1 => {
                need!(6);
                let byte = buf[offset];
                let elapsed = Cp16Time2a::from_buffer(&buf[offset + 1..offset + 3])?;
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 3..offset + 6])?;
                offset += 6;
                InformationObject::EventOfProtection(EventOfProtectionInfo {
                    ioa,
                    event: byte & 0x03,
                    quality: ProtectionQuality::from_byte(byte),
                    elapsed,
                    time,
                })
            }
            TypeId::MEpTd1 => {
                need!(10);
                let byte = buf[offset];
                let elapsed = Cp16Time2a::from_buffer(&buf[offset + 1..offset + 3])?;
                let time = Cp56Time2a::from_buffer(&buf[offset + 3..offset + 10])?;
                offset += 10;
                InformationObject::EventOfProtectionWithCp56(EventOfProtectionWithCp56Info {
                    ioa,
                    event: byte & 0x03,
                    quality: ProtectionQuality::from_byte(byte),
                    elapsed,
                    time,
                })
            }
            TypeId::MEpTb1 => {
                need!(7);
                let events = buf[offset];
                let quality = ProtectionQuality::from_byte(buf[offset + 1]);
                let elapsed = Cp16Time2a::from_buffer(&buf[offset + 2..offset + 4])?;
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 4..offset + 7])?;
                offset += 7;
                InformationObject::PackedStartEvents(PackedStartEventsInfo {
                    ioa,
                    events,
                    quality,
                    elapsed,
                    time,
                })
            }
            TypeId::MEpTe1 => {
                need!(11);
                let events = buf[offset];
                let quality = ProtectionQuality::from_byte(buf[offset + 1]);
                let elapsed = Cp16Time2a::from_buffer(&buf[offset + 2..offset + 4])?;
                let time = Cp56Time2a::from_buffer(&buf[offset + 4..offset + 11])?;
                offset += 11;
                InformationObject::PackedStartEventsWithCp56(PackedStartEventsWithCp56Info {
                    ioa,
                    events,
                    quality,
                    elapsed,
                    time,
                })
            }
            TypeId::MEpTc1 => {
                need!(7);
                let oci = buf[offset];
                let quality = ProtectionQuality::from_byte(buf[offset + 1]);
                let elapsed = Cp16Time2a::from_buffer(&buf[offset + 2..offset + 4])?;
                let time = crate::time::Cp24Time2a::from_buffer(&buf[offset + 4..offset + 7])?;
                offset += 7;
                InformationObject::PackedOutputCircuit(PackedOutputCircuitInfo {
                    ioa,
                    oci,
                    quality,
                    elapsed,
                    time,
                })
            }
            TypeId::MEpTf1 => {
                need!(11);
                let oci = buf[offset];
                let quality = ProtectionQuality::from_byte(buf[offset + 1]);
                let elapsed = Cp16Time2a::from_buffer(&buf[offset + 2..offset + 4])?;
                let time = Cp56Time2a::from_buffer(&buf[offset + 4..offset + 11])?;
                offset += 11;
                InformationObject::PackedOutputCircuitWithCp56(PackedOutputCircuitWithCp56Info {
                    ioa,
                    oci,
                    quality,
                    elapsed,
                    time,
                })
            }
            TypeId::MPsNa1 => {
                need!(5);
                let status = u16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let changed = u16::from_le_bytes([buf[offset + 2], buf[offset + 3]]);
                let quality = QualityDescriptor::from_byte(buf[offset + 4]);
                offset += 5;
                InformationObject::PackedSinglePointWithScd(PackedSinglePointWithScdInfo {
                    ioa,
                    status,
                    changed,
                    quality,
                })
            }
            TypeId::MEiNa1 => {
                need!(1);
                let coi = buf[offset];
                offset += 1;
                InformationObject::EndOfInitialization(EndOfInitializationInfo { ioa, coi })
            }
            TypeId::CScNa1 => {
                need!(1);
                let byte = buf[offset];
                offset += 1;
                InformationObject::SingleCommand(SingleCommandInfo {
                    ioa,
                    value: (byte & 0x01) != 0,
                    qualifier: QualifierOfCommand::from_byte(byte),
                })
            }
            TypeId::CScTa1 => {
                need!(8);
                let byte = buf[offset];
                let time = Cp56Time2a::from_buffer(&buf[offset + 1..offset + 8])?;
                offset += 8;
                InformationObject::SingleCommandWithCp56(SingleCommandWithCp56Info {
                    ioa,
                    value: (byte & 0x01) != 0,
                    qualifier: QualifierOfCommand::from_byte(byte),
                    time,
                })
            }
            TypeId::CDcNa1 => {
                need!(1);
                let byte = buf[offset];
                offset += 1;
                InformationObject::DoubleCommand(DoubleCommandInfo {
                    ioa,
                    value: DoublePointValue::from_bits(byte),
                    qualifier: QualifierOfCommand::from_byte(byte),
                })
            }
            TypeId::CDcTa1 => {
                need!(8);
                let byte = buf[offset];
                let time = Cp56Time2a::from_buffer(&buf[offset + 1..offset + 8])?;
                offset += 8;
                InformationObject::DoubleCommandWithCp56(DoubleCommandWithCp56Info {
                    ioa,
                    value: DoublePointValue::from_bits(byte),
                    qualifier: QualifierOfCommand::from_byte(byte),
                    time,
                })
            }
            TypeId::CRcNa1 => {
                need!(1);
                let byte = buf[offset];
                offset += 1;
                InformationObject::StepCommand(StepCommandInfo {
                    ioa,
                    value: StepCommandValue::from_bits(byte),
                    qualifier: QualifierOfCommand::from_byte(byte),
                })
            }
            TypeId::CRcTa1 => {
                need!(8);
                let byte = buf[offset];
                let time = Cp56Time2a::from_buffer(&buf[offset + 1..offset + 8])?;
                offset += 8;
                InformationObject::StepCommandWithCp56(StepCommandWithCp56Info {
                    ioa,
                    value: StepCommandValue::from_bits(byte),
                    qualifier: QualifierOfCommand::from_byte(byte),
                    time,
                })
            }
            TypeId::CSeNa1 => {
                need!(3);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                let (ql, select) = decode_qos(buf[offset + 2]);
                offset += 3;
                InformationObject::SetpointNormalized(SetpointNormalizedInfo { ioa, value, select, ql })
            }
            TypeId::CSeTa1 => {
                need!(10);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                let (ql, select) = decode_qos(buf[offset + 2]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 3..offset + 10])?;
                offset += 10;
                InformationObject::SetpointNormalizedWithCp56(SetpointNormalizedWithCp56Info {
                    ioa,
                    value,
                    select,
                    ql,
                    time,
                })
            }
            TypeId::CSeNb1 => {
                need!(3);
                let value = i16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let (ql, select) = decode_qos(buf[offset + 2]);
                offset += 3;
                InformationObject::SetpointScaled(SetpointScaledInfo { ioa, value, select, ql })
            }
            TypeId::CSeTb1 => {
                need!(10);
                let value = i16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let (ql, select) = decode_qos(buf[offset + 2]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 3..offset + 10])?;
                offset += 10;
                InformationObject::SetpointScaledWithCp56(SetpointScaledWithCp56Info {
                    ioa,
                    value,
                    select,
                    ql,
                    time,
                })
            }
            TypeId::CSeNc1 => {
                need!(5);
                let value = f32_from_le(&buf[offset..offset + 4]);
                let (ql, select) = decode_qos(buf[offset + 4]);
                offset += 5;
                InformationObject::SetpointShortFloat(SetpointShortFloatInfo { ioa, value, select, ql })
            }
            TypeId::CSeTc1 => {
                need!(12);
                let value = f32_from_le(&buf[offset..offset + 4]);
                let (ql, select) = decode_qos(buf[offset + 4]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 5..offset + 12])?;
                offset += 12;
                InformationObject::SetpointShortFloatWithCp56(SetpointShortFloatWithCp56Info {
                    ioa,
                    value,
                    select,
                    ql,
                    time,
                })
            }
            TypeId::CBoNa1 => {
                need!(4);
                let value = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
                offset += 4;
                InformationObject::Bitstring32Command(Bitstring32CommandInfo { ioa, value })
            }
            TypeId::CBoTa1 => {
                need!(11);
                let value = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
                let time = Cp56Time2a::from_buffer(&buf[offset + 4..offset + 11])?;
                offset += 11;
                InformationObject::Bitstring32CommandWithCp56(Bitstring32CommandWithCp56Info {
                    ioa,
                    value,
                    time,
                })
            }
            TypeId::CIcNa1 => {
                need!(1);
                let qoi = QualifierOfInterrogation(buf[offset]);
                offset += 1;
                InformationObject::InterrogationCommand(InterrogationCommandInfo { ioa, qoi })
            }
            TypeId::CCiNa1 => {
                need!(1);
                let qcc = QualifierOfCounterInterrogation::from_byte(buf[offset]);
                offset += 1;
                InformationObject::CounterInterrogationCommand(CounterInterrogationCommandInfo {
                    ioa,
                    qcc,
                })
            }
            TypeId::CRdNa1 => InformationObject::ReadCommand(ReadCommandInfo { ioa }),
            TypeId::CCsNa1 => {
                need!(7);
                let time = Cp56Time2a::from_buffer(&buf[offset..offset + 7])?;
                offset += 7;
                InformationObject::ClockSyncCommand(ClockSyncCommandInfo { ioa, time })
            }
            TypeId::CTsNa1 => {
                need!(2);
                let fbp = u16::from_le_bytes([buf[offset], buf[offset + 1]]);
                offset += 2;
                InformationObject::TestCommand(TestCommandInfo { ioa, fbp })
            }
            TypeId::CRpNa1 => {
                need!(1);
                let qrp = buf[offset];
                offset += 1;
                InformationObject::ResetProcessCommand(ResetProcessCommandInfo { ioa, qrp })
            }
            TypeId::CCdNa1 => {
                need!(2);
                let delay = Cp16Time2a::from_buffer(&buf[offset..offset + 2])?;
                offset += 2;
                InformationObject::DelayAcquisitionCommand(DelayAcquisitionCommandInfo { ioa, delay })
            }
            TypeId::CTsTa1 => {
                need!(9);
                let fbp = u16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let time = Cp56Time2a::from_buffer(&buf[offset + 2..offset + 9])?;
                offset += 9;
                InformationObject::TestCommandWithCp56(TestCommandWithCp56Info { ioa, fbp, time })
            }
            TypeId::PMeNa1 => {
                need!(3);
                let value = NormalizedValue(i16::from_le_bytes([buf[offset], buf[offset + 1]]));
                let qpm = buf[offset + 2];
                offset += 3;
                InformationObject::ParameterMeasuredNormalized(ParameterMeasuredNormalizedInfo {
                    ioa,
                    value,
                    qpm,
                })
            }
            TypeId::PMeNb1 => {
                need!(3);
                let value = i16::from_le_bytes([buf[offset], buf[offset + 1]]);
                let qpm = buf[offset + 2];
                offset += 3;
                InformationObject::ParameterMeasuredScaled(ParameterMeasuredScaledInfo {
                    ioa,
                    value,
                    qpm,
                })
            }
            TypeId::PMeNc1 => {
                need!(5);
                let value = f32_from_le(&buf[offset..offset + 4]);
                let qpm = buf[offset + 4];
                offset += 5;
                InformationObject::ParameterMeasuredShortFloat(ParameterMeasuredShortFloatInfo {
                    ioa,
                    value,
                    qpm,
                })
            }
            TypeId::PAcNa1 => {
                need!(1);
                let qpa = buf[offset];
                offset += 1;
                InformationObject::ParameterActivation(ParameterActivationInfo { ioa, qpa })
            }
            // File-transfer directives: carry the remainder of the buffer
            // opaquely (Non-goal: no typed decode).
            TypeId::FFrNa1
            | TypeId::FSrNa1
            | TypeId::FScNa1
            | TypeId::FLsNa1
            | TypeId::FAfNa1
            | TypeId::FSgNa1
            | TypeId::FDrTa1
            | TypeId::FScNb1 => {
                let bytes = buf[offset..].to_vec();
                offset = buf.len();
                InformationObject::Raw(RawInfo { ioa, type_id, bytes })
            }
        };

        io.set_ioa(ioa);
        Ok((io, offset))
    }
}

fn f32_from_le(buf: &[u8]) -> f32 {
    // Wire is always little-endian (spec.md §4.B); from_le_bytes already
    // does the right thing on both host endiannesses.
    let bytes: [u8; 4] = buf.try_into().unwrap();
    f32::from_le_bytes(bytes)
}

fn encode_step_position(value: i8, transient: bool) -> u8 {
    let clamped = value.clamp(-64, 63);
    ((clamped as u8) & 0x7f) | if transient { 0x80 } else { 0 }
}

fn decode_step_position(byte: u8) -> (i8, bool) {
    let raw = byte & 0x7f;
    // sign-extend the 7-bit field
    let value = if raw & 0x40 != 0 {
        (raw | 0x80) as i8
    } else {
        raw as i8
    };
    (value, (byte & 0x80) != 0)
}

fn encode_qos(ql: u8, select: bool) -> u8 {
    (ql & 0x7f) | if select { 0x80 } else { 0 }
}

fn decode_qos(byte: u8) -> (u8, bool) {
    (byte & 0x7f, (byte & 0x80) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::QualityDescriptor;

    #[test]
    fn payload_len_matches_sizing_table() {
        assert_eq!(TypeId::MSpNa1.payload_len(), 1);
        assert_eq!(TypeId::MMeTf1.payload_len(), 12);
        assert_eq!(TypeId::CBoTa1.payload_len(), 11);
        assert_eq!(TypeId::CRdNa1.payload_len(), 0);
        assert_eq!(TypeId::CTsTa1.payload_len(), 9);
    }

    #[test]
    fn single_point_roundtrip() {
        let io = InformationObject::SinglePoint(SinglePointInfo {
            ioa: 5000,
            value: true,
            quality: QualityDescriptor::new(),
        });
        let mut frame = Vec::new();
        io.encode(&mut frame, 3, false);
        assert_eq!(frame.len(), 3 + 1);
        let (parsed, consumed) = InformationObject::parse(TypeId::MSpNa1, &frame, 3, false, 0).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(parsed, io);
    }

    #[test]
    fn single_point_overflow_bit_forbidden() {
        // OV (0x01 within the MeasuredQuality-style nibble) must never leak
        // into a single-point quality byte; only the high nibble 0xf0 is kept.
        let io = InformationObject::SinglePoint(SinglePointInfo {
            ioa: 1,
            value: false,
            quality: QualityDescriptor::from_byte(0xff),
        });
        let mut frame = Vec::new();
        io.encode(&mut frame, 1, false);
        assert_eq!(frame[1] & 0x0e, 0);
    }

    #[test]
    fn single_command_roundtrip_matches_spec_scenario_s3() {
        // S3: SingleCommand(ioa=5000, value=true, select=false, qu=0)
        let io = InformationObject::SingleCommand(SingleCommandInfo {
            ioa: 5000,
            value: true,
            qualifier: QualifierOfCommand { qu: 0, select: false },
        });
        let mut frame = Vec::new();
        io.encode(&mut frame, 3, false);
        assert_eq!(frame[3], 0x01);
        let (parsed, _) = InformationObject::parse(TypeId::CScNa1, &frame, 3, false, 0).unwrap();
        match parsed {
            InformationObject::SingleCommand(sc) => {
                assert_eq!(sc.ioa, 5000);
                assert!(sc.value);
                assert!(!sc.qualifier.select);
                assert_eq!(sc.qualifier.qu, 0);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn step_position_clamps_and_sign_extends() {
        let io = InformationObject::StepPosition(StepPositionInfo {
            ioa: 1,
            value: -70,
            transient: true,
            quality: MeasuredQuality::new(),
        });
        let mut frame = Vec::new();
        io.encode(&mut frame, 1, false);
        let (parsed, _) = InformationObject::parse(TypeId::MStNa1, &frame, 1, false, 0).unwrap();
        match parsed {
            InformationObject::StepPosition(sp) => {
                assert_eq!(sp.value, -64); // clamped
                assert!(sp.transient);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn sequence_addressing_uses_supplied_ioa() {
        let io = InformationObject::SinglePoint(SinglePointInfo {
            ioa: 999, // ignored on encode when is_sequence
            value: true,
            quality: QualityDescriptor::new(),
        });
        let mut frame = Vec::new();
        io.encode(&mut frame, 3, true);
        assert_eq!(frame.len(), 1);
        let (parsed, consumed) =
            InformationObject::parse(TypeId::MSpNa1, &frame, 3, true, 42).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(parsed.ioa(), 42);
    }

    #[test]
    fn measured_short_float_roundtrip() {
        let io = InformationObject::MeasuredShortFloat(MeasuredShortFloatInfo {
            ioa: 10,
            value: 3.14159,
            quality: MeasuredQuality::new(),
        });
        let mut frame = Vec::new();
        io.encode(&mut frame, 2, false);
        let (parsed, _) = InformationObject::parse(TypeId::MMeNc1, &frame, 2, false, 0).unwrap();
        match parsed {
            InformationObject::MeasuredShortFloat(m) => {
                assert!((m.value - 3.14159).abs() < 1e-6);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn file_transfer_type_carries_raw_bytes() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef];
        let mut frame = Vec::new();
        frame.extend_from_slice(&1u16.to_le_bytes()[..2]);
        frame.extend_from_slice(&bytes);
        let (parsed, consumed) = InformationObject::parse(TypeId::FFrNa1, &frame, 2, false, 0).unwrap();
        assert_eq!(consumed, frame.len());
        match parsed {
            InformationObject::Raw(r) => {
                assert_eq!(r.type_id, TypeId::FFrNa1);
                assert_eq!(r.bytes, bytes);
            }
            _ => panic!("wrong variant"),
        }
    }
}
