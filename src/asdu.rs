//! ASDU (Application Service Data Unit) codec.
//!
//! An ASDU is a type identifier, a variable structure qualifier (VSQ), a
//! cause of transmission, a common address, and a sequence of information
//! objects. This module owns assembling/parsing that envelope; the payload
//! of each information object is `crate::information_object`'s job.

use std::fmt;

use crate::common::{
    ApplicationLayerParameters, CauseOfTransmission, CommonAddrSize, CotSize, IecError, IecResult,
};
use crate::information_object::{InformationObject, TypeId};

/// A parsed or to-be-encoded ASDU.
///
/// Parsing is a copying parse, not a zero-copy borrow: the codec runs
/// across an async read boundary where the source buffer is reused for the
/// next frame, so every information object is fully decoded (and owns its
/// fields) before `Asdu::parse` returns.
#[derive(Clone, PartialEq)]
pub struct Asdu {
    pub type_id: TypeId,
    /// Sequence addressing (SQ=1): information objects address
    /// `base_ioa, base_ioa+1, ...` and only the first carries an explicit
    /// IOA on the wire.
    pub sq: bool,
    pub cot: CauseOfTransmission,
    pub test: bool,
    pub negative: bool,
    pub originator_address: u8,
    pub common_address: u16,
    pub base_ioa: u32,
    information_objects: Vec<InformationObject>,
}

impl Asdu {
    /// An empty ASDU of the given type, ready to receive information
    /// objects via `add_information_object`.
    pub fn new(type_id: TypeId, cot: CauseOfTransmission, common_address: u16) -> Self {
        Self {
            type_id,
            sq: false,
            cot,
            test: false,
            negative: false,
            originator_address: 0,
            common_address,
            base_ioa: 0,
            information_objects: Vec::new(),
        }
    }

    pub fn information_objects(&self) -> &[InformationObject] {
        &self.information_objects
    }

    pub fn element_count(&self) -> usize {
        self.information_objects.len()
    }

    /// Append an information object. Rejects a type mismatch against the
    /// ASDU's own `type_id`, a VSQ element count overflow (max 127 per the
    /// 7-bit field), and, for sequence-addressed ASDUs, an IOA that doesn't
    /// continue the `base_ioa + index` run.
    pub fn add_information_object(&mut self, io: InformationObject) -> IecResult<()> {
        if io.type_id() != self.type_id {
            return Err(IecError::ProtocolError(format!(
                "information object type {:?} does not match ASDU type {:?}",
                io.type_id(),
                self.type_id
            )));
        }

        if self.information_objects.len() >= 127 {
            return Err(IecError::ProtocolError(
                "ASDU already holds the maximum 127 information objects".to_string(),
            ));
        }

        if self.sq {
            if self.information_objects.is_empty() {
                self.base_ioa = io.ioa();
            } else {
                let expected = self.base_ioa + self.information_objects.len() as u32;
                if io.ioa() != expected {
                    return Err(IecError::ProtocolError(format!(
                        "sequence ASDU requires contiguous IOA {expected}, got {}",
                        io.ioa()
                    )));
                }
            }
        }

        self.information_objects.push(io);
        Ok(())
    }

    /// Element `index` (0-based). For sequence ASDUs this derives the
    /// element's address as `base_ioa + index` implicitly, matching how it
    /// was parsed/encoded on the wire.
    pub fn get_element(&self, index: usize) -> Option<&InformationObject> {
        self.information_objects.get(index)
    }

    fn vsq_byte(&self) -> u8 {
        let count = self.information_objects.len() as u8;
        (count & 0x7f) | if self.sq { 0x80 } else { 0 }
    }

    fn cot_bytes(&self, params: &ApplicationLayerParameters) -> [u8; 2] {
        let mut first = self.cot.to_byte() & 0x3f;
        if self.test {
            first |= 0x80;
        }
        if self.negative {
            first |= 0x40;
        }
        [first, self.originator_address]
    }

    /// Encode the full ASDU (header + every information object) per the
    /// supplied sizing parameters.
    pub fn encode(&self, params: &ApplicationLayerParameters) -> IecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(params.max_asdu_size);
        out.push(self.type_id.to_u8());
        out.push(self.vsq_byte());

        let cot_bytes = self.cot_bytes(params);
        out.push(cot_bytes[0]);
        if params.cot_size == CotSize::TwoOctets {
            out.push(cot_bytes[1]);
        }

        let ca_bytes = self.common_address.to_le_bytes();
        match params.common_addr_size {
            CommonAddrSize::OneOctet => out.push(ca_bytes[0]),
            CommonAddrSize::TwoOctets => out.extend_from_slice(&ca_bytes),
        }

        let ioa_size = params.ioa_size.len();
        for (idx, io) in self.information_objects.iter().enumerate() {
            let is_sequence_element = self.sq && idx > 0;
            io.encode(&mut out, ioa_size, is_sequence_element);
        }

        if out.len() > params.max_asdu_size {
            return Err(IecError::ProtocolError(format!(
                "encoded ASDU ({} bytes) exceeds max_asdu_size ({})",
                out.len(),
                params.max_asdu_size
            )));
        }

        Ok(out)
    }

    /// Parse a complete ASDU from `data` using `params`' sizing.
    pub fn parse(data: &[u8], params: &ApplicationLayerParameters) -> IecResult<Self> {
        let header_len = params.header_len();
        if data.len() < header_len {
            return Err(IecError::FrameTooShort {
                expected: header_len,
                actual: data.len(),
            });
        }

        let type_id = TypeId::from_u8(data[0])?;
        let vsq = data[1];
        let sq = (vsq & 0x80) != 0;
        let count = (vsq & 0x7f) as usize;

        let mut offset = 2usize;
        let cot_first = data[offset];
        let test = (cot_first & 0x80) != 0;
        let negative = (cot_first & 0x40) != 0;
        let cot = CauseOfTransmission::from_byte(cot_first & 0x3f)?;
        offset += 1;

        let originator_address = if params.cot_size == CotSize::TwoOctets {
            let oa = data[offset];
            offset += 1;
            oa
        } else {
            0
        };

        let common_address = match params.common_addr_size {
            CommonAddrSize::OneOctet => {
                let v = data[offset] as u16;
                offset += 1;
                v
            }
            CommonAddrSize::TwoOctets => {
                let v = u16::from_le_bytes([data[offset], data[offset + 1]]);
                offset += 2;
                v
            }
        };

        let mut asdu = Self {
            type_id,
            sq,
            cot,
            test,
            negative,
            originator_address,
            common_address,
            base_ioa: 0,
            information_objects: Vec::with_capacity(count),
        };

        let ioa_size = params.ioa_size.len();
        let mut base_ioa = 0u32;
        for i in 0..count {
            let is_sequence_element = sq && i > 0;
            let supplied_ioa = if is_sequence_element { base_ioa + i as u32 } else { 0 };
            let (io, consumed) = InformationObject::parse(
                type_id,
                &data[offset..],
                ioa_size,
                is_sequence_element,
                supplied_ioa,
            )?;
            if i == 0 {
                base_ioa = io.ioa();
            }
            offset += consumed;
            asdu.information_objects.push(io);
        }
        asdu.base_ioa = base_ioa;

        Ok(asdu)
    }
}

impl fmt::Debug for Asdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asdu")
            .field("type_id", &self.type_id)
            .field("sq", &self.sq)
            .field("cot", &self.cot)
            .field("common_address", &self.common_address)
            .field("element_count", &self.information_objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::QualityDescriptor;
    use crate::information_object::{SingleCommandInfo, SinglePointInfo};

    #[test]
    fn single_element_roundtrip() {
        let params = ApplicationLayerParameters::default();
        let mut asdu = Asdu::new(TypeId::MSpNa1, CauseOfTransmission::Spontaneous, 1);
        asdu.add_information_object(InformationObject::SinglePoint(SinglePointInfo {
            ioa: 100,
            value: true,
            quality: QualityDescriptor::new(),
        }))
        .unwrap();

        let bytes = asdu.encode(&params).unwrap();
        let parsed = Asdu::parse(&bytes, &params).unwrap();
        assert_eq!(parsed.type_id, TypeId::MSpNa1);
        assert_eq!(parsed.element_count(), 1);
        assert_eq!(parsed.get_element(0).unwrap().ioa(), 100);
    }

    #[test]
    fn sequence_addressing_omits_subsequent_ioa() {
        let params = ApplicationLayerParameters::default();
        let mut asdu = Asdu::new(TypeId::MSpNa1, CauseOfTransmission::Periodic, 1);
        asdu.sq = true;
        for i in 0..5u32 {
            asdu.add_information_object(InformationObject::SinglePoint(SinglePointInfo {
                ioa: 1000 + i,
                value: i % 2 == 0,
                quality: QualityDescriptor::new(),
            }))
            .unwrap();
        }

        let bytes = asdu.encode(&params).unwrap();
        // header + 1 explicit IOA (3 bytes) + 1 byte payload each element,
        // remaining 4 elements with no IOA bytes.
        let header_len = params.header_len();
        assert_eq!(bytes.len(), header_len + 3 + 1 + 4 * 1);

        let parsed = Asdu::parse(&bytes, &params).unwrap();
        assert_eq!(parsed.element_count(), 5);
        assert_eq!(parsed.base_ioa, 1000);
        assert_eq!(parsed.get_element(4).unwrap().ioa(), 1004);
    }

    #[test]
    fn sequence_rejects_non_contiguous_ioa() {
        let mut asdu = Asdu::new(TypeId::MSpNa1, CauseOfTransmission::Periodic, 1);
        asdu.sq = true;
        asdu.add_information_object(InformationObject::SinglePoint(SinglePointInfo {
            ioa: 1000,
            value: true,
            quality: QualityDescriptor::new(),
        }))
        .unwrap();
        let err = asdu.add_information_object(InformationObject::SinglePoint(SinglePointInfo {
            ioa: 2000,
            value: true,
            quality: QualityDescriptor::new(),
        }));
        assert!(err.is_err());
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut asdu = Asdu::new(TypeId::MSpNa1, CauseOfTransmission::Spontaneous, 1);
        let err = asdu.add_information_object(InformationObject::SingleCommand(SingleCommandInfo {
            ioa: 1,
            value: true,
            qualifier: crate::information_object::QualifierOfCommand { qu: 0, select: false },
        }));
        assert!(err.is_err());
    }

    #[test]
    fn cs101_header_is_shorter_than_cs104() {
        let cs101 = ApplicationLayerParameters::cs101_default();
        let cs104 = ApplicationLayerParameters::default();
        assert!(cs101.header_len() < cs104.header_len());
    }
}
