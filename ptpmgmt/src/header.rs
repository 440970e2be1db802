//! The common 34-byte PTP header, shared by management and signaling
//! messages, following the fast-path pattern `isakmp::v2::definitions::header`
//! uses for its fixed wire structs: a `#[repr(C, packed)]` struct of
//! `zerocopy` network-endian fields.

use zerocopy::byteorder::network_endian::{I64, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::errors::{ManagementError, Result};
use crate::primitive::{Cursor, Writer};
use crate::types::PortIdentity;

/// `messageType` values relevant to this crate; the rest of the IEEE 1588
/// message-type vocabulary (Sync, Announce, …) is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// A management message.
    Management = 0xd,
    /// A signaling message.
    Signaling = 0xc,
}

impl MessageType {
    fn from_nibble(v: u8) -> Result<Self> {
        match v {
            0xd => Ok(MessageType::Management),
            0xc => Ok(MessageType::Signaling),
            _ => Err(ManagementError::InvalidHeader("unsupported messageType")),
        }
    }
}

/// `controlField` values this crate writes; readers accept any value.
pub mod control_field {
    /// Used by management messages.
    pub const MANAGEMENT: u8 = 4;
    /// Used by signaling messages.
    pub const SIGNALING: u8 = 5;
}

const VERSION_PTP: u8 = 2;

/// Fixed 34-byte wire prefix, big-endian throughout, matching
/// `isakmp::v2::definitions::header`'s `#[repr(C, packed)]` convention.
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct HeaderWire {
    transport_specific_and_message_type: u8,
    version_minor_and_major: u8,
    message_length: U16,
    domain_number: u8,
    minor_sdo_id: u8,
    flag_field: U16,
    correction_field: I64,
    message_type_specific: U32,
    source_port_identity: [u8; PortIdentity::WIRE_SIZE],
    sequence_id: U16,
    control_field: u8,
    log_message_interval: u8,
}

/// The parsed/build-able common PTP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtpHeader {
    /// Whether this is a management or signaling message.
    pub message_type: MessageTypeTag,
    /// 4-bit transportSpecific / majorSdoId.
    pub transport_specific: u8,
    /// PTP major version, always 2 for this crate.
    pub version_major: u8,
    /// PTP minor version.
    pub version_minor: u8,
    /// Exact wire byte count of the whole message.
    pub message_length: u16,
    /// domainNumber.
    pub domain_number: u8,
    /// minorSdoId, combines with transportSpecific to form the 12-bit sdoId.
    pub minor_sdo_id: u8,
    /// Raw flagField; bit 0x2 is `unicastFlag`.
    pub flag_field: u16,
    /// Scaled nanosecond correction (I5).
    pub correction_field: i64,
    /// messageTypeSpecific, reserved for profile use.
    pub message_type_specific: u32,
    /// sourcePortIdentity, the sender's identity.
    pub source_port_identity: PortIdentity,
    /// sequenceId.
    pub sequence_id: u16,
    /// controlField, `4` for management, `5` for signaling.
    pub control_field: u8,
    /// logMessageInterval.
    pub log_message_interval: i8,
}

/// Whether a parsed header belongs to a management or signaling message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTypeTag {
    /// `messageType == 0xd`.
    Management,
    /// `messageType == 0xc`.
    Signaling,
}

impl From<MessageType> for MessageTypeTag {
    fn from(m: MessageType) -> Self {
        match m {
            MessageType::Management => MessageTypeTag::Management,
            MessageType::Signaling => MessageTypeTag::Signaling,
        }
    }
}

pub(crate) const HEADER_WIRE_SIZE: usize = 34;

/// Unicast flag bit within `flagField`.
pub const FLAG_UNICAST: u16 = 0x0004;

impl PtpHeader {
    /// Builds a fresh header for the given message kind, ready to have its
    /// `message_length` patched once the body is known.
    pub(crate) fn new(
        message_type: MessageType,
        control_field: u8,
        transport_specific: u8,
        domain_number: u8,
        minor_sdo_id: u8,
        is_unicast: bool,
        source_port_identity: PortIdentity,
        sequence_id: u16,
        log_message_interval: i8,
    ) -> Self {
        let mut flag_field = 0u16;
        if is_unicast {
            flag_field |= FLAG_UNICAST;
        }
        PtpHeader {
            message_type: message_type.into(),
            transport_specific,
            version_major: VERSION_PTP,
            version_minor: 1,
            message_length: 0,
            domain_number,
            minor_sdo_id,
            flag_field,
            correction_field: 0,
            message_type_specific: 0,
            source_port_identity,
            sequence_id,
            control_field,
            log_message_interval,
        }
    }

    /// Whether the `unicastFlag` bit is set.
    pub fn is_unicast(&self) -> bool {
        self.flag_field & FLAG_UNICAST != 0
    }

    /// 12-bit sdoId combined from `transportSpecific` and `minorSdoId`.
    pub fn sdo_id(&self) -> u16 {
        ((self.transport_specific as u16) << 8) | self.minor_sdo_id as u16
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        let wire = HeaderWire {
            transport_specific_and_message_type: ((self.transport_specific & 0x0f) << 4)
                | (self.message_type_byte() & 0x0f),
            version_minor_and_major: ((self.version_minor & 0x0f) << 4) | (self.version_major & 0x0f),
            message_length: self.message_length.into(),
            domain_number: self.domain_number,
            minor_sdo_id: self.minor_sdo_id,
            flag_field: self.flag_field.into(),
            correction_field: self.correction_field.into(),
            message_type_specific: self.message_type_specific.into(),
            source_port_identity: {
                let mut pw = Writer::new();
                self.source_port_identity.build(&mut pw);
                let bytes = pw.into_bytes();
                let mut arr = [0u8; PortIdentity::WIRE_SIZE];
                arr.copy_from_slice(&bytes);
                arr
            },
            sequence_id: self.sequence_id.into(),
            control_field: self.control_field,
            log_message_interval: self.log_message_interval as u8,
        };
        w.write_bytes(wire.as_bytes());
    }

    fn message_type_byte(&self) -> u8 {
        match self.message_type {
            MessageTypeTag::Management => MessageType::Management as u8,
            MessageTypeTag::Signaling => MessageType::Signaling as u8,
        }
    }

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let bytes = c.read_bytes(HEADER_WIRE_SIZE)?;
        let wire = HeaderWire::read_from(bytes).ok_or(ManagementError::ShortBuffer)?;
        let transport_specific = wire.transport_specific_and_message_type >> 4;
        let message_type_nibble = wire.transport_specific_and_message_type & 0x0f;
        let version_major = wire.version_minor_and_major & 0x0f;
        if version_major != VERSION_PTP {
            return Err(ManagementError::InvalidHeader("versionMajor must be 2"));
        }
        let message_type = MessageType::from_nibble(message_type_nibble)?;
        let mut pc = Cursor::new(&wire.source_port_identity);
        let source_port_identity = PortIdentity::parse(&mut pc)?;
        Ok(PtpHeader {
            message_type: message_type.into(),
            transport_specific,
            version_major,
            version_minor: wire.version_minor_and_major >> 4,
            message_length: wire.message_length.into(),
            domain_number: wire.domain_number,
            minor_sdo_id: wire.minor_sdo_id,
            flag_field: wire.flag_field.into(),
            correction_field: wire.correction_field.into(),
            message_type_specific: wire.message_type_specific.into(),
            source_port_identity,
            sequence_id: wire.sequence_id.into(),
            control_field: wire.control_field,
            log_message_interval: wire.log_message_interval as i8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let h = PtpHeader::new(
            MessageType::Management,
            control_field::MANAGEMENT,
            0,
            0,
            0,
            false,
            PortIdentity::all_ones(),
            137,
            0,
        );
        let mut w = Writer::new();
        h.build(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), HEADER_WIRE_SIZE);
        let mut c = Cursor::new(&bytes);
        let parsed = PtpHeader::parse(&mut c).unwrap();
        assert_eq!(parsed.message_type, MessageTypeTag::Management);
        assert_eq!(parsed.sequence_id, 137);
        assert_eq!(parsed.source_port_identity, PortIdentity::all_ones());
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = [0u8; HEADER_WIRE_SIZE];
        bytes[0] = 0x0d;
        bytes[1] = 0x01;
        let mut c = Cursor::new(&bytes);
        assert!(matches!(
            PtpHeader::parse(&mut c),
            Err(ManagementError::InvalidHeader(_))
        ));
    }
}
