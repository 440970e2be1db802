//! Typed PTP value model: the domain types every management TLV is built
//! from. Fixed-size types are `Copy`; variable-size ones own their bytes.

use crate::errors::{ManagementError, Result};
use crate::primitive::{Cursor, Writer};

/// An IEEE EUI-64 clock identity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockIdentity(pub [u8; 8]);

impl ClockIdentity {
    /// The all-ones identity used by broadcast-style targets.
    pub const ALL_ONES: ClockIdentity = ClockIdentity([0xff; 8]);

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let b = c.read_bytes(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(ClockIdentity(arr))
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_bytes(&self.0);
    }
}

/// `{ clockIdentity, portNumber }`, 10 bytes on the wire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortIdentity {
    /// The clock's EUI-64 identity.
    pub clock_identity: ClockIdentity,
    /// Port number within the clock, 1-based.
    pub port_number: u16,
}

impl PortIdentity {
    /// Size of this type on the wire.
    pub const WIRE_SIZE: usize = 10;

    /// The identity used to address every port of a clock at once.
    pub fn all_ones() -> Self {
        PortIdentity {
            clock_identity: ClockIdentity::ALL_ONES,
            port_number: 0xffff,
        }
    }

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let clock_identity = ClockIdentity::parse(c)?;
        let port_number = c.read_u16()?;
        Ok(PortIdentity {
            clock_identity,
            port_number,
        })
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        self.clock_identity.build(w);
        w.write_u16(self.port_number);
    }
}

/// A PTP timestamp: 48-bit seconds followed by a u32 nanosecond count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Seconds since the PTP epoch, only the low 48 bits are significant.
    pub seconds: u64,
    /// Nanoseconds within the second.
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Size of this type on the wire.
    pub const WIRE_SIZE: usize = 10;

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let seconds = c.read_uint_be(6)?;
        let nanoseconds = c.read_u32()?;
        Ok(Timestamp {
            seconds,
            nanoseconds,
        })
    }

    /// Parses but rejects `nanoseconds >= 10^9`, for callers that opt into
    /// strict validation. The default `parse` accepts any value for interop.
    pub(crate) fn parse_strict(c: &mut Cursor) -> Result<Self> {
        let ts = Self::parse(c)?;
        if ts.nanoseconds >= 1_000_000_000 {
            return Err(ManagementError::ValueOutOfRange);
        }
        Ok(ts)
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_uint_be(self.seconds, 6);
        w.write_u32(self.nanoseconds);
    }
}

/// A scaled 64-bit time interval: nanoseconds * 2^16, big-endian two's
/// complement (I5).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval(pub i64);

impl TimeInterval {
    /// Size of this type on the wire.
    pub const WIRE_SIZE: usize = 8;

    /// The interval expressed as whole and fractional nanoseconds.
    pub fn as_nanoseconds(&self) -> f64 {
        self.0 as f64 / 65536.0
    }

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        Ok(TimeInterval(c.read_i64()?))
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_i64(self.0);
    }
}

/// `{ networkProtocol, addressLength, addressBytes }`, no internal padding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PortAddress {
    /// The address family, per the IEEE 1588 networkProtocol enumeration.
    pub network_protocol: u16,
    /// The raw address bytes.
    pub address: Vec<u8>,
}

impl PortAddress {
    /// Size of this value on the wire.
    pub fn wire_size(&self) -> usize {
        4 + self.address.len()
    }

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let network_protocol = c.read_u16()?;
        let len = c.read_u16()? as usize;
        let address = c.read_bytes(len)?.to_vec();
        Ok(PortAddress {
            network_protocol,
            address,
        })
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_u16(self.network_protocol);
        w.write_u16(self.address.len() as u16);
        w.write_bytes(&self.address);
    }
}

/// `{ lengthField, bytes }`, no trailing nul. Stores raw bytes; most PTP
/// text is plain ASCII/UTF-8 so [`PTPText::as_str`] is provided as a
/// best-effort view.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PTPText {
    /// The raw, unterminated text bytes.
    pub bytes: Vec<u8>,
}

impl PTPText {
    /// Wraps raw bytes as a `PTPText`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        PTPText {
            bytes: bytes.into(),
        }
    }

    /// A best-effort UTF-8 view; lossy on non-UTF-8 content.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Size of this value on the wire.
    pub fn wire_size(&self) -> usize {
        1 + self.bytes.len()
    }

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        Ok(PTPText {
            bytes: c.read_text()?,
        })
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_text(&self.bytes);
    }
}

impl From<&str> for PTPText {
    fn from(s: &str) -> Self {
        PTPText::new(s.as_bytes().to_vec())
    }
}

impl std::fmt::Display for PTPText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `{ clockClass, clockAccuracy, offsetScaledLogVariance }`, 4 bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockQuality {
    /// IEEE 1588 clockClass.
    pub clock_class: u8,
    /// IEEE 1588 clockAccuracy enumeration.
    pub clock_accuracy: u8,
    /// Log2 variance estimate of the clock's offset.
    pub offset_scaled_log_variance: u16,
}

impl ClockQuality {
    /// Size of this value on the wire.
    pub const WIRE_SIZE: usize = 4;

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        Ok(ClockQuality {
            clock_class: c.read_u8()?,
            clock_accuracy: c.read_u8()?,
            offset_scaled_log_variance: c.read_u16()?,
        })
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_u8(self.clock_class);
        w.write_u8(self.clock_accuracy);
        w.write_u16(self.offset_scaled_log_variance);
    }
}

/// A single entry of a FAULT_LOG management TLV.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    /// Time the fault was logged.
    pub fault_time: Timestamp,
    /// Fault severity, per the IEEE 1588 faultRecord enumeration.
    pub severity_code: u8,
    /// Short machine-readable fault name.
    pub fault_name: PTPText,
    /// Opaque fault value text.
    pub fault_value: PTPText,
    /// Human-readable description.
    pub fault_description: PTPText,
}

impl FaultRecord {
    fn body_len(&self) -> usize {
        Timestamp::WIRE_SIZE
            + 1
            + self.fault_name.wire_size()
            + self.fault_value.wire_size()
            + self.fault_description.wire_size()
    }

    /// Size of this entry on the wire, including its own length prefix.
    pub fn wire_size(&self) -> usize {
        2 + self.body_len()
    }

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let record_length = c.read_u16()? as usize;
        let start = c.position();
        let fault_time = Timestamp::parse(c)?;
        let severity_code = c.read_u8()?;
        let fault_name = PTPText::parse(c)?;
        let fault_value = PTPText::parse(c)?;
        let fault_description = PTPText::parse(c)?;
        if c.position() - start != record_length {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(FaultRecord {
            fault_time,
            severity_code,
            fault_name,
            fault_value,
            fault_description,
        })
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_u16(self.body_len() as u16);
        self.fault_time.build(w);
        w.write_u8(self.severity_code);
        self.fault_name.build(w);
        self.fault_value.build(w);
        self.fault_description.build(w);
    }
}

/// An entry of an ACCEPTABLE_MASTER_TABLE management TLV.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AcceptableMaster {
    /// Identity of the acceptable master clock.
    pub identity: PortIdentity,
    /// Priority this implementation assigns to the master.
    pub alternate_priority1: u8,
}

impl AcceptableMaster {
    /// Size of this entry on the wire.
    pub const WIRE_SIZE: usize = PortIdentity::WIRE_SIZE + 1;

    pub(crate) fn parse(c: &mut Cursor) -> Result<Self> {
        let identity = PortIdentity::parse(c)?;
        let alternate_priority1 = c.read_u8()?;
        Ok(AcceptableMaster {
            identity,
            alternate_priority1,
        })
    }

    pub(crate) fn build(&self, w: &mut Writer) {
        self.identity.build(w);
        w.write_u8(self.alternate_priority1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_identity_round_trips() {
        let pi = PortIdentity {
            clock_identity: ClockIdentity([1, 2, 3, 4, 5, 6, 7, 8]),
            port_number: 0xabcd,
        };
        let mut w = Writer::new();
        pi.build(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), PortIdentity::WIRE_SIZE);
        let mut c = Cursor::new(&bytes);
        assert_eq!(PortIdentity::parse(&mut c).unwrap(), pi);
    }

    #[test]
    fn ptp_text_round_trips_without_nul() {
        let t = PTPText::from("test 123");
        let mut w = Writer::new();
        t.build(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes, {
            let mut v = vec![8u8];
            v.extend_from_slice(b"test 123");
            v
        });
        let mut c = Cursor::new(&bytes);
        assert_eq!(PTPText::parse(&mut c).unwrap().as_str(), "test 123");
    }

    #[test]
    fn time_of_next_jump_round_trips_48_bits() {
        let mut w = Writer::new();
        w.write_uint_be(0x912478321891, 6);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert_eq!(c.read_uint_be(6).unwrap(), 0x912478321891);
    }
}
