//! Per-id typed payload structs. Each implements [`TlvBody`], writing its
//! fields in IEEE 1588 declared order and zeroing reserved octets (I4).

use crate::errors::{ManagementError, Result};
use crate::primitive::{Cursor, Writer};
use crate::types::{
    AcceptableMaster, ClockIdentity, ClockQuality, FaultRecord, PTPText, PortAddress, PortIdentity,
    TimeInterval, Timestamp,
};

/// A management TLV body that knows how to serialize and deserialize
/// itself, given the declared TLV length for bounds-checked variable-shape
/// bodies.
pub trait TlvBody: Sized {
    /// Appends this value's wire representation to `w`, not including the
    /// even-length padding (the caller pads the whole TLV once assembled).
    fn build(&self, w: &mut Writer);

    /// Parses this value starting at the cursor's current position.
    /// `tlv_len` is the declared dataField length, padding included.
    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self>;
}

/// Bit positions shared by the several flag octets that carry
/// leap/UTC/traceability predicates (spec.md §4.4, §9).
pub mod flag_bits {
    /// leap61 announced.
    pub const LI_61: u8 = 0x01;
    /// leap59 announced.
    pub const LI_59: u8 = 0x02;
    /// currentUtcOffset is valid.
    pub const UTCV: u8 = 0x04;
    /// clock uses the PTP timescale (vs. ARB).
    pub const PTP: u8 = 0x08;
    /// time is traceable to a primary reference.
    pub const TTRA: u8 = 0x10;
    /// frequency is traceable to a primary reference.
    pub const FTRA: u8 = 0x20;
}

macro_rules! predicate {
    ($name:ident, $bit:expr) => {
        /// Generated predicate reading a single bit of `flags`, the single
        /// source of truth required by spec.md §9 ("bit-packed flags").
        pub fn $name(&self) -> bool {
            self.flags & $bit != 0
        }
    };
}

/// `{}` — the empty body shared by NULL_PTP_MANAGEMENT,
/// SAVE_IN_NON_VOLATILE_STORAGE, RESET_NON_VOLATILE_STORAGE,
/// FAULT_LOG_RESET, ENABLE_PORT, DISABLE_PORT.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Empty;

impl TlvBody for Empty {
    fn build(&self, _w: &mut Writer) {}

    fn parse(_c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 0 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(Empty)
    }
}

/// CLOCK_DESCRIPTION.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClockDescription {
    pub clock_type: u16,
    pub physical_layer_protocol: PTPText,
    pub physical_address: Vec<u8>,
    pub protocol_address: PortAddress,
    pub manufacturer_identity: [u8; 3],
    pub product_description: PTPText,
    pub revision_data: PTPText,
    pub user_description: PTPText,
    pub profile_identity: [u8; 6],
}

impl TlvBody for ClockDescription {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.clock_type);
        self.physical_layer_protocol.build(w);
        w.write_u16(self.physical_address.len() as u16);
        w.write_bytes(&self.physical_address);
        self.protocol_address.build(w);
        w.write_bytes(&self.manufacturer_identity);
        w.write_zeros(1);
        self.product_description.build(w);
        self.revision_data.build(w);
        self.user_description.build(w);
        w.write_bytes(&self.profile_identity);
    }

    fn parse(c: &mut Cursor, _tlv_len: usize) -> Result<Self> {
        let clock_type = c.read_u16()?;
        let physical_layer_protocol = PTPText::parse(c)?;
        let phys_len = c.read_u16()? as usize;
        let physical_address = c.read_bytes(phys_len)?.to_vec();
        let protocol_address = PortAddress::parse(c)?;
        let mut manufacturer_identity = [0u8; 3];
        manufacturer_identity.copy_from_slice(c.read_bytes(3)?);
        c.skip(1)?;
        let product_description = PTPText::parse(c)?;
        let revision_data = PTPText::parse(c)?;
        let user_description = PTPText::parse(c)?;
        let mut profile_identity = [0u8; 6];
        profile_identity.copy_from_slice(c.read_bytes(6)?);
        Ok(ClockDescription {
            clock_type,
            physical_layer_protocol,
            physical_address,
            protocol_address,
            manufacturer_identity,
            product_description,
            revision_data,
            user_description,
            profile_identity,
        })
    }
}

/// USER_DESCRIPTION.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserDescription {
    pub user_description: PTPText,
}

impl TlvBody for UserDescription {
    fn build(&self, w: &mut Writer) {
        self.user_description.build(w);
    }

    fn parse(c: &mut Cursor, _tlv_len: usize) -> Result<Self> {
        Ok(UserDescription {
            user_description: PTPText::parse(c)?,
        })
    }
}

/// INITIALIZE.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Initialize {
    pub initialization_key: u16,
}

impl TlvBody for Initialize {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.initialization_key);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(Initialize {
            initialization_key: c.read_u16()?,
        })
    }
}

/// FAULT_LOG. The outer TLV length must equal `2 + Σ(2 + entryLength)`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FaultLog {
    pub fault_records: Vec<FaultRecord>,
}

impl TlvBody for FaultLog {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.fault_records.len() as u16);
        for r in &self.fault_records {
            r.build(w);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        let start = c.position();
        let count = c.read_u16()? as usize;
        let mut fault_records = Vec::with_capacity(count);
        for _ in 0..count {
            fault_records.push(FaultRecord::parse(c)?);
        }
        if c.position() - start != tlv_len {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(FaultLog { fault_records })
    }
}

/// TIME.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub current_time: Timestamp,
}

impl TlvBody for Time {
    fn build(&self, w: &mut Writer) {
        self.current_time.build(w);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != Timestamp::WIRE_SIZE {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(Time {
            current_time: Timestamp::parse(c)?,
        })
    }
}

/// CLOCK_ACCURACY.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockAccuracy {
    pub clock_accuracy: u8,
}

impl TlvBody for ClockAccuracy {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.clock_accuracy);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let clock_accuracy = c.read_u8()?;
        c.skip(1)?;
        Ok(ClockAccuracy { clock_accuracy })
    }
}

/// DEFAULT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDataSet {
    pub two_step_flag: bool,
    pub number_ports: u16,
    pub priority1: u8,
    pub clock_quality: ClockQuality,
    pub priority2: u8,
    pub clock_identity: ClockIdentity,
    pub domain_number: u8,
}

impl TlvBody for DefaultDataSet {
    fn build(&self, w: &mut Writer) {
        w.write_u8(if self.two_step_flag { 0x01 } else { 0 });
        w.write_zeros(1);
        w.write_u16(self.number_ports);
        w.write_u8(self.priority1);
        self.clock_quality.build(w);
        w.write_u8(self.priority2);
        self.clock_identity.build(w);
        w.write_u8(self.domain_number);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 18 {
            return Err(ManagementError::LengthMismatch);
        }
        let flags = c.read_u8()?;
        c.skip(1)?;
        let number_ports = c.read_u16()?;
        let priority1 = c.read_u8()?;
        let clock_quality = ClockQuality::parse(c)?;
        let priority2 = c.read_u8()?;
        let clock_identity = ClockIdentity::parse(c)?;
        let domain_number = c.read_u8()?;
        Ok(DefaultDataSet {
            two_step_flag: flags & 0x01 != 0,
            number_ports,
            priority1,
            clock_quality,
            priority2,
            clock_identity,
            domain_number,
        })
    }
}

/// PRIORITY1.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Priority1 {
    pub priority1: u8,
}

impl TlvBody for Priority1 {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.priority1);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let priority1 = c.read_u8()?;
        c.skip(1)?;
        Ok(Priority1 { priority1 })
    }
}

/// PRIORITY2.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Priority2 {
    pub priority2: u8,
}

impl TlvBody for Priority2 {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.priority2);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let priority2 = c.read_u8()?;
        c.skip(1)?;
        Ok(Priority2 { priority2 })
    }
}

/// DOMAIN.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub domain_number: u8,
}

impl TlvBody for Domain {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.domain_number);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let domain_number = c.read_u8()?;
        c.skip(1)?;
        Ok(Domain { domain_number })
    }
}

/// SLAVE_ONLY.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlaveOnly {
    pub slave_only: bool,
}

impl TlvBody for SlaveOnly {
    fn build(&self, w: &mut Writer) {
        w.write_u8(if self.slave_only { 0x01 } else { 0 });
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let flags = c.read_u8()?;
        c.skip(1)?;
        Ok(SlaveOnly {
            slave_only: flags & 0x01 != 0,
        })
    }
}

/// CURRENT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CurrentDataSet {
    pub steps_removed: u16,
    pub offset_from_master: TimeInterval,
    pub mean_path_delay: TimeInterval,
}

impl TlvBody for CurrentDataSet {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.steps_removed);
        self.offset_from_master.build(w);
        self.mean_path_delay.build(w);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 18 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(CurrentDataSet {
            steps_removed: c.read_u16()?,
            offset_from_master: TimeInterval::parse(c)?,
            mean_path_delay: TimeInterval::parse(c)?,
        })
    }
}

/// PARENT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParentDataSet {
    pub parent_port_identity: PortIdentity,
    pub parent_stats: bool,
    pub observed_parent_offset_scaled_log_variance: u16,
    pub observed_parent_clock_phase_change_rate: u32,
    pub grandmaster_priority1: u8,
    pub grandmaster_clock_quality: ClockQuality,
    pub grandmaster_priority2: u8,
    pub grandmaster_identity: ClockIdentity,
}

impl TlvBody for ParentDataSet {
    fn build(&self, w: &mut Writer) {
        self.parent_port_identity.build(w);
        w.write_u8(if self.parent_stats { 0x01 } else { 0 });
        w.write_zeros(1);
        w.write_u16(self.observed_parent_offset_scaled_log_variance);
        w.write_u32(self.observed_parent_clock_phase_change_rate);
        w.write_u8(self.grandmaster_priority1);
        self.grandmaster_clock_quality.build(w);
        w.write_u8(self.grandmaster_priority2);
        self.grandmaster_identity.build(w);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 32 {
            return Err(ManagementError::LengthMismatch);
        }
        let parent_port_identity = PortIdentity::parse(c)?;
        let flags = c.read_u8()?;
        c.skip(1)?;
        let observed_parent_offset_scaled_log_variance = c.read_u16()?;
        let observed_parent_clock_phase_change_rate = c.read_u32()?;
        let grandmaster_priority1 = c.read_u8()?;
        let grandmaster_clock_quality = ClockQuality::parse(c)?;
        let grandmaster_priority2 = c.read_u8()?;
        let grandmaster_identity = ClockIdentity::parse(c)?;
        Ok(ParentDataSet {
            parent_port_identity,
            parent_stats: flags & 0x01 != 0,
            observed_parent_offset_scaled_log_variance,
            observed_parent_clock_phase_change_rate,
            grandmaster_priority1,
            grandmaster_clock_quality,
            grandmaster_priority2,
            grandmaster_identity,
        })
    }
}

/// TIME_PROPERTIES_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimePropertiesDataSet {
    pub current_utc_offset: i16,
    pub flags: u8,
    pub time_source: u8,
}

impl TimePropertiesDataSet {
    predicate!(is_li_61, flag_bits::LI_61);
    predicate!(is_li_59, flag_bits::LI_59);
    predicate!(is_utcv, flag_bits::UTCV);
    predicate!(is_ptp, flag_bits::PTP);
    predicate!(is_ttra, flag_bits::TTRA);
    predicate!(is_ftra, flag_bits::FTRA);
}

impl TlvBody for TimePropertiesDataSet {
    fn build(&self, w: &mut Writer) {
        w.write_i16(self.current_utc_offset);
        w.write_u8(self.flags);
        w.write_u8(self.time_source);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 4 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(TimePropertiesDataSet {
            current_utc_offset: c.read_i16()?,
            flags: c.read_u8()?,
            time_source: c.read_u8()?,
        })
    }
}

/// UTC_PROPERTIES.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UtcProperties {
    pub current_utc_offset: i16,
    pub flags: u8,
}

impl UtcProperties {
    predicate!(is_li_61, flag_bits::LI_61);
    predicate!(is_li_59, flag_bits::LI_59);
    predicate!(is_utcv, flag_bits::UTCV);
}

impl TlvBody for UtcProperties {
    fn build(&self, w: &mut Writer) {
        w.write_i16(self.current_utc_offset);
        w.write_u8(self.flags);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 4 {
            return Err(ManagementError::LengthMismatch);
        }
        let current_utc_offset = c.read_i16()?;
        let flags = c.read_u8()?;
        c.skip(1)?;
        Ok(UtcProperties {
            current_utc_offset,
            flags,
        })
    }
}

/// TIMESCALE_PROPERTIES.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimescaleProperties {
    pub flags: u8,
    pub time_source: u8,
}

impl TimescaleProperties {
    predicate!(is_ptp, flag_bits::PTP);
    predicate!(is_ttra, flag_bits::TTRA);
    predicate!(is_ftra, flag_bits::FTRA);
}

impl TlvBody for TimescaleProperties {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.flags);
        w.write_u8(self.time_source);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(TimescaleProperties {
            flags: c.read_u8()?,
            time_source: c.read_u8()?,
        })
    }
}

/// TRACEABILITY_PROPERTIES.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraceabilityProperties {
    pub flags: u8,
}

impl TraceabilityProperties {
    predicate!(is_ttra, flag_bits::TTRA);
    predicate!(is_ftra, flag_bits::FTRA);
}

impl TlvBody for TraceabilityProperties {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.flags);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let flags = c.read_u8()?;
        c.skip(1)?;
        Ok(TraceabilityProperties { flags })
    }
}

/// PORT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortDataSet {
    pub port_identity: PortIdentity,
    pub port_state: u8,
    pub log_min_delay_req_interval: i8,
    pub peer_mean_path_delay: TimeInterval,
    pub log_announce_interval: i8,
    pub announce_receipt_timeout: u8,
    pub log_sync_interval: i8,
    pub delay_mechanism: u8,
    pub log_min_pdelay_req_interval: i8,
    pub version_number: u8,
}

impl TlvBody for PortDataSet {
    fn build(&self, w: &mut Writer) {
        self.port_identity.build(w);
        w.write_u8(self.port_state);
        w.write_i8(self.log_min_delay_req_interval);
        self.peer_mean_path_delay.build(w);
        w.write_i8(self.log_announce_interval);
        w.write_u8(self.announce_receipt_timeout);
        w.write_i8(self.log_sync_interval);
        w.write_u8(self.delay_mechanism);
        w.write_i8(self.log_min_pdelay_req_interval);
        w.write_u8(self.version_number & 0x0f);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 32 {
            return Err(ManagementError::LengthMismatch);
        }
        let port_identity = PortIdentity::parse(c)?;
        let port_state = c.read_u8()?;
        let log_min_delay_req_interval = c.read_i8()?;
        let peer_mean_path_delay = TimeInterval::parse(c)?;
        let log_announce_interval = c.read_i8()?;
        let announce_receipt_timeout = c.read_u8()?;
        let log_sync_interval = c.read_i8()?;
        let delay_mechanism = c.read_u8()?;
        let log_min_pdelay_req_interval = c.read_i8()?;
        let version_number = c.read_u8()? & 0x0f;
        c.skip(1)?;
        Ok(PortDataSet {
            port_identity,
            port_state,
            log_min_delay_req_interval,
            peer_mean_path_delay,
            log_announce_interval,
            announce_receipt_timeout,
            log_sync_interval,
            delay_mechanism,
            log_min_pdelay_req_interval,
            version_number,
        })
    }
}

macro_rules! single_i8_field {
    ($struct_name:ident, $field:ident) => {
        /// Generated single-field `i8` TLV body.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct $struct_name {
            pub $field: i8,
        }

        impl TlvBody for $struct_name {
            fn build(&self, w: &mut Writer) {
                w.write_i8(self.$field);
                w.write_zeros(1);
            }

            fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
                if tlv_len != 2 {
                    return Err(ManagementError::LengthMismatch);
                }
                let v = c.read_i8()?;
                c.skip(1)?;
                Ok($struct_name { $field: v })
            }
        }
    };
}

macro_rules! single_u8_field {
    ($struct_name:ident, $field:ident) => {
        /// Generated single-field `u8` TLV body.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct $struct_name {
            pub $field: u8,
        }

        impl TlvBody for $struct_name {
            fn build(&self, w: &mut Writer) {
                w.write_u8(self.$field);
                w.write_zeros(1);
            }

            fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
                if tlv_len != 2 {
                    return Err(ManagementError::LengthMismatch);
                }
                let v = c.read_u8()?;
                c.skip(1)?;
                Ok($struct_name { $field: v })
            }
        }
    };
}

macro_rules! single_bool_field {
    ($struct_name:ident, $field:ident) => {
        /// Generated single-bit-flag TLV body.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct $struct_name {
            pub $field: bool,
        }

        impl TlvBody for $struct_name {
            fn build(&self, w: &mut Writer) {
                w.write_u8(if self.$field { 0x01 } else { 0 });
                w.write_zeros(1);
            }

            fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
                if tlv_len != 2 {
                    return Err(ManagementError::LengthMismatch);
                }
                let v = c.read_u8()?;
                c.skip(1)?;
                Ok($struct_name { $field: v & 0x01 != 0 })
            }
        }
    };
}

single_i8_field!(LogAnnounceInterval, log_announce_interval);
single_u8_field!(AnnounceReceiptTimeout, announce_receipt_timeout);
single_i8_field!(LogSyncInterval, log_sync_interval);
single_u8_field!(VersionNumber, version_number);
single_u8_field!(DelayMechanism, delay_mechanism);
single_i8_field!(LogMinPdelayReqInterval, log_min_pdelay_req_interval);
single_u8_field!(PrimaryDomain, primary_domain);
single_bool_field!(MasterOnly, master_only);
single_bool_field!(UnicastNegotiationEnable, enable);
single_bool_field!(AcceptableMasterTableEnabled, enabled);
single_bool_field!(PathTraceEnable, enable);
single_bool_field!(ExternalPortConfigurationEnabled, enable);
single_bool_field!(HoldoverUpgradeEnable, enable);
single_bool_field!(SynchronizationUncertainNp, uncertain);

/// TRANSPARENT_CLOCK_DEFAULT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransparentClockDefaultDataSet {
    pub clock_identity: ClockIdentity,
    pub number_ports: u16,
    pub delay_mechanism: u8,
    pub primary_domain: u8,
}

impl TlvBody for TransparentClockDefaultDataSet {
    fn build(&self, w: &mut Writer) {
        self.clock_identity.build(w);
        w.write_u16(self.number_ports);
        w.write_u8(self.delay_mechanism);
        w.write_u8(self.primary_domain);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 12 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(TransparentClockDefaultDataSet {
            clock_identity: ClockIdentity::parse(c)?,
            number_ports: c.read_u16()?,
            delay_mechanism: c.read_u8()?,
            primary_domain: c.read_u8()?,
        })
    }
}

/// TRANSPARENT_CLOCK_PORT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransparentClockPortDataSet {
    pub port_identity: PortIdentity,
    pub faulty_flag: bool,
    pub log_min_pdelay_req_interval: i8,
    pub peer_mean_path_delay: TimeInterval,
}

impl TlvBody for TransparentClockPortDataSet {
    fn build(&self, w: &mut Writer) {
        self.port_identity.build(w);
        w.write_u8(if self.faulty_flag { 0x01 } else { 0 });
        w.write_i8(self.log_min_pdelay_req_interval);
        self.peer_mean_path_delay.build(w);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 20 {
            return Err(ManagementError::LengthMismatch);
        }
        let port_identity = PortIdentity::parse(c)?;
        let faulty_flag = c.read_u8()? & 0x01 != 0;
        let log_min_pdelay_req_interval = c.read_i8()?;
        let peer_mean_path_delay = TimeInterval::parse(c)?;
        Ok(TransparentClockPortDataSet {
            port_identity,
            faulty_flag,
            log_min_pdelay_req_interval,
            peer_mean_path_delay,
        })
    }
}

/// ALTERNATE_MASTER.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlternateMaster {
    pub transmit_alternate_multicast_sync: bool,
    pub log_alternate_multicast_sync_interval: i8,
    pub number_of_alternate_masters: u8,
}

impl TlvBody for AlternateMaster {
    fn build(&self, w: &mut Writer) {
        w.write_u8(if self.transmit_alternate_multicast_sync {
            0x01
        } else {
            0
        });
        w.write_i8(self.log_alternate_multicast_sync_interval);
        w.write_u8(self.number_of_alternate_masters);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 4 {
            return Err(ManagementError::LengthMismatch);
        }
        let flags = c.read_u8()?;
        let log_alternate_multicast_sync_interval = c.read_i8()?;
        let number_of_alternate_masters = c.read_u8()?;
        c.skip(1)?;
        Ok(AlternateMaster {
            transmit_alternate_multicast_sync: flags & 0x01 != 0,
            log_alternate_multicast_sync_interval,
            number_of_alternate_masters,
        })
    }
}

/// UNICAST_MASTER_TABLE. `actualTableSize` bounds the vector; boundary test
/// uses the declared size, not remaining bytes (spec.md §4.4).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnicastMasterTable {
    pub log_query_interval: i8,
    pub table: Vec<PortAddress>,
}

impl TlvBody for UnicastMasterTable {
    fn build(&self, w: &mut Writer) {
        w.write_i8(self.log_query_interval);
        w.write_zeros(1);
        w.write_u16(self.table.len() as u16);
        for pa in &self.table {
            pa.build(w);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        let start = c.position();
        let log_query_interval = c.read_i8()?;
        c.skip(1)?;
        let actual_table_size = c.read_u16()? as usize;
        let mut table = Vec::with_capacity(actual_table_size);
        for _ in 0..actual_table_size {
            table.push(PortAddress::parse(c)?);
        }
        if c.position() - start > tlv_len {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(UnicastMasterTable {
            log_query_interval,
            table,
        })
    }
}

macro_rules! single_u16_field {
    ($struct_name:ident, $field:ident) => {
        /// Generated single-field `u16` TLV body.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct $struct_name {
            pub $field: u16,
        }

        impl TlvBody for $struct_name {
            fn build(&self, w: &mut Writer) {
                w.write_u16(self.$field);
            }

            fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
                if tlv_len != 2 {
                    return Err(ManagementError::LengthMismatch);
                }
                Ok($struct_name {
                    $field: c.read_u16()?,
                })
            }
        }
    };
}

single_u16_field!(UnicastMasterMaxTableSize, max_table_size);
single_u8_field!(AlternateTimeOffsetMaxKey, max_key);

/// EXT_PORT_CONFIG_PORT_DATA_SET.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtPortConfigPortDataSet {
    pub desired_state: u8,
}

impl TlvBody for ExtPortConfigPortDataSet {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.desired_state);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let desired_state = c.read_u8()?;
        c.skip(1)?;
        Ok(ExtPortConfigPortDataSet { desired_state })
    }
}

/// ALTERNATE_TIME_OFFSET_ENABLE.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlternateTimeOffsetEnable {
    pub key_field: u8,
    pub enable: bool,
}

impl TlvBody for AlternateTimeOffsetEnable {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.key_field);
        w.write_u8(if self.enable { 0x01 } else { 0 });
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 {
            return Err(ManagementError::LengthMismatch);
        }
        let key_field = c.read_u8()?;
        let enable = c.read_u8()? & 0x01 != 0;
        Ok(AlternateTimeOffsetEnable { key_field, enable })
    }
}

/// GRANDMASTER_CLUSTER_TABLE.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GrandmasterClusterTable {
    pub log_query_interval: i8,
    pub table: Vec<PortAddress>,
}

impl TlvBody for GrandmasterClusterTable {
    fn build(&self, w: &mut Writer) {
        w.write_i8(self.log_query_interval);
        w.write_u8(self.table.len() as u8);
        for pa in &self.table {
            pa.build(w);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        let start = c.position();
        let log_query_interval = c.read_i8()?;
        let actual_table_size = c.read_u8()? as usize;
        let mut table = Vec::with_capacity(actual_table_size);
        for _ in 0..actual_table_size {
            table.push(PortAddress::parse(c)?);
        }
        if c.position() - start > tlv_len {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(GrandmasterClusterTable {
            log_query_interval,
            table,
        })
    }
}

/// ACCEPTABLE_MASTER_TABLE. A known interop quirk leaves a trailing padding
/// octet after the last entry (spec.md §4.4); parsing must not mistake it
/// for another entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AcceptableMasterTable {
    pub table: Vec<AcceptableMaster>,
}

impl TlvBody for AcceptableMasterTable {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.table.len() as u16);
        for e in &self.table {
            e.build(w);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        let start = c.position();
        let actual_table_size = c.read_u16()? as usize;
        let mut table = Vec::with_capacity(actual_table_size);
        for _ in 0..actual_table_size {
            table.push(AcceptableMaster::parse(c)?);
        }
        let consumed = c.position() - start;
        if consumed > tlv_len || tlv_len - consumed > 1 {
            return Err(ManagementError::LengthMismatch);
        }
        if tlv_len > consumed {
            c.skip(tlv_len - consumed)?;
        }
        Ok(AcceptableMasterTable { table })
    }
}

single_u16_field!(AcceptableMasterMaxTableSize, max_table_size);

/// ALTERNATE_TIME_OFFSET_NAME.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlternateTimeOffsetName {
    pub key_field: u8,
    pub display_name: PTPText,
}

impl TlvBody for AlternateTimeOffsetName {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.key_field);
        self.display_name.build(w);
    }

    fn parse(c: &mut Cursor, _tlv_len: usize) -> Result<Self> {
        let key_field = c.read_u8()?;
        let display_name = PTPText::parse(c)?;
        Ok(AlternateTimeOffsetName {
            key_field,
            display_name,
        })
    }
}

/// ALTERNATE_TIME_OFFSET_PROPERTIES. `timeOfNextJump` is 48 bits, not 64
/// (spec.md §4.4).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlternateTimeOffsetProperties {
    pub key_field: u8,
    pub current_offset: i32,
    pub jump_seconds: i32,
    pub time_of_next_jump: u64,
}

impl TlvBody for AlternateTimeOffsetProperties {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.key_field);
        w.write_i32(self.current_offset);
        w.write_i32(self.jump_seconds);
        w.write_uint_be(self.time_of_next_jump, 6);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 13 {
            return Err(ManagementError::LengthMismatch);
        }
        let key_field = c.read_u8()?;
        let current_offset = c.read_i32()?;
        let jump_seconds = c.read_i32()?;
        let time_of_next_jump = c.read_uint_be(6)?;
        Ok(AlternateTimeOffsetProperties {
            key_field,
            current_offset,
            jump_seconds,
            time_of_next_jump,
        })
    }
}

/// PATH_TRACE_LIST. Entry count is `tlvLength / 8`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathTraceList {
    pub list: Vec<ClockIdentity>,
}

impl TlvBody for PathTraceList {
    fn build(&self, w: &mut Writer) {
        for id in &self.list {
            id.build(w);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len % 8 != 0 {
            return Err(ManagementError::LengthMismatch);
        }
        let count = tlv_len / 8;
        let mut list = Vec::with_capacity(count);
        for _ in 0..count {
            list.push(ClockIdentity::parse(c)?);
        }
        Ok(PathTraceList { list })
    }
}

/// linuxptp TIME_STATUS_NP.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeStatusNp {
    pub master_offset: i64,
    pub ingress_time: i64,
    pub cumulative_scaled_rate_offset: i32,
    pub scaled_last_gm_phase_change: i32,
    pub gm_time_base_indicator: u16,
    pub last_gm_phase_change: TimeInterval,
    pub gm_present: i32,
    pub gm_identity: ClockIdentity,
}

impl TlvBody for TimeStatusNp {
    fn build(&self, w: &mut Writer) {
        w.write_i64(self.master_offset);
        w.write_i64(self.ingress_time);
        w.write_i32(self.cumulative_scaled_rate_offset);
        w.write_i32(self.scaled_last_gm_phase_change);
        w.write_u16(self.gm_time_base_indicator);
        self.last_gm_phase_change.build(w);
        w.write_i32(self.gm_present);
        self.gm_identity.build(w);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 50 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(TimeStatusNp {
            master_offset: c.read_i64()?,
            ingress_time: c.read_i64()?,
            cumulative_scaled_rate_offset: c.read_i32()?,
            scaled_last_gm_phase_change: c.read_i32()?,
            gm_time_base_indicator: c.read_u16()?,
            last_gm_phase_change: TimeInterval::parse(c)?,
            gm_present: c.read_i32()?,
            gm_identity: ClockIdentity::parse(c)?,
        })
    }
}

/// linuxptp GRANDMASTER_SETTINGS_NP.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GrandmasterSettingsNp {
    pub clock_quality: ClockQuality,
    pub current_utc_offset: i16,
    pub flags: u8,
    pub time_source: u8,
}

impl TlvBody for GrandmasterSettingsNp {
    fn build(&self, w: &mut Writer) {
        self.clock_quality.build(w);
        w.write_i16(self.current_utc_offset);
        w.write_u8(self.flags);
        w.write_u8(self.time_source);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 8 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(GrandmasterSettingsNp {
            clock_quality: ClockQuality::parse(c)?,
            current_utc_offset: c.read_i16()?,
            flags: c.read_u8()?,
            time_source: c.read_u8()?,
        })
    }
}

/// linuxptp PORT_DATA_SET_NP.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortDataSetNp {
    pub neighbor_prop_delay_thresh: u32,
    pub as_capable: i32,
}

impl TlvBody for PortDataSetNp {
    fn build(&self, w: &mut Writer) {
        w.write_u32(self.neighbor_prop_delay_thresh);
        w.write_i32(self.as_capable);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 8 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(PortDataSetNp {
            neighbor_prop_delay_thresh: c.read_u32()?,
            as_capable: c.read_i32()?,
        })
    }
}

/// Number of bits in the linuxptp SUBSCRIBE_EVENTS_NP bitmask.
pub const EVENT_BITMASK_CNT: usize = 64;

/// Named bit positions within SUBSCRIBE_EVENTS_NP's bitmask.
pub mod notify_bits {
    /// NOTIFY_PORT_STATE.
    pub const NOTIFY_PORT_STATE: usize = 0;
    /// NOTIFY_TIME_SYNC.
    pub const NOTIFY_TIME_SYNC: usize = 1;
    /// NOTIFY_PARENT_DATA_SET.
    pub const NOTIFY_PARENT_DATA_SET: usize = 2;
    /// NOTIFY_CMLDS.
    pub const NOTIFY_CMLDS: usize = 3;
}

/// linuxptp SUBSCRIBE_EVENTS_NP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeEventsNp {
    pub duration: u16,
    pub bitmask: [u8; EVENT_BITMASK_CNT / 8],
}

impl Default for SubscribeEventsNp {
    fn default() -> Self {
        SubscribeEventsNp {
            duration: 0,
            bitmask: [0; EVENT_BITMASK_CNT / 8],
        }
    }
}

impl SubscribeEventsNp {
    /// Reads a named bit's current state.
    pub fn get_event(&self, bit: usize) -> bool {
        self.bitmask[bit / 8] & (1 << (bit % 8)) != 0
    }

    /// Sets or clears a named bit.
    pub fn set_event(&mut self, bit: usize, on: bool) {
        if on {
            self.bitmask[bit / 8] |= 1 << (bit % 8);
        } else {
            self.bitmask[bit / 8] &= !(1 << (bit % 8));
        }
    }
}

impl TlvBody for SubscribeEventsNp {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.duration);
        w.write_bytes(&self.bitmask);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 2 + EVENT_BITMASK_CNT / 8 {
            return Err(ManagementError::LengthMismatch);
        }
        let duration = c.read_u16()?;
        let raw = c.read_bytes(EVENT_BITMASK_CNT / 8)?;
        let mut bitmask = [0u8; EVENT_BITMASK_CNT / 8];
        bitmask.copy_from_slice(raw);
        Ok(SubscribeEventsNp { duration, bitmask })
    }
}

/// linuxptp PORT_PROPERTIES_NP.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PortPropertiesNp {
    pub port_identity: PortIdentity,
    pub port_state: u8,
    pub timestamping: u8,
    pub interface: PTPText,
}

impl TlvBody for PortPropertiesNp {
    fn build(&self, w: &mut Writer) {
        self.port_identity.build(w);
        w.write_u8(self.port_state);
        w.write_u8(self.timestamping);
        self.interface.build(w);
    }

    fn parse(c: &mut Cursor, _tlv_len: usize) -> Result<Self> {
        let port_identity = PortIdentity::parse(c)?;
        let port_state = c.read_u8()?;
        let timestamping = c.read_u8()?;
        let interface = PTPText::parse(c)?;
        Ok(PortPropertiesNp {
            port_identity,
            port_state,
            timestamping,
            interface,
        })
    }
}

/// Number of per-message-type counters in PORT_STATS_NP.
pub const MAX_MESSAGE_TYPES: usize = 16;

/// linuxptp PORT_STATS_NP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatsNp {
    pub port_identity: PortIdentity,
    pub rx_msg_type: [u64; MAX_MESSAGE_TYPES],
    pub tx_msg_type: [u64; MAX_MESSAGE_TYPES],
}

impl Default for PortStatsNp {
    fn default() -> Self {
        PortStatsNp {
            port_identity: PortIdentity::default(),
            rx_msg_type: [0; MAX_MESSAGE_TYPES],
            tx_msg_type: [0; MAX_MESSAGE_TYPES],
        }
    }
}

impl TlvBody for PortStatsNp {
    fn build(&self, w: &mut Writer) {
        self.port_identity.build(w);
        for v in &self.rx_msg_type {
            w.write_u64(*v);
        }
        for v in &self.tx_msg_type {
            w.write_u64(*v);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != PortIdentity::WIRE_SIZE + 16 * MAX_MESSAGE_TYPES {
            return Err(ManagementError::LengthMismatch);
        }
        let port_identity = PortIdentity::parse(c)?;
        let mut rx_msg_type = [0u64; MAX_MESSAGE_TYPES];
        for v in rx_msg_type.iter_mut() {
            *v = c.read_u64()?;
        }
        let mut tx_msg_type = [0u64; MAX_MESSAGE_TYPES];
        for v in tx_msg_type.iter_mut() {
            *v = c.read_u64()?;
        }
        Ok(PortStatsNp {
            port_identity,
            rx_msg_type,
            tx_msg_type,
        })
    }
}

/// linuxptp PORT_SERVICE_STATS_NP. Absent from the retrieved registry
/// fragment; given the simplest shape consistent with the other `_NP`
/// counter TLVs (a run of u64 event counters).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortServiceStatsNp {
    pub port_identity: PortIdentity,
    pub announce_timeout: u64,
    pub sync_timeout: u64,
    pub delay_timeout: u64,
    pub unicast_service_timeout: u64,
    pub unicast_request_timeout: u64,
    pub master_announce_timeout: u64,
    pub master_sync_timeout: u64,
    pub qualification_timeout: u64,
    pub sync_mismatch: u64,
    pub follow_up_mismatch: u64,
}

impl TlvBody for PortServiceStatsNp {
    fn build(&self, w: &mut Writer) {
        self.port_identity.build(w);
        for v in [
            self.announce_timeout,
            self.sync_timeout,
            self.delay_timeout,
            self.unicast_service_timeout,
            self.unicast_request_timeout,
            self.master_announce_timeout,
            self.master_sync_timeout,
            self.qualification_timeout,
            self.sync_mismatch,
            self.follow_up_mismatch,
        ] {
            w.write_u64(v);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != PortIdentity::WIRE_SIZE + 8 * 10 {
            return Err(ManagementError::LengthMismatch);
        }
        let port_identity = PortIdentity::parse(c)?;
        let mut vals = [0u64; 10];
        for v in vals.iter_mut() {
            *v = c.read_u64()?;
        }
        Ok(PortServiceStatsNp {
            port_identity,
            announce_timeout: vals[0],
            sync_timeout: vals[1],
            delay_timeout: vals[2],
            unicast_service_timeout: vals[3],
            unicast_request_timeout: vals[4],
            master_announce_timeout: vals[5],
            master_sync_timeout: vals[6],
            qualification_timeout: vals[7],
            sync_mismatch: vals[8],
            follow_up_mismatch: vals[9],
        })
    }
}

/// linuxptp UNICAST_MASTER_TABLE_NP. Absent from the retrieved registry
/// fragment; shaped like UNICAST_MASTER_TABLE without the query interval,
/// consistent with the `_NP` read-only status convention.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnicastMasterTableNp {
    pub table: Vec<PortAddress>,
}

impl TlvBody for UnicastMasterTableNp {
    fn build(&self, w: &mut Writer) {
        w.write_u16(self.table.len() as u16);
        for pa in &self.table {
            pa.build(w);
        }
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        let start = c.position();
        let actual_table_size = c.read_u16()? as usize;
        let mut table = Vec::with_capacity(actual_table_size);
        for _ in 0..actual_table_size {
            table.push(PortAddress::parse(c)?);
        }
        if c.position() - start > tlv_len {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(UnicastMasterTableNp { table })
    }
}

/// linuxptp PORT_HWCLOCK_NP. Absent from the retrieved registry fragment;
/// shaped after the kernel PHC index + capability flags linuxptp exposes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortHwclockNp {
    pub port_identity: PortIdentity,
    pub phc_index: i32,
    pub flags: u8,
}

impl TlvBody for PortHwclockNp {
    fn build(&self, w: &mut Writer) {
        self.port_identity.build(w);
        w.write_i32(self.phc_index);
        w.write_u8(self.flags);
        w.write_zeros(1);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != PortIdentity::WIRE_SIZE + 6 {
            return Err(ManagementError::LengthMismatch);
        }
        let port_identity = PortIdentity::parse(c)?;
        let phc_index = c.read_i32()?;
        let flags = c.read_u8()?;
        c.skip(1)?;
        Ok(PortHwclockNp {
            port_identity,
            phc_index,
            flags,
        })
    }
}

/// linuxptp POWER_PROFILE_SETTINGS_NP. Absent from the retrieved registry
/// fragment; shaped after the IEEE C37.238 power-profile fields linuxptp's
/// management protocol extension carries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PowerProfileSettingsNp {
    pub version: u8,
    pub grandmaster_id: u16,
    pub grandmaster_time_inaccuracy: u32,
    pub network_time_inaccuracy: u32,
    pub total_time_inaccuracy: u32,
}

impl TlvBody for PowerProfileSettingsNp {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.version);
        w.write_zeros(1);
        w.write_u16(self.grandmaster_id);
        w.write_u32(self.grandmaster_time_inaccuracy);
        w.write_u32(self.network_time_inaccuracy);
        w.write_u32(self.total_time_inaccuracy);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 16 {
            return Err(ManagementError::LengthMismatch);
        }
        let version = c.read_u8()?;
        c.skip(1)?;
        Ok(PowerProfileSettingsNp {
            version,
            grandmaster_id: c.read_u16()?,
            grandmaster_time_inaccuracy: c.read_u32()?,
            network_time_inaccuracy: c.read_u32()?,
            total_time_inaccuracy: c.read_u32()?,
        })
    }
}

/// linuxptp CMLDS_INFO_NP. Absent from the retrieved registry fragment;
/// shaped after the 802.1AS Common Mean Link Delay Service counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CmldsInfoNp {
    pub mean_link_delay: TimeInterval,
    pub scaled_neighbor_rate_ratio: i32,
    pub as_capable: i32,
}

impl TlvBody for CmldsInfoNp {
    fn build(&self, w: &mut Writer) {
        self.mean_link_delay.build(w);
        w.write_i32(self.scaled_neighbor_rate_ratio);
        w.write_i32(self.as_capable);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len != 16 {
            return Err(ManagementError::LengthMismatch);
        }
        Ok(CmldsInfoNp {
            mean_link_delay: TimeInterval::parse(c)?,
            scaled_neighbor_rate_ratio: c.read_i32()?,
            as_capable: c.read_i32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: TlvBody + PartialEq + std::fmt::Debug>(v: &T) -> T {
        let mut w = Writer::new();
        v.build(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        T::parse(&mut c, bytes.len()).unwrap()
    }

    #[test]
    fn time_properties_predicates_match_flag_bits() {
        let tp = TimePropertiesDataSet {
            current_utc_offset: 37,
            flags: flag_bits::LI_61 | flag_bits::UTCV | flag_bits::FTRA,
            time_source: 0xa0,
        };
        assert!(tp.is_li_61());
        assert!(!tp.is_li_59());
        assert!(tp.is_utcv());
        assert!(!tp.is_ptp());
        assert!(!tp.is_ttra());
        assert!(tp.is_ftra());
        assert_eq!(round_trip(&tp), tp);
    }

    #[test]
    fn traceability_properties_predicates() {
        let tp = TraceabilityProperties {
            flags: flag_bits::TTRA,
        };
        assert!(tp.is_ttra());
        assert!(!tp.is_ftra());
    }

    #[test]
    fn fault_log_round_trips_two_records() {
        let log = FaultLog {
            fault_records: vec![
                FaultRecord {
                    fault_time: Timestamp {
                        seconds: 1,
                        nanoseconds: 2,
                    },
                    severity_code: 1,
                    fault_name: PTPText::from("lostSync"),
                    fault_value: PTPText::from(""),
                    fault_description: PTPText::from("sync timeout"),
                },
                FaultRecord {
                    fault_time: Timestamp {
                        seconds: 2,
                        nanoseconds: 0,
                    },
                    severity_code: 2,
                    fault_name: PTPText::from("portFault"),
                    fault_value: PTPText::from("x"),
                    fault_description: PTPText::from(""),
                },
            ],
        };
        let mut w = Writer::new();
        log.build(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let parsed = FaultLog::parse(&mut c, bytes.len()).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn unicast_master_table_round_trips() {
        let t = UnicastMasterTable {
            log_query_interval: -3,
            table: vec![
                PortAddress {
                    network_protocol: 1,
                    address: vec![192, 168, 0, 1],
                },
                PortAddress {
                    network_protocol: 1,
                    address: vec![192, 168, 0, 2],
                },
            ],
        };
        assert_eq!(round_trip(&t), t);
    }

    #[test]
    fn acceptable_master_table_tolerates_trailing_padding_octet() {
        let table = vec![AcceptableMaster {
            identity: PortIdentity::all_ones(),
            alternate_priority1: 9,
        }];
        let mut w = Writer::new();
        w.write_u16(table.len() as u16);
        for e in &table {
            e.build(&mut w);
        }
        w.write_zeros(1); // interop padding octet, not another entry
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let parsed = AcceptableMasterTable::parse(&mut c, bytes.len()).unwrap();
        assert_eq!(parsed.table, table);
    }

    #[test]
    fn path_trace_list_rejects_odd_length() {
        let mut c = Cursor::new(&[0u8; 9]);
        assert!(matches!(
            PathTraceList::parse(&mut c, 9),
            Err(ManagementError::LengthMismatch)
        ));
    }

    #[test]
    fn subscribe_events_np_bit_helpers() {
        let mut se = SubscribeEventsNp {
            duration: 60,
            ..Default::default()
        };
        assert!(!se.get_event(notify_bits::NOTIFY_TIME_SYNC));
        se.set_event(notify_bits::NOTIFY_TIME_SYNC, true);
        se.set_event(notify_bits::NOTIFY_CMLDS, true);
        assert!(se.get_event(notify_bits::NOTIFY_TIME_SYNC));
        assert!(!se.get_event(notify_bits::NOTIFY_PORT_STATE));
        assert!(se.get_event(notify_bits::NOTIFY_CMLDS));
        let parsed = round_trip(&se);
        assert_eq!(parsed, se);
        se.set_event(notify_bits::NOTIFY_TIME_SYNC, false);
        assert!(!se.get_event(notify_bits::NOTIFY_TIME_SYNC));
    }

    #[test]
    fn clock_description_round_trips_with_odd_length_fields() {
        let cd = ClockDescription {
            clock_type: 0x8000,
            physical_layer_protocol: PTPText::from("IEEE 802.3"),
            physical_address: vec![0xaa, 0xbb, 0xcc],
            protocol_address: PortAddress {
                network_protocol: 1,
                address: vec![10, 0, 0, 1],
            },
            manufacturer_identity: [1, 2, 3],
            product_description: PTPText::from("widget"),
            revision_data: PTPText::from("1.0"),
            user_description: PTPText::from(""),
            profile_identity: [0, 0, 0, 1, 0, 1],
        };
        let mut w = Writer::new();
        cd.build(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let parsed = ClockDescription::parse(&mut c, bytes.len()).unwrap();
        assert_eq!(parsed, cd);
    }

    #[test]
    fn default_data_set_two_step_flag_round_trips() {
        let dds = DefaultDataSet {
            two_step_flag: true,
            number_ports: 2,
            priority1: 128,
            clock_quality: ClockQuality {
                clock_class: 6,
                clock_accuracy: 0x20,
                offset_scaled_log_variance: 0xffff,
            },
            priority2: 128,
            clock_identity: ClockIdentity([1, 2, 3, 4, 5, 6, 7, 8]),
            domain_number: 0,
        };
        assert_eq!(round_trip(&dds), dds);
    }
}
