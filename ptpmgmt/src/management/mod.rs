//! Management TLV (de)serializer: builds and parses the managementMessage
//! prefix, the managementTLV header, and the per-id typed body (spec.md
//! §4.4). The per-id dispatch follows the shape of
//! `isakmp::v1::parser::payload::parse_next_payload`'s match-on-type
//! function, generalized from a handful of IKE payload kinds to the full
//! management-id vocabulary.

pub mod registry;
pub mod values;

pub use registry::{Legality, ManagementId, Owner};

use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::errors::{ManagementError, Result};
use crate::header::{control_field, MessageType, PtpHeader};
use crate::params::MsgParams;
use crate::primitive::{Cursor, Writer};
use crate::types::PortIdentity;
use values::*;

/// The action field of a management message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Action {
    /// Request the current value.
    Get = 0,
    /// Request a change.
    Set = 1,
    /// Request an operation with no associated value.
    Command = 2,
    /// A reply carrying the current (possibly just-changed) value.
    Response = 3,
    /// A reply acknowledging a COMMAND.
    Acknowledge = 4,
}

impl Action {
    fn from_u8(v: u8) -> Result<Self> {
        match v & 0x1f {
            0 => Ok(Action::Get),
            1 => Ok(Action::Set),
            2 => Ok(Action::Command),
            3 => Ok(Action::Response),
            4 => Ok(Action::Acknowledge),
            _ => Err(ManagementError::ActionMismatch),
        }
    }
}

/// tlvType of a MANAGEMENT TLV.
pub const TLV_TYPE_MANAGEMENT: u16 = 0x0001;
/// tlvType of a MANAGEMENT_ERROR_STATUS TLV.
pub const TLV_TYPE_MANAGEMENT_ERROR_STATUS: u16 = 0x0002;

#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct ManagementMessagePrefixWire {
    target_port_identity: [u8; PortIdentity::WIRE_SIZE],
    starting_boundary_hops: u8,
    boundary_hops: u8,
    action_field: u8,
    reserved: u8,
}

const PREFIX_WIRE_SIZE: usize = PortIdentity::WIRE_SIZE + 4;

#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct TlvHeaderWire {
    tlv_type: zerocopy::network_endian::U16,
    length_field: zerocopy::network_endian::U16,
}

const TLV_HEADER_WIRE_SIZE: usize = 4;

/// Offset of the actionField byte in a built management message, per
/// spec.md §6 (`[46] actionField`).
pub const ACTION_FIELD_OFFSET: usize = 46;

macro_rules! management_body {
    ( $( $variant:ident($ty:ty) = $id:ident ; )* ) => {
        /// The typed payload of a parsed or about-to-be-built management
        /// TLV, tagged by management id.
        #[derive(Debug, Clone, PartialEq)]
        #[allow(missing_docs)]
        pub enum ManagementBody {
            $( $variant($ty), )*
        }

        impl ManagementBody {
            /// The management id this body corresponds to.
            pub fn management_id(&self) -> ManagementId {
                match self {
                    $( ManagementBody::$variant(_) => ManagementId::$id, )*
                }
            }

            fn build(&self, w: &mut Writer) {
                match self {
                    $( ManagementBody::$variant(v) => v.build(w), )*
                }
            }

            fn parse_for(id: ManagementId, c: &mut Cursor, tlv_len: usize) -> Result<Self> {
                match id {
                    $( ManagementId::$id => Ok(ManagementBody::$variant(<$ty>::parse(c, tlv_len)?)), )*
                    _ => Err(ManagementError::UnknownManagementId(id.as_u16())),
                }
            }
        }
    };
}

management_body! {
    Empty(Empty) = NULL_PTP_MANAGEMENT;
    ClockDescription(ClockDescription) = CLOCK_DESCRIPTION;
    UserDescription(UserDescription) = USER_DESCRIPTION;
    Initialize(Initialize) = INITIALIZE;
    FaultLog(FaultLog) = FAULT_LOG;
    Time(Time) = TIME;
    ClockAccuracy(ClockAccuracy) = CLOCK_ACCURACY;
    DefaultDataSet(DefaultDataSet) = DEFAULT_DATA_SET;
    CurrentDataSet(CurrentDataSet) = CURRENT_DATA_SET;
    ParentDataSet(ParentDataSet) = PARENT_DATA_SET;
    TimePropertiesDataSet(TimePropertiesDataSet) = TIME_PROPERTIES_DATA_SET;
    PortDataSet(PortDataSet) = PORT_DATA_SET;
    Priority1(Priority1) = PRIORITY1;
    Priority2(Priority2) = PRIORITY2;
    Domain(Domain) = DOMAIN;
    SlaveOnly(SlaveOnly) = SLAVE_ONLY;
    LogAnnounceInterval(LogAnnounceInterval) = LOG_ANNOUNCE_INTERVAL;
    AnnounceReceiptTimeout(AnnounceReceiptTimeout) = ANNOUNCE_RECEIPT_TIMEOUT;
    LogSyncInterval(LogSyncInterval) = LOG_SYNC_INTERVAL;
    VersionNumber(VersionNumber) = VERSION_NUMBER;
    DelayMechanism(DelayMechanism) = DELAY_MECHANISM;
    LogMinPdelayReqInterval(LogMinPdelayReqInterval) = LOG_MIN_PDELAY_REQ_INTERVAL;
    UtcProperties(UtcProperties) = UTC_PROPERTIES;
    TraceabilityProperties(TraceabilityProperties) = TRACEABILITY_PROPERTIES;
    TimescaleProperties(TimescaleProperties) = TIMESCALE_PROPERTIES;
    TransparentClockDefaultDataSet(TransparentClockDefaultDataSet) = TRANSPARENT_CLOCK_DEFAULT_DATA_SET;
    PrimaryDomain(PrimaryDomain) = PRIMARY_DOMAIN;
    TransparentClockPortDataSet(TransparentClockPortDataSet) = TRANSPARENT_CLOCK_PORT_DATA_SET;
    MasterOnly(MasterOnly) = MASTER_ONLY;
    UnicastNegotiationEnable(UnicastNegotiationEnable) = UNICAST_NEGOTIATION_ENABLE;
    AlternateMaster(AlternateMaster) = ALTERNATE_MASTER;
    UnicastMasterTable(UnicastMasterTable) = UNICAST_MASTER_TABLE;
    UnicastMasterMaxTableSize(UnicastMasterMaxTableSize) = UNICAST_MASTER_MAX_TABLE_SIZE;
    AcceptableMasterTableEnabled(AcceptableMasterTableEnabled) = ACCEPTABLE_MASTER_TABLE_ENABLED;
    ExtPortConfigPortDataSet(ExtPortConfigPortDataSet) = EXT_PORT_CONFIG_PORT_DATA_SET;
    PathTraceEnable(PathTraceEnable) = PATH_TRACE_ENABLE;
    AlternateTimeOffsetEnable(AlternateTimeOffsetEnable) = ALTERNATE_TIME_OFFSET_ENABLE;
    GrandmasterClusterTable(GrandmasterClusterTable) = GRANDMASTER_CLUSTER_TABLE;
    AcceptableMasterTable(AcceptableMasterTable) = ACCEPTABLE_MASTER_TABLE;
    AcceptableMasterMaxTableSize(AcceptableMasterMaxTableSize) = ACCEPTABLE_MASTER_MAX_TABLE_SIZE;
    AlternateTimeOffsetName(AlternateTimeOffsetName) = ALTERNATE_TIME_OFFSET_NAME;
    AlternateTimeOffsetMaxKey(AlternateTimeOffsetMaxKey) = ALTERNATE_TIME_OFFSET_MAX_KEY;
    AlternateTimeOffsetProperties(AlternateTimeOffsetProperties) = ALTERNATE_TIME_OFFSET_PROPERTIES;
    ExternalPortConfigurationEnabled(ExternalPortConfigurationEnabled) = EXTERNAL_PORT_CONFIGURATION_ENABLED;
    HoldoverUpgradeEnable(HoldoverUpgradeEnable) = HOLDOVER_UPGRADE_ENABLE;
    PathTraceList(PathTraceList) = PATH_TRACE_LIST;
    TimeStatusNp(TimeStatusNp) = TIME_STATUS_NP;
    GrandmasterSettingsNp(GrandmasterSettingsNp) = GRANDMASTER_SETTINGS_NP;
    PortDataSetNp(PortDataSetNp) = PORT_DATA_SET_NP;
    SubscribeEventsNp(SubscribeEventsNp) = SUBSCRIBE_EVENTS_NP;
    PortPropertiesNp(PortPropertiesNp) = PORT_PROPERTIES_NP;
    PortStatsNp(PortStatsNp) = PORT_STATS_NP;
    SynchronizationUncertainNp(SynchronizationUncertainNp) = SYNCHRONIZATION_UNCERTAIN_NP;
    PortServiceStatsNp(PortServiceStatsNp) = PORT_SERVICE_STATS_NP;
    UnicastMasterTableNp(UnicastMasterTableNp) = UNICAST_MASTER_TABLE_NP;
    PortHwclockNp(PortHwclockNp) = PORT_HWCLOCK_NP;
    PowerProfileSettingsNp(PowerProfileSettingsNp) = POWER_PROFILE_SETTINGS_NP;
    CmldsInfoNp(CmldsInfoNp) = CMLDS_INFO_NP;
}

/// A fully parsed, or about-to-be-built, management message.
#[derive(Debug, Clone)]
pub struct ManagementMessage {
    /// The common PTP header.
    pub header: PtpHeader,
    /// targetPortIdentity from the managementMessage prefix.
    pub target: PortIdentity,
    /// startingBoundaryHops.
    pub starting_boundary_hops: u8,
    /// boundaryHops, decremented by each boundary clock traversed.
    pub boundary_hops: u8,
    /// The action this message carries.
    pub action: Action,
    /// The typed payload, absent only for a MANAGEMENT_ERROR_STATUS reply
    /// (see [`crate::error_status::ManagementErrorStatus`] in that case).
    pub body: Option<ManagementBody>,
}

/// Builds a management message for `action` on `id` with payload `body`.
/// `body` is ignored (an empty dataField is written) when `action == Get`
/// and `params.use_zero_get` is set, or when `id.is_empty()`. When
/// `params.spp`/`params.sa` are both set, an AUTHENTICATION TLV is appended
/// and the ICV computed over the finalized message (spec.md §4.8).
pub fn build(
    params: &MsgParams,
    action: Action,
    id: ManagementId,
    body: Option<&ManagementBody>,
) -> Result<Vec<u8>> {
    if !id.is_valid(params.implement_specific) {
        return Err(ManagementError::UnknownManagementId(id.as_u16()));
    }
    let legality = id.legality();
    let action_ok = match action {
        Action::Get => legality.get,
        Action::Set => legality.set,
        Action::Command => legality.command,
        Action::Response | Action::Acknowledge => true,
    };
    if !action_ok {
        return Err(ManagementError::ActionMismatch);
    }

    let mut w = Writer::new();
    let header = PtpHeader::new(
        MessageType::Management,
        control_field::MANAGEMENT,
        params.transport_specific,
        params.domain_number,
        0,
        params.is_unicast,
        params.self_id,
        params.sequence_id,
        params.log_message_interval,
    );
    header.build(&mut w);

    let prefix = ManagementMessagePrefixWire {
        target_port_identity: {
            let mut pw = Writer::new();
            params.target.build(&mut pw);
            let bytes = pw.into_bytes();
            let mut arr = [0u8; PortIdentity::WIRE_SIZE];
            arr.copy_from_slice(&bytes);
            arr
        },
        starting_boundary_hops: params.boundary_hops,
        boundary_hops: params.boundary_hops,
        action_field: action as u8,
        reserved: 0,
    };
    w.write_bytes(prefix.as_bytes());

    let tlv_header_offset = w.len();
    let tlv_header = TlvHeaderWire {
        tlv_type: TLV_TYPE_MANAGEMENT.into(),
        length_field: 0.into(),
    };
    w.write_bytes(tlv_header.as_bytes());
    w.write_u16(id.as_u16());

    let body_offset = w.len();
    let write_empty = id.is_empty() || (action == Action::Get && params.use_zero_get);
    if !write_empty {
        match body {
            Some(b) => b.build(&mut w),
            None => return Err(ManagementError::ActionMismatch),
        }
    }
    w.align_even();

    let tlv_length = (w.len() - body_offset + 2) as u16; // +2 for managementId
    w.patch_u16(tlv_header_offset + 2, tlv_length);

    let total_len = w.len() as u16;
    w.patch_u16(2, total_len);

    let bytes = w.into_bytes();
    match (params.spp, params.sa.as_deref()) {
        (Some(spp_id), Some(sa)) => {
            crate::authentication::append(bytes, spp_id, params.active_key_id, sa)
        }
        _ => Ok(bytes),
    }
}

/// Parses a management message, returning `Ok` for MANAGEMENT TLVs and
/// `Err(ManagementErrorStatus)` for a MANAGEMENT_ERROR_STATUS reply
/// (spec.md §4.4 step 4). A trailing AUTHENTICATION TLV is verified against
/// `params.sa` first; when `params.require_auth` is set and `allow_unauth`
/// is zero, a message without one is rejected with `AuthFailed`.
pub fn parse(params: &MsgParams, buf: &[u8]) -> Result<ManagementMessage> {
    let mut c = Cursor::new(buf);
    let header = PtpHeader::parse(&mut c)?;
    if !matches!(header.message_type, crate::header::MessageTypeTag::Management) {
        return Err(ManagementError::InvalidHeader(
            "messageType is not Management",
        ));
    }
    if header.message_length as usize > buf.len() {
        return Err(ManagementError::InvalidHeader(
            "messageLength exceeds buffer",
        ));
    }

    let tlvs_start = crate::header::HEADER_WIRE_SIZE + PREFIX_WIRE_SIZE;
    let empty_sa = crate::sa_file::SaFile::default();
    let sa_ref = params.sa.as_deref().unwrap_or(&empty_sa);
    crate::authentication::verify(buf, tlvs_start, sa_ref, params.require_auth, params.allow_unauth)?;

    let prefix_bytes = c.read_bytes(PREFIX_WIRE_SIZE)?;
    let prefix = ManagementMessagePrefixWire::read_from(prefix_bytes).ok_or(ManagementError::ShortBuffer)?;
    let mut tpc = Cursor::new(&prefix.target_port_identity);
    let target = PortIdentity::parse(&mut tpc)?;
    let action = Action::from_u8(prefix.action_field)?;

    let tlv_header_bytes = c.read_bytes(TLV_HEADER_WIRE_SIZE)?;
    let tlv_header = TlvHeaderWire::read_from(tlv_header_bytes).ok_or(ManagementError::ShortBuffer)?;
    let tlv_type: u16 = tlv_header.tlv_type.into();
    let length_field: u16 = tlv_header.length_field.into();

    match tlv_type {
        TLV_TYPE_MANAGEMENT => {
            let management_id_raw = c.read_u16()?;
            let id = ManagementId::from_u16(management_id_raw)
                .ok_or(ManagementError::UnknownManagementId(management_id_raw))?;
            if !id.is_valid(params.implement_specific) {
                return Err(ManagementError::UnknownManagementId(management_id_raw));
            }
            let body_len = (length_field as usize).checked_sub(2).ok_or(ManagementError::LengthMismatch)?;
            if body_len > c.remaining() {
                return Err(ManagementError::LengthMismatch);
            }
            let body = if id.is_empty() {
                if body_len != 0 {
                    return Err(ManagementError::LengthMismatch);
                }
                None
            } else {
                Some(ManagementBody::parse_for(id, &mut c, body_len)?)
            };
            Ok(ManagementMessage {
                header,
                target,
                starting_boundary_hops: prefix.starting_boundary_hops,
                boundary_hops: prefix.boundary_hops,
                action,
                body,
            })
        }
        TLV_TYPE_MANAGEMENT_ERROR_STATUS => {
            let status = crate::error_status::ManagementErrorStatus::parse(&mut c, length_field as usize)?;
            Err(ManagementError::ManagementErrorStatus {
                error_id: status.management_error_id,
                management_id: status.management_id,
                display_data: status.display_data,
            })
        }
        _ => Err(ManagementError::ActionMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MsgParams;

    fn params() -> MsgParams {
        let mut p = MsgParams::default();
        p.target = PortIdentity::all_ones();
        p.sequence_id = 137;
        p
    }

    #[test]
    fn priority1_set_round_trips_to_response() {
        let p = params();
        let body = ManagementBody::Priority1(Priority1 { priority1: 0x7f });
        let mut bytes = build(&p, Action::Set, ManagementId::PRIORITY1, Some(&body)).unwrap();
        assert_eq!(bytes.len(), 56);
        assert_eq!(bytes[ACTION_FIELD_OFFSET], 0x01);
        bytes[ACTION_FIELD_OFFSET] = Action::Response as u8;
        let msg = parse(&p, &bytes).unwrap();
        assert_eq!(msg.action, Action::Response);
        assert_eq!(
            msg.body.unwrap(),
            ManagementBody::Priority1(Priority1 { priority1: 0x7f })
        );
    }

    #[test]
    fn empty_get_is_54_bytes() {
        let p = params();
        let bytes = build(&p, Action::Get, ManagementId::NULL_PTP_MANAGEMENT, None).unwrap();
        assert_eq!(bytes.len(), 54);
        let msg = parse(&p, &bytes).unwrap();
        assert!(msg.body.is_none());
    }

    #[test]
    fn priority2_body_matches_literal_scenario_bytes() {
        let p = params();
        let body = ManagementBody::Priority2(Priority2 { priority2: 119 });
        let bytes = build(&p, Action::Set, ManagementId::PRIORITY2, Some(&body)).unwrap();
        assert_eq!(&bytes[52..55], &[0x20, 0x06, 0x77]);
    }

    #[test]
    fn domain_body_matches_literal_scenario_bytes() {
        let p = params();
        let body = ManagementBody::Domain(Domain { domain_number: 7 });
        let bytes = build(&p, Action::Set, ManagementId::DOMAIN, Some(&body)).unwrap();
        assert_eq!(&bytes[52..55], &[0x20, 0x07, 0x07]);
    }

    #[test]
    fn path_trace_list_round_trips_two_entries() {
        let p = params();
        let list = vec![
            crate::types::ClockIdentity([0xc4, 0x7d, 0x46, 0xff, 0xfe, 0x20, 0xac, 0xae]),
            crate::types::ClockIdentity([0x0c, 0x04, 0x13, 0x61, 0x0b, 0x4a, 0x0c, 0x4a]),
        ];
        let body = ManagementBody::PathTraceList(PathTraceList { list: list.clone() });
        let bytes = build(&p, Action::Response, ManagementId::PATH_TRACE_LIST, Some(&body)).unwrap();
        let msg = parse(&p, &bytes).unwrap();
        match msg.body.unwrap() {
            ManagementBody::PathTraceList(pt) => assert_eq!(pt.list, list),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn alternate_time_offset_properties_round_trips_48_bit_jump() {
        let p = params();
        let body = ManagementBody::AlternateTimeOffsetProperties(AlternateTimeOffsetProperties {
            key_field: 13,
            current_offset: -2145493247,
            jump_seconds: -2147413249,
            time_of_next_jump: 0x912478321891,
        });
        let bytes = build(
            &p,
            Action::Response,
            ManagementId::ALTERNATE_TIME_OFFSET_PROPERTIES,
            Some(&body),
        )
        .unwrap();
        let msg = parse(&p, &bytes).unwrap();
        assert_eq!(msg.body.unwrap(), body);
    }

    #[test]
    fn management_error_status_reply_is_classified_on_parse() {
        use crate::error_status::{error_id, ManagementErrorStatus};
        use crate::types::PTPText;

        let p = params();
        let mut w = Writer::new();
        let header = PtpHeader::new(
            MessageType::Management,
            control_field::MANAGEMENT,
            p.transport_specific,
            p.domain_number,
            0,
            p.is_unicast,
            p.self_id,
            p.sequence_id,
            p.log_message_interval,
        );
        header.build(&mut w);
        let prefix = ManagementMessagePrefixWire {
            target_port_identity: {
                let mut pw = Writer::new();
                p.target.build(&mut pw);
                let bytes = pw.into_bytes();
                let mut arr = [0u8; PortIdentity::WIRE_SIZE];
                arr.copy_from_slice(&bytes);
                arr
            },
            starting_boundary_hops: p.boundary_hops,
            boundary_hops: p.boundary_hops,
            action_field: Action::Response as u8,
            reserved: 0,
        };
        w.write_bytes(prefix.as_bytes());

        let tlv_header_offset = w.len();
        let tlv_header = TlvHeaderWire {
            tlv_type: TLV_TYPE_MANAGEMENT_ERROR_STATUS.into(),
            length_field: 0.into(),
        };
        w.write_bytes(tlv_header.as_bytes());
        let body_offset = w.len();
        let status = ManagementErrorStatus {
            management_error_id: error_id::WRONG_VALUE,
            management_id: ManagementId::PRIORITY1.as_u16(),
            display_data: PTPText::from("test 123"),
        };
        status.build(&mut w);
        w.align_even();
        let tlv_length = (w.len() - body_offset) as u16;
        w.patch_u16(tlv_header_offset + 2, tlv_length);
        let total_len = w.len() as u16;
        w.patch_u16(2, total_len);

        let bytes = w.into_bytes();
        let err = parse(&p, &bytes).unwrap_err();
        match err {
            ManagementError::ManagementErrorStatus {
                error_id,
                management_id,
                display_data,
            } => {
                assert_eq!(error_id, error_id::WRONG_VALUE);
                let _ = management_id;
                assert_eq!(display_data.as_str(), "test 123");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
