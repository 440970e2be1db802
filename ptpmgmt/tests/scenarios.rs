//! End-to-end scenarios (spec.md §8, S1-S6) exercised purely through the
//! crate's public API, complementing the whitebox unit tests that poke at
//! wire offsets directly.

use std::sync::Arc;

use ptpmgmt::management::{
    self,
    values::{Domain, Priority1, Priority2},
    Action, ManagementBody, ManagementId,
};
use ptpmgmt::params::MsgParams;
use ptpmgmt::signaling::{self, OutgoingTlv};
use ptpmgmt::types::{ClockIdentity, PortIdentity};
use ptpmgmt::sa_file::SaFile;

fn params() -> MsgParams {
    let mut p = MsgParams::default();
    p.target = PortIdentity::all_ones();
    p.sequence_id = 137;
    p
}

/// S1: PRIORITY1 SET round-trips to a RESPONSE after flipping the
/// actionField.
#[test]
fn s1_priority1_set_round_trip() {
    let p = params();
    let body = ManagementBody::Priority1(Priority1 { priority1: 0x7f });
    let mut bytes = management::build(&p, Action::Set, ManagementId::PRIORITY1, Some(&body)).unwrap();
    assert_eq!(bytes.len(), 56);
    assert_eq!(bytes[management::ACTION_FIELD_OFFSET], Action::Set as u8);
    bytes[management::ACTION_FIELD_OFFSET] = Action::Response as u8;

    let msg = management::parse(&p, &bytes).unwrap();
    assert_eq!(msg.action, Action::Response);
    assert_eq!(msg.body, Some(body));
}

/// S3: a signaling frame carrying two MANAGEMENT TLVs (PRIORITY2, DOMAIN)
/// yields both entries in insertion order.
#[test]
fn s3_signaling_two_management_tlvs() {
    let mut p = params();
    p.rcv_signaling = true;
    let priority2 = ManagementBody::Priority2(Priority2 { priority2: 119 });
    let domain = ManagementBody::Domain(Domain { domain_number: 7 });
    let bytes = signaling::build(
        &p,
        &[
            OutgoingTlv::Management(ManagementId::PRIORITY2, Some(&priority2)),
            OutgoingTlv::Management(ManagementId::DOMAIN, Some(&domain)),
        ],
    )
    .unwrap();

    let msg = signaling::parse(&p, &bytes).unwrap();
    assert_eq!(msg.tlv_count(), 2);
    assert_eq!(msg.management_id(0), Some(ManagementId::PRIORITY2));
    assert_eq!(msg.management_body(0), Some(&priority2));
    assert_eq!(msg.management_id(1), Some(ManagementId::DOMAIN));
    assert_eq!(msg.management_body(1), Some(&domain));
}

/// S4: PATH_TRACE_LIST carries exactly the two configured clock identities.
#[test]
fn s4_path_trace_list_two_entries() {
    use ptpmgmt::management::values::PathTraceList;

    let p = params();
    let list = vec![
        ClockIdentity([0xc4, 0x7d, 0x46, 0xff, 0xfe, 0x20, 0xac, 0xae]),
        ClockIdentity([0x0c, 0x04, 0x13, 0x61, 0x0b, 0x4a, 0x0c, 0x4a]),
    ];
    let body = ManagementBody::PathTraceList(PathTraceList { list: list.clone() });
    let bytes = management::build(&p, Action::Response, ManagementId::PATH_TRACE_LIST, Some(&body)).unwrap();
    let msg = management::parse(&p, &bytes).unwrap();
    match msg.body.unwrap() {
        ManagementBody::PathTraceList(pt) => assert_eq!(pt.list, list),
        other => panic!("unexpected body {other:?}"),
    }
}

/// S5: ALTERNATE_TIME_OFFSET_PROPERTIES round-trips a 48-bit
/// `timeOfNextJump`.
#[test]
fn s5_alternate_time_offset_properties_48_bit_jump() {
    use ptpmgmt::management::values::AlternateTimeOffsetProperties;

    let p = params();
    let body = ManagementBody::AlternateTimeOffsetProperties(AlternateTimeOffsetProperties {
        key_field: 13,
        current_offset: -2145493247,
        jump_seconds: -2147413249,
        time_of_next_jump: 0x912478321891,
    });
    let bytes = management::build(
        &p,
        Action::Response,
        ManagementId::ALTERNATE_TIME_OFFSET_PROPERTIES,
        Some(&body),
    )
    .unwrap();
    let msg = management::parse(&p, &bytes).unwrap();
    assert_eq!(msg.body, Some(body));
}

fn sa_with_sha256_key() -> Arc<SaFile> {
    let text = "\
[0]
ownID=0
1 0x14ddb0fd5013ffca46417ff29d3435d49daa01c337ce4c4c1c2c4675ae605ccd alg=SHA256 mac=12
";
    Arc::new(SaFile::parse(text).unwrap())
}

/// S6: selecting an SPP/keyID in `MsgParams` makes `build` append an
/// AUTHENTICATION TLV that `parse` verifies transparently, and a single
/// tampered byte anywhere before the ICV causes `parse` to fail closed.
#[test]
fn s6_authentication_tlv_covers_whole_message() {
    let mut p = params();
    p.spp = Some(0);
    p.active_key_id = 1;
    p.sa = Some(sa_with_sha256_key());
    p.require_auth = true;

    let body = ManagementBody::Priority1(Priority1 { priority1: 0x7f });
    let with_auth = management::build(&p, Action::Set, ManagementId::PRIORITY1, Some(&body)).unwrap();
    let plain = management::build(&MsgParams::default(), Action::Set, ManagementId::PRIORITY1, Some(&body)).unwrap();
    assert!(with_auth.len() > plain.len());

    let msg = management::parse(&p, &with_auth).unwrap();
    assert_eq!(msg.body, Some(body));

    let mut tampered = with_auth.clone();
    tampered[54] ^= 0xff; // flip a body byte, well before the ICV
    assert!(matches!(
        management::parse(&p, &tampered),
        Err(ptpmgmt::ManagementError::AuthFailed)
    ));
}

/// P7/part 2: `parse` rejects a message carrying no AUTHENTICATION TLV at
/// all when `require_auth` is set and `allow_unauth == 0`, purely through
/// `MsgParams`, with no direct call into the authentication module.
#[test]
fn missing_authentication_tlv_rejected_through_params() {
    let mut p = params();
    p.require_auth = true;
    p.sa = Some(sa_with_sha256_key());

    let body = ManagementBody::Priority1(Priority1 { priority1: 0x7f });
    let unsigned = management::build(&MsgParams::default(), Action::Set, ManagementId::PRIORITY1, Some(&body)).unwrap();
    assert!(matches!(
        management::parse(&p, &unsigned),
        Err(ptpmgmt::ManagementError::AuthFailed)
    ));

    p.allow_unauth = 1;
    assert!(management::parse(&p, &unsigned).is_ok());
}

/// Signaling messages go through the same `MsgParams`-driven authentication
/// stage as management messages.
#[test]
fn signaling_authentication_round_trips_through_params() {
    let mut p = params();
    p.rcv_signaling = true;
    p.spp = Some(0);
    p.active_key_id = 1;
    p.sa = Some(sa_with_sha256_key());
    p.require_auth = true;

    let priority2 = ManagementBody::Priority2(Priority2 { priority2: 119 });
    let bytes = signaling::build(
        &p,
        &[OutgoingTlv::Management(ManagementId::PRIORITY2, Some(&priority2))],
    )
    .unwrap();

    let msg = signaling::parse(&p, &bytes).unwrap();
    assert_eq!(msg.management_body(0), Some(&priority2));

    let mut tampered = bytes.clone();
    tampered[44] ^= 0xff;
    assert!(matches!(
        signaling::parse(&p, &tampered),
        Err(ptpmgmt::ManagementError::AuthFailed)
    ));
}

/// P8: loading the same SA file text twice produces byte-equal key lookups.
#[test]
fn p8_sa_file_load_is_idempotent() {
    let text = "\
[0]
ownID=0
1 0x14ddb0fd5013ffca46417ff29d3435d49daa01c337ce4c4c1c2c4675ae605ccd alg=SHA256 mac=12
";
    let a = SaFile::parse(text).unwrap();
    let b = SaFile::parse(text).unwrap();
    assert_eq!(a.spp(0).unwrap().key(1).unwrap(), b.spp(0).unwrap().key(1).unwrap());
    assert_eq!(a.spp(0).unwrap().mac_size(1).unwrap(), b.spp(0).unwrap().mac_size(1).unwrap());
}
