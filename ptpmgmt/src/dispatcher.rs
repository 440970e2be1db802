//! Build and dump dispatchers (spec.md §4.7).
//!
//! The build dispatcher's per-field bounds table mirrors
//! `original_source/cfg.cpp`'s `range_t`/`ranges[]` table — there a
//! `{name, def, min, max}` row bounds one config key; here a [`FieldSpec`]
//! row bounds one textual field of a management SET body, keyed by
//! [`ManagementId`] instead of by config section. The dump dispatcher is a
//! set of per-id/per-TLV callback hooks, the receive-side counterpart.

use std::collections::HashMap;

use crate::errors::{ManagementError, Result};
use crate::management::values::*;
use crate::management::{ManagementBody, ManagementId, ManagementMessage};
use crate::signaling::{SignalingBody, SignalingMessage};

/// Bounds and default for one textual field of a build-dispatcher entry.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// The field's key in the textual key/value map passed to [`build`].
    pub name: &'static str,
    /// Smallest legal value.
    pub min: i64,
    /// Largest legal value.
    pub max: i64,
    /// Value used when the caller omits this field.
    pub default: i64,
    /// Whether the caller must supply this field explicitly.
    pub required: bool,
}

const fn field(name: &'static str, min: i64, max: i64, default: i64, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        min,
        max,
        default,
        required,
    }
}

fn lookup(fields: &[FieldSpec], name: &str) -> &FieldSpec {
    fields
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("build dispatcher entry has no field named {name}"))
}

fn field_i64(fields: &[FieldSpec], values: &HashMap<String, String>, name: &str) -> Result<i64> {
    let spec = lookup(fields, name);
    let v = match values.get(name) {
        Some(raw) => raw.parse::<i64>().map_err(|_| ManagementError::ValueOutOfRange)?,
        None if spec.required => return Err(ManagementError::ActionMismatch),
        None => spec.default,
    };
    if v < spec.min || v > spec.max {
        return Err(ManagementError::ValueOutOfRange);
    }
    Ok(v)
}

/// Parses a custom (non-integer-range) textual field, looking it up first
/// like [`field_i64`] so a missing required field still reports
/// [`ManagementError::ActionMismatch`] instead of the custom parser's error.
fn field_custom<T>(
    fields: &[FieldSpec],
    values: &HashMap<String, String>,
    name: &str,
    parse: impl FnOnce(&str) -> Result<T>,
    default: T,
) -> Result<T> {
    let spec = lookup(fields, name);
    match values.get(name) {
        Some(raw) => parse(raw),
        None if spec.required => Err(ManagementError::ActionMismatch),
        None => Ok(default),
    }
}

/// Custom textual parsers for fields whose legal values are not a simple
/// integer range.
pub mod custom {
    use crate::errors::{ManagementError, Result};

    /// `timeSource` (IEEE 1588-2019 Table 16): a handful of named enum
    /// values rather than a contiguous range.
    pub fn parse_time_source(raw: &str) -> Result<u8> {
        match raw {
            "ATOMIC_CLOCK" => Ok(0x10),
            "GPS" => Ok(0x20),
            "TERRESTRIAL_RADIO" => Ok(0x30),
            "SERIAL_TIME_CODE" => Ok(0x39),
            "PTP" => Ok(0x40),
            "NTP" => Ok(0x50),
            "HAND_SET" => Ok(0x60),
            "OTHER" => Ok(0x90),
            "INTERNAL_OSCILLATOR" => Ok(0xa0),
            _ => Err(ManagementError::ValueOutOfRange),
        }
    }

    /// `delayMechanism` (IEEE 1588-2019 Table 16).
    pub fn parse_delay_mechanism(raw: &str) -> Result<u8> {
        match raw {
            "E2E" => Ok(1),
            "P2P" => Ok(2),
            "NO_MECHANISM" => Ok(0xfe),
            "COMMON_P2P" => Ok(3),
            "SPECIAL" => Ok(4),
            _ => Err(ManagementError::ValueOutOfRange),
        }
    }

    /// `portState` (IEEE 1588-2019 Table 21).
    pub fn parse_port_state(raw: &str) -> Result<u8> {
        match raw {
            "INITIALIZING" => Ok(1),
            "FAULTY" => Ok(2),
            "DISABLED" => Ok(3),
            "LISTENING" => Ok(4),
            "PRE_MASTER" => Ok(5),
            "MASTER" => Ok(6),
            "PASSIVE" => Ok(7),
            "UNCALIBRATED" => Ok(8),
            "SLAVE" => Ok(9),
            _ => Err(ManagementError::ValueOutOfRange),
        }
    }
}

/// One build-dispatcher entry: the field table plus the closure that
/// assembles a [`ManagementBody`] from a textual key/value map.
pub struct BuildEntry {
    /// The management id this entry builds a body for.
    pub id: ManagementId,
    /// The field bounds table, in the spirit of `cfg.cpp`'s `ranges[]`.
    pub fields: &'static [FieldSpec],
    build: fn(&[FieldSpec], &HashMap<String, String>) -> Result<ManagementBody>,
}

macro_rules! build_entries {
    ( $( $id:ident : [ $( $f:expr ),* $(,)? ] => $build:expr ; )* ) => {
        /// Every id this crate can build a SET body for from textual fields.
        pub const BUILD_ENTRIES: &[BuildEntry] = &[
            $( BuildEntry {
                id: ManagementId::$id,
                fields: &[ $($f),* ],
                build: $build,
            }, )*
        ];
    };
}

build_entries! {
    PRIORITY1: [field("priority1", 0, 255, 128, true)] => |f, v| {
        Ok(ManagementBody::Priority1(Priority1 {
            priority1: field_i64(f, v, "priority1")? as u8,
        }))
    };
    PRIORITY2: [field("priority2", 0, 255, 128, true)] => |f, v| {
        Ok(ManagementBody::Priority2(Priority2 {
            priority2: field_i64(f, v, "priority2")? as u8,
        }))
    };
    DOMAIN: [field("domainNumber", 0, 127, 0, true)] => |f, v| {
        Ok(ManagementBody::Domain(Domain {
            domain_number: field_i64(f, v, "domainNumber")? as u8,
        }))
    };
    SLAVE_ONLY: [field("slaveOnly", 0, 1, 0, true)] => |f, v| {
        Ok(ManagementBody::SlaveOnly(SlaveOnly {
            slave_only: field_i64(f, v, "slaveOnly")? != 0,
        }))
    };
    LOG_ANNOUNCE_INTERVAL: [field("logAnnounceInterval", -128, 127, 1, true)] => |f, v| {
        Ok(ManagementBody::LogAnnounceInterval(LogAnnounceInterval {
            log_announce_interval: field_i64(f, v, "logAnnounceInterval")? as i8,
        }))
    };
    LOG_SYNC_INTERVAL: [field("logSyncInterval", -128, 127, 0, true)] => |f, v| {
        Ok(ManagementBody::LogSyncInterval(LogSyncInterval {
            log_sync_interval: field_i64(f, v, "logSyncInterval")? as i8,
        }))
    };
    VERSION_NUMBER: [field("versionNumber", 0, 15, 2, true)] => |f, v| {
        Ok(ManagementBody::VersionNumber(VersionNumber {
            version_number: field_i64(f, v, "versionNumber")? as u8,
        }))
    };
    DELAY_MECHANISM: [field("delayMechanism", 0, 255, 1, true)] => |f, v| {
        let dm = field_custom(f, v, "delayMechanism", custom::parse_delay_mechanism, 1)?;
        Ok(ManagementBody::DelayMechanism(DelayMechanism {
            delay_mechanism: dm,
        }))
    };
}

/// Looks up the build-dispatcher entry for `id`, if any.
pub fn find(id: ManagementId) -> Option<&'static BuildEntry> {
    BUILD_ENTRIES.iter().find(|e| e.id == id)
}

/// Builds a [`ManagementBody`] for `id` from textual `fields`, validating
/// each against the entry's [`FieldSpec`] table.
pub fn build(id: ManagementId, values: &HashMap<String, String>) -> Result<ManagementBody> {
    let entry = find(id).ok_or(ManagementError::UnknownManagementId(id.as_u16()))?;
    (entry.build)(entry.fields, values)
}

/// Per-id and per-TLV callback hooks invoked while walking a received
/// message, the receive-side counterpart to the build dispatcher.
#[derive(Default)]
pub struct DumpDispatcher {
    management_hooks: HashMap<ManagementId, Box<dyn FnMut(&ManagementBody)>>,
    signaling_hook: Option<Box<dyn FnMut(u16, &SignalingBody)>>,
}

impl DumpDispatcher {
    /// An empty dispatcher with no hooks registered.
    pub fn new() -> Self {
        DumpDispatcher::default()
    }

    /// Registers `hook` to run when a management message carrying `id` is
    /// dispatched.
    pub fn on_management(&mut self, id: ManagementId, hook: impl FnMut(&ManagementBody) + 'static) {
        self.management_hooks.insert(id, Box::new(hook));
    }

    /// Registers `hook` to run once per TLV of a dispatched signaling
    /// message, receiving its tlvType alongside the typed body.
    pub fn on_signaling(&mut self, hook: impl FnMut(u16, &SignalingBody) + 'static) {
        self.signaling_hook = Some(Box::new(hook));
    }

    /// Invokes the hook registered for `msg`'s management id, if any.
    pub fn dispatch_management(&mut self, msg: &ManagementMessage) {
        let Some(body) = &msg.body else { return };
        if let Some(hook) = self.management_hooks.get_mut(&body.management_id()) {
            hook(body);
        }
    }

    /// Invokes the signaling hook once per TLV in `msg`, in order.
    pub fn dispatch_signaling(&mut self, msg: &SignalingMessage) {
        let Some(hook) = &mut self.signaling_hook else { return };
        for entry in &msg.entries {
            hook(entry.tlv_type, &entry.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_priority1_from_text() {
        let body = build(ManagementId::PRIORITY1, &values(&[("priority1", "200")])).unwrap();
        assert_eq!(body, ManagementBody::Priority1(Priority1 { priority1: 200 }));
    }

    #[test]
    fn rejects_out_of_range_value() {
        let err = build(ManagementId::PRIORITY1, &values(&[("priority1", "999")])).unwrap_err();
        assert!(matches!(err, ManagementError::ValueOutOfRange));
    }

    #[test]
    fn missing_required_field_is_action_mismatch() {
        let err = build(ManagementId::DOMAIN, &values(&[])).unwrap_err();
        assert!(matches!(err, ManagementError::ActionMismatch));
    }

    #[test]
    fn custom_parser_resolves_named_delay_mechanism() {
        let body = build(
            ManagementId::DELAY_MECHANISM,
            &values(&[("delayMechanism", "P2P")]),
        )
        .unwrap();
        assert_eq!(
            body,
            ManagementBody::DelayMechanism(DelayMechanism { delay_mechanism: 2 })
        );
    }

    #[test]
    fn unknown_id_has_no_build_entry() {
        assert!(find(ManagementId::CLOCK_DESCRIPTION).is_none());
        assert!(matches!(
            build(ManagementId::CLOCK_DESCRIPTION, &values(&[])),
            Err(ManagementError::UnknownManagementId(_))
        ));
    }

    #[test]
    fn dump_dispatcher_invokes_hook_for_matching_id_only() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut d = DumpDispatcher::new();
        let seen_cloned = seen.clone();
        d.on_management(ManagementId::PRIORITY1, move |body| {
            seen_cloned.borrow_mut().push(body.clone());
        });

        let msg = ManagementMessage {
            header: crate::header::PtpHeader::new(
                crate::header::MessageType::Management,
                crate::header::control_field::MANAGEMENT,
                0,
                0,
                0,
                false,
                crate::types::PortIdentity::default(),
                0,
                0,
            ),
            target: crate::types::PortIdentity::default(),
            starting_boundary_hops: 1,
            boundary_hops: 1,
            action: crate::management::Action::Response,
            body: Some(ManagementBody::Priority2(Priority2 { priority2: 1 })),
        };
        d.dispatch_management(&msg);
        assert!(seen.borrow().is_empty());
    }
}
