//! Caller-controlled envelope knobs (`MsgParams`) governing how the next
//! message is built and how a parsed message is interpreted.

use std::collections::HashSet;
use std::sync::Arc;

use crate::sa_file::SaFile;
use crate::types::PortIdentity;

/// Which vendor extension vocabulary, if any, is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ImplementSpecific {
    /// No vendor extension ids are valid.
    #[default]
    None,
    /// The linuxptp `_NP` management ids and signaling TLVs are valid.
    Linuxptp,
}

/// Source of default values consumed by [`MsgParams::from_config`], mirroring
/// the config-file keys documented in spec.md §6. Implementations read their
/// own config-file format; this crate only consumes the parsed values.
pub trait ConfigSource {
    /// Looks up a key within `section` (or the `[global]` section when
    /// `section` is `None`), returning its raw string value if present.
    fn get(&self, section: Option<&str>, key: &str) -> Option<String>;
}

/// A `ConfigSource` that always returns the documented defaults, useful for
/// tests and for callers with no configuration file.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticConfig;

impl ConfigSource for StaticConfig {
    fn get(&self, _section: Option<&str>, _key: &str) -> Option<String> {
        None
    }
}

/// Envelope knobs controlling message build/parse behavior.
#[derive(Debug, Clone)]
pub struct MsgParams {
    /// 4-bit transportSpecific / majorSdoId written into the header.
    pub transport_specific: u8,
    /// domainNumber written into the header.
    pub domain_number: u8,
    /// boundaryHops written into the managementMessage prefix.
    pub boundary_hops: u8,
    /// Whether the unicastFlag bit is set.
    pub is_unicast: bool,
    /// Which vendor extension vocabulary is active.
    pub implement_specific: ImplementSpecific,
    /// targetPortIdentity written into the managementMessage prefix.
    pub target: PortIdentity,
    /// The local clock's own port identity, written as sourcePortIdentity.
    pub self_id: PortIdentity,
    /// When true, GET requests carry a zero-length dataField.
    pub use_zero_get: bool,
    /// Whether signaling messages should be parsed at all.
    pub rcv_signaling: bool,
    /// Whether to restrict parsed signaling TLVs to `allowed_signaling_tlv_types`.
    pub filter_signaling: bool,
    /// The allow-set consulted when `filter_signaling` is true.
    pub allowed_signaling_tlv_types: HashSet<u16>,
    /// Whether SMPTE organization-extension TLVs should be parsed.
    pub rcv_smpte_org: bool,
    /// Whether an unauthenticated response is accepted when the request was
    /// authenticated: 0 = never, 1 = if no SA configured, 2 = always.
    pub allow_unauth: u8,
    /// sequenceId counter for the next built message.
    pub sequence_id: u16,
    /// logMessageInterval written into the header.
    pub log_message_interval: i8,
    /// The SPP to authenticate under. `build` appends an AUTHENTICATION TLV
    /// only when this and [`MsgParams::sa`] are both set (spec.md §4.8).
    pub spp: Option<u8>,
    /// The key within the active SPP's table to sign/verify with.
    pub active_key_id: u32,
    /// Whether `parse` rejects a message with no trailing AUTHENTICATION TLV
    /// (subject to [`MsgParams::allow_unauth`]).
    pub require_auth: bool,
    /// The loaded key store consulted by the authentication stage. `None`
    /// disables both appending on build and verification on parse.
    pub sa: Option<Arc<SaFile>>,
}

impl Default for MsgParams {
    fn default() -> Self {
        MsgParams {
            transport_specific: 0,
            domain_number: 0,
            boundary_hops: 1,
            is_unicast: false,
            implement_specific: ImplementSpecific::None,
            target: PortIdentity::all_ones(),
            self_id: PortIdentity::default(),
            use_zero_get: true,
            rcv_signaling: false,
            filter_signaling: false,
            allowed_signaling_tlv_types: HashSet::new(),
            rcv_smpte_org: false,
            allow_unauth: 0,
            sequence_id: 0,
            log_message_interval: 0x7f,
            spp: None,
            active_key_id: 0,
            require_auth: false,
            sa: None,
        }
    }
}

impl MsgParams {
    /// Builds params from documented config-file defaults (spec.md §6),
    /// falling back to protocol defaults for anything the source doesn't
    /// provide.
    pub fn from_config(source: &dyn ConfigSource, section: Option<&str>) -> Self {
        let mut p = MsgParams::default();
        if let Some(v) = source.get(section, "transportSpecific") {
            if let Ok(n) = v.parse::<u8>() {
                p.transport_specific = n & 0x0f;
            }
        }
        if let Some(v) = source.get(section, "domainNumber") {
            if let Ok(n) = v.parse::<u8>() {
                p.domain_number = n;
            }
        }
        if let Some(v) = source.get(section, "allow_unauth") {
            if let Ok(n) = v.parse::<u8>() {
                p.allow_unauth = n;
            }
        }
        if let Some(v) = source.get(section, "active_key_id") {
            if let Ok(n) = v.parse::<u32>() {
                p.active_key_id = n;
            }
        }
        if let Some(v) = source.get(section, "spp") {
            if let Ok(n) = v.parse::<u8>() {
                p.spp = Some(n);
            }
        }
        p
    }

    /// Replaces the active params wholesale, per spec.md §4.6 — this is the
    /// only supported way to change build behavior for the next message;
    /// no field is individually validated, every combination is accepted.
    pub fn update_params(&mut self, new_params: MsgParams) {
        *self = new_params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<&'static str, &'static str>);

    impl ConfigSource for MapConfig {
        fn get(&self, _section: Option<&str>, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn defaults_carry_no_authentication_selection() {
        let p = MsgParams::default();
        assert!(p.spp.is_none());
        assert!(p.sa.is_none());
        assert!(!p.require_auth);
        assert_eq!(p.active_key_id, 0);
    }

    #[test]
    fn from_config_reads_spp_and_active_key_id() {
        let source = MapConfig(HashMap::from([
            ("spp", "0"),
            ("active_key_id", "1"),
            ("allow_unauth", "2"),
        ]));
        let p = MsgParams::from_config(&source, None);
        assert_eq!(p.spp, Some(0));
        assert_eq!(p.active_key_id, 1);
        assert_eq!(p.allow_unauth, 2);
    }

    #[test]
    fn update_params_replaces_every_field() {
        let mut p = MsgParams::default();
        let mut replacement = MsgParams::default();
        replacement.sequence_id = 42;
        replacement.spp = Some(3);
        p.update_params(replacement);
        assert_eq!(p.sequence_id, 42);
        assert_eq!(p.spp, Some(3));
    }
}
