//! The management-id registry: the single source of truth mapping a
//! `ManagementId` to its name and legality, generated through a small
//! declarative macro. This is the Rust analog of the original library's
//! `#define A(n)` struct-generation trick in `st_ids.h` (spec.md §9,
//! "dynamic dispatch by management id" redesign flag) — instead of a
//! preprocessor macro emitting ~60 subclasses of a virtual base, this macro
//! emits one flat enum plus lookup tables, eliminating the vtable.

use crate::params::ImplementSpecific;

/// Which actions a management id legally accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Legality {
    /// GET is legal for this id.
    pub get: bool,
    /// SET is legal for this id.
    pub set: bool,
    /// COMMAND is legal for this id.
    pub command: bool,
}

const RW: Legality = Legality {
    get: true,
    set: true,
    command: false,
};
const RO: Legality = Legality {
    get: true,
    set: false,
    command: false,
};
const CMD: Legality = Legality {
    get: false,
    set: false,
    command: true,
};

/// Which implementation owns a vendor-specific id, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Part of the base IEEE 1588-2019 vocabulary.
    Standard,
    /// A linuxptp `_NP` extension.
    Linuxptp,
}

macro_rules! management_ids {
    ( $( $name:ident = $id:literal, $legality:expr, $owner:expr, $empty:expr ; )* ) => {
        /// The full management-id vocabulary this crate understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        #[allow(missing_docs)]
        pub enum ManagementId {
            $( $name = $id, )*
        }

        impl ManagementId {
            /// Resolves a raw wire value to a known id.
            pub fn from_u16(v: u16) -> Option<Self> {
                match v {
                    $( $id => Some(ManagementId::$name), )*
                    _ => None,
                }
            }

            /// The wire value of this id.
            pub fn as_u16(self) -> u16 {
                self as u16
            }

            /// The canonical, case-sensitive name of this id, matching the
            /// IEEE 1588 management-id identifier.
            pub fn name(self) -> &'static str {
                match self {
                    $( ManagementId::$name => stringify!($name), )*
                }
            }

            /// Finds an id by name. `exact` requires a full match; when
            /// false, the first id whose name contains `needle` wins.
            pub fn find_by_name(needle: &str, exact: bool) -> Option<Self> {
                if exact {
                    return ALL.iter().copied().find(|id| id.name() == needle);
                }
                ALL.iter().copied().find(|id| id.name().contains(needle))
            }

            /// Which actions are legal for this id.
            pub fn legality(self) -> Legality {
                match self {
                    $( ManagementId::$name => $legality, )*
                }
            }

            /// Whether this id is a vendor extension, and if so whose.
            pub fn owner(self) -> Owner {
                match self {
                    $( ManagementId::$name => $owner, )*
                }
            }

            /// Whether this id's dataField is always empty.
            pub fn is_empty(self) -> bool {
                match self {
                    $( ManagementId::$name => $empty, )*
                }
            }

            /// Whether this id is valid for the given profile.
            pub fn is_valid(self, implement_specific: ImplementSpecific) -> bool {
                match self.owner() {
                    Owner::Standard => true,
                    Owner::Linuxptp => implement_specific == ImplementSpecific::Linuxptp,
                }
            }
        }

        /// Every id this crate knows about, in declaration order.
        pub const ALL: &[ManagementId] = &[ $( ManagementId::$name, )* ];
    };
}

management_ids! {
    NULL_PTP_MANAGEMENT = 0x0000, CMD, Owner::Standard, true;
    CLOCK_DESCRIPTION = 0x0001, RO, Owner::Standard, false;
    USER_DESCRIPTION = 0x0002, RW, Owner::Standard, false;
    SAVE_IN_NON_VOLATILE_STORAGE = 0x0003, CMD, Owner::Standard, true;
    RESET_NON_VOLATILE_STORAGE = 0x0004, CMD, Owner::Standard, true;
    INITIALIZE = 0x0005, CMD, Owner::Standard, false;
    FAULT_LOG = 0x0006, RO, Owner::Standard, false;
    FAULT_LOG_RESET = 0x0007, CMD, Owner::Standard, true;

    DEFAULT_DATA_SET = 0x2000, RO, Owner::Standard, false;
    CURRENT_DATA_SET = 0x2001, RO, Owner::Standard, false;
    PARENT_DATA_SET = 0x2002, RO, Owner::Standard, false;
    TIME_PROPERTIES_DATA_SET = 0x2003, RO, Owner::Standard, false;
    PORT_DATA_SET = 0x2004, RO, Owner::Standard, false;
    PRIORITY1 = 0x2005, RW, Owner::Standard, false;
    PRIORITY2 = 0x2006, RW, Owner::Standard, false;
    DOMAIN = 0x2007, RW, Owner::Standard, false;
    SLAVE_ONLY = 0x2008, RW, Owner::Standard, false;
    LOG_ANNOUNCE_INTERVAL = 0x2009, RW, Owner::Standard, false;
    ANNOUNCE_RECEIPT_TIMEOUT = 0x200a, RW, Owner::Standard, false;
    LOG_SYNC_INTERVAL = 0x200b, RW, Owner::Standard, false;
    VERSION_NUMBER = 0x200c, RW, Owner::Standard, false;
    ENABLE_PORT = 0x200d, CMD, Owner::Standard, true;
    DISABLE_PORT = 0x200e, CMD, Owner::Standard, true;
    TIME = 0x200f, RW, Owner::Standard, false;
    CLOCK_ACCURACY = 0x2010, RW, Owner::Standard, false;
    UTC_PROPERTIES = 0x2011, RW, Owner::Standard, false;
    TRACEABILITY_PROPERTIES = 0x2012, RW, Owner::Standard, false;
    TIMESCALE_PROPERTIES = 0x2013, RW, Owner::Standard, false;
    UNICAST_NEGOTIATION_ENABLE = 0x2014, RW, Owner::Standard, false;
    PATH_TRACE_LIST = 0x2015, RO, Owner::Standard, false;
    PATH_TRACE_ENABLE = 0x2016, RW, Owner::Standard, false;
    GRANDMASTER_CLUSTER_TABLE = 0x2017, RW, Owner::Standard, false;
    UNICAST_MASTER_TABLE = 0x2018, RW, Owner::Standard, false;
    UNICAST_MASTER_MAX_TABLE_SIZE = 0x2019, RO, Owner::Standard, false;
    ACCEPTABLE_MASTER_TABLE = 0x201a, RW, Owner::Standard, false;
    ACCEPTABLE_MASTER_TABLE_ENABLED = 0x201b, RW, Owner::Standard, false;
    ACCEPTABLE_MASTER_MAX_TABLE_SIZE = 0x201c, RO, Owner::Standard, false;
    ALTERNATE_MASTER = 0x201d, RW, Owner::Standard, false;
    ALTERNATE_TIME_OFFSET_ENABLE = 0x201e, RW, Owner::Standard, false;
    ALTERNATE_TIME_OFFSET_NAME = 0x201f, RW, Owner::Standard, false;
    ALTERNATE_TIME_OFFSET_MAX_KEY = 0x2020, RO, Owner::Standard, false;
    ALTERNATE_TIME_OFFSET_PROPERTIES = 0x2021, RW, Owner::Standard, false;

    TRANSPARENT_CLOCK_DEFAULT_DATA_SET = 0x4000, RO, Owner::Standard, false;
    TRANSPARENT_CLOCK_PORT_DATA_SET = 0x4001, RO, Owner::Standard, false;
    PRIMARY_DOMAIN = 0x4002, RW, Owner::Standard, false;

    DELAY_MECHANISM = 0x6000, RW, Owner::Standard, false;
    LOG_MIN_PDELAY_REQ_INTERVAL = 0x6001, RW, Owner::Standard, false;

    MASTER_ONLY = 0x3000, RW, Owner::Standard, false;
    EXT_PORT_CONFIG_PORT_DATA_SET = 0x3001, RW, Owner::Standard, false;
    EXTERNAL_PORT_CONFIGURATION_ENABLED = 0x3002, RW, Owner::Standard, false;
    HOLDOVER_UPGRADE_ENABLE = 0x3003, RW, Owner::Standard, false;

    TIME_STATUS_NP = 0xc000, RO, Owner::Linuxptp, false;
    GRANDMASTER_SETTINGS_NP = 0xc001, RW, Owner::Linuxptp, false;
    PORT_DATA_SET_NP = 0xc002, RW, Owner::Linuxptp, false;
    SUBSCRIBE_EVENTS_NP = 0xc003, CMD, Owner::Linuxptp, false;
    PORT_PROPERTIES_NP = 0xc004, RO, Owner::Linuxptp, false;
    PORT_STATS_NP = 0xc005, RO, Owner::Linuxptp, false;
    SYNCHRONIZATION_UNCERTAIN_NP = 0xc006, RW, Owner::Linuxptp, false;
    PORT_SERVICE_STATS_NP = 0xc007, RO, Owner::Linuxptp, false;
    UNICAST_MASTER_TABLE_NP = 0xc008, RO, Owner::Linuxptp, false;
    PORT_HWCLOCK_NP = 0xc009, RO, Owner::Linuxptp, false;
    POWER_PROFILE_SETTINGS_NP = 0xc00a, RW, Owner::Linuxptp, false;
    CMLDS_INFO_NP = 0xc00b, RO, Owner::Linuxptp, false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trips() {
        assert_eq!(ManagementId::PRIORITY1.name(), "PRIORITY1");
        assert_eq!(
            ManagementId::find_by_name("PRIORITY1", true),
            Some(ManagementId::PRIORITY1)
        );
        assert_eq!(ManagementId::from_u16(0x2005), Some(ManagementId::PRIORITY1));
    }

    #[test]
    fn empty_ids_have_no_legal_set() {
        assert!(ManagementId::NULL_PTP_MANAGEMENT.is_empty());
        assert!(!ManagementId::NULL_PTP_MANAGEMENT.legality().set);
    }

    #[test]
    fn linuxptp_ids_are_invalid_without_the_profile() {
        assert!(!ManagementId::TIME_STATUS_NP.is_valid(ImplementSpecific::None));
        assert!(ManagementId::TIME_STATUS_NP.is_valid(ImplementSpecific::Linuxptp));
    }
}
