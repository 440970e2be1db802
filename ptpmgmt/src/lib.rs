//! # ptpmgmt
//!
//! Wire codec and dispatcher for the IEEE 1588 (PTP) management protocol:
//! build and parse Management and Signaling messages, the full management
//! TLV vocabulary (plus linuxptp's `_NP` extensions), and the Annex P
//! AUTHENTICATION TLV pipeline. Transport, clock I/O, and configuration-file
//! parsing are left to the caller; this crate only turns bytes into typed
//! messages and back.

#![warn(missing_docs, clippy::unwrap_used, clippy::expect_used)]

pub mod authentication;
pub mod dispatcher;
pub mod error_status;
pub mod errors;
pub mod header;
pub mod last_error;
pub mod management;
pub mod params;
pub mod primitive;
pub mod sa_file;
pub mod signaling;
pub mod types;

pub use errors::{ManagementError, Result};
pub use header::{MessageType, MessageTypeTag, PtpHeader};
pub use management::{Action, ManagementBody, ManagementId, ManagementMessage};
pub use params::{ConfigSource, ImplementSpecific, MsgParams, StaticConfig};
pub use signaling::{OutgoingTlv, SignalingBody, SignalingMessage};
pub use types::{ClockIdentity, PortIdentity};

pub use zerocopy;
