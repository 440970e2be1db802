//! `ManagementErrorStatus`: the body of a MANAGEMENT_ERROR_STATUS TLV, sent
//! in place of a RESPONSE when a peer rejects a management request.

use crate::errors::Result;
use crate::primitive::{Cursor, Writer};
use crate::types::PTPText;

/// Well-known `managementErrorId` values (IEEE 1588-2019 Table 71).
pub mod error_id {
    /// The request referenced a management id the responder does not support.
    pub const RESPONSE_TOO_BIG: u16 = 0x0001;
    /// The request's action is not permitted on the referenced management id.
    pub const NO_SUCH_ID: u16 = 0x0002;
    /// The request carried a value outside the permitted range.
    pub const WRONG_LENGTH: u16 = 0x0003;
    /// The requested value is semantically invalid.
    pub const WRONG_VALUE: u16 = 0x0004;
    /// The responder cannot currently execute the requested action.
    pub const NOT_SETABLE: u16 = 0x0005;
    /// The responder could not complete the action for an unspecified reason.
    pub const NOT_SUPPORTED: u16 = 0x0006;
    /// A catch-all for responder-defined error conditions.
    pub const GENERAL_ERROR: u16 = 0xfffe;
}

/// `{ managementErrorId, managementId, reserved[4], displayData }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementErrorStatus {
    /// The error code, see [`error_id`].
    pub management_error_id: u16,
    /// The management id the request referenced.
    pub management_id: u16,
    /// Human-readable context for the error.
    pub display_data: PTPText,
}

impl ManagementErrorStatus {
    pub(crate) fn build(&self, w: &mut Writer) {
        w.write_u16(self.management_error_id);
        w.write_u16(self.management_id);
        w.write_zeros(4);
        self.display_data.build(w);
    }

    pub(crate) fn parse(c: &mut Cursor, _tlv_len: usize) -> Result<Self> {
        let management_error_id = c.read_u16()?;
        let management_id = c.read_u16()?;
        c.skip(4)?;
        let display_data = PTPText::parse(c)?;
        Ok(ManagementErrorStatus {
            management_error_id,
            management_id,
            display_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_display_data() {
        let s = ManagementErrorStatus {
            management_error_id: error_id::WRONG_VALUE,
            management_id: 0x2005,
            display_data: PTPText::from("test 123"),
        };
        let mut w = Writer::new();
        s.build(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let parsed = ManagementErrorStatus::parse(&mut c, bytes.len()).unwrap();
        assert_eq!(parsed, s);
        assert_eq!(parsed.display_data.as_str(), "test 123");
    }
}
