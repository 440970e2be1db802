//! AUTHENTICATION TLV build/parse and the Annex P ICV pipeline (spec.md
//! §4.8). The HMAC primitive itself is out of scope per spec.md §1 — this
//! module defines the `HmacProvider` seam the core depends on and ships
//! three RustCrypto-backed adapters behind it, the same shape
//! `original_source/hmac/ssl.cpp` gives OpenSSL (`init`/`digest`/`verify`
//! over a `HMAC_t` selector), translated from a vtable of loadable backends
//! into one enum-dispatched key.

use aes::{Aes128, Aes256};
use cmac::Cmac;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::{ManagementError, Result};
use crate::primitive::{Cursor, Writer};
use crate::sa_file::SaFile;

/// tlvType of an AUTHENTICATION TLV.
pub const TLV_TYPE_AUTHENTICATION: u16 = 0x9000;

const AUTH_PREFIX_SIZE: usize = 8; // spp(1) + secParamIndicator(1) + reserved(2) + keyID(4)

/// The three MAC algorithms spec.md §1 requires this crate to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacAlgorithm {
    /// HMAC-SHA256.
    Sha256,
    /// AES-128-CMAC.
    CmacAes128,
    /// AES-256-CMAC.
    CmacAes256,
}

impl HmacAlgorithm {
    /// The largest digest (pre-truncation) this algorithm produces, used to
    /// bound a configured `mac_size` (spec.md §4.9).
    pub fn max_digest_size(self) -> usize {
        match self {
            HmacAlgorithm::Sha256 => 32,
            HmacAlgorithm::CmacAes128 | HmacAlgorithm::CmacAes256 => 16,
        }
    }
}

/// A small `init(key,alg)/digest(data)/verify(data,mac)` seam (spec.md §1),
/// letting a caller swap in a different HMAC backend without touching the
/// codec. [`HmacKey`] is the default implementation, backed by RustCrypto.
pub trait HmacProvider {
    /// The full-length digest over `data`.
    fn digest(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Whether `mac` (possibly truncated) matches the digest over `data`,
    /// compared in constant time.
    fn verify(&self, data: &[u8], mac: &[u8]) -> Result<bool> {
        let full = self.digest(data)?;
        if mac.len() > full.len() {
            return Ok(false);
        }
        Ok(bool::from(full[..mac.len()].ct_eq(mac)))
    }
}

/// A key bound to one of the three supported algorithms.
#[derive(Debug, Clone)]
pub struct HmacKey {
    algorithm: HmacAlgorithm,
    key: Vec<u8>,
}

impl HmacKey {
    /// Binds `key` to `algorithm`.
    pub fn init(algorithm: HmacAlgorithm, key: Vec<u8>) -> Self {
        HmacKey { algorithm, key }
    }
}

impl HmacProvider for HmacKey {
    fn digest(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.algorithm {
            HmacAlgorithm::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
                    .map_err(|_| ManagementError::ValueOutOfRange)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            HmacAlgorithm::CmacAes128 => {
                let mut mac = Cmac::<Aes128>::new_from_slice(&self.key)
                    .map_err(|_| ManagementError::ValueOutOfRange)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            HmacAlgorithm::CmacAes256 => {
                let mut mac = Cmac::<Aes256>::new_from_slice(&self.key)
                    .map_err(|_| ManagementError::ValueOutOfRange)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}

/// `{ spp, secParamIndicator, keyID, reserved, icv }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationTlv {
    /// Security Parameters Pointer selecting the SA.
    pub spp: u8,
    /// secParamIndicator, currently unused beyond round-tripping.
    pub sec_param_indicator: u8,
    /// The key within the SPP's key table.
    pub key_id: u32,
    /// The Integrity Check Value.
    pub icv: Vec<u8>,
}

impl AuthenticationTlv {
    fn build(&self, w: &mut Writer) {
        w.write_u8(self.spp);
        w.write_u8(self.sec_param_indicator);
        w.write_zeros(2);
        w.write_u32(self.key_id);
        w.write_bytes(&self.icv);
    }

    fn parse(c: &mut Cursor, tlv_len: usize) -> Result<Self> {
        if tlv_len < AUTH_PREFIX_SIZE {
            return Err(ManagementError::LengthMismatch);
        }
        let spp = c.read_u8()?;
        let sec_param_indicator = c.read_u8()?;
        c.skip(2)?;
        let key_id = c.read_u32()?;
        let icv = c.read_bytes(tlv_len - AUTH_PREFIX_SIZE)?.to_vec();
        Ok(AuthenticationTlv {
            spp,
            sec_param_indicator,
            key_id,
            icv,
        })
    }
}

/// Appends an AUTHENTICATION TLV to an already-framed PTP message and
/// recomputes header.messageLength, per spec.md §4.8 build step:
/// 1. write the TLV with a zeroed ICV placeholder,
/// 2. finalize messageLength,
/// 3. compute the MAC over the whole message with the ICV region zero,
/// 4. patch the computed MAC into the ICV placeholder.
///
/// `msg` must already have its own messageLength set for the body that
/// precedes the AUTHENTICATION TLV (I6: it is the last TLV before padding).
pub fn append(msg: Vec<u8>, spp_id: u8, key_id: u32, sa: &SaFile) -> Result<Vec<u8>> {
    let spp = sa.spp(spp_id)?;
    let mac_size = spp.mac_size(key_id)?;
    let algorithm = spp.algorithm(key_id)?;
    let key = spp.key(key_id)?.to_vec();

    let mut w = Writer::new();
    w.write_bytes(&msg);
    let tlv_type_offset = w.len();
    w.write_u16(TLV_TYPE_AUTHENTICATION);
    w.write_u16(0);
    let body_start = w.len();
    w.write_u8(spp_id);
    w.write_u8(0);
    w.write_zeros(2);
    w.write_u32(key_id);
    let icv_offset = w.len();
    w.write_zeros(mac_size);
    let length = (w.len() - body_start) as u16;
    w.patch_u16(tlv_type_offset + 2, length);
    let total_len = w.len() as u16;
    w.patch_u16(2, total_len);

    let mut bytes = w.into_bytes();
    let hmac_key = HmacKey::init(algorithm, key);
    let mac = hmac_key.digest(&bytes)?;
    bytes[icv_offset..icv_offset + mac_size].copy_from_slice(&mac[..mac_size]);
    Ok(bytes)
}

/// Every TLV in `buf` from `tlvs_start` onward, as `(tlvType, bodyOffset,
/// bodyLen)`. Shared by the management and signaling walkers, and by
/// [`verify`] to locate a trailing AUTHENTICATION TLV uniformly across both
/// message kinds.
fn scan_tlvs(buf: &[u8], tlvs_start: usize) -> Result<Vec<(u16, usize, usize)>> {
    let mut c = Cursor::new(&buf[tlvs_start..]);
    let mut out = Vec::new();
    while c.remaining() > 0 {
        if c.remaining() < 4 {
            return Err(ManagementError::FramingError);
        }
        let tlv_type = c.read_u16()?;
        let len = c.read_u16()? as usize;
        if len > c.remaining() {
            return Err(ManagementError::FramingError);
        }
        let body_offset = tlvs_start + c.position();
        c.skip(len)?;
        out.push((tlv_type, body_offset, len));
    }
    Ok(out)
}

/// Verifies (or requires the absence of a requirement for) an AUTHENTICATION
/// TLV trailing the TLVs starting at `tlvs_start` in `buf` (spec.md §4.8
/// parse step). `require_auth` combined with `allow_unauth == 0` rejects a
/// message carrying no AUTHENTICATION TLV at all.
pub fn verify(
    buf: &[u8],
    tlvs_start: usize,
    sa: &SaFile,
    require_auth: bool,
    allow_unauth: u8,
) -> Result<()> {
    let tlvs = scan_tlvs(buf, tlvs_start)?;
    let auth = tlvs
        .last()
        .filter(|(tlv_type, _, _)| *tlv_type == TLV_TYPE_AUTHENTICATION);

    let (_, body_offset, body_len) = match auth {
        Some(&entry) => entry,
        None => {
            return if require_auth && allow_unauth == 0 {
                Err(ManagementError::AuthFailed)
            } else {
                Ok(())
            }
        }
    };

    let mut c = Cursor::new(&buf[body_offset..body_offset + body_len]);
    let tlv = AuthenticationTlv::parse(&mut c, body_len)?;
    let spp = sa.spp(tlv.spp)?;
    let mac_size = spp.mac_size(tlv.key_id)?;
    if tlv.icv.len() != mac_size {
        return Err(ManagementError::LengthMismatch);
    }
    let algorithm = spp.algorithm(tlv.key_id)?;
    let key = spp.key(tlv.key_id)?.to_vec();

    let icv_offset = body_offset + AUTH_PREFIX_SIZE;
    let mut scratch = buf.to_vec();
    scratch[icv_offset..icv_offset + mac_size].fill(0);

    let hmac_key = HmacKey::init(algorithm, key);
    if hmac_key.verify(&scratch, &tlv.icv)? {
        Ok(())
    } else {
        crate::last_error::record_error!(format!(
            "ICV mismatch for spp {} key {}",
            tlv.spp, tlv.key_id
        ));
        Err(ManagementError::AuthFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sa_file::SaFile;

    fn sa_with_sha256_key() -> SaFile {
        let text = "\
[0]
ownID=0
1 0x14ddb0fd5013ffca46417ff29d3435d49daa01c337ce4c4c1c2c4675ae605ccd alg=SHA256 mac=12
";
        SaFile::parse(text).unwrap()
    }

    #[test]
    fn icv_covers_whole_message_with_zeroed_region() {
        let sa = sa_with_sha256_key();
        let msg = vec![0u8; 54];
        let with_auth = append(msg.clone(), 0, 1, &sa).unwrap();
        assert_eq!(with_auth.len(), msg.len() + 4 + AUTH_PREFIX_SIZE + 12);
        assert_eq!(
            u16::from_be_bytes([with_auth[0x2c + 4], with_auth[0x2d + 4]]),
            TLV_TYPE_AUTHENTICATION,
        );
        verify(&with_auth, 44, &sa, true, 0).unwrap();
    }

    #[test]
    fn tampering_any_body_byte_fails_verification() {
        let sa = sa_with_sha256_key();
        let msg = vec![0u8; 54];
        let mut with_auth = append(msg, 0, 1, &sa).unwrap();
        with_auth[10] ^= 0xff;
        assert!(matches!(
            verify(&with_auth, 44, &sa, true, 0),
            Err(ManagementError::AuthFailed)
        ));
    }

    #[test]
    fn missing_auth_tlv_rejected_when_required() {
        let sa = sa_with_sha256_key();
        let msg = vec![0u8; 44];
        assert!(matches!(
            verify(&msg, 44, &sa, true, 0),
            Err(ManagementError::AuthFailed)
        ));
        assert!(verify(&msg, 44, &sa, false, 0).is_ok());
        assert!(verify(&msg, 44, &sa, true, 1).is_ok());
    }
}
