//! Security Association file: the SPP/key store behind the AUTHENTICATION
//! TLV pipeline (spec.md §4.9). Mirrors the `ptpmgmt_safile`/`ptpmgmt_spp`
//! shape exercised by `original_source/uctest/cfg.c` (`read_sa`, `have`,
//! `haveKey`, `spp`, and `Spp::addKey`/`keys`/`have`/`mac_size`/`key`), and
//! its text grammar follows `original_source/cfg.cpp`'s `skip_spaces`/
//! `strip_end_spaces`/`[section]`-bracket conventions, adapted from cfg's
//! per-section `key=value` grammar to a per-SPP key table.
//!
//! Grammar (one SPP block per `[id]` header):
//! ```text
//! [0]
//! ownID=0
//! 1 0x61627864656667686... alg=SHA256 mac=32
//! 0x57 abxdefghijklmnop alg=AES128 mac=16
//! # a comment
//! ```
//! A key token starting with `0x` is hex-decoded via the `hex` crate;
//! anything else is taken as a literal ASCII byte string, matching the
//! mixed string/binary key material `original_source/uctest/cfg.c` feeds
//! through `addKey`.

use std::collections::HashMap;

use crate::authentication::HmacAlgorithm;
use crate::errors::{ManagementError, Result};

/// One key entry in an [`Spp`]'s key table.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    algorithm: HmacAlgorithm,
    key: Vec<u8>,
    mac_size: usize,
}

/// One Security Parameters Pointer: an id plus its table of keys.
#[derive(Debug, Clone)]
pub struct Spp {
    own_id: u8,
    keys: HashMap<u32, KeyEntry>,
}

impl Spp {
    /// A fresh, empty SPP with the given id.
    pub fn new(own_id: u8) -> Self {
        Spp {
            own_id,
            keys: HashMap::new(),
        }
    }

    /// The SPP's own id.
    pub fn own_id(&self) -> u8 {
        self.own_id
    }

    /// Number of keys currently registered.
    pub fn keys(&self) -> usize {
        self.keys.len()
    }

    /// Adds a key to the table. Returns `false` without modifying anything
    /// if `id` is already present and `replace` is `false` (matching
    /// `Spp::addKey`'s boolean-return contract).
    pub fn add_key(
        &mut self,
        id: u32,
        algorithm: HmacAlgorithm,
        key: Vec<u8>,
        mac_size: usize,
        replace: bool,
    ) -> bool {
        if !replace && self.keys.contains_key(&id) {
            return false;
        }
        if mac_size == 0 || mac_size > algorithm.max_digest_size() {
            return false;
        }
        self.keys.insert(
            id,
            KeyEntry {
                algorithm,
                key,
                mac_size,
            },
        );
        true
    }

    /// Whether `id` is registered.
    pub fn have(&self, id: u32) -> bool {
        self.keys.contains_key(&id)
    }

    fn entry(&self, id: u32) -> Result<&KeyEntry> {
        self.keys.get(&id).ok_or(ManagementError::Unsupported)
    }

    /// The raw key bytes for `id`.
    pub fn key(&self, id: u32) -> Result<&[u8]> {
        Ok(&self.entry(id)?.key)
    }

    /// The configured ICV truncation length for `id`.
    pub fn mac_size(&self, id: u32) -> Result<usize> {
        Ok(self.entry(id)?.mac_size)
    }

    /// The algorithm bound to `id`.
    pub fn algorithm(&self, id: u32) -> Result<HmacAlgorithm> {
        Ok(self.entry(id)?.algorithm)
    }
}

/// The parsed contents of an SA file: every SPP keyed by its id.
#[derive(Debug, Clone, Default)]
pub struct SaFile {
    spps: HashMap<u8, Spp>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn decode_key(token: &str) -> Result<Vec<u8>> {
    if let Some(hex_digits) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        hex::decode(hex_digits).map_err(|_| ManagementError::InvalidHeader("bad hex key"))
    } else {
        Ok(token.as_bytes().to_vec())
    }
}

fn parse_algorithm(raw: &str) -> Result<HmacAlgorithm> {
    match raw {
        "SHA256" => Ok(HmacAlgorithm::Sha256),
        "AES128" => Ok(HmacAlgorithm::CmacAes128),
        "AES256" => Ok(HmacAlgorithm::CmacAes256),
        _ => Err(ManagementError::InvalidHeader("unknown HMAC algorithm name")),
    }
}

impl SaFile {
    /// Parses the SA file grammar described above.
    pub fn parse(text: &str) -> Result<Self> {
        let mut spps: HashMap<u8, Spp> = HashMap::new();
        let mut current: Option<u8> = None;

        for raw_line in text.lines() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(inner) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let id: u8 = inner.trim().parse().map_err(|_| {
                    crate::last_error::record_error!(format!("bad SPP section header: {line}"));
                    ManagementError::InvalidHeader("bad SPP section header")
                })?;
                spps.entry(id).or_insert_with(|| Spp::new(id));
                current = Some(id);
                continue;
            }

            if let Some(rest) = line.strip_prefix("ownID=") {
                let id = current.ok_or(ManagementError::InvalidHeader("ownID outside section"))?;
                let own_id: u8 = rest
                    .trim()
                    .parse()
                    .map_err(|_| ManagementError::InvalidHeader("bad ownID value"))?;
                if let Some(spp) = spps.get_mut(&id) {
                    spp.own_id = own_id;
                }
                continue;
            }

            let spp_id =
                current.ok_or(ManagementError::InvalidHeader("key line outside any section"))?;
            let mut tokens = line.split_whitespace();
            let key_id: u32 = tokens
                .next()
                .and_then(|t| t.trim_start_matches("0x").parse_radix(t))
                .ok_or(ManagementError::InvalidHeader("missing key id"))?;
            let key_token = tokens
                .next()
                .ok_or(ManagementError::InvalidHeader("missing key material"))?;
            let key = decode_key(key_token)?;

            let mut algorithm = None;
            let mut mac_size = None;
            for attr in tokens {
                if let Some(v) = attr.strip_prefix("alg=") {
                    algorithm = Some(parse_algorithm(v)?);
                } else if let Some(v) = attr.strip_prefix("mac=") {
                    mac_size = Some(
                        v.parse::<usize>()
                            .map_err(|_| ManagementError::InvalidHeader("bad mac= value"))?,
                    );
                }
            }
            let algorithm =
                algorithm.ok_or(ManagementError::InvalidHeader("key line missing alg="))?;
            let mac_size = mac_size.unwrap_or_else(|| algorithm.max_digest_size());

            let spp = spps.entry(spp_id).or_insert_with(|| Spp::new(spp_id));
            if !spp.add_key(key_id, algorithm, key, mac_size, true) {
                return Err(ManagementError::ValueOutOfRange);
            }
        }

        Ok(SaFile { spps })
    }

    /// Whether `spp` is present.
    pub fn have(&self, spp: u8) -> bool {
        self.spps.contains_key(&spp)
    }

    /// Whether `spp` is present and has `key` registered.
    pub fn have_key(&self, spp: u8, key: u32) -> bool {
        self.spps.get(&spp).map(|s| s.have(key)).unwrap_or(false)
    }

    /// Looks up an SPP by id.
    pub fn spp(&self, spp: u8) -> Result<&Spp> {
        self.spps.get(&spp).ok_or(ManagementError::Unsupported)
    }
}

/// Small helper so `key_id` tokens may be written in decimal or `0x` hex,
/// matching the mixed `0x57` / `1` ids seen in `original_source/uctest/cfg.c`.
trait ParseRadix {
    fn parse_radix(self, original: &str) -> Option<u32>;
}

impl ParseRadix for &str {
    fn parse_radix(self, original: &str) -> Option<u32> {
        if original.starts_with("0x") || original.starts_with("0X") {
            u32::from_str_radix(self, 16).ok()
        } else {
            original.parse().ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_spps_and_keys() {
        let text = "\
[0]
ownID=0
0x57 abxdefghijklmnop alg=SHA256 mac=16
1 0x00000000000000000000000000000000 alg=AES128 mac=10

# a second SPP
[2]
ownID=2
10 0x61626364656667686970 alg=SHA256 mac=16
";
        let sa = SaFile::parse(text).unwrap();
        assert!(sa.have(0));
        assert!(sa.have(2));
        assert!(sa.have_key(0, 0x57));
        assert!(sa.have_key(0, 1));
        assert!(sa.have_key(2, 10));
        assert!(!sa.have_key(2, 11));

        let spp0 = sa.spp(0).unwrap();
        assert_eq!(spp0.own_id(), 0);
        assert_eq!(spp0.keys(), 2);
        assert_eq!(spp0.mac_size(0x57).unwrap(), 16);
        assert_eq!(spp0.algorithm(1).unwrap(), HmacAlgorithm::CmacAes128);
        assert_eq!(spp0.key(0x57).unwrap(), b"abxdefghijklmnop");
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "\
# leading comment

[1]          # spp one
ownID=1
1 0x00 alg=SHA256 mac=4   # trailing comment
";
        let sa = SaFile::parse(text).unwrap();
        assert!(sa.have_key(1, 1));
        assert_eq!(sa.spp(1).unwrap().mac_size(1).unwrap(), 4);
    }

    #[test]
    fn rejects_mac_size_larger_than_algorithm_digest() {
        let mut spp = Spp::new(0);
        assert!(!spp.add_key(1, HmacAlgorithm::CmacAes128, vec![0; 16], 20, true));
        assert!(spp.add_key(1, HmacAlgorithm::CmacAes128, vec![0; 16], 16, true));
    }

    #[test]
    fn add_key_respects_replace_flag() {
        let mut spp = Spp::new(0);
        assert!(spp.add_key(1, HmacAlgorithm::Sha256, vec![1, 2, 3], 16, true));
        assert!(!spp.add_key(1, HmacAlgorithm::Sha256, vec![9, 9, 9], 12, false));
        assert_eq!(spp.mac_size(1).unwrap(), 16);
        assert!(spp.add_key(1, HmacAlgorithm::Sha256, vec![9, 9, 9], 12, true));
        assert_eq!(spp.mac_size(1).unwrap(), 12);
    }

    #[test]
    fn unknown_spp_is_an_error() {
        let sa = SaFile::default();
        assert!(sa.spp(9).is_err());
        assert!(!sa.have(9));
    }
}
