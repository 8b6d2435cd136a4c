/**
 * FINGERPRINT and MESSAGE-INTEGRITY
 * See RFC 5389 Section 15.4 and 15.5
 *
 * Both attributes cover every byte written before them, so their values are
 * computed while a packet is being serialized, not when the attribute is built.
 */
use std::fmt;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;

use crate::error::StunError;
use crate::stun::wire::{read_u32, write_u16};
use crate::stun::{FINGERPRINT_XOR, HEADER_LENGTH};

pub type HmacSha1 = Hmac<Sha1>;

/// Wire size of the MESSAGE-INTEGRITY value
pub const INTEGRITY_LENGTH: usize = 20;

/// Wire size of the FINGERPRINT value
pub const FINGERPRINT_LENGTH: usize = 4;

/// CRC32 of `bytes` XORed with 0x5354554E
pub fn calculate_fingerprint(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes) ^ FINGERPRINT_XOR
}

/// The long-term credential key, MD5(username ":" realm ":" password)
pub fn long_term_key(username: &str, realm: &str, password: &str) -> [u8; 16] {
    let mut digest = Md5::new();
    digest.update(username.as_bytes());
    digest.update(b":");
    digest.update(realm.as_bytes());
    digest.update(b":");
    digest.update(password.as_bytes());
    digest.finalize().into()
}

fn new_mac(key: &[u8]) -> HmacSha1 {
    HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length")
}

pub fn hmac_sha1(key: &[u8], payload: &[u8]) -> [u8; INTEGRITY_LENGTH] {
    let mut mac = new_mac(key);
    mac.update(payload);
    mac.finalize().into_bytes().into()
}

/**
 * Copy the message bytes preceding MESSAGE-INTEGRITY, with the header length
 * adjusted so the message appears to end right after the integrity attribute.
 */
pub(crate) fn integrity_input(prefix: &[u8]) -> Vec<u8> {
    let mut covered = prefix.to_vec();
    if covered.len() >= HEADER_LENGTH {
        let length = covered.len() - HEADER_LENGTH + 4 + INTEGRITY_LENGTH;
        write_u16(&mut covered, 2, length as u16);
    }
    covered
}

/**
 * The FINGERPRINT attribute. Built empty for outgoing packets, the value is filled
 * in at serialization. Decoded fingerprints carry the result of recomputing the
 * CRC over the bytes that preceded them.
 *
 * The value is a function of the rest of the message, so any two fingerprints
 * compare equal. A packet therefore equals its own decode; use `is_valid` to
 * check the CRC.
 */
#[derive(Debug, Clone)]
pub struct Fingerprint {
    value: u32,
    valid: Option<bool>,
}

impl Fingerprint {
    pub(crate) fn placeholder() -> Self {
        Self {
            value: 0,
            valid: None,
        }
    }

    /**
     * Decode a FINGERPRINT value and check it against the preceding message bytes
     *
     * @param code The attribute type, used for error reporting
     * @param value The 4 byte attribute value
     * @param prefix All message bytes before the attribute header
     */
    pub fn decode(code: u16, value: &[u8], prefix: &[u8]) -> Result<Self, StunError> {
        if value.len() != FINGERPRINT_LENGTH {
            return Err(StunError::bad_attribute(
                code,
                format!("fingerprint needs 4 bytes, got {}", value.len()),
            ));
        }
        let value = read_u32(value, 0);
        Ok(Self {
            value,
            valid: Some(calculate_fingerprint(prefix) == value),
        })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// `None` for a fingerprint that was built locally and never went through decode
    pub fn is_valid(&self) -> Option<bool> {
        self.valid
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Fingerprint {}

/**
 * The MESSAGE-INTEGRITY attribute.
 *
 * Outgoing attributes hold the key to sign with. Decoded attributes hold the
 * received HMAC and the bytes it covers; the credentials usually are not known
 * until USERNAME and REALM have been read, so checking happens later through
 * `verify_hash` or `verify_key`. A failed check cannot tell a wrong password from
 * a modified message.
 *
 * Like `Fingerprint`, the HMAC is derived from the message and the key, so all
 * instances compare equal. Equality of packets covers what they carry, not
 * whether they were signed correctly.
 */
#[derive(Clone)]
pub struct MessageIntegrity {
    hmac: [u8; INTEGRITY_LENGTH],
    covered: Vec<u8>,
    key: Option<Vec<u8>>,
}

impl MessageIntegrity {
    /// Sign with long-term credentials
    pub fn long_term(username: &str, realm: &str, password: &str) -> Self {
        Self::with_key(&long_term_key(username, realm, password))
    }

    /// Sign with a raw key, e.g. a short-term password
    pub fn with_key(key: &[u8]) -> Self {
        Self {
            hmac: [0u8; INTEGRITY_LENGTH],
            covered: Vec::new(),
            key: Some(key.to_vec()),
        }
    }

    /**
     * Decode a MESSAGE-INTEGRITY value
     *
     * @param code The attribute type, used for error reporting
     * @param value The 20 byte attribute value
     * @param prefix All message bytes before the attribute header
     */
    pub fn decode(code: u16, value: &[u8], prefix: &[u8]) -> Result<Self, StunError> {
        if value.len() != INTEGRITY_LENGTH {
            return Err(StunError::bad_attribute(
                code,
                format!("message integrity needs 20 bytes, got {}", value.len()),
            ));
        }
        let mut hmac = [0u8; INTEGRITY_LENGTH];
        hmac.copy_from_slice(value);
        Ok(Self {
            hmac,
            covered: integrity_input(prefix),
            key: None,
        })
    }

    pub fn hmac(&self) -> &[u8; INTEGRITY_LENGTH] {
        &self.hmac
    }

    pub(crate) fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn verify_hash(&self, username: &str, realm: &str, password: &str) -> bool {
        self.verify_key(&long_term_key(username, realm, password))
    }

    pub fn verify_key(&self, key: &[u8]) -> bool {
        if self.covered.is_empty() {
            return false;
        }
        let mut mac = new_mac(key);
        mac.update(&self.covered);
        mac.verify_slice(&self.hmac).is_ok()
    }
}

impl PartialEq for MessageIntegrity {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for MessageIntegrity {}

impl fmt::Debug for MessageIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageIntegrity")
            .field("hmac", &hex::encode(self.hmac))
            .field("covered_len", &self.covered.len())
            .field("has_key", &self.key.is_some())
            .finish()
    }
}
