/**
 * STUN attributes and the attribute type registry
 * See RFC 5389 Section 15 for details
 * https://datatracker.ietf.org/doc/html/rfc5389#section-15
 *
 *  0                   1                   2                   3
 *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |         Type                  |            Length             |
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |                         Value (variable)                ....
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 */
use std::net::SocketAddr;

use crate::error::StunError;
use crate::stun::address::{decode_address, decode_xor_address, encode_address, encode_xor_address};
use crate::stun::attribute_type::*;
use crate::stun::header::TransactionId;
use crate::stun::security::{Fingerprint, MessageIntegrity, FINGERPRINT_LENGTH, INTEGRITY_LENGTH};
use crate::stun::wire::{read_u16, read_u32, read_u64};

/// Longest USERNAME value accepted on decode
const MAX_USERNAME_LENGTH: usize = 512;

/// Longest REALM, NONCE or SOFTWARE value accepted on decode
const MAX_TEXT_LENGTH: usize = 763;

/// How the value bytes of a registered attribute are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Plain,
    String,
    Integer,
    Long,
    Address,
    XorAddress,
    Error,
    UnknownAttributes,
    Security,
}

/// Every attribute type this codec understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    MappedAddress,
    ResponseAddress,
    ChangeRequest,
    SourceAddress,
    ChangedAddress,
    Username,
    Password,
    MessageIntegrity,
    ErrorCode,
    UnknownAttributes,
    ReflectedFrom,
    Lifetime,
    XorPeerAddress,
    Realm,
    Nonce,
    XorRelayedAddress,
    XorMappedAddress,
    Priority,
    UseCandidate,
    Padding,
    Software,
    AlternateServer,
    Fingerprint,
    IceControlled,
    IceControlling,
    ResponseOrigin,
    OtherAddress,
}

struct Registration {
    code: u16,
    attr_type: AttributeType,
    name: &'static str,
    category: Category,
    fixed_len: Option<usize>,
}

const fn reg(
    code: u16,
    attr_type: AttributeType,
    name: &'static str,
    category: Category,
    fixed_len: Option<usize>,
) -> Registration {
    Registration {
        code,
        attr_type,
        name,
        category,
        fixed_len,
    }
}

// Indexed by `AttributeType as usize`, keep the order in sync with the enum.
static REGISTRY: [Registration; 27] = [
    reg(ATTR_MAPPED_ADDRESS, AttributeType::MappedAddress, "MAPPED-ADDRESS", Category::Address, None),
    reg(ATTR_RESPONSE_ADDRESS, AttributeType::ResponseAddress, "RESPONSE-ADDRESS", Category::Address, None),
    reg(ATTR_CHANGE_REQUEST, AttributeType::ChangeRequest, "CHANGE-REQUEST", Category::Integer, Some(4)),
    reg(ATTR_SOURCE_ADDRESS, AttributeType::SourceAddress, "SOURCE-ADDRESS", Category::Address, None),
    reg(ATTR_CHANGED_ADDRESS, AttributeType::ChangedAddress, "CHANGED-ADDRESS", Category::Address, None),
    reg(ATTR_USERNAME, AttributeType::Username, "USERNAME", Category::String, None),
    reg(ATTR_PASSWORD, AttributeType::Password, "PASSWORD", Category::String, None),
    reg(ATTR_MESSAGE_INTEGRITY, AttributeType::MessageIntegrity, "MESSAGE-INTEGRITY", Category::Security, Some(INTEGRITY_LENGTH)),
    reg(ATTR_ERROR_CODE, AttributeType::ErrorCode, "ERROR-CODE", Category::Error, None),
    reg(ATTR_UNKNOWN_ATTRIBUTES, AttributeType::UnknownAttributes, "UNKNOWN-ATTRIBUTES", Category::UnknownAttributes, None),
    reg(ATTR_REFLECTED_FROM, AttributeType::ReflectedFrom, "REFLECTED-FROM", Category::Address, None),
    reg(ATTR_LIFETIME, AttributeType::Lifetime, "LIFETIME", Category::Integer, Some(4)),
    reg(ATTR_XOR_PEER_ADDRESS, AttributeType::XorPeerAddress, "XOR-PEER-ADDRESS", Category::XorAddress, None),
    reg(ATTR_REALM, AttributeType::Realm, "REALM", Category::String, None),
    reg(ATTR_NONCE, AttributeType::Nonce, "NONCE", Category::String, None),
    reg(ATTR_XOR_RELAYED_ADDRESS, AttributeType::XorRelayedAddress, "XOR-RELAYED-ADDRESS", Category::XorAddress, None),
    reg(ATTR_XOR_MAPPED_ADDRESS, AttributeType::XorMappedAddress, "XOR-MAPPED-ADDRESS", Category::XorAddress, None),
    reg(ATTR_PRIORITY, AttributeType::Priority, "PRIORITY", Category::Integer, Some(4)),
    reg(ATTR_USE_CANDIDATE, AttributeType::UseCandidate, "USE-CANDIDATE", Category::Plain, Some(0)),
    reg(ATTR_PADDING, AttributeType::Padding, "PADDING", Category::Plain, None),
    reg(ATTR_SOFTWARE, AttributeType::Software, "SOFTWARE", Category::String, None),
    reg(ATTR_ALTERNATE_SERVER, AttributeType::AlternateServer, "ALTERNATE-SERVER", Category::Address, None),
    reg(ATTR_FINGERPRINT, AttributeType::Fingerprint, "FINGERPRINT", Category::Security, Some(FINGERPRINT_LENGTH)),
    reg(ATTR_ICE_CONTROLLED, AttributeType::IceControlled, "ICE-CONTROLLED", Category::Long, Some(8)),
    reg(ATTR_ICE_CONTROLLING, AttributeType::IceControlling, "ICE-CONTROLLING", Category::Long, Some(8)),
    reg(ATTR_RESPONSE_ORIGIN, AttributeType::ResponseOrigin, "RESPONSE-ORIGIN", Category::Address, None),
    reg(ATTR_OTHER_ADDRESS, AttributeType::OtherAddress, "OTHER-ADDRESS", Category::Address, None),
];

impl AttributeType {
    fn registration(self) -> &'static Registration {
        &REGISTRY[self as usize]
    }

    /// Look up a wire code, `None` for codes outside the registry
    pub fn from_code(code: u16) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|r| r.code == code)
            .map(|r| r.attr_type)
    }

    pub fn code(self) -> u16 {
        self.registration().code
    }

    pub fn name(self) -> &'static str {
        self.registration().name
    }

    pub fn category(self) -> Category {
        self.registration().category
    }

    pub fn fixed_len(self) -> Option<usize> {
        self.registration().fixed_len
    }

    /// Types in 0x0000-0x7FFF must be understood by the receiver
    pub fn is_comprehension_required(self) -> bool {
        self.code() < 0x8000
    }
}

/**
 * ERROR-CODE value: class (3 to 6) times 100 plus number (0 to 99), and a reason phrase
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: u16,
    pub reason: String,
}

impl ErrorCode {
    pub fn new(code: u16, reason: &str) -> Self {
        Self {
            code,
            reason: reason.to_string(),
        }
    }

    pub fn class(&self) -> u8 {
        (self.code / 100) as u8
    }

    pub fn number(&self) -> u8 {
        (self.code % 100) as u8
    }

    fn encode(&self) -> Result<Vec<u8>, StunError> {
        if !(300..=699).contains(&self.code) {
            return Err(StunError::bad_attribute(
                ATTR_ERROR_CODE,
                format!("error code {} out of range 300-699", self.code),
            ));
        }
        let mut value = Vec::with_capacity(4 + self.reason.len());
        value.extend_from_slice(&[0, 0, self.class(), self.number()]);
        value.extend_from_slice(self.reason.as_bytes());
        Ok(value)
    }

    fn decode(code: u16, value: &[u8]) -> Result<Self, StunError> {
        if value.len() < 4 {
            return Err(StunError::bad_attribute(
                code,
                format!("error code needs at least 4 bytes, got {}", value.len()),
            ));
        }
        let class = value[2] & 0x07;
        let number = value[3];
        if !(3..=6).contains(&class) || number > 99 {
            return Err(StunError::bad_attribute(
                code,
                format!("error code out of range: class {} number {}", class, number),
            ));
        }
        Ok(Self {
            code: class as u16 * 100 + number as u16,
            reason: decode_text(code, &value[4..], MAX_TEXT_LENGTH)?,
        })
    }
}

/**
 * A STUN attribute. Registered types decode into the variant matching their
 * category; anything else is kept as `Unknown` with its raw code and bytes.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Address {
        attr_type: AttributeType,
        address: SocketAddr,
    },
    XorAddress {
        attr_type: AttributeType,
        address: SocketAddr,
    },
    Text {
        attr_type: AttributeType,
        value: String,
    },
    Integer {
        attr_type: AttributeType,
        value: u32,
    },
    Long {
        attr_type: AttributeType,
        value: u64,
    },
    Plain {
        attr_type: AttributeType,
        value: Vec<u8>,
    },
    ErrorCode(ErrorCode),
    UnknownAttributes(Vec<u16>),
    MessageIntegrity(MessageIntegrity),
    Fingerprint(Fingerprint),
    Unknown {
        code: u16,
        value: Vec<u8>,
    },
}

/// MAPPED-ADDRESS, for responses to clients that predate XOR-MAPPED-ADDRESS
pub fn create_mapped_address_attribute(address: SocketAddr) -> Attribute {
    Attribute::Address {
        attr_type: AttributeType::MappedAddress,
        address,
    }
}

/// XOR-MAPPED-ADDRESS, obfuscated with the transaction ID of the packet it is written into
pub fn create_xor_mapped_address_attribute(address: SocketAddr) -> Attribute {
    Attribute::XorAddress {
        attr_type: AttributeType::XorMappedAddress,
        address,
    }
}

/// FINGERPRINT, computed when the packet is serialized; must be the last attribute
pub fn create_fingerprint_attribute() -> Attribute {
    Attribute::Fingerprint(Fingerprint::placeholder())
}

impl Attribute {
    pub fn username(username: &str) -> Self {
        Self::text(AttributeType::Username, username)
    }

    pub fn realm(realm: &str) -> Self {
        Self::text(AttributeType::Realm, realm)
    }

    pub fn nonce(nonce: &str) -> Self {
        Self::text(AttributeType::Nonce, nonce)
    }

    pub fn software(software: &str) -> Self {
        Self::text(AttributeType::Software, software)
    }

    fn text(attr_type: AttributeType, value: &str) -> Self {
        Attribute::Text {
            attr_type,
            value: value.to_string(),
        }
    }

    pub fn error_code(code: u16, reason: &str) -> Self {
        Attribute::ErrorCode(ErrorCode::new(code, reason))
    }

    pub fn unknown_attributes(codes: Vec<u16>) -> Self {
        Attribute::UnknownAttributes(codes)
    }

    pub fn priority(priority: u32) -> Self {
        Attribute::Integer {
            attr_type: AttributeType::Priority,
            value: priority,
        }
    }

    pub fn lifetime(seconds: u32) -> Self {
        Attribute::Integer {
            attr_type: AttributeType::Lifetime,
            value: seconds,
        }
    }

    pub fn change_request(change_ip: bool, change_port: bool) -> Self {
        let mut flags = 0u32;
        if change_ip {
            flags |= 0x04;
        }
        if change_port {
            flags |= 0x02;
        }
        Attribute::Integer {
            attr_type: AttributeType::ChangeRequest,
            value: flags,
        }
    }

    pub fn ice_controlled(tie_breaker: u64) -> Self {
        Attribute::Long {
            attr_type: AttributeType::IceControlled,
            value: tie_breaker,
        }
    }

    pub fn ice_controlling(tie_breaker: u64) -> Self {
        Attribute::Long {
            attr_type: AttributeType::IceControlling,
            value: tie_breaker,
        }
    }

    pub fn use_candidate() -> Self {
        Attribute::Plain {
            attr_type: AttributeType::UseCandidate,
            value: Vec::new(),
        }
    }

    /// MESSAGE-INTEGRITY signed with long-term credentials when the packet is serialized
    pub fn message_integrity(username: &str, realm: &str, password: &str) -> Self {
        Attribute::MessageIntegrity(MessageIntegrity::long_term(username, realm, password))
    }

    /// MESSAGE-INTEGRITY signed with a raw key when the packet is serialized
    pub fn message_integrity_with_key(key: &[u8]) -> Self {
        Attribute::MessageIntegrity(MessageIntegrity::with_key(key))
    }

    /// The registered type, `None` for passthrough attributes
    pub fn attr_type(&self) -> Option<AttributeType> {
        match self {
            Attribute::Address { attr_type, .. }
            | Attribute::XorAddress { attr_type, .. }
            | Attribute::Text { attr_type, .. }
            | Attribute::Integer { attr_type, .. }
            | Attribute::Long { attr_type, .. }
            | Attribute::Plain { attr_type, .. } => Some(*attr_type),
            Attribute::ErrorCode(_) => Some(AttributeType::ErrorCode),
            Attribute::UnknownAttributes(_) => Some(AttributeType::UnknownAttributes),
            Attribute::MessageIntegrity(_) => Some(AttributeType::MessageIntegrity),
            Attribute::Fingerprint(_) => Some(AttributeType::Fingerprint),
            Attribute::Unknown { .. } => None,
        }
    }

    /// The 16 bit wire code
    pub fn code(&self) -> u16 {
        match self {
            Attribute::Unknown { code, .. } => *code,
            other => other.attr_type().map(AttributeType::code).unwrap_or_default(),
        }
    }

    /// Unpadded length of the value
    pub fn value_len(&self) -> usize {
        match self {
            Attribute::Address { address, .. } | Attribute::XorAddress { address, .. } => {
                crate::stun::address::address_len(address)
            }
            Attribute::Text { value, .. } => value.len(),
            Attribute::Integer { .. } => 4,
            Attribute::Long { .. } => 8,
            Attribute::Plain { value, .. } => value.len(),
            Attribute::ErrorCode(error) => 4 + error.reason.len(),
            Attribute::UnknownAttributes(codes) => codes.len() * 2,
            Attribute::MessageIntegrity(_) => INTEGRITY_LENGTH,
            Attribute::Fingerprint(_) => FINGERPRINT_LENGTH,
            Attribute::Unknown { value, .. } => value.len(),
        }
    }

    /**
     * The value bytes, unpadded. Security attributes come out zeroed; the packet
     * encoder fills them in once everything before them has been written.
     */
    pub(crate) fn encode_value(&self, transaction_id: &TransactionId) -> Result<Vec<u8>, StunError> {
        let value = match self {
            Attribute::Address { address, .. } => encode_address(*address).as_ref().to_vec(),
            Attribute::XorAddress { address, .. } => {
                encode_xor_address(*address, transaction_id).as_ref().to_vec()
            }
            Attribute::Text { value, .. } => value.as_bytes().to_vec(),
            Attribute::Integer { value, .. } => value.to_be_bytes().to_vec(),
            Attribute::Long { value, .. } => value.to_be_bytes().to_vec(),
            Attribute::Plain { value, .. } => value.clone(),
            Attribute::ErrorCode(error) => error.encode()?,
            Attribute::UnknownAttributes(codes) => {
                codes.iter().flat_map(|c| c.to_be_bytes()).collect()
            }
            Attribute::MessageIntegrity(_) => vec![0u8; INTEGRITY_LENGTH],
            Attribute::Fingerprint(_) => vec![0u8; FINGERPRINT_LENGTH],
            Attribute::Unknown { value, .. } => value.clone(),
        };
        Ok(value)
    }

    /**
     * Decode one attribute value.
     *
     * @param code The wire type
     * @param value The value bytes, without padding
     * @param transaction_id The transaction ID of the enclosing message, for XOR addresses
     * @param prefix All message bytes before this attribute, for the security attributes
     */
    pub fn decode(
        code: u16,
        value: &[u8],
        transaction_id: &TransactionId,
        prefix: &[u8],
    ) -> Result<Self, StunError> {
        let attr_type = match AttributeType::from_code(code) {
            Some(t) => t,
            None => {
                return Ok(Attribute::Unknown {
                    code,
                    value: value.to_vec(),
                })
            }
        };

        if let Some(expected) = attr_type.fixed_len() {
            if value.len() != expected {
                return Err(StunError::bad_attribute(
                    code,
                    format!(
                        "{} needs {} bytes, got {}",
                        attr_type.name(),
                        expected,
                        value.len()
                    ),
                ));
            }
        }

        let attribute = match attr_type.category() {
            Category::Address => Attribute::Address {
                attr_type,
                address: decode_address(code, value)?,
            },
            Category::XorAddress => Attribute::XorAddress {
                attr_type,
                address: decode_xor_address(code, value, transaction_id)?,
            },
            Category::String => {
                let max = if attr_type == AttributeType::Username {
                    MAX_USERNAME_LENGTH
                } else {
                    MAX_TEXT_LENGTH
                };
                Attribute::Text {
                    attr_type,
                    value: decode_text(code, value, max)?,
                }
            }
            Category::Integer => Attribute::Integer {
                attr_type,
                value: read_u32(value, 0),
            },
            Category::Long => Attribute::Long {
                attr_type,
                value: read_u64(value, 0),
            },
            Category::Plain => Attribute::Plain {
                attr_type,
                value: value.to_vec(),
            },
            Category::Error => Attribute::ErrorCode(ErrorCode::decode(code, value)?),
            Category::UnknownAttributes => {
                Attribute::UnknownAttributes(decode_unknown_attributes(code, value)?)
            }
            Category::Security => match attr_type {
                AttributeType::MessageIntegrity => {
                    Attribute::MessageIntegrity(MessageIntegrity::decode(code, value, prefix)?)
                }
                _ => Attribute::Fingerprint(Fingerprint::decode(code, value, prefix)?),
            },
        };

        Ok(attribute)
    }

    pub fn as_address(&self) -> Option<SocketAddr> {
        match self {
            Attribute::Address { address, .. } | Attribute::XorAddress { address, .. } => {
                Some(*address)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::Text { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Attribute::Integer { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Attribute::Long { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_error_code(&self) -> Option<&ErrorCode> {
        match self {
            Attribute::ErrorCode(error) => Some(error),
            _ => None,
        }
    }
}

fn decode_text(code: u16, value: &[u8], max: usize) -> Result<String, StunError> {
    if value.len() > max {
        return Err(StunError::bad_attribute(
            code,
            format!("text too long: {} > {}", value.len(), max),
        ));
    }
    String::from_utf8(value.to_vec())
        .map_err(|_| StunError::bad_attribute(code, "malformed utf-8"))
}

/**
 * Every listed code has to be one we know; the list names attributes from our
 * own request, so an unrecognized code means the value itself is damaged.
 */
fn decode_unknown_attributes(code: u16, value: &[u8]) -> Result<Vec<u16>, StunError> {
    if value.len() % 2 != 0 {
        return Err(StunError::bad_attribute(
            code,
            format!("odd length {}", value.len()),
        ));
    }
    let mut codes = Vec::with_capacity(value.len() / 2);
    for offset in (0..value.len()).step_by(2) {
        let listed = read_u16(value, offset);
        if AttributeType::from_code(listed).is_none() {
            return Err(StunError::bad_attribute(
                code,
                format!("lists unrecognized attribute 0x{:04x}", listed),
            ));
        }
        codes.push(listed);
    }
    Ok(codes)
}
