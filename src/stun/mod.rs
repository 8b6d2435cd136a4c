/**
 * The STUN-specific module, this file contains various constant definitions
 * shared by the codec submodules
 */

pub mod address;
pub mod attribute;
pub mod header;
pub mod packet;
pub mod security;
pub mod wire;

/// length of a STUN header is 20 bytes
pub const HEADER_LENGTH: usize = 20;

/// This value is included in STUN messages to help differentiate them from other types of network traffic and to
/// ensure that the messages are processed correctly by STUN servers and clients. The Magic Cookie value is 0x2112A442
pub const MAGIC_COOKIE: u32 = 0x2112A442;

/// XORed into the CRC32 of the message to form the FINGERPRINT value (ASCII "STUN")
pub const FINGERPRINT_XOR: u32 = 0x5354554E;

/// The largest body a 16-bit length field can describe, kept on a 4 byte boundary
pub const MAX_BODY_LENGTH: usize = 0xFFFC;

// Address families used by the address attributes
pub(crate) const FAMILY_IPV4: u8 = 0x01;
pub(crate) const FAMILY_IPV6: u8 = 0x02;

/*
   Comprehension-required range (0x0000-0x7FFF):
     0x0000: (Reserved)
     0x0001: MAPPED-ADDRESS
     0x0002: (Reserved; was RESPONSE-ADDRESS)
     0x0003: (Reserved; was CHANGE-ADDRESS)
     0x0004: (Reserved; was SOURCE-ADDRESS)
     0x0005: (Reserved; was CHANGED-ADDRESS)
     0x0006: USERNAME
     0x0007: (Reserved; was PASSWORD)
     0x0008: MESSAGE-INTEGRITY
     0x0009: ERROR-CODE
     0x000A: UNKNOWN-ATTRIBUTES
     0x000B: (Reserved; was REFLECTED-FROM)
     0x0014: REALM
     0x0015: NONCE
     0x0020: XOR-MAPPED-ADDRESS

   Comprehension-optional range (0x8000-0xFFFF)
     0x8022: SOFTWARE
     0x8023: ALTERNATE-SERVER
     0x8028: FINGERPRINT
*/

// Attribute Types
#[allow(dead_code)]
pub mod attribute_type {
    /// This attribute specifies an IP address and port, which are included in the Binding Response. It identifies the
    /// source IP address and port observed by the server in the Binding Request from the client, representing the
    /// public IP address and port of the STUN client, accessible from the internet.
    pub const ATTR_MAPPED_ADDRESS: u16 = 0x0001;

    /// RFC 3489: where the Binding Response should be sent.
    pub const ATTR_RESPONSE_ADDRESS: u16 = 0x0002;

    /// RFC 3489/5780: "change IP" and "change port" flags asking the server to answer from another address.
    pub const ATTR_CHANGE_REQUEST: u16 = 0x0003;

    /// RFC 3489: the address the server sent the response from.
    pub const ATTR_SOURCE_ADDRESS: u16 = 0x0004;

    /// RFC 3489: the address the server would answer from if asked to change IP and port.
    pub const ATTR_CHANGED_ADDRESS: u16 = 0x0005;

    /// The USERNAME attribute in a STUN packet is used to provide a credential
    /// that can be used to authenticate the client to the server.
    pub const ATTR_USERNAME: u16 = 0x0006;

    /// RFC 3489 shared secret password.
    pub const ATTR_PASSWORD: u16 = 0x0007;

    /// HMAC-SHA1 of the STUN message up to (but excluding) this attribute.
    pub const ATTR_MESSAGE_INTEGRITY: u16 = 0x0008;

    /// Error class and number (300 to 699) followed by a UTF-8 reason phrase.
    pub const ATTR_ERROR_CODE: u16 = 0x0009;

    /// Present in 420 error responses, lists the comprehension-required attributes the server did not understand.
    pub const ATTR_UNKNOWN_ATTRIBUTES: u16 = 0x000A;

    /// RFC 3489: the source address of the request, for traceability.
    pub const ATTR_REFLECTED_FROM: u16 = 0x000B;

    /// TURN: requested or granted allocation lifetime in seconds.
    pub const ATTR_LIFETIME: u16 = 0x000D;

    /// TURN: peer address, XOR encoded.
    pub const ATTR_XOR_PEER_ADDRESS: u16 = 0x0012;

    /// The realm within which the username and password are valid.
    pub const ATTR_REALM: u16 = 0x0014;

    /// Server provided nonce, echoed back with long-term credentials.
    pub const ATTR_NONCE: u16 = 0x0015;

    /// TURN: relayed transport address, XOR encoded.
    pub const ATTR_XOR_RELAYED_ADDRESS: u16 = 0x0016;

    /// This attribute reveals the public IP address and port of the STUN client as observed by the STUN server, but
    /// does so in a manner that makes it harder for intermediaries to tamper with the IP address and port information.
    /// If both are included XOR_MAPPED_ADDRESS takes precedence over MAPPED_ADDRESS.
    pub const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;

    /// ICE: candidate priority.
    pub const ATTR_PRIORITY: u16 = 0x0024;

    /// ICE: nomination flag, no value.
    pub const ATTR_USE_CANDIDATE: u16 = 0x0025;

    /// RFC 5780: padding bytes used to probe for fragmentation.
    pub const ATTR_PADDING: u16 = 0x0026;

    /// A human-readable description of the software, including its name and version.
    pub const ATTR_SOFTWARE: u16 = 0x8022;

    /// This attribute redirects the client to a different STUN server for subsequent requests.
    pub const ATTR_ALTERNATE_SERVER: u16 = 0x8023;

    /// The CRC32 of the STUN message XORed with the constant 0x5354554E (the ASCII representation of "STUN").
    pub const ATTR_FINGERPRINT: u16 = 0x8028;

    /// ICE: tie breaker of the controlled agent.
    pub const ATTR_ICE_CONTROLLED: u16 = 0x8029;

    /// ICE: tie breaker of the controlling agent.
    pub const ATTR_ICE_CONTROLLING: u16 = 0x802A;

    /// RFC 5780: the address the response was sent from.
    pub const ATTR_RESPONSE_ORIGIN: u16 = 0x802B;

    /// RFC 5780: the server's alternate address.
    pub const ATTR_OTHER_ADDRESS: u16 = 0x802C;
}

// Error Codes
#[allow(dead_code)]
pub mod error_code {
    /// Try Alternate (300)
    pub const ERROR_CODE_TRY_ALTERNATE: u16 = 300;

    /// Bad Request (400)
    pub const ERROR_CODE_BAD_REQUEST: u16 = 400;

    /// Unauthorized (401)
    pub const ERROR_CODE_UNAUTHORIZED: u16 = 401;

    /// Unknown Attribute (420)
    pub const ERROR_CODE_UNKNOWN_ATTRIBUTE: u16 = 420;

    /// Stale Nonce (438)
    pub const ERROR_CODE_STALE_NONCE: u16 = 438;

    /// Server Error (500)
    pub const ERROR_CODE_SERVER_ERROR: u16 = 500;
}
