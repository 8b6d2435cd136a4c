/**
 * The 20 byte STUN message header and transaction IDs
 * See RFC 5389 Section 6 for details
 * https://datatracker.ietf.org/doc/html/rfc5389#section-6
 *
 *  0                   1                   2                   3
 *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |0 0|     STUN Message Type     |         Message Length        |
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |                         Magic Cookie                          |
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |                     Transaction ID (96 bits)                  |
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 */
use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::StunError;
use crate::stun::wire::{read_u16, write_u16};
use crate::stun::{HEADER_LENGTH, MAGIC_COOKIE};

const CLASS_MASK: u16 = 0x0110;

/// The class of a STUN message, carried in bits C1 (0x0100) and C0 (0x0010) of the message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Request,
    Indication,
    Success,
    Error,
}

impl Class {
    fn bits(self) -> u16 {
        match self {
            Class::Request => 0x0000,
            Class::Indication => 0x0010,
            Class::Success => 0x0100,
            Class::Error => 0x0110,
        }
    }

    fn from_bits(message_type: u16) -> Self {
        match message_type & CLASS_MASK {
            0x0000 => Class::Request,
            0x0010 => Class::Indication,
            0x0100 => Class::Success,
            _ => Class::Error,
        }
    }

    /// Success and error responses answer a request
    pub fn is_response(self) -> bool {
        matches!(self, Class::Success | Class::Error)
    }
}

/// The 12 bit STUN method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Binding,
    SharedSecret,
    Allocate,
    Refresh,
    Send,
    Data,
    CreatePermission,
    ChannelBind,
    Other(u16),
}

impl Method {
    pub fn code(self) -> u16 {
        match self {
            Method::Binding => 0x001,
            Method::SharedSecret => 0x002,
            Method::Allocate => 0x003,
            Method::Refresh => 0x004,
            Method::Send => 0x006,
            Method::Data => 0x007,
            Method::CreatePermission => 0x008,
            Method::ChannelBind => 0x009,
            Method::Other(code) => code & 0x0FFF,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            0x001 => Method::Binding,
            0x002 => Method::SharedSecret,
            0x003 => Method::Allocate,
            0x004 => Method::Refresh,
            0x006 => Method::Send,
            0x007 => Method::Data,
            0x008 => Method::CreatePermission,
            0x009 => Method::ChannelBind,
            other => Method::Other(other & 0x0FFF),
        }
    }
}

/// Interleave class and method into the 14 bit message type field
pub fn message_type(class: Class, method: Method) -> u16 {
    let m = method.code();
    (m & 0x000F) | ((m & 0x0070) << 1) | ((m & 0x0F80) << 2) | class.bits()
}

/// Split a message type field back into class and method
pub fn split_message_type(message_type: u16) -> (Class, Method) {
    let m = (message_type & 0x000F) | ((message_type & 0x00E0) >> 1) | ((message_type & 0x3E00) >> 2);
    (Class::from_bits(message_type), Method::from_code(m))
}

/**
 * A 128 bit transaction ID. For RFC 5389 messages the first four bytes are the
 * magic cookie and the remaining 96 bits are random.
 */
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; 16]);

impl TransactionId {
    /// A fresh RFC 5389 transaction ID from the operating system's CSPRNG
    pub fn new() -> Self {
        let mut id = [0u8; 16];
        id[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        OsRng.fill_bytes(&mut id[4..]);
        TransactionId(id)
    }

    /**
     * Build a transaction ID from caller supplied bytes.
     *
     * - up to 12 bytes: the magic cookie followed by the bytes, zero filled
     * - 13 to 16 bytes: the bytes as they are, without a cookie, zero filled
     * - more than 16 bytes: only the first 16 are used
     */
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut id = [0u8; 16];
        if bytes.len() <= 12 {
            id[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
            id[4..4 + bytes.len()].copy_from_slice(bytes);
        } else {
            let n = bytes.len().min(16);
            id[..n].copy_from_slice(&bytes[..n]);
        }
        TransactionId(id)
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        TransactionId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The leading 32 bits carry the magic cookie
    pub fn is_rfc5389(&self) -> bool {
        self.0[..4] == MAGIC_COOKIE.to_be_bytes()
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", hex::encode(self.0))
    }
}

/**
 * A decoded STUN header. `length` is the body length, which excludes the 20
 * header bytes.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunHeader {
    pub class: Class,
    pub method: Method,
    pub length: u16,
    pub transaction_id: TransactionId,
}

impl StunHeader {
    pub fn new(class: Class, method: Method, transaction_id: TransactionId) -> Self {
        Self {
            class,
            method,
            length: 0,
            transaction_id,
        }
    }

    /// Write the header into the first 20 bytes of `output`
    pub fn encode(&self, output: &mut [u8]) -> Result<(), StunError> {
        if output.len() < HEADER_LENGTH {
            return Err(StunError::BufferTooSmall(HEADER_LENGTH));
        }
        write_u16(output, 0, message_type(self.class, self.method));
        write_u16(output, 2, self.length);
        output[4..HEADER_LENGTH].copy_from_slice(self.transaction_id.as_bytes());
        Ok(())
    }

    /**
     * Read a header from the start of `bytes`. Only the shape is checked here
     * (size and the two leading zero bits), the cookie is left to the caller.
     */
    pub fn decode(bytes: &[u8]) -> Result<Self, StunError> {
        if bytes.len() < HEADER_LENGTH {
            return Err(StunError::Truncated(format!(
                "header needs {} bytes, got {}",
                HEADER_LENGTH,
                bytes.len()
            )));
        }
        if bytes[0] & 0xC0 != 0 {
            return Err(StunError::NotStun(format!(
                "leading bits set: 0x{:02x}",
                bytes[0]
            )));
        }

        let (class, method) = split_message_type(read_u16(bytes, 0));
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[4..HEADER_LENGTH]);

        Ok(Self {
            class,
            method,
            length: read_u16(bytes, 2),
            transaction_id: TransactionId(id),
        })
    }
}
