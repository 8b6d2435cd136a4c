/**
 * Address attribute values (MAPPED-ADDRESS and friends, XOR-MAPPED-ADDRESS and friends)
 * See RFC 5389 Section 15.1 and 15.2
 *
 *  0                   1                   2                   3
 *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |0 0 0 0 0 0 0 0|    Family     |           Port                |
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 * |                 Address (32 bits or 128 bits)                 |
 * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 */
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::StunError;
use crate::stun::header::TransactionId;
use crate::stun::wire::{read_u16, write_u16};
use crate::stun::{FAMILY_IPV4, FAMILY_IPV6, MAGIC_COOKIE};

/**
 * STUN addresses may be ipv4 or ipv6, and each has a different storage requirement
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizedAddress {
    Ipv4([u8; 8]),
    Ipv6([u8; 20]),
}

impl SizedAddress {
    /**
     * Get the length of the address
     */
    pub fn len(&self) -> usize {
        match self {
            SizedAddress::Ipv4(_) => 8,
            SizedAddress::Ipv6(_) => 20,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl AsRef<[u8]> for SizedAddress {
    fn as_ref(&self) -> &[u8] {
        match self {
            SizedAddress::Ipv4(addr) => addr,
            SizedAddress::Ipv6(addr) => addr,
        }
    }
}

/// Encoded size of an address attribute value
pub fn address_len(address: &SocketAddr) -> usize {
    match address {
        SocketAddr::V4(_) => 8,
        SocketAddr::V6(_) => 20,
    }
}

/**
 * Encode an address without obfuscation (MAPPED-ADDRESS layout)
 */
pub fn encode_address(address: SocketAddr) -> SizedAddress {
    match address.ip() {
        IpAddr::V4(ip) => {
            let mut addr = [0u8; 8];
            addr[1] = FAMILY_IPV4;
            write_u16(&mut addr, 2, address.port());
            addr[4..8].copy_from_slice(&ip.octets());
            SizedAddress::Ipv4(addr)
        }
        IpAddr::V6(ip) => {
            let mut addr = [0u8; 20];
            addr[1] = FAMILY_IPV6;
            write_u16(&mut addr, 2, address.port());
            addr[4..20].copy_from_slice(&ip.octets());
            SizedAddress::Ipv6(addr)
        }
    }
}

/**
 * Decode a plain address value. The family byte selects the width and the value
 * must be exactly that wide.
 *
 * @param code The attribute type, used for error reporting
 */
pub fn decode_address(code: u16, value: &[u8]) -> Result<SocketAddr, StunError> {
    if value.len() < 4 {
        return Err(StunError::bad_attribute(
            code,
            format!("address value too short: {}", value.len()),
        ));
    }
    let port = read_u16(value, 2);

    let ip = match value[1] {
        FAMILY_IPV4 => {
            if value.len() != 8 {
                return Err(StunError::bad_attribute(
                    code,
                    format!("ipv4 address needs 8 bytes, got {}", value.len()),
                ));
            }
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&value[4..8]);
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        FAMILY_IPV6 => {
            if value.len() != 20 {
                return Err(StunError::bad_attribute(
                    code,
                    format!("ipv6 address needs 20 bytes, got {}", value.len()),
                ));
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&value[4..20]);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        family => {
            return Err(StunError::bad_attribute(
                code,
                format!("unknown address family 0x{:02x}", family),
            ));
        }
    };

    Ok(SocketAddr::new(ip, port))
}

/**
 * XOR an address with the cookie and transaction ID. Applying it twice gives the
 * original address back, so it serves for both directions.
 *
 * The port is XORed with the top 16 bits of the magic cookie, an ipv4 address
 * with the cookie and an ipv6 address with the full 16 byte transaction ID.
 */
pub fn xor_address(address: SocketAddr, transaction_id: &TransactionId) -> SocketAddr {
    let port = address.port() ^ ((MAGIC_COOKIE >> 16) as u16);

    let ip = match address.ip() {
        IpAddr::V4(ip) => {
            let cookie = MAGIC_COOKIE.to_be_bytes();
            let mut octets = ip.octets();
            for (byte, mask) in octets.iter_mut().zip(cookie.iter()) {
                *byte ^= mask;
            }
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        IpAddr::V6(ip) => {
            let mut octets = ip.octets();
            for (byte, mask) in octets.iter_mut().zip(transaction_id.as_bytes().iter()) {
                *byte ^= mask;
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
    };

    SocketAddr::new(ip, port)
}

/**
 * Encode an address the XOR-MAPPED-ADDRESS way
 */
pub fn encode_xor_address(address: SocketAddr, transaction_id: &TransactionId) -> SizedAddress {
    encode_address(xor_address(address, transaction_id))
}

/**
 * Decode an XOR encoded address. The attribute value carries no transaction ID, so the
 * caller has to supply the one from the enclosing message.
 */
pub fn decode_xor_address(
    code: u16,
    value: &[u8],
    transaction_id: &TransactionId,
) -> Result<SocketAddr, StunError> {
    decode_address(code, value).map(|obfuscated| xor_address(obfuscated, transaction_id))
}
