/**
 * A complete STUN message: header plus an ordered list of attributes
 * See RFC 5389 Section 6 and 15 for details
 * https://datatracker.ietf.org/doc/html/rfc5389#section-6
 */
use std::net::SocketAddr;

use crate::auth::AuthContext;
use crate::error::StunError;
use crate::stun::attribute::{
    create_xor_mapped_address_attribute, Attribute, AttributeType, ErrorCode,
};
use crate::stun::attribute_type::ATTR_FINGERPRINT;
use crate::stun::header::{Class, Method, StunHeader, TransactionId};
use crate::stun::security::{
    calculate_fingerprint, hmac_sha1, integrity_input, MessageIntegrity, INTEGRITY_LENGTH,
};
use crate::stun::wire::{pad4, read_u16, read_u32, write_u16, write_u32};
use crate::stun::{HEADER_LENGTH, MAGIC_COOKIE, MAX_BODY_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunPacket {
    pub class: Class,
    pub method: Method,
    pub transaction_id: TransactionId,
    pub attributes: Vec<Attribute>,
}

impl StunPacket {
    pub fn new(class: Class, method: Method, transaction_id: TransactionId) -> Self {
        Self {
            class,
            method,
            transaction_id,
            attributes: Vec::new(),
        }
    }

    /// An empty Binding request with a fresh transaction ID
    pub fn binding_request() -> Self {
        Self::new(Class::Request, Method::Binding, TransactionId::new())
    }

    /// A Binding success response reporting `mapped` as XOR-MAPPED-ADDRESS
    pub fn binding_success(transaction_id: TransactionId, mapped: SocketAddr) -> Self {
        Self::new(Class::Success, Method::Binding, transaction_id)
            .with_attribute(create_xor_mapped_address_attribute(mapped))
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// The first attribute of the given type
    pub fn attribute(&self, attr_type: AttributeType) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.attr_type() == Some(attr_type))
    }

    /// Attributes by wire code, passthrough attributes included
    pub fn attributes_by_code(&self, code: u16) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(move |a| a.code() == code)
    }

    /// The transaction ID starts with the magic cookie
    pub fn is_rfc5389(&self) -> bool {
        self.transaction_id.is_rfc5389()
    }

    pub fn mapped_address(&self) -> Option<SocketAddr> {
        self.attribute(AttributeType::MappedAddress)
            .and_then(Attribute::as_address)
    }

    pub fn xor_mapped_address(&self) -> Option<SocketAddr> {
        self.attribute(AttributeType::XorMappedAddress)
            .and_then(Attribute::as_address)
    }

    pub fn error_code(&self) -> Option<&ErrorCode> {
        self.attribute(AttributeType::ErrorCode)
            .and_then(Attribute::as_error_code)
    }

    pub fn message_integrity(&self) -> Option<&MessageIntegrity> {
        match self.attribute(AttributeType::MessageIntegrity) {
            Some(Attribute::MessageIntegrity(integrity)) => Some(integrity),
            _ => None,
        }
    }

    /// `None` without a FINGERPRINT attribute, otherwise whether it verified on decode
    pub fn fingerprint_valid(&self) -> Option<bool> {
        match self.attribute(AttributeType::Fingerprint) {
            Some(Attribute::Fingerprint(fingerprint)) => fingerprint.is_valid(),
            _ => None,
        }
    }

    /// Size of the serialized message, header included
    pub fn encoded_len(&self) -> usize {
        HEADER_LENGTH
            + self
                .attributes
                .iter()
                .map(|a| 4 + pad4(a.value_len()))
                .sum::<usize>()
    }

    /**
     * Serialize the packet into the provided buffer
     *
     * Attributes are written in order. MESSAGE-INTEGRITY and FINGERPRINT are
     * computed over the bytes already written when they are reached.
     *
     * @param output The buffer to write the message into
     * @return The number of bytes written
     */
    pub fn encode(&self, output: &mut [u8]) -> Result<usize, StunError> {
        let total = self.encoded_len();
        if total - HEADER_LENGTH > MAX_BODY_LENGTH {
            return Err(StunError::TooLarge(total));
        }
        if output.len() < total {
            return Err(StunError::BufferTooSmall(total));
        }
        if let Some(position) = self
            .attributes
            .iter()
            .position(|a| matches!(a, Attribute::Fingerprint(_)))
        {
            if position != self.attributes.len() - 1 {
                return Err(StunError::FingerprintNotLast);
            }
        }

        let mut header = StunHeader::new(self.class, self.method, self.transaction_id);
        header.length = (total - HEADER_LENGTH) as u16;
        header.encode(output)?;

        let mut offset = HEADER_LENGTH;
        for attribute in &self.attributes {
            let value = attribute.encode_value(&self.transaction_id)?;
            let start = offset + 4;
            let end = start + pad4(value.len());

            write_u16(output, offset, attribute.code());
            write_u16(output, offset + 2, value.len() as u16);
            output[start..start + value.len()].copy_from_slice(&value);
            output[start + value.len()..end].fill(0);

            match attribute {
                Attribute::MessageIntegrity(integrity) => {
                    let key = integrity.key().ok_or(StunError::MissingKey)?;
                    let hmac = hmac_sha1(key, &integrity_input(&output[..offset]));
                    output[start..start + INTEGRITY_LENGTH].copy_from_slice(&hmac);
                }
                Attribute::Fingerprint(_) => {
                    let crc = calculate_fingerprint(&output[..offset]);
                    write_u32(output, start, crc);
                }
                _ => {}
            }

            offset = end;
        }

        Ok(offset)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StunError> {
        let mut buffer = vec![0u8; self.encoded_len()];
        let written = self.encode(&mut buffer)?;
        buffer.truncate(written);
        Ok(buffer)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StunError> {
        Self::decode_with_auth(bytes, None)
    }

    /**
     * Deserialize a STUN message.
     *
     * Unknown attribute types are kept as passthrough attributes. A registered
     * attribute with a malformed value fails the whole message. Bytes past the
     * length given in the header are ignored.
     *
     * @param bytes The received bytes
     * @param auth When given, USERNAME and REALM are captured into it for a later integrity check
     */
    pub fn decode_with_auth(
        bytes: &[u8],
        mut auth: Option<&mut AuthContext>,
    ) -> Result<Self, StunError> {
        let header = StunHeader::decode(bytes)?;
        let body_length = header.length as usize;

        if body_length % 4 != 0 {
            return Err(StunError::NotStun(format!(
                "length {} is not a multiple of 4",
                body_length
            )));
        }
        if bytes.len() < HEADER_LENGTH + body_length {
            return Err(StunError::Truncated(format!(
                "header says {} body bytes, got {}",
                body_length,
                bytes.len() - HEADER_LENGTH
            )));
        }

        let message = &bytes[..HEADER_LENGTH + body_length];
        let mut attributes = Vec::new();
        let mut offset = HEADER_LENGTH;
        let mut remaining = body_length;

        while remaining > 0 {
            let code = read_u16(message, offset);
            let length = read_u16(message, offset + 2) as usize;
            if length > remaining - 4 {
                return Err(StunError::Truncated(format!(
                    "attribute 0x{:04x} length {} exceeds remaining {}",
                    code,
                    length,
                    remaining - 4
                )));
            }

            let start = offset + 4;
            let attribute = Attribute::decode(
                code,
                &message[start..start + length],
                &header.transaction_id,
                &message[..offset],
            )?;

            if let Some(context) = auth.as_deref_mut() {
                capture_credentials(context, &attribute);
            }
            attributes.push(attribute);

            let advance = 4 + pad4(length);
            offset += advance;
            remaining -= advance;
        }

        Ok(Self {
            class: header.class,
            method: header.method,
            transaction_id: header.transaction_id,
            attributes,
        })
    }
}

fn capture_credentials(context: &mut AuthContext, attribute: &Attribute) {
    if let Attribute::Text { attr_type, value } = attribute {
        match attr_type {
            AttributeType::Username => context.username = Some(value.clone()),
            AttributeType::Realm => context.realm = Some(value.clone()),
            _ => {}
        }
    }
}

/**
 * RFC 5389 compliance check on raw bytes: header shape, length alignment, magic
 * cookie, and a FINGERPRINT (if any) that is last and verifies. Anything else is
 * "not a STUN packet" and may be handled as ordinary payload.
 */
pub fn is_stun_packet(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LENGTH {
        return false;
    }
    if bytes[0] & 0xC0 != 0 {
        return false;
    }
    let body_length = read_u16(bytes, 2) as usize;
    if body_length % 4 != 0 {
        return false;
    }
    if read_u32(bytes, 4) != MAGIC_COOKIE {
        return false;
    }
    let end = HEADER_LENGTH + body_length;
    if bytes.len() < end {
        return false;
    }

    let mut offset = HEADER_LENGTH;
    while offset + 4 <= end {
        let code = read_u16(bytes, offset);
        let length = read_u16(bytes, offset + 2) as usize;
        let next = offset + 4 + pad4(length);
        if next > end {
            return false;
        }
        if code == ATTR_FINGERPRINT {
            if next != end || length != 4 {
                return false;
            }
            return calculate_fingerprint(&bytes[..offset]) == read_u32(bytes, offset + 4);
        }
        offset = next;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SimpleAuth;
    use crate::stun::attribute::{create_fingerprint_attribute, create_mapped_address_attribute};
    use rand::Rng;

    // RFC 5769 section 2.1, short-term credentials, password "VOkJxbRl1RmTxUk/WvJxBt"
    const RFC5769_REQUEST: [u8; 108] = [
        0x00, 0x01, 0x00, 0x58, 0x21, 0x12, 0xa4, 0x42, 0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6,
        0x86, 0xfa, 0x87, 0xdf, 0xae, 0x80, 0x22, 0x00, 0x10, 0x53, 0x54, 0x55, 0x4e, 0x20, 0x74,
        0x65, 0x73, 0x74, 0x20, 0x63, 0x6c, 0x69, 0x65, 0x6e, 0x74, 0x00, 0x24, 0x00, 0x04, 0x6e,
        0x00, 0x01, 0xff, 0x80, 0x29, 0x00, 0x08, 0x93, 0x2f, 0xf9, 0xb1, 0x51, 0x26, 0x3b, 0x36,
        0x00, 0x06, 0x00, 0x09, 0x65, 0x76, 0x74, 0x6a, 0x3a, 0x68, 0x36, 0x76, 0x59, 0x20, 0x20,
        0x20, 0x00, 0x08, 0x00, 0x14, 0x9a, 0xea, 0xa7, 0x0c, 0xbf, 0xd8, 0xcb, 0x56, 0x78, 0x1e,
        0xf2, 0xb5, 0xb2, 0xd3, 0xf2, 0x49, 0xc1, 0xb5, 0x71, 0xa2, 0x80, 0x28, 0x00, 0x04, 0xe5,
        0x7a, 0x3b, 0xcf,
    ];

    // The same request as this encoder writes it: zero padding after USERNAME
    const ZERO_PADDED_REQUEST: [u8; 108] = [
        0x00, 0x01, 0x00, 0x58, 0x21, 0x12, 0xa4, 0x42, 0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6,
        0x86, 0xfa, 0x87, 0xdf, 0xae, 0x80, 0x22, 0x00, 0x10, 0x53, 0x54, 0x55, 0x4e, 0x20, 0x74,
        0x65, 0x73, 0x74, 0x20, 0x63, 0x6c, 0x69, 0x65, 0x6e, 0x74, 0x00, 0x24, 0x00, 0x04, 0x6e,
        0x00, 0x01, 0xff, 0x80, 0x29, 0x00, 0x08, 0x93, 0x2f, 0xf9, 0xb1, 0x51, 0x26, 0x3b, 0x36,
        0x00, 0x06, 0x00, 0x09, 0x65, 0x76, 0x74, 0x6a, 0x3a, 0x68, 0x36, 0x76, 0x59, 0x00, 0x00,
        0x00, 0x00, 0x08, 0x00, 0x14, 0x79, 0x07, 0xc2, 0xd2, 0xed, 0xbf, 0xea, 0x48, 0x0e, 0x4c,
        0x76, 0xd8, 0x29, 0x62, 0xd5, 0xc3, 0x74, 0x2a, 0xf9, 0xe3, 0x80, 0x28, 0x00, 0x04, 0xe3,
        0x52, 0x92, 0x8d,
    ];

    const RFC5769_PASSWORD: &str = "VOkJxbRl1RmTxUk/WvJxBt";

    fn rfc5769_transaction_id() -> TransactionId {
        TransactionId::from_slice(&[
            0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6, 0x86, 0xfa, 0x87, 0xdf, 0xae,
        ])
    }

    fn rfc5769_packet() -> StunPacket {
        StunPacket::new(Class::Request, Method::Binding, rfc5769_transaction_id())
            .with_attribute(Attribute::software("STUN test client"))
            .with_attribute(Attribute::priority(0x6e0001ff))
            .with_attribute(Attribute::ice_controlled(0x932ff9b151263b36))
            .with_attribute(Attribute::username("evtj:h6vY"))
            .with_attribute(Attribute::message_integrity_with_key(RFC5769_PASSWORD.as_bytes()))
            .with_attribute(create_fingerprint_attribute())
    }

    #[test]
    fn test_decode_rfc5769_request() {
        let mut context = AuthContext::new();
        let packet = StunPacket::decode_with_auth(&RFC5769_REQUEST, Some(&mut context)).unwrap();

        assert_eq!(packet.class, Class::Request);
        assert_eq!(packet.method, Method::Binding);
        assert_eq!(packet.transaction_id, rfc5769_transaction_id());
        assert!(packet.is_rfc5389());
        assert_eq!(packet.attributes.len(), 6);
        assert_eq!(
            packet.attribute(AttributeType::Software).and_then(Attribute::as_str),
            Some("STUN test client")
        );
        assert_eq!(
            packet.attribute(AttributeType::Priority).and_then(Attribute::as_u32),
            Some(0x6e0001ff)
        );
        assert_eq!(packet.fingerprint_valid(), Some(true));
        assert_eq!(context.username.as_deref(), Some("evtj:h6vY"));
        assert_eq!(context.realm, None);

        let integrity = packet.message_integrity().unwrap();
        assert!(integrity.verify_key(RFC5769_PASSWORD.as_bytes()));
        assert!(!integrity.verify_key(b"wrong password"));

        let auth = SimpleAuth::new(None, "evtj:h6vY", RFC5769_PASSWORD);
        assert!(context.verify(integrity, &auth));
        assert!(is_stun_packet(&RFC5769_REQUEST));
    }

    #[test]
    fn test_encode_known_request() {
        let bytes = rfc5769_packet().to_bytes().unwrap();
        assert_eq!(bytes.len(), 108);
        assert_eq!(bytes[..], ZERO_PADDED_REQUEST[..]);
        assert!(is_stun_packet(&bytes));
    }

    #[test]
    fn test_round_trip_all_categories() {
        let tid = TransactionId::new();
        let v4: SocketAddr = "192.0.2.1:32853".parse().unwrap();
        let v6: SocketAddr = "[2001:db8:1234:5678:11:2233:4455:6677]:32853".parse().unwrap();

        let packet = StunPacket::new(Class::Success, Method::Binding, tid)
            .with_attribute(create_xor_mapped_address_attribute(v6))
            .with_attribute(create_mapped_address_attribute(v4))
            .with_attribute(Attribute::Address {
                attr_type: AttributeType::OtherAddress,
                address: v6,
            })
            .with_attribute(Attribute::software("syn"))
            .with_attribute(Attribute::lifetime(600))
            .with_attribute(Attribute::ice_controlling(u64::MAX - 7))
            .with_attribute(Attribute::use_candidate())
            .with_attribute(Attribute::error_code(438, "Stale Nonce"))
            .with_attribute(Attribute::unknown_attributes(vec![0x0024]))
            .with_attribute(Attribute::Unknown {
                code: 0xC001,
                value: vec![1, 2, 3, 4, 5],
            });

        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(bytes.len(), packet.encoded_len());

        let decoded = StunPacket::decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.xor_mapped_address(), Some(v6));
        assert_eq!(decoded.mapped_address(), Some(v4));
        assert_eq!(decoded.error_code().map(|e| e.code), Some(438));
        assert_eq!(decoded.fingerprint_valid(), None);
        assert_eq!(decoded.attributes_by_code(0xC001).count(), 1);
    }

    #[test]
    fn test_round_trip_with_long_term_integrity() {
        let packet = StunPacket::binding_request()
            .with_attribute(Attribute::username("user"))
            .with_attribute(Attribute::realm("example.org"))
            .with_attribute(Attribute::nonce("f00d"))
            .with_attribute(Attribute::message_integrity("user", "example.org", "secret"))
            .with_attribute(create_fingerprint_attribute());

        let bytes = packet.to_bytes().unwrap();
        let mut context = AuthContext::new();
        let decoded = StunPacket::decode_with_auth(&bytes, Some(&mut context)).unwrap();

        assert_eq!(decoded, packet);
        assert_eq!(decoded.fingerprint_valid(), Some(true));
        assert_eq!(context.username.as_deref(), Some("user"));
        assert_eq!(context.realm.as_deref(), Some("example.org"));

        let integrity = decoded.message_integrity().unwrap();
        assert!(integrity.verify_hash("user", "example.org", "secret"));
        assert!(!integrity.verify_hash("user2", "example.org", "secret"));
        assert!(!integrity.verify_hash("user", "example.com", "secret"));
        assert!(!integrity.verify_hash("user", "example.org", "Secret"));

        let auth = SimpleAuth::new(Some("example.org".to_string()), "user", "secret");
        assert!(context.verify(integrity, &auth));
    }

    #[test]
    fn test_tampered_message_fails_integrity() {
        let packet = StunPacket::binding_request()
            .with_attribute(Attribute::software("abcd"))
            .with_attribute(Attribute::message_integrity("user", "realm", "pw"));
        let mut bytes = packet.to_bytes().unwrap();
        bytes[24] ^= 0x01;

        let decoded = StunPacket::decode(&bytes).unwrap();
        assert!(!decoded.message_integrity().unwrap().verify_hash("user", "realm", "pw"));
    }

    #[test]
    fn test_encode_errors() {
        let packet = StunPacket::binding_request()
            .with_attribute(create_fingerprint_attribute())
            .with_attribute(Attribute::software("late"));
        assert!(matches!(packet.to_bytes(), Err(StunError::FingerprintNotLast)));

        let packet = StunPacket::binding_request().with_attribute(Attribute::Plain {
            attr_type: AttributeType::Padding,
            value: vec![0u8; 0x10000],
        });
        assert!(matches!(packet.to_bytes(), Err(StunError::TooLarge(_))));

        let packet = StunPacket::new(Class::Error, Method::Binding, TransactionId::new())
            .with_attribute(Attribute::error_code(700, "Out Of Range"));
        assert!(matches!(packet.to_bytes(), Err(StunError::BadAttribute { .. })));

        let packet = StunPacket::binding_request().with_attribute(Attribute::software("x"));
        let mut small = [0u8; 20];
        assert!(matches!(
            packet.encode(&mut small),
            Err(StunError::BufferTooSmall(28))
        ));
    }

    #[test]
    fn test_decode_structural_failures() {
        let good = StunPacket::binding_request()
            .with_attribute(Attribute::software("abc"))
            .to_bytes()
            .unwrap();

        // header claims more than was received
        assert!(StunPacket::decode(&good[..good.len() - 4]).is_err());

        // attribute length runs past the body
        let mut bad = good.clone();
        bad[23] = 0x20;
        assert!(matches!(StunPacket::decode(&bad), Err(StunError::Truncated(_))));

        // misaligned body length
        let mut bad = good.clone();
        bad[3] = 6;
        assert!(matches!(StunPacket::decode(&bad), Err(StunError::NotStun(_))));

        // bad address family in a registered attribute
        let mut bytes = StunPacket::binding_request()
            .with_attribute(create_mapped_address_attribute("10.0.0.1:1".parse().unwrap()))
            .to_bytes()
            .unwrap();
        bytes[25] = 0x03;
        assert!(matches!(
            StunPacket::decode(&bytes),
            Err(StunError::BadAttribute { code: 0x0001, .. })
        ));
    }

    #[test]
    fn test_decode_keeps_packets_without_cookie() {
        let packet = StunPacket::new(
            Class::Success,
            Method::Binding,
            TransactionId::from_slice(&[5u8; 16]),
        )
        .with_attribute(create_mapped_address_attribute("10.0.0.1:1".parse().unwrap()));
        let bytes = packet.to_bytes().unwrap();

        let decoded = StunPacket::decode(&bytes).unwrap();
        assert!(!decoded.is_rfc5389());
        assert!(!is_stun_packet(&bytes));
    }

    #[test]
    fn test_compliance_detector() {
        let bytes = StunPacket::binding_request()
            .with_attribute(Attribute::software("abcdef"))
            .with_attribute(create_fingerprint_attribute())
            .to_bytes()
            .unwrap();
        assert!(is_stun_packet(&bytes));

        let without_fingerprint = StunPacket::binding_request()
            .with_attribute(Attribute::software("abcdef"))
            .to_bytes()
            .unwrap();
        assert!(is_stun_packet(&without_fingerprint));

        let mut bad_cookie = bytes.clone();
        bad_cookie[5] ^= 0xff;
        assert!(!is_stun_packet(&bad_cookie));

        let mut misaligned = bytes.clone();
        misaligned[3] += 2;
        assert!(!is_stun_packet(&misaligned));

        let mut bad_fingerprint = bytes.clone();
        let last = bad_fingerprint.len() - 1;
        bad_fingerprint[last] ^= 0x01;
        assert!(!is_stun_packet(&bad_fingerprint));

        let mut leading_bits = bytes.clone();
        leading_bits[0] |= 0x40;
        assert!(!is_stun_packet(&leading_bits));

        assert!(!is_stun_packet(&bytes[..19]));
        assert!(!is_stun_packet(b"GET / HTTP/1.1\r\nHost: example\r\n\r\n"));
    }

    #[test]
    fn test_fingerprint_not_last_is_not_compliant() {
        // hand-build: FINGERPRINT followed by SOFTWARE
        let mut bytes = StunPacket::binding_request()
            .with_attribute(create_fingerprint_attribute())
            .to_bytes()
            .unwrap();
        bytes.extend_from_slice(&[0x80, 0x22, 0x00, 0x04, b'a', b'b', b'c', b'd']);
        let length = (bytes.len() - HEADER_LENGTH) as u16;
        write_u16(&mut bytes, 2, length);
        assert!(!is_stun_packet(&bytes));
    }

    #[test]
    fn test_any_corruption_before_fingerprint_is_detected() {
        let bytes = StunPacket::binding_request()
            .with_attribute(Attribute::software("corruption test"))
            .with_attribute(create_xor_mapped_address_attribute("10.1.2.3:4567".parse().unwrap()))
            .with_attribute(create_fingerprint_attribute())
            .to_bytes()
            .unwrap();
        let fingerprint_offset = bytes.len() - 8;
        // transaction ID plus the attribute values, attribute headers excluded
        let targets: Vec<usize> = (8..20).chain(24..40).chain(44..fingerprint_offset).collect();

        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let mut corrupted = bytes.clone();
            let index = targets[rng.gen_range(0..targets.len())];
            corrupted[index] ^= rng.gen_range(1..=255u8);
            if let Ok(packet) = StunPacket::decode(&corrupted) {
                assert_eq!(packet.fingerprint_valid(), Some(false));
            }
            assert!(!is_stun_packet(&corrupted));
        }
    }

    #[test]
    fn test_decode_never_panics_on_garbage() {
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let len = rng.gen_range(0..96);
            let mut bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            if bytes.len() >= 8 && rng.gen_bool(0.5) {
                bytes[0] &= 0x3f;
                bytes[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
                let body = (bytes.len().saturating_sub(HEADER_LENGTH) & !3) as u16;
                write_u16(&mut bytes, 2, body);
            }
            let _ = StunPacket::decode(&bytes);
            let _ = is_stun_packet(&bytes);
        }
    }
}
