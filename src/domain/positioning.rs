//! Positioning advertisement payload decoding
//!
//! APDU layout:
//! - Header: 4 bytes, little-endian u16 sequence + u8 type + u8 declared length
//! - Body: consecutive 4-byte measurements, 3-byte little-endian address
//!   followed by 1 byte of signal strength in half-dB steps

use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Source endpoint carrying positioning advertisements
pub const POSITIONING_SOURCE_EP: u8 = 238;
/// Destination endpoint carrying positioning advertisements
pub const POSITIONING_DESTINATION_EP: u8 = 238;

const HEADER_LEN: usize = 4;
const MEASUREMENT_LEN: usize = 4;
/// RSS unit scale: half-dB steps, always non-positive
const RSS_SCALE: f64 = -0.5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload shorter than the fixed 4-byte header
    #[error("positioning payload too short for header: {0} bytes")]
    TruncatedHeader(usize),
    /// Body length is not an exact multiple of the 4-byte measurement size
    #[error("malformed positioning body: {0} bytes is not a multiple of 4")]
    MalformedPayload(usize),
}

/// One beacon observation: device address and received signal strength
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// 24-bit device address
    pub address: u32,
    /// Signal strength in dB, one of {0, -0.5, ..., -127.5}
    pub rss: f64,
}

/// Decoded positioning advertisement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositioningRecord {
    pub sequence: u16,
    pub msg_type: u8,
    /// Length byte from the header, carried as received.
    /// Not validated against the actual body; consumers see both.
    pub declared_length: u8,
    pub measurements: Vec<Measurement>,
    /// Decode time, RFC 3339 UTC
    pub decoded_at: String,
    /// Original payload as hex, retained as raw evidence for storage
    pub raw_hex: String,
}

/// Decode a raw positioning payload.
///
/// Pure and total given a well-formed length: either the whole payload
/// decodes or the message is rejected. There is no partial emit.
pub fn decode(payload: &[u8]) -> Result<PositioningRecord, DecodeError> {
    if payload.len() < HEADER_LEN {
        return Err(DecodeError::TruncatedHeader(payload.len()));
    }

    let sequence = u16::from_le_bytes([payload[0], payload[1]]);
    let msg_type = payload[2];
    let declared_length = payload[3];

    let body = &payload[HEADER_LEN..];
    if body.len() % MEASUREMENT_LEN != 0 {
        return Err(DecodeError::MalformedPayload(body.len()));
    }

    let measurements = body
        .chunks_exact(MEASUREMENT_LEN)
        .map(|chunk| Measurement {
            address: u32::from(chunk[0]) | u32::from(chunk[1]) << 8 | u32::from(chunk[2]) << 16,
            rss: f64::from(chunk[3]) * RSS_SCALE,
        })
        .collect();

    Ok(PositioningRecord {
        sequence,
        msg_type,
        declared_length,
        measurements,
        decoded_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        raw_hex: hex::encode(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reference_vector() {
        // header: sequence=5, type=2, declared_length=8
        let payload = [
            0x05, 0x00, 0x02, 0x08, // header
            0x01, 0x02, 0x03, 0x0A, // address 0x030201, rss -5.0
            0x04, 0x05, 0x06, 0x14, // address 0x060504, rss -10.0
        ];

        let record = decode(&payload).unwrap();
        assert_eq!(record.sequence, 5);
        assert_eq!(record.msg_type, 2);
        assert_eq!(record.declared_length, 8);
        assert_eq!(record.measurements.len(), 2);
        assert_eq!(record.measurements[0], Measurement { address: 0x030201, rss: -5.0 });
        assert_eq!(record.measurements[1], Measurement { address: 0x060504, rss: -10.0 });
        assert_eq!(record.raw_hex, "050002080102030a04050614");
        assert!(!record.decoded_at.is_empty());
    }

    #[test]
    fn test_decode_empty_body() {
        let record = decode(&[0xFF, 0xFF, 0x01, 0x00]).unwrap();
        assert_eq!(record.sequence, 0xFFFF);
        assert!(record.measurements.is_empty());
    }

    #[test]
    fn test_decode_rejects_ragged_body() {
        // 6-byte body, remainder must fail rather than truncate
        let payload = [0x05, 0x00, 0x02, 0x08, 0x01, 0x02, 0x03, 0x0A, 0x04, 0x05];
        assert_eq!(decode(&payload), Err(DecodeError::MalformedPayload(6)));
    }

    #[test]
    fn test_decode_rejects_truncated_header() {
        assert_eq!(decode(&[0x05, 0x00]), Err(DecodeError::TruncatedHeader(2)));
        assert_eq!(decode(&[]), Err(DecodeError::TruncatedHeader(0)));
    }

    #[test]
    fn test_decode_measurement_count_matches_body() {
        let mut payload = vec![0x01, 0x00, 0x02, 0x00];
        for i in 0..10u8 {
            payload.extend_from_slice(&[i, 0x00, 0x00, i]);
        }
        let record = decode(&payload).unwrap();
        assert_eq!(record.measurements.len(), 10);
    }

    #[test]
    fn test_decode_extreme_bytes() {
        // 0xFF everywhere: address saturates at 2^24-1, rss at -127.5
        let payload = [0x00, 0x00, 0x00, 0x04, 0xFF, 0xFF, 0xFF, 0xFF];
        let record = decode(&payload).unwrap();
        assert_eq!(record.measurements[0].address, 0xFF_FFFF);
        assert_eq!(record.measurements[0].rss, -127.5);

        // 0x00 signal byte is exactly zero, not negative zero surprise
        let payload = [0x00, 0x00, 0x00, 0x04, 0x01, 0x00, 0x00, 0x00];
        let record = decode(&payload).unwrap();
        assert_eq!(record.measurements[0].address, 1);
        assert_eq!(record.measurements[0].rss, 0.0);
    }

    #[test]
    fn test_declared_length_not_validated() {
        // header claims 99 bytes, body has 4; both survive into the record
        let payload = [0x01, 0x00, 0x02, 0x63, 0x01, 0x02, 0x03, 0x04];
        let record = decode(&payload).unwrap();
        assert_eq!(record.declared_length, 99);
        assert_eq!(record.measurements.len(), 1);
    }
}
