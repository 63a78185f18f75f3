//! Conversions from the string encodings beacon nodes put on the wire into
//! canonical byte arrays and integers.

use alloy_primitives::{hex, FixedBytes};

use crate::error::DecodeError;

/// Removes a single leading `0x`/`0X` marker. Unprefixed input is returned as is.
pub fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value)
}

pub fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, DecodeError> {
    hex::decode(strip_hex_prefix(value.trim())).map_err(|source| DecodeError::Hex { field, source })
}

/// Decodes a hex string that must hold exactly `N` bytes.
pub fn decode_fixed_hex<const N: usize>(
    field: &'static str,
    value: &str,
) -> Result<FixedBytes<N>, DecodeError> {
    let bytes = decode_hex(field, value)?;
    let array = <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| DecodeError::Length {
        field,
        expected: N,
        actual: bytes.len(),
    })?;
    Ok(FixedBytes(array))
}

/// Parses an unsigned decimal from a plain-text body or a JSON string/number.
pub fn parse_decimal(field: &'static str, value: &str) -> Result<u64, DecodeError> {
    let trimmed = value.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed);

    if unquoted.is_empty() || !unquoted.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::Integer { field, value: value.to_string() });
    }
    unquoted.parse().map_err(|_| DecodeError::Integer { field, value: value.to_string() })
}

pub fn parse_decimal_bytes(field: &'static str, body: &[u8]) -> Result<u64, DecodeError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| DecodeError::Integer { field, value: String::from_utf8_lossy(body).into() })?;
    parse_decimal(field, text)
}

/// Domain types are 4-byte little-endian values on the wire (`0x01000000` is 1).
pub fn domain_type_to_u64(field: &'static str, value: &str) -> Result<u64, DecodeError> {
    let domain = decode_fixed_hex::<4>(field, value)?;
    Ok(u32::from_le_bytes(domain.0) as u64)
}

/// Parses a 48-byte BLS public key given with or without a `0x` marker.
pub fn normalize_pubkey(value: &str) -> Result<FixedBytes<48>, DecodeError> {
    decode_fixed_hex::<48>("pubkey", value)
}

/// `epoch = slot / slots_per_epoch`, truncating.
pub fn epoch_at_slot(slot: u64, slots_per_epoch: u64) -> u64 {
    debug_assert!(slots_per_epoch > 0);
    slot.checked_div(slots_per_epoch).unwrap_or(0)
}
