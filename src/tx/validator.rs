//! Claim parameter validation
//!
//! Pure normalization of a `ClaimRequest` into chain-ready `mintProof` arguments.
//! No network I/O happens here.

use alloy::primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{CampaignIdInput, ClaimRequest, NormalizedParams, PayloadInput};
use crate::error::{PerksError, Result};

/// Largest integer a float campaign id can carry without losing precision (2^53 - 1)
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_991.0;

/// Validate using the wall clock for the placeholder payload
pub fn validate(params: &ClaimRequest) -> Result<NormalizedParams> {
    validate_at(params, Utc::now())
}

/// Validate with an explicit clock; identical inputs give identical output
pub fn validate_at(params: &ClaimRequest, now: DateTime<Utc>) -> Result<NormalizedParams> {
    let to = parse_address(&params.to)?;
    let campaign_id = parse_campaign_id(&params.campaign_id)?;
    let encrypted_data = match &params.encrypted_data {
        Some(payload) if !payload.is_empty() => decode_payload(payload)?,
        _ => placeholder_payload(&params.to, now),
    };

    Ok(NormalizedParams {
        to,
        campaign_id,
        encrypted_data,
    })
}

/// 40 hex digits, optionally `0x`-prefixed. Mixed-case input must carry a valid
/// EIP-55 checksum.
pub fn parse_address(raw: &str) -> Result<Address> {
    let hex_part = raw.strip_prefix("0x").unwrap_or(raw);
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PerksError::InvalidAddress(format!(
            "{raw}: expected 40 hex digits"
        )));
    }
    let prefixed = format!("0x{hex_part}");

    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        Address::parse_checksummed(&prefixed, None)
            .map_err(|_| PerksError::InvalidAddress(format!("{raw}: bad checksum")))
    } else {
        prefixed
            .parse::<Address>()
            .map_err(|e| PerksError::InvalidAddress(format!("{raw}: {e}")))
    }
}

/// Integer, decimal/hex string or integral float; must be non-negative
pub fn parse_campaign_id(raw: &CampaignIdInput) -> Result<U256> {
    let invalid = || PerksError::InvalidCampaignId(raw.to_string());

    match raw {
        CampaignIdInput::Integer(v) => u128::try_from(*v).map(U256::from).map_err(|_| invalid()),
        CampaignIdInput::Float(v) => float_to_id(*v).ok_or_else(invalid),
        CampaignIdInput::Text(s) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                if hex.is_empty() {
                    return Err(invalid());
                }
                return U256::from_str_radix(hex, 16).map_err(|_| invalid());
            }
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                return U256::from_str_radix(s, 10).map_err(|_| invalid());
            }
            s.parse::<f64>()
                .ok()
                .and_then(float_to_id)
                .ok_or_else(invalid)
        }
    }
}

fn float_to_id(v: f64) -> Option<U256> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= MAX_EXACT_FLOAT {
        Some(U256::from(v as u64))
    } else {
        None
    }
}

fn decode_payload(payload: &PayloadInput) -> Result<Bytes> {
    match payload {
        PayloadInput::Bytes(bytes) => Ok(Bytes::copy_from_slice(bytes)),
        PayloadInput::Text(text) => match text.strip_prefix("0x") {
            Some(hex_part) if hex_part.chars().all(|c| c.is_ascii_hexdigit()) => {
                hex::decode(hex_part).map(Bytes::from).map_err(|e| {
                    PerksError::Validation(format!("encryptedData is not valid hex: {e}"))
                })
            }
            _ => Ok(Bytes::copy_from_slice(text.as_bytes())),
        },
    }
}

/// `{"timestamp": <unix ms>, "userAddress": <to>}` as UTF-8 bytes
fn placeholder_payload(to: &str, now: DateTime<Utc>) -> Bytes {
    let body = json!({
        "timestamp": now.timestamp_millis(),
        "userAddress": to,
    });
    Bytes::from(body.to_string().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn address_format() {
        assert!(matches!(
            parse_address("0x123"),
            Err(PerksError::InvalidAddress(_))
        ));
        assert!(parse_address(RECIPIENT).is_ok());
        assert!(parse_address(&RECIPIENT.to_uppercase().replacen("0X", "0x", 1)).is_ok());
        assert_eq!(
            parse_address(&"a".repeat(40)).unwrap(),
            parse_address(&format!("0x{}", "a".repeat(40))).unwrap()
        );
        assert!(parse_address(&"a".repeat(39)).is_err());
        assert!(parse_address("0xgggggggggggggggggggggggggggggggggggggggg").is_err());
    }

    #[test]
    fn mixed_case_address_needs_checksum() {
        // EIP-55 reference vector
        assert!(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_ok());
        assert!(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD").is_err());
    }

    #[test]
    fn campaign_id_forms() {
        assert_eq!(parse_campaign_id(&"7".into()).unwrap(), U256::from(7u64));
        assert_eq!(parse_campaign_id(&"0x1f".into()).unwrap(), U256::from(31u64));
        assert_eq!(parse_campaign_id(&7.0f64.into()).unwrap(), U256::from(7u64));
        assert_eq!(parse_campaign_id(&"7.0".into()).unwrap(), U256::from(7u64));
        assert_eq!(parse_campaign_id(&0u64.into()).unwrap(), U256::ZERO);

        for bad in [
            CampaignIdInput::from(-1i64),
            CampaignIdInput::from(1.5f64),
            CampaignIdInput::from(f64::NAN),
            CampaignIdInput::from("abc"),
            CampaignIdInput::from(""),
            CampaignIdInput::from("0x"),
        ] {
            assert!(
                matches!(parse_campaign_id(&bad), Err(PerksError::InvalidCampaignId(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn omitted_payload_is_synthesized_with_timestamp() {
        let start = Utc::now();
        let params = validate(&ClaimRequest::new(RECIPIENT, "7")).unwrap();
        assert_eq!(params.campaign_id, U256::from(7u64));

        let payload: serde_json::Value = serde_json::from_slice(&params.encrypted_data).unwrap();
        assert!(payload["timestamp"].as_i64().unwrap() >= start.timestamp_millis());
        assert_eq!(payload["userAddress"], RECIPIENT);
    }

    #[test]
    fn validate_at_is_deterministic() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let request = ClaimRequest::new(RECIPIENT, 3u64);
        assert_eq!(
            validate_at(&request, now).unwrap(),
            validate_at(&request, now).unwrap()
        );

        let empty = request.clone().with_payload("");
        assert_eq!(
            validate_at(&empty, now).unwrap().encrypted_data,
            validate_at(&request, now).unwrap().encrypted_data
        );
    }

    #[test]
    fn payload_forms() {
        let now = Utc::now();
        let hex = validate_at(&ClaimRequest::new(RECIPIENT, 1u64).with_payload("0xdeadbeef"), now)
            .unwrap();
        assert_eq!(hex.encrypted_data.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);

        let text = validate_at(&ClaimRequest::new(RECIPIENT, 1u64).with_payload("hello"), now)
            .unwrap();
        assert_eq!(text.encrypted_data.as_ref(), b"hello");

        let raw = validate_at(
            &ClaimRequest::new(RECIPIENT, 1u64).with_payload(vec![1u8, 2, 3]),
            now,
        )
        .unwrap();
        assert_eq!(raw.encrypted_data.as_ref(), &[1, 2, 3]);

        let odd = validate_at(&ClaimRequest::new(RECIPIENT, 1u64).with_payload("0xabc"), now);
        assert!(matches!(odd, Err(PerksError::Validation(_))));
    }
}
