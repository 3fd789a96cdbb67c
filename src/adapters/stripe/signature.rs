//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header carries comma-separated `key=value` pairs:
//! a `t` timestamp and one or more `v1` hex-encoded HMAC-SHA256 signatures
//! over `"{t}.{body}"`. Signatures under retired schemes (`v0`) are ignored.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a webhook event, in seconds. Replays older than
/// this are rejected even with a valid signature.
pub(crate) const MAX_EVENT_AGE_SECS: i64 = 300;

/// Allowance for sender clocks running ahead of ours, in seconds.
pub(crate) const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed `Stripe-Signature` header.
#[derive(Debug)]
pub(crate) struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub(crate) fn parse(header: &str) -> Result<Self, PaymentError> {
        if header.trim().is_empty() {
            return Err(PaymentError::NotSigned);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for pair in header.split(',') {
            let (key, value) = pair
                .trim()
                .split_once('=')
                .ok_or_else(|| PaymentError::MalformedHeader(format!("bad pair {pair:?}")))?;
            match key {
                "t" => {
                    let parsed = value.parse().map_err(|_| {
                        PaymentError::MalformedHeader(format!("bad timestamp {value:?}"))
                    })?;
                    timestamp = Some(parsed);
                }
                "v1" => {
                    let decoded = hex_decode(value).ok_or_else(|| {
                        PaymentError::MalformedHeader("v1 signature is not hex".to_string())
                    })?;
                    v1_signatures.push(decoded);
                }
                // Unknown schemes are skipped, not rejected, so new schemes
                // can roll out alongside v1.
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| PaymentError::MalformedHeader("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(PaymentError::MalformedHeader(
                "no v1 signatures".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verify a webhook payload against its signature header.
///
/// Returns the signed timestamp on success. The signature check runs before
/// the tolerance check so a tampered timestamp surfaces as an invalid
/// signature, not a tolerance failure.
pub(crate) fn verify(
    secret: &[u8],
    payload: &[u8],
    header: &str,
    now: i64,
) -> Result<i64, PaymentError> {
    let header = SignatureHeader::parse(header)?;

    let expected = signed_payload_mac(secret, header.timestamp, payload);
    let matched = header
        .v1_signatures
        .iter()
        .any(|candidate| expected.as_slice().ct_eq(candidate.as_slice()).into());
    if !matched {
        return Err(PaymentError::NoValidSignature);
    }

    if now - header.timestamp > MAX_EVENT_AGE_SECS {
        return Err(PaymentError::TimestampOutOfTolerance);
    }
    if header.timestamp - now > MAX_CLOCK_SKEW_SECS {
        return Err(PaymentError::TimestampOutOfTolerance);
    }

    Ok(header.timestamp)
}

fn signed_payload_mac(secret: &[u8], timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("hmac accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 || s.is_empty() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Build a valid `Stripe-Signature` header. Test helper.
#[cfg(test)]
pub(crate) fn sign(secret: &[u8], payload: &[u8], timestamp: i64) -> String {
    let mac = signed_payload_mac(secret, timestamp, payload);
    format!("t={timestamp},v1={}", hex_encode(&mac))
}
