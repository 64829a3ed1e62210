use alloy_primitives::{hex::FromHex, Bytes};
use serde::{Deserialize, Deserializer};

/// The bytes of a completed attestation.
pub type AttestationBytes = Vec<u8>;

/// Represents the response from the attestation lookup service.
///
/// It contains the status of the attestation and optionally the attestation
/// data itself. The attestation data is a hex-encoded string (with or without
/// a "0x" prefix) that is deserialized into raw bytes, so callers never see
/// the prefix.
///
/// **API quirk**: the service sometimes returns the string `"PENDING"` for the
/// attestation field instead of `null` when the attestation is not yet ready.
/// The deserializer treats "PENDING" as `None`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    pub status: AttestationStatus,
    #[serde(default, deserialize_with = "deserialize_optional_bytes_or_pending")]
    pub attestation: Option<Bytes>,
}

/// Deserializer tolerating the service's placeholder values for the
/// attestation field.
///
/// A hex string (with or without "0x") decodes to `Some(Bytes)`; the
/// "PENDING"/"pending" sentinel, null, a missing field, and the empty string
/// all decode to `None`; anything else is a hard error.
fn deserialize_optional_bytes_or_pending<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;

    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("pending") => Ok(None),
        Some(s) => {
            let bytes = Bytes::from_hex(s).map_err(serde::de::Error::custom)?;
            Ok(Some(bytes))
        }
    }
}

/// Represents the status of an attestation.
///
/// `Complete` with a non-empty attestation payload is the only terminal
/// success; every other value means "check again later".
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttestationStatus {
    Complete,
    Pending,
    PendingConfirmations,
    Failed,
}
