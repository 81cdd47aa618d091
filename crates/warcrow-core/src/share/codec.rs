//! Army list <-> share token conversion.

use std::io::Write;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DecodeError, EncodeError};
use crate::models::{ArmyList, UnitEntry};

/// Upper bound on the inflated payload. A real list is a few KiB.
const MAX_PAYLOAD_BYTES: usize = 256 * 1024;

/// Output buffer growth step while inflating.
const INFLATE_CHUNK: usize = 4 * 1024;

/// Prefix for ids assigned to lists opened from a share link.
const SHARED_ID_PREFIX: &str = "shared-";

/// Accepts tokens with or without `=` padding.
const TOKEN_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// Field order here is the wire order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingPayload<'a> {
    name: &'a str,
    faction: &'a str,
    units: &'a [UnitEntry],
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingPayload {
    name: String,
    faction: String,
    #[serde(default)]
    units: Vec<UnitEntry>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Opaque, URL-safe encoding of an army list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ShareToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode a list into a share token.
///
/// Only `name`, `faction`, `units` and `created_at` are carried. The output
/// uses the RFC 4648 URL-safe alphabet without padding, so it can be placed
/// directly in a path segment.
pub fn encode(list: &ArmyList) -> Result<ShareToken, EncodeError> {
    for (index, unit) in list.units.iter().enumerate() {
        if let Some(reason) = unit.validation_error() {
            return Err(EncodeError::InvalidUnit { index, reason });
        }
    }

    let payload = OutgoingPayload {
        name: &list.name,
        faction: &list.faction,
        units: &list.units,
        created_at: list.created_at,
    };
    let json = serde_json::to_vec(&payload)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    let token = URL_SAFE_NO_PAD.encode(compressed);
    debug!(
        units = list.units.len(),
        json_bytes = json.len(),
        token_len = token.len(),
        "Encoded share token"
    );
    Ok(ShareToken(token))
}

/// Decode a share token back into a list.
///
/// The token carries no identity, so every decode gets a fresh placeholder
/// id. Either the whole list is returned or an error; never a partial list.
pub fn decode(token: &str) -> Result<ArmyList, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let compressed = TOKEN_DECODER.decode(token)?;
    let json = inflate(&compressed)?;
    let payload: IncomingPayload = serde_json::from_slice(&json)?;

    for (index, unit) in payload.units.iter().enumerate() {
        if let Some(reason) = unit.validation_error() {
            return Err(DecodeError::InvalidUnit { index, reason });
        }
    }

    Ok(ArmyList {
        id: placeholder_id(),
        name: payload.name,
        faction: payload.faction,
        units: payload.units,
        created_at: payload.created_at.unwrap_or_else(Utc::now),
    })
}

fn placeholder_id() -> String {
    format!("{}{:016x}", SHARED_ID_PREFIX, rand::random::<u64>())
}

/// Inflate a complete zlib stream.
///
/// `flate2::read::ZlibDecoder` reports success on a stream that simply stops,
/// so this drives `Decompress` directly and requires the stream end (and its
/// checksum) to be reached.
fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(INFLATE_CHUNK);

    loop {
        if out.len() == out.capacity() {
            if out.len() >= MAX_PAYLOAD_BYTES {
                return Err(DecodeError::TooLarge {
                    limit: MAX_PAYLOAD_BYTES,
                });
            }
            out.reserve_exact(INFLATE_CHUNK);
        }

        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() as usize == consumed
                    && inflater.total_out() == produced;
                if stalled && out.len() < out.capacity() {
                    return Err(DecodeError::Truncated);
                }
            }
        }
    }

    if out.len() > MAX_PAYLOAD_BYTES {
        return Err(DecodeError::TooLarge {
            limit: MAX_PAYLOAD_BYTES,
        });
    }
    if (inflater.total_in() as usize) < data.len() {
        return Err(DecodeError::TrailingData);
    }
    Ok(out)
}
