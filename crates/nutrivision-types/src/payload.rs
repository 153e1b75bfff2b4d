//! Encoded image payloads and data URI handling

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// An image held in memory as MIME type plus base64 payload.
///
/// This is the form the inference service consumes (`inlineData`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPayload")]
pub struct ImagePayload {
    mime_type: String,
    data: String,
}

/// Unchecked wire form, validated by [`ImagePayload::from_base64`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    mime_type: String,
    data: String,
}

impl TryFrom<RawPayload> for ImagePayload {
    type Error = Error;

    fn try_from(raw: RawPayload) -> Result<Self> {
        Self::from_base64(&raw.mime_type, &raw.data)
    }
}

impl ImagePayload {
    /// Encode raw image bytes
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidImageFormat("image is empty".to_string()));
        }
        check_mime(mime_type)?;

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            data: STANDARD.encode(bytes),
        })
    }

    /// Parse a `data:<mime>;base64,<payload>` string
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::InvalidImageFormat("not a data URI".to_string()))?;

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidImageFormat("data URI has no payload".to_string()))?;

        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            Error::InvalidImageFormat("only base64 data URIs are supported".to_string())
        })?;

        Self::from_base64(mime_type, data)
    }

    /// Accept an already encoded payload after checking it decodes
    pub fn from_base64(mime_type: &str, data: &str) -> Result<Self> {
        check_mime(mime_type)?;

        if data.is_empty() {
            return Err(Error::InvalidImageFormat("image is empty".to_string()));
        }
        let decoded = STANDARD
            .decode(data)
            .map_err(|e| Error::InvalidImageFormat(format!("invalid base64 payload: {}", e)))?;
        if decoded.is_empty() {
            return Err(Error::InvalidImageFormat("image is empty".to_string()));
        }

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            data: data.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw base64 payload, without the data URI header
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

fn check_mime(mime_type: &str) -> Result<()> {
    let lower = mime_type.to_ascii_lowercase();
    match lower.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Ok(()),
        _ => Err(Error::InvalidImageFormat(format!(
            "unsupported MIME type: {:?}",
            mime_type
        ))),
    }
}
