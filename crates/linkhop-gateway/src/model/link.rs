use jiff::Timestamp;
use linkhop_core::LinkRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub target: String,
    #[serde(default)]
    pub alias: Option<String>,
    /// RFC 3339.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

/// A missing or null `expiresAt` clears the expiry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub code: String,
    pub target: String,
    #[serde(rename = "shortURL")]
    pub short_url: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl LinkResponse {
    pub fn new(record: LinkRecord, base_url: &str) -> Self {
        Self {
            short_url: record.code.to_url(base_url),
            code: record.code.as_str().to_owned(),
            target: record.target,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

/// Stored view of a link, including soft-deleted ones.
#[derive(Debug, Serialize)]
pub struct LinkDetailResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub active: bool,
}

impl LinkDetailResponse {
    pub fn new(record: LinkRecord, base_url: &str) -> Self {
        let active = record.active;
        Self {
            link: LinkResponse::new(record, base_url),
            active,
        }
    }
}
