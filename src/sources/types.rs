//! Shared types used by the source adapters and dispatcher.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Adapter-specific parameters carried by a fetch, list, or metadata request.
pub type FetchParams = Map<String, Value>;

/// Identifier of a registered document source.
///
/// Parsing an inbound source string into this enum is the only place a
/// source name is interpreted; everything downstream matches exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// Notion block-tree pages.
    Notion,
    /// Google Docs documents.
    Gdoc,
    /// Google Sheets ranges.
    Gsheet,
    /// Generic remote document store.
    GoogleDrive,
}

impl SourceId {
    /// Wire name of the source, as accepted in inbound requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notion => "notion",
            Self::Gdoc => "gdoc",
            Self::Gsheet => "gsheet",
            Self::GoogleDrive => "google-drive",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "notion" => Ok(Self::Notion),
            "gdoc" => Ok(Self::Gdoc),
            "gsheet" => Ok(Self::Gsheet),
            "google-drive" => Ok(Self::GoogleDrive),
            _ => Err(()),
        }
    }
}

/// An abstract fetch request routed through the dispatcher.
///
/// Constructed by the caller; the core treats it as read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    /// Name of the source to fetch from.
    pub source: String,
    /// Source-specific parameters (e.g. `document_id`, `range`).
    #[serde(default)]
    pub params: FetchParams,
}

/// Normalized result shape produced by an adapter fetch.
///
/// Exactly one variant per fetch; the normalizer matches exhaustively, so a
/// new shape is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentPayload {
    /// Flat text content.
    Text(String),
    /// 2-D tabular data with provider row order preserved.
    Table(Vec<Vec<Value>>),
}

/// File listing/metadata entry returned by sources that support browsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Provider-assigned file identifier.
    pub id: String,
    /// Display name of the file.
    #[serde(default)]
    pub name: String,
    /// MIME type reported by the provider.
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// File size as reported by the provider (string or number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    /// Last-modified timestamp reported by the provider.
    #[serde(
        rename = "modifiedTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_time: Option<String>,
}

/// Errors raised by source adapters.
///
/// Transport failures are always wrapped here; a raw `reqwest::Error` never
/// escapes an adapter.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A required parameter key was absent or empty.
    #[error("Missing required parameter `{0}`")]
    MissingParameter(&'static str),
    /// The HTTP layer failed before a response was received.
    #[error("{source_id} request failed: {cause}")]
    Transport {
        /// Source whose fetch failed.
        source_id: SourceId,
        /// Underlying transport error.
        #[source]
        cause: reqwest::Error,
    },
    /// The provider responded with an unexpected status code.
    #[error("Unexpected {source_id} response ({status}): {body}")]
    UnexpectedStatus {
        /// Source whose fetch failed.
        source_id: SourceId,
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The provider returned a payload the adapter cannot represent.
    #[error("Malformed {source_id} payload: {detail}")]
    UnsupportedShape {
        /// Source whose payload could not be decoded.
        source_id: SourceId,
        /// Description of the offending shape.
        detail: String,
    },
    /// The resolved adapter does not implement the requested capability.
    #[error("{source_id} does not support `{operation}`")]
    UnsupportedOperation {
        /// Source the operation was dispatched to.
        source_id: SourceId,
        /// Name of the unimplemented capability.
        operation: &'static str,
    },
}

/// Extract a required, non-empty string parameter.
pub(crate) fn require_str<'a>(
    params: &'a FetchParams,
    key: &'static str,
) -> Result<&'a str, SourceError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SourceError::MissingParameter(key))
}

/// Extract an optional string parameter, dropping empties.
pub(crate) fn optional_str<'a>(params: &'a FetchParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_id_round_trips_through_strings() {
        for id in [
            SourceId::Notion,
            SourceId::Gdoc,
            SourceId::Gsheet,
            SourceId::GoogleDrive,
        ] {
            assert_eq!(id.as_str().parse::<SourceId>(), Ok(id));
        }
        assert_eq!("GOOGLE-DRIVE".parse::<SourceId>(), Ok(SourceId::GoogleDrive));
        assert!("dropbox".parse::<SourceId>().is_err());
    }

    #[test]
    fn require_str_rejects_missing_and_empty_values() {
        let mut params = FetchParams::new();
        assert!(matches!(
            require_str(&params, "document_id"),
            Err(SourceError::MissingParameter("document_id"))
        ));

        params.insert("document_id".into(), json!("  "));
        assert!(matches!(
            require_str(&params, "document_id"),
            Err(SourceError::MissingParameter("document_id"))
        ));

        params.insert("document_id".into(), json!("doc-1"));
        assert_eq!(require_str(&params, "document_id").unwrap(), "doc-1");
    }

    #[test]
    fn optional_str_trims_and_drops_empties() {
        let mut params = FetchParams::new();
        params.insert("range".into(), json!(" A1:B2 "));
        assert_eq!(optional_str(&params, "range"), Some("A1:B2"));
        params.insert("range".into(), json!(""));
        assert_eq!(optional_str(&params, "range"), None);
        assert_eq!(optional_str(&params, "missing"), None);
    }
}
