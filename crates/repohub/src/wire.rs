//! Backend wire encoding.
//!
//! Replies arrive as variant-tagged results (`{"ok": ..}` / `{"err": ..}`).
//! Optional fields are zero-or-one element arrays, naturals are numbers or
//! decimal strings, timestamps are nanoseconds and blobs are base64 text.
//! Mandatory fields are modelled as `Option` so that a missing one surfaces
//! as a structural error during normalization rather than a decode failure.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, ErrorKind};

/// Unbounded natural number as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct WireNat(pub u128);

impl WireNat {
    /// Nearest `u64`, saturating at `u64::MAX`.
    pub fn to_u64(self) -> u64 {
        u64::try_from(self.0).unwrap_or(u64::MAX)
    }

    /// Read as a nanosecond timestamp and convert to milliseconds. The
    /// division happens before saturation.
    pub fn nanos_to_millis(self) -> u64 {
        crate::normalize::nanos_to_millis(self.0)
    }
}

impl From<u64> for WireNat {
    fn from(n: u64) -> Self {
        Self(n as u128)
    }
}

impl Serialize for WireNat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for WireNat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NatVisitor;

        impl Visitor<'_> for NatVisitor {
            type Value = WireNat;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a natural number or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireNat, E> {
                Ok(WireNat(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<WireNat, E> {
                Ok(WireNat(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireNat, E> {
                u128::try_from(v)
                    .map(WireNat)
                    .map_err(|_| E::custom(format!("negative natural: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<WireNat, E> {
                v.trim()
                    .parse::<u128>()
                    .map(WireNat)
                    .map_err(|e| E::custom(format!("invalid natural {v:?}: {e}")))
            }
        }

        deserializer.deserialize_any(NatVisitor)
    }
}

/// Principal identifier. The gateway sends either the tagged object form
/// `{"__principal__": "<text>"}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WirePrincipal {
    Tagged {
        #[serde(rename = "__principal__")]
        text: String,
    },
    Text(String),
}

impl WirePrincipal {
    /// The textual form carried on the wire.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Tagged { text } | Self::Text(text) => text,
        }
    }
}

/// Tagged error variant of a reply. Every variant may carry a detail message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum WireError {
    NotFound(Option<String>),
    Unauthorized(Option<String>),
    BadRequest(Option<String>),
    Conflict(Option<String>),
    Forbidden(Option<String>),
    InternalError(Option<String>),
}

impl WireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InternalError(_) => ErrorKind::InternalError,
        }
    }

    pub fn into_parts(self) -> (ErrorKind, Option<String>) {
        let kind = self.kind();
        match self {
            Self::NotFound(d)
            | Self::Unauthorized(d)
            | Self::BadRequest(d)
            | Self::Conflict(d)
            | Self::Forbidden(d)
            | Self::InternalError(d) => (kind, d),
        }
    }
}

impl From<WireError> for BackendError {
    fn from(err: WireError) -> Self {
        let (kind, detail) = err.into_parts();
        BackendError::Api { kind, detail }
    }
}

/// Reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireResult<T> {
    Ok(T),
    Err(WireError),
}

impl<T> WireResult<T> {
    pub fn into_result(self) -> Result<T, WireError> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRepository {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<WirePrincipal>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub stars: WireNat,
    #[serde(default)]
    pub forks: WireNat,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub license: Vec<String>,
    #[serde(default)]
    pub default_branch: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub collaborators: Vec<WirePrincipal>,
    #[serde(default)]
    pub size: WireNat,
    #[serde(default)]
    pub created_at: WireNat,
    #[serde(default)]
    pub updated_at: WireNat,
}

/// Listing payload. Entries stay undecoded so one malformed record can be
/// rejected without losing the rest of the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRepositoryPage {
    #[serde(default)]
    pub repositories: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: WireNat,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFileEntry {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub size: WireNat,
    #[serde(default)]
    pub last_modified: WireNat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFile {
    #[serde(default)]
    pub path: Option<String>,
    /// Base64-encoded bytes.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub size: WireNat,
    #[serde(default)]
    pub last_modified: WireNat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFileMatch {
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSearchResults {
    #[serde(default)]
    pub repositories: Vec<serde_json::Value>,
    #[serde(default)]
    pub files: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: WireNat,
}
