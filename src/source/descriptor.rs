// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while building a source descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Header credential must look like 'Name: Value', got '{0}'")]
    MalformedHeader(String),
}

/// How requests to a source are authenticated.
///
/// A closed set of schemes; header construction matches on it exhaustively.
///
/// # Example
/// ```yaml
/// auth:
///   type: basic
///   username: reader
///   password: hunter2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    Header {
        name: String,
        value: String,
    },
    /// Credentials are embedded in the URL itself.
    Presigned,
}

impl AuthScheme {
    /// Parse a caller-supplied `Name: Value` line into a header credential.
    ///
    /// Splits on the first `": "`, so values may themselves contain `": "`.
    pub fn from_header_line(line: &str) -> Result<Self, SourceError> {
        match line.split_once(": ") {
            Some((name, value)) if !name.trim().is_empty() => Ok(AuthScheme::Header {
                name: name.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(SourceError::MalformedHeader(line.to_string())),
        }
    }

    /// Short scheme name for logs. Never includes secrets.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthScheme::None => "none",
            AuthScheme::Bearer { .. } => "bearer",
            AuthScheme::Basic { .. } => "basic",
            AuthScheme::Header { .. } => "header",
            AuthScheme::Presigned => "presigned",
        }
    }
}

/// Where the compiled module comes from and how to authenticate for it.
///
/// Two descriptors describe the same configuration when their URL and auth
/// fields match; `id`, `name` and timestamps are ignored for that comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub auth: AuthScheme,
    /// Read from the local filesystem rather than fetched over the network.
    #[serde(default)]
    pub is_local: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            auth,
            is_local: false,
            created_at: Utc::now(),
            last_modified: None,
        }
    }

    /// A source read from disk; `path` may carry a `file://` prefix.
    pub fn local(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            is_local: true,
            ..Self::new(name, path, AuthScheme::None)
        }
    }

    /// True when a reload would fetch exactly the same bytes.
    pub fn same_configuration(&self, other: &SourceDescriptor) -> bool {
        self.url == other.url && self.auth == other.auth && self.is_local == other.is_local
    }

    /// Filesystem path for local sources.
    pub fn local_path(&self) -> &str {
        self.url.strip_prefix("file://").unwrap_or(&self.url)
    }
}

/// Emitted whenever a fetch reports a last-modified marker for a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModified {
    pub source_id: Uuid,
    pub last_modified: DateTime<Utc>,
}
