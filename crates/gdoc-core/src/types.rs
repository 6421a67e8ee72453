//! Core types for gdoc
//!
//! Defines the identity and result types shared by the session and the
//! edit batcher:
//! - Document handles
//! - Sharing roles and permission records
//! - Image sizes
//! - Batch results

use crate::ops::{Dimension, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one remote document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    /// Wrap a remote document id
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw document id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Browser URL for editing the document
    #[must_use]
    pub fn edit_url(&self) -> String {
        format!("https://docs.google.com/document/d/{}/edit", self.0)
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Access role granted when sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read only
    Reader,
    /// Read and comment
    Commenter,
    /// Full edit access
    #[default]
    Writer,
}

impl Role {
    /// Wire name of the role
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Commenter => "commenter",
            Role::Writer => "writer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grantee type of a permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GranteeType {
    /// A single user, identified by email address
    User,
}

/// Permission record sent to the sharing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Grantee type
    #[serde(rename = "type")]
    pub grantee: GranteeType,
    /// Granted role
    pub role: Role,
    /// Principal identifier
    pub email_address: String,
}

impl Permission {
    /// Permission for a single user
    #[inline]
    pub fn user(email_address: impl Into<String>, role: Role) -> Self {
        Self {
            grantee: GranteeType::User,
            role,
            email_address: email_address.into(),
        }
    }
}

/// Inline image size in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in points
    pub width: f64,
    /// Height in points
    pub height: f64,
}

impl ImageSize {
    /// Create image size
    #[inline]
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Wire representation
    #[must_use]
    pub fn to_object_size(self) -> Size {
        Size {
            height: Dimension::points(self.height),
            width: Dimension::points(self.width),
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(300.0, 300.0)
    }
}

/// Result of a submitted edit batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    /// Document the batch was applied to
    #[serde(default)]
    pub document_id: String,
    /// One reply per request, in request order
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

/// Outcome of replacing a marker string with page breaks
#[derive(Debug, Clone, PartialEq)]
pub enum PageBreakOutcome {
    /// Marker not present; nothing was submitted
    NoOccurrences,
    /// Batch submitted
    Applied {
        /// Text runs that contained the marker
        occurrences: usize,
        /// Remote batch result
        response: BatchUpdateResponse,
    },
}

impl PageBreakOutcome {
    /// Check if a batch was submitted
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
