//! gdoc-http - REST backend for gdoc-core
//!
//! [`HttpBackend`] implements [`gdoc_core::DocsBackend`] over the Docs v1
//! and Drive v3 REST APIs with a bearer token. It makes exactly one HTTP
//! exchange per call (table creation excepted) and never retries; the
//! session's executor owns retrying.

#![warn(unreachable_pub)]

pub mod auth;
pub mod backend;

pub use auth::{AccessToken, ACCESS_TOKEN_VAR};
pub use backend::{HttpBackend, DOCS_BASE_URL, DRIVE_BASE_URL};
