//! gdoc-core - resilient Google Docs composition
//!
//! Every remote call goes through a retry-with-backoff executor, and every
//! append resolves the document's end index fresh before building its
//! edit batch:
//!
//! ```text
//! DocumentSession ──edits()──▶ EditBatcher ──▶ PositionResolver
//!        │                          │                 │
//!        └──────────────┬───────────┴─────────────────┘
//!                       ▼
//!               BackoffExecutor ──▶ DocsBackend (remote)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use gdoc_core::{DocumentSession, Role, SessionConfig};
//!
//! # async fn example(backend: std::sync::Arc<dyn gdoc_core::DocsBackend>) -> Result<(), gdoc_core::DocsError> {
//! let mut session = DocumentSession::new(backend, SessionConfig::from_env()?);
//! let doc = session.create("Quarterly report", false).await?;
//! session.share(&doc, "someone@example.com", Role::Writer).await?;
//!
//! let edits = session.edits()?;
//! edits.insert_heading("Summary", 1).await?;
//! edits.insert_paragraphs(["First point.", "Second point."]).await?;
//! edits.insert_page_break().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod backend;
pub mod backoff;
pub mod batcher;
pub mod config;
pub mod document;
pub mod error;
pub mod ops;
pub mod position;
pub mod session;
pub mod table;
pub mod types;

// Re-exports for convenience
pub use backend::DocsBackend;
pub use backoff::{BackoffExecutor, RetryObserver, TracingObserver};
pub use batcher::{EditBatcher, DEFAULT_PAGE_BREAK_MARKER};
pub use config::{RetryClassification, RetryPolicy, SessionConfig, BACKOFF_MULTIPLIER};
pub use document::Document;
pub use error::{ConfigError, DocsError, RemoteError, RemoteErrorKind};
pub use ops::EditOperation;
pub use position::{end_index_of, PositionResolver, START_OF_DOCUMENT};
pub use session::DocumentSession;
pub use table::{cell_fill_operations, TableRequest, TabularData};
pub use types::{BatchUpdateResponse, DocumentHandle, ImageSize, PageBreakOutcome, Permission, Role};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with gdoc-core
    pub use crate::{
        DocsBackend, DocsError, DocumentHandle, DocumentSession, EditBatcher, ImageSize,
        PageBreakOutcome, RemoteError, Role, SessionConfig, TabularData,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
