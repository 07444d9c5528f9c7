//! Portfolio site shell
//!
//! Core modules:
//! - `metadata`: Mode-scoped title/favicon/manifest override with restore on drop
//! - `version`: Deployed version badge with fallback
//! - `connectivity`: Offline banner state
//! - `scroll`: One-shot scroll restoration
//! - `embed`: Origin selection for the embedded stretch-timer app
//! - `dom`: Browser abstraction (web-sys on wasm32, in-memory elsewhere)

pub mod config;
pub mod connectivity;
pub mod dom;
pub mod embed;
pub mod error;
pub mod metadata;
pub mod scroll;
pub mod version;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ModeIdentity, SiteConfig, SiteDefaults};
pub use connectivity::OfflineIndicator;
pub use error::{Result, ShellError};
pub use metadata::{ModeScope, PageMetadataSnapshot};
pub use version::{VersionInfo, VersionReporter};
