//! Deployed version badge
//!
//! The site ships a `version.json` descriptor next to its assets. The
//! reporter starts out seeded with a fallback and swaps it for the fetched
//! descriptor if, and only if, the single fetch succeeds and parses.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dom::cache_bust;
use crate::error::{Result, ShellError};

/// Version shown when the descriptor cannot be fetched
pub const FALLBACK_VERSION: &str = "1.1.9";

/// Build date format: "Monday, 15 January 10:30"
const BUILT_AT_FORMAT: &str = "%A, %-d %B %H:%M";

/// Wire shape of `version.json`
#[derive(Debug, Deserialize)]
struct VersionDescriptor {
    version: String,
    timestamp: String,
}

/// Deployed version and build time (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub built_at: NaiveDateTime,
}

impl VersionInfo {
    pub fn fallback() -> Self {
        let built_at = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            version: FALLBACK_VERSION.to_string(),
            built_at,
        }
    }

    /// "v1.1.9"
    pub fn display_version(&self) -> String {
        format!("v{}", self.version)
    }

    /// Day, weekday, month and 24-hour time with English names
    pub fn display_built_at(&self) -> String {
        self.built_at.format(BUILT_AT_FORMAT).to_string()
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Parse a `version.json` body
pub fn parse_descriptor(json: &str) -> Result<VersionInfo> {
    let descriptor: VersionDescriptor = serde_json::from_str(json)?;
    Ok(VersionInfo {
        version: descriptor.version,
        built_at: parse_timestamp(&descriptor.timestamp)?,
    })
}

/// RFC 3339 (normalized to UTC) or a naive ISO datetime read as UTC
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ShellError::Timestamp(raw.to_string()))
}

/// Descriptor URL with a `?v=<epoch-ms>` cache-buster
pub fn descriptor_url(path: &str, now_ms: f64) -> String {
    cache_bust(path, now_ms)
}

/// Holds the version to display; seeded with the fallback
#[derive(Debug, Clone, Default)]
pub struct VersionReporter {
    info: VersionInfo,
    resolved: bool,
}

impl VersionReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &VersionInfo {
        &self.info
    }

    /// Whether a fetched descriptor replaced the fallback
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Feed the outcome of the one fetch attempt
    ///
    /// Returns true if the displayed info changed. Errors leave the current
    /// info in place.
    pub fn apply(&mut self, body: Result<String>) -> bool {
        match body.and_then(|text| parse_descriptor(&text)) {
            Ok(info) => {
                log::info!("Deployed version {}", info.display_version());
                self.info = info;
                self.resolved = true;
                true
            }
            Err(e) => {
                log::warn!("Version descriptor unavailable, showing {}: {}", self.info.display_version(), e);
                false
            }
        }
    }
}

/// Element ids the badge renders into
#[cfg(target_arch = "wasm32")]
pub const VERSION_ELEMENT_ID: &str = "app-version";
#[cfg(target_arch = "wasm32")]
pub const BUILT_AT_ELEMENT_ID: &str = "app-built-at";

/// Write `info` into the version badge elements, if present
#[cfg(target_arch = "wasm32")]
pub fn render_badge(document: &web_sys::Document, info: &VersionInfo) {
    if let Some(el) = document.get_element_by_id(VERSION_ELEMENT_ID) {
        el.set_text_content(Some(&info.display_version()));
    }
    if let Some(el) = document.get_element_by_id(BUILT_AT_ELEMENT_ID) {
        el.set_text_content(Some(&info.display_built_at()));
    }
}

/// Render the fallback now, then fetch once and re-render on success
#[cfg(target_arch = "wasm32")]
pub fn spawn_version_fetch(
    page: std::rc::Rc<crate::dom::browser::BrowserPage>,
    path: &str,
    reporter: std::rc::Rc<std::cell::RefCell<VersionReporter>>,
) {
    use crate::dom::Clock;

    render_badge(page.document(), reporter.borrow().info());

    let url = descriptor_url(path, page.now_ms());
    wasm_bindgen_futures::spawn_local(async move {
        let body = crate::dom::browser::fetch_text(page.window(), &url).await;
        let mut reporter = reporter.borrow_mut();
        if reporter.apply(body) {
            render_badge(page.document(), reporter.info());
        }
    });
}
