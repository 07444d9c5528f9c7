//! Site configuration
//!
//! Baked-in defaults, optionally overridden by a JSON blob embedded in the
//! page as `<script id="site-config" type="application/json">`.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Document identity presented while a page mode is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeIdentity {
    pub title: String,
    pub icon_href: String,
    /// Manifest path without the cache-busting query
    pub manifest_href: String,
    /// Service worker script registered on entry
    pub worker_path: String,
}

/// Site-wide identity restored when a mode ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteDefaults {
    pub title: String,
    pub manifest_href: String,
}

/// Origins for the embedded stretch-timer app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedOrigins {
    pub production: String,
    pub development: String,
}

/// Everything the shell needs to know about the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub defaults: SiteDefaults,
    pub stretch: ModeIdentity,
    /// Path of the deployed version descriptor
    pub version_path: String,
    pub embed: EmbedOrigins,
}

impl Default for SiteDefaults {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            manifest_href: "/manifest.json".to_string(),
        }
    }
}

impl Default for ModeIdentity {
    fn default() -> Self {
        Self {
            title: "Stretch Timer".to_string(),
            icon_href: "/stretch-icon.png".to_string(),
            manifest_href: "/stretch-manifest.json".to_string(),
            worker_path: "/stretch-sw.js".to_string(),
        }
    }
}

impl Default for EmbedOrigins {
    fn default() -> Self {
        Self {
            production: "https://stretch.example.app".to_string(),
            development: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            defaults: SiteDefaults::default(),
            stretch: ModeIdentity::default(),
            version_path: "/version.json".to_string(),
            embed: EmbedOrigins::default(),
        }
    }
}

impl SiteConfig {
    /// Element id holding the JSON override
    const ELEMENT_ID: &'static str = "site-config";

    /// Parse a (possibly partial) JSON override; missing sections keep defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(text) = text {
            match Self::from_json(&text) {
                Ok(config) => {
                    log::info!("Loaded site config from #{}", Self::ELEMENT_ID);
                    return config;
                }
                Err(e) => log::warn!("Ignoring malformed site config: {}", e),
            }
        }

        log::info!("Using default site config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No #{} element outside the browser", Self::ELEMENT_ID);
        Self::default()
    }
}
