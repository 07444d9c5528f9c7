//! Error types for the site shell
//!
//! Every failure in this crate is a best-effort enhancement failure: the
//! lifecycle operations log and absorb these, the backend traits return them.

use thiserror::Error;

/// Errors raised by browser backends and descriptor parsing
#[derive(Error, Debug)]
pub enum ShellError {
    /// A browser object (window, document, head, storage...) is missing
    #[error("{0} is not available")]
    Unavailable(&'static str),

    /// A JavaScript call threw or rejected
    #[error("JavaScript error: {0}")]
    Js(String),

    /// Non-success HTTP response
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Malformed JSON or missing fields
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timestamp string that is neither RFC 3339 nor a naive ISO datetime
    #[error("Unparseable timestamp: {0}")]
    Timestamp(String),

    /// Stored scroll offset that is not a decimal integer
    #[error("Invalid scroll offset: {0:?}")]
    InvalidScroll(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for ShellError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ShellError::Js(format!("{value:?}"))
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
