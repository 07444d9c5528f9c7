//! Browser abstraction layer
//!
//! The shell talks to the page only through these traits:
//! - `DocumentHead`: title, favicon and manifest links
//! - `WorkerRegistry`: service worker registration
//! - `SessionStore`: sessionStorage
//! - `Viewport`: scroll offset and frame scheduling
//! - `Connectivity`: navigator.onLine and the online/offline events
//! - `Clock`: epoch milliseconds for cache-busting
//!
//! `browser` binds them to `web-sys` on wasm32, `memory` keeps everything in
//! process for native builds and tests.

#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod memory;

use std::rc::Rc;

use crate::error::Result;

/// Read/write access to the document's `<head>` identity
pub trait DocumentHead {
    fn title(&self) -> String;
    fn set_title(&self, title: &str);

    /// `href` of the first `<link rel="icon">`, if there is one
    fn favicon_href(&self) -> Option<String>;
    /// Fails with `Unavailable` when no favicon link exists
    fn set_favicon_href(&self, href: &str) -> Result<()>;

    /// `href` of the first `<link rel="manifest">`, if there is one
    fn manifest_href(&self) -> Option<String>;
    /// Remove every manifest link, returning how many were removed
    fn remove_manifest_links(&self) -> Result<usize>;
    /// Append a new `<link rel="manifest">` to the head
    fn insert_manifest_link(&self, href: &str) -> Result<()>;
}

impl<T: DocumentHead + ?Sized> DocumentHead for &T {
    fn title(&self) -> String {
        (**self).title()
    }
    fn set_title(&self, title: &str) {
        (**self).set_title(title)
    }
    fn favicon_href(&self) -> Option<String> {
        (**self).favicon_href()
    }
    fn set_favicon_href(&self, href: &str) -> Result<()> {
        (**self).set_favicon_href(href)
    }
    fn manifest_href(&self) -> Option<String> {
        (**self).manifest_href()
    }
    fn remove_manifest_links(&self) -> Result<usize> {
        (**self).remove_manifest_links()
    }
    fn insert_manifest_link(&self, href: &str) -> Result<()> {
        (**self).insert_manifest_link(href)
    }
}

impl<T: DocumentHead + ?Sized> DocumentHead for Rc<T> {
    fn title(&self) -> String {
        (**self).title()
    }
    fn set_title(&self, title: &str) {
        (**self).set_title(title)
    }
    fn favicon_href(&self) -> Option<String> {
        (**self).favicon_href()
    }
    fn set_favicon_href(&self, href: &str) -> Result<()> {
        (**self).set_favicon_href(href)
    }
    fn manifest_href(&self) -> Option<String> {
        (**self).manifest_href()
    }
    fn remove_manifest_links(&self) -> Result<usize> {
        (**self).remove_manifest_links()
    }
    fn insert_manifest_link(&self, href: &str) -> Result<()> {
        (**self).insert_manifest_link(href)
    }
}

/// Service worker registration
pub trait WorkerRegistry {
    fn register(&self, script_path: &str) -> Result<()>;
}

/// Ephemeral per-tab key/value store
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Page scroll position
pub trait Viewport {
    fn scroll_y(&self) -> f64;
    /// Scroll once the next frame has been laid out
    fn scroll_to_next_frame(&self, y: f64);
}

/// Environment connectivity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivitySignal {
    Online,
    Offline,
}

impl ConnectivitySignal {
    /// DOM event name on `window`
    pub fn event_name(&self) -> &'static str {
        match self {
            ConnectivitySignal::Online => "online",
            ConnectivitySignal::Offline => "offline",
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ConnectivitySignal::Offline)
    }
}

/// Handle returned by `Connectivity::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u32);

/// Connectivity flag plus online/offline subscriptions
pub trait Connectivity {
    fn is_online(&self) -> bool;
    fn subscribe(&self, listener: Box<dyn FnMut(ConnectivitySignal)>) -> Result<ListenerId>;
    fn unsubscribe(&self, id: ListenerId);
}

/// Wall clock in epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Attach every item in order; on the first failure detach the ones already
/// attached and return that error
pub fn attach_all<T, E>(
    items: Vec<T>,
    mut attach: impl FnMut(&T) -> std::result::Result<(), E>,
    mut detach: impl FnMut(&T),
) -> std::result::Result<Vec<T>, E> {
    let mut attached = Vec::with_capacity(items.len());
    for item in items {
        if let Err(e) = attach(&item) {
            for done in attached.iter().rev() {
                detach(done);
            }
            return Err(e);
        }
        attached.push(item);
    }
    Ok(attached)
}

/// Append a `?v=<epoch-ms>` cache-buster to a path
pub fn cache_bust(path: &str, now_ms: f64) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{}{}v={}", path, sep, now_ms.max(0.0).floor() as u64)
}
