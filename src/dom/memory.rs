//! In-process backends
//!
//! Used by the native binary and by every unit test. Each backend records
//! what was done to it and exposes switches to simulate browser failures.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{
    Clock, Connectivity, ConnectivitySignal, DocumentHead, ListenerId, SessionStore, Viewport,
    WorkerRegistry,
};
use crate::error::{Result, ShellError};

/// A `<head>` with a title, an optional favicon link and manifest links
#[derive(Debug, Default)]
pub struct MemoryHead {
    title: RefCell<String>,
    favicon: RefCell<Option<String>>,
    manifests: RefCell<Vec<String>>,
    /// Make `insert_manifest_link` fail
    pub fail_manifest_insert: Cell<bool>,
}

impl MemoryHead {
    pub fn new(title: &str, favicon: Option<&str>, manifest: Option<&str>) -> Self {
        Self {
            title: RefCell::new(title.to_string()),
            favicon: RefCell::new(favicon.map(str::to_string)),
            manifests: RefCell::new(manifest.map(str::to_string).into_iter().collect()),
            fail_manifest_insert: Cell::new(false),
        }
    }

    /// All manifest link hrefs, in document order
    pub fn manifest_links(&self) -> Vec<String> {
        self.manifests.borrow().clone()
    }
}

impl DocumentHead for MemoryHead {
    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }

    fn favicon_href(&self) -> Option<String> {
        self.favicon.borrow().clone()
    }

    fn set_favicon_href(&self, href: &str) -> Result<()> {
        match self.favicon.borrow_mut().as_mut() {
            Some(current) => {
                *current = href.to_string();
                Ok(())
            }
            None => Err(ShellError::Unavailable("favicon link")),
        }
    }

    fn manifest_href(&self) -> Option<String> {
        self.manifests.borrow().first().cloned()
    }

    fn remove_manifest_links(&self) -> Result<usize> {
        let mut manifests = self.manifests.borrow_mut();
        let removed = manifests.len();
        manifests.clear();
        Ok(removed)
    }

    fn insert_manifest_link(&self, href: &str) -> Result<()> {
        if self.fail_manifest_insert.get() {
            return Err(ShellError::Js("appendChild rejected".to_string()));
        }
        self.manifests.borrow_mut().push(href.to_string());
        Ok(())
    }
}

/// Records registered worker scripts
#[derive(Debug, Default)]
pub struct MemoryWorkers {
    registered: RefCell<Vec<String>>,
    /// Make every registration fail
    pub fail: Cell<bool>,
}

impl MemoryWorkers {
    pub fn registered(&self) -> Vec<String> {
        self.registered.borrow().clone()
    }
}

impl WorkerRegistry for MemoryWorkers {
    fn register(&self, script_path: &str) -> Result<()> {
        if self.fail.get() {
            return Err(ShellError::Js("SecurityError: insecure origin".to_string()));
        }
        self.registered.borrow_mut().push(script_path.to_string());
        Ok(())
    }
}

/// sessionStorage stand-in that counts writes
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    writes: Cell<u32>,
}

impl MemoryStore {
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.items.borrow_mut().insert(key.to_string(), value.to_string());
        store
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }

    /// Number of `set`/`remove` calls so far
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Scroll offset with a queue of scrolls waiting for the next frame
#[derive(Debug, Default)]
pub struct MemoryViewport {
    scroll_y: Cell<f64>,
    pending: RefCell<Vec<f64>>,
}

impl MemoryViewport {
    pub fn at(y: f64) -> Self {
        Self {
            scroll_y: Cell::new(y),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run everything scheduled for the next frame
    pub fn run_frame(&self) {
        let pending: Vec<f64> = self.pending.borrow_mut().drain(..).collect();
        for y in pending {
            self.scroll_y.set(y);
        }
    }
}

impl Viewport for MemoryViewport {
    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn scroll_to_next_frame(&self, y: f64) {
        self.pending.borrow_mut().push(y);
    }
}

type Listener = Box<dyn FnMut(ConnectivitySignal)>;

/// navigator.onLine plus window online/offline listeners
pub struct MemoryConnectivity {
    online: Cell<bool>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    /// Ids unsubscribed while their listener was taken out by `emit`
    dropped: RefCell<Vec<ListenerId>>,
    next_id: Cell<u32>,
}

impl MemoryConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Cell::new(online),
            listeners: RefCell::new(Vec::new()),
            dropped: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Flip the flag and fire the matching event
    ///
    /// Listeners may subscribe or unsubscribe from inside the callback.
    pub fn emit(&self, signal: ConnectivitySignal) {
        self.online.set(!signal.is_offline());

        let mut firing = std::mem::take(&mut *self.listeners.borrow_mut());
        for (_, listener) in firing.iter_mut() {
            listener(signal);
        }

        let dropped = std::mem::take(&mut *self.dropped.borrow_mut());
        firing.retain(|(id, _)| !dropped.contains(id));
        let mut listeners = self.listeners.borrow_mut();
        let added = std::mem::take(&mut *listeners);
        *listeners = firing;
        listeners.extend(added);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Connectivity for MemoryConnectivity {
    fn is_online(&self) -> bool {
        self.online.get()
    }

    fn subscribe(&self, listener: Box<dyn FnMut(ConnectivitySignal)>) -> Result<ListenerId> {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        if listeners.len() == before {
            self.dropped.borrow_mut().push(id);
        }
    }
}

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn at(ms: f64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_head_without_favicon_rejects_set() {
        let head = MemoryHead::new("Home", None, None);
        assert!(head.set_favicon_href("/x.png").is_err());
        assert_eq!(head.favicon_href(), None);
    }

    #[test]
    fn test_connectivity_unsubscribe_stops_delivery() {
        let conn = MemoryConnectivity::new(true);
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let id = conn
            .subscribe(Box::new(move |_| hits_clone.set(hits_clone.get() + 1)))
            .unwrap();
        conn.emit(ConnectivitySignal::Offline);
        conn.unsubscribe(id);
        conn.emit(ConnectivitySignal::Online);
        assert_eq!(hits.get(), 1);
        assert!(conn.is_online());
        assert_eq!(conn.listener_count(), 0);
    }

    #[test]
    fn test_listener_can_unsubscribe_during_emit() {
        let conn = Rc::new(MemoryConnectivity::new(true));
        let slot: Rc<RefCell<Option<ListenerId>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let (conn_clone, slot_clone, hits_clone) = (conn.clone(), slot.clone(), hits.clone());
        let id = conn
            .subscribe(Box::new(move |_| {
                hits_clone.set(hits_clone.get() + 1);
                if let Some(id) = slot_clone.borrow_mut().take() {
                    conn_clone.unsubscribe(id);
                }
            }))
            .unwrap();
        *slot.borrow_mut() = Some(id);

        conn.emit(ConnectivitySignal::Offline);
        conn.emit(ConnectivitySignal::Online);
        assert_eq!(hits.get(), 1);
        assert_eq!(conn.listener_count(), 0);
    }

    #[test]
    fn test_viewport_applies_on_frame() {
        let vp = MemoryViewport::at(10.0);
        vp.scroll_to_next_frame(300.0);
        assert_eq!(vp.scroll_y(), 10.0);
        vp.run_frame();
        assert_eq!(vp.scroll_y(), 300.0);
        assert_eq!(vp.pending_frames(), 0);
    }
}
