//! Offline banner state
//!
//! Mirrors `navigator.onLine` and the window online/offline events into a
//! single flag for as long as the indicator is alive.

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{Connectivity, ConnectivitySignal, ListenerId};

/// Element toggled by the browser entry point
pub const BANNER_ELEMENT_ID: &str = "offline-banner";

/// Subscribed connectivity mirror; unsubscribes on drop
pub struct OfflineIndicator {
    source: Rc<dyn Connectivity>,
    listener: Option<ListenerId>,
    offline: Rc<Cell<bool>>,
}

impl OfflineIndicator {
    pub fn mount(source: Rc<dyn Connectivity>) -> Self {
        Self::mount_with(source, |_| {})
    }

    /// Mount and call `on_change(offline)` after every signal
    pub fn mount_with(source: Rc<dyn Connectivity>, mut on_change: impl FnMut(bool) + 'static) -> Self {
        let offline = Rc::new(Cell::new(!source.is_online()));

        let state = offline.clone();
        let listener = match source.subscribe(Box::new(move |signal: ConnectivitySignal| {
            state.set(signal.is_offline());
            log::info!("Connectivity: {}", signal.event_name());
            on_change(signal.is_offline());
        })) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Connectivity events unavailable: {}", e);
                None
            }
        };

        Self {
            source,
            listener,
            offline,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.get()
    }
}

impl Drop for OfflineIndicator {
    fn drop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.source.unsubscribe(id);
        }
    }
}

/// Show or hide the banner element
#[cfg(target_arch = "wasm32")]
pub fn render_banner(document: &web_sys::Document, offline: bool) {
    if let Some(el) = document.get_element_by_id(BANNER_ELEMENT_ID) {
        let classes = el.class_list();
        let _ = if offline {
            classes.remove_1("hidden")
        } else {
            classes.add_1("hidden")
        };
    }
}
