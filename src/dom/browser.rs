//! `web-sys` backends (wasm32 only)

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlLinkElement, Request, RequestCache, RequestInit, Response, Window};

use super::{
    Clock, Connectivity, ConnectivitySignal, DocumentHead, ListenerId, SessionStore, Viewport,
    WorkerRegistry, attach_all,
};
use crate::error::{Result, ShellError};

const FAVICON_SELECTOR: &str = "link[rel~='icon']";
const MANIFEST_SELECTOR: &str = "link[rel='manifest']";

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// The live page: window, document and registered connectivity listeners
pub struct BrowserPage {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<ListenerId, Vec<(&'static str, EventClosure)>>>,
    next_id: Cell<u32>,
}

impl BrowserPage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(ShellError::Unavailable("window"))?;
        let document = window.document().ok_or(ShellError::Unavailable("document"))?;
        Ok(Self {
            window,
            document,
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current `location.hostname`, empty if unreadable
    pub fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }

    fn favicon_link(&self) -> Option<Element> {
        self.document.query_selector(FAVICON_SELECTOR).ok().flatten()
    }

    /// Detach listeners from `window` before their closures are dropped
    fn remove_listeners(&self, closures: Vec<(&'static str, EventClosure)>) {
        for (event, closure) in closures {
            let _ = self
                .window
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }

    fn storage(&self) -> Result<web_sys::Storage> {
        self.window
            .session_storage()?
            .ok_or(ShellError::Unavailable("sessionStorage"))
    }
}

impl DocumentHead for BrowserPage {
    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn favicon_href(&self) -> Option<String> {
        self.favicon_link()?.get_attribute("href")
    }

    fn set_favicon_href(&self, href: &str) -> Result<()> {
        let link = self.favicon_link().ok_or(ShellError::Unavailable("favicon link"))?;
        link.set_attribute("href", href)?;
        Ok(())
    }

    fn manifest_href(&self) -> Option<String> {
        self.document
            .query_selector(MANIFEST_SELECTOR)
            .ok()
            .flatten()?
            .get_attribute("href")
    }

    fn remove_manifest_links(&self) -> Result<usize> {
        let nodes = self.document.query_selector_all(MANIFEST_SELECTOR)?;
        let mut removed = 0;
        for i in 0..nodes.length() {
            if let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                el.remove();
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn insert_manifest_link(&self, href: &str) -> Result<()> {
        let head = self.document.head().ok_or(ShellError::Unavailable("document.head"))?;
        let link: HtmlLinkElement = self
            .document
            .create_element("link")?
            .dyn_into()
            .map_err(|_| ShellError::Js("created element is not a <link>".to_string()))?;
        link.set_rel("manifest");
        link.set_href(href);
        head.append_child(&link)?;
        Ok(())
    }
}

impl WorkerRegistry for BrowserPage {
    fn register(&self, script_path: &str) -> Result<()> {
        let navigator = self.window.navigator();
        if !js_sys::Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))? {
            return Err(ShellError::Unavailable("navigator.serviceWorker"));
        }
        let promise = navigator.service_worker().register(script_path);
        let script_path = script_path.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => log::info!("Service worker registered: {}", script_path),
                Err(e) => log::warn!("Service worker registration failed: {:?}", e),
            }
        });
        Ok(())
    }
}

impl SessionStore for BrowserPage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.storage()?.get_item(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.storage()?.set_item(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Ok(self.storage()?.remove_item(key)?)
    }
}

impl Viewport for BrowserPage {
    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to_next_frame(&self, y: f64) {
        let window = self.window.clone();
        let closure = Closure::once(move |_time: f64| {
            window.scroll_to_with_x_and_y(0.0, y);
        });
        if let Err(e) = self.window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            log::warn!("requestAnimationFrame failed: {:?}", e);
            return;
        }
        closure.forget();
    }
}

impl Connectivity for BrowserPage {
    fn is_online(&self) -> bool {
        self.window.navigator().on_line()
    }

    fn subscribe(&self, listener: Box<dyn FnMut(ConnectivitySignal)>) -> Result<ListenerId> {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let listener = Rc::new(RefCell::new(listener));
        let pending: Vec<(&'static str, EventClosure)> = [ConnectivitySignal::Online, ConnectivitySignal::Offline]
            .into_iter()
            .map(|signal| {
                let listener = listener.clone();
                let closure = EventClosure::new(move |_event: web_sys::Event| {
                    (&mut *listener.borrow_mut())(signal);
                });
                (signal.event_name(), closure)
            })
            .collect();

        let closures = attach_all(
            pending,
            |(event, closure)| {
                self.window
                    .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            },
            |(event, closure)| {
                let _ = self
                    .window
                    .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            },
        )?;

        self.listeners.borrow_mut().insert(id, closures);
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) {
        let closures = self.listeners.borrow_mut().remove(&id);
        if let Some(closures) = closures {
            self.remove_listeners(closures);
        }
    }
}

impl Clock for BrowserPage {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// GET `url` bypassing the HTTP cache and return the body text
pub async fn fetch_text(window: &Window, url: &str) -> Result<String> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_cache(RequestCache::NoStore);
    let request = Request::new_with_str_and_init(url, &opts)?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()
        .map_err(|_| ShellError::Js("fetch did not resolve to a Response".to_string()))?;
    if !response.ok() {
        return Err(ShellError::HttpStatus(response.status()));
    }

    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or(ShellError::Js("response body is not text".to_string()))
}
